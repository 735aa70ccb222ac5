//! Recursive walk over a document tree, replacing attachment nodes in place.
//!
//! The walk visits every enumerable property in insertion order. A node
//! matching the predicate is replaced by the transform's output; a plain
//! object is recursed into; a sequence gets the object rule element-wise,
//! one level deep only (sequences of sequences are not traversed). A failed
//! transform aborts the walk with the first error; replacements already
//! applied are not rolled back.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;

/// Async transform applied to each matched node.
#[async_trait]
pub trait NodeTransform: Send + Sync {
    async fn apply(&self, node: Value) -> Result<Value>;
}

/// Walks `value`, replacing every node satisfying `is_match` with the
/// transform's output.
pub fn walk<'a>(
    value: &'a mut Value,
    is_match: &'a (dyn Fn(&Value) -> bool + Send + Sync),
    transform: &'a dyn NodeTransform,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let Value::Object(map) = value else {
            return Ok(());
        };

        for (_key, slot) in map.iter_mut() {
            if slot.is_object() {
                if is_match(slot) {
                    *slot = transform.apply(slot.take()).await?;
                } else {
                    walk(slot, is_match, transform).await?;
                }
            } else if let Value::Array(elements) = slot {
                for element in elements.iter_mut() {
                    if element.is_object() {
                        if is_match(element) {
                            *element = transform.apply(element.take()).await?;
                        } else {
                            walk(element, is_match, transform).await?;
                        }
                    }
                }
            }
        }

        Ok(())
    })
}
