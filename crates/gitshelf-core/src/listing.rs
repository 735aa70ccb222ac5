//! Client-side emulation of directory listing order and pagination.
//!
//! The backend returns directory entries unordered and unpaginated, so the
//! proxy sorts and slices here. The sort is stable: ties keep their original
//! relative order in both directions.

use std::cmp::Ordering;

use serde_json::Value;

/// Listing sort direction. Anything that is not `ASC` sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<&str> for SortOrder {
    fn from(value: &str) -> Self {
        if value == "ASC" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// One page of a sorted listing plus the pre-pagination item count.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    /// Total count before slicing, so clients can page without a second
    /// round trip.
    pub total: usize,
}

/// Sorts `items` on `sort_field` and slices out the requested page.
///
/// An out-of-range page yields an empty slice, not an error. Items missing
/// the sort field order as if the field were null.
pub fn page(
    mut items: Vec<Value>,
    sort_field: &str,
    sort_order: SortOrder,
    page: u32,
    per_page: u32,
) -> Page {
    let total = items.len();

    items.sort_by(|a, b| {
        let ordering = compare_values(field_of(a, sort_field), field_of(b, sort_field));
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
    let end = start.saturating_add(per_page as usize).min(total);
    let items = if start >= total {
        Vec::new()
    } else {
        items[start..end].to_vec()
    };

    Page { items, total }
}

fn field_of<'a>(item: &'a Value, field: &str) -> &'a Value {
    item.get(field).unwrap_or(&Value::Null)
}

/// Deterministic three-way comparison across JSON values. Mixed types order
/// by kind: null < bool < number < string < array < object.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
