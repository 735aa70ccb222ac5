//! gitshelf proxy server.
//!
//! Receives resource CRUD requests from admin clients, validates signed
//! credentials, and persists documents and attachments as files in a GitHub
//! repository through the contents API.

use std::sync::Arc;

use axum::routing::{any, get, post};
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gitshelf_github::GithubContents;
use gitshelf_proxy::config::Config;
use gitshelf_proxy::contents::ContentsService;
use gitshelf_proxy::http::{authenticate_handler, health_handler, proxy_handler, AppState};
use gitshelf_proxy::proxy::ProxyService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting gitshelf-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Repository: {}", config.repo);
    info!("  Content root: {}", config.content_root);
    info!("  Preview TTL: {}s", config.preview_ttl_secs);

    let store = Arc::new(GithubContents::with_api_base(
        config.github_api_base.clone(),
        config.repo.clone(),
        config.github_token.clone(),
    ));

    let contents = ContentsService::new(
        store.clone(),
        config.content_root.clone(),
        config.base_url.clone(),
        config.secret.as_bytes().to_vec(),
        Some(config.preview_ttl_secs),
    );

    let proxy = Arc::new(ProxyService::new(
        store,
        contents,
        config.users_dir.clone(),
        config.secret.as_bytes().to_vec(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/authenticate", post(authenticate_handler::<GithubContents>))
        .route("/", any(proxy_handler::<GithubContents>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { proxy });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, initiating shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
