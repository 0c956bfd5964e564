//! HTTP Server implementation

use anyhow::{Context, Result};
use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use gitrelay_core::ServerConfig;
use gitrelay_webhook::{create_relay_router, RelayState};

pub struct Server {
    config: ServerConfig,
    state: Arc<RelayState>,
}

impl Server {
    pub fn new(config: ServerConfig, state: Arc<RelayState>) -> Self {
        Self { config, state }
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.config.address();
        let app = build_http_router(self.state);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

        info!("HTTP server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

pub fn build_http_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(create_relay_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// Route handlers

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "gitrelay",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use gitrelay_webhook::{ChatClient, InMemoryChatClient};
    use tower::ServiceExt;

    fn router(debug: bool) -> Router {
        let client: Arc<dyn ChatClient> = Arc::new(InMemoryChatClient::new(["42"]));
        build_http_router(Arc::new(RelayState::new(client).with_debug(debug)))
    }

    #[tokio::test]
    async fn test_root_handler() {
        let response = root().await;
        assert_eq!(response.0["service"], "gitrelay");
    }

    #[tokio::test]
    async fn test_health_check_handler() {
        let status = health_check().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_relay_routes_are_mounted() {
        let response = router(false)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/trigger/42")
                    .header("x-github-event", "ping")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router(false)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/debug/42")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
