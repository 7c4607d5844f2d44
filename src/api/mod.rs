//! REST API server for Quickroom.
//!
//! Provides HTTP endpoints for:
//! - Access token minting (GET /token)
//! - Service info and version

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::token::TokenIssuer;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub struct ApiServer {
    port: u16,
    issuer: TokenIssuer,
}

impl ApiServer {
    pub fn new(issuer: TokenIssuer, config: &Config) -> Self {
        Self {
            port: config.server.port,
            issuer,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            // Root and version endpoints
            .route("/", get(status))
            .route("/version", get(version))
            // Token minting
            .merge(routes::token::router(self.issuer))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("Token server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /        - Service info");
        info!("  GET  /version - Get version info");
        info!("  GET  /token   - Mint a room access token (identity and room query params)");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "quickroom",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "quickroom"
    }))
}
