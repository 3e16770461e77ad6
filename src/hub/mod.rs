//! HTTP front-end (hub)
//!
//! Serves on-demand resolution of a GitHub-hosted gateway list.

mod auth;
mod common;
mod resolve;

pub use auth::auth_middleware;
pub use common::{ApiError, ApiResult, ResolveParams, ResponseFormat};
pub use resolve::ResolveResponse;

use crate::config::Config;
use crate::dns::Resolver;
use crate::provider::GatewaySource;
use crate::{Result, VERSION};

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Access key; empty disables auth
    pub secret: String,
    /// Resolution engine
    pub resolver: Resolver,
    /// Where gateway lists come from
    pub source: Arc<dyn GatewaySource>,
    /// Concurrent lookups per request
    pub workers: usize,
    /// Default repository owner
    pub owner: String,
    /// Default repository name
    pub repo: String,
    /// Name used in Azure IP group responses
    pub ip_group_name: String,
}

impl AppState {
    pub fn new(config: &Config, resolver: Resolver, source: Arc<dyn GatewaySource>) -> Self {
        AppState {
            secret: config.server.secret.clone().unwrap_or_default(),
            resolver,
            source,
            workers: config.resolver.workers,
            owner: config.server.owner.clone(),
            repo: config.server.repo.clone(),
            ip_group_name: config.output.ip_group_name.clone(),
        }
    }
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(hello))
        .route("/version", get(version))
        .route(
            "/api/resolve_gateway_ips",
            get(resolve::resolve_gateway_ips).post(resolve::resolve_gateway_ips),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<()> {
    let router = create_router(state);
    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;
    Ok(())
}

async fn hello() -> Json<Value> {
    Json(json!({ "hello": "gateway-resolver" }))
}

async fn version() -> Json<Value> {
    Json(json!({ "version": VERSION }))
}
