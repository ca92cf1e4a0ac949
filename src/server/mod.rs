//! HTTP front end for the agent.
//!
//! `POST /query` answers a prompt, `GET /api/media/{query}` returns image and
//! icon hints for a UI. A single agent serves all requests, one at a time.

mod handlers;
pub mod types;

use crate::agent::CryptoAgent;
use crate::ui::user_messages::print_listening;
use anyhow::Context;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    agent: Arc<Mutex<CryptoAgent>>,
}

impl AppState {
    pub fn new(agent: CryptoAgent) -> Self {
        Self {
            agent: Arc::new(Mutex::new(agent)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // browser front ends are served from anywhere
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/query", post(handlers::query))
        .route("/api/media/:query", get(handlers::media))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn serve(agent: CryptoAgent, bind_addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    let addr = listener.local_addr().context("Failed to read local address")?;

    info!(provider = agent.provider_name(), "starting HTTP server");
    print_listening(&addr);

    axum::serve(listener, router(AppState::new(agent)))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("HTTP server failed")
}
