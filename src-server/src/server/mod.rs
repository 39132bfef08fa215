//! HTTP front end.
//!
//! - `GET /` health check
//! - `GET /train` runs the training pipeline once
//! - `GET /predict` renders the prediction form
//! - `POST /predict` predicts the price of the submitted car

use anyhow::Result;
use axum::{Json, Router, response::IntoResponse, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod page;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "car-price",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serve until the process is stopped
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_app(state);

    info!("Starting car price server on {}", addr);
    info!("Prediction form available at http://{}/predict", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
