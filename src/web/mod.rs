// Web server — Axum-based JSON backend.
//
// All routes serve JSON. The model adapters are constructed once at startup
// and injected through AppState; handlers never touch ort or the filesystem
// stores directly, only the traits and store types in state.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::classify::Orchestrator;
use crate::datasets::DatasetStore;
use crate::db::Database;
use crate::model_status::StatusStore;
use crate::training::Retrainer;

pub mod error;
pub mod handlers;
pub mod retrain_job;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub orchestrator: Arc<Orchestrator>,
    pub status: Arc<StatusStore>,
    pub datasets: Arc<DatasetStore>,
    pub retrainer: Arc<Retrainer>,
    pub training_job: Arc<RwLock<retrain_job::TrainingJobStatus>>,
}

/// Start the web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Vigil backend listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the full route table. Public so tests can drive the router
/// in-process without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/scan", post(handlers::scan::scan_text))
        .route("/scan/email", post(handlers::scan::scan_email))
        .route("/scan/html", post(handlers::scan::scan_html))
        .route("/scans", get(handlers::scans::list_scans))
        .route("/scans/{id}", get(handlers::scans::get_scan))
        .route(
            "/datasets",
            post(handlers::datasets::upload_dataset).get(handlers::datasets::list_datasets),
        )
        .route(
            "/datasets/{filename}",
            delete(handlers::datasets::delete_dataset),
        )
        .route("/model/status", get(handlers::model::get_status))
        .route("/model/switch", post(handlers::model::switch_mode))
        .route("/model/retrain", post(handlers::retrain::submit_retrain))
        .route(
            "/model/retrain/status",
            get(handlers::retrain::retrain_status),
        )
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Deployment health check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}
