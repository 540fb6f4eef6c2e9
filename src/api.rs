//! JSON endpoints for the map/list renderer.
//!
//! - `GET /api/vehicles?id=<id>`: current snapshot, filtered, with counts
//! - `POST /api/refresh`: manual refresh request
//! - `GET /api/config`: map center and refresh interval
//! - `GET /healthz`

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::MapCenter;
use crate::models::SourceStatus;
use crate::query::{QueryResult, query};
use crate::scheduler::{RefreshHandle, RefreshRequest};
use crate::snapshot::SnapshotStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub refresh: RefreshHandle,
    pub map_center: MapCenter,
    pub refresh_interval_seconds: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct VehicleParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VehiclesReply {
    pub source_status: SourceStatus,
    pub fetched_at: i64,
    pub attempted_at: i64,
    pub last_error: Option<String>,
    #[serde(flatten)]
    pub result: QueryResult,
}

#[derive(Debug, Serialize)]
pub struct RefreshReply {
    pub outcome: RefreshRequest,
}

#[derive(Debug, Serialize)]
pub struct RendererConfig {
    pub map_center: MapCenter,
    pub refresh_interval_seconds: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/vehicles", get(vehicles))
        .route("/api/refresh", post(refresh))
        .route("/api/config", get(renderer_config))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Serves [`router`] on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "HTTP server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[axum::debug_handler]
async fn vehicles(
    State(state): State<AppState>,
    Query(params): Query<VehicleParams>,
) -> Json<VehiclesReply> {
    let snapshot = state.store.current();
    let result = query(&snapshot, params.id.as_deref());
    debug!(
        filter = ?params.id,
        matches = result.matches.len(),
        total = result.total_count,
        "Vehicle query"
    );

    Json(VehiclesReply {
        source_status: snapshot.source_status,
        fetched_at: snapshot.fetched_at,
        attempted_at: snapshot.attempted_at,
        last_error: snapshot.last_error.clone(),
        result,
    })
}

#[axum::debug_handler]
async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<RefreshReply>) {
    let outcome = state.refresh.request();
    info!(?outcome, "Manual refresh requested");

    let status = match outcome {
        RefreshRequest::Accepted => StatusCode::ACCEPTED,
        RefreshRequest::Coalesced => StatusCode::OK,
        RefreshRequest::Stopped => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(RefreshReply { outcome }))
}

async fn renderer_config(State(state): State<AppState>) -> Json<RendererConfig> {
    Json(RendererConfig {
        map_center: state.map_center,
        refresh_interval_seconds: state.refresh_interval_seconds,
    })
}

async fn healthz() -> &'static str {
    "ok"
}
