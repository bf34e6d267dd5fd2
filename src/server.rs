//! HTTP query endpoint exposing the read-only facade.
//!
//! Dashboards poll these routes at ~1 Hz:
//!
//! ```text
//! GET /health                    liveness + version
//! GET /kinds                     kinds with buffered data
//! GET /sensors/:kind             full rolling window
//! GET /sensors/:kind/latest      most recent reading
//! GET /sensors/:kind/alerts      staleness + abnormal fields
//! GET /status                    connection state + ingestion counters
//! GET /checkpoints/:node_id      RFID checkpoint progress for a node
//! ```
//!
//! Every handler is a snapshot read; none blocks on ingestion.

use crate::alerts::AlertState;
use crate::checkpoint::{CheckpointStatus, RfidScan};
use crate::query::QueryFacade;
use crate::stats::StatsSnapshot;
use crate::telemetry::{SensorKind, SensorReading};
use crate::transport::ConnectionStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Shared server state
struct ServerState {
    facade: QueryFacade,
    /// Unique id for this agent process
    instance_id: String,
    /// Hostname-derived device id
    device_id: String,
}

impl ServerState {
    fn new(facade: QueryFacade) -> Self {
        let device_id = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());

        Self {
            facade,
            instance_id: uuid::Uuid::new_v4().to_string(),
            device_id,
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

/// GET /status response
#[derive(Serialize)]
struct StatusResponse {
    instance_id: String,
    device_id: String,
    connection: ConnectionStatus,
    stats: StatsSnapshot,
    kinds: Vec<SensorKind>,
}

/// GET /checkpoints/:node_id response
#[derive(Serialize)]
struct CheckpointResponse {
    node_id: String,
    checkpoints: Vec<CheckpointStatus>,
    latest_scan: Option<RfidScan>,
}

fn unknown_kind(raw: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("unknown sensor kind: {raw}"),
            code: "UNKNOWN_KIND".to_string(),
        }),
    )
}

fn parse_kind(raw: &str) -> Result<SensorKind, (StatusCode, Json<ErrorResponse>)> {
    raw.parse::<SensorKind>().map_err(|_| unknown_kind(raw))
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /kinds
async fn kinds(State(state): State<Arc<ServerState>>) -> Json<Vec<SensorKind>> {
    Json(state.facade.list_kinds())
}

/// GET /sensors/:kind
async fn sensor_window(
    State(state): State<Arc<ServerState>>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<SensorReading>>, (StatusCode, Json<ErrorResponse>)> {
    let kind = parse_kind(&raw)?;
    Ok(Json(state.facade.snapshot(kind)))
}

/// GET /sensors/:kind/latest
async fn sensor_latest(
    State(state): State<Arc<ServerState>>,
    Path(raw): Path<String>,
) -> Result<Json<SensorReading>, (StatusCode, Json<ErrorResponse>)> {
    let kind = parse_kind(&raw)?;
    state.facade.latest(kind).map(Json).ok_or((
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("no readings buffered for {kind}"),
            code: "NO_DATA".to_string(),
        }),
    ))
}

/// GET /sensors/:kind/alerts
async fn sensor_alerts(
    State(state): State<Arc<ServerState>>,
    Path(raw): Path<String>,
) -> Result<Json<AlertState>, (StatusCode, Json<ErrorResponse>)> {
    let kind = parse_kind(&raw)?;
    Ok(Json(state.facade.alert_state(kind)))
}

/// GET /status
async fn status(State(state): State<Arc<ServerState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        instance_id: state.instance_id.clone(),
        device_id: state.device_id.clone(),
        connection: state.facade.connection_status(),
        stats: state.facade.ingest_stats(),
        kinds: state.facade.list_kinds(),
    })
}

/// GET /checkpoints/:node_id
async fn checkpoints(
    State(state): State<Arc<ServerState>>,
    Path(node_id): Path<String>,
) -> Json<CheckpointResponse> {
    Json(CheckpointResponse {
        checkpoints: state.facade.checkpoint_status(&node_id),
        latest_scan: state.facade.latest_scan(),
        node_id,
    })
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    facade: QueryFacade,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(facade));

    let app = Router::new()
        .route("/health", get(health))
        .route("/kinds", get(kinds))
        .route("/sensors/:kind", get(sensor_window))
        .route("/sensors/:kind/latest", get(sensor_latest))
        .route("/sensors/:kind/alerts", get(sensor_alerts))
        .route("/status", get(status))
        .route("/checkpoints/:node_id", get(checkpoints))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("query endpoint listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("server shutdown signal received");
            })
            .await
        {
            tracing::error!("server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
