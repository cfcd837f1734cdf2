//! Local HTTP server speaking the ANU QRNG JSON API, backed by any entropy source.
//!
//! Serves `GET /API/jsonI.php?type=..&length=..&size=..` in the ANU JSON
//! format from any [`EntropySource`], normally [`qrandom_core::OsSource`].
//! Point the `qrandom` client at it to work offline.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use qrandom_core::{AnuResponse, DataKind, EntropySource, FetchRequest};

/// Path of the ANU-compatible endpoint.
pub const ANU_PATH: &str = "/API/jsonI.php";

/// Shared server state.
struct AppState {
    source: Arc<dyn EntropySource>,
}

#[derive(Deserialize)]
struct RandomParams {
    #[serde(rename = "type")]
    data_type: Option<String>,
    length: Option<usize>,
    size: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    source: &'static str,
    remote: bool,
}

async fn handle_random(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RandomParams>,
) -> (StatusCode, Json<AnuResponse>) {
    let data_type = params.data_type.unwrap_or_else(|| "hex16".to_string());
    let request = match DataKind::parse(&data_type).and_then(|kind| {
        FetchRequest::new(kind, params.length.unwrap_or(1), params.size.unwrap_or(1))
    }) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AnuResponse::failure(&data_type, e.to_string())),
            );
        }
    };

    let source = Arc::clone(&state.source);
    let fetched = tokio::task::spawn_blocking(move || source.fetch(&request)).await;
    match fetched {
        Ok(Ok(batch)) => (
            StatusCode::OK,
            Json(AnuResponse::from_batch(&request, &batch)),
        ),
        Ok(Err(e)) => {
            log::warn!("source '{}' failed: {e}", state.source.name());
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(AnuResponse::failure(&data_type, e.to_string())),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AnuResponse::failure(&data_type, format!("fetch task failed: {e}"))),
        ),
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let info = state.source.info();
    Json(HealthResponse {
        status: "healthy",
        source: info.name,
        remote: info.remote,
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let info = state.source.info();
    Json(serde_json::json!({
        "name": "qrandom server",
        "version": qrandom_core::VERSION,
        "source": {
            "name": info.name,
            "description": info.description,
        },
        "endpoints": {
            "/": "This API index",
            "/API/jsonI.php": {
                "method": "GET",
                "description": "Random data in the ANU QRNG JSON format",
                "params": {
                    "type": "uint8, uint16 or hex16 (default: hex16)",
                    "length": "Number of values or blocks (1-1024, default: 1)",
                    "size": "Hex digits per block, hex16 only (1-1024, default: 1)",
                }
            },
            "/api/v1/random": format!("Alias of {ANU_PATH}"),
            "/health": "Health check",
        },
        "examples": {
            "bytes": format!("{ANU_PATH}?type=uint8&length=32"),
            "blocks": format!("{ANU_PATH}?type=hex16&length=4&size=1024"),
        }
    }))
}

/// Build the axum router.
pub fn build_router(source: Arc<dyn EntropySource>) -> Router {
    let state = Arc::new(AppState { source });

    Router::new()
        .route("/", get(handle_index))
        .route(ANU_PATH, get(handle_random))
        .route("/api/v1/random", get(handle_random))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Serve on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, source: Arc<dyn EntropySource>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("serving '{}' entropy on http://{addr}", source.name());
    }
    axum::serve(listener, build_router(source)).await
}

/// Run the HTTP entropy server.
pub async fn run_server(
    source: Arc<dyn EntropySource>,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    serve(listener, source).await
}
