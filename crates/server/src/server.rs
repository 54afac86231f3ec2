//! HTTP prediction API.
//!
//! Serves the fitted artifact over three endpoints (health, schema hint,
//! predict) plus a plain-text metrics exposition. The artifact is loaded
//! once at startup and shared read-only across request handlers; no
//! handler mutates it, so no locking is involved.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use claimsev_core::fixed::{f64_from_micros, loss_from_log_micros};
use claimsev_core::schema::{ID_COLUMN, LOG_TARGET_COLUMN, TARGET_COLUMN};
use claimsev_core::{FeatureValue, ModelArtifact};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

/// Shared service state: the immutable model plus request bookkeeping.
pub struct AppState {
    pub artifact: Arc<ModelArtifact>,
    pub start_time: Instant,
    pub req_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
            start_time: Instant::now(),
            req_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) as u64 + 1
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ExpectedFeatures {
    categorical: String,
    continuous: String,
}

#[derive(Debug, Serialize)]
struct SchemaResponse {
    expected_features: ExpectedFeatures,
    note: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: HashMap<String, FeatureValue>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_claim_severity: f64,
    pub predicted_log_severity: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

/// Start the prediction service on the given address.
pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    axum::serve(listener, app)
        .await
        .context("prediction server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

/// Build the API router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/schema", get(handle_schema))
        .route("/predict", post(handle_predict))
        .route("/metrics", get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    state.record_request();
    Json(HealthResponse { status: "ok" })
}

/// Informational only; nothing validates requests against this shape.
async fn handle_schema(State(state): State<SharedState>) -> Json<SchemaResponse> {
    state.record_request();

    let schema = &state.artifact.schema;
    Json(SchemaResponse {
        expected_features: ExpectedFeatures {
            categorical: describe_columns(&schema.categorical),
            continuous: describe_columns(&schema.continuous),
        },
        note: "Send a JSON body {\"features\": {...}}; do not include id, loss, or log_loss.",
    })
}

async fn handle_predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    state.record_request();

    // Defensive cleanup: drop training-only fields if a caller sends them
    let mut features = request.features;
    features.remove(ID_COLUMN);
    features.remove(TARGET_COLUMN);
    features.remove(LOG_TARGET_COLUMN);

    let log_micros = state
        .artifact
        .predict_log_micros(&features)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let log_severity = f64_from_micros(log_micros);
    let severity = loss_from_log_micros(log_micros);

    Ok(Json(PredictResponse {
        predicted_claim_severity: round_places(severity, 4),
        predicted_log_severity: round_places(log_severity, 6),
    }))
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let req_total = state.record_request();
    let uptime = state.uptime_seconds();
    let tree_count = state.artifact.model.num_trees();

    let mut metrics =
        "# HELP claimsev_http_requests_total Total number of API requests handled\n".to_string();
    metrics.push_str("# TYPE claimsev_http_requests_total counter\n");
    metrics.push_str(&format!("claimsev_http_requests_total {req_total}\n"));
    metrics.push_str("# HELP claimsev_uptime_seconds Uptime of the service in seconds\n");
    metrics.push_str("# TYPE claimsev_uptime_seconds gauge\n");
    metrics.push_str(&format!("claimsev_uptime_seconds {uptime}\n"));
    metrics.push_str("# HELP claimsev_model_trees Trees in the loaded model\n");
    metrics.push_str("# TYPE claimsev_model_trees gauge\n");
    metrics.push_str(&format!("claimsev_model_trees {tree_count}\n"));

    let mut response = Response::new(Body::from(metrics));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}

/// Render a column group as a compact range, e.g. `cat1..cat116`.
fn describe_columns(names: &[String]) -> String {
    match names {
        [] => "none".to_string(),
        [only] => only.clone(),
        [first, .., last] => format!("{first}..{last}"),
    }
}

fn round_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_columns() {
        assert_eq!(describe_columns(&[]), "none");
        assert_eq!(describe_columns(&["cat1".to_string()]), "cat1");

        let names: Vec<String> = (1..=116).map(|i| format!("cat{i}")).collect();
        assert_eq!(describe_columns(&names), "cat1..cat116");
    }

    #[test]
    fn test_round_places() {
        assert_eq!(round_places(6.38905609, 4), 6.3891);
        assert_eq!(round_places(2.0000004, 6), 2.0);
        assert_eq!(round_places(-1.23456789, 4), -1.2346);
    }
}
