//! Endpoint tests for the prediction API.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use claimsev_core::fixed::SCALE;
use claimsev_core::{FeatureSchema, Model, ModelArtifact, Node, OrdinalEncoder, Tree};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::server::{build_router, AppState};

/// Hand-built artifact over cat1 in {A, B} and cont1.
///
/// Tree 1 separates unseen categories (sentinel code) from fitted ones;
/// tree 2 splits on cont1 at 1.5.
fn test_artifact() -> ModelArtifact {
    let schema = FeatureSchema::from_headers(&["id", "cat1", "cont1", "loss"]);

    let mut observed: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    observed.insert(
        "cat1".to_string(),
        ["A", "B"].iter().map(|v| v.to_string()).collect(),
    );
    let encoder = OrdinalEncoder::fit(&observed);

    let tree1 = Tree::new(
        vec![
            Node::internal(0, 0, -500_000, 1, 2),
            Node::leaf(1, 500_000),   // unseen -> log 0.5
            Node::leaf(2, 2_000_000), // fitted -> log 2.0
        ],
        SCALE,
    );
    let tree2 = Tree::new(
        vec![
            Node::internal(0, 1, 1_500_000, 1, 2),
            Node::leaf(1, 0),
            Node::leaf(2, 1_000_000),
        ],
        SCALE,
    );

    ModelArtifact::new(schema, encoder, Model::new(vec![tree1, tree2], 0))
}

fn test_router() -> Router {
    build_router(Arc::new(AppState::new(test_artifact())))
}

async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
    let response = test_router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn post_json(uri: &str, payload: &Value) -> (StatusCode, Value) {
    let response = test_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap();
    (status, value)
}

#[tokio::test]
async fn test_health_returns_ok() {
    let (status, body) = get("/").await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_schema_describes_feature_groups() {
    let (status, body) = get("/schema").await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["expected_features"]["categorical"], "cat1");
    assert_eq!(value["expected_features"]["continuous"], "cont1");

    let note = value["note"].as_str().unwrap();
    assert!(note.contains("id"));
    assert!(note.contains("log_loss"));
}

#[tokio::test]
async fn test_predict_round_trip() {
    let payload = json!({"features": {"cat1": "A", "cont1": 1.0}});
    let (status, value) = post_json("/predict", &payload).await;

    assert_eq!(status, StatusCode::OK);

    let severity = value["predicted_claim_severity"].as_f64().unwrap();
    let log_severity = value["predicted_log_severity"].as_f64().unwrap();

    assert!(severity.is_finite());
    assert!(log_severity.is_finite());
    assert_eq!(log_severity, 2.0);
    assert!((severity - 2.0f64.exp_m1()).abs() < 1e-3);
}

#[tokio::test]
async fn test_predict_uses_continuous_split() {
    let low = json!({"features": {"cat1": "A", "cont1": 1.0}});
    let high = json!({"features": {"cat1": "A", "cont1": 2.0}});

    let (_, low_value) = post_json("/predict", &low).await;
    let (_, high_value) = post_json("/predict", &high).await;

    assert_eq!(low_value["predicted_log_severity"].as_f64().unwrap(), 2.0);
    assert_eq!(high_value["predicted_log_severity"].as_f64().unwrap(), 3.0);
}

#[tokio::test]
async fn test_unseen_category_is_accepted() {
    let payload = json!({"features": {"cat1": "NEVER_SEEN", "cont1": 1.0}});
    let (status, value) = post_json("/predict", &payload).await;

    assert_eq!(status, StatusCode::OK);
    let severity = value["predicted_claim_severity"].as_f64().unwrap();
    assert!(severity.is_finite());
    assert_eq!(value["predicted_log_severity"].as_f64().unwrap(), 0.5);
}

#[tokio::test]
async fn test_training_only_fields_are_stripped() {
    let plain = json!({"features": {"cat1": "A", "cont1": 1.0}});
    let polluted = json!({"features": {
        "cat1": "A",
        "cont1": 1.0,
        "id": 12345,
        "loss": 999.9,
        "log_loss": 6.9
    }});

    let (plain_status, plain_value) = post_json("/predict", &plain).await;
    let (polluted_status, polluted_value) = post_json("/predict", &polluted).await;

    assert_eq!(plain_status, StatusCode::OK);
    assert_eq!(polluted_status, StatusCode::OK);
    assert_eq!(plain_value, polluted_value);
}

#[tokio::test]
async fn test_missing_column_is_a_client_error() {
    let payload = json!({"features": {"cat1": "A"}});
    let (status, value) = post_json("/predict", &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("cont1"));
}

#[tokio::test]
async fn test_non_numeric_continuous_is_a_client_error() {
    let payload = json!({"features": {"cat1": "A", "cont1": "plenty"}});
    let (status, value) = post_json("/predict", &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("cont1"));
}

#[tokio::test]
async fn test_extra_request_keys_are_ignored() {
    let plain = json!({"features": {"cat1": "A", "cont1": 1.0}});
    let extra = json!({"features": {"cat1": "A", "cont1": 1.0, "cat999": "Z"}});

    let (_, plain_value) = post_json("/predict", &plain).await;
    let (_, extra_value) = post_json("/predict", &extra).await;

    assert_eq!(plain_value, extra_value);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let (status, body) = get("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("claimsev_http_requests_total"));
    assert!(text.contains("claimsev_model_trees 2"));
}
