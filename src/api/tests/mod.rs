//! API Tests
//!
//! - mod.rs: page, health, metrics and model endpoints
//! - calculate: `POST /calculate` success and error paths


use super::test_helpers::*;
use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

async fn get_body(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("test"),
        )
        .await
        .expect("test");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test");
    (status, body.to_vec())
}

#[tokio::test]
async fn test_index_page() {
    let (status, body) = get_body(create_test_app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).expect("test");
    assert!(html.contains("<form"));
    assert!(html.contains("/calculate"));
    assert!(html.contains("spend_value"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get_body(create_test_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body).expect("test");
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, crate::VERSION);
    assert!(health.model_loaded);
}

#[tokio::test]
async fn test_model_endpoint_without_training_report() {
    let (status, body) = get_body(create_test_app(), "/model").await;
    assert_eq!(status, StatusCode::OK);
    let model: ModelResponse = serde_json::from_slice(&body).expect("test");
    assert_eq!(model.model, "LinearStub");
    assert_eq!(model.rows, 12);
    assert_eq!(model.mae, 2);
    assert!(model.training.is_none());
}

#[tokio::test]
async fn test_metrics_endpoint_reflects_requests() {
    let state = stub_state(Arc::new(TinyRenderer));
    let app = create_router(state.clone());

    let status = calculate::post_calculate(app.clone(), r#"{"spend_value": 1000}"#)
        .await
        .0;
    assert_eq!(status, StatusCode::OK);
    let status = calculate::post_calculate(app.clone(), r#"{"spend_value": "abc"}"#)
        .await
        .0;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_body(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).expect("test");
    assert!(text.contains("pronosticar_requests_total 2"));
    assert!(text.contains("pronosticar_requests_successful 1"));
    assert!(text.contains("pronosticar_requests_failed{kind=\"invalid_input\"} 1"));
    assert_eq!(state.metrics().snapshot().total_requests, 2);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = get_body(create_test_app(), "/v1/predict").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn test_status_mapping() {
    assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
    assert_eq!(
        status_for(ErrorKind::InvalidComputation),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_for(ErrorKind::Internal),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_boot_errors_reported_as_internal() {
    let (status, Json(body)) = error_response(&ForecastError::InsufficientData {
        required: 2,
        found: 0,
    });
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.kind, "internal");
}
