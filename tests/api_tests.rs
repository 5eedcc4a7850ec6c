//! End-to-end tests for the HTTP routes, driven through the router without a socket.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use churn_prediction_api::{
    config::ModelsConfig,
    create_router,
    feature_normalizer::FeatureNormalizer,
    metrics::ServiceMetrics,
    models::{classifier::LogisticClassifier, Scaler},
    AppState, ModelBundle,
};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

fn reference_customer() -> Value {
    json!({
        "customerID": "8779-PEZVU",
        "gender": "Female",
        "SeniorCitizen": 0,
        "Partner": "Yes",
        "Dependents": "No",
        "tenure": 1,
        "PhoneService": "No",
        "MultipleLines": "No internet service",
        "InternetService": "DSL",
        "OnlineSecurity": "No",
        "OnlineBackup": "Yes",
        "DeviceProtection": "No",
        "TechSupport": "No",
        "StreamingTV": "No",
        "StreamingMovies": "No",
        "Contract": "Month-to-month",
        "PaperlessBilling": "Yes",
        "PaymentMethod": "Electronic check",
        "MonthlyCharges": 29.85,
        "TotalCharges": 29.85
    })
}

/// Bundle built from the artifacts shipped in `models/`
fn shipped_bundle() -> ModelBundle {
    let config = ModelsConfig {
        models_dir: format!("{}/models", env!("CARGO_MANIFEST_DIR")),
        ..ModelsConfig::default()
    };
    ModelBundle::load(&config).expect("shipped artifacts should load")
}

/// Small bundle whose output depends only on the month-to-month contract flag
fn contract_bundle() -> ModelBundle {
    let columns: Vec<String> = [
        "SeniorCitizen",
        "tenure",
        "MonthlyCharges",
        "TotalCharges",
        "Contract_Month-to-month",
        "Contract_Two year",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    let scaler = Scaler::standard(vec![0.0; 3], vec![1.0; 3]);
    let normalizer = FeatureNormalizer::new(columns, scaler).unwrap();
    let classifier = LogisticClassifier::new(0.0, vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
    ModelBundle::new(Box::new(classifier), normalizer).unwrap()
}

fn app_with(bundle: ModelBundle) -> (Router, Arc<ServiceMetrics>) {
    let metrics = Arc::new(ServiceMetrics::new());
    let state = AppState::new(Arc::new(bundle), metrics.clone());
    (create_router(state), metrics)
}

fn predict_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_liveness() {
    let (app, _) = app_with(contract_bundle());
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Telco Churn Prediction API is running!");
}

#[tokio::test]
async fn test_reference_customer_with_shipped_model() {
    let (app, _) = app_with(shipped_bundle());

    let (status, body) = send_json(&app, predict_request(reference_customer().to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let probability = body["probability"].as_f64().unwrap();
    assert!(probability > 0.5 && probability < 0.55, "{probability}");
    assert_eq!(body["prediction"], json!(1));
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_long_tenure_customer_is_retained() {
    let (app, _) = app_with(shipped_bundle());
    let mut customer = reference_customer();
    customer["tenure"] = json!(60);
    customer["Contract"] = json!("Two year");
    customer["PaymentMethod"] = json!("Credit card (automatic)");
    customer["OnlineSecurity"] = json!("Yes");
    customer["TechSupport"] = json!("Yes");
    customer["PaperlessBilling"] = json!("No");
    customer["MonthlyCharges"] = json!(56.0);
    customer["TotalCharges"] = json!("3360.0");

    let (status, body) = send_json(&app, predict_request(customer.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!(0));
    assert!(body["probability"].as_f64().unwrap() < 0.2);
}

#[tokio::test]
async fn test_empty_record_still_predicts() {
    let (app, _) = app_with(shipped_bundle());

    let (status, body) = send_json(&app, predict_request("{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!(0));

    let probability = body["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
}

#[tokio::test]
async fn test_probability_at_threshold_is_not_churn() {
    let (app, _) = app_with(contract_bundle());

    // every feature is zero, so the logit is exactly 0
    let (status, body) = send_json(&app, predict_request("{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["probability"], json!(0.5));
    assert_eq!(body["prediction"], json!(0));
}

#[tokio::test]
async fn test_unknown_fields_and_values_are_ignored() {
    let (app, _) = app_with(contract_bundle());
    let body = json!({
        "Contract": "Month-to-month",
        "loyalty_tier": "gold",
        "PaymentMethod": "Crypto"
    });

    let (status, body) = send_json(&app, predict_request(body.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!(1));
    let expected = 1.0 / (1.0 + (-2.0f64).exp());
    assert!((body["probability"].as_f64().unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_malformed_body_returns_error_and_service_recovers() {
    let (app, metrics) = app_with(contract_bundle());

    let (status, body) = send_json(&app, predict_request("{\"tenure\": ")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert_eq!(body.as_object().unwrap().len(), 1);

    let (status, body) = send_json(&app, predict_request(reference_customer().to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!(1));

    assert_eq!(metrics.requests.load(Ordering::Relaxed), 2);
    assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.predictions.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let (app, _) = app_with(contract_bundle());

    for body in ["[1, 2, 3]", "\"Month-to-month\"", "42", ""] {
        let (status, response) = send_json(&app, predict_request(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {body:?}");
        assert!(response["error"].is_string(), "body: {body:?}");
    }
}

#[tokio::test]
async fn test_nested_value_is_rejected() {
    let (app, _) = app_with(contract_bundle());
    let body = json!({ "Contract": ["Month-to-month", "One year"] });

    let (status, response) = send_json(&app, predict_request(body.to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response["error"].as_str().unwrap().contains("Contract"));
}

#[tokio::test]
async fn test_content_type_is_not_required() {
    let (app, _) = app_with(contract_bundle());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .body(Body::from(r#"{"Contract": "Two year"}"#))
        .unwrap();

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["probability"], json!(0.5));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _) = app_with(contract_bundle());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_concurrent_requests_share_the_bundle() {
    let (app, metrics) = app_with(shipped_bundle());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            let mut customer = reference_customer();
            customer["tenure"] = json!(i * 4);
            tokio::spawn(async move {
                let (status, _) = send(&app, predict_request(customer.to_string())).await;
                status
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(metrics.predictions.load(Ordering::Relaxed), 16);
}
