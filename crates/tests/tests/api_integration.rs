use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use triage_api::{build_router, ApiState, EMPTY_CONTENT_DETAIL, INTERNAL_ERROR_DETAIL};
use triage_inference::{Gateway, GatewayError, InferenceGateway, ScriptedGateway};

const CLASSIFICATION_JSON: &str = r#"{"category":"produtivo","confidence":0.95,"reasoning":"menciona reunião e contrato","keywords":["reunião","contrato"]}"#;
const REPLY: &str = "Obrigado, vamos revisar e retornar em breve.";

fn app_with<G>(gateway: G) -> (Router, ApiState<G>)
where
    G: InferenceGateway + 'static,
{
    let state = ApiState::new(
        gateway,
        Duration::from_secs(5),
        vec!["http://localhost:3000".to_string()],
    );
    (build_router(state.clone()), state)
}

fn classify_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classify")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_model_and_metrics() {
    let (app, _) = app_with(ScriptedGateway::new());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["model"], "scripted");
    assert_eq!(parsed["gateway_configured"], true);
    assert_eq!(parsed["metrics"]["requests_total"], 0);
}

#[tokio::test]
async fn classify_returns_category_reply_and_analysis() {
    let (app, state) = app_with(ScriptedGateway::new().reply(CLASSIFICATION_JSON).reply(REPLY));

    let response = app
        .oneshot(classify_request(json!({
            "content": "Precisamos agendar uma reunião para revisar o contrato.",
            "subject": "Reunião",
            "sender": "a@b.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let parsed = read_json(response).await;
    assert_eq!(parsed["category"], "productive");
    assert_eq!(parsed["confidence"], 0.95);
    assert_eq!(parsed["suggested_response"], REPLY);
    assert_eq!(parsed["analysis"]["content_length"], 55);
    assert_eq!(parsed["analysis"]["has_subject"], true);
    assert_eq!(parsed["analysis"]["sender"], "a@b.com");
    assert_eq!(parsed["analysis"]["keywords"], json!(["reunião", "contrato"]));
    assert!(parsed["processing_time"].as_f64().is_some());
    assert_eq!(state.orchestrator.gateway().calls(), 2);
}

#[tokio::test]
async fn empty_content_is_a_bad_request() {
    let (app, state) = app_with(ScriptedGateway::new().reply(CLASSIFICATION_JSON));

    let response = app
        .oneshot(classify_request(json!({ "content": "   ", "subject": "Oi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed = read_json(response).await;
    assert_eq!(parsed["error"], "empty_content");
    assert_eq!(parsed["detail"], EMPTY_CONTENT_DETAIL);
    assert_eq!(state.orchestrator.gateway().calls(), 0);
}

#[tokio::test]
async fn gateway_failure_is_an_opaque_internal_error() {
    let (app, state) = app_with(ScriptedGateway::new().fail(GatewayError::Status {
        status: 503,
        body: "upstream overloaded".to_string(),
    }));

    let response = app
        .oneshot(classify_request(json!({ "content": "Segue o relatório." })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let parsed = read_json(response).await;
    assert_eq!(parsed["detail"], INTERNAL_ERROR_DETAIL);
    assert!(!parsed.to_string().contains("overloaded"));
    assert_eq!(state.orchestrator.gateway().calls(), 1);
    assert_eq!(state.metrics.snapshot().gateway_failures_total, 1);
}

#[tokio::test]
async fn malformed_model_output_is_an_internal_error() {
    let (app, state) = app_with(
        ScriptedGateway::new()
            .reply("sure, here's my answer: produtivo")
            .reply(REPLY),
    );

    let response = app
        .oneshot(classify_request(json!({ "content": "Segue o relatório." })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.orchestrator.gateway().calls(), 1);
    assert_eq!(state.metrics.snapshot().malformed_responses_total, 1);
}

#[tokio::test]
async fn reply_failure_is_an_internal_error() {
    let (app, state) = app_with(
        ScriptedGateway::new()
            .reply(CLASSIFICATION_JSON)
            .fail(GatewayError::Transport("connection reset".to_string())),
    );

    let response = app
        .oneshot(classify_request(json!({ "content": "Segue o relatório." })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.orchestrator.gateway().calls(), 2);
}

#[tokio::test]
async fn missing_content_field_is_rejected_before_classification() {
    let (app, state) = app_with(ScriptedGateway::new());

    let response = app
        .oneshot(classify_request(json!({ "subject": "sem corpo" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(state.orchestrator.gateway().calls(), 0);
}

#[tokio::test]
async fn unconfigured_gateway_serves_health_but_fails_classification() {
    let (app, state) = app_with(Gateway::Unconfigured {
        reason: "TRIAGE_HF_API_KEY is not set".to_string(),
    });

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(read_json(health).await["gateway_configured"], false);

    let response = app
        .oneshot(classify_request(json!({ "content": "Segue o relatório." })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["detail"], INTERNAL_ERROR_DETAIL);
    assert_eq!(state.metrics.snapshot().configuration_failures_total, 1);
}
