use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use triage_agents::{ClassificationOrchestrator, ClassifyError, DEFAULT_STAGE_TIMEOUT};
use triage_core::EmailInput;
use triage_inference::{Gateway, InferenceGateway};
use triage_observability::{AppMetrics, MetricsSnapshot};

pub const EMPTY_CONTENT_DETAIL: &str = "Conteúdo do email não pode estar vazio";
pub const INTERNAL_ERROR_DETAIL: &str = "Erro interno do servidor";

const MAX_BODY_BYTES: usize = 256 * 1024;
const DEFAULT_PORT: &str = "8000";

pub struct ApiState<G>
where
    G: InferenceGateway,
{
    pub orchestrator: Arc<ClassificationOrchestrator<G>>,
    pub metrics: Arc<AppMetrics>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl<G> Clone for ApiState<G>
where
    G: InferenceGateway,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            metrics: self.metrics.clone(),
            allowed_origins: self.allowed_origins.clone(),
        }
    }
}

impl<G> ApiState<G>
where
    G: InferenceGateway,
{
    pub fn new(gateway: G, stage_timeout: Duration, allowed_origins: Vec<String>) -> Self {
        let metrics = AppMetrics::shared();
        let orchestrator = ClassificationOrchestrator::new(Arc::new(gateway), metrics.clone())
            .with_stage_timeout(stage_timeout);

        Self {
            orchestrator: Arc::new(orchestrator),
            metrics,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    model: String,
    gateway_configured: bool,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: &'static str,
}

/// Builds the production router: gateway, timeouts and CORS come from the
/// environment.
pub fn build_app() -> Result<Router> {
    let gateway = Gateway::from_env();
    let stage_timeout = stage_timeout_from_env()?;
    let allowed_origins = parse_allowed_origins();

    info!(
        model = %gateway.model_id(),
        gateway_configured = gateway.is_configured(),
        stage_timeout_secs = stage_timeout.as_secs(),
        "classifier configured"
    );

    Ok(build_router(ApiState::new(
        gateway,
        stage_timeout,
        allowed_origins,
    )))
}

pub fn build_router<G>(state: ApiState<G>) -> Router
where
    G: InferenceGateway + 'static,
{
    Router::new()
        .route("/health", get(health::<G>))
        .route("/classify", post(classify::<G>))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

pub fn bind_address() -> String {
    env::var("TRIAGE_BIND").unwrap_or_else(|_| {
        let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        format!("0.0.0.0:{port}")
    })
}

async fn health<G>(State(state): State<ApiState<G>>) -> impl IntoResponse
where
    G: InferenceGateway + 'static,
{
    let gateway = state.orchestrator.gateway();
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        model: gateway.model_id().to_string(),
        gateway_configured: gateway.is_configured(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn classify<G>(State(state): State<ApiState<G>>, Json(input): Json<EmailInput>) -> Response
where
    G: InferenceGateway + 'static,
{
    match state.orchestrator.classify(input).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(&error),
    }
}

/// Maps orchestrator failures to HTTP. Server-side detail stays in the logs;
/// callers only see the generic message.
fn error_response(error: &ClassifyError) -> Response {
    if error.is_client_error() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: error.code(),
                detail: EMPTY_CONTENT_DETAIL,
            }),
        )
            .into_response();
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal_error",
            detail: INTERNAL_ERROR_DETAIL,
        }),
    )
        .into_response()
}

fn stage_timeout_from_env() -> Result<Duration> {
    match env::var("TRIAGE_STAGE_TIMEOUT_SECONDS") {
        Ok(value) => {
            let seconds = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid TRIAGE_STAGE_TIMEOUT_SECONDS {value:?}"))?;
            Ok(Duration::from_secs(seconds.max(1)))
        }
        Err(_) => Ok(DEFAULT_STAGE_TIMEOUT),
    }
}

pub fn parse_allowed_origins() -> Vec<String> {
    let default_origins = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "https://ai-email-response.vercel.app",
    ];

    env::var("TRIAGE_ALLOWED_ORIGINS")
        .ok()
        .map(|value| split_origins(&value))
        .unwrap_or_else(|| {
            default_origins
                .iter()
                .map(|value| value.to_string())
                .collect()
        })
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_inference::{GatewayError, ScriptedGateway};

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            split_origins(" https://a.example/ ,, http://localhost:3000"),
            vec!["https://a.example", "http://localhost:3000"]
        );
    }

    #[test]
    fn only_empty_content_is_a_client_error() {
        let response = error_response(&ClassifyError::EmptyContent);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(&ClassifyError::Gateway(GatewayError::EmptyCompletion));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = error_response(&ClassifyError::Configuration("missing".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn state_shares_metrics_with_orchestrator() {
        let state = ApiState::new(
            ScriptedGateway::new(),
            Duration::from_secs(1),
            vec!["http://localhost:3000".to_string()],
        );
        assert!(Arc::ptr_eq(&state.metrics, state.orchestrator.metrics()));
    }
}
