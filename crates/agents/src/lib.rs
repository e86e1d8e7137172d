use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use triage_core::{
    build_classification_prompt, build_reply_prompt, clean_text, parse_classification, Analysis,
    Category, ClassificationResponse, EmailInput, ParseError,
};
use triage_inference::{GatewayError, InferenceGateway};
use triage_observability::AppMetrics;

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle of a single classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Cleaned,
    Classified,
    Replied,
    Completed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Cleaned => "cleaned",
            Self::Classified => "classified",
            Self::Replied => "replied",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("email content must not be empty")]
    EmptyContent,
    #[error("inference gateway is not configured: {0}")]
    Configuration(String),
    #[error("classification call failed: {0}")]
    Gateway(#[source] GatewayError),
    #[error(transparent)]
    MalformedResponse(#[from] ParseError),
    #[error("reply generation failed: {0}")]
    ReplyGenerationFailed(#[source] GatewayError),
}

impl ClassifyError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyContent)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "empty_content",
            Self::Configuration(_) => "configuration_error",
            Self::Gateway(_) => "gateway_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::ReplyGenerationFailed(_) => "reply_generation_failed",
        }
    }

    /// Last stage the request reached before failing.
    pub fn stage(&self) -> Stage {
        match self {
            Self::EmptyContent => Stage::Received,
            Self::Configuration(_) | Self::Gateway(_) | Self::MalformedResponse(_) => {
                Stage::Cleaned
            }
            Self::ReplyGenerationFailed(_) => Stage::Classified,
        }
    }

    fn from_classification_call(error: GatewayError) -> Self {
        match error {
            GatewayError::NotConfigured(reason) => Self::Configuration(reason),
            other => Self::Gateway(other),
        }
    }
}

/// Runs clean → classify → reply for one email. Each gateway call is made at
/// most once and bounded by the stage timeout.
pub struct ClassificationOrchestrator<G>
where
    G: InferenceGateway,
{
    gateway: Arc<G>,
    metrics: Arc<AppMetrics>,
    stage_timeout: Duration,
}

impl<G> ClassificationOrchestrator<G>
where
    G: InferenceGateway,
{
    pub fn new(gateway: Arc<G>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            gateway,
            metrics,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    #[instrument(skip(self, input), fields(model = %self.gateway.model_id()))]
    pub async fn classify(&self, input: EmailInput) -> Result<ClassificationResponse, ClassifyError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let outcome = self.run(&input, started).await;
        self.metrics.observe_latency(started.elapsed());

        match &outcome {
            Ok(response) => {
                self.metrics
                    .inc_classified(response.category == Category::Productive);
                info!(
                    category = response.category.as_code(),
                    confidence = response.confidence,
                    processing_time = response.processing_time,
                    "email classified"
                );
            }
            Err(failure) => self.record_failure(failure),
        }

        outcome
    }

    async fn run(
        &self,
        input: &EmailInput,
        started: Instant,
    ) -> Result<ClassificationResponse, ClassifyError> {
        debug!(stage = Stage::Received.as_str(), "request received");
        if !input.has_content() {
            return Err(ClassifyError::EmptyContent);
        }

        debug!(stage = Stage::Validated.as_str(), "content validated");
        let cleaned = clean_text(&input.combined_text());

        debug!(
            stage = Stage::Cleaned.as_str(),
            cleaned_len = cleaned.len(),
            "content cleaned"
        );
        let raw = self
            .call(build_classification_prompt(&cleaned))
            .await
            .map_err(ClassifyError::from_classification_call)?;
        let classification = parse_classification(&raw)?;

        debug!(
            stage = Stage::Classified.as_str(),
            category = classification.category.as_code(),
            "classification parsed"
        );
        let suggested_response = self
            .call(build_reply_prompt(&cleaned, classification.category))
            .await
            .map_err(ClassifyError::ReplyGenerationFailed)?;

        debug!(stage = Stage::Replied.as_str(), "reply generated");
        let response = ClassificationResponse {
            category: classification.category,
            confidence: classification.confidence,
            suggested_response,
            analysis: Analysis {
                reasoning: classification.reasoning,
                keywords: classification.keywords,
                content_length: input.content.chars().count(),
                has_subject: input.has_subject(),
                sender: input.sender_or_unknown().to_string(),
            },
            processing_time: started.elapsed().as_secs_f64(),
        };

        debug!(stage = Stage::Completed.as_str(), "response assembled");
        Ok(response)
    }

    async fn call(&self, prompt: String) -> Result<String, GatewayError> {
        match tokio::time::timeout(self.stage_timeout, self.gateway.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.stage_timeout)),
        }
    }

    fn record_failure(&self, failure: &ClassifyError) {
        let stage = failure.stage().as_str();
        match failure {
            ClassifyError::EmptyContent => {
                self.metrics.inc_rejected();
                warn!(stage, "rejected email with empty content");
            }
            ClassifyError::Configuration(reason) => {
                self.metrics.inc_configuration_failure();
                error!(stage, reason = %reason, "classification unavailable: gateway not configured");
            }
            ClassifyError::Gateway(source) => {
                self.metrics.inc_gateway_failure();
                error!(stage, kind = source.kind(), error = %source, "classification call failed");
            }
            ClassifyError::MalformedResponse(source) => {
                self.metrics.inc_malformed_response();
                error!(
                    stage,
                    reason = %source.reason,
                    raw = %source.raw,
                    "model returned a malformed classification"
                );
            }
            ClassifyError::ReplyGenerationFailed(source) => {
                self.metrics.inc_reply_failure();
                error!(stage, kind = source.kind(), error = %source, "reply generation failed");
            }
        }
    }
}
