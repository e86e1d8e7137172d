mod huggingface;
#[cfg(any(test, feature = "testing"))]
mod scripted;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub use huggingface::{GatewaySettings, HuggingFaceGateway, DEFAULT_BASE_URL, DEFAULT_MODEL};
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("inference gateway is not configured: {0}")]
    NotConfigured(String),
    #[error("inference backend unreachable: {0}")]
    Transport(String),
    #[error("inference backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("inference backend returned an unusable envelope: {0}")]
    InvalidEnvelope(String),
    #[error("inference backend returned an empty completion")]
    EmptyCompletion,
    #[error("inference call timed out after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not_configured",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::InvalidEnvelope(_) => "invalid_envelope",
            Self::EmptyCompletion => "empty_completion",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Boundary to the hosted text-generation model.
///
/// One prompt in, the generated text out. Implementations are shared across
/// concurrent requests and must not hold request state.
pub trait InferenceGateway: Send + Sync {
    fn model_id(&self) -> &str;

    fn is_configured(&self) -> bool {
        true
    }

    fn complete(&self, prompt: &str)
        -> impl Future<Output = Result<String, GatewayError>> + Send;
}

pub enum Gateway {
    HuggingFace(HuggingFaceGateway),
    Unconfigured { reason: String },
}

impl Gateway {
    /// Builds the production gateway from the environment. Missing
    /// credentials yield `Unconfigured`, which fails every call without
    /// touching the network.
    pub fn from_env() -> Self {
        match GatewaySettings::from_env().and_then(HuggingFaceGateway::new) {
            Ok(gateway) => Self::HuggingFace(gateway),
            Err(error) => {
                warn!(error = %error, "inference gateway disabled");
                Self::Unconfigured {
                    reason: error.to_string(),
                }
            }
        }
    }
}

impl InferenceGateway for Gateway {
    fn model_id(&self) -> &str {
        match self {
            Gateway::HuggingFace(gateway) => gateway.model_id(),
            Gateway::Unconfigured { .. } => "unconfigured",
        }
    }

    fn is_configured(&self) -> bool {
        matches!(self, Self::HuggingFace(_))
    }

    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        match self {
            Gateway::HuggingFace(gateway) => gateway.complete(prompt).await,
            Gateway::Unconfigured { reason } => Err(GatewayError::NotConfigured(reason.clone())),
        }
    }
}
