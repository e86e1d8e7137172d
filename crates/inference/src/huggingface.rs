use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{GatewayError, InferenceGateway};

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MODEL: &str = "CohereLabs/aya-expanse-8b";
pub const DEFAULT_PROVIDER: &str = "cohere";

#[derive(Clone)]
pub struct GatewaySettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub provider: Option<String>,
}

impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish()
    }
}

impl GatewaySettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider: Some(DEFAULT_PROVIDER.to_string()),
        }
    }

    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read("TRIAGE_HF_API_KEY")
            .or_else(|| read("HUGGINGFACE_API_KEY"))
            .ok_or_else(|| {
                GatewayError::NotConfigured(
                    "neither TRIAGE_HF_API_KEY nor HUGGINGFACE_API_KEY is set".to_string(),
                )
            })?;

        let mut settings = Self::new(api_key);
        if let Some(base_url) = read("TRIAGE_HF_BASE_URL") {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = read("TRIAGE_HF_MODEL") {
            settings.model = model;
        }
        if let Some(provider) = read("TRIAGE_HF_PROVIDER") {
            settings.provider = if provider.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(provider)
            };
        }

        Ok(settings)
    }

    /// Model name as the router expects it, with the provider suffix.
    pub fn routed_model(&self) -> String {
        match &self.provider {
            Some(provider) => format!("{}:{}", self.model, provider),
            None => self.model.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct HuggingFaceGateway {
    client: Client,
    settings: GatewaySettings,
    endpoint: String,
    routed_model: String,
}

impl HuggingFaceGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .build()
            .map_err(|error| {
                GatewayError::NotConfigured(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url),
            routed_model: settings.routed_model(),
            settings,
        })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }
}

impl InferenceGateway for HuggingFaceGateway {
    fn model_id(&self) -> &str {
        &self.settings.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.routed_model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let payload = ChatCompletionRequest {
            model: &self.routed_model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| GatewayError::InvalidEnvelope(error.to_string()))?;
        let text = extract_completion(body)?;
        debug!(completion_len = text.len(), "completion received");
        Ok(text)
    }
}

fn extract_completion(body: ChatCompletionResponse) -> Result<String, GatewayError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidEnvelope("response has no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::EmptyCompletion);
    }
    Ok(trimmed.to_string())
}
