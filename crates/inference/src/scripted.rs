use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::{GatewayError, InferenceGateway};

/// Replays queued completions in order and records every prompt it sees.
/// Test stand-in for the hosted model; an exhausted queue fails like a dead
/// backend.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, error: GatewayError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl InferenceGateway for ScriptedGateway {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.replies.lock().pop_front();
        next.unwrap_or_else(|| {
            Err(GatewayError::Transport(
                "scripted gateway has no reply queued".to_string(),
            ))
        })
    }
}
