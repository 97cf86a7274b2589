pub mod prompts;
pub mod providers;
pub mod retry;

use crate::config::LlmConfig;
use async_trait::async_trait;
use retry::RetryPolicy;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum LlmError {
    /// The service throttled the caller; the only retryable failure.
    RateLimited(String),
    ServiceError(String),
    InvalidResponse(String),
    PromptError(String),
    ConfigError(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::RateLimited(msg) => write!(f, "LLM rate limited: {}", msg),
            LlmError::ServiceError(msg) => write!(f, "LLM service error: {}", msg),
            LlmError::InvalidResponse(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::PromptError(msg) => write!(f, "LLM prompt error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// Sampling settings sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 8192,
            temperature: 0.2,
            top_p: 0.95,
        }
    }
}

impl From<&LlmConfig> for GenerationOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

/// A single request/response call against a generative-language service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError>;
}

/// Sends prompts to a provider, retrying with exponential backoff while the service
/// reports resource exhaustion.
///
/// Holds no mutable state, so one gateway can serve concurrent questions.
pub struct ModelGateway {
    provider: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    retry: RetryPolicy,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn TextGenerator>, options: GenerationOptions, retry: RetryPolicy) -> Self {
        Self {
            provider,
            options,
            retry,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let provider = providers::build_provider(config)?;
        let retry = RetryPolicy::exponential(config.max_attempts, config.backoff_base);
        Ok(Self::new(provider, GenerationOptions::from(config), retry))
    }

    /// Returns the trimmed generated text, or the last failure once retries are exhausted.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::PromptError("prompt must not be empty".to_string()));
        }

        debug!("Sending prompt ({} chars) to model", prompt.len());
        let text = self
            .retry
            .run(
                |_attempt| self.provider.generate(prompt, &self.options),
                LlmError::is_retryable,
            )
            .await?;

        let text = text.trim().to_string();
        info!("Model returned {} chars", text.len());
        debug!("Raw model response: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes in order and records every prompt it receives.
    pub struct ScriptedGenerator {
        outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(outcomes: Vec<Result<String, LlmError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::ServiceError("script exhausted".to_string())))
        }
    }

    pub fn gateway(generator: Arc<ScriptedGenerator>) -> ModelGateway {
        ModelGateway::new(generator, GenerationOptions::default(), RetryPolicy::exponential(10, 2))
    }
}
