pub mod gemini;
pub mod ollama;
pub mod remote;

use crate::config::LlmConfig;
use crate::llm::{LlmError, TextGenerator};
use reqwest::StatusCode;
use std::sync::Arc;

pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    let provider: Arc<dyn TextGenerator> = match config.backend.as_str() {
        "gemini" => Arc::new(gemini::GeminiProvider::new(config)?),
        "remote" => Arc::new(remote::RemoteLlmProvider::new(config)?),
        "ollama" => Arc::new(ollama::OllamaProvider::new(config)?),
        _ => {
            return Err(LlmError::ConfigError(format!(
                "Unsupported LLM backend: {}",
                config.backend
            )))
        }
    };

    Ok(provider)
}

/// Maps a non-success HTTP status to the gateway's error taxonomy.
pub(crate) fn status_error(service: &str, status: StatusCode, body: &str) -> LlmError {
    let message = format!("{} responded with status code: {} - {}", service, status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
        LlmError::RateLimited(message)
    } else {
        LlmError::ServiceError(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn throttling_statuses_are_rate_limits() {
        assert!(status_error("Gemini", StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(
            status_error("Gemini", StatusCode::BAD_REQUEST, "{\"status\": \"RESOURCE_EXHAUSTED\"}")
                .is_retryable()
        );
        assert!(!status_error("Gemini", StatusCode::INTERNAL_SERVER_ERROR, "oops").is_retryable());
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let mut config = AppConfig::default().llm;
        config.backend = "carrier-pigeon".to_string();
        assert!(matches!(build_provider(&config), Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn gemini_requires_api_key() {
        let config = AppConfig::default().llm;
        assert!(matches!(build_provider(&config), Err(LlmError::ConfigError(_))));

        let mut config = AppConfig::default().llm;
        config.api_key = Some("secret".to_string());
        assert!(build_provider(&config).is_ok());
    }
}
