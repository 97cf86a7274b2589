use crate::llm::prompts::PromptLibrary;
use crate::llm::{LlmError, ModelGateway};
use crate::query::models::{QueryStatement, ResultSet, SummaryText};
use crate::query::sanitize::collapse_whitespace;
use std::sync::Arc;
use tracing::{debug, info};

pub const NO_MATCHES: &str = "No properties matched the given criteria.";

/// Asks the model for a short prose summary of a query and its rows.
pub struct ResultSummarizer {
    gateway: Arc<ModelGateway>,
    prompts: Arc<PromptLibrary>,
}

impl ResultSummarizer {
    pub fn new(gateway: Arc<ModelGateway>, prompts: Arc<PromptLibrary>) -> Self {
        Self { gateway, prompts }
    }

    pub async fn summarize(&self, statement: &QueryStatement, rows: &ResultSet) -> Result<SummaryText, LlmError> {
        // Nothing for the model to find, and the caller still needs some text
        if rows.is_empty() {
            info!("Empty result set, skipping summarization");
            return Ok(SummaryText::new(NO_MATCHES.to_string()));
        }

        let results_json = serde_json::to_string(&rows.rows)
            .map_err(|e| LlmError::PromptError(format!("Failed to serialize rows: {}", e)))?;
        let prompt = self.prompts.summary_prompt(statement.as_str(), &results_json)?;
        debug!("Prepared summary prompt: {}", prompt);

        let raw = self.gateway.generate(&prompt).await?;
        let summary = normalize_summary(&raw);
        if summary.is_empty() {
            return Err(LlmError::InvalidResponse(
                "Summary was empty after normalization".to_string(),
            ));
        }

        info!("Summarized {} rows into {} chars", rows.len(), summary.len());
        Ok(SummaryText::new(summary))
    }
}

/// One line, printable ASCII only. Non-ASCII characters are dropped, not transliterated.
pub fn normalize_summary(text: &str) -> String {
    collapse_whitespace(text)
        .chars()
        .filter(|c| matches!(c, ' '..='~'))
        .collect::<String>()
        .trim()
        .to_string()
}
