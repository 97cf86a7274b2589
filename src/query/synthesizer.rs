use crate::llm::prompts::PromptLibrary;
use crate::llm::{LlmError, ModelGateway};
use crate::query::models::{QueryStatement, TranslationRequest};
use crate::query::sanitize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns a question plus its context documents into one executable statement.
pub struct QuerySynthesizer {
    gateway: Arc<ModelGateway>,
    prompts: Arc<PromptLibrary>,
}

impl QuerySynthesizer {
    pub fn new(gateway: Arc<ModelGateway>, prompts: Arc<PromptLibrary>) -> Self {
        Self { gateway, prompts }
    }

    pub async fn synthesize(&self, request: &TranslationRequest) -> Result<QueryStatement, LlmError> {
        info!("Generating SQL for question: {}", request.user_question);

        let prompt = self.prompts.translation_prompt(request)?;
        debug!("Prepared LLM prompt: {}", prompt);

        let raw = self.gateway.generate(&prompt).await?;

        match sanitize::sanitize(&raw) {
            Some(statement) => {
                info!("Generated SQL: {}", statement);
                Ok(statement)
            }
            None => {
                warn!("Model reply held no SQL: {:?}", raw);
                Err(LlmError::InvalidResponse(
                    "Model reply did not contain a SQL statement".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{gateway, ScriptedGenerator};

    fn request(question: &str) -> TranslationRequest {
        TranslationRequest {
            user_question: question.to_string(),
            business_context: "NYC listings".to_string(),
            schema_description: "properties(address, price, borough)".to_string(),
            example_pairs: "[]".to_string(),
        }
    }

    fn synthesizer(generator: Arc<ScriptedGenerator>) -> QuerySynthesizer {
        QuerySynthesizer::new(Arc::new(gateway(generator)), Arc::new(PromptLibrary::new().unwrap()))
    }

    #[tokio::test]
    async fn manhattan_question_round_trip() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "```sql\nSELECT * FROM properties WHERE borough='Manhattan' ORDER BY price DESC LIMIT 10; -- done\n```"
                .to_string(),
        )]));
        let synthesizer = synthesizer(generator.clone());

        let sql = synthesizer
            .synthesize(&request("Show me the top 10 most expensive properties in Manhattan"))
            .await
            .unwrap();

        assert_eq!(
            sql.as_str(),
            "SELECT * FROM properties WHERE borough='Manhattan' ORDER BY price DESC LIMIT 10;"
        );
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Show me the top 10 most expensive properties in Manhattan"));
        assert!(prompts[0].contains("properties(address, price, borough)"));
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(LlmError::ServiceError(
            "unavailable".to_string(),
        ))]));

        let err = synthesizer(generator).synthesize(&request("anything")).await.unwrap_err();
        assert_eq!(err, LlmError::ServiceError("unavailable".to_string()));
    }

    #[tokio::test]
    async fn reply_without_sql_is_invalid() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("```sql\n-- sorry\n```".to_string())]));

        let err = synthesizer(generator).synthesize(&request("anything")).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
