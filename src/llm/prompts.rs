use crate::llm::LlmError;
use crate::query::models::TranslationRequest;
use minijinja::{context, Environment};

const TRANSLATE_SQL: &str = "translate_sql.txt";
const SUMMARIZE: &str = "summarize.txt";

/// Prompt templates shared by the synthesizer and the summarizer.
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, LlmError> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);

        env.add_template(TRANSLATE_SQL, include_str!("../../templates/translate_sql.txt"))
            .map_err(template_error)?;
        env.add_template(SUMMARIZE, include_str!("../../templates/summarize.txt"))
            .map_err(template_error)?;

        Ok(Self { env })
    }

    pub fn translation_prompt(&self, request: &TranslationRequest) -> Result<String, LlmError> {
        self.env
            .get_template(TRANSLATE_SQL)
            .and_then(|tmpl| {
                tmpl.render(context! {
                    question => &request.user_question,
                    business_context => &request.business_context,
                    schema_description => &request.schema_description,
                    example_pairs => &request.example_pairs,
                })
            })
            .map_err(template_error)
    }

    pub fn summary_prompt(&self, sql: &str, results_json: &str) -> Result<String, LlmError> {
        self.env
            .get_template(SUMMARIZE)
            .and_then(|tmpl| tmpl.render(context! { sql => sql, results => results_json }))
            .map_err(template_error)
    }
}

fn template_error(e: minijinja::Error) -> LlmError {
    LlmError::PromptError(e.to_string())
}
