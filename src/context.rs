use crate::config::ContextConfig;
use crate::query::models::TranslationRequest;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct ContextError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error reading context file {}: {}", self.path.display(), self.source)
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// The three documents that steer translation. Their content is passed through as-is.
#[derive(Debug, Clone, Default)]
pub struct ContextDocuments {
    pub business_context: String,
    pub schema_description: String,
    pub example_pairs: String,
}

impl ContextDocuments {
    pub fn load(config: &ContextConfig) -> Result<Self, ContextError> {
        let docs = Self {
            business_context: read(&config.business_context)?,
            schema_description: read(&config.schema_information)?,
            example_pairs: read(&config.prompt_query_pairs)?,
        };
        info!(
            "Loaded context documents ({} / {} / {} bytes)",
            docs.business_context.len(),
            docs.schema_description.len(),
            docs.example_pairs.len()
        );
        Ok(docs)
    }

    pub fn request(&self, question: &str) -> TranslationRequest {
        TranslationRequest {
            user_question: question.to_string(),
            business_context: self.business_context.clone(),
            schema_description: self.schema_description.clone(),
            example_pairs: self.example_pairs.clone(),
        }
    }
}

fn read(path: &str) -> Result<String, ContextError> {
    std::fs::read_to_string(Path::new(path)).map_err(|source| ContextError {
        path: PathBuf::from(path),
        source,
    })
}
