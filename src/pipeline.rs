use crate::context::ContextDocuments;
use crate::db::executor::QueryExecutor;
use crate::db::DbError;
use crate::llm::prompts::PromptLibrary;
use crate::llm::{LlmError, ModelGateway};
use crate::query::models::{QueryStatement, ResultSet, SummaryText};
use crate::query::summarizer::ResultSummarizer;
use crate::query::synthesizer::QuerySynthesizer;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Translation,
    Execution,
    Summarization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Translation => f.write_str("query generation"),
            Stage::Execution => f.write_str("query execution"),
            Stage::Summarization => f.write_str("summarization"),
        }
    }
}

/// A failure in one stage; the stages after it never run.
#[derive(Debug)]
pub enum PipelineError {
    TranslationFailed(LlmError),
    ExecutionFailed(DbError),
    SummarizationFailed(LlmError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::TranslationFailed(_) => Stage::Translation,
            PipelineError::ExecutionFailed(_) => Stage::Execution,
            PipelineError::SummarizationFailed(_) => Stage::Summarization,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::TranslationFailed(e) => write!(f, "Query generation failed: {}", e),
            PipelineError::ExecutionFailed(e) => write!(f, "Query execution failed: {}", e),
            PipelineError::SummarizationFailed(e) => write!(f, "Summarization failed: {}", e),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::TranslationFailed(e) | PipelineError::SummarizationFailed(e) => Some(e),
            PipelineError::ExecutionFailed(e) => Some(e),
        }
    }
}

/// Everything one question produces, handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub sql: QueryStatement,
    pub results: ResultSet,
    pub summary: SummaryText,
}

/// question -> SQL -> rows -> summary, strictly in that order.
pub struct QueryPipeline {
    synthesizer: QuerySynthesizer,
    executor: Arc<dyn QueryExecutor>,
    summarizer: ResultSummarizer,
    context: ContextDocuments,
}

impl QueryPipeline {
    pub fn new(
        gateway: Arc<ModelGateway>,
        executor: Arc<dyn QueryExecutor>,
        context: ContextDocuments,
    ) -> Result<Self, LlmError> {
        let prompts = Arc::new(PromptLibrary::new()?);
        Ok(Self {
            synthesizer: QuerySynthesizer::new(Arc::clone(&gateway), Arc::clone(&prompts)),
            executor,
            summarizer: ResultSummarizer::new(gateway, prompts),
            context,
        })
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub async fn ask(&self, question: &str) -> Result<PipelineOutput, PipelineError> {
        let request = self.context.request(question);

        let sql = self
            .synthesizer
            .synthesize(&request)
            .await
            .map_err(PipelineError::TranslationFailed)
            .inspect_err(log_failure)?;

        let results = self
            .executor
            .execute(&sql)
            .await
            .map_err(PipelineError::ExecutionFailed)
            .inspect_err(log_failure)?;
        info!("Results received: {} rows", results.len());

        let summary = self
            .summarizer
            .summarize(&sql, &results)
            .await
            .map_err(PipelineError::SummarizationFailed)
            .inspect_err(log_failure)?;

        Ok(PipelineOutput {
            sql,
            results,
            summary,
        })
    }
}

fn log_failure(e: &PipelineError) {
    error!(stage = %e.stage(), "{}", e);
}
