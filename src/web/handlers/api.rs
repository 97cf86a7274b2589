use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::db::DbError;
use crate::pipeline::{PipelineError, PipelineOutput};
use crate::query::models::ResultRow;
use crate::query::sanitize::sanitize;
use crate::web::map::{build_map_layer, MapLayer};
use crate::web::state::AppState;

// Query types

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    #[serde(flatten)]
    pub output: PipelineOutput,
    pub map: MapLayer,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteQueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub backend: String,
    pub model: String,
    pub table: String,
}

// API Implementations

// Natural language question -> SQL -> rows -> summary
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question must not be empty".to_string()));
    }
    info!("NL question: {}", question);

    // The pipeline itself never cancels; bound the whole request here
    let limit = Duration::from_secs(state.config.web.request_timeout_secs);
    let output = match tokio::time::timeout(limit, state.pipeline.ask(question)).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(pipeline_error_response(&e)),
        Err(_) => {
            error!("Question timed out after {:?}", limit);
            return Err((
                StatusCode::GATEWAY_TIMEOUT,
                format!("Question timed out after {} seconds", limit.as_secs()),
            ));
        }
    };

    let map = build_map_layer(&output.results, &state.palette);
    Ok(Json(AskResponse { output, map }))
}

fn pipeline_error_response(e: &PipelineError) -> (StatusCode, String) {
    let status = match e {
        PipelineError::TranslationFailed(_) | PipelineError::SummarizationFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        PipelineError::ExecutionFailed(DbError::Query(_)) => StatusCode::BAD_REQUEST,
        PipelineError::ExecutionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

// Query execution
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteQueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let start_time = Instant::now();

    let statement = sanitize(&payload.query)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "SQL error: empty statement".to_string()))?;

    let result = state.pipeline.executor().execute(&statement).await.map_err(|e| {
        let status = match e {
            DbError::Query(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, e.to_string())
    })?;

    Ok(Json(QueryResponse {
        sql: statement.to_string(),
        row_count: result.len(),
        columns: result.columns,
        rows: result.rows,
        execution_time_ms: start_time.elapsed().as_millis() as u64,
    }))
}

// System status
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        backend: state.config.llm.backend.clone(),
        model: state.config.llm.model.clone(),
        table: state.config.database.table.clone(),
    })
}
