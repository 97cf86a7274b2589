use clap::Parser;
use r2d2::Pool;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use realty_lens::config::{AppConfig, CliArgs};
use realty_lens::context::ContextDocuments;
use realty_lens::db::db_pool::DuckDBConnectionManager;
use realty_lens::db::executor::DuckDbExecutor;
use realty_lens::ingest::load_dataset;
use realty_lens::llm::ModelGateway;
use realty_lens::pipeline::QueryPipeline;
use realty_lens::util::logging::init_tracing;
use realty_lens::web::{self, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.log_json);

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Initializing DuckDB connection pool at {}", config.database.connection_string);
    let db_manager = DuckDBConnectionManager::open(&config.database.connection_string)?;
    let pool = Pool::builder()
        .max_size(config.database.pool_size as u32)
        .build(db_manager)?;

    if let Some(seed_file) = &config.database.seed_file {
        info!("Loading dataset {} into {}", seed_file, config.database.table);
        load_dataset(&pool, Path::new(seed_file), &config.database.table)?;
    }

    let context = ContextDocuments::load(&config.context)?;

    // Initialize model gateway
    info!("Initializing model gateway with backend: {}", config.llm.backend);
    let gateway = Arc::new(ModelGateway::from_config(&config.llm)?);

    let pipeline = QueryPipeline::new(gateway, Arc::new(DuckDbExecutor::new(pool)), context)?;

    if let Some(question) = &args.ask {
        let output = pipeline.ask(question).await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let app_state = Arc::new(AppState::new(config.clone(), pipeline));

    // Start the web server
    info!("Starting realty-lens server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
