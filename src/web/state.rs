use crate::config::AppConfig;
use crate::pipeline::QueryPipeline;
use crate::web::map::PropertyPalette;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: QueryPipeline,
    pub palette: PropertyPalette,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: QueryPipeline) -> Self {
        let palette = PropertyPalette::from_config(&config.map);
        Self {
            config,
            pipeline,
            palette,
            startup_time: chrono::Utc::now(),
        }
    }
}
