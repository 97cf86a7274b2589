use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub pool_size: usize,
    /// CSV or Parquet file loaded into `table` at start-up
    pub seed_file: Option<String>,
    pub table: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "gemini", "remote", or "ollama"
    pub model: String,   // Model name
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub max_attempts: u32,
    pub backoff_base: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContextConfig {
    pub business_context: String,
    pub schema_information: String,
    pub prompt_query_pairs: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PropertyTypeColor {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MapConfig {
    pub property_types: Vec<PropertyTypeColor>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
    pub context: ContextConfig,
    pub map: MapConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Answer a single question and print the result instead of serving HTTP
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config_builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/realty-lens/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // REALTY_LENS__LLM__API_KEY=... and friends
        config_builder = config_builder.add_source(
            Environment::with_prefix("REALTY_LENS")
                .prefix_separator("__")
                .separator("__"),
        );

        // Build the config
        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }

        Ok(config)
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                connection_string: "realty-lens.duckdb".to_string(),
                pool_size: 5,
                seed_file: None,
                table: "properties".to_string(),
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                request_timeout_secs: 600,
            },
            llm: LlmConfig {
                backend: "gemini".to_string(),
                model: "gemini-1.5-pro-002".to_string(),
                api_key: None,
                api_url: None,
                max_output_tokens: 8192,
                temperature: 0.2,
                top_p: 0.95,
                max_attempts: 10,
                backoff_base: 2,
                timeout_secs: 120,
            },
            context: ContextConfig {
                business_context: "business_context.json".to_string(),
                schema_information: "schema_information.json".to_string(),
                prompt_query_pairs: "prompt_query_pairs.json".to_string(),
            },
            map: MapConfig {
                property_types: default_property_types(),
            },
        }
    }
}

// RdBu diverging palette, one stop per property type
fn default_property_types() -> Vec<PropertyTypeColor> {
    [
        ("Residential", "#ca0020"),
        ("Commercial", "#f4a582"),
        ("Industrial", "#f7f7f7"),
        ("Office", "#92c5de"),
        ("Multi-Family Residential", "#0571b0"),
    ]
    .into_iter()
    .map(|(name, color)| PropertyTypeColor {
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_generation_contract() {
        let config = AppConfig::default();
        assert_eq!(config.llm.max_output_tokens, 8192);
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.top_p, 0.95);
        assert_eq!(config.llm.max_attempts, 10);
        assert_eq!(config.llm.backoff_base, 2);
        assert_eq!(config.map.property_types.len(), 5);
    }

    #[test]
    fn cli_overrides_win_over_file_and_defaults() {
        let args = CliArgs {
            config: Some(PathBuf::from("does-not-matter.toml")),
            host: Some("0.0.0.0".to_string()),
            port: Some(8080),
            ..Default::default()
        };
        // A missing explicit file is an error, not a silent fallback
        assert!(AppConfig::new(&args).is_err());

        let args = CliArgs {
            host: Some("0.0.0.0".to_string()),
            port: Some(8080),
            ..Default::default()
        };
        let config = AppConfig::new(&args).unwrap();
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 8080);
    }
}
