//! Configuration management for the travel adviser
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TravelAdviserError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdviserConfig {
    /// Catalog store connection
    #[serde(default)]
    pub store: StoreConfig,
    /// Language model endpoint
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval pipeline limits
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which catalog implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Neo4j over its HTTP transactional endpoint
    #[default]
    Neo4j,
    /// JSON catalog file loaded into memory
    Memory,
}

/// Catalog store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Neo4j HTTP base URL
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_store_database")]
    pub database: String,
    #[serde(default = "default_store_user")]
    pub user: String,
    pub password: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_seconds: u32,
    /// Catalog JSON file for the memory backend
    pub catalog_path: Option<String>,
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,
    #[serde(default = "default_llm_path")]
    pub path: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u32,
}

/// Retrieval pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Neighborhood radius around the destination
    #[serde(default = "default_search_radius")]
    pub search_radius_km: f64,
    /// Maximum neighbor cities per lookup
    #[serde(default = "default_max_neighbor_cities")]
    pub max_neighbor_cities: u32,
    /// Maximum attraction rows fetched from the store
    #[serde(default = "default_max_attraction_rows")]
    pub max_attraction_rows: u32,
    /// Absolute cap on attractions handed to generation
    #[serde(default = "default_hard_limit_records")]
    pub hard_limit_records: u32,
    /// Stay length used when the user gave none
    #[serde(default = "default_stay_days")]
    pub default_stay_days: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Maximum request body size in KiB
    #[serde(default = "default_max_body_kb")]
    pub max_body_kb: u32,
}

// Default value functions
fn default_store_url() -> String {
    "http://localhost:7474".to_string()
}

fn default_store_database() -> String {
    "neo4j".to_string()
}

fn default_store_user() -> String {
    "neo4j".to_string()
}

fn default_store_timeout() -> u32 {
    30
}

fn default_llm_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_path() -> String {
    "/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_llm_timeout() -> u32 {
    60
}

fn default_search_radius() -> f64 {
    30.0
}

fn default_max_neighbor_cities() -> u32 {
    10
}

fn default_max_attraction_rows() -> u32 {
    100
}

fn default_hard_limit_records() -> u32 {
    10
}

fn default_stay_days() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_request_timeout() -> u32 {
    120
}

fn default_max_body_kb() -> u32 {
    256
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            database: default_store_database(),
            user: default_store_user(),
            password: None,
            timeout_seconds: default_store_timeout(),
            catalog_path: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_llm_api_base(),
            path: default_llm_path(),
            model: default_llm_model(),
            api_key: None,
            temperature: 0.0,
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_radius_km: default_search_radius(),
            max_neighbor_cities: default_max_neighbor_cities(),
            max_attraction_rows: default_max_attraction_rows(),
            hard_limit_records: default_hard_limit_records(),
            default_stay_days: default_stay_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_kb: default_max_body_kb(),
        }
    }
}

impl AdviserConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TRAVEL_ADVISER_STORE__PASSWORD
        builder = builder.add_source(
            Environment::with_prefix("TRAVEL_ADVISER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AdviserConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-adviser").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.store.url.is_empty() {
            self.store.url = default_store_url();
        }
        if self.store.database.is_empty() {
            self.store.database = default_store_database();
        }
        if self.store.timeout_seconds == 0 {
            self.store.timeout_seconds = default_store_timeout();
        }
        if self.llm.api_base.is_empty() {
            self.llm.api_base = default_llm_api_base();
        }
        if self.llm.path.is_empty() {
            self.llm.path = default_llm_path();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.llm.timeout_seconds == 0 {
            self.llm.timeout_seconds = default_llm_timeout();
        }
        if self.retrieval.max_neighbor_cities == 0 {
            self.retrieval.max_neighbor_cities = default_max_neighbor_cities();
        }
        if self.retrieval.max_attraction_rows == 0 {
            self.retrieval.max_attraction_rows = default_max_attraction_rows();
        }
        if self.retrieval.hard_limit_records == 0 {
            self.retrieval.hard_limit_records = default_hard_limit_records();
        }
        if self.retrieval.default_stay_days == 0 {
            self.retrieval.default_stay_days = default_stay_days();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.server.max_body_kb == 0 {
            self.server.max_body_kb = default_max_body_kb();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate credentials and backend requirements
    pub fn validate_credentials(&self) -> Result<()> {
        if let Some(api_key) = &self.llm.api_key {
            if api_key.is_empty() {
                return Err(TravelAdviserError::config(
                    "LLM API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        if self.store.backend == StoreBackend::Memory && self.store.catalog_path.is_none() {
            return Err(TravelAdviserError::config(
                "The memory store backend requires store.catalog_path",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(self.retrieval.search_radius_km > 0.0 && self.retrieval.search_radius_km <= 500.0) {
            return Err(
                TravelAdviserError::config("Search radius must be within (0, 500] km").into(),
            );
        }

        if self.retrieval.max_neighbor_cities > 100 {
            return Err(
                TravelAdviserError::config("Maximum neighbor cities cannot exceed 100").into(),
            );
        }

        if self.retrieval.max_attraction_rows > 1000 {
            return Err(
                TravelAdviserError::config("Maximum attraction rows cannot exceed 1000").into(),
            );
        }

        if self.retrieval.hard_limit_records > 100 {
            return Err(TravelAdviserError::config("Hard record limit cannot exceed 100").into());
        }

        if self.retrieval.default_stay_days > 30 {
            return Err(
                TravelAdviserError::config("Default stay cannot exceed 30 days").into(),
            );
        }

        if self.store.timeout_seconds > 300 || self.llm.timeout_seconds > 300 {
            return Err(
                TravelAdviserError::config("Upstream timeout cannot exceed 300 seconds").into(),
            );
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(
                TravelAdviserError::config("LLM temperature must be within [0, 2]").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelAdviserError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelAdviserError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (label, url) in [("Store", &self.store.url), ("LLM", &self.llm.api_base)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TravelAdviserError::config(format!(
                    "{label} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if !self.llm.path.starts_with('/') {
            return Err(TravelAdviserError::config("LLM path must start with '/'").into());
        }

        Ok(())
    }
}
