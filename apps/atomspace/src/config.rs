//! # Configuration
//!
//! TOML configuration for the server and CLI.
//!
//! Values are resolved in order:
//! 1. Built-in defaults
//! 2. The file passed with `--config`
//! 3. `ATOMSPACE_*` environment variables
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [logging]
//! format = "json"
//!
//! [query]
//! max_results = 1000
//!
//! [[types]]
//! name = "Concept"
//! parent = "Node"
//! ```

use crate::api::TypeJson;
use crate::error::AppError;
use atomspace_core::{AtomSpace, QueryLimits};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub query: QueryConfig,
    /// Types registered at startup, parents before children.
    pub types: Vec<TypeJson>,
}

impl Config {
    /// Load the file at `path` (or defaults), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ATOMSPACE_HOST`, `ATOMSPACE_PORT`, `ATOMSPACE_LOG_FORMAT` and
    /// `ATOMSPACE_CORS_ORIGINS`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AppError> {
        if let Some(host) = lookup("ATOMSPACE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ATOMSPACE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| AppError::Config(format!("ATOMSPACE_PORT '{}': {}", port, e)))?;
        }
        if let Some(format) = lookup("ATOMSPACE_LOG_FORMAT") {
            self.logging.format = match format.as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                other => {
                    return Err(AppError::Config(format!(
                        "ATOMSPACE_LOG_FORMAT must be 'text' or 'json', got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(origins) = lookup("ATOMSPACE_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".into(),
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(AppError::Config(
                "server.body_limit_bytes must be greater than 0".into(),
            ));
        }
        if self.query.max_results == 0 || self.query.max_steps == 0 {
            return Err(AppError::Config(
                "query.max_results and query.max_steps must be greater than 0".into(),
            ));
        }
        if let Some(t) = self.types.iter().find(|t| t.name.trim().is_empty()) {
            return Err(AppError::Config(format!(
                "type names must not be empty (parent {:?})",
                t.parent
            )));
        }
        Ok(())
    }

    /// Create a store with the configured types registered.
    pub fn build_space(&self) -> Result<AtomSpace, AppError> {
        let space = AtomSpace::new();
        for decl in &self.types {
            space
                .register_type(&decl.name, decl.parent.as_deref())
                .map_err(|e| AppError::Config(format!("type '{}': {}", decl.name, e)))?;
        }
        Ok(space)
    }

    /// Server-side caps applied to every query.
    #[must_use]
    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            max_results: Some(self.query.max_results),
            max_steps: Some(self.query.max_steps),
        }
    }

    pub fn to_toml(&self) -> Result<String, AppError> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed origins; `["*"]` allows all.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "atomspace=info,atomspace_core=info,tower_http=debug".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub max_results: usize,
    pub max_steps: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: 10_000,
            max_steps: 1_000_000,
        }
    }
}
