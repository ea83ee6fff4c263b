//! Configuration loading utilities.

use super::types::ServerConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Environment variable naming an optional config file.
pub const CONFIG_PATH_ENV: &str = "PORTCULLIS_CONFIG";

/// Layers embedded defaults, an optional file, then `PORTCULLIS__*`
/// environment variables (e.g. `PORTCULLIS__AUTH__TOKEN__SECRET`).
pub struct ConfigLoader {
    config_path: Option<String>,
    env_prefix: String,
    use_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "PORTCULLIS".to_string(),
            use_env: true,
        }
    }

    /// Set config file path.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Skip the environment layer.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load configuration.
    pub fn load(&self) -> Result<ServerConfig> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("defaults.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = &self.config_path {
            if Path::new(path).exists() {
                info!(path = %path, "loading config file");
                builder = builder.add_source(config::File::with_name(path));
            } else {
                info!(path = %path, "config file not found, skipping");
            }
        }

        if self.use_env {
            builder = builder.add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<ServerConfig> {
    let mut loader = ConfigLoader::new();
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        loader = loader.with_config_path(path);
    }
    loader.load()
}
