//! Configuration management for rendersync
//!
//! Handles config file loading/saving for the embedding client.
//! Config is stored at ~/.config/rendersync/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::hints::OriginalLanguageClient;
use crate::renderer::RendererClient;

/// Renderer control API host on the device itself
pub const DEFAULT_RENDERER_HOST: &str = "127.0.0.1:9529";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host:port of the renderer's private HTTP API
    #[serde(default = "default_renderer_host")]
    pub renderer_host: String,
    /// TMDB API key for original-language hints; lookups are skipped
    /// without one
    pub tmdb_api_key: Option<String>,
}

fn default_renderer_host() -> String {
    DEFAULT_RENDERER_HOST.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            renderer_host: default_renderer_host(),
            tmdb_api_key: None,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/rendersync/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rendersync").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Client for the configured renderer
    pub fn renderer_client(&self) -> RendererClient {
        RendererClient::new(&self.renderer_host)
    }

    /// Hint client, when an API key is configured
    pub fn hint_client(&self) -> Option<OriginalLanguageClient> {
        self.tmdb_api_key
            .as_ref()
            .map(|key| OriginalLanguageClient::new(key.clone()))
    }
}
