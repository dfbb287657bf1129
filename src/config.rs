/// Application configuration
///
/// Settings are read from a JSON file in the user's config directory:
/// - Linux: ~/.config/pokedex-list/config.json
/// - macOS: ~/Library/Application Support/pokedex-list/config.json
/// - Windows: %APPDATA%\pokedex-list\config.json
///
/// Every field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Environment variable that overrides `api_base`
pub const API_BASE_ENV: &str = "POKEDEX_API_BASE";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the PokéAPI (no trailing slash)
    pub api_base: String,
    /// Artwork URL template, `{number}` is replaced by the Pokédex number
    pub artwork_url_template: String,
    /// Entries requested per page
    pub page_size: usize,
    /// Edge length of cached thumbnails in pixels
    pub thumbnail_size: u32,
    /// Per-request timeout for API and artwork requests
    pub request_timeout_secs: u64,
    /// Keep downloaded artwork on disk between sessions
    pub cache_thumbnails: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://pokeapi.co/api/v2".to_string(),
            artwork_url_template: "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/{number}.png".to_string(),
            page_size: 20,
            thumbnail_size: 256,
            request_timeout_secs: 10,
            cache_thumbnails: true,
        }
    }
}

impl Config {
    /// Load the configuration from the default location.
    ///
    /// Never fails: a missing file yields defaults, an unreadable one is
    /// logged and also yields defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    info!("⚙️  Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("⚠️  Ignoring unreadable config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        if let Ok(api_base) = std::env::var(API_BASE_ENV) {
            config.api_base = api_base;
        }

        config.normalize();
        config
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&json)?;
        config.normalize();
        Ok(config)
    }

    /// Get the path where the config file is expected
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("pokedex-list");
        path.push("config.json");
        Some(path)
    }

    /// Build the artwork URL for a Pokédex number
    pub fn artwork_url(&self, number: u32) -> String {
        self.artwork_url_template
            .replace("{number}", &number.to_string())
    }

    fn normalize(&mut self) {
        while self.api_base.ends_with('/') {
            self.api_base.pop();
        }
        // A zero page size would make every page "short" and end the list at once
        if self.page_size == 0 {
            self.page_size = Self::default().page_size;
        }
    }
}
