use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub popular: PopularConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the catalog/metadata/export service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Seconds between automatic advances of the featured carousel.
    #[serde(default = "default_advance_interval_secs")]
    pub advance_interval_secs: u64,
    /// How many "up next" thumbnails to show beside the current item.
    #[serde(default = "default_upcoming_window")]
    pub upcoming_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularConfig {
    /// Tolerance (in cells) for detecting the tail of the doubled strip.
    #[serde(default = "default_edge_tolerance")]
    pub edge_tolerance: f64,
    #[serde(default = "default_card_width")]
    pub card_width: u16,
    #[serde(default = "default_card_gap")]
    pub card_gap: u16,
}

/// User-configurable paths for exported documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory exported chapter ranges are written to.
    /// Defaults to `~/manga-downloads`.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl CarouselConfig {
    pub fn advance_interval(&self) -> Duration {
        Duration::from_secs(self.advance_interval_secs.max(1))
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            advance_interval_secs: default_advance_interval_secs(),
            upcoming_window: default_upcoming_window(),
        }
    }
}

impl Default for PopularConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: default_edge_tolerance(),
            card_width: default_card_width(),
            card_gap: default_card_gap(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_advance_interval_secs() -> u64 {
    10
}

fn default_upcoming_window() -> usize {
    4
}

fn default_edge_tolerance() -> f64 {
    5.0
}

fn default_card_width() -> u16 {
    28
}

fn default_card_gap() -> u16 {
    2
}

fn default_downloads_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("manga-downloads")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            carousel: CarouselConfig::default(),
            popular: PopularConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}
