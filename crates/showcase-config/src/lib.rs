// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use showcase_domain::SearchType;
use showcase_lastfm::{EnrichmentPolicy, DEFAULT_TOP_ALBUMS_LIMIT};
use tracing::info;

/// Provider settings. Every field has a non-fatal default; an empty API key or
/// base URL only degrades the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_image_url: String,
    pub max_concurrent_requests: usize,
    pub cache_capacity: u64,
    pub top_albums_limit: u32,
    pub enrichment_policy: EnrichmentPolicy,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            default_image_url: String::new(),
            max_concurrent_requests: 4,
            cache_capacity: 1_000,
            top_albums_limit: DEFAULT_TOP_ALBUMS_LIMIT,
            enrichment_policy: EnrichmentPolicy::Tolerant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub directory: PathBuf,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".showcase"),
            key: "music-explorer-favourites".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FavouritesConfig {
    /// Refuse to add a favourite whose id is already stored.
    pub unique_ids: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_term: String,
    pub default_type: SearchType,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_term: "Daft Punk".to_string(),
            default_type: SearchType::Album,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShowcaseConfig {
    pub lastfm: LastFmConfig,
    pub storage: StorageConfig,
    pub favourites: FavouritesConfig,
    pub search: SearchConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: SHOWCASE_).
pub fn load(config_path: Option<&Path>) -> Result<ShowcaseConfig> {
    let mut figment = Figment::from(Serialized::defaults(ShowcaseConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("SHOWCASE_").split("__"));

    let config: ShowcaseConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
