//! Optional TOML configuration with built-in defaults for every value.
//!
//! ```toml
//! catalog_path = "/data/catalog.json"
//!
//! [scoring]
//! audio_weight = 0.6
//!
//! [filters]
//! pop_floor = 10
//!
//! [tiers]
//! tier_1_pct = 15
//!
//! [pools]
//! easy = [1, 5]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::rank::{FilterParams, RankParams};
use crate::score::ScoringParams;
use crate::tiers::{PoolDefs, TierParams, default_pools};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path: Option<PathBuf>,
    pub scoring: ScoringParams,
    pub filters: FilterParams,
    pub tiers: TierParams,
    pub pools: PoolDefs,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            scoring: ScoringParams::default(),
            filters: FilterParams::default(),
            tiers: TierParams::default(),
            pools: default_pools(),
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("radiofit")
        .join("config.toml")
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load an explicit config file, or the default one if it exists.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = default_config_path();
        if default_path.is_file() {
            Self::load(&default_path)
        } else {
            debug!("No config at {}, using defaults", default_path.display());
            Ok(Self::default())
        }
    }

    #[must_use]
    pub fn rank_params(&self) -> RankParams {
        RankParams {
            scoring: self.scoring.clone(),
            filters: self.filters.clone(),
        }
    }
}
