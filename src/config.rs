use crate::errors::RetrievalError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hard cap on concurrent external adapter calls, regardless of config
pub const MAX_CONCURRENT_CALLS: usize = 8;

/// Full configuration surface for the retrieval engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub multihop: MultiHopConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Final result sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of candidates returned to the caller
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

/// Signal weighting for hybrid fusion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Weight for the vector-similarity signal
    pub vector_weight: f32,
    /// Weight for the keyword TF-IDF signal
    pub keyword_weight: f32,
    /// Each side fetches overfetch_factor * top_k candidates before fusion
    pub overfetch_factor: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            vector_weight: 0.5,
            keyword_weight: 0.5,
            overfetch_factor: 3,
        }
    }
}

impl FusionConfig {
    /// Weights rescaled to sum to 1.0, as (vector, keyword)
    pub fn normalized_weights(&self) -> (f32, f32) {
        let sum = self.vector_weight + self.keyword_weight;
        (self.vector_weight / sum, self.keyword_weight / sum)
    }
}

/// Multi-hop controller bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiHopConfig {
    /// Highest hop index; hop 0 is the original query, so max_hops = 2
    /// allows at most 3 retrieval rounds
    pub max_hops: usize,
    /// Sub-queries requested from the generator per hop
    pub sub_queries_per_hop: usize,
    /// Worker pool size for per-sub-query retrieval; 0 = match
    /// sub_queries_per_hop
    pub max_concurrency: usize,
}

impl Default for MultiHopConfig {
    fn default() -> Self {
        Self {
            max_hops: 2,
            sub_queries_per_hop: 3,
            max_concurrency: 0,
        }
    }
}

impl MultiHopConfig {
    /// Effective pool size for a hop with `pending` sub-queries
    pub fn effective_concurrency(&self, pending: usize) -> usize {
        let requested = if self.max_concurrency == 0 {
            self.sub_queries_per_hop
        } else {
            self.max_concurrency
        };
        requested.min(MAX_CONCURRENT_CALLS).min(pending).max(1)
    }
}

/// Timeouts for external calls and the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per adapter call, milliseconds
    pub per_call_ms: u64,
    /// Whole multi-hop run, milliseconds
    pub overall_deadline_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            per_call_ms: 5_000,
            overall_deadline_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn per_call(&self) -> Duration {
        Duration::from_millis(self.per_call_ms)
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            fusion: FusionConfig::default(),
            multihop: MultiHopConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Reject invalid configuration at construction time, never at query time
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.search.top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.fusion.vector_weight < 0.0 || self.fusion.keyword_weight < 0.0 {
            return Err(RetrievalError::InvalidConfig(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        if self.fusion.vector_weight + self.fusion.keyword_weight <= 0.0 {
            return Err(RetrievalError::InvalidConfig(
                "fusion weights must sum to a positive value".to_string(),
            ));
        }
        if self.fusion.overfetch_factor == 0 {
            return Err(RetrievalError::InvalidConfig(
                "overfetch_factor must be at least 1".to_string(),
            ));
        }
        if self.multihop.sub_queries_per_hop == 0 {
            return Err(RetrievalError::InvalidConfig(
                "sub_queries_per_hop must be at least 1".to_string(),
            ));
        }
        if self.timeouts.per_call_ms == 0 || self.timeouts.overall_deadline_ms == 0 {
            return Err(RetrievalError::InvalidConfig(
                "timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = RetrievalConfig::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;

        let config: RetrievalConfig =
            toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".hoprag").join("config.toml"))
    }
}
