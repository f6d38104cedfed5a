//! Configuration management for docsearch.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::engine::WriterSettings;
use crate::core::error::{DocSearchError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest per-thread indexing heap tantivy accepts
const MIN_HEAP_PER_THREAD_MB: usize = 15;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub writer: WriterConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory that relative local index locations resolve against
    #[serde(default = "default_index_root")]
    pub index_root: PathBuf,
}

/// Index writer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriterConfig {
    /// Total indexing heap per writer, shared by its threads
    #[serde(default = "default_heap_size_mb")]
    pub heap_size_mb: usize,

    /// Indexing threads per writer
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Results returned when the caller does not ask for a count
    #[serde(default = "default_max_results_default")]
    pub default_max_results: usize,

    /// Upper bound on results per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum query string length in bytes
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

// Default value functions
fn default_index_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("docsearch").join("indexes"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn default_heap_size_mb() -> usize {
    50
}

fn default_num_threads() -> usize {
    1
}

fn default_max_results_default() -> usize {
    10
}

fn default_max_results() -> usize {
    100
}

fn default_max_query_length() -> usize {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_root: default_index_root(),
        }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            heap_size_mb: default_heap_size_mb(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results_default(),
            max_results: default_max_results(),
            max_query_length: default_max_query_length(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            DocSearchError::ConfigError(format!("Failed to read config file: {e}"))
        })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Path of the per-user config file, if the platform has one
    pub fn user_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docsearch").join("config.toml"))
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// File lookup order:
    /// 1. DOCSEARCH_CONFIG env var
    /// 2. User config file (e.g. ~/.config/docsearch/config.toml)
    /// 3. ./docsearch.toml
    /// 4. Defaults
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("DOCSEARCH_CONFIG") {
            Self::from_file(config_path)?
        } else if let Some(user_config) = Self::user_config_file().filter(|p| p.exists()) {
            Self::from_file(user_config)?
        } else if Path::new("docsearch.toml").exists() {
            Self::from_file("docsearch.toml")?
        } else {
            Self::default()
        };

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(root) = env::var("DOCSEARCH_INDEX_ROOT") {
            self.storage.index_root = PathBuf::from(root);
        }

        if let Ok(heap) = env::var("DOCSEARCH_WRITER_HEAP_MB") {
            if let Ok(mb) = heap.parse() {
                self.writer.heap_size_mb = mb;
            }
        }
        if let Ok(threads) = env::var("DOCSEARCH_WRITER_THREADS") {
            if let Ok(n) = threads.parse() {
                self.writer.num_threads = n;
            }
        }

        if let Ok(default_max) = env::var("DOCSEARCH_DEFAULT_MAX_RESULTS") {
            if let Ok(n) = default_max.parse() {
                self.search.default_max_results = n;
            }
        }
        if let Ok(max) = env::var("DOCSEARCH_MAX_RESULTS") {
            if let Ok(n) = max.parse() {
                self.search.max_results = n;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.writer.num_threads == 0 {
            return Err(DocSearchError::ConfigError(
                "Writer thread count must be non-zero".to_string(),
            ));
        }

        if self.writer.heap_size_mb / self.writer.num_threads < MIN_HEAP_PER_THREAD_MB {
            return Err(DocSearchError::ConfigError(format!(
                "Writer heap must be at least {MIN_HEAP_PER_THREAD_MB} MB per thread"
            )));
        }

        if self.search.default_max_results == 0 {
            return Err(DocSearchError::ConfigError(
                "Default max results must be non-zero".to_string(),
            ));
        }

        if self.search.default_max_results > self.search.max_results {
            return Err(DocSearchError::ConfigError(
                "Default max results cannot exceed max results".to_string(),
            ));
        }

        if self.search.max_query_length == 0 {
            return Err(DocSearchError::ConfigError(
                "Max query length must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings every writer handle is opened with
    pub fn writer_settings(&self) -> WriterSettings {
        WriterSettings {
            heap_size_bytes: self.writer.heap_size_mb * 1024 * 1024,
            num_threads: self.writer.num_threads,
        }
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Index root: {:?}", self.storage.index_root);
        tracing::info!(
            "  Writer: {} MB heap, {} thread(s)",
            self.writer.heap_size_mb,
            self.writer.num_threads
        );
        tracing::info!(
            "  Max results: {} (default {})",
            self.search.max_results,
            self.search.default_max_results
        );
        tracing::info!("  Max query length: {}", self.search.max_query_length);
    }
}
