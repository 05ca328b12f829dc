use crate::error::Error;
use crate::model::EmbeddingKind;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub thresholds: SimilarityThresholds,
    pub clustering: ClusteringConfig,
    pub limits: ProcessingLimits,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityLevel {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LevelThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl LevelThresholds {
    pub fn at(&self, level: SimilarityLevel) -> f64 {
        match level {
            SimilarityLevel::High => self.high,
            SimilarityLevel::Medium => self.medium,
            SimilarityLevel::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    pub text: LevelThresholds,
    pub image: LevelThresholds,
    pub exact: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            text: LevelThresholds {
                high: 0.95,
                medium: 0.85,
                low: 0.70,
            },
            image: LevelThresholds {
                high: 0.90,
                medium: 0.80,
                low: 0.65,
            },
            exact: 1.0,
        }
    }
}

impl SimilarityThresholds {
    pub fn for_kind(&self, kind: EmbeddingKind, level: SimilarityLevel) -> f64 {
        match kind {
            EmbeddingKind::Text => self.text.at(level),
            EmbeddingKind::Image => self.image.at(level),
        }
    }
}

/// `max_clusters` and `hierarchical_threshold` are the CLI defaults for
/// hierarchical clustering; `min_cluster_size` filters clusters in
/// [`crate::engine::DetectionEngine::cluster`]. `dbscan_eps` and
/// `dbscan_min_samples` are carried for a future density-based clusterer;
/// nothing reads them yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub max_clusters: usize,
    pub min_cluster_size: usize,
    pub hierarchical_threshold: f64,
    pub dbscan_eps: f64,
    pub dbscan_min_samples: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_clusters: 50,
            min_cluster_size: 2,
            hierarchical_threshold: 0.8,
            dbscan_eps: 0.3,
            dbscan_min_samples: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingLimits {
    pub max_file_size: u64,
    pub max_text_length: usize,
    pub max_batch_size: usize,
    pub text_embedding_dimension: usize,
    pub image_embedding_dimension: usize,
}

impl Default for ProcessingLimits {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            max_text_length: 1_000_000,
            max_batch_size: 100,
            text_embedding_dimension: 768,
            image_embedding_dimension: 512,
        }
    }
}

impl ProcessingLimits {
    pub fn expected_dimension(&self, kind: EmbeddingKind) -> usize {
        match kind {
            EmbeddingKind::Text => self.text_embedding_dimension,
            EmbeddingKind::Image => self.image_embedding_dimension,
        }
    }

    pub fn check_file_size(&self, size: u64) -> Result<(), Error> {
        if size > self.max_file_size {
            return Err(Error::LimitExceeded {
                what: "file size",
                limit: self.max_file_size,
                actual: size,
            });
        }
        Ok(())
    }

    /// Length is counted in characters, not bytes.
    pub fn check_text_length(&self, text: &str) -> Result<(), Error> {
        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(Error::LimitExceeded {
                what: "text length",
                limit: self.max_text_length as u64,
                actual: length as u64,
            });
        }
        Ok(())
    }

    /// Split `items` into chunks of at most `max_batch_size`.
    pub fn batches<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.max_batch_size.max(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub root_paths: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

/// Load configuration from an optional `Simdupe.toml` and `SIMDUPE_*`
/// environment variables (`SIMDUPE_LIMITS__MAX_BATCH_SIZE=50`).
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_configuration_from("Simdupe")
}

pub fn load_configuration_from(file_stem: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix("SIMDUPE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("scan.root_paths")
                .with_list_parse_key("scan.ignore_patterns")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
