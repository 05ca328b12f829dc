pub mod analysis;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod filetype;
pub mod hasher;
pub mod model;
pub mod progress;
pub mod text;
pub mod vector;

pub use analysis::{assemble_duplicate_groups, plan_cleanup, CleanupRequest, KeepStrategy};
pub use cluster::{
    cluster_by_threshold, cluster_hierarchical, ClusterMethod, EmbeddingItem, SimilarityCluster,
};
pub use config::{AppConfig, SimilarityLevel};
pub use engine::{DetectOptions, DetectionEngine, FileInput};
pub use error::Error;
pub use hasher::{compute_content_hash, compute_exact_hash, compute_perceptual_hash};
pub use model::{
    DetectionReport, DetectionTotals, Digest, DuplicateGroup, Embedding, EmbeddingKind, FileId,
    FileRecord, GroupMatch, GroupType, ShortDigest,
};
pub use progress::{ProgressReporter, SilentReporter};
pub use vector::Metric;
