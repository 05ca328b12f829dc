use crate::model::{EmbeddingKind, FileId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("File {file_id} is not a member of group '{group}'")]
    InvalidKeepCandidate { group: String, file_id: FileId },

    #[error("No manual keep candidate supplied for group '{group}'")]
    MissingManualKeep { group: String },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("File {file_id} has a {kind} embedding of dimension {actual}, expected {expected}")]
    InvalidEmbedding {
        file_id: FileId,
        kind: EmbeddingKind,
        expected: usize,
        actual: usize,
    },

    #[error("File {file_id} has a non-finite value in its embedding")]
    NonFiniteEmbedding { file_id: FileId },

    #[error("File id {0} appears more than once in the input")]
    DuplicateFileId(FileId),

    #[error("Cluster {cluster_id} references unknown file {file_id}")]
    UnknownClusterMember { cluster_id: u32, file_id: FileId },

    #[error("{what} exceeds limit: {actual} > {limit}")]
    LimitExceeded {
        what: &'static str,
        limit: u64,
        actual: u64,
    },

    #[error("Unknown duplicate group '{0}'")]
    UnknownGroup(String),

    #[error("Similarity threshold {0} is outside [-1, 1]")]
    InvalidThreshold(f64),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
