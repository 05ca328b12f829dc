use crate::model::EmbeddingKind;

/// Trait for reporting detection progress.
///
/// The CLI implements it with indicatif; library callers can ignore it.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_hash_start(&self, _total_files: usize) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_cluster_start(&self, _kind: EmbeddingKind, _items: usize) {}
    fn on_cluster_complete(&self, _kind: EmbeddingKind, _clusters: usize, _duration_secs: f64) {}
    fn on_assembly_complete(&self, _groups: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
