use super::hierarchical::{cluster_with_matrix, DistanceMatrix};
use super::{check_uniform_dimension, EmbeddingItem, SimilarityCluster};
use crate::error::Error;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Matrices kept by [`DistanceMatrixCache::new`].
pub const DEFAULT_MAX_ENTRIES: usize = 8;

/// Reuses distance matrices across hierarchical runs over the same
/// embedding set.
///
/// The key is a BLAKE3 digest of the ordered ids and the bit patterns of
/// every vector component, so any change to ids, order, or values misses.
/// At most `max_entries` matrices are held; inserting past that evicts an
/// arbitrary entry.
#[derive(Debug)]
pub struct DistanceMatrixCache {
    entries: DashMap<blake3::Hash, Arc<DistanceMatrix>>,
    max_entries: usize,
}

impl Default for DistanceMatrixCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl DistanceMatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn key_for(items: &[EmbeddingItem]) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(items.len() as u64).to_le_bytes());
        for item in items {
            hasher.update(&item.id.0.to_le_bytes());
            hasher.update(&(item.vector.len() as u64).to_le_bytes());
            for value in &item.vector {
                hasher.update(&value.to_bits().to_le_bytes());
            }
        }
        hasher.finalize()
    }

    pub fn get_or_build(&self, items: &[EmbeddingItem]) -> Result<Arc<DistanceMatrix>, Error> {
        let key = Self::key_for(items);
        if let Some(found) = self.entries.get(&key) {
            trace!("Distance matrix cache hit for {} items", items.len());
            return Ok(Arc::clone(found.value()));
        }

        let matrix = Arc::new(DistanceMatrix::build(items)?);
        if self.entries.len() >= self.max_entries {
            // copy the key out so the shard lock is released before removal
            let victim = self.entries.iter().next().map(|entry| *entry.key());
            if let Some(victim) = victim {
                trace!("Distance matrix cache full, evicting one entry");
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(key, Arc::clone(&matrix));
        Ok(matrix)
    }

    /// Hierarchical clustering that builds the matrix at most once per
    /// distinct embedding set.
    pub fn cluster_hierarchical(
        &self,
        items: &[EmbeddingItem],
        max_clusters: usize,
        min_similarity: f64,
    ) -> Result<Vec<SimilarityCluster>, Error> {
        check_uniform_dimension(items)?;
        let matrix = self.get_or_build(items)?;
        cluster_with_matrix(items, &matrix, max_clusters, min_similarity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
