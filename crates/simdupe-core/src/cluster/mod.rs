pub mod cache;
pub mod hierarchical;
pub mod threshold;

pub use cache::DistanceMatrixCache;
pub use hierarchical::{cluster_hierarchical, DistanceMatrix};
pub use threshold::cluster_by_threshold;

use crate::error::Error;
use crate::model::FileId;
use crate::vector::Metric;
use serde::{Deserialize, Serialize};

/// One embedding to cluster, identified by the file it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingItem {
    pub id: FileId,
    pub vector: Vec<f64>,
}

impl EmbeddingItem {
    pub fn new(id: FileId, vector: Vec<f64>) -> Self {
        Self { id, vector }
    }
}

/// A reportable cluster (two or more members).
///
/// `score` is the cluster's representative similarity: the threshold used
/// for threshold clustering, or the average intra-cluster similarity for
/// hierarchical clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityCluster {
    pub cluster_id: u32,
    pub members: Vec<FileId>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ClusterMethod {
    /// Greedy single pass. `threshold: None` uses the configured threshold
    /// for the embedding kind and similarity level.
    Threshold {
        metric: Metric,
        threshold: Option<f64>,
    },
    Hierarchical {
        max_clusters: usize,
        min_similarity: f64,
    },
}

impl Default for ClusterMethod {
    fn default() -> Self {
        ClusterMethod::Threshold {
            metric: Metric::Cosine,
            threshold: None,
        }
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), Error> {
    if !(-1.0..=1.0).contains(&threshold) {
        return Err(Error::InvalidThreshold(threshold));
    }
    Ok(())
}

pub(crate) fn check_finite(id: FileId, vector: &[f64]) -> Result<(), Error> {
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(Error::NonFiniteEmbedding { file_id: id });
    }
    Ok(())
}

/// All vectors compared together must share one length and hold only
/// finite values.
pub(crate) fn check_uniform_dimension(items: &[EmbeddingItem]) -> Result<usize, Error> {
    let dimension = match items.first() {
        Some(first) => first.vector.len(),
        None => return Err(Error::EmptyInput("embeddings")),
    };

    for item in items {
        if item.vector.len() != dimension {
            return Err(Error::DimensionMismatch {
                left: dimension,
                right: item.vector.len(),
            });
        }
        check_finite(item.id, &item.vector)?;
    }

    Ok(dimension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(0.9).is_ok());
        assert!(validate_threshold(-1.0).is_ok());
        assert!(matches!(
            validate_threshold(1.5),
            Err(Error::InvalidThreshold(_))
        ));
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_uniform_dimension() {
        let items = vec![
            EmbeddingItem::new(FileId(1), vec![0.0; 3]),
            EmbeddingItem::new(FileId(2), vec![0.0; 4]),
        ];
        assert!(matches!(
            check_uniform_dimension(&items),
            Err(Error::DimensionMismatch { left: 3, right: 4 })
        ));
        assert!(matches!(
            check_uniform_dimension(&[]),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn test_non_finite_components_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let items = vec![
                EmbeddingItem::new(FileId(1), vec![1.0, 0.0]),
                EmbeddingItem::new(FileId(2), vec![bad, 0.0]),
            ];
            assert!(matches!(
                check_uniform_dimension(&items),
                Err(Error::NonFiniteEmbedding { file_id: FileId(2) })
            ));
        }
    }
}
