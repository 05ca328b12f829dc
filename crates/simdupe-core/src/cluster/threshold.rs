use super::{check_uniform_dimension, validate_threshold, EmbeddingItem, SimilarityCluster};
use crate::error::Error;
use crate::model::FileId;
use crate::vector::{similarity, Metric};
use ahash::AHashSet;
use rayon::prelude::*;
use tracing::trace;

pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Greedy single-pass clustering.
///
/// Items are visited in input order. Each unassigned item anchors a new
/// cluster and absorbs every *later* unassigned item whose similarity to the
/// anchor is at least `threshold`. Earlier items act as anchors, so the
/// result depends on input order. Singleton clusters are dropped, but they
/// still consume a cluster id.
pub fn cluster_by_threshold(
    items: &[EmbeddingItem],
    threshold: f64,
    metric: Metric,
) -> Result<Vec<SimilarityCluster>, Error> {
    validate_threshold(threshold)?;
    check_uniform_dimension(items)?;

    let mut assigned: AHashSet<FileId> = AHashSet::with_capacity(items.len());
    let mut next_cluster_id: u32 = 0;
    let mut clusters = Vec::new();

    for (i, anchor) in items.iter().enumerate() {
        if assigned.contains(&anchor.id) {
            continue;
        }
        assigned.insert(anchor.id);

        let cluster_id = next_cluster_id;
        next_cluster_id += 1;

        // Scores only depend on the anchor, so they are computed in parallel
        // and applied in index order.
        let scored: Vec<(FileId, f64)> = items[i + 1..]
            .par_iter()
            .filter(|candidate| !assigned.contains(&candidate.id))
            .map(|candidate| {
                similarity(&anchor.vector, &candidate.vector, metric).map(|s| (candidate.id, s))
            })
            .collect::<Result<_, _>>()?;

        let mut members = vec![anchor.id];
        for (id, score) in scored {
            // an id repeated later in the input may already be taken
            if score >= threshold && assigned.insert(id) {
                members.push(id);
            }
        }

        if members.len() > 1 {
            trace!("Threshold cluster {} has {} members", cluster_id, members.len());
            clusters.push(SimilarityCluster {
                cluster_id,
                members,
                score: threshold,
            });
        }
    }

    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, vector: &[f64]) -> EmbeddingItem {
        EmbeddingItem::new(FileId(id), vector.to_vec())
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            cluster_by_threshold(&[], DEFAULT_THRESHOLD, Metric::Cosine),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn test_single_item_no_cluster() {
        let clusters =
            cluster_by_threshold(&[item(1, &[1.0, 0.0])], DEFAULT_THRESHOLD, Metric::Cosine)
                .unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_order_dependence() {
        // b is close to both a and c, a and c are not close to each other.
        let a = [1.0, 0.0];
        let b = [0.8, 0.6];
        let c = [0.28, 0.96];

        let abc = cluster_by_threshold(
            &[item(1, &a), item(2, &b), item(3, &c)],
            0.75,
            Metric::Cosine,
        )
        .unwrap();
        assert_eq!(abc.len(), 1);
        assert_eq!(abc[0].members, vec![FileId(1), FileId(2)]);

        let bac = cluster_by_threshold(
            &[item(2, &b), item(1, &a), item(3, &c)],
            0.75,
            Metric::Cosine,
        )
        .unwrap();
        assert_eq!(bac.len(), 1);
        assert_eq!(bac[0].members, vec![FileId(2), FileId(1), FileId(3)]);
    }

    #[test]
    fn test_cluster_ids_count_discarded_singletons() {
        let clusters = cluster_by_threshold(
            &[
                item(1, &[0.0, 1.0]),
                item(2, &[1.0, 0.0]),
                item(3, &[1.0, 0.01]),
            ],
            0.9,
            Metric::Cosine,
        )
        .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, 1);
        assert_eq!(clusters[0].score, 0.9);
    }

    #[test]
    fn test_euclidean_metric() {
        let clusters = cluster_by_threshold(
            &[
                item(1, &[0.5, 0.5, 0.5, 0.5]),
                item(2, &[0.5, 0.5, 0.5, 0.6]),
                item(3, &[-0.5, -0.5, -0.5, -0.5]),
            ],
            0.9,
            Metric::Euclidean,
        )
        .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![FileId(1), FileId(2)]);
    }
}
