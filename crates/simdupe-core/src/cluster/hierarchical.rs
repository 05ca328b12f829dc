use super::{
    check_finite, check_uniform_dimension, validate_threshold, EmbeddingItem, SimilarityCluster,
};
use crate::error::Error;
use crate::vector::cosine_similarity;
use rayon::prelude::*;
use tracing::debug;

pub const DEFAULT_MAX_CLUSTERS: usize = 10;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.8;

/// Symmetric N x N cosine-distance matrix (`1 - cosine_similarity`), zero
/// on the diagonal. Stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Rows of the upper triangle are computed in parallel, then mirrored.
    pub fn build(items: &[EmbeddingItem]) -> Result<Self, Error> {
        let n = items.len();
        for item in items {
            check_finite(item.id, &item.vector)?;
        }

        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                items[i + 1..]
                    .iter()
                    .map(|other| {
                        cosine_similarity(&items[i].vector, &other.vector).map(|s| 1.0 - s)
                    })
                    .collect::<Result<Vec<f64>, Error>>()
            })
            .collect::<Result<_, _>>()?;

        let mut data = vec![0.0; n * n];
        for (i, row) in upper.iter().enumerate() {
            for (offset, &distance) in row.iter().enumerate() {
                let j = i + 1 + offset;
                data[i * n + j] = distance;
                data[j * n + i] = distance;
            }
        }

        Ok(Self { n, data })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }
}

struct WorkingCluster {
    cluster_id: u32,
    indices: Vec<usize>,
}

/// Mean distance over all cross pairs; infinite when either side is empty.
fn average_linkage(left: &[usize], right: &[usize], matrix: &DistanceMatrix) -> f64 {
    let count = left.len() * right.len();
    if count == 0 {
        return f64::INFINITY;
    }
    let sum: f64 = left
        .iter()
        .flat_map(|&i| right.iter().map(move |&j| matrix.get(i, j)))
        .sum();
    sum / count as f64
}

/// Mean pairwise similarity inside a cluster; 1 for a singleton.
fn average_intra_similarity(indices: &[usize], matrix: &DistanceMatrix) -> f64 {
    if indices.len() <= 1 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, &i) in indices.iter().enumerate() {
        for &j in &indices[a + 1..] {
            sum += 1.0 - matrix.get(i, j);
            count += 1;
        }
    }
    sum / count as f64
}

/// Average-linkage agglomerative clustering over cosine distance.
///
/// Starts with one cluster per item and repeatedly merges the closest pair
/// while more than `max_clusters` remain. Merging stops early once the best
/// available merge has similarity below `min_similarity`. Ties go to the
/// first pair found scanning `(a, b)` with `a < b` over the current cluster
/// list. Merged clusters are appended with id `max(existing) + 1`.
///
/// Cost is O(N^3) or worse; batch large collections before calling.
pub fn cluster_hierarchical(
    items: &[EmbeddingItem],
    max_clusters: usize,
    min_similarity: f64,
) -> Result<Vec<SimilarityCluster>, Error> {
    validate_threshold(min_similarity)?;
    check_uniform_dimension(items)?;
    let matrix = DistanceMatrix::build(items)?;
    cluster_with_matrix(items, &matrix, max_clusters, min_similarity)
}

/// Same as [`cluster_hierarchical`] with a precomputed matrix built from
/// exactly `items`.
pub fn cluster_with_matrix(
    items: &[EmbeddingItem],
    matrix: &DistanceMatrix,
    max_clusters: usize,
    min_similarity: f64,
) -> Result<Vec<SimilarityCluster>, Error> {
    validate_threshold(min_similarity)?;
    check_uniform_dimension(items)?;
    if matrix.len() != items.len() {
        return Err(Error::DimensionMismatch {
            left: items.len(),
            right: matrix.len(),
        });
    }

    let mut clusters: Vec<WorkingCluster> = (0..items.len())
        .map(|index| WorkingCluster {
            cluster_id: index as u32,
            indices: vec![index],
        })
        .collect();

    while clusters.len() > max_clusters {
        let mut best: Option<(f64, usize, usize)> = None;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let distance = average_linkage(&clusters[a].indices, &clusters[b].indices, matrix);
                if best.map_or(true, |(min, _, _)| distance < min) {
                    best = Some((distance, a, b));
                }
            }
        }

        let (min_distance, a, b) = match best {
            Some(found) => found,
            None => break,
        };

        if 1.0 - min_distance < min_similarity {
            debug!(
                "Stopping at {} clusters: best merge similarity {:.4} below {:.4}",
                clusters.len(),
                1.0 - min_distance,
                min_similarity
            );
            break;
        }

        let next_id = clusters.iter().map(|c| c.cluster_id).max().unwrap_or(0) + 1;
        // b > a, so removing b first leaves a's position intact
        let right = clusters.remove(b);
        let left = clusters.remove(a);
        let mut indices = left.indices;
        indices.extend(right.indices);
        clusters.push(WorkingCluster {
            cluster_id: next_id,
            indices,
        });
    }

    Ok(clusters
        .into_iter()
        .filter(|c| c.indices.len() >= 2)
        .map(|c| SimilarityCluster {
            cluster_id: c.cluster_id,
            members: c.indices.iter().map(|&i| items[i].id).collect(),
            score: average_intra_similarity(&c.indices, matrix),
        })
        .collect())
}
