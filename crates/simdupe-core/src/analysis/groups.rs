use crate::cluster::{check_finite, SimilarityCluster};
use crate::error::Error;
use crate::hasher::bucket_by_exact_hash;
use crate::model::{
    DetectionReport, DetectionTotals, DuplicateGroup, EmbeddingKind, FileId, FileRecord,
    GroupMatch,
};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// How the member to retain is chosen within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeepStrategy {
    /// First member in input order.
    #[default]
    #[serde(rename = "keep_first")]
    First,
    /// Largest byte size, ties to the earliest member.
    #[serde(rename = "keep_largest")]
    Largest,
    /// Latest modification time, ties to the earliest member.
    #[serde(rename = "keep_newest")]
    Newest,
    /// Caller names the member per group key.
    #[serde(rename = "manual")]
    Manual,
}

/// Pick the keep candidate for one group. `members` must not be empty.
pub fn select_keep(
    group_key: &str,
    members: &[&FileRecord],
    strategy: KeepStrategy,
    manual_keep: &HashMap<String, FileId>,
) -> Result<FileId, Error> {
    let first = match members.first() {
        Some(first) => *first,
        None => return Err(Error::EmptyInput("group members")),
    };

    let keep = match strategy {
        KeepStrategy::First => first,
        KeepStrategy::Largest => members
            .iter()
            .copied()
            .fold(first, |best, m| if m.size > best.size { m } else { best }),
        KeepStrategy::Newest => members.iter().copied().fold(first, |best, m| {
            if m.modified_at > best.modified_at {
                m
            } else {
                best
            }
        }),
        KeepStrategy::Manual => {
            let wanted = manual_keep
                .get(group_key)
                .copied()
                .ok_or_else(|| Error::MissingManualKeep {
                    group: group_key.to_string(),
                })?;
            return match members.iter().find(|m| m.id == wanted) {
                Some(m) => Ok(m.id),
                None => Err(Error::InvalidKeepCandidate {
                    group: group_key.to_string(),
                    file_id: wanted,
                }),
            };
        }
    };

    Ok(keep.id)
}

fn build_group(
    matched: GroupMatch,
    similarity: f64,
    members: &[&FileRecord],
    strategy: KeepStrategy,
    manual_keep: &HashMap<String, FileId>,
) -> Result<DuplicateGroup, Error> {
    let key = matched.key();
    let keep = select_keep(&key, members, strategy, manual_keep)?;

    let total_size: u64 = members.iter().map(|m| m.size).sum();
    let keep_size = members
        .iter()
        .find(|m| m.id == keep)
        .map(|m| m.size)
        .unwrap_or(0);

    Ok(DuplicateGroup {
        key,
        matched,
        similarity: similarity.clamp(0.0, 1.0),
        members: members.iter().map(|m| (*m).clone()).collect(),
        keep,
        total_size,
        potential_savings: total_size - keep_size,
    })
}

/// File ids must be unique and embedding vectors must be finite and match
/// the dimension they declare.
pub fn validate_records(files: &[FileRecord]) -> Result<(), Error> {
    let mut seen: AHashSet<FileId> = AHashSet::with_capacity(files.len());
    for file in files {
        if !seen.insert(file.id) {
            return Err(Error::DuplicateFileId(file.id));
        }
        for embedding in &file.embeddings {
            if embedding.vector.len() != embedding.dimension {
                return Err(Error::InvalidEmbedding {
                    file_id: file.id,
                    kind: embedding.kind,
                    expected: embedding.dimension,
                    actual: embedding.vector.len(),
                });
            }
            check_finite(file.id, &embedding.vector)?;
        }
    }
    Ok(())
}

/// Combine exact-hash buckets and similarity clusters into duplicate groups.
///
/// Exact groups come first in first-seen hash order, then similarity groups
/// (text before image) in cluster emission order. A file lands in at most
/// one group: cluster members already placed in an exact group, or in an
/// earlier similarity group, are dropped from later clusters, and a cluster
/// left with fewer than two members is not reported.
///
/// Any input error aborts the whole assembly.
pub fn assemble_duplicate_groups(
    files: &[FileRecord],
    clusters_by_type: &BTreeMap<EmbeddingKind, Vec<SimilarityCluster>>,
    strategy: KeepStrategy,
    manual_keep: &HashMap<String, FileId>,
) -> Result<DetectionReport, Error> {
    if files.is_empty() {
        return Err(Error::EmptyInput("files"));
    }
    validate_records(files)?;

    let by_id: AHashMap<FileId, &FileRecord> = files.iter().map(|f| (f.id, f)).collect();
    let mut placed: AHashSet<FileId> = AHashSet::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (exact_hash, members) in bucket_by_exact_hash(files) {
        if members.len() < 2 {
            continue;
        }
        placed.extend(members.iter().map(|m| m.id));
        groups.push(build_group(
            GroupMatch::Exact { exact_hash },
            1.0,
            &members,
            strategy,
            manual_keep,
        )?);
    }
    let exact_count = groups.len();

    for kind in EmbeddingKind::ALL {
        let clusters = match clusters_by_type.get(&kind) {
            Some(clusters) => clusters,
            None => continue,
        };

        for cluster in clusters {
            let mut members: Vec<&FileRecord> = Vec::with_capacity(cluster.members.len());
            for id in &cluster.members {
                let record = by_id.get(id).copied().ok_or_else(|| {
                    Error::UnknownClusterMember {
                        cluster_id: cluster.cluster_id,
                        file_id: *id,
                    }
                })?;
                if placed.insert(record.id) {
                    members.push(record);
                }
            }

            if members.len() < 2 {
                // a lone leftover goes back to the pool for later clusters
                for m in &members {
                    placed.remove(&m.id);
                }
                continue;
            }

            groups.push(build_group(
                GroupMatch::Similar {
                    kind,
                    cluster_id: cluster.cluster_id,
                },
                cluster.score,
                &members,
                strategy,
                manual_keep,
            )?);
        }
    }

    let totals = DetectionTotals {
        group_count: groups.len(),
        total_reclaimable: groups.iter().map(|g| g.potential_savings).sum(),
        processed_files: files.len(),
        duplicate_files: groups.iter().map(|g| g.members.len()).sum(),
    };

    debug!(
        "Assembled {} groups ({} exact, {} similar), {} bytes reclaimable",
        totals.group_count,
        exact_count,
        totals.group_count - exact_count,
        totals.total_reclaimable
    );

    Ok(DetectionReport { groups, totals })
}
