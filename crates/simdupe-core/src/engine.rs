use crate::analysis::{assemble_duplicate_groups, validate_records, KeepStrategy};
use crate::cluster::{
    check_finite, cluster_by_threshold, cluster_hierarchical, ClusterMethod, DistanceMatrixCache,
    EmbeddingItem, SimilarityCluster,
};
use crate::config::{AppConfig, SimilarityLevel};
use crate::error::Error;
use crate::filetype::{mime_type_for, FileKind};
use crate::hasher::{
    bucket_by_exact_hash, compute_content_hash, compute_exact_hash, compute_perceptual_hash,
};
use crate::model::{DetectionReport, Embedding, EmbeddingKind, FileId, FileRecord};
use crate::progress::ProgressReporter;
use ahash::AHashSet;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Raw material for one file: bytes already read and embeddings already
/// produced by the caller.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub id: FileId,
    pub path: String,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub embeddings: Vec<Embedding>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub method: ClusterMethod,
    pub level: SimilarityLevel,
    pub keep: KeepStrategy,
    /// Keep candidates by group key, read only for [`KeepStrategy::Manual`].
    pub manual_keep: HashMap<String, FileId>,
}

pub struct DetectionEngine {
    config: AppConfig,
    matrix_cache: Option<Arc<DistanceMatrixCache>>,
}

impl DetectionEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            matrix_cache: None,
        }
    }

    /// Share a distance-matrix cache between runs of hierarchical clustering.
    pub fn with_matrix_cache(mut self, cache: Arc<DistanceMatrixCache>) -> Self {
        self.matrix_cache = Some(cache);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn validate_embeddings(&self, id: FileId, embeddings: &[Embedding]) -> Result<(), Error> {
        for embedding in embeddings {
            let expected = self.config.limits.expected_dimension(embedding.kind);
            if embedding.vector.len() != expected || embedding.dimension != expected {
                return Err(Error::InvalidEmbedding {
                    file_id: id,
                    kind: embedding.kind,
                    expected,
                    actual: embedding.vector.len(),
                });
            }
            check_finite(id, &embedding.vector)?;
        }
        Ok(())
    }

    /// Hash one file and build its record.
    ///
    /// Exact hash always; content hash for text files whose bytes are valid
    /// UTF-8; perceptual hash for images.
    pub fn process_file(&self, input: FileInput) -> Result<FileRecord, Error> {
        let limits = &self.config.limits;
        limits.check_file_size(input.bytes.len() as u64)?;
        self.validate_embeddings(input.id, &input.embeddings)?;

        let name = Path::new(&input.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.path.clone());
        let kind = FileKind::from_name(&name);

        let content_hash = match kind {
            FileKind::Text => match std::str::from_utf8(&input.bytes) {
                Ok(text) => {
                    limits.check_text_length(text)?;
                    Some(compute_content_hash(text))
                }
                Err(_) => None,
            },
            _ => None,
        };
        let perceptual_hash = match kind {
            FileKind::Image => Some(compute_perceptual_hash(&input.bytes)),
            _ => None,
        };

        Ok(FileRecord {
            id: input.id,
            mime_type: mime_type_for(&name).to_string(),
            name,
            path: input.path,
            size: input.bytes.len() as u64,
            kind,
            exact_hash: compute_exact_hash(&input.bytes),
            content_hash,
            perceptual_hash,
            embeddings: input.embeddings,
            created_at: input.created_at,
            modified_at: input.modified_at,
        })
    }

    /// Hash a batch in parallel. Output order matches input order; the
    /// first failing input aborts the batch.
    pub fn process_batch(
        &self,
        inputs: Vec<FileInput>,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<FileRecord>, Error> {
        let total = inputs.len();
        reporter.on_hash_start(total);
        let start = Instant::now();
        let hashed = AtomicUsize::new(0);

        let records = inputs
            .into_par_iter()
            .map(|input| {
                let record = self.process_file(input);
                let done = hashed.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_hash_progress(done, total);
                record
            })
            .collect::<Result<Vec<_>, _>>()?;

        let duration = start.elapsed();
        debug!(
            "Hashed {} files in {:.2}s",
            records.len(),
            duration.as_secs_f64()
        );
        reporter.on_hash_complete(records.len(), duration.as_secs_f64());
        Ok(records)
    }

    /// Run the configured clustering over one embedding kind. Clusters
    /// smaller than `clustering.min_cluster_size` are dropped.
    pub fn cluster(
        &self,
        kind: EmbeddingKind,
        items: &[EmbeddingItem],
        method: ClusterMethod,
        level: SimilarityLevel,
    ) -> Result<Vec<SimilarityCluster>, Error> {
        let mut clusters = match method {
            ClusterMethod::Threshold { metric, threshold } => {
                let threshold =
                    threshold.unwrap_or_else(|| self.config.thresholds.for_kind(kind, level));
                cluster_by_threshold(items, threshold, metric)?
            }
            ClusterMethod::Hierarchical {
                max_clusters,
                min_similarity,
            } => match &self.matrix_cache {
                Some(cache) => cache.cluster_hierarchical(items, max_clusters, min_similarity)?,
                None => cluster_hierarchical(items, max_clusters, min_similarity)?,
            },
        };

        let min_size = self.config.clustering.min_cluster_size;
        clusters.retain(|c| c.members.len() >= min_size);
        Ok(clusters)
    }

    /// Full detection over processed records:
    /// 1. Exact-hash buckets
    /// 2. Similarity clustering per embedding kind, over files outside exact groups
    /// 3. Group assembly with keep-candidate selection
    pub fn detect(
        &self,
        files: &[FileRecord],
        options: &DetectOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<DetectionReport, Error> {
        if files.is_empty() {
            return Err(Error::EmptyInput("files"));
        }
        validate_records(files)?;
        for file in files {
            self.validate_embeddings(file.id, &file.embeddings)?;
        }

        let exact_members: AHashSet<FileId> = bucket_by_exact_hash(files)
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .flat_map(|(_, members)| members.into_iter().map(|m| m.id))
            .collect();
        debug!(
            "{} of {} files are byte-identical to another file",
            exact_members.len(),
            files.len()
        );

        let mut clusters_by_type: BTreeMap<EmbeddingKind, Vec<SimilarityCluster>> =
            BTreeMap::new();
        for kind in EmbeddingKind::ALL {
            let items: Vec<EmbeddingItem> = files
                .iter()
                .filter(|f| !exact_members.contains(&f.id))
                .filter_map(|f| {
                    f.embedding(kind)
                        .map(|e| EmbeddingItem::new(f.id, e.vector.clone()))
                })
                .collect();
            if items.len() < 2 {
                continue;
            }

            reporter.on_cluster_start(kind, items.len());
            let start = Instant::now();
            let clusters = self.cluster(kind, &items, options.method, options.level)?;
            let duration = start.elapsed();
            debug!(
                "Clustered {} {} embeddings into {} clusters in {:.2}s",
                items.len(),
                kind,
                clusters.len(),
                duration.as_secs_f64()
            );
            reporter.on_cluster_complete(kind, clusters.len(), duration.as_secs_f64());
            clusters_by_type.insert(kind, clusters);
        }

        let start = Instant::now();
        let report =
            assemble_duplicate_groups(files, &clusters_by_type, options.keep, &options.manual_keep)?;
        reporter.on_assembly_complete(report.groups.len(), start.elapsed().as_secs_f64());
        Ok(report)
    }
}
