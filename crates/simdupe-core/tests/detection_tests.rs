use chrono::{TimeZone, Utc};
use simdupe_core::analysis::{plan_cleanup, CleanupRequest};
use simdupe_core::config::ProcessingLimits;
use simdupe_core::filetype::FileKind;
use simdupe_core::hasher::bucket_by_exact_hash;
use simdupe_core::{
    assemble_duplicate_groups, compute_exact_hash, AppConfig, ClusterMethod, DetectOptions,
    DetectionEngine, Embedding, EmbeddingKind, Error, FileId, FileInput, FileRecord, GroupType,
    KeepStrategy, Metric, SilentReporter, SimilarityCluster,
};
use std::collections::{BTreeMap, HashMap, HashSet};

fn small_dimension_config() -> AppConfig {
    AppConfig {
        limits: ProcessingLimits {
            text_embedding_dimension: 3,
            image_embedding_dimension: 2,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn input(id: u64, path: &str, bytes: &[u8], modified: i64) -> FileInput {
    FileInput {
        id: FileId(id),
        path: path.to_string(),
        bytes: bytes.to_vec(),
        created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        modified_at: Utc.timestamp_opt(modified, 0).unwrap(),
        embeddings: Vec::new(),
    }
}

fn with_text_embedding(mut input: FileInput, vector: &[f64]) -> FileInput {
    input
        .embeddings
        .push(Embedding::new(EmbeddingKind::Text, "test-text", vector.to_vec()));
    input
}

fn record(id: u64, size: u64, hash_seed: &str) -> FileRecord {
    FileRecord {
        id: FileId(id),
        path: format!("/data/{}.bin", id),
        name: format!("{}.bin", id),
        size,
        mime_type: "application/octet-stream".to_string(),
        kind: FileKind::Other,
        exact_hash: compute_exact_hash(hash_seed.as_bytes()),
        content_hash: None,
        perceptual_hash: None,
        embeddings: Vec::new(),
        created_at: Utc.timestamp_opt(0, 0).unwrap(),
        modified_at: Utc.timestamp_opt(id as i64, 0).unwrap(),
    }
}

fn assert_partition(groups: &[simdupe_core::DuplicateGroup]) {
    let mut seen = HashSet::new();
    for group in groups {
        assert!(group.members.len() >= 2);
        assert!(
            group.members.iter().any(|m| m.id == group.keep),
            "keep candidate must be a member of {}",
            group.key
        );
        for member in &group.members {
            assert!(seen.insert(member.id), "{} appears twice", member.id);
        }
    }
}

#[test]
fn test_scenario_a_exact_pair() {
    let engine = DetectionEngine::new(small_dimension_config());
    let records = engine
        .process_batch(
            vec![
                input(1, "/a/report.txt", b"same bytes", 10),
                input(2, "/b/report-copy.txt", b"same bytes", 20),
                input(3, "/c/other.txt", b"different bytes", 30),
            ],
            &SilentReporter,
        )
        .unwrap();

    let report = engine
        .detect(&records, &DetectOptions::default(), &SilentReporter)
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.group_type(), GroupType::Exact);
    assert_eq!(group.similarity, 1.0);
    let ids: Vec<FileId> = group.members.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![FileId(1), FileId(2)]);
    assert_eq!(group.keep, FileId(1));
    assert_eq!(group.potential_savings, 10);

    assert_eq!(report.totals.group_count, 1);
    assert_eq!(report.totals.processed_files, 3);
    assert_eq!(report.totals.duplicate_files, 2);
    assert_eq!(report.totals.total_reclaimable, 10);
}

#[test]
fn test_scenario_c_keep_largest() {
    let files = vec![record(1, 500, "x"), record(2, 1200, "x"), record(3, 300, "x")];
    let report =
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::Largest, &HashMap::new())
            .unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.keep, FileId(2));
    assert_eq!(group.keep_candidate().unwrap().size, 1200);
    assert_eq!(group.total_size, 2000);
    assert_eq!(group.potential_savings, 800);
    let removable: Vec<FileId> = group.removable().map(|m| m.id).collect();
    assert_eq!(removable, vec![FileId(1), FileId(3)]);
}

#[test]
fn test_keep_newest_picks_latest_modification() {
    let files = vec![record(1, 10, "x"), record(5, 10, "x"), record(3, 10, "x")];
    let report =
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::Newest, &HashMap::new())
            .unwrap();
    assert_eq!(report.groups[0].keep, FileId(5));
}

#[test]
fn test_no_duplicates_is_empty_report() {
    let files = vec![record(1, 10, "a"), record(2, 10, "b")];
    let report =
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::First, &HashMap::new())
            .unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(report.totals.processed_files, 2);
    assert_eq!(report.totals.total_reclaimable, 0);
}

#[test]
fn test_empty_file_set_fails() {
    assert!(matches!(
        assemble_duplicate_groups(&[], &BTreeMap::new(), KeepStrategy::First, &HashMap::new()),
        Err(Error::EmptyInput(_))
    ));
    let engine = DetectionEngine::new(AppConfig::default());
    assert!(matches!(
        engine.detect(&[], &DetectOptions::default(), &SilentReporter),
        Err(Error::EmptyInput(_))
    ));
}

#[test]
fn test_cluster_members_in_exact_groups_are_not_reported_twice() {
    let files = vec![
        record(1, 100, "dup"),
        record(2, 100, "dup"),
        record(3, 90, "near-1"),
        record(4, 80, "near-2"),
    ];
    let mut clusters = BTreeMap::new();
    clusters.insert(
        EmbeddingKind::Text,
        vec![
            SimilarityCluster {
                cluster_id: 0,
                members: vec![FileId(1), FileId(3), FileId(4)],
                score: 0.9,
            },
            // only one member survives once 1 and 2 are taken
            SimilarityCluster {
                cluster_id: 1,
                members: vec![FileId(2), FileId(3)],
                score: 0.9,
            },
        ],
    );

    let report =
        assemble_duplicate_groups(&files, &clusters, KeepStrategy::First, &HashMap::new()).unwrap();
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].group_type(), GroupType::Exact);
    assert_eq!(report.groups[1].group_type(), GroupType::TextSimilar);
    assert_eq!(report.groups[1].key, "text_similar:0");
    let similar: Vec<FileId> = report.groups[1].members.iter().map(|m| m.id).collect();
    assert_eq!(similar, vec![FileId(3), FileId(4)]);
    assert_eq!(report.groups[1].similarity, 0.9);
    assert_partition(&report.groups);
}

#[test]
fn test_unknown_cluster_member_aborts() {
    let files = vec![record(1, 1, "a"), record(2, 1, "b")];
    let mut clusters = BTreeMap::new();
    clusters.insert(
        EmbeddingKind::Image,
        vec![SimilarityCluster {
            cluster_id: 4,
            members: vec![FileId(1), FileId(42)],
            score: 0.8,
        }],
    );
    assert!(matches!(
        assemble_duplicate_groups(&files, &clusters, KeepStrategy::First, &HashMap::new()),
        Err(Error::UnknownClusterMember { cluster_id: 4, file_id: FileId(42) })
    ));
}

#[test]
fn test_duplicate_file_id_rejected() {
    let files = vec![record(1, 1, "a"), record(1, 1, "b")];
    assert!(matches!(
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::First, &HashMap::new()),
        Err(Error::DuplicateFileId(FileId(1)))
    ));
}

#[test]
fn test_manual_keep_by_group_key() {
    let files = vec![record(1, 10, "x"), record(2, 10, "x")];
    let key = format!("exact:{}", compute_exact_hash(b"x"));

    let mut manual = HashMap::new();
    manual.insert(key.clone(), FileId(2));
    let report =
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::Manual, &manual)
            .unwrap();
    assert_eq!(report.groups[0].key, key);
    assert_eq!(report.groups[0].keep, FileId(2));

    manual.insert(key, FileId(3));
    assert!(matches!(
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::Manual, &manual),
        Err(Error::InvalidKeepCandidate { file_id: FileId(3), .. })
    ));
}

#[test]
fn test_detect_similarity_groups_with_threshold() {
    let engine = DetectionEngine::new(small_dimension_config());
    let records = engine
        .process_batch(
            vec![
                with_text_embedding(input(1, "/t/a.md", b"alpha draft", 100), &[1.0, 0.0, 0.0]),
                with_text_embedding(input(2, "/t/b.md", b"alpha final!", 200), &[0.99, 0.05, 0.0]),
                with_text_embedding(input(3, "/t/c.md", b"unrelated", 300), &[0.0, 0.0, 1.0]),
                with_text_embedding(input(4, "/t/d.md", b"alpha draft", 50), &[1.0, 0.0, 0.0]),
            ],
            &SilentReporter,
        )
        .unwrap();

    let options = DetectOptions {
        method: ClusterMethod::Threshold {
            metric: Metric::Cosine,
            threshold: Some(0.9),
        },
        keep: KeepStrategy::Newest,
        ..Default::default()
    };
    let report = engine.detect(&records, &options, &SilentReporter).unwrap();

    // 1 and 4 are byte-identical; 2 is only similar and has nothing left to pair with
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].group_type(), GroupType::Exact);
    assert_eq!(report.groups[0].keep, FileId(1));
    assert_partition(&report.groups);
}

#[test]
fn test_min_cluster_size_drops_small_clusters() {
    let mut config = small_dimension_config();
    config.clustering.min_cluster_size = 3;
    let engine = DetectionEngine::new(config);
    let records = engine
        .process_batch(
            vec![
                with_text_embedding(input(1, "/t/a.md", b"alpha", 1), &[1.0, 0.0, 0.0]),
                with_text_embedding(input(2, "/t/b.md", b"alpha!", 2), &[0.99, 0.05, 0.0]),
                with_text_embedding(input(3, "/t/c.md", b"beta", 3), &[0.0, 1.0, 0.0]),
                with_text_embedding(input(4, "/t/d.md", b"beta!", 4), &[0.0, 0.99, 0.05]),
                with_text_embedding(input(5, "/t/e.md", b"beta?", 5), &[0.0, 0.98, 0.1]),
            ],
            &SilentReporter,
        )
        .unwrap();

    let options = DetectOptions {
        method: ClusterMethod::Threshold {
            metric: Metric::Cosine,
            threshold: Some(0.9),
        },
        ..Default::default()
    };
    let report = engine.detect(&records, &options, &SilentReporter).unwrap();

    assert_eq!(report.groups.len(), 1);
    let ids: Vec<FileId> = report.groups[0].members.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![FileId(3), FileId(4), FileId(5)]);
}

#[test]
fn test_detect_hierarchical_similarity_group() {
    let engine = DetectionEngine::new(small_dimension_config());
    let records = engine
        .process_batch(
            vec![
                with_text_embedding(input(1, "/t/a.txt", b"one", 1), &[1.0, 0.0, 0.0]),
                with_text_embedding(input(2, "/t/b.txt", b"second", 2), &[0.98, 0.1, 0.0]),
                with_text_embedding(input(3, "/t/c.txt", b"three", 3), &[0.0, 0.0, 1.0]),
            ],
            &SilentReporter,
        )
        .unwrap();

    let options = DetectOptions {
        method: ClusterMethod::Hierarchical {
            max_clusters: 1,
            min_similarity: 0.9,
        },
        keep: KeepStrategy::Largest,
        ..Default::default()
    };
    let report = engine.detect(&records, &options, &SilentReporter).unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.group_type(), GroupType::TextSimilar);
    assert!(group.similarity > 0.99 && group.similarity <= 1.0);
    assert_eq!(group.keep, FileId(2));
    assert_partition(&report.groups);
}

#[test]
fn test_detect_rejects_wrong_model_dimension() {
    let engine = DetectionEngine::new(small_dimension_config());
    let bad = with_text_embedding(input(1, "/t/a.txt", b"one", 1), &[1.0, 0.0]);
    assert!(matches!(
        engine.process_file(bad),
        Err(Error::InvalidEmbedding { expected: 3, actual: 2, .. })
    ));
}

#[test]
fn test_nan_embedding_never_reaches_clustering() {
    let engine = DetectionEngine::new(small_dimension_config());
    let bad = with_text_embedding(input(1, "/t/a.txt", b"one", 1), &[f64::NAN, 0.0, 0.0]);
    assert!(matches!(
        engine.process_file(bad),
        Err(Error::NonFiniteEmbedding { file_id: FileId(1) })
    ));

    // records built by hand skip process_file but not detect
    let mut records = engine
        .process_batch(
            vec![
                with_text_embedding(input(1, "/t/a.txt", b"one", 1), &[1.0, 0.0, 0.0]),
                with_text_embedding(input(2, "/t/b.txt", b"two", 2), &[1.0, 0.0, 0.0]),
                with_text_embedding(input(3, "/t/c.txt", b"three", 3), &[0.0, 1.0, 0.0]),
            ],
            &SilentReporter,
        )
        .unwrap();
    records[0].embeddings[0].vector[0] = f64::NAN;

    let options = DetectOptions {
        method: ClusterMethod::Hierarchical {
            max_clusters: 1,
            min_similarity: 0.99,
        },
        ..Default::default()
    };
    assert!(matches!(
        engine.detect(&records, &options, &SilentReporter),
        Err(Error::NonFiniteEmbedding { file_id: FileId(1) })
    ));
}

#[test]
fn test_process_file_fingerprints_by_kind() {
    let engine = DetectionEngine::new(AppConfig::default());

    let text = engine
        .process_file(input(1, "/docs/Notes.TXT", b"Hello   World", 0))
        .unwrap();
    assert_eq!(text.kind, FileKind::Text);
    assert_eq!(text.name, "Notes.TXT");
    assert_eq!(text.mime_type, "text/plain");
    assert_eq!(
        text.content_hash,
        Some(simdupe_core::compute_content_hash("hello world"))
    );
    assert!(text.perceptual_hash.is_none());

    let image = engine
        .process_file(input(2, "/img/cat.png", b"\x89PNG....", 0))
        .unwrap();
    assert_eq!(image.kind, FileKind::Image);
    assert!(image.content_hash.is_none());
    assert_eq!(image.perceptual_hash.unwrap().as_str().len(), 16);
}

#[test]
fn test_process_file_enforces_limits() {
    let config = AppConfig {
        limits: ProcessingLimits {
            max_file_size: 4,
            ..Default::default()
        },
        ..Default::default()
    };
    let engine = DetectionEngine::new(config);
    assert!(matches!(
        engine.process_file(input(1, "/big.bin", b"12345", 0)),
        Err(Error::LimitExceeded { what: "file size", .. })
    ));
}

#[test]
fn test_bucket_order_is_first_seen() {
    let files = vec![record(1, 1, "b"), record(2, 1, "a"), record(3, 1, "b")];
    let buckets = bucket_by_exact_hash(&files);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].0, compute_exact_hash(b"b"));
    assert_eq!(buckets[0].1.len(), 2);
    assert_eq!(buckets[1].1[0].id, FileId(2));
}

#[test]
fn test_cleanup_plan() {
    let files = vec![
        record(1, 500, "x"),
        record(2, 1200, "x"),
        record(3, 300, "x"),
        record(4, 70, "y"),
        record(5, 70, "y"),
    ];
    let report =
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::First, &HashMap::new())
            .unwrap();
    assert_eq!(report.ranked_by_savings()[0].key, report.groups[0].key);

    let plan = plan_cleanup(
        &report,
        &CleanupRequest {
            group_keys: Vec::new(),
            strategy: KeepStrategy::Largest,
            keep_files: Vec::new(),
        },
    );
    assert!(plan.errors.is_empty());
    assert_eq!(plan.deletions.len(), 3);
    assert_eq!(plan.freed_space, 800 + 70);
    assert_eq!(plan.kept[0].1, FileId(2));

    let first_key = report.groups[0].key.clone();
    let plan = plan_cleanup(
        &report,
        &CleanupRequest {
            group_keys: vec![first_key, "exact:missing".to_string()],
            strategy: KeepStrategy::Manual,
            keep_files: vec![FileId(3)],
        },
    );
    assert_eq!(plan.kept.len(), 1);
    assert_eq!(plan.kept[0].1, FileId(3));
    assert_eq!(plan.freed_space, 1700);
    assert_eq!(plan.errors.len(), 1);
    assert!(matches!(plan.errors[0], Error::UnknownGroup(_)));
}

#[test]
fn test_report_serializes_group_type_tags() {
    let files = vec![record(1, 5, "x"), record(2, 5, "x")];
    let report =
        assemble_duplicate_groups(&files, &BTreeMap::new(), KeepStrategy::First, &HashMap::new())
            .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["groups"][0]["matched"]["match"], "exact");
    assert_eq!(json["totals"]["group_count"], 1);
}
