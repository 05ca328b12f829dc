use crate::filetype::FileKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a file, assigned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full-length lower-case hex digest (64 chars for SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Truncated digest used by the perceptual-hash placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortDigest(String);

impl ShortDigest {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    Text,
    Image,
}

impl EmbeddingKind {
    pub const ALL: [EmbeddingKind; 2] = [EmbeddingKind::Text, EmbeddingKind::Image];

    pub fn group_type(self) -> GroupType {
        match self {
            EmbeddingKind::Text => GroupType::TextSimilar,
            EmbeddingKind::Image => GroupType::ImageSimilar,
        }
    }
}

impl fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingKind::Text => f.write_str("text"),
            EmbeddingKind::Image => f.write_str("image"),
        }
    }
}

/// An embedding produced by an external model for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub kind: EmbeddingKind,
    pub model: String,
    pub dimension: usize,
    pub vector: Vec<f64>,
}

impl Embedding {
    pub fn new(kind: EmbeddingKind, model: impl Into<String>, vector: Vec<f64>) -> Self {
        Self {
            kind,
            model: model.into(),
            dimension: vector.len(),
            vector,
        }
    }
}

/// A processed file. Immutable input to detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub path: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub kind: FileKind,
    pub exact_hash: Digest,
    pub content_hash: Option<Digest>,
    pub perceptual_hash: Option<ShortDigest>,
    pub embeddings: Vec<Embedding>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn embedding(&self, kind: EmbeddingKind) -> Option<&Embedding> {
        self.embeddings.iter().find(|e| e.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Exact,
    TextSimilar,
    ImageSimilar,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupType::Exact => f.write_str("exact"),
            GroupType::TextSimilar => f.write_str("text_similar"),
            GroupType::ImageSimilar => f.write_str("image_similar"),
        }
    }
}

/// What tied the members of a group together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum GroupMatch {
    Exact { exact_hash: Digest },
    Similar { kind: EmbeddingKind, cluster_id: u32 },
}

impl GroupMatch {
    pub fn group_type(&self) -> GroupType {
        match self {
            GroupMatch::Exact { .. } => GroupType::Exact,
            GroupMatch::Similar { kind, .. } => kind.group_type(),
        }
    }

    /// Stable key used to address a group within one detection run,
    /// e.g. `exact:<hash>` or `text_similar:3`.
    pub fn key(&self) -> String {
        match self {
            GroupMatch::Exact { exact_hash } => format!("exact:{}", exact_hash),
            GroupMatch::Similar { kind, cluster_id } => {
                format!("{}:{}", kind.group_type(), cluster_id)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub matched: GroupMatch,
    pub similarity: f64,
    pub members: Vec<FileRecord>,
    pub keep: FileId,
    pub total_size: u64,
    pub potential_savings: u64,
}

impl DuplicateGroup {
    pub fn group_type(&self) -> GroupType {
        self.matched.group_type()
    }

    pub fn keep_candidate(&self) -> Option<&FileRecord> {
        self.members.iter().find(|m| m.id == self.keep)
    }

    /// Members that would be removed if the keep candidate is retained.
    pub fn removable(&self) -> impl Iterator<Item = &FileRecord> {
        self.members.iter().filter(move |m| m.id != self.keep)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionTotals {
    pub group_count: usize,
    pub total_reclaimable: u64,
    pub processed_files: usize,
    pub duplicate_files: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    pub groups: Vec<DuplicateGroup>,
    pub totals: DetectionTotals,
}

impl DetectionReport {
    /// Groups ordered by descending potential savings. Equal savings keep
    /// discovery order.
    pub fn ranked_by_savings(&self) -> Vec<&DuplicateGroup> {
        let mut ranked: Vec<&DuplicateGroup> = self.groups.iter().collect();
        ranked.sort_by(|a, b| b.potential_savings.cmp(&a.potential_savings));
        ranked
    }

    pub fn group(&self, key: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.key == key)
    }
}
