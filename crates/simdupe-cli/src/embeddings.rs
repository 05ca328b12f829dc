use anyhow::{Context, Result};
use serde::Deserialize;
use simdupe_core::{Embedding, EmbeddingKind};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One entry of the embeddings sidecar file.
///
/// The file is a JSON object keyed by file path:
/// `{"docs/a.txt": [{"kind": "text", "model": "minilm", "vector": [..]}]}`
#[derive(Debug, Deserialize)]
struct SidecarEntry {
    kind: EmbeddingKind,
    #[serde(default)]
    model: String,
    vector: Vec<f64>,
}

/// Load precomputed embeddings, keyed by canonical path where the file
/// exists and by the path as written otherwise.
pub fn load_embeddings(path: &Path) -> Result<HashMap<PathBuf, Vec<Embedding>>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading embeddings file {}", path.display()))?;
    let entries: HashMap<String, Vec<SidecarEntry>> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing embeddings file {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut embeddings = HashMap::with_capacity(entries.len());
    for (file, list) in entries {
        let file = PathBuf::from(file);
        // relative keys are taken relative to the sidecar itself
        let resolved = if file.is_relative() && !file.exists() {
            base.join(&file)
        } else {
            file
        };
        let key = fs::canonicalize(&resolved).unwrap_or(resolved);
        let list: Vec<Embedding> = list
            .into_iter()
            .map(|e| Embedding::new(e.kind, e.model, e.vector))
            .collect();
        embeddings.insert(key, list);
    }

    debug!(
        "Loaded embeddings for {} files from {}",
        embeddings.len(),
        path.display()
    );
    Ok(embeddings)
}
