use chrono::{DateTime, Utc};
use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use simdupe_core::{Embedding, FileId, FileInput};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Parallel directory traversal. Builds a map of path → size, filtering by
/// glob ignore patterns. Skips symlinks, 0-byte files and files larger than
/// `max_file_size`.
pub fn collect_files(
    root_paths: &[PathBuf],
    ignore_globs: &[String],
    max_file_size: u64,
) -> io::Result<DashMap<PathBuf, u64>> {
    let map: DashMap<PathBuf, u64> = DashMap::new();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let walker = Walker {
        map: &map,
        ignore_patterns: &ignore_patterns,
        max_file_size,
    };

    root_paths.par_iter().try_for_each(|root| {
        if root.is_file() {
            walker.visit_file(root)
        } else {
            walker.visit_dir(root)
        }
    })?;

    Ok(map)
}

struct Walker<'a> {
    map: &'a DashMap<PathBuf, u64>,
    ignore_patterns: &'a [Pattern],
    max_file_size: u64,
}

impl Walker<'_> {
    fn ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    fn visit_file(&self, path: &Path) -> io::Result<()> {
        let metadata = fs::symlink_metadata(path).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error getting metadata for {}: {}", path.display(), err),
            )
        })?;

        if metadata.file_type().is_symlink() || metadata.len() == 0 || self.ignored(path) {
            return Ok(());
        }
        if metadata.len() > self.max_file_size {
            warn!(
                "Skipping {}: {} bytes exceeds the {} byte limit",
                path.display(),
                metadata.len(),
                self.max_file_size
            );
            return Ok(());
        }

        self.map.insert(path.to_path_buf(), metadata.len());
        Ok(())
    }

    fn visit_dir(&self, dir: &Path) -> io::Result<()> {
        if !dir.is_dir() || self.ignored(dir) {
            return Ok(());
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() == io::ErrorKind::PermissionDenied {
                    error!("Access denied reading directory {}: {}", dir.display(), err);
                    return Ok(());
                }
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error reading directory {}: {}", dir.display(), err),
                ));
            }
        };

        entries.par_bridge().try_for_each(|entry_result| {
            let entry = entry_result.map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Error reading entry in directory {}: {}", dir.display(), err),
                )
            })?;

            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                Ok(())
            } else if file_type.is_dir() {
                self.visit_dir(&path)
            } else {
                self.visit_file(&path)
            }
        })
    }
}

/// Collected paths in sorted order, so ids derived from positions are stable
/// across runs.
pub fn sorted_paths(files: DashMap<PathBuf, u64>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = files.into_iter().map(|(path, _)| path).collect();
    paths.sort();
    paths
}

/// Read one batch of paths into [`FileInput`]s. The file at `paths[i]` gets
/// id `first_id + i`. Unreadable files are logged and skipped; the second
/// value is how many were skipped.
pub fn read_batch(
    first_id: u64,
    paths: &[PathBuf],
    embeddings: &HashMap<PathBuf, Vec<Embedding>>,
) -> (Vec<FileInput>, usize) {
    let loaded: Vec<Option<FileInput>> = paths
        .par_iter()
        .enumerate()
        .map(|(offset, path)| {
            match read_input(FileId(first_id + offset as u64), path, embeddings) {
                Ok(input) => Some(input),
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                    None
                }
            }
        })
        .collect();

    let skipped = loaded.iter().filter(|i| i.is_none()).count();
    (loaded.into_iter().flatten().collect(), skipped)
}

fn read_input(
    id: FileId,
    path: &Path,
    embeddings: &HashMap<PathBuf, Vec<Embedding>>,
) -> io::Result<FileInput> {
    let bytes = fs::read(path)?;
    let metadata = fs::metadata(path)?;
    let modified_at: DateTime<Utc> = metadata.modified()?.into();
    // not every filesystem records a birth time
    let created_at: DateTime<Utc> = metadata
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(modified_at);

    let attached = embeddings
        .get(path)
        .or_else(|| {
            fs::canonicalize(path)
                .ok()
                .and_then(|canonical| embeddings.get(&canonical))
        })
        .cloned()
        .unwrap_or_default();

    Ok(FileInput {
        id,
        path: path.to_string_lossy().into_owned(),
        bytes,
        created_at,
        modified_at,
        embeddings: attached,
    })
}
