use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use simdupe_core::{EmbeddingKind, ProgressReporter};
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Walk phase: spinner, driven from `main`
/// - Hash phase: one progress bar across all batches (see [`BatchProgress`])
/// - Cluster phase: spinner per embedding kind
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn spinner(&self, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    pub fn on_walk_start(&self) {
        self.spinner("Scanning files...".to_string());
    }

    pub fn on_walk_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Scan complete: {} files in {:.2}s",
            "✓".green(),
            total_files,
            duration_secs
        );
    }
}

impl ProgressReporter for CliReporter {
    fn on_hash_start(&self, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Hashing [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_hash_progress(&self, files_hashed: usize, total_files: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                if pb.length() != Some(total_files as u64) {
                    pb.set_length(total_files as u64);
                }
                pb.set_position(files_hashed as u64);
            }
        }
    }

    fn on_hash_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Hash complete: {} files in {:.2}s",
            "✓".green(),
            total_files,
            duration_secs
        );
    }

    fn on_cluster_start(&self, kind: EmbeddingKind, items: usize) {
        self.spinner(format!("Clustering {} {} embeddings...", items, kind));
    }

    fn on_cluster_complete(&self, kind: EmbeddingKind, clusters: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Clustered {} embeddings: {} clusters in {:.2}s",
            "✓".green(),
            kind,
            clusters,
            duration_secs
        );
    }

    fn on_assembly_complete(&self, groups: usize, duration_secs: f64) {
        eprintln!(
            "  {} Grouping complete: {} duplicate groups in {:.2}s",
            "✓".green(),
            groups,
            duration_secs
        );
    }
}

/// Forwards per-batch hash progress to a run-wide reporter. Batch start and
/// completion are swallowed; the caller reports those once for the run.
pub struct BatchProgress<'a> {
    inner: &'a dyn ProgressReporter,
    offset: usize,
    total: usize,
}

impl<'a> BatchProgress<'a> {
    pub fn new(inner: &'a dyn ProgressReporter, offset: usize, total: usize) -> Self {
        Self {
            inner,
            offset,
            total,
        }
    }
}

impl ProgressReporter for BatchProgress<'_> {
    fn on_hash_progress(&self, files_hashed: usize, _batch_total: usize) {
        self.inner
            .on_hash_progress(self.offset + files_hashed, self.total);
    }
}
