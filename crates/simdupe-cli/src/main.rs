mod commands;
mod embeddings;
mod logging;
mod output;
mod progress;
mod walk;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ScanArgs};
use dotenv::dotenv;
use progress::{BatchProgress, CliReporter};
use simdupe_core::analysis::{plan_cleanup, CleanupRequest};
use simdupe_core::text::extract_keywords;
use simdupe_core::{
    AppConfig, DetectOptions, DetectionEngine, FileId, FileInput, ProgressReporter,
};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match simdupe_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Scan(scan)) => run_scan(&config, &scan),
        Some(Commands::Hash { file }) => run_hash(&config, &file),
        Some(Commands::Keywords { file, max }) => run_keywords(&file, max),
        Some(Commands::PrintConfig) => serde_json::to_string_pretty(&config)
            .map(|json| println!("{}", json))
            .map_err(Into::into),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_scan(config: &AppConfig, args: &ScanArgs) -> Result<()> {
    let roots: Vec<PathBuf> = if !args.paths.is_empty() {
        args.paths.clone()
    } else if !config.scan.root_paths.is_empty() {
        config.scan.root_paths.iter().map(PathBuf::from).collect()
    } else {
        vec![PathBuf::from(".")]
    };

    let embeddings = match &args.embeddings {
        Some(path) => embeddings::load_embeddings(path)?,
        None => HashMap::new(),
    };

    let reporter = CliReporter::new();
    let start = Instant::now();
    reporter.on_walk_start();
    let files = walk::collect_files(
        &roots,
        &config.scan.ignore_patterns,
        config.limits.max_file_size,
    )?;
    let paths = walk::sorted_paths(files);
    reporter.on_walk_complete(paths.len(), start.elapsed().as_secs_f64());

    if paths.is_empty() {
        info!("No files found under {:?}", roots);
        return Ok(());
    }

    // bytes are read one batch at a time and dropped once hashed
    let engine = DetectionEngine::new(config.clone());
    let total = paths.len();
    let hash_start = Instant::now();
    let mut records = Vec::with_capacity(total);
    let mut skipped = 0;
    let mut offset = 0;
    reporter.on_hash_start(total);
    for batch in config.limits.batches(&paths) {
        let (inputs, unreadable) = walk::read_batch(offset as u64 + 1, batch, &embeddings);
        skipped += unreadable;
        let progress = BatchProgress::new(&reporter, offset, total);
        records.extend(engine.process_batch(inputs, &progress)?);
        offset += batch.len();
    }
    reporter.on_hash_complete(records.len(), hash_start.elapsed().as_secs_f64());
    if skipped > 0 {
        warn!("{} unreadable files were skipped", skipped);
    }

    if records.is_empty() {
        info!("No readable files found under {:?}", roots);
        return Ok(());
    }

    let options = DetectOptions {
        method: args.cluster_method(&config.clustering),
        level: args.level.into(),
        keep: args.strategy.into(),
        manual_keep: HashMap::new(),
    };
    let report = engine.detect(&records, &options, &reporter)?;

    let plan = args.plan.then(|| {
        plan_cleanup(
            &report,
            &CleanupRequest {
                strategy: options.keep,
                ..Default::default()
            },
        )
    });

    if args.json {
        println!("{}", output::render_json(&report, plan.as_ref())?);
    } else {
        println!();
        print!("{}", output::render_text(&report));
        if let Some(plan) = &plan {
            println!();
            print!("{}", output::render_plan(plan));
        }
    }

    info!(
        "Scan finished in {}",
        format!("{:.2}s", start.elapsed().as_secs_f64()).green()
    );
    Ok(())
}

fn run_hash(config: &AppConfig, path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let modified_at: DateTime<Utc> = fs::metadata(path)?.modified()?.into();
    let engine = DetectionEngine::new(config.clone());
    let record = engine.process_file(FileInput {
        id: FileId(1),
        path: path.to_string_lossy().into_owned(),
        bytes,
        created_at: modified_at,
        modified_at,
        embeddings: Vec::new(),
    })?;

    println!("{}  {}", "file".bold(), record.path);
    println!("{}  {} ({})", "type".bold(), record.mime_type, record.size);
    println!("{}  {}", "exact".bold(), record.exact_hash);
    if let Some(content) = &record.content_hash {
        println!("{}  {}", "content".bold(), content);
    }
    if let Some(perceptual) = &record.perceptual_hash {
        println!("{}  {}", "perceptual".bold(), perceptual);
    }
    Ok(())
}

fn run_keywords(path: &Path, max: usize) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    for keyword in extract_keywords(&text, max) {
        println!("{}", keyword);
    }
    Ok(())
}
