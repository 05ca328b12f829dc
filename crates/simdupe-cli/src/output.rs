use anyhow::Result;
use colored::*;
use serde::Serialize;
use simdupe_core::analysis::{CleanupPlan, PlannedDeletion};
use simdupe_core::{DetectionReport, DuplicateGroup};
use std::fmt::Write;

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a DetectionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<JsonPlan<'a>>,
}

#[derive(Serialize)]
struct JsonPlan<'a> {
    deletions: &'a [PlannedDeletion],
    freed_space: u64,
    errors: Vec<String>,
}

pub fn render_json(report: &DetectionReport, plan: Option<&CleanupPlan>) -> Result<String> {
    let output = JsonOutput {
        report,
        plan: plan.map(|p| JsonPlan {
            deletions: &p.deletions,
            freed_space: p.freed_space,
            errors: p.errors.iter().map(|e| e.to_string()).collect(),
        }),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Human-readable report, groups ranked by potential savings.
pub fn render_text(report: &DetectionReport) -> String {
    let mut out = String::new();
    for group in report.ranked_by_savings() {
        render_group(&mut out, group);
    }

    let totals = &report.totals;
    let _ = writeln!(
        out,
        "{} duplicate groups, {} of {} files involved, {} reclaimable",
        format!("{}", totals.group_count).red(),
        format!("{}", totals.duplicate_files).red(),
        totals.processed_files,
        format_bytes(totals.total_reclaimable).red(),
    );
    out
}

fn render_group(out: &mut String, group: &DuplicateGroup) {
    let _ = writeln!(
        out,
        "{} {} similarity {:.3}, {} reclaimable",
        group.group_type().to_string().cyan().bold(),
        group.key.dimmed(),
        group.similarity,
        format_bytes(group.potential_savings),
    );
    for member in &group.members {
        let marker = if member.id == group.keep {
            "keep".green()
        } else {
            "dupe".yellow()
        };
        let _ = writeln!(
            out,
            "  [{}] {} ({})",
            marker,
            member.path,
            format_bytes(member.size)
        );
    }
    out.push('\n');
}

pub fn render_plan(plan: &CleanupPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Cleanup plan (dry run)".bold());
    for deletion in &plan.deletions {
        let _ = writeln!(
            out,
            "  {} {} ({})",
            "rm".red(),
            deletion.path,
            format_bytes(deletion.size)
        );
    }
    for error in &plan.errors {
        let _ = writeln!(out, "  {} {}", "skipped".yellow(), error);
    }
    let _ = writeln!(
        out,
        "{} files, {} freed",
        plan.deletions.len(),
        format_bytes(plan.freed_space).green()
    );
    out
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
