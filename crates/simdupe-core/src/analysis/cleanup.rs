use super::groups::{select_keep, KeepStrategy};
use crate::error::Error;
use crate::model::{DetectionReport, DuplicateGroup, FileId, FileRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Which groups to clean up and how to choose the survivor in each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupRequest {
    /// Group keys to include. Empty selects every group in the report.
    pub group_keys: Vec<String>,
    pub strategy: KeepStrategy,
    /// For [`KeepStrategy::Manual`]: the first of a group's members found
    /// in this list is kept.
    pub keep_files: Vec<FileId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDeletion {
    pub group: String,
    pub file_id: FileId,
    pub path: String,
    pub size: u64,
}

/// A dry-run deletion plan. Nothing here touches the filesystem.
#[derive(Debug, Default)]
pub struct CleanupPlan {
    pub deletions: Vec<PlannedDeletion>,
    pub kept: Vec<(String, FileId)>,
    pub freed_space: u64,
    /// Groups that could not be planned. Other groups are unaffected.
    pub errors: Vec<Error>,
}

pub fn plan_cleanup(report: &DetectionReport, request: &CleanupRequest) -> CleanupPlan {
    let mut plan = CleanupPlan::default();

    let selected: Vec<&DuplicateGroup> = if request.group_keys.is_empty() {
        report.groups.iter().collect()
    } else {
        let mut selected = Vec::with_capacity(request.group_keys.len());
        for key in &request.group_keys {
            match report.group(key) {
                Some(group) => selected.push(group),
                None => plan.errors.push(Error::UnknownGroup(key.clone())),
            }
        }
        selected
    };

    for group in selected {
        match plan_group(group, request) {
            Ok((keep, deletions)) => {
                plan.freed_space += deletions.iter().map(|d| d.size).sum::<u64>();
                plan.kept.push((group.key.clone(), keep));
                plan.deletions.extend(deletions);
            }
            Err(e) => plan.errors.push(e),
        }
    }

    debug!(
        "Cleanup plan: {} deletions, {} bytes freed, {} groups failed",
        plan.deletions.len(),
        plan.freed_space,
        plan.errors.len()
    );

    plan
}

fn plan_group(
    group: &DuplicateGroup,
    request: &CleanupRequest,
) -> Result<(FileId, Vec<PlannedDeletion>), Error> {
    let members: Vec<&FileRecord> = group.members.iter().collect();

    let mut manual: HashMap<String, FileId> = HashMap::new();
    if request.strategy == KeepStrategy::Manual {
        if let Some(m) = group
            .members
            .iter()
            .find(|m| request.keep_files.contains(&m.id))
        {
            manual.insert(group.key.clone(), m.id);
        }
    }

    let keep = select_keep(&group.key, &members, request.strategy, &manual)?;
    let deletions = group
        .members
        .iter()
        .filter(|m| m.id != keep)
        .map(|m| PlannedDeletion {
            group: group.key.clone(),
            file_id: m.id,
            path: m.path.clone(),
            size: m.size,
        })
        .collect();

    Ok((keep, deletions))
}
