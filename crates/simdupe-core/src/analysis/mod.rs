pub mod cleanup;
pub mod groups;

pub use cleanup::{plan_cleanup, CleanupPlan, CleanupRequest, PlannedDeletion};
pub use groups::{assemble_duplicate_groups, select_keep, validate_records, KeepStrategy};
