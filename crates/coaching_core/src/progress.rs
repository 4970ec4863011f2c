//! crates/coaching_core/src/progress.rs
//!
//! The progress upsert policy: one row per `(user, skill)`, created on first
//! report and merged on every later one.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ProgressUpdate, UserProgress};
use crate::guard::Caller;
use crate::ports::{EntityStore, PortError, PortResult};

pub const MAX_PROGRESS: u8 = 100;

impl ProgressUpdate {
    pub fn validate(&self) -> PortResult<()> {
        match self.progress {
            Some(p) if p > MAX_PROGRESS => Err(PortError::BadRequest(format!(
                "Progress must be between 0 and {}",
                MAX_PROGRESS
            ))),
            _ => Ok(()),
        }
    }
}

/// Builds the first row for a key, defaulting progress to 0 and the
/// completed set to empty.
pub fn new_row(
    user_id: Uuid,
    skill_type: &str,
    update: ProgressUpdate,
    now: DateTime<Utc>,
) -> UserProgress {
    UserProgress {
        id: Uuid::new_v4(),
        user_id,
        module_id: update.module_id,
        skill_type: skill_type.to_string(),
        progress: update.progress.unwrap_or(0),
        completed_exercises: update.completed_exercises.unwrap_or_default(),
        last_activity: now,
    }
}

/// Merges a report into an existing row. Only `last_activity` changes when
/// the report carries nothing new.
pub fn merge_into(row: &mut UserProgress, update: ProgressUpdate, now: DateTime<Utc>) {
    if let Some(module_id) = update.module_id {
        row.module_id = Some(module_id);
    }
    if let Some(progress) = update.progress {
        row.progress = progress;
    }
    if let Some(completed) = update.completed_exercises {
        row.completed_exercises = completed;
    }
    row.last_activity = now;
}

/// Records a progress report for the caller.
pub async fn record_progress(
    store: &dyn EntityStore,
    caller: &Caller,
    skill_type: &str,
    update: ProgressUpdate,
) -> PortResult<UserProgress> {
    let skill_type = skill_type.trim();
    if skill_type.is_empty() {
        return Err(PortError::BadRequest("Skill type is required".to_string()));
    }
    update.validate()?;
    store.upsert_progress(caller.user_id, skill_type, update).await
}
