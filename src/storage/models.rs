//! Stored record types and changesets.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which date anchors the next occurrence of a recurring task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleBase {
    /// Compute from the completion date (default).
    #[default]
    Completed,
    /// Compute from the task's current due date.
    Due,
}

/// A stored task.
///
/// Recurrence fields (`reschedule_period`, `reschedule_base`,
/// `prohibited_months`) are set at creation and only changed by explicit
/// update; completing a recurring task creates a *new* task carrying them
/// forward rather than mutating this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: u64,
    pub list_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    /// Recurrence interval, e.g. "5d", "1w", "1m". None = non-recurring.
    pub reschedule_period: Option<String>,
    #[serde(default)]
    pub reschedule_base: RescheduleBase,
    /// Calendar months (1-12) the due date must avoid.
    #[serde(default)]
    pub prohibited_months: Vec<u32>,
    /// Free-form constraint strings carried along with the task.
    #[serde(default)]
    pub constraints: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredList {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Specification for creating a task.
///
/// Shared by the create endpoint and follow-up creation on completion.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub list_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub reschedule_period: Option<String>,
    pub reschedule_base: RescheduleBase,
    pub prohibited_months: Vec<u32>,
    pub constraints: Vec<String>,
}

/// Changeset for updating a task. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub list_id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub reschedule_period: Option<String>,
    pub reschedule_base: Option<RescheduleBase>,
    pub completed_at: Option<DateTime<Utc>>,
    pub prohibited_months: Option<Vec<u32>>,
    pub constraints: Option<Vec<String>>,
}

impl StoredTask {
    /// Derive a new task value from this one plus a changeset.
    ///
    /// Flipping `completed` on stamps `completed_at` with `now`; flipping it
    /// off clears it. An explicit `completed_at` in the changeset wins over
    /// the stamped value.
    pub fn apply(&self, changes: &TaskChanges, now: DateTime<Utc>) -> StoredTask {
        let completed = changes.completed.unwrap_or(self.completed);
        let completed_at = match changes.completed {
            Some(true) => Some(now),
            Some(false) => None,
            None => self.completed_at,
        };

        StoredTask {
            id: self.id,
            list_id: changes.list_id.unwrap_or(self.list_id),
            title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            description: changes
                .description
                .clone()
                .or_else(|| self.description.clone()),
            completed,
            due_date: changes.due_date.or(self.due_date),
            reschedule_period: changes
                .reschedule_period
                .clone()
                .or_else(|| self.reschedule_period.clone()),
            reschedule_base: changes.reschedule_base.unwrap_or(self.reschedule_base),
            prohibited_months: changes
                .prohibited_months
                .clone()
                .unwrap_or_else(|| self.prohibited_months.clone()),
            constraints: changes
                .constraints
                .clone()
                .unwrap_or_else(|| self.constraints.clone()),
            completed_at: changes.completed_at.or(completed_at),
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

/// Result of applying a task update.
#[derive(Debug, Clone)]
pub struct TaskUpdateOutcome {
    /// The task after the changeset was applied.
    pub task: StoredTask,
    /// True when this update flipped `completed` from unset to set.
    /// Repeated `completed: true` updates report false, so completion
    /// side effects fire exactly once per transition.
    pub completion_was_fresh: bool,
}
