//! Follow-up planning for completed recurring tasks.
//!
//! When a task update flips the completion flag on and the task carries a
//! reschedule period, a fresh task is created with the same configuration
//! and a newly computed due date. This module decides *whether* that happens
//! and *what* the follow-up looks like; persisting it and announcing the
//! events is the caller's job (update first, then the follow-up, so a
//! follow-up is never observed before its trigger).

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::recurrence::{self, RecurrenceError};
use crate::storage::models::{NewTask, RescheduleBase, StoredTask};

/// Plan the follow-up for a task that was just updated.
///
/// `completion_was_fresh` is the store's report of an edge-triggered
/// false-to-true completion flip; anything else (repeated completions,
/// un-completions, unrelated edits) plans nothing, as does a task without a
/// reschedule period.
///
/// The anchor date for the next occurrence is chosen by `reschedule_base`:
/// - `due`: the task's current due date.
/// - `completed` (default): the client-supplied timestamp from the update
///   request if given (its calendar date in the client's own offset),
///   otherwise the stored completion timestamp.
///
/// Either way, a missing anchor falls back to `today`.
///
/// # Errors
///
/// Returns `RecurrenceError` if the stored reschedule period does not parse;
/// validated tasks never hit this.
pub fn plan_follow_up(
    task: &StoredTask,
    completion_was_fresh: bool,
    client_timestamp: Option<DateTime<FixedOffset>>,
    today: NaiveDate,
) -> Result<Option<NewTask>, RecurrenceError> {
    if !completion_was_fresh {
        return Ok(None);
    }
    let Some(period) = task.reschedule_period.as_deref() else {
        return Ok(None);
    };

    let anchor = match task.reschedule_base {
        RescheduleBase::Due => task.due_date,
        RescheduleBase::Completed => client_timestamp
            .map(|ts| ts.date_naive())
            .or_else(|| task.completed_at.map(|ts| ts.date_naive())),
    };
    let anchor = anchor.unwrap_or(today);

    let next_due = recurrence::compute_next_due(anchor, period, &task.prohibited_months)?;

    Ok(Some(NewTask {
        list_id: task.list_id,
        title: task.title.clone(),
        description: task.description.clone(),
        completed: false,
        due_date: Some(next_due),
        reschedule_period: task.reschedule_period.clone(),
        reschedule_base: task.reschedule_base,
        prohibited_months: task.prohibited_months.clone(),
        constraints: task.constraints.clone(),
    }))
}
