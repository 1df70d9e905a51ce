//! API request and response types, with boundary validation.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::PeriodSpec;
use crate::storage::models::{NewTask, RescheduleBase, StoredTask, TaskChanges};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Request to create a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub list_id: u64,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub reschedule_period: Option<String>,
    #[serde(default)]
    pub reschedule_base: RescheduleBase,
    #[serde(default)]
    pub prohibited_months: Vec<u32>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// Request to update a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub list_id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub reschedule_period: Option<String>,
    pub reschedule_base: Option<RescheduleBase>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Client-side timestamp of the update, carrying the client's UTC
    /// offset. Preferred completion anchor because its calendar date is the
    /// client's, not the server's.
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub prohibited_months: Option<Vec<u32>>,
    pub constraints: Option<Vec<String>>,
}

/// Request to snooze a task: push its due date out by a period.
#[derive(Debug, Clone, Deserialize)]
pub struct SnoozeTaskRequest {
    pub period: String,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

/// Request to create or rename a task list.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPayload {
    pub name: String,
}

/// Response for task updates: the updated task plus any follow-up task the
/// completion spawned.
#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdateResponse {
    pub task: StoredTask,
    pub created_task: Option<StoredTask>,
}

fn check_title(title: &str) -> Result<(), String> {
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be 1-{} characters", MAX_TITLE_LEN));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), String> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ));
    }
    Ok(())
}

fn check_period(period: &str) -> Result<(), String> {
    period
        .parse::<PeriodSpec>()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn check_prohibited_months(months: &[u32]) -> Result<(), String> {
    match months.iter().find(|m| !(1..=12).contains(*m)) {
        Some(m) => Err(format!("prohibited month {} is out of range 1-12", m)),
        None => Ok(()),
    }
}

impl CreateTaskRequest {
    /// Validate field constraints. Returns a human-readable message on the
    /// first violation.
    pub fn validate(&self) -> Result<(), String> {
        check_title(&self.title)?;
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        if let Some(period) = &self.reschedule_period {
            check_period(period)?;
        }
        check_prohibited_months(&self.prohibited_months)
    }

    pub fn into_new_task(self) -> NewTask {
        NewTask {
            list_id: self.list_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            due_date: self.due_date,
            reschedule_period: self.reschedule_period,
            reschedule_base: self.reschedule_base,
            prohibited_months: self.prohibited_months,
            constraints: self.constraints,
        }
    }
}

impl UpdateTaskRequest {
    /// Validate field constraints on the fields that are present.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        if let Some(period) = &self.reschedule_period {
            check_period(period)?;
        }
        if let Some(months) = &self.prohibited_months {
            check_prohibited_months(months)?;
        }
        Ok(())
    }

    pub fn to_changes(&self) -> TaskChanges {
        TaskChanges {
            list_id: self.list_id,
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            due_date: self.due_date,
            reschedule_period: self.reschedule_period.clone(),
            reschedule_base: self.reschedule_base,
            completed_at: self.completed_at,
            prohibited_months: self.prohibited_months.clone(),
            constraints: self.constraints.clone(),
        }
    }
}

impl SnoozeTaskRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_period(&self.period)
    }
}

impl ListPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.chars().count() > MAX_TITLE_LEN {
            return Err(format!("name must be 1-{} characters", MAX_TITLE_LEN));
        }
        Ok(())
    }
}
