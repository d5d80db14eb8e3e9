//! Supervisor review workflow for maintenance tasks.
//!
//! State machine: open -> submitted -> {approved, rejected};
//! approved -> reopened -> open. Each function validates the transition
//! against the current task record and returns the event to append, so the
//! store never records an impossible history. After any of these actions
//! the schedule must be recomputed from a fresh snapshot; approval feeds
//! the cadence anchor, rejection keeps the task in the open pool, reopening
//! makes the prior anchor stale.

use crate::error::{Error, Result};
use crate::task::{MaintenanceTask, ReviewState, TaskEvent, TaskEventType, TaskStatus};

/// Field action: report the work finished and hand the task to review.
pub fn submit_task(task: &MaintenanceTask, actor: &str) -> Result<TaskEvent> {
    if task.status != TaskStatus::Open {
        return Err(invalid(task, "submit"));
    }

    let mut event = TaskEvent::new(TaskEventType::TaskSubmitted, task.id.clone());
    event.actor = Some(actor.to_string());
    Ok(event)
}

/// Supervisor action: accept a submitted task. The task becomes complete
/// and anchors the next maintenance cycle.
pub fn approve_task(task: &MaintenanceTask, actor: &str) -> Result<TaskEvent> {
    if task.status != TaskStatus::Submitted {
        return Err(invalid(task, "approve"));
    }

    let mut event = TaskEvent::new(TaskEventType::TaskApproved, task.id.clone());
    event.actor = Some(actor.to_string());
    Ok(event)
}

/// Supervisor action: send a submitted task back with a note. The note is
/// mandatory; the task returns to the open pool.
pub fn reject_task(task: &MaintenanceTask, actor: &str, note: &str) -> Result<TaskEvent> {
    if task.status != TaskStatus::Submitted {
        return Err(invalid(task, "reject"));
    }

    let note = note.trim();
    if note.is_empty() {
        return Err(Error::NoteRequired(task.id.clone()));
    }

    let mut event = TaskEvent::new(TaskEventType::TaskRejected, task.id.clone());
    event.actor = Some(actor.to_string());
    event.note = Some(note.to_string());
    Ok(event)
}

/// Supervisor action: reopen a previously approved task. Completion is
/// cleared and the task returns to the open pool.
pub fn reopen_task(task: &MaintenanceTask, actor: &str) -> Result<TaskEvent> {
    if task.review_state != ReviewState::Approved {
        return Err(invalid(task, "reopen"));
    }

    let mut event = TaskEvent::new(TaskEventType::TaskReopened, task.id.clone());
    event.actor = Some(actor.to_string());
    Ok(event)
}

fn invalid(task: &MaintenanceTask, action: &str) -> Error {
    Error::InvalidTransition {
        task_id: task.id.clone(),
        action: action.to_string(),
        state: format!("{}/{}", task.status, task.review_state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Activity;
    use chrono::Utc;

    fn task(status: TaskStatus, review_state: ReviewState) -> MaintenanceTask {
        let now = Utc::now();
        MaintenanceTask {
            id: "mt-1".to_string(),
            tree_id: "tree-1".to_string(),
            activity: Activity::Watering,
            assignee: Some("amina".to_string()),
            status,
            review_state,
            due_date: None,
            instructions: None,
            rejection_note: None,
            created_at: now,
            created_by: None,
            submitted_at: None,
            completed_at: None,
            completed_by: None,
            updated_at: now,
        }
    }

    #[test]
    fn submit_requires_open() {
        assert!(submit_task(&task(TaskStatus::Open, ReviewState::None), "amina").is_ok());

        let err = submit_task(&task(TaskStatus::Submitted, ReviewState::Submitted), "amina")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(err.exit_code(), crate::error::exit_codes::REVIEW_BLOCKED);
    }

    #[test]
    fn approve_requires_submitted() {
        assert!(approve_task(&task(TaskStatus::Submitted, ReviewState::Submitted), "sup").is_ok());

        let err = approve_task(&task(TaskStatus::Open, ReviewState::None), "sup").unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn reject_requires_note() {
        let submitted = task(TaskStatus::Submitted, ReviewState::Submitted);

        let err = reject_task(&submitted, "sup", "   ").unwrap_err();
        assert!(matches!(err, Error::NoteRequired(_)));
        assert_eq!(err.exit_code(), crate::error::exit_codes::REVIEW_BLOCKED);

        let event = reject_task(&submitted, "sup", "mulch ring missing").unwrap();
        assert_eq!(event.note.as_deref(), Some("mulch ring missing"));
    }

    #[test]
    fn reopen_requires_approved() {
        assert!(reopen_task(&task(TaskStatus::Done, ReviewState::Approved), "sup").is_ok());

        let err = reopen_task(&task(TaskStatus::Done, ReviewState::Rejected), "sup").unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let err = reopen_task(&task(TaskStatus::Open, ReviewState::None), "sup").unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }
}
