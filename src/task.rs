//! Maintenance tasks for canopy.
//!
//! Tasks are stored as append-only events in `.canopy/tasks.jsonl` with a
//! materialized snapshot in `.canopy/tasks.snapshot.json`. The snapshot is
//! a cache; the log is the source of truth and the snapshot is rebuilt by
//! folding events in (timestamp, event_id) order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::Storage;

const TASKS_SCHEMA_VERSION: &str = "canopy.tasks.v1";
const ULID_TIME_LEN: usize = 10;
const ULID_RANDOM_LEN: usize = 16;

// =============================================================================
// Activity
// =============================================================================

/// Kind of maintenance work performed on a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Watering,
    Weeding,
    Protection,
    Inspection,
    Replacement,
}

/// All activities, in presentation order
pub const ACTIVITIES: [Activity; 5] = [
    Activity::Watering,
    Activity::Weeding,
    Activity::Protection,
    Activity::Inspection,
    Activity::Replacement,
];

impl Activity {
    /// Human label for tables and reports
    pub fn label(&self) -> &'static str {
        match self {
            Activity::Watering => "Watering",
            Activity::Weeding => "Weeding",
            Activity::Protection => "Protection",
            Activity::Inspection => "Inspection",
            Activity::Replacement => "Replacement",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Watering => write!(f, "watering"),
            Activity::Weeding => write!(f, "weeding"),
            Activity::Protection => write!(f, "protection"),
            Activity::Inspection => write!(f, "inspection"),
            Activity::Replacement => write!(f, "replacement"),
        }
    }
}

impl FromStr for Activity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "watering" | "water" => Ok(Activity::Watering),
            "weeding" | "weed" => Ok(Activity::Weeding),
            "protection" | "protect" => Ok(Activity::Protection),
            "inspection" | "inspect" => Ok(Activity::Inspection),
            "replacement" | "replace" => Ok(Activity::Replacement),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid activity '{}'. Expected: watering, weeding, protection, inspection, replacement",
                s
            ))),
        }
    }
}

// =============================================================================
// Task status and review state
// =============================================================================

/// Progress status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, work not yet reported
    Open,
    /// Field staff reported the work finished; awaiting review
    Submitted,
    /// Work finished (subject to the review state for completeness)
    #[serde(alias = "completed", alias = "closed")]
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Open => write!(f, "open"),
            TaskStatus::Submitted => write!(f, "submitted"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

/// Supervisor review state of a task
///
/// `None` covers both "never reviewed" and legacy tasks created before the
/// review workflow existed; the completeness predicate treats them alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    #[default]
    None,
    Submitted,
    Approved,
    Rejected,
}

impl ReviewState {
    pub fn is_none(&self) -> bool {
        matches!(self, ReviewState::None)
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewState::None => write!(f, "none"),
            ReviewState::Submitted => write!(f, "submitted"),
            ReviewState::Approved => write!(f, "approved"),
            ReviewState::Rejected => write!(f, "rejected"),
        }
    }
}

// =============================================================================
// Task events
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventType {
    TaskAssigned,
    TaskSubmitted,
    TaskApproved,
    TaskRejected,
    TaskReopened,
    TaskDueChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub event_id: String,
    pub task_id: String,
    #[serde(rename = "type")]
    pub event_type: TaskEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TaskEvent {
    pub fn new(event_type: TaskEventType, task_id: impl Into<String>) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            task_id: task_id.into(),
            event_type,
            timestamp: Utc::now(),
            actor: None,
            tree_id: None,
            activity: None,
            assignee: None,
            due_date: None,
            instructions: None,
            note: None,
        }
    }
}

// =============================================================================
// Task record
// =============================================================================

/// Materialized state of a single maintenance task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: String,
    pub tree_id: String,
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "ReviewState::is_none")]
    pub review_state: ReviewState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceTask {
    /// Whether the task counts as done for scheduling purposes.
    ///
    /// A task is complete iff its status is done AND its review state is
    /// either absent ("none") or approved. Done-but-still-under-review is
    /// deliberately NOT complete.
    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Done
            && matches!(self.review_state, ReviewState::None | ReviewState::Approved)
    }

    /// Calendar date anchoring this task for cadence arithmetic: the first
    /// defined of completion timestamp, assigned due date, creation
    /// timestamp.
    pub fn anchor_date(&self) -> NaiveDate {
        self.completed_at
            .map(|ts| ts.date_naive())
            .or(self.due_date)
            .unwrap_or_else(|| self.created_at.date_naive())
    }
}

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<MaintenanceTask>,
}

impl TaskSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: Vec::new(),
        }
    }
}

// =============================================================================
// Task store
// =============================================================================

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    config: TasksConfig,
}

impl TaskStore {
    pub fn new(storage: Storage, config: TasksConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Append an event to the log and refresh the materialized snapshot.
    pub fn append_event(&self, event: TaskEvent) -> Result<()> {
        let log_path = self.storage.tasks_log();
        let lock_path = log_path.with_extension("jsonl.lock");
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        self.storage.append_jsonl(&log_path, &event)?;

        let events: Vec<TaskEvent> = self.storage.read_jsonl(&log_path)?;
        let snapshot = build_snapshot(&events)?;
        self.storage
            .write_json(&self.storage.tasks_snapshot(), &snapshot)
    }

    /// Load the materialized snapshot, rebuilding it from the log when
    /// missing or unreadable.
    pub fn load_snapshot(&self) -> Result<TaskSnapshot> {
        let snapshot_path = self.storage.tasks_snapshot();
        if snapshot_path.exists() {
            if let Ok(snapshot) = self.storage.read_json::<TaskSnapshot>(&snapshot_path) {
                return Ok(snapshot);
            }
        }
        let events: Vec<TaskEvent> = self.storage.read_jsonl(&self.storage.tasks_log())?;
        build_snapshot(&events)
    }

    /// All tasks, most recently updated first
    pub fn list(&self) -> Result<Vec<MaintenanceTask>> {
        Ok(self.load_snapshot()?.tasks)
    }

    /// Fetch a single task by exact id
    pub fn get(&self, task_id: &str) -> Result<MaintenanceTask> {
        self.load_snapshot()?
            .tasks
            .into_iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    /// Generate a short unique task id: `<prefix>-<ulid random suffix>`.
    ///
    /// The suffix starts at the configured minimum length and grows only
    /// when the shorter space keeps colliding.
    pub fn generate_task_id(&self) -> Result<String> {
        let prefix = self.config.id_prefix.trim();
        let snapshot = self.load_snapshot()?;
        let existing: HashSet<String> = snapshot
            .tasks
            .iter()
            .map(|task| suffix_of(&task.id).to_lowercase())
            .collect();

        let mut len = self.config.id_min_len.clamp(1, ULID_RANDOM_LEN);
        loop {
            for _ in 0..8 {
                let base = Ulid::new().to_string().to_lowercase();
                let candidate = &base[ULID_TIME_LEN..ULID_TIME_LEN + len];
                if !existing.contains(candidate) {
                    return Ok(format!("{}-{}", prefix, candidate));
                }
            }
            if len < ULID_RANDOM_LEN {
                len += 1;
            }
        }
    }

    /// Resolve a full or partial task id to the unique matching task.
    ///
    /// Accepts the full id, the bare suffix, or any unambiguous suffix
    /// prefix.
    pub fn resolve_task_id(&self, input: &str) -> Result<String> {
        let trimmed = input.trim().to_lowercase();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        let candidate = suffix_of(&trimmed).to_string();

        let snapshot = self.load_snapshot()?;
        let mut exact: Vec<String> = Vec::new();
        let mut matches: Vec<String> = Vec::new();

        for task in snapshot.tasks {
            let id_norm = task.id.to_lowercase();
            let suffix = suffix_of(&id_norm);
            if id_norm == trimmed || suffix == trimmed {
                exact.push(task.id.clone());
                continue;
            }
            if suffix.starts_with(&candidate) {
                matches.push(task.id.clone());
            }
        }

        if exact.len() == 1 {
            return Ok(exact.remove(0));
        }
        if exact.len() > 1 {
            return Err(Error::InvalidArgument(format!(
                "ambiguous task id '{}': {}",
                input.trim(),
                exact.join(", ")
            )));
        }

        matches.sort();
        matches.dedup();
        if matches.is_empty() {
            return Err(Error::TaskNotFound(input.trim().to_string()));
        }
        if matches.len() > 1 {
            return Err(Error::InvalidArgument(format!(
                "ambiguous task id '{}': {}",
                input.trim(),
                matches.join(", ")
            )));
        }
        Ok(matches.remove(0))
    }
}

fn suffix_of(id: &str) -> &str {
    match id.split_once('-') {
        Some((_, suffix)) => suffix,
        None => id,
    }
}

// =============================================================================
// Event folding
// =============================================================================

pub fn sort_events(events: &mut [TaskEvent]) {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
}

/// Fold an event stream into a snapshot, most recently updated task first.
pub fn build_snapshot(events: &[TaskEvent]) -> Result<TaskSnapshot> {
    let mut map: HashMap<String, MaintenanceTask> = HashMap::new();
    let mut sorted = events.to_vec();
    sort_events(&mut sorted);
    for event in &sorted {
        apply_event(&mut map, event)?;
    }

    let mut tasks: Vec<MaintenanceTask> = map.into_values().collect();
    tasks.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(TaskSnapshot {
        schema_version: TASKS_SCHEMA_VERSION.to_string(),
        generated_at: Utc::now(),
        tasks,
    })
}

pub fn apply_event(map: &mut HashMap<String, MaintenanceTask>, event: &TaskEvent) -> Result<()> {
    match event.event_type {
        TaskEventType::TaskAssigned => {
            if map.contains_key(&event.task_id) {
                return Err(Error::InvalidArgument(format!(
                    "task already exists: {}",
                    event.task_id
                )));
            }

            let tree_id = event.tree_id.clone().ok_or_else(|| {
                Error::InvalidArgument(format!("missing tree id for {}", event.task_id))
            })?;
            let activity = event.activity.ok_or_else(|| {
                Error::InvalidArgument(format!("missing activity for {}", event.task_id))
            })?;

            let now = event.timestamp;
            map.insert(
                event.task_id.clone(),
                MaintenanceTask {
                    id: event.task_id.clone(),
                    tree_id,
                    activity,
                    assignee: event.assignee.clone(),
                    status: TaskStatus::Open,
                    review_state: ReviewState::None,
                    due_date: event.due_date,
                    instructions: event.instructions.clone(),
                    rejection_note: None,
                    created_at: now,
                    created_by: event.actor.clone(),
                    submitted_at: None,
                    completed_at: None,
                    completed_by: None,
                    updated_at: now,
                },
            );
        }
        TaskEventType::TaskSubmitted => {
            let task = get_task_mut(map, &event.task_id)?;
            task.status = TaskStatus::Submitted;
            task.review_state = ReviewState::Submitted;
            task.submitted_at = Some(event.timestamp);
            task.updated_at = event.timestamp;
        }
        TaskEventType::TaskApproved => {
            let task = get_task_mut(map, &event.task_id)?;
            task.status = TaskStatus::Done;
            task.review_state = ReviewState::Approved;
            task.completed_at = Some(event.timestamp);
            task.completed_by = event.actor.clone();
            task.updated_at = event.timestamp;
        }
        TaskEventType::TaskRejected => {
            let task = get_task_mut(map, &event.task_id)?;
            task.status = TaskStatus::Open;
            task.review_state = ReviewState::Rejected;
            task.rejection_note = event.note.clone();
            task.completed_at = None;
            task.completed_by = None;
            task.updated_at = event.timestamp;
        }
        TaskEventType::TaskReopened => {
            let task = get_task_mut(map, &event.task_id)?;
            task.status = TaskStatus::Open;
            task.review_state = ReviewState::None;
            task.submitted_at = None;
            task.completed_at = None;
            task.completed_by = None;
            task.updated_at = event.timestamp;
        }
        TaskEventType::TaskDueChanged => {
            let task = get_task_mut(map, &event.task_id)?;
            task.due_date = event.due_date;
            task.updated_at = event.timestamp;
        }
    }

    Ok(())
}

fn get_task_mut<'a>(
    map: &'a mut HashMap<String, MaintenanceTask>,
    task_id: &str,
) -> Result<&'a mut MaintenanceTask> {
    map.get_mut(task_id)
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
}
