//! Maintenance schedule engine.
//!
//! For every (tree, activity) pair this module derives when the next
//! maintenance action is due, whether it is overdue, why, and what severity
//! to surface to a supervisor. The computation is a pure function of an
//! input snapshot: it performs no I/O, never samples the clock (the caller
//! supplies `today` once per invocation), and never mutates its inputs, so
//! any collaborator that needs schedule rows calls this one implementation
//! with a fresh snapshot.
//!
//! Row derivation, in priority order:
//! 1. Condition overrides: a tree that needs replacement pauses all routine
//!    activities and makes replacement due today; a tree that does not need
//!    replacement never gets a routine replacement cycle; a mature tree
//!    closes every routine activity.
//! 2. Urgent inspection findings (`need_watering`, `need_protection`) force
//!    the matching activity due today.
//! 3. Otherwise the seasonal interval table anchors the next cycle on the
//!    latest completed task, or on the lifecycle start for the first cycle.
//!
//! Every blocked pair still yields a row with a human-readable rationale;
//! missing data widens which branch is taken instead of failing.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::lifecycle::{is_mature, lifecycle_state, LifecycleState};
use crate::season::{intervals, Season};
use crate::storage::SpeciesMaturityMap;
use crate::task::{Activity, MaintenanceTask, ACTIVITIES};
use crate::tree::{Tree, TreeStatus};

/// Assigned tasks this close to their due date get flagged for attention
const ASSIGNED_ATTENTION_DAYS: i64 = 3;

/// Unassigned cycles due within this window count as "due soon"
const DUE_SOON_DAYS: i64 = 7;

// =============================================================================
// Tone
// =============================================================================

/// Severity classification of a schedule row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Danger,
    Warning,
    Info,
    Ok,
}

impl Tone {
    /// Sort rank: danger < warning < info < ok
    pub fn rank(&self) -> u8 {
        match self {
            Tone::Danger => 0,
            Tone::Warning => 1,
            Tone::Info => 2,
            Tone::Ok => 3,
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Danger => write!(f, "danger"),
            Tone::Warning => write!(f, "warning"),
            Tone::Info => write!(f, "info"),
            Tone::Ok => write!(f, "ok"),
        }
    }
}

// =============================================================================
// Input snapshot and output rows
// =============================================================================

/// Immutable input to one engine invocation.
///
/// Any mutation of trees or tasks (status updates, review actions) must
/// produce a new snapshot and a full recompute; rows are never patched
/// incrementally.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub trees: Vec<Tree>,
    pub tasks: Vec<MaintenanceTask>,
    pub maturity: SpeciesMaturityMap,
    pub season: Season,
    pub today: NaiveDate,
}

/// One schedule row per (tree, activity)
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRow {
    pub tree_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub activity: Activity,
    pub activity_label: &'static str,
    pub tree_age_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_done_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_days: Option<i64>,
    /// Routine scheduling is paused or closed for this pair
    pub blocked: bool,
    pub tone: Tone,
    pub indicator_text: String,
    pub status_text: String,
    pub done_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_task_id: Option<String>,
    pub rationale_text: String,
}

/// Aggregate counts over a computed row set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub total: usize,
    pub danger: usize,
    pub warning: usize,
    pub info: usize,
    pub ok: usize,
    /// Rows with an effective due date within the next week
    pub due_within_week: usize,
}

/// Full engine output for one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub as_of: NaiveDate,
    pub season: Season,
    pub rows: Vec<ScheduleRow>,
    pub summary: ScheduleSummary,
}

// =============================================================================
// Task ledger per (tree, activity)
// =============================================================================

/// Per-pair digest of the task history
#[derive(Debug, Default)]
struct Ledger<'a> {
    done_count: usize,
    pending_count: usize,
    overdue_count: usize,
    /// Completed task with the latest anchor date
    latest_done: Option<&'a MaintenanceTask>,
    /// Open task with the earliest due date (tasks without one sort last)
    earliest_open: Option<&'a MaintenanceTask>,
}

impl<'a> Ledger<'a> {
    fn digest(tasks: &[&'a MaintenanceTask], today: NaiveDate) -> Self {
        let mut ledger = Ledger::default();

        for &task in tasks {
            if task.is_complete() {
                ledger.done_count += 1;
                let newer = match ledger.latest_done {
                    Some(current) => {
                        (task.anchor_date(), task.created_at, task.id.as_str())
                            > (current.anchor_date(), current.created_at, current.id.as_str())
                    }
                    None => true,
                };
                if newer {
                    ledger.latest_done = Some(task);
                }
            } else {
                ledger.pending_count += 1;
                if task.due_date.is_some_and(|due| due < today) {
                    ledger.overdue_count += 1;
                }
                let earlier = match ledger.earliest_open {
                    Some(current) => open_order(task, current) == Ordering::Less,
                    None => true,
                };
                if earlier {
                    ledger.earliest_open = Some(task);
                }
            }
        }

        ledger
    }

    fn assigned_due(&self) -> Option<NaiveDate> {
        self.earliest_open.and_then(|task| task.due_date)
    }

    fn has_open(&self) -> bool {
        self.pending_count > 0
    }
}

fn open_order(a: &MaintenanceTask, b: &MaintenanceTask) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.created_at.cmp(&b.created_at))
    .then_with(|| a.id.cmp(&b.id))
}

// =============================================================================
// Engine
// =============================================================================

/// Compute the full schedule row set for a snapshot.
pub fn compute(snapshot: &Snapshot) -> ScheduleReport {
    let today = snapshot.today;

    let mut by_pair: HashMap<(&str, Activity), Vec<&MaintenanceTask>> = HashMap::new();
    for task in &snapshot.tasks {
        by_pair
            .entry((task.tree_id.as_str(), task.activity))
            .or_default()
            .push(task);
    }

    let mut rows = Vec::with_capacity(snapshot.trees.len() * ACTIVITIES.len());
    for tree in &snapshot.trees {
        let lifecycle = lifecycle_state(tree, &snapshot.tasks, today);
        let mature = is_mature(tree, lifecycle.age_days, &snapshot.maturity);

        for activity in ACTIVITIES {
            let pair_tasks = by_pair
                .get(&(tree.id.as_str(), activity))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let ledger = Ledger::digest(pair_tasks, today);
            rows.push(compute_row(
                tree,
                activity,
                &ledger,
                lifecycle,
                mature,
                snapshot.season,
                today,
            ));
        }
    }

    sort_rows(&mut rows);
    let summary = summarize(&rows);

    ScheduleReport {
        as_of: today,
        season: snapshot.season,
        rows,
        summary,
    }
}

/// Sort rows by tone rank, then ascending countdown (undefined last), then
/// tree id, then activity label. The order is total and deterministic, so
/// re-sorting an already sorted row set is a no-op.
pub fn sort_rows(rows: &mut [ScheduleRow]) {
    rows.sort_by(|a, b| {
        a.tone
            .rank()
            .cmp(&b.tone.rank())
            .then_with(|| cmp_countdown(a.countdown_days, b.countdown_days))
            .then_with(|| a.tree_id.cmp(&b.tree_id))
            .then_with(|| a.activity_label.cmp(b.activity_label))
    });
}

fn cmp_countdown(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Aggregate tone counts and the due-soon window over a row set.
pub fn summarize(rows: &[ScheduleRow]) -> ScheduleSummary {
    let mut summary = ScheduleSummary {
        total: rows.len(),
        ..ScheduleSummary::default()
    };
    for row in rows {
        match row.tone {
            Tone::Danger => summary.danger += 1,
            Tone::Warning => summary.warning += 1,
            Tone::Info => summary.info += 1,
            Tone::Ok => summary.ok += 1,
        }
        if row
            .countdown_days
            .is_some_and(|days| (0..=DUE_SOON_DAYS).contains(&days))
        {
            summary.due_within_week += 1;
        }
    }
    summary
}

// =============================================================================
// Row derivation
// =============================================================================

fn compute_row(
    tree: &Tree,
    activity: Activity,
    ledger: &Ledger<'_>,
    lifecycle: LifecycleState,
    mature: bool,
    season: Season,
    today: NaiveDate,
) -> ScheduleRow {
    let needs_replacement = tree.status.needs_replacement();

    // Condition override: replacement pending pauses every routine activity.
    if needs_replacement && activity != Activity::Replacement {
        return finish_row(
            tree,
            activity,
            ledger,
            lifecycle,
            RowOutcome {
                model_due: None,
                blocked: true,
                tone: Tone::Danger,
                indicator: "Paused - replacement required".to_string(),
                rationale: format!(
                    "Routine {} is paused: tree status is {} and the tree must be replaced first.",
                    activity, tree.status
                ),
            },
            today,
        );
    }

    // Condition override: replacement itself becomes due today.
    if needs_replacement && activity == Activity::Replacement {
        let model_due = Some(today);
        let assigned_due = ledger.assigned_due();
        let countdown = effective_due(model_due, assigned_due).map(|due| (due - today).num_days());

        let (tone, indicator) = if !ledger.has_open() {
            (Tone::Danger, "Replacement required immediately".to_string())
        } else if countdown.is_some_and(|days| days < 0) {
            (
                Tone::Danger,
                format!("Replacement overdue by {} days", -countdown.unwrap_or(0)),
            )
        } else {
            (Tone::Warning, "Replacement task assigned".to_string())
        };

        return finish_row(
            tree,
            activity,
            ledger,
            lifecycle,
            RowOutcome {
                model_due,
                blocked: false,
                tone,
                indicator,
                rationale: format!(
                    "Tree status is {}; a replacement cycle overrides the routine schedule.",
                    tree.status
                ),
            },
            today,
        );
    }

    // Replacement is condition-triggered only, never routine.
    if activity == Activity::Replacement {
        let (tone, indicator) = classify_unscheduled(ledger, lifecycle, None, today);
        let indicator = if matches!(tone, Tone::Ok) {
            "Replacement not applicable".to_string()
        } else {
            indicator
        };
        return finish_row(
            tree,
            activity,
            ledger,
            lifecycle,
            RowOutcome {
                model_due: None,
                blocked: true,
                tone,
                indicator,
                rationale: format!(
                    "Replacement is condition-triggered only; tree status {} does not call for it.",
                    tree.status
                ),
            },
            today,
        );
    }

    // Maturity gate: routine schedule closed for a self-sustaining tree.
    if mature {
        let (tone, indicator) = if ledger.pending_count == 0 {
            (Tone::Ok, "Lifecycle complete".to_string())
        } else {
            (
                Tone::Warning,
                "Lifecycle complete - close pending tasks".to_string(),
            )
        };
        return finish_row(
            tree,
            activity,
            ledger,
            lifecycle,
            RowOutcome {
                model_due: None,
                blocked: true,
                tone,
                indicator,
                rationale: "Tree has reached self-sustaining maturity; routine maintenance is closed."
                    .to_string(),
            },
            today,
        );
    }

    // Urgent inspection findings override the interval arithmetic.
    let urgent = matches!(
        (tree.status, activity),
        (TreeStatus::NeedWatering, Activity::Watering)
            | (TreeStatus::NeedProtection, Activity::Protection)
    );

    let model_due = if urgent {
        Some(today)
    } else {
        let cadence = intervals(activity, lifecycle.age_days, season);
        match ledger.latest_done {
            Some(done) => Some(done.anchor_date() + chrono::Duration::days(cadence.repeat_days)),
            None => lifecycle
                .start_date
                .map(|start| start + chrono::Duration::days(cadence.first_days)),
        }
    };

    let (tone, indicator) = if urgent {
        let what = match activity {
            Activity::Watering => "watering",
            _ => "protection",
        };
        if ledger.has_open() {
            (Tone::Warning, format!("Urgent {} - task assigned", what))
        } else {
            (Tone::Danger, format!("Urgent {} needed", what))
        }
    } else {
        classify_unscheduled(ledger, lifecycle, model_due, today)
    };

    let rationale = if urgent {
        format!(
            "Inspection flagged the tree as {}; {} is due today regardless of cadence.",
            tree.status, activity
        )
    } else {
        match (ledger.latest_done, lifecycle.start_date) {
            (Some(done), _) => format!(
                "Next {} cycle runs {} days after the last completed one on {}.",
                activity,
                intervals(activity, lifecycle.age_days, season).repeat_days,
                done.anchor_date()
            ),
            (None, Some(start)) => format!(
                "First {} cycle runs {} days after the lifecycle start on {}.",
                activity,
                intervals(activity, lifecycle.age_days, season).first_days,
                start
            ),
            (None, None) => {
                "No planting date or completed replacement on record; no cadence can be computed."
                    .to_string()
            }
        }
    };

    finish_row(
        tree,
        activity,
        ledger,
        lifecycle,
        RowOutcome {
            model_due,
            blocked: false,
            tone,
            indicator,
            rationale,
        },
        today,
    )
}

/// Tone rules 4-9: the generic tail shared by every non-override path.
fn classify_unscheduled(
    ledger: &Ledger<'_>,
    lifecycle: LifecycleState,
    model_due: Option<NaiveDate>,
    today: NaiveDate,
) -> (Tone, String) {
    let assigned_due = ledger.assigned_due();
    let countdown = effective_due(model_due, assigned_due).map(|due| (due - today).num_days());

    if lifecycle.start_date.is_none() && !ledger.has_open() {
        return (Tone::Info, "Lifecycle start date missing".to_string());
    }

    if ledger.has_open() {
        return match countdown {
            Some(days) if days < 0 => (
                Tone::Danger,
                format!("Overdue by {} days - task assigned", -days),
            ),
            Some(0) => (Tone::Warning, "Due today - task assigned".to_string()),
            Some(days) if days <= ASSIGNED_ATTENTION_DAYS => {
                (Tone::Warning, format!("Due in {} days - task assigned", days))
            }
            Some(_) => (Tone::Warning, "Assigned and in progress".to_string()),
            None => (Tone::Warning, "Assigned, no due date".to_string()),
        };
    }

    match countdown {
        Some(days) if days < 0 => (Tone::Danger, format!("Not done, overdue by {} days", -days)),
        Some(0) => (Tone::Warning, "Due today".to_string()),
        Some(days) if days <= DUE_SOON_DAYS => (Tone::Warning, format!("Due in {} days", days)),
        _ if ledger.done_count > 0 => (
            Tone::Ok,
            "Cycle completed, waiting for next cycle".to_string(),
        ),
        _ => (Tone::Ok, "On schedule".to_string()),
    }
}

struct RowOutcome {
    model_due: Option<NaiveDate>,
    blocked: bool,
    tone: Tone,
    indicator: String,
    rationale: String,
}

fn finish_row(
    tree: &Tree,
    activity: Activity,
    ledger: &Ledger<'_>,
    lifecycle: LifecycleState,
    outcome: RowOutcome,
    today: NaiveDate,
) -> ScheduleRow {
    let assigned_due = ledger.assigned_due();
    let effective = if outcome.blocked {
        None
    } else {
        effective_due(outcome.model_due, assigned_due)
    };
    let countdown = effective.map(|due| (due - today).num_days());

    let assignee = ledger
        .earliest_open
        .and_then(|task| task.assignee.clone())
        .or_else(|| ledger.latest_done.and_then(|task| task.assignee.clone()));

    let status_text = if ledger.overdue_count > 0 {
        format!(
            "{} done, {} open ({} overdue)",
            ledger.done_count, ledger.pending_count, ledger.overdue_count
        )
    } else {
        format!("{} done, {} open", ledger.done_count, ledger.pending_count)
    };

    ScheduleRow {
        tree_id: tree.id.clone(),
        assignee,
        activity,
        activity_label: activity.label(),
        tree_age_days: lifecycle.age_days,
        last_done_at: ledger.latest_done.map(|task| task.anchor_date()),
        model_due_date: outcome.model_due,
        assigned_due_date: assigned_due,
        effective_due_date: effective,
        countdown_days: countdown,
        blocked: outcome.blocked,
        tone: outcome.tone,
        indicator_text: outcome.indicator,
        status_text,
        done_count: ledger.done_count,
        pending_count: ledger.pending_count,
        overdue_count: ledger.overdue_count,
        open_task_id: ledger.earliest_open.map(|task| task.id.clone()),
        rationale_text: outcome.rationale,
    }
}

/// Earlier of the model and assigned due dates; whichever is defined when
/// only one is.
fn effective_due(model: Option<NaiveDate>, assigned: Option<NaiveDate>) -> Option<NaiveDate> {
    match (model, assigned) {
        (Some(m), Some(a)) => Some(m.min(a)),
        (Some(m), None) => Some(m),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ReviewState, TaskStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tree(id: &str, status: TreeStatus, planted: Option<NaiveDate>) -> Tree {
        let mut tree = Tree::new(Some("acacia".to_string()), planted);
        tree.id = id.to_string();
        tree.status = status;
        tree
    }

    fn task(
        id: &str,
        tree_id: &str,
        activity: Activity,
        status: TaskStatus,
        review_state: ReviewState,
        due: Option<NaiveDate>,
        completed_on: Option<NaiveDate>,
    ) -> MaintenanceTask {
        let created_at = date(2024, 1, 1).and_hms_opt(8, 0, 0).unwrap().and_utc();
        MaintenanceTask {
            id: id.to_string(),
            tree_id: tree_id.to_string(),
            activity,
            assignee: Some("amina".to_string()),
            status,
            review_state,
            due_date: due,
            instructions: None,
            rejection_note: None,
            created_at,
            created_by: None,
            submitted_at: None,
            completed_at: completed_on.map(|d| d.and_hms_opt(15, 0, 0).unwrap().and_utc()),
            completed_by: None,
            updated_at: created_at,
        }
    }

    fn snapshot(trees: Vec<Tree>, tasks: Vec<MaintenanceTask>, today: NaiveDate) -> Snapshot {
        Snapshot {
            trees,
            tasks,
            maturity: SpeciesMaturityMap::new(),
            season: Season::Rainy,
            today,
        }
    }

    fn row<'a>(report: &'a ScheduleReport, tree_id: &str, activity: Activity) -> &'a ScheduleRow {
        report
            .rows
            .iter()
            .find(|row| row.tree_id == tree_id && row.activity == activity)
            .expect("row")
    }

    #[test]
    fn every_pair_gets_exactly_one_row_and_tone() {
        let trees = vec![
            tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1))),
            tree("b", TreeStatus::Dead, None),
        ];
        let report = compute(&snapshot(trees, Vec::new(), date(2024, 6, 1)));

        assert_eq!(report.rows.len(), 2 * ACTIVITIES.len());
        assert_eq!(report.summary.total, report.rows.len());
        assert_eq!(
            report.summary.danger
                + report.summary.warning
                + report.summary.info
                + report.summary.ok,
            report.rows.len()
        );
    }

    #[test]
    fn dead_tree_blocks_routine_watering() {
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Dead, Some(date(2024, 1, 1)))],
            Vec::new(),
            date(2024, 6, 1),
        ));

        let watering = row(&report, "a", Activity::Watering);
        assert!(watering.blocked);
        assert_eq!(watering.tone, Tone::Danger);
        assert!(watering.rationale_text.contains("replaced"));
        assert!(watering.model_due_date.is_none());
    }

    #[test]
    fn dead_tree_replacement_due_today() {
        let today = date(2024, 6, 1);
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Dead, Some(date(2024, 1, 1)))],
            Vec::new(),
            today,
        ));

        let replacement = row(&report, "a", Activity::Replacement);
        assert!(!replacement.blocked);
        assert_eq!(replacement.model_due_date, Some(today));
        assert_eq!(replacement.tone, Tone::Danger);
        assert_eq!(replacement.indicator_text, "Replacement required immediately");
        assert_eq!(replacement.countdown_days, Some(0));
    }

    #[test]
    fn assigned_replacement_softens_to_warning() {
        let today = date(2024, 6, 1);
        let open = task(
            "mt-1",
            "a",
            Activity::Replacement,
            TaskStatus::Open,
            ReviewState::None,
            Some(date(2024, 6, 3)),
            None,
        );
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::NeedReplacement, Some(date(2024, 1, 1)))],
            vec![open],
            today,
        ));

        let replacement = row(&report, "a", Activity::Replacement);
        assert_eq!(replacement.tone, Tone::Warning);
        assert_eq!(replacement.open_task_id.as_deref(), Some("mt-1"));

        // An overdue assigned replacement stays danger.
        let overdue = task(
            "mt-2",
            "b",
            Activity::Replacement,
            TaskStatus::Open,
            ReviewState::None,
            Some(date(2024, 5, 20)),
            None,
        );
        let report = compute(&snapshot(
            vec![tree("b", TreeStatus::Dead, Some(date(2024, 1, 1)))],
            vec![overdue],
            today,
        ));
        let replacement = row(&report, "b", Activity::Replacement);
        assert_eq!(replacement.tone, Tone::Danger);
        assert!(replacement.countdown_days.unwrap() < 0);
    }

    #[test]
    fn healthy_tree_replacement_is_blocked() {
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            Vec::new(),
            date(2024, 6, 1),
        ));

        let replacement = row(&report, "a", Activity::Replacement);
        assert!(replacement.blocked);
        assert_eq!(replacement.tone, Tone::Ok);
        assert_eq!(replacement.indicator_text, "Replacement not applicable");
        assert!(replacement.model_due_date.is_none());
    }

    #[test]
    fn mature_tree_closes_routine_schedule() {
        let mut maturity = SpeciesMaturityMap::new();
        maturity.insert("acacia".to_string(), 3);

        // Planted 1200 days before "today", pegged at 3 years.
        let today = date(2024, 6, 1);
        let planted = today - chrono::Duration::days(1200);
        let mut snap = snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(planted))],
            Vec::new(),
            today,
        );
        snap.maturity = maturity;
        let report = compute(&snap);

        for activity in [
            Activity::Watering,
            Activity::Weeding,
            Activity::Protection,
            Activity::Inspection,
        ] {
            let r = row(&report, "a", activity);
            assert!(r.blocked, "{activity} should be closed");
            assert_eq!(r.tone, Tone::Ok);
            assert_eq!(r.indicator_text, "Lifecycle complete");
        }

        // Replacement stays condition-gated, not maturity-gated.
        let replacement = row(&report, "a", Activity::Replacement);
        assert_eq!(replacement.indicator_text, "Replacement not applicable");
    }

    #[test]
    fn mature_tree_with_pending_tasks_warns() {
        let mut maturity = SpeciesMaturityMap::new();
        maturity.insert("acacia".to_string(), 1);

        let today = date(2024, 6, 1);
        let planted = today - chrono::Duration::days(400);
        let open = task(
            "mt-1",
            "a",
            Activity::Watering,
            TaskStatus::Open,
            ReviewState::None,
            None,
            None,
        );
        let mut snap = snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(planted))],
            vec![open],
            today,
        );
        snap.maturity = maturity;
        let report = compute(&snap);

        let watering = row(&report, "a", Activity::Watering);
        assert_eq!(watering.tone, Tone::Warning);
        assert_eq!(watering.indicator_text, "Lifecycle complete - close pending tasks");
    }

    #[test]
    fn missing_lifecycle_start_is_informational() {
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, None)],
            Vec::new(),
            date(2024, 6, 1),
        ));

        let watering = row(&report, "a", Activity::Watering);
        assert_eq!(watering.tone, Tone::Info);
        assert_eq!(watering.indicator_text, "Lifecycle start date missing");
        assert!(watering.model_due_date.is_none());
        assert!(watering.countdown_days.is_none());
    }

    #[test]
    fn first_inspection_cycle_from_lifecycle_start() {
        // Rainy season, age 200 days, no completed task: first = 14 days
        // after the 2024-01-01 start; the age>=180 repeat band is irrelevant
        // before the first cycle.
        let today = date(2024, 7, 19); // 200 days after 2024-01-01
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            Vec::new(),
            today,
        ));

        let inspection = row(&report, "a", Activity::Inspection);
        assert_eq!(inspection.tree_age_days, 200);
        assert_eq!(inspection.model_due_date, Some(date(2024, 1, 15)));
        assert_eq!(inspection.tone, Tone::Danger); // long overdue, no task
        assert!(inspection.indicator_text.contains("overdue"));
    }

    #[test]
    fn completed_cycle_anchors_next_one() {
        let today = date(2024, 6, 1);
        let done = task(
            "mt-1",
            "a",
            Activity::Watering,
            TaskStatus::Done,
            ReviewState::Approved,
            None,
            Some(date(2024, 5, 25)),
        );
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            vec![done],
            today,
        ));

        let watering = row(&report, "a", Activity::Watering);
        // Age 152 days >= 90, rainy: repeat 21 days after 2024-05-25.
        assert_eq!(watering.model_due_date, Some(date(2024, 6, 15)));
        assert_eq!(watering.last_done_at, Some(date(2024, 5, 25)));
        assert_eq!(watering.done_count, 1);
        assert_eq!(watering.tone, Tone::Ok);
        assert_eq!(watering.indicator_text, "Cycle completed, waiting for next cycle");
    }

    #[test]
    fn rejected_task_does_not_anchor_cadence() {
        // Approved task dated day 10 and rejected task dated day 5: the
        // anchor is day 10 and the rejected task stays in the open pool.
        let today = date(2024, 6, 1);
        let approved = task(
            "mt-1",
            "a",
            Activity::Weeding,
            TaskStatus::Done,
            ReviewState::Approved,
            None,
            Some(date(2024, 5, 10)),
        );
        let rejected = task(
            "mt-2",
            "a",
            Activity::Weeding,
            TaskStatus::Open,
            ReviewState::Rejected,
            Some(date(2024, 5, 5)),
            None,
        );
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            vec![approved, rejected],
            today,
        ));

        let weeding = row(&report, "a", Activity::Weeding);
        assert_eq!(weeding.last_done_at, Some(date(2024, 5, 10)));
        assert_eq!(weeding.done_count, 1);
        assert_eq!(weeding.pending_count, 1);
        assert_eq!(weeding.open_task_id.as_deref(), Some("mt-2"));
        // The rejected task's past due date makes the pair overdue-assigned.
        assert_eq!(weeding.tone, Tone::Danger);
        assert_eq!(weeding.overdue_count, 1);
    }

    #[test]
    fn urgent_watering_overrides_cadence() {
        let today = date(2024, 6, 1);
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::NeedWatering, Some(date(2024, 1, 1)))],
            Vec::new(),
            today,
        ));

        let watering = row(&report, "a", Activity::Watering);
        assert_eq!(watering.model_due_date, Some(today));
        assert_eq!(watering.tone, Tone::Danger);
        assert!(watering.indicator_text.contains("Urgent"));

        // With a task already assigned the urgency softens to warning.
        let open = task(
            "mt-1",
            "a",
            Activity::Watering,
            TaskStatus::Open,
            ReviewState::None,
            Some(today),
            None,
        );
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::NeedWatering, Some(date(2024, 1, 1)))],
            vec![open],
            today,
        ));
        let watering = row(&report, "a", Activity::Watering);
        assert_eq!(watering.tone, Tone::Warning);

        // need_protection only fast-tracks protection, not watering.
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::NeedProtection, Some(date(2024, 1, 1)))],
            Vec::new(),
            today,
        ));
        let protection = row(&report, "a", Activity::Protection);
        assert_eq!(protection.model_due_date, Some(today));
    }

    #[test]
    fn effective_due_takes_the_earlier_date() {
        let today = date(2024, 6, 1);
        // Completed watering anchors the model due at 2024-06-15; an open
        // task assigned for 2024-06-05 pulls the effective due earlier.
        let done = task(
            "mt-1",
            "a",
            Activity::Watering,
            TaskStatus::Done,
            ReviewState::Approved,
            None,
            Some(date(2024, 5, 25)),
        );
        let open = task(
            "mt-2",
            "a",
            Activity::Watering,
            TaskStatus::Open,
            ReviewState::None,
            Some(date(2024, 6, 5)),
            None,
        );
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            vec![done, open],
            today,
        ));

        let watering = row(&report, "a", Activity::Watering);
        assert_eq!(watering.model_due_date, Some(date(2024, 6, 15)));
        assert_eq!(watering.assigned_due_date, Some(date(2024, 6, 5)));
        assert_eq!(watering.effective_due_date, Some(date(2024, 6, 5)));
        assert_eq!(watering.countdown_days, Some(4));
        assert_eq!(watering.tone, Tone::Warning);
        assert_eq!(watering.indicator_text, "Assigned and in progress");
    }

    #[test]
    fn due_soon_without_task_warns() {
        let today = date(2024, 6, 1);
        let done = task(
            "mt-1",
            "a",
            Activity::Protection,
            TaskStatus::Done,
            ReviewState::Approved,
            None,
            Some(date(2024, 4, 20)),
        );
        // Rainy protection repeat 45 days: due 2024-06-04, 3 days out.
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            vec![done],
            today,
        ));

        let protection = row(&report, "a", Activity::Protection);
        assert_eq!(protection.model_due_date, Some(date(2024, 6, 4)));
        assert_eq!(protection.tone, Tone::Warning);
        assert_eq!(protection.indicator_text, "Due in 3 days");
    }

    #[test]
    fn sort_is_idempotent_and_ranks_tones() {
        let trees = vec![
            tree("c", TreeStatus::Healthy, Some(date(2024, 1, 1))),
            tree("a", TreeStatus::Dead, Some(date(2024, 1, 1))),
            tree("b", TreeStatus::Healthy, None),
        ];
        let report = compute(&snapshot(trees, Vec::new(), date(2024, 6, 1)));

        let mut resorted = report.rows.clone();
        sort_rows(&mut resorted);
        for (left, right) in report.rows.iter().zip(resorted.iter()) {
            assert_eq!(left.tree_id, right.tree_id);
            assert_eq!(left.activity, right.activity);
        }

        // Tone ranks are non-decreasing down the list.
        let ranks: Vec<u8> = report.rows.iter().map(|row| row.tone.rank()).collect();
        let mut sorted_ranks = ranks.clone();
        sorted_ranks.sort();
        assert_eq!(ranks, sorted_ranks);
    }

    #[test]
    fn engine_is_deterministic_for_a_snapshot() {
        let snap = snapshot(
            vec![
                tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1))),
                tree("b", TreeStatus::NeedWatering, Some(date(2023, 3, 15))),
            ],
            vec![task(
                "mt-1",
                "a",
                Activity::Weeding,
                TaskStatus::Done,
                ReviewState::Approved,
                None,
                Some(date(2024, 4, 1)),
            )],
            date(2024, 6, 1),
        );

        let first = compute(&snap);
        let second = compute(&snap);
        assert_eq!(
            serde_json::to_string(&first.rows).unwrap(),
            serde_json::to_string(&second.rows).unwrap()
        );
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn summary_counts_due_within_week() {
        let today = date(2024, 6, 1);
        let done = task(
            "mt-1",
            "a",
            Activity::Protection,
            TaskStatus::Done,
            ReviewState::Approved,
            None,
            Some(date(2024, 4, 20)),
        );
        let report = compute(&snapshot(
            vec![tree("a", TreeStatus::Healthy, Some(date(2024, 1, 1)))],
            vec![done],
            today,
        ));

        // Protection due 2024-06-04 is inside the 7-day window.
        assert!(report.summary.due_within_week >= 1);
    }
}
