//! canopy status command implementation
//!
//! Provides a single-pane summary of the project: trees by condition, task
//! counts, and the schedule tone totals.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;

use crate::cli::project_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::schedule::{self, ScheduleSummary, Snapshot};
use crate::season::Season;
use crate::task::TaskStore;

pub struct StatusOptions {
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct StatusReport {
    project: String,
    season: Season,
    trees: usize,
    trees_by_status: BTreeMap<String, usize>,
    open_tasks: usize,
    submitted_tasks: usize,
    completed_tasks: usize,
    schedule: ScheduleSummary,
}

pub fn run(options: StatusOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    let season: Season = ctx.config.season.parse()?;
    let trees = ctx.storage.list_trees()?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());
    let tasks = store.list()?;

    let mut trees_by_status: BTreeMap<String, usize> = BTreeMap::new();
    for tree in &trees {
        *trees_by_status.entry(tree.status.to_string()).or_insert(0) += 1;
    }

    let completed_tasks = tasks.iter().filter(|task| task.is_complete()).count();
    let submitted_tasks = tasks
        .iter()
        .filter(|task| task.status == crate::task::TaskStatus::Submitted)
        .count();
    let open_tasks = tasks.len() - completed_tasks;

    let snapshot = Snapshot {
        trees: trees.clone(),
        tasks,
        maturity: ctx.storage.read_maturity()?,
        season,
        today: Utc::now().date_naive(),
    };
    let schedule_summary = schedule::compute(&snapshot).summary;

    let report = StatusReport {
        project: ctx.config.project.clone(),
        season,
        trees: trees.len(),
        trees_by_status,
        open_tasks,
        submitted_tasks,
        completed_tasks,
        schedule: schedule_summary,
    };

    let mut human = HumanOutput::new(format!("Project {}", report.project));
    human.push_summary("season", report.season.to_string());
    human.push_summary("trees", report.trees.to_string());
    for (status, count) in &report.trees_by_status {
        human.push_summary(format!("  {status}"), count.to_string());
    }
    human.push_summary("open tasks", report.open_tasks.to_string());
    human.push_summary("awaiting review", report.submitted_tasks.to_string());
    human.push_summary("completed tasks", report.completed_tasks.to_string());
    human.push_summary(
        "schedule",
        format!(
            "{} danger, {} warning, {} info, {} ok",
            report.schedule.danger,
            report.schedule.warning,
            report.schedule.info,
            report.schedule.ok
        ),
    );

    if report.submitted_tasks > 0 {
        human.push_next_step("canopy review approve <task-id>");
    }
    if report.schedule.danger > 0 {
        human.push_next_step("canopy schedule --due-within 0");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "status",
        &report,
        Some(&human),
    )
}
