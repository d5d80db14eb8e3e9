//! canopy schedule command implementation.
//!
//! Gathers the current project snapshot and runs the schedule engine over
//! it. All computation lives in `crate::schedule`; this command only
//! collects inputs and renders rows.

use std::path::PathBuf;

use chrono::Utc;

use crate::cli::{parse_date, project_context};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::schedule::{self, ScheduleReport, Snapshot};
use crate::season::Season;
use crate::task::{Activity, TaskStore};

pub struct ScheduleOptions {
    pub season: Option<String>,
    pub as_of: Option<String>,
    pub tree: Option<String>,
    pub activity: Option<String>,
    pub due_within: Option<i64>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(options: ScheduleOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    // Season comes from the flag or the configured default; either way it
    // is validated before the engine ever sees it.
    let season: Season = options
        .season
        .as_deref()
        .unwrap_or(ctx.config.season.as_str())
        .parse()?;

    // "Today" is captured once so the whole row set is internally
    // consistent.
    let today = match options.as_of.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };

    let tree_filter = match options.tree.as_deref() {
        Some(raw) => Some(ctx.storage.read_trees()?.resolve(raw)?),
        None => None,
    };
    let activity_filter = options
        .activity
        .as_deref()
        .map(str::parse::<Activity>)
        .transpose()?;

    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());
    let snapshot = Snapshot {
        trees: ctx.storage.list_trees()?,
        tasks: store.list()?,
        maturity: ctx.storage.read_maturity()?,
        season,
        today,
    };

    let mut report = schedule::compute(&snapshot);

    if tree_filter.is_some() || activity_filter.is_some() || options.due_within.is_some() {
        report.rows.retain(|row| {
            tree_filter
                .as_deref()
                .map_or(true, |tree_id| row.tree_id == tree_id)
                && activity_filter.map_or(true, |activity| row.activity == activity)
                && options.due_within.map_or(true, |window| {
                    row.countdown_days.is_some_and(|days| days <= window)
                })
        });
        report.summary = schedule::summarize(&report.rows);
    }

    let human = render_human(&report);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "schedule",
        &report,
        Some(&human),
    )
}

fn render_human(report: &ScheduleReport) -> HumanOutput {
    let mut human = HumanOutput::new(format!(
        "Maintenance schedule as of {} ({} season)",
        report.as_of, report.season
    ));

    human.push_summary("rows", report.summary.total.to_string());
    human.push_summary("danger", report.summary.danger.to_string());
    human.push_summary("warning", report.summary.warning.to_string());
    human.push_summary("info", report.summary.info.to_string());
    human.push_summary("ok", report.summary.ok.to_string());
    human.push_summary(
        "due within 7 days",
        report.summary.due_within_week.to_string(),
    );

    for row in &report.rows {
        let due = row
            .effective_due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let countdown = row
            .countdown_days
            .map(|d| format!("{d:+}"))
            .unwrap_or_else(|| "-".to_string());
        human.push_detail(format!(
            "[{}] {}  {}  due {}  ({} d)  {}",
            row.tone,
            &row.tree_id[..8.min(row.tree_id.len())],
            row.activity_label,
            due,
            countdown,
            row.indicator_text,
        ));
    }

    if report.summary.danger > 0 {
        human.push_warning(format!(
            "{} row(s) need immediate attention",
            report.summary.danger
        ));
    }

    human
}
