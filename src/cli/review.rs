//! canopy review command implementations.
//!
//! Supervisor decisions on submitted tasks. Every decision appends an
//! event and the next `canopy schedule` recomputes from the new snapshot.

use std::path::PathBuf;

use crate::actor;
use crate::cli::project_context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::review;
use crate::task::TaskStore;

pub struct ApproveOptions {
    pub id: String,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RejectOptions {
    pub id: String,
    pub note: Option<String>,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ReopenOptions {
    pub id: String,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_approve(options: ApproveOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let task_id = store.resolve_task_id(&options.id)?;
    let task = store.get(&task_id)?;
    let event = review::approve_task(&task, &actor_name)?;
    store.append_event(event)?;

    let task = store.get(&task_id)?;

    let mut human = HumanOutput::new(format!("Approved task {}", task.id));
    human.push_detail("the task is complete and anchors the next maintenance cycle");
    human.push_next_step("canopy schedule");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "review approve",
        &task,
        Some(&human),
    )
}

pub fn run_reject(options: RejectOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let task_id = store.resolve_task_id(&options.id)?;
    let note = options
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .ok_or_else(|| Error::NoteRequired(task_id.clone()))?;

    let task = store.get(&task_id)?;
    let event = review::reject_task(&task, &actor_name, note)?;
    store.append_event(event)?;

    let task = store.get(&task_id)?;

    let mut human = HumanOutput::new(format!("Rejected task {}", task.id));
    human.push_detail(format!("note: {note}"));
    human.push_detail("the task stays in the open pool until redone and approved");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "review reject",
        &task,
        Some(&human),
    )
}

pub fn run_reopen(options: ReopenOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let task_id = store.resolve_task_id(&options.id)?;
    let task = store.get(&task_id)?;
    let event = review::reopen_task(&task, &actor_name)?;
    store.append_event(event)?;

    let task = store.get(&task_id)?;

    let mut human = HumanOutput::new(format!("Reopened task {}", task.id));
    human.push_warning("the prior completion no longer anchors the cadence");
    human.push_next_step("canopy schedule");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "review reopen",
        &task,
        Some(&human),
    )
}
