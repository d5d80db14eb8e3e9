//! canopy task command implementations.

use std::path::PathBuf;

use crate::actor;
use crate::cli::{parse_date, project_context};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::review;
use crate::task::{Activity, TaskEvent, TaskEventType, TaskStore};

pub struct AssignOptions {
    pub tree: String,
    pub activity: String,
    pub assignee: Option<String>,
    pub due: Option<String>,
    pub note: Option<String>,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub tree: Option<String>,
    pub activity: Option<String>,
    pub open: bool,
    pub done: bool,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct SubmitOptions {
    pub id: String,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DueOptions {
    pub id: String,
    pub date: String,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_assign(options: AssignOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;

    let activity: Activity = options.activity.parse()?;
    let due_date = options.due.as_deref().map(parse_date).transpose()?;

    let registry = ctx.storage.read_trees()?;
    let tree_id = registry.resolve(&options.tree)?;

    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());
    let task_id = store.generate_task_id()?;

    let mut event = TaskEvent::new(TaskEventType::TaskAssigned, task_id.clone());
    event.actor = Some(actor_name);
    event.tree_id = Some(tree_id.clone());
    event.activity = Some(activity);
    event.assignee = options.assignee;
    event.due_date = due_date;
    event.instructions = options.note;
    store.append_event(event)?;

    let task = store.get(&task_id)?;

    let mut human = HumanOutput::new(format!(
        "Assigned {} task {} for tree {}",
        activity,
        task.id,
        &tree_id[..8.min(tree_id.len())]
    ));
    if let Some(assignee) = &task.assignee {
        human.push_summary("assignee", assignee.clone());
    }
    if let Some(due) = task.due_date {
        human.push_summary("due", due.to_string());
    }
    human.push_next_step(format!("canopy task submit {}", task.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task assign",
        &task,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let mut tasks = store.list()?;

    if let Some(raw) = options.tree.as_deref() {
        let registry = ctx.storage.read_trees()?;
        let tree_id = registry.resolve(raw)?;
        tasks.retain(|task| task.tree_id == tree_id);
    }
    if let Some(raw) = options.activity.as_deref() {
        let activity: Activity = raw.parse()?;
        tasks.retain(|task| task.activity == activity);
    }
    if options.open {
        tasks.retain(|task| !task.is_complete());
    }
    if options.done {
        tasks.retain(|task| task.is_complete());
    }

    let mut human = HumanOutput::new(format!("{} task(s)", tasks.len()));
    for task in &tasks {
        human.push_detail(format!(
            "{}  {}  {}  {}/{}  due {}",
            task.id,
            &task.tree_id[..8.min(task.tree_id.len())],
            task.activity,
            task.status,
            task.review_state,
            task.due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &tasks,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let task_id = store.resolve_task_id(&options.id)?;
    let task = store.get(&task_id)?;

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    human.push_summary("tree", task.tree_id.clone());
    human.push_summary("activity", task.activity.to_string());
    human.push_summary("status", format!("{}/{}", task.status, task.review_state));
    if let Some(assignee) = &task.assignee {
        human.push_summary("assignee", assignee.clone());
    }
    if let Some(due) = task.due_date {
        human.push_summary("due", due.to_string());
    }
    if let Some(completed) = task.completed_at {
        human.push_summary("completed", completed.date_naive().to_string());
    }
    if let Some(note) = &task.rejection_note {
        human.push_warning(format!("rejected: {note}"));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task show",
        &task,
        Some(&human),
    )
}

pub fn run_submit(options: SubmitOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let task_id = store.resolve_task_id(&options.id)?;
    let task = store.get(&task_id)?;
    let event = review::submit_task(&task, &actor_name)?;
    store.append_event(event)?;

    let task = store.get(&task_id)?;

    let mut human = HumanOutput::new(format!("Task {} submitted for review", task.id));
    human.push_next_step(format!("canopy review approve {}", task.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task submit",
        &task,
        Some(&human),
    )
}

pub fn run_due(options: DueOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;
    let store = TaskStore::new(ctx.storage.clone(), ctx.config.tasks.clone());

    let task_id = store.resolve_task_id(&options.id)?;
    let due = parse_date(&options.date)?;

    let mut event = TaskEvent::new(TaskEventType::TaskDueChanged, task_id.clone());
    event.actor = Some(actor_name);
    event.due_date = Some(due);
    store.append_event(event)?;

    let task = store.get(&task_id)?;

    let human = HumanOutput::new(format!("Task {} now due {}", task.id, due));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task due",
        &task,
        Some(&human),
    )
}
