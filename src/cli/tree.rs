//! canopy tree command implementations.

use std::path::PathBuf;

use chrono::Utc;

use crate::actor;
use crate::cli::{parse_date, project_context};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tree::{Tree, TreeStatus};

pub struct AddOptions {
    pub species: Option<String>,
    pub planted: Option<String>,
    pub height_m: Option<f64>,
    pub origin: Option<String>,
    pub sponsored: bool,
    pub location: Option<String>,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub status: Option<String>,
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

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;

    let planting_date = options.planted.as_deref().map(parse_date).transpose()?;

    let mut tree = Tree::new(options.species, planting_date);
    tree.height_m = options.height_m;
    tree.origin = options.origin;
    tree.sponsored = options.sponsored;
    tree.location = options.location;
    tree.updated_by = Some(actor_name);

    ctx.storage.add_tree(tree.clone())?;

    let mut human = HumanOutput::new(format!("Registered tree {}", tree.id));
    if let Some(species) = &tree.species {
        human.push_summary("species", species.clone());
    }
    if let Some(planted) = tree.planting_date {
        human.push_summary("planted", planted.to_string());
    } else {
        human.push_warning(
            "no planting date: the schedule cannot compute due dates for this tree",
        );
    }
    human.push_next_step(format!("canopy task assign {} watering", &tree.id[..8]));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "tree add",
        &tree,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    let mut trees = ctx.storage.list_trees()?;
    if let Some(raw) = options.status.as_deref() {
        let status: TreeStatus = raw.parse()?;
        trees.retain(|tree| tree.status == status);
    }
    trees.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut human = HumanOutput::new(format!("{} tree(s)", trees.len()));
    for tree in &trees {
        human.push_detail(format!(
            "{}  {}  {}  planted {}",
            &tree.id[..8.min(tree.id.len())],
            tree.species.as_deref().unwrap_or("-"),
            tree.status,
            tree.planting_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "tree list",
        &trees,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    let registry = ctx.storage.read_trees()?;
    let id = registry.resolve(&options.id)?;
    let tree = registry
        .find(&id)
        .cloned()
        .ok_or_else(|| crate::error::Error::TreeNotFound(id.clone()))?;

    let mut human = HumanOutput::new(format!("Tree {}", tree.id));
    human.push_summary("status", tree.status.to_string());
    if let Some(species) = &tree.species {
        human.push_summary("species", species.clone());
    }
    if let Some(planted) = tree.planting_date {
        human.push_summary("planted", planted.to_string());
    }
    if let Some(height) = tree.height_m {
        human.push_summary("height", format!("{height} m"));
    }
    if let Some(origin) = &tree.origin {
        human.push_summary("origin", origin.clone());
    }
    if let Some(location) = &tree.location {
        human.push_summary("location", location.clone());
    }
    if tree.sponsored {
        human.push_summary("sponsored", "yes".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "tree show",
        &tree,
        Some(&human),
    )
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let ctx = project_context(options.project)?;
    let actor_name = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;

    let status: TreeStatus = options.status.parse()?;
    let registry = ctx.storage.read_trees()?;
    let id = registry.resolve(&options.id)?;

    let updated = ctx.storage.update_tree(&id, |tree| {
        tree.status = status;
        tree.updated_at = Utc::now();
        tree.updated_by = Some(actor_name.clone());
        Ok(())
    })?;

    let mut human = HumanOutput::new(format!("Tree {} is now {}", updated.id, updated.status));
    if status.needs_replacement() {
        human.push_warning("this condition pauses routine maintenance and calls for replacement");
        human.push_next_step(format!("canopy task assign {} replacement", &updated.id[..8]));
    }
    human.push_next_step("canopy schedule");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "tree status",
        &updated,
        Some(&human),
    )
}
