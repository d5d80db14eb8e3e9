//! canopy actor command implementations.

use std::path::PathBuf;

use crate::actor;
use crate::cli::project_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct SetOptions {
    pub name: String,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub actor: Option<String>,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ActorReport {
    actor: String,
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    actor::persist_actor(&ctx.root, &options.name)?;

    let report = ActorReport {
        actor: options.name.trim().to_string(),
    };
    let human = HumanOutput::new(format!("Actor set to {}", report.actor));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "actor set",
        &report,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    let actor = actor::resolve_actor(Some(&ctx.root), options.actor.as_deref())?;

    let report = ActorReport {
        actor: actor.clone(),
    };
    let human = HumanOutput::new(format!("Actor: {actor}"));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "actor show",
        &report,
        Some(&human),
    )
}
