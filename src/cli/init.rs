//! canopy init command implementation
//!
//! Creates the `.canopy/` state directory and seed files in a project
//! directory.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

#[derive(serde::Serialize)]
struct InitReport {
    project: PathBuf,
    created: bool,
}

pub fn run(project: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let root = match project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let storage = Storage::new(root.clone());
    let created = !storage.is_initialized();
    storage.init()?;

    let report = InitReport {
        project: root.clone(),
        created,
    };

    let mut human = HumanOutput::new(if created {
        format!("Initialized canopy project in {}", root.display())
    } else {
        format!("canopy project already initialized in {}", root.display())
    });
    human.push_next_step("canopy tree add --species <name> --planted <YYYY-MM-DD>");
    human.push_next_step("canopy species peg <name> <years>");

    emit_success(
        OutputOptions { json, quiet },
        "init",
        &report,
        Some(&human),
    )
}
