//! canopy species command implementations.
//!
//! Maturity pegs: how many years until a species is considered
//! self-sustaining and its routine maintenance schedule closes.

use std::path::PathBuf;

use crate::cli::project_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tree::normalize_species;

pub struct PegOptions {
    pub name: String,
    pub years: u32,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct UnpegOptions {
    pub name: String,
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub project: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct PegReport {
    species: String,
    years: u32,
}

pub fn run_peg(options: PegOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    ctx.storage.peg_species(&options.name, options.years)?;
    let report = PegReport {
        species: normalize_species(&options.name),
        years: options.years,
    };

    let mut human = HumanOutput::new(format!(
        "Pegged {} at {} year(s) to maturity",
        report.species, report.years
    ));
    human.push_detail("trees of this species past that age close their routine schedule");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "species peg",
        &report,
        Some(&human),
    )
}

pub fn run_unpeg(options: UnpegOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    let removed = ctx.storage.unpeg_species(&options.name)?;
    let species = normalize_species(&options.name);

    let human = HumanOutput::new(if removed {
        format!("Removed maturity peg for {species}")
    } else {
        format!("No maturity peg for {species}")
    });

    #[derive(serde::Serialize)]
    struct UnpegReport {
        species: String,
        removed: bool,
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "species unpeg",
        &UnpegReport { species, removed },
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = project_context(options.project)?;

    let map = ctx.storage.read_maturity()?;

    let mut human = HumanOutput::new(format!("{} maturity peg(s)", map.len()));
    for (species, years) in &map {
        human.push_detail(format!("{species}: {years} year(s)"));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "species list",
        &map,
        Some(&human),
    )
}
