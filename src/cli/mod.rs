//! Command-line interface for canopy
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

mod actor;
mod init;
mod review;
mod schedule;
mod species;
mod status;
mod task;
mod tree;

/// canopy - Afforestation Field Operations
///
/// A CLI that tracks planted trees, maintenance tasks, supervisor review,
/// and the maintenance schedule derived from season, age, and condition.
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the project directory (defaults to current directory)
    #[arg(long, global = true, env = "CANOPY_PROJECT")]
    pub project: Option<PathBuf>,

    /// Actor identity for task assignments and review decisions
    #[arg(long, global = true, env = "CANOPY_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a canopy project in a directory
    Init,

    /// Tree management
    #[command(subcommand)]
    Tree(TreeCommands),

    /// Maintenance task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Supervisor review of submitted tasks
    #[command(subcommand)]
    Review(ReviewCommands),

    /// Compute the maintenance schedule for every (tree, activity) pair
    Schedule {
        /// Season: rainy, dry (defaults to the configured season)
        #[arg(long)]
        season: Option<String>,

        /// Compute as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,

        /// Only rows for this tree (full or partial id)
        #[arg(long)]
        tree: Option<String>,

        /// Only rows for this activity
        #[arg(long)]
        activity: Option<String>,

        /// Only rows due within N days
        #[arg(long)]
        due_within: Option<i64>,
    },

    /// Species maturity pegs
    #[command(subcommand)]
    Species(SpeciesCommands),

    /// Show a project summary
    Status,

    /// Set or show actor identity
    #[command(subcommand)]
    Actor(ActorCommands),
}

#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Register a tree
    Add {
        /// Species label
        #[arg(long)]
        species: Option<String>,

        /// Planting date (YYYY-MM-DD)
        #[arg(long)]
        planted: Option<String>,

        /// Measured height in meters
        #[arg(long)]
        height_m: Option<f64>,

        /// Where the sapling came from (nursery, wildling, donation)
        #[arg(long)]
        origin: Option<String>,

        /// Mark the tree as sponsored
        #[arg(long)]
        sponsored: bool,

        /// Plot or zone label
        #[arg(long)]
        location: Option<String>,
    },

    /// List trees
    List {
        /// Only trees with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one tree
    Show {
        /// Tree id (full or partial)
        id: String,
    },

    /// Update a tree's condition
    Status {
        /// Tree id (full or partial)
        id: String,

        /// New status (healthy, dead, damaged, removed, need_watering,
        /// need_protection, need_replacement, disease, pending_planting)
        status: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Assign a maintenance task for a tree
    Assign {
        /// Tree id (full or partial)
        tree: String,

        /// Activity: watering, weeding, protection, inspection, replacement
        activity: String,

        /// Field staff the task is assigned to
        #[arg(long)]
        assignee: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Instructions for the field staff
        #[arg(long)]
        note: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks for this tree (full or partial id)
        #[arg(long)]
        tree: Option<String>,

        /// Only tasks for this activity
        #[arg(long)]
        activity: Option<String>,

        /// Only open (not complete) tasks
        #[arg(long, conflicts_with = "done")]
        open: bool,

        /// Only complete tasks
        #[arg(long)]
        done: bool,
    },

    /// Show one task
    Show {
        /// Task id (full or partial)
        id: String,
    },

    /// Report a task's work as finished (hands it to review)
    Submit {
        /// Task id (full or partial)
        id: String,
    },

    /// Change a task's assigned due date
    Due {
        /// Task id (full or partial)
        id: String,

        /// New due date (YYYY-MM-DD)
        date: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReviewCommands {
    /// Approve a submitted task; it becomes complete and anchors the next cycle
    Approve {
        /// Task id (full or partial)
        id: String,
    },

    /// Reject a submitted task back to the field with a note
    Reject {
        /// Task id (full or partial)
        id: String,

        /// Why the work was rejected (required)
        #[arg(long)]
        note: Option<String>,
    },

    /// Reopen an approved task; completion is cleared
    Reopen {
        /// Task id (full or partial)
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SpeciesCommands {
    /// Peg a species' maturity age in years (1-15)
    Peg {
        /// Species name
        name: String,

        /// Maturity age in whole years
        years: u32,
    },

    /// Remove a species' maturity peg
    Unpeg {
        /// Species name
        name: String,
    },

    /// List maturity pegs
    List,
}

#[derive(Subcommand, Debug)]
pub enum ActorCommands {
    /// Persist the actor identity for this project
    Set {
        /// Actor name
        name: String,
    },

    /// Show the resolved actor identity
    Show,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(self.project, self.json, self.quiet),
            Commands::Tree(cmd) => match cmd {
                TreeCommands::Add {
                    species,
                    planted,
                    height_m,
                    origin,
                    sponsored,
                    location,
                } => tree::run_add(tree::AddOptions {
                    species,
                    planted,
                    height_m,
                    origin,
                    sponsored,
                    location,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TreeCommands::List { status } => tree::run_list(tree::ListOptions {
                    status,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TreeCommands::Show { id } => tree::run_show(tree::ShowOptions {
                    id,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TreeCommands::Status { id, status } => tree::run_status(tree::StatusOptions {
                    id,
                    status,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::Assign {
                    tree,
                    activity,
                    assignee,
                    due,
                    note,
                } => task::run_assign(task::AssignOptions {
                    tree,
                    activity,
                    assignee,
                    due,
                    note,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::List {
                    tree,
                    activity,
                    open,
                    done,
                } => task::run_list(task::ListOptions {
                    tree,
                    activity,
                    open,
                    done,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Submit { id } => task::run_submit(task::SubmitOptions {
                    id,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Due { id, date } => task::run_due(task::DueOptions {
                    id,
                    date,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Review(cmd) => match cmd {
                ReviewCommands::Approve { id } => review::run_approve(review::ApproveOptions {
                    id,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ReviewCommands::Reject { id, note } => review::run_reject(review::RejectOptions {
                    id,
                    note,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ReviewCommands::Reopen { id } => review::run_reopen(review::ReopenOptions {
                    id,
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Schedule {
                season,
                as_of,
                tree,
                activity,
                due_within,
            } => schedule::run(schedule::ScheduleOptions {
                season,
                as_of,
                tree,
                activity,
                due_within,
                project: self.project,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Species(cmd) => match cmd {
                SpeciesCommands::Peg { name, years } => {
                    species::run_peg(species::PegOptions {
                        name,
                        years,
                        project: self.project,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
                SpeciesCommands::Unpeg { name } => species::run_unpeg(species::UnpegOptions {
                    name,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SpeciesCommands::List => species::run_list(species::ListOptions {
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Status => status::run(status::StatusOptions {
                project: self.project,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Actor(cmd) => match cmd {
                ActorCommands::Set { name } => actor::run_set(actor::SetOptions {
                    name,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ActorCommands::Show => actor::run_show(actor::ShowOptions {
                    actor: self.actor,
                    project: self.project,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
        }
    }
}

/// Shared per-command context: project root, storage, config.
pub(crate) struct ProjectContext {
    pub root: PathBuf,
    pub storage: Storage,
    pub config: Config,
}

/// Resolve the project root and require an initialized `.canopy/` dir.
pub(crate) fn project_context(project: Option<PathBuf>) -> Result<ProjectContext> {
    let root = match project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let storage = Storage::new(root.clone());
    storage.ensure_initialized()?;
    let config = Config::load_from_project(&root);
    Ok(ProjectContext {
        root,
        storage,
        config,
    })
}

/// Parse a `YYYY-MM-DD` calendar date argument.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("Invalid date '{}'. Expected YYYY-MM-DD", raw))
    })
}
