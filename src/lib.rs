//! canopy - Afforestation Field Operations Library
//!
//! This library provides the core functionality for the canopy CLI tool,
//! tracking planted trees, the maintenance work done on them, and the
//! staff who perform it.
//!
//! # Core Concepts
//!
//! - **Trees**: Planted trees with a normalized condition vocabulary
//! - **Maintenance Tasks**: Per-tree work items with a supervisor review
//!   workflow (submit, approve, reject, reopen)
//! - **Seasonal Intervals**: Activity cadences that depend on season and
//!   tree age
//! - **Lifecycle Clock**: Age arithmetic anchored on planting or the last
//!   completed replacement
//! - **Schedule Engine**: Pure computation of due dates, countdowns, and
//!   severity tones for every (tree, activity) pair
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.canopy.toml`
//! - `error`: Error types and result aliases
//! - `tree`: Tree records, status vocabulary, and the project registry
//! - `task`: Maintenance tasks, the activity vocabulary, and the event log
//! - `review`: Supervisor review workflow state machine
//! - `season`: Seasonal maintenance interval table
//! - `lifecycle`: Lifecycle clock and maturity gate
//! - `schedule`: The maintenance schedule engine
//! - `actor`: Actor identity management
//! - `storage`: File storage and project state management
//! - `lock`: File locking and atomic operations for concurrency safety

pub mod actor;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod output;
pub mod review;
pub mod schedule;
pub mod season;
pub mod storage;
pub mod task;
pub mod tree;

pub use error::{Error, Result};
