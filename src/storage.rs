//! Storage layer for canopy
//!
//! Manages persistent project state under `.canopy/`:
//!
//! ```text
//! .canopy/
//!   actor                 # Current actor identity
//!   trees.json            # Registry of all trees
//!   tasks.jsonl           # Append-only maintenance task event log
//!   tasks.snapshot.json   # Materialized task snapshot (cache)
//!   maturity.json         # Species -> maturity-years pegs
//! ```
//!
//! All writes are atomic (temp file + rename) and registry mutations hold a
//! file lock, so concurrent invocations never observe partial state.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::tree::{Tree, TreeRegistry};

/// Name of the project state directory
pub const STATE_DIR: &str = ".canopy";

/// Species maturity pegs: normalized species name -> maturity age in years
pub type SpeciesMaturityMap = BTreeMap<String, u32>;

/// Inclusive bounds for a species maturity peg, in whole years
pub const MATURITY_YEARS_MIN: u32 = 1;
pub const MATURITY_YEARS_MAX: u32 = 15;

/// Storage manager for canopy project state
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the project root (where `.canopy/` lives)
    project_root: PathBuf,
}

impl Storage {
    /// Create a new storage manager for the given project root
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Path to the project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Path to the `.canopy/` state directory
    pub fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    /// Path to the actor file
    pub fn actor_file(&self) -> PathBuf {
        self.state_dir().join("actor")
    }

    /// Path to the tree registry
    pub fn trees_file(&self) -> PathBuf {
        self.state_dir().join("trees.json")
    }

    /// Path to the task event log (JSONL format)
    pub fn tasks_log(&self) -> PathBuf {
        self.state_dir().join("tasks.jsonl")
    }

    /// Path to the materialized task snapshot
    pub fn tasks_snapshot(&self) -> PathBuf {
        self.state_dir().join("tasks.snapshot.json")
    }

    /// Path to the species maturity pegs
    pub fn maturity_file(&self) -> PathBuf {
        self.state_dir().join("maturity.json")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the `.canopy/` directory structure
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.state_dir())?;

        let trees_file = self.trees_file();
        if !trees_file.exists() {
            self.write_json(&trees_file, &TreeRegistry::default())?;
        }

        let tasks_log = self.tasks_log();
        if !tasks_log.exists() {
            File::create(&tasks_log)?;
        }

        let maturity_file = self.maturity_file();
        if !maturity_file.exists() {
            self.write_json(&maturity_file, &SpeciesMaturityMap::new())?;
        }

        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.state_dir().exists()
    }

    /// Error unless the project has been initialized
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotAProject(self.project_root.clone()))
        }
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Append a record to a JSONL file
    ///
    /// Callers coordinating across processes should hold a lock on the
    /// sibling `.lock` file first.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Read all records from a JSONL file
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }

    // =========================================================================
    // Actor persistence
    // =========================================================================

    /// Read the persisted actor identity for this project
    pub fn read_actor(&self) -> Option<String> {
        let path = self.actor_file();
        fs::read_to_string(&path).ok().map(|s| s.trim().to_string())
    }

    /// Write the actor identity for this project
    pub fn write_actor(&self, actor: &str) -> Result<()> {
        fs::create_dir_all(self.state_dir())?;
        lock::write_atomic(self.actor_file(), actor.as_bytes())
    }

    // =========================================================================
    // Tree registry operations (locked read-modify-write)
    // =========================================================================

    /// Read the tree registry
    pub fn read_trees(&self) -> Result<TreeRegistry> {
        let path = self.trees_file();
        if !path.exists() {
            return Ok(TreeRegistry::default());
        }
        self.read_json(&path)
    }

    pub fn list_trees(&self) -> Result<Vec<Tree>> {
        Ok(self.read_trees()?.trees)
    }

    pub fn add_tree(&self, tree: Tree) -> Result<()> {
        self.update_trees(|registry| registry.insert(tree))
    }

    pub fn update_tree<F>(&self, id: &str, mutator: F) -> Result<Tree>
    where
        F: FnOnce(&mut Tree) -> Result<()>,
    {
        self.update_trees(|registry| {
            let tree = registry
                .find_mut(id)
                .ok_or_else(|| Error::TreeNotFound(id.to_string()))?;
            mutator(tree)?;
            Ok(tree.clone())
        })
    }

    fn update_trees<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TreeRegistry) -> Result<T>,
    {
        let path = self.trees_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("json.lock");
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry = if path.exists() {
            self.read_json(&path)?
        } else {
            TreeRegistry::default()
        };

        let result = f(&mut registry)?;
        registry.validate()?;

        let json = serde_json::to_string_pretty(&registry)?;
        lock::write_atomic(&path, json.as_bytes())?;

        Ok(result)
    }

    // =========================================================================
    // Species maturity pegs
    // =========================================================================

    /// Read the species maturity map
    pub fn read_maturity(&self) -> Result<SpeciesMaturityMap> {
        let path = self.maturity_file();
        if !path.exists() {
            return Ok(SpeciesMaturityMap::new());
        }
        self.read_json(&path)
    }

    /// Set or update a maturity peg for a (normalized) species name
    pub fn peg_species(&self, species: &str, years: u32) -> Result<()> {
        if !(MATURITY_YEARS_MIN..=MATURITY_YEARS_MAX).contains(&years) {
            return Err(Error::InvalidArgument(format!(
                "maturity years must be between {} and {}, got {}",
                MATURITY_YEARS_MIN, MATURITY_YEARS_MAX, years
            )));
        }
        let key = crate::tree::normalize_species(species);
        if key.is_empty() {
            return Err(Error::InvalidArgument(
                "species name cannot be empty".to_string(),
            ));
        }
        self.update_maturity(|map| {
            map.insert(key, years);
            Ok(())
        })
    }

    /// Remove a maturity peg; returns whether one existed
    pub fn unpeg_species(&self, species: &str) -> Result<bool> {
        let key = crate::tree::normalize_species(species);
        self.update_maturity(|map| Ok(map.remove(&key).is_some()))
    }

    fn update_maturity<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SpeciesMaturityMap) -> Result<T>,
    {
        let path = self.maturity_file();
        let lock_path = path.with_extension("json.lock");
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut map = if path.exists() {
            self.read_json(&path)?
        } else {
            SpeciesMaturityMap::new()
        };

        let result = f(&mut map)?;

        let json = serde_json::to_string_pretty(&map)?;
        lock::write_atomic(&path, json.as_bytes())?;

        Ok(result)
    }
}
