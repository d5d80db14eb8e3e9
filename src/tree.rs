//! Tree records and the project tree registry.
//!
//! Trees are stored in `.canopy/trees.json` as a single registry document,
//! rewritten under a file lock on every mutation.
//!
//! # Status vocabulary
//!
//! A tree's condition is a closed vocabulary. Field reports arrive as free
//! text, so parsing normalizes: lowercase, `-`/space collapse to `_`,
//! common misspellings are mapped (`deseas` -> `disease`), and an empty
//! value defaults to `healthy`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// Tree status
// =============================================================================

/// Normalized condition tag of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStatus {
    /// Alive and in good condition
    Healthy,
    Dead,
    Damaged,
    Removed,
    /// Inspection flagged urgent watering
    NeedWatering,
    /// Inspection flagged urgent protection (fencing, guards)
    NeedProtection,
    /// Condition calls for replacing the tree
    NeedReplacement,
    Disease,
    /// Registered but not yet in the ground
    PendingPlanting,
}

impl TreeStatus {
    /// Whether this condition forces an immediate replacement cycle
    pub fn needs_replacement(&self) -> bool {
        matches!(
            self,
            TreeStatus::Dead
                | TreeStatus::Damaged
                | TreeStatus::Removed
                | TreeStatus::NeedReplacement
        )
    }

    /// Whether the tree counts as alive and well (maturity gate input)
    pub fn is_thriving(&self) -> bool {
        matches!(self, TreeStatus::Healthy)
    }
}

impl fmt::Display for TreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeStatus::Healthy => write!(f, "healthy"),
            TreeStatus::Dead => write!(f, "dead"),
            TreeStatus::Damaged => write!(f, "damaged"),
            TreeStatus::Removed => write!(f, "removed"),
            TreeStatus::NeedWatering => write!(f, "need_watering"),
            TreeStatus::NeedProtection => write!(f, "need_protection"),
            TreeStatus::NeedReplacement => write!(f, "need_replacement"),
            TreeStatus::Disease => write!(f, "disease"),
            TreeStatus::PendingPlanting => write!(f, "pending_planting"),
        }
    }
}

impl FromStr for TreeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut normalized = s.trim().to_lowercase().replace(['-', ' '], "_");

        // Collapse runs of underscores left by mixed separators
        while normalized.contains("__") {
            normalized = normalized.replace("__", "_");
        }

        match normalized.as_str() {
            "" | "healthy" | "alive" => Ok(TreeStatus::Healthy),
            "dead" => Ok(TreeStatus::Dead),
            "damaged" => Ok(TreeStatus::Damaged),
            "removed" => Ok(TreeStatus::Removed),
            "need_watering" => Ok(TreeStatus::NeedWatering),
            "need_protection" => Ok(TreeStatus::NeedProtection),
            "need_replacement" | "needreplacement" | "needsreplacement" | "needs_replacement" => {
                Ok(TreeStatus::NeedReplacement)
            }
            "disease" | "deseas" | "diseased" => Ok(TreeStatus::Disease),
            "pending_planting" => Ok(TreeStatus::PendingPlanting),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid tree status '{}'. Expected: healthy, dead, damaged, removed, \
                 need_watering, need_protection, need_replacement, disease, pending_planting",
                s
            ))),
        }
    }
}

impl Default for TreeStatus {
    fn default() -> Self {
        TreeStatus::Healthy
    }
}

/// Normalize a species name for maturity-map lookups: trim, lowercase,
/// collapse internal whitespace runs to a single space.
pub fn normalize_species(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// =============================================================================
// Tree record
// =============================================================================

/// A planted (or registered) tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    /// Unique tree id
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    pub status: TreeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planting_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_m: Option<f64>,
    /// Where the sapling came from (nursery, wildling, donation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Attribution flag, carried through to reports
    #[serde(default)]
    pub sponsored: bool,
    /// Plot or zone label, carried through to reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Tree {
    /// Create a new tree record with a generated id
    pub fn new(species: Option<String>, planting_date: Option<NaiveDate>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            species,
            status: TreeStatus::Healthy,
            planting_date,
            height_m: None,
            origin: None,
            sponsored: false,
            location: None,
            created_at: now,
            updated_at: now,
            updated_by: None,
        }
    }
}

// =============================================================================
// Tree registry
// =============================================================================

/// Registry of all trees in a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeRegistry {
    pub trees: Vec<Tree>,
}

impl TreeRegistry {
    /// Find a tree by id
    pub fn find(&self, id: &str) -> Option<&Tree> {
        self.trees.iter().find(|t| t.id == id)
    }

    /// Find a tree by id (mutable)
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Tree> {
        self.trees.iter_mut().find(|t| t.id == id)
    }

    /// Insert a tree record (reject duplicate ids)
    pub fn insert(&mut self, tree: Tree) -> Result<()> {
        if self.find(&tree.id).is_some() {
            return Err(Error::InvalidArgument(format!(
                "tree already exists: {}",
                tree.id
            )));
        }
        self.trees.push(tree);
        Ok(())
    }

    /// Resolve a full or partial tree id to the unique matching record.
    ///
    /// Accepts any unambiguous id prefix, so field staff can type the
    /// first few characters of a uuid.
    pub fn resolve(&self, input: &str) -> Result<String> {
        let trimmed = input.trim().to_lowercase();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("tree id cannot be empty".to_string()));
        }

        if let Some(tree) = self.trees.iter().find(|t| t.id == trimmed) {
            return Ok(tree.id.clone());
        }

        let mut matches: Vec<String> = self
            .trees
            .iter()
            .filter(|t| t.id.starts_with(&trimmed))
            .map(|t| t.id.clone())
            .collect();

        matches.sort();
        matches.dedup();
        if matches.is_empty() {
            return Err(Error::TreeNotFound(input.trim().to_string()));
        }
        if matches.len() > 1 {
            return Err(Error::InvalidArgument(format!(
                "ambiguous tree id '{}': {}",
                input.trim(),
                matches.join(", ")
            )));
        }
        Ok(matches.remove(0))
    }

    /// Validate registry entries (unique ids)
    pub fn validate(&self) -> Result<()> {
        let mut ids = std::collections::HashSet::new();
        for tree in &self.trees {
            if !ids.insert(tree.id.clone()) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate tree id: {}",
                    tree.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_normalizes_aliases() {
        assert_eq!("alive".parse::<TreeStatus>().unwrap(), TreeStatus::Healthy);
        assert_eq!("".parse::<TreeStatus>().unwrap(), TreeStatus::Healthy);
        assert_eq!(
            "Need-Watering".parse::<TreeStatus>().unwrap(),
            TreeStatus::NeedWatering
        );
        assert_eq!(
            "need replacement".parse::<TreeStatus>().unwrap(),
            TreeStatus::NeedReplacement
        );
        assert_eq!(
            "needsreplacement".parse::<TreeStatus>().unwrap(),
            TreeStatus::NeedReplacement
        );
        assert_eq!("deseas".parse::<TreeStatus>().unwrap(), TreeStatus::Disease);
        assert_eq!(
            "diseased".parse::<TreeStatus>().unwrap(),
            TreeStatus::Disease
        );
    }

    #[test]
    fn status_parsing_rejects_unknown() {
        let err = "thriving!".parse::<TreeStatus>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn replacement_trigger_covers_terminal_conditions() {
        assert!(TreeStatus::Dead.needs_replacement());
        assert!(TreeStatus::Damaged.needs_replacement());
        assert!(TreeStatus::Removed.needs_replacement());
        assert!(TreeStatus::NeedReplacement.needs_replacement());

        assert!(!TreeStatus::Healthy.needs_replacement());
        assert!(!TreeStatus::Disease.needs_replacement());
        assert!(!TreeStatus::NeedWatering.needs_replacement());
        assert!(!TreeStatus::PendingPlanting.needs_replacement());
    }

    #[test]
    fn species_normalization_collapses_whitespace() {
        assert_eq!(normalize_species("  Acacia   tortilis "), "acacia tortilis");
        assert_eq!(normalize_species("MANGO"), "mango");
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let mut registry = TreeRegistry::default();
        let tree = Tree::new(Some("mango".to_string()), None);
        let dup = tree.clone();
        registry.insert(tree).unwrap();
        assert!(registry.insert(dup).is_err());
    }

    #[test]
    fn resolve_accepts_unambiguous_prefix() {
        let mut registry = TreeRegistry::default();
        let mut a = Tree::new(None, None);
        a.id = "abc123".to_string();
        let mut b = Tree::new(None, None);
        b.id = "abd456".to_string();
        registry.insert(a).unwrap();
        registry.insert(b).unwrap();

        assert_eq!(registry.resolve("abc").unwrap(), "abc123");
        assert!(matches!(
            registry.resolve("ab"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.resolve("zzz"),
            Err(Error::TreeNotFound(_))
        ));
    }
}
