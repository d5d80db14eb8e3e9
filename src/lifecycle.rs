//! Tree lifecycle arithmetic.
//!
//! All age math anchors on the lifecycle start date: the planting date, or
//! the date the tree was last replaced if a completed replacement task is
//! on record, whichever is later. A tree with neither has no lifecycle
//! start and no model-computed due dates.
//!
//! The maturity gate closes the routine schedule once a species is pegged
//! as self-sustaining and the tree has lived past that age.

use chrono::NaiveDate;
use serde::Serialize;

use crate::storage::SpeciesMaturityMap;
use crate::task::{Activity, MaintenanceTask};
use crate::tree::{normalize_species, Tree};

/// Days per year used for maturity thresholds
const DAYS_PER_YEAR: i64 = 365;

/// Derived lifecycle position of a tree at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleState {
    /// Later of planting date and last completed replacement, if either exists
    pub start_date: Option<NaiveDate>,
    /// Whole days since the start date, 0 when the start date is undefined
    pub age_days: i64,
}

/// Derive a tree's lifecycle start date from its planting date and task
/// history.
///
/// Among completed replacement tasks for this tree, the one with the latest
/// anchor date wins; the start date is the later of that and the planting
/// date.
pub fn lifecycle_start(tree: &Tree, tasks: &[MaintenanceTask]) -> Option<NaiveDate> {
    let last_replacement = tasks
        .iter()
        .filter(|task| {
            task.tree_id == tree.id
                && task.activity == Activity::Replacement
                && task.is_complete()
        })
        .map(|task| task.anchor_date())
        .max();

    match (tree.planting_date, last_replacement) {
        (Some(planted), Some(replaced)) => Some(planted.max(replaced)),
        (Some(planted), None) => Some(planted),
        (None, Some(replaced)) => Some(replaced),
        (None, None) => None,
    }
}

/// Whole days from `start` to `today`, clamped at zero; 0 when `start` is
/// undefined.
pub fn age_days(start: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match start {
        Some(start) => (today - start).num_days().max(0),
        None => 0,
    }
}

/// Compute the full lifecycle state for a tree
pub fn lifecycle_state(tree: &Tree, tasks: &[MaintenanceTask], today: NaiveDate) -> LifecycleState {
    let start_date = lifecycle_start(tree, tasks);
    LifecycleState {
        start_date,
        age_days: age_days(start_date, today),
    }
}

/// Whether the tree has reached self-sustaining maturity.
///
/// True iff the tree is alive and well, its species has a configured
/// maturity peg, and its age has passed that peg. A mature tree closes the
/// routine schedule for every activity except replacement.
pub fn is_mature(tree: &Tree, age_days: i64, maturity: &SpeciesMaturityMap) -> bool {
    if !tree.status.is_thriving() {
        return false;
    }

    let Some(species) = tree.species.as_deref() else {
        return false;
    };

    match maturity.get(&normalize_species(species)) {
        Some(years) => age_days >= i64::from(*years) * DAYS_PER_YEAR,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ReviewState, TaskStatus};
    use crate::tree::TreeStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tree_planted(planting_date: Option<NaiveDate>) -> Tree {
        let mut tree = Tree::new(Some("acacia".to_string()), planting_date);
        tree.id = "tree-1".to_string();
        tree
    }

    fn replacement(
        completed_on: Option<NaiveDate>,
        due: Option<NaiveDate>,
        created_on: NaiveDate,
        review_state: ReviewState,
        status: TaskStatus,
    ) -> MaintenanceTask {
        let created_at = created_on.and_hms_opt(9, 0, 0).unwrap().and_utc();
        MaintenanceTask {
            id: "mt-r".to_string(),
            tree_id: "tree-1".to_string(),
            activity: Activity::Replacement,
            assignee: None,
            status,
            review_state,
            due_date: due,
            instructions: None,
            rejection_note: None,
            created_at,
            created_by: None,
            submitted_at: None,
            completed_at: completed_on.map(|d| d.and_hms_opt(15, 0, 0).unwrap().and_utc()),
            completed_by: None,
            updated_at: created_at,
        }
    }

    #[test]
    fn start_is_planting_date_without_replacements() {
        let tree = tree_planted(Some(date(2024, 1, 1)));
        assert_eq!(lifecycle_start(&tree, &[]), Some(date(2024, 1, 1)));
    }

    #[test]
    fn completed_replacement_later_than_planting_wins() {
        let tree = tree_planted(Some(date(2024, 1, 1)));
        let task = replacement(
            Some(date(2024, 6, 15)),
            None,
            date(2024, 6, 1),
            ReviewState::Approved,
            TaskStatus::Done,
        );
        assert_eq!(lifecycle_start(&tree, &[task]), Some(date(2024, 6, 15)));
    }

    #[test]
    fn rejected_replacement_is_excluded() {
        // Approved day-10 task beats a rejected day-5 task; the rejected one
        // is not complete and never anchors anything.
        let tree = tree_planted(None);
        let approved = replacement(
            Some(date(2024, 4, 10)),
            None,
            date(2024, 4, 1),
            ReviewState::Approved,
            TaskStatus::Done,
        );
        let mut rejected = replacement(
            Some(date(2024, 4, 5)),
            None,
            date(2024, 4, 1),
            ReviewState::Rejected,
            TaskStatus::Done,
        );
        rejected.id = "mt-r2".to_string();

        assert_eq!(
            lifecycle_start(&tree, &[rejected, approved]),
            Some(date(2024, 4, 10))
        );
    }

    #[test]
    fn no_planting_and_no_replacement_means_no_start() {
        let tree = tree_planted(None);
        assert_eq!(lifecycle_start(&tree, &[]), None);
        assert_eq!(
            lifecycle_state(&tree, &[], date(2024, 5, 1)),
            LifecycleState {
                start_date: None,
                age_days: 0
            }
        );
    }

    #[test]
    fn age_clamps_future_planting_to_zero() {
        assert_eq!(age_days(Some(date(2024, 6, 1)), date(2024, 5, 1)), 0);
        assert_eq!(age_days(Some(date(2024, 1, 1)), date(2024, 1, 31)), 30);
        assert_eq!(age_days(None, date(2024, 1, 1)), 0);
    }

    #[test]
    fn maturity_requires_peg_health_and_age() {
        let mut maturity = SpeciesMaturityMap::new();
        maturity.insert("acacia".to_string(), 3);

        let tree = tree_planted(Some(date(2021, 1, 1)));

        // 1200 days > 3 * 365
        assert!(is_mature(&tree, 1200, &maturity));
        assert!(!is_mature(&tree, 1000, &maturity));

        let mut sick = tree.clone();
        sick.status = TreeStatus::Disease;
        assert!(!is_mature(&sick, 1200, &maturity));

        let mut unpegged = tree.clone();
        unpegged.species = Some("mango".to_string());
        assert!(!is_mature(&unpegged, 1200, &maturity));

        let mut nameless = tree;
        nameless.species = None;
        assert!(!is_mature(&nameless, 1200, &maturity));
    }
}
