//! Seasonal maintenance interval table.
//!
//! Watering a three-month-old sapling in the dry season is a different job
//! from watering a three-year-old tree in the rains, so every activity's
//! cadence depends on the season and the tree's age. `intervals` is a pure,
//! total lookup: every (activity, age, season) combination has an answer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::Activity;

/// Season selected for schedule computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Rainy,
    Dry,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Rainy => write!(f, "rainy"),
            Season::Dry => write!(f, "dry"),
        }
    }
}

impl FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "rainy" | "wet" => Ok(Season::Rainy),
            "dry" => Ok(Season::Dry),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid season '{}'. Expected: rainy, dry",
                s
            ))),
        }
    }
}

/// Cadence for one (activity, age, season) cell: days until the first cycle
/// after the lifecycle start, and days between repeat cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Intervals {
    pub first_days: i64,
    pub repeat_days: i64,
}

/// Look up the maintenance cadence for an activity at a given tree age.
pub fn intervals(activity: Activity, age_days: i64, season: Season) -> Intervals {
    match (activity, season) {
        // Young trees need frequent watering; established roots can go
        // longer between rounds.
        (Activity::Watering, Season::Rainy) => Intervals {
            first_days: 0,
            repeat_days: if age_days >= 90 { 21 } else { 14 },
        },
        (Activity::Watering, Season::Dry) => Intervals {
            first_days: 0,
            repeat_days: if age_days >= 90 { 7 } else { 5 },
        },

        (Activity::Weeding, Season::Rainy) => {
            if age_days < 365 {
                Intervals {
                    first_days: 21,
                    repeat_days: 45,
                }
            } else if age_days < 730 {
                Intervals {
                    first_days: 30,
                    repeat_days: 90,
                }
            } else {
                Intervals {
                    first_days: 30,
                    repeat_days: 150,
                }
            }
        }
        (Activity::Weeding, Season::Dry) => {
            if age_days < 365 {
                Intervals {
                    first_days: 35,
                    repeat_days: 90,
                }
            } else if age_days < 730 {
                Intervals {
                    first_days: 45,
                    repeat_days: 150,
                }
            } else {
                Intervals {
                    first_days: 45,
                    repeat_days: 210,
                }
            }
        }

        (Activity::Protection, Season::Rainy) => Intervals {
            first_days: 0,
            repeat_days: 45,
        },
        (Activity::Protection, Season::Dry) => Intervals {
            first_days: 0,
            repeat_days: 21,
        },

        (Activity::Inspection, Season::Rainy) => Intervals {
            first_days: 14,
            repeat_days: if age_days < 180 { 30 } else { 90 },
        },
        (Activity::Inspection, Season::Dry) => Intervals {
            first_days: 7,
            repeat_days: if age_days < 180 { 21 } else { 60 },
        },

        (Activity::Replacement, Season::Rainy) => Intervals {
            first_days: 42,
            repeat_days: 180,
        },
        (Activity::Replacement, Season::Dry) => Intervals {
            first_days: 56,
            repeat_days: 210,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watering_repeat_widens_after_ninety_days() {
        assert_eq!(
            intervals(Activity::Watering, 10, Season::Rainy).repeat_days,
            14
        );
        assert_eq!(
            intervals(Activity::Watering, 100, Season::Rainy).repeat_days,
            21
        );
        assert_eq!(intervals(Activity::Watering, 10, Season::Dry).repeat_days, 5);
        assert_eq!(intervals(Activity::Watering, 90, Season::Dry).repeat_days, 7);
    }

    #[test]
    fn weeding_age_bands() {
        assert_eq!(
            intervals(Activity::Weeding, 100, Season::Rainy),
            Intervals {
                first_days: 21,
                repeat_days: 45
            }
        );
        assert_eq!(
            intervals(Activity::Weeding, 400, Season::Rainy),
            Intervals {
                first_days: 30,
                repeat_days: 90
            }
        );
        assert_eq!(
            intervals(Activity::Weeding, 800, Season::Rainy),
            Intervals {
                first_days: 30,
                repeat_days: 150
            }
        );
        // Dry season, mature band: repeat stretches to 210 days.
        assert_eq!(
            intervals(Activity::Weeding, 800, Season::Dry),
            Intervals {
                first_days: 45,
                repeat_days: 210
            }
        );
    }

    #[test]
    fn inspection_tightens_for_young_trees() {
        assert_eq!(
            intervals(Activity::Inspection, 100, Season::Rainy),
            Intervals {
                first_days: 14,
                repeat_days: 30
            }
        );
        assert_eq!(
            intervals(Activity::Inspection, 200, Season::Rainy),
            Intervals {
                first_days: 14,
                repeat_days: 90
            }
        );
        assert_eq!(
            intervals(Activity::Inspection, 100, Season::Dry),
            Intervals {
                first_days: 7,
                repeat_days: 21
            }
        );
        assert_eq!(
            intervals(Activity::Inspection, 200, Season::Dry),
            Intervals {
                first_days: 7,
                repeat_days: 60
            }
        );
    }

    #[test]
    fn protection_and_replacement_fixed_bands() {
        assert_eq!(
            intervals(Activity::Protection, 500, Season::Rainy).repeat_days,
            45
        );
        assert_eq!(
            intervals(Activity::Protection, 500, Season::Dry).repeat_days,
            21
        );
        assert_eq!(
            intervals(Activity::Replacement, 0, Season::Rainy),
            Intervals {
                first_days: 42,
                repeat_days: 180
            }
        );
        assert_eq!(
            intervals(Activity::Replacement, 0, Season::Dry),
            Intervals {
                first_days: 56,
                repeat_days: 210
            }
        );
    }

    #[test]
    fn season_parsing() {
        assert_eq!("Rainy".parse::<Season>().unwrap(), Season::Rainy);
        assert_eq!("wet".parse::<Season>().unwrap(), Season::Rainy);
        assert_eq!("dry".parse::<Season>().unwrap(), Season::Dry);
        assert!("monsoon".parse::<Season>().is_err());
    }
}
