pub mod compare;
pub mod stats;

use serde::Serialize;
use std::fmt;

pub use compare::{boost_percentage, compare, Comparison, ResultsRow, UnmatchedProject};
pub use stats::{contributor_stats, project_stats, ContributorStats, ProjectStats};

/// Which of the two funding runs something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Unboosted,
    Boosted,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Unboosted => f.write_str("unboosted"),
            Side::Boosted => f.write_str("boosted"),
        }
    }
}
