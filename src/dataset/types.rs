use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a project: rows are grouped by name and payout address together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectKey {
    pub name: String,
    pub address: String,
}

impl ProjectKey {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// A single contribution as supplied by the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub contributor_id: String,
    pub project_name: String,
    pub project_address: String,
    pub amount: f64, // currency units, non-negative
    pub project_id: String,
}

impl Contribution {
    pub fn project_key(&self) -> ProjectKey {
        ProjectKey::new(&self.project_name, &self.project_address)
    }
}

/// Aggregate boost score for one contributor. Absence means no boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostRecord {
    pub contributor_address: String,
    pub total_boost: f64,
}

/// Which amount a mechanism should score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountColumn {
    Raw,
    Boosted,
}

/// Anything that can be fed to the funding engine.
///
/// `Contribution` has no boosted column and answers `Boosted` with its raw amount.
pub trait ContributionRecord {
    fn contribution(&self) -> &Contribution;

    fn amount(&self, column: AmountColumn) -> f64;

    fn project_key(&self) -> ProjectKey {
        self.contribution().project_key()
    }

    fn contributor(&self) -> &str {
        &self.contribution().contributor_id
    }

    fn raw_amount(&self) -> f64 {
        self.contribution().amount
    }
}

impl ContributionRecord for Contribution {
    fn contribution(&self) -> &Contribution {
        self
    }

    fn amount(&self, _column: AmountColumn) -> f64 {
        self.amount
    }
}
