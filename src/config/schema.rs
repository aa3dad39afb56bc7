use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dataset::{BoostColumns, ContributionColumns};
use crate::funding::RoundConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub round: RoundConfig,
}

/// Where the round's tables live and what their headers are called.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    /// Contribution table (.csv or .json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<PathBuf>,

    /// Boost table; absent means nobody is boosted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosts: Option<PathBuf>,

    #[serde(default)]
    pub contribution_columns: ContributionColumns,

    #[serde(default)]
    pub boost_columns: BoostColumns,
}

impl InputsConfig {
    /// Resolve relative input paths against `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &std::path::Path) {
        for path in [&mut self.contributions, &mut self.boosts].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
