use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use super::Side;
use crate::dataset::ProjectKey;
use crate::error::QfError;
use crate::funding::{JoinPolicy, ProjectFundingRow};

/// One project's unboosted and boosted outcome side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsRow {
    pub project: ProjectKey,
    pub unboosted: ProjectFundingRow,
    pub boosted: ProjectFundingRow,
    /// None when the unboosted matching funds are zero.
    pub matching_funds_boost_pct: Option<f64>,
    /// None when the unboosted total funding is zero.
    pub total_funding_boost_pct: Option<f64>,
}

/// A project that only one of the two outcomes produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedProject {
    pub project: ProjectKey,
    pub present_in: Side,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Comparison {
    pub rows: Vec<ResultsRow>,
    pub unmatched: Vec<UnmatchedProject>,
}

/// Join two outcomes on project key and compute the boost percentages.
///
/// Rows follow the order of `unboosted`. Projects missing from either side
/// are dropped and listed in `unmatched` under `JoinPolicy::Inner`, and fail
/// the comparison under `JoinPolicy::Strict`.
pub fn compare(
    unboosted: &[ProjectFundingRow],
    boosted: &[ProjectFundingRow],
    join: JoinPolicy,
) -> Result<Comparison, QfError> {
    let boosted_by_key: HashMap<&ProjectKey, &ProjectFundingRow> =
        boosted.iter().map(|r| (&r.project, r)).collect();
    let unboosted_by_key: HashMap<&ProjectKey, &ProjectFundingRow> =
        unboosted.iter().map(|r| (&r.project, r)).collect();

    let mut comparison = Comparison::default();

    for before in unboosted {
        match boosted_by_key.get(&before.project) {
            Some(after) => comparison.rows.push(ResultsRow {
                project: before.project.clone(),
                unboosted: before.clone(),
                boosted: (*after).clone(),
                matching_funds_boost_pct: boost_percentage(
                    before.matching_funds,
                    after.matching_funds,
                ),
                total_funding_boost_pct: boost_percentage(
                    before.total_funding,
                    after.total_funding,
                ),
            }),
            None => comparison.unmatched.push(UnmatchedProject {
                project: before.project.clone(),
                present_in: Side::Unboosted,
            }),
        }
    }

    for after in boosted {
        if !unboosted_by_key.contains_key(&after.project) {
            comparison.unmatched.push(UnmatchedProject {
                project: after.project.clone(),
                present_in: Side::Boosted,
            });
        }
    }

    if let Some(first) = comparison.unmatched.first() {
        if join == JoinPolicy::Strict {
            return Err(QfError::JoinMismatch {
                project: first.project.to_string(),
                side: first.present_in,
            });
        }
        for u in &comparison.unmatched {
            warn!(project = %u.project, side = %u.present_in, "project dropped from comparison");
        }
    }

    Ok(comparison)
}

/// Percentage change from `before` to `after`, ratio rounded to four places.
pub fn boost_percentage(before: f64, after: f64) -> Option<f64> {
    if before == 0.0 {
        return None;
    }
    let ratio = (after - before) / before;
    if !ratio.is_finite() {
        return None;
    }
    Some(100.0 * (ratio * 10_000.0).round() / 10_000.0)
}
