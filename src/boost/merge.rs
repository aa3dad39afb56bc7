use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::dataset::{AmountColumn, BoostRecord, Contribution, ContributionRecord};
use crate::error::QfError;

/// A contribution weighted by its contributor's boost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostedContribution {
    pub contribution: Contribution,
    /// 0 when the contributor has no boost record
    pub total_boost: f64,
    pub has_boost_record: bool,
    /// 1 + boost_weight * total_boost
    pub boost_coefficient: f64,
    pub boosted_amount: f64,
}

impl ContributionRecord for BoostedContribution {
    fn contribution(&self) -> &Contribution {
        &self.contribution
    }

    fn amount(&self, column: AmountColumn) -> f64 {
        match column {
            AmountColumn::Raw => self.contribution.amount,
            AmountColumn::Boosted => self.boosted_amount,
        }
    }
}

/// Left-join boost records onto contributions by contributor identity.
///
/// Every contribution is kept; contributors without a record get a boost of
/// zero and therefore a coefficient of 1. The result is rebuilt from scratch
/// on every call. A contributor with more than one boost record is an error.
pub fn merge_boosts(
    contributions: &[Contribution],
    boosts: &[BoostRecord],
    boost_weight: f64,
) -> Result<Vec<BoostedContribution>, QfError> {
    let mut by_address: HashMap<&str, f64> = HashMap::with_capacity(boosts.len());
    for b in boosts {
        if by_address
            .insert(b.contributor_address.as_str(), b.total_boost)
            .is_some()
        {
            return Err(QfError::DuplicateBoost(b.contributor_address.clone()));
        }
    }

    let merged: Vec<BoostedContribution> = contributions
        .iter()
        .map(|c| {
            let record = by_address.get(c.contributor_id.as_str()).copied();
            let total_boost = record.unwrap_or(0.0);
            let boost_coefficient = 1.0 + boost_weight * total_boost;
            BoostedContribution {
                contribution: c.clone(),
                total_boost,
                has_boost_record: record.is_some(),
                boost_coefficient,
                boosted_amount: boost_coefficient * c.amount,
            }
        })
        .collect();

    debug!(
        contributions = merged.len(),
        boosted = merged.iter().filter(|b| b.has_boost_record).count(),
        boost_weight,
        "merged boosts into contributions"
    );

    Ok(merged)
}
