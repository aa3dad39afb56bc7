use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use super::mechanism::Mechanism;
use crate::dataset::{AmountColumn, ContributionRecord, ProjectKey};
use crate::error::QfError;

/// Funding outcome for one project.
///
/// `compute_funding` fills the first three fields; the matching fields are
/// zero until the row has been through `distribution::normalize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectFundingRow {
    pub project: ProjectKey,
    /// Sum of raw amounts, whatever column is scored
    pub direct_donations: f64,
    pub funding_mechanism_score: f64,
    /// Score minus direct donations, may be negative
    pub matching_funding: f64,
    /// Capped share of the pool
    pub matching_distribution: f64,
    pub matching_funds: f64,
    pub total_funding: f64,
}

impl ProjectFundingRow {
    fn scored(project: ProjectKey, direct_donations: f64, funding_mechanism_score: f64) -> Self {
        Self {
            project,
            direct_donations,
            funding_mechanism_score,
            matching_funding: 0.0,
            matching_distribution: 0.0,
            matching_funds: 0.0,
            total_funding: 0.0,
        }
    }
}

#[derive(Default)]
struct ProjectAggregate {
    direct: f64,
    scored: f64,
    sqrt_sum: f64,
}

/// Score every project under `mechanism`, using `column` for the scored amount.
///
/// Rows are sorted by score descending, ties broken by project key so that
/// repeated runs produce identical tables. An empty input yields no rows.
pub fn compute_funding<C: ContributionRecord>(
    contributions: &[C],
    column: AmountColumn,
    mechanism: Mechanism,
) -> Result<Vec<ProjectFundingRow>, QfError> {
    let mut projects: BTreeMap<ProjectKey, ProjectAggregate> = BTreeMap::new();

    for c in contributions {
        let raw = checked_amount(c, c.raw_amount())?;
        let amount = checked_amount(c, c.amount(column))?;

        let entry = projects.entry(c.project_key()).or_default();
        entry.direct += raw;
        entry.scored += amount;
        entry.sqrt_sum += amount.sqrt();
    }

    let clustered = match mechanism {
        Mechanism::ClusterMapping => Some(cluster_match(contributions, column)?),
        _ => None,
    };

    let mut rows = Vec::with_capacity(projects.len());
    for (key, agg) in projects {
        let score = match mechanism {
            Mechanism::DirectDonations => 2.0 * agg.scored,
            Mechanism::QuadraticFunding => agg.sqrt_sum * agg.sqrt_sum,
            Mechanism::ClusterMapping => clustered
                .as_ref()
                .and_then(|scores| scores.get(&key).copied())
                .unwrap_or(0.0),
        };

        if !score.is_finite() {
            return Err(QfError::NonFinite {
                quantity: "funding mechanism score",
                project: key.to_string(),
            });
        }
        rows.push(ProjectFundingRow::scored(key, agg.direct, score));
    }

    rows.sort_by(|a, b| {
        b.funding_mechanism_score
            .total_cmp(&a.funding_mechanism_score)
            .then_with(|| a.project.cmp(&b.project))
    });

    debug!(
        mechanism = %mechanism,
        contributions = contributions.len(),
        projects = rows.len(),
        "scored projects"
    );

    Ok(rows)
}

/// Cluster-matched score per project.
///
/// Contributors with the same set of funded projects form one cluster. Each
/// cluster's per-project total is square-rooted before the usual
/// sum-then-square, so one donation profile split over many addresses earns
/// no more than a single address would. Repeated contributions from one
/// contributor to one project are averaged into a single pivot cell.
pub fn cluster_match<C: ContributionRecord>(
    contributions: &[C],
    column: AmountColumn,
) -> Result<BTreeMap<ProjectKey, f64>, QfError> {
    let projects: Vec<ProjectKey> = contributions
        .iter()
        .map(|c| c.project_key())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: HashMap<&ProjectKey, usize> =
        projects.iter().enumerate().map(|(i, p)| (p, i)).collect();

    // contributor x project matrix of (sum, count) cells
    let mut cells: BTreeMap<&str, Vec<(f64, usize)>> = BTreeMap::new();
    for c in contributions {
        let amount = checked_amount(c, c.amount(column))?;
        let row = cells
            .entry(c.contributor())
            .or_insert_with(|| vec![(0.0, 0); projects.len()]);
        if let Some(&j) = index.get(&c.project_key()) {
            row[j].0 += amount;
            row[j].1 += 1;
        }
    }

    let mut clusters: BTreeMap<Vec<bool>, Vec<f64>> = BTreeMap::new();
    for row in cells.values() {
        let pivot: Vec<f64> = row
            .iter()
            .map(|&(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
            .collect();
        let signature: Vec<bool> = pivot.iter().map(|a| *a > 0.0).collect();
        let sums = clusters
            .entry(signature)
            .or_insert_with(|| vec![0.0; projects.len()]);
        for (sum, amount) in sums.iter_mut().zip(&pivot) {
            *sum += amount;
        }
    }

    let mut sqrt_sums = vec![0.0; projects.len()];
    for sums in clusters.values() {
        for (acc, sum) in sqrt_sums.iter_mut().zip(sums) {
            *acc += sum.sqrt();
        }
    }

    debug!(
        contributors = cells.len(),
        clusters = clusters.len(),
        "built donation profile clusters"
    );

    Ok(projects
        .into_iter()
        .zip(sqrt_sums)
        .map(|(p, s)| (p, s * s))
        .collect())
}

fn checked_amount<C: ContributionRecord>(c: &C, amount: f64) -> Result<f64, QfError> {
    if !amount.is_finite() {
        return Err(QfError::NonFinite {
            quantity: "contribution amount",
            project: c.project_key().to_string(),
        });
    }
    if amount < 0.0 {
        return Err(QfError::NegativeAmount {
            contributor: c.contributor().to_string(),
            project: c.project_key().to_string(),
            amount,
        });
    }
    Ok(amount)
}
