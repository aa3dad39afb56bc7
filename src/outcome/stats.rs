use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::boost::BoostedContribution;
use crate::dataset::{AmountColumn, ContributionRecord, ProjectKey};

/// Per-project contribution statistics, overall and for boosted contributors.
///
/// A boosted contributor is one with a boost record, whatever its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub project: ProjectKey,
    pub contributor_count: usize,
    pub contributor_share: f64,
    pub total: f64,
    pub total_share: f64,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub max_contributor: String,
    pub boosted_contributor_count: usize,
    pub boosted_contributor_share: f64,
    pub boosted_total: f64,
    pub boosted_total_share: f64,
    pub boosted_mean: Option<f64>,
    pub boosted_median: Option<f64>,
    pub boosted_max: Option<f64>,
}

/// Per-contributor statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorStats {
    pub contributor_id: String,
    pub project_count: usize,
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub max_project: ProjectKey,
}

/// Statistics for every project, ordered by project key.
pub fn project_stats(
    contributions: &[BoostedContribution],
    column: AmountColumn,
) -> Vec<ProjectStats> {
    let all_contributors: HashSet<&str> = contributions.iter().map(|c| c.contributor()).collect();
    let all_boosted: HashSet<&str> = contributions
        .iter()
        .filter(|c| c.has_boost_record)
        .map(|c| c.contributor())
        .collect();
    let grand_total: f64 = contributions.iter().map(|c| c.amount(column)).sum();
    let boosted_grand_total: f64 = contributions
        .iter()
        .filter(|c| c.has_boost_record)
        .map(|c| c.amount(column))
        .sum();

    let mut groups: BTreeMap<ProjectKey, Vec<&BoostedContribution>> = BTreeMap::new();
    for c in contributions {
        groups.entry(c.project_key()).or_default().push(c);
    }

    groups
        .into_iter()
        .map(|(project, group)| {
            let amounts: Vec<f64> = group.iter().map(|c| c.amount(column)).collect();
            let contributors: HashSet<&str> = group.iter().map(|c| c.contributor()).collect();
            let total: f64 = amounts.iter().sum();

            let (max, max_contributor) = group
                .iter()
                .fold((f64::NEG_INFINITY, ""), |(best, who), c| {
                    let amount = c.amount(column);
                    if amount > best {
                        (amount, c.contributor())
                    } else {
                        (best, who)
                    }
                });

            let boosted: Vec<&&BoostedContribution> =
                group.iter().filter(|c| c.has_boost_record).collect();
            let boosted_amounts: Vec<f64> = boosted.iter().map(|c| c.amount(column)).collect();
            let boosted_contributors: HashSet<&str> =
                boosted.iter().map(|c| c.contributor()).collect();
            let boosted_total: f64 = boosted_amounts.iter().sum();

            ProjectStats {
                project,
                contributor_count: contributors.len(),
                contributor_share: share(contributors.len() as f64, all_contributors.len() as f64),
                total,
                total_share: share(total, grand_total),
                mean: total / amounts.len() as f64,
                median: median(&amounts).unwrap_or(0.0),
                max,
                max_contributor: max_contributor.to_string(),
                boosted_contributor_count: boosted_contributors.len(),
                boosted_contributor_share: share(
                    boosted_contributors.len() as f64,
                    all_boosted.len() as f64,
                ),
                boosted_total,
                boosted_total_share: share(boosted_total, boosted_grand_total),
                boosted_mean: (!boosted_amounts.is_empty())
                    .then(|| boosted_total / boosted_amounts.len() as f64),
                boosted_median: median(&boosted_amounts),
                boosted_max: boosted_amounts.iter().copied().reduce(f64::max),
            }
        })
        .collect()
}

/// Statistics for every contributor, largest total first.
pub fn contributor_stats(
    contributions: &[BoostedContribution],
    column: AmountColumn,
) -> Vec<ContributorStats> {
    let mut groups: BTreeMap<&str, Vec<&BoostedContribution>> = BTreeMap::new();
    for c in contributions {
        groups.entry(c.contributor()).or_default().push(c);
    }

    let mut stats: Vec<ContributorStats> = groups
        .into_iter()
        .filter_map(|(contributor, group)| {
            let amounts: Vec<f64> = group.iter().map(|c| c.amount(column)).collect();
            let projects: HashSet<ProjectKey> = group.iter().map(|c| c.project_key()).collect();
            let total: f64 = amounts.iter().sum();
            let top = group
                .iter()
                .copied()
                .reduce(|best, c| if c.amount(column) > best.amount(column) { c } else { best })?;

            Some(ContributorStats {
                contributor_id: contributor.to_string(),
                project_count: projects.len(),
                total,
                mean: total / amounts.len() as f64,
                median: median(&amounts).unwrap_or(0.0),
                max: top.amount(column),
                max_project: top.project_key(),
            })
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.contributor_id.cmp(&b.contributor_id))
    });
    stats
}

fn share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
