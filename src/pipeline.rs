use tracing::{debug, warn};

use crate::boost::{merge_boosts, BoostedContribution};
use crate::dataset::{AmountColumn, BoostRecord, Contribution};
use crate::error::{Degenerate, QfError};
use crate::funding::{compute_funding, normalize, Distribution, RoundConfig};
use crate::outcome::{compare, Comparison, Side};

/// Everything a round produces, rebuilt from the inputs on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub boosted_contributions: Vec<BoostedContribution>,
    pub unboosted: Distribution,
    pub boosted: Distribution,
    pub comparison: Comparison,
    pub warnings: Vec<(Side, Degenerate)>,
}

/// Merge boosts, score and normalize both runs, then compare them.
///
/// The unboosted run scores raw amounts and the boosted run scores boosted
/// amounts; both count raw amounts as direct donations. Any error aborts
/// the round so that no partially populated results escape.
pub fn run_round(
    contributions: &[Contribution],
    boosts: &[BoostRecord],
    round: &RoundConfig,
) -> Result<RoundOutcome, QfError> {
    let boosted_contributions = merge_boosts(contributions, boosts, round.boost_coefficient)?;

    let unboosted = normalize(
        compute_funding(contributions, AmountColumn::Raw, round.mechanism)?,
        round,
    )?;
    let boosted = normalize(
        compute_funding(&boosted_contributions, AmountColumn::Boosted, round.mechanism)?,
        round,
    )?;

    let comparison = compare(&unboosted.rows, &boosted.rows, round.join)?;

    let mut warnings = Vec::new();
    if contributions.is_empty() {
        warn!("round has no contributions, results are empty");
        warnings.push((Side::Unboosted, Degenerate::EmptyContributions));
        warnings.push((Side::Boosted, Degenerate::EmptyContributions));
    }
    warnings.extend(unboosted.warnings.iter().cloned().map(|w| (Side::Unboosted, w)));
    warnings.extend(boosted.warnings.iter().cloned().map(|w| (Side::Boosted, w)));

    debug!(
        mechanism = %round.mechanism,
        projects = comparison.rows.len(),
        unmatched = comparison.unmatched.len(),
        warnings = warnings.len(),
        "round complete"
    );

    Ok(RoundOutcome {
        boosted_contributions,
        unboosted,
        boosted,
        comparison,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funding::Mechanism;
    use proptest::prelude::*;

    fn contribution(contributor: &str, project: &str, amount: f64) -> Contribution {
        Contribution {
            contributor_id: contributor.to_string(),
            project_name: project.to_string(),
            project_address: format!("0x{}", project),
            amount,
            project_id: project.to_string(),
        }
    }

    fn sample() -> Vec<Contribution> {
        vec![
            contribution("A", "P1", 10.0),
            contribution("B", "P1", 10.0),
            contribution("C", "P2", 100.0),
        ]
    }

    fn uncapped(pool: f64) -> RoundConfig {
        RoundConfig {
            mechanism: Mechanism::QuadraticFunding,
            matching_pool: pool,
            matching_percentage_cap: 1.0,
            boost_coefficient: 2.0,
            ..RoundConfig::default()
        }
    }

    fn boost(address: &str, total_boost: f64) -> BoostRecord {
        BoostRecord {
            contributor_address: address.to_string(),
            total_boost,
        }
    }

    #[test]
    fn test_end_to_end_without_boosts() {
        let outcome = run_round(&sample(), &[], &uncapped(100.0)).unwrap();

        let rows = &outcome.comparison.rows;
        assert_eq!(rows.len(), 2);
        let p1 = rows.iter().find(|r| r.project.name == "P1").unwrap();
        let p2 = rows.iter().find(|r| r.project.name == "P2").unwrap();

        assert!((p1.unboosted.funding_mechanism_score - 40.0).abs() < 1e-9);
        assert!((p1.unboosted.matching_funds - 100.0).abs() < 1e-9);
        assert!((p1.unboosted.total_funding - 120.0).abs() < 1e-9);
        assert!((p2.unboosted.total_funding - 100.0).abs() < 1e-9);

        // No boosts: both runs agree
        assert_eq!(p1.matching_funds_boost_pct, Some(0.0));
        assert_eq!(p2.matching_funds_boost_pct, None);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_boost_only_moves_touched_projects_scores() {
        let outcome = run_round(&sample(), &[boost("A", 1.0)], &uncapped(100.0)).unwrap();

        let a = &outcome.boosted_contributions[0];
        assert_eq!(a.boosted_amount, 30.0);

        let p1 = outcome.comparison.rows.iter().find(|r| r.project.name == "P1").unwrap();
        let p2 = outcome.comparison.rows.iter().find(|r| r.project.name == "P2").unwrap();

        // (sqrt(30) + sqrt(10))^2 = 40 + 2 * sqrt(300)
        let expected = 40.0 + 2.0 * 300f64.sqrt();
        assert!((p1.boosted.funding_mechanism_score - expected).abs() < 1e-9);
        assert_eq!(p1.boosted.direct_donations, 20.0);
        assert_eq!(
            p2.boosted.funding_mechanism_score,
            p2.unboosted.funding_mechanism_score
        );
        assert_eq!(p2.boosted.total_funding, p2.unboosted.total_funding);
    }

    #[test]
    fn test_empty_round() {
        let outcome = run_round(&[], &[boost("A", 1.0)], &RoundConfig::default()).unwrap();
        assert!(outcome.comparison.rows.is_empty());
        assert!(outcome
            .warnings
            .contains(&(Side::Unboosted, Degenerate::EmptyContributions)));
    }

    #[test]
    fn test_negative_boost_aborts_round() {
        // coefficient 1 + 2 * -1 = -1 makes the boosted amount negative
        let err = run_round(&sample(), &[boost("A", -1.0)], &uncapped(100.0)).unwrap_err();
        assert!(matches!(err, QfError::NegativeAmount { .. }));
    }

    #[test]
    fn test_duplicate_boost_aborts_round() {
        let contributions = vec![contribution("A", "P1", 10.0)];
        let err = run_round(
            &contributions,
            &[boost("A", 1.0), boost("A", 5.0)],
            &RoundConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, QfError::DuplicateBoost("A".to_string()));
    }

    #[test]
    fn test_warnings_are_tagged_by_side() {
        let outcome = run_round(&sample(), &[], &uncapped(0.0)).unwrap();
        assert!(outcome.warnings.contains(&(Side::Unboosted, Degenerate::ZeroMatchingPool)));
        assert!(outcome.warnings.contains(&(Side::Boosted, Degenerate::ZeroMatchingPool)));
    }

    #[test]
    fn test_cluster_mapping_round() {
        let config = RoundConfig {
            mechanism: Mechanism::ClusterMapping,
            ..uncapped(100.0)
        };
        let outcome = run_round(&sample(), &[boost("B", 0.5)], &config).unwrap();
        assert_eq!(outcome.comparison.rows.len(), 2);
        assert!((outcome.boosted.allocated_share() - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn round_is_idempotent(
            amounts in prop::collection::vec(0.0f64..1_000.0, 1..25),
            boosted in prop::collection::vec(0.0f64..3.0, 0..10),
            cap in 0.05f64..=1.0,
        ) {
            let contributions: Vec<_> = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| contribution(&format!("c{}", i % 7), &format!("P{}", i % 4), *a))
                .collect();
            let boosts: Vec<_> = boosted
                .iter()
                .enumerate()
                .map(|(i, b)| boost(&format!("c{}", i), *b))
                .collect();
            let config = RoundConfig {
                matching_percentage_cap: cap,
                ..RoundConfig::default()
            };

            let first = run_round(&contributions, &boosts, &config).unwrap();
            let second = run_round(&contributions, &boosts, &config).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
