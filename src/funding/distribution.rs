//! Turns raw mechanism scores into a capped share of the matching pool.
//!
//! The share of each project is its matching funding (score minus direct
//! donations) over the total matching funding. No share may exceed the cap;
//! whatever is clamped off is handed to the uncapped projects in proportion
//! to their current share. Because that rescale can lift a project over the
//! cap, the clamp is applied again afterwards, either once (`TwoPass`) or
//! until nothing exceeds the cap (`Iterative`).

use tracing::{debug, warn};

use super::config::{NegativeMatching, Redistribution, RoundConfig};
use super::engine::ProjectFundingRow;
use crate::error::{Degenerate, QfError};

/// Normalized rows plus every degenerate condition met along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub rows: Vec<ProjectFundingRow>,
    pub warnings: Vec<Degenerate>,
}

impl Distribution {
    /// Sum of all matching shares; 1 unless a degenerate policy kicked in.
    pub fn allocated_share(&self) -> f64 {
        self.rows.iter().map(|r| r.matching_distribution).sum()
    }
}

/// Fill the matching fields of `rows` for the round's pool and cap.
pub fn normalize(
    mut rows: Vec<ProjectFundingRow>,
    round: &RoundConfig,
) -> Result<Distribution, QfError> {
    let mut warnings = Vec::new();

    for row in rows.iter_mut() {
        let matching = row.funding_mechanism_score - row.direct_donations;
        row.matching_funding = match round.negative_matching {
            NegativeMatching::Allow => matching,
            NegativeMatching::Floor => matching.max(0.0),
        };
    }

    if rows.is_empty() {
        return Ok(Distribution { rows, warnings });
    }

    let total: f64 = rows.iter().map(|r| r.matching_funding).sum();
    let mut shares: Vec<f64> = if total > 0.0 {
        rows.iter().map(|r| r.matching_funding / total).collect()
    } else {
        warnings.push(Degenerate::NonPositiveMatchingTotal { total });
        vec![0.0; rows.len()]
    };

    if let Some(degenerate) =
        cap_distribution(&mut shares, round.matching_percentage_cap, round.redistribution)
    {
        warnings.push(degenerate);
    }

    if round.matching_pool == 0.0 {
        warnings.push(Degenerate::ZeroMatchingPool);
    }

    for (row, share) in rows.iter_mut().zip(shares) {
        row.matching_distribution = share;
        row.matching_funds = share * round.matching_pool;
        row.total_funding = row.matching_funds + row.direct_donations;

        if !row.matching_funds.is_finite() || !row.total_funding.is_finite() {
            return Err(QfError::NonFinite {
                quantity: "matching funds",
                project: row.project.to_string(),
            });
        }
    }

    for w in &warnings {
        warn!(warning = %w, "degenerate matching distribution");
    }

    let distribution = Distribution { rows, warnings };
    debug!(
        projects = distribution.rows.len(),
        allocated = distribution.allocated_share(),
        "normalized matching distribution"
    );
    Ok(distribution)
}

/// Clamp `shares` to `cap` and redistribute the excess over uncapped entries.
///
/// An entry counts as capped once it is at or above `cap`. Returns
/// `AllCapped` when something had to be clamped but no uncapped mass is
/// left to absorb the excess; capped entries then stay at `cap` and the
/// rest of the pool is left unallocated. `TwoPass` returns `UnderAllocated`
/// when its second clamp cuts shares, since nothing takes up that excess.
pub fn cap_distribution(shares: &mut [f64], cap: f64, mode: Redistribution) -> Option<Degenerate> {
    loop {
        if !clamp(shares, cap) {
            return None;
        }

        let capped: f64 = shares.iter().filter(|s| **s >= cap).sum();
        let uncapped: f64 = shares.iter().filter(|s| **s < cap).sum();

        if uncapped <= 0.0 {
            let allocated: f64 = shares.iter().sum();
            return Some(Degenerate::AllCapped {
                unallocated_share: 1.0 - allocated,
            });
        }

        let scale = (1.0 - capped) / uncapped;
        for s in shares.iter_mut().filter(|s| **s < cap) {
            *s *= scale;
        }

        if mode == Redistribution::TwoPass {
            if !clamp(shares, cap) {
                return None;
            }
            let allocated: f64 = shares.iter().sum();
            return Some(Degenerate::UnderAllocated {
                unallocated_share: 1.0 - allocated,
            });
        }
    }
}

/// Returns true if any entry was above the cap.
fn clamp(shares: &mut [f64], cap: f64) -> bool {
    let mut clamped = false;
    for s in shares.iter_mut() {
        if *s > cap {
            *s = cap;
            clamped = true;
        }
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ProjectKey;
    use proptest::prelude::*;

    fn row(name: &str, score: f64, direct: f64) -> ProjectFundingRow {
        ProjectFundingRow {
            project: ProjectKey::new(name, format!("0x{}", name)),
            direct_donations: direct,
            funding_mechanism_score: score,
            matching_funding: 0.0,
            matching_distribution: 0.0,
            matching_funds: 0.0,
            total_funding: 0.0,
        }
    }

    fn round(pool: f64, cap: f64) -> RoundConfig {
        RoundConfig {
            matching_pool: pool,
            matching_percentage_cap: cap,
            ..RoundConfig::default()
        }
    }

    #[test]
    fn test_uncapped_example() {
        let rows = vec![row("P2", 100.0, 100.0), row("P1", 40.0, 20.0)];
        let dist = normalize(rows, &round(100.0, 1.0)).unwrap();

        let p2 = &dist.rows[0];
        let p1 = &dist.rows[1];
        assert!((p1.matching_funding - 20.0).abs() < 1e-9);
        assert_eq!(p2.matching_funding, 0.0);
        assert!((p1.matching_distribution - 1.0).abs() < 1e-9);
        assert_eq!(p2.matching_distribution, 0.0);
        assert!((p1.matching_funds - 100.0).abs() < 1e-9);
        assert!((p1.total_funding - 120.0).abs() < 1e-9);
        assert!((p2.total_funding - 100.0).abs() < 1e-9);
        assert!(dist.warnings.is_empty());
    }

    #[test]
    fn test_iterative_redistribution_reaches_full_allocation() {
        let mut shares = vec![0.5, 0.3, 0.2];
        let result = cap_distribution(&mut shares, 0.35, Redistribution::Iterative);

        assert!(result.is_none());
        assert!((shares[0] - 0.35).abs() < 1e-12);
        assert!((shares[1] - 0.35).abs() < 1e-12);
        assert!((shares[2] - 0.30).abs() < 1e-12);
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_pass_stops_after_second_clamp() {
        // rescale lifts 0.3 to 0.39, which the second clamp cuts back to 0.35
        let mut shares = vec![0.5, 0.3, 0.2];
        let result = cap_distribution(&mut shares, 0.35, Redistribution::TwoPass);

        assert!((shares[0] - 0.35).abs() < 1e-12);
        assert!((shares[1] - 0.35).abs() < 1e-12);
        assert!((shares[2] - 0.26).abs() < 1e-12);
        match result {
            Some(Degenerate::UnderAllocated { unallocated_share }) => {
                assert!((unallocated_share - 0.04).abs() < 1e-12)
            }
            other => panic!("expected UnderAllocated, got {:?}", other),
        }
    }

    #[test]
    fn test_two_pass_without_second_clamp_is_fully_allocated() {
        // 0.6 -> 0.5, rescale lifts 0.2 each to 0.25, still under the cap
        let mut shares = vec![0.6, 0.2, 0.2];
        let result = cap_distribution(&mut shares, 0.5, Redistribution::TwoPass);

        assert!(result.is_none());
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_pass_under_allocation_reaches_normalize() {
        let rows = vec![row("A", 60.0, 10.0), row("B", 40.0, 10.0), row("C", 30.0, 10.0)];
        let config = RoundConfig {
            redistribution: Redistribution::TwoPass,
            ..round(1_000.0, 0.35)
        };
        let dist = normalize(rows, &config).unwrap();

        assert!((dist.allocated_share() - 0.96).abs() < 1e-9);
        assert!(matches!(
            dist.warnings.as_slice(),
            [Degenerate::UnderAllocated { .. }]
        ));
    }

    #[test]
    fn test_nothing_over_cap_is_untouched() {
        let mut shares = vec![0.2, 0.2, 0.6];
        assert!(cap_distribution(&mut shares, 0.6, Redistribution::Iterative).is_none());
        assert_eq!(shares, vec![0.2, 0.2, 0.6]);
    }

    #[test]
    fn test_all_capped_skips_redistribution() {
        let mut shares = vec![0.5, 0.5];
        let result = cap_distribution(&mut shares, 0.2, Redistribution::Iterative);

        assert_eq!(shares, vec![0.2, 0.2]);
        match result {
            Some(Degenerate::AllCapped { unallocated_share }) => {
                assert!((unallocated_share - 0.6).abs() < 1e-12)
            }
            other => panic!("expected AllCapped, got {:?}", other),
        }
    }

    #[test]
    fn test_no_uncapped_mass_left() {
        let mut shares = vec![1.0, 0.0, 0.0];
        let result = cap_distribution(&mut shares, 0.5, Redistribution::Iterative);
        assert_eq!(shares, vec![0.5, 0.0, 0.0]);
        assert!(matches!(result, Some(Degenerate::AllCapped { .. })));
    }

    #[test]
    fn test_capped_rows_through_normalize() {
        let rows = vec![row("A", 60.0, 10.0), row("B", 40.0, 10.0), row("C", 30.0, 10.0)];
        // matching funding 50, 30, 20 -> shares 0.5, 0.3, 0.2
        let dist = normalize(rows, &round(1_000.0, 0.35)).unwrap();

        assert!((dist.allocated_share() - 1.0).abs() < 1e-9);
        assert!((dist.rows[0].matching_funds - 350.0).abs() < 1e-6);
        assert!((dist.rows[2].matching_funds - 300.0).abs() < 1e-6);
        assert!((dist.rows[2].total_funding - 310.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_matching_pool() {
        let rows = vec![row("A", 40.0, 20.0)];
        let dist = normalize(rows, &round(0.0, 1.0)).unwrap();
        assert_eq!(dist.rows[0].matching_funds, 0.0);
        assert_eq!(dist.rows[0].total_funding, 20.0);
        assert!(dist.warnings.contains(&Degenerate::ZeroMatchingPool));
    }

    #[test]
    fn test_no_matching_demand_zero_fills() {
        // single contributor per project: score == direct donations
        let rows = vec![row("A", 10.0, 10.0), row("B", 5.0, 5.0)];
        let dist = normalize(rows, &round(100.0, 0.5)).unwrap();

        assert!(dist.rows.iter().all(|r| r.matching_distribution == 0.0));
        assert!(dist.rows.iter().all(|r| r.matching_funds == 0.0));
        assert_eq!(
            dist.warnings,
            vec![Degenerate::NonPositiveMatchingTotal { total: 0.0 }]
        );
    }

    #[test]
    fn test_empty_rows() {
        let dist = normalize(vec![], &round(100.0, 0.2)).unwrap();
        assert!(dist.rows.is_empty());
        assert!(dist.warnings.is_empty());
    }

    #[test]
    fn test_negative_matching_allowed() {
        let rows = vec![row("A", 70.0, 10.0), row("B", 60.0, 10.0), row("C", 0.0, 10.0)];
        // matching funding 60, 50, -10 -> total 100
        let dist = normalize(rows, &round(100.0, 1.0)).unwrap();
        let c = &dist.rows[2];
        assert!((c.matching_distribution + 0.1).abs() < 1e-12);
        assert!((c.matching_funds + 10.0).abs() < 1e-9);
        assert!((c.total_funding - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_matching_floored() {
        let rows = vec![row("A", 70.0, 10.0), row("B", 60.0, 10.0), row("C", 0.0, 10.0)];
        let config = RoundConfig {
            negative_matching: NegativeMatching::Floor,
            ..round(110.0, 1.0)
        };
        let dist = normalize(rows, &config).unwrap();

        assert_eq!(dist.rows[2].matching_funding, 0.0);
        assert_eq!(dist.rows[2].matching_funds, 0.0);
        assert!((dist.rows[0].matching_funds - 60.0).abs() < 1e-9);
        assert!((dist.rows[1].matching_funds - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_pool_is_error() {
        let rows = vec![row("A", 40.0, 20.0)];
        let err = normalize(rows, &round(f64::INFINITY, 1.0)).unwrap_err();
        assert!(matches!(err, QfError::NonFinite { .. }));
    }

    proptest! {
        #[test]
        fn distribution_sums_to_one_and_respects_cap(
            matching in prop::collection::vec(0.0f64..1_000.0, 1..40),
            cap in 0.01f64..=1.0,
        ) {
            prop_assume!(matching.iter().sum::<f64>() > 0.0);
            // the cap is only satisfiable with enough projects carrying weight
            let weighted = matching.iter().filter(|m| **m > 0.0).count();
            prop_assume!(weighted as f64 * cap >= 1.0);

            let rows: Vec<_> = matching
                .iter()
                .enumerate()
                .map(|(i, m)| row(&format!("P{}", i), m + 1.0, 1.0))
                .collect();
            let dist = normalize(rows, &round(10_000.0, cap)).unwrap();

            let allocated = dist.allocated_share();
            prop_assert!((allocated - 1.0).abs() < 1e-9, "sum = {}", allocated);
            for r in &dist.rows {
                prop_assert!(r.matching_distribution <= cap + 1e-12);
            }
        }

        #[test]
        fn shares_never_exceed_cap_in_two_pass(
            matching in prop::collection::vec(0.0f64..1_000.0, 1..40),
            cap in 0.01f64..=1.0,
        ) {
            prop_assume!(matching.iter().sum::<f64>() > 0.0);
            let rows: Vec<_> = matching
                .iter()
                .enumerate()
                .map(|(i, m)| row(&format!("P{}", i), m + 1.0, 1.0))
                .collect();
            let config = RoundConfig {
                redistribution: Redistribution::TwoPass,
                ..round(10_000.0, cap)
            };
            let dist = normalize(rows, &config).unwrap();
            for r in &dist.rows {
                prop_assert!(r.matching_distribution <= cap + 1e-12);
            }
            prop_assert!(dist.allocated_share() <= 1.0 + 1e-9);
            // any shortfall from the second clamp is reported
            if dist.allocated_share() < 1.0 - 1e-9 {
                prop_assert!(!dist.warnings.is_empty());
            }
        }
    }
}
