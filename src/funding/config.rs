use serde::{Deserialize, Serialize};

use super::mechanism::Mechanism;

/// Round parameters.
///
/// Example YAML:
/// ```yaml
/// round:
///   mechanism: Quadratic Funding
///   matching_pool: 25000
///   matching_percentage_cap: 0.2
///   boost_coefficient: 2
///   negative_matching: allow
///   redistribution: iterative
///   join: inner
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RoundConfig {
    pub mechanism: Mechanism,

    /// Funds distributed across projects in proportion to their capped share.
    pub matching_pool: f64,

    /// Largest share of the pool any single project may receive, in (0, 1].
    pub matching_percentage_cap: f64,

    /// Weight applied to a contributor's total boost:
    /// coefficient = 1 + boost_coefficient * total_boost.
    pub boost_coefficient: f64,

    pub negative_matching: NegativeMatching,

    pub redistribution: Redistribution,

    pub join: JoinPolicy,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            mechanism: Mechanism::QuadraticFunding,
            matching_pool: 25_000.0,
            matching_percentage_cap: 0.2,
            boost_coefficient: 2.0,
            negative_matching: NegativeMatching::default(),
            redistribution: Redistribution::default(),
            join: JoinPolicy::default(),
        }
    }
}

/// What to do with projects whose mechanism score is below their direct donations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeMatching {
    /// Keep the negative share; it lowers the project's allocation.
    #[default]
    Allow,
    /// Treat negative matching funding as zero.
    Floor,
}

/// How excess share above the cap is handed to uncapped projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Redistribution {
    /// Clamp and rescale until no entry exceeds the cap.
    #[default]
    Iterative,
    /// Clamp, rescale once, clamp again.
    TwoPass,
}

/// Handling of projects present in only one of the compared outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Drop them and report them next to the results.
    #[default]
    Inner,
    /// Fail the comparison.
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_config() {
        let config = RoundConfig::default();

        assert_eq!(config.mechanism, Mechanism::QuadraticFunding);
        assert_eq!(config.matching_pool, 25_000.0);
        assert_eq!(config.matching_percentage_cap, 0.2);
        assert_eq!(config.boost_coefficient, 2.0);
        assert_eq!(config.negative_matching, NegativeMatching::Allow);
        assert_eq!(config.redistribution, Redistribution::Iterative);
        assert_eq!(config.join, JoinPolicy::Inner);
    }

    #[test]
    fn test_round_config_serde_roundtrip() {
        let config = RoundConfig {
            mechanism: Mechanism::ClusterMapping,
            redistribution: Redistribution::TwoPass,
            ..RoundConfig::default()
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: RoundConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_round_config_parse() {
        let yaml = r#"
mechanism: Cluster Mapping
matching_pool: 100
"#;
        let config: RoundConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.mechanism, Mechanism::ClusterMapping);
        assert_eq!(config.matching_pool, 100.0);
        assert_eq!(config.matching_percentage_cap, 0.2);
        assert_eq!(config.boost_coefficient, 2.0);
    }

    #[test]
    fn test_policies_parse() {
        let yaml = r#"
negative_matching: floor
redistribution: two_pass
join: strict
"#;
        let config: RoundConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.negative_matching, NegativeMatching::Floor);
        assert_eq!(config.redistribution, Redistribution::TwoPass);
        assert_eq!(config.join, JoinPolicy::Strict);
    }

    #[test]
    fn test_unknown_mechanism_rejected() {
        let yaml = "mechanism: Pairwise Penalty\n";
        assert!(serde_saphyr::from_str::<RoundConfig>(yaml).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "matching_pol: 10\n";
        assert!(serde_saphyr::from_str::<RoundConfig>(yaml).is_err());
    }
}
