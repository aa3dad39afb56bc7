pub mod config;
pub mod distribution;
pub mod engine;
pub mod mechanism;
pub mod validation;

pub use config::*;
pub use distribution::{cap_distribution, normalize, Distribution};
pub use engine::{cluster_match, compute_funding, ProjectFundingRow};
pub use mechanism::Mechanism;
pub use validation::validate_round;
