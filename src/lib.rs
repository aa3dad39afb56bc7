pub mod boost;
pub mod config;
pub mod dataset;
pub mod error;
pub mod funding;
pub mod outcome;
pub mod output;
pub mod pipeline;

pub use error::{Degenerate, QfError};
pub use pipeline::{run_round, RoundOutcome};
