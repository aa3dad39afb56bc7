//! Error and warning types for round computations.
use thiserror::Error;

use crate::outcome::Side;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QfError {
    #[error("{table} table is missing required column '{column}'")]
    Schema { table: String, column: String },

    #[error("{table} row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("malformed {table} input: {reason}")]
    Malformed { table: String, reason: String },

    #[error("negative amount {amount} from {contributor} to project '{project}'")]
    NegativeAmount {
        contributor: String,
        project: String,
        amount: f64,
    },

    #[error("non-finite {quantity} for project '{project}'")]
    NonFinite {
        quantity: &'static str,
        project: String,
    },

    #[error("duplicate boost record for contributor {0}")]
    DuplicateBoost(String),

    #[error("project '{project}' is only present in the {side} outcome")]
    JoinMismatch { project: String, side: Side },
}

/// Non-fatal conditions that force a defined numeric policy instead of
/// an arithmetic fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Degenerate {
    #[error("no contributions to score")]
    EmptyContributions,

    #[error("matching pool is zero, no matching funds are distributed")]
    ZeroMatchingPool,

    #[error("total matching funding is {total}, distribution zero-filled")]
    NonPositiveMatchingTotal { total: f64 },

    #[error("every entry with weight is capped, {unallocated_share} of the pool stays unallocated")]
    AllCapped { unallocated_share: f64 },

    #[error("second cap pass left {unallocated_share} of the pool unallocated")]
    UnderAllocated { unallocated_share: f64 },
}
