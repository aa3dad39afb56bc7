pub mod load;
pub mod table;
pub mod types;

pub use load::{
    boosts_from_table, contributions_from_table, load_boosts, load_contributions, read_table,
    BoostColumns, ContributionColumns,
};
pub use table::Table;
pub use types::{AmountColumn, BoostRecord, Contribution, ContributionRecord, ProjectKey};
