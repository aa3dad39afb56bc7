pub mod export;
pub mod formatter;

pub use export::{
    boosted_contributions_to_delimited, project_stats_to_delimited, results_to_delimited,
    write_export,
};
pub use formatter::{
    format_amount, format_contributor_stats, format_pct, format_project_stats,
    format_results_table, format_results_tsv, format_unmatched, should_use_colors,
};
