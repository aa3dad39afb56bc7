use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

use crate::boost::BoostedContribution;
use crate::dataset::ContributionColumns;
use crate::outcome::{ProjectStats, ResultsRow};

const RESULTS_HEADER: [&str; 16] = [
    "project_name",
    "project_address",
    "direct_donations",
    "funding_mechanism_score",
    "matching_funding",
    "matching_distribution",
    "matching_funds",
    "total_funding",
    "direct_donations_boosted",
    "funding_mechanism_score_boosted",
    "matching_funding_boosted",
    "matching_distribution_boosted",
    "matching_funds_boosted",
    "total_funding_boosted",
    "matching_funds_boost_pct",
    "total_funding_boost_pct",
];

const PROJECT_STATS_HEADER: [&str; 17] = [
    "project_name",
    "project_address",
    "contributor_count",
    "contributor_share",
    "total",
    "total_share",
    "mean",
    "median",
    "max",
    "max_contributor",
    "boosted_contributor_count",
    "boosted_contributor_share",
    "boosted_total",
    "boosted_total_share",
    "boosted_mean",
    "boosted_median",
    "boosted_max",
];

/// Results as comma-delimited text, one row per project plus a header.
/// Undefined percentages are left empty.
pub fn results_to_delimited(rows: &[ResultsRow]) -> String {
    let mut out = header_line(&RESULTS_HEADER);
    for row in rows {
        let u = &row.unboosted;
        let b = &row.boosted;
        let fields = [
            escape_field(&row.project.name),
            escape_field(&row.project.address),
            u.direct_donations.to_string(),
            u.funding_mechanism_score.to_string(),
            u.matching_funding.to_string(),
            u.matching_distribution.to_string(),
            u.matching_funds.to_string(),
            u.total_funding.to_string(),
            b.direct_donations.to_string(),
            b.funding_mechanism_score.to_string(),
            b.matching_funding.to_string(),
            b.matching_distribution.to_string(),
            b.matching_funds.to_string(),
            b.total_funding.to_string(),
            optional(row.matching_funds_boost_pct),
            optional(row.total_funding_boost_pct),
        ];
        push_line(&mut out, &fields);
    }
    out
}

/// Boosted contributions restricted to the contribution schema plus `boosted_amount`.
/// The header uses the input's own column names.
pub fn boosted_contributions_to_delimited(
    contributions: &[BoostedContribution],
    columns: &ContributionColumns,
) -> String {
    let header = [
        escape_field(&columns.contributor_id),
        escape_field(&columns.project_name),
        escape_field(&columns.project_address),
        escape_field(&columns.amount),
        escape_field(&columns.project_id),
        "boosted_amount".to_string(),
    ];
    let mut out = String::new();
    push_line(&mut out, &header);
    for b in contributions {
        let c = &b.contribution;
        let fields = [
            escape_field(&c.contributor_id),
            escape_field(&c.project_name),
            escape_field(&c.project_address),
            c.amount.to_string(),
            escape_field(&c.project_id),
            b.boosted_amount.to_string(),
        ];
        push_line(&mut out, &fields);
    }
    out
}

pub fn project_stats_to_delimited(stats: &[ProjectStats]) -> String {
    let mut out = header_line(&PROJECT_STATS_HEADER);
    for s in stats {
        let fields = [
            escape_field(&s.project.name),
            escape_field(&s.project.address),
            s.contributor_count.to_string(),
            s.contributor_share.to_string(),
            s.total.to_string(),
            s.total_share.to_string(),
            s.mean.to_string(),
            s.median.to_string(),
            s.max.to_string(),
            escape_field(&s.max_contributor),
            s.boosted_contributor_count.to_string(),
            s.boosted_contributor_share.to_string(),
            s.boosted_total.to_string(),
            s.boosted_total_share.to_string(),
            optional(s.boosted_mean),
            optional(s.boosted_median),
            optional(s.boosted_max),
        ];
        push_line(&mut out, &fields);
    }
    out
}

/// Write an export atomically, so a failed write never leaves a truncated file.
pub fn write_export(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    file.commit()
        .with_context(|| format!("Failed to save export to {}", path.display()))?;

    Ok(())
}

/// Quote a field if it contains the delimiter, a quote or a line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn header_line(columns: &[&str]) -> String {
    let mut out = columns.join(",");
    out.push('\n');
    out
}

fn push_line(out: &mut String, fields: &[String]) {
    out.push_str(&fields.join(","));
    out.push('\n');
}
