use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::outcome::{ContributorStats, ProjectStats, ResultsRow, UnmatchedProject};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format an amount in compact notation (1.5k, 2.3M, 847.25)
pub fn format_amount(amount: f64) -> String {
    let magnitude = amount.abs();
    let formatted = if magnitude >= 1_000_000.0 {
        format!("{:.1}M", amount / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}k", amount / 1_000.0)
    } else {
        format!("{:.2}", amount)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    formatted.replace(".0M", "M").replace(".0k", "k")
}

/// Format a boost percentage with sign, "n/a" when undefined.
pub fn format_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{:+.2}%", p),
        None => "n/a".to_string(),
    }
}

fn colored_pct(pct: Option<f64>, width: usize, use_colors: bool) -> String {
    let text = format!("{:>width$}", format_pct(pct), width = width);
    if !use_colors {
        return text;
    }
    match pct {
        Some(p) if p > 0.0 => text.green().to_string(),
        Some(p) if p < 0.0 => text.red().to_string(),
        Some(_) => text,
        None => text.dimmed().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a project name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn fit_name(name: &str, fixed_width: usize, term_width: Option<usize>) -> String {
    match term_width {
        Some(width) if width > fixed_width + 10 => truncate_name(name, width - fixed_width),
        // Very narrow terminal, show truncated
        Some(_) => truncate_name(name, 20),
        // No terminal (pipe), don't truncate
        None => name.to_string(),
    }
}

/// Format results as a table: index, matching funds (before -> after, change),
/// total funding (before -> after, change), project.
pub fn format_results_table(rows: &[ResultsRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No projects to compare.".to_string();
    }

    let amount_width = 8;
    let pct_width = 10;
    let separator = "  ";
    // index(3) + space + 4 amounts + 2 arrows + 2 percentages + separators
    let fixed_width = 4 + 4 * amount_width + 2 * 4 + 2 * pct_width + separator.len() * 4;
    let term_width = get_terminal_width();

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>2}.", idx + 1);
            let matching = format!(
                "{:>w$} -> {:>w$}",
                format_amount(row.unboosted.matching_funds),
                format_amount(row.boosted.matching_funds),
                w = amount_width
            );
            let total = format!(
                "{:>w$} -> {:>w$}",
                format_amount(row.unboosted.total_funding),
                format_amount(row.boosted.total_funding),
                w = amount_width
            );
            let name = fit_name(&row.project.name, fixed_width, term_width);

            if use_colors {
                format!(
                    "{} {} {}{}{} {}{}{}",
                    index_str.dimmed(),
                    matching,
                    colored_pct(row.matching_funds_boost_pct, pct_width, true),
                    separator,
                    total.bold(),
                    colored_pct(row.total_funding_boost_pct, pct_width, true),
                    separator,
                    name
                )
            } else {
                format!(
                    "{} {} {}{}{} {}{}{}",
                    index_str,
                    matching,
                    colored_pct(row.matching_funds_boost_pct, pct_width, false),
                    separator,
                    total,
                    colored_pct(row.total_funding_boost_pct, pct_width, false),
                    separator,
                    name
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format results as tab-separated values for scripting
/// Columns: project, address, matching funds, boosted matching funds, change,
/// total funding, boosted total funding, change (no headers, no colors)
pub fn format_results_tsv(rows: &[ResultsRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{:.2}\t{:.2}\t{}\t{:.2}\t{:.2}\t{}",
                row.project.name,
                row.project.address,
                row.unboosted.matching_funds,
                row.boosted.matching_funds,
                row.matching_funds_boost_pct.map(|p| p.to_string()).unwrap_or_default(),
                row.unboosted.total_funding,
                row.boosted.total_funding,
                row.total_funding_boost_pct.map(|p| p.to_string()).unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format per-project statistics, one multi-line block per project (verbose style)
pub fn format_project_stats(stats: &[ProjectStats], use_colors: bool) -> String {
    if stats.is_empty() {
        return "No projects found.".to_string();
    }

    stats
        .iter()
        .map(|s| {
            let title = if use_colors {
                format!("{} {}", s.project.name.bold(), s.project.address.cyan())
            } else {
                format!("{} {}", s.project.name, s.project.address)
            };
            let boosted = match (s.boosted_mean, s.boosted_median, s.boosted_max) {
                (Some(mean), Some(median), Some(max)) => format!(
                    "  Boosted contributors: {} ({:.1}%), total {} ({:.1}%), \
                     mean {}, median {}, max {}",
                    s.boosted_contributor_count,
                    s.boosted_contributor_share * 100.0,
                    format_amount(s.boosted_total),
                    s.boosted_total_share * 100.0,
                    format_amount(mean),
                    format_amount(median),
                    format_amount(max)
                ),
                _ => "  Boosted contributors: 0".to_string(),
            };
            format!(
                "{}\n  Contributors: {} ({:.1}%)\n  Total: {} ({:.1}%)\n  \
                 Mean: {}  Median: {}  Max: {} by {}\n{}",
                title,
                s.contributor_count,
                s.contributor_share * 100.0,
                format_amount(s.total),
                s.total_share * 100.0,
                format_amount(s.mean),
                format_amount(s.median),
                format_amount(s.max),
                s.max_contributor,
                boosted
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format per-contributor statistics as a table
/// Columns: contributor, project count, total, mean, median, max, top project
pub fn format_contributor_stats(stats: &[ContributorStats], use_colors: bool) -> String {
    if stats.is_empty() {
        return "No contributors found.".to_string();
    }

    stats
        .iter()
        .map(|s| {
            let id = if use_colors {
                s.contributor_id.yellow().to_string()
            } else {
                s.contributor_id.clone()
            };
            format!(
                "{}  {:>3} projects  total {:>8}  mean {:>8}  median {:>8}  max {:>8}  {}",
                id,
                s.project_count,
                format_amount(s.total),
                format_amount(s.mean),
                format_amount(s.median),
                format_amount(s.max),
                s.max_project.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per project dropped from the comparison
pub fn format_unmatched(unmatched: &[UnmatchedProject]) -> String {
    unmatched
        .iter()
        .map(|u| format!("Dropped {}: only in the {} outcome", u.project, u.present_in))
        .collect::<Vec<_>>()
        .join("\n")
}
