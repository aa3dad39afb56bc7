use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::table::Table;
use super::types::{BoostRecord, Contribution};
use crate::error::QfError;

pub const CONTRIBUTIONS_TABLE: &str = "contributions";
pub const BOOSTS_TABLE: &str = "boosts";

/// Header names for the contribution table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ContributionColumns {
    pub contributor_id: String,
    pub project_name: String,
    pub project_address: String,
    pub amount: String,
    pub project_id: String,
}

impl Default for ContributionColumns {
    fn default() -> Self {
        Self {
            contributor_id: "contributor_id".to_string(),
            project_name: "project_name".to_string(),
            project_address: "project_address".to_string(),
            amount: "amount".to_string(),
            project_id: "project_id".to_string(),
        }
    }
}

/// Header names for the boost output table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BoostColumns {
    pub contributor_address: String,
    pub total_boost: String,
}

impl Default for BoostColumns {
    fn default() -> Self {
        Self {
            contributor_address: "contributor_address".to_string(),
            total_boost: "total_boost".to_string(),
        }
    }
}

/// Read a table from disk. `.json` files are parsed as an array of objects,
/// anything else as comma-delimited text.
pub fn read_table(name: &str, path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} table at {}", name, path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let table = if is_json {
        Table::from_json(name, &text)
    } else {
        Table::from_delimited(name, &text)
    };

    table.with_context(|| format!("Failed to parse {}", path.display()))
}

/// Build contributions from a table. Every column is checked before any row is read.
pub fn contributions_from_table(
    table: &Table,
    columns: &ContributionColumns,
) -> Result<Vec<Contribution>, QfError> {
    let contributor = table.column(&columns.contributor_id)?;
    let name = table.column(&columns.project_name)?;
    let address = table.column(&columns.project_address)?;
    let amount = table.column(&columns.amount)?;
    let project_id = table.column(&columns.project_id)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(Contribution {
                contributor_id: cell(table, i, row, contributor)?.trim().to_string(),
                project_name: cell(table, i, row, name)?.trim().to_string(),
                project_address: cell(table, i, row, address)?.trim().to_string(),
                amount: parse_number(table, i, &columns.amount, cell(table, i, row, amount)?)?,
                project_id: cell(table, i, row, project_id)?.trim().to_string(),
            })
        })
        .collect()
}

/// Build boost records from a table. A contributor may appear at most once.
pub fn boosts_from_table(
    table: &Table,
    columns: &BoostColumns,
) -> Result<Vec<BoostRecord>, QfError> {
    let address = table.column(&columns.contributor_address)?;
    let total_boost = table.column(&columns.total_boost)?;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        let contributor_address = cell(table, i, row, address)?.trim().to_string();
        if !seen.insert(contributor_address.clone()) {
            return Err(QfError::DuplicateBoost(contributor_address));
        }
        records.push(BoostRecord {
            contributor_address,
            total_boost: parse_number(
                table,
                i,
                &columns.total_boost,
                cell(table, i, row, total_boost)?,
            )?,
        });
    }
    Ok(records)
}

pub fn load_contributions(path: &Path, columns: &ContributionColumns) -> Result<Vec<Contribution>> {
    let table = read_table(CONTRIBUTIONS_TABLE, path)?;
    contributions_from_table(&table, columns)
        .with_context(|| format!("Invalid contributions in {}", path.display()))
}

pub fn load_boosts(path: &Path, columns: &BoostColumns) -> Result<Vec<BoostRecord>> {
    let table = read_table(BOOSTS_TABLE, path)?;
    boosts_from_table(&table, columns)
        .with_context(|| format!("Invalid boosts in {}", path.display()))
}

/// A row built by hand may be shorter than the header.
fn cell<'a>(
    table: &Table,
    row: usize,
    cells: &'a [String],
    index: usize,
) -> Result<&'a str, QfError> {
    cells
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| QfError::Malformed {
            table: table.name.clone(),
            reason: format!(
                "row {} has {} fields, header has {}",
                row + 1,
                cells.len(),
                table.columns.len()
            ),
        })
}

fn parse_number(table: &Table, row: usize, column: &str, raw: &str) -> Result<f64, QfError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(QfError::InvalidValue {
            table: table.name.clone(),
            row: row + 1,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}
