use serde_json::Value;

use crate::error::QfError;

/// A header row plus string cells, as handed over by whatever produced the data.
///
/// Typed records are built from it by `load`; the table itself only knows
/// about columns and rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Index of a required column.
    pub fn column(&self, column: &str) -> Result<usize, QfError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| QfError::Schema {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse comma-delimited text with a header row.
    ///
    /// Quoted fields may contain commas, newlines and doubled quotes.
    /// Blank lines are skipped.
    pub fn from_delimited(name: &str, text: &str) -> Result<Self, QfError> {
        let mut records = parse_records(name, text)?.into_iter();

        let columns: Vec<String> = match records.next() {
            Some(header) => header.into_iter().map(|c| c.trim().to_string()).collect(),
            None => {
                return Err(QfError::Malformed {
                    table: name.to_string(),
                    reason: "missing header row".to_string(),
                })
            }
        };

        let mut rows = Vec::new();
        for (i, record) in records.enumerate() {
            if record.len() != columns.len() {
                return Err(QfError::Malformed {
                    table: name.to_string(),
                    reason: format!(
                        "row {} has {} fields, header has {}",
                        i + 1,
                        record.len(),
                        columns.len()
                    ),
                });
            }
            rows.push(record);
        }

        Ok(Self::new(name, columns, rows))
    }

    /// Parse a JSON array of flat objects. Columns are the union of keys,
    /// in first-seen order; missing keys become empty cells.
    pub fn from_json(name: &str, text: &str) -> Result<Self, QfError> {
        let malformed = |reason: String| QfError::Malformed {
            table: name.to_string(),
            reason,
        };

        let value: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        let items = match value {
            Value::Array(items) => items,
            _ => return Err(malformed("expected a JSON array of objects".to_string())),
        };

        let mut columns: Vec<String> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let object = item
                .as_object()
                .ok_or_else(|| malformed(format!("element {} is not an object", i)))?;
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = items
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                columns
                    .iter()
                    .map(|c| object.get(c).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self::new(name, columns, rows))
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_records(name: &str, text: &str) -> Result<Vec<Vec<String>>, QfError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(QfError::Malformed {
            table: name.to_string(),
            reason: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    Ok(records)
}

// A record consisting of one empty field is a blank line.
fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.len() == 1 && record[0].trim().is_empty() {
        return;
    }
    records.push(record);
}
