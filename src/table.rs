//! Flattening of Graph JSON records into row-oriented tables.
//!
//! Nested objects become dotted columns (`manager.id`); arrays and scalars are
//! kept as cell values. Columns keep the order in which they first appear,
//! with keys inside a record visited in sorted order.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TableError;

/// Widest cell rendered by `Display` before truncation.
const MAX_CELL_WIDTH: usize = 40;

/// One flattened record.
pub type Row = Map<String, Value>;

/// A set of flattened records with a stable column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Flatten a list of JSON records. Non-object records are ignored.
    pub fn from_records(records: Vec<Value>) -> Self {
        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            if let Value::Object(object) = record {
                let mut row = Row::new();
                flatten_object(None, object, &mut row, &mut columns, &mut seen);
                rows.push(row);
            }
        }

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell at `row`, `column`; `None` when the record lacked the field.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Remove a column from the table, e.g. `manager.@odata.type`.
    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.remove(name);
        }
    }

    /// Map each row's `key` cell to its `value` cell.
    ///
    /// Later rows win on duplicate keys. Rows where either cell is null or
    /// missing are skipped.
    pub fn index_map(
        &self,
        key: &str,
        value: &str,
    ) -> Result<BTreeMap<String, String>, TableError> {
        if self.is_empty() {
            return Ok(BTreeMap::new());
        }

        for column in [key, value] {
            if !self.has_column(column) {
                return Err(TableError::MissingColumn(column.to_string()));
            }
        }

        Ok(self
            .rows
            .iter()
            .filter_map(|row| {
                let k = row.get(key).and_then(key_text)?;
                let v = row.get(value).and_then(key_text)?;
                Some((k, v))
            })
            .collect())
    }
}

/// `employeeId -> id` for every user in the table.
pub fn get_ms_id_dict(table: &Table) -> Result<BTreeMap<String, String>, TableError> {
    table.index_map("employeeId", "id")
}

/// `mail -> userPrincipalName` for every user in the table.
pub fn get_mail_upn_dict(table: &Table) -> Result<BTreeMap<String, String>, TableError> {
    table.index_map("mail", "userPrincipalName")
}

fn flatten_object(
    prefix: Option<&str>,
    object: Map<String, Value>,
    row: &mut Row,
    columns: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };

        match value {
            Value::Object(nested) if !nested.is_empty() => {
                flatten_object(Some(&name), nested, row, columns, seen);
            }
            Value::Object(_) => {}
            other => {
                if seen.insert(name.clone()) {
                    columns.push(name.clone());
                }
                row.insert(name, other);
            }
        }
    }
}

/// Text of a cell used as a map key or value; `None` for null.
fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn cell_text(value: Option<&Value>) -> String {
    let text = match value {
        None => "NaN".to_string(),
        Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if text.chars().count() > MAX_CELL_WIDTH {
        let truncated: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return writeln!(f, "Empty table ({} rows)", self.rows.len());
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| self.columns.iter().map(|c| cell_text(row.get(c))).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:width$}", "", width = index_width)?;
        for (column, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", column, width = width)?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{:<width$}", i, width = index_width)?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell, width = width)?;
            }
            writeln!(f)?;
        }

        write!(f, "\n[{} rows x {} columns]", self.rows.len(), self.columns.len())
    }
}
