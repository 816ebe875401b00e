// In-memory table: named columns, typed cells

pub mod loader;

pub use loader::load_csv;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    Bool,
    Date,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Per-column summary used when describing a table to the query engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: ColumnType,
    pub non_null: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table; every row must be as wide as `columns`.
    pub fn new(columns: Vec<String>, column_types: Vec<ColumnType>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert_eq!(columns.len(), column_types.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, column_types, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// First `n` rows as a new table with the same columns.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            column_types: self.column_types.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn schema(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .zip(&self.column_types)
            .enumerate()
            .map(|(idx, (name, dtype))| ColumnInfo {
                name: name.clone(),
                dtype: *dtype,
                non_null: self.rows.iter().filter(|row| !row[idx].is_null()).count(),
            })
            .collect()
    }

    /// Renders the table back to CSV, header first.
    pub fn to_csv_string(&self) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        // Writing into a Vec<u8> cannot fail on I/O.
        let _ = writer.write_record(&self.columns);
        for row in &self.rows {
            let _ = writer.write_record(row.iter().map(|v| v.to_string()));
        }
        match writer.into_inner() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }
}
