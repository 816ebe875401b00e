// CSV parsing with per-column type inference
use crate::model::TableError;
use crate::table::{ColumnType, Table, Value};
use crate::utils::parse_date;
use std::io::Read;
use std::path::Path;

/// Parses a comma-separated file whose first row is the header.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Table, TableError> {
    let reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    read_table(reader)
}

/// Same as [`load_csv`] but over any reader.
pub fn from_reader<R: Read>(input: R) -> Result<Table, TableError> {
    let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
    read_table(reader)
}

fn read_table<R: Read>(mut reader: csv::Reader<R>) -> Result<Table, TableError> {
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(TableError::MissingHeader);
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw_rows.push(record.iter().map(|field| field.trim().to_string()).collect());
    }

    let column_types: Vec<ColumnType> = (0..columns.len())
        .map(|idx| infer_column_type(raw_rows.iter().map(|row| row[idx].as_str())))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&column_types)
                .map(|(cell, dtype)| convert(cell, *dtype))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, column_types, rows))
}

/// Narrowest type that every non-empty cell fits; all-empty columns are text.
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut non_empty = cells.filter(|c| !c.is_empty()).peekable();
    if non_empty.peek().is_none() {
        return ColumnType::Text;
    }
    let candidates = [
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Bool,
        ColumnType::Date,
    ];
    candidates
        .into_iter()
        .find(|dtype| non_empty.clone().all(|cell| fits(cell, *dtype)))
        .unwrap_or(ColumnType::Text)
}

fn fits(cell: &str, dtype: ColumnType) -> bool {
    match dtype {
        ColumnType::Int => cell.parse::<i64>().is_ok(),
        ColumnType::Float => cell.parse::<f64>().is_ok(),
        ColumnType::Bool => parse_bool(cell).is_some(),
        ColumnType::Date => parse_date(cell).is_some(),
        ColumnType::Text => true,
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn convert(cell: String, dtype: ColumnType) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    let parsed = match dtype {
        ColumnType::Int => cell.parse().ok().map(Value::Int),
        ColumnType::Float => cell.parse().ok().map(Value::Float),
        ColumnType::Bool => parse_bool(&cell).map(Value::Bool),
        ColumnType::Date => parse_date(&cell).map(Value::Date),
        ColumnType::Text => None,
    };
    parsed.unwrap_or(Value::Text(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SALES: &str = "Date,Product,Sales,Region\n\
        2024-01-05,Widget,120.5,North\n\
        2024-01-17,Gadget,80,South\n\
        2024-02-02,Widget,,East\n";

    #[test]
    fn infers_column_types() {
        let table = from_reader(SALES.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.column_types(),
            &[ColumnType::Date, ColumnType::Text, ColumnType::Float, ColumnType::Text]
        );
        assert_eq!(
            table.rows()[0][0],
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert_eq!(table.rows()[1][2], Value::Float(80.0));
        assert_eq!(table.rows()[2][2], Value::Null);
    }

    #[test]
    fn integers_and_bools() {
        let table = from_reader("units,promo\n3,true\n4,FALSE\n".as_bytes()).unwrap();
        assert_eq!(table.column_types(), &[ColumnType::Int, ColumnType::Bool]);
        assert_eq!(table.rows()[1], vec![Value::Int(4), Value::Bool(false)]);
    }

    #[test]
    fn header_only_is_empty_table() {
        let table = from_reader("Date,Product,Sales,Region\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 4);
        assert!(table.column_types().iter().all(|t| *t == ColumnType::Text));
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, TableError::MissingHeader));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = from_reader("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TableError::Csv(_)));
    }
}
