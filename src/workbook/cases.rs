//! Reading test cases from the case sheet

use std::collections::HashMap;

use super::sheet::{Cell, Table};
use super::FIRST_DATA_ROW;
use crate::common::{Error, Result};
use crate::engine::TestCase;

/// Case fields and the header names that map to them
const FIELDS: &[(&str, &[&str], bool)] = &[
    ("id", &["api_id", "id"], true),
    ("title", &["api_title", "title"], true),
    ("is_active", &["is_active", "isActive", "active"], true),
    ("host", &["api_host", "host"], true),
    ("path", &["req_url", "path"], true),
    ("method", &["req_method", "method"], true),
    ("body_type", &["req_data_type", "body_type", "bodyType"], false),
    ("body", &["req_data", "body"], false),
    ("upload_file", &["req_file", "upload_file", "uploadFile"], false),
    ("checkpoint", &["check_point", "checkpoint"], true),
];

/// Map field names to their column index using header row 1
fn header_columns(table: &dyn Table, sheet: &str) -> Result<HashMap<&'static str, usize>> {
    let mut headers: HashMap<String, usize> = HashMap::new();
    for column in 1..=table.max_column() {
        if let Some(name) = table.cell(1, column).and_then(Cell::as_text) {
            headers.entry(name.to_string()).or_insert(column);
        }
    }

    let mut columns = HashMap::new();
    for (field, aliases, required) in FIELDS {
        match aliases.iter().find_map(|alias| headers.get(*alias)) {
            Some(column) => {
                columns.insert(*field, *column);
            }
            None if *required => return Err(Error::missing_column(sheet, aliases[0])),
            None => {}
        }
    }
    Ok(columns)
}

/// Read every case row, in sheet order
///
/// Rows 1 and 2 are header and description; data starts at row 3. Rows
/// with no cells at all are ignored.
pub fn read_cases(table: &dyn Table, sheet: &str) -> Result<Vec<TestCase>> {
    let columns = header_columns(table, sheet)?;
    let text = |row: usize, field: &str| -> String {
        columns
            .get(field)
            .and_then(|column| table.cell(row, *column))
            .map(|cell| cell.to_string())
            .unwrap_or_default()
    };

    let mut cases = Vec::new();
    for row in FIRST_DATA_ROW..=table.max_row() {
        let empty = (1..=table.max_column())
            .all(|column| table.cell(row, column).map_or(true, Cell::is_blank));
        if empty {
            continue;
        }

        cases.push(TestCase {
            id: text(row, "id"),
            title: text(row, "title"),
            is_active: text(row, "is_active") == "yes",
            host: text(row, "host"),
            path: text(row, "path"),
            method: text(row, "method"),
            body_type: text(row, "body_type"),
            body: text(row, "body"),
            upload_file: text(row, "upload_file"),
            checkpoint: text(row, "checkpoint"),
        });
    }

    tracing::debug!("Read {} case rows from '{}'", cases.len(), sheet);
    Ok(cases)
}
