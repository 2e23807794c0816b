//! Tabular data source
//!
//! A workbook is a set of named sheets; a sheet is a grid of loosely typed
//! cells addressed 1-based by (row, column), the way spreadsheet tools
//! number them. Workbooks are read from spreadsheet files or from a YAML
//! document of the same shape:
//!
//! ```yaml
//! sheets:
//!   Test Case:
//!     - [api_id, api_title, is_active]
//!     - [ID, Title, Active?]
//!     - [login, Log in, "yes"]
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::common::{Error, Result};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Text content with surrounding whitespace removed, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.trim()),
            _ => None,
        }
    }

    /// Whether the cell holds only whitespace
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(s) if s.trim().is_empty())
    }

    /// Convert to a JSON value, trimming text
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Bool(b) => serde_json::Value::Bool(*b),
            Cell::Int(i) => serde_json::Value::from(*i),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Cell::Text(s) => serde_json::Value::String(s.trim().to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// Read access to a grid of cells
pub trait Table {
    /// Cell at 1-based `row` and `column`; `None` when empty or out of range
    fn cell(&self, row: usize, column: usize) -> Option<&Cell>;

    /// Index of the last row
    fn max_row(&self) -> usize;

    /// Index of the last column
    fn max_column(&self) -> usize;
}

/// A sheet held in memory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Sheet {
    rows: Vec<Vec<Option<Cell>>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Option<Cell>>>) -> Self {
        Self { rows }
    }
}

impl Table for Sheet {
    fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        if row == 0 || column == 0 {
            return None;
        }
        self.rows
            .get(row - 1)
            .and_then(|r| r.get(column - 1))
            .and_then(Option::as_ref)
    }

    fn max_row(&self) -> usize {
        self.rows.len()
    }

    fn max_column(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// A named collection of sheets, in workbook order
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<(String, Sheet)>,
}

/// On-disk YAML form; the mapping keeps the sheets in file order
#[derive(Deserialize)]
struct YamlWorkbook {
    sheets: serde_yaml::Mapping,
}

impl Workbook {
    /// Load a workbook, choosing the reader by file extension
    ///
    /// `.yaml`/`.yml` files are YAML grids; `.xlsx`, `.xlsm`, `.xlsb`,
    /// `.xls` and `.ods` files are read as spreadsheets.
    pub fn open(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
                Self::parse(&content)
            }
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => super::spreadsheet::open(path),
            other => Err(Error::WorkbookParse(format!(
                "{}: unsupported workbook type '{}'",
                path.display(),
                other
            ))),
        }
    }

    /// Parse a workbook from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        let raw: YamlWorkbook =
            serde_yaml::from_str(content).map_err(|e| Error::WorkbookParse(e.to_string()))?;

        let mut workbook = Self::default();
        for (name, grid) in raw.sheets {
            let name: String = serde_yaml::from_value(name)
                .map_err(|e| Error::WorkbookParse(format!("sheet name: {}", e)))?;
            let sheet: Sheet = serde_yaml::from_value(grid)
                .map_err(|e| Error::WorkbookParse(format!("sheet '{}': {}", name, e)))?;
            workbook.insert(name, sheet);
        }
        Ok(workbook)
    }

    /// Look up a sheet by name
    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|(sheet_name, _)| sheet_name == name)
            .map(|(_, sheet)| sheet)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// The first sheet, if the workbook has any
    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first().map(|(_, sheet)| sheet)
    }

    /// Add a sheet, replacing one with the same name in place
    pub fn insert(&mut self, name: impl Into<String>, sheet: Sheet) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(sheet_name, _)| *sheet_name == name) {
            Some(slot) => slot.1 = sheet,
            None => self.sheets.push((name, sheet)),
        }
    }
}

/// Data rows of the first sheet of the workbook at `path`, header excluded
pub fn data_rows(path: &Path) -> Result<usize> {
    let workbook = Workbook::open(path)?;
    Ok(workbook
        .first_sheet()
        .map_or(0, |sheet| sheet.max_row().saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"
sheets:
  Test Case:
    - [api_id, api_title, is_active]
    - [ID, Title]
    - [7, "  Query  ", "yes"]
    - [~, 1.5, true]
"#;

    #[test]
    fn test_cells_are_one_indexed() {
        let book = Workbook::parse(BOOK).unwrap();
        let sheet = book.sheet("Test Case").unwrap();
        assert_eq!(sheet.cell(1, 1), Some(&Cell::Text("api_id".to_string())));
        assert_eq!(sheet.cell(3, 1), Some(&Cell::Int(7)));
        assert_eq!(sheet.cell(0, 1), None);
        assert_eq!(sheet.cell(2, 3), None);
        assert_eq!(sheet.max_row(), 4);
        assert_eq!(sheet.max_column(), 3);
    }

    #[test]
    fn test_loosely_typed_cells() {
        let book = Workbook::parse(BOOK).unwrap();
        let sheet = book.sheet("Test Case").unwrap();
        assert_eq!(sheet.cell(4, 1), None);
        assert_eq!(sheet.cell(4, 2), Some(&Cell::Float(1.5)));
        assert_eq!(sheet.cell(4, 3), Some(&Cell::Bool(true)));
        assert_eq!(sheet.cell(3, 2).unwrap().to_string(), "Query");
    }

    #[test]
    fn test_missing_sheet() {
        let book = Workbook::parse(BOOK).unwrap();
        assert!(matches!(book.sheet("Basic Data"), Err(Error::SheetNotFound(_))));
    }

    #[test]
    fn test_sheets_keep_file_order() {
        let book = Workbook::parse(
            r#"
sheets:
  Zeta:
    - [z]
  Alpha:
    - [a]
"#,
        )
        .unwrap();
        let first = book.first_sheet().unwrap();
        assert_eq!(first.cell(1, 1), Some(&Cell::Text("z".to_string())));
    }

    #[test]
    fn test_data_rows_of_yaml_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fans.yaml");
        std::fs::write(
            &path,
            "sheets:\n  Fans:\n    - [id, name]\n    - [1, ann]\n    - [2, bob]\n  Other:\n    - [x]\n",
        )
        .unwrap();
        assert_eq!(data_rows(&path).unwrap(), 2);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            Workbook::open(Path::new("cases.txt")),
            Err(Error::WorkbookParse(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            Workbook::parse("sheets: [1, 2"),
            Err(Error::WorkbookParse(_))
        ));
    }
}
