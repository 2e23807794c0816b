//! Spreadsheet workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`)

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use super::sheet::{Cell, Sheet, Workbook};
use crate::common::{Error, Result};

/// Whole numbers up to this magnitude are read back as integers
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Read every sheet of the spreadsheet at `path`, in workbook order
pub(super) fn open(path: &Path) -> Result<Workbook> {
    std::fs::metadata(path).map_err(|e| Error::file_read(path, &e))?;
    let mut spreadsheet = open_workbook_auto(path)
        .map_err(|e| Error::WorkbookParse(format!("{}: {}", path.display(), e)))?;

    let mut workbook = Workbook::default();
    for name in spreadsheet.sheet_names() {
        let range = spreadsheet.worksheet_range(&name).map_err(|e| {
            Error::WorkbookParse(format!("{}: sheet '{}': {}", path.display(), name, e))
        })?;
        workbook.insert(name, sheet_from_range(&range));
    }

    tracing::debug!("Read spreadsheet {}", path.display());
    Ok(workbook)
}

/// Copy a cell range into a sheet, keeping absolute cell positions
fn sheet_from_range(range: &Range<Data>) -> Sheet {
    let Some((top, left)) = range.start() else {
        return Sheet::default();
    };

    let mut rows: Vec<Vec<Option<Cell>>> = vec![Vec::new(); top as usize];
    for row in range.rows() {
        let mut cells: Vec<Option<Cell>> = vec![None; left as usize];
        cells.extend(row.iter().map(cell));
        rows.push(cells);
    }
    Sheet::new(rows)
}

fn cell(data: &Data) -> Option<Cell> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(Cell::Text(s.clone())),
        Data::Int(i) => Some(Cell::Int(*i)),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => {
            Some(Cell::Int(*f as i64))
        }
        Data::Float(f) => Some(Cell::Float(*f)),
        Data::Bool(b) => Some(Cell::Bool(*b)),
        other => Some(Cell::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::WorkbookConfig;
    use crate::workbook::testing::xlsx;
    use crate::workbook::{data_rows, Suite, Table};

    #[test]
    fn test_reads_xlsx_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let rows: &[&[&str]] = &[&["name", "count", ""], &["ann", "2", "1.5"]];
        std::fs::write(&path, xlsx(&[("Data", rows)])).unwrap();

        let book = Workbook::open(&path).unwrap();
        let sheet = book.sheet("Data").unwrap();
        assert_eq!(sheet.cell(1, 1), Some(&Cell::Text("name".to_string())));
        assert_eq!(sheet.cell(1, 3), None);
        assert_eq!(sheet.cell(2, 2), Some(&Cell::Int(2)));
        assert_eq!(sheet.cell(2, 3), Some(&Cell::Float(1.5)));
        assert_eq!(sheet.max_row(), 2);
    }

    #[test]
    fn test_suite_from_xlsx_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_test.xlsx");
        let basic: &[&[&str]] = &[&["key", "value"], &["Setting", "Value"], &["if_mail", "2"]];
        let cases: &[&[&str]] = &[
            &["api_id", "api_title", "is_active", "api_host", "req_url", "req_method", "check_point"],
            &["Id", "Title", "Active", "Host", "Path", "Method", "Checkpoint"],
            &["7", "Ping", "yes", "api.local", "/ping", "get", "status == 200"],
        ];
        std::fs::write(&path, xlsx(&[("Basic Data", basic), ("Test Case", cases)])).unwrap();

        let suite = Suite::load(&path, &WorkbookConfig::default()).unwrap();
        assert_eq!(suite.basic.get("if_mail"), Some(&Cell::Int(2)));
        assert_eq!(suite.cases.len(), 1);
        assert_eq!(suite.cases[0].id, "7");
        assert!(suite.cases[0].is_active);
        assert_eq!(suite.cases[0].url(), "http://api.local/ping");
    }

    #[test]
    fn test_data_rows_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fans.xlsx");
        let fans: &[&[&str]] = &[&["id", "name"], &["1", "ann"], &["2", "bob"], &["3", "cy"]];
        let notes: &[&[&str]] = &[&["x"]];
        std::fs::write(&path, xlsx(&[("Fans", fans), ("Notes", notes)])).unwrap();
        assert_eq!(data_rows(&path).unwrap(), 3);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Workbook::open(Path::new("/nonexistent/cases.xlsx")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(
            Workbook::open(&path),
            Err(Error::WorkbookParse(_))
        ));
    }
}
