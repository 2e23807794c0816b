//! Workbook case source
//!
//! Loads the basic data and test case sheets from a spreadsheet or YAML
//! workbook file.

mod basic;
mod cases;
mod sheet;
mod spreadsheet;

#[cfg(test)]
pub(crate) mod testing;

pub use basic::BasicData;
pub use cases::read_cases;
pub use sheet::{data_rows, Cell, Sheet, Table, Workbook};

use std::path::Path;

use crate::common::config::WorkbookConfig;
use crate::common::Result;
use crate::engine::TestCase;

/// First row holding data; rows 1 and 2 are header and description
pub const FIRST_DATA_ROW: usize = 3;

/// Everything a run needs from one workbook
#[derive(Debug, Clone)]
pub struct Suite {
    pub basic: BasicData,
    pub cases: Vec<TestCase>,
}

impl Suite {
    /// Load both sheets from the workbook at `path`
    pub fn load(path: &Path, layout: &WorkbookConfig) -> Result<Self> {
        let workbook = Workbook::open(path)?;
        Self::from_workbook(&workbook, layout)
    }

    pub fn from_workbook(workbook: &Workbook, layout: &WorkbookConfig) -> Result<Self> {
        let basic = BasicData::from_table(workbook.sheet(&layout.basic_sheet)?);
        let cases = read_cases(workbook.sheet(&layout.case_sheet)?, &layout.case_sheet)?;
        tracing::info!(
            "Loaded {} test cases ({} active)",
            cases.len(),
            cases.iter().filter(|case| case.is_active).count()
        );
        Ok(Self { basic, cases })
    }
}
