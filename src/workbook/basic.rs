//! Key/value settings from the basic data sheet

use std::collections::BTreeMap;

use super::sheet::{Cell, Table};
use super::FIRST_DATA_ROW;

/// Settings read from the basic data sheet
///
/// Column 1 holds the key, column 2 the value, from row 3 on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicData {
    values: BTreeMap<String, Cell>,
}

impl BasicData {
    pub fn from_table(table: &dyn Table) -> Self {
        let mut values = BTreeMap::new();
        for row in FIRST_DATA_ROW..=table.max_row() {
            let Some(key) = table.cell(row, 1).map(|cell| cell.to_string()) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            if let Some(value) = table.cell(row, 2) {
                let value = match value {
                    Cell::Text(s) => Cell::Text(s.trim().to_string()),
                    other => other.clone(),
                };
                values.insert(key, value);
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.values.get(key)
    }

    /// Text value of `key`, empty when absent
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(|cell| cell.to_string()).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Cell) {
        self.values.insert(key.into(), value);
    }

    /// All settings as a JSON object, for `basic_data[...]` in body expressions
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(key, cell)| (key.clone(), cell.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Workbook;

    #[test]
    fn test_reads_key_values() {
        let book = Workbook::parse(
            r#"
sheets:
  Basic Data:
    - [key, value]
    - [Setting, Value]
    - [if_mail, 2]
    - ["  mail_sub ", " Nightly API run "]
    - [empty_value]
"#,
        )
        .unwrap();
        let basic = BasicData::from_table(book.sheet("Basic Data").unwrap());
        assert_eq!(basic.get("if_mail"), Some(&Cell::Int(2)));
        assert_eq!(basic.text("mail_sub"), "Nightly API run");
        assert_eq!(basic.get("empty_value"), None);
        assert_eq!(basic.text("mail_to_all"), "");
        assert_eq!(basic.to_json()["if_mail"], serde_json::json!(2));
    }
}
