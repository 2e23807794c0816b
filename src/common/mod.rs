//! Common utilities shared by the engine and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::Config;
pub use error::{Error, Result};

/// Split a delimited list, dropping blanks and all whitespace inside items
pub fn split_list(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(|item| item.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|item| !item.is_empty())
        .collect()
}
