//! API test runner
//!
//! Executes HTTP API test cases read from a workbook over one cookie-keeping
//! session, gates the run on a login case, evaluates checkpoint expressions
//! in a sandbox, and produces a failure report for notification.

pub mod checkpoint;
pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod notify;
pub mod workbook;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use engine::{Engine, Report, TestCase};
