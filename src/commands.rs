//! CLI command definitions
//!
//! Defines the clap commands for the API test runner.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::notify::NotifyMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the active test cases of a workbook
    Run {
        /// Path to the YAML workbook
        workbook: PathBuf,

        /// Configuration file (default: per-user config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the workbook's `if_mail` notification policy
        #[arg(long, value_enum)]
        notify: Option<NotifyArg>,

        /// Write notifications as HTML files into this directory
        #[arg(long)]
        outbox: Option<PathBuf>,

        /// Directory for files saved by `export_file` checkpoints
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Log file (default: per-user data dir logs/apitest.log)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Check a workbook's cases and expressions without sending requests
    Validate {
        /// Path to the YAML workbook
        workbook: PathBuf,

        /// Configuration file (default: per-user config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the configuration file location and effective settings
    Config {
        /// Configuration file (default: per-user config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

/// Notification policy as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifyArg {
    Never,
    Always,
    OnFailure,
}

impl From<NotifyArg> for NotifyMode {
    fn from(arg: NotifyArg) -> Self {
        match arg {
            NotifyArg::Never => NotifyMode::Never,
            NotifyArg::Always => NotifyMode::Always,
            NotifyArg::OnFailure => NotifyMode::OnFailure,
        }
    }
}
