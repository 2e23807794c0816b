//! API test runner CLI
//!
//! Runs the HTTP API test cases described in a workbook, checks every
//! response against its checkpoint expression, and reports the failures.

use apitest::common::logging;
use apitest::{cli, commands};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "apitest", about = "Workbook-driven HTTP API test runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Only runs keep a log file
    let log = match &cli.command {
        Commands::Run { log_file, .. } => logging::init(log_file.as_deref()),
        _ => {
            logging::init_stderr();
            None
        }
    };

    let code = match cli::dispatch(cli.command).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // Flush the file layer before exiting
    drop(log);
    std::process::exit(code);
}
