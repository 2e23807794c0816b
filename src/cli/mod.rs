//! CLI command handling
//!
//! Loads configuration and workbooks, drives the engine, and formats output.

use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::commands::Commands;
use crate::common::{paths, Config, Result};
use crate::engine::{lint, Engine, FsExportSink, HttpSession, Outcome, Report, TokioPause};
use crate::notify::{
    compose, deliver, unused_smtp_keys, LogNotifier, MailSettings, OutboxNotifier,
};
use crate::workbook::Suite;

/// Dispatch a CLI command
///
/// Returns whether everything checked passed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            workbook,
            config,
            notify,
            outbox,
            export_dir,
            log_file: _,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = export_dir {
                config.export.dir = dir;
            }
            if let Some(dir) = outbox {
                config.notify.outbox = Some(dir);
            }

            let suite = Suite::load(&workbook, &config.workbook)?;
            let mut mail = MailSettings::from_basic(&suite.basic)?;
            if let Some(mode) = notify {
                mail.mode = mode.into();
            }
            let smtp = unused_smtp_keys(&suite.basic);
            if !smtp.is_empty() {
                tracing::warn!(
                    "Basic data keys {} are ignored; notifications go to the log or --outbox",
                    smtp.join(", ")
                );
            }

            println!(
                "\n{} {}",
                "Running Workbook:".blue().bold(),
                workbook.display().to_string().white().bold()
            );

            let session = HttpSession::new(&config)?;
            let export = FsExportSink::new(config.export.dir.clone());
            let engine = Engine::new(&config, &TokioPause, &export);
            let report = engine.run(&session, &suite.cases, &suite.basic).await;

            print_report(&report);

            if let Some(message) = compose(&report, &mail, &mut rand::thread_rng()) {
                match &config.notify.outbox {
                    Some(dir) => deliver(&OutboxNotifier::new(dir.clone()), &message),
                    None => deliver(&LogNotifier, &message),
                }
            }

            Ok(!report.has_failures())
        }

        Commands::Validate { workbook, config } => {
            let config = load_config(config.as_deref())?;
            let suite = Suite::load(&workbook, &config.workbook)?;
            let mail = MailSettings::from_basic(&suite.basic)?;

            println!(
                "\n{} {}",
                "Validating Workbook:".blue().bold(),
                workbook.display().to_string().white().bold()
            );
            println!("  {}", format!("notify: {}", mail.mode).dimmed());
            let smtp = unused_smtp_keys(&suite.basic);
            if !smtp.is_empty() {
                println!(
                    "  {} basic data keys {} are not used; notifications go to the log or --outbox",
                    "!".yellow(),
                    smtp.join(", ")
                );
            }

            let mut clean = true;
            for case in &suite.cases {
                let problems = lint(case);
                let label = format!("{} ({})", case.title, case.id);
                if problems.is_empty() {
                    if case.is_active {
                        println!("  {} {}", "✓".green(), label);
                    } else {
                        println!("  {} {} {}", "-".dimmed(), label, "inactive".dimmed());
                    }
                    continue;
                }
                clean = false;
                println!("  {} {}", "✗".red(), label);
                for problem in problems {
                    println!("      {}", problem);
                }
            }

            if clean {
                println!("\n{} {}\n", "✓".green().bold(), "Workbook OK".green().bold());
            } else {
                println!("\n{} {}\n", "✗".red().bold(), "Workbook has problems".red().bold());
            }
            Ok(clean)
        }

        Commands::Config { config, init } => {
            let path = config.clone().or_else(paths::config_path);

            match &path {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!("Config file: {} (not found, using defaults)", path.display()),
                None => println!("Config file: no per-user config directory available"),
            }

            if init {
                init_config(path.as_deref())?;
            }

            let effective = load_config(config.as_deref())?;
            println!("\n{}", effective.to_toml()?);
            Ok(true)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Write the default configuration to `path` unless a file is already there
fn init_config(path: Option<&Path>) -> Result<()> {
    let target: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => match paths::ensure_config_dir()? {
            Some(dir) => dir.join("config.toml"),
            None => {
                println!("{}", "Cannot determine a config directory".yellow());
                return Ok(());
            }
        },
    };

    if target.exists() {
        println!("{} already exists, left unchanged", target.display());
        return Ok(());
    }
    if let Some(dir) = target.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&target, Config::default().to_toml()?)?;
    println!("{} {}", "Wrote".green(), target.display());
    Ok(())
}

fn print_report(report: &Report) {
    println!();
    for (id, outcome) in &report.outcomes {
        match outcome {
            Outcome::Response(_) => println!("  {} {}", "✓".green(), id),
            Outcome::Failed(failure) => println!("  {} {}: {}", "✗".red(), id, failure),
        }
    }

    if let Some(ranking) = &report.ranking {
        println!("\n  {}", "Slowest first:".dimmed());
        for timing in ranking {
            println!("    {} {}s", timing.title, timing.seconds());
        }
    }

    let summary = format!("{}/{} passed", report.passed(), report.executed());
    if report.aborted {
        println!(
            "\n{} {} ({})\n",
            "✗".red().bold(),
            "Login failed, run abandoned".red().bold(),
            summary
        );
    } else if report.has_failures() {
        println!("\n{} {}\n", "✗".red().bold(), summary.red().bold());
    } else {
        println!("\n{} {}\n", "✓".green().bold(), summary.green().bold());
    }
}
