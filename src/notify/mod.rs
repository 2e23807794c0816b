//! Result notification
//!
//! Turns a [`Report`] into a message according to the workbook's `if_mail`
//! policy and hands it to a [`Notifier`].

mod outbox;

pub use outbox::{deliver, LogNotifier, Notifier, OutboxNotifier};

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

use crate::common::{split_list, Error, Result};
use crate::engine::{escape_html, Report};
use crate::workbook::{BasicData, Cell};

/// Body used when `mail_content_random` is empty
const DEFAULT_SUCCESS_CONTENT: &str = "All API tests passed.";

/// Basic data keys for SMTP delivery; messages go to a [`Notifier`] instead
const SMTP_KEYS: &[&str] = &["mail_host", "mail_from", "mail_pwd"];

/// SMTP settings present in `basic` that no notifier reads
pub fn unused_smtp_keys(basic: &BasicData) -> Vec<&'static str> {
    SMTP_KEYS
        .iter()
        .copied()
        .filter(|key| basic.get(key).is_some_and(|cell| !cell.is_blank()))
        .collect()
}

/// When to send a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    Never,
    Always,
    OnFailure,
}

impl NotifyMode {
    /// Parse the `if_mail` setting: `0`/`1`/`2` or the mode names
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "never" => Some(NotifyMode::Never),
            "1" | "always" => Some(NotifyMode::Always),
            "2" | "on-failure" | "on_failure" => Some(NotifyMode::OnFailure),
            _ => None,
        }
    }

    fn from_cell(cell: &Cell) -> Result<Self> {
        let raw = match cell {
            Cell::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
            other => other.to_string(),
        };
        Self::parse(&raw)
            .ok_or_else(|| Error::invalid_setting("if_mail", &format!("unknown mode '{}'", raw)))
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyMode::Never => write!(f, "never"),
            NotifyMode::Always => write!(f, "always"),
            NotifyMode::OnFailure => write!(f, "on-failure"),
        }
    }
}

/// Notification settings from the basic data sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub mode: NotifyMode,
    /// Recipients of failure reports
    pub to_all: Vec<String>,
    /// Recipients of success messages
    pub to_me: Vec<String>,
    pub subject: String,
    pub contact_phone: String,
    pub contact_name: String,
    /// Candidate success bodies, one picked at random
    pub success_contents: Vec<String>,
}

impl MailSettings {
    /// Read settings; a missing `if_mail` means no notification
    pub fn from_basic(basic: &BasicData) -> Result<Self> {
        let mode = match basic.get("if_mail") {
            Some(cell) if !cell.is_blank() => NotifyMode::from_cell(cell)?,
            _ => NotifyMode::Never,
        };

        Ok(Self {
            mode,
            to_all: split_list(&basic.text("mail_to_all"), ','),
            to_me: split_list(&basic.text("mail_to_me"), ','),
            subject: basic.text("mail_sub"),
            contact_phone: basic.text("contact_phone"),
            contact_name: basic.text("contact_name"),
            success_contents: basic
                .text("mail_content_random")
                .split(';')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// A composed notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body_html: String,
}

/// Build the message for `report`, or `None` when the policy sends nothing
pub fn compose<R: Rng + ?Sized>(
    report: &Report,
    settings: &MailSettings,
    rng: &mut R,
) -> Option<Message> {
    if report.has_failures() {
        if settings.mode == NotifyMode::Never {
            return None;
        }
        let body_html = format!(
            "{}<br><b>If anything looks wrong, please call <font color=\"red\">{}</font> ({}).</b>",
            report.failures,
            escape_html(&settings.contact_phone),
            escape_html(&settings.contact_name)
        );
        return Some(Message {
            recipients: settings.to_all.clone(),
            subject: settings.subject.clone(),
            body_html,
        });
    }

    if settings.mode != NotifyMode::Always {
        return None;
    }

    let content = settings
        .success_contents
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(DEFAULT_SUCCESS_CONTENT);
    let mut body_html = format!(
        "{}<br><br>Execution time per API, slowest first:<br><br>API : Time (s)",
        escape_html(content)
    );
    for timing in report.ranking.iter().flatten() {
        body_html.push_str(&format!(
            "<br>{} : {}",
            escape_html(&timing.title),
            timing.seconds()
        ));
    }

    Some(Message {
        recipients: settings.to_me.clone(),
        subject: format!("{} [OK]", settings.subject),
        body_html,
    })
}
