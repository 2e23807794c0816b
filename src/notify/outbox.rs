//! Notification sinks

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use super::Message;
use crate::common::{Error, Result};
use crate::engine::escape_html;

/// Delivers a composed message
pub trait Notifier {
    fn notify(&self, recipients: &[String], subject: &str, body_html: &str) -> Result<()>;
}

/// Writes the message to the log only
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipients: &[String], subject: &str, body_html: &str) -> Result<()> {
        tracing::info!(
            "Notification to {}: {}\n{}",
            recipients.join(";"),
            subject,
            body_html.replace("<br>", "\n")
        );
        Ok(())
    }
}

/// Writes one HTML file per message into a directory
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn next_path(&self) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut path = self.dir.join(format!("{}.html", stamp));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{}-{}.html", stamp, n));
            n += 1;
        }
        path
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, recipients: &[String], subject: &str, body_html: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Notify(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.next_path();
        let document = format!(
            "<html>\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"to\" content=\"{}\">\n\
             <title>{}</title>\n</head>\n<body>{}</body>\n</html>\n",
            escape_html(&recipients.join(";")),
            escape_html(subject),
            body_html
        );
        std::fs::write(&path, document)
            .map_err(|e| Error::Notify(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Notification written to {}", path.display());
        Ok(())
    }
}

/// Send `message`, logging instead of failing when delivery goes wrong
pub fn deliver(notifier: &dyn Notifier, message: &Message) {
    if message.recipients.is_empty() {
        tracing::warn!("No recipients configured for '{}', notification skipped", message.subject);
        return;
    }
    match notifier.notify(&message.recipients, &message.subject, &message.body_html) {
        Ok(()) => tracing::info!("Notification sent to {}", message.recipients.join(";")),
        Err(e) => tracing::error!("Failed to send notification: {}", e),
    }
}
