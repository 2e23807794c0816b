//! Case failures and the failure report buffer

use thiserror::Error;

use super::TestCase;
use crate::checkpoint::EvalError;

/// Report line emitted when the whole run stopped at the login case
pub const LOGIN_ABANDONED: &str = ">>>>> Login failed! No further API tests can run. <<<<<";

/// Report text when no case was active
pub const NO_TESTS_EXECUTED: &str = "No API tests were executed";

/// Broad class of a case failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The row itself is unusable; no request was sent
    Config,
    /// A body or checkpoint expression failed to evaluate
    Eval,
    /// The server could not be reached, even after retrying
    Connection,
    /// Any other transport or file failure
    Transport,
    /// The checkpoint evaluated cleanly to false
    CheckpointFalse,
    /// Login never succeeded; the run stops
    LoginAbandoned,
}

/// Why a single case failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaseFailure {
    #[error("invalid \"req_method\" '{0}'")]
    InvalidMethod(String),

    #[error("invalid \"req_data_type\" '{0}'")]
    InvalidBodyType(String),

    #[error("\"check_point\" must not be empty")]
    EmptyCheckpoint,

    #[error("\"req_data\" must be a mapping - {0}")]
    BodyNotMapping(String),

    #[error("{0}")]
    BodyEval(EvalError),

    #[error("{0}")]
    CheckpointEval(EvalError),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Transport(String),

    #[error("checkpoint is false (status {status})")]
    CheckpointFalse {
        status: u16,
        url: String,
        response: String,
    },

    #[error("login failed after {0} attempts")]
    LoginAbandoned(u32),
}

impl CaseFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            CaseFailure::InvalidMethod(_)
            | CaseFailure::InvalidBodyType(_)
            | CaseFailure::EmptyCheckpoint
            | CaseFailure::BodyNotMapping(_) => FailureClass::Config,
            CaseFailure::BodyEval(_) | CaseFailure::CheckpointEval(_) => FailureClass::Eval,
            CaseFailure::Connection(_) => FailureClass::Connection,
            CaseFailure::Transport(_) => FailureClass::Transport,
            CaseFailure::CheckpointFalse { .. } => FailureClass::CheckpointFalse,
            CaseFailure::LoginAbandoned(_) => FailureClass::LoginAbandoned,
        }
    }

    /// Report lines for this failure of the case titled `title`
    fn lines(&self, title: &str, url: &str) -> Vec<String> {
        let head = format!("API: {} >> failed >>", title);
        match self {
            CaseFailure::InvalidMethod(_) | CaseFailure::InvalidBodyType(_) => {
                vec![head, format!(">> Reason: {}.", self)]
            }
            CaseFailure::EmptyCheckpoint => vec![head, url.to_string(), self.to_string()],
            CaseFailure::BodyNotMapping(_) => {
                vec![head, format!(">> URL: {}", url), format!(">> Reason: {}", self)]
            }
            CaseFailure::BodyEval(e) => {
                vec![head, format!(">> URL: {}", url), format!(">> Error: {}", e)]
            }
            CaseFailure::CheckpointFalse {
                status,
                url,
                response,
            } => vec![
                head,
                format!(">> Status Code: {}", status),
                format!(">> URL: {}", url),
                format!(">> Response: {}", response),
            ],
            CaseFailure::LoginAbandoned(_) => vec![LOGIN_ABANDONED.to_string()],
            CaseFailure::CheckpointEval(_)
            | CaseFailure::Connection(_)
            | CaseFailure::Transport(_) => vec![head, format!(">> Error: {}", self)],
        }
    }

    /// HTML report fragment, one `<br>` per line and a blank line after
    pub fn html(&self, title: &str, url: &str) -> String {
        let lines: Vec<String> = self
            .lines(title, url)
            .iter()
            .map(|line| escape_html(line))
            .collect();
        format!("{}<br><br>", lines.join("<br>"))
    }

    /// Plain-text form for the log
    pub fn log_text(&self, title: &str, url: &str) -> String {
        self.lines(title, url).join("\n")
    }
}

/// Escape text for inclusion in the HTML report body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Accumulated failure report text for one run
///
/// Positions returned by [`FailureLog::mark`] let the login gate roll back
/// text written by attempts it discards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLog {
    text: String,
}

impl FailureLog {
    /// Log `failure` and append its report fragment
    pub fn record(&mut self, case: &TestCase, failure: &CaseFailure) {
        let url = case.url();
        tracing::error!("{}", failure.log_text(&case.title, &url));
        self.text.push_str(&failure.html(&case.title, &url));
    }

    /// Append already formatted report text
    pub fn push_raw(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn mark(&self) -> usize {
        self.text.len()
    }

    /// Text written since `mark`
    pub fn since(&self, mark: usize) -> String {
        self.text.get(mark..).unwrap_or_default().to_string()
    }

    /// Drop everything written since `mark`
    pub fn truncate(&mut self, mark: usize) {
        self.text.truncate(mark);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> TestCase {
        TestCase {
            title: "Query roles".to_string(),
            host: "api.local".to_string(),
            path: "/role/query".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_checkpoint_false_fragment() {
        let failure = CaseFailure::CheckpointFalse {
            status: 500,
            url: "http://api.local/role/query".to_string(),
            response: "<h1>oops</h1>".to_string(),
        };
        assert_eq!(
            failure.html("Query roles", "http://api.local/role/query"),
            "API: Query roles &gt;&gt; failed &gt;&gt;<br>&gt;&gt; Status Code: 500<br>\
             &gt;&gt; URL: http://api.local/role/query<br>&gt;&gt; Response: &lt;h1&gt;oops&lt;/h1&gt;<br><br>"
        );
        assert_eq!(failure.class(), FailureClass::CheckpointFalse);
    }

    #[test]
    fn test_failure_log_marks() {
        let mut log = FailureLog::default();
        log.record(&case(), &CaseFailure::EmptyCheckpoint);
        let mark = log.mark();
        log.record(&case(), &CaseFailure::Transport("timed out".to_string()));
        assert!(log.since(mark).contains("timed out"));
        log.truncate(mark);
        assert!(log.as_str().contains("must not be empty"));
        assert!(!log.as_str().contains("timed out"));
    }

    #[test]
    fn test_failure_classes() {
        assert_eq!(CaseFailure::EmptyCheckpoint.class(), FailureClass::Config);
        assert_eq!(
            CaseFailure::Connection("refused".to_string()).class(),
            FailureClass::Connection
        );
        assert_eq!(CaseFailure::LoginAbandoned(3).class(), FailureClass::LoginAbandoned);
    }
}
