//! Login gate
//!
//! The login case is retried on its own budget. Only the first attempt's
//! failure text survives into the report; a login that eventually succeeds
//! leaves no trace of its earlier failures. When every attempt fails the
//! run is abandoned.

use serde_json::{Map, Value};
use std::time::{Duration, Instant};

use super::context::RunContext;
use super::runner::Engine;
use super::{escape_html, CaseFailure, Outcome, TestCase, LOGIN_ABANDONED};
use crate::checkpoint::loose_eq;
use crate::common::config::LoginSuccess;

/// Where the gate is in its attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Running the given attempt (1-based)
    Trying(u32),
    Success,
    Abandoned,
}

/// Result of passing a login case through the gate
#[derive(Debug, Clone)]
pub struct LoginVerdict {
    pub outcome: Outcome,
    /// Every state the gate went through, ending in `Success` or `Abandoned`
    pub trace: Vec<LoginState>,
    /// Duration of the final attempt only. The timing ranking holds one
    /// entry per case, and the final attempt is the one that decides the
    /// outcome.
    pub elapsed: Duration,
}

impl LoginVerdict {
    pub fn state(&self) -> LoginState {
        self.trace.last().copied().unwrap_or(LoginState::Abandoned)
    }
}

/// Whether a login outcome counts as logged in
pub fn is_logged_in(outcome: &Outcome, rule: &LoginSuccess) -> bool {
    match rule {
        LoginSuccess::Marker { marker } => outcome.serialized().contains(marker.as_str()),
        LoginSuccess::Field { pointer, equals } => match outcome {
            Outcome::Response(value) => value
                .pointer(pointer)
                .map_or(false, |found| loose_eq(found, equals)),
            Outcome::Failed(_) => false,
        },
    }
}

impl Engine<'_> {
    pub(super) async fn login(
        &self,
        ctx: &mut RunContext<'_>,
        case: &TestCase,
        body: Option<&Map<String, Value>>,
    ) -> LoginVerdict {
        let attempts = self.config.login.attempts.max(1);
        let mark = ctx.failures.mark();
        let mut first_failure = String::new();
        let mut trace = Vec::new();

        let mut attempt = 1;
        loop {
            trace.push(LoginState::Trying(attempt));
            let started = Instant::now();
            let outcome = self.execute(ctx, case, body).await;
            let elapsed = started.elapsed();

            if is_logged_in(&outcome, &self.config.login.success) {
                if attempt > 1 {
                    ctx.failures.truncate(mark);
                }
                ctx.login_succeeded = true;
                tracing::info!("API: {} >> logged in (attempt {})", case.title, attempt);
                trace.push(LoginState::Success);
                return LoginVerdict {
                    outcome,
                    trace,
                    elapsed,
                };
            }

            if attempt == 1 {
                first_failure = ctx.failures.since(mark);
            }

            if attempt >= attempts {
                ctx.failures.truncate(mark);
                ctx.failures
                    .push_raw(&format!("{}<br>", escape_html(LOGIN_ABANDONED)));
                ctx.failures.push_raw(&first_failure);
                tracing::error!("{}", LOGIN_ABANDONED);
                trace.push(LoginState::Abandoned);
                return LoginVerdict {
                    outcome: Outcome::Failed(CaseFailure::LoginAbandoned(attempts)),
                    trace,
                    elapsed,
                };
            }

            tracing::error!(
                "API: {} >> login failed (attempt {}/{}), retrying in {}s",
                case.title,
                attempt,
                attempts,
                self.config.login.backoff_secs
            );
            self.pause.pause(self.config.login_backoff()).await;
            attempt += 1;
        }
    }
}
