//! Run orchestration
//!
//! Cases execute strictly in workbook order over one session. Each active
//! case has its body evaluated against prior outcomes, is validated, and is
//! then routed through either the login gate or the standard path. An
//! abandoned login ends the run.

use serde_json::{Map, Value};
use std::time::Instant;

use super::context::RunContext;
use super::export::ExportSink;
use super::login::LoginState;
use super::outcome::{Report, Timing};
use super::request::Dispatch;
use super::retry::{Pause, RetryPolicy};
use super::{CaseFailure, TestCase};
use crate::checkpoint::{self, render, Scope};
use crate::common::Config;
use crate::workbook::BasicData;

/// Executes test cases with the given collaborators
pub struct Engine<'a> {
    pub(super) config: &'a Config,
    pub(super) pause: &'a dyn Pause,
    pub(super) export: &'a dyn ExportSink,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a Config, pause: &'a dyn Pause, export: &'a dyn ExportSink) -> Self {
        Self {
            config,
            pause,
            export,
        }
    }

    pub(super) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.config.retry.attempts,
            backoff: self.config.retry_backoff(),
        }
    }

    fn is_login(&self, case: &TestCase) -> bool {
        case.url().ends_with(self.config.login.path_suffix.as_str())
    }

    /// Evaluate the case's body against prior outcomes and basic data
    fn body(
        &self,
        ctx: &RunContext<'_>,
        case: &TestCase,
        basic: &Value,
    ) -> std::result::Result<Option<Map<String, Value>>, CaseFailure> {
        if case.body.trim().is_empty() {
            return Ok(None);
        }
        let scope = Scope::new()
            .bind("res", ctx.results())
            .bind("basic_data", basic.clone());
        match checkpoint::evaluate(&case.body, &scope) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(other) => Err(CaseFailure::BodyNotMapping(render(&other))),
            Err(e) => Err(CaseFailure::BodyEval(e)),
        }
    }

    /// Run every active case in order over `session`
    pub async fn run(
        &self,
        session: &dyn Dispatch,
        cases: &[TestCase],
        basic: &BasicData,
    ) -> Report {
        let mut ctx = RunContext::new(session);
        let basic = basic.to_json();
        let mut aborted = false;

        tracing::info!(
            "Running {} of {} test cases",
            cases.iter().filter(|case| case.is_active).count(),
            cases.len()
        );

        for case in cases {
            if !case.is_active {
                tracing::debug!("API: {} >> inactive, skipped", case.title);
                continue;
            }

            let body = match self.body(&ctx, case, &basic) {
                Ok(body) => body,
                Err(failure) => {
                    ctx.fail(case, failure);
                    continue;
                }
            };

            if case.checkpoint.trim().is_empty() {
                ctx.fail(case, CaseFailure::EmptyCheckpoint);
                continue;
            }

            if self.is_login(case) {
                let verdict = self.login(&mut ctx, case, body.as_ref()).await;
                ctx.timings.push(Timing {
                    title: case.title.clone(),
                    elapsed: verdict.elapsed,
                });
                let abandoned = verdict.state() == LoginState::Abandoned;
                ctx.record(&case.id, verdict.outcome);
                if abandoned {
                    aborted = true;
                    break;
                }
            } else {
                let started = Instant::now();
                let outcome = self.execute(&mut ctx, case, body.as_ref()).await;
                ctx.timings.push(Timing {
                    title: case.title.clone(),
                    elapsed: started.elapsed(),
                });
                ctx.record(&case.id, outcome);
            }
        }

        let report = ctx.into_report(aborted);
        tracing::info!(
            "Run finished: {} executed, {} passed{}",
            report.executed(),
            report.passed(),
            if report.aborted { ", aborted at login" } else { "" }
        );
        report
    }
}
