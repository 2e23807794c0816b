//! Mutable state shared by every case in a run

use serde_json::{Map, Value};

use super::outcome::{rank, Outcome, Report, Timing};
use super::request::Dispatch;
use super::{CaseFailure, FailureLog, TestCase, NO_TESTS_EXECUTED};

/// State of one run: the shared session, prior outcomes, timings, and the
/// accumulated failure report
pub struct RunContext<'s> {
    pub(super) session: &'s dyn Dispatch,
    pub(super) outcomes: Vec<(String, Outcome)>,
    pub(super) timings: Vec<Timing>,
    pub(super) failures: FailureLog,
    pub(super) login_succeeded: bool,
}

impl<'s> RunContext<'s> {
    pub fn new(session: &'s dyn Dispatch) -> Self {
        Self {
            session,
            outcomes: Vec::new(),
            timings: Vec::new(),
            failures: FailureLog::default(),
            login_succeeded: false,
        }
    }

    /// Store the outcome for `id`; a repeated id replaces the earlier one
    pub fn record(&mut self, id: &str, outcome: Outcome) {
        match self.outcomes.iter_mut().find(|(case_id, _)| case_id == id) {
            Some(slot) => {
                tracing::warn!("Case id '{}' appears more than once; keeping the latest outcome", id);
                slot.1 = outcome;
            }
            None => self.outcomes.push((id.to_string(), outcome)),
        }
    }

    /// Report `failure` and store it as the case's outcome
    pub fn fail(&mut self, case: &TestCase, failure: CaseFailure) {
        self.failures.record(case, &failure);
        self.record(&case.id, Outcome::Failed(failure));
    }

    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(case_id, _)| case_id == id)
            .map(|(_, outcome)| outcome)
    }

    /// Prior outcomes as the `res` mapping seen by expressions
    pub fn results(&self) -> Value {
        let map: Map<String, Value> = self
            .outcomes
            .iter()
            .map(|(id, outcome)| (id.clone(), outcome.as_value()))
            .collect();
        Value::Object(map)
    }

    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Close the run and assemble its report
    pub fn into_report(self, aborted: bool) -> Report {
        let mut failures = self.failures.into_string();
        if self.outcomes.is_empty() {
            tracing::error!("{}", NO_TESTS_EXECUTED);
            failures = format!("{}<br>", NO_TESTS_EXECUTED);
        }
        let ranking = failures.is_empty().then(|| rank(&self.timings));

        Report {
            failures,
            outcomes: self.outcomes,
            timings: self.timings,
            ranking,
            aborted,
            login_succeeded: self.login_succeeded,
        }
    }
}
