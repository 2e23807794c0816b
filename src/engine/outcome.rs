//! Case outcomes, timings, and the run report

use serde_json::{json, Value};
use std::time::Duration;

use super::CaseFailure;

/// What a case left behind for later cases to read through `res[...]`
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The decoded response of a case whose checkpoint held
    Response(Value),
    Failed(CaseFailure),
}

impl Outcome {
    /// Value seen by later expressions; failures read as `{"msg": "failed"}`
    pub fn as_value(&self) -> Value {
        match self {
            Outcome::Response(value) => value.clone(),
            Outcome::Failed(_) => json!({"msg": "failed"}),
        }
    }

    /// Compact serialized form, searched by the login success marker
    pub fn serialized(&self) -> String {
        self.as_value().to_string()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Response(_))
    }

    pub fn failure(&self) -> Option<&CaseFailure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            Outcome::Response(_) => None,
        }
    }
}

/// Wall-clock time of one executed case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub title: String,
    pub elapsed: Duration,
}

impl Timing {
    /// Seconds, two decimals
    pub fn seconds(&self) -> String {
        format!("{:.2}", self.elapsed.as_secs_f64())
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// HTML failure report; empty when every executed case passed
    pub failures: String,
    /// Outcomes keyed by case id, in first-execution order
    pub outcomes: Vec<(String, Outcome)>,
    /// Timings in execution order
    pub timings: Vec<Timing>,
    /// Timings slowest first, present only when nothing failed
    pub ranking: Option<Vec<Timing>>,
    /// The login case was abandoned and later cases never ran
    pub aborted: bool,
    pub login_succeeded: bool,
}

impl Report {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(case_id, _)| case_id == id)
            .map(|(_, outcome)| outcome)
    }

    /// Number of cases that reached an outcome
    pub fn executed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }
}

/// Timings sorted slowest first; ties keep execution order
pub fn rank(timings: &[Timing]) -> Vec<Timing> {
    let mut ranked = timings.to_vec();
    ranked.sort_by(|a, b| b.elapsed.cmp(&a.elapsed));
    ranked
}
