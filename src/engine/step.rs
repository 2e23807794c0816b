//! The standard path for one case: send, decode, export, check

use serde_json::{json, Map, Value};

use super::context::RunContext;
use super::request::PreparedRequest;
use super::retry::with_retry;
use super::runner::Engine;
use super::{CaseFailure, Outcome, TestCase};
use crate::checkpoint::{classify_response, export_target, Expression, Scope};

impl Engine<'_> {
    /// Run `case` once (with connection retries) and report a failure into
    /// the context. The outcome is returned, not stored.
    pub(super) async fn execute(
        &self,
        ctx: &mut RunContext<'_>,
        case: &TestCase,
        body: Option<&Map<String, Value>>,
    ) -> Outcome {
        match self.attempt(ctx, case, body).await {
            Ok(resp) => {
                tracing::info!("API: {} >> passed", case.title);
                Outcome::Response(resp)
            }
            Err(failure) => {
                ctx.failures.record(case, &failure);
                Outcome::Failed(failure)
            }
        }
    }

    async fn attempt(
        &self,
        ctx: &RunContext<'_>,
        case: &TestCase,
        body: Option<&Map<String, Value>>,
    ) -> Result<Value, CaseFailure> {
        let request = PreparedRequest::prepare(case, body, &self.config.http.user_agent)?;
        let session = ctx.session;
        let response = with_retry(self.retry_policy(), self.pause, &case.title, || {
            session.send(&request)
        })
        .await?;

        let text = response.text();
        let resp = classify_response(&text);
        let mut scope = Scope::new()
            .bind("resp", resp.clone())
            .bind("res", ctx.results())
            .bind("status", json!(response.status));

        if let Some(name) = export_target(&case.checkpoint) {
            let path = self.export.save(&name, &response.body).map_err(|e| {
                CaseFailure::Transport(format!("cannot save export file '{}': {}", name, e))
            })?;
            tracing::info!("API: {} >> export saved to {}", case.title, path.display());
            scope = scope
                .bind("export_file", json!(name))
                .bind_export(&name, path);
        }

        let passed = Expression::parse(&case.checkpoint)
            .and_then(|checkpoint| checkpoint.check(&scope))
            .map_err(CaseFailure::CheckpointEval)?;

        if passed {
            Ok(resp)
        } else {
            Err(CaseFailure::CheckpointFalse {
                status: response.status,
                url: request.url,
                response: text,
            })
        }
    }
}
