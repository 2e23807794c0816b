//! Test execution engine
//!
//! [`Engine::run`] drives a list of [`TestCase`]s over one [`Dispatch`]
//! session and returns a [`Report`]. Waiting between retries and saving
//! exported files go through the [`Pause`] and [`ExportSink`] seams.

mod case;
mod context;
mod export;
mod failure;
mod lint;
mod login;
mod outcome;
mod request;
mod retry;
mod runner;
mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use case::{BodyType, Method, TestCase};
pub use context::RunContext;
pub use export::{ExportSink, FsExportSink};
pub use failure::{
    escape_html, CaseFailure, FailureClass, FailureLog, LOGIN_ABANDONED, NO_TESTS_EXECUTED,
};
pub use lint::lint;
pub use login::{is_logged_in, LoginState, LoginVerdict};
pub use outcome::{rank, Outcome, Report, Timing};
pub use request::{Dispatch, DispatchError, HttpSession, Payload, PreparedRequest, RawResponse};
pub use retry::{with_retry, Pause, RetryPolicy, TokioPause};
pub use runner::Engine;
