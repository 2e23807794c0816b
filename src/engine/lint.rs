//! Offline case checks

use super::{BodyType, CaseFailure, Method, TestCase};
use crate::checkpoint::Expression;

/// Problems a run would hit on `case` before or regardless of any response
///
/// Expressions are only parsed; names like `resp` are not resolved.
pub fn lint(case: &TestCase) -> Vec<CaseFailure> {
    let mut problems = Vec::new();

    let body_type = BodyType::parse(&case.body_type);
    if body_type.is_none() {
        problems.push(CaseFailure::InvalidBodyType(case.body_type.clone()));
    }
    let method = Method::parse(&case.method);
    if method.is_none() {
        problems.push(CaseFailure::InvalidMethod(case.method.clone()));
    }

    if !case.body.trim().is_empty() {
        if let Err(e) = Expression::parse(&case.body) {
            problems.push(CaseFailure::BodyEval(e));
        }
    }

    if case.checkpoint.trim().is_empty() {
        problems.push(CaseFailure::EmptyCheckpoint);
    } else if let Err(e) = Expression::parse(&case.checkpoint) {
        problems.push(CaseFailure::CheckpointEval(e));
    }

    if method == Some(Method::Post)
        && body_type == Some(BodyType::Multipart)
        && case.upload_file.trim().is_empty()
    {
        problems.push(CaseFailure::Transport(
            "multipart case has no \"req_file\" to upload".to_string(),
        ));
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::case;

    #[test]
    fn test_clean_case() {
        assert!(lint(&case("q", "Query", "/q", "resp['msg'] == 'ok'")).is_empty());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut bad = case("q", "Query", "/q", "resp['msg'] ==");
        bad.method = "delete".to_string();
        bad.body = "{'a': }".to_string();

        let problems = lint(&bad);
        assert_eq!(problems.len(), 3);
        assert_eq!(problems[0], CaseFailure::InvalidMethod("delete".to_string()));
        assert!(matches!(problems[1], CaseFailure::BodyEval(_)));
        assert!(matches!(problems[2], CaseFailure::CheckpointEval(_)));
    }

    #[test]
    fn test_multipart_needs_upload_file() {
        let mut upload = case("u", "Upload", "/upload", "status == 200");
        upload.method = "post".to_string();
        upload.body_type = "multipart".to_string();
        assert!(matches!(lint(&upload).as_slice(), [CaseFailure::Transport(_)]));
    }
}
