//! End-to-end tests against a mock HTTP server
//!
//! These run the real reqwest session, so cookies, headers and body
//! encodings are exercised exactly as a workbook run would send them.

use apitest::common::Config;
use apitest::engine::{
    CaseFailure, Engine, FailureClass, FsExportSink, HttpSession, Outcome, TestCase, TokioPause,
};
use apitest::workbook::{Suite, Workbook};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{
    body_json, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_config() -> Config {
    let mut config = Config::default();
    config.retry.backoff_secs = 0;
    config.login.backoff_secs = 0;
    config
}

fn case(id: &str, host: &str, path: &str, method: &str, checkpoint: &str) -> TestCase {
    TestCase {
        id: id.to_string(),
        title: format!("Case {}", id),
        is_active: true,
        host: host.to_string(),
        path: path.to_string(),
        method: method.to_string(),
        checkpoint: checkpoint.to_string(),
        ..Default::default()
    }
}

async fn run(config: &Config, cases: &[TestCase], export_dir: &std::path::Path) -> apitest::Report {
    let session = HttpSession::new(config).unwrap();
    let export = FsExportSink::new(export_dir);
    Engine::new(config, &TokioPause, &export)
        .run(&session, cases, &Default::default())
        .await
}

#[tokio::test]
async fn test_login_cookie_is_sent_on_later_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_string_contains("user=admin"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=abc123; Path=/")
                .set_body_string(r#"{"msg": "success"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/role/query"))
        .and(header("cookie", "sid=abc123"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"total": 2}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut login = case("login", &server.uri(), "/user/login", "post", "status == 200");
    login.body = "{'user': 'admin', 'pwd': 'secret'}".to_string();
    let mut query = case(
        "query",
        &server.uri(),
        "/role/query",
        "get",
        "resp['data']['total'] == 2",
    );
    query.body = "{'page': 1}".to_string();

    let dir = tempfile::tempdir().unwrap();
    let report = run(&quick_config(), &[login, query], dir.path()).await;

    assert!(!report.has_failures(), "{}", report.failures);
    assert!(report.login_succeeded);
    assert_eq!(
        report.outcome("query"),
        Some(&Outcome::Response(json!({"data": {"total": 2}})))
    );
}

#[tokio::test]
async fn test_json_body_and_fixed_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/role/update"))
        .and(header_regex("content-type", "^application/json"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_json(json!({"a": 1, "name": "ops"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"msg": "success"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut update = case(
        "update",
        &server.uri(),
        "/role/update",
        "post",
        "resp['msg'] == 'success'",
    );
    update.body_type = "json".to_string();
    update.body = "{'a': 1, 'name': 'ops'}".to_string();

    let dir = tempfile::tempdir().unwrap();
    let report = run(&quick_config(), &[update], dir.path()).await;

    assert!(!report.has_failures(), "{}", report.failures);
}

#[tokio::test]
async fn test_export_file_is_saved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fans/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,name\n1,ann\n".to_vec()))
        .mount(&server)
        .await;

    let export = case(
        "export",
        &server.uri(),
        "/fans/export",
        "get",
        "export_file == 'fans.csv'",
    );

    let dir = tempfile::tempdir().unwrap();
    let report = run(&quick_config(), &[export], dir.path()).await;

    assert!(!report.has_failures(), "{}", report.failures);
    let saved = std::fs::read(dir.path().join("fans.csv")).unwrap();
    assert_eq!(saved, b"id,name\n1,ann\n");
}

#[tokio::test]
async fn test_multipart_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fans/import"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("row-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"msg": "imported"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let upload_path = dir.path().join("fans.csv");
    std::fs::write(&upload_path, "row-1\n").unwrap();

    let mut upload = case(
        "import",
        &server.uri(),
        "/fans/import",
        "post",
        "resp['msg'] == 'imported'",
    );
    upload.body_type = "multipart".to_string();
    upload.upload_file = upload_path.display().to_string();

    let report = run(&quick_config(), &[upload], dir.path()).await;

    assert!(!report.has_failures(), "{}", report.failures);
}

#[tokio::test]
async fn test_missing_upload_file_is_transport_failure() {
    let mut upload = case("import", "127.0.0.1:9", "/import", "post", "True");
    upload.body_type = "multipart".to_string();
    upload.upload_file = "/nonexistent/upload.csv".to_string();

    let dir = tempfile::tempdir().unwrap();
    let report = run(&quick_config(), &[upload], dir.path()).await;

    assert_eq!(
        report
            .outcome("import")
            .and_then(Outcome::failure)
            .map(CaseFailure::class),
        Some(FailureClass::Transport)
    );
}

#[tokio::test]
async fn test_refused_connection_is_reported_after_retries() {
    // Bind and drop a listener to get a port nothing listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let host = format!("127.0.0.1:{}", port);
    let ping = case("ping", &host, "/ping", "get", "status == 200");

    let dir = tempfile::tempdir().unwrap();
    let report = run(&quick_config(), &[ping], dir.path()).await;

    assert_eq!(
        report
            .outcome("ping")
            .and_then(Outcome::failure)
            .map(CaseFailure::class),
        Some(FailureClass::Connection)
    );
    assert!(report.failures.contains("Case ping"));
}

#[tokio::test]
async fn test_request_timeout_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(1)
        .mount(&server)
        .await;

    let config = quick_config();
    let session = HttpSession::with_timeout(Duration::from_millis(200)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let export = FsExportSink::new(dir.path());
    let slow = case("slow", &server.uri(), "/slow", "get", "status == 200");

    let report = Engine::new(&config, &TokioPause, &export)
        .run(&session, &[slow], &Default::default())
        .await;

    assert_eq!(
        report
            .outcome("slow")
            .and_then(Outcome::failure)
            .map(CaseFailure::class),
        Some(FailureClass::Transport)
    );
}

#[tokio::test]
async fn test_workbook_run_skips_inactive_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/b"))
        .and(body_json(json!({"token": "t-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code": 0}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/c"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let host = server.uri();
    let yaml = format!(
        r#"
sheets:
  Basic Data:
    - [key, value]
    - [Setting, Value]
    - [token, t-1]
    - [if_mail, 0]
  Test Case:
    - [api_id, api_title, is_active, api_host, req_url, req_method, req_data_type, req_data, req_file, check_point]
    - [id, title, active, host, url, method, type, data, file, check]
    - [A, Ping, "yes", "{host}", /a, get, "", ~, ~, "True"]
    - [B, Use token, "yes", "{host}", /b, post, json, "{{'token': basic_data['token']}}", ~, "resp['code'] == 0 and res['A'] == 'pong'"]
    - [C, Disabled, "no", "{host}", /c, get, "", ~, ~, "True"]
"#,
        host = host
    );
    let config = quick_config();
    let suite = Suite::from_workbook(&Workbook::parse(&yaml).unwrap(), &config.workbook).unwrap();

    let session = HttpSession::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let export = FsExportSink::new(dir.path());
    let report = Engine::new(&config, &TokioPause, &export)
        .run(&session, &suite.cases, &suite.basic)
        .await;

    assert!(!report.has_failures(), "{}", report.failures);
    let ids: Vec<&str> = report.outcomes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    let titles: Vec<&str> = report.timings.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Ping", "Use token"]);
}
