//! Test case records
//!
//! A `TestCase` is one workbook row, kept as loosely as the workbook holds
//! it. Method and body type are validated when the request is prepared, so
//! a bad row fails on its own without stopping the run.

use std::fmt;

/// One test-case row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCase {
    /// Unique key, used by `res[...]` lookups
    pub id: String,
    pub title: String,
    /// True only when the row's active flag is the literal `yes`
    pub is_active: bool,
    pub host: String,
    pub path: String,
    /// Raw method text (`get` or `post`)
    pub method: String,
    /// Raw body type text; empty means urlencoded
    pub body_type: String,
    /// Body expression, empty when the row sends no data
    pub body: String,
    /// Upload path for multipart cases
    pub upload_file: String,
    /// Checkpoint expression
    pub checkpoint: String,
}

impl TestCase {
    /// Request URL: host and path concatenated, `http://` assumed when the
    /// host carries no scheme
    pub fn url(&self) -> String {
        if self.host.contains("://") {
            format!("{}{}", self.host, self.path)
        } else {
            format!("http://{}{}", self.host, self.path)
        }
    }
}

/// HTTP method supported by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "get"),
            Method::Post => write!(f, "post"),
        }
    }
}

/// Encoding of the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    UrlEncoded,
    Json,
    Multipart,
}

impl BodyType {
    /// Parse either the short name or the MIME type; empty means urlencoded
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "urlencoded" | "application/x-www-form-urlencoded" => Some(BodyType::UrlEncoded),
            "json" | "application/json" => Some(BodyType::Json),
            "multipart" | "multipart/form-data" => Some(BodyType::Multipart),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            BodyType::UrlEncoded => "application/x-www-form-urlencoded",
            BodyType::Json => "application/json",
            BodyType::Multipart => "multipart/form-data",
        }
    }

    /// `Content-Type` header value; multipart leaves it to the transport so
    /// the boundary is filled in
    pub fn content_type(&self) -> Option<String> {
        match self {
            BodyType::UrlEncoded | BodyType::Json => Some(format!("{}; charset=UTF-8", self.mime())),
            BodyType::Multipart => None,
        }
    }
}
