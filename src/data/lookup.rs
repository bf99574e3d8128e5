//! Registry lookup service client
//!
//! Fetches company data from the registry lookup endpoint
//! (`GET {base_url}/api/registry/{registry_number}`), which fronts the
//! Estonian Business Registry SOAP API and answers with JSON.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::CompanyRecord;

/// Default base URL of the lookup endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

/// Errors that can occur when looking up a registry number
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The endpoint answered but reported no matching company
    #[error("{0}")]
    NotFound(String),

    /// Failed to parse the response body
    #[error("Failed to parse lookup response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A required field was missing from a successful response
    #[error("Missing expected field in response: {0}")]
    MissingField(&'static str),
}

/// A service that resolves a registry number to a company record
///
/// The cache only depends on this trait, so tests and alternative
/// transports can stand in for the HTTP client.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Looks up a single registry number
    async fn lookup(&self, registry_number: &str) -> Result<CompanyRecord, LookupError>;
}

/// JSON body returned by the lookup endpoint
///
/// Every field is optional because error bodies only carry `error`, and
/// older endpoint versions report the name as `companyName`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, alias = "companyName")]
    name: Option<String>,
    #[serde(default)]
    registry_code: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    registry_number: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the registry lookup endpoint
#[derive(Debug, Clone)]
pub struct HttpRegistryLookup {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL of the endpoint (allows override for testing)
    base_url: String,
}

impl HttpRegistryLookup {
    /// Creates a new client against the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a new client with a custom HTTP client
    pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    /// Returns the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the request URL for a registry number
    fn lookup_url(&self, registry_number: &str) -> String {
        format!(
            "{}/api/registry/{}",
            self.base_url,
            encode_path_segment(registry_number)
        )
    }
}

impl Default for HttpRegistryLookup {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl RegistryLookup for HttpRegistryLookup {
    async fn lookup(&self, registry_number: &str) -> Result<CompanyRecord, LookupError> {
        let response = self
            .http_client
            .get(self.lookup_url(registry_number))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        interpret_response(status, &body, registry_number)
    }
}

/// Turns a raw endpoint response into a company record or a lookup error
///
/// # Behavior
/// - Non-2xx status fails with the body's `error` message, or
///   `HTTP error! status: N` when the body has none
/// - `success: false` fails with the body's `error`, or `Company not found`
/// - Missing `registryCode`/`registryNumber` fall back to the requested number
fn interpret_response(
    status: StatusCode,
    body: &str,
    registry_number: &str,
) -> Result<CompanyRecord, LookupError> {
    if !status.is_success() {
        let message = serde_json::from_str::<LookupResponse>(body)
            .ok()
            .and_then(|response| response.error)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        return Err(LookupError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let response: LookupResponse = serde_json::from_str(body)?;

    if !response.success {
        return Err(LookupError::NotFound(
            response
                .error
                .unwrap_or_else(|| "Company not found".to_string()),
        ));
    }

    let name = response.name.ok_or(LookupError::MissingField("name"))?;

    Ok(CompanyRecord {
        name,
        registry_code: response
            .registry_code
            .unwrap_or_else(|| registry_number.to_string()),
        status: response.status.unwrap_or_else(|| "Unknown".to_string()),
        address: response.address,
        registry_number: response
            .registry_number
            .unwrap_or_else(|| registry_number.to_string()),
        success: true,
        is_mock: false,
    })
}

/// Percent-encodes the characters that would break a single path segment
fn encode_path_segment(s: &str) -> String {
    s.replace('%', "%25")
        .replace('/', "%2F")
        .replace(' ', "%20")
        .replace('?', "%3F")
        .replace('#', "%23")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url_joins_base_and_number() {
        let client = HttpRegistryLookup::new("http://example.test/");
        assert_eq!(
            client.lookup_url("12345678"),
            "http://example.test/api/registry/12345678"
        );
    }

    #[test]
    fn test_lookup_url_escapes_path_characters() {
        let client = HttpRegistryLookup::new("http://example.test");
        assert_eq!(
            client.lookup_url("12/45 78"),
            "http://example.test/api/registry/12%2F45%2078"
        );
    }

    #[test]
    fn test_interpret_full_success_body() {
        let body = r#"{
            "success": true,
            "name": "Näidis OÜ",
            "registryCode": "10000000",
            "status": "Registered",
            "address": "Harju maakond, Tallinn",
            "registryNumber": "10000000"
        }"#;

        let record = interpret_response(StatusCode::OK, body, "10000000").expect("should parse");

        assert_eq!(record.name, "Näidis OÜ");
        assert_eq!(record.registry_code, "10000000");
        assert_eq!(record.status, "Registered");
        assert_eq!(record.address.as_deref(), Some("Harju maakond, Tallinn"));
        assert!(record.success);
        assert!(!record.is_mock);
    }

    #[test]
    fn test_interpret_company_name_alias() {
        let body = r#"{"registryNumber": "10000000", "companyName": "Näidis OÜ", "success": true}"#;

        let record = interpret_response(StatusCode::OK, body, "10000000").expect("should parse");

        assert_eq!(record.name, "Näidis OÜ");
        assert_eq!(record.registry_code, "10000000");
        assert_eq!(record.status, "Unknown");
        assert!(record.address.is_none());
    }

    #[test]
    fn test_interpret_success_false_uses_body_error() {
        let body = r#"{"success": false, "error": "No such company"}"#;

        let err = interpret_response(StatusCode::OK, body, "10000000").unwrap_err();

        assert!(matches!(err, LookupError::NotFound(_)));
        assert_eq!(err.to_string(), "No such company");
    }

    #[test]
    fn test_interpret_success_false_default_message() {
        let body = r#"{"registryNumber": "10000000", "companyName": null, "success": false}"#;

        let err = interpret_response(StatusCode::OK, body, "10000000").unwrap_err();

        assert_eq!(err.to_string(), "Company not found");
    }

    #[test]
    fn test_interpret_error_status_with_body_error() {
        let body = r#"{"error": "Failed to fetch company information", "registryNumber": "10000000"}"#;

        let err =
            interpret_response(StatusCode::INTERNAL_SERVER_ERROR, body, "10000000").unwrap_err();

        match err {
            LookupError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to fetch company information");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_error_status_without_json_body() {
        let err = interpret_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", "1")
            .unwrap_err();

        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[test]
    fn test_interpret_invalid_json_on_success_status() {
        let err = interpret_response(StatusCode::OK, "not json", "10000000").unwrap_err();
        assert!(matches!(err, LookupError::ParseError(_)));
    }

    #[test]
    fn test_interpret_success_without_name() {
        let err = interpret_response(StatusCode::OK, r#"{"success": true}"#, "10000000")
            .unwrap_err();
        assert!(matches!(err, LookupError::MissingField("name")));
    }
}
