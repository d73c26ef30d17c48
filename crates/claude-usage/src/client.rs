//! HTTP client for the Anthropic usage API.
//!
//! This module provides the async client used to fetch the rate-limit
//! snapshot. It handles authentication, headers, timeouts and error mapping.
//! It never retries: the caller's polling schedule is the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::ApiError;
use crate::types::UsageData;

/// Anthropic OAuth usage API endpoint.
pub const USAGE_API_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Name of the API-version header required by OAuth endpoints.
pub const BETA_HEADER_NAME: &str = "anthropic-beta";

/// Required beta header value for OAuth endpoints.
pub const BETA_HEADER: &str = "oauth-2025-04-20";

/// Default bound on a single request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CLIENT_USER_AGENT: &str = concat!("claude-usage/", env!("CARGO_PKG_VERSION"));

/// Source of remote usage snapshots.
///
/// [`UsageClient`] is the production implementation; the sync engine takes
/// any implementation so tests can script responses.
#[async_trait]
pub trait UsageApi: Send + Sync {
    /// Issue exactly one usage request authenticated with `token`.
    async fn fetch_usage(&self, token: &str) -> Result<UsageData, ApiError>;
}

/// Async client for the usage endpoint.
#[derive(Debug, Clone)]
pub struct UsageClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl UsageClient {
    /// Client for the production endpoint with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Self::with_url(USAGE_API_URL, timeout)
    }

    /// Client for an arbitrary endpoint URL (used by tests and proxies).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    /// Endpoint this client calls.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn headers(token: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        // Generic message: the token must not leak into error strings.
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::Transport("Invalid token format".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(BETA_HEADER_NAME, HeaderValue::from_static(BETA_HEADER));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        Ok(headers)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Transport(format!(
                "Request timed out after {}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            ApiError::Transport(format!("Network error: {e}"))
        }
    }
}

#[async_trait]
impl UsageApi for UsageClient {
    async fn fetch_usage(&self, token: &str) -> Result<UsageData, ApiError> {
        let response = self
            .http
            .get(&self.url)
            .headers(Self::headers(token)?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = status.as_u16(), "usage endpoint responded");

        if status != StatusCode::OK {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            return Err(map_status(status.as_u16(), retry_after));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        decode_usage(&body)
    }
}

/// Map a non-200 status to its error.
pub(crate) fn map_status(status: u16, retry_after: Option<String>) -> ApiError {
    match status {
        401 => ApiError::Unauthorized,
        _ => ApiError::Http {
            status,
            retry_after,
        },
    }
}

/// Decode a 200 body. A malformed body is a transport failure carrying the
/// decoder's message.
pub fn decode_usage(body: &str) -> Result<UsageData, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::Transport(format!("Failed to parse usage response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_is_correct() {
        assert_eq!(USAGE_API_URL, "https://api.anthropic.com/api/oauth/usage");
    }

    #[test]
    fn test_beta_header_is_correct() {
        assert_eq!(BETA_HEADER_NAME, "anthropic-beta");
        assert_eq!(BETA_HEADER, "oauth-2025-04-20");
    }

    #[test]
    fn test_map_status_401_is_unauthorized() {
        assert_eq!(map_status(401, None), ApiError::Unauthorized);
    }

    #[test]
    fn test_map_status_403_is_plain_http_error() {
        assert_eq!(
            map_status(403, None),
            ApiError::Http {
                status: 403,
                retry_after: None
            }
        );
    }

    #[test]
    fn test_map_status_keeps_retry_after() {
        let err = map_status(429, Some("120".to_string()));
        assert_eq!(
            err,
            ApiError::Http {
                status: 429,
                retry_after: Some("120".to_string())
            }
        );
    }

    #[test]
    fn test_decode_usage_malformed_body_is_transport() {
        let err = decode_usage("<html>oops</html>").expect_err("should fail");
        match err {
            ApiError::Transport(msg) => assert!(msg.starts_with("Failed to parse usage response")),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_headers_reject_token_with_newline() {
        let err = UsageClient::headers("bad\ntoken").expect_err("should reject");
        assert_eq!(err, ApiError::Transport("Invalid token format".to_string()));
    }

    #[test]
    fn test_headers_include_required_values() {
        let headers = UsageClient::headers("tok").expect("valid token");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[BETA_HEADER_NAME], BETA_HEADER);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_client_default_url() {
        let client = UsageClient::new(DEFAULT_TIMEOUT).expect("client");
        assert_eq!(client.url(), USAGE_API_URL);
    }
}
