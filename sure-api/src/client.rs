use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use sure_core::{CliError, ErrorCode, classify_http_status};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("sure-cli/", env!("CARGO_PKG_VERSION"));

/// How requests authenticate against the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `X-Api-Key`
    ApiKey(String),
    /// Sent as `Authorization: Bearer ...`
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credential: Credential,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            credential,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SureClient {
    http: reqwest::Client,
    base_url: String,
}

impl SureClient {
    pub fn new(config: &ClientConfig) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match &config.credential {
            Credential::ApiKey(key) => {
                headers.insert("x-api-key", sensitive_header(key)?);
            }
            Credential::Bearer(token) => {
                headers.insert(AUTHORIZATION, sensitive_header(&format!("Bearer {token}"))?);
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError::wrap(ErrorCode::ConfigInvalid, "Could not build HTTP client", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and decode the JSON body.
    /// Transport failures and non-2xx statuses come back classified.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CliError> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = body_or_empty(resp.text().await);
            debug!(status = status.as_u16(), "request failed");
            return Err(classify_http_status(status.as_u16(), &body));
        }

        let bytes = resp.bytes().await.map_err(classify_transport_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CliError::wrap(ErrorCode::Unknown, "Unexpected response body", e))
    }
}

/// Error bodies are best effort; a failed read is logged and treated as empty.
fn body_or_empty<E: std::fmt::Display>(body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| {
        debug!(error = %e, "could not read error response body");
        String::new()
    })
}

fn sensitive_header(value: &str) -> Result<HeaderValue, CliError> {
    let mut v = HeaderValue::from_str(value).map_err(|e| {
        CliError::wrap(ErrorCode::ConfigInvalid, "Credential contains invalid characters", e)
    })?;
    v.set_sensitive(true);
    Ok(v)
}

/// Classify a reqwest failure (timeout, refused connection, DNS, other).
pub fn classify_transport_error(err: reqwest::Error) -> CliError {
    let (code, message) = transport_error_kind(err.is_timeout(), &error_chain(&err));
    CliError::wrap(code, message, err)
}

fn transport_error_kind(timed_out: bool, chain: &str) -> (ErrorCode, &'static str) {
    if timed_out {
        return (ErrorCode::Timeout, "Request timed out");
    }
    let chain = chain.to_lowercase();
    if chain.contains("connection refused") {
        return (ErrorCode::Network, "Connection refused - is the server running?");
    }
    if chain.contains("dns error")
        || chain.contains("failed to lookup address")
        || chain.contains("no such host")
    {
        return (ErrorCode::Network, "Server not found - check api_url config");
    }
    (ErrorCode::Network, "Network error")
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cause = e.source();
    }
    out
}
