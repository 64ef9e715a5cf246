use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 15_000;

/// Connect and read deadlines in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub connect_ms: u64,
    pub read_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl TimeoutConfig {
    /// Unset or zero values fall back to the defaults.
    pub const fn new(connect_ms: Option<u64>, read_ms: Option<u64>) -> Self {
        Self {
            connect_ms: or_default(connect_ms, DEFAULT_CONNECT_TIMEOUT_MS),
            read_ms: or_default(read_ms, DEFAULT_READ_TIMEOUT_MS),
        }
    }

    pub const fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub const fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }
}

const fn or_default(value: Option<u64>, default: u64) -> u64 {
    match value {
        Some(0) | None => default,
        Some(value) => value,
    }
}

pub struct SchemaFetcher {
    client: Client,
}

impl SchemaFetcher {
    pub fn new(timeout: TimeoutConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(timeout.connect())
            .timeout(timeout.read())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// Downloads the document served at `endpoint` and returns it as text.
    /// The body is read completely before this returns.
    pub async fn fetch(
        &self,
        endpoint: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<String, FetchError> {
        let url = parse_endpoint(endpoint)?;
        let headers = build_headers(headers)?;

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, %body, "schema request rejected");
            return Err(FetchError::HttpStatus {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(endpoint, e))?;

        String::from_utf8(Vec::from(body)).map_err(|source| FetchError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// Fetches the schema text from `endpoint` with a client configured for `timeout`.
pub async fn fetch(
    endpoint: &str,
    headers: &BTreeMap<String, String>,
    timeout: TimeoutConfig,
) -> Result<String, FetchError> {
    SchemaFetcher::new(timeout)?.fetch(endpoint, headers).await
}

fn parse_endpoint(endpoint: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    if endpoint.trim().is_empty() {
        return Err(invalid("endpoint must not be empty".to_string()));
    }

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let invalid = |reason: String| FetchError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        if map.contains_key(&header_name) {
            return Err(invalid("given more than once with different casing".to_string()));
        }
        map.insert(header_name, header_value);
    }

    Ok(map)
}
