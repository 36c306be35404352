//! Transport Layer for the compile session
//!
//! Abstracts HTTP for testability. Provides:
//! - Transport trait: form POST and query GET against the API endpoint
//! - MockTransport: in-process mock compile service for unit tests
//! - HttpTransport: reqwest blocking client for production

use std::time::Duration;

use tracing::debug;
use url::Url;

use super::trace::{RequestTrace, TraceRecorder};
use crate::credentials::Credentials;
use crate::mock::MockCompileService;

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the service rejected the credentials.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, for error reports.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport trait for API communication
pub trait Transport: Send + Sync {
    /// POST a form-encoded body to `path` (relative to the endpoint).
    fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, TransportError>;

    /// GET `path` with query parameters.
    fn get(&self, path: &str, query: &[(String, String)]) -> Result<HttpResponse, TransportError>;

    /// Requests and responses recorded so far.
    fn trace(&self) -> RequestTrace;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Mock transport for testing - connects directly to MockCompileService in-process
pub struct MockTransport {
    service: MockCompileService,
    recorder: TraceRecorder,
}

impl MockTransport {
    /// Create a new mock transport with a fresh mock service
    pub fn new() -> Self {
        Self::with_service(MockCompileService::new())
    }

    /// Create a mock transport with a pre-configured service
    pub fn with_service(service: MockCompileService) -> Self {
        Self {
            service,
            recorder: TraceRecorder::new(),
        }
    }

    /// Get a reference to the underlying mock service for test configuration
    pub fn service(&self) -> &MockCompileService {
        &self.service
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        self.recorder.record(format!("-> POST {}", path));
        let response = self.service.handle("POST", path, form);
        self.recorder.record_response(response.status, &response.body);
        Ok(response)
    }

    fn get(&self, path: &str, query: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        self.recorder.record(format!("-> GET {}", path));
        let response = self.service.handle("GET", path, query);
        self.recorder.record_response(response.status, &response.body);
        Ok(response)
    }

    fn trace(&self) -> RequestTrace {
        self.recorder.snapshot()
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// API endpoint; paths are joined onto it
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: rcc_protocol::DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: 120,
            user_agent: format!("rcc/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP transport for production use
///
/// One blocking client, with basic auth, serves every request of a session.
pub struct HttpTransport {
    base: Url,
    client: reqwest::blocking::Client,
    credentials: Credentials,
    recorder: TraceRecorder,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration
    pub fn new(config: HttpConfig, credentials: Credentials) -> Result<Self, TransportError> {
        let base = Self::parse_endpoint(&config.endpoint)?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base,
            client,
            credentials,
            recorder: TraceRecorder::new(),
        })
    }

    /// Parse the endpoint, making sure relative paths join below it.
    fn parse_endpoint(endpoint: &str) -> Result<Url, TransportError> {
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{}/", endpoint)
        };

        let url = Url::parse(&normalized).map_err(|e| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base.join(path).map_err(|e| TransportError::InvalidEndpoint {
            endpoint: self.base.to_string(),
            reason: e.to_string(),
        })
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<HttpResponse, TransportError> {
        let response = match request
            .basic_auth(&self.credentials.username, Some(self.credentials.password.expose()))
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                self.recorder.record(format!("<- failed: {}", e));
                return Err(e.into());
            }
        };

        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        self.recorder.record_response(status, &body);
        debug!(status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        let url = self.url(path)?;
        // Field names only; replace contents can be large.
        let keys: Vec<&str> = form.iter().map(|(k, _)| k.as_str()).collect();
        self.recorder.record(format!("-> POST {} fields={:?}", url, keys));
        debug!(%url, fields = ?keys, "POST");

        self.send(self.client.post(url).form(form))
    }

    fn get(&self, path: &str, query: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        let url = self.url(path)?;
        self.recorder.record(format!("-> GET {} query={:?}", url, query));
        debug!(%url, "GET");

        self.send(self.client.get(url).query(query))
    }

    fn trace(&self) -> RequestTrace {
        self.recorder.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Secret;

    fn credentials() -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: Secret::new("pw"),
        }
    }

    #[test]
    fn test_mock_transport_records_trace() {
        let transport = MockTransport::new();
        let form = vec![("platform".to_string(), "K64F".to_string())];

        let response = transport.post_form("start/", &form).unwrap();
        assert_eq!(response.status, 200);

        let trace = transport.trace();
        assert_eq!(trace.len(), 2);
        assert!(trace.entries[0].line.contains("POST start/"));
    }

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let config = HttpConfig {
            endpoint: "https://example.org/api/v2/tasks/compiler".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(config, credentials()).unwrap();
        assert_eq!(
            transport.url("output/t-1").unwrap().as_str(),
            "https://example.org/api/v2/tasks/compiler/output/t-1"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = HttpConfig {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpTransport::new(config, credentials()),
            Err(TransportError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_auth_rejection_statuses() {
        assert!(HttpResponse::new(401, "").is_auth_rejection());
        assert!(HttpResponse::new(403, "").is_auth_rejection());
        assert!(!HttpResponse::new(500, "").is_auth_rejection());
        assert!(HttpResponse::new(204, "").is_success());
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.endpoint, rcc_protocol::DEFAULT_ENDPOINT);
        assert!(config.user_agent.starts_with("rcc/"));
    }
}
