//! Transport seam for outbound API calls.
//!
//! The normalization layer never touches the network directly. It invokes a
//! [`Transport`], which resolves to the platform's raw response envelope or
//! rejects with a [`TransportFailure`]. Timeouts and connection management
//! are this layer's concern; nothing above it retries.

use crate::auth::TokenProvider;
use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::types::Variables;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default per-call timeout for [`HttpTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A rejected transport call.
///
/// Mirrors the platform client's rejection shape: an optional human-readable
/// message and an optional structured error list, both preserved verbatim by
/// the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
#[error("{}", .message.as_deref().unwrap_or("transport call failed"))]
pub struct TransportFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

impl TransportFailure {
    /// Creates a failure carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            errors: None,
        }
    }

    /// Attaches a structured error list.
    pub fn with_errors(mut self, errors: Vec<Value>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// The rejected value as a raw JSON value, for debug envelopes.
    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<SdkError> for TransportFailure {
    fn from(err: SdkError) -> Self {
        Self::message(err.to_string())
    }
}

/// Issues a GraphQL operation against the platform API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves to the raw response envelope, or rejects. The envelope shape
    /// is the platform's, not ours; callers must probe it defensively.
    async fn call(
        &self,
        query: &str,
        variables: Option<&Variables>,
    ) -> Result<Value, TransportFailure>;
}

/// Plain HTTP/1.1 transport over a TCP socket.
///
/// Deliberately avoids an external HTTP client dependency; HTTPS endpoints
/// require a local proxy. Credentials come from the injected
/// [`TokenProvider`] at call time.
pub struct HttpTransport {
    url: String,
    timeout: Duration,
    headers: HashMap<String, String>,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpTransport {
    /// Creates a transport for the given endpoint URL.
    pub fn new(url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            headers: HashMap::new(),
            tokens,
        }
    }

    /// Sets the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a default header sent with every call.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    async fn post(&self, body: &str, headers: &HashMap<String, String>) -> SdkResult<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        let target = HttpTarget::parse(&self.url)?;

        let connect = TcpStream::connect((target.host.as_str(), target.port));
        let mut stream = timeout(self.timeout, connect)
            .await
            .map_err(|_| SdkError::timeout())?
            .map_err(|e| {
                SdkError::new(ErrorCode::ConnectionRefused, format!("Connection failed: {e}"))
            })?;

        let request = build_request(&target, body, headers);
        timeout(self.timeout, stream.write_all(request.as_bytes()))
            .await
            .map_err(|_| SdkError::timeout())?
            .map_err(|e| SdkError::network(format!("Write failed: {e}")))?;

        let mut raw = Vec::new();
        timeout(self.timeout, stream.read_to_end(&mut raw))
            .await
            .map_err(|_| SdkError::timeout())?
            .map_err(|e| SdkError::network(format!("Read failed: {e}")))?;

        let response = RawHttpResponse::parse(&String::from_utf8_lossy(&raw))?;
        if response.status >= 400 {
            return Err(SdkError::http(format!("HTTP error: {}", response.status))
                .with_extension("body", &response.body));
        }
        Ok(response.body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        query: &str,
        variables: Option<&Variables>,
    ) -> Result<Value, TransportFailure> {
        let mut payload = serde_json::Map::new();
        payload.insert("query".into(), Value::String(query.to_string()));
        if let Some(vars) = variables {
            let vars = serde_json::to_value(vars)
                .map_err(|e| TransportFailure::from(SdkError::serialize(e.to_string())))?;
            payload.insert("variables".into(), vars);
        }
        let body = Value::Object(payload).to_string();

        let mut headers = self.headers.clone();
        match self.tokens.session_token().await {
            Ok(token) => {
                headers.insert("Authorization".into(), token);
            }
            Err(err) => {
                // Let the server reject the unauthenticated call; the
                // normalizer reports it like any other transport failure.
                debug!(error = %err, "proceeding without Authorization header");
            }
        }

        let body = self.post(&body, &headers).await.map_err(TransportFailure::from)?;
        serde_json::from_str(&body).map_err(|e| {
            TransportFailure::from(SdkError::invalid_response(format!(
                "Failed to parse response: {e}. Body: {}",
                &body[..body.len().min(200)]
            )))
        })
    }
}

/// Parsed `http://host[:port]/path` target.
#[derive(Debug)]
struct HttpTarget {
    host: String,
    port: u16,
    path: String,
}

impl HttpTarget {
    fn parse(url: &str) -> SdkResult<Self> {
        let url = url.trim();

        if url.starts_with("https://") {
            return Err(SdkError::new(
                ErrorCode::HttpsNotSupported,
                "HTTPS is not supported by the built-in transport; route the call through a local HTTP proxy or inject a custom Transport",
            ));
        }
        let rest = url.strip_prefix("http://").unwrap_or(url);

        let (authority, path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return Err(SdkError::new(ErrorCode::InvalidUrl, format!("Missing host in URL: {url}")));
        }

        let (host, port) = match authority.rfind(':') {
            Some(pos) => {
                let port = authority[pos + 1..].parse().map_err(|_| {
                    SdkError::new(
                        ErrorCode::InvalidUrl,
                        format!("Invalid port: {}", &authority[pos + 1..]),
                    )
                })?;
                (authority[..pos].to_string(), port)
            }
            None => (authority.to_string(), 80),
        };

        Ok(Self {
            host,
            port,
            path: path.to_string(),
        })
    }
}

fn build_request(target: &HttpTarget, body: &str, headers: &HashMap<String, String>) -> String {
    let mut request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        target.path,
        target.host,
        body.len()
    );
    for (key, value) in headers {
        request.push_str(&format!("{key}: {value}\r\n"));
    }
    request.push_str("\r\n");
    request.push_str(body);
    request
}

/// Minimal HTTP/1.1 response: status code plus decoded body.
struct RawHttpResponse {
    status: u16,
    body: String,
}

impl RawHttpResponse {
    fn parse(raw: &str) -> SdkResult<Self> {
        let (head, body) = raw
            .split_once("\r\n\r\n")
            .or_else(|| raw.split_once("\n\n"))
            .ok_or_else(|| SdkError::invalid_response("Could not find response body"))?;

        let status_line = head.lines().next().unwrap_or_default();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                SdkError::invalid_response(format!("Malformed status line: {status_line}"))
            })?;

        let chunked = head.lines().any(|line| {
            let line = line.to_ascii_lowercase();
            line.starts_with("transfer-encoding:") && line.contains("chunked")
        });

        let body = if chunked {
            decode_chunked(body)?
        } else {
            body.to_string()
        };

        Ok(Self { status, body })
    }
}

fn decode_chunked(body: &str) -> SdkResult<String> {
    let mut out = String::new();
    let mut rest = body;

    while let Some(line_end) = rest.find('\n') {
        let size_str = rest[..line_end].trim_end_matches('\r').trim();
        let size = usize::from_str_radix(size_str, 16)
            .map_err(|_| SdkError::invalid_response(format!("Bad chunk size: {size_str}")))?;
        if size == 0 {
            break;
        }

        let data_start = line_end + 1;
        let data_end = data_start + size;
        let chunk = rest
            .get(data_start..data_end)
            .ok_or_else(|| SdkError::invalid_response("Truncated chunk"))?;
        out.push_str(chunk);
        rest = rest[data_end..].trim_start_matches(['\r', '\n']);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let target = HttpTarget::parse("http://localhost:8302/v2").unwrap();
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 8302);
        assert_eq!(target.path, "/v2");

        let target = HttpTarget::parse("http://example.com/api/v2").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/api/v2");

        let target = HttpTarget::parse("http://example.com").unwrap();
        assert_eq!(target.path, "/");
    }

    #[test]
    fn test_parse_target_rejects_https() {
        let err = HttpTarget::parse("https://api.monday.com/v2").unwrap_err();
        assert_eq!(err.code, ErrorCode::HttpsNotSupported);
    }

    #[test]
    fn test_parse_target_rejects_bad_port() {
        let err = HttpTarget::parse("http://example.com:notaport/v2").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUrl);
    }

    #[test]
    fn test_parse_response() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"data\":{\"me\":null}}";
        let response = RawHttpResponse::parse(raw).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{\"data\":{\"me\":null}}");
    }

    #[test]
    fn test_parse_response_status_only() {
        let raw = "HTTP/1.1 401 Unauthorized\r\n\r\n{\"error_message\":\"Not authenticated\"}";
        let response = RawHttpResponse::parse(raw).unwrap();
        assert_eq!(response.status, 401);
    }

    #[test]
    fn test_decode_chunked() {
        let decoded = decode_chunked("5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n").unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn test_chunked_response_end_to_end() {
        let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n{\"a\"\r\n3\r\n:1}\r\n0\r\n\r\n";
        let response = RawHttpResponse::parse(raw).unwrap();
        assert_eq!(response.body, "{\"a\":1}");
    }

    #[test]
    fn test_build_request_has_length_and_headers() {
        let target = HttpTarget::parse("http://localhost:4000/v2").unwrap();
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let request = build_request(&target, "{\"query\":\"{ me }\"}", &headers);
        assert!(request.starts_with("POST /v2 HTTP/1.1\r\n"));
        assert!(request.contains("Content-Length: 18\r\n"));
        assert!(request.contains("Content-Type: application/json\r\n"));
        assert!(request.ends_with("{\"query\":\"{ me }\"}"));
    }

    #[test]
    fn test_transport_failure_display() {
        assert_eq!(TransportFailure::message("API Error").to_string(), "API Error");
        assert_eq!(TransportFailure::default().to_string(), "transport call failed");
    }

    #[test]
    fn test_transport_failure_raw_shape() {
        let raw = TransportFailure::message("boom")
            .with_errors(vec![serde_json::json!({"message": "inner"})])
            .to_raw();
        assert_eq!(raw["message"], "boom");
        assert_eq!(raw["errors"][0]["message"], "inner");
    }
}
