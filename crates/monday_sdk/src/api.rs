//! API execution and response normalization.
//!
//! Every outbound GraphQL call goes through [`ApiService::execute`], which
//! observes the raw transport outcome, classifies it (transport failure,
//! GraphQL-level errors, empty board listing, success), and returns a single
//! uniform [`ApiResponse`] plus debug channels. No failure of any kind
//! escapes this boundary as `Err`; callers branch on [`ApiResponse::error`].

use crate::auth::TokenProvider;
use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::transport::{Transport, TransportFailure};
use crate::types::Variables;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Canonical platform API endpoint, declared in every debug envelope.
pub const API_ENDPOINT: &str = "https://api.monday.com/v2";

/// API version declared in headers and debug envelopes.
pub const DEFAULT_API_VERSION: &str = "2025-04";

const EMPTY_QUERY_MESSAGE: &str = "Please enter a GraphQL query";
const GRAPHQL_ERRORS_MESSAGE: &str = "GraphQL validation errors";
const NO_BOARDS_MESSAGE: &str = "No boards found in account";
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";
const TOKEN_UNAVAILABLE: &str = "not available";
const TOKEN_PREFIX_LEN: usize = 10;

/// Board-data operation: current user plus the first few boards.
pub const BOARD_DATA_QUERY: &str = "\
query GetBoardData {
  me {
    id
    name
    email
    account {
      id
      name
    }
  }
  boards(limit: 3) {
    id
    name
    description
    state
    board_kind
  }
}";

/// Users operation.
pub const USERS_QUERY: &str = "query GetUsers { users { name id email } }";

/// Semantic tag for an operation. Selects the empty-result policy for board
/// listings and labels debug output; never used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Boards,
    Users,
    Custom,
    Playground,
}

impl QueryKind {
    /// Returns the wire tag for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boards => "boards",
            Self::Users => "users",
            Self::Custom => "custom",
            Self::Playground => "playground",
        }
    }

    /// Only board listings treat an empty result set as a failure. Empty
    /// user lists stay successful; that asymmetry is deliberate.
    pub const fn empty_result_is_failure(&self) -> bool {
        matches!(self, Self::Boards)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side a playground query nominally executes on. The server side is
/// demo-only: the call still goes out from the client, but the raw envelope
/// is stamped so callers can tell the paths apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaygroundSide {
    #[default]
    Client,
    Server,
}

/// What to do with the `data` channel when a call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failures carry no payload; callers see only the classification and
    /// the debug channels.
    #[default]
    Strict,
    /// Failures substitute a fixed demo payload where one is defined for
    /// the operation kind, so callers always have something to render.
    GracefulDegrade,
}

/// Debug view of an outbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub timestamp: String,
    pub api_version: String,
    pub query_type: QueryKind,
    /// Redacted credential view: a short prefix plus a truncation marker,
    /// or "not available". Never the full credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The uniform result of an API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// True iff any failure was detected.
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured GraphQL errors, preserved verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
    /// The raw resolved or rejected value, unprocessed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_info: Option<RequestInfo>,
}

impl ApiResponse {
    fn success(data: Value) -> Self {
        Self {
            error: false,
            data: Some(data),
            message: None,
            errors: None,
            full_response: None,
            request_info: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            data: None,
            message: Some(message.into()),
            errors: None,
            full_response: None,
            request_info: None,
        }
    }

    /// Deserializes the success payload into a typed value.
    pub fn parse_data<T: DeserializeOwned>(&self) -> SdkResult<T> {
        match &self.data {
            Some(data) => serde_json::from_value(data.clone())
                .map_err(|e| SdkError::deserialize(e.to_string())),
            None => Err(SdkError::new(ErrorCode::NoData, "No data in response")),
        }
    }
}

/// Classified view of a resolved transport envelope.
///
/// The platform wraps the GraphQL `{data, errors}` body in a transport
/// envelope whose nesting is not guaranteed. Probing tries the known shapes
/// in priority order and fails closed: anything unrecognized is reported as
/// a transport-level failure, never thrown.
#[derive(Debug)]
enum Envelope {
    /// Explicit error indicator, top-level or one level under `data`.
    Flagged,
    /// Non-empty structured GraphQL error list.
    Errors(Vec<Value>),
    /// Innermost success payload, fully unwrapped.
    Data(Value),
    Unrecognized,
}

fn classify(raw: &Value) -> Envelope {
    let Some(outer) = raw.as_object() else {
        return Envelope::Unrecognized;
    };
    let inner = outer.get("data").and_then(Value::as_object);

    if has_error_flag(outer) || inner.is_some_and(has_error_flag) {
        return Envelope::Flagged;
    }
    if let Some(errors) = non_empty_errors(outer).or_else(|| inner.and_then(non_empty_errors)) {
        return Envelope::Errors(errors);
    }

    match outer.get("data") {
        // Outer transport envelope -> inner GraphQL body -> `data`.
        Some(body) => match body.as_object().and_then(|b| b.get("data")) {
            Some(innermost) => Envelope::Data(innermost.clone()),
            None => Envelope::Data(body.clone()),
        },
        None => Envelope::Unrecognized,
    }
}

fn has_error_flag(obj: &serde_json::Map<String, Value>) -> bool {
    obj.contains_key("error_message")
        || obj.contains_key("error_code")
        || obj.get("error").and_then(Value::as_bool).unwrap_or(false)
}

fn non_empty_errors(obj: &serde_json::Map<String, Value>) -> Option<Vec<Value>> {
    obj.get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
        .cloned()
}

fn board_list_is_empty(data: &Value) -> bool {
    data.get("boards")
        .and_then(Value::as_array)
        .map_or(true, Vec::is_empty)
}

/// Redacts a credential down to a short prefix plus a truncation marker.
/// The full credential is never echoed back, so anything too short to
/// truncate reports as unavailable instead.
fn redact_token(token: &str) -> String {
    let mut chars = token.chars();
    let prefix: String = chars.by_ref().take(TOKEN_PREFIX_LEN).collect();
    if chars.next().is_none() {
        return TOKEN_UNAVAILABLE.to_string();
    }
    format!("{prefix}...")
}

/// Fixed demo payload substituted under [`FailurePolicy::GracefulDegrade`].
/// Only the board-data operation defines one; other kinds stay strict.
fn fallback_payload(kind: QueryKind) -> Option<Value> {
    match kind {
        QueryKind::Boards => Some(serde_json::json!({
            "me": {
                "id": "demo",
                "name": "Demo User",
                "email": "demo@monday.com",
                "account": { "id": "demo", "name": "Demo Account" }
            },
            "boards": [
                {
                    "id": "1",
                    "name": "Demo Board 1",
                    "description": "Sample board",
                    "state": "active",
                    "board_kind": "public"
                },
                {
                    "id": "2",
                    "name": "Demo Board 2",
                    "description": "Another sample",
                    "state": "active",
                    "board_kind": "public"
                }
            ]
        })),
        _ => None,
    }
}

/// Issues GraphQL operations and normalizes every outcome.
///
/// One instance carries one failure policy; the strict and graceful-degrade
/// strategies are never mixed within a configuration.
pub struct ApiService {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    policy: FailurePolicy,
    endpoint: String,
    api_version: String,
}

impl ApiService {
    /// Creates a service with the default endpoint, API version, and strict
    /// failure policy.
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            transport,
            tokens,
            policy: FailurePolicy::default(),
            endpoint: API_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Sets the failure policy.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the endpoint declared in debug envelopes.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the declared API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Executes a GraphQL operation and normalizes the outcome.
    ///
    /// Empty or whitespace-only operation strings short-circuit to a
    /// validation failure without touching the transport; those results
    /// carry no debug channels because the request never left the process.
    pub async fn execute(
        &self,
        query: &str,
        variables: Option<Variables>,
        kind: QueryKind,
    ) -> ApiResponse {
        if query.trim().is_empty() {
            debug!(query_type = kind.as_str(), "rejecting empty query");
            return ApiResponse::failure(EMPTY_QUERY_MESSAGE);
        }

        let request_info = self.request_info(query, variables.clone(), kind).await;

        debug!(query_type = kind.as_str(), query, "executing query");
        match self.transport.call(query, variables.as_ref()).await {
            Ok(raw) => self.normalize_resolved(raw, kind, request_info),
            Err(failure) => self.normalize_rejected(failure, kind, request_info),
        }
    }

    /// Fetches the current user and the first few boards.
    pub async fn fetch_board_data(&self) -> ApiResponse {
        self.execute(BOARD_DATA_QUERY, None, QueryKind::Boards).await
    }

    /// Fetches the account's users. An empty list is a success.
    pub async fn get_users(&self) -> ApiResponse {
        self.execute(USERS_QUERY, None, QueryKind::Users).await
    }

    /// Executes a caller-supplied query.
    pub async fn execute_custom_query(&self, query: &str) -> ApiResponse {
        self.execute(query, None, QueryKind::Custom).await
    }

    /// Executes a playground query on the requested side.
    pub async fn execute_playground_query(
        &self,
        query: &str,
        side: PlaygroundSide,
    ) -> ApiResponse {
        let mut response = self.execute(query, None, QueryKind::Playground).await;
        if side == PlaygroundSide::Server {
            if let Some(Value::Object(full)) = response.full_response.as_mut() {
                full.insert("queryType".into(), Value::String("server-side (demo)".into()));
            }
        }
        response
    }

    async fn request_info(
        &self,
        query: &str,
        variables: Option<Variables>,
        kind: QueryKind,
    ) -> RequestInfo {
        let token = match self.tokens.session_token().await {
            Ok(token) => redact_token(&token),
            Err(err) => {
                warn!(error = %err, "session token unavailable");
                TOKEN_UNAVAILABLE.to_string()
            }
        };

        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("API-Version".to_string(), self.api_version.clone());

        RequestInfo {
            query: query.to_string(),
            variables,
            method: "POST".to_string(),
            url: self.endpoint.clone(),
            headers,
            timestamp: Utc::now().to_rfc3339(),
            api_version: self.api_version.clone(),
            query_type: kind,
            token: Some(token),
        }
    }

    fn normalize_resolved(
        &self,
        raw: Value,
        kind: QueryKind,
        request_info: RequestInfo,
    ) -> ApiResponse {
        match classify(&raw) {
            Envelope::Flagged => {
                error!(query_type = kind.as_str(), "response carried an error indicator");
                self.failure(GRAPHQL_ERRORS_MESSAGE, None, kind, raw, request_info)
            }
            Envelope::Errors(errors) => {
                error!(
                    query_type = kind.as_str(),
                    count = errors.len(),
                    "response carried GraphQL errors"
                );
                self.failure(GRAPHQL_ERRORS_MESSAGE, Some(errors), kind, raw, request_info)
            }
            Envelope::Data(data) => {
                if kind.empty_result_is_failure() && board_list_is_empty(&data) {
                    warn!(query_type = kind.as_str(), "board listing came back empty");
                    return self.failure(NO_BOARDS_MESSAGE, None, kind, raw, request_info);
                }
                debug!(query_type = kind.as_str(), "query succeeded");
                ApiResponse {
                    full_response: Some(raw),
                    request_info: Some(request_info),
                    ..ApiResponse::success(data)
                }
            }
            Envelope::Unrecognized => {
                error!(query_type = kind.as_str(), "unrecognized response envelope");
                self.failure(UNKNOWN_ERROR_MESSAGE, None, kind, raw, request_info)
            }
        }
    }

    fn normalize_rejected(
        &self,
        rejection: TransportFailure,
        kind: QueryKind,
        request_info: RequestInfo,
    ) -> ApiResponse {
        error!(
            query_type = kind.as_str(),
            message = rejection.message.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE),
            "transport call failed"
        );
        let message = rejection
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        let raw = rejection.to_raw();
        self.failure(message, rejection.errors, kind, raw, request_info)
    }

    fn failure(
        &self,
        message: impl Into<String>,
        errors: Option<Vec<Value>>,
        kind: QueryKind,
        raw: Value,
        request_info: RequestInfo,
    ) -> ApiResponse {
        let data = match self.policy {
            FailurePolicy::Strict => None,
            FailurePolicy::GracefulDegrade => fallback_payload(kind),
        };
        ApiResponse {
            error: true,
            data,
            message: Some(message.into()),
            errors,
            full_response: Some(raw),
            request_info: Some(request_info),
        }
    }
}
