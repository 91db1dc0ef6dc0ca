//! Behavioral tests for API execution and response normalization.

use async_trait::async_trait;
use monday_sdk::api::{ApiService, FailurePolicy, PlaygroundSide, QueryKind};
use monday_sdk::auth::{NoToken, StaticTokenProvider, TokenProvider};
use monday_sdk::transport::{Transport, TransportFailure};
use monday_sdk::types::Variables;
use monday_sdk::SdkResult;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted transport: records every call, then resolves or rejects.
struct MockTransport {
    calls: AtomicUsize,
    recorded: Mutex<Vec<(String, Option<Variables>)>>,
    outcome: Outcome,
}

enum Outcome {
    Resolve(Value),
    Reject(TransportFailure),
    /// Resolves to an envelope embedding the query, for interleaving tests.
    EchoQuery,
}

impl MockTransport {
    fn resolving(value: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            outcome: Outcome::Resolve(value),
        })
    }

    fn rejecting(failure: TransportFailure) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            outcome: Outcome::Reject(failure),
        })
    }

    fn echoing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            outcome: Outcome::EchoQuery,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        query: &str,
        variables: Option<&Variables>,
    ) -> Result<Value, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded
            .lock()
            .unwrap()
            .push((query.to_string(), variables.cloned()));
        match &self.outcome {
            Outcome::Resolve(value) => Ok(value.clone()),
            Outcome::Reject(failure) => Err(failure.clone()),
            Outcome::EchoQuery => Ok(json!({ "data": { "echo": query } })),
        }
    }
}

struct FortyCharToken;

#[async_trait]
impl TokenProvider for FortyCharToken {
    async fn session_token(&self) -> SdkResult<String> {
        Ok("abcdefghijklmnopqrstuvwxyz0123456789abcd".to_string())
    }
}

fn service(transport: Arc<MockTransport>) -> ApiService {
    ApiService::new(transport, Arc::new(FortyCharToken))
}

#[tokio::test]
async fn calls_transport_exactly_once_with_query_and_variables() {
    let transport = MockTransport::resolving(json!({"data": {"me": {"id": "1"}}}));
    let api = service(transport.clone());

    let variables = Variables::from([("limit".to_string(), json!(3))]);
    let result = api
        .execute("query { me { id } }", Some(variables.clone()), QueryKind::Custom)
        .await;

    assert!(!result.error);
    assert_eq!(transport.call_count(), 1);
    let recorded = transport.recorded.lock().unwrap();
    assert_eq!(recorded[0].0, "query { me { id } }");
    assert_eq!(recorded[0].1, Some(variables));
}

#[tokio::test]
async fn empty_query_short_circuits() {
    let transport = MockTransport::resolving(json!({"data": {}}));
    let api = service(transport.clone());

    let result = api.execute("", None, QueryKind::Custom).await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("Please enter a GraphQL query"));
    assert_eq!(transport.call_count(), 0);
    // The request never left the process, so no debug channels exist.
    assert!(result.full_response.is_none());
    assert!(result.request_info.is_none());
    assert!(result.data.is_none());
}

#[tokio::test]
async fn whitespace_query_short_circuits() {
    let transport = MockTransport::resolving(json!({"data": {}}));
    let api = service(transport.clone());

    let result = api.execute("   \n\t ", None, QueryKind::Playground).await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("Please enter a GraphQL query"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn rejection_message_is_surfaced() {
    let transport = MockTransport::rejecting(TransportFailure::message("API Error"));
    let api = service(transport);

    let result = api.fetch_board_data().await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("API Error"));
    // Strict policy: no payload on failure.
    assert!(result.data.is_none());
    assert!(result.full_response.is_some());
}

#[tokio::test]
async fn rejection_without_message_uses_sentinel() {
    let transport = MockTransport::rejecting(TransportFailure::default());
    let api = service(transport);

    let result = api.execute_custom_query("query { me { id } }").await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("Unknown error"));
}

#[tokio::test]
async fn rejection_errors_are_preserved() {
    let errors = vec![json!({"message": "Unauthorized field", "path": ["me"]})];
    let transport =
        MockTransport::rejecting(TransportFailure::message("GraphQL Error").with_errors(errors.clone()));
    let api = service(transport);

    let result = api.execute_custom_query("query { me { secret } }").await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("GraphQL Error"));
    assert_eq!(result.errors, Some(errors));
}

#[tokio::test]
async fn graceful_degrade_substitutes_demo_board_payload() {
    let transport = MockTransport::rejecting(TransportFailure::message("API Error"));
    let api = service(transport).policy(FailurePolicy::GracefulDegrade);

    let result = api.fetch_board_data().await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("API Error"));
    let data = result.data.expect("graceful degrade keeps a payload");
    assert_eq!(data["me"]["name"], "Demo User");
    assert!(!data["boards"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn resolved_errors_array_classifies_as_graphql_failure() {
    let errors = vec![json!({"message": "Field not found", "extensions": {"code": "BAD_FIELD"}})];
    let transport = MockTransport::resolving(json!({"data": null, "errors": errors.clone()}));
    let api = service(transport);

    let result = api.execute_custom_query("query { nope }").await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("GraphQL validation errors"));
    assert_eq!(result.errors, Some(errors));
}

#[tokio::test]
async fn error_flag_nested_under_data_classifies_as_graphql_failure() {
    let transport = MockTransport::resolving(
        json!({"data": {"error_message": "Not authenticated", "error_code": "Unauthenticated"}}),
    );
    let api = service(transport);

    let result = api.get_users().await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("GraphQL validation errors"));
}

#[tokio::test]
async fn empty_board_listing_is_a_failure() {
    let transport = MockTransport::resolving(json!({"data": {"me": {"id": "1"}, "boards": []}}));
    let api = service(transport);

    let result = api.fetch_board_data().await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("No boards found in account"));
}

#[tokio::test]
async fn populated_board_listing_succeeds() {
    let boards = json!([
        {"id": "1", "name": "Roadmap", "state": "active", "board_kind": "public"},
        {"id": "2", "name": "Backlog", "state": "active", "board_kind": "private"},
        {"id": "3", "name": "Sprint", "state": "active", "board_kind": "public"}
    ]);
    let transport =
        MockTransport::resolving(json!({"data": {"me": {"id": "1"}, "boards": boards.clone()}}));
    let api = service(transport);

    let result = api.fetch_board_data().await;

    assert!(!result.error);
    let data = result.data.unwrap();
    assert_eq!(data["boards"].as_array().unwrap().len(), 3);
    assert!(result.message.is_none());
    assert!(result.errors.is_none());
}

#[tokio::test]
async fn empty_user_list_stays_successful() {
    // Deliberate asymmetry: only board listings treat empty as failure.
    let transport = MockTransport::resolving(json!({"data": {"users": []}}));
    let api = service(transport);

    let result = api.get_users().await;

    assert!(!result.error);
    assert_eq!(result.data.unwrap()["users"], json!([]));
}

#[tokio::test]
async fn double_nested_envelope_unwraps_to_innermost_payload() {
    let transport = MockTransport::resolving(
        json!({"data": {"data": {"me": {"id": "7"}}}, "account_id": 12345}),
    );
    let api = service(transport);

    let result = api.execute_custom_query("query { me { id } }").await;

    assert!(!result.error);
    assert_eq!(result.data.unwrap(), json!({"me": {"id": "7"}}));
    // The raw envelope is preserved untouched alongside.
    assert_eq!(result.full_response.unwrap()["account_id"], 12345);
}

#[tokio::test]
async fn unrecognized_envelope_fails_closed() {
    let transport = MockTransport::resolving(json!("not an envelope"));
    let api = service(transport);

    let result = api.execute_custom_query("query { me { id } }").await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("Unknown error"));
    assert_eq!(result.full_response, Some(json!("not an envelope")));
}

#[tokio::test]
async fn request_info_carries_declared_metadata() {
    let transport = MockTransport::resolving(json!({"data": {"users": []}}));
    let api = service(transport);

    let result = api.get_users().await;

    let info = result.request_info.expect("request info attached");
    assert_eq!(info.method, "POST");
    assert_eq!(info.url, "https://api.monday.com/v2");
    assert_eq!(info.api_version, "2025-04");
    assert_eq!(info.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    assert_eq!(info.headers.get("API-Version").map(String::as_str), Some("2025-04"));
    assert_eq!(info.query_type, QueryKind::Users);
    assert_eq!(info.query, "query GetUsers { users { name id email } }");
    assert!(!info.timestamp.is_empty());
}

#[tokio::test]
async fn token_is_redacted_to_prefix() {
    let transport = MockTransport::resolving(json!({"data": {"users": []}}));
    let api = service(transport);

    let result = api.get_users().await;

    let info = result.request_info.unwrap();
    assert_eq!(info.token.as_deref(), Some("abcdefghij..."));
}

#[tokio::test]
async fn unavailable_token_uses_sentinel_and_call_proceeds() {
    let transport = MockTransport::resolving(json!({"data": {"users": []}}));
    let api = ApiService::new(transport.clone(), Arc::new(NoToken));

    let result = api.get_users().await;

    assert!(!result.error);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(result.request_info.unwrap().token.as_deref(), Some("not available"));
}

#[tokio::test]
async fn forty_char_static_token_redacts_like_the_platform() {
    let token = "x".repeat(40);
    let transport = MockTransport::resolving(json!({"data": {"users": []}}));
    let api = ApiService::new(transport, Arc::new(StaticTokenProvider::new(token.clone())));

    let result = api.get_users().await;

    let redacted = result.request_info.unwrap().token.unwrap();
    assert_eq!(redacted, format!("{}...", &token[..10]));
    assert!(!redacted.contains(&token));
}

#[tokio::test]
async fn playground_server_side_stamps_the_envelope() {
    let transport = MockTransport::resolving(json!({"data": {"me": {"id": "1"}}}));
    let api = service(transport);

    let result = api
        .execute_playground_query("query { me { id } }", PlaygroundSide::Server)
        .await;

    assert!(!result.error);
    assert_eq!(result.full_response.unwrap()["queryType"], "server-side (demo)");
    assert_eq!(result.request_info.unwrap().query_type, QueryKind::Playground);
}

#[tokio::test]
async fn playground_client_side_leaves_the_envelope_alone() {
    let transport = MockTransport::resolving(json!({"data": {"me": {"id": "1"}}}));
    let api = service(transport);

    let result = api
        .execute_playground_query("query { me { id } }", PlaygroundSide::Client)
        .await;

    assert!(result.full_response.unwrap().get("queryType").is_none());
}

#[tokio::test]
async fn empty_playground_query_short_circuits() {
    let transport = MockTransport::resolving(json!({"data": {}}));
    let api = service(transport.clone());

    let result = api.execute_playground_query("  ", PlaygroundSide::Server).await;

    assert!(result.error);
    assert_eq!(result.message.as_deref(), Some("Please enter a GraphQL query"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn concurrent_executions_do_not_cross_contaminate() {
    let transport = MockTransport::echoing();
    let api = service(transport.clone());

    let (first, second) = tokio::join!(
        api.execute("query { boards { id } }", None, QueryKind::Custom),
        api.execute("query { users { id } }", None, QueryKind::Custom),
    );

    assert_eq!(transport.call_count(), 2);
    assert_eq!(first.data.unwrap()["echo"], "query { boards { id } }");
    assert_eq!(second.data.unwrap()["echo"], "query { users { id } }");
    assert_eq!(first.request_info.unwrap().query, "query { boards { id } }");
    assert_eq!(second.request_info.unwrap().query, "query { users { id } }");
}

#[tokio::test]
async fn typed_parse_of_board_payload() {
    let transport = MockTransport::resolving(json!({"data": {
        "me": {
            "id": "1", "name": "Ada", "email": "ada@example.com",
            "account": {"id": "9", "name": "Acme"}
        },
        "boards": [
            {"id": "10", "name": "Roadmap", "state": "active", "board_kind": "public"}
        ]
    }}));
    let api = service(transport);

    let result = api.fetch_board_data().await;
    let payload: monday_sdk::BoardsPayload = result.parse_data().unwrap();

    assert_eq!(payload.me.name, "Ada");
    assert_eq!(payload.boards.len(), 1);
}
