//! monday.com client SDK
//!
//! This crate provides a client for the monday.com platform: GraphQL API
//! execution with uniform response normalization, key-value storage scopes,
//! host action execution, and client event subscriptions.
//!
//! Every API call resolves to an [`ApiResponse`] — failures of any kind
//! (transport, GraphQL-level, empty board listings) are absorbed and
//! classified, never raised. Callers branch on [`ApiResponse::error`] and,
//! when debugging, inspect the `fullResponse` / `requestInfo` channels.
//!
//! # Example
//!
//! ```ignore
//! use monday_sdk::{ClientConfig, FailurePolicy, MondayClient};
//!
//! let client = MondayClient::new(
//!     ClientConfig::default().policy(FailurePolicy::GracefulDegrade),
//! );
//!
//! let boards = client.api().fetch_board_data().await;
//! if boards.error {
//!     eprintln!("{}", boards.message.as_deref().unwrap_or("Unknown error"));
//! }
//! ```

pub mod actions;
pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod storage;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use actions::{ActionRunner, ActionService, ExecuteResult, NoHost, NoticeKind};
pub use api::{
    ApiResponse, ApiService, FailurePolicy, PlaygroundSide, QueryKind, RequestInfo, API_ENDPOINT,
    DEFAULT_API_VERSION,
};
pub use auth::{EnvTokenProvider, NoToken, StaticTokenProvider, TokenProvider};
pub use client::{ClientConfig, MondayClient, MondayClientBuilder};
pub use error::{ErrorCode, SdkError, SdkResult};
pub use events::{EventHub, ListenTopic, TypedListener};
pub use storage::{
    MemoryStorage, StorageBackend, StorageData, StorageScope, StorageSelfTest, StorageService,
};
pub use transport::{HttpTransport, Transport, TransportFailure};
pub use types::{
    Account, BoardData, BoardsPayload, MeData, MondayContext, UserData, UsersPayload, Variables,
};
