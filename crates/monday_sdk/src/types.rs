//! Domain payload types for the monday.com platform.
//!
//! These mirror the shapes the platform API returns. They are conveniences:
//! the normalization layer itself works on raw `serde_json::Value` payloads
//! and never requires a response to fit one of these.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variables mapping for a GraphQL operation. Keys are unique; insertion
/// order is preserved.
pub type Variables = IndexMap<String, Value>;

/// Client context supplied by the hosting platform (board, item, user,
/// account, theme). Unknown fields are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MondayContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// An account as returned inside `me { account { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// The authenticated user, as returned by `me { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub account: Account,
}

/// A board summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub state: String,
    pub board_kind: String,
}

/// A user summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Typed payload of the board-data operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardsPayload {
    pub me: MeData,
    pub boards: Vec<BoardData>,
}

/// Typed payload of the users operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsersPayload {
    pub users: Vec<UserData>,
}
