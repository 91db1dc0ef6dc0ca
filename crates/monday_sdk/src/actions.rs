//! Host action execution (notices, confirmations, file uploads).
//!
//! Actions run on the hosting platform through an injected [`ActionRunner`];
//! [`ActionService`] normalizes every outcome to an [`ExecuteResult`] so
//! callers only ever branch on `error`.

use crate::error::{SdkError, SdkResult};
use crate::types::MondayContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

const FILES_COLUMN_ID: &str = "files";

/// Runs a named host action with JSON parameters.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, action: &str, params: Value) -> SdkResult<Value>;
}

/// Runner used when no host connection exists. Every action fails with a
/// normalized error, mirroring what happens outside a platform session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

#[async_trait]
impl ActionRunner for NoHost {
    async fn run(&self, action: &str, _params: Value) -> SdkResult<Value> {
        Err(SdkError::action(format!("no host connection for action '{action}'")))
    }
}

/// Normalized outcome of a host action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResult {
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ExecuteResult {
    fn ok(payload: Value) -> Self {
        Self {
            error: false,
            message: None,
            payload: Some(payload),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: Some(message.into()),
            payload: None,
        }
    }
}

/// Kind of a notice shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoticeKind {
    #[default]
    Success,
    Error,
    Info,
}

impl NoticeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// High-level action API with absorbed errors and the demo defaults.
pub struct ActionService {
    runner: Arc<dyn ActionRunner>,
}

impl ActionService {
    pub fn new(runner: Arc<dyn ActionRunner>) -> Self {
        Self { runner }
    }

    /// Runs an arbitrary action, absorbing failures.
    pub async fn execute(&self, action: &str, params: Value) -> ExecuteResult {
        debug!(action, "executing host action");
        match self.runner.run(action, params).await {
            Ok(payload) => ExecuteResult::ok(payload),
            Err(err) => {
                error!(action, error = %err, "host action failed");
                ExecuteResult::failed(err.message)
            }
        }
    }

    /// Shows a notice banner.
    pub async fn notice(&self, message: &str, kind: NoticeKind, timeout_ms: u64) -> ExecuteResult {
        self.execute(
            "notice",
            json!({
                "message": message,
                "type": kind.as_str(),
                "timeout": timeout_ms,
            }),
        )
        .await
    }

    /// Shows a confirmation dialog.
    pub async fn confirm(&self, message: &str) -> ExecuteResult {
        self.execute(
            "confirm",
            json!({
                "message": message,
                "confirmButton": "Yes, do it!",
                "cancelButton": "Cancel",
                "excludeCancelButton": false,
            }),
        )
        .await
    }

    /// Opens the file-upload dialog for the item in the current context.
    /// Requires both a board and an item; otherwise no action runs.
    pub async fn trigger_files_upload(&self, context: &MondayContext) -> ExecuteResult {
        match (context.board_id, context.item_id) {
            (Some(board_id), Some(item_id)) => {
                self.execute(
                    "triggerFilesUpload",
                    json!({
                        "boardId": board_id,
                        "itemId": item_id,
                        "columnId": FILES_COLUMN_ID,
                    }),
                )
                .await
            }
            _ => ExecuteResult::failed("Missing boardId or itemId in context"),
        }
    }

    /// Reports that the user gained first value in the app.
    pub async fn value_created_for_user(&self) -> ExecuteResult {
        self.execute("valueCreatedForUser", Value::Null).await
    }
}
