//! Key-value storage scopes offered by the platform.
//!
//! Three scopes exist: per-app-instance, account-wide ("global"), and
//! per-user. The backend is an injected seam; [`StorageService`] wraps every
//! backend outcome into a uniform [`StorageData`] so callers never see a
//! raised error.

use crate::error::{SdkError, SdkResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Default key for instance-scope examples.
pub const INSTANCE_EXAMPLE_KEY: &str = "my_example_key";
/// Default key for global-scope examples.
pub const GLOBAL_TEST_KEY: &str = "globalTestKey";
/// Default key for user-scope examples.
pub const USER_TEST_KEY: &str = "userTestKey";

const SELF_TEST_KEY: &str = "auth_test_key";
const SELF_TEST_VALUE: &str = "auth_test_value";

/// Sharing scope of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    Instance,
    Global,
    User,
}

impl StorageScope {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Global => "global",
            Self::User => "user",
        }
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw storage channel. Implementations return the platform's envelope
/// shape; extraction and error absorption happen in [`StorageService`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get_item(&self, scope: StorageScope, key: &str) -> SdkResult<Value>;
    async fn set_item(&self, scope: StorageScope, key: &str, value: &str) -> SdkResult<Value>;
    async fn delete_item(&self, scope: StorageScope, key: &str) -> SdkResult<Value>;
}

/// Normalized outcome of a storage operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageData {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of the storage authentication self-test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSelfTest {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Extracts the stored value from a backend envelope, probing
/// `data.value`, then `data`, then the raw result.
fn extract_value(raw: Value) -> Value {
    if let Value::Object(obj) = &raw {
        if let Some(data) = obj.get("data") {
            if let Some(value) = data.get("value") {
                return value.clone();
            }
            return data.clone();
        }
    }
    raw
}

/// High-level storage API with absorbed errors and example-key defaults.
pub struct StorageService {
    backend: Arc<dyn StorageBackend>,
}

impl StorageService {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    async fn safe_call(&self, result: SdkResult<Value>, error_prefix: &str) -> StorageData {
        match result {
            Ok(raw) => StorageData {
                success: true,
                value: Some(extract_value(raw)),
                error: false,
                message: None,
            },
            Err(err) => {
                error!("{error_prefix}: {err}");
                StorageData {
                    success: false,
                    value: None,
                    error: true,
                    message: Some(err.message),
                }
            }
        }
    }

    /// Gets a value from instance storage; defaults to the example key.
    pub async fn get_instance(&self, key: Option<&str>) -> StorageData {
        let key = key.unwrap_or(INSTANCE_EXAMPLE_KEY);
        self.safe_call(
            self.backend.get_item(StorageScope::Instance, key).await,
            "Instance Storage Get",
        )
        .await
    }

    /// Sets a value in instance storage; defaults to the example key.
    pub async fn set_instance(&self, value: &str, key: Option<&str>) -> StorageData {
        let key = key.unwrap_or(INSTANCE_EXAMPLE_KEY);
        self.safe_call(
            self.backend.set_item(StorageScope::Instance, key, value).await,
            "Instance Storage Set",
        )
        .await
    }

    /// Gets a value from global storage.
    pub async fn get_global(&self, key: Option<&str>) -> StorageData {
        let key = key.unwrap_or(GLOBAL_TEST_KEY);
        self.safe_call(
            self.backend.get_item(StorageScope::Global, key).await,
            "Global Storage Get",
        )
        .await
    }

    /// Sets a value in global storage.
    pub async fn set_global(&self, value: &str, key: Option<&str>) -> StorageData {
        let key = key.unwrap_or(GLOBAL_TEST_KEY);
        self.safe_call(
            self.backend.set_item(StorageScope::Global, key, value).await,
            "Global Storage Set",
        )
        .await
    }

    /// Gets a value from user storage.
    pub async fn get_user(&self, key: Option<&str>) -> StorageData {
        let key = key.unwrap_or(USER_TEST_KEY);
        self.safe_call(
            self.backend.get_item(StorageScope::User, key).await,
            "User Storage Get",
        )
        .await
    }

    /// Sets a value in user storage.
    pub async fn set_user(&self, value: &str, key: Option<&str>) -> StorageData {
        let key = key.unwrap_or(USER_TEST_KEY);
        self.safe_call(
            self.backend.set_item(StorageScope::User, key, value).await,
            "User Storage Set",
        )
        .await
    }

    /// Seeds the instance-scope example text.
    pub async fn init_example_storage(&self, text: &str) -> StorageData {
        self.set_instance(text, None).await
    }

    /// Reads the instance-scope example text.
    pub async fn example_storage(&self) -> StorageData {
        self.get_instance(None).await
    }

    /// Verifies the storage channel is usable by round-tripping a test
    /// value. Cleanup failures are non-critical and only logged.
    pub async fn self_test(&self) -> StorageSelfTest {
        debug!("testing storage authentication");

        let set = self
            .backend
            .set_item(StorageScope::Instance, SELF_TEST_KEY, SELF_TEST_VALUE)
            .await;
        if let Err(err) = set {
            error!(error = %err, "storage self-test set failed");
            return StorageSelfTest {
                success: false,
                error: Some(err.message),
            };
        }

        let get = self.backend.get_item(StorageScope::Instance, SELF_TEST_KEY).await;
        if let Err(err) = get {
            error!(error = %err, "storage self-test get failed");
            return StorageSelfTest {
                success: false,
                error: Some(err.message),
            };
        }

        if let Err(err) = self.backend.delete_item(StorageScope::Instance, SELF_TEST_KEY).await {
            warn!(error = %err, "storage self-test cleanup failed (non-critical)");
        }

        StorageSelfTest {
            success: true,
            error: None,
        }
    }
}

/// In-memory backend for demos and tests. Returns envelopes in the
/// platform's `{data: {value, success}}` shape.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<(StorageScope, String), String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get_item(&self, scope: StorageScope, key: &str) -> SdkResult<Value> {
        let items = self.items.read().await;
        let value = items
            .get(&(scope, key.to_string()))
            .map_or(Value::Null, |v| Value::String(v.clone()));
        Ok(serde_json::json!({ "data": { "value": value, "success": true } }))
    }

    async fn set_item(&self, scope: StorageScope, key: &str, value: &str) -> SdkResult<Value> {
        let mut items = self.items.write().await;
        items.insert((scope, key.to_string()), value.to_string());
        Ok(serde_json::json!({ "data": { "success": true } }))
    }

    async fn delete_item(&self, scope: StorageScope, key: &str) -> SdkResult<Value> {
        let mut items = self.items.write().await;
        if items.remove(&(scope, key.to_string())).is_none() {
            return Err(SdkError::storage(format!("no such key: {key}"))
                .with_extension("scope", scope.as_str()));
        }
        Ok(serde_json::json!({ "data": { "success": true } }))
    }
}
