//! Client composition root.
//!
//! A [`MondayClient`] is constructed explicitly and handed to consumers;
//! there is no ambient module-level instance. Its lifetime is owned by the
//! application's composition root.

use crate::actions::{ActionRunner, ActionService, NoHost};
use crate::api::{ApiService, FailurePolicy, API_ENDPOINT, DEFAULT_API_VERSION};
use crate::auth::{EnvTokenProvider, TokenProvider};
use crate::events::EventHub;
use crate::storage::{MemoryStorage, StorageBackend, StorageService};
use crate::transport::{HttpTransport, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API endpoint URL.
    pub endpoint: String,
    /// Declared API version, sent as the `API-Version` header.
    pub api_version: String,
    /// Transport timeout.
    pub timeout: Duration,
    /// Extra default headers.
    pub headers: HashMap<String, String>,
    /// Failure policy for normalized API results.
    pub policy: FailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: API_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            headers: HashMap::new(),
            policy: FailurePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a config for a given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Sets the declared API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a default header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the failure policy.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// The monday.com client: API execution, storage, actions, and events
/// behind one explicitly constructed object.
pub struct MondayClient {
    config: ClientConfig,
    api: ApiService,
    storage: StorageService,
    actions: ActionService,
    events: EventHub,
}

impl MondayClient {
    /// Starts building a client.
    pub fn builder() -> MondayClientBuilder {
        MondayClientBuilder::default()
    }

    /// Builds a client with defaults: env-based credentials, the built-in
    /// HTTP transport, in-memory storage, and no host actions.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub fn actions(&self) -> &ActionService {
        &self.actions
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }
}

/// Builder wiring the injectable seams with sensible defaults.
#[derive(Default)]
pub struct MondayClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    tokens: Option<Arc<dyn TokenProvider>>,
    storage: Option<Arc<dyn StorageBackend>>,
    actions: Option<Arc<dyn ActionRunner>>,
}

impl MondayClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn storage_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(backend);
        self
    }

    pub fn action_runner(mut self, runner: Arc<dyn ActionRunner>) -> Self {
        self.actions = Some(runner);
        self
    }

    pub fn build(self) -> MondayClient {
        let config = self.config.unwrap_or_default();

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(EnvTokenProvider::default()));

        let transport = self.transport.unwrap_or_else(|| {
            let mut transport = HttpTransport::new(config.endpoint.clone(), tokens.clone())
                .timeout(config.timeout)
                .header("Content-Type", "application/json")
                .header("API-Version", config.api_version.clone());
            for (key, value) in &config.headers {
                transport = transport.header(key.clone(), value.clone());
            }
            Arc::new(transport)
        });

        let api = ApiService::new(transport, tokens)
            .policy(config.policy)
            .endpoint(config.endpoint.clone())
            .api_version(config.api_version.clone());

        let storage = StorageService::new(
            self.storage.unwrap_or_else(|| Arc::new(MemoryStorage::new())),
        );
        let actions = ActionService::new(self.actions.unwrap_or_else(|| Arc::new(NoHost)));

        MondayClient {
            config,
            api,
            storage,
            actions,
            events: EventHub::new(),
        }
    }
}
