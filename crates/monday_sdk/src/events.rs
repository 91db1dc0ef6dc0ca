//! Client event subscriptions (context, theme, location, item ids).
//!
//! The hosting platform pushes these; consumers subscribe per topic and
//! receive every event published after they subscribed.

use crate::types::MondayContext;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

const DEFAULT_CAPACITY: usize = 256;

/// Subscription topics pushed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTopic {
    Context,
    Theme,
    Location,
    ItemIds,
    Events,
}

impl ListenTopic {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Theme => "theme",
            Self::Location => "location",
            Self::ItemIds => "itemIds",
            Self::Events => "events",
        }
    }
}

impl fmt::Display for ListenTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A publish/subscribe hub for host-pushed client events.
#[derive(Clone)]
pub struct EventHub {
    channels: Arc<RwLock<HashMap<ListenTopic, broadcast::Sender<Value>>>>,
    capacity: usize,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publishes an event; returns how many subscribers received it.
    pub async fn publish(&self, topic: ListenTopic, event: Value) -> usize {
        let channels = self.channels.read().await;
        match channels.get(&topic) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Subscribes to a topic's raw event stream.
    pub async fn subscribe(&self, topic: ListenTopic) -> broadcast::Receiver<Value> {
        let mut channels = self.channels.write().await;
        match channels.get(&topic) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                channels.insert(topic, sender);
                receiver
            }
        }
    }

    /// Subscribes with typed deserialization of each event.
    pub async fn listen<T: DeserializeOwned>(&self, topic: ListenTopic) -> TypedListener<T> {
        TypedListener {
            inner: self.subscribe(topic).await,
            _marker: PhantomData,
        }
    }

    /// Convenience: typed context subscription.
    pub async fn listen_context(&self) -> TypedListener<MondayContext> {
        self.listen(ListenTopic::Context).await
    }

    pub async fn has_subscribers(&self, topic: ListenTopic) -> bool {
        let channels = self.channels.read().await;
        channels.get(&topic).is_some_and(|s| s.receiver_count() > 0)
    }

    pub async fn topic_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Drops channels with no live subscribers.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

/// A typed receiver for subscription events. Events that fail to
/// deserialize are skipped.
pub struct TypedListener<T> {
    inner: broadcast::Receiver<Value>,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> TypedListener<T> {
    /// Receives the next event, or `None` once the channel closes.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.inner.recv().await {
                Ok(value) => match serde_json::from_value(value) {
                    Ok(event) => return Some(event),
                    Err(_) => continue,
                },
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
