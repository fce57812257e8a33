//! Delivery listener registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::transport::message::DeliveredMessage;

/// Receives delivery confirmations.
#[async_trait]
pub trait DeliveryListener: Send + Sync {
    async fn on_delivered(&self, message: &DeliveredMessage);
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Set of subscribed listeners.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<HashMap<SubscriptionId, Arc<dyn DeliveryListener>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, listener: Arc<dyn DeliveryListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().await.insert(id, listener);
        tracing::debug!("Delivery listener {} subscribed", id);
        id
    }

    /// Remove one listener. Returns false when `id` was not subscribed.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.entries.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!("Delivery listener {} unsubscribed", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Deliver `message` to every listener subscribed at call time.
    pub async fn notify(&self, message: &DeliveredMessage) {
        let listeners: Vec<_> = self.entries.read().await.values().cloned().collect();

        tracing::debug!(
            "Message delivered to {}, notifying {} listener(s)",
            message.chat,
            listeners.len()
        );

        for listener in listeners {
            listener.on_delivered(message).await;
        }
    }
}
