//! Messaging transport module.
//!
//! This module provides:
//! - The [`MessagingTransport`] abstraction used to dispatch media
//! - Delivery confirmation messages and the listener registry
//! - A Telegram Bot API implementation

pub mod listeners;
pub mod message;
pub mod telegram;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::media::MediaKind;

pub use listeners::{DeliveryListener, Listeners, SubscriptionId};
pub use message::{DeliveredMessage, LocalFile, MessageContent, PhotoSize};
pub use telegram::{TelegramTransport, TELEGRAM_API_BASE};

/// Outbound messaging channel with asynchronous delivery confirmations.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Submit a media message. `Ok(true)` means accepted for delivery, not delivered.
    async fn send_media(
        &self,
        path: &Path,
        kind: MediaKind,
        target: &str,
        caption: &str,
    ) -> Result<bool>;

    /// Register a listener for delivery confirmations.
    async fn subscribe(&self, listener: Arc<dyn DeliveryListener>) -> SubscriptionId;

    /// Remove a previously registered listener.
    async fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
