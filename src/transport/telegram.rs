//! Telegram Bot API transport.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Recipient};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::media::MediaKind;
use crate::transport::listeners::{DeliveryListener, Listeners, SubscriptionId};
use crate::transport::message::{DeliveredMessage, MessageContent};
use crate::transport::MessagingTransport;

/// Telegram Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Maximum number of queued uploads.
const QUEUE_CAPACITY: usize = 100;

/// A queued media upload.
#[derive(Debug)]
struct UploadJob {
    path: PathBuf,
    kind: MediaKind,
    target: String,
    caption: String,
}

/// Chat to send to: numeric ids as-is, anything else as a channel username.
fn recipient(target: &str) -> Recipient {
    match target.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(target.to_string()),
    }
}

/// Uploads media through a bot and confirms deliveries to listeners.
///
/// `send_media` only queues the upload; a background worker performs it and
/// notifies listeners once Telegram accepted the message.
pub struct TelegramTransport {
    listeners: Arc<Listeners>,
    sender: Mutex<Option<mpsc::Sender<UploadJob>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TelegramTransport {
    /// Create the transport for a bot token and spawn its upload worker.
    pub fn new(bot_token: &str, api_base: &str) -> Result<Self> {
        let api_url = url::Url::parse(api_base)?;
        Ok(Self::with_bot(Bot::new(bot_token).set_api_url(api_url)))
    }

    pub fn with_bot(bot: Bot) -> Self {
        let listeners = Arc::new(Listeners::new());
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);

        let worker = Worker {
            bot,
            listeners: listeners.clone(),
        };
        let handle = tokio::spawn(worker.run(receiver));

        Self {
            listeners,
            sender: Mutex::new(Some(sender)),
            worker: tokio::sync::Mutex::new(Some(handle)),
        }
    }

    /// Stop accepting uploads, finish the queued ones and join the worker.
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::error!("Telegram upload worker failed: {}", e);
            }
        }
        tracing::debug!("Telegram transport stopped");
    }

    fn sender(&self) -> Option<mpsc::Sender<UploadJob>> {
        match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl MessagingTransport for TelegramTransport {
    /// Queue an upload.
    ///
    /// If Telegram later rejects the upload, the worker deletes the local
    /// file, since no delivery confirmation will ever arrive for it.
    async fn send_media(
        &self,
        path: &Path,
        kind: MediaKind,
        target: &str,
        caption: &str,
    ) -> Result<bool> {
        let Some(sender) = self.sender() else {
            tracing::warn!("Telegram transport is shut down, dropping {}", path.display());
            return Ok(false);
        };

        let job = UploadJob {
            path: path.to_path_buf(),
            kind,
            target: target.to_string(),
            caption: caption.to_string(),
        };

        tracing::debug!("Queueing {} {} for {}", kind, path.display(), target);
        Ok(sender.send(job).await.is_ok())
    }

    async fn subscribe(&self, listener: Arc<dyn DeliveryListener>) -> SubscriptionId {
        self.listeners.subscribe(listener).await
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id).await
    }
}

struct Worker {
    bot: Bot,
    listeners: Arc<Listeners>,
}

impl Worker {
    async fn run(self, mut receiver: mpsc::Receiver<UploadJob>) {
        tracing::debug!("Telegram upload worker started");

        while let Some(job) = receiver.recv().await {
            match self.upload(&job).await {
                Ok(()) => {
                    let message =
                        DeliveredMessage::new(&job.target, MessageContent::for_upload(job.kind, &job.path));
                    self.listeners.notify(&message).await;
                }
                Err(e) => {
                    tracing::error!("Failed to send {} to {}: {}", job.path.display(), job.target, e);
                    discard(&job.path).await;
                }
            }
        }

        tracing::debug!("Telegram upload worker finished");
    }

    async fn upload(&self, job: &UploadJob) -> Result<()> {
        let chat = recipient(&job.target);
        let file = InputFile::file(job.path.clone());
        let caption = (!job.caption.is_empty()).then(|| job.caption.clone());

        match job.kind {
            MediaKind::Image => {
                let mut request = self.bot.send_photo(chat, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
            MediaKind::Video => {
                let mut request = self.bot.send_video(chat, file).supports_streaming(true);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
            MediaKind::Animation => {
                let mut request = self.bot.send_animation(chat, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
            MediaKind::Document => {
                let mut request = self.bot.send_document(chat, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
            MediaKind::Audio => {
                let mut request = self.bot.send_audio(chat, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
        }

        tracing::debug!("Sent {} {} to {}", job.kind, job.path.display(), job.target);
        Ok(())
    }
}

async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
