//! New-message notification hook
//!
//! Fired after a send has been committed. Delivery is best effort: the
//! messaging facade logs and counts failures but never fails the send.

use crate::models::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageNotification {
    pub recipient_id: i64,
    pub sender_id: i64,
    pub message_id: i64,
    pub message_preview: String,
    pub thread_id: String,
}

impl NewMessageNotification {
    pub fn for_message(message: &Message) -> Self {
        Self {
            recipient_id: message.recipient_id,
            sender_id: message.sender_id,
            message_id: message.id,
            message_preview: message_preview(&message.content),
            thread_id: message.thread_id.clone(),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of the content.
fn message_preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification endpoint responded with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait NotificationHook: Send + Sync {
    async fn notify(&self, event: &NewMessageNotification) -> Result<(), NotificationError>;
}

/// Used when no notification endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationHook for LoggingNotifier {
    async fn notify(&self, event: &NewMessageNotification) -> Result<(), NotificationError> {
        tracing::info!(
            recipient_id = event.recipient_id,
            sender_id = event.sender_id,
            message_id = event.message_id,
            thread_id = %event.thread_id,
            "new message notification (no webhook configured)"
        );
        Ok(())
    }
}

/// Posts each event as JSON to the notification service.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        tracing::info!(endpoint = %endpoint, "WebhookNotifier initialized");

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl NotificationHook for WebhookNotifier {
    async fn notify(&self, event: &NewMessageNotification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Status(status.as_u16()));
        }

        tracing::debug!(
            recipient_id = event.recipient_id,
            message_id = event.message_id,
            "New message notification delivered"
        );
        Ok(())
    }
}
