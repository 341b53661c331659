use super::attachment::Attachment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Text shown in place of a recalled message's content.
pub const RECALLED_PLACEHOLDER: &str = "[This message has been recalled]";

/// A stored direct message, as persisted in the `messages` table.
///
/// `content` keeps the original text after a recall; callers must go through
/// [`MessageView`] before returning a message to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub content: String,
    pub subject: Option<String>,
    pub thread_id: String,
    pub reply_to_id: Option<i64>,
    pub attachments: Json<Vec<Attachment>>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub sender_deleted: bool,
    pub sender_deleted_at: Option<DateTime<Utc>>,
    pub recipient_deleted: bool,
    pub recipient_deleted_at: Option<DateTime<Utc>>,
    pub is_recalled: bool,
    pub recalled_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }

    /// Whether `user_id` has removed the message from their own side.
    pub fn is_deleted_by(&self, user_id: i64) -> bool {
        (self.sender_id == user_id && self.sender_deleted)
            || (self.recipient_id == user_id && self.recipient_deleted)
    }

    pub fn is_visible_to(&self, user_id: i64) -> bool {
        (self.sender_id == user_id && !self.sender_deleted)
            || (self.recipient_id == user_id && !self.recipient_deleted)
    }

    pub fn partner_of(&self, user_id: i64) -> i64 {
        if self.sender_id == user_id {
            self.recipient_id
        } else {
            self.sender_id
        }
    }
}

/// Fields supplied when inserting a new row; everything else takes its initial state.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub recipient_id: i64,
    pub content: String,
    pub subject: Option<String>,
    pub thread_id: String,
    pub reply_to_id: Option<i64>,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// A message as a participant may see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub content: String,
    pub subject: Option<String>,
    pub thread_id: String,
    pub reply_to_id: Option<i64>,
    pub attachments: Vec<Attachment>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub is_recalled: bool,
    pub recalled_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageView {
    fn from(m: &Message) -> Self {
        let (content, attachments) = if m.is_recalled {
            (RECALLED_PLACEHOLDER.to_string(), Vec::new())
        } else {
            (m.content.clone(), m.attachments.0.clone())
        };

        Self {
            id: m.id,
            sender_id: m.sender_id,
            recipient_id: m.recipient_id,
            content,
            subject: m.subject.clone(),
            thread_id: m.thread_id.clone(),
            reply_to_id: m.reply_to_id,
            attachments,
            is_read: m.is_read,
            read_at: m.read_at,
            is_recalled: m.is_recalled,
            recalled_at: m.recalled_at,
            edited_at: m.edited_at,
            created_at: m.created_at,
        }
    }
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        MessageView::from(&m)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn message(id: i64, sender_id: i64, recipient_id: i64, created_at: DateTime<Utc>) -> Message {
        let (lo, hi) = if sender_id < recipient_id {
            (sender_id, recipient_id)
        } else {
            (recipient_id, sender_id)
        };
        Message {
            id,
            sender_id,
            recipient_id,
            content: format!("message {id}"),
            subject: None,
            thread_id: format!("{lo}-{hi}"),
            reply_to_id: None,
            attachments: Json(Vec::new()),
            is_read: false,
            read_at: None,
            sender_deleted: false,
            sender_deleted_at: None,
            recipient_deleted: false,
            recipient_deleted_at: None,
            is_recalled: false,
            recalled_at: None,
            edited_at: None,
            created_at,
        }
    }
}
