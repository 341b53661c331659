use super::message::{Message, MessageView};
use serde::{Deserialize, Serialize};

/// One thread as seen by a single viewer, built at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub thread_id: String,
    pub partner_id: i64,
    pub last_message: Message,
    pub unread_count: i64,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub thread_id: String,
    pub partner_id: i64,
    pub last_message: MessageView,
    pub unread_count: i64,
    pub total_count: i64,
}

impl From<Conversation> for ConversationSummary {
    fn from(c: Conversation) -> Self {
        Self {
            last_message: MessageView::from(&c.last_message),
            thread_id: c.thread_id,
            partner_id: c.partner_id,
            unread_count: c.unread_count,
            total_count: c.total_count,
        }
    }
}
