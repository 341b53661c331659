use super::message_store::{AdminFilter, MessageEdit, MessageStore};
use crate::error::AppResult;
use crate::models::{Conversation, Message, NewMessage, PageRequest};
use crate::services::conversations::aggregate_conversations;
use crate::services::unread::{count_unread, is_unread_for};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    next_id: i64,
    users: HashSet<i64>,
    messages: BTreeMap<i64, Message>,
}

/// Process-local store with the same semantics as [`super::PgMessageStore`].
/// Used for tests and local runs without a database.
#[derive(Default)]
pub struct InMemoryMessageStore {
    state: RwLock<State>,
}

fn newest_first(rows: &mut [Message]) {
    rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

fn paginate<T>(rows: Vec<T>, page: PageRequest) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit).unwrap_or(0))
        .collect();
    (items, total)
}

fn delete_side(message: &mut Message, user_id: i64, at: DateTime<Utc>) -> bool {
    if !message.is_visible_to(user_id) {
        return false;
    }
    if message.sender_id == user_id {
        message.sender_deleted = true;
        message.sender_deleted_at = Some(at);
    } else {
        message.recipient_deleted = true;
        message.recipient_deleted_at = Some(at);
    }
    true
}

/// Same effect as `reply_to_id ... ON DELETE SET NULL`.
fn detach_replies(state: &mut State) {
    let ids: HashSet<i64> = state.messages.keys().copied().collect();
    for m in state.messages.values_mut() {
        if m.reply_to_id.is_some_and(|r| !ids.contains(&r)) {
            m.reply_to_id = None;
        }
    }
}

fn set_read(message: &mut Message, at: DateTime<Utc>) {
    message.is_read = true;
    message.read_at = Some(at);
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = i64>) -> Self {
        let state = State {
            users: users.into_iter().collect(),
            ..State::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    async fn filtered(&self, keep: impl Fn(&Message) -> bool) -> Vec<Message> {
        let state = self.state.read().await;
        let mut rows: Vec<Message> = state
            .messages
            .values()
            .filter(|m| keep(*m))
            .cloned()
            .collect();
        newest_first(&mut rows);
        rows
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn user_exists(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.state.read().await.users.contains(&user_id))
    }

    async fn insert(&self, message: NewMessage) -> AppResult<Message> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let row = Message {
            id: state.next_id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content,
            subject: message.subject,
            thread_id: message.thread_id,
            reply_to_id: message.reply_to_id,
            attachments: Json(message.attachments),
            is_read: false,
            read_at: None,
            sender_deleted: false,
            sender_deleted_at: None,
            recipient_deleted: false,
            recipient_deleted_at: None,
            is_recalled: false,
            recalled_at: None,
            edited_at: None,
            created_at: message.created_at,
        };
        state.messages.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Message>> {
        Ok(self.state.read().await.messages.get(&id).cloned())
    }

    async fn list_inbox(
        &self,
        recipient_id: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = self
            .filtered(|m| {
                m.recipient_id == recipient_id
                    && !m.recipient_deleted
                    && thread_id.map_or(true, |t| m.thread_id == t)
            })
            .await;
        Ok(paginate(rows, page))
    }

    async fn list_outbox(
        &self,
        sender_id: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = self
            .filtered(|m| {
                m.sender_id == sender_id
                    && !m.sender_deleted
                    && thread_id.map_or(true, |t| m.thread_id == t)
            })
            .await;
        Ok(paginate(rows, page))
    }

    async fn list_thread(
        &self,
        viewer: i64,
        thread_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = self
            .filtered(|m| m.thread_id == thread_id && m.is_visible_to(viewer))
            .await;
        Ok(paginate(rows, page))
    }

    async fn list_conversations(
        &self,
        viewer: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<Conversation>, i64)> {
        let state = self.state.read().await;
        let conversations = aggregate_conversations(state.messages.values(), viewer);
        Ok(paginate(conversations, page))
    }

    async fn mark_read(&self, id: i64, recipient_id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.messages.get_mut(&id) {
            Some(m) if is_unread_for(m, recipient_id) => {
                set_read(m, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_thread_read(
        &self,
        recipient_id: i64,
        thread_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for m in state.messages.values_mut() {
            if m.thread_id == thread_id && is_unread_for(m, recipient_id) {
                set_read(m, at);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_all_read(&self, recipient_id: i64, at: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for m in state.messages.values_mut() {
            if is_unread_for(m, recipient_id) {
                set_read(m, at);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .messages
            .get_mut(&id)
            .map_or(false, |m| delete_side(m, user_id, at)))
    }

    async fn soft_delete_thread(
        &self,
        user_id: i64,
        thread_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for m in state.messages.values_mut() {
            if m.thread_id == thread_id && delete_side(m, user_id, at) {
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn unread_count(&self, recipient_id: i64) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(count_unread(state.messages.values(), recipient_id))
    }

    async fn recall(
        &self,
        id: i64,
        sender_id: i64,
        not_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.messages.get_mut(&id) {
            Some(m)
                if m.sender_id == sender_id
                    && !m.sender_deleted
                    && !m.is_recalled
                    && m.created_at >= not_before =>
            {
                m.is_recalled = true;
                m.recalled_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn edit(
        &self,
        id: i64,
        sender_id: i64,
        edit: MessageEdit,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Message>> {
        let mut state = self.state.write().await;
        match state.messages.get_mut(&id) {
            Some(m) if m.sender_id == sender_id && !m.sender_deleted && m.is_recalled => {
                m.content = edit.content;
                if let Some(attachments) = edit.attachments {
                    m.attachments = Json(attachments);
                }
                m.is_recalled = false;
                m.edited_at = Some(at);
                Ok(Some(m.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn admin_list(
        &self,
        filter: AdminFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = self
            .filtered(|m| {
                filter.sender_id.map_or(true, |s| m.sender_id == s)
                    && filter.recipient_id.map_or(true, |r| m.recipient_id == r)
            })
            .await;
        Ok(paginate(rows, page))
    }

    async fn hard_delete(&self, id: i64) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.messages.remove(&id).is_some();
        if removed {
            detach_replies(&mut state);
        }
        Ok(removed)
    }

    async fn purge_deleted(&self) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.messages.len();
        state
            .messages
            .retain(|_, m| !(m.sender_deleted && m.recipient_deleted));
        let purged = before - state.messages.len();
        if purged > 0 {
            detach_replies(&mut state);
        }
        Ok(purged as u64)
    }
}
