use super::clock::Clock;
use super::notification::{NewMessageNotification, NotificationHook};
use super::recall::{check_edit, check_recall, recall_cutoff};
use super::thread_id::{parse_thread_id, resolve_thread_id, thread_partner};
use crate::db::{AdminFilter, MessageEdit, MessageStore};
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{
    ConversationSummary, EditMessageRequest, Message, MessageDraft, MessageView, NewMessage,
    PageRequest, Paginated, SendMessageRequest,
};
use chrono::Duration;
use std::sync::Arc;

/// Result of an idempotent mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Nothing to change, e.g. the message was already read.
    AlreadyApplied,
}

/// Entry point for every messaging operation. Each call takes the
/// authenticated caller id; admin operations expect the HTTP layer to have
/// checked privileges already.
pub struct MessagingService {
    store: Arc<dyn MessageStore>,
    notifier: Arc<dyn NotificationHook>,
    clock: Arc<dyn Clock>,
    recall_window: Duration,
}

impl MessagingService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        notifier: Arc<dyn NotificationHook>,
        clock: Arc<dyn Clock>,
        recall_window: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            recall_window,
        }
    }

    pub fn recall_window(&self) -> Duration {
        self.recall_window
    }

    /// Look up a message the caller is allowed to see. Missing and hidden
    /// messages are indistinguishable.
    async fn visible_message(&self, caller: i64, id: i64) -> AppResult<Message> {
        match self.store.find_by_id(id).await? {
            Some(m) if m.is_visible_to(caller) => Ok(m),
            _ => Err(AppError::NotFound),
        }
    }

    pub async fn send(&self, caller: i64, request: SendMessageRequest) -> AppResult<MessageView> {
        if request.recipient_id <= 0 {
            return Err(AppError::validation("recipientId must be a positive user id"));
        }
        if request.recipient_id == caller {
            return Err(AppError::validation("cannot send a message to yourself"));
        }
        let draft = MessageDraft::new(
            &request.content,
            request.subject.as_deref(),
            request.attachments,
        )?;
        let thread_id = resolve_thread_id(caller, request.recipient_id)?;

        if !self.store.user_exists(request.recipient_id).await? {
            return Err(AppError::UserNotFound);
        }

        if let Some(reply_to_id) = request.reply_to_id {
            let parent = self.store.find_by_id(reply_to_id).await?;
            let in_thread =
                parent.is_some_and(|p| p.thread_id == thread_id && p.is_visible_to(caller));
            if !in_thread {
                return Err(AppError::validation(
                    "replyToId must reference a message in this conversation",
                ));
            }
        }

        let message = self
            .store
            .insert(NewMessage {
                sender_id: caller,
                recipient_id: request.recipient_id,
                content: draft.content,
                subject: draft.subject,
                thread_id,
                reply_to_id: request.reply_to_id,
                attachments: draft.attachments.unwrap_or_default(),
                created_at: self.clock.now(),
            })
            .await?;

        metrics::record_message_sent();
        tracing::info!(
            message_id = message.id,
            sender_id = message.sender_id,
            recipient_id = message.recipient_id,
            thread_id = %message.thread_id,
            "message sent"
        );

        self.dispatch_notification(NewMessageNotification::for_message(&message));
        Ok(MessageView::from(message))
    }

    fn dispatch_notification(&self, event: NewMessageNotification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&event).await {
                metrics::record_notification_failure();
                tracing::warn!(
                    error = %e,
                    message_id = event.message_id,
                    recipient_id = event.recipient_id,
                    "new message notification failed"
                );
            }
        });
    }

    pub async fn list_inbox(
        &self,
        caller: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Paginated<MessageView>> {
        validate_thread_filter(thread_id)?;
        let (rows, total) = self.store.list_inbox(caller, thread_id, page).await?;
        Ok(Paginated::new(rows, page, total).map(MessageView::from))
    }

    pub async fn list_outbox(
        &self,
        caller: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Paginated<MessageView>> {
        validate_thread_filter(thread_id)?;
        let (rows, total) = self.store.list_outbox(caller, thread_id, page).await?;
        Ok(Paginated::new(rows, page, total).map(MessageView::from))
    }

    pub async fn list_conversations(
        &self,
        caller: i64,
        page: PageRequest,
    ) -> AppResult<Paginated<ConversationSummary>> {
        let (rows, total) = self.store.list_conversations(caller, page).await?;
        Ok(Paginated::new(rows, page, total).map(ConversationSummary::from))
    }

    /// One page of the thread with `partner_id`. Page 1 is the newest window;
    /// items inside a page run oldest to newest.
    pub async fn conversation_history(
        &self,
        caller: i64,
        partner_id: i64,
        page: PageRequest,
    ) -> AppResult<Paginated<MessageView>> {
        let thread_id = resolve_thread_id(caller, partner_id)?;
        let (mut rows, total) = self.store.list_thread(caller, &thread_id, page).await?;
        rows.reverse();
        Ok(Paginated::new(rows, page, total).map(MessageView::from))
    }

    pub async fn get_message(&self, caller: i64, id: i64) -> AppResult<MessageView> {
        self.visible_message(caller, id).await.map(MessageView::from)
    }

    pub async fn mark_as_read(&self, caller: i64, id: i64) -> AppResult<Outcome> {
        let message = self.visible_message(caller, id).await?;
        if message.recipient_id != caller {
            return Err(AppError::NotRecipient("mark a message as read"));
        }
        if message.is_read {
            return Ok(Outcome::AlreadyApplied);
        }

        let updated = self.store.mark_read(id, caller, self.clock.now()).await?;
        Ok(if updated {
            Outcome::Applied
        } else {
            Outcome::AlreadyApplied
        })
    }

    pub async fn mark_thread_as_read(&self, caller: i64, thread_id: &str) -> AppResult<u64> {
        thread_partner(thread_id, caller)?;
        self.store
            .mark_thread_read(caller, thread_id, self.clock.now())
            .await
    }

    pub async fn mark_all_as_read(&self, caller: i64) -> AppResult<u64> {
        let updated = self.store.mark_all_read(caller, self.clock.now()).await?;
        tracing::debug!(user_id = caller, updated, "marked all messages as read");
        Ok(updated)
    }

    /// Hide a message on the caller's side only.
    pub async fn delete_message(&self, caller: i64, id: i64) -> AppResult<Outcome> {
        let message = self
            .store
            .find_by_id(id)
            .await?
            .filter(|m| m.is_participant(caller))
            .ok_or(AppError::NotFound)?;

        if message.is_deleted_by(caller) {
            return Ok(Outcome::AlreadyApplied);
        }

        let deleted = self.store.soft_delete(id, caller, self.clock.now()).await?;
        Ok(if deleted {
            Outcome::Applied
        } else {
            Outcome::AlreadyApplied
        })
    }

    pub async fn delete_thread(&self, caller: i64, thread_id: &str) -> AppResult<u64> {
        thread_partner(thread_id, caller)?;
        self.store
            .soft_delete_thread(caller, thread_id, self.clock.now())
            .await
    }

    pub async fn unread_count(&self, caller: i64) -> AppResult<i64> {
        self.store.unread_count(caller).await
    }

    pub async fn recall(&self, caller: i64, id: i64) -> AppResult<()> {
        let message = self.visible_message(caller, id).await?;
        let now = self.clock.now();
        check_recall(&message, caller, now, self.recall_window)?;

        let recalled = self
            .store
            .recall(id, caller, recall_cutoff(now, self.recall_window), now)
            .await?;
        if !recalled {
            // Lost a race with another mutation; report what the row says now.
            let current = self.visible_message(caller, id).await?;
            check_recall(&current, caller, now, self.recall_window)?;
            tracing::error!(message_id = id, "recall update matched no row");
            return Err(AppError::Internal);
        }

        metrics::record_message_recalled();
        tracing::info!(message_id = id, sender_id = caller, "message recalled");
        Ok(())
    }

    /// Replace the content of a recalled message, making it active again.
    pub async fn edit(
        &self,
        caller: i64,
        id: i64,
        request: EditMessageRequest,
    ) -> AppResult<MessageView> {
        let message = self.visible_message(caller, id).await?;
        check_edit(&message, caller)?;
        let draft = MessageDraft::new(&request.content, None, request.attachments)?;

        let edit = MessageEdit {
            content: draft.content,
            attachments: draft.attachments,
        };
        match self.store.edit(id, caller, edit, self.clock.now()).await? {
            Some(updated) => {
                tracing::info!(message_id = id, sender_id = caller, "recalled message edited");
                Ok(MessageView::from(updated))
            }
            None => {
                let current = self.visible_message(caller, id).await?;
                check_edit(&current, caller)?;
                tracing::error!(message_id = id, "edit update matched no row");
                Err(AppError::Internal)
            }
        }
    }

    pub fn resolve_thread_id(&self, user_a: i64, user_b: i64) -> AppResult<String> {
        resolve_thread_id(user_a, user_b)
    }

    /// All messages regardless of soft-delete state.
    pub async fn admin_list(
        &self,
        filter: AdminFilter,
        page: PageRequest,
    ) -> AppResult<Paginated<Message>> {
        let (rows, total) = self.store.admin_list(filter, page).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn admin_hard_delete(&self, admin_id: i64, id: i64) -> AppResult<()> {
        if !self.store.hard_delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::warn!(admin_id, message_id = id, "message hard deleted by admin");
        Ok(())
    }

    /// Remove rows that both participants have deleted.
    pub async fn admin_purge(&self, admin_id: i64) -> AppResult<u64> {
        let purged = self.store.purge_deleted().await?;
        tracing::warn!(admin_id, purged, "purged messages deleted by both participants");
        Ok(purged)
    }
}

fn validate_thread_filter(thread_id: Option<&str>) -> AppResult<()> {
    match thread_id {
        Some(t) if parse_thread_id(t).is_none() => {
            Err(AppError::validation(format!("invalid thread id: {t}")))
        }
        _ => Ok(()),
    }
}
