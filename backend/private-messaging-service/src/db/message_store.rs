use crate::error::AppResult;
use crate::models::{Attachment, Conversation, Message, NewMessage, PageRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

/// Optional filters for the admin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminFilter {
    pub sender_id: Option<i64>,
    pub recipient_id: Option<i64>,
}

/// Replacement content for an edit-after-recall.
#[derive(Debug, Clone)]
pub struct MessageEdit {
    pub content: String,
    /// `None` keeps the stored attachments.
    pub attachments: Option<Vec<Attachment>>,
}

/// Storage operations behind the messaging facade.
///
/// Listing methods return `(page_items, total)`; lists are newest first.
/// Conditional updates report whether a row actually changed, so the facade
/// can tell an applied mutation from a no-op or a lost race.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn user_exists(&self, user_id: i64) -> AppResult<bool>;

    async fn insert(&self, message: NewMessage) -> AppResult<Message>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Message>>;

    async fn list_inbox(
        &self,
        recipient_id: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)>;

    async fn list_outbox(
        &self,
        sender_id: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)>;

    /// Messages of one thread visible to `viewer`.
    async fn list_thread(
        &self,
        viewer: i64,
        thread_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)>;

    async fn list_conversations(
        &self,
        viewer: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<Conversation>, i64)>;

    async fn mark_read(&self, id: i64, recipient_id: i64, at: DateTime<Utc>) -> AppResult<bool>;

    async fn mark_thread_read(
        &self,
        recipient_id: i64,
        thread_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    async fn mark_all_read(&self, recipient_id: i64, at: DateTime<Utc>) -> AppResult<u64>;

    /// Hide the message on `user_id`'s side only.
    async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> AppResult<bool>;

    async fn soft_delete_thread(
        &self,
        user_id: i64,
        thread_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    async fn unread_count(&self, recipient_id: i64) -> AppResult<i64>;

    /// Recall if the sender still sees the message, it is not recalled and it
    /// was created at or after `not_before`.
    async fn recall(
        &self,
        id: i64,
        sender_id: i64,
        not_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Replace the content of a recalled message and return it to the active state.
    async fn edit(
        &self,
        id: i64,
        sender_id: i64,
        edit: MessageEdit,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Message>>;

    /// All rows including soft-deleted ones.
    async fn admin_list(
        &self,
        filter: AdminFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)>;

    async fn hard_delete(&self, id: i64) -> AppResult<bool>;

    /// Physically remove rows deleted by both participants.
    async fn purge_deleted(&self) -> AppResult<u64>;
}

macro_rules! message_columns {
    () => {
        "id, sender_id, recipient_id, content, subject, thread_id, reply_to_id, attachments, \
         is_read, read_at, sender_deleted, sender_deleted_at, recipient_deleted, \
         recipient_deleted_at, is_recalled, recalled_at, edited_at, created_at"
    };
}

macro_rules! visible_to_first_param {
    () => {
        "((sender_id = $1 AND NOT sender_deleted) OR (recipient_id = $1 AND NOT recipient_deleted))"
    };
}

#[derive(sqlx::FromRow)]
struct ConversationRow {
    #[sqlx(flatten)]
    message: Message,
    partner_id: i64,
    unread_count: i64,
    total_count: i64,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            thread_id: row.message.thread_id.clone(),
            partner_id: row.partner_id,
            last_message: row.message,
            unread_count: row.unread_count,
            total_count: row.total_count,
        }
    }
}

/// PostgreSQL-backed message store.
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn user_exists(&self, user_id: i64) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, message: NewMessage) -> AppResult<Message> {
        let row = sqlx::query_as::<_, Message>(concat!(
            "INSERT INTO messages \
             (sender_id, recipient_id, content, subject, thread_id, reply_to_id, attachments, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING ",
            message_columns!()
        ))
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(&message.content)
        .bind(&message.subject)
        .bind(&message.thread_id)
        .bind(message.reply_to_id)
        .bind(Json(&message.attachments))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Message>> {
        let row = sqlx::query_as::<_, Message>(concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_inbox(
        &self,
        recipient_id: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = sqlx::query_as::<_, Message>(concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages \
             WHERE recipient_id = $1 AND NOT recipient_deleted \
               AND ($2::TEXT IS NULL OR thread_id = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(recipient_id)
        .bind(thread_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages \
             WHERE recipient_id = $1 AND NOT recipient_deleted \
               AND ($2::TEXT IS NULL OR thread_id = $2)",
        )
        .bind(recipient_id)
        .bind(thread_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn list_outbox(
        &self,
        sender_id: i64,
        thread_id: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = sqlx::query_as::<_, Message>(concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages \
             WHERE sender_id = $1 AND NOT sender_deleted \
               AND ($2::TEXT IS NULL OR thread_id = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(sender_id)
        .bind(thread_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages \
             WHERE sender_id = $1 AND NOT sender_deleted \
               AND ($2::TEXT IS NULL OR thread_id = $2)",
        )
        .bind(sender_id)
        .bind(thread_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn list_thread(
        &self,
        viewer: i64,
        thread_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = sqlx::query_as::<_, Message>(concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages WHERE thread_id = $2 AND ",
            visible_to_first_param!(),
            " ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(viewer)
        .bind(thread_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(concat!(
            "SELECT COUNT(*) FROM messages WHERE thread_id = $2 AND ",
            visible_to_first_param!()
        ))
        .bind(viewer)
        .bind(thread_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn list_conversations(
        &self,
        viewer: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<Conversation>, i64)> {
        let rows = sqlx::query_as::<_, ConversationRow>(concat!(
            "WITH visible AS ( \
                 SELECT ",
            message_columns!(),
            ", CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS partner_id \
                 FROM messages WHERE ",
            visible_to_first_param!(),
            " ), \
             latest AS ( \
                 SELECT DISTINCT ON (thread_id) * FROM visible \
                 ORDER BY thread_id, created_at DESC, id DESC \
             ), \
             stats AS ( \
                 SELECT thread_id, \
                        COUNT(*) AS total_count, \
                        COUNT(*) FILTER (WHERE recipient_id = $1 AND NOT is_read) AS unread_count \
                 FROM visible GROUP BY thread_id \
             ) \
             SELECT latest.*, stats.total_count, stats.unread_count \
             FROM latest JOIN stats ON stats.thread_id = latest.thread_id \
             ORDER BY latest.created_at DESC, latest.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(viewer)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(concat!(
            "SELECT COUNT(DISTINCT thread_id) FROM messages WHERE ",
            visible_to_first_param!()
        ))
        .bind(viewer)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Conversation::from).collect(), total))
    }

    async fn mark_read(&self, id: i64, recipient_id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE, read_at = $3 \
             WHERE id = $1 AND recipient_id = $2 AND NOT is_read AND NOT recipient_deleted",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_thread_read(
        &self,
        recipient_id: i64,
        thread_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE, read_at = $3 \
             WHERE recipient_id = $1 AND thread_id = $2 AND NOT is_read AND NOT recipient_deleted",
        )
        .bind(recipient_id)
        .bind(thread_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_all_read(&self, recipient_id: i64, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE, read_at = $2 \
             WHERE recipient_id = $1 AND NOT is_read AND NOT recipient_deleted",
        )
        .bind(recipient_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(concat!(
            "UPDATE messages SET \
                 sender_deleted = sender_deleted OR sender_id = $1, \
                 sender_deleted_at = CASE WHEN sender_id = $1 THEN $3 ELSE sender_deleted_at END, \
                 recipient_deleted = recipient_deleted OR recipient_id = $1, \
                 recipient_deleted_at = CASE WHEN recipient_id = $1 THEN $3 ELSE recipient_deleted_at END \
             WHERE id = $2 AND ",
            visible_to_first_param!()
        ))
        .bind(user_id)
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_thread(
        &self,
        user_id: i64,
        thread_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(concat!(
            "UPDATE messages SET \
                 sender_deleted = sender_deleted OR sender_id = $1, \
                 sender_deleted_at = CASE WHEN sender_id = $1 THEN $3 ELSE sender_deleted_at END, \
                 recipient_deleted = recipient_deleted OR recipient_id = $1, \
                 recipient_deleted_at = CASE WHEN recipient_id = $1 THEN $3 ELSE recipient_deleted_at END \
             WHERE thread_id = $2 AND ",
            visible_to_first_param!()
        ))
        .bind(user_id)
        .bind(thread_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, recipient_id: i64) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages \
             WHERE recipient_id = $1 AND NOT is_read AND NOT recipient_deleted",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn recall(
        &self,
        id: i64,
        sender_id: i64,
        not_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE messages SET is_recalled = TRUE, recalled_at = $4 \
             WHERE id = $1 AND sender_id = $2 AND NOT sender_deleted \
               AND NOT is_recalled AND created_at >= $3",
        )
        .bind(id)
        .bind(sender_id)
        .bind(not_before)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn edit(
        &self,
        id: i64,
        sender_id: i64,
        edit: MessageEdit,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Message>> {
        let row = sqlx::query_as::<_, Message>(concat!(
            "UPDATE messages SET \
                 content = $3, \
                 attachments = COALESCE($4, attachments), \
                 is_recalled = FALSE, \
                 edited_at = $5 \
             WHERE id = $1 AND sender_id = $2 AND NOT sender_deleted AND is_recalled \
             RETURNING ",
            message_columns!()
        ))
        .bind(id)
        .bind(sender_id)
        .bind(&edit.content)
        .bind(edit.attachments.map(Json))
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn admin_list(
        &self,
        filter: AdminFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = sqlx::query_as::<_, Message>(concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages \
             WHERE ($1::BIGINT IS NULL OR sender_id = $1) \
               AND ($2::BIGINT IS NULL OR recipient_id = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.sender_id)
        .bind(filter.recipient_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages \
             WHERE ($1::BIGINT IS NULL OR sender_id = $1) \
               AND ($2::BIGINT IS NULL OR recipient_id = $2)",
        )
        .bind(filter.sender_id)
        .bind(filter.recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn hard_delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_deleted(&self) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM messages WHERE sender_deleted AND recipient_deleted")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
