//! Recall / edit-after-recall state machine.
//!
//! `Active --recall--> Recalled --edit--> Active`. Both transitions belong to
//! the sender; recall is additionally bounded by a window measured from
//! `created_at`, inclusive at the boundary.

use crate::error::{AppError, AppResult};
use crate::models::Message;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallState {
    Active,
    Recalled,
}

impl RecallState {
    pub fn of(message: &Message) -> Self {
        if message.is_recalled {
            RecallState::Recalled
        } else {
            RecallState::Active
        }
    }
}

/// Earliest `created_at` that is still recallable at `now`.
pub fn recall_cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now - window
}

pub fn check_recall(
    message: &Message,
    caller: i64,
    now: DateTime<Utc>,
    window: Duration,
) -> AppResult<()> {
    if message.sender_id != caller {
        return Err(AppError::NotSender("recall a message"));
    }
    if RecallState::of(message) == RecallState::Recalled {
        return Err(AppError::AlreadyRecalled);
    }
    if message.created_at < recall_cutoff(now, window) {
        return Err(AppError::RecallWindowExpired {
            created_at: message.created_at,
            window_secs: window.num_seconds(),
        });
    }
    Ok(())
}

pub fn check_edit(message: &Message, caller: i64) -> AppResult<()> {
    if message.sender_id != caller {
        return Err(AppError::NotSender("edit a message"));
    }
    if RecallState::of(message) != RecallState::Recalled {
        return Err(AppError::NotRecalled);
    }
    Ok(())
}
