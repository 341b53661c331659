#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use private_messaging_service::{
    config::Config,
    db::InMemoryMessageStore,
    middleware::Claims,
    models::SendMessageRequest,
    services::{
        ManualClock, MessagingService, NewMessageNotification, NotificationError,
        NotificationHook,
    },
    state::AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const CAROL: i64 = 3;
pub const ADMIN: i64 = 99;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

/// Forwards every event to a channel so tests can await delivery.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<NewMessageNotification>,
}

#[async_trait]
impl NotificationHook for RecordingNotifier {
    async fn notify(&self, event: &NewMessageNotification) -> Result<(), NotificationError> {
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

/// Always fails, but still reports that it was called.
pub struct FailingNotifier {
    tx: mpsc::UnboundedSender<NewMessageNotification>,
}

#[async_trait]
impl NotificationHook for FailingNotifier {
    async fn notify(&self, event: &NewMessageNotification) -> Result<(), NotificationError> {
        let _ = self.tx.send(event.clone());
        Err(NotificationError::Status(503))
    }
}

pub struct Harness {
    pub service: Arc<MessagingService>,
    pub store: Arc<InMemoryMessageStore>,
    pub clock: Arc<ManualClock>,
    pub events: Mutex<mpsc::UnboundedReceiver<NewMessageNotification>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn with_failing_notifier() -> Self {
        Self::build(true)
    }

    fn build(failing: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier: Arc<dyn NotificationHook> = if failing {
            Arc::new(FailingNotifier { tx })
        } else {
            Arc::new(RecordingNotifier { tx })
        };
        let store = Arc::new(InMemoryMessageStore::with_users([ALICE, BOB, CAROL, ADMIN]));
        let clock = Arc::new(ManualClock::new(start_time()));
        let service = MessagingService::new(
            store.clone(),
            notifier,
            clock.clone(),
            chrono::Duration::minutes(3),
        );

        Self {
            service: Arc::new(service),
            store,
            clock,
            events: Mutex::new(rx),
        }
    }

    /// Wait for the next notification spawned by a send.
    pub async fn next_event(&self) -> Option<NewMessageNotification> {
        let mut rx = self.events.lock().await;
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            messaging: Arc::clone(&self.service),
            config: Arc::new(Config::test_defaults()),
        }
    }
}

pub fn send_request(recipient_id: i64, content: &str) -> SendMessageRequest {
    SendMessageRequest {
        recipient_id,
        content: content.to_string(),
        subject: None,
        reply_to_id: None,
        attachments: None,
    }
}

pub fn token_for(user_id: i64, role: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        role: role.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(Config::test_defaults().jwt_secret.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(user_id: i64) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user_id, None)))
}

pub fn admin_bearer() -> (&'static str, String) {
    (
        "Authorization",
        format!("Bearer {}", token_for(ADMIN, Some("admin"))),
    )
}
