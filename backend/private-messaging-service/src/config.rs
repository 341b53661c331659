use crate::error::AppError;
use db_pool::env_utils::{
    parse_env_optional, parse_env_required, parse_env_with_default, parse_list,
};
use dotenvy::dotenv;
use std::env;

const DEFAULT_RECALL_WINDOW_SECS: i64 = 180;
const DEFAULT_NOTIFICATION_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// How long after creation a sender may still recall a message.
    pub recall_window_secs: i64,
    /// Notification service endpoint; new-message events are only logged when unset.
    pub notification_webhook_url: Option<String>,
    pub notification_timeout_ms: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        let database_url: String =
            parse_env_required("DATABASE_URL").map_err(AppError::Config)?;
        let jwt_secret: String = parse_env_required("JWT_SECRET").map_err(AppError::Config)?;
        if jwt_secret.trim().is_empty() {
            return Err(AppError::Config("JWT_SECRET must not be empty".into()));
        }

        let recall_window_secs =
            parse_env_with_default("RECALL_WINDOW_SECS", DEFAULT_RECALL_WINDOW_SECS);
        if recall_window_secs <= 0 {
            return Err(AppError::Config(
                "RECALL_WINDOW_SECS must be a positive number of seconds".into(),
            ));
        }

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        Ok(Self {
            database_url,
            port: parse_env_with_default("PORT", 8085),
            jwt_secret,
            recall_window_secs,
            notification_webhook_url: parse_env_optional("NOTIFICATION_WEBHOOK_URL"),
            notification_timeout_ms: parse_env_with_default(
                "NOTIFICATION_TIMEOUT_MS",
                DEFAULT_NOTIFICATION_TIMEOUT_MS,
            ),
            cors_allowed_origins,
        })
    }

    pub fn recall_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.recall_window_secs)
    }

    pub fn test_defaults() -> Self {
        Self {
            database_url: "postgres://localhost/test".into(),
            port: 8085,
            jwt_secret: "test-secret".into(),
            recall_window_secs: DEFAULT_RECALL_WINDOW_SECS,
            notification_webhook_url: None,
            notification_timeout_ms: DEFAULT_NOTIFICATION_TIMEOUT_MS,
            cors_allowed_origins: vec!["http://localhost:3000".into()],
        }
    }
}
