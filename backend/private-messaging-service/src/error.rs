use crate::middleware::error_handling;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        error_handling::status_of(self)
    }

    fn error_response(&self) -> HttpResponse {
        error_handling::into_response(self)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("{0}")]
    Validation(String),

    #[error("missing bearer token")]
    MissingToken,

    #[error("unauthorized")]
    Unauthorized,

    #[error("only the sender can {0}")]
    NotSender(&'static str),

    #[error("only the recipient can {0}")]
    NotRecipient(&'static str),

    #[error("admin privileges required")]
    AdminRequired,

    #[error("message not found")]
    NotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal server error")]
    Internal,

    #[error("message already recalled")]
    AlreadyRecalled,

    #[error("message is not recalled")]
    NotRecalled,

    #[error("recall window expired")]
    RecallWindowExpired {
        created_at: chrono::DateTime<chrono::Utc>,
        window_secs: i64,
    },
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Returns whether this error is retryable (e.g., database connection timeout)
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(e) => {
                matches!(
                    e,
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
            }
            AppError::Internal => true,
            _ => false,
        }
    }

    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::MissingToken | AppError::Unauthorized => 401,
            AppError::NotSender(_)
            | AppError::NotRecipient(_)
            | AppError::AdminRequired
            | AppError::RecallWindowExpired { .. } => 403,
            AppError::NotFound | AppError::UserNotFound => 404,
            AppError::AlreadyRecalled | AppError::NotRecalled => 409,
            AppError::Config(_)
            | AppError::StartServer(_)
            | AppError::Database(_)
            | AppError::Internal => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_only_for_transient_failures() {
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(AppError::Internal.is_retryable());
        assert!(!AppError::Database(sqlx::Error::RowNotFound).is_retryable());
        assert!(!AppError::NotFound.is_retryable());
    }

    #[test]
    fn permission_and_window_errors_share_status() {
        let expired = AppError::RecallWindowExpired {
            created_at: chrono::Utc::now(),
            window_secs: 180,
        };
        assert_eq!(expired.status_code(), 403);
        assert_eq!(AppError::NotSender("recall a message").status_code(), 403);
        assert_eq!(AppError::MissingToken.status_code(), 401);
        assert_eq!(AppError::AlreadyRecalled.status_code(), 409);
        assert_eq!(AppError::UserNotFound.status_code(), 404);
    }

    #[test]
    fn role_errors_name_the_required_party() {
        assert_eq!(
            AppError::NotRecipient("mark a message as read").to_string(),
            "only the recipient can mark a message as read"
        );
    }
}
