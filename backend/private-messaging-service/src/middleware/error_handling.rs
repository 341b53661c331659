use crate::error::AppError;
use actix_web::{http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ApiResponse, ErrorResponse};

pub fn status_of(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn reason(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad Request",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::CONFLICT => "Conflict",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "Error",
    }
}

/// Map domain errors to an HTTP status and the shared error body.
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status = status_of(err);
    let (error_type, code) = match err {
        AppError::Validation(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
        AppError::MissingToken => (kinds::AUTHENTICATION_ERROR, error_codes::TOKEN_MISSING),
        AppError::Unauthorized => (kinds::AUTHENTICATION_ERROR, error_codes::TOKEN_INVALID),
        AppError::NotSender(_) => (kinds::AUTHORIZATION_ERROR, error_codes::NOT_MESSAGE_SENDER),
        AppError::NotRecipient(_) => (
            kinds::AUTHORIZATION_ERROR,
            error_codes::NOT_MESSAGE_RECIPIENT,
        ),
        AppError::AdminRequired => (kinds::AUTHORIZATION_ERROR, error_codes::ADMIN_REQUIRED),
        AppError::RecallWindowExpired { .. } => (
            kinds::AUTHORIZATION_ERROR,
            error_codes::RECALL_WINDOW_EXPIRED,
        ),
        AppError::NotFound => (kinds::NOT_FOUND_ERROR, error_codes::MESSAGE_NOT_FOUND),
        AppError::UserNotFound => (kinds::NOT_FOUND_ERROR, error_codes::USER_NOT_FOUND),
        AppError::AlreadyRecalled => (kinds::STATE_ERROR, error_codes::MESSAGE_ALREADY_RECALLED),
        AppError::NotRecalled => (kinds::STATE_ERROR, error_codes::MESSAGE_NOT_RECALLED),
        AppError::Database(_) => (kinds::SERVER_ERROR, error_codes::DATABASE_ERROR),
        AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => {
            (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR)
        }
    };

    // Server-side details stay in the logs.
    let message = if status.is_server_error() {
        "internal server error".to_string()
    } else {
        err.to_string()
    };

    let response = ErrorResponse::new(reason(status), &message, status.as_u16(), error_type, code);
    let response = match err {
        AppError::RecallWindowExpired {
            created_at,
            window_secs,
        } => response.with_details(format!(
            "created_at={}, window_secs={window_secs}",
            created_at.to_rfc3339()
        )),
        _ => response,
    };
    (status, response)
}

pub fn into_response(err: &AppError) -> HttpResponse {
    let (status, response) = map_error(err);
    if status.is_server_error() {
        tracing::error!(error = %err, retryable = err.is_retryable(), "request failed");
    }
    HttpResponse::build(status).json(ApiResponse::<()>::failure(response))
}

/// Envelope for an idempotent mutation that found nothing to change.
pub fn already_applied(code: &str, message: &str) -> HttpResponse {
    let response = ErrorResponse::new(
        reason(StatusCode::CONFLICT),
        message,
        StatusCode::CONFLICT.as_u16(),
        kinds::CONFLICT_ERROR,
        code,
    );
    HttpResponse::Conflict().json(ApiResponse::<()>::failure(response))
}
