use crate::{
    error::AppError,
    middleware::{error_handling::already_applied, guards::User},
    models::{EditMessageRequest, PageRequest, SendMessageRequest},
    services::Outcome,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse};
use error_types::{error_codes, ApiResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn ok<T: serde::Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

/// POST /messages
#[post("/messages")]
pub async fn send_message(
    state: web::Data<AppState>,
    user: User,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let view = state.messaging.send(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(view)))
}

/// GET /messages/inbox
#[get("/messages/inbox")]
pub async fn inbox(
    state: web::Data<AppState>,
    user: User,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;
    let result = state
        .messaging
        .list_inbox(user.id, query.thread_id.as_deref(), page)
        .await?;
    Ok(ok(result))
}

/// GET /messages/outbox
#[get("/messages/outbox")]
pub async fn outbox(
    state: web::Data<AppState>,
    user: User,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;
    let result = state
        .messaging
        .list_outbox(user.id, query.thread_id.as_deref(), page)
        .await?;
    Ok(ok(result))
}

/// GET /messages/conversations
#[get("/messages/conversations")]
pub async fn conversations(
    state: web::Data<AppState>,
    user: User,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;
    Ok(ok(state.messaging.list_conversations(user.id, page).await?))
}

/// GET /messages/conversation/{partnerId}
/// Newest page first; messages within the page oldest to newest.
#[get("/messages/conversation/{partner_id}")]
pub async fn conversation_history(
    state: web::Data<AppState>,
    user: User,
    partner_id: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;
    let result = state
        .messaging
        .conversation_history(user.id, partner_id.into_inner(), page)
        .await?;
    Ok(ok(result))
}

/// GET /messages/unread-count
#[get("/messages/unread-count")]
pub async fn unread_count(
    state: web::Data<AppState>,
    user: User,
) -> Result<HttpResponse, AppError> {
    let count = state.messaging.unread_count(user.id).await?;
    Ok(ok(json!({ "unreadCount": count })))
}

/// GET /messages/thread-id/{otherUserId}
#[get("/messages/thread-id/{other_user_id}")]
pub async fn resolve_thread(
    state: web::Data<AppState>,
    user: User,
    other_user_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let thread_id = state
        .messaging
        .resolve_thread_id(user.id, other_user_id.into_inner())?;
    Ok(ok(json!({ "threadId": thread_id })))
}

/// GET /messages/{id}
#[get("/messages/{id:\\d+}")]
pub async fn get_message(
    state: web::Data<AppState>,
    user: User,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    Ok(ok(state.messaging.get_message(user.id, id.into_inner()).await?))
}

/// PUT /messages/read-all
#[put("/messages/read-all")]
pub async fn mark_all_read(
    state: web::Data<AppState>,
    user: User,
) -> Result<HttpResponse, AppError> {
    let count = state.messaging.mark_all_as_read(user.id).await?;
    Ok(ok(json!({ "markedCount": count })))
}

/// PUT /messages/{id}/read
#[put("/messages/{id:\\d+}/read")]
pub async fn mark_read(
    state: web::Data<AppState>,
    user: User,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    match state.messaging.mark_as_read(user.id, id.into_inner()).await? {
        Outcome::Applied => Ok(ok(json!({ "markedRead": true }))),
        Outcome::AlreadyApplied => Ok(already_applied(
            error_codes::MESSAGE_ALREADY_READ,
            "message is already marked as read",
        )),
    }
}

/// PUT /messages/thread/{threadId}/read
#[put("/messages/thread/{thread_id}/read")]
pub async fn mark_thread_read(
    state: web::Data<AppState>,
    user: User,
    thread_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let count = state
        .messaging
        .mark_thread_as_read(user.id, &thread_id)
        .await?;
    Ok(ok(json!({ "markedCount": count })))
}

/// PUT /messages/{id}/recall
#[put("/messages/{id:\\d+}/recall")]
pub async fn recall_message(
    state: web::Data<AppState>,
    user: User,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    state.messaging.recall(user.id, id.into_inner()).await?;
    Ok(ok(json!({ "recalled": true })))
}

/// PUT /messages/{id}/edit
/// Only a recalled message can be edited; editing makes it active again.
#[put("/messages/{id:\\d+}/edit")]
pub async fn edit_message(
    state: web::Data<AppState>,
    user: User,
    id: web::Path<i64>,
    body: web::Json<EditMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let view = state
        .messaging
        .edit(user.id, id.into_inner(), body.into_inner())
        .await?;
    Ok(ok(view))
}

/// DELETE /messages/{id}
#[delete("/messages/{id:\\d+}")]
pub async fn delete_message(
    state: web::Data<AppState>,
    user: User,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    match state.messaging.delete_message(user.id, id.into_inner()).await? {
        Outcome::Applied => Ok(ok(json!({ "deleted": true }))),
        Outcome::AlreadyApplied => Ok(already_applied(
            error_codes::MESSAGE_ALREADY_DELETED,
            "message is already deleted",
        )),
    }
}

/// DELETE /messages/thread/{threadId}
#[delete("/messages/thread/{thread_id}")]
pub async fn delete_thread(
    state: web::Data<AppState>,
    user: User,
    thread_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let count = state.messaging.delete_thread(user.id, &thread_id).await?;
    Ok(ok(json!({ "deletedCount": count })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(send_message)
        .service(inbox)
        .service(outbox)
        .service(conversations)
        .service(conversation_history)
        .service(unread_count)
        .service(resolve_thread)
        .service(get_message)
        .service(mark_all_read)
        .service(mark_read)
        .service(mark_thread_read)
        .service(recall_message)
        .service(edit_message)
        .service(delete_message)
        .service(delete_thread);
}
