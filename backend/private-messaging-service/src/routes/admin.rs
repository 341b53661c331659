use crate::{
    db::AdminFilter, error::AppError, middleware::guards::AdminUser, models::PageRequest,
    state::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse};
use error_types::ApiResponse;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
}

/// GET /messages/admin/all
/// Raw rows, including soft-deleted and recalled content.
#[get("/messages/admin/all")]
pub async fn list_all(
    state: web::Data<AppState>,
    admin: AdminUser,
    query: web::Query<AdminListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;
    let filter = AdminFilter {
        sender_id: query.sender_id,
        recipient_id: query.receiver_id,
    };
    tracing::debug!(admin_id = admin.id, ?filter, "admin message listing");
    let result = state.messaging.admin_list(filter, page).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(result)))
}

/// DELETE /messages/admin/{id}
#[delete("/messages/admin/{id:\\d+}")]
pub async fn hard_delete(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    state
        .messaging
        .admin_hard_delete(admin.id, id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "deleted": true }))))
}

/// POST /messages/admin/purge
#[post("/messages/admin/purge")]
pub async fn purge(
    state: web::Data<AppState>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let purged = state.messaging.admin_purge(admin.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "purgedCount": purged }))))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_all).service(hard_delete).service(purge);
}
