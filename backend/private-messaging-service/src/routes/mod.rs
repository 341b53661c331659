pub mod admin;
pub mod messages;

use crate::{error::AppError, metrics, middleware::auth::JwtAuth, state::AppState};
use actix_web::{error, web, HttpResponse};

/// Register every route plus the extractor configs that turn malformed
/// bodies, queries and paths into the standard validation envelope.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            error::Error::from(AppError::validation(format!("invalid JSON body: {err}")))
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            error::Error::from(AppError::validation(format!("invalid query: {err}")))
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            error::Error::from(AppError::validation(format!("invalid path: {err}")))
        }))
        .route("/health", web::get().to(|| async { HttpResponse::Ok().body("OK") }))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/api/v1")
                .wrap(JwtAuth::new(&state.config.jwt_secret))
                .configure(admin::configure)
                .configure(messages::configure),
        );
}
