use actix_cors::Cors;
use actix_web::{http::header, App, HttpServer};
use private_messaging_service::{
    config::Config,
    db::{self, PgMessageStore},
    error::AppError,
    logging,
    metrics::MetricsMiddleware,
    routes,
    services::{
        LoggingNotifier, MessagingService, NotificationHook, SystemClock, WebhookNotifier,
    },
    state::AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let cfg = Config::from_env()?;

    let pool = db::init_pool(&cfg.database_url)
        .await
        .map_err(|e| AppError::StartServer(format!("db: {e}")))?;

    let notifier: Arc<dyn NotificationHook> = match cfg.notification_webhook_url.as_deref() {
        Some(url) => Arc::new(
            WebhookNotifier::new(url, Duration::from_millis(cfg.notification_timeout_ms))
                .map_err(|e| AppError::StartServer(format!("notification client: {e}")))?,
        ),
        None => {
            tracing::info!("NOTIFICATION_WEBHOOK_URL not set; new-message events will only be logged");
            Arc::new(LoggingNotifier)
        }
    };

    let messaging = MessagingService::new(
        Arc::new(PgMessageStore::new(pool)),
        notifier,
        Arc::new(SystemClock),
        cfg.recall_window(),
    );

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    let allowed_origins = cfg.cors_allowed_origins.clone();
    let state = AppState::new(messaging, cfg);

    tracing::info!(%bind_addr, "starting private-messaging-service");

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| routes::configure(cfg, &state))
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(format!("server: {e}")))
}
