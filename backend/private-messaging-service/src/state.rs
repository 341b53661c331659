use crate::{config::Config, services::MessagingService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub messaging: Arc<MessagingService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(messaging: MessagingService, config: Config) -> Self {
        Self {
            messaging: Arc::new(messaging),
            config: Arc::new(config),
        }
    }
}
