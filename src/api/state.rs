use crate::core::AppConfig;
use crate::notify::PushService;

pub struct AppState {
    pub service: PushService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: PushService, config: AppConfig) -> Self {
        Self { service, config }
    }
}
