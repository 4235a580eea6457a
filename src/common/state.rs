use crate::config::Config;
use crate::services::report_service::ReportConverter;
use std::sync::Arc;

/// Shared, read-only request state. Each conversion opens its own workbook.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub converter: Arc<ReportConverter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let converter = Arc::new(ReportConverter::from_config(&config));
        Self { config, converter }
    }
}
