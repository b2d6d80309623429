use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ingestion::IngestionPipeline;
use crate::services::orchestrator::Orchestrator;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub ingestion: Arc<IngestionPipeline>,
}
