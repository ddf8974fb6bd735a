//! Application state management

use crate::comparison::{ComparisonConfig, ModelComparisonEngine};

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub engine: ModelComparisonEngine,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, comparison: ComparisonConfig) -> Self {
        Self {
            config,
            engine: ModelComparisonEngine::new(comparison),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}
