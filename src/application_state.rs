use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::{CalibrationConfig, Config};
use crate::performance::PerformanceResult;
use crate::polar_store::PolarStore;

/// Latest result together with the time it was computed
#[derive(Debug, Clone, Serialize)]
pub struct PublishedResult {
    pub timestamp: String,
    pub result: PerformanceResult,
}

/// State shared between the calculation loop and the web API
pub struct ApplicationState {
    pub polar: PolarStore,
    pub config: Config,
    last_result: RwLock<Option<PublishedResult>>,
}

impl ApplicationState {
    pub fn new(config: Config, polar: PolarStore) -> Self {
        ApplicationState {
            polar,
            config,
            last_result: RwLock::new(None),
        }
    }

    pub fn update_result(&self, result: PerformanceResult, timestamp: DateTime<Utc>) {
        *self.last_result.write() = Some(PublishedResult {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            result,
        });
    }

    pub fn last_result(&self) -> Option<PublishedResult> {
        self.last_result.read().clone()
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.config.calibration
    }
}
