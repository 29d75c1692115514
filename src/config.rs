use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::performance::{DEFAULT_LEEWAY_COEFFICIENT, DEFAULT_MAX_LEEWAY_DEG};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polar CSV file (TWA rows, TWS columns)
    #[serde(default = "default_polar_file")]
    pub polar_file: String,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub source_filter: SourceFilterConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

fn default_polar_file() -> String {
    "./polar.csv".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory where log files will be stored
    pub directory: String,
    /// Log file name prefix (date will be appended)
    pub file_prefix: String,
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: "./logs".to_string(),
            file_prefix: "sail_performance".to_string(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Leeway coefficient k in `k * heel / stw²`
    pub leeway_coefficient: f64,
    /// Leeway is clamped to ± this many degrees
    pub max_leeway_degrees: f64,
    /// Minimum time between two calculations
    pub min_interval_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            leeway_coefficient: DEFAULT_LEEWAY_COEFFICIENT,
            max_leeway_degrees: DEFAULT_MAX_LEEWAY_DEG,
            min_interval_ms: 500,
        }
    }
}

impl PerformanceConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Added to the log reading, m/s
    pub speed_through_water_offset: f64,
    /// Relative log correction per radian of heel
    pub heel_correction_factor: f64,
}

impl CalibrationConfig {
    /// Corrected speed through water: `stw * (1 + factor * |heel|) + offset`.
    /// Heel is taken as zero when unknown.
    pub fn calibrated_stw(&self, stw: f64, heel: Option<f64>) -> f64 {
        let correction = 1.0 + self.heel_correction_factor * heel.unwrap_or(0.0).abs();
        stw * correction + self.speed_through_water_offset
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Emit H5000 performance frames (PGN 130824)
    pub enabled: bool,
    /// NMEA2000 source address used for the emitted frames
    pub source_address: u8,
    /// Canboat log file to append frames to; stdout if not set
    pub output_file: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_address: 138,
            output_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    pub port: u16,
    /// Directory of static files served next to the API
    pub static_dir: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceFilterConfig {
    /// Map of PGN to allowed source address
    /// If a PGN is present in this map, only messages from the specified source will be accepted
    /// If a PGN is not in the map, all sources are accepted
    #[serde(default)]
    pub pgn_source_map: HashMap<u32, u8>,
}

impl SourceFilterConfig {
    /// Check if a message should be accepted based on its PGN and source
    pub fn should_accept(&self, pgn: u32, source: u8) -> bool {
        match self.pgn_source_map.get(&pgn) {
            Some(&allowed_source) => source == allowed_source,
            None => true, // No filter for this PGN, accept all sources
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            polar_file: default_polar_file(),
            performance: PerformanceConfig::default(),
            calibration: CalibrationConfig::default(),
            telemetry: TelemetryConfig::default(),
            web: WebConfig::default(),
            source_filter: SourceFilterConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        let performance = &self.performance;
        if !performance.leeway_coefficient.is_finite() {
            return Err("performance.leeway_coefficient must be a finite number".into());
        }
        if !performance.max_leeway_degrees.is_finite() || performance.max_leeway_degrees < 0.0 {
            return Err(format!(
                "performance.max_leeway_degrees must be >= 0, got {}",
                performance.max_leeway_degrees
            )
            .into());
        }
        let calibration = &self.calibration;
        if !calibration.speed_through_water_offset.is_finite() || !calibration.heel_correction_factor.is_finite() {
            return Err("calibration values must be finite numbers".into());
        }
        if self.web.enabled && self.web.port == 0 {
            return Err("web.port must not be 0".into());
        }
        Ok(())
    }
}
