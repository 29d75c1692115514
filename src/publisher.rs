use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::performance::PerformanceResult;
use crate::utilities::knots_to_ms;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: &'static str,
    pub value: f64,
}

/// One publication cycle: all available values with a common timestamp
#[derive(Debug, Clone, Serialize)]
pub struct Delta {
    pub timestamp: String,
    pub values: Vec<PathValue>,
}

impl Delta {
    pub fn new(timestamp: DateTime<Utc>, values: Vec<PathValue>) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            values,
        }
    }
}

/// Map a result to output paths, everything in SI units (m/s, radians).
/// Values that are not available are left out.
pub fn output_values(result: &PerformanceResult) -> Vec<PathValue> {
    let target_angle = result.target_true_wind_angle.map(f64::to_radians);
    let target_speed = result.target_boat_speed.map(knots_to_ms);
    let target_vmg = match (target_speed, target_angle) {
        (Some(speed), Some(angle)) => Some(speed * angle.cos()),
        _ => None,
    };

    let candidates = [
        ("performance.polarSpeed", result.polar_speed.map(knots_to_ms)),
        ("performance.polarSpeedRatio", result.polar_performance_ratio),
        ("performance.velocityMadeGood", result.velocity_made_good),
        ("performance.targetVMG", target_vmg),
        ("performance.targetAngle", target_angle),
        ("performance.targetBoatSpeed", target_speed),
        ("performance.vmgPerformance", result.vmg_performance_ratio),
        ("performance.leeway", Some(result.leeway)),
        ("environment.wind.speedTrue", Some(result.true_wind_speed_ms)),
        ("environment.wind.angleTrueWater", Some(result.true_wind_angle)),
        ("environment.wind.directionMagnetic", result.true_wind_direction),
        ("environment.current.speed", result.current_speed),
        ("environment.current.set", result.current_set),
    ];

    candidates
        .into_iter()
        .filter_map(|(path, value)| value.filter(|v| !v.is_nan()).map(|value| PathValue { path, value }))
        .collect()
}
