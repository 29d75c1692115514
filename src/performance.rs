//! Sailing performance calculation: wind triangle, polar targets, VMG,
//! current set/drift and leeway.
//!
//! Conventions: angles in radians, 0 = north, clockwise positive. Directions
//! ("from", as wind is reported) are kept in [0, 2π); angles relative to the
//! bow are kept in (-π, π]. Speeds are m/s except where a field says knots
//! (polar lookups are done in knots).

use std::f64::consts::PI;

use serde::Serialize;

use crate::polar::{PolarTable, SailingMode};
use crate::utilities::{Vector2, ms_to_knots, wrap_2pi, wrap_pi};

/// Speeds at or below this (m/s) are treated as noise for current set and leeway
pub const NOISE_FLOOR_MS: f64 = 0.05;

pub const DEFAULT_LEEWAY_COEFFICIENT: f64 = 0.05;
pub const DEFAULT_MAX_LEEWAY_DEG: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Attitude {
    pub roll: Option<f64>,  // radians, heel
    pub pitch: Option<f64>, // radians
    pub yaw: Option<f64>,   // radians
}

/// Instrument readings for one calculation cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub apparent_wind_angle: Option<f64>, // radians, relative to bow
    pub apparent_wind_speed: Option<f64>, // m/s
    pub speed_through_water: Option<f64>, // m/s
    pub speed_over_ground: Option<f64>,   // m/s
    pub heading: Option<f64>,             // radians
    pub course_over_ground: Option<f64>,  // radians
    pub attitude: Attitude,
    pub engine_running: bool,
    pub leeway_coefficient: f64,
    pub max_leeway_degrees: f64,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            apparent_wind_angle: None,
            apparent_wind_speed: None,
            speed_through_water: None,
            speed_over_ground: None,
            heading: None,
            course_over_ground: None,
            attitude: Attitude::default(),
            engine_running: false,
            leeway_coefficient: DEFAULT_LEEWAY_COEFFICIENT,
            max_leeway_degrees: DEFAULT_MAX_LEEWAY_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceResult {
    pub true_wind_angle: f64,              // radians, -π..π
    pub true_wind_speed: f64,              // knots
    pub true_wind_speed_ms: f64,           // m/s
    pub true_wind_direction: Option<f64>,  // radians, 0..2π, magnetic
    pub polar_speed: Option<f64>,          // knots
    pub polar_performance_ratio: Option<f64>,
    pub target_true_wind_angle: Option<f64>, // degrees
    pub target_boat_speed: Option<f64>,    // knots
    pub velocity_made_good: Option<f64>,   // m/s
    pub vmg_performance_ratio: Option<f64>,
    pub leeway: f64,                       // radians
    pub current_speed: Option<f64>,        // m/s
    pub current_set: Option<f64>,          // radians, 0..2π
    pub heel: Option<f64>,                 // radians
    pub pitch: Option<f64>,                // radians
}

struct TrueWind {
    angle: f64,
    speed: f64, // m/s
    direction: Option<f64>,
}

/// Solve the wind triangle. Without heading or boat speed the apparent wind
/// is used as true wind.
fn true_wind(awa: f64, aws: f64, heading: Option<f64>, stw: Option<f64>) -> TrueWind {
    match (heading, stw) {
        (Some(heading), Some(stw)) => {
            let apparent_to = wrap_2pi(heading + awa + PI);
            let wind = Vector2::from_bearing(apparent_to, aws) + Vector2::from_bearing(heading, stw);
            let direction = wrap_2pi(wind.bearing() + PI);
            TrueWind {
                angle: wrap_pi(direction - heading),
                speed: wind.magnitude(),
                direction: Some(direction),
            }
        }
        _ => TrueWind {
            angle: awa,
            speed: aws,
            direction: heading.map(|heading| wrap_2pi(heading + awa + PI)),
        },
    }
}

/// Leeway from heel: `k * heel / stw²`, clamped to ±`max_leeway_degrees`.
/// Zero at or below the noise floor, where the formula is singular.
pub fn leeway_angle(stw: f64, heel: f64, coefficient: f64, max_leeway_degrees: f64) -> f64 {
    if stw.is_nan() || stw <= NOISE_FLOOR_MS {
        return 0.0;
    }
    let limit = if max_leeway_degrees.is_nan() {
        DEFAULT_MAX_LEEWAY_DEG.to_radians()
    } else {
        max_leeway_degrees.abs().to_radians()
    };
    (coefficient * heel / (stw * stw)).clamp(-limit, limit)
}

struct Current {
    speed: Option<f64>,
    set: Option<f64>,
}

/// Current is what moves the boat over ground beyond its motion through water
fn current(heading: f64, stw: f64, cog: f64, sog: f64) -> Current {
    let drift = Vector2::from_bearing(cog, sog) - Vector2::from_bearing(heading, stw);
    let speed = drift.magnitude();
    Current {
        speed: Some(speed),
        set: (speed > NOISE_FLOOR_MS).then(|| wrap_2pi(drift.bearing() + PI)),
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Compute one performance result from a snapshot.
///
/// Returns `None` when nothing should be published this cycle: the engine is
/// running, or apparent wind is missing. Fields that depend on inputs or
/// polar data that are not available are `None` individually.
pub fn compute_performance(snapshot: &SensorSnapshot, table: &PolarTable) -> Option<PerformanceResult> {
    if snapshot.engine_running {
        return None;
    }
    let awa = snapshot.apparent_wind_angle?;
    let aws = snapshot.apparent_wind_speed?;

    let stw = snapshot.speed_through_water;
    let heading = snapshot.heading;
    let wind = true_wind(awa, aws, heading, stw);

    // Polar targets
    let tws_kn = ms_to_knots(wind.speed);
    let twa_deg = wind.angle.to_degrees();
    let polar_speed = table.polar_speed(tws_kn, twa_deg);
    let polar_performance_ratio = ratio(stw.map(ms_to_knots), polar_speed);

    let mode = SailingMode::for_angle(twa_deg);
    let target_true_wind_angle = table.target_angle(tws_kn, mode);
    let target_boat_speed = table.target_speed(tws_kn, mode);

    let velocity_made_good = stw.map(|stw| stw * wind.angle.cos());
    let vmg_performance_ratio = ratio(velocity_made_good.map(ms_to_knots), target_boat_speed);

    // Current and leeway
    let (current, leeway) = match (stw, snapshot.speed_over_ground, heading, snapshot.course_over_ground) {
        (Some(stw), Some(sog), Some(heading), Some(cog)) => {
            let heel = snapshot.attitude.roll.unwrap_or(0.0);
            (
                current(heading, stw, cog, sog),
                leeway_angle(stw, heel, snapshot.leeway_coefficient, snapshot.max_leeway_degrees),
            )
        }
        _ => (Current { speed: None, set: None }, 0.0),
    };

    Some(PerformanceResult {
        true_wind_angle: wind.angle,
        true_wind_speed: tws_kn,
        true_wind_speed_ms: wind.speed,
        true_wind_direction: wind.direction,
        polar_speed,
        polar_performance_ratio,
        target_true_wind_angle,
        target_boat_speed,
        velocity_made_good,
        vmg_performance_ratio,
        leeway,
        current_speed: current.speed,
        current_set: current.set,
        heel: snapshot.attitude.roll,
        pitch: snapshot.attitude.pitch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RateLimitedWarner;
    use crate::polar::tests::test_table;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn snapshot(
        awa_deg: f64,
        aws: f64,
        stw: f64,
        heading_deg: f64,
        sog: f64,
        cog_deg: f64,
        roll_deg: f64,
    ) -> SensorSnapshot {
        SensorSnapshot {
            apparent_wind_angle: Some(awa_deg.to_radians()),
            apparent_wind_speed: Some(aws),
            speed_through_water: Some(stw),
            speed_over_ground: Some(sog),
            heading: Some(heading_deg.to_radians()),
            course_over_ground: Some(cog_deg.to_radians()),
            attitude: Attitude {
                roll: Some(roll_deg.to_radians()),
                pitch: Some(0.0),
                yaw: Some(0.0),
            },
            ..SensorSnapshot::default()
        }
    }

    #[test]
    fn test_engine_running_gives_no_result() {
        let table = test_table();
        let mut input = snapshot(60.0, 8.0, 4.0, 90.0, 4.0, 90.0, 4.0);
        input.engine_running = true;
        assert!(compute_performance(&input, &table).is_none());

        input.apparent_wind_angle = None;
        assert!(compute_performance(&input, &table).is_none());
    }

    #[test]
    fn test_missing_wind_gives_no_result() {
        let table = test_table();
        let mut input = snapshot(60.0, 8.0, 4.0, 90.0, 4.0, 90.0, 4.0);
        input.apparent_wind_angle = None;
        assert!(compute_performance(&input, &table).is_none());

        let mut input = snapshot(60.0, 8.0, 4.0, 90.0, 4.0, 90.0, 4.0);
        input.apparent_wind_speed = None;
        assert!(compute_performance(&input, &table).is_none());
    }

    #[test]
    fn test_beam_reach_without_current() {
        let table = test_table();
        let result = compute_performance(&snapshot(60.0, 8.0, 4.0, 90.0, 4.0, 90.0, 4.0), &table).unwrap();

        // apparent wind (to 330°) plus boat (to 90°) leaves wind blowing due north
        let tws_ms = 8.0 * 60f64.to_radians().sin();
        assert_abs_diff_eq!(result.true_wind_speed_ms, tws_ms, epsilon = 1e-9);
        assert_abs_diff_eq!(result.true_wind_speed, ms_to_knots(tws_ms), epsilon = 1e-9);
        assert_abs_diff_eq!(result.true_wind_angle, PI / 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.true_wind_direction.unwrap(), PI, epsilon = 1e-9);

        let blend = (ms_to_knots(tws_ms) - 10.0) / 6.0;
        assert_abs_diff_eq!(result.polar_speed.unwrap(), 7.0 + 0.8 * blend, epsilon = 1e-9);
        assert_abs_diff_eq!(
            result.polar_performance_ratio.unwrap(),
            ms_to_knots(4.0) / result.polar_speed.unwrap(),
            epsilon = 1e-9
        );

        // 90° counts as upwind; nearest bin is 16 kn
        assert_eq!(result.target_true_wind_angle, Some(39.0));
        assert_abs_diff_eq!(result.target_boat_speed.unwrap(), 5.8 + 0.6 * blend, epsilon = 1e-9);

        assert_abs_diff_eq!(result.velocity_made_good.unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.current_speed.unwrap(), 0.0, epsilon = 1e-9);
        assert!(result.current_set.is_none());
        assert!(result.leeway > 0.0);
        assert_abs_diff_eq!(result.leeway, 0.05 * 4f64.to_radians() / 16.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.heel.unwrap(), 4f64.to_radians(), epsilon = 1e-12);
        assert_eq!(result.pitch, Some(0.0));
    }

    #[test]
    fn test_port_tack_mirrors_starboard() {
        let table = test_table();
        let starboard = compute_performance(&snapshot(60.0, 8.0, 4.0, 90.0, 4.0, 90.0, 4.0), &table).unwrap();
        let port = compute_performance(&snapshot(-60.0, 8.0, 4.0, 270.0, 4.0, 270.0, -4.0), &table).unwrap();

        assert_abs_diff_eq!(port.true_wind_angle, -starboard.true_wind_angle, epsilon = 1e-9);
        assert_abs_diff_eq!(port.true_wind_speed, starboard.true_wind_speed, epsilon = 1e-9);
        assert_abs_diff_eq!(port.polar_speed.unwrap(), starboard.polar_speed.unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(port.leeway, -starboard.leeway, epsilon = 1e-12);
    }

    #[test]
    fn test_stationary_light_wind() {
        let table = test_table();
        let result = compute_performance(&snapshot(120.0, 3.0, 0.0, 90.0, 0.0, 90.0, 0.0), &table).unwrap();

        assert_abs_diff_eq!(result.true_wind_angle, 120f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(result.true_wind_speed_ms, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.true_wind_speed, ms_to_knots(3.0), epsilon = 1e-9);
        assert_eq!(result.leeway, 0.0);
        assert_abs_diff_eq!(result.velocity_made_good.unwrap(), 0.0);
        assert_abs_diff_eq!(result.current_speed.unwrap(), 0.0);
        assert!(result.current_set.is_none());
        assert_eq!(result.polar_performance_ratio, Some(0.0));
    }

    #[test]
    fn test_docked_fallback_uses_apparent_wind() {
        let table = test_table();
        let input = SensorSnapshot {
            apparent_wind_angle: Some(-0.7),
            apparent_wind_speed: Some(5.0),
            ..SensorSnapshot::default()
        };
        let result = compute_performance(&input, &table).unwrap();

        assert_eq!(result.true_wind_angle, -0.7);
        assert_eq!(result.true_wind_speed_ms, 5.0);
        assert_abs_diff_eq!(result.true_wind_speed, ms_to_knots(5.0), epsilon = 1e-12);
        assert!(result.true_wind_direction.is_none());
        assert!(result.velocity_made_good.is_none());
        assert!(result.polar_performance_ratio.is_none());
        assert!(result.vmg_performance_ratio.is_none());
        assert!(result.current_speed.is_none());
        assert!(result.current_set.is_none());
        assert_eq!(result.leeway, 0.0);
        assert!(result.heel.is_none());
        // polar lookups still work on apparent wind
        assert!(result.polar_speed.is_some());
    }

    #[test]
    fn test_fallback_direction_with_heading_only() {
        let table = test_table();
        let input = SensorSnapshot {
            apparent_wind_angle: Some(0.5),
            apparent_wind_speed: Some(5.0),
            heading: Some(1.0),
            ..SensorSnapshot::default()
        };
        let result = compute_performance(&input, &table).unwrap();
        assert_eq!(result.true_wind_angle, 0.5);
        assert_abs_diff_eq!(result.true_wind_direction.unwrap(), wrap_2pi(1.5 + PI), epsilon = 1e-12);
    }

    #[test]
    fn test_current_set_and_drift() {
        let table = test_table();
        // heading north at 4 m/s through water, 5 m/s over ground: 1 m/s running north
        let result = compute_performance(&snapshot(45.0, 10.0, 4.0, 0.0, 5.0, 0.0, 0.0), &table).unwrap();
        assert_abs_diff_eq!(result.current_speed.unwrap(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.current_set.unwrap(), PI, epsilon = 1e-9);

        // set towards east: heading north, track with an easterly component
        let track = 14.036243467926479;
        let result =
            compute_performance(&snapshot(45.0, 10.0, 4.0, 0.0, 17f64.sqrt(), track, 0.0), &table).unwrap();
        assert_abs_diff_eq!(result.current_speed.unwrap(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.current_set.unwrap(), 1.5 * PI, epsilon = 1e-6);
    }

    #[test]
    fn test_current_below_floor_has_no_set() {
        let table = test_table();
        let result = compute_performance(&snapshot(45.0, 10.0, 4.0, 90.0, 4.03, 90.0, 0.0), &table).unwrap();
        assert_abs_diff_eq!(result.current_speed.unwrap(), 0.03, epsilon = 1e-9);
        assert!(result.current_set.is_none());
    }

    #[test]
    fn test_current_needs_all_inputs() {
        let table = test_table();
        let mut input = snapshot(45.0, 10.0, 4.0, 90.0, 4.5, 80.0, 10.0);
        input.course_over_ground = None;
        let result = compute_performance(&input, &table).unwrap();
        assert!(result.current_speed.is_none());
        assert!(result.current_set.is_none());
        assert_eq!(result.leeway, 0.0);
    }

    #[test]
    fn test_leeway_clamped() {
        let max = 15f64.to_radians();
        assert_abs_diff_eq!(leeway_angle(0.1, 0.5, 0.05, 15.0), max, epsilon = 1e-12);
        assert_abs_diff_eq!(leeway_angle(0.1, -0.5, 0.05, 15.0), -max, epsilon = 1e-12);
        assert_abs_diff_eq!(leeway_angle(0.1, 0.5, 0.05, -15.0), max, epsilon = 1e-12);
        for heel_deg in [-40.0, -10.0, 0.0, 3.0, 25.0, 60.0] {
            for stw in [0.06, 0.5, 1.0, 3.0, 8.0] {
                for k in [0.0, 0.05, 1.0, 10.0] {
                    let leeway = leeway_angle(stw, f64::to_radians(heel_deg), k, 15.0);
                    assert!(leeway.abs() <= max + 1e-15);
                }
            }
        }
    }

    #[test]
    fn test_leeway_zero_at_or_below_floor() {
        assert_eq!(leeway_angle(NOISE_FLOOR_MS, 0.3, 0.05, 15.0), 0.0);
        assert_eq!(leeway_angle(0.0, 0.3, 0.05, 15.0), 0.0);
        assert_eq!(leeway_angle(0.01, -0.3, 10.0, 15.0), 0.0);
        assert_eq!(leeway_angle(f64::NAN, 0.3, 0.05, 15.0), 0.0);
        assert!(leeway_angle(0.051, 0.3, 0.05, 15.0) > 0.0);
    }

    #[test]
    fn test_leeway_uses_snapshot_tunables() {
        let table = test_table();
        let mut input = snapshot(45.0, 10.0, 2.0, 90.0, 2.0, 90.0, 10.0);
        // 2.0 * 10° / 4 = 5°, over the limit
        input.leeway_coefficient = 2.0;
        input.max_leeway_degrees = 1.0;
        let result = compute_performance(&input, &table).unwrap();
        assert_abs_diff_eq!(result.leeway, 1f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_vmg_downwind_is_negative() {
        let table = test_table();
        let result = compute_performance(&snapshot(150.0, 5.0, 3.0, 0.0, 3.0, 0.0, 1.0), &table).unwrap();
        assert!(result.true_wind_angle.abs() > PI / 2.0);
        assert!(result.velocity_made_good.unwrap() < 0.0);
        assert!(result.vmg_performance_ratio.unwrap() < 0.0);
        let expected = ms_to_knots(result.velocity_made_good.unwrap()) / result.target_boat_speed.unwrap();
        assert_abs_diff_eq!(result.vmg_performance_ratio.unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_ranges() {
        let table = test_table();
        for heading in (0..360).step_by(15) {
            for awa in (-180..=180).step_by(20) {
                let input = snapshot(awa as f64, 9.0, 3.0, heading as f64, 3.2, heading as f64 + 7.0, 5.0);
                let result = compute_performance(&input, &table).unwrap();
                assert!(result.true_wind_angle > -PI && result.true_wind_angle <= PI);
                let twd = result.true_wind_direction.unwrap();
                assert!((0.0..2.0 * PI).contains(&twd));
                if let Some(set) = result.current_set {
                    assert!((0.0..2.0 * PI).contains(&set));
                }
            }
        }
    }

    #[test]
    fn test_empty_polar_leaves_polar_fields_empty() {
        let table = PolarTable::empty(Arc::new(RateLimitedWarner::default()));
        let result = compute_performance(&snapshot(60.0, 8.0, 4.0, 90.0, 4.0, 90.0, 4.0), &table).unwrap();
        assert!(result.polar_speed.is_none());
        assert!(result.polar_performance_ratio.is_none());
        assert!(result.target_true_wind_angle.is_none());
        assert!(result.target_boat_speed.is_none());
        assert!(result.vmg_performance_ratio.is_none());
        assert!(result.velocity_made_good.is_some());
    }

    #[test]
    fn test_concurrent_calls_share_table() {
        let table = Arc::new(test_table());
        let expected = compute_performance(&snapshot(40.0, 12.0, 6.0, 45.0, 6.0, 45.0, 8.0), &table);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    compute_performance(&snapshot(40.0, 12.0, 6.0, 45.0, 6.0, 45.0, 8.0), &table)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
