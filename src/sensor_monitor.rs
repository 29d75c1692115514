use std::collections::HashMap;
use std::time::{Duration, Instant};

use nmea2k::pgns::{
    Attitude as AttitudeMessage, CogSogRapidUpdate, EngineRapidUpdate, HeadingReference, SpeedWaterReferenced,
    VesselHeading, WindData,
};
use nmea2k::{MessageHandler, N2kMessage};
use tracing::debug;

use crate::config::{CalibrationConfig, PerformanceConfig};
use crate::performance::{Attitude, SensorSnapshot};
use crate::utilities::{wrap_2pi, wrap_pi};

/// An engine that stops reporting is taken as stopped after this long
pub const ENGINE_TIMEOUT: Duration = Duration::from_secs(10);

/// Magnetic headings are ignored while a true heading arrived within this window
pub const TRUE_HEADING_PRECEDENCE: Duration = Duration::from_secs(10);

/// Keeps the latest value of every performance input seen on the bus
pub struct SensorMonitor {
    apparent_wind_angle: Option<f64>, // radians, -π..π
    apparent_wind_speed: Option<f64>, // m/s
    speed_through_water: Option<f64>, // m/s, as reported by the log
    speed_over_ground: Option<f64>,
    heading: Option<f64>,
    heading_reference: HeadingReference,
    last_true_heading: Option<Instant>,
    // magnetic variation, east positive, as last reported with a heading
    variation: Option<f64>,
    course_over_ground: Option<f64>,
    cog_true: bool,
    attitude: Attitude,
    // engine instance -> last time it reported RPM > 0
    engines_running: HashMap<u8, Instant>,
    wind_updated: bool,
    calibration: CalibrationConfig,
    performance: PerformanceConfig,
}

impl SensorMonitor {
    pub fn new(calibration: CalibrationConfig, performance: PerformanceConfig) -> Self {
        Self {
            apparent_wind_angle: None,
            apparent_wind_speed: None,
            speed_through_water: None,
            speed_over_ground: None,
            heading: None,
            heading_reference: HeadingReference::Null,
            last_true_heading: None,
            variation: None,
            course_over_ground: None,
            cog_true: true,
            attitude: Attitude::default(),
            engines_running: HashMap::new(),
            wind_updated: false,
            calibration,
            performance,
        }
    }

    /// Process wind data (PGN 130306). Only apparent wind is used.
    pub fn process_wind(&mut self, wind: &WindData) {
        if !wind.is_apparent() {
            return;
        }
        self.apparent_wind_angle = Some(wrap_pi(wind.angle));
        self.apparent_wind_speed = Some(wind.speed);
        self.wind_updated = true;
    }

    /// Process vessel heading (PGN 127250).
    ///
    /// Magnetic headings are turned into true ones once a variation is known.
    /// Without a variation they are kept as magnetic, unless a true heading
    /// is also on the bus.
    pub fn process_heading_at(&mut self, heading: &VesselHeading, now: Instant) {
        if let Some(variation) = heading.variation {
            self.variation = Some(variation);
        }
        match heading.reference {
            HeadingReference::True => {
                self.heading = Some(heading.heading);
                self.heading_reference = HeadingReference::True;
                self.last_true_heading = Some(now);
            }
            HeadingReference::Magnetic => {
                if self
                    .last_true_heading
                    .is_some_and(|last| now.saturating_duration_since(last) < TRUE_HEADING_PRECEDENCE)
                {
                    return;
                }
                let magnetic = heading.heading + heading.deviation.unwrap_or(0.0);
                match self.variation {
                    Some(variation) => {
                        self.heading = Some(wrap_2pi(magnetic + variation));
                        self.heading_reference = HeadingReference::True;
                    }
                    None => {
                        self.heading = Some(wrap_2pi(magnetic));
                        self.heading_reference = HeadingReference::Magnetic;
                    }
                }
            }
            HeadingReference::Error | HeadingReference::Null => {
                debug!("Ignoring heading with {:?} reference", heading.reference);
            }
        }
    }

    /// Process speed through water (PGN 128259)
    pub fn process_speed(&mut self, speed: &SpeedWaterReferenced) {
        self.speed_through_water = Some(speed.speed);
    }

    /// Process COG/SOG rapid update (PGN 129026)
    pub fn process_cog_sog(&mut self, cog_sog: &CogSogRapidUpdate) {
        self.course_over_ground = cog_sog.cog;
        self.cog_true = cog_sog.cog_reference;
        self.speed_over_ground = cog_sog.sog;
    }

    /// COG in the same reference as the heading, or `None` when it can't be converted
    fn course_over_ground(&self) -> Option<f64> {
        let cog = self.course_over_ground?;
        match (self.heading_reference, self.cog_true) {
            (HeadingReference::True, true) | (HeadingReference::Magnetic, false) => Some(cog),
            (HeadingReference::True, false) => self.variation.map(|variation| wrap_2pi(cog + variation)),
            (HeadingReference::Magnetic, true) => self.variation.map(|variation| wrap_2pi(cog - variation)),
            // no heading yet, nothing to compare against
            _ => Some(cog),
        }
    }

    /// Process attitude (PGN 127257)
    pub fn process_attitude(&mut self, attitude: &AttitudeMessage) {
        self.attitude = Attitude {
            roll: attitude.roll,
            pitch: attitude.pitch,
            yaw: attitude.yaw,
        };
    }

    pub fn process_engine_at(&mut self, engine: &EngineRapidUpdate, now: Instant) {
        if engine.is_engine_running() {
            self.engines_running.insert(engine.engine_instance, now);
        } else {
            self.engines_running.remove(&engine.engine_instance);
        }
    }

    /// True once per new apparent wind reading
    pub fn take_wind_update(&mut self) -> bool {
        std::mem::take(&mut self.wind_updated)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Current inputs with the log calibration applied to STW
    pub fn snapshot_at(&self, now: Instant) -> SensorSnapshot {
        SensorSnapshot {
            apparent_wind_angle: self.apparent_wind_angle,
            apparent_wind_speed: self.apparent_wind_speed,
            speed_through_water: self
                .speed_through_water
                .map(|stw| self.calibration.calibrated_stw(stw, self.attitude.roll)),
            speed_over_ground: self.speed_over_ground,
            heading: self.heading,
            course_over_ground: self.course_over_ground(),
            attitude: self.attitude,
            engine_running: self
                .engines_running
                .values()
                .any(|last| now.saturating_duration_since(*last) < ENGINE_TIMEOUT),
            leeway_coefficient: self.performance.leeway_coefficient,
            max_leeway_degrees: self.performance.max_leeway_degrees,
        }
    }
}

impl MessageHandler for SensorMonitor {
    fn handle_message(&mut self, message: &N2kMessage) {
        match message {
            N2kMessage::WindData(wind) => self.process_wind(wind),
            N2kMessage::VesselHeading(heading) => self.process_heading_at(heading, Instant::now()),
            N2kMessage::SpeedWaterReferenced(speed) => self.process_speed(speed),
            N2kMessage::CogSogRapidUpdate(cog_sog) => self.process_cog_sog(cog_sog),
            N2kMessage::Attitude(attitude) => self.process_attitude(attitude),
            N2kMessage::EngineRapidUpdate(engine) => self.process_engine_at(engine, Instant::now()),
            _ => {} // Ignore messages we're not interested in
        }
    }
}
