//! Re-encoding of performance results as B&G H5000 data items
//! (proprietary PGN 130824), written as canboat text lines.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};

use nmea2k::RawMessage;
use nmea2k::pgns::PerformanceData;
use tracing::{debug, error};

use crate::performance::PerformanceResult;
use crate::utilities::{knots_to_ms, ms_to_knots};

pub const PGN_H5000: u32 = 130824;
pub const TELEMETRY_PRIORITY: u8 = 3;
pub const BROADCAST_ADDRESS: u8 = 255;

/// H5000 data item names and their data ids
pub const H5000_DATA_IDS: [(&str, u16); 12] = [
    ("TARGET TWA", 83),
    ("TWS KNOTS", 85),
    ("TWA", 89),
    ("TWD", 109),
    ("POLAR SPEED RATIO", 124),
    ("TARGET BOAT SPEED", 125),
    ("POLAR SPEED", 126),
    ("VMG TO WIND", 127),
    ("LEEWAY", 130),
    ("TIDAL DRIFT", 131),
    ("TIDAL SET", 132),
    ("VMG PERFORMANCE", 285),
];

pub fn data_id(name: &str) -> Option<u16> {
    H5000_DATA_IDS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, id)| *id)
}

pub struct H5000Emitter {
    writer: Box<dyn Write + Send>,
    source_address: u8,
    reported_unknown: HashSet<String>,
}

impl H5000Emitter {
    pub fn new(writer: Box<dyn Write + Send>, source_address: u8) -> Self {
        Self {
            writer,
            source_address,
            reported_unknown: HashSet::new(),
        }
    }

    /// Emitter appending to `path`, or writing to stdout when no path is given
    pub fn open(path: Option<&str>, source_address: u8) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match path {
            Some(path) => Box::new(OpenOptions::new().create(true).append(true).open(path)?),
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(writer, source_address))
    }

    /// Encode one data item. Returns whether a frame was written; missing or
    /// NaN values and unknown names write nothing.
    pub fn send(&mut self, name: &str, value: Option<f64>, scale: f64) -> io::Result<bool> {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            return Ok(false);
        };
        let Some(id) = data_id(name) else {
            if self.reported_unknown.insert(name.to_string()) {
                error!("[H5000] Unknown data item '{}'", name);
            }
            return Ok(false);
        };
        let Some(item) = PerformanceData::from_scaled(id, value, scale) else {
            debug!("[H5000] Cannot encode {} = {}", name, value);
            return Ok(false);
        };

        let frame = RawMessage::new(
            TELEMETRY_PRIORITY,
            PGN_H5000,
            self.source_address,
            BROADCAST_ADDRESS,
            item.to_bytes(),
        );
        writeln!(self.writer, "{}", frame)?;
        Ok(true)
    }

    /// Emit every available value of a result; returns the number of frames written
    pub fn emit_result(&mut self, result: &PerformanceResult) -> io::Result<usize> {
        let items = [
            ("POLAR SPEED", result.polar_speed.map(knots_to_ms), 100.0),
            ("POLAR SPEED RATIO", result.polar_performance_ratio, 1000.0),
            ("VMG TO WIND", result.velocity_made_good, 100.0),
            ("TARGET TWA", result.target_true_wind_angle.map(f64::to_radians), 1000.0),
            ("TARGET BOAT SPEED", result.target_boat_speed.map(knots_to_ms), 100.0),
            ("TWS KNOTS", Some(result.true_wind_speed), 100.0),
            ("TWA", Some(result.true_wind_angle), 100.0),
            ("TWD", result.true_wind_direction, 100.0),
            ("VMG PERFORMANCE", result.vmg_performance_ratio, 1000.0),
            ("TIDAL DRIFT", result.current_speed.map(ms_to_knots), 100.0),
            ("TIDAL SET", result.current_set, 100.0),
            ("LEEWAY", Some(result.leeway), 100.0),
        ];

        let mut frames = 0;
        for (name, value, scale) in items {
            if self.send(name, value, scale)? {
                frames += 1;
            }
        }
        self.writer.flush()?;
        Ok(frames)
    }
}
