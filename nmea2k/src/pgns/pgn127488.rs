use std::fmt;

#[derive(Debug, Clone)]
pub struct EngineRapidUpdate {
    #[allow(dead_code)]
    pub pgn: u32,
    pub engine_instance: u8,
    pub engine_speed: Option<f64>,  // RPM
    pub engine_boost_pressure: Option<f64>,  // Pa
    pub engine_tilt_trim: Option<i8>,  // %
}

impl EngineRapidUpdate {
    pub fn new(engine_instance: u8, engine_speed: Option<f64>) -> Self {
        Self {
            pgn: 127488,
            engine_instance,
            engine_speed,
            engine_boost_pressure: None,
            engine_tilt_trim: None,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 6 {
            return None;
        }

        let engine_instance = data[0];

        // Engine speed in 0.25 RPM per bit
        let speed_raw = u16::from_le_bytes([data[1], data[2]]);
        let engine_speed = if speed_raw == 0xFFFF {
            None
        } else {
            Some(speed_raw as f64 * 0.25)
        };

        // Engine boost pressure in 100 Pa per bit
        let boost_raw = u16::from_le_bytes([data[3], data[4]]);
        let engine_boost_pressure = if boost_raw == 0xFFFF {
            None
        } else {
            Some(boost_raw as f64 * 100.0)
        };

        // Engine tilt/trim in 1% per bit
        let tilt_trim = data[5] as i8;
        let engine_tilt_trim = if tilt_trim == i8::MAX {
            None
        } else {
            Some(tilt_trim)
        };

        Some(EngineRapidUpdate {
            pgn: 127488,
            engine_instance,
            engine_speed,
            engine_boost_pressure,
            engine_tilt_trim,
        })
    }

    /// Engine is considered running when RPM > 0
    pub fn is_engine_running(&self) -> bool {
        self.engine_speed.map(|rpm| rpm > 0.0).unwrap_or(false)
    }
}

impl fmt::Display for EngineRapidUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      Engine #{}: ", self.engine_instance)?;
        match self.engine_speed {
            Some(rpm) => write!(f, "{:.0} RPM", rpm)?,
            None => write!(f, "RPM N/A")?,
        }
        if let Some(boost) = self.engine_boost_pressure {
            write!(f, " | Boost: {:.0} Pa", boost)?;
        }
        if let Some(trim) = self.engine_tilt_trim {
            write!(f, " | Trim: {}%", trim)?;
        }
        Ok(())
    }
}
