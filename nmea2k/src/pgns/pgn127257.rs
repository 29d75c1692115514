#[derive(Debug, Clone)]
pub struct Attitude {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub yaw: Option<f64>,   // radians
    pub pitch: Option<f64>, // radians
    pub roll: Option<f64>,  // radians, positive = heeled to starboard
}

fn optional_angle(raw: i16) -> Option<f64> {
    if raw == i16::MAX {
        None
    } else {
        Some(raw as f64 * 0.0001)
    }
}

impl Attitude {
    pub fn new(yaw: Option<f64>, pitch: Option<f64>, roll: Option<f64>) -> Self {
        Self {
            pgn: 127257,
            sid: 0,
            yaw,
            pitch,
            roll,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        // Yaw, pitch, roll: int16, 0.0001 radians each
        Some(Attitude {
            pgn: 127257,
            sid: data[0],
            yaw: optional_angle(i16::from_le_bytes([data[1], data[2]])),
            pitch: optional_angle(i16::from_le_bytes([data[3], data[4]])),
            roll: optional_angle(i16::from_le_bytes([data[5], data[6]])),
        })
    }

    pub fn roll_degrees(&self) -> Option<f64> {
        self.roll.map(|r| r.to_degrees())
    }
}

impl std::fmt::Display for Attitude {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let parts = [("Yaw", self.yaw), ("Pitch", self.pitch), ("Roll", self.roll)];
        for (i, (name, value)) in parts.iter().enumerate() {
            let sep = if i == 0 { "      " } else { ", " };
            match value {
                Some(v) => write!(f, "{}{}: {:.2}° ({:.4} rad)", sep, name, v.to_degrees(), v)?,
                None => write!(f, "{}{}: N/A", sep, name)?,
            }
        }
        Ok(())
    }
}
