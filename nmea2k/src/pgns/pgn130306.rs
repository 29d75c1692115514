use std::fmt;

#[derive(Debug, Clone)]
pub struct WindData {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub speed: f64, // m/s
    pub angle: f64, // radians, 0..2π
    pub reference: WindReference,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindReference {
    TrueGroundNorth,
    Magnetic,
    Apparent,
    TrueBoat,
    TrueWater,
}

impl WindData {

    pub fn new_apparent(speed: f64, angle: f64) -> Self {
        Self {
            pgn: 130306,
            sid: 0,
            speed,
            angle,
            reference: WindReference::Apparent,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 6 {
            return None;
        }
        let speed_raw = u16::from_le_bytes([data[1], data[2]]);
        let angle_raw = u16::from_le_bytes([data[3], data[4]]);
        if speed_raw == 0xFFFF || angle_raw == 0xFFFF {
            return None;
        }
        Some(Self {
            pgn: 130306,
            sid: data[0],
            speed: speed_raw as f64 * 0.01,
            angle: angle_raw as f64 * 0.0001,
            reference: match data[5] & 0x07 {
                0 => WindReference::TrueGroundNorth,
                1 => WindReference::Magnetic,
                2 => WindReference::Apparent,
                3 => WindReference::TrueBoat,
                4 => WindReference::TrueWater,
                _ => WindReference::Apparent,
            },
        })
    }

    pub fn is_apparent(&self) -> bool {
        self.reference == WindReference::Apparent
    }

    pub fn speed_knots(&self) -> f64 {
        self.speed * 1.94384
    }
}

impl fmt::Display for WindData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      Wind Speed: {:.2} m/s ({:.2} knots) | Angle: {:.2}° | Ref: {:?}",
            self.speed,
            self.speed * 1.94384,
            self.angle.to_degrees(),
            self.reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_decode_apparent_wind() {
        // 8.00 m/s, 0.2796 rad, apparent
        let wind = WindData::from_bytes(&[0x00, 0x20, 0x03, 0xec, 0x0a, 0x02, 0xff, 0xff]).unwrap();
        assert_abs_diff_eq!(wind.speed, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(wind.angle, 0.2796, epsilon = 1e-9);
        assert!(wind.is_apparent());
    }

    #[test]
    fn test_decode_true_wind_reference() {
        let wind = WindData::from_bytes(&[0x00, 0x20, 0x03, 0xec, 0x0a, 0x04, 0xff, 0xff]).unwrap();
        assert_eq!(wind.reference, WindReference::TrueWater);
        assert!(!wind.is_apparent());
    }

    #[test]
    fn test_decode_not_available() {
        assert!(WindData::from_bytes(&[0x00, 0xff, 0xff, 0xec, 0x0a, 0x02]).is_none());
        assert!(WindData::from_bytes(&[0x00, 0x20, 0x03]).is_none());
    }
}
