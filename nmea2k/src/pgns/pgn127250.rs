use std::fmt;

#[derive(Debug, Clone)]
pub struct VesselHeading {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub heading: f64, // radians
    pub deviation: Option<f64>,
    pub variation: Option<f64>,
    pub reference: HeadingReference,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingReference {
    True,
    Magnetic,
    Error,
    Null,
}

fn optional_angle(raw: i16) -> Option<f64> {
    if raw == i16::MAX {
        None
    } else {
        Some(raw as f64 * 0.0001)
    }
}

impl VesselHeading {
    pub fn new(heading: f64, reference: HeadingReference) -> Self {
        Self {
            pgn: 127250,
            sid: 0,
            heading,
            deviation: None,
            variation: None,
            reference,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let heading_raw = u16::from_le_bytes([data[1], data[2]]);
        if heading_raw == 0xFFFF {
            return None;
        }
        Some(Self {
            pgn: 127250,
            sid: data[0],
            heading: heading_raw as f64 * 0.0001,
            deviation: optional_angle(i16::from_le_bytes([data[3], data[4]])),
            variation: optional_angle(i16::from_le_bytes([data[5], data[6]])),
            reference: match data[7] & 0x03 {
                0 => HeadingReference::True,
                1 => HeadingReference::Magnetic,
                2 => HeadingReference::Error,
                _ => HeadingReference::Null,
            },
        })
    }
}

impl fmt::Display for VesselHeading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      Heading: {:.2}° ({:?})", self.heading.to_degrees(), self.reference)?;
        if let Some(dev) = self.deviation {
            write!(f, " | Deviation: {:.2}°", dev.to_degrees())?;
        }
        if let Some(var) = self.variation {
            write!(f, " | Variation: {:.2}°", var.to_degrees())?;
        }
        Ok(())
    }
}
