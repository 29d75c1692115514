use std::fmt;

#[derive(Debug, Clone)]
pub struct CogSogRapidUpdate {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub cog_reference: bool, // true = True, false = Magnetic
    pub cog: Option<f64>, // radians
    pub sog: Option<f64>, // m/s
}

impl CogSogRapidUpdate {
    pub fn new(cog: f64, sog: f64) -> Self {
        Self {
            pgn: 129026,
            sid: 0,
            cog_reference: true,
            cog: Some(cog),
            sog: Some(sog),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let cog_raw = u16::from_le_bytes([data[2], data[3]]);
        let sog_raw = u16::from_le_bytes([data[4], data[5]]);
        Some(Self {
            pgn: 129026,
            sid: data[0],
            cog_reference: (data[1] & 0x03) == 0,
            cog: (cog_raw != 0xFFFF).then(|| cog_raw as f64 * 0.0001),
            sog: (sog_raw != 0xFFFF).then(|| sog_raw as f64 * 0.01),
        })
    }
}

impl fmt::Display for CogSogRapidUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      COG: ")?;
        match self.cog {
            Some(cog) => write!(f, "{:.2}°", cog.to_degrees())?,
            None => write!(f, "N/A")?,
        }
        write!(f, " ({}) | SOG: ", if self.cog_reference { "True" } else { "Mag" })?;
        match self.sog {
            Some(sog) => write!(f, "{:.2} m/s ({:.2} knots)", sog, sog * 1.94384),
            None => write!(f, "N/A"),
        }
    }
}
