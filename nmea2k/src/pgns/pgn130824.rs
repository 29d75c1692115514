use std::fmt;

/// Manufacturer code 381 (B&G), reserved bits set, industry group 4 (marine)
pub const BG_MANUFACTURER_HEADER: [u8; 2] = [0x7d, 0x99];

/// B&G data ids are transmitted with this offset added to the id
pub const DATA_KEY_OFFSET: u16 = 0x2000;

/// Payload length used by H5000 units for a single value record
pub const PAYLOAD_LEN: usize = 10;

/// B&G proprietary performance data (PGN 130824), single value record.
///
/// Layout: manufacturer header, data key (`0x2000 + id`, little endian),
/// scaled 16-bit value (little endian), padded with `0xff`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceData {
    #[allow(dead_code)]
    pub pgn: u32,
    pub data_id: u16,
    pub raw_value: i16,
}

impl PerformanceData {
    pub fn new(data_id: u16, raw_value: i16) -> Self {
        Self {
            pgn: 130824,
            data_id,
            raw_value,
        }
    }

    /// Scale a physical value into the raw 16-bit field, saturating at the
    /// field limits. Returns `None` for NaN or infinite input.
    pub fn from_scaled(data_id: u16, value: f64, scale: f64) -> Option<Self> {
        let scaled = (value * scale).round();
        if !scaled.is_finite() {
            return None;
        }
        let raw = scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        Some(Self::new(data_id, raw))
    }

    pub fn key(&self) -> u16 {
        DATA_KEY_OFFSET.wrapping_add(self.data_id)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(PAYLOAD_LEN);
        data.extend_from_slice(&BG_MANUFACTURER_HEADER);
        data.extend_from_slice(&self.key().to_le_bytes());
        data.extend_from_slice(&self.raw_value.to_le_bytes());
        data.resize(PAYLOAD_LEN, 0xff);
        data
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 6 || data[0..2] != BG_MANUFACTURER_HEADER {
            return None;
        }
        let key = u16::from_le_bytes([data[2], data[3]]);
        Some(Self {
            pgn: 130824,
            data_id: key.checked_sub(DATA_KEY_OFFSET)?,
            raw_value: i16::from_le_bytes([data[4], data[5]]),
        })
    }
}

impl fmt::Display for PerformanceData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      B&G Data ID: {} | Raw value: {}", self.data_id, self.raw_value)
    }
}
