use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Errors raised while parsing a canboat plain format line
#[derive(Error, Debug, PartialEq)]
pub enum CanboatError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid data byte: '{0}'")]
    InvalidByte(String),

    #[error("declared length {declared} does not match {actual} data bytes")]
    LengthMismatch { declared: usize, actual: usize },
}

/// A single assembled NMEA2000 message in canboat plain format:
///
/// `timestamp,priority,pgn,source,destination,length,b0,b1,...`
///
/// Data bytes are hexadecimal. The timestamp is optional when parsing; lines
/// written by older tools use a non RFC3339 stamp which is kept as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub timestamp: Option<DateTime<Utc>>,
    pub priority: u8,
    pub pgn: u32,
    pub source: u8,
    pub destination: u8,
    pub data: Vec<u8>,
}

impl RawMessage {
    pub fn new(priority: u8, pgn: u32, source: u8, destination: u8, data: Vec<u8>) -> Self {
        Self {
            timestamp: Some(Utc::now()),
            priority,
            pgn,
            source,
            destination,
            data,
        }
    }
}

fn parse_field<T: FromStr>(value: Option<&str>, field: &'static str) -> Result<T, CanboatError> {
    let value = value.ok_or(CanboatError::MissingField(field))?.trim();
    value.parse::<T>().map_err(|_| CanboatError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

impl FromStr for RawMessage {
    type Err = CanboatError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.trim().split(',');

        let timestamp = fields
            .next()
            .filter(|s| !s.trim().is_empty())
            .ok_or(CanboatError::MissingField("timestamp"))?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc));

        let priority = parse_field(fields.next(), "priority")?;
        let pgn = parse_field(fields.next(), "pgn")?;
        let source = parse_field(fields.next(), "source")?;
        let destination = parse_field(fields.next(), "destination")?;
        let declared: usize = parse_field(fields.next(), "length")?;

        let data = fields
            .map(|b| {
                let b = b.trim();
                u8::from_str_radix(b, 16).map_err(|_| CanboatError::InvalidByte(b.to_string()))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        if data.len() != declared {
            return Err(CanboatError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }

        Ok(Self {
            timestamp,
            priority,
            pgn,
            source,
            destination,
            data,
        })
    }
}

impl fmt::Display for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        write!(
            f,
            "{},{},{},{},{},{}",
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.priority,
            self.pgn,
            self.source,
            self.destination,
            self.data.len()
        )?;
        for b in &self.data {
            write!(f, ",{:02x}", b)?;
        }
        Ok(())
    }
}
