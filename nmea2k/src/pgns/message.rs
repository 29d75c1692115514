use std::fmt;

use tracing::debug;

use super::pgn127250::VesselHeading;
use super::pgn127257::Attitude;
use super::pgn127488::EngineRapidUpdate;
use super::pgn128259::SpeedWaterReferenced;
use super::pgn129026::CogSogRapidUpdate;
use super::pgn130306::WindData;
use super::pgn130824::PerformanceData;

fn format_data_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

// Enum to hold any decoded message type
#[derive(Debug, Clone)]
pub enum N2kMessage {
    VesselHeading(VesselHeading),
    Attitude(Attitude),
    EngineRapidUpdate(EngineRapidUpdate),
    SpeedWaterReferenced(SpeedWaterReferenced),
    CogSogRapidUpdate(CogSogRapidUpdate),
    WindData(WindData),
    PerformanceData(PerformanceData),
    Unknown(u32, Vec<u8>),
}

impl N2kMessage {
    pub fn from_pgn(pgn: u32, data: &[u8]) -> Self {
        let decoded = match pgn {
            127250 => VesselHeading::from_bytes(data).map(N2kMessage::VesselHeading),
            127257 => Attitude::from_bytes(data).map(N2kMessage::Attitude),
            127488 => EngineRapidUpdate::from_bytes(data).map(N2kMessage::EngineRapidUpdate),
            128259 => SpeedWaterReferenced::from_bytes(data).map(N2kMessage::SpeedWaterReferenced),
            129026 => CogSogRapidUpdate::from_bytes(data).map(N2kMessage::CogSogRapidUpdate),
            130306 => WindData::from_bytes(data).map(N2kMessage::WindData),
            130824 => PerformanceData::from_bytes(data).map(N2kMessage::PerformanceData),
            _ => return N2kMessage::Unknown(pgn, data.to_vec()),
        };
        decoded.unwrap_or_else(|| {
            debug!("PGN {} payload not decoded: {}", pgn, format_data_bytes(data));
            N2kMessage::Unknown(pgn, data.to_vec())
        })
    }

    pub fn pgn(&self) -> u32 {
        match self {
            N2kMessage::VesselHeading(msg) => msg.pgn,
            N2kMessage::Attitude(msg) => msg.pgn,
            N2kMessage::EngineRapidUpdate(msg) => msg.pgn,
            N2kMessage::SpeedWaterReferenced(msg) => msg.pgn,
            N2kMessage::CogSogRapidUpdate(msg) => msg.pgn,
            N2kMessage::WindData(msg) => msg.pgn,
            N2kMessage::PerformanceData(msg) => msg.pgn,
            N2kMessage::Unknown(pgn, _) => *pgn,
        }
    }
}

impl fmt::Display for N2kMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            N2kMessage::VesselHeading(msg) => write!(f, "{}", msg),
            N2kMessage::Attitude(msg) => write!(f, "{}", msg),
            N2kMessage::EngineRapidUpdate(msg) => write!(f, "{}", msg),
            N2kMessage::SpeedWaterReferenced(msg) => write!(f, "{}", msg),
            N2kMessage::CogSogRapidUpdate(msg) => write!(f, "{}", msg),
            N2kMessage::WindData(msg) => write!(f, "{}", msg),
            N2kMessage::PerformanceData(msg) => write!(f, "{}", msg),
            N2kMessage::Unknown(_pgn, data) => {
                write!(f, "      Raw data: [{}]", format_data_bytes(data))
            }
        }
    }
}
