pub mod pgn127250;
pub mod pgn127257;
pub mod pgn127488;
pub mod pgn128259;
pub mod pgn129026;
pub mod pgn130306;
pub mod pgn130824;
pub mod message;

// Re-export commonly used types
pub use message::N2kMessage;
pub use pgn127250::{HeadingReference, VesselHeading};
pub use pgn127257::Attitude;
pub use pgn127488::EngineRapidUpdate;
pub use pgn128259::SpeedWaterReferenced;
pub use pgn129026::CogSogRapidUpdate;
pub use pgn130306::{WindData, WindReference};
pub use pgn130824::PerformanceData;
