//! NMEA2000 Payload Library
//!
//! This library provides the message-level pieces a sailing performance
//! calculator needs on an NMEA2000 network:
//! - PGN decoders for the instrument inputs (wind, heading, speed, COG/SOG, attitude, engine)
//! - Encoder for the B&G H5000 proprietary performance PGN 130824
//! - Canboat plain text log format (one assembled message per line)
//! - Message handler trait for processing decoded messages
//!
//! # Example
//!
//! ```
//! use nmea2k::{N2kMessage, RawMessage};
//!
//! let line = "2024-06-01T10:00:00.000Z,2,130306,105,255,8,00,20,03,ec,0a,02,ff,ff";
//! let raw: RawMessage = line.parse().unwrap();
//! match N2kMessage::from_pgn(raw.pgn, &raw.data) {
//!     N2kMessage::WindData(wind) => println!("{}", wind),
//!     other => println!("{}", other),
//! }
//! ```

pub mod canboat;
pub mod message_handler;
pub mod pgns;

// Re-export commonly used types
pub use canboat::{CanboatError, RawMessage};
pub use message_handler::MessageHandler;
pub use pgns::N2kMessage;
