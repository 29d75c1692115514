use crate::N2kMessage;


/// Trait for components that handle NMEA2000 messages
///
/// Implementations receive every decoded message and decide internally
/// which ones they're interested in, ignoring the others.
pub trait MessageHandler {
    /// Process an incoming, already decoded NMEA2000 message
    fn handle_message(&mut self, message: &N2kMessage);
}
