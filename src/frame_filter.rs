use nmea2k::RawMessage;
use crate::config::Config;

/// Filters raw messages before decoding, using the configured PGN -> source map
/// # Arguments
/// * `config` - Application configuration containing filter rules
/// * `message` - The raw message as read from the input
/// # Returns
/// true if the message should be decoded, false if it should be skipped
pub fn should_process_message(config: &Config, message: &RawMessage) -> bool {
    config.source_filter.should_accept(message.pgn, message.source)
}
