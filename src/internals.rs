use std::time::Duration;

/// Default time to wait for the first byte of a reply.
pub const LEDDAR_DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default serial speed of the sensors.
pub const LEDDAR_DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default number of stop bits.
pub const LEDDAR_DEFAULT_STOP_BITS: u8 = 1;

/// Shortest silence accepted as the end of a frame. Two character times are too
/// tight for most USB serial adapters.
pub const MIN_INTER_FRAME_GAP: Duration = Duration::from_millis(2);

/// Bit times in two 10-bit characters, scaled to microseconds.
pub(crate) const TWO_CHAR_TIME_US_NUMERATOR: u64 = 20_000_000;
