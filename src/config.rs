//! Line settings for a Modbus-RTU link.
//!
//! The serial parameters describe what the sensor expects, for whoever opens the
//! port. The timeouts drive how the link delimits reply frames.

use crate::internals::*;
use std::time::Duration;

/// Parity setting of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Settings of a Modbus-RTU link.
///
/// # Example
/// ```
/// # use leddar::config::LinkSettings;
/// # use std::time::Duration;
/// let settings = LinkSettings::default()
///     .with_baud_rate(19200)
///     .with_response_timeout(Duration::from_millis(500));
/// assert_eq!(settings.baud_rate, 19200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    /// Serial speed in bits per second.
    pub baud_rate: u32,
    /// Parity of the serial line.
    pub parity: Parity,
    /// Number of stop bits (1 or 2).
    pub stop_bits: u8,
    /// How long to wait for the first byte of a reply.
    pub response_timeout: Duration,
}

impl LinkSettings {
    /// Sets the serial speed.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> LinkSettings {
        self.baud_rate = baud_rate;
        self
    }

    /// Sets the parity.
    pub fn with_parity(mut self, parity: Parity) -> LinkSettings {
        self.parity = parity;
        self
    }

    /// Sets the number of stop bits.
    pub fn with_stop_bits(mut self, stop_bits: u8) -> LinkSettings {
        self.stop_bits = stop_bits;
        self
    }

    /// Sets the time allowed for the first byte of a reply.
    pub fn with_response_timeout(mut self, timeout: Duration) -> LinkSettings {
        self.response_timeout = timeout;
        self
    }

    /// Silence after which a reply is considered complete.
    ///
    /// Two character times at the configured speed, never less than
    /// `MIN_INTER_FRAME_GAP`.
    pub fn inter_frame_gap(&self) -> Duration {
        let baud = u64::from(self.baud_rate.max(1));
        Duration::from_micros(TWO_CHAR_TIME_US_NUMERATOR / baud).max(MIN_INTER_FRAME_GAP)
    }
}

impl Default for LinkSettings {
    fn default() -> LinkSettings {
        LinkSettings {
            baud_rate: LEDDAR_DEFAULT_BAUD_RATE,
            parity: Parity::None,
            stop_bits: LEDDAR_DEFAULT_STOP_BITS,
            response_timeout: LEDDAR_DEFAULT_TIMEOUT,
        }
    }
}
