//! Holding register numbers of the configuration parameters.
//!
//! Pass these to `LeddarDevice::get_parameter` and `LeddarDevice::set_parameter`.
//! The LeddarOne and the M16/IS16 family lay their parameters out differently;
//! numbers above the connected profile's last parameter are rejected before
//! anything is sent.

// LeddarOne (fixed layout)

/// Accumulation exponent (2^n acquisitions averaged).
pub const LEDDAR_ONE_CONFIG_ACCUMULATION: u16 = 0;
/// Oversampling exponent (2^n).
pub const LEDDAR_ONE_CONFIG_OVERSAMPLING: u16 = 1;
/// Base sample count.
pub const LEDDAR_ONE_CONFIG_SAMPLE_COUNT: u16 = 2;
/// LED power, percent.
pub const LEDDAR_ONE_CONFIG_LED_POWER: u16 = 4;
/// Serial speed code.
pub const LEDDAR_ONE_CONFIG_BAUD_RATE: u16 = 29;
/// Modbus slave address.
pub const LEDDAR_ONE_CONFIG_MODBUS_ADDRESS: u16 = 30;

/// Last parameter number on a LeddarOne.
pub const LEDDAR_ONE_CONFIG_LAST: u16 = LEDDAR_ONE_CONFIG_MODBUS_ADDRESS;

// M16 / IS16 / evaluation kit (variable layout)

/// Accumulation exponent (2^n acquisitions averaged).
pub const LEDDAR_CONFIG_ACCUMULATION: u16 = 0;
/// Oversampling exponent (2^n).
pub const LEDDAR_CONFIG_OVERSAMPLING: u16 = 1;
/// Base sample count.
pub const LEDDAR_CONFIG_SAMPLE_COUNT: u16 = 2;
/// Sampling rate exponent: 12800 / 2^n Hz.
pub const LEDDAR_CONFIG_RATE: u16 = 3;
/// Detection threshold offset, signed 1/256 steps.
pub const LEDDAR_CONFIG_THRESHOLD: u16 = 4;
/// LED power, percent.
pub const LEDDAR_CONFIG_LED_POWER: u16 = 5;
/// Option bits, see `LEDDAR_OPTION_*`.
pub const LEDDAR_CONFIG_OPTIONS: u16 = 6;
/// Change delay of the automatic LED power, in frames.
pub const LEDDAR_CONFIG_CHANGE_DELAY: u16 = 7;
/// Maximum number of detections reported per acquisition.
pub const LEDDAR_CONFIG_MAX_DETECTIONS: u16 = 8;

/// Last parameter number on M16/IS16 sensors.
pub const LEDDAR_CONFIG_LAST: u16 = LEDDAR_CONFIG_MAX_DETECTIONS;

/// `LEDDAR_CONFIG_OPTIONS` bit: automatic LED power.
pub const LEDDAR_OPTION_AUTO_LED: u16 = 1;
/// `LEDDAR_CONFIG_OPTIONS` bit: object demerging.
pub const LEDDAR_OPTION_DEMERGE: u16 = 4;
