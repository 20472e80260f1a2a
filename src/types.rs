use crate::params::{LEDDAR_CONFIG_LAST, LEDDAR_ONE_CONFIG_LAST};

/// Mask of the LED intensity (percent) in `Acquisition::states`.
pub const LEDDAR_STATES_INTENSITY_MASK: u16 = 0xFF;

/// Bit position of the demerge-active flag in `Acquisition::states`.
pub const LEDDAR_STATES_DEMERGE_SHIFT: u16 = 9;

/// Most detections a LeddarOne reports per acquisition.
pub const LEDDAR_ONE_MAX_DETECTIONS: usize = 3;

/// Most detections an M16/IS16 reports per acquisition (bounded by the Modbus
/// payload size).
pub const LEDDAR_MAX_DETECTIONS: usize = 48;

/// A single echo measured by the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Distance to the object in meters.
    pub distance: f32,
    /// Echo amplitude.
    pub amplitude: f32,
    /// Segment (channel) that saw the echo. Multi-segment sensors only.
    pub segment: Option<u8>,
    /// Detection flags (low nibble). Multi-segment sensors only.
    pub flags: Option<u8>,
}

/// The results of one acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    /// Sensor timestamp of the acquisition. Zero when the sensor did not send one.
    pub timestamp: u32,
    /// Internal temperature in degrees Celsius, when reported with the results.
    pub temperature: Option<f32>,
    /// Sensor state bits, when reported with the results. Zero when the sensor did
    /// not send them.
    pub states: Option<u16>,
    /// Detections, at most the profile's maximum.
    pub detections: Vec<Detection>,
}

impl Acquisition {
    /// LED intensity in percent, taken from the state bits.
    #[inline]
    pub fn led_intensity(&self) -> Option<u8> {
        self.states
            .map(|s| (s & LEDDAR_STATES_INTENSITY_MASK) as u8)
    }

    /// Returns `true` if object demerging was active for this acquisition.
    #[inline]
    pub fn is_demerging(&self) -> Option<bool> {
        self.states
            .map(|s| (s >> LEDDAR_STATES_DEMERGE_SHIFT) & 1 == 1)
    }
}

/// How much of its configuration a multi-segment sensor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationLevel {
    /// Evaluation kit: parameters are read-only in practice.
    None,
    /// Industrial sensor (IS16): threshold, LED power, options, change delay and
    /// maximum detections.
    Simple,
    /// Module (M16): every parameter, including acquisition timing.
    Full,
}

/// The data layout a sensor uses, chosen once when connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    /// LeddarOne: results in a fixed block of ten input registers.
    Fixed,
    /// M16/IS16/evaluation kit: results through custom function 0x41 with a
    /// variable number of detections and a timestamp/state trailer.
    Variable(ConfigurationLevel),
}

impl DeviceProfile {
    /// Most detections an acquisition can carry.
    pub fn max_detections(&self) -> usize {
        match self {
            DeviceProfile::Fixed => LEDDAR_ONE_MAX_DETECTIONS,
            DeviceProfile::Variable(_) => LEDDAR_MAX_DETECTIONS,
        }
    }

    /// Highest valid configuration parameter number.
    pub fn last_parameter(&self) -> u16 {
        match self {
            DeviceProfile::Fixed => LEDDAR_ONE_CONFIG_LAST,
            DeviceProfile::Variable(_) => LEDDAR_CONFIG_LAST,
        }
    }

    /// Configuration level of multi-segment sensors. `None` for the LeddarOne.
    pub fn configuration_level(&self) -> Option<ConfigurationLevel> {
        match self {
            DeviceProfile::Fixed => None,
            DeviceProfile::Variable(level) => Some(*level),
        }
    }
}
