use crate::base::{Error, Result};
use crate::types::{ConfigurationLevel, DeviceProfile};
use byteorder::{ByteOrder, LittleEndian};
use log::{error, trace};

// Report server id answer

/// Offset of the LeddarOne device type (u16, little-endian) in the server id answer.
pub const LEDDAR_ONE_ID_DEVICE_TYPE_OFFSET: usize = 50;

/// Device type reported by a LeddarOne.
pub const LEDDAR_ONE_DEVICE_TYPE: u16 = 10;

/// Offset of the sensor family byte in the M16/IS16 server id answer.
pub const LEDDAR_ID_DEVICE_TYPE_OFFSET: usize = 150;

/// Sensor family byte of an M16 module.
pub const LEDDAR_DEVICE_TYPE_MODULE: u8 = 9;

/// Sensor family byte of an IS16 industrial sensor.
pub const LEDDAR_DEVICE_TYPE_INDUSTRIAL: u8 = 8;

/// Sensor family byte of an evaluation kit.
pub const LEDDAR_DEVICE_TYPE_EVAL_KIT: u8 = 7;

/// Picks the device profile from a report server id answer.
///
/// The LeddarOne marker (device type 10 at offset 50) is checked first, then the
/// multi-segment family byte at offset 150.
pub fn identify(server_id: &[u8]) -> Result<DeviceProfile> {
    trace!("Identifying sensor from {}-byte server id", server_id.len());
    let one_type = server_id
        .get(LEDDAR_ONE_ID_DEVICE_TYPE_OFFSET..LEDDAR_ONE_ID_DEVICE_TYPE_OFFSET + 2)
        .map(LittleEndian::read_u16);
    if one_type == Some(LEDDAR_ONE_DEVICE_TYPE) {
        trace!("Sensor is a LeddarOne");
        return Ok(DeviceProfile::Fixed);
    }

    let level = match server_id.get(LEDDAR_ID_DEVICE_TYPE_OFFSET) {
        Some(&LEDDAR_DEVICE_TYPE_MODULE) => ConfigurationLevel::Full,
        Some(&LEDDAR_DEVICE_TYPE_INDUSTRIAL) => ConfigurationLevel::Simple,
        Some(&LEDDAR_DEVICE_TYPE_EVAL_KIT) => ConfigurationLevel::None,
        other => {
            error!(
                "Unrecognized sensor: LeddarOne type {:?}, family byte {:?}",
                one_type, other
            );
            return Err(Error::UnsupportedDevice);
        }
    };
    trace!("Sensor is multi-segment with configuration level {:?}", level);
    Ok(DeviceProfile::Variable(level))
}
