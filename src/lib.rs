//! # Leddar Driver
//!
//! `leddar` is a master-side driver for LeddarTech ranging sensors (LeddarOne, M16,
//! IS16 and the evaluation kit) connected over a Modbus-RTU serial link.
//! It provides CRC16 framing, a single-request-in-flight link, standard register
//! access, and decoding of acquisition results for both sensor families.

extern crate byteorder;
extern crate log;

mod answers;
pub mod base;
mod checksum;
mod cmds;
pub mod config;
mod internals;
pub mod params;
mod parsers;
mod protocol;
pub mod registers;
pub mod types;

pub use crate::answers::identify;
pub use crate::base::{Error, Frame, Message, ModbusLink, Result};
pub use crate::checksum::Crc16;
pub use crate::config::{LinkSettings, Parity};
pub use crate::protocol::{RtuProtocol, MODBUS_MAX_FRAME_LEN, MODBUS_MAX_PAYLOAD};

use crate::cmds::*;
use crate::params::LEDDAR_CONFIG_THRESHOLD;
use crate::parsers::fixed_parser::parse_fixed;
use crate::parsers::variable_parser::parse_variable;
use log::{error, trace, warn};
use std::io::{Read, Write};

use crate::types::{Acquisition, ConfigurationLevel, DeviceProfile};

/// Threshold and temperature registers are 1/256 fixed point.
const FIXED_POINT_8_SCALE: f32 = 256.0;

/// A connected Leddar sensor.
///
/// Created by `connect`, which checks the sensor answers and works out which data
/// layout (`DeviceProfile`) it uses. Every operation performs one request and waits
/// for its reply before returning.
#[derive(Debug)]
pub struct LeddarDevice<T: ?Sized> {
    link: ModbusLink<RtuProtocol, T>,
    profile: DeviceProfile,
}

impl<T: ?Sized> LeddarDevice<T>
where
    T: Read + Write,
{
    /// Connects to the sensor at `address` with the default link settings.
    ///
    /// # Arguments
    ///
    /// * `stream` - A boxed `Read + Write` object for the serial line. Reads should
    ///   return quickly (a few milliseconds) when no data is available.
    /// * `address` - The Modbus address of the sensor.
    ///
    /// # Example
    /// ```ignore
    /// # use leddar::LeddarDevice;
    /// # use std::time::Duration;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let serial_port = serialport::new("/dev/ttyUSB0", 115200)
    ///     .timeout(Duration::from_millis(1))
    ///     .open()?;
    /// let mut sensor = LeddarDevice::connect(serial_port, 1)?;
    /// let acquisition = sensor.get_results()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect(stream: Box<T>, address: u8) -> Result<LeddarDevice<T>> {
        LeddarDevice::connect_with_settings(stream, address, LinkSettings::default())
    }

    /// Connects to the sensor at `address` with explicit link settings.
    ///
    /// On any failure, including an unrecognized sensor, the stream is closed.
    pub fn connect_with_settings(
        stream: Box<T>,
        address: u8,
        settings: LinkSettings,
    ) -> Result<LeddarDevice<T>> {
        trace!("Connecting to Leddar sensor at address {}", address);
        let (link, server_id) = ModbusLink::connect(stream, address, settings)?;
        match identify(&server_id) {
            Ok(profile) => {
                trace!("Connected to sensor with profile {:?}", profile);
                Ok(LeddarDevice { link, profile })
            }
            Err(e) => {
                error!("Sensor at address {} not recognized", address);
                link.disconnect();
                Err(e)
            }
        }
    }

    /// Closes the connection.
    pub fn disconnect(self) {
        trace!("Disconnecting from sensor");
        self.link.disconnect();
    }

    /// The data layout of the connected sensor.
    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    /// How configurable a multi-segment sensor is. `None` for a LeddarOne.
    pub fn configuration_level(&self) -> Option<ConfigurationLevel> {
        self.profile.configuration_level()
    }

    /// Returns `true` if the sensor accepts configuration changes.
    pub fn can_configure(&self) -> bool {
        self.configuration_level() != Some(ConfigurationLevel::None)
    }

    /// The underlying link, for raw register access.
    pub fn link(&mut self) -> &mut ModbusLink<RtuProtocol, T> {
        &mut self.link
    }

    /// Retrieves the results of the latest acquisition.
    pub fn get_results(&mut self) -> Result<Acquisition> {
        trace!("Getting results with profile {:?}", self.profile);
        let max_detections = self.profile.max_detections();
        let result = match self.profile {
            DeviceProfile::Fixed => self
                .link
                .read_input_registers(
                    LEDDAR_ONE_RESULTS_BASE_REGISTER,
                    LEDDAR_ONE_RESULTS_REGISTER_COUNT,
                )
                .and_then(|registers| parse_fixed(&registers, max_detections)),
            DeviceProfile::Variable(_) => self
                .link
                .invoke(&Message::new(LEDDAR_FN_GET_DETECTIONS))
                .and_then(|reply| parse_variable(&reply.data, max_detections)),
        };
        match &result {
            Ok(acq) => trace!(
                "Acquisition {} with {} detections",
                acq.timestamp,
                acq.detections.len()
            ),
            Err(e) => error!("Failed to get results: {}", e),
        }
        result
    }

    fn check_parameter(&self, no: u16) -> Result<()> {
        let last = self.profile.last_parameter();
        if no > last {
            error!("Parameter {} out of range (last is {})", no, last);
            return Err(Error::InvalidArgument {
                description: format!("parameter {} is not in 0..={}", no, last),
            });
        }
        Ok(())
    }

    /// Reads a configuration parameter (see the `params` module).
    pub fn get_parameter(&mut self, no: u16) -> Result<u16> {
        trace!("Getting parameter {}", no);
        self.check_parameter(no)?;
        self.link.read_holding_register(no)
    }

    /// Writes a configuration parameter (see the `params` module).
    ///
    /// The change is volatile until `write_configuration` is called.
    pub fn set_parameter(&mut self, no: u16, value: u16) -> Result<()> {
        trace!("Setting parameter {} to {}", no, value);
        self.check_parameter(no)?;
        self.link.write_register(no, value)
    }

    /// Asks the sensor to save its current configuration to permanent memory.
    pub fn write_configuration(&mut self) -> Result<()> {
        trace!("Writing configuration to permanent memory");
        self.link
            .invoke(&Message::new(LEDDAR_FN_WRITE_CONFIGURATION))?;
        trace!("Configuration saved");
        Ok(())
    }

    /// Reads the internal temperature of a multi-segment sensor, in degrees Celsius.
    ///
    /// A LeddarOne reports its temperature with every acquisition instead and
    /// answers `Error::OperationNotSupport`.
    pub fn get_temperature(&mut self) -> Result<f32> {
        trace!("Getting temperature");
        if self.profile == DeviceProfile::Fixed {
            warn!("Temperature is part of the acquisition on this sensor");
            return Err(Error::OperationNotSupport);
        }
        let value = self.link.read_input_register(LEDDAR_TEMPERATURE_REGISTER)?;
        Ok(value as f32 / FIXED_POINT_8_SCALE)
    }

    /// Reads the detection threshold offset of a multi-segment sensor.
    pub fn get_threshold(&mut self) -> Result<f32> {
        trace!("Getting threshold");
        if self.profile == DeviceProfile::Fixed {
            warn!("Threshold is not configurable on this sensor");
            return Err(Error::OperationNotSupport);
        }
        let value = self.link.read_holding_register(LEDDAR_CONFIG_THRESHOLD)?;
        Ok(value as i16 as f32 / FIXED_POINT_8_SCALE)
    }

    /// Sets the detection threshold offset of a multi-segment sensor.
    ///
    /// The value is stored in 1/256 steps; out-of-range values saturate.
    pub fn set_threshold(&mut self, value: f32) -> Result<()> {
        trace!("Setting threshold to {}", value);
        if self.profile == DeviceProfile::Fixed {
            warn!("Threshold is not configurable on this sensor");
            return Err(Error::OperationNotSupport);
        }
        let raw = (value * FIXED_POINT_8_SCALE) as i16;
        self.link.write_register(LEDDAR_CONFIG_THRESHOLD, raw as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::mock::{frame, MockStream};
    use crate::params::*;
    use crate::types::Detection;
    use std::time::Duration;

    const ADDRESS: u8 = 1;

    fn settings() -> LinkSettings {
        LinkSettings::default().with_response_timeout(Duration::from_millis(20))
    }

    fn leddar_one_id() -> Vec<u8> {
        let mut id = vec![0u8; 64];
        id[50] = 10;
        id
    }

    fn m16_id(family: u8) -> Vec<u8> {
        let mut id = vec![0u8; 160];
        id[150] = family;
        id
    }

    fn connect(mock: &MockStream, id: &[u8]) -> LeddarDevice<MockStream> {
        mock.push_reply(ADDRESS, 0x11, id);
        LeddarDevice::connect_with_settings(mock.boxed(), ADDRESS, settings()).unwrap()
    }

    #[test]
    fn connect_picks_profile() {
        let mock = MockStream::new();
        let sensor = connect(&mock, &leddar_one_id());
        assert_eq!(sensor.profile(), DeviceProfile::Fixed);
        assert_eq!(sensor.configuration_level(), None);
        assert!(sensor.can_configure());
        assert_eq!(mock.writes(), vec![frame(ADDRESS, 0x11, &[])]);

        let mock = MockStream::new();
        let sensor = connect(&mock, &m16_id(8));
        assert_eq!(
            sensor.profile(),
            DeviceProfile::Variable(ConfigurationLevel::Simple)
        );

        let mock = MockStream::new();
        let sensor = connect(&mock, &m16_id(7));
        assert!(!sensor.can_configure());
    }

    #[test]
    fn connect_to_unknown_sensor_closes_stream() {
        let mock = MockStream::new();
        mock.push_reply(ADDRESS, 0x11, &[0u8; 20]);
        assert!(matches!(
            LeddarDevice::connect_with_settings(mock.boxed(), ADDRESS, settings()),
            Err(Error::UnsupportedDevice)
        ));
        assert!(mock.is_closed());
    }

    #[test]
    fn connect_failure_closes_stream() {
        let mock = MockStream::new();
        mock.push_reply(ADDRESS + 1, 0x11, &leddar_one_id());
        assert!(matches!(
            LeddarDevice::connect_with_settings(mock.boxed(), ADDRESS, settings()),
            Err(Error::ProtocolError { .. })
        ));
        assert!(mock.is_closed());
    }

    #[test]
    fn disconnect_closes_stream() {
        let mock = MockStream::new();
        let sensor = connect(&mock, &leddar_one_id());
        sensor.disconnect();
        assert!(mock.is_closed());
    }

    #[test]
    fn leddar_one_results() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &leddar_one_id());
        let mut payload = vec![20];
        for register in [7u16, 0, 512, 1, 1000, 256, 0, 0, 0, 0] {
            payload.extend_from_slice(&register.to_be_bytes());
        }
        mock.push_reply(ADDRESS, 0x04, &payload);

        let acq = sensor.get_results().unwrap();
        assert_eq!(acq.timestamp, 7);
        assert_eq!(acq.temperature, Some(2.0));
        assert_eq!(
            acq.detections,
            vec![Detection {
                distance: 1.0,
                amplitude: 1.0,
                segment: None,
                flags: None,
            }]
        );
        assert_eq!(
            mock.writes()[1],
            frame(ADDRESS, 0x04, &[0x00, 0x14, 0x00, 0x0A])
        );
    }

    #[test]
    fn m16_results() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_reply(
            ADDRESS,
            0x41,
            &[1, 0xE8, 0x03, 0x40, 0x00, 0x52, 0x2A, 0, 0, 0, 0x32, 0x00],
        );

        let acq = sensor.get_results().unwrap();
        assert_eq!(acq.timestamp, 42);
        assert_eq!(acq.led_intensity(), Some(50));
        assert_eq!(
            acq.detections,
            vec![Detection {
                distance: 10.0,
                amplitude: 1.0,
                segment: Some(5),
                flags: Some(2),
            }]
        );
        assert_eq!(mock.writes()[1], frame(ADDRESS, 0x41, &[]));
    }

    #[test]
    fn results_errors_propagate() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_silence();
        assert!(matches!(sensor.get_results(), Err(Error::OperationTimeout)));
        mock.push_reply(ADDRESS, 0x41, &[]);
        assert!(matches!(
            sensor.get_results(),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn parameters_round_trip() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_reply(ADDRESS, 0x03, &[0x02, 0x00, 0x50]);
        assert_eq!(sensor.get_parameter(LEDDAR_CONFIG_LED_POWER).unwrap(), 80);
        mock.push_reply(ADDRESS, 0x06, &[0x00, 0x08, 0x00, 0x10]);
        sensor
            .set_parameter(LEDDAR_CONFIG_MAX_DETECTIONS, 16)
            .unwrap();
        assert_eq!(
            &mock.writes()[1..],
            &[
                frame(ADDRESS, 0x03, &[0x00, 0x05, 0x00, 0x01]),
                frame(ADDRESS, 0x06, &[0x00, 0x08, 0x00, 0x10]),
            ]
        );
    }

    #[test]
    fn out_of_range_parameters_never_reach_the_line() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        assert!(matches!(
            sensor.get_parameter(LEDDAR_CONFIG_LAST + 1),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            sensor.set_parameter(LEDDAR_ONE_CONFIG_BAUD_RATE, 1),
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(mock.write_count(), 1);

        let mock = MockStream::new();
        let mut sensor = connect(&mock, &leddar_one_id());
        mock.push_reply(ADDRESS, 0x03, &[0x02, 0x00, 0x01]);
        assert_eq!(
            sensor.get_parameter(LEDDAR_ONE_CONFIG_MODBUS_ADDRESS).unwrap(),
            1
        );
        assert!(matches!(
            sensor.get_parameter(LEDDAR_ONE_CONFIG_LAST + 1),
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(mock.write_count(), 2);
    }

    #[test]
    fn write_configuration() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_reply(ADDRESS, 0x46, &[]);
        sensor.write_configuration().unwrap();
        assert_eq!(mock.writes()[1], frame(ADDRESS, 0x46, &[]));

        mock.push_reply(ADDRESS, 0x41, &[]);
        assert!(matches!(
            sensor.write_configuration(),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn threshold_is_signed_fixed_point() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_reply(ADDRESS, 0x03, &[0x02, 0xFF, 0x80]);
        assert_eq!(sensor.get_threshold().unwrap(), -0.5);

        mock.push_reply(ADDRESS, 0x06, &[0x00, 0x04, 0xFE, 0x00]);
        sensor.set_threshold(-2.0).unwrap();
        assert_eq!(
            mock.writes()[2],
            frame(ADDRESS, 0x06, &[0x00, 0x04, 0xFE, 0x00])
        );
    }

    #[test]
    fn temperature() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_reply(ADDRESS, 0x04, &[0x02, 0x19, 0x80]);
        assert_eq!(sensor.get_temperature().unwrap(), 25.5);
        assert_eq!(
            mock.writes()[1],
            frame(ADDRESS, 0x04, &[0x00, 0x00, 0x00, 0x01])
        );
    }

    #[test]
    fn leddar_one_rejects_multi_segment_operations() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &leddar_one_id());
        assert!(matches!(
            sensor.get_temperature(),
            Err(Error::OperationNotSupport)
        ));
        assert!(matches!(
            sensor.get_threshold(),
            Err(Error::OperationNotSupport)
        ));
        assert!(matches!(
            sensor.set_threshold(1.0),
            Err(Error::OperationNotSupport)
        ));
        assert_eq!(mock.write_count(), 1);
    }

    #[test]
    fn raw_register_access_through_link() {
        let mock = MockStream::new();
        let mut sensor = connect(&mock, &m16_id(9));
        mock.push_reply(ADDRESS, 0x06, &[]);
        sensor.link().write_register(4, 1200).unwrap();
        assert!(!sensor.link().is_awaiting_reply());
        assert_eq!(sensor.link().address(), ADDRESS);
    }
}
