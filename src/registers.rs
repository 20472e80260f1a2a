//! Standard Modbus register functions on top of a `ModbusLink`.

use crate::base::{Error, Message, ModbusLink, ProtocolDecoder, ProtocolEncoder, Result};
use crate::cmds::*;
use byteorder::{BigEndian, ByteOrder};
use log::{error, trace};
use std::io::{Read, Write};

/// Decodes consecutive big-endian registers. A trailing odd byte is ignored.
///
/// # Example
/// ```
/// assert_eq!(leddar::registers::registers_from_bytes(&[0x01, 0x2C]), vec![300]);
/// ```
pub fn registers_from_bytes(bytes: &[u8]) -> Vec<u16> {
    bytes.chunks_exact(2).map(BigEndian::read_u16).collect()
}

fn address_and_value(address: u16, value: u16) -> [u8; 4] {
    let mut payload = [0; 4];
    BigEndian::write_u16(&mut payload[0..2], address);
    BigEndian::write_u16(&mut payload[2..4], value);
    payload
}

/// Extracts `count` registers from a read reply: one byte count, then the values.
fn registers_from_reply(reply: &Message, count: u16) -> Result<Vec<u16>> {
    let needed = 1 + 2 * count as usize;
    if reply.data.len() < needed {
        error!(
            "Register reply too short: {} bytes for {} registers",
            reply.data.len(),
            count
        );
        return Err(Error::ProtocolError {
            description: format!(
                "reply of {} bytes cannot hold {} registers",
                reply.data.len(),
                count
            ),
        });
    }
    Ok(registers_from_bytes(&reply.data[1..needed]))
}

impl<P, T: ?Sized> ModbusLink<P, T>
where
    P: ProtocolDecoder + ProtocolEncoder,
    T: Read + Write,
{
    /// Reads `count` consecutive input registers starting at `start` (function 4).
    ///
    /// # Arguments
    ///
    /// * `start` - Address of the first register.
    /// * `count` - Number of registers, 1 to 125.
    pub fn read_input_registers(&mut self, start: u16, count: u16) -> Result<Vec<u16>> {
        trace!("Reading {} input registers at {}", count, start);
        if count == 0 || count > MODBUS_MAX_READ_REGISTERS {
            error!("Invalid input register count: {}", count);
            return Err(Error::InvalidArgument {
                description: format!(
                    "register count {} is not in 1..={}",
                    count, MODBUS_MAX_READ_REGISTERS
                ),
            });
        }

        let request = Message::with_data(
            MODBUS_FN_READ_INPUT_REGISTERS,
            &address_and_value(start, count),
        );
        let reply = self.invoke(&request)?;
        let values = registers_from_reply(&reply, count)?;
        trace!("Input registers {}..: {:?}", start, values);
        Ok(values)
    }

    /// Reads a single input register.
    pub fn read_input_register(&mut self, address: u16) -> Result<u16> {
        Ok(self.read_input_registers(address, 1)?[0])
    }

    /// Reads a single holding register (function 3).
    pub fn read_holding_register(&mut self, address: u16) -> Result<u16> {
        trace!("Reading holding register {}", address);
        let request = Message::with_data(
            MODBUS_FN_READ_HOLDING_REGISTERS,
            &address_and_value(address, 1),
        );
        let reply = self.invoke(&request)?;
        let value = registers_from_reply(&reply, 1)?[0];
        trace!("Holding register {} = {}", address, value);
        Ok(value)
    }

    /// Writes a single holding register (function 6).
    ///
    /// Any valid reply acknowledges the write; its content is not inspected.
    pub fn write_register(&mut self, address: u16, value: u16) -> Result<()> {
        trace!("Writing {} to register {}", value, address);
        let request = Message::with_data(
            MODBUS_FN_WRITE_SINGLE_REGISTER,
            &address_and_value(address, value),
        );
        self.invoke(&request)?;
        trace!("Register {} written", address);
        Ok(())
    }
}
