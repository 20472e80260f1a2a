use crate::protocol::MODBUS_OVERHEAD;

/// A request or reply PDU: a Modbus function code and its payload.
///
/// The slave address and CRC are added and stripped by the protocol, so the same
/// `Message` describes what is asked and what comes back.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The Modbus function code.
    pub function: u8,

    /// Payload data following the function code (may be empty).
    pub data: Vec<u8>,
}

impl Message {
    /// Creates a new message with a function code and no payload.
    ///
    /// # Arguments
    ///
    /// * `function` - The function code for the message.
    pub fn new(function: u8) -> Message {
        Message::with_data(function, &[])
    }

    /// Creates a new message with a function code and payload data.
    ///
    /// # Arguments
    ///
    /// * `function` - The function code for the message.
    /// * `data` - A slice containing the payload data.
    #[inline]
    pub fn with_data(function: u8, data: &[u8]) -> Message {
        Message {
            function,
            data: data.to_vec(),
        }
    }
}

/// One complete RTU frame as it travels on the line.
///
/// Built by the protocol encoder and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    address: u8,
    function: u8,
    payload: Vec<u8>,
    crc: (u8, u8),
}

impl Frame {
    pub(crate) fn from_parts(address: u8, function: u8, payload: Vec<u8>, crc: (u8, u8)) -> Frame {
        Frame {
            address,
            function,
            payload,
            crc,
        }
    }

    /// Slave address in the header.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Function code in the header.
    pub fn function(&self) -> u8 {
        self.function
    }

    /// Payload between header and CRC.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// CRC16 trailer as `(lo, hi)`.
    pub fn crc(&self) -> (u8, u8) {
        self.crc
    }

    /// Total on-wire length.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.payload.len() + MODBUS_OVERHEAD
    }

    /// Serializes the frame in wire order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.push(self.address);
        bytes.push(self.function);
        bytes.extend_from_slice(&self.payload);
        bytes.push(self.crc.0);
        bytes.push(self.crc.1);
        bytes
    }
}
