use crate::base::{Error, Frame, Message, ProtocolDecoder, ProtocolEncoder, Result};
use crate::checksum::Crc16;
use log::{error, trace};
use std::io::{self, Write};

/// Size of the `[address, function]` header.
pub const MODBUS_HEADER_LEN: usize = 2;

/// Size of the CRC16 trailer.
pub const MODBUS_CRC_LEN: usize = 2;

/// Header plus trailer: the shortest frame that can carry an answer.
pub const MODBUS_OVERHEAD: usize = MODBUS_HEADER_LEN + MODBUS_CRC_LEN;

/// Largest payload an RTU frame may carry.
pub const MODBUS_MAX_PAYLOAD: usize = 252;

/// Largest frame on the line.
pub const MODBUS_MAX_FRAME_LEN: usize = MODBUS_MAX_PAYLOAD + MODBUS_OVERHEAD;

/// Function codes above this value are exception replies, never requests.
const MODBUS_MAX_FUNCTION: u8 = 127;

/// The Modbus-RTU framing used to talk to one slave.
///
/// Encoding prepends `[address, function]` and appends the CRC16 (low byte first).
/// Decoding checks length, CRC, then that the frame comes from `address` and
/// answers the expected function.
#[derive(Debug, Clone, PartialEq)]
pub struct RtuProtocol {
    address: u8,
}

impl RtuProtocol {
    /// Creates the framing for the slave at `address`.
    pub fn new(address: u8) -> RtuProtocol {
        trace!("Creating new RtuProtocol for slave address {}", address);
        RtuProtocol { address }
    }

    /// The slave address written into, and expected back in, every frame.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Builds the complete frame for `msg`.
    pub fn encode_frame(&self, msg: &Message) -> Result<Frame> {
        check_request(msg)?;
        let mut body = Vec::with_capacity(MODBUS_HEADER_LEN + msg.data.len());
        body.push(self.address);
        body.push(msg.function);
        body.extend_from_slice(&msg.data);
        let crc = Crc16::compute(&body);
        trace!(
            "Built frame: addr={}, function={:02X}, payload_len={}, crc=({:02X}, {:02X})",
            self.address,
            msg.function,
            msg.data.len(),
            crc.0,
            crc.1
        );
        Ok(Frame::from_parts(self.address, msg.function, msg.data.clone(), crc))
    }
}

fn check_request(msg: &Message) -> Result<()> {
    if msg.function == 0 || msg.function > MODBUS_MAX_FUNCTION {
        error!("Function code out of range: {:02X}", msg.function);
        return Err(Error::InvalidArgument {
            description: format!("function code {} is not in 1..=127", msg.function),
        });
    }
    if msg.data.len() > MODBUS_MAX_PAYLOAD {
        error!(
            "Payload too large: {} bytes (max {})",
            msg.data.len(),
            MODBUS_MAX_PAYLOAD
        );
        return Err(Error::InvalidArgument {
            description: format!(
                "payload of {} bytes exceeds {}",
                msg.data.len(),
                MODBUS_MAX_PAYLOAD
            ),
        });
    }
    Ok(())
}

impl ProtocolDecoder for RtuProtocol {
    /// Validates a raw frame received after a request for `function`.
    ///
    /// Fewer than four bytes counts as a timeout: nothing usable arrived.
    fn decode(&mut self, buf: &[u8], function: u8) -> Result<Message> {
        trace!(
            "decode called with {} bytes, expecting addr={} function={:02X}",
            buf.len(),
            self.address,
            function
        );
        if buf.len() < MODBUS_OVERHEAD {
            trace!("Frame shorter than {} bytes, treating as timeout", MODBUS_OVERHEAD);
            return Err(Error::OperationTimeout);
        }

        let body_len = buf.len() - MODBUS_CRC_LEN;
        if !Crc16::verify(&buf[..body_len], buf[body_len], buf[body_len + 1]) {
            error!(
                "CRC mismatch on {}-byte frame (received {:02X} {:02X})",
                buf.len(),
                buf[body_len],
                buf[body_len + 1]
            );
            return Err(Error::BadCrc);
        }

        if buf[0] != self.address || buf[1] != function {
            error!(
                "Unexpected reply: addr={} function={:02X}, expected addr={} function={:02X}",
                buf[0], buf[1], self.address, function
            );
            return Err(Error::ProtocolError {
                description: format!(
                    "reply from {} for function {:02X} does not answer function {:02X} at {}",
                    buf[0], buf[1], function, self.address
                ),
            });
        }

        let msg = Message::with_data(buf[1], &buf[MODBUS_HEADER_LEN..body_len]);
        trace!(
            "Decoded reply: function={:02X}, payload_len={}",
            msg.function,
            msg.data.len()
        );
        Ok(msg)
    }
}

impl ProtocolEncoder for RtuProtocol {
    /// Encodes a request `Message` into the provided byte buffer.
    fn encode(&mut self, msg: &Message, bytes: &mut [u8]) -> Result<usize> {
        trace!(
            "Encoding message: function={:02X}, data_len={}",
            msg.function,
            msg.data.len()
        );
        let encoded_size = self.estimate_encoded_size(msg)?;
        if encoded_size > bytes.len() {
            error!(
                "Buffer too small: required {}, available {}",
                encoded_size,
                bytes.len()
            );
            return Err(Error::BufferTooSmall);
        }

        let frame = self.encode_frame(msg)?;
        bytes[..encoded_size].copy_from_slice(&frame.to_bytes());
        trace!("Encoded {} bytes: {:02X?}", encoded_size, &bytes[..encoded_size]);
        Ok(encoded_size)
    }

    fn estimate_encoded_size(&mut self, msg: &Message) -> Result<usize> {
        check_request(msg)?;
        Ok(MODBUS_OVERHEAD + msg.data.len())
    }

    fn write_to(&mut self, msg: &Message, dest: &mut impl Write) -> Result<usize> {
        let frame = self.encode_frame(msg)?.to_bytes();
        trace!("Writing {} bytes to destination stream...", frame.len());
        match dest.write(&frame) {
            Ok(written) if written == frame.len() => {
                trace!("Successfully wrote {} bytes", written);
                Ok(written)
            }
            Ok(written) => {
                error!("Short write: {} of {} bytes", written, frame.len());
                Err(Error::IoError(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("wrote {} of {} frame bytes", written, frame.len()),
                )))
            }
            Err(err) => {
                error!("IO error during write: {}", err);
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: ProtocolEncoder>(protocol: &mut T, msg: &Message) -> Result<Vec<u8>> {
        let encoded_bytes = protocol.estimate_encoded_size(msg)?;
        let mut buf = vec![0; encoded_bytes];
        let encoded_bytes = protocol.encode(msg, &mut buf[0..encoded_bytes])?;
        buf.truncate(encoded_bytes);
        Ok(buf)
    }

    fn reply(address: u8, function: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![address, function];
        bytes.extend_from_slice(payload);
        let (lo, hi) = Crc16::compute(&bytes);
        bytes.push(lo);
        bytes.push(hi);
        bytes
    }

    #[test]
    fn protocol_encode() {
        let mut protocol = RtuProtocol::new(1);

        assert_eq!(
            encode(&mut protocol, &Message::with_data(0x03, &[0, 0, 0, 1]))
                .unwrap()
                .as_slice(),
            [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]
        );

        assert_eq!(
            encode(&mut protocol, &Message::new(0x11)).unwrap().as_slice(),
            [0x01, 0x11, 0xC0, 0x2C]
        );
    }

    #[test]
    fn encode_rejects_bad_function_and_payload() {
        let mut protocol = RtuProtocol::new(1);
        assert!(matches!(
            encode(&mut protocol, &Message::new(0)),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            encode(&mut protocol, &Message::new(128)),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            encode(&mut protocol, &Message::with_data(0x41, &[0; 253])),
            Err(Error::InvalidArgument { .. })
        ));

        let frame = encode(&mut protocol, &Message::with_data(0x41, &[0xAA; 252])).unwrap();
        assert_eq!(frame.len(), MODBUS_MAX_FRAME_LEN);
    }

    #[test]
    fn encode_into_short_buffer() {
        let mut protocol = RtuProtocol::new(1);
        let mut buf = [0u8; 5];
        assert!(matches!(
            protocol.encode(&Message::with_data(0x06, &[0, 4, 4, 0xB0]), &mut buf),
            Err(Error::BufferTooSmall)
        ));
    }

    #[test]
    fn frame_accessors() {
        let protocol = RtuProtocol::new(7);
        let frame = protocol
            .encode_frame(&Message::with_data(0x04, &[0x00, 0x14, 0x00, 0x0A]))
            .unwrap();
        assert_eq!(frame.address(), 7);
        assert_eq!(frame.function(), 0x04);
        assert_eq!(frame.payload(), &[0x00, 0x14, 0x00, 0x0A]);
        assert_eq!(frame.len(), 8);
        let bytes = frame.to_bytes();
        assert_eq!(frame.crc(), (bytes[6], bytes[7]));
    }

    #[test]
    fn encode_then_decode_recovers_payload() {
        let mut protocol = RtuProtocol::new(0x11);
        for len in [0usize, 1, 5, 64, 252] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 31 + 7) as u8).collect();
            let bytes = encode(&mut protocol, &Message::with_data(0x41, &payload)).unwrap();
            let msg = protocol.decode(&bytes, 0x41).unwrap();
            assert_eq!(msg.function, 0x41);
            assert_eq!(msg.data, payload);
        }
    }

    #[test]
    fn decode_short_read_is_timeout() {
        let mut protocol = RtuProtocol::new(1);
        assert!(matches!(protocol.decode(&[], 3), Err(Error::OperationTimeout)));
        assert!(matches!(
            protocol.decode(&[0x01, 0x03, 0x84], 3),
            Err(Error::OperationTimeout)
        ));
    }

    #[test]
    fn decode_bad_crc() {
        let mut protocol = RtuProtocol::new(1);
        let mut bytes = reply(1, 0x03, &[0x02, 0x01, 0x2C]);
        bytes[3] ^= 0x10;
        assert!(matches!(protocol.decode(&bytes, 0x03), Err(Error::BadCrc)));
    }

    #[test]
    fn decode_filters_address_and_function() {
        let mut protocol = RtuProtocol::new(1);
        assert!(matches!(
            protocol.decode(&reply(2, 0x03, &[0x02, 0x01, 0x2C]), 0x03),
            Err(Error::ProtocolError { .. })
        ));
        assert!(matches!(
            protocol.decode(&reply(1, 0x04, &[0x02, 0x01, 0x2C]), 0x03),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn decode_accepts_empty_payload() {
        let mut protocol = RtuProtocol::new(1);
        let msg = protocol.decode(&reply(1, 0x46, &[]), 0x46).unwrap();
        assert_eq!(msg, Message::new(0x46));
    }

    #[test]
    fn write_to_rejects_short_write() {
        struct HalfWriter(Vec<u8>);
        impl Write for HalfWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                let n = buf.len() / 2;
                self.0.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut protocol = RtuProtocol::new(1);
        let mut dest = HalfWriter(Vec::new());
        match protocol.write_to(&Message::new(0x11), &mut dest) {
            Err(Error::IoError(err)) => assert_eq!(err.kind(), io::ErrorKind::WriteZero),
            other => panic!("unexpected result: {:?}", other),
        }

        let mut full = Vec::new();
        assert_eq!(protocol.write_to(&Message::new(0x11), &mut full).unwrap(), 4);
        assert_eq!(full, [0x01, 0x11, 0xC0, 0x2C]);
    }
}
