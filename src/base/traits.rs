use crate::base::error::Result;
use crate::base::message::Message;
use std::io;

/// Defines the behavior for turning a received frame back into a `Message`.
pub trait ProtocolDecoder {
    /// Validates a complete raw frame and extracts the reply to `function`.
    ///
    /// Returns the decoded reply `Message` on success. Frames that are too short,
    /// corrupted or addressed elsewhere are reported as errors.
    ///
    /// # Arguments
    ///
    /// * `buf` - Every byte received for the frame, CRC included.
    /// * `function` - The function code of the request being answered.
    fn decode(&mut self, buf: &[u8], function: u8) -> Result<Message>;
}

/// Defines the behavior for encoding `Message` objects into byte streams.
pub trait ProtocolEncoder {
    /// Encodes a `Message` into the provided byte buffer.
    ///
    /// Returns the number of bytes written to the buffer upon successful encoding.
    ///
    /// # Arguments
    ///
    /// * `msg` - The `Message` to encode.
    /// * `bytes` - The mutable byte slice to write the encoded frame into.
    fn encode(&mut self, msg: &Message, bytes: &mut [u8]) -> Result<usize>;

    /// Returns the exact number of bytes needed to encode the given `Message`.
    ///
    /// # Arguments
    ///
    /// * `msg` - The `Message` for which to estimate the encoded size.
    fn estimate_encoded_size(&mut self, msg: &Message) -> Result<usize>;

    /// Encodes a `Message` and hands it to a `Write` target in a single write.
    ///
    /// Returns the number of bytes written. A write that does not take the whole
    /// frame is an error: a partially sent frame cannot be resumed.
    ///
    /// # Arguments
    ///
    /// * `msg` - The `Message` to encode and write.
    /// * `dest` - The `Write` target to write the encoded bytes to.
    fn write_to(&mut self, msg: &Message, dest: &mut impl io::Write) -> Result<usize>;
}
