use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur while talking to a sensor over Modbus-RTU.
#[derive(Debug)]
pub enum Error {
    /// The caller violated a precondition (function code, payload size, register count
    /// or parameter number out of range). Nothing was sent on the wire.
    InvalidArgument { description: String },

    /// No frame, or an incomplete one, arrived within the response window.
    OperationTimeout,

    /// A frame arrived but its CRC16 trailer does not match its content.
    BadCrc,

    /// The frame is intact but does not answer the pending request (foreign or stale
    /// traffic), or its content is shorter than what it declares.
    ProtocolError { description: String },

    /// A send was attempted while a reply is outstanding, or a receive without a
    /// pending request.
    InvalidState { description: String },

    /// The identification reply matches none of the supported sensors.
    UnsupportedDevice,

    /// The connected sensor does not support this operation.
    OperationNotSupport,

    /// The buffer provided is too small for frame encoding.
    BufferTooSmall,

    /// An I/O error occurred while communicating with the underlying stream (e.g., serial port).
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument { description } => {
                write!(f, "invalid argument: {}", description)
            }
            Error::OperationTimeout => write!(f, "operation timeout"),
            Error::BadCrc => write!(f, "bad crc"),
            Error::ProtocolError { description } => write!(f, "protocol error: {}", description),
            Error::InvalidState { description } => write!(f, "invalid state: {}", description),
            Error::UnsupportedDevice => write!(f, "unsupported device"),
            Error::OperationNotSupport => write!(f, "operation not support"),
            Error::BufferTooSmall => write!(f, "buffer is too small for frame encoding"),
            Error::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

/// A specialized `Result` type for sensor operations.
pub type Result<T> = std::result::Result<T, Error>;
