mod error;
mod link;
mod message;
#[cfg(test)]
pub(crate) mod mock;
mod traits;

pub use self::error::{Error, Result};
pub use self::link::*;
pub use self::message::{Frame, Message};
pub use self::traits::{ProtocolDecoder, ProtocolEncoder};
