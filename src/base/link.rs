use crate::base::error::{Error, Result};
use crate::base::message::Message;
use crate::base::traits::{ProtocolDecoder, ProtocolEncoder};
use crate::cmds::MODBUS_FN_REPORT_SERVER_ID;
use crate::config::LinkSettings;
use crate::protocol::{RtuProtocol, MODBUS_MAX_FRAME_LEN};
use log::{error, trace, warn};
use std::io::{self, Read, Write};
use std::time::Instant;

/// A connected Modbus-RTU link to one slave, with at most one request in flight.
///
/// The link sends requests with `send`, collects the matching reply with
/// `receive`, and refuses any other interleaving: a second `send` while a reply is
/// outstanding, or a `receive` with nothing pending, fails with
/// `Error::InvalidState` before the stream is touched.
///
/// A link only exists while connected. Dropping it, or calling `disconnect`, closes
/// the stream.
///
/// # Examples
/// ```ignore
/// let serial_port = serialport::new("/dev/ttyUSB0", 115200)
///     .timeout(Duration::from_millis(1))
///     .open()?;
/// let (mut link, server_id) = ModbusLink::connect(serial_port, 1, LinkSettings::default())?;
/// let reply = link.invoke(&Message::new(0x41))?;
/// ```
#[derive(Debug)]
pub struct ModbusLink<P, T: ?Sized> {
    protocol: P,
    settings: LinkSettings,
    pending_function: Option<u8>,
    stream: Box<T>,
}

impl<T: ?Sized> ModbusLink<RtuProtocol, T>
where
    T: io::Read + io::Write,
{
    /// Connects to the slave at `address` over `stream`.
    ///
    /// Modbus has no notion of a connection, so presence is checked with a report
    /// server id (0x11) exchange. On success returns the link and the identification
    /// payload. On failure the stream is closed and the error returned.
    pub fn connect(
        stream: Box<T>,
        address: u8,
        settings: LinkSettings,
    ) -> Result<(ModbusLink<RtuProtocol, T>, Vec<u8>)> {
        trace!("Connecting to slave {} with {:?}", address, settings);
        let mut link = ModbusLink::new(RtuProtocol::new(address), stream, settings);
        match link.invoke(&Message::new(MODBUS_FN_REPORT_SERVER_ID)) {
            Ok(reply) => {
                trace!(
                    "Slave {} answered report server id with {} bytes",
                    address,
                    reply.data.len()
                );
                Ok((link, reply.data))
            }
            Err(e) => {
                error!("Connection to slave {} failed: {}", address, e);
                link.disconnect();
                Err(e)
            }
        }
    }

    /// The address of the slave this link talks to.
    pub fn address(&self) -> u8 {
        self.protocol.address()
    }
}

impl<P, T: ?Sized> ModbusLink<P, T>
where
    P: ProtocolDecoder + ProtocolEncoder,
    T: io::Read + io::Write,
{
    pub(crate) fn new(protocol: P, stream: Box<T>, settings: LinkSettings) -> ModbusLink<P, T> {
        trace!("Creating new ModbusLink");
        ModbusLink {
            protocol,
            settings,
            pending_function: None,
            stream,
        }
    }

    /// The settings the link was opened with.
    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Returns `true` between a successful `send` and the following `receive`.
    pub fn is_awaiting_reply(&self) -> bool {
        self.pending_function.is_some()
    }

    /// Sends a request frame.
    ///
    /// The frame must go out in a single complete write; a short write is an error
    /// and leaves the link idle.
    ///
    /// A failed flush also leaves the link idle, although the frame may already be
    /// on the line. A late reply to it then shows up as a stale frame and is
    /// rejected by the next `receive`.
    pub fn send(&mut self, msg: &Message) -> Result<usize> {
        trace!(
            "Link send called: function={:02X}, data_len={}",
            msg.function,
            msg.data.len()
        );
        if let Some(pending) = self.pending_function {
            error!(
                "Send of {:02X} refused: reply to {:02X} still outstanding",
                msg.function, pending
            );
            return Err(Error::InvalidState {
                description: format!("reply to function {:02X} still outstanding", pending),
            });
        }

        let written = self.protocol.write_to(msg, &mut self.stream)?;
        trace!("Flushing stream...");
        if let Err(e) = self.stream.flush() {
            error!(
                "Flush failed after writing {} bytes of {:02X}: {}",
                written, msg.function, e
            );
            return Err(e.into());
        }
        self.pending_function = Some(msg.function);
        trace!("Sent {} bytes, awaiting reply to {:02X}", written, msg.function);
        Ok(written)
    }

    /// Receives the reply to the last request.
    ///
    /// Whatever the outcome, the exchange is over afterwards and the link is idle.
    pub fn receive(&mut self) -> Result<Message> {
        let function = match self.pending_function.take() {
            Some(function) => function,
            None => {
                error!("Receive refused: no request pending");
                return Err(Error::InvalidState {
                    description: "no request pending".to_owned(),
                });
            }
        };
        trace!("Link receive called for function {:02X}", function);

        let raw = self.read_frame()?;
        let result = self.protocol.decode(&raw, function);
        match &result {
            Ok(msg) => trace!(
                "Received reply: function={:02X}, data_len={}",
                msg.function,
                msg.data.len()
            ),
            Err(Error::OperationTimeout) => warn!(
                "Timed out waiting for reply to {:02X} ({} bytes received)",
                function,
                raw.len()
            ),
            Err(e) => error!("Invalid reply to {:02X}: {}", function, e),
        }
        result
    }

    /// Sends a request and waits for its reply.
    pub fn invoke(&mut self, request: &Message) -> Result<Message> {
        trace!(
            "Link invoke called: function={:02X}, data_len={}",
            request.function,
            request.data.len()
        );
        self.send(request)?;
        self.receive()
    }

    /// Closes the link. Any outstanding reply is abandoned.
    pub fn disconnect(self) {
        trace!(
            "Disconnecting link (pending reply: {:?})",
            self.pending_function
        );
    }

    /// Collects one frame: waits for the first byte up to the response timeout,
    /// then reads until the line stays silent for the inter-frame gap.
    fn read_frame(&mut self) -> Result<Vec<u8>> {
        let timeout = self.settings.response_timeout;
        let gap = self.settings.inter_frame_gap();
        let mut frame = Vec::with_capacity(MODBUS_MAX_FRAME_LEN);
        let mut buf = [0u8; MODBUS_MAX_FRAME_LEN];
        let start = Instant::now();
        let mut last_byte_at: Option<Instant> = None;

        while frame.len() < MODBUS_MAX_FRAME_LEN {
            match self.stream.read(&mut buf[..MODBUS_MAX_FRAME_LEN - frame.len()]) {
                Ok(0) => {}
                Ok(n) => {
                    trace!("Read {} bytes from stream", n);
                    frame.extend_from_slice(&buf[..n]);
                    last_byte_at = Some(Instant::now());
                    continue;
                }
                Err(e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("IO error reading from stream: {}", e);
                    return Err(e.into());
                }
            }

            match last_byte_at {
                Some(at) if at.elapsed() >= gap => {
                    trace!("Line silent for {:?}, frame complete", gap);
                    break;
                }
                None if start.elapsed() >= timeout => {
                    trace!("No reply within {:?}", timeout);
                    break;
                }
                _ => {}
            }
        }

        trace!("Collected {} bytes: {:02X?}", frame.len(), frame);
        Ok(frame)
    }
}
