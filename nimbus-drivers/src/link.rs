//! Phone link over a byte stream
//!
//! Carries AppMessage frames over any `embedded-io` stream (UART, BLE
//! serial bridge). Pushes in both directions carry a dictionary; every
//! received push is answered with an ack, or a nack if it is larger than
//! the inbound buffer.
//!
//! Acks and nacks are delivery receipts for the link only. A forecast
//! request and the weather that answers it are separate pushes.

use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;
use nimbus_core::config::WatchFaceConfig;
use nimbus_core::traits::{Transport, TransportError};
use nimbus_protocol::frame::MAX_FRAME_SIZE;
use nimbus_protocol::{AppMessage, FrameError, FrameParser, MAX_PAYLOAD_SIZE};

/// Something that happened on the link
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Dictionary pushed by the phone, ack already attempted
    Received(Vec<u8, MAX_PAYLOAD_SIZE>),
    /// The phone accepted our push with this transaction id
    Delivered(u8),
    /// The phone refused our push with this transaction id
    Rejected(u8),
}

/// AppMessage transport over a byte stream
pub struct AppMessageLink<IO> {
    io: IO,
    parser: FrameParser,
    inbound_capacity: usize,
    outbound_capacity: usize,
    next_txid: u8,
    /// Transaction id of the last push still waiting for a receipt
    pending: Option<u8>,
    /// Pushes delivered without an ack reaching the phone
    unacked: u32,
}

impl<IO> AppMessageLink<IO> {
    /// Create a link with explicit buffer sizes (bytes of dictionary)
    pub fn new(io: IO, inbound_capacity: usize, outbound_capacity: usize) -> Self {
        Self {
            io,
            parser: FrameParser::new(),
            inbound_capacity: inbound_capacity.min(MAX_PAYLOAD_SIZE),
            outbound_capacity: outbound_capacity.min(MAX_PAYLOAD_SIZE),
            next_txid: 0,
            pending: None,
            unacked: 0,
        }
    }

    /// Create a link sized from the watch-face configuration
    pub fn from_config(io: IO, config: &WatchFaceConfig) -> Self {
        Self::new(
            io,
            config.inbound_buffer_size as usize,
            config.outbound_buffer_size as usize,
        )
    }

    pub fn inbound_capacity(&self) -> usize {
        self.inbound_capacity
    }

    /// Transaction id of the push awaiting a receipt, if any
    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    /// Number of received pushes whose ack could not be written
    pub fn unacked(&self) -> u32 {
        self.unacked
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}

impl<IO: Read + Write + ReadReady> AppMessageLink<IO> {
    /// Process buffered input until an event is complete
    ///
    /// Never blocks waiting for bytes. Returns `Ok(None)` when the stream
    /// has nothing more to read.
    pub fn poll(&mut self) -> Result<Option<LinkEvent>, TransportError> {
        let mut byte = [0u8; 1];
        while self.io.read_ready().map_err(|_| TransportError::Io)? {
            let n = self.io.read(&mut byte).map_err(|_| TransportError::Io)?;
            if n == 0 {
                break;
            }

            match self.parser.feed(byte[0]) {
                Ok(Some(frame)) => {
                    let Ok(message) = AppMessage::from_frame(&frame) else {
                        // Unknown message type, ignore
                        continue;
                    };
                    if let Some(event) = self.handle_message(message)? {
                        return Ok(Some(event));
                    }
                }
                Ok(None) => {}
                Err(FrameError::Incomplete) => {}
                Err(_) => return Err(TransportError::Corrupted),
            }
        }
        Ok(None)
    }

    fn handle_message(
        &mut self,
        message: AppMessage<'_>,
    ) -> Result<Option<LinkEvent>, TransportError> {
        match message {
            AppMessage::Push { txid, dictionary } => {
                if dictionary.len() > self.inbound_capacity {
                    self.write_message(AppMessage::Nack { txid })?;
                    return Err(TransportError::InboundOverflow);
                }
                // The dictionary is good even if the receipt is lost
                if let Err(_e) = self.write_message(AppMessage::Ack { txid }) {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Ack for push {} not written: {:?}", txid, _e);
                    self.unacked = self.unacked.wrapping_add(1);
                }
                let mut received = Vec::new();
                received
                    .extend_from_slice(dictionary)
                    .map_err(|_| TransportError::InboundOverflow)?;
                Ok(Some(LinkEvent::Received(received)))
            }
            AppMessage::Ack { txid } => Ok(self.settle(txid).then_some(LinkEvent::Delivered(txid))),
            AppMessage::Nack { txid } => Ok(self.settle(txid).then_some(LinkEvent::Rejected(txid))),
        }
    }

    /// Clear the pending push if the receipt is for it; stale receipts
    /// are dropped
    fn settle(&mut self, txid: u8) -> bool {
        if self.pending == Some(txid) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    fn write_message(&mut self, message: AppMessage<'_>) -> Result<(), TransportError> {
        let frame = message
            .to_frame()
            .map_err(|_| TransportError::OutboundOverflow)?;
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = frame
            .encode(&mut buffer)
            .map_err(|_| TransportError::OutboundOverflow)?;
        self.io
            .write_all(&buffer[..len])
            .map_err(|_| TransportError::Io)?;
        self.io.flush().map_err(|_| TransportError::Io)
    }
}

impl<IO: Read + Write + ReadReady> Transport for AppMessageLink<IO> {
    fn send(&mut self, dictionary: &[u8]) -> Result<(), TransportError> {
        if dictionary.len() > self.outbound_capacity {
            return Err(TransportError::OutboundOverflow);
        }

        let txid = self.next_txid;
        self.write_message(AppMessage::Push { txid, dictionary })?;
        self.next_txid = self.next_txid.wrapping_add(1);
        // A newer push supersedes any receipt still outstanding
        self.pending = Some(txid);
        Ok(())
    }

    fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }
}
