//! Frame encoding and decoding for the phone link.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): TXID + payload length (1-129)
//! - TYPE (1 byte): message type identifier
//! - TXID (1 byte): transaction id, echoed by ack/nack
//! - PAYLOAD (0-128 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, TXID and all PAYLOAD bytes

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 128;

/// Maximum complete frame size (START + LENGTH + TYPE + TXID + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Framing overhead around the payload
pub const FRAME_OVERHEAD: usize = MAX_FRAME_SIZE - MAX_PAYLOAD_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// Invalid frame structure
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Transaction id
    pub txid: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message type, transaction id and payload
    pub fn new(msg_type: u8, txid: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            msg_type,
            txid,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8, txid: u8) -> Self {
        Self {
            msg_type,
            txid,
            payload: Vec::new(),
        }
    }

    /// Encoded size of this frame
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    fn calculate_checksum(length: u8, msg_type: u8, txid: u8, payload: &[u8]) -> u8 {
        payload
            .iter()
            .fold(length ^ msg_type ^ txid, |checksum, &byte| checksum ^ byte)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = (self.payload.len() + 1) as u8;
        let checksum = Self::calculate_checksum(length, self.msg_type, self.txid, &self.payload);

        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.msg_type;
        buffer[3] = self.txid;
        buffer[4..4 + self.payload.len()].copy_from_slice(&self.payload);
        buffer[4 + self.payload.len()] = checksum;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    msg_type: u8,
    txid: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, waiting for LENGTH
    WaitingForLength,
    /// Got LENGTH, waiting for TYPE
    WaitingForType,
    /// Got TYPE, waiting for TXID
    WaitingForTxid,
    /// Reading payload bytes
    ReadingPayload,
    /// Waiting for CHECKSUM
    WaitingForChecksum,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            expected_length: 0,
            msg_type: 0,
            txid: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.expected_length = 0;
        self.msg_type = 0;
        self.txid = 0;
    }

    /// Check whether a frame is partially received
    pub fn in_frame(&self) -> bool {
        self.state != ParseState::WaitingForStart
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.state = ParseState::WaitingForLength;
                }
                // Silently ignore non-START bytes while waiting
                Ok(None)
            }
            ParseState::WaitingForLength => {
                // LENGTH always covers at least the TXID
                if byte == 0 || byte as usize > MAX_PAYLOAD_SIZE + 1 {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.expected_length = byte - 1;
                self.state = ParseState::WaitingForType;
                Ok(None)
            }
            ParseState::WaitingForType => {
                self.msg_type = byte;
                self.state = ParseState::WaitingForTxid;
                Ok(None)
            }
            ParseState::WaitingForTxid => {
                self.txid = byte;
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForChecksum
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let expected_checksum = Frame::calculate_checksum(
                    self.expected_length + 1,
                    self.msg_type,
                    self.txid,
                    &self.buffer,
                );

                if byte != expected_checksum {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    msg_type: self.msg_type,
                    txid: self.txid,
                    payload: self.buffer.clone(),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found along with the number of
    /// bytes consumed. Bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<(Option<Frame>, usize), FrameError> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = self.feed(byte)? {
                return Ok((Some(frame), i + 1));
            }
        }
        Ok((None, bytes.len()))
    }
}
