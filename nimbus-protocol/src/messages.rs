//! Link message types
//!
//! Both ends speak the same three messages:
//! - Push: a dictionary for the other side
//! - Ack: the push with this transaction id was accepted
//! - Nack: the push with this transaction id was refused
//!
//! Ack and nack are delivery receipts only. A forecast request and the
//! weather push that eventually answers it are not linked by any id.

use crate::dictionary::{DictionaryError, DictionaryReader};
use crate::frame::{Frame, FrameError};

// Message type IDs
pub const MSG_PUSH: u8 = 0x01;
pub const MSG_NACK: u8 = 0x7F;
pub const MSG_ACK: u8 = 0xFF;

/// A message exchanged over the phone link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppMessage<'a> {
    /// Dictionary delivered to the other side
    Push { txid: u8, dictionary: &'a [u8] },
    /// Push accepted
    Ack { txid: u8 },
    /// Push refused
    Nack { txid: u8 },
}

impl<'a> AppMessage<'a> {
    /// Transaction id of this message
    pub fn txid(&self) -> u8 {
        match *self {
            AppMessage::Push { txid, .. } | AppMessage::Ack { txid } | AppMessage::Nack { txid } => {
                txid
            }
        }
    }

    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match *self {
            AppMessage::Push { txid, dictionary } => Frame::new(MSG_PUSH, txid, dictionary),
            AppMessage::Ack { txid } => Ok(Frame::empty(MSG_ACK, txid)),
            AppMessage::Nack { txid } => Ok(Frame::empty(MSG_NACK, txid)),
        }
    }

    /// Parse a message from a frame
    ///
    /// The dictionary of a push is borrowed from the frame, not decoded.
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_PUSH => {
                if frame.payload.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(AppMessage::Push {
                    txid: frame.txid,
                    dictionary: &frame.payload,
                })
            }
            MSG_ACK => Ok(AppMessage::Ack { txid: frame.txid }),
            MSG_NACK => Ok(AppMessage::Nack { txid: frame.txid }),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Decode the dictionary carried by a push
    pub fn dictionary(&self) -> Option<Result<DictionaryReader<'a>, DictionaryError>> {
        match *self {
            AppMessage::Push { dictionary, .. } => Some(DictionaryReader::new(dictionary)),
            _ => None,
        }
    }
}
