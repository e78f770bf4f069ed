//! Nimbus phone <-> watch protocol
//!
//! This crate defines the data exchanged between the watch face and the
//! companion app on the phone. The format is fixed by the phone side and
//! must stay bit-compatible with it.
//!
//! # Dictionary Format
//!
//! Every message carries a dictionary of integer keys to typed values:
//! ```text
//! ┌───────┬──────────────────────────────────────────────┐
//! │ COUNT │ TUPLE × COUNT                                │
//! │ 1B    │ KEY 4B LE │ TYPE 1B │ LENGTH 2B LE │ VALUE   │
//! └───────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Link Framing
//!
//! When the dictionary travels over a raw byte stream it is wrapped in a
//! small frame carrying a transaction id for delivery receipts:
//! ```text
//! ┌───────┬────────┬──────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ TXID │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 1B   │ 0–128B      │ 1B       │
//! └───────┴────────┴──────┴──────┴─────────────┴──────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod dictionary;
pub mod frame;
pub mod keys;
pub mod messages;

pub use dictionary::{
    dictionary_size, DictionaryError, DictionaryReader, DictionaryWriter, Tuple, TupleType,
    TupleValue, DICT_HEADER_SIZE, TUPLE_HEADER_SIZE,
};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use keys::WeatherKey;
pub use messages::AppMessage;
