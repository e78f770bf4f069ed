//! Key/value synchronisation with the phone
//!
//! The sync store holds the authoritative weather dataset as an encoded
//! dictionary in a fixed buffer, merges dictionaries pushed by the phone
//! and tells its observer about every value that actually changed.

pub mod observer;
pub mod store;

pub use observer::{SyncError, SyncObserver};
pub use store::SyncStore;
