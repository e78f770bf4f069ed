//! Change observer

use nimbus_protocol::{DictionaryError, TupleValue};

use crate::traits::TransportError;

/// Recoverable synchronisation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// Inbound dictionary malformed, or a tuple does not fit the store
    Decode(DictionaryError),
    /// Message channel failed
    Transport(TransportError),
}

impl From<DictionaryError> for SyncError {
    fn from(e: DictionaryError) -> Self {
        SyncError::Decode(e)
    }
}

impl From<TransportError> for SyncError {
    fn from(e: TransportError) -> Self {
        SyncError::Transport(e)
    }
}

/// Receiver of sync store notifications
///
/// A store has exactly one observer, given at construction.
pub trait SyncObserver {
    /// Error that aborts the current update
    type Error;

    /// A stored value changed
    ///
    /// Called once per changed key, in the order the tuples arrived.
    /// Returning an error stops processing of the remaining tuples.
    fn on_changed(
        &mut self,
        key: u32,
        new_value: &TupleValue<'_>,
        old_value: &TupleValue<'_>,
    ) -> Result<(), Self::Error>;

    /// An update or a send failed; the stored dataset is unchanged
    fn on_error(&mut self, error: SyncError);
}
