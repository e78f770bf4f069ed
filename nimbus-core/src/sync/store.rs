//! Sync store implementation
//!
//! The dataset lives in an N-byte buffer as an encoded dictionary. Every
//! change is first written to a scratch buffer of the same size and only
//! then swapped in, so a partially written dictionary is never current.

use nimbus_protocol::{
    DictionaryError, DictionaryReader, DictionaryWriter, Tuple, TupleValue, MAX_PAYLOAD_SIZE,
};

use super::observer::{SyncError, SyncObserver};
use crate::config::SYNC_BUFFER_SIZE;
use crate::traits::{Transport, TransportError};

/// Fixed-capacity key/value store synchronised with the phone
///
/// The key set and each key's value type are fixed by the initial
/// dataset. Tuples for other keys are ignored.
pub struct SyncStore<O, const N: usize = SYNC_BUFFER_SIZE> {
    buffer: [u8; N],
    len: usize,
    scratch: [u8; N],
    observer: O,
}

impl<O: SyncObserver, const N: usize> SyncStore<O, N> {
    /// Encode the initial dataset into the store
    ///
    /// Fails if the dataset does not fit in N bytes. The observer is not
    /// called; use [`announce_initial`](Self::announce_initial) for that.
    pub fn new(initial: &[Tuple<'_>], observer: O) -> Result<Self, SyncError> {
        let mut buffer = [0u8; N];
        let mut writer = DictionaryWriter::new(&mut buffer)?;
        writer.write_all(initial).map_err(|e| {
            error!("Initial dataset does not fit in {} bytes", N);
            e
        })?;
        let len = writer.finish();

        info!(
            "Sync store ready: {} keys, {}/{} bytes",
            initial.len(),
            len,
            N
        );

        Ok(Self {
            buffer,
            len,
            scratch: [0u8; N],
            observer,
        })
    }

    /// Report every stored value to the observer as a change
    ///
    /// Old and new value are the same. Used once at startup so the
    /// observer can show the initial dataset.
    pub fn announce_initial(&mut self) -> Result<(), O::Error> {
        let Ok(reader) = DictionaryReader::new(&self.buffer[..self.len]) else {
            return Ok(());
        };
        for tuple in reader.flatten() {
            self.observer
                .on_changed(tuple.key, &tuple.value, &tuple.value)?;
        }
        Ok(())
    }

    /// Merge a dictionary received from the phone
    ///
    /// Tuples are applied in order. Each tuple whose value differs from
    /// the stored one replaces it and produces one `on_changed` call.
    /// A malformed dictionary is rejected whole; a tuple that would not
    /// fit is rejected alone. Both are reported through `on_error` and
    /// leave the stored value untouched.
    ///
    /// Returns the number of changed keys, or the observer's error, which
    /// stops the remaining tuples from being applied.
    pub fn apply_remote_update(&mut self, dictionary: &[u8]) -> Result<usize, O::Error> {
        if let Err(e) = DictionaryReader::validate(dictionary) {
            warn!("Inbound dictionary rejected: {:?}", e);
            self.observer.on_error(SyncError::Decode(e));
            return Ok(0);
        }
        let Ok(reader) = DictionaryReader::new(dictionary) else {
            return Ok(0);
        };

        let mut changed = 0;
        for tuple in reader.flatten() {
            if self.apply_tuple(&tuple)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn apply_tuple(&mut self, incoming: &Tuple<'_>) -> Result<bool, O::Error> {
        let key = incoming.key;
        let Some(old) = find_value(&self.buffer[..self.len], key) else {
            trace!("Ignoring tuple for unknown key {}", key);
            return Ok(false);
        };

        if !old.same_family(&incoming.value) {
            warn!("Tuple for key {} has the wrong type", key);
            self.observer
                .on_error(SyncError::Decode(DictionaryError::InvalidType));
            return Ok(false);
        }

        if old.same_as(&incoming.value) {
            trace!("Key {} unchanged", key);
            return Ok(false);
        }

        let new_len = match stage(&self.buffer[..self.len], &mut self.scratch, incoming) {
            Ok(len) => len,
            Err(e) => {
                warn!("Update for key {} rejected: {:?}", key, e);
                self.observer.on_error(SyncError::Decode(e));
                return Ok(false);
            }
        };

        // Old dictionary stays in scratch until the observer has seen it
        core::mem::swap(&mut self.buffer, &mut self.scratch);
        let old_len = core::mem::replace(&mut self.len, new_len);
        debug!("Key {} changed, {}/{} bytes used", key, new_len, N);

        if let (Some(new_value), Some(old_value)) = (
            find_value(&self.buffer[..self.len], key),
            find_value(&self.scratch[..old_len], key),
        ) {
            self.observer.on_changed(key, &new_value, &old_value)?;
        }
        Ok(true)
    }

    /// Send a single integer tuple to the phone
    ///
    /// This is how the watch asks for data. Returns true if the transport
    /// accepted the message; failures go to `on_error`.
    pub fn send_request<T: Transport>(
        &mut self,
        transport: &mut T,
        key: impl Into<u32>,
        value: i32,
    ) -> bool {
        let tuple = Tuple::int32(key, value);
        let capacity = transport.outbound_capacity().min(MAX_PAYLOAD_SIZE);
        let mut message = [0u8; MAX_PAYLOAD_SIZE];

        let encoded = DictionaryWriter::new(&mut message[..capacity]).and_then(|mut writer| {
            writer.write(&tuple)?;
            Ok(writer.finish())
        });
        let len = match encoded {
            Ok(len) => len,
            Err(_) => {
                warn!("Request for key {} exceeds {} bytes", tuple.key, capacity);
                self.observer
                    .on_error(SyncError::Transport(TransportError::OutboundOverflow));
                return false;
            }
        };

        match transport.send(&message[..len]) {
            Ok(()) => {
                debug!("Request sent: key {} = {}", tuple.key, value);
                true
            }
            Err(e) => {
                warn!("Request for key {} failed: {:?}", tuple.key, e);
                self.observer.on_error(SyncError::Transport(e));
                false
            }
        }
    }

    /// Report an inbound message the transport had to drop
    pub fn report_receive_error(&mut self, error: TransportError) {
        warn!("Inbound message dropped: {:?}", error);
        self.observer.on_error(SyncError::Transport(error));
    }
}

impl<O, const N: usize> SyncStore<O, N> {
    /// Current value for a key
    pub fn get(&self, key: impl Into<u32>) -> Option<TupleValue<'_>> {
        find_value(self.as_bytes(), key.into())
    }

    /// Current dataset, in storage order
    pub fn tuples(&self) -> impl Iterator<Item = Tuple<'_>> {
        DictionaryReader::new(self.as_bytes())
            .into_iter()
            .flatten()
            .flatten()
    }

    /// Encoded dataset
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Number of keys
    pub fn key_count(&self) -> usize {
        self.buffer[0] as usize
    }

    /// Bytes in use
    pub fn used(&self) -> usize {
        self.len
    }

    /// Buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        N
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}

/// Encode `current` into `scratch` with `incoming` replacing its key
fn stage(current: &[u8], scratch: &mut [u8], incoming: &Tuple<'_>) -> Result<usize, DictionaryError> {
    let mut writer = DictionaryWriter::new(scratch)?;
    for tuple in DictionaryReader::new(current)? {
        let tuple = tuple?;
        if tuple.key == incoming.key {
            writer.write(incoming)?;
        } else {
            writer.write(&tuple)?;
        }
    }
    Ok(writer.finish())
}

fn find_value(data: &[u8], key: u32) -> Option<TupleValue<'_>> {
    DictionaryReader::new(data)
        .ok()?
        .find(key)
        .ok()
        .flatten()
        .map(|tuple| tuple.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::{String, Vec};
    use nimbus_protocol::WeatherKey;
    use proptest::prelude::*;

    const ICON: u32 = 0;
    const TEMPERATURE: u32 = 1;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Owned {
        Int(i64),
        Text(String<32>),
        Bytes,
    }

    impl Owned {
        fn from_value(value: &TupleValue<'_>) -> Self {
            match value {
                TupleValue::CString(text) => Owned::Text(String::try_from(*text).unwrap()),
                TupleValue::Bytes(_) => Owned::Bytes,
                other => Owned::Int(other.as_integer().unwrap()),
            }
        }

        fn text(text: &str) -> Self {
            Owned::Text(String::try_from(text).unwrap())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Change {
        key: u32,
        new: Owned,
        old: Owned,
    }

    #[derive(Default)]
    struct RecordingObserver {
        changes: Vec<Change, 64>,
        errors: Vec<SyncError, 16>,
        fail_on_key: Option<u32>,
    }

    impl SyncObserver for RecordingObserver {
        type Error = u32;

        fn on_changed(
            &mut self,
            key: u32,
            new_value: &TupleValue<'_>,
            old_value: &TupleValue<'_>,
        ) -> Result<(), u32> {
            self.changes
                .push(Change {
                    key,
                    new: Owned::from_value(new_value),
                    old: Owned::from_value(old_value),
                })
                .unwrap();
            if self.fail_on_key == Some(key) {
                return Err(key);
            }
            Ok(())
        }

        fn on_error(&mut self, error: SyncError) {
            self.errors.push(error).unwrap();
        }
    }

    struct MockTransport {
        sent: Vec<Vec<u8, 16>, 4>,
        capacity: usize,
        fail_with: Option<TransportError>,
    }

    impl MockTransport {
        fn new(capacity: usize) -> Self {
            Self {
                sent: Vec::new(),
                capacity,
                fail_with: None,
            }
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, dictionary: &[u8]) -> Result<(), TransportError> {
            if let Some(e) = self.fail_with {
                return Err(e);
            }
            self.sent
                .push(Vec::from_slice(dictionary).unwrap())
                .unwrap();
            Ok(())
        }

        fn outbound_capacity(&self) -> usize {
            self.capacity
        }
    }

    fn encode(tuples: &[Tuple<'_>]) -> Vec<u8, 128> {
        let mut buffer = [0u8; 128];
        let mut writer = DictionaryWriter::new(&mut buffer).unwrap();
        writer.write_all(tuples).unwrap();
        let len = writer.finish();
        Vec::from_slice(&buffer[..len]).unwrap()
    }

    fn weather_store() -> SyncStore<RecordingObserver> {
        let initial = [
            Tuple::uint8(WeatherKey::Icon, 1),
            Tuple::cstring(WeatherKey::Temperature, "-\u{00B0}C"),
        ];
        SyncStore::new(&initial, RecordingObserver::default()).unwrap()
    }

    #[test]
    fn test_initial_dataset_is_stored() {
        let store = weather_store();
        assert_eq!(store.used(), 21);
        assert_eq!(store.capacity(), 32);
        assert_eq!(store.key_count(), 2);
        assert_eq!(store.get(WeatherKey::Icon), Some(TupleValue::Uint8(1)));
        assert_eq!(
            store.get(WeatherKey::Temperature),
            Some(TupleValue::CString("-\u{00B0}C"))
        );
        assert_eq!(store.get(WeatherKey::ForecastRequest), None);
        assert!(store.observer().changes.is_empty());
    }

    #[test]
    fn test_initial_dataset_too_large() {
        let initial = [
            Tuple::uint8(WeatherKey::Icon, 1),
            Tuple::cstring(WeatherKey::Temperature, "a much too long temperature"),
        ];
        let result: Result<SyncStore<RecordingObserver>, _> =
            SyncStore::new(&initial, RecordingObserver::default());
        assert!(matches!(
            result,
            Err(SyncError::Decode(DictionaryError::NotEnoughStorage))
        ));
    }

    #[test]
    fn test_announce_initial() {
        let mut store = weather_store();
        store.announce_initial().unwrap();
        let changes = &store.observer().changes;
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].key, ICON);
        assert_eq!(changes[0].new, Owned::Int(1));
        assert_eq!(changes[0].old, Owned::Int(1));
        assert_eq!(changes[1].key, TEMPERATURE);
        assert_eq!(changes[1].new, Owned::text("-\u{00B0}C"));
    }

    #[test]
    fn test_icon_change_leaves_temperature() {
        let mut store = weather_store();
        let update = encode(&[Tuple::uint8(WeatherKey::Icon, 2)]);

        assert_eq!(store.apply_remote_update(&update), Ok(1));
        assert_eq!(store.get(WeatherKey::Icon), Some(TupleValue::Uint8(2)));
        assert_eq!(
            store.get(WeatherKey::Temperature),
            Some(TupleValue::CString("-\u{00B0}C"))
        );

        let changes = &store.observer().changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            Change {
                key: ICON,
                new: Owned::Int(2),
                old: Owned::Int(1),
            }
        );
    }

    #[test]
    fn test_same_tuple_twice_changes_once() {
        let mut store = weather_store();
        let update = encode(&[Tuple::cstring(WeatherKey::Temperature, "12\u{00B0}C")]);

        assert_eq!(store.apply_remote_update(&update), Ok(1));
        assert_eq!(store.apply_remote_update(&update), Ok(0));
        assert_eq!(store.observer().changes.len(), 1);
        assert!(store.observer().errors.is_empty());
    }

    #[test]
    fn test_integer_width_does_not_matter() {
        let mut store = weather_store();
        let update = encode(&[Tuple::int32(WeatherKey::Icon, 1)]);
        assert_eq!(store.apply_remote_update(&update), Ok(0));
        assert!(store.observer().changes.is_empty());
    }

    #[test]
    fn test_changes_follow_arrival_order() {
        let mut store = weather_store();
        let update = encode(&[
            Tuple::cstring(WeatherKey::Temperature, "3\u{00B0}C"),
            Tuple::uint8(WeatherKey::Icon, 3),
        ]);

        assert_eq!(store.apply_remote_update(&update), Ok(2));
        let keys: Vec<u32, 4> = store.observer().changes.iter().map(|c| c.key).collect();
        assert_eq!(&keys[..], &[TEMPERATURE, ICON]);
    }

    #[test]
    fn test_unknown_key_ignored() {
        let mut store = weather_store();
        let before: Vec<u8, 32> = Vec::from_slice(store.as_bytes()).unwrap();
        let update = encode(&[Tuple::uint8(9u32, 1), Tuple::int32(WeatherKey::ForecastRequest, 1)]);

        assert_eq!(store.apply_remote_update(&update), Ok(0));
        assert_eq!(store.as_bytes(), &before[..]);
        assert!(store.observer().changes.is_empty());
        assert!(store.observer().errors.is_empty());
    }

    #[test]
    fn test_oversized_tuple_reports_error_and_keeps_dataset() {
        let mut store = weather_store();
        let before: Vec<u8, 32> = Vec::from_slice(store.as_bytes()).unwrap();
        // 1 + 8 + 7 + 21 = 37 bytes > 32
        let update = encode(&[Tuple::cstring(
            WeatherKey::Temperature,
            "twenty characters!!!",
        )]);

        assert_eq!(store.apply_remote_update(&update), Ok(0));
        assert_eq!(store.as_bytes(), &before[..]);
        assert!(store.observer().changes.is_empty());
        assert_eq!(
            &store.observer().errors[..],
            &[SyncError::Decode(DictionaryError::NotEnoughStorage)]
        );
    }

    #[test]
    fn test_oversized_tuple_does_not_block_the_rest() {
        let mut store = weather_store();
        let update = encode(&[
            Tuple::cstring(WeatherKey::Temperature, "twenty characters!!!"),
            Tuple::uint8(WeatherKey::Icon, 0),
        ]);

        assert_eq!(store.apply_remote_update(&update), Ok(1));
        assert_eq!(store.get(WeatherKey::Icon), Some(TupleValue::Uint8(0)));
        assert_eq!(store.observer().errors.len(), 1);
    }

    #[test]
    fn test_malformed_dictionary_rejected_whole() {
        let mut store = weather_store();
        let mut update = encode(&[
            Tuple::uint8(WeatherKey::Icon, 2),
            Tuple::cstring(WeatherKey::Temperature, "9\u{00B0}C"),
        ]);
        // Claim a third tuple that is not there
        update[0] = 3;

        assert_eq!(store.apply_remote_update(&update), Ok(0));
        assert_eq!(store.get(WeatherKey::Icon), Some(TupleValue::Uint8(1)));
        assert_eq!(
            &store.observer().errors[..],
            &[SyncError::Decode(DictionaryError::Truncated)]
        );
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut store = weather_store();
        assert_eq!(store.apply_remote_update(&[]), Ok(0));
        assert_eq!(store.observer().errors.len(), 1);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut store = weather_store();
        let update = encode(&[Tuple::cstring(WeatherKey::Icon, "2")]);

        assert_eq!(store.apply_remote_update(&update), Ok(0));
        assert_eq!(store.get(WeatherKey::Icon), Some(TupleValue::Uint8(1)));
        assert_eq!(
            &store.observer().errors[..],
            &[SyncError::Decode(DictionaryError::InvalidType)]
        );
    }

    #[test]
    fn test_observer_error_stops_batch() {
        let mut store = weather_store();
        store.observer_mut().fail_on_key = Some(ICON);
        let update = encode(&[
            Tuple::uint8(WeatherKey::Icon, 2),
            Tuple::cstring(WeatherKey::Temperature, "9\u{00B0}C"),
        ]);

        assert_eq!(store.apply_remote_update(&update), Err(ICON));
        assert_eq!(store.get(WeatherKey::Icon), Some(TupleValue::Uint8(2)));
        assert_eq!(
            store.get(WeatherKey::Temperature),
            Some(TupleValue::CString("-\u{00B0}C"))
        );
    }

    #[test]
    fn test_send_request() {
        let mut store = weather_store();
        let mut transport = MockTransport::new(16);

        assert!(store.send_request(&mut transport, WeatherKey::ForecastRequest, 1));
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(
            &transport.sent[0][..],
            &encode(&[Tuple::int32(WeatherKey::ForecastRequest, 1)])[..]
        );
        assert_eq!(transport.sent[0].len(), 12);
        // Outbound requests do not touch the dataset
        assert_eq!(store.used(), 21);
    }

    #[test]
    fn test_send_request_transport_failure() {
        let mut store = weather_store();
        let mut transport = MockTransport::new(16);
        transport.fail_with = Some(TransportError::NotConnected);

        assert!(!store.send_request(&mut transport, WeatherKey::ForecastRequest, 1));
        assert_eq!(
            &store.observer().errors[..],
            &[SyncError::Transport(TransportError::NotConnected)]
        );
    }

    #[test]
    fn test_send_request_outbound_too_small() {
        let mut store = weather_store();
        let mut transport = MockTransport::new(8);

        assert!(!store.send_request(&mut transport, WeatherKey::ForecastRequest, 1));
        assert!(transport.sent.is_empty());
        assert_eq!(
            &store.observer().errors[..],
            &[SyncError::Transport(TransportError::OutboundOverflow)]
        );
    }

    #[test]
    fn test_report_receive_error() {
        let mut store = weather_store();
        store.report_receive_error(TransportError::InboundOverflow);
        assert_eq!(
            &store.observer().errors[..],
            &[SyncError::Transport(TransportError::InboundOverflow)]
        );
    }

    #[test]
    fn test_tuples_iterates_dataset() {
        let store = weather_store();
        let keys: Vec<u32, 4> = store.tuples().map(|t| t.key).collect();
        assert_eq!(&keys[..], &[ICON, TEMPERATURE]);
    }

    const TEMPERATURES: [&str; 4] = ["-\u{00B0}C", "4\u{00B0}C", "15\u{00B0}C", "-12\u{00B0}C"];

    proptest! {
        #[test]
        fn prop_last_write_wins_one_event_per_change(
            updates in proptest::collection::vec((any::<bool>(), 0u8..4), 1..40)
        ) {
            let mut store = weather_store();
            let mut icon = Owned::Int(1);
            let mut temperature = Owned::text(TEMPERATURES[0]);
            let mut expected_changes = 0usize;

            for (is_icon, value) in updates {
                let tuple = if is_icon {
                    Tuple::uint8(WeatherKey::Icon, value)
                } else {
                    Tuple::cstring(WeatherKey::Temperature, TEMPERATURES[value as usize])
                };
                let new = Owned::from_value(&tuple.value);
                let slot = if is_icon { &mut icon } else { &mut temperature };
                if *slot != new {
                    expected_changes += 1;
                    *slot = new;
                }
                let message = encode(&[tuple]);
                store.observer_mut().changes.clear();
                let changed = store.apply_remote_update(&message).unwrap();
                prop_assert!(changed <= 1);
                prop_assert_eq!(store.observer().changes.len(), changed);
                expected_changes -= changed;
            }

            prop_assert_eq!(expected_changes, 0);
            prop_assert_eq!(Owned::from_value(&store.get(WeatherKey::Icon).unwrap()), icon);
            prop_assert_eq!(
                Owned::from_value(&store.get(WeatherKey::Temperature).unwrap()),
                temperature
            );
            prop_assert!(store.observer().errors.is_empty());
        }

        #[test]
        fn prop_batch_last_write_wins_in_arrival_order(
            batches in proptest::collection::vec(
                proptest::collection::vec((any::<bool>(), 0u8..4), 1..7),
                1..12
            )
        ) {
            let mut store = weather_store();
            let mut icon = Owned::Int(1);
            let mut temperature = Owned::text(TEMPERATURES[0]);

            for batch in batches {
                let mut tuples: Vec<Tuple<'_>, 6> = Vec::new();
                let mut expected: Vec<Change, 6> = Vec::new();
                for (is_icon, value) in batch {
                    let tuple = if is_icon {
                        Tuple::uint8(WeatherKey::Icon, value)
                    } else {
                        Tuple::cstring(WeatherKey::Temperature, TEMPERATURES[value as usize])
                    };
                    let new = Owned::from_value(&tuple.value);
                    let slot = if is_icon { &mut icon } else { &mut temperature };
                    if *slot != new {
                        expected
                            .push(Change { key: tuple.key, new: new.clone(), old: slot.clone() })
                            .unwrap();
                        *slot = new;
                    }
                    tuples.push(tuple).unwrap();
                }

                let message = encode(&tuples);
                store.observer_mut().changes.clear();
                let changed = store.apply_remote_update(&message).unwrap();
                prop_assert_eq!(changed, expected.len());
                prop_assert_eq!(&store.observer().changes[..], &expected[..]);
            }

            prop_assert_eq!(Owned::from_value(&store.get(WeatherKey::Icon).unwrap()), icon);
            prop_assert_eq!(
                Owned::from_value(&store.get(WeatherKey::Temperature).unwrap()),
                temperature
            );
            prop_assert!(store.observer().errors.is_empty());
        }
    }
}
