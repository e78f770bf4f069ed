//! Message transport to the phone

/// Errors raised by the message channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Outgoing dictionary larger than the outbound buffer
    OutboundOverflow,
    /// Incoming dictionary larger than the inbound buffer
    InboundOverflow,
    /// Incoming frame was corrupted on the wire
    Corrupted,
    /// No phone connected
    NotConnected,
    /// Phone refused the message
    Nacked,
    /// Underlying byte stream failed
    Io,
}

/// Trait for the outbound half of the phone link
///
/// Inbound dictionaries are not pulled through this trait; whoever owns
/// the link hands them to the watch face as they arrive.
pub trait Transport {
    /// Queue an encoded dictionary for delivery
    ///
    /// Must not block for longer than it takes to hand the bytes to the
    /// link. Delivery failures that happen later are reported separately.
    fn send(&mut self, dictionary: &[u8]) -> Result<(), TransportError>;

    /// Largest dictionary `send` accepts, in bytes
    fn outbound_capacity(&self) -> usize;
}
