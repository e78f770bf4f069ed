//! Bitmap resources

/// Identifier of a packed resource
///
/// Id 0 never names a real resource and doubles as "nothing loaded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// The "nothing loaded" sentinel
    pub const NONE: ResourceId = ResourceId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Errors that can occur while loading a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllocError {
    /// Not enough memory for the decoded bitmap
    OutOfMemory,
    /// No resource with this id
    UnknownResource,
    /// Resource data is malformed
    InvalidResource,
}

/// Trait for loading and releasing bitmaps
///
/// `release` consumes the handle, so a bitmap cannot be used after it
/// has been freed.
pub trait ResourceLoader {
    /// Decoded bitmap handle
    type Bitmap;

    /// Allocate and decode a resource
    fn load(&mut self, id: ResourceId) -> Result<Self::Bitmap, AllocError>;

    /// Free a bitmap returned by `load`
    fn release(&mut self, bitmap: Self::Bitmap);
}
