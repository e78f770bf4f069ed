//! Icon resource manager
//!
//! Two states: `Empty` (nothing loaded, id 0) and `Loaded(id)`.
//! Swapping icons always frees the old bitmap before the new one is
//! allocated, so at most one icon is resident at any time.

use crate::traits::{AllocError, ResourceId, ResourceLoader};

use super::table::icon_name;

/// Observable state of the icon slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IconState {
    /// No bitmap resident
    Empty,
    /// Bitmap for this resource is resident
    Loaded(ResourceId),
}

enum Slot<B> {
    Empty,
    Loaded { id: ResourceId, bitmap: B },
}

/// Owner of the single resident icon bitmap
pub struct IconResourceManager<L: ResourceLoader> {
    loader: L,
    slot: Slot<L::Bitmap>,
}

impl<L: ResourceLoader> IconResourceManager<L> {
    /// Create a manager with nothing loaded
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            slot: Slot::Empty,
        }
    }

    /// Current state
    pub fn state(&self) -> IconState {
        match self.slot {
            Slot::Empty => IconState::Empty,
            Slot::Loaded { id, .. } => IconState::Loaded(id),
        }
    }

    /// Id of the resident icon, `ResourceId::NONE` if empty
    pub fn current_id(&self) -> ResourceId {
        match self.slot {
            Slot::Empty => ResourceId::NONE,
            Slot::Loaded { id, .. } => id,
        }
    }

    /// Bitmap of the resident icon, for the display
    pub fn current_bitmap(&self) -> Option<&L::Bitmap> {
        match &self.slot {
            Slot::Empty => None,
            Slot::Loaded { bitmap, .. } => Some(bitmap),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.slot, Slot::Loaded { .. })
    }

    /// Show a different icon
    ///
    /// Returns `Ok(false)` if `id` is already resident (no work done).
    /// `ResourceId::NONE` releases the current icon. On allocation
    /// failure the manager is left `Empty` and the error is returned;
    /// the old bitmap has already been freed at that point.
    pub fn set_icon(&mut self, id: ResourceId) -> Result<bool, AllocError> {
        if id == self.current_id() {
            return Ok(false);
        }

        self.clear();
        if id.is_none() {
            return Ok(true);
        }

        let bitmap = self.loader.load(id).map_err(|e| {
            error!("Failed to load icon {} ({}): {:?}", id.get(), icon_name(id), e);
            e
        })?;
        debug!("Icon loaded: {} ({})", id.get(), icon_name(id));
        self.slot = Slot::Loaded { id, bitmap };
        Ok(true)
    }

    /// Release the resident icon, if any
    pub fn clear(&mut self) {
        if let Slot::Loaded { id, bitmap } = core::mem::replace(&mut self.slot, Slot::Empty) {
            trace!("Icon released: {}", id.get());
            self.loader.release(bitmap);
        }
    }

    /// Access the loader (for instrumentation)
    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}

impl<L: ResourceLoader> Drop for IconResourceManager<L> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::table::*;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum LoaderEvent {
        Load(ResourceId),
        Release(ResourceId),
    }

    /// Loader that records every call and tracks residency
    #[derive(Default)]
    struct CountingLoader {
        events: Vec<LoaderEvent, 32>,
        resident: u32,
        max_resident: u32,
        fail_next: Option<AllocError>,
    }

    impl CountingLoader {
        fn loads(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, LoaderEvent::Load(_)))
                .count()
        }

        fn releases(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, LoaderEvent::Release(_)))
                .count()
        }
    }

    impl ResourceLoader for CountingLoader {
        type Bitmap = ResourceId;

        fn load(&mut self, id: ResourceId) -> Result<ResourceId, AllocError> {
            if let Some(e) = self.fail_next.take() {
                return Err(e);
            }
            self.events.push(LoaderEvent::Load(id)).unwrap();
            self.resident += 1;
            self.max_resident = self.max_resident.max(self.resident);
            Ok(id)
        }

        fn release(&mut self, bitmap: ResourceId) {
            self.events.push(LoaderEvent::Release(bitmap)).unwrap();
            self.resident -= 1;
        }
    }

    #[test]
    fn test_empty_to_loaded() {
        let mut icons = IconResourceManager::new(CountingLoader::default());
        assert_eq!(icons.state(), IconState::Empty);
        assert!(icons.current_bitmap().is_none());

        assert_eq!(icons.set_icon(RESOURCE_ID_IMAGE_SUN), Ok(true));
        assert_eq!(icons.state(), IconState::Loaded(RESOURCE_ID_IMAGE_SUN));
        assert_eq!(icons.current_bitmap(), Some(&RESOURCE_ID_IMAGE_SUN));
        assert_eq!(icons.loader().loads(), 1);
        assert_eq!(icons.loader().releases(), 0);
    }

    #[test]
    fn test_same_icon_is_noop() {
        let mut icons = IconResourceManager::new(CountingLoader::default());
        icons.set_icon(RESOURCE_ID_IMAGE_CLOUD).unwrap();
        assert_eq!(icons.set_icon(RESOURCE_ID_IMAGE_CLOUD), Ok(false));
        assert_eq!(icons.set_icon(RESOURCE_ID_IMAGE_CLOUD), Ok(false));

        assert_eq!(icons.loader().loads(), 1);
        assert_eq!(icons.loader().releases(), 0);
    }

    #[test]
    fn test_switch_frees_before_allocating() {
        let mut icons = IconResourceManager::new(CountingLoader::default());
        // 1 -> 2 -> 3 -> 1
        for id in [
            RESOURCE_ID_IMAGE_SUN,
            RESOURCE_ID_IMAGE_CLOUD,
            RESOURCE_ID_IMAGE_RAIN,
            RESOURCE_ID_IMAGE_SUN,
        ] {
            icons.set_icon(id).unwrap();
        }

        let loader = icons.loader();
        assert_eq!(loader.loads(), 4);
        assert_eq!(loader.releases(), 3);
        assert_eq!(loader.max_resident, 1);
        assert_eq!(loader.resident, 1);
        assert_eq!(
            &loader.events[..],
            &[
                LoaderEvent::Load(RESOURCE_ID_IMAGE_SUN),
                LoaderEvent::Release(RESOURCE_ID_IMAGE_SUN),
                LoaderEvent::Load(RESOURCE_ID_IMAGE_CLOUD),
                LoaderEvent::Release(RESOURCE_ID_IMAGE_CLOUD),
                LoaderEvent::Load(RESOURCE_ID_IMAGE_RAIN),
                LoaderEvent::Release(RESOURCE_ID_IMAGE_RAIN),
                LoaderEvent::Load(RESOURCE_ID_IMAGE_SUN),
            ]
        );
    }

    #[test]
    fn test_allocation_failure_leaves_empty() {
        let mut icons = IconResourceManager::new(CountingLoader::default());
        icons.set_icon(RESOURCE_ID_IMAGE_SUN).unwrap();

        icons.loader.fail_next = Some(AllocError::OutOfMemory);
        assert_eq!(
            icons.set_icon(RESOURCE_ID_IMAGE_SNOW),
            Err(AllocError::OutOfMemory)
        );
        assert_eq!(icons.state(), IconState::Empty);
        assert_eq!(icons.loader().resident, 0);
        assert_eq!(icons.loader().releases(), 1);
    }

    #[test]
    fn test_none_releases() {
        let mut icons = IconResourceManager::new(CountingLoader::default());
        icons.set_icon(RESOURCE_ID_IMAGE_RAIN).unwrap();
        assert_eq!(icons.set_icon(ResourceId::NONE), Ok(true));
        assert_eq!(icons.state(), IconState::Empty);
        assert_eq!(icons.loader().resident, 0);

        // Already empty
        assert_eq!(icons.set_icon(ResourceId::NONE), Ok(false));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut icons = IconResourceManager::new(CountingLoader::default());
        icons.set_icon(RESOURCE_ID_IMAGE_SUN).unwrap();
        icons.clear();
        icons.clear();
        assert_eq!(icons.loader().releases(), 1);
        assert_eq!(icons.current_id(), ResourceId::NONE);
    }
}
