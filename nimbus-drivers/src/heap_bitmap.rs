//! Heap bitmap loader
//!
//! Icons are packed as 1-bit bitmaps in a static resource table. Loading
//! one copies its pixel rows to the heap, within a fixed byte budget.
//!
//! Resource layout (little endian):
//! - row_size_bytes: u16
//! - info_flags: u16
//! - width: u16
//! - height: u16
//! - pixel rows: row_size_bytes * height bytes

use alloc::vec::Vec;

use nimbus_core::traits::{AllocError, ResourceId, ResourceLoader};

/// Heap available for icon bitmaps
pub const BITMAP_BUFFER_BYTES: usize = 1024;

/// Size of the resource header
pub const BITMAP_HEADER_SIZE: usize = 8;

/// Header of a packed bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitmapHeader {
    pub row_size_bytes: u16,
    pub info_flags: u16,
    pub width: u16,
    pub height: u16,
}

impl BitmapHeader {
    /// Parse and check a header
    pub fn parse(data: &[u8]) -> Result<Self, AllocError> {
        if data.len() < BITMAP_HEADER_SIZE {
            return Err(AllocError::InvalidResource);
        }
        let word = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);
        let header = Self {
            row_size_bytes: word(0),
            info_flags: word(2),
            width: word(4),
            height: word(6),
        };

        // One bit per pixel, rows padded to whole bytes
        if header.width == 0
            || header.height == 0
            || (header.row_size_bytes as usize) * 8 < header.width as usize
        {
            return Err(AllocError::InvalidResource);
        }
        Ok(header)
    }

    /// Bytes of pixel data following the header
    pub fn data_len(&self) -> usize {
        self.row_size_bytes as usize * self.height as usize
    }
}

/// A bitmap resident on the heap
#[derive(Debug, PartialEq, Eq)]
pub struct HeapBitmap {
    id: ResourceId,
    header: BitmapHeader,
    data: Vec<u8>,
}

impl HeapBitmap {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn header(&self) -> &BitmapHeader {
        &self.header
    }

    pub fn width(&self) -> u16 {
        self.header.width
    }

    pub fn height(&self) -> u16 {
        self.header.height
    }

    /// Pixel rows
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (x, y), true if set; `None` outside the bitmap
    pub fn pixel(&self, x: u16, y: u16) -> Option<bool> {
        if x >= self.header.width || y >= self.header.height {
            return None;
        }
        let row = y as usize * self.header.row_size_bytes as usize;
        let byte = self.data[row + x as usize / 8];
        Some(byte & (1 << (x % 8)) != 0)
    }
}

/// Loader for bitmaps from a static resource table
///
/// Resource id `n` is `resources[n - 1]`; id 0 is never a resource.
pub struct HeapBitmapLoader {
    resources: &'static [&'static [u8]],
    budget: usize,
    in_use: usize,
    loads: u32,
    releases: u32,
}

impl HeapBitmapLoader {
    /// Create a loader with the default budget
    pub const fn new(resources: &'static [&'static [u8]]) -> Self {
        Self::with_budget(resources, BITMAP_BUFFER_BYTES)
    }

    pub const fn with_budget(resources: &'static [&'static [u8]], budget: usize) -> Self {
        Self {
            resources,
            budget,
            in_use: 0,
            loads: 0,
            releases: 0,
        }
    }

    /// Heap bytes currently held by loaded bitmaps
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Successful loads so far
    pub fn loads(&self) -> u32 {
        self.loads
    }

    /// Releases so far
    pub fn releases(&self) -> u32 {
        self.releases
    }

    fn resource(&self, id: ResourceId) -> Result<&'static [u8], AllocError> {
        let index = (id.get() as usize)
            .checked_sub(1)
            .ok_or(AllocError::UnknownResource)?;
        self.resources
            .get(index)
            .copied()
            .ok_or(AllocError::UnknownResource)
    }
}

impl ResourceLoader for HeapBitmapLoader {
    type Bitmap = HeapBitmap;

    fn load(&mut self, id: ResourceId) -> Result<HeapBitmap, AllocError> {
        let resource = self.resource(id)?;
        let header = BitmapHeader::parse(resource)?;
        let size = header.data_len();
        let pixels = resource
            .get(BITMAP_HEADER_SIZE..BITMAP_HEADER_SIZE + size)
            .ok_or(AllocError::InvalidResource)?;

        if self.in_use + size > self.budget {
            return Err(AllocError::OutOfMemory);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| AllocError::OutOfMemory)?;
        data.extend_from_slice(pixels);

        self.in_use += size;
        self.loads += 1;
        Ok(HeapBitmap { id, header, data })
    }

    fn release(&mut self, bitmap: HeapBitmap) {
        self.in_use = self.in_use.saturating_sub(bitmap.data.len());
        self.releases += 1;
    }
}

/// Build a packed bitmap with every row byte set to `fill`
///
/// `L` must be `BITMAP_HEADER_SIZE + ceil(width / 8) * height`.
pub const fn solid_bitmap<const L: usize>(width: u16, height: u16, fill: u8) -> [u8; L] {
    let mut out = [fill; L];
    let row_size = width.div_ceil(8).to_le_bytes();
    let width = width.to_le_bytes();
    let height = height.to_le_bytes();
    out[0] = row_size[0];
    out[1] = row_size[1];
    out[2] = 0;
    out[3] = 0;
    out[4] = width[0];
    out[5] = width[1];
    out[6] = height[0];
    out[7] = height[1];
    out
}
