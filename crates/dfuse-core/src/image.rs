//! Source images and flash-region extraction
//!
//! A [`SourceImage`] is anything that can hand out the bytes at an address
//! range, with a well-defined fill value for addresses it does not cover.
//! [`extract_regions`] cuts one [`ImageSegment`] per [`FlashRegion`] out of
//! such an image. Every segment is exactly as long as its region: data past
//! the end of the image is replaced by the fill value.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::device::FlashRegion;
use crate::error::{Error, Result};

/// Default fill value: erased NOR flash reads back as 0xFF
pub const ERASED_FILL: u8 = 0xFF;

/// Read access to a firmware image
pub trait SourceImage {
    /// Highest address holding data (inclusive), `None` for an empty image
    fn max_address(&self) -> Option<u32>;

    /// Value reported for addresses the image does not cover
    fn fill_value(&self) -> u8 {
        ERASED_FILL
    }

    /// Return exactly `length` bytes starting at `base_address`
    fn extract(&self, base_address: u32, length: u32) -> Vec<u8>;
}

/// Bytes cut from a source image for one flash region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSegment {
    /// Address of the first byte
    pub start_address: u32,
    /// Segment contents, always the declared size of the region
    pub data: Vec<u8>,
}

impl ImageSegment {
    /// Length of the segment in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the segment is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Extract a single flash region from an image
///
/// Reads at most `min(max_address + 1 - base, declared_size)` bytes from the
/// image and pads the rest with the image's fill value.
pub fn extract_region<I: SourceImage + ?Sized>(
    image: &I,
    region: &FlashRegion,
) -> Result<ImageSegment> {
    let max_address = image.max_address().ok_or(Error::EmptyImage)?;
    if region.base_address > max_address {
        return Err(Error::RegionOutOfRange {
            base: region.base_address,
            max_address,
        });
    }

    let extent = u64::from(max_address) + 1 - u64::from(region.base_address);
    // Bounded by declared_size, so it always fits in u32
    let available = extent.min(u64::from(region.declared_size)) as u32;

    log::info!(
        "Writing data from start=0x{:08X} size={}",
        region.base_address,
        available
    );

    let mut data = image.extract(region.base_address, available);
    if data.len() != region.declared_size as usize {
        log::debug!(
            "Padding region 0x{:08X} from {} to {} bytes with 0x{:02X}",
            region.base_address,
            data.len(),
            region.declared_size,
            image.fill_value()
        );
        data.resize(region.declared_size as usize, image.fill_value());
    }

    Ok(ImageSegment {
        start_address: region.base_address,
        data,
    })
}

/// Extract every region of a flash table, in table order
pub fn extract_regions<I: SourceImage + ?Sized>(
    image: &I,
    regions: &[FlashRegion],
) -> Result<Vec<ImageSegment>> {
    regions
        .iter()
        .map(|region| extract_region(image, region))
        .collect()
}

/// In-memory image made of non-overlapping, address-keyed chunks
///
/// This is what an Intel HEX file decodes to: data at arbitrary addresses
/// with gaps in between. Gaps read back as the fill value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseImage {
    fill: u8,
    chunks: BTreeMap<u32, Vec<u8>>,
}

impl SparseImage {
    /// Create an empty image with the given fill value
    pub fn new(fill: u8) -> Self {
        Self {
            fill,
            chunks: BTreeMap::new(),
        }
    }

    /// Create an image holding one contiguous block of data
    pub fn from_bytes(base: u32, data: &[u8], fill: u8) -> Result<Self> {
        let mut image = Self::new(fill);
        image.insert(base, data)?;
        Ok(image)
    }

    /// Place `data` at `address`
    ///
    /// Fails if any byte is already present or the data runs past 4 GiB.
    /// Chunks that touch are merged.
    pub fn insert(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = u64::from(address) + data.len() as u64;
        if end > u64::from(u32::MAX) + 1 {
            return Err(Error::AddressOverflow { address });
        }

        // Chunks never overlap, so only the last one starting before `end`
        // can intersect the new data.
        if let Some((&start, bytes)) = self.chunks.range(..=end_key(end)).next_back() {
            let chunk_end = u64::from(start) + bytes.len() as u64;
            if u64::from(start) < end && chunk_end > u64::from(address) {
                return Err(Error::OverlappingData { address });
            }
        }

        let mut merged = data.to_vec();
        let mut base = address;

        if let Some((&start, bytes)) = self.chunks.range_mut(..address).next_back() {
            if u64::from(start) + bytes.len() as u64 == u64::from(address) {
                bytes.append(&mut merged);
                base = start;
            }
        }

        if end <= u64::from(u32::MAX) {
            if let Some(mut next) = self.chunks.remove(&(end as u32)) {
                match self.chunks.get_mut(&base) {
                    Some(bytes) if base != address => bytes.append(&mut next),
                    _ => merged.append(&mut next),
                }
            }
        }

        if base == address {
            self.chunks.insert(address, merged);
        }
        Ok(())
    }

    /// Iterate over the contiguous chunks as `(address, bytes)`
    pub fn chunks(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.chunks.iter().map(|(&a, d)| (a, d.as_slice()))
    }

    /// Number of bytes actually present in the image
    pub fn data_len(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    /// Check if the image holds no data
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Default for SparseImage {
    fn default() -> Self {
        Self::new(ERASED_FILL)
    }
}

/// Largest map key strictly below an exclusive 33-bit end address
fn end_key(end: u64) -> u32 {
    (end - 1) as u32
}

impl SourceImage for SparseImage {
    fn max_address(&self) -> Option<u32> {
        self.chunks
            .iter()
            .next_back()
            .map(|(&start, bytes)| start + (bytes.len() as u32 - 1))
    }

    fn fill_value(&self) -> u8 {
        self.fill
    }

    fn extract(&self, base_address: u32, length: u32) -> Vec<u8> {
        let mut out = vec![self.fill; length as usize];
        if length == 0 {
            return out;
        }

        let base = u64::from(base_address);
        let end = base + u64::from(length);

        // Start at the chunk that may straddle base_address
        let first = self
            .chunks
            .range(..=base_address)
            .next_back()
            .map(|(&start, _)| start)
            .unwrap_or(base_address);

        for (&start, bytes) in self.chunks.range(first..) {
            let chunk_start = u64::from(start);
            if chunk_start >= end {
                break;
            }
            let chunk_end = chunk_start + bytes.len() as u64;
            let lo = chunk_start.max(base);
            let hi = chunk_end.min(end);
            if lo >= hi {
                continue;
            }
            let src = &bytes[(lo - chunk_start) as usize..(hi - chunk_start) as usize];
            out[(lo - base) as usize..(hi - base) as usize].copy_from_slice(src);
        }

        out
    }
}
