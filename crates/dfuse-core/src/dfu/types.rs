//! Container tree
//!
//! The in-memory form of a DfuSe file. Sizes are never stored: they are
//! derived from the tree whenever needed, so headers cannot drift from the
//! data they describe.

use alloc::string::String;
use alloc::vec::Vec;

use super::format::{ELEMENT_HEADER_SIZE, PREFIX_SIZE, SUFFIX_SIZE, TARGET_PREFIX_SIZE};
use crate::device::DeviceIdentity;
use crate::image::ImageSegment;

/// One contiguous block of data at a load address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Load address of the first byte
    pub address: u32,
    /// Element contents
    pub data: Vec<u8>,
}

impl Element {
    /// Create a new element
    pub fn new(address: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            data: data.into(),
        }
    }

    /// Encoded size: header plus data
    pub fn encoded_len(&self) -> u64 {
        ELEMENT_HEADER_SIZE as u64 + self.data.len() as u64
    }
}

impl From<ImageSegment> for Element {
    fn from(segment: ImageSegment) -> Self {
        Self {
            address: segment.start_address,
            data: segment.data,
        }
    }
}

/// One USB alternate setting and the elements flashed through it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Alternate setting index
    pub alt_setting: u8,
    /// Optional target name, at most 254 bytes
    pub name: Option<String>,
    /// Elements in emission order
    pub elements: Vec<Element>,
}

impl Target {
    /// Create a target without elements
    pub fn new(alt_setting: u8, name: Option<String>) -> Self {
        Self {
            alt_setting,
            name,
            elements: Vec::new(),
        }
    }

    /// Append an element
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Size of the element table, excluding the target prefix
    pub fn payload_size(&self) -> u64 {
        self.elements.iter().map(Element::encoded_len).sum()
    }

    /// Encoded size: target prefix plus element table
    pub fn encoded_len(&self) -> u64 {
        TARGET_PREFIX_SIZE as u64 + self.payload_size()
    }
}

/// Root of a DfuSe container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfuFile {
    /// Targets in emission order
    pub targets: Vec<Target>,
    /// Identity written into the suffix
    pub identity: DeviceIdentity,
}

impl DfuFile {
    /// Create a file without targets
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            targets: Vec::new(),
            identity,
        }
    }

    /// Append a target
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Total encoded size, prefix through suffix
    pub fn encoded_len(&self) -> u64 {
        let targets: u64 = self.targets.iter().map(Target::encoded_len).sum();
        PREFIX_SIZE as u64 + targets + SUFFIX_SIZE as u64
    }

    /// Number of elements across all targets
    pub fn element_count(&self) -> usize {
        self.targets.iter().map(|t| t.elements.len()).sum()
    }
}
