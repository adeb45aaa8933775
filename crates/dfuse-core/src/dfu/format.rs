//! On-disk DfuSe structures
//!
//! Fixed-size headers laid out byte for byte as they appear in the file.
//! All multi-byte fields are little-endian.

use core::mem::size_of;

use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Prefix signature
pub const PREFIX_SIGNATURE: &[u8; 5] = b"DfuSe";
/// DfuSe format version written in the prefix
pub const FORMAT_VERSION: u8 = 1;
/// Target prefix signature
pub const TARGET_SIGNATURE: &[u8; 6] = b"Target";
/// Suffix signature ("DFU" reversed)
pub const SUFFIX_SIGNATURE: &[u8; 3] = b"UFD";
/// bcdDFU value identifying the DfuSe extension
pub const BCD_DFU_DFUSE: u16 = 0x011A;

/// Size of the file prefix
pub const PREFIX_SIZE: usize = 11;
/// Size of each target prefix
pub const TARGET_PREFIX_SIZE: usize = 274;
/// Size of each element header (address + size)
pub const ELEMENT_HEADER_SIZE: usize = 8;
/// Size of the DFU suffix, CRC included
pub const SUFFIX_SIZE: usize = 16;
/// Offset of the CRC within the suffix
pub const SUFFIX_CRC_OFFSET: usize = 12;

/// Width of the target name field
pub const TARGET_NAME_FIELD_LEN: usize = 255;
/// Longest name that still leaves room for the terminator
pub const MAX_TARGET_NAME_LEN: usize = TARGET_NAME_FIELD_LEN - 1;

/// File prefix
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DfuPrefix {
    /// "DfuSe"
    pub signature: [u8; 5],
    /// Format version, always 1
    pub version: u8,
    /// Total file length
    pub image_size: U32,
    /// Number of targets that follow
    pub target_count: u8,
}

/// Target prefix
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TargetPrefix {
    /// "Target"
    pub signature: [u8; 6],
    /// USB alternate setting
    pub alt_setting: u8,
    /// Non-zero if `name` is meaningful
    pub named: U32,
    /// Null-padded target name
    pub name: [u8; TARGET_NAME_FIELD_LEN],
    /// Size of the element table following this prefix
    pub target_size: U32,
    /// Number of elements
    pub element_count: U32,
}

/// Element header, followed by `size` bytes of data
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ElementHeader {
    /// Load address
    pub address: U32,
    /// Data length
    pub size: U32,
}

/// Standard DFU 1.1 suffix
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DfuSuffix {
    /// Firmware release number
    pub bcd_device: U16,
    /// USB product ID
    pub product_id: U16,
    /// USB vendor ID
    pub vendor_id: U16,
    /// DFU specification release, 0x011A for DfuSe
    pub bcd_dfu: U16,
    /// "UFD"
    pub signature: [u8; 3],
    /// Suffix length, always 16
    pub length: u8,
    /// CRC over everything before this field
    pub crc: U32,
}

const _: () = assert!(size_of::<DfuPrefix>() == PREFIX_SIZE);
const _: () = assert!(size_of::<TargetPrefix>() == TARGET_PREFIX_SIZE);
const _: () = assert!(size_of::<ElementHeader>() == ELEMENT_HEADER_SIZE);
const _: () = assert!(size_of::<DfuSuffix>() == SUFFIX_SIZE);
