//! Error types for dfuse-core
//!
//! All errors are deterministic functions of the input: nothing here is
//! transient, so nothing is ever retried.

use core::fmt;

/// Errors raised while extracting regions or building a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Extraction errors
    /// A flash region starts past the last address the source image covers
    RegionOutOfRange {
        /// Base address of the offending region
        base: u32,
        /// Highest address holding data in the source image
        max_address: u32,
    },
    /// The source image holds no data at all
    EmptyImage,

    // Image construction errors
    /// Data was inserted on top of bytes already present in the image
    OverlappingData {
        /// First address of the rejected data
        address: u32,
    },
    /// Data would extend past the end of the 32-bit address space
    AddressOverflow {
        /// First address of the rejected data
        address: u32,
    },

    // Serializer errors
    /// A target name does not fit the 255-byte name field with its terminator
    NameTooLong {
        /// Length of the name in bytes
        len: usize,
    },
    /// More targets than the one-byte target count can express
    TooManyTargets {
        /// Number of targets in the file
        count: usize,
    },
    /// A length field would overflow its 32-bit slot
    ImageTooLarge,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionOutOfRange { base, max_address } => write!(
                f,
                "flash region at 0x{:08X} lies beyond the image (last address 0x{:08X})",
                base, max_address
            ),
            Self::EmptyImage => write!(f, "source image contains no data"),
            Self::OverlappingData { address } => {
                write!(f, "overlapping data at address 0x{:08X}", address)
            }
            Self::AddressOverflow { address } => write!(
                f,
                "data at 0x{:08X} extends past the 32-bit address space",
                address
            ),
            Self::NameTooLong { len } => write!(
                f,
                "target name is {} bytes, at most {} allowed",
                len,
                crate::dfu::MAX_TARGET_NAME_LEN
            ),
            Self::TooManyTargets { count } => {
                write!(f, "{} targets exceed the limit of 255", count)
            }
            Self::ImageTooLarge => write!(f, "container exceeds 4 GiB"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while decoding an existing DfuSe container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended before a complete structure could be read
    Truncated,
    /// File does not start with "DfuSe"
    BadPrefixSignature,
    /// Prefix carries a format version other than 1
    UnsupportedFormatVersion(u8),
    /// A target prefix does not start with "Target"
    BadTargetSignature {
        /// Index of the target within the file
        index: usize,
    },
    /// Suffix signature or suffix length is wrong
    BadSuffix,
    /// Suffix bcdDFU is not the DfuSe version
    UnsupportedDfuVersion(u16),
    /// Stored CRC does not match the file contents
    CrcMismatch {
        /// CRC stored in the suffix
        stored: u32,
        /// CRC computed over the file
        computed: u32,
    },
    /// Prefix image size disagrees with the file length
    SizeMismatch {
        /// Size declared in the prefix
        declared: u32,
        /// Actual file length
        actual: usize,
    },
    /// A target's elements do not add up to its declared payload size
    TargetSizeMismatch {
        /// Index of the target within the file
        index: usize,
    },
    /// Bytes remain between the last target and the suffix
    TrailingData,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "file is truncated"),
            Self::BadPrefixSignature => write!(f, "missing DfuSe signature"),
            Self::UnsupportedFormatVersion(v) => {
                write!(f, "unsupported DfuSe format version {}", v)
            }
            Self::BadTargetSignature { index } => {
                write!(f, "target {} has an invalid signature", index)
            }
            Self::BadSuffix => write!(f, "invalid DFU suffix"),
            Self::UnsupportedDfuVersion(v) => write!(f, "unsupported bcdDFU 0x{:04X}", v),
            Self::CrcMismatch { stored, computed } => write!(
                f,
                "CRC mismatch: stored 0x{:08X}, computed 0x{:08X}",
                stored, computed
            ),
            Self::SizeMismatch { declared, actual } => write!(
                f,
                "image size mismatch: prefix says {} bytes, file has {}",
                declared, actual
            ),
            Self::TargetSizeMismatch { index } => {
                write!(f, "target {} payload size does not match its elements", index)
            }
            Self::TrailingData => write!(f, "unexpected data before the suffix"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Errors raised while loading a TOML device profile
#[cfg(feature = "std")]
#[derive(Debug)]
pub enum ProfileError {
    /// Profile file could not be read
    Io(std::io::Error),
    /// Profile is not valid TOML or misses required keys
    Parse(std::string::String),
    /// A numeric or size value could not be interpreted
    InvalidValue(std::string::String),
    /// Profile declares no flash regions
    NoRegions,
}

#[cfg(feature = "std")]
impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read profile: {}", e),
            Self::Parse(msg) => write!(f, "failed to parse profile: {}", msg),
            Self::InvalidValue(msg) => write!(f, "invalid profile value: {}", msg),
            Self::NoRegions => write!(f, "profile declares no flash regions"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
