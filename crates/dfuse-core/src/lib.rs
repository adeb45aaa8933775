//! dfuse-core - DfuSe container model and serializer
//!
//! This crate turns a firmware image plus a device flash table into a
//! byte-exact DfuSe (ST "DFU extended") container, the format consumed by
//! `dfu-util` and ST's DfuSe tooling. It is `no_std` compatible and only
//! needs `alloc`.
//!
//! The pipeline runs in one direction:
//!
//! 1. A [`SourceImage`](image::SourceImage) (e.g. [`SparseImage`](image::SparseImage)
//!    loaded from Intel HEX) is cut into one [`ImageSegment`](image::ImageSegment)
//!    per [`FlashRegion`](device::FlashRegion).
//! 2. Segments become [`Element`](dfu::Element)s of a [`Target`](dfu::Target),
//!    targets are collected in a [`DfuFile`](dfu::DfuFile).
//! 3. [`DfuFile::to_bytes`](dfu::DfuFile::to_bytes) sizes the whole tree up
//!    front and emits the container in a single forward pass.
//!
//! # Features
//!
//! - `std` - Enable `std::error::Error` impls and TOML device profiles
//!
//! # Example
//!
//! ```ignore
//! use dfuse_core::device::DeviceFamily;
//! use dfuse_core::image::SparseImage;
//!
//! let mut image = SparseImage::new(0xFF);
//! image.insert(0x0040_4000, &firmware)?;
//! let dfu = DeviceFamily::Sam.profile().build_file(&image)?;
//! let bytes = dfu.to_bytes()?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod dfu;
pub mod error;
pub mod image;

pub use error::{Error, ParseError, Result};
#[cfg(feature = "std")]
pub use error::ProfileError;
