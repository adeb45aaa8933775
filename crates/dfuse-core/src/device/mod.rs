//! Device families and flash tables
//!
//! A [`DeviceProfile`] bundles the flash table and USB identity needed to
//! build a container for one kind of device. The built-in families are
//! immutable `const` tables selected through [`DeviceFamily`]:
//!
//! ```ignore
//! let profile = DeviceFamily::Stm32.profile();
//! let dfu = profile.build_file(&image)?;
//! ```
//!
//! With the `std` feature, profiles for other devices can be loaded from
//! TOML files.

mod types;

#[cfg(feature = "std")]
mod toml;

pub use types::*;
