//! Device types
//!
//! Flash tables and USB identities for the supported device families.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::dfu::{DfuFile, Element, Target};
use crate::error::Result;
use crate::image::{extract_regions, SourceImage};

/// A flash region to be cut out of the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashRegion {
    /// First address of the region
    pub base_address: u32,
    /// Number of bytes the region spans
    pub declared_size: u32,
}

impl FlashRegion {
    /// Create a new region
    pub const fn new(base_address: u32, declared_size: u32) -> Self {
        Self {
            base_address,
            declared_size,
        }
    }

    /// One past the last address of the region
    pub fn end(&self) -> u64 {
        u64::from(self.base_address) + u64::from(self.declared_size)
    }
}

/// USB identity written into the DFU suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
    /// Device release number, emitted verbatim
    pub bcd_device: u16,
}

impl DeviceIdentity {
    /// Create a new identity
    pub const fn new(vendor_id: u16, product_id: u16, bcd_device: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            bcd_device,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} (bcdDevice 0x{:04X})",
            self.vendor_id, self.product_id, self.bcd_device
        )
    }
}

/// STM32: 16 KiB boot sector, application from 0x08010000
const STM32_REGIONS: &[FlashRegion] = &[
    FlashRegion::new(0x0800_0000, 16 * 1024),
    FlashRegion::new(0x0801_0000, 1472 * 1024),
];

const STM32_IDENTITY: DeviceIdentity = DeviceIdentity::new(0x0483, 0xDF11, 0x011A);

/// SAM: application flash after the 16 KiB bootloader
const SAM_REGIONS: &[FlashRegion] = &[FlashRegion::new(0x0040_4000, 496 * 1024)];

const SAM_IDENTITY: DeviceIdentity = DeviceIdentity::new(0x1209, 0xCCAA, 0x0101);

/// Built-in device families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceFamily {
    /// ST STM32 (DfuSe bootloader)
    Stm32,
    /// Microchip SAM with a pid.codes DFU bootloader
    Sam,
}

impl DeviceFamily {
    /// All built-in families
    pub const ALL: [DeviceFamily; 2] = [DeviceFamily::Stm32, DeviceFamily::Sam];

    /// Names accepted by [`FromStr`]
    pub const NAMES: [&'static str; 2] = ["stm32", "sam"];

    /// Short name of the family
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stm32 => "stm32",
            Self::Sam => "sam",
        }
    }

    /// Flash table for the family
    pub fn regions(&self) -> &'static [FlashRegion] {
        match self {
            Self::Stm32 => STM32_REGIONS,
            Self::Sam => SAM_REGIONS,
        }
    }

    /// USB identity for the family
    pub fn identity(&self) -> DeviceIdentity {
        match self {
            Self::Stm32 => STM32_IDENTITY,
            Self::Sam => SAM_IDENTITY,
        }
    }

    fn target_name(&self) -> Option<&'static str> {
        match self {
            Self::Stm32 => Some("ST..."),
            Self::Sam => None,
        }
    }

    /// Build the device profile for this family
    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile {
            name: self.name().to_string(),
            regions: self.regions().to_vec(),
            identity: self.identity(),
            target_name: self.target_name().map(ToString::to_string),
            alt_setting: 0,
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a device family name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDeviceFamily(pub String);

impl fmt::Display for UnknownDeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown device family '{}' (expected one of: {})",
            self.0,
            DeviceFamily::NAMES.join(", ")
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownDeviceFamily {}

impl FromStr for DeviceFamily {
    type Err = UnknownDeviceFamily;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|family| family.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDeviceFamily(s.to_string()))
    }
}

/// Everything needed to turn an image into a container for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Profile name, for diagnostics
    pub name: String,
    /// Regions to extract, in emission order
    pub regions: Vec<FlashRegion>,
    /// USB identity written into the suffix
    pub identity: DeviceIdentity,
    /// Name of the single target, if any
    pub target_name: Option<String>,
    /// Alternate setting of the single target
    pub alt_setting: u8,
}

impl DeviceProfile {
    /// Extract all regions and wrap them into a single-target file
    pub fn build_file<I: SourceImage + ?Sized>(&self, image: &I) -> Result<DfuFile> {
        let segments = extract_regions(image, &self.regions)?;

        let mut target = Target::new(self.alt_setting, self.target_name.clone());
        target
            .elements
            .extend(segments.into_iter().map(Element::from));

        let mut file = DfuFile::new(self.identity);
        file.targets.push(target);
        Ok(file)
    }

    /// Total number of bytes covered by the flash table
    pub fn flash_size(&self) -> u64 {
        self.regions.iter().map(|r| u64::from(r.declared_size)).sum()
    }
}

/// Format a size as human-readable string
pub fn format_size(size: u32) -> String {
    if size >= 1024 * 1024 && size % (1024 * 1024) == 0 {
        format!("{} MiB", size / (1024 * 1024))
    } else if size >= 1024 && size % 1024 == 0 {
        format!("{} KiB", size / 1024)
    } else {
        format!("{}", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::SparseImage;

    #[test]
    fn test_family_tables() {
        let stm32 = DeviceFamily::Stm32.profile();
        assert_eq!(stm32.regions.len(), 2);
        assert_eq!(stm32.regions[0], FlashRegion::new(0x0800_0000, 0x4000));
        assert_eq!(stm32.regions[1], FlashRegion::new(0x0801_0000, 0x17_0000));
        assert_eq!(stm32.identity, DeviceIdentity::new(0x0483, 0xDF11, 0x011A));

        let sam = DeviceFamily::Sam.profile();
        assert_eq!(sam.regions, [FlashRegion::new(0x0040_4000, 0x7_C000)]);
        assert_eq!(sam.identity, DeviceIdentity::new(0x1209, 0xCCAA, 0x0101));
        assert_eq!(sam.target_name, None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(16 * 1024), "16 KiB");
        assert_eq!(format_size(2 * 1024 * 1024), "2 MiB");
        assert_eq!(format_size(1000), "1000");
    }

    #[test]
    fn test_stm32_regions_do_not_overlap() {
        let regions = DeviceFamily::Stm32.regions();
        assert!(regions[0].end() <= u64::from(regions[1].base_address));
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("stm32".parse::<DeviceFamily>(), Ok(DeviceFamily::Stm32));
        assert_eq!("SAM".parse::<DeviceFamily>(), Ok(DeviceFamily::Sam));
        assert_eq!(
            "nrf52".parse::<DeviceFamily>(),
            Err(UnknownDeviceFamily("nrf52".to_string()))
        );
    }

    #[test]
    fn test_build_file_single_target() {
        let image = SparseImage::from_bytes(0x0040_4000, &[0x42; 1024], 0xFF).unwrap();
        let file = DeviceFamily::Sam.profile().build_file(&image).unwrap();

        assert_eq!(file.identity, SAM_IDENTITY);
        assert_eq!(file.targets.len(), 1);
        let target = &file.targets[0];
        assert_eq!(target.alt_setting, 0);
        assert_eq!(target.elements.len(), 1);
        assert_eq!(target.elements[0].address, 0x0040_4000);
        assert_eq!(target.elements[0].data.len(), 496 * 1024);
        assert_eq!(target.elements[0].data[1023], 0x42);
        assert_eq!(target.elements[0].data[1024], 0xFF);
    }

    #[test]
    fn test_build_file_propagates_out_of_range() {
        // Only the boot sector is present, the application region is missing
        let image = SparseImage::from_bytes(0x0800_0000, &[0; 256], 0xFF).unwrap();
        let err = DeviceFamily::Stm32.profile().build_file(&image).unwrap_err();
        assert!(matches!(err, crate::Error::RegionOutOfRange { base: 0x0801_0000, .. }));
    }
}
