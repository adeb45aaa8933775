//! TOML device profile parsing
//!
//! Parses profile files describing devices that are not built in:
//!
//! ```toml
//! [device]
//! name = "stm32f405"
//! vendor_id = 0x0483
//! product_id = 0xDF11
//! bcd_device = 0x011A
//! target_name = "ST..."
//! alt_setting = 0
//!
//! [[region]]
//! base = 0x08000000
//! size = "16 KiB"
//!
//! [[region]]
//! base = 0x08010000
//! size = "1472 KiB"
//! ```

use std::format;
use std::fs;
use std::path::Path;
use std::string::{String, ToString};
use std::vec::Vec;

use super::{format_size, DeviceIdentity, DeviceProfile, FlashRegion};
use crate::error::ProfileError;

/// TOML profile file structure
#[derive(Debug, serde::Deserialize)]
struct TomlProfileFile {
    device: TomlDevice,
    #[serde(default)]
    region: Vec<TomlRegion>,
}

/// Device metadata
#[derive(Debug, serde::Deserialize)]
struct TomlDevice {
    name: Option<String>,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    vendor_id: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    product_id: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    bcd_device: u32,
    target_name: Option<String>,
    #[serde(default)]
    alt_setting: u8,
}

/// Region definition in TOML
#[derive(Debug, serde::Deserialize)]
struct TomlRegion {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    base: u32,
    size: TomlSize,
}

/// Region size: a plain integer or a string like "16 KiB"
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum TomlSize {
    Int(u32),
    Str(String),
}

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_hex_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(n),
        HexOrInt::Str(s) => parse_number(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

/// Parse a size string like "16 KiB" or "4096"
fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();

    if let Ok(n) = parse_number(s) {
        return Ok(n);
    }

    let s_lower = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s_lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s_lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else if let Some(n) = s_lower.strip_suffix('b') {
        (n.trim(), 1)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    let num: u32 = num_str.parse().map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {}", s))
}

fn to_u16(field: &str, value: u32) -> Result<u16, ProfileError> {
    u16::try_from(value)
        .map_err(|_| ProfileError::InvalidValue(format!("{} 0x{:X} exceeds 16 bits", field, value)))
}

impl DeviceProfile {
    /// Load a profile from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path).map_err(ProfileError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parse a profile from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ProfileError> {
        let file: TomlProfileFile =
            toml::from_str(content).map_err(|e| ProfileError::Parse(e.to_string()))?;

        if file.region.is_empty() {
            return Err(ProfileError::NoRegions);
        }

        let mut regions = Vec::with_capacity(file.region.len());
        for region in file.region {
            let size = match region.size {
                TomlSize::Int(n) => n,
                TomlSize::Str(s) => parse_size(&s).map_err(ProfileError::InvalidValue)?,
            };
            regions.push(FlashRegion::new(region.base, size));
        }

        let device = file.device;
        Ok(DeviceProfile {
            name: device.name.unwrap_or_else(|| "custom".to_string()),
            regions,
            identity: DeviceIdentity::new(
                to_u16("vendor_id", device.vendor_id)?,
                to_u16("product_id", device.product_id)?,
                to_u16("bcd_device", device.bcd_device)?,
            ),
            target_name: device.target_name,
            alt_setting: device.alt_setting,
        })
    }

    /// Convert the profile to a TOML string
    pub fn to_toml_string(&self) -> String {
        let mut output = String::new();

        output.push_str("[device]\n");
        output.push_str(&format!("name = \"{}\"\n", self.name));
        output.push_str(&format!("vendor_id = 0x{:04X}\n", self.identity.vendor_id));
        output.push_str(&format!("product_id = 0x{:04X}\n", self.identity.product_id));
        output.push_str(&format!("bcd_device = 0x{:04X}\n", self.identity.bcd_device));
        if let Some(name) = &self.target_name {
            output.push_str(&format!("target_name = \"{}\"\n", name));
        }
        output.push_str(&format!("alt_setting = {}\n", self.alt_setting));

        for region in &self.regions {
            output.push_str("\n[[region]]\n");
            output.push_str(&format!("base = 0x{:08X}\n", region.base_address));
            output.push_str(&format!("size = \"{}\"\n", format_size(region.declared_size)));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceFamily;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("0x1000").unwrap(), 4096);
        assert_eq!(parse_size("16 KiB").unwrap(), 16 * 1024);
        assert_eq!(parse_size("1472KiB").unwrap(), 1472 * 1024);
        assert_eq!(parse_size("2 MiB").unwrap(), 2 * 1024 * 1024);
        assert!(parse_size("8192 MiB").is_err());
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_parse_profile() {
        let toml = r#"
[device]
name = "stm32f405"
vendor_id = 0x0483
product_id = "0xDF11"
bcd_device = 0x011A
target_name = "ST..."

[[region]]
base = 0x08000000
size = "16 KiB"

[[region]]
base = "0x08010000"
size = 1507328
"#;
        let profile = DeviceProfile::from_toml_str(toml).unwrap();
        assert_eq!(profile.name, "stm32f405");
        assert_eq!(profile.regions, DeviceFamily::Stm32.regions());
        assert_eq!(profile.identity, DeviceFamily::Stm32.identity());
        assert_eq!(profile.target_name.as_deref(), Some("ST..."));
        assert_eq!(profile.alt_setting, 0);
    }

    #[test]
    fn test_builtin_profile_survives_toml() {
        let profile = DeviceFamily::Sam.profile();
        let parsed = DeviceProfile::from_toml_str(&profile.to_toml_string()).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_profile_rejects_wide_ids() {
        let toml = r#"
[device]
vendor_id = 0x10000
product_id = 0x0001
bcd_device = 0x0100

[[region]]
base = 0
size = 1024
"#;
        assert!(matches!(
            DeviceProfile::from_toml_str(toml),
            Err(ProfileError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_profile_without_regions() {
        let toml = r#"
[device]
vendor_id = 0x1209
product_id = 0xCCAA
bcd_device = 0x0101
"#;
        assert!(matches!(
            DeviceProfile::from_toml_str(toml),
            Err(ProfileError::NoRegions)
        ));
    }
}
