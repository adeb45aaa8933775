//! List and profile commands implementation

use crate::error::CliError;
use dfuse_core::device::{format_size, DeviceFamily};
use std::fs;
use std::path::Path;

/// List all built-in device families
pub fn list_devices() {
    println!("Built-in device families:");
    println!();
    println!("{:<8} {:<12} {:>10} {:>12}", "Name", "USB ID", "bcdDevice", "Region");
    println!("{}", "-".repeat(46));

    for family in DeviceFamily::ALL {
        let identity = family.identity();
        for (i, region) in family.regions().iter().enumerate() {
            let region_str = format!(
                "0x{:08X} {}",
                region.base_address,
                format_size(region.declared_size)
            );
            if i == 0 {
                println!(
                    "{:<8} {:04x}:{:04x}    0x{:04X}     {}",
                    family.name(),
                    identity.vendor_id,
                    identity.product_id,
                    identity.bcd_device,
                    region_str
                );
            } else {
                println!("{:<32} {}", "", region_str);
            }
        }
    }
}

/// Export a built-in profile as a TOML template
pub fn cmd_profile(family: DeviceFamily, output: Option<&Path>) -> Result<(), CliError> {
    let content = family.profile().to_toml_string();

    if let Some(out) = output {
        fs::write(out, content)?;
        println!("Saved {} profile to {:?}", family, out);
    } else {
        print!("{}", content);
    }

    Ok(())
}
