//! Info command implementation

use crate::error::CliError;
use dfuse_core::device::format_size;
use dfuse_core::dfu::DfuFile;
use std::fs;
use std::path::Path;

/// Parse a DfuSe file and print its structure
pub fn run_info(file: &Path) -> Result<(), CliError> {
    if !file.is_file() {
        return Err(CliError::InputFileNotFound(file.to_path_buf()));
    }

    let bytes = fs::read(file)?;
    let dfu = DfuFile::parse(&bytes)?;
    print_dfu(&dfu, bytes.len());
    Ok(())
}

/// Print container information
pub fn print_dfu(dfu: &DfuFile, file_size: usize) {
    println!("DfuSe File Information");
    println!("======================");
    println!("Size:     {} bytes", file_size);
    println!("Device:   {}", dfu.identity);
    println!("Targets:  {}", dfu.targets.len());

    for target in &dfu.targets {
        println!();
        println!(
            "Target alt {} ({}) - {} element(s), {} bytes",
            target.alt_setting,
            target.name.as_deref().unwrap_or("unnamed"),
            target.elements.len(),
            target.payload_size()
        );
        println!("{:>12} {:>12} {:>12}", "Address", "End", "Size");
        println!("{:-<38}", "");

        for element in &target.elements {
            let len = element.data.len() as u32;
            let end = u64::from(element.address) + u64::from(len);
            println!(
                "{:#012X} {:#012X} {:>12}",
                element.address,
                end,
                format_size(len)
            );
        }
    }
}
