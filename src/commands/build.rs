//! Build command implementation

use crate::error::CliError;
use crate::hex;
use dfuse_core::device::DeviceProfile;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Run the build command
///
/// The output file only appears once the whole container has been
/// serialized; any failure leaves the destination untouched.
pub fn run_build(
    input: &Path,
    output: &Path,
    profile: &DeviceProfile,
    fill: u8,
) -> Result<(), CliError> {
    if !input.is_file() {
        return Err(CliError::InputFileNotFound(input.to_path_buf()));
    }

    let image = hex::load_hex(input, fill)?;
    log::info!(
        "Loaded {} bytes from {} ({} chunk(s))",
        image.data_len(),
        input.display(),
        image.chunks().count()
    );

    log::debug!(
        "Using profile '{}': {} region(s), {} bytes, {}",
        profile.name,
        profile.regions.len(),
        profile.flash_size(),
        profile.identity
    );

    let dfu = profile.build_file(&image)?;
    let bytes = dfu.to_bytes()?;

    write_atomic(output, &bytes)?;
    println!(
        "Wrote {} bytes to {:?} ({} element(s), device {})",
        bytes.len(),
        output,
        dfu.element_count(),
        profile.name
    );

    Ok(())
}

/// Write `data` to a sibling temporary file, then rename it into place
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, data)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
