//! dfuse-pack - Pack firmware images into DfuSe containers
//!
//! Reads an Intel HEX image, cuts it into the flash regions of the selected
//! device and writes a DfuSe file that `dfu-util` can flash.
//!
//! # Commands
//!
//! - `build` - Intel HEX in, DfuSe file out
//! - `info` - Decode and verify an existing DfuSe file
//! - `list-devices` - Show the built-in device families
//! - `profile` - Export a built-in device as a TOML profile template

mod cli;
mod commands;
mod error;
mod hex;

use clap::Parser;
use cli::{Cli, Commands};
use dfuse_core::device::DeviceProfile;
use error::CliError;

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Build {
            ihex_input,
            dfu_output,
            device,
            profile,
            fill,
        } => {
            let profile = match (device, profile) {
                (Some(family), _) => family.profile(),
                (None, Some(path)) => {
                    let profile = DeviceProfile::from_toml_file(&path)?;
                    log::info!("Loaded profile '{}' from {:?}", profile.name, path);
                    profile
                }
                // clap requires one of the two
                (None, None) => unreachable!("--device or --profile is required"),
            };
            commands::build::run_build(&ihex_input, &dfu_output, &profile, fill)
        }
        Commands::Info { file } => commands::info::run_info(&file),
        Commands::ListDevices => {
            commands::list_devices();
            Ok(())
        }
        Commands::Profile { device, output } => commands::cmd_profile(device, output.as_deref()),
    }
}
