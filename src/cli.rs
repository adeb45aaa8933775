//! CLI argument parsing

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use dfuse_core::device::DeviceFamily;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Value parser restricted to the built-in device family names
fn device_parser() -> impl TypedValueParser<Value = DeviceFamily> {
    PossibleValuesParser::new(DeviceFamily::NAMES).try_map(|s| s.parse::<DeviceFamily>())
}

#[derive(Parser)]
#[command(name = "dfuse-pack")]
#[command(author, version, about = "Pack Intel HEX firmware into DfuSe files", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a DfuSe file from an Intel HEX image
    Build {
        /// Intel HEX input file
        ihex_input: PathBuf,

        /// DfuSe output file
        dfu_output: PathBuf,

        /// Device family providing the flash table and USB identity
        #[arg(
            short,
            long,
            value_parser = device_parser(),
            required_unless_present = "profile",
            conflicts_with = "profile"
        )]
        device: Option<DeviceFamily>,

        /// Device profile (TOML) for devices that are not built in
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Value for flash bytes the image does not cover (hex or decimal)
        #[arg(long, value_parser = parse_hex_u8, default_value = "0xFF")]
        fill: u8,
    },

    /// Show the contents of a DfuSe file
    Info {
        /// DfuSe file to inspect
        file: PathBuf,
    },

    /// List built-in device families
    ListDevices,

    /// Write a built-in device profile as a TOML template
    Profile {
        /// Device family to export
        #[arg(short, long, value_parser = device_parser())]
        device: DeviceFamily,

        /// Output file (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u8() {
        assert_eq!(parse_hex_u8("0xFF"), Ok(0xFF));
        assert_eq!(parse_hex_u8("0"), Ok(0));
        assert!(parse_hex_u8("0x100").is_err());
    }

    #[test]
    fn test_build_requires_device() {
        assert!(Cli::try_parse_from(["dfuse-pack", "build", "in.hex", "out.dfu"]).is_err());
        assert!(Cli::try_parse_from([
            "dfuse-pack", "build", "in.hex", "out.dfu", "--device", "avr"
        ])
        .is_err());
    }

    #[test]
    fn test_build_with_device() {
        let cli = Cli::try_parse_from([
            "dfuse-pack", "build", "in.hex", "out.dfu", "--device", "sam",
        ])
        .unwrap();
        match cli.command {
            Commands::Build { device, fill, .. } => {
                assert_eq!(device, Some(DeviceFamily::Sam));
                assert_eq!(fill, 0xFF);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_device_conflicts_with_profile() {
        assert!(Cli::try_parse_from([
            "dfuse-pack", "build", "in.hex", "out.dfu", "--device", "stm32", "--profile", "p.toml"
        ])
        .is_err());
    }
}
