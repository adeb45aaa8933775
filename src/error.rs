//! Error types for the CLI

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a command
#[derive(Error, Debug)]
pub enum CliError {
    /// The input path does not name a file
    #[error("Input file {} doesn't exist", .0.display())]
    InputFileNotFound(PathBuf),

    /// I/O error reading the input or writing the output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed Intel HEX input
    #[error("Intel HEX error: {0}")]
    Hex(#[from] ihex::ReaderError),

    /// Extraction or serialization failed
    #[error(transparent)]
    Core(#[from] dfuse_core::Error),

    /// Malformed DfuSe file
    #[error("invalid DfuSe file: {0}")]
    Parse(#[from] dfuse_core::ParseError),

    /// Malformed device profile
    #[error(transparent)]
    Profile(#[from] dfuse_core::ProfileError),
}
