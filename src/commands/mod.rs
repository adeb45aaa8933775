//! CLI command implementations

pub mod build;
pub mod info;
mod list;

pub use list::{cmd_profile, list_devices};
