//! DfuSe container model, writer and reader
//!
//! A DfuSe file wraps one or more *targets* (USB alternate settings), each
//! holding address-tagged *elements*, between an 11-byte prefix and the
//! standard 16-byte DFU suffix:
//!
//! ```text
//! +--------------------+  "DfuSe", version, image size, target count
//! | prefix (11)        |
//! +--------------------+  "Target", alt, named flag, name[255],
//! | target prefix (274)|  payload size, element count
//! |   element (8 + n)  |  address, size, data
//! |   ...              |
//! +--------------------+
//! | ...more targets    |
//! +--------------------+  bcdDevice, idProduct, idVendor, bcdDFU,
//! | suffix (16)        |  "UFD", length, CRC-32
//! +--------------------+
//! ```
//!
//! Reference: ST UM0391 "DfuSe File Format Specification"

mod crc;
mod format;
mod reader;
mod types;
mod writer;

pub use crc::dfu_crc;
pub use format::*;
pub use types::*;
