//! DfuSe parser
//!
//! Decodes a container back into a [`DfuFile`], checking every length,
//! signature and the suffix CRC along the way.

use alloc::string::String;
use alloc::vec::Vec;

use zerocopy::FromBytes;

use super::crc::dfu_crc;
use super::format::*;
use super::types::{DfuFile, Element, Target};
use crate::device::DeviceIdentity;
use crate::error::ParseError;

type Result<T> = core::result::Result<T, ParseError>;

impl DfuFile {
    /// Parse a complete DfuSe file
    ///
    /// The prefix image size may either cover the whole file (as written by
    /// [`DfuFile::to_bytes`]) or stop before the suffix, as some older
    /// tooling does.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PREFIX_SIZE + SUFFIX_SIZE {
            return Err(ParseError::Truncated);
        }

        let (body, suffix_bytes) = bytes.split_at(bytes.len() - SUFFIX_SIZE);
        let suffix = DfuSuffix::read_from_bytes(suffix_bytes).map_err(|_| ParseError::Truncated)?;
        if suffix.signature != *SUFFIX_SIGNATURE || usize::from(suffix.length) != SUFFIX_SIZE {
            return Err(ParseError::BadSuffix);
        }
        if suffix.bcd_dfu.get() != BCD_DFU_DFUSE {
            return Err(ParseError::UnsupportedDfuVersion(suffix.bcd_dfu.get()));
        }

        let computed = dfu_crc(&bytes[..bytes.len() - 4]);
        if computed != suffix.crc.get() {
            return Err(ParseError::CrcMismatch {
                stored: suffix.crc.get(),
                computed,
            });
        }

        let (prefix, mut rest) =
            DfuPrefix::read_from_prefix(body).map_err(|_| ParseError::Truncated)?;
        if prefix.signature != *PREFIX_SIGNATURE {
            return Err(ParseError::BadPrefixSignature);
        }
        if prefix.version != FORMAT_VERSION {
            return Err(ParseError::UnsupportedFormatVersion(prefix.version));
        }

        let declared = prefix.image_size.get();
        if declared as usize == body.len() {
            log::debug!("Image size excludes the suffix");
        } else if declared as usize != bytes.len() {
            return Err(ParseError::SizeMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let mut targets = Vec::with_capacity(usize::from(prefix.target_count));
        for index in 0..usize::from(prefix.target_count) {
            let (target, tail) = parse_target(rest, index)?;
            targets.push(target);
            rest = tail;
        }

        if !rest.is_empty() {
            return Err(ParseError::TrailingData);
        }

        Ok(DfuFile {
            targets,
            identity: DeviceIdentity::new(
                suffix.vendor_id.get(),
                suffix.product_id.get(),
                suffix.bcd_device.get(),
            ),
        })
    }
}

fn parse_target(bytes: &[u8], index: usize) -> Result<(Target, &[u8])> {
    let (prefix, tail) = TargetPrefix::read_from_prefix(bytes).map_err(|_| ParseError::Truncated)?;
    if prefix.signature != *TARGET_SIGNATURE {
        return Err(ParseError::BadTargetSignature { index });
    }

    let payload_len = prefix.target_size.get() as usize;
    if tail.len() < payload_len {
        return Err(ParseError::Truncated);
    }
    let (mut payload, rest) = tail.split_at(payload_len);

    let name = (prefix.named.get() != 0).then(|| parse_name(&prefix.name));

    let count = prefix.element_count.get() as usize;
    // A bogus count must not drive the allocation
    let mut elements = Vec::with_capacity(count.min(payload.len() / ELEMENT_HEADER_SIZE));
    for _ in 0..count {
        let (header, data) = ElementHeader::read_from_prefix(payload)
            .map_err(|_| ParseError::TargetSizeMismatch { index })?;
        let size = header.size.get() as usize;
        if data.len() < size {
            return Err(ParseError::TargetSizeMismatch { index });
        }
        let (data, next) = data.split_at(size);
        elements.push(Element::new(header.address.get(), data));
        payload = next;
    }

    if !payload.is_empty() {
        return Err(ParseError::TargetSizeMismatch { index });
    }

    Ok((
        Target {
            alt_setting: prefix.alt_setting,
            name,
            elements,
        },
        rest,
    ))
}

/// Parse a null-terminated name field
fn parse_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
