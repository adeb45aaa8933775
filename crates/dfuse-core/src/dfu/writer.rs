//! DfuSe serializer
//!
//! Serialization is split in two: [`DfuFile::validate`] checks the tree and
//! computes every length from its structure, then [`DfuFile::to_bytes`]
//! emits the container in one forward pass. Nothing is written until
//! validation has passed, and no header is patched after the fact.

use alloc::vec::Vec;

use zerocopy::little_endian::{U16, U32};
use zerocopy::IntoBytes;

use super::crc::dfu_crc;
use super::format::*;
use super::types::{DfuFile, Element, Target};
use crate::error::{Error, Result};

impl DfuFile {
    /// Check the tree can be encoded and return the total file size
    pub fn validate(&self) -> Result<u32> {
        if self.targets.len() > usize::from(u8::MAX) {
            return Err(Error::TooManyTargets {
                count: self.targets.len(),
            });
        }

        for target in &self.targets {
            if let Some(name) = &target.name {
                if name.len() > MAX_TARGET_NAME_LEN {
                    return Err(Error::NameTooLong { len: name.len() });
                }
            }
        }

        // Every other length field is bounded by the total size
        u32::try_from(self.encoded_len()).map_err(|_| Error::ImageTooLarge)
    }

    /// Serialize the container
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let image_size = self.validate()?;

        log::debug!(
            "Serializing {} target(s), {} element(s), {} bytes",
            self.targets.len(),
            self.element_count(),
            image_size
        );

        let mut out = Vec::with_capacity(image_size as usize);

        let prefix = DfuPrefix {
            signature: *PREFIX_SIGNATURE,
            version: FORMAT_VERSION,
            image_size: U32::new(image_size),
            target_count: self.targets.len() as u8,
        };
        out.extend_from_slice(prefix.as_bytes());

        for target in &self.targets {
            write_target(&mut out, target);
        }

        let suffix = DfuSuffix {
            bcd_device: U16::new(self.identity.bcd_device),
            product_id: U16::new(self.identity.product_id),
            vendor_id: U16::new(self.identity.vendor_id),
            bcd_dfu: U16::new(BCD_DFU_DFUSE),
            signature: *SUFFIX_SIGNATURE,
            length: SUFFIX_SIZE as u8,
            crc: U32::ZERO,
        };
        out.extend_from_slice(&suffix.as_bytes()[..SUFFIX_CRC_OFFSET]);

        let crc = dfu_crc(&out);
        out.extend_from_slice(U32::new(crc).as_bytes());

        debug_assert_eq!(out.len(), image_size as usize);
        Ok(out)
    }
}

fn write_target(out: &mut Vec<u8>, target: &Target) {
    let mut name = [0u8; TARGET_NAME_FIELD_LEN];
    if let Some(n) = &target.name {
        name[..n.len()].copy_from_slice(n.as_bytes());
    }

    // Lengths were bounded by validate()
    let prefix = TargetPrefix {
        signature: *TARGET_SIGNATURE,
        alt_setting: target.alt_setting,
        named: U32::new(u32::from(target.name.is_some())),
        name,
        target_size: U32::new(target.payload_size() as u32),
        element_count: U32::new(target.elements.len() as u32),
    };
    out.extend_from_slice(prefix.as_bytes());

    for element in &target.elements {
        write_element(out, element);
    }
}

fn write_element(out: &mut Vec<u8>, element: &Element) {
    let header = ElementHeader {
        address: U32::new(element.address),
        size: U32::new(element.data.len() as u32),
    };
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&element.data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceFamily, DeviceIdentity};
    use alloc::string::{String, ToString};
    use alloc::vec;

    const STM32: DeviceIdentity = DeviceIdentity::new(0x0483, 0xDF11, 0x011A);

    fn le32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn le16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn sample_file(identity: DeviceIdentity) -> DfuFile {
        let target = Target::new(0, Some("ST...".to_string()))
            .with_element(Element::new(0x0800_0000, vec![0xAB; 32]))
            .with_element(Element::new(0x0801_0000, vec![0x01, 0x02, 0x03]));
        DfuFile::new(identity).with_target(target)
    }

    #[test]
    fn test_single_empty_element_is_309_bytes() {
        let file = DfuFile::new(STM32)
            .with_target(Target::new(0, None).with_element(Element::new(0x0800_0000, vec![])));
        let bytes = file.to_bytes().unwrap();
        assert_eq!(bytes.len(), 11 + 274 + 8 + 16);
        assert_eq!(bytes.len(), 309);
        assert_eq!(le32(&bytes, 6), 309);
    }

    #[test]
    fn test_byte_layout() {
        let bytes = sample_file(STM32).to_bytes().unwrap();

        // Prefix
        assert_eq!(&bytes[0..5], b"DfuSe");
        assert_eq!(bytes[5], 1);
        assert_eq!(le32(&bytes, 6) as usize, bytes.len());
        assert_eq!(bytes[10], 1);

        // Target prefix
        let t = PREFIX_SIZE;
        assert_eq!(&bytes[t..t + 6], b"Target");
        assert_eq!(bytes[t + 6], 0);
        assert_eq!(le32(&bytes, t + 7), 1);
        assert_eq!(&bytes[t + 11..t + 16], b"ST...");
        assert!(bytes[t + 16..t + 11 + 255].iter().all(|&b| b == 0));
        assert_eq!(le32(&bytes, t + 266), (8 + 32 + 8 + 3) as u32);
        assert_eq!(le32(&bytes, t + 270), 2);

        // Elements
        let e = t + TARGET_PREFIX_SIZE;
        assert_eq!(le32(&bytes, e), 0x0800_0000);
        assert_eq!(le32(&bytes, e + 4), 32);
        assert_eq!(&bytes[e + 8..e + 40], &[0xAB; 32]);
        assert_eq!(le32(&bytes, e + 40), 0x0801_0000);
        assert_eq!(le32(&bytes, e + 44), 3);
        assert_eq!(&bytes[e + 48..e + 51], &[1, 2, 3]);

        // Suffix
        let s = e + 51;
        assert_eq!(bytes.len(), s + SUFFIX_SIZE);
        assert_eq!(le16(&bytes, s), 0x011A);
        assert_eq!(le16(&bytes, s + 2), 0xDF11);
        assert_eq!(le16(&bytes, s + 4), 0x0483);
        assert_eq!(le16(&bytes, s + 6), 0x011A);
        assert_eq!(&bytes[s + 8..s + 11], b"UFD");
        assert_eq!(bytes[s + 11], 16);
    }

    #[test]
    fn test_size_field_matches_output() {
        let files = [
            DfuFile::new(STM32),
            DfuFile::new(STM32).with_target(Target::new(0, None)),
            sample_file(STM32),
            sample_file(STM32).with_target(
                Target::new(1, Some("Option bytes".to_string()))
                    .with_element(Element::new(0x1FFF_C000, vec![0xAA; 16])),
            ),
        ];
        for file in &files {
            let bytes = file.to_bytes().unwrap();
            assert_eq!(le32(&bytes, 6) as usize, bytes.len());
            assert_eq!(file.encoded_len(), bytes.len() as u64);
            assert_eq!(bytes[10] as usize, file.targets.len());
        }
    }

    #[test]
    fn test_crc_covers_everything_before_it() {
        let bytes = sample_file(STM32).to_bytes().unwrap();
        let (body, crc) = bytes.split_at(bytes.len() - 4);
        assert_eq!(u32::from_le_bytes(crc.try_into().unwrap()), dfu_crc(body));
    }

    #[test]
    fn test_output_is_deterministic() {
        let file = sample_file(STM32);
        assert_eq!(file.to_bytes().unwrap(), file.to_bytes().unwrap());
    }

    #[test]
    fn test_empty_target_is_legal() {
        let file = DfuFile::new(STM32).with_target(Target::new(2, None));
        let bytes = file.to_bytes().unwrap();
        let t = PREFIX_SIZE;
        assert_eq!(bytes[t + 6], 2);
        assert_eq!(le32(&bytes, t + 7), 0);
        assert_eq!(le32(&bytes, t + 266), 0);
        assert_eq!(le32(&bytes, t + 270), 0);
        assert_eq!(bytes.len(), 11 + 274 + 16);
    }

    #[test]
    fn test_name_length_limit() {
        let ok = DfuFile::new(STM32).with_target(Target::new(0, Some("a".repeat(254))));
        let bytes = ok.to_bytes().unwrap();
        // Terminator survives at the end of the field
        assert_eq!(bytes[PREFIX_SIZE + 11 + 254], 0);

        let too_long = DfuFile::new(STM32).with_target(Target::new(0, Some("a".repeat(255))));
        assert_eq!(too_long.to_bytes(), Err(Error::NameTooLong { len: 255 }));
    }

    #[test]
    fn test_too_many_targets() {
        let mut file = DfuFile::new(STM32);
        file.targets = vec![Target::new(0, None); 256];
        assert_eq!(file.to_bytes(), Err(Error::TooManyTargets { count: 256 }));

        file.targets.pop();
        let bytes = file.to_bytes().unwrap();
        assert_eq!(bytes[10], 255);
    }

    #[test]
    fn test_identity_only_changes_suffix() {
        let stm32 = sample_file(DeviceFamily::Stm32.identity()).to_bytes().unwrap();
        let sam = sample_file(DeviceFamily::Sam.identity()).to_bytes().unwrap();
        assert_eq!(stm32.len(), sam.len());

        let s = stm32.len() - SUFFIX_SIZE;
        assert_eq!(stm32[..s], sam[..s]);
        assert_ne!(stm32[s..s + 6], sam[s..s + 6]);
        // bcdDFU, signature and length do not depend on the device
        assert_eq!(stm32[s + 6..s + 12], sam[s + 6..s + 12]);
    }

    #[test]
    fn test_multibyte_name_counts_bytes() {
        // 127 two-byte characters = 254 bytes
        let name: String = core::iter::repeat('é').take(127).collect();
        let file = DfuFile::new(STM32).with_target(Target::new(0, Some(name.clone())));
        assert!(file.to_bytes().is_ok());

        let longer = name + "x";
        let file = DfuFile::new(STM32).with_target(Target::new(0, Some(longer)));
        assert_eq!(file.validate(), Err(Error::NameTooLong { len: 255 }));
    }
}
