//! Intel HEX loading
//!
//! Decodes an Intel HEX file into a [`SparseImage`]. Only the records that
//! place data matter here; start-address records are ignored.

use crate::error::CliError;
use dfuse_core::image::SparseImage;
use ihex::Record;
use std::fs;
use std::path::Path;

/// Load an Intel HEX file
pub fn load_hex(path: &Path, fill: u8) -> Result<SparseImage, CliError> {
    let content = fs::read_to_string(path)?;
    parse_hex(&content, fill)
}

/// Decode Intel HEX text
pub fn parse_hex(content: &str, fill: u8) -> Result<SparseImage, CliError> {
    let mut image = SparseImage::new(fill);
    let mut upper: u32 = 0;

    for record in ihex::Reader::new(content) {
        match record? {
            Record::Data { offset, value } => {
                image.insert(upper.wrapping_add(u32::from(offset)), &value)?;
            }
            Record::ExtendedSegmentAddress(base) => upper = u32::from(base) << 4,
            Record::ExtendedLinearAddress(base) => upper = u32::from(base) << 16,
            Record::EndOfFile => break,
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {}
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfuse_core::image::SourceImage;

    fn hex(records: &[Record]) -> String {
        ihex::create_object_file_representation(records).unwrap()
    }

    #[test]
    fn test_extended_linear_address() {
        let text = hex(&[
            Record::ExtendedLinearAddress(0x0800),
            Record::Data {
                offset: 0x0000,
                value: vec![1, 2, 3, 4],
            },
            Record::Data {
                offset: 0x0004,
                value: vec![5, 6, 7, 8],
            },
            Record::StartLinearAddress(0x0800_0101),
            Record::EndOfFile,
        ]);
        let image = parse_hex(&text, 0xFF).unwrap();
        let chunks: Vec<_> = image.chunks().collect();
        assert_eq!(chunks, vec![(0x0800_0000, &[1u8, 2, 3, 4, 5, 6, 7, 8][..])]);
        assert_eq!(image.max_address(), Some(0x0800_0007));
    }

    #[test]
    fn test_extended_segment_address() {
        let text = hex(&[
            Record::ExtendedSegmentAddress(0x1000),
            Record::Data {
                offset: 0x0010,
                value: vec![0xAA],
            },
            Record::EndOfFile,
        ]);
        let image = parse_hex(&text, 0x00).unwrap();
        assert_eq!(image.max_address(), Some(0x0001_0010));
        assert_eq!(image.fill_value(), 0x00);
    }

    #[test]
    fn test_overlapping_records() {
        let text = hex(&[
            Record::Data {
                offset: 0x0000,
                value: vec![0; 16],
            },
            Record::Data {
                offset: 0x0008,
                value: vec![1; 4],
            },
            Record::EndOfFile,
        ]);
        assert!(matches!(
            parse_hex(&text, 0xFF),
            Err(CliError::Core(dfuse_core::Error::OverlappingData { address: 8 }))
        ));
    }

    #[test]
    fn test_malformed_hex() {
        assert!(matches!(
            parse_hex(":10000000ZZ\n", 0xFF),
            Err(CliError::Hex(_))
        ));
    }
}
