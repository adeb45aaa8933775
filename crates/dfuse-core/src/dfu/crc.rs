//! DFU suffix checksum

/// CRC-32 as stored in the DFU suffix
///
/// Standard reflected CRC-32 (polynomial 0xEDB88320, seed 0xFFFFFFFF),
/// stored without the final XOR, i.e. the complement of the zlib value.
pub fn dfu_crc(data: &[u8]) -> u32 {
    !crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        // zlib crc32("123456789") == 0xCBF43926
        assert_eq!(dfu_crc(b"123456789"), !0xCBF4_3926);
        assert_eq!(dfu_crc(b"123456789"), 0x340B_C6D9);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(dfu_crc(&[]), 0xFFFF_FFFF);
    }
}
