//! The tables this crate knows how to decode.

pub mod cmap;
pub mod gsub;
pub mod head;
pub mod layout;

/// Calculate a table checksum for the provided data.
///
/// The data is summed as big-endian `u32` words; a trailing partial word
/// is treated as if padded with zeros.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums>
pub fn compute_checksum(table: &[u8]) -> u32 {
    let mut chunks = table.chunks_exact(4);
    let mut sum = chunks
        .by_ref()
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .fold(0u32, u32::wrapping_add);
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut last = [0u8; 4];
        last[..rem.len()].copy_from_slice(rem);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_words() {
        assert_eq!(compute_checksum(&[]), 0);
        assert_eq!(compute_checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(
            compute_checksum(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2]),
            1,
            "sum wraps"
        );
    }

    #[test]
    fn checksum_pads_partial_word() {
        assert_eq!(compute_checksum(&[1, 2, 3]), 0x0102_0300);
        assert_eq!(
            compute_checksum(&[0, 0, 0, 1, 0xAB]),
            compute_checksum(&[0, 0, 0, 1, 0xAB, 0, 0, 0])
        );
    }
}
