//! Whole fonts, assembled from tables.

use font_types::Tag;

use crate::{be_buffer, cmap, gsub};

/// An opaque table that no decoder understands; its length is not a
/// multiple of four.
pub static OPAQUE_TABLE: &[u8] = b"opaque table payload";

/// Assemble an sfnt from `(tag, data)` pairs.
///
/// Table data is laid out in the order given, each padded to four bytes;
/// the table directory is sorted by tag. Checksums are computed, but the
/// `head` checksum adjustment is left as it is.
pub fn sfnt(tables: &[(Tag, &[u8])]) -> Vec<u8> {
    let num_tables = tables.len();
    let entry_selector = if num_tables == 0 {
        0
    } else {
        num_tables.ilog2()
    };
    let search_range = (1usize << entry_selector) * 16;

    let mut offset = 12 + 16 * num_tables;
    let mut records = Vec::with_capacity(num_tables);
    for (tag, data) in tables {
        records.push((*tag, checksum(data), offset as u32, data.len() as u32));
        offset += (data.len() + 3) & !3;
    }
    records.sort_by_key(|record| record.0);

    let mut buf = be_buffer! {
        0x00010000u32,
        num_tables as u16,
        search_range as u16,
        entry_selector as u16,
        (num_tables * 16).saturating_sub(search_range) as u16
    };
    for (tag, checksum, offset, length) in records {
        buf = buf.push(tag).push(checksum).push(offset).push(length);
    }
    for (_, data) in tables {
        let padding = ((data.len() + 3) & !3) - data.len();
        buf = buf.extend_bytes(data).extend_bytes(&[0u8; 3][..padding]);
    }
    buf.into_vec()
}

/// A version 1.0 `head` table with this checksum adjustment.
pub fn head_table(checksum_adjustment: u32) -> Vec<u8> {
    be_buffer! {
        1u16,                   // majorVersion
        0u16,                   // minorVersion
        0x00018000u32,          // fontRevision 1.5
        checksum_adjustment,    // checksumAdjustment
        0x5F0F3CF5u32,          // magicNumber
        0x000Bu16,              // flags
        1000u16,                // unitsPerEm
        3_600_000_000i64,       // created
        3_700_000_000i64,       // modified
        -50i16,                 // xMin
        -200i16,                // yMin
        950i16,                 // xMax
        800i16,                 // yMax
        0u16,                   // macStyle
        8u16,                   // lowestRecPPEM
        2i16,                   // fontDirectionHint
        0i16,                   // indexToLocFormat
        0i16                    // glyphDataFormat
    }
    .into_vec()
}

/// A font with `head`, `cmap` and `GSUB` tables plus an opaque table.
///
/// The cmap is [`cmap::simple_cmap`] and the GSUB is [`gsub::simple_gsub`].
/// Table data is laid out in the order `zzzz`, `head`, `cmap`, `GSUB`.
pub fn minimal_font() -> Vec<u8> {
    let head = head_table(0);
    let cmap = cmap::simple_cmap();
    let gsub = gsub::simple_gsub();
    sfnt(&[
        (Tag::new(b"zzzz"), OPAQUE_TABLE),
        (Tag::new(b"head"), head.as_slice()),
        (Tag::new(b"cmap"), cmap.as_slice()),
        (Tag::new(b"GSUB"), gsub.as_slice()),
    ])
}

/// Like [`minimal_font`], without a GSUB table.
pub fn font_without_gsub() -> Vec<u8> {
    let head = head_table(0);
    let cmap = cmap::simple_cmap();
    sfnt(&[
        (Tag::new(b"head"), head.as_slice()),
        (Tag::new(b"cmap"), cmap.as_slice()),
    ])
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .fold(0, u32::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_is_54_bytes() {
        assert_eq!(head_table(0).len(), 54);
    }

    #[test]
    fn directory_sorted_data_in_order() {
        let font = sfnt(&[(Tag::new(b"b   "), &[1u8][..]), (Tag::new(b"a   "), &[2u8, 3][..])]);
        // two records, so the data starts at 12 + 32
        assert_eq!(&font[12..16], b"a   ");
        assert_eq!(&font[20..24], &[0, 0, 0, 48]);
        assert_eq!(&font[28..32], b"b   ");
        assert_eq!(&font[36..40], &[0, 0, 0, 44]);
        assert_eq!(&font[44..], &[1, 0, 0, 0, 2, 3, 0, 0]);
    }
}
