//! cmap test data for scenarios not readily produced with ttx

use crate::{be_buffer, bebuffer::BeBuffer};

/// One segment of a format 4 subtable.
///
/// If `glyphs` is set the segment maps through the glyph id array and
/// `id_range_offset` is computed when the subtable is built.
#[derive(Clone, Copy, Debug)]
pub struct Segment<'a> {
    pub start: u16,
    pub end: u16,
    pub id_delta: i16,
    pub glyphs: Option<&'a [u16]>,
}

impl Segment<'_> {
    pub fn delta(start: u16, end: u16, id_delta: i16) -> Self {
        Segment {
            start,
            end,
            id_delta,
            glyphs: None,
        }
    }

    /// The mandatory final segment.
    pub fn sentinel() -> Self {
        Segment::delta(0xFFFF, 0xFFFF, 1)
    }
}

/// A format 4 subtable with these segments, in order.
///
/// The `length` field is tagged, so that tests can overwrite it.
pub fn format4(segments: &[Segment]) -> BeBuffer {
    // <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values>
    let seg_count = segments.len();
    let glyph_count: usize = segments
        .iter()
        .filter_map(|seg| seg.glyphs.map(<[u16]>::len))
        .sum();
    let length = 16 + 8 * seg_count + 2 * glyph_count;
    let entry_selector = if seg_count == 0 { 0 } else { seg_count.ilog2() };
    let search_range = 2 * (1usize << entry_selector);

    let mut id_range_offsets = Vec::with_capacity(seg_count);
    let mut glyph_ids: Vec<u16> = Vec::with_capacity(glyph_count);
    for (i, seg) in segments.iter().enumerate() {
        match seg.glyphs {
            Some(glyphs) => {
                id_range_offsets.push((2 * (seg_count - i + glyph_ids.len())) as u16);
                glyph_ids.extend_from_slice(glyphs);
            }
            None => id_range_offsets.push(0),
        }
    }

    BeBuffer::new()
        .push(4u16) // format
        .push_with_tag(length as u16, "length")
        .push(0u16) // language
        .push((2 * seg_count) as u16)
        .push(search_range as u16)
        .push(entry_selector as u16)
        .push((2 * seg_count - search_range.min(2 * seg_count)) as u16)
        .extend(segments.iter().map(|seg| seg.end))
    .push(0u16) // reservedPad
    .extend(segments.iter().map(|seg| seg.start))
    .extend(segments.iter().map(|seg| seg.id_delta))
    .extend(id_range_offsets)
    .extend(glyph_ids)
}

/// A cmap table with these `(platform_id, encoding_id, subtable)` records.
pub fn cmap(records: &[(u16, u16, &[u8])]) -> Vec<u8> {
    let mut offset = 4 + 8 * records.len();
    let mut buf = be_buffer! { 0u16, records.len() as u16 };
    for (platform_id, encoding_id, subtable) in records {
        buf = buf.push(*platform_id).push(*encoding_id).push(offset as u32);
        offset += subtable.len();
    }
    for (_, _, subtable) in records {
        buf = buf.extend_bytes(subtable);
    }
    buf.into_vec()
}

/// A Windows BMP cmap.
///
/// - 'a'..='e' map to 0x10..=0x14 by delta.
/// - 'x', 'y', 'z' map through the glyph id array to 0x20, unmapped, 0x22.
pub fn simple_cmap() -> Vec<u8> {
    let subtable = format4(&[
        Segment::delta(0x61, 0x65, 0x10 - 0x61),
        Segment {
            start: 0x78,
            end: 0x7A,
            id_delta: 0,
            glyphs: Some(&[0x20, 0, 0x22]),
        },
        Segment::sentinel(),
    ]);
    cmap(&[(0, 3, &[][..]), (3, 1, subtable.as_slice())])
}

/// Contains two codepoint ranges, both [6, 64]. Surely you don't duplicate them?
pub fn repetitive_cmap4() -> BeBuffer {
    format4(&[Segment::delta(6, 64, 0), Segment::delta(6, 64, 0)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format4_lengths() {
        let subtable = format4(&[
            Segment {
                start: 1,
                end: 2,
                id_delta: 0,
                glyphs: Some(&[5, 6]),
            },
            Segment::sentinel(),
        ]);
        // header, 4 arrays of 2, pad, 2 glyphs
        assert_eq!(subtable.len(), 14 + 16 + 2 + 4);
        assert_eq!(&subtable[2..4], &[0, 36]);
        // idRangeOffset[0] points just past the end of idRangeOffset
        assert_eq!(&subtable[28..30], &[0, 4]);
    }

    #[test]
    fn cmap_record_offsets() {
        let bytes = cmap(&[(0, 3, &[1, 2][..]), (3, 1, &[3][..])]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 20]);
        assert_eq!(&bytes[16..20], &[0, 0, 0, 22]);
        assert_eq!(&bytes[20..], &[1, 2, 3]);
    }
}
