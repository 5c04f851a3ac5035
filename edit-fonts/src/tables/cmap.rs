//! The [cmap](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap) table
//!
//! Only the Windows Unicode BMP encoding is understood. It is decoded into a
//! dense map from UTF-16 code unit to glyph, and written back as a single
//! format 4 subtable.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use types::{FixedSize, GlyphId, Tag};

use crate::{
    error::{Error, Result},
    font_data::FontData,
    record::{self, read_array, Value},
    record_schema,
    util::SearchRange,
};

/// 'cmap'
pub const TAG: Tag = Tag::new(b"cmap");

// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#windows-platform-platform-id--3
const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_BMP_ENCODING: u16 = 1;

/// The number of entries in a [`Cmap`]: one per UTF-16 code unit.
pub const CMAP_LEN: usize = 0x10000;

record_schema! {
    const CMAP_HEADER = CmapHeader {
        version: u16,
        num_tables: u16,
    }
}

record_schema! {
    const ENCODING_RECORD = EncodingRecord {
        platform_id: u16,
        encoding_id: u16,
        subtable_offset: u32,
    }
}

record_schema! {
    const CMAP4_HEADER = Cmap4Header {
        format: u16,
        length: u16,
        language: u16,
        seg_count_x2: u16,
        search_range: u16,
        entry_selector: u16,
        range_shift: u16,
    }
}

/// A run of consecutive character codes mapped to consecutive glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub start_code: u16,
    pub start_glyph: GlyphId,
    /// The number of codes in the run; never zero.
    pub len: u16,
}

impl Segment {
    /// The final segment every format 4 subtable ends with.
    pub const SENTINEL: Segment = Segment {
        start_code: 0xFFFF,
        start_glyph: GlyphId::NOTDEF,
        len: 1,
    };

    pub fn end_code(&self) -> u16 {
        self.start_code + (self.len - 1)
    }

    /// `(glyph - code) mod 65536`, constant over the segment.
    pub fn id_delta(&self) -> u16 {
        self.start_glyph.to_u16().wrapping_sub(self.start_code)
    }
}

/// A character to glyph mapping for the Basic Multilingual Plane.
///
/// There is an entry for every UTF-16 code unit; unmapped codes map to
/// [`GlyphId::NOTDEF`].
#[derive(Clone, PartialEq, Eq)]
pub struct Cmap {
    glyphs: Box<[GlyphId]>,
}

impl Cmap {
    /// A map with every code unmapped.
    pub fn new() -> Self {
        Cmap {
            glyphs: vec![GlyphId::NOTDEF; CMAP_LEN].into_boxed_slice(),
        }
    }

    /// Parse a cmap table, decoding its first Windows BMP subtable.
    pub fn read(data: FontData) -> Result<Self> {
        let mut reader = data.reader();
        let header = CMAP_HEADER.decode_stream(&mut reader)?;
        let version: u16 = header.try_get("version")?;
        if version != 0 {
            return Err(Error::UnsupportedVersion {
                table: TAG,
                version: version as u32,
            });
        }
        let num_tables: u16 = header.try_get("num_tables")?;
        let mut subtable_offset = None;
        for _ in 0..num_tables {
            let record = ENCODING_RECORD.decode_stream(&mut reader)?;
            if record.try_get::<u16>("platform_id")? == WINDOWS_PLATFORM
                && record.try_get::<u16>("encoding_id")? == WINDOWS_BMP_ENCODING
            {
                subtable_offset = Some(record.try_get::<u32>("subtable_offset")?);
                break;
            }
        }
        let offset = subtable_offset.ok_or(Error::NoUsableEncoding)?;
        let subtable = data.split_off(offset as usize)?;
        match subtable.read_at::<u16>(0)? {
            4 => Self::read_format4(subtable),
            format => Err(Error::UnsupportedFormat { table: TAG, format }),
        }
    }

    // https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values
    fn read_format4(data: FontData) -> Result<Self> {
        let header = CMAP4_HEADER.decode(data.as_bytes())?;
        let length: u16 = header.try_get("length")?;
        let seg_count = header.try_get::<u16>("seg_count_x2")? as usize / 2;

        let glyph_id_count = (length as usize)
            .checked_sub(CMAP4_HEADER.byte_len() + 8 * seg_count + 2)
            .filter(|len| len % 2 == 0)
            .map(|len| len / 2)
            .ok_or(Error::CorruptSubtable(
                "cmap format 4 glyph id array is not a whole number of glyphs",
            ))?;

        let mut reader = data
            .slice(CMAP4_HEADER.byte_len()..length as usize)?
            .reader();
        let end_codes: Vec<u16> = read_array(&mut reader, seg_count)?;
        record::skip(&mut reader, 2)?;
        let start_codes: Vec<u16> = read_array(&mut reader, seg_count)?;
        let id_deltas: Vec<u16> = read_array(&mut reader, seg_count)?;
        let id_range_offsets: Vec<u16> = read_array(&mut reader, seg_count)?;
        let glyph_ids: Vec<u16> = read_array(&mut reader, glyph_id_count)?;

        let mut cmap = Cmap::new();
        let segments = start_codes
            .iter()
            .zip(&end_codes)
            .zip(id_deltas.iter().zip(&id_range_offsets));
        for (seg_idx, ((&start, &end), (&delta, &range_offset))) in segments.enumerate() {
            for code in start..=end {
                let glyph = if range_offset == 0 {
                    code.wrapping_add(delta)
                } else {
                    // the offset is relative to this segment's idRangeOffset entry
                    let glyph = (range_offset as usize / 2 + seg_idx + (code - start) as usize)
                        .checked_sub(seg_count)
                        .and_then(|idx| glyph_ids.get(idx))
                        .copied()
                        .ok_or(Error::CorruptSubtable(
                            "cmap format 4 idRangeOffset points outside the glyph id array",
                        ))?;
                    match glyph {
                        0 => 0,
                        _ => glyph.wrapping_add(delta),
                    }
                };
                cmap.glyphs[code as usize] = GlyphId::new(glyph);
            }
        }
        Ok(cmap)
    }

    pub fn get(&self, code: u16) -> GlyphId {
        self.glyphs[code as usize]
    }

    pub fn set(&mut self, code: u16, glyph: GlyphId) {
        self.glyphs[code as usize] = glyph;
    }

    /// The glyph for a character; characters outside the BMP are unmapped.
    pub fn map_char(&self, c: char) -> GlyphId {
        u16::try_from(c as u32)
            .map(|code| self.get(code))
            .unwrap_or(GlyphId::NOTDEF)
    }

    /// Map a character to a glyph.
    pub fn set_char(&mut self, c: char, glyph: GlyphId) -> Result<()> {
        let code = u16::try_from(c as u32).map_err(|_| Error::NotInBmp(c))?;
        self.set(code, glyph);
        Ok(())
    }

    /// Iterate over mapped `(code, glyph)` pairs, in code order.
    pub fn iter_mappings(&self) -> impl Iterator<Item = (u16, GlyphId)> + '_ {
        self.glyphs
            .iter()
            .enumerate()
            .filter(|(_, glyph)| **glyph != GlyphId::NOTDEF)
            .map(|(code, glyph)| (code as u16, *glyph))
    }

    /// For each glyph, the lowest character that maps to it.
    pub fn inverse(&self, glyphs: &[GlyphId]) -> Vec<Option<char>> {
        let mut reverse = HashMap::new();
        for (code, glyph) in self.iter_mappings() {
            // surrogate code units are not characters
            if let Some(c) = char::from_u32(code as u32) {
                reverse.entry(glyph).or_insert(c);
            }
        }
        glyphs.iter().map(|glyph| reverse.get(glyph).copied()).collect()
    }

    /// The minimal list of constant-delta segments covering every mapped code,
    /// followed by the sentinel segment.
    ///
    /// Code `0xFFFF` is always covered by the sentinel, so a mapping for it
    /// is not represented.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current: Option<Segment> = None;
        for code in 0..0xFFFFu16 {
            let glyph = self.get(code);
            if let Some(segment) = current.as_mut() {
                if glyph != GlyphId::NOTDEF
                    && glyph.to_u16().wrapping_sub(code) == segment.id_delta()
                {
                    segment.len += 1;
                    continue;
                }
                segments.extend(current.take());
            }
            if glyph != GlyphId::NOTDEF {
                current = Some(Segment {
                    start_code: code,
                    start_glyph: glyph,
                    len: 1,
                });
            }
        }
        segments.extend(current);
        segments.push(Segment::SENTINEL);
        segments
    }

    /// Encode as a cmap table with a single Windows BMP format 4 subtable.
    ///
    /// No glyph id array is used: every segment maps by delta alone.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let segments = self.segments();
        let seg_count = segments.len();
        let length = CMAP4_HEADER.byte_len() + 8 * seg_count + 2;
        if length > u16::MAX as usize {
            return Err(Error::SubtableOverflow(length));
        }
        let computed = SearchRange::compute(seg_count, u16::RAW_BYTE_LEN);

        let mut out = Vec::with_capacity(CMAP_HEADER.byte_len() + ENCODING_RECORD.byte_len() + length);
        CMAP_HEADER
            .construct([("version", Value::from(0u16)), ("num_tables", 1u16.into())])?
            .encode_into(&mut out)?;
        let subtable_offset = (CMAP_HEADER.byte_len() + ENCODING_RECORD.byte_len()) as u32;
        ENCODING_RECORD
            .construct([
                ("platform_id", Value::from(WINDOWS_PLATFORM)),
                ("encoding_id", WINDOWS_BMP_ENCODING.into()),
                ("subtable_offset", subtable_offset.into()),
            ])?
            .encode_into(&mut out)?;
        CMAP4_HEADER
            .construct([
                ("format", Value::from(4u16)),
                ("length", (length as u16).into()),
                ("language", 0u16.into()),
                ("seg_count_x2", (2 * seg_count as u16).into()),
                ("search_range", computed.search_range.into()),
                ("entry_selector", computed.entry_selector.into()),
                ("range_shift", computed.range_shift.into()),
            ])?
            .encode_into(&mut out)?;

        let mut push_words = |words: &mut dyn Iterator<Item = u16>| {
            for word in words {
                out.extend(word.to_be_bytes());
            }
        };
        push_words(&mut segments.iter().map(Segment::end_code));
        push_words(&mut std::iter::once(0)); // reservedPad
        push_words(&mut segments.iter().map(|seg| seg.start_code));
        push_words(&mut segments.iter().map(Segment::id_delta));
        push_words(&mut segments.iter().map(|_| 0)); // idRangeOffset
        Ok(out)
    }
}

impl Default for Cmap {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<u16> for Cmap {
    type Output = GlyphId;

    fn index(&self, code: u16) -> &GlyphId {
        &self.glyphs[code as usize]
    }
}

impl IndexMut<u16> for Cmap {
    fn index_mut(&mut self, code: u16) -> &mut GlyphId {
        &mut self.glyphs[code as usize]
    }
}

impl std::fmt::Debug for Cmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cmap")
            .field("mapped", &self.iter_mappings().count())
            .finish()
    }
}
