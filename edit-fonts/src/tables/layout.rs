//! OpenType Layout common table formats
//!
//! Coverage tables, and the script, language system and feature lists shared
//! by GSUB and GPOS. The feature list is resolved against already-parsed
//! lookups, so a [`Feature`] owns its procedures directly rather than a list
//! of lookup indices.

use std::sync::Arc;

use indexmap::IndexMap;
use types::{GlyphId, Tag};

use crate::{
    error::{Error, Result},
    font_data::FontData,
    record::read_array,
    record_schema,
};

record_schema! {
    /// A `(tag, offset)` pair from a script, language system or feature list.
    pub(crate) const TAG_RECORD = TagRecord {
        tag: Tag,
        offset: u16,
    }
}

record_schema! {
    /// A run of consecutive glyph ids in a format 2 coverage table.
    pub(crate) const RANGE_RECORD = RangeRecord {
        start_glyph_id: u16,
        end_glyph_id: u16,
        start_coverage_index: u16,
    }
}

record_schema! {
    pub(crate) const LANG_SYS_HEADER = LangSysHeader {
        lookup_order_offset: u16,
        required_feature_index: u16,
        feature_index_count: u16,
    }
}

record_schema! {
    pub(crate) const FEATURE_HEADER = FeatureHeader {
        feature_params_offset: u16,
        lookup_index_count: u16,
    }
}

const COVERAGE_TAG: Tag = Tag::new(b"Cvrg");

/// A [Coverage table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)
///
/// Maps a set of glyphs to dense, zero-based coverage indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// An explicit list of glyphs, in ascending order.
    Format1(Vec<GlyphId>),
    /// Disjoint ranges of glyphs, in ascending order.
    Format2(Vec<RangeRecord>),
}

/// A range of glyphs in a format 2 [`Coverage`] table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeRecord {
    pub start_glyph_id: GlyphId,
    pub end_glyph_id: GlyphId,
    /// The coverage index of `start_glyph_id`.
    pub start_coverage_index: u16,
}

impl Coverage {
    /// Parse a coverage table at the start of `data`.
    pub fn read(data: FontData) -> Result<Self> {
        let format: u16 = data.read_at(0)?;
        let count: u16 = data.read_at(2)?;
        let mut reader = data.split_off(4)?.reader();
        match format {
            1 => read_array(&mut reader, count as usize).map(Coverage::Format1),
            2 => (0..count)
                .map(|_| {
                    let record = RANGE_RECORD.decode_stream(&mut reader)?;
                    Ok(RangeRecord {
                        start_glyph_id: GlyphId::new(record.try_get("start_glyph_id")?),
                        end_glyph_id: GlyphId::new(record.try_get("end_glyph_id")?),
                        start_coverage_index: record.try_get("start_coverage_index")?,
                    })
                })
                .collect::<Result<_>>()
                .map(Coverage::Format2),
            other => Err(Error::UnsupportedFormat {
                table: COVERAGE_TAG,
                format: other,
            }),
        }
    }

    /// The coverage index for this glyph, if it is covered.
    pub fn get(&self, glyph: GlyphId) -> Option<u16> {
        match self {
            Coverage::Format1(glyphs) => glyphs
                .iter()
                .position(|gid| *gid == glyph)
                .map(|idx| idx as u16),
            Coverage::Format2(ranges) => ranges
                .iter()
                .find(|range| range.start_glyph_id <= glyph && glyph <= range.end_glyph_id)
                .map(|range| {
                    range
                        .start_coverage_index
                        .wrapping_add(glyph.to_u16() - range.start_glyph_id.to_u16())
                }),
        }
    }

    /// The coverage index of the glyph at `pos` in `glyphs`.
    ///
    /// Only `glyphs[pos]` is examined; a position past the end is not covered.
    pub fn lookup(&self, glyphs: &[GlyphId], pos: usize) -> Option<u16> {
        glyphs.get(pos).and_then(|glyph| self.get(*glyph))
    }

    /// Iterate over the covered glyphs, in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId> + '_ {
        // all one expression so that we have a single return type
        let (iter1, iter2) = match self {
            Coverage::Format1(glyphs) => (Some(glyphs.iter().copied()), None),
            Coverage::Format2(ranges) => (None, Some(ranges.iter().flat_map(RangeRecord::iter))),
        };

        iter1
            .into_iter()
            .flatten()
            .chain(iter2.into_iter().flatten())
    }
}

impl RangeRecord {
    fn iter(&self) -> impl Iterator<Item = GlyphId> + '_ {
        (self.start_glyph_id.to_u16()..=self.end_glyph_id.to_u16()).map(GlyphId::new)
    }
}

/// A feature, with the lookup subtables it enables already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feature<T> {
    tag: Tag,
    params: u16,
    subtables: Vec<Arc<T>>,
}

impl<T> Feature<T> {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The raw offset to the feature parameters table; zero if there is none.
    ///
    /// Feature parameters are not interpreted.
    pub fn params(&self) -> u16 {
        self.params
    }

    /// The subtables of every lookup this feature references, in lookup
    /// list order.
    pub fn subtables(&self) -> &[Arc<T>] {
        &self.subtables
    }
}

/// A [language system table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#language-system-table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LangSys<T> {
    /// Reserved; always null in practice.
    pub lookup_order: u16,
    /// Index of a feature required for this language system, or `0xFFFF`.
    pub required_feature_index: u16,
    features: Vec<Arc<Feature<T>>>,
}

impl<T> LangSys<T> {
    /// The features selectable in this language system, in the order listed.
    pub fn features(&self) -> &[Arc<Feature<T>>] {
        &self.features
    }

    fn read(data: FontData, feature_list: &[Arc<Feature<T>>]) -> Result<Self> {
        let mut reader = data.reader();
        let header = LANG_SYS_HEADER.decode_stream(&mut reader)?;
        let count: u16 = header.try_get("feature_index_count")?;
        let features = read_array::<u16>(&mut reader, count as usize)?
            .into_iter()
            .map(|idx| {
                feature_list
                    .get(idx as usize)
                    .cloned()
                    .ok_or(Error::CorruptSubtable("feature index out of range"))
            })
            .collect::<Result<_>>()?;
        Ok(LangSys {
            lookup_order: header.try_get("lookup_order_offset")?,
            required_feature_index: header.try_get("required_feature_index")?,
            features,
        })
    }
}

/// A [script table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script<T> {
    default_lang_sys: Option<LangSys<T>>,
    lang_systems: IndexMap<Tag, LangSys<T>>,
}

impl<T> Script<T> {
    pub fn default_lang_sys(&self) -> Option<&LangSys<T>> {
        self.default_lang_sys.as_ref()
    }

    pub fn lang_sys(&self, tag: Tag) -> Option<&LangSys<T>> {
        self.lang_systems.get(&tag)
    }

    /// The tagged language systems, in the order they appear in the font.
    pub fn lang_systems(&self) -> impl Iterator<Item = (Tag, &LangSys<T>)> + '_ {
        self.lang_systems.iter().map(|(tag, sys)| (*tag, sys))
    }

    fn read(data: FontData, feature_list: &[Arc<Feature<T>>]) -> Result<Self> {
        let default_offset: u16 = data.read_at(0)?;
        let count: u16 = data.read_at(2)?;
        let default_lang_sys = match default_offset {
            0 => None,
            offset => Some(LangSys::read(data.split_off(offset as usize)?, feature_list)?),
        };
        let mut lang_systems = IndexMap::with_capacity(count as usize);
        for (tag, offset) in read_tag_records(data.split_off(4)?, count)? {
            let lang_sys = LangSys::read(data.split_off(offset as usize)?, feature_list)?;
            lang_systems.insert(tag, lang_sys);
        }
        Ok(Script {
            default_lang_sys,
            lang_systems,
        })
    }
}

/// Parse a [script list](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record).
///
/// If a script tag appears more than once the last entry wins.
pub(crate) fn read_script_list<T>(
    data: FontData,
    feature_list: &[Arc<Feature<T>>],
) -> Result<IndexMap<Tag, Script<T>>> {
    let count: u16 = data.read_at(0)?;
    read_tag_records(data.split_off(2)?, count)?
        .into_iter()
        .map(|(tag, offset)| {
            let script = Script::read(data.split_off(offset as usize)?, feature_list)?;
            Ok((tag, script))
        })
        .collect()
}

/// Parse a [feature list](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-list-table),
/// resolving each feature's lookup indices against `lookups`.
pub(crate) fn read_feature_list<T>(
    data: FontData,
    lookups: &[Vec<Arc<T>>],
) -> Result<Vec<Arc<Feature<T>>>> {
    let count: u16 = data.read_at(0)?;
    read_tag_records(data.split_off(2)?, count)?
        .into_iter()
        .map(|(tag, offset)| {
            let mut reader = data.split_off(offset as usize)?.reader();
            let header = FEATURE_HEADER.decode_stream(&mut reader)?;
            let index_count: u16 = header.try_get("lookup_index_count")?;
            let mut subtables = Vec::new();
            for idx in read_array::<u16>(&mut reader, index_count as usize)? {
                let lookup = lookups
                    .get(idx as usize)
                    .ok_or(Error::CorruptSubtable("lookup index out of range"))?;
                subtables.extend(lookup.iter().cloned());
            }
            Ok(Arc::new(Feature {
                tag,
                params: header.try_get("feature_params_offset")?,
                subtables,
            }))
        })
        .collect()
}

fn read_tag_records(data: FontData, count: u16) -> Result<Vec<(Tag, u16)>> {
    let mut reader = data.reader();
    (0..count)
        .map(|_| {
            let record = TAG_RECORD.decode_stream(&mut reader)?;
            Ok((record.try_get("tag")?, record.try_get("offset")?))
        })
        .collect()
}
