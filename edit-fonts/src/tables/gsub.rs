//! The [GSUB (Glyph Substitution)](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub) table
//!
//! Lookups are resolved when the table is read: every subtable becomes a
//! [`Substitution`], and each feature holds the substitutions of the lookups
//! it references. A [`Subber`] runs the substitutions selected for a script
//! and language system over a glyph sequence.

use std::sync::Arc;

use indexmap::IndexMap;
use types::{GlyphId, MajorMinor, Tag};

use super::layout::{self, Coverage, LangSys, Script};
use crate::{
    error::{Error, Result},
    font_data::FontData,
    record::{read_array, read_fields, Format, Value},
    record_schema,
};

/// 'GSUB'
pub const TAG: Tag = Tag::new(b"GSUB");

/// If set, the lookup table is followed by a `markFilteringSet` field.
const USE_MARK_FILTERING_SET: u16 = 0x0010;

record_schema! {
    const GSUB_HEADER = GsubHeader {
        major_version: u16,
        minor_version: u16,
        script_list_offset: u16,
        feature_list_offset: u16,
        lookup_list_offset: u16,
    }
}

record_schema! {
    const LOOKUP_HEADER = LookupHeader {
        lookup_type: u16,
        lookup_flag: u16,
        sub_table_count: u16,
    }
}

record_schema! {
    const LIGATURE_HEADER = LigatureHeader {
        ligature_glyph: u16,
        component_count: u16,
    }
}

/// A substitution subtable, ready to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Substitution {
    /// Single substitution format 1: add a constant to each covered glyph.
    SingleDelta { coverage: Coverage, delta: i16 },
    /// Single substitution format 2: replace each covered glyph with the
    /// substitute at its coverage index.
    SingleList {
        coverage: Coverage,
        substitutes: Vec<GlyphId>,
    },
    /// Ligature substitution: replace a run of glyphs starting with a covered
    /// glyph by a single glyph. The ligature sets are in coverage order.
    Ligature {
        coverage: Coverage,
        ligature_sets: Vec<Vec<Ligature>>,
    },
}

/// One candidate in a ligature set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ligature {
    /// The glyph that replaces the matched run.
    pub glyph: GlyphId,
    /// The glyphs that must follow the covered glyph, in order.
    pub components: Vec<GlyphId>,
}

impl Substitution {
    /// Apply this substitution at `pos`, editing `glyphs` in place.
    ///
    /// Returns a new cursor position if the substitution wants to move the
    /// cursor itself; neither single nor ligature substitution does.
    pub fn apply(&self, glyphs: &mut Vec<GlyphId>, pos: usize) -> Option<usize> {
        match self {
            Substitution::SingleDelta { coverage, delta } => {
                if coverage.lookup(glyphs, pos).is_some() {
                    glyphs[pos] = glyphs[pos].wrapping_add_signed(*delta);
                }
            }
            Substitution::SingleList {
                coverage,
                substitutes,
            } => {
                if let Some(idx) = coverage.lookup(glyphs, pos) {
                    match substitutes.get(idx as usize) {
                        Some(sub) => glyphs[pos] = *sub,
                        None => log::warn!(
                            "no substitute for {} at coverage index {idx}",
                            glyphs[pos]
                        ),
                    }
                }
            }
            Substitution::Ligature {
                coverage,
                ligature_sets,
            } => {
                let Some(set) = coverage
                    .lookup(glyphs, pos)
                    .and_then(|idx| ligature_sets.get(idx as usize))
                else {
                    return None;
                };
                let following = glyphs.get(pos + 1..).unwrap_or_default();
                if let Some(ligature) = set.iter().find(|lig| lig.matches(following)) {
                    let end = pos + 1 + ligature.components.len();
                    glyphs.drain(pos + 1..end);
                    glyphs[pos] = ligature.glyph;
                }
            }
        }
        None
    }

    fn read_single(data: FontData) -> Result<Self> {
        let format: u16 = data.read_at(0)?;
        if !matches!(format, 1 | 2) {
            return Err(Error::UnsupportedFormat {
                table: TAG,
                format,
            });
        }
        let coverage_offset: u16 = data.read_at(2)?;
        let coverage = Coverage::read(data.split_off(coverage_offset as usize)?)?;
        match format {
            1 => Ok(Substitution::SingleDelta {
                coverage,
                delta: data.read_at(4)?,
            }),
            2 => {
                let count: u16 = data.read_at(4)?;
                let substitutes = read_array(&mut data.split_off(6)?.reader(), count as usize)?;
                Ok(Substitution::SingleList {
                    coverage,
                    substitutes,
                })
            }
            other => Err(Error::UnsupportedFormat {
                table: TAG,
                format: other,
            }),
        }
    }

    fn read_ligature(data: FontData) -> Result<Self> {
        let format: u16 = data.read_at(0)?;
        if format != 1 {
            return Err(Error::UnsupportedFormat {
                table: TAG,
                format,
            });
        }
        let coverage_offset: u16 = data.read_at(2)?;
        let set_count: u16 = data.read_at(4)?;
        let coverage = Coverage::read(data.split_off(coverage_offset as usize)?)?;
        let set_offsets: Vec<u16> = read_array(&mut data.split_off(6)?.reader(), set_count as usize)?;
        let ligature_sets = set_offsets
            .into_iter()
            .map(|offset| read_ligature_set(data.split_off(offset as usize)?))
            .collect::<Result<_>>()?;
        Ok(Substitution::Ligature {
            coverage,
            ligature_sets,
        })
    }
}

impl Ligature {
    /// `true` if `following` starts with this ligature's components.
    ///
    /// A ligature without components always matches.
    fn matches(&self, following: &[GlyphId]) -> bool {
        following.starts_with(&self.components)
    }
}

fn read_ligature_set(data: FontData) -> Result<Vec<Ligature>> {
    let count: u16 = data.read_at(0)?;
    let offsets: Vec<u16> = read_array(&mut data.split_off(2)?.reader(), count as usize)?;
    offsets
        .into_iter()
        .map(|offset| {
            let mut reader = data.split_off(offset as usize)?.reader();
            let header = LIGATURE_HEADER.decode_stream(&mut reader)?;
            let component_count: u16 = header.try_get("component_count")?;
            // the first component is the covered glyph
            let components = read_array(&mut reader, component_count.saturating_sub(1) as usize)?;
            Ok(Ligature {
                glyph: GlyphId::new(header.try_get("ligature_glyph")?),
                components,
            })
        })
        .collect()
}

/// Parse the lookup list into the subtables of each lookup.
fn read_lookup_list(data: FontData) -> Result<Vec<Vec<Arc<Substitution>>>> {
    let count: u16 = data.read_at(0)?;
    let offsets: Vec<u16> = read_array(&mut data.split_off(2)?.reader(), count as usize)?;
    offsets
        .into_iter()
        .map(|offset| read_lookup(data.split_off(offset as usize)?))
        .collect()
}

fn read_lookup(data: FontData) -> Result<Vec<Arc<Substitution>>> {
    let mut reader = data.reader();
    let header = LOOKUP_HEADER.decode_stream(&mut reader)?;
    let lookup_type: u16 = header.try_get("lookup_type")?;
    let lookup_flag: u16 = header.try_get("lookup_flag")?;
    let count: u16 = header.try_get("sub_table_count")?;
    let offsets: Vec<u16> = read_array(&mut reader, count as usize)?;
    if lookup_flag & USE_MARK_FILTERING_SET != 0 {
        if let [Value::Unsigned(set)] = read_fields(&mut reader, &[Format::U16])?[..] {
            log::trace!("lookup type {lookup_type} uses mark filtering set {set}");
        }
    }

    let read_subtable = match lookup_type {
        1 => Substitution::read_single,
        4 => Substitution::read_ligature,
        // alternate and chaining context: accepted but not applied
        3 | 6 => {
            log::trace!("skipping {count} subtables of lookup type {lookup_type}");
            return Ok(Vec::new());
        }
        other => return Err(Error::UnsupportedLookupType(other)),
    };
    offsets
        .into_iter()
        .map(|offset| read_subtable(data.split_off(offset as usize)?).map(Arc::new))
        .collect()
}

/// The [GSUB](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub) table.
#[derive(Clone, Debug)]
pub struct Gsub<'a> {
    data: FontData<'a>,
    version: MajorMinor,
    scripts: IndexMap<Tag, Script<Substitution>>,
}

impl<'a> Gsub<'a> {
    /// The script used when none is requested.
    pub const DEFAULT_SCRIPT: Tag = Tag::new(b"DFLT");

    /// Parse a GSUB table and resolve all of its lookups.
    pub fn read(data: FontData<'a>) -> Result<Self> {
        let header = GSUB_HEADER.decode(data.as_bytes())?;
        let version = MajorMinor::new(
            header.try_get("major_version")?,
            header.try_get("minor_version")?,
        );
        if version != MajorMinor::VERSION_1_0 {
            return Err(Error::UnsupportedVersion {
                table: TAG,
                version: u32::from_be_bytes(version.to_be_bytes()),
            });
        }
        let offset = |name: &str| -> Result<FontData<'a>> {
            let offset: u16 = header.try_get(name)?;
            data.split_off(offset as usize)
        };
        let lookups = read_lookup_list(offset("lookup_list_offset")?)?;
        let features = layout::read_feature_list(offset("feature_list_offset")?, &lookups)?;
        let scripts = layout::read_script_list(offset("script_list_offset")?, &features)?;
        Ok(Gsub {
            data,
            version,
            scripts,
        })
    }

    pub fn version(&self) -> MajorMinor {
        self.version
    }

    /// The scripts in this table, keyed by tag, in the order they appear.
    pub fn scripts(&self) -> &IndexMap<Tag, Script<Substitution>> {
        &self.scripts
    }

    /// The bytes of this table.
    ///
    /// Substitutions are not editable, so this is the table as it was read.
    pub fn pack(&self) -> &'a [u8] {
        self.data.as_bytes()
    }

    /// Select the substitutions for a script and language system.
    ///
    /// If `lang_sys` is `None` the script's default language system is used.
    /// The substitutions of each feature for which `enabled` returns `true`
    /// are collected, in the order the language system lists its features.
    pub fn build_subber(
        &self,
        enabled: impl Fn(Tag) -> bool,
        script: Tag,
        lang_sys: Option<Tag>,
    ) -> Result<Subber> {
        let script_table = self
            .scripts
            .get(&script)
            .ok_or(Error::UnknownScript(script))?;
        let lang_sys: &LangSys<Substitution> = match lang_sys {
            None => script_table
                .default_lang_sys()
                .ok_or(Error::NoDefaultLangSys(script))?,
            Some(tag) => script_table
                .lang_sys(tag)
                .ok_or(Error::UnknownLangSys {
                    script,
                    lang_sys: tag,
                })?,
        };
        let subtables = lang_sys
            .features()
            .iter()
            .filter(|feature| enabled(feature.tag()))
            .flat_map(|feature| feature.subtables().iter().cloned())
            .collect();
        Ok(Subber { subtables })
    }
}

/// Applies an ordered list of substitutions to glyph sequences.
#[derive(Clone, Debug, Default)]
pub struct Subber {
    subtables: Vec<Arc<Substitution>>,
}

impl Subber {
    pub fn new(subtables: Vec<Arc<Substitution>>) -> Self {
        Subber { subtables }
    }

    pub fn subtables(&self) -> &[Arc<Substitution>] {
        &self.subtables
    }

    /// Run every substitution at each position of `glyphs` in turn.
    ///
    /// At each position the substitutions are tried in order, each seeing the
    /// edits of those before it. If one reports a new cursor the rest are
    /// skipped and processing resumes there; otherwise the cursor advances
    /// by one.
    ///
    /// None of the supported substitutions reports a new cursor, so for now
    /// every position is visited exactly once.
    pub fn substitute(&self, glyphs: &[GlyphId]) -> Vec<GlyphId> {
        let mut glyphs = glyphs.to_vec();
        let mut pos = 0;
        while pos < glyphs.len() {
            pos = self
                .subtables
                .iter()
                .find_map(|sub| sub.apply(&mut glyphs, pos))
                .unwrap_or(pos + 1);
        }
        glyphs
    }
}
