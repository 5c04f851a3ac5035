//! Builders for GSUB tables and their subtables.
//!
//! Offsets are computed as the pieces are assembled, so tests can describe a
//! table by its contents rather than by hand-counted bytes.

use font_types::Tag;

use crate::bebuffer::BeBuffer;

/// The `useMarkFilteringSet` lookup flag.
pub const USE_MARK_FILTERING_SET: u16 = 0x0010;

/// A script in a script list: its default language system and any tagged
/// language systems, each given as a list of feature indices.
#[derive(Clone, Debug, Default)]
pub struct ScriptDef<'a> {
    pub tag: Tag,
    pub default: Option<&'a [u16]>,
    pub lang_systems: &'a [(Tag, &'a [u16])],
}

/// A format 1 coverage table for these (sorted) glyphs.
pub fn coverage(glyphs: &[u16]) -> Vec<u8> {
    BeBuffer::new()
        .push(1u16)
        .push(glyphs.len() as u16)
        .extend(glyphs.iter().copied())
        .into_vec()
}

/// A single substitution format 1 subtable.
pub fn single_subst_format1(covered: &[u16], delta: i16) -> Vec<u8> {
    BeBuffer::new()
        .push(1u16)
        .push(6u16) // coverage follows the header
        .push(delta)
        .extend_bytes(&coverage(covered))
        .into_vec()
}

/// A single substitution format 2 subtable.
///
/// `substitutes` may be shorter than `covered`, to exercise missing entries.
pub fn single_subst_format2(covered: &[u16], substitutes: &[u16]) -> Vec<u8> {
    let header_len = 6 + 2 * substitutes.len();
    BeBuffer::new()
        .push(2u16)
        .push(header_len as u16)
        .push(substitutes.len() as u16)
        .extend(substitutes.iter().copied())
        .extend_bytes(&coverage(covered))
        .into_vec()
}

/// A ligature substitution subtable.
///
/// Each entry is a first glyph with its ligature set, in order; each
/// ligature is `(ligature_glyph, remaining_components)`.
pub fn ligature_subst(sets: &[(u16, &[(u16, &[u16])])]) -> Vec<u8> {
    let first_glyphs: Vec<u16> = sets.iter().map(|(first, _)| *first).collect();
    let set_tables: Vec<Vec<u8>> = sets
        .iter()
        .map(|(_, ligatures)| {
            let ligature_tables: Vec<Vec<u8>> = ligatures
                .iter()
                .map(|(glyph, components)| {
                    BeBuffer::new()
                        .push(*glyph)
                        .push(components.len() as u16 + 1)
                        .extend(components.iter().copied())
                        .into_vec()
                })
                .collect();
            with_children(
                BeBuffer::new().push(ligatures.len() as u16),
                &ligature_tables,
            )
        })
        .collect();

    // format, coverageOffset, ligatureSetCount, ligatureSetOffsets[]
    let header_len = 6 + 2 * sets.len();
    let mut children = vec![coverage(&first_glyphs)];
    children.extend(set_tables);
    let (offsets, tail) = layout(header_len, &children);
    BeBuffer::new()
        .push(1u16)
        .push(offsets[0])
        .push(sets.len() as u16)
        .extend(offsets[1..].iter().copied())
        .extend_bytes(&tail)
        .into_vec()
}

/// A lookup table; a mark filtering set is appended if the flag calls for it.
pub fn lookup(lookup_type: u16, lookup_flag: u16, subtables: &[Vec<u8>]) -> Vec<u8> {
    let use_mark_set = lookup_flag & USE_MARK_FILTERING_SET != 0;
    let header_len = 6 + 2 * subtables.len() + if use_mark_set { 2 } else { 0 };
    let (offsets, tail) = layout(header_len, subtables);
    let mut buf = BeBuffer::new()
        .push(lookup_type)
        .push(lookup_flag)
        .push(subtables.len() as u16)
        .extend(offsets);
    if use_mark_set {
        buf = buf.push(0u16);
    }
    buf.extend_bytes(&tail).into_vec()
}

/// A lookup list containing these lookups.
pub fn lookup_list(lookups: &[Vec<u8>]) -> Vec<u8> {
    with_children(BeBuffer::new().push(lookups.len() as u16), lookups)
}

/// A feature list; each feature references lookups by index.
pub fn feature_list(features: &[(Tag, &[u16])]) -> Vec<u8> {
    let tables: Vec<Vec<u8>> = features
        .iter()
        .map(|(_, lookup_indices)| {
            BeBuffer::new()
                .push(0u16) // featureParamsOffset
                .push(lookup_indices.len() as u16)
                .extend(lookup_indices.iter().copied())
                .into_vec()
        })
        .collect();
    let tags: Vec<Tag> = features.iter().map(|(tag, _)| *tag).collect();
    tagged_list(&tags, &tables)
}

/// A language system table with no required feature.
pub fn lang_sys(feature_indices: &[u16]) -> Vec<u8> {
    BeBuffer::new()
        .push(0u16)
        .push(0xFFFFu16)
        .push(feature_indices.len() as u16)
        .extend(feature_indices.iter().copied())
        .into_vec()
}

/// A script table.
pub fn script(def: &ScriptDef) -> Vec<u8> {
    let header_len = 4 + 6 * def.lang_systems.len();
    let mut children: Vec<Vec<u8>> = def
        .lang_systems
        .iter()
        .map(|(_, features)| lang_sys(features))
        .collect();
    if let Some(default) = def.default {
        children.push(lang_sys(default));
    }
    let (offsets, tail) = layout(header_len, &children);
    let default_offset = if def.default.is_some() {
        offsets[def.lang_systems.len()]
    } else {
        0
    };
    let mut buf = BeBuffer::new()
        .push(default_offset)
        .push(def.lang_systems.len() as u16);
    for ((tag, _), offset) in def.lang_systems.iter().zip(&offsets) {
        buf = buf.push(*tag).push(*offset);
    }
    buf.extend_bytes(&tail).into_vec()
}

/// A script list.
pub fn script_list(scripts: &[ScriptDef]) -> Vec<u8> {
    let tables: Vec<Vec<u8>> = scripts.iter().map(script).collect();
    let tags: Vec<Tag> = scripts.iter().map(|def| def.tag).collect();
    tagged_list(&tags, &tables)
}

/// A version 1.0 GSUB table.
pub fn gsub(scripts: &[ScriptDef], features: &[(Tag, &[u16])], lookups: &[Vec<u8>]) -> Vec<u8> {
    gsub_with_version(1, 0, scripts, features, lookups)
}

pub fn gsub_with_version(
    major: u16,
    minor: u16,
    scripts: &[ScriptDef],
    features: &[(Tag, &[u16])],
    lookups: &[Vec<u8>],
) -> Vec<u8> {
    let children = [
        script_list(scripts),
        feature_list(features),
        lookup_list(lookups),
    ];
    let (offsets, tail) = layout(10, &children);
    BeBuffer::new()
        .push(major)
        .push(minor)
        .extend(offsets)
        .extend_bytes(&tail)
        .into_vec()
}

/// A GSUB table with one `DFLT` script and two features.
///
/// - `liga` (feature 0) ligates `[1, 2, 3]` to 30 and `[1, 2]` to 31.
/// - `smcp` (feature 1) maps glyphs 4 and 5 up by 100, and glyph 6 to 60.
///
/// The default language system enables both; the `TRK ` language system
/// enables only `smcp`.
pub fn simple_gsub() -> Vec<u8> {
    let liga = lookup(4, 0, &[ligature_subst(&[(1, &[(30, &[2, 3]), (31, &[2])])])]);
    let smcp = lookup(
        1,
        0,
        &[single_subst_format1(&[4, 5], 100), single_subst_format2(&[6], &[60])],
    );
    gsub(
        &[ScriptDef {
            tag: Tag::new(b"DFLT"),
            default: Some(&[0, 1]),
            lang_systems: &[(Tag::new(b"TRK "), &[1])],
        }],
        &[(Tag::new(b"liga"), &[0]), (Tag::new(b"smcp"), &[1])],
        &[liga, smcp],
    )
}

/// Compute offsets for `children` laid out one after another, starting
/// `header_len` bytes from the start of their parent.
fn layout(header_len: usize, children: &[Vec<u8>]) -> (Vec<u16>, Vec<u8>) {
    let mut offsets = Vec::with_capacity(children.len());
    let mut tail = Vec::new();
    for child in children {
        offsets.push((header_len + tail.len()) as u16);
        tail.extend_from_slice(child);
    }
    (offsets, tail)
}

/// `header` followed by an offset array to `children`.
fn with_children(header: BeBuffer, children: &[Vec<u8>]) -> Vec<u8> {
    let (offsets, tail) = layout(header.len() + 2 * children.len(), children);
    header.extend(offsets).extend_bytes(&tail).into_vec()
}

/// A count followed by `(tag, offset)` records.
fn tagged_list(tags: &[Tag], tables: &[Vec<u8>]) -> Vec<u8> {
    let (offsets, tail) = layout(2 + 6 * tags.len(), tables);
    let mut buf = BeBuffer::new().push(tags.len() as u16);
    for (tag, offset) in tags.iter().zip(offsets) {
        buf = buf.push(*tag).push(offset);
    }
    buf.extend_bytes(&tail).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_format1_layout() {
        let bytes = single_subst_format1(&[4], -1);
        assert_eq!(bytes, [0, 1, 0, 6, 0xFF, 0xFF, 0, 1, 0, 1, 0, 4]);
    }

    #[test]
    fn lookup_with_mark_filtering_set() {
        let sub = vec![0xAAu8, 0xBB];
        let bytes = lookup(1, USE_MARK_FILTERING_SET, &[sub]);
        // type, flag, count, offset, markFilteringSet, subtable
        assert_eq!(bytes, [0, 1, 0, 0x10, 0, 1, 0, 10, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn script_default_follows_lang_systems() {
        let bytes = script(&ScriptDef {
            tag: Tag::new(b"latn"),
            default: Some(&[7]),
            lang_systems: &[(Tag::new(b"TRK "), &[])],
        });
        // header 10, TRK langsys 6, default langsys 8
        assert_eq!(&bytes[..2], &[0, 16]);
        assert_eq!(&bytes[8..10], &[0, 10]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[22..], &[0, 7]);
    }
}
