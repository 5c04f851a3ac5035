//! Parse, edit and save whole fonts.

use edit_fonts::{
    record_schema,
    tables::{cmap, compute_checksum, gsub::Gsub, head},
    types::{GlyphId, Tag},
    OpenTypeFont, CHECKSUM_MAGIC,
};
use font_test_data::font::{self as test_data, OPAQUE_TABLE};
use pretty_assertions::assert_eq;

record_schema! {
    const TABLE_RECORD = TableRecord {
        tag: Tag,
        checksum: u32,
        offset: u32,
        length: u32,
    }
}

struct DirEntry {
    tag: Tag,
    checksum: u32,
    offset: usize,
    length: usize,
}

fn directory(font: &[u8]) -> Vec<DirEntry> {
    let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
    (0..num_tables)
        .map(|i| {
            let record = TABLE_RECORD.decode(&font[12 + 16 * i..]).unwrap();
            DirEntry {
                tag: record.try_get("tag").unwrap(),
                checksum: record.try_get("checksum").unwrap(),
                offset: record.try_get::<u32>("offset").unwrap() as usize,
                length: record.try_get::<u32>("length").unwrap() as usize,
            }
        })
        .collect()
}

fn table_data<'a>(font: &'a [u8], tag: Tag) -> &'a [u8] {
    let entry = directory(font)
        .into_iter()
        .find(|entry| entry.tag == tag)
        .unwrap();
    &font[entry.offset..entry.offset + entry.length]
}

fn glyphs(ids: &[u16]) -> Vec<GlyphId> {
    ids.iter().copied().map(GlyphId::new).collect()
}

fn save(bytes: &[u8]) -> Vec<u8> {
    OpenTypeFont::parse(bytes).unwrap().save().unwrap()
}

#[test]
fn edit_cmap_and_reload() {
    let _ = env_logger::builder().is_test(true).try_init();
    let bytes = test_data::minimal_font();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    assert_eq!(font.get_glyphs("a").unwrap(), glyphs(&[0x10]));

    let cmap = font.cmap().unwrap().unwrap();
    let b = cmap[0x62];
    cmap[0x61] = b;
    let saved = font.save().unwrap();

    let mut reloaded = OpenTypeFont::parse(&saved).unwrap();
    assert_eq!(reloaded.cmap().unwrap().unwrap()[0x61], GlyphId::new(0x11));
    assert_eq!(reloaded.get_glyphs("ab").unwrap(), glyphs(&[0x11, 0x11]));
}

#[test]
fn cmap_mappings_survive_reencoding() {
    let bytes = test_data::minimal_font();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    let before: Vec<_> = font.cmap().unwrap().unwrap().iter_mappings().collect();
    // a deliberately fragmented map
    font.cmap().unwrap().unwrap()[0x4E00] = GlyphId::new(3);
    let saved = font.save().unwrap();

    let mut reloaded = OpenTypeFont::parse(&saved).unwrap();
    let after: Vec<_> = reloaded.cmap().unwrap().unwrap().iter_mappings().collect();
    assert_eq!(after.len(), before.len() + 1);
    assert!(before.iter().all(|mapping| after.contains(mapping)));
    assert!(after.contains(&(0x4E00, GlyphId::new(3))));
}

#[test]
fn unmapped_characters() {
    let bytes = test_data::minimal_font();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    assert_eq!(
        font.get_glyphs("xyz\u{1F600}").unwrap(),
        glyphs(&[0x20, 0, 0x22, 0])
    );
}

#[test]
fn inverse_mapping() {
    let bytes = test_data::minimal_font();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    assert_eq!(
        font.inv_glyphs(&glyphs(&[0x10, 0x22, 0x99])).unwrap(),
        [Some('a'), Some('z'), None]
    );
}

#[test]
fn substitutions_through_font() {
    let bytes = test_data::minimal_font();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    let gsub = font.gsub().unwrap().unwrap();
    let liga = gsub
        .build_subber(|tag| tag == Tag::new(b"liga"), Gsub::DEFAULT_SCRIPT, None)
        .unwrap();
    assert_eq!(liga.substitute(&glyphs(&[1, 2, 3, 4])), glyphs(&[30, 4]));
    assert_eq!(liga.substitute(&glyphs(&[1, 2, 9])), glyphs(&[31, 9]));

    // with nothing enabled the default glyphs come back unchanged
    assert_eq!(font.get_glyphs("abc").unwrap(), glyphs(&[0x10, 0x11, 0x12]));
}

#[test]
fn font_without_gsub() {
    let bytes = test_data::font_without_gsub();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    assert!(font.gsub().unwrap().is_none());
    assert_eq!(font.get_glyphs("abz").unwrap(), glyphs(&[0x10, 0x11, 0x22]));
}

#[test]
fn directory_sorted_by_tag() {
    let saved = save(&test_data::minimal_font());
    let tags: Vec<_> = directory(&saved).iter().map(|entry| entry.tag).collect();
    assert_eq!(
        tags,
        [gsub_tag(), cmap::TAG, head::TAG, Tag::new(b"zzzz")],
        "uppercase sorts first"
    );
}

fn gsub_tag() -> Tag {
    Tag::new(b"GSUB")
}

#[test]
fn tables_aligned_and_checksummed() {
    let bytes = test_data::minimal_font();
    let mut font = OpenTypeFont::parse(&bytes).unwrap();
    // force the cmap to be re-encoded
    font.cmap().unwrap().unwrap()[0x41] = GlyphId::new(5);
    let saved = font.save().unwrap();

    for entry in directory(&saved) {
        assert_eq!(entry.offset % 4, 0, "'{}' is not aligned", entry.tag);
        let data = &saved[entry.offset..entry.offset + entry.length];
        if entry.tag == head::TAG {
            // the head checksum is taken before the adjustment is written
            let mut data = data.to_vec();
            data[8..12].copy_from_slice(&[0; 4]);
            assert_eq!(entry.checksum, compute_checksum(&data));
        } else {
            assert_eq!(entry.checksum, compute_checksum(data), "'{}'", entry.tag);
        }
    }
    // the last table is padded out to a four byte boundary
    assert_eq!(saved.len() % 4, 0);
}

#[test]
fn opaque_table_preserved() {
    let saved = save(&test_data::minimal_font());
    assert_eq!(table_data(&saved, Tag::new(b"zzzz")), OPAQUE_TABLE);
    assert_eq!(
        table_data(&saved, gsub_tag()),
        font_test_data::gsub::simple_gsub().as_slice()
    );
}

#[test]
fn whole_font_checksum() {
    let saved = save(&test_data::minimal_font());
    assert_eq!(compute_checksum(&saved), CHECKSUM_MAGIC);
    let head_bytes = table_data(&saved, head::TAG);
    assert_ne!(&head_bytes[8..12], &[0; 4]);
}

#[test]
fn adjustment_is_summed_as_found() {
    let stale = 0xDEADBEEF;
    let head_bytes = test_data::head_table(stale);
    let cmap_bytes = font_test_data::cmap::simple_cmap();
    let bytes = test_data::sfnt(&[
        (head::TAG, head_bytes.as_slice()),
        (cmap::TAG, cmap_bytes.as_slice()),
    ]);
    let saved = save(&bytes);
    assert_eq!(
        compute_checksum(&saved),
        CHECKSUM_MAGIC.wrapping_sub(stale)
    );
}

#[test]
fn head_checksum_uses_stale_adjustment() {
    let stale = 0xDEADBEEF;
    let source_head = test_data::head_table(stale);
    let cmap_bytes = font_test_data::cmap::simple_cmap();
    let bytes = test_data::sfnt(&[
        (head::TAG, source_head.as_slice()),
        (cmap::TAG, cmap_bytes.as_slice()),
    ]);
    let saved = save(&bytes);

    let entry = directory(&saved)
        .into_iter()
        .find(|entry| entry.tag == head::TAG)
        .unwrap();
    assert_eq!(entry.checksum, compute_checksum(&source_head));
    let written = &saved[entry.offset..entry.offset + entry.length];
    assert_eq!(&written[..8], &source_head[..8]);
    assert_eq!(&written[12..], &source_head[12..]);
}

#[test]
fn resave_sums_to_magic_less_previous_adjustment() {
    let first = save(&test_data::minimal_font());
    let head_bytes = table_data(&first, head::TAG);
    let previous = u32::from_be_bytes(head_bytes[8..12].try_into().unwrap());
    let second = save(&first);
    assert_eq!(first.len(), second.len());
    assert_eq!(
        compute_checksum(&second),
        CHECKSUM_MAGIC.wrapping_sub(previous)
    );
}

#[test]
fn head_fields_survive() {
    let saved = save(&test_data::minimal_font());
    let mut font = OpenTypeFont::parse(&saved).unwrap();
    let head = font.head().unwrap().unwrap();
    assert_eq!(head.units_per_em(), 1000);
    assert_eq!(head.magic_number(), 0x5F0F3CF5);
    assert_eq!((head.x_min(), head.y_max()), (-50, 800));
    assert_eq!(head.modified(), 3_700_000_000);
}
