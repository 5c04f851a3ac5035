//! OpenType Layout common tables, laid out by hand.
//!
//! These follow the shape of the examples in chapter 2 of the OpenType
//! specification: <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2>

#[rustfmt::skip]
pub static COVERAGE_FORMAT1: &[u8] = &[
    0x00, 0x01, // format 1
    0x00, 0x05, // glyphCount
    0x00, 0x38, // glyphArray[0]
    0x00, 0x3B,
    0x00, 0x41,
    0x00, 0x42,
    0x00, 0x4A,
];

#[rustfmt::skip]
pub static COVERAGE_FORMAT2: &[u8] = &[
    0x00, 0x02, // format 2
    0x00, 0x02, // rangeCount
    0x00, 0x4E, // rangeRecords[0].startGlyphID
    0x00, 0x57, // rangeRecords[0].endGlyphID
    0x00, 0x00, // rangeRecords[0].startCoverageIndex
    0x00, 0x89, // rangeRecords[1].startGlyphID
    0x00, 0x89, // rangeRecords[1].endGlyphID
    0x00, 0x0A, // rangeRecords[1].startCoverageIndex
];

/// A script list with three scripts.
///
/// `hani` has no language systems at all, `kana` has only a default, and
/// `latn` has a default plus a Turkish language system.
#[rustfmt::skip]
pub static SCRIPTS: &[u8] = &[
    0x00, 0x03,             // scriptCount
    b'h', b'a', b'n', b'i', // scriptRecords[0].scriptTag
    0x00, 0x14,             // scriptRecords[0].scriptOffset
    b'k', b'a', b'n', b'a',
    0x00, 0x18,
    b'l', b'a', b't', b'n',
    0x00, 0x24,
    // hani, offset 0x14
    0x00, 0x00,             // defaultLangSysOffset: none
    0x00, 0x00,             // langSysCount
    // kana, offset 0x18
    0x00, 0x04,             // defaultLangSysOffset
    0x00, 0x00,             // langSysCount
    0x00, 0x00,             // lookupOrderOffset
    0xFF, 0xFF,             // requiredFeatureIndex: none
    0x00, 0x01,             // featureIndexCount
    0x00, 0x03,             // featureIndices[0]
    // latn, offset 0x24
    0x00, 0x0A,             // defaultLangSysOffset
    0x00, 0x01,             // langSysCount
    b'T', b'R', b'K', b' ', // langSysRecords[0].langSysTag
    0x00, 0x14,             // langSysRecords[0].langSysOffset
    // latn default
    0x00, 0x00,
    0xFF, 0xFF,
    0x00, 0x02,
    0x00, 0x00,
    0x00, 0x02,
    // latn TRK
    0x00, 0x00,
    0xFF, 0xFF,
    0x00, 0x01,
    0x00, 0x01,
];

/// A script with a default language system and an Urdu language system
/// that has a required feature.
#[rustfmt::skip]
pub static SCRIPTS_AND_LANGUAGES: &[u8] = &[
    0x00, 0x0A,             // defaultLangSysOffset
    0x00, 0x01,             // langSysCount
    b'U', b'R', b'D', b' ', // langSysRecords[0].langSysTag
    0x00, 0x16,             // langSysRecords[0].langSysOffset
    // default, offset 0x0A
    0x00, 0x00,             // lookupOrderOffset
    0xFF, 0xFF,             // requiredFeatureIndex: none
    0x00, 0x03,             // featureIndexCount
    0x00, 0x00,             // featureIndices
    0x00, 0x01,
    0x00, 0x02,
    // URD, offset 0x16
    0x00, 0x00,
    0x00, 0x03,             // requiredFeatureIndex
    0x00, 0x03,
    0x00, 0x00,
    0x00, 0x02,
    0x00, 0x03,
];

/// Three `liga` features referencing lookups `[0]`, `[1]` and `[1, 2]`.
#[rustfmt::skip]
pub static FEATURELIST_AND_FEATURE: &[u8] = &[
    0x00, 0x03,             // featureCount
    b'l', b'i', b'g', b'a', // featureRecords[0].featureTag
    0x00, 0x14,             // featureRecords[0].featureOffset
    b'l', b'i', b'g', b'a',
    0x00, 0x1A,
    b'l', b'i', b'g', b'a',
    0x00, 0x20,
    // offset 0x14
    0x00, 0x00,             // featureParamsOffset
    0x00, 0x01,             // lookupIndexCount
    0x00, 0x00,             // lookupListIndices[0]
    // offset 0x1A
    0x00, 0x00,
    0x00, 0x01,
    0x00, 0x01,
    // offset 0x20
    0x00, 0x00,
    0x00, 0x02,
    0x00, 0x01,
    0x00, 0x02,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_in_bounds() {
        assert_eq!(SCRIPTS.len(), 0x40);
        assert_eq!(SCRIPTS_AND_LANGUAGES.len(), 0x22);
        assert_eq!(FEATURELIST_AND_FEATURE.len(), 0x28);
    }
}
