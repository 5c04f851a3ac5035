//! The [head](https://docs.microsoft.com/en-us/typography/opentype/spec/head) table

use types::Tag;

use crate::{
    error::Result,
    font_data::FontData,
    record::Record,
    record_schema,
};

/// 'head'
pub const TAG: Tag = Tag::new(b"head");

record_schema! {
    pub(crate) const HEAD_RECORD = Head {
        major_version: u16,
        minor_version: u16,
        font_revision: u32,
        checksum_adjustment: u32,
        magic_number: u32,
        flags: u16,
        units_per_em: u16,
        created: i64,
        modified: i64,
        x_min: i16,
        y_min: i16,
        x_max: i16,
        y_max: i16,
        mac_style: u16,
        lowest_rec_ppem: u16,
        font_direction_hint: i16,
        index_to_loc_format: i16,
        glyph_data_format: i16,
    }
}

/// The [head](https://docs.microsoft.com/en-us/typography/opentype/spec/head)
/// (font header) table.
///
/// Every field is kept as read; only the checksum adjustment is rewritten
/// when a font is saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Head {
    record: Record,
}

macro_rules! head_field {
    ($(#[$attr:meta])* $name:ident: $ty:ty) => {
        $(#[$attr])*
        pub fn $name(&self) -> $ty {
            self.record.get(stringify!($name)).unwrap_or_default()
        }
    };
}

impl Head {
    /// Parse the table; any bytes past the fixed-size record are ignored.
    pub fn read(data: FontData) -> Result<Self> {
        HEAD_RECORD
            .decode(data.as_bytes())
            .map(|record| Head { record })
    }

    head_field!(major_version: u16);
    head_field!(minor_version: u16);
    head_field!(
        /// Set by the font manufacturer, as a 16.16 fixed-point number.
        font_revision: u32
    );
    head_field!(
        /// `0xB1B0AFBA` minus the checksum of the whole font.
        checksum_adjustment: u32
    );
    head_field!(
        /// Set to `0x5F0F3CF5`.
        magic_number: u32
    );
    head_field!(flags: u16);
    head_field!(units_per_em: u16);
    head_field!(
        /// Seconds since 12:00 midnight, January 1st 1904, UTC.
        created: i64
    );
    head_field!(modified: i64);
    head_field!(x_min: i16);
    head_field!(y_min: i16);
    head_field!(x_max: i16);
    head_field!(y_max: i16);
    head_field!(mac_style: u16);
    head_field!(
        /// Smallest readable size in pixels.
        lowest_rec_ppem: u16
    );
    head_field!(font_direction_hint: i16);
    head_field!(
        /// 0 for short `loca` offsets, 1 for long.
        index_to_loc_format: i16
    );
    head_field!(glyph_data_format: i16);

    pub fn set_checksum_adjustment(&mut self, adjustment: u32) -> Result<()> {
        self.record.set("checksum_adjustment", adjustment)
    }

    /// The decoded record, for access to fields by name.
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        self.record.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, record::Value};
    use font_test_data::font::head_table;

    #[test]
    fn read_fields() {
        let bytes = head_table(0xDEADBEEF);
        let head = Head::read(FontData::new(&bytes)).unwrap();
        assert_eq!(head.major_version(), 1);
        assert_eq!(head.minor_version(), 0);
        assert_eq!(head.font_revision(), 0x0001_8000);
        assert_eq!(head.checksum_adjustment(), 0xDEADBEEF);
        assert_eq!(head.magic_number(), 0x5F0F3CF5);
        assert_eq!(head.units_per_em(), 1000);
        assert_eq!(head.created(), 3_600_000_000);
        assert_eq!(head.x_min(), -50);
        assert_eq!(head.y_min(), -200);
        assert_eq!(head.lowest_rec_ppem(), 8);
        assert_eq!(head.font_direction_hint(), 2);
        assert_eq!(HEAD_RECORD.byte_len(), 54);
        assert_eq!(HEAD_RECORD.offset_of("checksum_adjustment"), Some(8));
    }

    #[test]
    fn pack_is_identity() {
        let bytes = head_table(42);
        let head = Head::read(FontData::new(&bytes)).unwrap();
        assert_eq!(head.pack().unwrap(), bytes);
    }

    #[test]
    fn only_adjustment_changes() {
        let bytes = head_table(42);
        let mut head = Head::read(FontData::new(&bytes)).unwrap();
        head.set_checksum_adjustment(0x1234_5678).unwrap();
        let packed = head.pack().unwrap();
        assert_eq!(&packed[8..12], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(&packed[..8], &bytes[..8]);
        assert_eq!(&packed[12..], &bytes[12..]);
    }

    #[test]
    fn edits_by_name() {
        let bytes = head_table(0);
        let mut head = Head::read(FontData::new(&bytes)).unwrap();
        head.record_mut().set("units_per_em", 2048u16).unwrap();
        assert_eq!(head.units_per_em(), 2048);
        assert_eq!(
            head.record_mut().set("units_per_em", -1i16),
            Err(Error::FieldRange {
                field: "units_per_em",
                value: Value::Signed(-1)
            })
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = head_table(0);
        bytes.extend([0xAA, 0xBB]);
        let head = Head::read(FontData::new(&bytes)).unwrap();
        assert_eq!(head.pack().unwrap().len(), 54);
    }

    #[test]
    fn truncated() {
        let bytes = head_table(0);
        assert_eq!(
            Head::read(FontData::new(&bytes[..50])),
            Err(Error::TruncatedInput {
                needed: 54,
                available: 50
            })
        );
    }
}
