//! The top-level font object: a table directory and its tables.

use std::borrow::Cow;

use types::{GlyphId, Tag, TT_SFNT_VERSION};

use crate::{
    error::{Error, Result},
    font_data::FontData,
    record::Value,
    record_schema,
    tables::{
        self,
        cmap::{self, Cmap},
        gsub::{self, Gsub},
        head::{self, Head},
    },
    util::{round4, SearchRange},
};

/// The whole-font checksum that the `head` checksum adjustment makes up.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/head>
pub const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

record_schema! {
    pub(crate) const OFFSET_TABLE = TableDirectory {
        sfnt_version: u32,
        num_tables: u16,
        search_range: u16,
        entry_selector: u16,
        range_shift: u16,
    }
}

record_schema! {
    pub(crate) const TABLE_RECORD = TableRecord {
        tag: Tag,
        checksum: u32,
        offset: u32,
        length: u32,
    }
}

/// A table whose contents have not been decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawTable<'a> {
    tag: Tag,
    data: FontData<'a>,
}

impl<'a> RawTable<'a> {
    pub fn new(tag: Tag, data: impl Into<FontData<'a>>) -> Self {
        RawTable {
            tag,
            data: data.into(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }

    /// Decode the table, if its tag is one this crate understands.
    fn decode(&self) -> Result<Option<Table<'a>>> {
        let table = match self.tag {
            head::TAG => Table::Head(Head::read(self.data)?),
            cmap::TAG => Table::Cmap(Cmap::read(self.data)?),
            gsub::TAG => Table::Gsub(Gsub::read(self.data)?),
            _ => return Ok(None),
        };
        Ok(Some(table))
    }
}

/// One slot in a font's table list.
///
/// Tables start out [`Raw`](Table::Raw) and are replaced by their decoded
/// form the first time they are requested through [`OpenTypeFont::get`].
#[derive(Clone, Debug)]
pub enum Table<'a> {
    Raw(RawTable<'a>),
    Head(Head),
    Cmap(Cmap),
    Gsub(Gsub<'a>),
}

impl<'a> Table<'a> {
    pub fn tag(&self) -> Tag {
        match self {
            Table::Raw(raw) => raw.tag,
            Table::Head(_) => head::TAG,
            Table::Cmap(_) => cmap::TAG,
            Table::Gsub(_) => gsub::TAG,
        }
    }

    /// `true` if this table has not been decoded.
    pub fn is_raw(&self) -> bool {
        matches!(self, Table::Raw(_))
    }

    /// The bytes of this table, reflecting any edits.
    pub fn pack(&self) -> Result<Cow<'a, [u8]>> {
        Ok(match self {
            Table::Raw(raw) => Cow::Borrowed(raw.data.as_bytes()),
            Table::Head(head) => Cow::Owned(head.pack()?),
            Table::Cmap(cmap) => Cow::Owned(cmap.pack()?),
            Table::Gsub(gsub) => Cow::Borrowed(gsub.pack()),
        })
    }
}

impl<'a> From<RawTable<'a>> for Table<'a> {
    fn from(src: RawTable<'a>) -> Table<'a> {
        Table::Raw(src)
    }
}

impl From<Head> for Table<'_> {
    fn from(src: Head) -> Self {
        Table::Head(src)
    }
}

impl From<Cmap> for Table<'_> {
    fn from(src: Cmap) -> Self {
        Table::Cmap(src)
    }
}

impl<'a> From<Gsub<'a>> for Table<'a> {
    fn from(src: Gsub<'a>) -> Self {
        Table::Gsub(src)
    }
}

/// An OpenType font, with tables decoded on demand.
///
/// Tables are kept in the order in which their data appeared in the source
/// file. Lookups by tag return the first matching table; duplicate tags are
/// kept as they are.
#[derive(Clone, Debug)]
pub struct OpenTypeFont<'a> {
    sfnt_version: u32,
    tables: Vec<Table<'a>>,
}

impl Default for OpenTypeFont<'_> {
    fn default() -> Self {
        OpenTypeFont::new(TT_SFNT_VERSION)
    }
}

impl<'a> OpenTypeFont<'a> {
    /// A font with no tables.
    pub fn new(sfnt_version: u32) -> Self {
        OpenTypeFont {
            sfnt_version,
            tables: Vec::new(),
        }
    }

    /// Read the table directory of a font.
    ///
    /// No table is decoded here; each is kept as a view into `data` until it
    /// is first requested.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let data = FontData::new(data);
        let mut reader = data.reader();
        let header = OFFSET_TABLE.decode_stream(&mut reader)?;
        let num_tables: u16 = header.try_get("num_tables")?;
        let mut records = (0..num_tables)
            .map(|_| {
                let record = TABLE_RECORD.decode_stream(&mut reader)?;
                Ok((
                    record.try_get::<Tag>("tag")?,
                    record.try_get::<u32>("offset")? as usize,
                    record.try_get::<u32>("length")? as usize,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        records.sort_by_key(|(_, offset, _)| *offset);

        let tables = records
            .into_iter()
            .map(|(tag, offset, length)| {
                let end = offset.checked_add(length).ok_or(Error::TruncatedInput {
                    needed: usize::MAX,
                    available: data.len(),
                })?;
                Ok(Table::Raw(RawTable::new(tag, data.slice(offset..end)?)))
            })
            .collect::<Result<_>>()?;
        Ok(OpenTypeFont {
            sfnt_version: header.try_get("sfnt_version")?,
            tables,
        })
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// The tables, in layout order.
    pub fn tables(&self) -> &[Table<'a>] {
        &self.tables
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.iter().map(Table::tag)
    }

    /// The first table with this tag, decoding it if necessary.
    ///
    /// Tables with tags this crate does not understand are returned raw.
    pub fn get(&mut self, tag: Tag) -> Result<Option<&mut Table<'a>>> {
        let Some(slot) = self.tables.iter_mut().find(|table| table.tag() == tag) else {
            return Ok(None);
        };
        let decoded = match &*slot {
            Table::Raw(raw) => raw.decode()?,
            _ => None,
        };
        if let Some(decoded) = decoded {
            log::debug!("decoded '{tag}' table");
            *slot = decoded;
        }
        Ok(Some(slot))
    }

    pub fn head(&mut self) -> Result<Option<&mut Head>> {
        Ok(match self.get(head::TAG)? {
            Some(Table::Head(head)) => Some(head),
            _ => None,
        })
    }

    pub fn cmap(&mut self) -> Result<Option<&mut Cmap>> {
        Ok(match self.get(cmap::TAG)? {
            Some(Table::Cmap(cmap)) => Some(cmap),
            _ => None,
        })
    }

    pub fn gsub(&mut self) -> Result<Option<&mut Gsub<'a>>> {
        Ok(match self.get(gsub::TAG)? {
            Some(Table::Gsub(gsub)) => Some(gsub),
            _ => None,
        })
    }

    /// Replace the first table with the same tag, or add it at the end.
    pub fn set_table(&mut self, table: impl Into<Table<'a>>) {
        let table = table.into();
        let tag = table.tag();
        match self.tables.iter_mut().find(|existing| existing.tag() == tag) {
            Some(slot) => *slot = table,
            None => self.tables.push(table),
        }
    }

    /// The glyphs for `text`, after default substitutions.
    ///
    /// Characters are mapped through the cmap and the result is run through
    /// the default language system of the default script, with no optional
    /// features enabled. Without a GSUB table the mapped glyphs are returned
    /// as they are.
    pub fn get_glyphs(&mut self, text: &str) -> Result<Vec<GlyphId>> {
        let cmap = self.cmap()?.ok_or(Error::MissingTable(cmap::TAG))?;
        let glyphs: Vec<_> = text.chars().map(|c| cmap.map_char(c)).collect();
        match self.gsub()? {
            Some(gsub) => Ok(gsub
                .build_subber(|_| false, Gsub::DEFAULT_SCRIPT, None)?
                .substitute(&glyphs)),
            None => Ok(glyphs),
        }
    }

    /// For each glyph, the lowest character mapped to it by the cmap.
    pub fn inv_glyphs(&mut self, glyphs: &[GlyphId]) -> Result<Vec<Option<char>>> {
        let cmap = self.cmap()?.ok_or(Error::MissingTable(cmap::TAG))?;
        Ok(cmap.inverse(glyphs))
    }

    /// Write the font, with every table at a fresh aligned offset.
    ///
    /// Tables are laid out in their current order and the directory is sorted
    /// by tag. The `head` checksum adjustment is set so that the checksum of
    /// the output makes up [`CHECKSUM_MAGIC`]; the checksum it is derived from
    /// is taken over the font with the adjustment the head already held.
    pub fn save(&mut self) -> Result<Vec<u8>> {
        // the head must be decoded before layout so that its patched bytes
        // are the same length as the ones laid out
        self.head()?;

        let (mut data, head_offset) = self.layout()?;
        match (head_offset, self.head()?) {
            (Some(offset), Some(head)) => {
                let checksum = tables::compute_checksum(&data);
                let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum);
                log::trace!("font checksum {checksum:#010x}, adjustment {adjustment:#010x}");
                head.set_checksum_adjustment(adjustment)?;
                let bytes = head.pack()?;
                let end = offset + bytes.len();
                let available = data.len();
                data.get_mut(offset..end)
                    .ok_or(Error::TruncatedInput {
                        needed: end,
                        available,
                    })?
                    .copy_from_slice(&bytes);
            }
            _ => log::debug!("no head table, checksum adjustment not written"),
        }
        Ok(data)
    }

    /// Assemble the offset table, directory and table data.
    ///
    /// Also returns the offset of the first `head` table.
    fn layout(&self) -> Result<(Vec<u8>, Option<usize>)> {
        let packed = self
            .tables
            .iter()
            .map(|table| Ok((table.tag(), table.pack()?)))
            .collect::<Result<Vec<_>>>()?;

        let header_len = OFFSET_TABLE.byte_len() + packed.len() * TABLE_RECORD.byte_len();
        let mut position = header_len;
        let mut head_offset = None;
        let mut records = Vec::with_capacity(packed.len());
        for (tag, bytes) in &packed {
            let checksum = tables::compute_checksum(bytes);
            log::trace!(
                "'{tag}' at {position:#x}, {} bytes, checksum {checksum:#010x}",
                bytes.len()
            );
            if *tag == head::TAG && head_offset.is_none() {
                head_offset = Some(position);
            }
            records.push((*tag, checksum, position, bytes.len()));
            position += round4(bytes.len());
        }
        records.sort_by_key(|(tag, ..)| *tag);

        let search = SearchRange::compute(packed.len(), TABLE_RECORD.byte_len());
        let mut data = Vec::with_capacity(position);
        OFFSET_TABLE
            .construct([
                ("sfnt_version", Value::from(self.sfnt_version)),
                ("num_tables", Value::from(packed.len() as u64)),
                ("search_range", Value::from(search.search_range)),
                ("entry_selector", Value::from(search.entry_selector)),
                ("range_shift", Value::from(search.range_shift)),
            ])?
            .encode_into(&mut data)?;
        for (tag, checksum, offset, length) in records {
            TABLE_RECORD
                .construct([
                    ("tag", Value::from(tag)),
                    ("checksum", Value::from(checksum)),
                    ("offset", Value::from(offset as u64)),
                    ("length", Value::from(length as u64)),
                ])?
                .encode_into(&mut data)?;
        }
        for (_, bytes) in &packed {
            data.extend_from_slice(bytes);
            data.resize(round4(data.len()), 0);
        }
        Ok((data, head_offset))
    }
}
