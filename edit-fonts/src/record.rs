//! Fixed-layout big-endian records.
//!
//! A [`Schema`] is an ordered list of `(format, name)` pairs describing a
//! record whose size is known up front: a table header, a directory entry, an
//! encoding record. Schemas are declared with the [`record_schema!`] macro and
//! decode to a [`Record`], a bag of named [`Value`]s that can be edited and
//! encoded back into exactly the same layout.
//!
//! This module also has the two stream helpers used by the table parsers:
//! [`read_fields`] for an ad-hoc tuple of scalars, and [`read_array`] for a
//! counted array of a single scalar type.

use std::io::Read;

use types::{FixedSize, Scalar, Tag};

use crate::error::{Error, Result};

/// The number of array elements read from a stream at a time.
pub const ARRAY_BATCH_LEN: usize = 8 * 1024;

/// The on-disk encoding of a single record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    /// A four-byte [`Tag`].
    Tag,
}

/// A single field in a [`Schema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub format: Format,
    pub name: &'static str,
}

/// The ordered layout of a fixed-size record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema {
    name: &'static str,
    fields: &'static [FieldDef],
}

/// A decoded field value.
///
/// Integers are widened so that any format can be held without loss; the
/// original width is recovered from the schema when encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Tag(Tag),
}

/// A record decoded from (or destined for) a [`Schema`].
///
/// Fields that were not supplied to [`Schema::construct`] are unset; encoding
/// a record with unset fields fails with [`Error::UnsetField`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    schema: Schema,
    values: Vec<Option<Value>>,
}

/// Declare a [`Schema`] constant.
///
/// ```
/// use edit_fonts::record_schema;
///
/// record_schema! {
///     /// A range record from a coverage table.
///     pub const RANGE_RECORD = RangeRecord {
///         start_glyph_id: u16,
///         end_glyph_id: u16,
///         start_coverage_index: u16,
///     }
/// }
///
/// assert_eq!(RANGE_RECORD.byte_len(), 6);
/// ```
#[macro_export]
macro_rules! record_schema {
    (
        $(#[$attr:meta])*
        $vis:vis const $konst:ident = $name:ident {
            $( $field:ident : $ty:ident ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis const $konst: $crate::record::Schema = $crate::record::Schema::new(
            stringify!($name),
            &[ $( $crate::record::FieldDef {
                format: $crate::record_format!($ty),
                name: stringify!($field),
            } ),* ],
        );
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! record_format {
    (u8) => { $crate::record::Format::U8 };
    (i8) => { $crate::record::Format::I8 };
    (u16) => { $crate::record::Format::U16 };
    (i16) => { $crate::record::Format::I16 };
    (u32) => { $crate::record::Format::U32 };
    (i32) => { $crate::record::Format::I32 };
    (u64) => { $crate::record::Format::U64 };
    (i64) => { $crate::record::Format::I64 };
    (Tag) => { $crate::record::Format::Tag };
}

impl Format {
    /// The number of bytes this format occupies.
    pub const fn byte_len(self) -> usize {
        match self {
            Format::U8 | Format::I8 => 1,
            Format::U16 | Format::I16 => 2,
            Format::U32 | Format::I32 | Format::Tag => 4,
            Format::U64 | Format::I64 => 8,
        }
    }

    /// Decode a value from exactly `self.byte_len()` bytes.
    fn decode(self, bytes: &[u8]) -> Option<Value> {
        Some(match self {
            Format::U8 => Value::Unsigned(u8::read(bytes)? as u64),
            Format::I8 => Value::Signed(i8::read(bytes)? as i64),
            Format::U16 => Value::Unsigned(u16::read(bytes)? as u64),
            Format::I16 => Value::Signed(i16::read(bytes)? as i64),
            Format::U32 => Value::Unsigned(u32::read(bytes)? as u64),
            Format::I32 => Value::Signed(i32::read(bytes)? as i64),
            Format::U64 => Value::Unsigned(u64::read(bytes)?),
            Format::I64 => Value::Signed(i64::read(bytes)?),
            Format::Tag => Value::Tag(Tag::read(bytes)?),
        })
    }

    /// Append the encoding of `value`, or `None` if it does not fit.
    fn encode(self, value: Value, out: &mut Vec<u8>) -> Option<()> {
        match self {
            Format::U8 => out.extend(u8::from_value(value)?.to_raw()),
            Format::I8 => out.extend(i8::from_value(value)?.to_raw()),
            Format::U16 => out.extend(u16::from_value(value)?.to_raw()),
            Format::I16 => out.extend(i16::from_value(value)?.to_raw()),
            Format::U32 => out.extend(u32::from_value(value)?.to_raw()),
            Format::I32 => out.extend(i32::from_value(value)?.to_raw()),
            Format::U64 => out.extend(u64::from_value(value)?.to_raw()),
            Format::I64 => out.extend(i64::from_value(value)?.to_raw()),
            Format::Tag => out.extend(Tag::from_value(value)?.to_raw()),
        }
        Some(())
    }
}

impl Schema {
    #[doc(hidden)]
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Schema { name, fields }
    }

    /// The record type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    /// The encoded size of a record, in bytes.
    pub fn byte_len(&self) -> usize {
        self.fields.iter().map(|field| field.format.byte_len()).sum()
    }

    /// The position of the named field in the schema.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// The byte offset of the named field within an encoded record.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let idx = self.index_of(name)?;
        Some(
            self.fields[..idx]
                .iter()
                .map(|field| field.format.byte_len())
                .sum(),
        )
    }

    /// Decode a record from the start of `data`.
    ///
    /// Any bytes past the end of the record are ignored.
    pub fn decode(&self, data: &[u8]) -> Result<Record> {
        let len = self.byte_len();
        let bytes = data.get(..len).ok_or(Error::TruncatedInput {
            needed: len,
            available: data.len(),
        })?;
        let mut pos = 0;
        let values = self
            .fields
            .iter()
            .map(|field| {
                let end = pos + field.format.byte_len();
                let value = field.format.decode(&bytes[pos..end]);
                pos = end;
                value
            })
            .collect();
        Ok(Record {
            schema: *self,
            values,
        })
    }

    /// Read exactly one record's worth of bytes from `reader` and decode them.
    pub fn decode_stream(&self, reader: &mut impl Read) -> Result<Record> {
        let mut buf = vec![0u8; self.byte_len()];
        fill_buf(reader, &mut buf)?;
        self.decode(&buf)
    }

    /// Build a record from a subset of its fields.
    ///
    /// Omitted fields are left unset.
    pub fn construct<'n>(
        &self,
        fields: impl IntoIterator<Item = (&'n str, Value)>,
    ) -> Result<Record> {
        let mut record = Record {
            schema: *self,
            values: vec![None; self.fields.len()],
        };
        for (name, value) in fields {
            record.set(name, value)?;
        }
        Ok(record)
    }
}

impl Record {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the value of the named field, converted to `T`.
    ///
    /// This is `None` if the field is unknown, unset, or does not fit in `T`;
    /// use [`Record::try_get`] to distinguish these cases.
    pub fn get<T: FieldValue>(&self, name: &str) -> Option<T> {
        self.try_get(name).ok()
    }

    pub fn try_get<T: FieldValue>(&self, name: &str) -> Result<T> {
        let idx = self.index(name)?;
        let field = self.schema.fields[idx];
        let value = self.values[idx].ok_or(Error::UnsetField(field.name))?;
        T::from_value(value).ok_or(Error::FieldRange {
            field: field.name,
            value,
        })
    }

    /// Set the named field.
    ///
    /// The value must be representable in the field's format.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let idx = self.index(name)?;
        let field = self.schema.fields[idx];
        let value = value.into();
        if field.format.encode(value, &mut Vec::new()).is_none() {
            return Err(Error::FieldRange {
                field: field.name,
                value,
            });
        }
        self.values[idx] = Some(value);
        Ok(())
    }

    /// Iterate over `(name, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Option<Value>)> + '_ {
        self.schema
            .fields
            .iter()
            .zip(&self.values)
            .map(|(field, value)| (field.name, *value))
    }

    /// Encode the record in schema order.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.schema.byte_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Append the encoded record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            let value = value.ok_or(Error::UnsetField(field.name))?;
            field.format.encode(value, out).ok_or(Error::FieldRange {
                field: field.name,
                value,
            })?;
        }
        Ok(())
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| Error::UnknownField(name.to_owned()))
    }
}

/// A type that can be stored in a [`Record`] field.
pub trait FieldValue: Sized + Into<Value> {
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! int_field_value {
    ($variant:ident, $wide:ty, $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Value {
                    Value::$variant(val as $wide)
                }
            }

            impl FieldValue for $ty {
                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Unsigned(val) => val.try_into().ok(),
                        Value::Signed(val) => val.try_into().ok(),
                        Value::Tag(_) => None,
                    }
                }
            }
        )+
    };
}

int_field_value!(Unsigned, u64, u8, u16, u32, u64);
int_field_value!(Signed, i64, i8, i16, i32, i64);

impl From<Tag> for Value {
    fn from(tag: Tag) -> Value {
        Value::Tag(tag)
    }
}

impl FieldValue for Tag {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Unsigned(val) => write!(f, "{val}"),
            Value::Signed(val) => write!(f, "{val}"),
            Value::Tag(tag) => write!(f, "'{tag}'"),
        }
    }
}

/// Read a single tuple of scalars with the given formats.
pub fn read_fields(reader: &mut impl Read, formats: &[Format]) -> Result<Vec<Value>> {
    let len = formats.iter().map(|format| format.byte_len()).sum();
    let mut buf = vec![0u8; len];
    fill_buf(reader, &mut buf)?;
    let mut pos = 0;
    formats
        .iter()
        .map(|format| {
            let end = pos + format.byte_len();
            let value = format.decode(&buf[pos..end]);
            pos = end;
            // the buffer was sized from these formats
            value.ok_or(Error::TruncatedInput {
                needed: end,
                available: len,
            })
        })
        .collect()
}

/// Read `count` consecutive scalars of type `T`.
///
/// The stream is consumed in batches of [`ARRAY_BATCH_LEN`] elements.
pub fn read_array<T: Scalar>(reader: &mut impl Read, count: usize) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(count.min(ARRAY_BATCH_LEN));
    let mut buf = Vec::new();
    let mut remaining = count;
    while remaining > 0 {
        let batch = remaining.min(ARRAY_BATCH_LEN);
        buf.resize(batch * T::RAW_BYTE_LEN, 0);
        fill_buf(reader, &mut buf).map_err(|err| match err {
            Error::TruncatedInput { available, .. } => Error::TruncatedInput {
                needed: count * T::RAW_BYTE_LEN,
                available: (count - remaining) * T::RAW_BYTE_LEN + available,
            },
            other => other,
        })?;
        out.extend(buf.chunks_exact(T::RAW_BYTE_LEN).filter_map(T::read));
        remaining -= batch;
    }
    Ok(out)
}

/// Skip `n_bytes` of the stream.
pub(crate) fn skip(reader: &mut impl Read, n_bytes: usize) -> Result<()> {
    let mut buf = vec![0u8; n_bytes];
    fill_buf(reader, &mut buf)
}

/// Fill `buf` completely, reading until it is full or the stream ends.
fn fill_buf(reader: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(Error::TruncatedInput {
                    needed: buf.len(),
                    available: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::be_buffer;

    record_schema! {
        const SAMPLE = Sample {
            version: u16,
            delta: i16,
            tag: Tag,
            length: u32,
        }
    }

    /// A reader that hands out at most `chunk` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.chunk).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn sample_bytes() -> Vec<u8> {
        be_buffer! { 1u16, -3i16, Tag::new(b"liga"), 0xDEADBEEFu32 }.into_vec()
    }

    #[test]
    fn decode_named_fields() {
        assert_eq!(SAMPLE.byte_len(), 12);
        let record = SAMPLE.decode(&sample_bytes()).unwrap();
        assert_eq!(record.get::<u16>("version"), Some(1));
        assert_eq!(record.get::<i16>("delta"), Some(-3));
        assert_eq!(record.get::<Tag>("tag"), Some(Tag::new(b"liga")));
        assert_eq!(record.get::<u32>("length"), Some(0xDEADBEEF));
        // out of range for the requested type
        assert_eq!(record.get::<u16>("delta"), None);
        assert!(matches!(
            record.try_get::<u16>("nope"),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut bytes = sample_bytes();
        bytes.extend([0xFF; 3]);
        let record = SAMPLE.decode(&bytes).unwrap();
        assert_eq!(record.encode().unwrap(), sample_bytes());
    }

    #[test]
    fn decode_truncated() {
        let bytes = sample_bytes();
        assert_eq!(
            SAMPLE.decode(&bytes[..11]),
            Err(Error::TruncatedInput {
                needed: 12,
                available: 11
            })
        );
    }

    #[test]
    fn decode_stream_accumulates_short_reads() {
        let bytes = sample_bytes();
        let mut reader = Trickle {
            data: &bytes,
            chunk: 5,
        };
        let record = SAMPLE.decode_stream(&mut reader).unwrap();
        assert_eq!(record.encode().unwrap(), bytes);
    }

    #[test]
    fn decode_stream_early_eof() {
        let bytes = sample_bytes();
        let mut reader = &bytes[..7];
        assert_eq!(
            SAMPLE.decode_stream(&mut reader),
            Err(Error::TruncatedInput {
                needed: 12,
                available: 7
            })
        );
    }

    #[test]
    fn construct_partial() {
        let mut record = SAMPLE
            .construct([
                ("version", Value::from(0u16)),
                ("tag", Value::from(Tag::new(b"DFLT"))),
            ])
            .unwrap();
        assert_eq!(record.get::<u16>("version"), Some(0));
        assert_eq!(record.try_get::<i16>("delta"), Err(Error::UnsetField("delta")));
        assert_eq!(record.encode(), Err(Error::UnsetField("delta")));

        record.set("delta", 7i16).unwrap();
        record.set("length", 12u32).unwrap();
        assert_eq!(
            record.encode().unwrap(),
            be_buffer! { 0u16, 7i16, Tag::new(b"DFLT"), 12u32 }.as_slice()
        );
    }

    #[test]
    fn construct_unknown_field() {
        assert_eq!(
            SAMPLE.construct([("bogus", Value::from(1u16))]),
            Err(Error::UnknownField("bogus".into()))
        );
    }

    #[test]
    fn set_out_of_range() {
        let mut record = SAMPLE.construct([("delta", Value::from(0i16))]).unwrap();
        assert!(matches!(
            record.set("version", 0x10000u32),
            Err(Error::FieldRange { field: "version", .. })
        ));
        assert!(matches!(
            record.set("length", -1i32),
            Err(Error::FieldRange { field: "length", .. })
        ));
        // a non-negative signed value is fine in an unsigned field
        record.set("length", 5i32).unwrap();
        assert_eq!(record.get::<u32>("length"), Some(5));
    }

    #[test]
    fn field_offsets() {
        assert_eq!(SAMPLE.offset_of("version"), Some(0));
        assert_eq!(SAMPLE.offset_of("tag"), Some(4));
        assert_eq!(SAMPLE.offset_of("length"), Some(8));
        assert_eq!(SAMPLE.offset_of("missing"), None);
    }

    #[test]
    fn read_fields_tuple() {
        let bytes = be_buffer! { 2u16, 0x10u16, -1i16 };
        let mut reader = bytes.as_slice();
        let values = read_fields(&mut reader, &[Format::U16, Format::U16, Format::I16]).unwrap();
        assert_eq!(
            values,
            [Value::Unsigned(2), Value::Unsigned(0x10), Value::Signed(-1)]
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn read_array_batches_match_single_pass() {
        let count = ARRAY_BATCH_LEN * 2 + 17;
        let expected: Vec<u16> = (0..count).map(|i| (i * 7) as u16).collect();
        let bytes = font_test_data::bebuffer::BeBuffer::new().extend(expected.iter().copied());
        let mut reader = Trickle {
            data: &bytes,
            chunk: 1000,
        };
        let got: Vec<u16> = read_array(&mut reader, count).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn read_array_truncated() {
        let bytes = be_buffer! { [1u16, 2, 3] };
        let mut reader = bytes.as_slice();
        assert_eq!(
            read_array::<u16>(&mut reader, 4),
            Err(Error::TruncatedInput {
                needed: 8,
                available: 6
            })
        );
    }
}
