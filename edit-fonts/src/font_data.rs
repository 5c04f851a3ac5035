//! raw font bytes

use std::ops::{Bound, RangeBounds};

use types::{FixedSize, Scalar};

use crate::error::{Error, Result};

/// A reference to raw binary font data.
///
/// This is a cheap, copyable view of a byte slice. Sub-ranges are taken with
/// [`FontData::slice`] and [`FontData::split_off`] without copying, and a
/// view can be consumed as a [`std::io::Read`] stream via [`FontData::reader`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

impl<'a> FontData<'a> {
    /// Create a new `FontData` with these bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    /// The length of the data, in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the data has a length of zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Everything from `pos` to the end of the data.
    pub fn split_off(&self, pos: usize) -> Result<FontData<'a>> {
        self.bytes
            .get(pos..)
            .map(FontData::new)
            .ok_or(Error::TruncatedInput {
                needed: pos,
                available: self.len(),
            })
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<FontData<'a>> {
        let end = match range.end_bound() {
            Bound::Unbounded => self.len(),
            Bound::Included(i) => i.saturating_add(1),
            Bound::Excluded(i) => *i,
        };
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        self.bytes
            .get(bounds)
            .map(FontData::new)
            .ok_or(Error::TruncatedInput {
                needed: end,
                available: self.len(),
            })
    }

    /// Read a scalar at the provided location in the data.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T> {
        let end = offset.saturating_add(T::RAW_BYTE_LEN);
        self.bytes
            .get(offset..end)
            .and_then(T::read)
            .ok_or(Error::TruncatedInput {
                needed: end,
                available: self.len(),
            })
    }

    /// A stream over these bytes, starting at the beginning.
    pub fn reader(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(src: &'a [u8]) -> FontData<'a> {
        FontData::new(src)
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}
