//! small utilities used in tests

use font_types::Scalar;
use std::collections::HashMap;

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write a scalar, remembering its position under `tag` for a later
    /// [`write_at`](Self::write_at).
    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self.data.extend(item.to_raw().as_ref());
        }
        self
    }

    /// Append raw bytes.
    pub fn extend_bytes(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn offset_for(&self, tag: &str) -> usize {
        // panic on unrecognized tags
        self.tagged_locations.get(tag).copied().unwrap()
    }

    /// Overwrite the scalar previously pushed with `tag`.
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let offset = self.offset_for(tag);
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        let data = &mut self.data[offset..];
        if data.len() < new_data.len() {
            panic!("not enough room left in buffer for the requested write.");
        }
        data[..new_data.len()].copy_from_slice(new_data);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Build a [`BeBuffer`] from a comma-separated list of typed scalars.
///
/// Each element must have a concrete scalar type, e.g. `4u16` or `-3i16`.
/// Arrays of a single scalar type may be written as `[1u16, 2, 3]`.
///
/// ```
/// # use font_test_data::be_buffer;
/// let buf = be_buffer! { 1u16, [2u16, 3], 0xFFu8 };
/// assert_eq!(buf.as_slice(), &[0, 1, 0, 2, 0, 3, 0xFF]);
/// ```
#[macro_export]
macro_rules! be_buffer {
    ( $( $items:tt )* ) => {{
        let buf = $crate::bebuffer::BeBuffer::new();
        $crate::be_buffer_add!(buf; $( $items )*)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! be_buffer_add {
    ($b:expr;) => { $b };
    ($b:expr; [ $( $x:expr ),* $(,)? ] $(, $( $rest:tt )* )?) => {
        $crate::be_buffer_add!($b.extend([ $( $x ),* ]); $( $( $rest )* )?)
    };
    ($b:expr; $x:expr $(, $( $rest:tt )* )?) => {
        $crate::be_buffer_add!($b.push($x); $( $( $rest )* )?)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_overwrite() {
        let mut buf = BeBuffer::new()
            .push(1u16)
            .push_with_tag(0u32, "offset")
            .push(-1i16);
        buf.write_at("offset", 0xDEADBEEFu32);
        assert_eq!(buf.as_slice(), &[0, 1, 0xDE, 0xAD, 0xBE, 0xEF, 0xFF, 0xFF]);
        assert_eq!(buf.offset_for("offset"), 2);
    }

    #[test]
    fn macro_mixes_scalars_and_arrays() {
        let buf = be_buffer! { 7u8, [1u16, 2], -2i16 };
        assert_eq!(buf.as_slice(), &[7, 0, 1, 0, 2, 0xFF, 0xFE]);
    }
}
