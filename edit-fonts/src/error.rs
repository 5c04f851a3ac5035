//! Errors that occur while decoding or encoding font data

use thiserror::Error;
use types::Tag;

use crate::record::Value;

/// A specialized `Result` for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised while reading, editing or writing a font.
///
/// All errors abort the operation in progress; nothing is partially applied.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Input truncated: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Unsupported '{table}' version {version:#x}")]
    UnsupportedVersion { table: Tag, version: u32 },

    #[error("Unsupported '{table}' subtable format {format}")]
    UnsupportedFormat { table: Tag, format: u16 },

    #[error("Unsupported GSUB lookup type {0}")]
    UnsupportedLookupType(u16),

    #[error("Corrupt subtable: {0}")]
    CorruptSubtable(&'static str),

    #[error("No script '{0}' in the script list")]
    UnknownScript(Tag),

    #[error("Script '{0}' has no default language system")]
    NoDefaultLangSys(Tag),

    #[error("Script '{script}' has no language system '{lang_sys}'")]
    UnknownLangSys { script: Tag, lang_sys: Tag },

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{0}' is unset")]
    UnsetField(&'static str),

    #[error("Value {value} does not fit field '{field}'")]
    FieldRange { field: &'static str, value: Value },

    #[error("No Windows Unicode BMP (3, 1) encoding in the character map")]
    NoUsableEncoding,

    #[error("{0:?} is outside the Basic Multilingual Plane")]
    NotInBmp(char),

    #[error("Encoded subtable is {0} bytes, more than a 16-bit length allows")]
    SubtableOverflow(usize),

    #[error("The font has no '{0}' table")]
    MissingTable(Tag),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
