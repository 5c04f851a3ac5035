//! Editing OpenType font files
//!
//! This crate reads an sfnt font, decodes the `head`, `cmap` and `GSUB`
//! tables on demand, allows the character map to be edited, and writes the
//! font back out with a fresh table directory and correct checksums. Every
//! other table is carried through as it was read.
//!
//! Decoding is built on a small [record codec](record): each fixed-size
//! structure is described by a [`Schema`](record::Schema) of named
//! big-endian fields, which is used both to decode and to encode it.
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use edit_fonts::OpenTypeFont;
//!
//! let font_bytes = std::fs::read(path_to_my_font_file).unwrap();
//! let mut font = OpenTypeFont::parse(&font_bytes).unwrap();
//!
//! // map 'a' to the glyph for 'b'
//! let cmap = font.cmap().unwrap().expect("missing 'cmap' table");
//! cmap[0x61] = cmap[0x62];
//!
//! let glyphs = font.get_glyphs("ab").unwrap();
//! assert_eq!(glyphs[0], glyphs[1]);
//! let new_font_bytes = font.save().unwrap();
//! ```

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod record;

mod error;
mod font;
mod font_data;
pub mod tables;
mod util;

/// Public re-export of the font-types crate.
pub extern crate font_types as types;

pub use error::{Error, Result};
pub use font::{OpenTypeFont, RawTable, Table, CHECKSUM_MAGIC};
pub use font_data::FontData;
pub use util::SearchRange;
