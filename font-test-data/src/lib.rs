//! test data shared between the edit-fonts crates.

pub mod bebuffer;
pub mod cmap;
pub mod font;
pub mod gsub;
pub mod layout;
