//! Fixed-window chunking engine.
//!
//! Splits raw text into overlapping windows of at most `chunk_size`
//! characters, each sharing `chunk_overlap` characters with its predecessor.
//! Lengths are counted in `char`s, so windows never split a code point.

mod types;
mod window;

pub use types::{ChunkConfig, ChunkConfigError};
pub use window::{split_text, Chunks};

#[cfg(test)]
mod tests;
