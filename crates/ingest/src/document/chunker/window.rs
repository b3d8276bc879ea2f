use std::iter::FusedIterator;

use super::types::ChunkConfig;

/// Lazily split `text` into overlapping windows.
pub fn split_text<'a>(text: &'a str, config: &ChunkConfig) -> Chunks<'a> {
    Chunks {
        text,
        start: 0,
        size: config.chunk_size(),
        step: config.step(),
        done: text.is_empty(),
    }
}

/// Iterator over chunk slices of a borrowed text.
///
/// Ends after yielding the first window that reaches the end of the text.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of the next window start (always a char boundary).
    start: usize,
    size: usize,
    step: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let end = advance(self.text, self.start, self.size);
        let chunk = &self.text[self.start..end];
        if end == self.text.len() {
            self.done = true;
        } else {
            self.start = advance(self.text, self.start, self.step);
        }
        Some(chunk)
    }
}

impl FusedIterator for Chunks<'_> {}

/// Byte offset `chars` characters after `from`, clamped to the text end.
fn advance(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| from + i)
}
