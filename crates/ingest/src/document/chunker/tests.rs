//! Tests for the chunking engine.

use super::types::{ChunkConfig, ChunkConfigError};
use super::window::split_text;

fn config(size: usize, overlap: usize) -> ChunkConfig {
    ChunkConfig::new(size, overlap).unwrap()
}

/// Deterministic text with distinguishable characters.
fn sample(len: usize) -> String {
    (0..len)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn defaults_are_ten_thousand_and_one_thousand() {
    let cfg = ChunkConfig::default();
    assert_eq!(cfg.chunk_size(), 10_000);
    assert_eq!(cfg.chunk_overlap(), 1_000);
    assert_eq!(cfg.step(), 9_000);
}

#[test]
fn rejects_overlap_not_smaller_than_size() {
    assert_eq!(
        ChunkConfig::new(10, 10),
        Err(ChunkConfigError::OverlapTooLarge { size: 10, overlap: 10 })
    );
    assert!(ChunkConfig::new(10, 11).is_err());
    assert_eq!(ChunkConfig::new(0, 0), Err(ChunkConfigError::ZeroSize));
    assert!(ChunkConfig::new(10, 9).is_ok());
}

// ── Splitting ───────────────────────────────────────────────────────

#[test]
fn empty_text_yields_nothing() {
    assert_eq!(split_text("", &config(10, 2)).count(), 0);
}

#[test]
fn short_text_is_one_chunk() {
    let chunks: Vec<&str> = split_text("hello", &config(10, 2)).collect();
    assert_eq!(chunks, vec!["hello"]);
}

#[test]
fn text_exactly_chunk_size_is_one_chunk() {
    let text = sample(10);
    let chunks: Vec<&str> = split_text(&text, &config(10, 3)).collect();
    assert_eq!(chunks, vec![text.as_str()]);
}

#[test]
fn windows_advance_by_size_minus_overlap() {
    let text = "abcdefghijklmnopqrstuvwxyz";
    let chunks: Vec<&str> = split_text(text, &config(10, 4)).collect();
    assert_eq!(chunks, vec!["abcdefghij", "ghijklmnop", "mnopqrstuv", "stuvwxyz"]);
}

#[test]
fn consecutive_chunks_overlap_exactly() {
    let cfg = config(100, 15);
    let text = sample(1_234);
    let chunks: Vec<&str> = split_text(&text, &cfg).collect();
    for pair in chunks.windows(2) {
        let prev: Vec<char> = pair[0].chars().collect();
        let next: Vec<char> = pair[1].chars().collect();
        assert_eq!(prev.len(), 100, "only the last chunk may be short");
        assert_eq!(&prev[prev.len() - 15..], &next[..15]);
    }
}

#[test]
fn every_character_is_covered() {
    let cfg = config(37, 5);
    let text = sample(1_000);
    let chunks: Vec<&str> = split_text(&text, &cfg).collect();

    // Rebuild the input by dropping each chunk's overlap prefix.
    let mut rebuilt = String::from(chunks[0]);
    for chunk in &chunks[1..] {
        rebuilt.extend(chunk.chars().skip(cfg.chunk_overlap()));
    }
    assert_eq!(rebuilt, text);
}

#[test]
fn chunk_count_matches_formula() {
    for (size, overlap) in [(10, 0), (10, 3), (10, 9), (100, 15), (10_000, 1_000)] {
        let cfg = config(size, overlap);
        for len in [1, overlap.max(1), overlap + 1, size - 1, size, size + 1, 3 * size + 7] {
            let text = sample(len);
            let actual = split_text(&text, &cfg).count();
            let expected = if len > overlap {
                (len - overlap).div_ceil(size - overlap)
            } else {
                1
            };
            assert_eq!(actual, expected, "size={size} overlap={overlap} len={len}");
            assert_eq!(cfg.chunk_count(len), expected);
        }
    }
}

#[test]
fn multibyte_characters_are_counted_as_chars() {
    let text = "äöü€漢字🎉".repeat(5); // 7 chars per repeat
    let cfg = config(8, 2);
    let chunks: Vec<&str> = split_text(&text, &cfg).collect();
    assert!(chunks.iter().all(|c| char_len(c) <= 8));
    assert_eq!(chunks.len(), cfg.chunk_count(char_len(&text)));
    assert_eq!(chunks.last().unwrap().chars().last(), Some('🎉'));
}

#[test]
fn iterator_is_lazy_and_fused() {
    let text = sample(50);
    let mut chunks = split_text(&text, &config(20, 5));
    assert_eq!(chunks.next().map(char_len), Some(20));
    let rest: Vec<&str> = chunks.by_ref().collect();
    assert_eq!(rest.len(), 2);
    assert_eq!(chunks.next(), None);
    assert_eq!(chunks.next(), None);
}
