//! Chunk configuration.

use pdfqa_core::config::ChunkingConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("chunk size must be greater than zero")]
    ZeroSize,
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Validated window parameters. `overlap < size` always holds, so every
/// window advances by at least one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    size: usize,
    overlap: usize,
}

impl ChunkConfig {
    pub const DEFAULT_SIZE: usize = 10_000;
    pub const DEFAULT_OVERLAP: usize = 1_000;

    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkConfigError> {
        if size == 0 {
            return Err(ChunkConfigError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkConfigError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.size
    }

    /// Characters shared with the previous chunk.
    pub fn chunk_overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive chunk starts.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Number of chunks a text of `char_len` characters splits into.
    pub fn chunk_count(&self, char_len: usize) -> usize {
        match char_len {
            0 => 0,
            n if n <= self.overlap => 1,
            n => (n - self.overlap).div_ceil(self.step()),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            overlap: Self::DEFAULT_OVERLAP,
        }
    }
}

impl TryFrom<&ChunkingConfig> for ChunkConfig {
    type Error = ChunkConfigError;

    fn try_from(cfg: &ChunkingConfig) -> Result<Self, Self::Error> {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }
}
