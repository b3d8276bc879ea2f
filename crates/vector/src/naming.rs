use std::fmt;

use pdfqa_core::config::{IndexMode, VectorConfig};
use uuid::Uuid;

use crate::backend::VectorError;

/// Longest index name the hosted service accepts.
pub const MAX_NAME_LEN: usize = 45;

/// A validated index name: lowercase ASCII letters, digits and '-',
/// starting and ending with a letter or digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexName(String);

impl IndexName {
    pub fn parse(name: impl Into<String>) -> Result<Self, VectorError> {
        let name = name.into();
        let valid_chars = name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        let valid_ends = !name.starts_with('-') && !name.ends_with('-');
        if name.is_empty() || name.len() > MAX_NAME_LEN || !valid_chars || !valid_ends {
            return Err(VectorError::InvalidName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How upload batches are mapped onto indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexNaming {
    /// Every upload gets `<prefix>-<uuid>`.
    PerSession { prefix: String },
    /// Every upload lands in the same index.
    Shared { name: IndexName },
}

impl IndexNaming {
    pub fn from_config(cfg: &VectorConfig) -> Result<Self, VectorError> {
        Ok(match cfg.index_mode {
            IndexMode::PerSession => IndexNaming::PerSession {
                prefix: sanitize_prefix(&cfg.index_prefix),
            },
            IndexMode::Shared => IndexNaming::Shared {
                name: IndexName::parse(cfg.shared_index.clone())?,
            },
        })
    }

    /// Name for the next upload batch.
    pub fn next_name(&self) -> IndexName {
        match self {
            IndexNaming::PerSession { prefix } => {
                let id = Uuid::new_v4().simple().to_string();
                let name = if prefix.is_empty() { id } else { format!("{prefix}-{id}") };
                IndexName(name)
            }
            IndexNaming::Shared { name } => name.clone(),
        }
    }
}

/// Lowercase, drop anything outside `[a-z0-9-]`, and leave room for the
/// 32-char uuid plus separator.
fn sanitize_prefix(raw: &str) -> String {
    let cleaned: String = raw
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .take(MAX_NAME_LEN - 33)
        .collect();
    cleaned.trim_matches('-').to_string()
}
