pub mod document;
pub mod embedding;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
