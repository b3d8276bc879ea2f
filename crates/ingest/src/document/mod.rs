pub mod chunker;
mod pdf;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed for '{filename}': {reason}")]
    PdfError { filename: String, reason: String },
}

/// One file from an upload request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    pub text: String,
}

/// Result of extracting text from one PDF.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub filename: String,
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// Page texts concatenated in page order, no separator.
    pub fn full_text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect()
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Extract the pages of a single PDF.
pub fn extract_pdf(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let pages = pdf::extract_pages(bytes).map_err(|reason| ExtractionError::PdfError {
        filename: filename.to_string(),
        reason,
    })?;
    Ok(ExtractedDocument {
        filename: filename.to_string(),
        pages,
    })
}

/// Extract and concatenate the text of every document, in upload order.
///
/// Any unreadable document fails the whole set.
pub fn extract_raw_text(documents: &[UploadedDocument]) -> Result<String, ExtractionError> {
    let mut raw = String::new();
    for upload in documents {
        let doc = extract_pdf(&upload.bytes, &upload.filename)?;
        debug!(
            filename = %doc.filename,
            pages = doc.pages.len(),
            chars = doc.total_chars(),
            "extracted pdf"
        );
        raw.push_str(&doc.full_text());
    }
    Ok(raw)
}
