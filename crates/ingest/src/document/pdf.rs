use std::panic;

use super::PageContent;

/// pdf-extract separates pages with form feeds when it can.
const PAGE_BREAK: char = '\x0C';

pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageContent>, String> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "PDF parser panicked on malformed input".to_string())?
        .map_err(|e| e.to_string())?;

    let pages = if text.contains(PAGE_BREAK) {
        text.split(PAGE_BREAK)
            .enumerate()
            .map(|(i, page_text)| PageContent {
                page_number: i + 1,
                text: page_text.to_string(),
            })
            .collect()
    } else {
        vec![PageContent {
            page_number: 1,
            text,
        }]
    };

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::minimal_pdf;

    #[test]
    fn extracts_text_from_generated_pdf() {
        let pages = extract_pages(&minimal_pdf(&["Hello from page one"])).unwrap();
        let all: String = pages.iter().map(|p| p.text.as_str()).collect();
        assert!(all.contains("Hello"), "got: {all:?}");
    }

    #[test]
    fn page_order_is_preserved() {
        let pages = extract_pages(&minimal_pdf(&["alpha", "bravo"])).unwrap();
        let all: String = pages.iter().map(|p| p.text.as_str()).collect();
        let a = all.find("alpha").expect("alpha missing");
        let b = all.find("bravo").expect("bravo missing");
        assert!(a < b);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(extract_pages(b"").is_err());
        assert!(extract_pages(b"hello world").is_err());
    }
}
