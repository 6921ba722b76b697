//! Per-page text extraction from PDF bytes.
//!
//! Direct extraction only — no OCR. Image-only pages therefore yield no text;
//! they are kept in the page sequence with a fixed sentinel string so chunk
//! concatenation never silently drops a page and the report stays aligned
//! with the original page numbering.
//!
//! Extraction is CPU-bound and `pdf_extract` is synchronous, so the async
//! entry point runs it under `spawn_blocking` to keep the executor free.

use crate::error::ClaimLensError;
use crate::output::PageText;
use tracing::{debug, info};

/// Sentinel stored for a page with no extractable text.
pub const NO_TEXT_SENTINEL: &str = "[No extractable text found on this page]";

/// Extract text from every page of a PDF.
///
/// Returns one [`PageText`] per page, numbered 1..N in document order.
///
/// # Errors
/// [`ClaimLensError::Extraction`] when the PDF cannot be parsed at all
/// (corrupt or encrypted stream). The caller must halt the pipeline — there
/// is no partial result.
pub async fn extract_pages(bytes: Vec<u8>) -> Result<Vec<PageText>, ClaimLensError> {
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })
    .await
    .map_err(|e| ClaimLensError::Internal(format!("extraction task panicked: {e}")))?
    .map_err(|e| ClaimLensError::Extraction {
        detail: e.to_string(),
    })?;

    let pages = pages_from_raw(pages);
    info!(
        "Extracted {} pages ({} without text)",
        pages.len(),
        pages.iter().filter(|p| p.is_empty_sentinel()).count()
    );
    Ok(pages)
}

/// Number raw per-page strings 1..N and substitute the sentinel for
/// empty or whitespace-only pages.
pub fn pages_from_raw(raw: Vec<String>) -> Vec<PageText> {
    raw.into_iter()
        .enumerate()
        .map(|(i, text)| {
            let number = i + 1;
            if text.trim().is_empty() {
                debug!("Page {number}: no extractable text");
                PageText {
                    number,
                    text: NO_TEXT_SENTINEL.to_string(),
                }
            } else {
                PageText { number, text }
            }
        })
        .collect()
}

/// Validate the `%PDF` magic at the front of the byte stream.
///
/// A cheap pre-check so a mis-uploaded file gets a precise error instead of
/// an opaque parse failure from the extractor.
pub fn check_pdf_magic(bytes: &[u8]) -> Option<[u8; 4]> {
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        Some(magic)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_numbered_contiguously_from_one() {
        let pages = pages_from_raw(vec!["a".into(), "b".into(), "c".into()]);
        let numbers: Vec<usize> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(pages[0].label(), "Page 1");
        assert_eq!(pages[2].label(), "Page 3");
    }

    #[test]
    fn empty_page_gets_sentinel_not_empty_string() {
        let pages = pages_from_raw(vec!["real text".into(), "".into(), "  \n\t ".into()]);
        assert_eq!(pages[0].text, "real text");
        assert_eq!(pages[1].text, NO_TEXT_SENTINEL);
        assert_eq!(pages[2].text, NO_TEXT_SENTINEL);
        assert!(pages[1].is_empty_sentinel());
        assert!(!pages[0].is_empty_sentinel());
    }

    #[test]
    fn n_raw_pages_yield_exactly_n_entries() {
        for n in [0usize, 1, 5, 40] {
            let raw: Vec<String> = (0..n).map(|i| format!("page {i}")).collect();
            assert_eq!(pages_from_raw(raw).len(), n);
        }
    }

    #[test]
    fn pdf_magic_accepts_pdf_and_rejects_zip() {
        assert!(check_pdf_magic(b"%PDF-1.7\n...").is_none());
        assert_eq!(check_pdf_magic(b"PK\x03\x04rest"), Some(*b"PK\x03\x04"));
        // Too short to judge; let the extractor report the real error.
        assert!(check_pdf_magic(b"%P").is_none());
    }

    #[tokio::test]
    async fn garbage_bytes_fail_with_extraction_error() {
        let err = extract_pages(b"%PDF-1.4 but not actually a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimLensError::Extraction { .. }));
    }
}
