//! Output types: extracted pages, per-chunk results, and the final report.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Text extracted from one PDF page.
///
/// Created by [`crate::pipeline::extract`] and immutable afterwards. Page
/// numbers are 1-based, strictly increasing, and contiguous within one
/// analysis run. A page that yielded no extractable text carries the fixed
/// sentinel string instead of an empty string so chunk concatenation never
/// silently drops a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    /// Extracted text, or [`crate::pipeline::extract::NO_TEXT_SENTINEL`].
    pub text: String,
}

impl PageText {
    /// Display label for this page, e.g. `"Page 3"`.
    pub fn label(&self) -> String {
        format!("Page {}", self.number)
    }

    /// Whether this page carries the no-text sentinel rather than real text.
    pub fn is_empty_sentinel(&self) -> bool {
        self.text == crate::pipeline::extract::NO_TEXT_SENTINEL
    }
}

/// Result of analyzing one chunk.
///
/// `text` is either the generated analysis or — when the generation call
/// failed — the inline diagnostic string produced by the backend. The
/// diagnostic is concatenated into the report like any other result; check
/// `soft_failed` to distinguish the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 1-based chunk index.
    pub index: usize,
    /// First page (1-based, inclusive) covered by this chunk.
    pub first_page: usize,
    /// Last page (1-based, inclusive) covered by this chunk.
    pub last_page: usize,
    /// Generated analysis text, or the inline failure diagnostic.
    pub text: String,
    /// True when `text` is a failure diagnostic rather than model output.
    pub soft_failed: bool,
    /// Wall-clock duration of the generation call.
    pub duration_ms: u64,
}

/// Timing and count statistics for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Pages in the uploaded document.
    pub total_pages: usize,
    /// Pages that yielded no extractable text (sentinel substituted).
    pub empty_pages: usize,
    /// Chunks the pages were grouped into.
    pub total_chunks: usize,
    /// Chunks whose generation call failed (diagnostic embedded in report).
    pub soft_failed_chunks: usize,
    /// Time spent in text extraction.
    pub extract_duration_ms: u64,
    /// Time spent in generation calls (all chunks, sequential).
    pub analysis_duration_ms: u64,
    /// End-to-end pipeline time.
    pub total_duration_ms: u64,
}

/// Result of a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// The final report: all chunk results joined with a blank line, in
    /// chunk (and therefore page) order. Source of truth for both display
    /// and document conversion.
    pub report: String,
    /// Per-page extracted text, in page order.
    pub pages: Vec<PageText>,
    /// Per-chunk results, in chunk order.
    pub chunks: Vec<ChunkResult>,
    /// Run statistics.
    pub stats: AnalysisStats,
    /// Path of the generated `.docx` document, when one was produced.
    pub document: Option<PathBuf>,
    /// Document-conversion failure message, when conversion was attempted
    /// and failed. The report text above is still valid; only the download
    /// affordance must be withheld.
    pub conversion_error: Option<String>,
}

impl AnalysisOutput {
    /// Whether every chunk produced real model output.
    pub fn is_clean(&self) -> bool {
        self.stats.soft_failed_chunks == 0
    }
}

/// Lightweight document summary returned by [`crate::analyze::inspect`].
///
/// Produced without credentials or network access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Pages in the document.
    pub page_count: usize,
    /// Pages with no extractable text.
    pub empty_pages: usize,
    /// Character count per page, in page order.
    pub page_chars: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_label_is_one_based() {
        let p = PageText {
            number: 1,
            text: "hello".into(),
        };
        assert_eq!(p.label(), "Page 1");
    }

    #[test]
    fn clean_output_has_no_soft_failures() {
        let out = AnalysisOutput {
            report: "ok".into(),
            pages: vec![],
            chunks: vec![],
            stats: AnalysisStats::default(),
            document: None,
            conversion_error: None,
        };
        assert!(out.is_clean());
    }
}
