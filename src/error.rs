//! Error types for the claimlens library.
//!
//! The pipeline distinguishes hard failures from the one deliberate soft
//! failure:
//!
//! * [`ClaimLensError`] — **Fatal**: the analysis cannot proceed (unreadable
//!   PDF, rejected credential, document converter unavailable). Returned as
//!   `Err(ClaimLensError)` from the top-level `analyze*` functions, or — for
//!   the document-conversion step only — recorded on the output so the
//!   already-produced report text is not retracted.
//!
//! * **Per-chunk analysis failure** — *not* an error type. When one chunk's
//!   generation call fails (network error, malformed JSON, missing field),
//!   the backend substitutes an inline diagnostic string that is concatenated
//!   into the report like any other result, visibly marking that chunk as
//!   failed. One bad chunk never aborts the batch. See
//!   [`crate::pipeline::watsonx`].
//!
//! There are no automatic retries anywhere in the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the claimlens library.
#[derive(Debug, Error)]
pub enum ClaimLensError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The PDF could not be parsed for text extraction (corrupt or
    /// encrypted). The pipeline halts before chunking.
    #[error("Text extraction failed: {detail}\nThe PDF may be corrupt, encrypted, or image-only.")]
    Extraction { detail: String },

    /// The identity service rejected the credential or was unreachable.
    /// Fatal for the session: no chunk analysis runs without a token.
    #[error("watsonx authentication failed: {detail}\nCheck WATSONX_API_KEY and your network connection.")]
    Auth { detail: String },

    /// The markdown-to-docx converter failed or is unavailable. Halts only
    /// the download/document step; the report text remains valid.
    #[error("Document conversion failed: {detail}\nInstall pandoc (https://pandoc.org) to enable .docx output.")]
    Conversion { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_display_mentions_detail() {
        let e = ClaimLensError::Extraction {
            detail: "bad xref table".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bad xref table"), "got: {msg}");
    }

    #[test]
    fn auth_display_hints_at_env_var() {
        let e = ClaimLensError::Auth {
            detail: "HTTP 401".into(),
        };
        assert!(e.to_string().contains("WATSONX_API_KEY"));
    }

    #[test]
    fn conversion_display_hints_at_pandoc() {
        let e = ClaimLensError::Conversion {
            detail: "pandoc not found".into(),
        };
        assert!(e.to_string().contains("pandoc"));
    }

    #[test]
    fn not_a_pdf_shows_magic() {
        let e = ClaimLensError::NotAPdf {
            path: PathBuf::from("x.pdf"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("x.pdf"));
    }
}
