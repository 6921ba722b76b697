//! # claimlens
//!
//! Analyze insurance-claim PDF documents into structured key-insight reports
//! using IBM watsonx.ai.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract  per-page direct text extraction (no OCR)
//!  ├─ 2. Chunk    group contiguous pages to fit the request-size limit
//!  ├─ 3. Token    exchange the API key for a short-lived bearer token
//!  ├─ 4. Analyze  one generation call per chunk, strictly in order
//!  ├─ 5. Report   concatenated Markdown, chunk order = page order
//!  └─ 6. Document optional `.docx` via pandoc
//! ```
//!
//! The pipeline is deliberately sequential: each chunk is analyzed only after
//! the previous chunk's result has been appended, and there are no retries.
//! A failed generation call for one chunk does not abort the run — the chunk
//! is replaced by an inline diagnostic, visibly marked in the report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claimlens::{analyze, AnalysisConfig, WatsonxCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = WatsonxCredentials::new(
//!         std::env::var("WATSONX_API_KEY")?,
//!         std::env::var("WATSONX_PROJECT_ID")?,
//!     );
//!     let config = AnalysisConfig::builder(credentials).build()?;
//!     let output = analyze("claim.pdf", &config).await?;
//!     println!("{}", output.report);
//!     eprintln!(
//!         "{} pages, {} chunks, {} soft failures",
//!         output.stats.total_pages,
//!         output.stats.total_chunks,
//!         output.stats.soft_failed_chunks
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `claimlens` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! claimlens = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze, analyze_from_bytes, analyze_pages, analyze_session, analyze_sync,
    analyze_to_document, generate_document, inspect,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, WatsonxCredentials};
pub use error::ClaimLensError;
pub use output::{AnalysisOutput, AnalysisStats, ChunkResult, DocumentInfo, PageText};
pub use pipeline::watsonx::{AnalysisBackend, WatsonxBackend};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{Session, SessionState};
