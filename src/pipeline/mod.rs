//! Pipeline stages for claim-document analysis.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and lets us swap implementations (e.g. a
//! different generation backend) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ chunk ──▶ watsonx ──▶ report
//! (pdf-extract) (group)  (IAM token   (markdown → docx
//!                         + generate)  via pandoc)
//! ```
//!
//! 1. [`extract`] — per-page direct text extraction, sentinel for empty pages
//! 2. [`chunk`]   — group contiguous pages into fixed-size batches
//! 3. [`watsonx`] — the only stage with network I/O: bearer-token exchange
//!    and one generation call per chunk, strictly sequential
//! 4. [`report`]  — convert the assembled Markdown report to `.docx`

pub mod chunk;
pub mod extract;
pub mod report;
pub mod watsonx;
