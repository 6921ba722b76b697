//! Orchestrator: the top-level analysis entry points.
//!
//! The pipeline is strictly sequential — extract, token fetch, then one
//! generation call per chunk in order, each awaited before the next begins.
//! There is no internal parallelism and no retry; a hung remote call blocks
//! this session's pipeline until the transport gives up.
//!
//! Every run owns a fresh [`Session`] that records where the pipeline is
//! (see [`crate::session`]); stages receive it by reference. Hard failures
//! (extraction, auth) leave the session in a terminal state and return
//! `Err`. Per-chunk generation failures are soft: the diagnostic string is
//! appended to the report and the run continues.

use crate::config::AnalysisConfig;
use crate::error::ClaimLensError;
use crate::output::{AnalysisOutput, AnalysisStats, ChunkResult, DocumentInfo, PageText};
use crate::pipeline::watsonx::{is_soft_failure, AnalysisBackend, WatsonxBackend};
use crate::pipeline::{chunk, extract, report};
use crate::prompts;
use crate::session::{Session, SessionState};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Analyze a claim PDF on disk and return the report.
///
/// This is the primary entry point for the library. The document-conversion
/// step is not run; use [`analyze_to_document`] for that.
///
/// # Errors
/// Returns `Err(ClaimLensError)` only for hard failures: missing/unreadable
/// file, unparseable PDF, or rejected credential. Per-chunk generation
/// failures are embedded in the report (check `output.stats.soft_failed_chunks`).
pub async fn analyze(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ClaimLensError> {
    let path = input.as_ref();
    let bytes = read_pdf(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string());

    let mut session = Session::new(file_name);
    analyze_session(&mut session, bytes, config).await
}

/// Analyze PDF bytes already in memory.
///
/// `file_name` is the original upload's name; it is only used to derive the
/// document path and to label the session.
pub async fn analyze_from_bytes(
    bytes: Vec<u8>,
    file_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ClaimLensError> {
    let mut session = Session::new(file_name);
    analyze_session(&mut session, bytes, config).await
}

/// Analyze a claim PDF and convert the report to a `.docx` document.
///
/// A conversion failure does not retract the analysis: the returned output
/// still carries the full report, with `document = None` and the failure
/// message in `conversion_error`.
pub async fn analyze_to_document(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ClaimLensError> {
    let path = input.as_ref();
    let bytes = read_pdf(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string());

    let mut session = Session::new(file_name);
    let mut output = analyze_session(&mut session, bytes, config).await?;
    generate_document(&mut session, &mut output, config).await;
    Ok(output)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ClaimLensError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ClaimLensError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze(input, config))
}

/// Extract page statistics without analyzing anything.
///
/// Does not require credentials or network access.
pub async fn inspect(input: impl AsRef<Path>) -> Result<DocumentInfo, ClaimLensError> {
    let bytes = read_pdf(input.as_ref()).await?;
    let pages = extract::extract_pages(bytes).await?;
    Ok(DocumentInfo {
        page_count: pages.len(),
        empty_pages: pages.iter().filter(|p| p.is_empty_sentinel()).count(),
        page_chars: pages.iter().map(|p| p.text.chars().count()).collect(),
    })
}

/// Run the extract → chunk → analyze pipeline against an explicit session.
///
/// Public so hosts that manage their own sessions (one per user interaction)
/// can observe state transitions; the `analyze*` wrappers above create a
/// fresh session per call.
pub async fn analyze_session(
    session: &mut Session,
    bytes: Vec<u8>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ClaimLensError> {
    let total_start = Instant::now();
    info!("Starting analysis of '{}'", session.file_name());

    if let Some(magic) = extract::check_pdf_magic(&bytes) {
        session.transition(SessionState::ExtractionFailed);
        return Err(ClaimLensError::NotAPdf {
            path: session.file_name().into(),
            magic,
        });
    }

    // ── Extract ──────────────────────────────────────────────────────────
    session.transition(SessionState::Extracting);
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start();
    }
    let extract_start = Instant::now();
    let pages = match extract::extract_pages(bytes).await {
        Ok(p) => p,
        Err(e) => {
            session.transition(SessionState::ExtractionFailed);
            return Err(e);
        }
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    session.transition(SessionState::Extracted);
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(pages.len());
    }

    let mut output = analyze_pages(session, pages, config).await?;
    output.stats.extract_duration_ms = extract_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Run the chunk → token → analyze stages over already-extracted pages.
///
/// [`analyze_session`] calls this after extraction; it is public so hosts
/// that obtain page text some other way can reuse the analysis contract.
pub async fn analyze_pages(
    session: &mut Session,
    pages: Vec<PageText>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ClaimLensError> {
    let total_start = Instant::now();

    // ── Chunk ────────────────────────────────────────────────────────────
    let chunks = chunk::chunk_pages(&pages, config.chunk_size);
    info!(
        "{} pages grouped into {} chunks of at most {}",
        pages.len(),
        chunks.len(),
        config.chunk_size
    );

    // ── Token fetch ──────────────────────────────────────────────────────
    let backend = resolve_backend(config);
    session.transition(SessionState::TokenFetch);
    if let Some(ref cb) = config.progress_callback {
        cb.on_token_fetch();
    }
    let token = match backend.fetch_token(&config.credentials.api_key).await {
        Ok(t) => t,
        Err(e) => {
            session.transition(SessionState::AuthFailed);
            return Err(e);
        }
    };

    // ── Analyze chunks, strictly in order ────────────────────────────────
    let prompt = config
        .prompt
        .as_deref()
        .unwrap_or(prompts::INSURANCE_CLAIM_PROMPT);
    let total_chunks = chunks.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(total_chunks);
    }

    let analysis_start = Instant::now();
    let mut results: Vec<ChunkResult> = Vec::with_capacity(total_chunks);
    for chunk in &chunks {
        session.transition(SessionState::Analyzing {
            current: chunk.index,
            total: total_chunks,
        });
        if let Some(ref cb) = config.progress_callback {
            cb.on_chunk_start(chunk.index, total_chunks);
        }

        let chunk_start = Instant::now();
        let input = prompts::build_input(prompt, &chunk.text);
        // The next chunk starts only after this result (success or soft
        // failure) has been appended.
        let text = backend.generate(&input, &token).await;
        let duration_ms = chunk_start.elapsed().as_millis() as u64;
        let soft_failed = is_soft_failure(&text);

        if let Some(ref cb) = config.progress_callback {
            if soft_failed {
                cb.on_chunk_soft_failure(chunk.index, total_chunks, &text);
            } else {
                cb.on_chunk_complete(chunk.index, total_chunks, text.len());
            }
        }
        if soft_failed {
            warn!("Chunk {}/{} soft-failed", chunk.index, total_chunks);
        }

        results.push(ChunkResult {
            index: chunk.index,
            first_page: chunk.first_page,
            last_page: chunk.last_page,
            text,
            soft_failed,
            duration_ms,
        });
    }
    let analysis_duration_ms = analysis_start.elapsed().as_millis() as u64;

    session.transition(SessionState::Analyzed);
    let soft_failed_chunks = results.iter().filter(|r| r.soft_failed).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(total_chunks, soft_failed_chunks);
    }

    // ── Assemble the report ──────────────────────────────────────────────
    let report = results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let stats = AnalysisStats {
        total_pages: pages.len(),
        empty_pages: pages.iter().filter(|p| p.is_empty_sentinel()).count(),
        total_chunks,
        soft_failed_chunks,
        // Patched by analyze_session, which owns the extraction timing.
        extract_duration_ms: 0,
        analysis_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Analysis complete: {} chunks ({} soft-failed), {}ms total",
        stats.total_chunks, stats.soft_failed_chunks, stats.total_duration_ms
    );

    Ok(AnalysisOutput {
        report,
        pages,
        chunks: results,
        stats,
        document: None,
        conversion_error: None,
    })
}

/// Run the document-conversion step for an already-analyzed session.
///
/// On failure the session moves to `ReportFailed` and the error message is
/// recorded on the output; the report itself is untouched.
pub async fn generate_document(
    session: &mut Session,
    output: &mut AnalysisOutput,
    config: &AnalysisConfig,
) {
    // Redundant conversion work is skipped: the path for this report was
    // already produced.
    if let Some(path) = session.document_path() {
        output.document = Some(path.clone());
        return;
    }

    session.transition(SessionState::ReportGenerating);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start();
    }

    match report::write_document(&output.report, session.file_name(), &config.output_dir).await {
        Ok(path) => {
            session.set_document_path(path.clone());
            output.document = Some(path);
        }
        Err(e) => {
            warn!("Document conversion failed: {e}");
            session.transition(SessionState::ReportFailed);
            output.conversion_error = Some(e.to_string());
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Use the injected backend when present, otherwise the HTTP backend built
/// from the configured URLs.
fn resolve_backend(config: &AnalysisConfig) -> Arc<dyn AnalysisBackend> {
    match config.backend {
        Some(ref backend) => Arc::clone(backend),
        None => Arc::new(WatsonxBackend::from_config(config)),
    }
}

/// Read a PDF from disk, mapping the usual I/O failures to precise errors.
async fn read_pdf(path: &Path) -> Result<Vec<u8>, ClaimLensError> {
    if !path.exists() {
        return Err(ClaimLensError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClaimLensError::Internal(format!("failed to read '{}': {e}", path.display())))?;
    if let Some(magic) = extract::check_pdf_magic(&bytes) {
        return Err(ClaimLensError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let err = inspect("/definitely/not/a/real/claim.pdf").await.unwrap_err();
        assert!(matches!(err, ClaimLensError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_bytes_fail_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claim.pdf");
        std::fs::write(&path, b"PK\x03\x04 zip, not pdf").unwrap();

        let err = inspect(&path).await.unwrap_err();
        assert!(matches!(err, ClaimLensError::NotAPdf { .. }));
    }
}
