//! Convert the assembled Markdown report to a `.docx` document.
//!
//! Document conversion is delegated to the external `pandoc` binary — the
//! same collaborator boundary the rest of the pipeline treats the identity
//! and generation services as. A missing or failing converter is a
//! [`ClaimLensError::Conversion`]; the report text itself is unaffected and
//! the caller keeps displaying it.

use crate::error::ClaimLensError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Fixed suffix appended to the uploaded file's stem.
pub const DOCUMENT_SUFFIX: &str = "_Insurance_Claim_Analysis.docx";

/// MIME type of the generated document, for download affordances.
pub const DOCUMENT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Deterministic output path for a given uploaded file name.
///
/// `claim.pdf` in `out_dir` becomes `out_dir/claim_Insurance_Claim_Analysis.docx`.
/// The same inputs always map to the same path, so regenerating overwrites
/// rather than accumulating files.
pub fn document_path(file_name: &str, out_dir: &Path) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    out_dir.join(format!("{stem}{DOCUMENT_SUFFIX}"))
}

/// Write the Markdown report as a `.docx` document under `out_dir`.
///
/// # Errors
/// [`ClaimLensError::Conversion`] when pandoc is not installed or exits
/// non-zero. The caller must not offer a download in that case, but any
/// already-displayed report text stays valid.
pub async fn write_document(
    markdown: &str,
    file_name: &str,
    out_dir: &Path,
) -> Result<PathBuf, ClaimLensError> {
    let out_path = document_path(file_name, out_dir);
    debug!("Converting report to {}", out_path.display());

    if let Some(parent) = out_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ClaimLensError::OutputWriteFailed {
                path: out_path.clone(),
                source: e,
            })?;
    }

    // Feed pandoc a scratch file rather than stdin; the invocation is then
    // identical across platforms.
    let md_path = out_path.with_extension("md.tmp");
    tokio::fs::write(&md_path, markdown)
        .await
        .map_err(|e| ClaimLensError::OutputWriteFailed {
            path: md_path.clone(),
            source: e,
        })?;

    let result = Command::new("pandoc")
        .arg(&md_path)
        .args(["-f", "markdown", "-t", "docx", "-o"])
        .arg(&out_path)
        .output()
        .await;

    // Scratch file is no longer needed whatever the outcome.
    tokio::fs::remove_file(&md_path).await.ok();

    let output = result.map_err(|e| ClaimLensError::Conversion {
        detail: format!("failed to run pandoc: {e}"),
    })?;

    if !output.status.success() {
        return Err(ClaimLensError::Conversion {
            detail: format!(
                "pandoc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    info!("Document written to {}", out_path.display());
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_derivation_strips_extension_and_adds_suffix() {
        let p = document_path("claim.pdf", Path::new("."));
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "claim_Insurance_Claim_Analysis.docx"
        );
    }

    #[test]
    fn path_derivation_is_deterministic() {
        let a = document_path("claim.pdf", Path::new("/tmp/out"));
        let b = document_path("claim.pdf", Path::new("/tmp/out"));
        assert_eq!(a, b);
    }

    #[test]
    fn path_derivation_handles_names_without_extension() {
        let p = document_path("claim", Path::new("out"));
        assert_eq!(
            p,
            PathBuf::from("out").join("claim_Insurance_Claim_Analysis.docx")
        );
    }

    /// Skip unless pandoc is installed; mirrors the env-gated live tests in
    /// `tests/pipeline.rs`.
    fn pandoc_available() -> bool {
        std::process::Command::new("pandoc")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn write_document_overwrites_same_path() {
        if !pandoc_available() {
            println!("SKIP — pandoc not installed");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let first = write_document("# Report\n\n| A | B |\n|---|---|\n| 1 | 2 |\n", "claim.pdf", dir.path())
            .await
            .unwrap();
        let second = write_document("# Report v2\n", "claim.pdf", dir.path())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(second.exists());
        // Only the docx remains; the scratch markdown file is cleaned up.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn missing_converter_is_a_conversion_error() {
        // The inverse gate: only meaningful on machines without pandoc.
        if pandoc_available() {
            println!("SKIP — pandoc is installed");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let result = write_document("# Report\n", "claim.pdf", dir.path()).await;
        assert!(matches!(result, Err(ClaimLensError::Conversion { .. })));
    }
}
