//! Per-upload session state.
//!
//! Each analysis run owns exactly one [`Session`], created when the upload is
//! accepted and discarded (replaced) on the next upload. The orchestrator in
//! [`crate::analyze`] drives the state machine; pipeline stages receive the
//! session by reference and record their progress on it. No session state is
//! shared between runs, so no locking is needed.
//!
//! ## State machine
//!
//! ```text
//! Idle ─▶ Extracting ─▶ ExtractionFailed (terminal)
//!                   └─▶ Extracted ─▶ TokenFetch ─▶ AuthFailed (terminal)
//!                                             └─▶ Analyzing {current, total}
//!                                                       │ (strictly sequential)
//!                                                       ▼
//!                                                  Analyzed ─▶ ReportGenerating
//!                                                       │              │
//!                                                       │              ├─▶ ReportFailed
//!                                                       ▼              ▼   (report text kept)
//!                                                    (done)       ReportReady
//! ```
//!
//! `Analyzed` is terminal when no document is requested. `ReportFailed` is
//! terminal for the document step only: the analysis report produced before
//! it remains available on the output.

use std::path::PathBuf;

/// Where a session currently is in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No work started yet.
    Idle,
    /// Extracting page text from the uploaded PDF.
    Extracting,
    /// The PDF could not be parsed. Terminal.
    ExtractionFailed,
    /// Page text extracted; chunking is pure and instantaneous.
    Extracted,
    /// Exchanging the API key for a bearer token.
    TokenFetch,
    /// The identity service rejected the credential. Terminal; no
    /// generation request was issued.
    AuthFailed,
    /// Analyzing chunk `current` of `total` (1-based). Chunks run strictly
    /// in order; `current` only ever increases by one.
    Analyzing { current: usize, total: usize },
    /// All chunks analyzed; the report string is final.
    Analyzed,
    /// Converting the report to a document.
    ReportGenerating,
    /// Document conversion failed. The report text is still valid.
    ReportFailed,
    /// Document written; download can be offered.
    ReportReady,
}

/// State owned by one upload's pipeline run.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    /// Original uploaded file name, used to derive the document path.
    file_name: String,
    /// Set once a document has been generated for the current report, so a
    /// repeated conversion request reuses the path instead of reconverting.
    document_path: Option<PathBuf>,
}

impl Session {
    /// Start a fresh session for an upload. Any previous session is simply
    /// dropped by the caller; nothing carries over.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            state: SessionState::Idle,
            file_name: file_name.into(),
            document_path: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path of the generated document, if conversion succeeded.
    pub fn document_path(&self) -> Option<&PathBuf> {
        self.document_path.as_ref()
    }

    /// Whether the pipeline stopped in a state it cannot leave.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self.state,
            SessionState::ExtractionFailed | SessionState::AuthFailed
        )
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }

    pub(crate) fn set_document_path(&mut self, path: PathBuf) {
        self.document_path = Some(path);
        self.state = SessionState::ReportReady;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let s = Session::new("claim.pdf");
        assert_eq!(*s.state(), SessionState::Idle);
        assert_eq!(s.file_name(), "claim.pdf");
        assert!(s.document_path().is_none());
    }

    #[test]
    fn hard_failures_are_terminal() {
        let mut s = Session::new("claim.pdf");
        s.transition(SessionState::Extracting);
        s.transition(SessionState::ExtractionFailed);
        assert!(s.is_terminal_failure());

        let mut s = Session::new("claim.pdf");
        s.transition(SessionState::TokenFetch);
        s.transition(SessionState::AuthFailed);
        assert!(s.is_terminal_failure());
    }

    #[test]
    fn report_failed_keeps_analysis_results() {
        // ReportFailed halts only the download step; it is not a pipeline
        // failure and the session still exposes no document path.
        let mut s = Session::new("claim.pdf");
        s.transition(SessionState::Analyzed);
        s.transition(SessionState::ReportGenerating);
        s.transition(SessionState::ReportFailed);
        assert!(!s.is_terminal_failure());
        assert!(s.document_path().is_none());
    }

    #[test]
    fn document_path_marks_report_ready() {
        let mut s = Session::new("claim.pdf");
        s.transition(SessionState::ReportGenerating);
        s.set_document_path(PathBuf::from("claim_Insurance_Claim_Analysis.docx"));
        assert_eq!(*s.state(), SessionState::ReportReady);
        assert!(s.document_path().is_some());
    }
}
