//! Configuration types for claim-document analysis.
//!
//! All pipeline behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to pass a run's configuration through the stages and to diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: explicit credentials, validated at build time
//! The credentials are a required constructor argument rather than ambient
//! process environment read at call time. A missing or blank key fails at
//! [`AnalysisConfigBuilder::build`] with [`ClaimLensError::InvalidConfig`],
//! not minutes later as an authentication error on the first request.

use crate::error::ClaimLensError;
use crate::pipeline::watsonx::AnalysisBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default IBM IAM token-issuance endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Default watsonx.ai text-generation endpoint.
pub const DEFAULT_GENERATION_URL: &str =
    "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation?version=2024-01-15";

/// Default generation model.
pub const DEFAULT_MODEL_ID: &str = "meta-llama/llama-3-3-70b-instruct";

/// Default pages per chunk.
///
/// 90 pages per request keeps a typical claim file in a single generation
/// call while staying under the request-size limit. Lower it for documents
/// with unusually dense pages.
pub const DEFAULT_CHUNK_SIZE: usize = 90;

/// Default cap on generated tokens per chunk.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 8100;

/// The two credentials required by the watsonx.ai generation service.
#[derive(Clone)]
pub struct WatsonxCredentials {
    /// IBM Cloud API key, exchanged for a short-lived bearer token.
    pub api_key: String,
    /// watsonx.ai project identifier, sent with every generation request.
    pub project_id: String,
}

impl WatsonxCredentials {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
        }
    }
}

// Never print the API key, not even in debug output.
impl fmt::Debug for WatsonxCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatsonxCredentials")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Configuration for one analysis run.
///
/// Built via [`AnalysisConfig::builder`].
///
/// # Example
/// ```rust
/// use claimlens::{AnalysisConfig, WatsonxCredentials};
///
/// let config = AnalysisConfig::builder(WatsonxCredentials::new("key", "project"))
///     .chunk_size(30)
///     .model_id("meta-llama/llama-3-3-70b-instruct")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Required service credentials.
    pub credentials: WatsonxCredentials,

    /// Maximum contiguous pages per chunk. Default: 90.
    ///
    /// Every chunk becomes one generation request, so this is the knob that
    /// trades request count against request size. Chunk boundaries never
    /// split a page.
    pub chunk_size: usize,

    /// Generation model identifier. Default: [`DEFAULT_MODEL_ID`].
    pub model_id: String,

    /// Identity-service token URL. Default: [`DEFAULT_TOKEN_URL`].
    pub token_url: String,

    /// Generation-service URL. Default: [`DEFAULT_GENERATION_URL`].
    pub generation_url: String,

    /// Hard cap on generated tokens per chunk. Default: 8100.
    ///
    /// Decoding is greedy with no stop sequences and neutral repetition
    /// penalty; this cap is the only bound on output length.
    pub max_new_tokens: usize,

    /// Custom instruction preamble. If None, uses
    /// [`crate::prompts::INSURANCE_CLAIM_PROMPT`].
    pub prompt: Option<String>,

    /// Directory the `.docx` document is written to. Default: `"."`.
    pub output_dir: PathBuf,

    /// Progress callback for pipeline events. Default: none.
    pub progress_callback: Option<ProgressCallback>,

    /// Pre-constructed backend. Takes precedence over the HTTP backend built
    /// from the URLs above. Used by tests and callers that need custom
    /// transport behaviour.
    pub backend: Option<Arc<dyn AnalysisBackend>>,
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("credentials", &self.credentials)
            .field("chunk_size", &self.chunk_size)
            .field("model_id", &self.model_id)
            .field("token_url", &self.token_url)
            .field("generation_url", &self.generation_url)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("prompt", &self.prompt.as_ref().map(|_| "<custom>"))
            .field("output_dir", &self.output_dir)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn AnalysisBackend>"))
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder with the given credentials.
    pub fn builder(credentials: WatsonxCredentials) -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: AnalysisConfig {
                credentials,
                chunk_size: DEFAULT_CHUNK_SIZE,
                model_id: DEFAULT_MODEL_ID.to_string(),
                token_url: DEFAULT_TOKEN_URL.to_string(),
                generation_url: DEFAULT_GENERATION_URL.to_string(),
                max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
                prompt: None,
                output_dir: PathBuf::from("."),
                progress_callback: None,
                backend: None,
            },
        }
    }
}

/// Builder for [`AnalysisConfig`].
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn chunk_size(mut self, pages: usize) -> Self {
        self.config.chunk_size = pages;
        self
    }

    pub fn model_id(mut self, model: impl Into<String>) -> Self {
        self.config.model_id = model.into();
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.config.token_url = url.into();
        self
    }

    pub fn generation_url(mut self, url: impl Into<String>) -> Self {
        self.config.generation_url = url.into();
        self
    }

    pub fn max_new_tokens(mut self, n: usize) -> Self {
        self.config.max_new_tokens = n;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, ClaimLensError> {
        let c = &self.config;
        if c.credentials.api_key.trim().is_empty() {
            return Err(ClaimLensError::InvalidConfig(
                "API key must not be empty (set WATSONX_API_KEY)".into(),
            ));
        }
        if c.credentials.project_id.trim().is_empty() {
            return Err(ClaimLensError::InvalidConfig(
                "Project ID must not be empty (set WATSONX_PROJECT_ID)".into(),
            ));
        }
        if c.chunk_size == 0 {
            return Err(ClaimLensError::InvalidConfig(
                "Chunk size must be ≥ 1 page".into(),
            ));
        }
        if c.max_new_tokens == 0 {
            return Err(ClaimLensError::InvalidConfig(
                "max_new_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = AnalysisConfig::builder(WatsonxCredentials::new("k", "p"))
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 90);
        assert_eq!(config.max_new_tokens, 8100);
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert!(config.token_url.contains("iam.cloud.ibm.com"));
        assert!(config.generation_url.contains("/ml/v1/text/generation"));
    }

    #[test]
    fn empty_api_key_fails_fast() {
        let err = AnalysisConfig::builder(WatsonxCredentials::new("", "p"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("WATSONX_API_KEY"));
    }

    #[test]
    fn empty_project_id_fails_fast() {
        assert!(AnalysisConfig::builder(WatsonxCredentials::new("k", "  "))
            .build()
            .is_err());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(AnalysisConfig::builder(WatsonxCredentials::new("k", "p"))
            .chunk_size(0)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AnalysisConfig::builder(WatsonxCredentials::new("secret-key", "p"))
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }
}
