//! watsonx.ai interaction: bearer-token exchange and chunk generation.
//!
//! The only pipeline stage with network I/O. All prompt text lives in
//! [`crate::prompts`] so instruction changes never touch transport code.
//!
//! ## Two failure contracts
//!
//! * **Token exchange is fatal.** A rejected credential or unreachable
//!   identity service returns [`ClaimLensError::Auth`] and the pipeline halts
//!   before any generation spend.
//!
//! * **Generation is soft.** [`AnalysisBackend::generate`] returns a plain
//!   `String` by contract: on any failure (transport error, malformed JSON,
//!   missing field) it substitutes an inline diagnostic containing the raw
//!   failure detail. The orchestrator appends that string to the report like
//!   any other result so one bad chunk never aborts the batch — the chunk is
//!   just visibly marked as failed.

use crate::config::AnalysisConfig;
use crate::error::ClaimLensError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// IBM IAM grant type for API-key exchange.
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Marker present in every soft-failure diagnostic string.
pub const SOFT_FAILURE_MARKER: &str = "Watsonx response error";

/// Seam between the orchestrator and the generation service.
///
/// The production implementation is [`WatsonxBackend`]. Tests and callers
/// with custom transport needs inject their own via
/// [`crate::config::AnalysisConfigBuilder::backend`].
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Exchange the static API key for a short-lived bearer token.
    async fn fetch_token(&self, api_key: &str) -> Result<String, ClaimLensError>;

    /// Generate analysis text for one chunk's input.
    ///
    /// Never fails: any error is folded into the returned string as an
    /// inline diagnostic (see [`soft_failure`]).
    async fn generate(&self, input: &str, token: &str) -> String;
}

/// Build the inline diagnostic substituted for a failed generation call.
pub fn soft_failure(detail: &str, raw_body: &str) -> String {
    format!("[{SOFT_FAILURE_MARKER}: {detail} - Raw: {raw_body}]")
}

/// Whether a generation result is a soft-failure diagnostic rather than
/// model output.
pub fn is_soft_failure(text: &str) -> bool {
    text.starts_with(&format!("[{SOFT_FAILURE_MARKER}:"))
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    input: &'a str,
    parameters: GenerationParameters,
    model_id: &'a str,
    project_id: &'a str,
}

/// Fixed decoding parameters: deterministic greedy decoding, a hard cap on
/// generated length, no stop sequences, neutral repetition penalty.
#[derive(Debug, Serialize)]
struct GenerationParameters {
    decoding_method: &'static str,
    max_new_tokens: usize,
    min_new_tokens: usize,
    stop_sequences: Vec<String>,
    repetition_penalty: u32,
}

impl GenerationParameters {
    fn greedy(max_new_tokens: usize) -> Self {
        Self {
            decoding_method: "greedy",
            max_new_tokens,
            min_new_tokens: 0,
            stop_sequences: Vec::new(),
            repetition_penalty: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

// ── Pure response parsing (unit-tested without a server) ─────────────────

/// Extract `access_token` from an IAM response body.
pub(crate) fn parse_token_body(body: &str) -> Result<String, String> {
    serde_json::from_str::<TokenResponse>(body)
        .map(|r| r.access_token)
        .map_err(|e| e.to_string())
}

/// Extract `results[0].generated_text` from a generation response body.
pub(crate) fn parse_generation_body(body: &str) -> Result<String, String> {
    let response: GenerationResponse =
        serde_json::from_str(body).map_err(|e| e.to_string())?;
    response
        .results
        .into_iter()
        .next()
        .map(|r| r.generated_text)
        .ok_or_else(|| "results array is empty".to_string())
}

// ── Production backend ───────────────────────────────────────────────────

/// HTTP backend for IBM IAM + watsonx.ai.
///
/// Calls are synchronous from the pipeline's point of view: the orchestrator
/// awaits each one before starting the next, with whatever timeout the
/// transport defaults to.
pub struct WatsonxBackend {
    client: reqwest::Client,
    token_url: String,
    generation_url: String,
    model_id: String,
    project_id: String,
    max_new_tokens: usize,
}

impl WatsonxBackend {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: config.token_url.clone(),
            generation_url: config.generation_url.clone(),
            model_id: config.model_id.clone(),
            project_id: config.credentials.project_id.clone(),
            max_new_tokens: config.max_new_tokens,
        }
    }
}

#[async_trait]
impl AnalysisBackend for WatsonxBackend {
    async fn fetch_token(&self, api_key: &str) -> Result<String, ClaimLensError> {
        debug!("Requesting IAM token from {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", api_key)])
            .send()
            .await
            .map_err(|e| ClaimLensError::Auth {
                detail: format!("identity service unreachable: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClaimLensError::Auth {
            detail: format!("failed to read token response: {e}"),
        })?;

        if !status.is_success() {
            return Err(ClaimLensError::Auth {
                detail: format!("identity service returned HTTP {status}: {body}"),
            });
        }

        parse_token_body(&body).map_err(|e| ClaimLensError::Auth {
            detail: format!("malformed token response: {e}"),
        })
    }

    async fn generate(&self, input: &str, token: &str) -> String {
        let request = GenerationRequest {
            input,
            parameters: GenerationParameters::greedy(self.max_new_tokens),
            model_id: &self.model_id,
            project_id: &self.project_id,
        };

        let response = match self
            .client
            .post(&self.generation_url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Generation request failed to send: {e}");
                return soft_failure(&e.to_string(), "");
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Generation response unreadable: {e}");
                return soft_failure(&e.to_string(), "");
            }
        };

        match parse_generation_body(&body) {
            Ok(text) => {
                debug!("Generation returned {} chars", text.len());
                text
            }
            Err(e) => {
                warn!("Generation response did not match expected shape (HTTP {status}): {e}");
                soft_failure(&e, &body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_body_parses_access_token() {
        let body = r#"{"access_token":"abc123","token_type":"Bearer","expires_in":3600}"#;
        assert_eq!(parse_token_body(body).unwrap(), "abc123");
    }

    #[test]
    fn token_body_without_field_fails() {
        assert!(parse_token_body(r#"{"errorMessage":"bad key"}"#).is_err());
        assert!(parse_token_body("not json").is_err());
    }

    #[test]
    fn generation_body_parses_first_result() {
        let body = r#"{"results":[{"generated_text":"| Field | Value |","stop_reason":"eos_token"}]}"#;
        assert_eq!(parse_generation_body(body).unwrap(), "| Field | Value |");
    }

    #[test]
    fn generation_body_missing_results_fails() {
        assert!(parse_generation_body(r#"{"errors":[{"code":"x"}]}"#).is_err());
        assert!(parse_generation_body(r#"{"results":[]}"#).is_err());
        assert!(parse_generation_body("<html>503</html>").is_err());
    }

    #[test]
    fn soft_failure_is_detected_but_model_output_is_not() {
        assert!(is_soft_failure(&soft_failure("boom", "{}")));
        assert!(!is_soft_failure("| Claim number | 42 |"));
        // A report that merely mentions the marker mid-text is not a failure.
        assert!(!is_soft_failure("see [Watsonx response error: ...] above"));
    }

    #[test]
    fn soft_failure_carries_marker_and_raw_body() {
        let s = soft_failure("missing field `results`", r#"{"errors":[]}"#);
        assert!(s.contains(SOFT_FAILURE_MARKER));
        assert!(s.contains(r#"{"errors":[]}"#));
        assert!(s.starts_with('['));
        assert!(s.ends_with(']'));
    }

    #[test]
    fn request_body_matches_service_contract() {
        let request = GenerationRequest {
            input: "PROMPT\n\nDOCUMENT CONTENT:\ntext",
            parameters: GenerationParameters::greedy(8100),
            model_id: "meta-llama/llama-3-3-70b-instruct",
            project_id: "proj-42",
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["parameters"]["decoding_method"], "greedy");
        assert_eq!(json["parameters"]["max_new_tokens"], 8100);
        assert_eq!(json["parameters"]["min_new_tokens"], 0);
        assert_eq!(json["parameters"]["repetition_penalty"], 1);
        assert!(json["parameters"]["stop_sequences"]
            .as_array()
            .unwrap()
            .is_empty());
        assert_eq!(json["model_id"], "meta-llama/llama-3-3-70b-instruct");
        assert_eq!(json["project_id"], "proj-42");
    }
}
