//! REST client for the hosted generative model's `generateContent`
//! endpoint, using [`reqwest`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Default public endpoint for the generative model API.
const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model used by both pipelines.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the generative-model client.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base HTTP URL of the model API.
    pub api_url: String,
    /// API key, sent via the `x-goog-api-key` header.
    pub api_key: String,
    /// Model name, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl PipelineConfig {
    /// Load pipeline configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default                                    |
    /// |-------------------------|----------|--------------------------------------------|
    /// | `GEMINI_API_KEY`        | **yes**  | --                                         |
    /// | `GEMINI_API_URL`        | no       | `https://generativelanguage.googleapis.com`|
    /// | `GEMINI_MODEL`          | no       | `gemini-2.0-flash`                         |
    /// | `PIPELINE_TIMEOUT_SECS` | no       | `60`                                       |
    ///
    /// # Panics
    ///
    /// Panics if `GEMINI_API_KEY` is not set or is empty.
    pub fn from_env() -> Self {
        let api_key =
            std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set in the environment");
        assert!(!api_key.is_empty(), "GEMINI_API_KEY must not be empty");

        let api_url =
            std::env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs: u64 = std::env::var("PIPELINE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("PIPELINE_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            api_key,
            model,
            timeout_secs,
        }
    }
}

/// Errors from the pipeline layer.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The caller's input was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Pipeline request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The model API returned a non-2xx status code.
    #[error("Pipeline API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The model responded, but not with the JSON shape we asked for.
    #[error("Pipeline returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// One part of a multimodal prompt.
pub enum Part {
    /// Plain prompt text.
    Text(String),
    /// Base64-encoded inline image.
    InlineImage {
        /// MIME type, e.g. `image/jpeg`.
        mime_type: String,
        /// Base64 image bytes.
        data: String,
    },
}

/// HTTP client for the generative model API.
///
/// Cheap to share behind an `Arc`; the inner [`reqwest::Client`] pools
/// connections.
pub struct GenerativeClient {
    client: reqwest::Client,
    config: PipelineConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerativeClient {
    /// Create a new client for the configured model.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Send a multimodal prompt and return the first candidate's text.
    ///
    /// The request asks for a JSON response body (`responseMimeType`),
    /// so flows can parse the returned text directly.
    pub async fn generate(&self, parts: &[Part]) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": parts.iter().map(|p| match p {
                    Part::Text(text) => serde_json::json!({ "text": text }),
                    Part::InlineImage { mime_type, data } => serde_json::json!({
                        "inline_data": { "mime_type": mime_type, "data": data }
                    }),
                }).collect::<Vec<_>>(),
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
            },
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url, self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(PipelineError::InvalidResponse(
                "model returned no candidates".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Strip a surrounding Markdown code fence from a model response, if any.
///
/// Models occasionally wrap JSON output in ```json ... ``` despite being
/// asked for a raw JSON body.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language hint on the fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the JSON payload a flow asked the model to produce.
pub(crate) fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, PipelineError> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| PipelineError::InvalidResponse(format!("malformed model JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plain_fence() {
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_fence_with_language_hint() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn unfenced_text_passes_through() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn parse_json_payload_accepts_fenced_json() {
        #[derive(Debug, serde::Deserialize)]
        struct Payload {
            a: i32,
        }
        let payload: Payload = parse_json_payload("```json\n{\"a\": 5}\n```").unwrap();
        assert_eq!(payload.a, 5);
    }

    #[test]
    fn parse_json_payload_rejects_garbage() {
        #[derive(Debug, serde::Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            a: i32,
        }
        let result: Result<Payload, _> = parse_json_payload("not json at all");
        assert!(matches!(result, Err(PipelineError::InvalidResponse(_))));
    }

    #[test]
    fn candidate_text_deserializes() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "hello" }, { "text": " world" } ] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        assert_eq!(text, "hello world");
    }
}
