use crate::grounding::GroundingMetadata;
use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use dishscout_common::{DishError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_SNIPPET_MAX: usize = 300;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<GeminiSafetySetting>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_maps: GoogleMapsTool,
}

#[derive(Debug, Serialize)]
struct GoogleMapsTool {}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Google Gemini `generateContent` client.
///
/// Holds the API key for the lifetime of the process; build it once at
/// startup and share it behind an `Arc<dyn LlmClient>`.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
    maps_grounding: bool,
}

impl GeminiClient {
    /// Create a new client using the provided API key and model.
    ///
    /// A blank key is a configuration error: there is no point building a
    /// client that can only ever be rejected.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(DishError::Config("Gemini API key is not set".to_string()));
        }
        if model.trim().is_empty() {
            return Err(DishError::Config("Gemini model is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DishError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model,
            endpoint: GEMINI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            maps_grounding: false,
        })
    }

    /// Point the client at another base URL (proxies, test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound the whole request, including reading the body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask the service to ground answers in map places.
    pub fn with_maps_grounding(mut self, enabled: bool) -> Self {
        self.maps_grounding = enabled;
        self
    }

    fn create_safety_settings() -> Vec<GeminiSafetySetting> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| GeminiSafetySetting {
            category,
            threshold: "BLOCK_MEDIUM_AND_ABOVE",
        })
        .collect()
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        let tools = self.maps_grounding.then(|| {
            vec![GeminiTool {
                google_maps: GoogleMapsTool {},
            }]
        });

        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            tools,
            safety_settings: Some(Self::create_safety_settings()),
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let request = self.build_request(prompt);
        let started = Instant::now();

        tracing::debug!(
            url = %url,
            prompt_chars = prompt.len(),
            maps_grounding = self.maps_grounding,
            "sending Gemini request"
        );

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(transport_error)?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gemini response received"
        );

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_slice(&body)
            .map_err(|e| DishError::Decode(format!("Failed to parse Gemini response: {e}")))?;

        let tokens_used = gemini_response
            .usage_metadata
            .as_ref()
            .and_then(|u| u.total_token_count);
        let model = gemini_response
            .model_version
            .clone()
            .unwrap_or_else(|| self.model.clone());

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| service_error(status, "No candidates returned from Gemini"))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(service_error(
                status,
                "Content blocked by Gemini safety filters",
            ));
        }

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(service_error(status, "No text in Gemini response"));
        }

        Ok(LlmResponse {
            text,
            model: Some(model),
            tokens_used,
            grounding_metadata: candidate.grounding_metadata,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn transport_error(e: reqwest::Error) -> DishError {
    if e.is_timeout() {
        DishError::Timeout
    } else {
        // reqwest errors embed the URL, which never carries the key here.
        DishError::Transport(format!("Gemini request failed: {e}"))
    }
}

fn service_error(status: StatusCode, message: &str) -> DishError {
    DishError::Service {
        status: status.as_u16(),
        message: message.to_string(),
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> DishError {
    let (message, api_status) = match serde_json::from_slice::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (snippet(body), String::new()),
    };

    let key_rejected = message.contains("API_KEY_INVALID")
        || message.contains("API key not valid")
        || api_status == "UNAUTHENTICATED"
        || String::from_utf8_lossy(body).contains("API_KEY_INVALID");

    match status.as_u16() {
        401 | 403 => DishError::Config(format!("Gemini rejected the API key: {message}")),
        400 if key_rejected => DishError::Config(format!("Invalid API key: {message}")),
        429 => service_error(status, "Rate limit exceeded"),
        _ => service_error(status, &message),
    }
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.chars().count() <= ERROR_SNIPPET_MAX {
        trimmed.to_string()
    } else {
        let mut cut: String = trimmed.chars().take(ERROR_SNIPPET_MAX).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_key_is_a_configuration_error() {
        let err = GeminiClient::new("   ".into(), "gemini-2.5-flash".into())
            .err()
            .expect("blank key rejected");
        assert!(err.is_config());
    }

    #[test]
    fn request_includes_maps_tool_only_when_enabled() {
        let client = GeminiClient::new("k".into(), "m".into()).unwrap();
        let plain = serde_json::to_value(client.build_request("hi")).unwrap();
        assert!(plain.get("tools").is_none());
        assert_eq!(plain["contents"][0]["parts"][0]["text"], json!("hi"));
        assert_eq!(plain["safetySettings"].as_array().unwrap().len(), 4);

        let grounded = client.with_maps_grounding(true);
        let body = serde_json::to_value(grounded.build_request("hi")).unwrap();
        assert_eq!(body["tools"], json!([{ "googleMaps": {} }]));
    }

    #[test]
    fn invalid_key_on_400_maps_to_config() {
        let body = br#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        let err = status_error(StatusCode::BAD_REQUEST, body);
        assert!(err.is_config(), "got {err:?}");
    }

    #[test]
    fn plain_400_is_a_service_error() {
        let body = br#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        match status_error(StatusCode::BAD_REQUEST, body) {
            DishError::Service { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid JSON payload");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_is_truncated() {
        let body = "x".repeat(1000);
        match status_error(StatusCode::BAD_GATEWAY, body.as_bytes()) {
            DishError::Service { message, .. } => {
                assert_eq!(message.chars().count(), ERROR_SNIPPET_MAX + 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
