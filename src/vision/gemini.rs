//! Google Gemini generateContent client
//!
//! Thin REST client over the `models/{model}:generateContent` endpoint.
//! Each call carries the instruction text plus every page image of one
//! batch as inline base64 PNG parts. HTTP failures are classified into the
//! [`VisionError`] taxonomy so the orchestrator can tell a quota stop from
//! a skippable transient error.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;

use super::{VisionError, VisionModel};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Placeholder key some deployments ship with; treated the same as unset.
const DUMMY_KEY: &str = "DUMMY_KEY_FOR_NOW";

/// Gemini vision client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client, failing fast when no usable key is configured.
    pub fn new(api_key: &str, model: &str) -> Result<Self, VisionError> {
        let key = api_key.trim();
        if key.is_empty() || key == DUMMY_KEY {
            return Err(VisionError::MissingApiKey);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: key.to_string(),
            model: model.to_string(),
        })
    }

    /// Build the generateContent request body: prompt text first, then one
    /// inline PNG part per image.
    fn build_request(prompt: &str, images: &[Vec<u8>]) -> serde_json::Value {
        let mut parts = vec![serde_json::json!({ "text": prompt })];

        for image in images {
            let data = base64::engine::general_purpose::STANDARD.encode(image);
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": "image/png",
                    "data": data,
                }
            }));
        }

        serde_json::json!({ "contents": [{ "parts": parts }] })
    }

    /// Concatenate the text parts of the first candidate.
    fn parse_response(body: &serde_json::Value) -> String {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array());

        match parts {
            Some(parts) => parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join(""),
            None => String::new(),
        }
    }

    /// Classify a non-success HTTP response.
    fn classify_failure(status: StatusCode, body: &str, model: &str) -> VisionError {
        if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
            return VisionError::QuotaExceeded;
        }
        if status == StatusCode::NOT_FOUND {
            return VisionError::ModelNotFound(model.to_string());
        }
        VisionError::Api(format!("Gemini returned {}: {}", status, body))
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, prompt: &str, images: &[Vec<u8>]) -> Result<String, VisionError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            BASE_URL, self.model, self.api_key
        );

        let request = Self::build_request(prompt, images);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::Api(format!("Failed to call Gemini: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body, &self.model));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VisionError::Api(format!("Failed to parse response: {}", e)))?;

        Ok(Self::parse_response(&body))
    }
}
