//! Google Gemini API client
//!
//! Thin wrapper around the generateContent endpoint for text and
//! text + image prompts.

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{GenerativeModel, InlineImage, ModelError};
use crate::config::Config;

/// Maximum number of error body characters kept in a `ServiceUnavailable` error
const MAX_ERROR_BODY: usize = 200;

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    text_model: String,
    vision_model: String,
    timeout: Duration,
}

// -- Response types --

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
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

impl GeminiClient {
    pub fn new(api_key: &str, config: &Config) -> Result<Self, String> {
        if api_key.trim().is_empty() {
            return Err("Gemini API key is required".to_string());
        }

        let endpoint = config.gemini_base_url.trim_end_matches('/');
        let parsed = reqwest::Url::parse(endpoint)
            .map_err(|e| format!("Invalid Gemini endpoint '{}': {}", endpoint, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "Gemini endpoint must use http or https scheme, got: {}",
                parsed.scheme()
            ));
        }

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        info!(
            "GeminiClient created for {} (text={}, vision={})",
            endpoint, config.text_model, config.vision_model
        );

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
            timeout,
        })
    }

    pub fn build_request_body(prompt: &str, image: Option<&InlineImage>) -> serde_json::Value {
        let mut parts = vec![serde_json::json!({ "text": prompt })];
        if let Some(image) = image {
            parts.push(serde_json::json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(&image.data)
                }
            }));
        }

        serde_json::json!({
            "contents": [{
                "parts": parts
            }]
        })
    }

    /// Concatenate the text parts of the first candidate.
    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn model_for(&self, image: Option<&InlineImage>) -> &str {
        if image.is_some() {
            &self.vision_model
        } else {
            &self.text_model
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.timeout.as_secs())
        } else {
            ModelError::Network(err.to_string())
        }
    }
}

fn truncate_error_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, ModelError> {
        let model = self.model_for(image);
        let url = format!("{}/{}:generateContent", self.endpoint, model);
        let body = Self::build_request_body(prompt, image);

        info!(
            "Gemini generate: model={} prompt={} chars image={}",
            model,
            prompt.len(),
            image.map_or(0, |i| i.data.len())
        );

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| ModelError::Network(format!("Invalid API key header: {}", e)))?;

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!("Gemini API error {}", status);
            // Truncate error body to avoid leaking sensitive data
            return Err(ModelError::ServiceUnavailable {
                status: status.as_u16(),
                message: truncate_error_body(&error_body),
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(self.timeout.as_secs())
            } else {
                ModelError::InvalidEnvelope(e.to_string())
            }
        })?;

        let text = Self::extract_text(&gemini_response).ok_or(ModelError::EmptyResponse)?;
        debug!("Gemini returned {} chars", text.len());
        Ok(text)
    }

    fn text_model(&self) -> &str {
        &self.text_model
    }

    fn vision_model(&self) -> &str {
        &self.vision_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_body_text_only() {
        let body = GeminiClient::build_request_body("Recommend crops", None);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Recommend crops");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_build_request_body_with_image() {
        let image = InlineImage {
            mime_type: "image/png".to_string(),
            data: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let body = GeminiClient::build_request_body("Analyze", Some(&image));
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Analyze");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "iVBORw==");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response_json = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "{\"cropName\": "}, {"text": "\"Rice\"}"}]
                }
            }]
        });
        let response: GeminiResponse = serde_json::from_value(response_json).unwrap();
        assert_eq!(
            GeminiClient::extract_text(&response),
            Some("{\"cropName\": \"Rice\"}".to_string())
        );
    }

    #[test]
    fn test_extract_text_blocked_candidate() {
        let response_json = serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        });
        let response: GeminiResponse = serde_json::from_value(response_json).unwrap();
        assert!(GeminiClient::extract_text(&response).is_none());
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response: GeminiResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {}})).unwrap();
        assert!(GeminiClient::extract_text(&response).is_none());
    }

    #[test]
    fn test_new_empty_api_key() {
        let result = GeminiClient::new("  ", &Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_new_invalid_endpoint() {
        let config = Config {
            gemini_base_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        let result = GeminiClient::new("test-key-123", &config);
        assert!(result.err().unwrap().contains("http or https"));
    }

    #[test]
    fn test_new_valid_api_key_selects_models() {
        let config = Config::default();
        let client = GeminiClient::new("test-key-123", &config).unwrap();
        assert_eq!(client.text_model(), config.text_model);
        assert_eq!(client.vision_model(), config.vision_model);
        let image = InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: vec![1],
        };
        assert_eq!(client.model_for(Some(&image)), config.vision_model);
        assert_eq!(client.model_for(None), config.text_model);
    }

    #[test]
    fn test_truncate_error_body() {
        let long = "x".repeat(500);
        assert_eq!(truncate_error_body(&long).len(), MAX_ERROR_BODY);
        assert_eq!(truncate_error_body("short"), "short");
    }
}
