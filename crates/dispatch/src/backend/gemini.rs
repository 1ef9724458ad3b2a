//! Gemini API backend.

use super::LanguageModel;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct ApiRequest {
    contents: Vec<ApiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: ApiContent,
}

/// Builder for creating a Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiBackendBuilder {
    api_key: String,
    model: String,
}

impl GeminiBackendBuilder {
    /// Create a new builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Select a model (defaults to `gemini-2.0-flash`).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build the backend.
    pub fn build(self) -> GeminiBackend {
        GeminiBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
        }
    }
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Create a builder for the Gemini backend.
    pub fn builder(api_key: impl Into<String>) -> GeminiBackendBuilder {
        GeminiBackendBuilder::new(api_key)
    }

    /// Create a backend from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::builder(api_key).build())
    }

    /// The model this backend is configured for.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl LanguageModel for GeminiBackend {
    async fn generate(&self, transcript: &str) -> Result<String> {
        let request = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: transcript.to_string(),
                }],
            }],
        };

        let url = format!("{GEMINI_API_URL}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(e.to_string()))?;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| Error::Api("response contained no candidates".into()))?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request() {
        let request = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: "hello".into(),
                }],
            }],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"contents":[{"parts":[{"text":"hello"}]}]}"#);
    }

    #[test]
    fn parse_response_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "{\"action\": "}, {"text": "\"done\"}"}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        let text: String = response.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, r#"{"action": "done"}"#);
    }

    #[test]
    fn parse_response_without_candidates() {
        let response: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(response.candidates.is_empty());
    }

    #[test]
    fn builder_defaults() {
        let backend = GeminiBackend::builder("k").build();
        assert_eq!(backend.model(), "gemini-2.0-flash");
        assert_eq!(backend.to_string(), "gemini(gemini-2.0-flash)");
    }
}
