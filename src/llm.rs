//! Language model capability
//!
//! The engine only needs "prompt in, text out, fallibly". Two HTTP-backed
//! implementations are provided; tests supply their own.

use crate::config::{LlmProvider, LlmSettings};
use crate::error::AiFailure;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider/model label for logs.
    fn name(&self) -> &str;

    /// One completion. No retries: a failure here is terminal for the request.
    async fn complete(&self, prompt: &str) -> Result<String, AiFailure>;
}

/// Builds the configured client, or `None` when no key is set.
pub fn from_settings(settings: &LlmSettings) -> Option<Arc<dyn LanguageModel>> {
    let api_key = settings.api_key.clone()?;
    let model: Arc<dyn LanguageModel> = match settings.provider {
        LlmProvider::Gemini => Arc::new(GeminiClient::new(
            api_key,
            settings.model.clone(),
            settings.base_url.clone(),
        )),
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
            api_key,
            settings.model.clone(),
            settings.base_url.clone(),
        )),
    };
    Some(model)
}

async fn post_json(
    request: reqwest::RequestBuilder,
    body: &serde_json::Value,
) -> Result<serde_json::Value, AiFailure> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| AiFailure::Capability(format!("LLM API call failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AiFailure::Capability(format!("LLM API error ({}): {}", status, error_text)));
    }

    response
        .json()
        .await
        .map_err(|e| AiFailure::Capability(format!("Failed to parse LLM response: {}", e.without_url())))
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiFailure> {
        let body = serde_json::json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        debug!(model = %self.model, "calling Gemini generateContent");
        // Header, not `?key=`: reqwest errors echo the request URL.
        let request = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.as_str());
        let response_json = post_json(request, &body).await?;
        extract_gemini_text(&response_json)
    }
}

/// Concatenates the text parts of the first candidate.
pub fn extract_gemini_text(response_json: &serde_json::Value) -> Result<String, AiFailure> {
    if let Some(error) = response_json.get("error") {
        return Err(AiFailure::Capability(format!("LLM API error: {}", error)));
    }

    let parts = response_json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = response_json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates");
            AiFailure::Capability(format!("No content in LLM response: {}", reason))
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(AiFailure::Capability("Empty content in LLM response".to_string()));
    }
    Ok(text)
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiFailure> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.1,
        });

        // Newer models reject max_tokens.
        if self.model.starts_with("gpt-4") || self.model.starts_with("gpt-5") || self.model.starts_with('o') {
            body["max_completion_tokens"] = serde_json::json!(2000);
        } else {
            body["max_tokens"] = serde_json::json!(2000);
        }

        debug!(model = %self.model, "calling chat completions");
        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key));
        let response_json = post_json(request, &body).await?;
        extract_openai_text(&response_json)
    }
}

pub fn extract_openai_text(response_json: &serde_json::Value) -> Result<String, AiFailure> {
    if let Some(error) = response_json.get("error") {
        return Err(AiFailure::Capability(format!("LLM API error: {}", error)));
    }

    let choice = response_json
        .pointer("/choices/0")
        .ok_or_else(|| AiFailure::Capability("No choices in LLM response".to_string()))?;

    match choice.get("finish_reason").and_then(|r| r.as_str()) {
        Some("content_filter") => {
            return Err(AiFailure::Capability(
                "LLM response was filtered by content policy".to_string(),
            ))
        }
        Some("length") => warn!("LLM response was truncated due to length limit"),
        _ => {}
    }

    let content = choice
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| AiFailure::Capability("No content in LLM response".to_string()))?;

    if content.trim().is_empty() {
        return Err(AiFailure::Capability("Empty content in LLM response".to_string()));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gemini_text_joins_parts() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [{"text": "SQL: SELECT 1"}, {"text": "\nExplanation: one"}]}}
            ]
        });
        assert_eq!(
            extract_gemini_text(&response).unwrap(),
            "SQL: SELECT 1\nExplanation: one"
        );
    }

    #[test]
    fn test_gemini_blocked_prompt() {
        let response = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = extract_gemini_text(&response).unwrap_err();
        assert_eq!(err, AiFailure::Capability("No content in LLM response: SAFETY".to_string()));
    }

    #[test]
    fn test_gemini_api_error() {
        let response = json!({"error": {"code": 403, "message": "API key not valid"}});
        assert!(matches!(extract_gemini_text(&response), Err(AiFailure::Capability(_))));
    }

    #[test]
    fn test_openai_content() {
        let response = json!({
            "choices": [{"message": {"content": "{\"explanation\": \"ok\"}"}, "finish_reason": "stop"}]
        });
        assert_eq!(extract_openai_text(&response).unwrap(), "{\"explanation\": \"ok\"}");
    }

    #[test]
    fn test_openai_failures() {
        let filtered = json!({"choices": [{"message": {"content": "x"}, "finish_reason": "content_filter"}]});
        assert!(extract_openai_text(&filtered).is_err());

        let empty = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(extract_openai_text(&empty).is_err());

        assert!(extract_openai_text(&json!({"choices": []})).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_gemini_does_not_leak_key() {
        let client = GeminiClient::new(
            "SUPER_SECRET_KEY".to_string(),
            "gemini-1.5-flash".to_string(),
            "http://127.0.0.1:1".to_string(),
        );
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/models/gemini-1.5-flash:generateContent");

        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, AiFailure::Capability(_)));
        assert!(!err.to_string().contains("SUPER_SECRET_KEY"), "{}", err);
    }

    #[tokio::test]
    async fn test_unreachable_openai_does_not_leak_key() {
        let client = OpenAiClient::new(
            "sk-SUPER_SECRET_KEY".to_string(),
            "gpt-4".to_string(),
            "http://127.0.0.1:1".to_string(),
        );
        let err = client.complete("hi").await.unwrap_err();
        assert!(!err.to_string().contains("SUPER_SECRET_KEY"), "{}", err);
    }

    #[test]
    fn test_from_settings_requires_key() {
        let mut settings = LlmSettings {
            provider: LlmProvider::OpenAi,
            api_key: None,
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1/".to_string(),
        };
        assert!(from_settings(&settings).is_none());

        settings.api_key = Some("key".to_string());
        let model = from_settings(&settings).unwrap();
        assert_eq!(model.name(), "gpt-4");
    }
}
