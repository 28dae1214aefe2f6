use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

use roster_core::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider-reported throttling. Routed to a distinct advisory path
    /// instead of the generic extraction fallback.
    #[error("generation quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("generation transport error: {0}")]
    Transport(String),
    #[error("generation request timed out after {0}s")]
    Timeout(u64),
    #[error("generation service returned an empty response")]
    EmptyResponse,
    #[error("llm client configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

/// Boundary to the generation service. Schema-constrained completions are
/// used for routing and extraction; free-text completions for summaries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Request output conforming to `schema`. The returned text is expected
    /// to parse as JSON matching the schema; callers still validate it.
    async fn complete_with_schema(&self, prompt: &str, schema: &Value)
        -> Result<String, LlmError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Configuration("llm.api_key is not set".to_string()))?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| LlmError::Configuration(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
        })
    }

    async fn generate(&self, body: Value) -> Result<String, LlmError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| self.classify_transport(err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| LlmError::Transport(err.to_string()))?;

        if status.as_u16() == 429 || (!status.is_success() && text.contains("quota")) {
            return Err(LlmError::QuotaExceeded(truncate_for_log(&text)));
        }
        if !status.is_success() {
            return Err(LlmError::Transport(format!(
                "status {status}: {}",
                truncate_for_log(&text)
            )));
        }

        extract_candidate_text(&text)
    }

    fn classify_transport(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

fn extract_candidate_text(body: &str) -> Result<String, LlmError> {
    let parsed: Value =
        serde_json::from_str(body).map_err(|err| LlmError::Transport(err.to_string()))?;
    parsed
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(LlmError::EmptyResponse)
}

fn truncate_for_log(text: &str) -> String {
    const MAX: usize = 200;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let cut = text.char_indices().take_while(|(i, _)| *i < MAX).count();
        text.chars().take(cut).collect()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        self.generate(body).await
    }

    async fn complete_with_schema(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseJsonSchema": schema,
            },
        });
        self.generate(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_candidate_text, LlmError};

    #[test]
    fn candidate_text_is_extracted_from_response_body() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"tier\":\"mega\"}"}]}}]}"#;
        let text = extract_candidate_text(body).expect("candidate text");
        assert_eq!(text, "{\"tier\":\"mega\"}");
    }

    #[test]
    fn missing_candidates_is_an_empty_response() {
        let error = extract_candidate_text("{}").expect_err("no candidates");
        assert!(matches!(error, LlmError::EmptyResponse));
    }

    #[test]
    fn quota_variant_is_distinguished() {
        assert!(LlmError::QuotaExceeded("too many requests".to_string()).is_quota());
        assert!(!LlmError::Transport("boom".to_string()).is_quota());
    }
}
