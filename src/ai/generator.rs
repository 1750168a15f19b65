use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::AiConfig;

/// External prompt-in / text-out service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Gemini `generateContent` over REST.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                cfg.base_url.trim_end_matches('/'),
                cfg.model
            ),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let key = self
            .api_key
            .as_deref()
            .context("GEMINI_API_KEY is not configured")?;

        let start = std::time::Instant::now();
        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .context("gemini request")?
            .error_for_status()
            .context("gemini http status")?;

        let body: GenerateResponse = resp.json().await.context("decode gemini response")?;
        let text = body.text().context("gemini returned no text")?;
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "gemini generation completed"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let body: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn blank_or_missing_candidates_have_no_text() {
        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.text().is_none());

        let blank: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  " }] } }]
        }))
        .unwrap();
        assert!(blank.text().is_none());
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(&AiConfig {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "http://127.0.0.1:9".into(),
        })
        .unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
