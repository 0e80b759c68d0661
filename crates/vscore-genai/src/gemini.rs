//! Gemini client for scoring prompts.
//!
//! Calls `generateContent` on an ordered list of models and returns the
//! first successful response text.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GenAiError, GenAiResult};
use crate::metrics::{record_fallback, record_request};
use crate::model::{GenerativeModel, ResponseFormat};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Models tried in order until one succeeds
    pub models: Vec<String>,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Create config from environment variables.
    ///
    /// `GEMINI_MODELS` is a comma-separated fallback list.
    pub fn from_env() -> GenAiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GenAiError::config("GEMINI_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(models) = std::env::var("GEMINI_MODELS") {
            let models: Vec<String> = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !models.is_empty() {
                config.models = models;
            }
        }
        config.timeout = Duration::from_secs(
            std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        );
        Ok(config)
    }

    fn validate(&self) -> GenAiResult<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| GenAiError::config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        if self.api_key.trim().is_empty() {
            return Err(GenAiError::config("GEMINI_API_KEY is empty"));
        }
        if self.models.is_empty() {
            return Err(GenAiError::config("no Gemini models configured"));
        }
        Ok(())
    }
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> GenAiResult<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenAiError::invalid_response("No content in Gemini response"));
        }
        Ok(text)
    }
}

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> GenAiResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn models(&self) -> &[String] {
        &self.config.models
    }

    /// Call `generateContent` on one model.
    async fn call_model(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        format: ResponseFormat,
    ) -> GenAiResult<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature,
                response_mime_type: format.mime_type(),
            },
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                record_request(model, false, elapsed_ms);
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            record_request(model, false, elapsed_ms);
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenAiError::from_http_status(
                status.as_u16(),
                error_text,
                retry_after_ms,
            ));
        }

        let body = response.bytes().await?;
        let parsed: GeminiResponse = serde_json::from_slice(&body)?;
        let text = parsed.into_text();
        record_request(model, text.is_ok(), elapsed_ms);
        text
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        format: ResponseFormat,
    ) -> GenAiResult<String> {
        let mut last_error = None;

        for model in &self.config.models {
            debug!(model = %model, "Attempting Gemini API");
            match self.call_model(model, prompt, temperature, format).await {
                Ok(text) => {
                    info!(model = %model, chars = text.len(), "Gemini response received");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini model failed");
                    record_fallback(model);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GenAiError::config("no Gemini models configured")))
    }
}
