//! Video intelligence HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use vscore_models::{
    IndexId, IndexingTask, LogicalIndex, TaskId, TopicSummary, VideoAsset, VideoIdentifier,
};

use crate::error::{IntelError, IntelResult};
use crate::metrics::record_request;
use crate::service::VideoIntelligence;
use crate::types::{
    normalize_describe_response, AnalyzeRequest, CreateIndexRequest, CreatedResponse,
    GistRequest, GistResponse, IndexCapabilities, ListIndexesResponse, SearchMatch,
    SearchResponse, SearchScope, TaskResponse, TaskSnapshot, Transcript, VideoResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.twelvelabs.io/v1.3";

/// Configuration for the video intelligence client.
#[derive(Debug, Clone)]
pub struct IntelConfig {
    /// Base URL of the service API
    pub base_url: String,
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Per-request timeout (uploads included)
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Sampling temperature for descriptive analysis
    pub describe_temperature: f32,
}

impl IntelConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            describe_temperature: 0.2,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> IntelResult<Self> {
        let api_key = std::env::var("VIDEO_INTEL_API_KEY")
            .map_err(|_| IntelError::config("VIDEO_INTEL_API_KEY not set"))?;

        Ok(Self {
            base_url: std::env::var("VIDEO_INTEL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key,
            timeout: Duration::from_secs(
                std::env::var("VIDEO_INTEL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            connect_timeout: Duration::from_secs(10),
            describe_temperature: std::env::var("VIDEO_INTEL_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.2),
        })
    }

    fn validate(&self) -> IntelResult<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| IntelError::config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        if self.api_key.trim().is_empty() {
            return Err(IntelError::config("API key is empty"));
        }
        Ok(())
    }
}

/// HTTP client for the video intelligence service.
pub struct IntelClient {
    http: Client,
    config: IntelConfig,
}

impl IntelClient {
    /// Create a new client.
    pub fn new(config: IntelConfig) -> IntelResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> IntelResult<Self> {
        Self::new(IntelConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a request and map non-success statuses to errors.
    async fn execute(&self, operation: &'static str, request: RequestBuilder) -> IntelResult<Response> {
        let started = Instant::now();
        let response = request
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        record_request(operation, status.as_u16(), started.elapsed().as_secs_f64() * 1000.0);

        if status.is_success() {
            return Ok(response);
        }

        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body = response.text().await.unwrap_or_default();

        warn!(
            operation,
            status = status.as_u16(),
            "Video intelligence request failed: {}",
            body
        );
        Err(IntelError::from_http_status(status.as_u16(), body, retry_after_ms))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> IntelResult<T> {
        let response = self.execute(operation, request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl VideoIntelligence for IntelClient {
    async fn list_indexes(&self) -> IntelResult<Vec<LogicalIndex>> {
        let mut indexes = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self
                .http
                .get(self.url("indexes"))
                .query(&[("page", page.to_string()), ("page_limit", "50".to_string())]);
            let response: ListIndexesResponse = self.execute_json("list_indexes", request).await?;

            indexes.extend(response.data.into_iter().map(LogicalIndex::from));

            match response.page_info {
                Some(info) if info.page.max(page) < info.total_page => page += 1,
                _ => break,
            }
        }

        debug!(count = indexes.len(), "Listed indexes");
        Ok(indexes)
    }

    async fn create_index(
        &self,
        name: &str,
        capabilities: &IndexCapabilities,
    ) -> IntelResult<LogicalIndex> {
        let body = CreateIndexRequest {
            index_name: name,
            models: &capabilities.models,
        };
        let request = self.http.post(self.url("indexes")).json(&body);
        let created: CreatedResponse = self.execute_json("create_index", request).await?;
        Ok(LogicalIndex::new(IndexId::from(created.id), name))
    }

    async fn create_indexing_task(
        &self,
        index_id: &IndexId,
        asset: &VideoAsset,
    ) -> IntelResult<IndexingTask> {
        let bytes = tokio::fs::read(asset.path()).await?;
        let file = Part::bytes(bytes)
            .file_name(asset.original_filename.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| IntelError::BadRequest(format!("invalid content type: {}", e)))?;
        let form = Form::new()
            .text("index_id", index_id.to_string())
            .part("video_file", file);

        let request = self.http.post(self.url("tasks")).multipart(form);
        let created: CreatedResponse = self.execute_json("create_task", request).await?;

        let mut task = IndexingTask::new(TaskId::from(created.id), index_id.clone());
        task.video_id = created
            .video_id
            .filter(|v| !v.is_empty())
            .map(VideoIdentifier::from);
        Ok(task)
    }

    async fn get_task_status(&self, task_id: &TaskId) -> IntelResult<TaskSnapshot> {
        let request = self.http.get(self.url(&format!("tasks/{}", task_id)));
        let response: TaskResponse = self.execute_json("get_task", request).await?;
        response.into_snapshot()
    }

    async fn semantic_search(
        &self,
        index_id: &IndexId,
        query: &str,
        scope: &SearchScope,
    ) -> IntelResult<Vec<SearchMatch>> {
        let filter = serde_json::json!({ "id": [scope.video_id.as_str()] });
        let form = Form::new()
            .text("index_id", index_id.to_string())
            .text("query_text", query.to_string())
            .text("search_options", "visual")
            .text("search_options", "audio")
            .text("filter", filter.to_string())
            .text("page_limit", scope.page_limit.to_string());

        let request = self.http.post(self.url("search")).multipart(form);
        let response: SearchResponse = self.execute_json("search", request).await?;

        Ok(response
            .data
            .into_iter()
            .map(SearchMatch::from)
            .filter(|m| m.video_id == scope.video_id)
            .collect())
    }

    async fn get_transcript(
        &self,
        index_id: &IndexId,
        video_id: &VideoIdentifier,
    ) -> IntelResult<Transcript> {
        let request = self
            .http
            .get(self.url(&format!("indexes/{}/videos/{}", index_id, video_id)))
            .query(&[("transcription", "true")]);
        let response: VideoResponse = self.execute_json("get_transcript", request).await?;
        Ok(Transcript::from(response))
    }

    async fn describe_video(
        &self,
        video_id: &VideoIdentifier,
        instruction: &str,
    ) -> IntelResult<String> {
        let body = AnalyzeRequest {
            video_id: video_id.as_str(),
            prompt: instruction,
            temperature: self.config.describe_temperature,
            stream: false,
        };
        let request = self.http.post(self.url("analyze")).json(&body);
        let value: Value = self.execute_json("analyze", request).await?;
        normalize_describe_response(value)
    }

    async fn gist(&self, video_id: &VideoIdentifier) -> IntelResult<TopicSummary> {
        let body = GistRequest {
            video_id: video_id.as_str(),
            types: ["title", "topic", "hashtag"],
        };
        let request = self.http.post(self.url("gist")).json(&body);
        let response: GistResponse = self.execute_json("gist", request).await?;
        Ok(TopicSummary::from(response))
    }

    async fn delete_video(
        &self,
        index_id: &IndexId,
        video_id: &VideoIdentifier,
    ) -> IntelResult<()> {
        let request = self
            .http
            .delete(self.url(&format!("indexes/{}/videos/{}", index_id, video_id)));
        self.execute("delete_video", request).await?;
        Ok(())
    }
}
