//! Video intelligence request/response types.
//!
//! Wire types are private to the crate; every known response shape is
//! mapped into one canonical type here, and unknown shapes are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vscore_models::{IndexId, LogicalIndex, TaskStatus, TopicSummary, VideoIdentifier};

use crate::error::{IntelError, IntelResult};

// =============================================================================
// Public types
// =============================================================================

/// Model configuration used when creating an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model_name: String,
    pub model_options: Vec<String>,
}

/// Capabilities an index is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCapabilities {
    pub models: Vec<ModelSpec>,
}

impl Default for IndexCapabilities {
    /// Search embeddings plus the generative model, both over visual and audio.
    fn default() -> Self {
        let options = vec!["visual".to_string(), "audio".to_string()];
        Self {
            models: vec![
                ModelSpec {
                    model_name: "marengo2.7".to_string(),
                    model_options: options.clone(),
                },
                ModelSpec {
                    model_name: "pegasus1.2".to_string(),
                    model_options: options,
                },
            ],
        }
    }
}

/// Polled state of an indexing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub video_id: Option<VideoIdentifier>,
}

/// Restricts a search to a single video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchScope {
    pub video_id: VideoIdentifier,
    pub page_limit: u32,
}

impl SearchScope {
    pub fn video(video_id: VideoIdentifier) -> Self {
        Self {
            video_id,
            page_limit: 5,
        }
    }
}

/// One ranked search match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub video_id: VideoIdentifier,
    pub start: f64,
    pub end: f64,
    /// Similarity score in [0, 100]
    pub score: f64,
}

/// One time-aligned transcript segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Time-aligned transcript plus the duration reported for the video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub duration_secs: Option<f64>,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_page: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexWire {
    #[serde(rename = "_id")]
    pub id: String,
    pub index_name: String,
}

impl From<IndexWire> for LogicalIndex {
    fn from(w: IndexWire) -> Self {
        LogicalIndex::new(IndexId::from(w.id), w.index_name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListIndexesResponse {
    #[serde(default)]
    pub data: Vec<IndexWire>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIndexRequest<'a> {
    pub index_name: &'a str,
    pub models: &'a [ModelSpec],
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResponse {
    pub status: String,
    #[serde(default)]
    pub video_id: Option<String>,
}

impl TaskResponse {
    pub fn into_snapshot(self) -> IntelResult<TaskSnapshot> {
        let status = self
            .status
            .parse::<TaskStatus>()
            .map_err(|e| IntelError::invalid_response(e.to_string()))?;
        Ok(TaskSnapshot {
            status,
            video_id: self
                .video_id
                .filter(|v| !v.is_empty())
                .map(VideoIdentifier::from),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchMatchWire {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub data: Vec<SearchMatchWire>,
}

impl From<SearchMatchWire> for SearchMatch {
    fn from(w: SearchMatchWire) -> Self {
        SearchMatch {
            video_id: VideoIdentifier::from(w.video_id),
            start: w.start,
            end: w.end,
            score: w.score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SystemMetadata {
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscriptionWire {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoResponse {
    #[serde(default)]
    pub system_metadata: Option<SystemMetadata>,
    #[serde(default)]
    pub transcription: Option<Vec<TranscriptionWire>>,
}

impl From<VideoResponse> for Transcript {
    fn from(w: VideoResponse) -> Self {
        Transcript {
            duration_secs: w.system_metadata.and_then(|m| m.duration),
            segments: w
                .transcription
                .unwrap_or_default()
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeRequest<'a> {
    pub video_id: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GistRequest<'a> {
    pub video_id: &'a str,
    pub types: [&'static str; 3],
}

#[derive(Debug, Deserialize)]
pub(crate) struct GistResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl From<GistResponse> for TopicSummary {
    fn from(w: GistResponse) -> Self {
        TopicSummary {
            title: w.title.filter(|t| !t.trim().is_empty()),
            topics: w.topics,
            hashtags: w.hashtags,
        }
    }
}

// =============================================================================
// Descriptive analysis adapter
// =============================================================================

/// Text either as a plain string or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextPayload {
    Plain(String),
    Nested { text: String },
}

impl TextPayload {
    fn into_text(self) -> String {
        match self {
            TextPayload::Plain(s) | TextPayload::Nested { text: s } => s,
        }
    }
}

/// Every response shape the analysis endpoint is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescribeResponse {
    Data { data: TextPayload },
    Content { content: TextPayload },
    Plain(String),
}

/// Normalize a descriptive-analysis response into one string.
pub fn normalize_describe_response(value: Value) -> IntelResult<String> {
    let parsed: DescribeResponse = serde_json::from_value(value).map_err(|_| {
        IntelError::invalid_response("unrecognized descriptive analysis response shape")
    })?;

    let text = match parsed {
        DescribeResponse::Data { data } => data.into_text(),
        DescribeResponse::Content { content } => content.into_text(),
        DescribeResponse::Plain(s) => s,
    };
    Ok(text.trim().to_string())
}
