//! Collaborator interface for the video intelligence service.

use async_trait::async_trait;

use vscore_models::{
    IndexId, IndexingTask, LogicalIndex, TaskId, TopicSummary, VideoAsset, VideoIdentifier,
};

use crate::error::IntelResult;
use crate::types::{IndexCapabilities, SearchMatch, SearchScope, TaskSnapshot, Transcript};

/// Operations the pipeline needs from the video intelligence service.
///
/// Implemented over HTTP by [`crate::IntelClient`]; tests provide in-memory fakes.
#[async_trait]
pub trait VideoIntelligence: Send + Sync {
    /// List every logical index visible to the API key.
    async fn list_indexes(&self) -> IntelResult<Vec<LogicalIndex>>;

    /// Create a logical index with the given capabilities.
    async fn create_index(
        &self,
        name: &str,
        capabilities: &IndexCapabilities,
    ) -> IntelResult<LogicalIndex>;

    /// Upload an asset and start an asynchronous indexing job.
    async fn create_indexing_task(
        &self,
        index_id: &IndexId,
        asset: &VideoAsset,
    ) -> IntelResult<IndexingTask>;

    async fn get_task_status(&self, task_id: &TaskId) -> IntelResult<TaskSnapshot>;

    /// Ranked similarity search restricted by `scope`.
    async fn semantic_search(
        &self,
        index_id: &IndexId,
        query: &str,
        scope: &SearchScope,
    ) -> IntelResult<Vec<SearchMatch>>;

    /// Time-aligned transcript; empty when the video has no speech.
    async fn get_transcript(
        &self,
        index_id: &IndexId,
        video_id: &VideoIdentifier,
    ) -> IntelResult<Transcript>;

    /// Free-form descriptive analysis of a video.
    async fn describe_video(
        &self,
        video_id: &VideoIdentifier,
        instruction: &str,
    ) -> IntelResult<String>;

    /// Title, topics and hashtags for a video.
    async fn gist(&self, video_id: &VideoIdentifier) -> IntelResult<TopicSummary>;

    async fn delete_video(&self, index_id: &IndexId, video_id: &VideoIdentifier)
        -> IntelResult<()>;
}
