//! Index resolution and indexing task management.
//!
//! The [`IndexRegistry`] is the only state shared across runs: a read-mostly
//! cache of logical indexes by name. Resolution is list-then-create, so two
//! runs racing on a cold cache may both create the index; the duplicate is
//! harmless and the cache converges on whichever insert lands last.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vscore_intel::{IndexCapabilities, TaskSnapshot, VideoIntelligence};
use vscore_models::{IndexingTask, LogicalIndex, TaskStatus, VideoAsset, VideoIdentifier};

use crate::error::{PipelineError, PipelineResult};
use crate::progress::ProgressSender;
use crate::retry::{with_retry, RetryConfig};

// =============================================================================
// Index registry
// =============================================================================

/// Process-lifetime cache of logical indexes.
pub struct IndexRegistry {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
    capabilities: IndexCapabilities,
    cache: RwLock<HashMap<String, LogicalIndex>>,
}

impl IndexRegistry {
    pub fn new(intel: Arc<dyn VideoIntelligence>, retry: RetryConfig) -> Self {
        Self {
            intel,
            retry,
            capabilities: IndexCapabilities::default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry and resolve `index_name` up front.
    pub async fn bootstrap(
        intel: Arc<dyn VideoIntelligence>,
        retry: RetryConfig,
        index_name: &str,
    ) -> PipelineResult<Self> {
        let registry = Self::new(intel, retry);
        let index = registry.ensure_index(index_name).await?;
        info!(index = %index.name, index_id = %index.id, "Index registry ready");
        Ok(registry)
    }

    /// Cached index, if already resolved.
    pub async fn cached(&self, name: &str) -> Option<LogicalIndex> {
        self.cache.read().await.get(name).cloned()
    }

    /// Return the index named `name`, creating it if it does not exist.
    pub async fn ensure_index(&self, name: &str) -> PipelineResult<LogicalIndex> {
        if let Some(index) = self.cached(name).await {
            return Ok(index);
        }

        let existing = with_retry(&self.retry, "list_indexes", || self.intel.list_indexes()).await?;
        let index = match existing.into_iter().find(|i| i.name == name) {
            Some(index) => {
                debug!(index_id = %index.id, "Found existing index {}", name);
                index
            }
            None => {
                info!("Creating index {}", name);
                with_retry(&self.retry, "create_index", || {
                    self.intel.create_index(name, &self.capabilities)
                })
                .await?
            }
        };

        self.cache
            .write()
            .await
            .insert(name.to_string(), index.clone());
        Ok(index)
    }
}

// =============================================================================
// Poll state machine
// =============================================================================

/// Outcome of one status check while waiting for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Still queued or processing; poll again
    Waiting,
    Ready,
    Failed,
    TimedOut,
}

impl PollState {
    /// Transition after the `attempt`-th status check (1-based) observed `status`.
    pub fn next(status: TaskStatus, attempt: u32, max_attempts: u32) -> PollState {
        match status {
            TaskStatus::Ready => PollState::Ready,
            TaskStatus::Failed => PollState::Failed,
            TaskStatus::Queued | TaskStatus::Processing if attempt >= max_attempts => {
                PollState::TimedOut
            }
            TaskStatus::Queued | TaskStatus::Processing => PollState::Waiting,
        }
    }
}

/// Polling parameters for [`IndexingManager::await_ready`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
        }
    }
}

/// Cosmetic fraction for the `attempt`-th poll within `[floor, ceiling)`.
///
/// Approaches the ceiling but never reaches it.
pub fn poll_fraction(floor: f64, ceiling: f64, attempt: u32, max_attempts: u32) -> f64 {
    let span = (ceiling - floor).max(0.0);
    let progress = attempt as f64 / (max_attempts.max(1) as f64 + 1.0);
    floor + span * progress.min(1.0) * 0.95
}

// =============================================================================
// Indexing manager
// =============================================================================

/// Submits indexing tasks and waits for them to finish.
pub struct IndexingManager {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
    poll: PollConfig,
}

impl IndexingManager {
    pub fn new(intel: Arc<dyn VideoIntelligence>, retry: RetryConfig, poll: PollConfig) -> Self {
        Self { intel, retry, poll }
    }

    /// Upload the asset and start indexing it.
    pub async fn submit(
        &self,
        index: &LogicalIndex,
        asset: &VideoAsset,
    ) -> PipelineResult<IndexingTask> {
        let task = with_retry(&self.retry, "create_indexing_task", || {
            self.intel.create_indexing_task(&index.id, asset)
        })
        .await?;
        info!(task_id = %task.id, index_id = %index.id, "Indexing task created");
        Ok(task)
    }

    /// Poll until the task is ready, failed, or out of attempts.
    ///
    /// Emits progress within `[floor, ceiling)` while waiting.
    pub async fn await_ready(
        &self,
        task: &IndexingTask,
        progress: &ProgressSender,
        floor: f64,
        ceiling: f64,
    ) -> PipelineResult<VideoIdentifier> {
        let max_attempts = self.poll.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let snapshot: TaskSnapshot = with_retry(&self.retry, "get_task_status", || {
                self.intel.get_task_status(&task.id)
            })
            .await?;

            match PollState::next(snapshot.status, attempt, max_attempts) {
                PollState::Ready => {
                    let video_id = snapshot
                        .video_id
                        .or_else(|| task.video_id.clone())
                        .ok_or_else(|| {
                            PipelineError::indexing_failed(format!(
                                "task {} is ready but has no video id",
                                task.id
                            ))
                        })?;
                    info!(task_id = %task.id, video_id = %video_id, attempt, "Indexing complete");
                    return Ok(video_id);
                }
                PollState::Failed => {
                    warn!(task_id = %task.id, attempt, "Indexing task failed");
                    return Err(PipelineError::indexing_failed(format!(
                        "task {} reported failure",
                        task.id
                    )));
                }
                PollState::TimedOut => {
                    warn!(task_id = %task.id, attempt, "Indexing task timed out");
                    return Err(PipelineError::IndexingTimedOut { attempts: attempt });
                }
                PollState::Waiting => {
                    debug!(task_id = %task.id, status = snapshot.status.as_str(), attempt, "Indexing in progress");
                    progress.progress(
                        format!("Indexing video ({})", snapshot.status.as_str()),
                        poll_fraction(floor, ceiling, attempt, max_attempts),
                    );
                    tokio::time::sleep(self.poll.interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use vscore_intel::{IntelResult, SearchMatch, SearchScope, Transcript};
    use vscore_models::{IndexId, TaskId, TopicSummary};

    /// Records index lookups and creations; nothing else is reachable.
    struct CountingIntel {
        existing: Vec<LogicalIndex>,
        lists: AtomicUsize,
        creates: AtomicUsize,
    }

    impl CountingIntel {
        fn new(existing: Vec<LogicalIndex>) -> Arc<Self> {
            Arc::new(Self {
                existing,
                lists: AtomicUsize::new(0),
                creates: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> (usize, usize) {
            (self.lists.load(Ordering::SeqCst), self.creates.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl VideoIntelligence for CountingIntel {
        async fn list_indexes(&self) -> IntelResult<Vec<LogicalIndex>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(self.existing.clone())
        }

        async fn create_index(
            &self,
            name: &str,
            _capabilities: &IndexCapabilities,
        ) -> IntelResult<LogicalIndex> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(LogicalIndex::new("idx-created", name))
        }

        async fn create_indexing_task(
            &self,
            _index_id: &IndexId,
            _asset: &VideoAsset,
        ) -> IntelResult<IndexingTask> {
            unimplemented!()
        }

        async fn get_task_status(&self, _task_id: &TaskId) -> IntelResult<TaskSnapshot> {
            unimplemented!()
        }

        async fn semantic_search(
            &self,
            _index_id: &IndexId,
            _query: &str,
            _scope: &SearchScope,
        ) -> IntelResult<Vec<SearchMatch>> {
            unimplemented!()
        }

        async fn get_transcript(
            &self,
            _index_id: &IndexId,
            _video_id: &VideoIdentifier,
        ) -> IntelResult<Transcript> {
            unimplemented!()
        }

        async fn describe_video(
            &self,
            _video_id: &VideoIdentifier,
            _instruction: &str,
        ) -> IntelResult<String> {
            unimplemented!()
        }

        async fn gist(&self, _video_id: &VideoIdentifier) -> IntelResult<TopicSummary> {
            unimplemented!()
        }

        async fn delete_video(
            &self,
            _index_id: &IndexId,
            _video_id: &VideoIdentifier,
        ) -> IntelResult<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_missing_index_is_created_once() {
        let intel = CountingIntel::new(vec![LogicalIndex::new("idx-other", "other")]);
        let registry = IndexRegistry::new(intel.clone(), RetryConfig::default());

        let first = registry.ensure_index("vscore-videos").await.unwrap();
        assert_eq!(first.id, IndexId::from("idx-created"));
        assert_eq!(intel.calls(), (1, 1));

        let second = registry.ensure_index("vscore-videos").await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(intel.calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_existing_index_is_reused() {
        let intel = CountingIntel::new(vec![LogicalIndex::new("idx-1", "vscore-videos")]);
        let registry = IndexRegistry::new(intel.clone(), RetryConfig::default());

        let index = registry.ensure_index("vscore-videos").await.unwrap();
        assert_eq!(index.id, IndexId::from("idx-1"));
        assert_eq!(intel.calls(), (1, 0));
    }

    #[tokio::test]
    async fn test_bootstrap_caches_so_later_lookups_stay_local() {
        let intel = CountingIntel::new(vec![LogicalIndex::new("idx-1", "vscore-videos")]);
        let registry = IndexRegistry::bootstrap(intel.clone(), RetryConfig::default(), "vscore-videos")
            .await
            .unwrap();
        assert!(registry.cached("vscore-videos").await.is_some());

        registry.ensure_index("vscore-videos").await.unwrap();
        registry.ensure_index("vscore-videos").await.unwrap();
        assert_eq!(intel.calls(), (1, 0));
    }

    #[test]
    fn test_transition_table() {
        assert_eq!(PollState::next(TaskStatus::Queued, 1, 60), PollState::Waiting);
        assert_eq!(PollState::next(TaskStatus::Processing, 59, 60), PollState::Waiting);
        assert_eq!(PollState::next(TaskStatus::Processing, 60, 60), PollState::TimedOut);
        assert_eq!(PollState::next(TaskStatus::Queued, 60, 60), PollState::TimedOut);
        assert_eq!(PollState::next(TaskStatus::Ready, 60, 60), PollState::Ready);
        assert_eq!(PollState::next(TaskStatus::Failed, 1, 60), PollState::Failed);
    }

    #[test]
    fn test_poll_fraction_stays_below_ceiling() {
        let mut last = 0.0;
        for attempt in 1..=60 {
            let f = poll_fraction(0.15, 0.4, attempt, 60);
            assert!(f >= last);
            assert!(f >= 0.15 && f < 0.4);
            last = f;
        }
    }

    #[test]
    fn test_poll_defaults() {
        let poll = PollConfig::default();
        assert_eq!(poll.max_attempts, 60);
        assert_eq!(poll.interval * poll.max_attempts, Duration::from_secs(120));
    }
}
