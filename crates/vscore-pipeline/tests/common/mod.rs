//! In-memory collaborators for pipeline integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use vscore_genai::{GenAiError, GenAiResult, GenerativeModel, ResponseFormat};
use vscore_intel::{
    IndexCapabilities, IntelError, IntelResult, SearchMatch, SearchScope, TaskSnapshot,
    Transcript, TranscriptSegment, VideoIntelligence,
};
use vscore_models::{
    IndexId, IndexingTask, LogicalIndex, TaskId, TaskStatus, TopicSummary, VideoAsset,
    VideoIdentifier,
};
use vscore_pipeline::{IndexRegistry, Pipeline, PipelineConfig, RetryConfig};

pub const VIDEO_ID: &str = "vid-1";
pub const INDEX_ID: &str = "idx-1";

// ============================================================================
// Video intelligence fake
// ============================================================================

pub struct FakeIntel {
    /// Statuses returned by successive polls; the last one repeats.
    pub statuses: Mutex<VecDeque<TaskStatus>>,
    pub transcript: Transcript,
    /// Score returned for every defect query.
    pub search_score: f64,
    pub niche_answer: String,
    pub gist: TopicSummary,
    pub panic_on_describe: bool,
    /// Added to transcript and description calls.
    pub latency: Duration,
    /// Deletes that fail with a 503 before one succeeds.
    pub delete_failures: AtomicUsize,
    pub delete_attempts: AtomicUsize,
    pub remote_calls: AtomicUsize,
    pub polls: AtomicUsize,
    pub deleted: Mutex<Vec<VideoIdentifier>>,
    pub instructions: Mutex<Vec<String>>,
}

impl FakeIntel {
    /// A 10 second fitness clip with one dead-air gap and no defects.
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::from([TaskStatus::Processing, TaskStatus::Ready])),
            transcript: Transcript {
                duration_secs: Some(10.0),
                segments: vec![
                    segment(0.0, 2.0, "Welcome back to the channel"),
                    segment(2.5, 4.0, "today we train legs"),
                    segment(7.0, 10.0, "let's get started right now"),
                ],
            },
            search_score: 60.0,
            niche_answer: "fitness".to_string(),
            gist: TopicSummary {
                title: Some("Leg day at home".to_string()),
                topics: vec!["workout".into(), "legs".into(), "home gym".into()],
                hashtags: vec!["#fitness".into()],
            },
            panic_on_describe: false,
            latency: Duration::ZERO,
            delete_failures: AtomicUsize::new(0),
            delete_attempts: AtomicUsize::new(0),
            remote_calls: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(self, statuses: &[TaskStatus]) -> Self {
        *self.statuses.lock().unwrap() = statuses.iter().copied().collect();
        self
    }

    pub fn with_search_score(mut self, score: f64) -> Self {
        self.search_score = score;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_describe = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_delete_failures(self, failures: usize) -> Self {
        self.delete_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<VideoIdentifier> {
        self.deleted.lock().unwrap().clone()
    }

    fn touch(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn lag(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn segment(start: f64, end: f64, text: &str) -> TranscriptSegment {
    TranscriptSegment {
        start,
        end,
        text: text.to_string(),
    }
}

#[async_trait]
impl VideoIntelligence for FakeIntel {
    async fn list_indexes(&self) -> IntelResult<Vec<LogicalIndex>> {
        self.touch();
        Ok(vec![LogicalIndex::new(INDEX_ID, "vscore-videos")])
    }

    async fn create_index(
        &self,
        name: &str,
        _capabilities: &IndexCapabilities,
    ) -> IntelResult<LogicalIndex> {
        self.touch();
        Ok(LogicalIndex::new("idx-new", name))
    }

    async fn create_indexing_task(
        &self,
        index_id: &IndexId,
        _asset: &VideoAsset,
    ) -> IntelResult<IndexingTask> {
        self.touch();
        Ok(IndexingTask::new("task-1", index_id.clone()))
    }

    async fn get_task_status(&self, _task_id: &TaskId) -> IntelResult<TaskSnapshot> {
        self.touch();
        self.polls.fetch_add(1, Ordering::SeqCst);
        let status = {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().copied().unwrap_or(TaskStatus::Ready)
            }
        };
        Ok(TaskSnapshot {
            status,
            video_id: (status == TaskStatus::Ready).then(|| VideoIdentifier::from(VIDEO_ID)),
        })
    }

    async fn semantic_search(
        &self,
        _index_id: &IndexId,
        query: &str,
        scope: &SearchScope,
    ) -> IntelResult<Vec<SearchMatch>> {
        self.touch();
        let score = if query.contains("shaky") {
            self.search_score
        } else {
            40.0
        };
        Ok(vec![SearchMatch {
            video_id: scope.video_id.clone(),
            start: 3.0,
            end: 5.5,
            score,
        }])
    }

    async fn get_transcript(
        &self,
        _index_id: &IndexId,
        _video_id: &VideoIdentifier,
    ) -> IntelResult<Transcript> {
        self.touch();
        self.lag().await;
        Ok(self.transcript.clone())
    }

    async fn describe_video(
        &self,
        _video_id: &VideoIdentifier,
        instruction: &str,
    ) -> IntelResult<String> {
        self.touch();
        if self.panic_on_describe {
            panic!("describe exploded");
        }
        self.lag().await;
        self.instructions.lock().unwrap().push(instruction.to_string());
        if instruction.starts_with("Classify this video") {
            return Ok(self.niche_answer.clone());
        }
        Ok("Target audience: everyone\nA presenter demonstrates squats in a living room.".to_string())
    }

    async fn gist(&self, _video_id: &VideoIdentifier) -> IntelResult<TopicSummary> {
        self.touch();
        Ok(self.gist.clone())
    }

    async fn delete_video(
        &self,
        _index_id: &IndexId,
        video_id: &VideoIdentifier,
    ) -> IntelResult<()> {
        self.touch();
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .delete_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(IntelError::ServerError(503, "unavailable".to_string()));
        }
        self.deleted.lock().unwrap().push(video_id.clone());
        Ok(())
    }
}

// ============================================================================
// Generative model fake
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBehavior {
    /// Valid report; mentions pacing when the prompt reports dead air
    Valid,
    /// Text that is not a report
    Garbage,
    /// Non-retryable failure
    Fail,
    /// Panics after recording the prompt
    Panic,
}

pub struct FakeModel {
    pub behavior: ModelBehavior,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new(behavior: ModelBehavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(
        &self,
        prompt: &str,
        _temperature: f32,
        _format: ResponseFormat,
    ) -> GenAiResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.behavior {
            ModelBehavior::Garbage => Ok("I'd rate this video quite highly!".to_string()),
            ModelBehavior::Fail => Err(GenAiError::BadRequest("prompt rejected".to_string())),
            ModelBehavior::Panic => panic!("scoring model exploded"),
            ModelBehavior::Valid => {
                let dead_air = prompt.contains("dead-air gap(s)") && !prompt.contains(" 0 dead-air");
                let mut weaknesses = vec!["Ending feels abrupt".to_string()];
                if dead_air {
                    weaknesses.push("Pacing stalls during a long silent pause".to_string());
                }
                let report = json!({
                    "scores": {
                        "overall": 74, "hook": 80, "pacing": 58, "visual_quality": 72,
                        "audio_quality": 70, "engagement": 77, "niche_fit": 88
                    },
                    "feedback": {
                        "strengths": ["Clear demonstration"],
                        "weaknesses": weaknesses,
                        "suggestions": ["Trim the pause before the final set"]
                    },
                    "metadata": {"caption": "Leg day, no gym needed", "hashtags": ["#legday"]}
                });
                Ok(format!("```json\n{}\n```", report))
            }
        }
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_max_attempts(2)
        .with_initial_delay(Duration::from_millis(1))
}

pub fn test_config(work_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        poll_interval: Duration::from_millis(1),
        poll_max_attempts: 10,
        extraction_timeout: Duration::from_secs(5),
        work_dir: work_dir.to_path_buf(),
        retry: fast_retry(),
        ..PipelineConfig::default()
    }
}

pub async fn build_pipeline(
    intel: Arc<FakeIntel>,
    model: Arc<FakeModel>,
    config: PipelineConfig,
) -> Pipeline {
    let registry = Arc::new(IndexRegistry::new(intel.clone(), config.retry.clone()));
    Pipeline::new(intel, model, registry, config).await.unwrap()
}

/// Write a small fake video into `dir` and return its path.
pub fn write_video(dir: &Path) -> PathBuf {
    let path = dir.join("upload.mp4");
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    path
}
