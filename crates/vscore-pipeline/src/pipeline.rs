//! The scoring pipeline.
//!
//! One run moves through fixed stages, each with a progress floor:
//!
//! | stage          | fraction    |
//! |----------------|-------------|
//! | validate input | 0.02        |
//! | resolve index  | 0.05        |
//! | upload         | 0.10        |
//! | indexing wait  | 0.15 - 0.40 |
//! | extraction     | 0.40        |
//! | scoring        | 0.80        |
//! | finalize       | 0.95        |
//!
//! Signal extraction and narrative analysis run concurrently once the video
//! is ready, each bounded by the extraction timeout.
//!
//! The run body is wrapped so that panics become run errors, and the
//! resource reaper is released after it on every path. Remote deletes run
//! detached; [`Pipeline::drain_cleanups`] waits for them at shutdown.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::Instrument;

use vscore_genai::GenerativeModel;
use vscore_intel::VideoIntelligence;
use vscore_models::{AnalysisContext, AnalyzeRequest, ScoreReport, VideoAsset};

use crate::agents::{
    run_agents, DefectSearchAgent, ExtractionTarget, NicheAgent, PacingAgent, SignalAgent,
    TopicAgent,
};
use crate::analyzer::Analyzer;
use crate::composer::PromptComposer;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::indexing::{IndexRegistry, IndexingManager, PollConfig};
use crate::logging::RunLogger;
use crate::metrics::{record_run, record_stage};
use crate::progress::{channel, noop_sender, ProgressReceiver, ProgressSender};
use crate::prompts::PromptTemplates;
use crate::reaper::ResourceReaper;
use crate::validator::ScoringValidator;

const INDEXING_FLOOR: f64 = 0.15;
const EXTRACTION_FLOOR: f64 = 0.40;

/// Orchestrates scoring runs. Cheap to clone; clones share collaborators.
#[derive(Clone)]
pub struct Pipeline {
    intel: Arc<dyn VideoIntelligence>,
    genai: Arc<dyn GenerativeModel>,
    registry: Arc<IndexRegistry>,
    config: Arc<PipelineConfig>,
    templates: Arc<PromptTemplates>,
    composer: Arc<PromptComposer>,
    cleanups: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Pipeline {
    /// Create a pipeline, loading prompt overrides if configured.
    pub async fn new(
        intel: Arc<dyn VideoIntelligence>,
        genai: Arc<dyn GenerativeModel>,
        registry: Arc<IndexRegistry>,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        let templates = Arc::new(PromptTemplates::load(config.prompt_file.as_deref()).await?);
        Ok(Self {
            intel,
            genai,
            registry,
            composer: Arc::new(PromptComposer::new(Arc::clone(&templates))),
            templates,
            config: Arc::new(config),
            cleanups: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run to completion and return the report.
    pub async fn analyze(&self, request: AnalyzeRequest) -> PipelineResult<ScoreReport> {
        self.run(request, noop_sender()).await
    }

    /// Start a run in the background and stream its progress.
    ///
    /// Dropping the receiver does not stop the run.
    pub fn analyze_streaming(&self, request: AnalyzeRequest) -> ProgressReceiver {
        let (tx, rx) = channel();
        let pipeline = self.clone();
        tokio::spawn(async move {
            let _ = pipeline.run(request, tx).await;
        });
        rx
    }

    /// Run with an explicit progress sender.
    ///
    /// Exactly one terminal event is sent before this returns.
    pub async fn run(
        &self,
        request: AnalyzeRequest,
        progress: ProgressSender,
    ) -> PipelineResult<ScoreReport> {
        let logger = RunLogger::new(&request.run_id, "analyze");
        let span = logger.create_span();
        self.run_guarded(request, progress, logger)
            .instrument(span)
            .await
    }

    async fn run_guarded(
        &self,
        request: AnalyzeRequest,
        progress: ProgressSender,
        logger: RunLogger,
    ) -> PipelineResult<ScoreReport> {
        let started = Instant::now();
        logger.log_start(&request.asset.original_filename);

        let mut reaper = ResourceReaper::new(
            Arc::clone(&self.intel),
            request.asset.path.clone(),
            self.config.remote_cleanup,
            self.config.retry.clone(),
        );

        let outcome = AssertUnwindSafe(self.execute(&request, &progress, &logger, &mut reaper))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(PipelineError::Panicked(panic_message(payload.as_ref()))),
        };

        if let Some(handle) = reaper.release() {
            self.track_cleanup(handle);
        }

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(report) => {
                let outcome = if report.degraded { "degraded" } else { "complete" };
                record_run(outcome, elapsed);
                logger.log_completion(&format!(
                    "overall score {} ({}) in {:.1}s",
                    report.overall(),
                    outcome,
                    elapsed
                ));
                progress.complete(report.clone());
            }
            Err(e) => {
                record_run(e.kind(), elapsed);
                logger.log_error(&e.to_string());
                progress.error(e.user_message());
            }
        }

        result
    }

    async fn execute(
        &self,
        request: &AnalyzeRequest,
        progress: &ProgressSender,
        logger: &RunLogger,
        reaper: &mut ResourceReaper,
    ) -> PipelineResult<ScoreReport> {
        stage(progress, logger, "validate_input", "Validating upload", 0.02);
        validate_asset(&request.asset).await?;

        stage(progress, logger, "resolve_index", "Preparing index", 0.05);
        let index = timed(
            "resolve_index",
            self.registry.ensure_index(&self.config.index_name),
        )
        .await?;

        stage(progress, logger, "upload", "Uploading video", 0.10);
        let indexing = IndexingManager::new(
            Arc::clone(&self.intel),
            self.config.retry.clone(),
            PollConfig {
                max_attempts: self.config.poll_max_attempts,
                interval: self.config.poll_interval,
            },
        );
        let task = timed("upload", indexing.submit(&index, &request.asset)).await?;
        if let Some(video_id) = &task.video_id {
            reaper.track_remote(index.id.clone(), video_id.clone());
        }

        stage(progress, logger, "indexing", "Indexing video", INDEXING_FLOOR);
        let video_id = timed(
            "indexing",
            indexing.await_ready(&task, progress, INDEXING_FLOOR, EXTRACTION_FLOOR),
        )
        .await?;
        reaper.track_remote(index.id.clone(), video_id.clone());

        stage(progress, logger, "extraction", "Extracting signals and analyzing video", EXTRACTION_FLOOR);
        let target = ExtractionTarget {
            index_id: index.id.clone(),
            video_id: video_id.clone(),
            explicit_niche: request.explicit_niche(),
        };
        let agents = self.agents();
        let analyzer = Analyzer::new(
            Arc::clone(&self.intel),
            self.config.retry.clone(),
            self.config.analysis_mode,
            Arc::clone(&self.templates),
        );
        let timeout = self.config.extraction_timeout;
        let (signals, analysis) = timed("extraction", async {
            tokio::join!(
                run_agents(&agents, &target, timeout),
                tokio::time::timeout(timeout, analyzer.analyze(&video_id)),
            )
        })
        .await;
        let signals = signals?;
        let analysis = analysis.map_err(|_| PipelineError::StageTimeout {
            stage: "analysis",
            seconds: timeout.as_secs(),
        })?;

        let context = AnalysisContext::new(signals, analysis);

        stage(progress, logger, "scoring", "Scoring video", 0.80);
        let prompt = self.composer.compose(request, &context);
        let validator = ScoringValidator::new(
            Arc::clone(&self.genai),
            self.config.retry.clone(),
            self.config.scoring_temperature,
        );
        let report = timed("scoring", validator.score(&prompt, &context.hashtag_candidates())).await;
        if report.degraded {
            logger.log_warning("scoring output unusable, completing with default report");
        }

        stage(progress, logger, "finalize", "Finalizing report", 0.95);
        Ok(report)
    }

    /// Wait for remote cleanups still running from finished runs.
    pub async fn drain_cleanups(&self) {
        let pending = {
            match self.cleanups.lock() {
                Ok(mut pending) => std::mem::take(&mut *pending),
                Err(_) => return,
            }
        };
        for handle in pending {
            let _ = handle.await;
        }
    }

    fn track_cleanup(&self, handle: JoinHandle<()>) {
        if let Ok(mut pending) = self.cleanups.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    fn agents(&self) -> Vec<Box<dyn SignalAgent>> {
        let retry = &self.config.retry;
        let defects: Box<dyn SignalAgent> = Box::new(DefectSearchAgent::new(
            Arc::clone(&self.intel),
            retry.clone(),
            self.config.defect_threshold,
        ));
        vec![
            defects,
            Box::new(PacingAgent::new(Arc::clone(&self.intel), retry.clone())),
            Box::new(NicheAgent::new(
                Arc::clone(&self.intel),
                retry.clone(),
                &self.templates.niche,
            )),
            Box::new(TopicAgent::new(Arc::clone(&self.intel), retry.clone())),
        ]
    }
}

fn stage(progress: &ProgressSender, logger: &RunLogger, name: &str, message: &str, fraction: f64) {
    logger.log_stage(name, fraction);
    progress.progress(message, fraction);
}

async fn timed<F: Future>(stage: &'static str, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut.await;
    record_stage(stage, started.elapsed().as_secs_f64());
    output
}

/// Reject a missing or empty upload before any remote call.
async fn validate_asset(asset: &VideoAsset) -> PipelineResult<()> {
    let metadata = match tokio::fs::metadata(asset.path()).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::invalid_input("no video file was uploaded"))
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(PipelineError::invalid_input("upload is not a regular file"));
    }
    if metadata.len() == 0 {
        return Err(PipelineError::invalid_input("uploaded file is empty"));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");

        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_validate_asset_rejects_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();

        let missing = VideoAsset::from_path(dir.path().join("missing.mp4"));
        assert!(matches!(
            validate_asset(&missing).await,
            Err(PipelineError::InvalidInput(_))
        ));

        let empty_path = dir.path().join("empty.mp4");
        std::fs::write(&empty_path, b"").unwrap();
        assert!(matches!(
            validate_asset(&VideoAsset::from_path(&empty_path)).await,
            Err(PipelineError::InvalidInput(_))
        ));

        let ok_path = dir.path().join("ok.mp4");
        std::fs::write(&ok_path, b"data").unwrap();
        tokio_test::assert_ok!(validate_asset(&VideoAsset::from_path(&ok_path)).await);
    }
}
