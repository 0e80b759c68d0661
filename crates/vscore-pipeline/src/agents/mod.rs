//! Signal extraction agents.
//!
//! Each agent asks the video intelligence service one kind of question
//! about an indexed video and turns the answer into [`ExtractionSignal`]s.
//! Agents are independent and run concurrently; one agent failing costs
//! only its own signals.

mod defects;
mod niche;
mod pacing;
mod topics;

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use vscore_models::{ExtractionSignal, IndexId, Niche, VideoIdentifier};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics::record_signal;

pub use defects::{select_defect, DefectSearchAgent};
pub use niche::{niche_instruction, NicheAgent};
pub use pacing::{analyze_pacing, PacingAgent, DEAD_AIR_GAP_SECS};
pub use topics::TopicAgent;

/// The video being examined.
#[derive(Debug, Clone)]
pub struct ExtractionTarget {
    pub index_id: IndexId,
    pub video_id: VideoIdentifier,
    /// Niche supplied by the caller, if any
    pub explicit_niche: Option<Niche>,
}

#[async_trait]
pub trait SignalAgent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, target: &ExtractionTarget) -> PipelineResult<Vec<ExtractionSignal>>;
}

/// Run every agent concurrently under one timeout.
///
/// Agent errors are logged and dropped; only the stage timeout fails the run.
pub async fn run_agents(
    agents: &[Box<dyn SignalAgent>],
    target: &ExtractionTarget,
    timeout: Duration,
) -> PipelineResult<Vec<ExtractionSignal>> {
    let fan_out = join_all(agents.iter().map(|agent| async move {
        (agent.name(), agent.extract(target).await)
    }));

    let results = tokio::time::timeout(timeout, fan_out)
        .await
        .map_err(|_| PipelineError::StageTimeout {
            stage: "extraction",
            seconds: timeout.as_secs(),
        })?;

    let mut signals = Vec::new();
    for (name, result) in results {
        match result {
            Ok(found) => {
                debug!(agent = name, count = found.len(), "Agent finished");
                signals.extend(found);
            }
            Err(e) => warn!(agent = name, "Agent failed, continuing without its signals: {}", e),
        }
    }

    for signal in &signals {
        record_signal(signal_kind(signal));
    }
    Ok(signals)
}

fn signal_kind(signal: &ExtractionSignal) -> &'static str {
    match signal {
        ExtractionSignal::Defect { .. } => "defect",
        ExtractionSignal::Pacing { .. } => "pacing",
        ExtractionSignal::NoSpeech => "no_speech",
        ExtractionSignal::Niche { .. } => "niche",
        ExtractionSignal::Topics { .. } => "topics",
    }
}
