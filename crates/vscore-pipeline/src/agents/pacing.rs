//! Speech pacing from the time-aligned transcript.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vscore_intel::{IntelError, Transcript, VideoIntelligence};
use vscore_models::ExtractionSignal;

use super::{ExtractionTarget, SignalAgent};
use crate::error::PipelineResult;
use crate::retry::{with_retry, RetryConfig};

/// Gaps between consecutive segments longer than this count as dead air.
pub const DEAD_AIR_GAP_SECS: f64 = 2.5;

pub struct PacingAgent {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
}

impl PacingAgent {
    pub fn new(intel: Arc<dyn VideoIntelligence>, retry: RetryConfig) -> Self {
        Self { intel, retry }
    }
}

/// Words per minute and dead-air count, or `NoSpeech` for an empty transcript.
pub fn analyze_pacing(transcript: &Transcript) -> ExtractionSignal {
    if transcript.is_empty() {
        return ExtractionSignal::NoSpeech;
    }

    let mut segments: Vec<_> = transcript
        .segments
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect();
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let words: usize = segments.iter().map(|s| s.text.split_whitespace().count()).sum();

    let last_end = segments.iter().map(|s| s.end).fold(0.0_f64, f64::max);
    let duration = transcript
        .duration_secs
        .filter(|d| *d > 0.0)
        .unwrap_or(last_end);

    let words_per_minute = if duration > 0.0 {
        words as f64 * 60.0 / duration
    } else {
        0.0
    };

    let dead_air_events = segments
        .windows(2)
        .filter(|pair| pair[1].start - pair[0].end > DEAD_AIR_GAP_SECS)
        .count() as u32;

    ExtractionSignal::Pacing {
        words_per_minute,
        dead_air_events,
    }
}

#[async_trait]
impl SignalAgent for PacingAgent {
    fn name(&self) -> &'static str {
        "pacing"
    }

    async fn extract(&self, target: &ExtractionTarget) -> PipelineResult<Vec<ExtractionSignal>> {
        let result = with_retry(&self.retry, "get_transcript", || {
            self.intel.get_transcript(&target.index_id, &target.video_id)
        })
        .await;

        let transcript = match result {
            Ok(transcript) => transcript,
            Err(IntelError::NotFound(_)) => {
                debug!(video_id = %target.video_id, "No transcript available");
                Transcript::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(vec![analyze_pacing(&transcript)])
    }
}
