//! Forensic defect search.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use vscore_intel::{SearchMatch, SearchScope, VideoIntelligence};
use vscore_models::{DefectKind, ExtractionSignal};

use super::{ExtractionTarget, SignalAgent};
use crate::error::PipelineResult;
use crate::retry::{with_retry, RetryConfig};

/// Searches the video for each catalogued defect.
pub struct DefectSearchAgent {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
    threshold: f64,
}

impl DefectSearchAgent {
    pub fn new(intel: Arc<dyn VideoIntelligence>, retry: RetryConfig, threshold: f64) -> Self {
        Self {
            intel,
            retry,
            threshold,
        }
    }

    async fn search(&self, kind: DefectKind, target: &ExtractionTarget) -> Option<ExtractionSignal> {
        let scope = SearchScope::video(target.video_id.clone());
        let result = with_retry(&self.retry, "semantic_search", || {
            self.intel
                .semantic_search(&target.index_id, kind.search_query(), &scope)
        })
        .await;

        match result {
            Ok(matches) => {
                let signal = select_defect(kind, &matches, self.threshold);
                debug!(
                    defect = kind.as_str(),
                    matches = matches.len(),
                    detected = signal.is_some(),
                    "Defect search finished"
                );
                signal
            }
            Err(e) => {
                warn!(defect = kind.as_str(), "Defect search failed: {}", e);
                None
            }
        }
    }
}

/// Signal for the best match, if it scores strictly above `threshold`.
pub fn select_defect(
    kind: DefectKind,
    matches: &[SearchMatch],
    threshold: f64,
) -> Option<ExtractionSignal> {
    let top = matches
        .iter()
        .filter(|m| !m.score.is_nan())
        .max_by(|a, b| a.score.total_cmp(&b.score))?;

    (top.score > threshold).then(|| ExtractionSignal::Defect {
        defect: kind,
        start: top.start,
        end: top.end,
        confidence: top.score,
    })
}

#[async_trait]
impl SignalAgent for DefectSearchAgent {
    fn name(&self) -> &'static str {
        "defect_search"
    }

    async fn extract(&self, target: &ExtractionTarget) -> PipelineResult<Vec<ExtractionSignal>> {
        let searches = DefectKind::ALL
            .iter()
            .map(|kind| self.search(*kind, target));
        Ok(join_all(searches).await.into_iter().flatten().collect())
    }
}
