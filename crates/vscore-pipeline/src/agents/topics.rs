//! Topic and hashtag extraction.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use vscore_intel::VideoIntelligence;
use vscore_models::ExtractionSignal;

use super::{ExtractionTarget, SignalAgent};
use crate::error::PipelineResult;
use crate::retry::{with_retry, RetryConfig};

/// Fetches title, topics and hashtags. Failure yields no topics.
pub struct TopicAgent {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
}

impl TopicAgent {
    pub fn new(intel: Arc<dyn VideoIntelligence>, retry: RetryConfig) -> Self {
        Self { intel, retry }
    }
}

#[async_trait]
impl SignalAgent for TopicAgent {
    fn name(&self) -> &'static str {
        "topics"
    }

    async fn extract(&self, target: &ExtractionTarget) -> PipelineResult<Vec<ExtractionSignal>> {
        match with_retry(&self.retry, "gist", || self.intel.gist(&target.video_id)).await {
            Ok(summary) if !summary.is_empty() => Ok(vec![ExtractionSignal::Topics { summary }]),
            Ok(_) => Ok(Vec::new()),
            Err(e) => {
                warn!("Topic extraction failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}
