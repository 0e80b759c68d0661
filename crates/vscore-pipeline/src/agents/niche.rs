//! Niche classification.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use vscore_intel::VideoIntelligence;
use vscore_models::{ExtractionSignal, Niche};

use super::{ExtractionTarget, SignalAgent};
use crate::error::PipelineResult;
use crate::retry::{with_retry, RetryConfig};

/// Classifies the video into one catalogue niche.
///
/// A caller-supplied niche short-circuits the remote call. Service failures
/// fall back to the generic niche instead of failing.
pub struct NicheAgent {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
    instruction: String,
}

impl NicheAgent {
    pub fn new(intel: Arc<dyn VideoIntelligence>, retry: RetryConfig, template: &str) -> Self {
        Self {
            intel,
            retry,
            instruction: niche_instruction(template),
        }
    }
}

/// Fill the `{catalogue}` placeholder with the closed niche list.
pub fn niche_instruction(template: &str) -> String {
    template.replace("{catalogue}", &Niche::CATALOGUE.join(", "))
}

#[async_trait]
impl SignalAgent for NicheAgent {
    fn name(&self) -> &'static str {
        "niche"
    }

    async fn extract(&self, target: &ExtractionTarget) -> PipelineResult<Vec<ExtractionSignal>> {
        if let Some(niche) = &target.explicit_niche {
            return Ok(vec![ExtractionSignal::Niche {
                niche: niche.clone(),
            }]);
        }

        let result = with_retry(&self.retry, "classify_niche", || {
            self.intel.describe_video(&target.video_id, &self.instruction)
        })
        .await;

        let niche = match result {
            Ok(text) => {
                let niche = Niche::from_classifier_output(&text);
                info!(niche = %niche, "Classified niche");
                niche
            }
            Err(e) => {
                warn!("Niche classification failed, using generic niche: {}", e);
                Niche::General
            }
        };

        Ok(vec![ExtractionSignal::Niche { niche }])
    }
}
