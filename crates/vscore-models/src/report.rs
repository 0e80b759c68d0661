//! Score report returned to callers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Score applied to every sub-score of the fallback report.
pub const DEFAULT_SCORE: i64 = 50;

/// Weakness entry carried by the fallback report.
pub const FALLBACK_MARKER: &str =
    "Automated scoring response could not be validated; default scores were applied.";

/// Numeric sub-scores, each within [0, 100].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, JsonSchema)]
pub struct Scores {
    #[validate(range(min = 0, max = 100))]
    pub overall: i64,
    #[validate(range(min = 0, max = 100))]
    pub hook: i64,
    #[validate(range(min = 0, max = 100))]
    pub pacing: i64,
    #[validate(range(min = 0, max = 100))]
    pub visual_quality: i64,
    #[validate(range(min = 0, max = 100))]
    pub audio_quality: i64,
    #[validate(range(min = 0, max = 100))]
    pub engagement: i64,
    #[validate(range(min = 0, max = 100))]
    pub niche_fit: i64,
}

impl Scores {
    /// Every sub-score set to the same value.
    pub fn uniform(value: i64) -> Self {
        Self {
            overall: value,
            hook: value,
            pacing: value,
            visual_quality: value,
            audio_quality: value,
            engagement: value,
            niche_fit: value,
        }
    }
}

/// Qualitative feedback arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Publishing metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportMetadata {
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// The validated verdict for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, JsonSchema)]
pub struct ScoreReport {
    #[validate(nested)]
    pub scores: Scores,
    pub feedback: Feedback,
    pub metadata: ReportMetadata,
    /// True when the fallback report was substituted
    #[serde(default)]
    pub degraded: bool,
}

impl ScoreReport {
    /// Deterministic report used when the scoring response is unusable.
    pub fn fallback() -> Self {
        Self {
            scores: Scores::uniform(DEFAULT_SCORE),
            feedback: Feedback {
                strengths: Vec::new(),
                weaknesses: vec![FALLBACK_MARKER.to_string()],
                suggestions: Vec::new(),
            },
            metadata: ReportMetadata::default(),
            degraded: true,
        }
    }

    pub fn overall(&self) -> i64 {
        self.scores.overall
    }
}
