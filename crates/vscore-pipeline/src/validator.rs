//! Scoring call and report validation.
//!
//! The scoring response is parsed and validated against [`ScoreReport`].
//! Anything unusable, including a call that exhausts its retries, is
//! replaced by [`ScoreReport::fallback`] and the run completes degraded.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use vscore_genai::{strip_code_fences, GenerativeModel, ResponseFormat};
use vscore_models::ScoreReport;

use crate::metrics::record_degraded;
use crate::retry::{with_retry, RetryConfig};

/// Backfill runs when the report carries fewer hashtags than this.
pub const MIN_HASHTAGS: usize = 3;

/// Upper bound on hashtags after backfill.
pub const MAX_HASHTAGS: usize = 10;

/// Parse and validate a raw scoring response.
pub fn parse_report(raw: &str) -> Result<ScoreReport, String> {
    let body = strip_code_fences(raw);
    let mut report: ScoreReport =
        serde_json::from_str(body).map_err(|e| format!("unparseable report: {}", e))?;
    report
        .validate()
        .map_err(|e| format!("report out of bounds: {}", e))?;
    report.degraded = false;
    Ok(report)
}

/// Normalize a hashtag or topic into `#tag` form. Empty input yields `None`.
pub fn normalize_hashtag(raw: &str) -> Option<String> {
    let tag: String = raw
        .trim()
        .trim_start_matches('#')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    (!tag.is_empty()).then(|| format!("#{}", tag))
}

/// Normalize, deduplicate and cap `hashtags` at ten.
///
/// When fewer than three distinct tags remain, the list is topped up from
/// `candidates`. Duplicates are detected case-insensitively.
pub fn backfill_hashtags(hashtags: &mut Vec<String>, candidates: &[String]) {
    let mut seen = HashSet::new();
    let mut merged: Vec<String> = hashtags
        .iter()
        .filter_map(|raw| normalize_hashtag(raw))
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect();

    if merged.len() < MIN_HASHTAGS {
        merged.extend(
            candidates
                .iter()
                .filter_map(|raw| normalize_hashtag(raw))
                .filter(|tag| seen.insert(tag.to_lowercase())),
        );
    }

    merged.truncate(MAX_HASHTAGS);
    *hashtags = merged;
}

/// Calls the scoring model and turns its answer into a report.
pub struct ScoringValidator {
    model: Arc<dyn GenerativeModel>,
    retry: RetryConfig,
    temperature: f32,
}

impl ScoringValidator {
    pub fn new(model: Arc<dyn GenerativeModel>, retry: RetryConfig, temperature: f32) -> Self {
        Self {
            model,
            retry,
            temperature,
        }
    }

    /// Score with `prompt`. Never fails; unusable output degrades the report.
    pub async fn score(&self, prompt: &str, hashtag_candidates: &[String]) -> ScoreReport {
        let response = with_retry(&self.retry, "generate_score", || {
            self.model
                .generate(prompt, self.temperature, ResponseFormat::Json)
        })
        .await;

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Scoring call failed, using default report: {}", e);
                record_degraded("scoring_failed");
                return ScoreReport::fallback();
            }
        };

        let mut report = match parse_report(&raw) {
            Ok(report) => report,
            Err(reason) => {
                warn!(response_chars = raw.len(), "Scoring response rejected, using default report: {}", reason);
                record_degraded("invalid_response");
                return ScoreReport::fallback();
            }
        };

        let before = report.metadata.hashtags.len();
        backfill_hashtags(&mut report.metadata.hashtags, hashtag_candidates);
        if report.metadata.hashtags.len() != before {
            info!(
                before,
                after = report.metadata.hashtags.len(),
                "Backfilled hashtags from extraction"
            );
        }

        report
    }
}
