//! Descriptive analysis of the indexed video.
//!
//! Produces narrative, technical and visual text either from three
//! parallel requests or from one consolidated request whose response is
//! split on section headings. Every section is sanitized before use.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use vscore_intel::VideoIntelligence;
use vscore_models::{AnalysisText, VideoIdentifier};

use crate::config::AnalysisMode;
use crate::prompts::PromptTemplates;
use crate::retry::{with_retry, RetryConfig};

/// Lines that echo instructions or audience boilerplate back at us.
static ECHO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^\s*(target\s+)?audience\s*:",
        r"(?i)^\s*platform\s*:",
        r"(?i)^\s*instructions?\s*:",
        r"(?i)^\s*you\s+are\s+(an?|the)\b",
        r"(?i)^\s*(sure|certainly|of course)[,!.]",
        r"(?i)^\s*here\s+is\s+(the|my|an?)\s+(analysis|breakdown|description)\b",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static SECTION_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#+\s*)?\**\s*(narrative|technical|visual)\s*\**\s*(?::\s*\**\s*(.*))?$").ok()
});

/// Drop echoed instruction lines and trim the result.
pub fn sanitize(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !ECHO_PATTERNS.iter().any(|re| re.is_match(line)))
        .collect();
    kept.join("\n").trim().to_string()
}

/// Split a consolidated response on its section headings.
///
/// Text before the first heading, or all text when no heading is found,
/// is treated as narrative.
pub fn split_sections(text: &str) -> AnalysisText {
    let mut narrative = Vec::new();
    let mut technical = Vec::new();
    let mut visual = Vec::new();
    let mut current = &mut narrative;

    for line in text.lines() {
        let heading = SECTION_HEADING.as_ref().and_then(|re| re.captures(line));
        match heading {
            Some(caps) => {
                current = match caps[1].to_lowercase().as_str() {
                    "technical" => &mut technical,
                    "visual" => &mut visual,
                    _ => &mut narrative,
                };
                let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                if !rest.is_empty() {
                    current.push(rest.to_string());
                }
            }
            None => current.push(line.to_string()),
        }
    }

    AnalysisText {
        narrative: sanitize(&narrative.join("\n")),
        technical: sanitize(&technical.join("\n")),
        visual: sanitize(&visual.join("\n")),
    }
}

pub struct Analyzer {
    intel: Arc<dyn VideoIntelligence>,
    retry: RetryConfig,
    mode: AnalysisMode,
    templates: Arc<PromptTemplates>,
}

impl Analyzer {
    pub fn new(
        intel: Arc<dyn VideoIntelligence>,
        retry: RetryConfig,
        mode: AnalysisMode,
        templates: Arc<PromptTemplates>,
    ) -> Self {
        Self {
            intel,
            retry,
            mode,
            templates,
        }
    }

    /// Analyze the video. Sections whose request fails are left empty.
    pub async fn analyze(&self, video_id: &VideoIdentifier) -> AnalysisText {
        let analysis = match self.mode {
            AnalysisMode::Split => {
                let (narrative, technical, visual) = tokio::join!(
                    self.describe(video_id, "narrative", &self.templates.narrative),
                    self.describe(video_id, "technical", &self.templates.technical),
                    self.describe(video_id, "visual", &self.templates.visual),
                );
                AnalysisText {
                    narrative: sanitize(&narrative),
                    technical: sanitize(&technical),
                    visual: sanitize(&visual),
                }
            }
            AnalysisMode::Consolidated => {
                let text = self
                    .describe(video_id, "consolidated", &self.templates.consolidated)
                    .await;
                split_sections(&text)
            }
        };

        debug!(
            narrative = analysis.narrative.len(),
            technical = analysis.technical.len(),
            visual = analysis.visual.len(),
            "Analysis finished"
        );
        analysis
    }

    async fn describe(&self, video_id: &VideoIdentifier, section: &str, instruction: &str) -> String {
        let result = with_retry(&self.retry, "describe_video", || {
            self.intel.describe_video(video_id, instruction)
        })
        .await;

        result.unwrap_or_else(|e| {
            warn!(section, "Descriptive analysis failed: {}", e);
            String::new()
        })
    }
}
