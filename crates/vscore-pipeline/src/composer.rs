//! Scoring prompt composition.

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use schemars::schema_for;

use vscore_models::{AnalysisContext, AnalyzeRequest, Niche, ScoreReport};

use crate::prompts::PromptTemplates;

/// Niche-specific scoring tolerance, keyed by a niche substring.
const NICHE_RULES: &[(&str, &str)] = &[
    (
        "fitness",
        "Handheld or moving camera during exercise is expected; judge form visibility and energy, not stillness.",
    ),
    (
        "gaming",
        "Screen recordings with a face-cam overlay are normal; weigh commentary energy and on-screen clarity.",
    ),
    (
        "beauty",
        "Close-ups and accurate lighting on the subject matter most; colour accuracy outweighs scene variety.",
    ),
    (
        "food",
        "Close-up texture and process shots matter most; kitchen ambient noise is acceptable.",
    ),
    (
        "travel",
        "Natural ambient audio and variable outdoor lighting are acceptable; reward a sense of place.",
    ),
    (
        "education",
        "Clarity of explanation outweighs production polish; slower pacing is acceptable if content is dense.",
    ),
    (
        "tech",
        "Legible screens and product close-ups matter most; a static talking-head setup is acceptable.",
    ),
    (
        "comedy",
        "Timing and delivery dominate; low production values are acceptable if the punchline lands.",
    ),
    (
        "music",
        "Audio quality is critical; penalize distortion and noise heavily, and tolerate dim stage lighting.",
    ),
    (
        "fashion",
        "Full-outfit framing and accurate colour matter most; reward clear transitions between looks.",
    ),
    (
        "finance",
        "Credibility and clarity outweigh visual flair; on-screen figures must be legible.",
    ),
    (
        "lifestyle",
        "Authenticity is valued over polish; casual handheld footage is acceptable.",
    ),
];

const GENERIC_RULE: &str =
    "Apply general short-form standards: a strong hook in the first seconds, clear audio, steady framing and tight pacing.";

const DEFAULT_AUDIENCE: &str = "a general short-form audience";

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").ok());

/// Tolerance rule for a niche, falling back to the generic rule.
pub fn niche_rule(niche: &Niche) -> &'static str {
    let label = niche.label().to_lowercase();
    NICHE_RULES
        .iter()
        .find(|(key, _)| label.contains(key))
        .map(|(_, rule)| *rule)
        .unwrap_or(GENERIC_RULE)
}

/// JSON schema of the expected report, embedded in the scoring prompt.
pub fn report_schema() -> String {
    serde_json::to_string_pretty(&schema_for!(ScoreReport)).unwrap_or_default()
}

/// Builds the scoring prompt from the request and the extracted context.
pub struct PromptComposer {
    templates: Arc<PromptTemplates>,
    schema: String,
}

impl PromptComposer {
    pub fn new(templates: Arc<PromptTemplates>) -> Self {
        Self {
            templates,
            schema: report_schema(),
        }
    }

    pub fn compose(&self, request: &AnalyzeRequest, context: &AnalysisContext) -> String {
        let niche = context.niche();

        let signals = if context.signals.is_empty() {
            "- none".to_string()
        } else {
            context
                .signals
                .iter()
                .map(|s| format!("- {}", s.describe()))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let audience = request
            .audience
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUDIENCE);

        let section = |text: &str| {
            if text.trim().is_empty() {
                "(not available)".to_string()
            } else {
                text.to_string()
            }
        };

        let narrative = section(&context.analysis.narrative);
        let technical = section(&context.analysis.technical);
        let visual = section(&context.analysis.visual);

        // Single pass, so substituted text is never scanned for placeholders.
        let template = &self.templates.scoring;
        let Some(placeholder) = PLACEHOLDER.as_ref() else {
            return template.clone();
        };
        placeholder
            .replace_all(template, |caps: &Captures| -> String {
                let value: &str = match &caps[1] {
                    "platform" => request.platform_or_default(),
                    "audience" => audience,
                    "niche" => niche.label(),
                    "niche_rule" => niche_rule(&niche),
                    "signals" => &signals,
                    "narrative" => &narrative,
                    "technical" => &technical,
                    "visual" => &visual,
                    "schema" => &self.schema,
                    _ => &caps[0],
                };
                value.to_string()
            })
            .into_owned()
    }
}
