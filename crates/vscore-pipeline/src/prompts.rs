//! Prompt templates.
//!
//! Defaults are compiled in. A template file can override any subset of
//! them; each section starts with a `--- name ---` header line:
//!
//! ```text
//! --- scoring ---
//! You are scoring a {platform} video...
//! --- narrative ---
//! Describe the story...
//! ```

use std::path::Path;

use regex::Regex;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

const NICHE: &str = "Classify this video into exactly one niche. Answer with a single lowercase \
label from this list: {catalogue}. If none fits, answer other:<label> with a short label of \
your own. Answer with the label only.";

const NARRATIVE: &str = "Describe the narrative of this video: the opening hook, how the story \
or message develops, the call to action, and how well it holds attention from start to finish.";

const TECHNICAL: &str = "Assess the technical quality of this video: lighting, focus, camera \
stability, audio clarity, background noise, and editing rhythm. Be specific about timestamps.";

const VISUAL: &str = "Describe the visual presentation of this video: framing, composition, \
on-screen text, colour, subject presence, and visual variety.";

const CONSOLIDATED: &str = "Analyze this video in three sections, each starting with its \
heading on its own line.\nNARRATIVE: the opening hook, story development, call to action and \
retention.\nTECHNICAL: lighting, focus, stability, audio clarity, background noise, editing \
rhythm.\nVISUAL: framing, composition, on-screen text, colour and visual variety.";

const SCORING: &str = r#"Score a short video intended for {platform}.
Target audience: {audience}
Niche: {niche}
Niche guidance: {niche_rule}

Machine-detected signals:
{signals}

Narrative analysis:
{narrative}

Technical analysis:
{technical}

Visual analysis:
{visual}

Return ONLY a single JSON object matching this JSON schema, with every score an integer from 0 to 100:
{schema}

Mention pacing in the weaknesses when dead-air gaps were detected. Suggest 3 to 10 hashtags."#;

/// The prompt templates used by one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub niche: String,
    pub narrative: String,
    pub technical: String,
    pub visual: String,
    pub consolidated: String,
    pub scoring: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            niche: NICHE.to_string(),
            narrative: NARRATIVE.to_string(),
            technical: TECHNICAL.to_string(),
            visual: VISUAL.to_string(),
            consolidated: CONSOLIDATED.to_string(),
            scoring: SCORING.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Defaults, with sections from `path` applied on top.
    pub async fn load(path: Option<&Path>) -> PipelineResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::config(format!("cannot read prompt file {}: {}", path.display(), e))
        })?;
        let templates = Self::parse(&content)?;
        info!(path = %path.display(), "Loaded prompt templates");
        Ok(templates)
    }

    /// Parse a template file body.
    pub fn parse(content: &str) -> PipelineResult<Self> {
        let header = Regex::new(r"^---\s*([a-z_]+)\s*---\s*$")
            .map_err(|e| PipelineError::config(e.to_string()))?;

        let mut templates = Self::default();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in content.lines() {
            if let Some(caps) = header.captures(line.trim_end()) {
                if let Some((name, body)) = current.take() {
                    templates.set(&name, &body.join("\n"))?;
                }
                current = Some((caps[1].to_string(), Vec::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            } else if !line.trim().is_empty() {
                return Err(PipelineError::config(
                    "prompt file content must start with a section header",
                ));
            }
        }
        if let Some((name, body)) = current {
            templates.set(&name, &body.join("\n"))?;
        }

        Ok(templates)
    }

    fn set(&mut self, name: &str, body: &str) -> PipelineResult<()> {
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(PipelineError::config(format!("prompt section '{}' is empty", name)));
        }
        let slot = match name {
            "niche" => &mut self.niche,
            "narrative" => &mut self.narrative,
            "technical" => &mut self.technical,
            "visual" => &mut self.visual,
            "consolidated" => &mut self.consolidated,
            "scoring" => &mut self.scoring,
            other => {
                return Err(PipelineError::config(format!(
                    "unknown prompt section '{}'",
                    other
                )))
            }
        };
        *slot = body;
        Ok(())
    }
}
