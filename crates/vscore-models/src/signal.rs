//! Extraction signals and the per-run analysis context.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::niche::Niche;

/// Technical defect categories the forensic search looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    PoorLighting,
    CameraShake,
    OutOfFocus,
    AudioDistortion,
    BackgroundNoise,
}

impl DefectKind {
    pub const ALL: [DefectKind; 5] = [
        DefectKind::PoorLighting,
        DefectKind::CameraShake,
        DefectKind::OutOfFocus,
        DefectKind::AudioDistortion,
        DefectKind::BackgroundNoise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefectKind::PoorLighting => "poor_lighting",
            DefectKind::CameraShake => "camera_shake",
            DefectKind::OutOfFocus => "out_of_focus",
            DefectKind::AudioDistortion => "audio_distortion",
            DefectKind::BackgroundNoise => "background_noise",
        }
    }

    /// Semantic search query used to locate this defect.
    pub fn search_query(&self) -> &'static str {
        match self {
            DefectKind::PoorLighting => "poor lighting, dark underexposed footage",
            DefectKind::CameraShake => "shaky handheld camera, unstable footage",
            DefectKind::OutOfFocus => "blurry out of focus footage",
            DefectKind::AudioDistortion => "distorted clipping audio",
            DefectKind::BackgroundNoise => "loud background noise drowning out speech",
        }
    }

    /// Human-readable description used in prompts.
    pub fn description(&self) -> &'static str {
        match self {
            DefectKind::PoorLighting => "poor lighting",
            DefectKind::CameraShake => "camera shake",
            DefectKind::OutOfFocus => "out of focus",
            DefectKind::AudioDistortion => "audio distortion",
            DefectKind::BackgroundNoise => "background noise",
        }
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DefectKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_");
        DefectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key)
            .ok_or_else(|| ModelError::UnknownDefect(s.to_string()))
    }
}

/// Title, topics and hashtags summarised by the video intelligence service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl TopicSummary {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.topics.is_empty() && self.hashtags.is_empty()
    }
}

/// One discrete, machine-derived observation about a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionSignal {
    /// A technical defect located in a time range
    Defect {
        defect: DefectKind,
        start: f64,
        end: f64,
        confidence: f64,
    },
    /// Speech pacing derived from the transcript
    Pacing {
        words_per_minute: f64,
        dead_air_events: u32,
    },
    /// The video has no speech track
    NoSpeech,
    /// Audience niche, either supplied or classified
    Niche { niche: Niche },
    /// Topic/hashtag summary
    Topics { summary: TopicSummary },
}

impl ExtractionSignal {
    /// One-line description used when composing the scoring prompt.
    pub fn describe(&self) -> String {
        match self {
            ExtractionSignal::Defect {
                defect,
                start,
                end,
                confidence,
            } => format!(
                "Defect detected: {} between {:.1}s and {:.1}s (confidence {:.0})",
                defect.description(),
                start,
                end,
                confidence
            ),
            ExtractionSignal::Pacing {
                words_per_minute,
                dead_air_events,
            } => format!(
                "Pacing: {:.0} words per minute, {} dead-air gap(s) longer than 2.5s",
                words_per_minute, dead_air_events
            ),
            ExtractionSignal::NoSpeech => "Pacing: no speech track detected".to_string(),
            ExtractionSignal::Niche { niche } => format!("Niche: {}", niche),
            ExtractionSignal::Topics { summary } => {
                let mut line = String::from("Topics:");
                if !summary.topics.is_empty() {
                    line.push(' ');
                    line.push_str(&summary.topics.join(", "));
                } else {
                    line.push_str(" none");
                }
                line
            }
        }
    }
}

/// Unstructured perceptual analysis, one canonical string per axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisText {
    pub narrative: String,
    pub technical: String,
    pub visual: String,
}

impl AnalysisText {
    pub fn is_empty(&self) -> bool {
        self.narrative.is_empty() && self.technical.is_empty() && self.visual.is_empty()
    }
}

/// Read-only bundle of everything extracted for one run.
///
/// Built once per run after extraction and analysis, then borrowed by the
/// prompt composer and the hashtag backfill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub signals: Vec<ExtractionSignal>,
    pub analysis: AnalysisText,
}

impl AnalysisContext {
    pub fn new(signals: Vec<ExtractionSignal>, analysis: AnalysisText) -> Self {
        Self { signals, analysis }
    }

    pub fn defects(&self) -> impl Iterator<Item = &ExtractionSignal> {
        self.signals
            .iter()
            .filter(|s| matches!(s, ExtractionSignal::Defect { .. }))
    }

    /// Niche signal, falling back to `General` if none was produced.
    pub fn niche(&self) -> Niche {
        self.signals
            .iter()
            .find_map(|s| match s {
                ExtractionSignal::Niche { niche } => Some(niche.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn dead_air_events(&self) -> Option<u32> {
        self.signals.iter().find_map(|s| match s {
            ExtractionSignal::Pacing {
                dead_air_events, ..
            } => Some(*dead_air_events),
            _ => None,
        })
    }

    /// Hashtags then topics gathered during extraction, in that order.
    pub fn hashtag_candidates(&self) -> Vec<String> {
        self.signals
            .iter()
            .filter_map(|s| match s {
                ExtractionSignal::Topics { summary } => Some(summary),
                _ => None,
            })
            .flat_map(|summary| summary.hashtags.iter().chain(summary.topics.iter()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defect_kind_parse() {
        assert_eq!(
            "camera shake".parse::<DefectKind>().unwrap(),
            DefectKind::CameraShake
        );
        assert_eq!(
            "out-of-focus".parse::<DefectKind>().unwrap(),
            DefectKind::OutOfFocus
        );
        assert!("lens flare".parse::<DefectKind>().is_err());
    }

    #[test]
    fn test_signal_serialization_is_tagged() {
        let signal = ExtractionSignal::Pacing {
            words_per_minute: 150.0,
            dead_air_events: 2,
        };
        let json = serde_json::to_string(&signal).unwrap();
        assert!(json.contains("\"kind\":\"pacing\""));
        assert!(json.contains("\"dead_air_events\":2"));
    }

    #[test]
    fn test_context_accessors() {
        let ctx = AnalysisContext::new(
            vec![
                ExtractionSignal::Niche {
                    niche: Niche::Fitness,
                },
                ExtractionSignal::Pacing {
                    words_per_minute: 120.0,
                    dead_air_events: 1,
                },
                ExtractionSignal::Topics {
                    summary: TopicSummary {
                        title: None,
                        topics: vec!["workout".into()],
                        hashtags: vec!["#gym".into()],
                    },
                },
            ],
            AnalysisText::default(),
        );

        assert_eq!(ctx.niche(), Niche::Fitness);
        assert_eq!(ctx.dead_air_events(), Some(1));
        assert_eq!(ctx.hashtag_candidates(), vec!["#gym", "workout"]);
        assert_eq!(ctx.defects().count(), 0);
    }

    #[test]
    fn test_context_niche_defaults_to_general() {
        assert_eq!(AnalysisContext::default().niche(), Niche::General);
    }
}
