//! Run identity and the inbound "analyze video" request.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::VideoAsset;
use crate::niche::Niche;

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request to analyze one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub run_id: RunId,
    pub asset: VideoAsset,
    /// Explicit niche; skips classification when set
    #[serde(default)]
    pub niche: Option<String>,
    /// Target platform (e.g. "tiktok")
    #[serde(default)]
    pub platform: Option<String>,
    /// Free-text audience description
    #[serde(default)]
    pub audience: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(asset: VideoAsset) -> Self {
        Self {
            run_id: RunId::new(),
            asset,
            niche: None,
            platform: None,
            audience: None,
        }
    }

    pub fn with_niche(mut self, niche: impl Into<String>) -> Self {
        self.niche = Some(niche.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Caller-supplied niche, if any non-blank value was given.
    pub fn explicit_niche(&self) -> Option<Niche> {
        self.niche
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(Niche::from_label)
    }

    pub fn platform_or_default(&self) -> &str {
        self.platform
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("short-form video")
    }
}
