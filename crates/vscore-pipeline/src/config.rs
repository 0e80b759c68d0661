//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryConfig;

/// How descriptive analysis is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Three parallel calls: narrative, technical, visual
    #[default]
    Split,
    /// One call whose response is split on section headings
    Consolidated,
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "split" | "parallel" => Ok(AnalysisMode::Split),
            "consolidated" | "single" => Ok(AnalysisMode::Consolidated),
            other => Err(format!("unknown analysis mode: {}", other)),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name of the shared logical index
    pub index_name: String,
    /// Defect matches must score strictly above this
    pub defect_threshold: f64,
    pub analysis_mode: AnalysisMode,
    /// Maximum status checks while waiting for indexing
    pub poll_max_attempts: u32,
    pub poll_interval: Duration,
    /// Single timeout around each fan-out stage
    pub extraction_timeout: Duration,
    /// Delete the indexed video after the run
    pub remote_cleanup: bool,
    pub scoring_temperature: f32,
    /// Where uploaded assets are staged
    pub work_dir: PathBuf,
    /// Optional prompt template overrides
    pub prompt_file: Option<PathBuf>,
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_name: "vscore-videos".to_string(),
            defect_threshold: 75.0,
            analysis_mode: AnalysisMode::Split,
            poll_max_attempts: 60,
            poll_interval: Duration::from_secs(2),
            extraction_timeout: Duration::from_secs(90),
            remote_cleanup: true,
            scoring_temperature: 0.4,
            work_dir: PathBuf::from("/tmp/vscore"),
            prompt_file: None,
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            index_name: std::env::var("VSCORE_INDEX_NAME").unwrap_or(defaults.index_name),
            defect_threshold: std::env::var("VSCORE_DEFECT_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.defect_threshold),
            analysis_mode: std::env::var("VSCORE_ANALYSIS_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.analysis_mode),
            poll_max_attempts: std::env::var("VSCORE_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_max_attempts),
            poll_interval: Duration::from_millis(
                std::env::var("VSCORE_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            extraction_timeout: Duration::from_secs(
                std::env::var("VSCORE_EXTRACTION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(90),
            ),
            remote_cleanup: std::env::var("VSCORE_REMOTE_CLEANUP")
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.remote_cleanup),
            scoring_temperature: std::env::var("VSCORE_SCORING_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scoring_temperature),
            work_dir: std::env::var("VSCORE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            prompt_file: std::env::var("VSCORE_PROMPT_FILE").ok().map(PathBuf::from),
            retry: RetryConfig::from_env(),
        }
    }
}
