//! Progress events streamed to the caller for one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::ScoreReport;

/// Event kinds. `Complete` and `Error` terminate a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Progress,
    Complete,
    Error,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Progress => "progress",
            ProgressKind::Complete => "complete",
            ProgressKind::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressKind::Complete | ProgressKind::Error)
    }
}

/// One progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    pub message: String,
    /// Completed fraction in [0, 1]
    pub fraction: f64,
    /// Final report, present only on `complete`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ScoreReport>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create a progress event.
    pub fn progress(message: impl Into<String>, fraction: f64) -> Self {
        Self {
            kind: ProgressKind::Progress,
            message: message.into(),
            fraction: clamp_fraction(fraction),
            report: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a completion event carrying the report.
    pub fn complete(report: ScoreReport) -> Self {
        let message = if report.degraded {
            "Analysis complete (degraded)"
        } else {
            "Analysis complete"
        };
        Self {
            kind: ProgressKind::Complete,
            message: message.to_string(),
            fraction: 1.0,
            report: Some(report),
            timestamp: Utc::now(),
        }
    }

    /// Create an error event. `fraction` is the last reached progress.
    pub fn error(message: impl Into<String>, fraction: f64) -> Self {
        Self {
            kind: ProgressKind::Error,
            message: message.into(),
            fraction: clamp_fraction(fraction),
            report: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction_is_clamped() {
        assert_eq!(ProgressEvent::progress("x", 1.7).fraction, 1.0);
        assert_eq!(ProgressEvent::progress("x", -0.2).fraction, 0.0);
        assert_eq!(ProgressEvent::progress("x", f64::NAN).fraction, 0.0);
    }

    #[test]
    fn test_complete_event_serialization() {
        let event = ProgressEvent::complete(ScoreReport::fallback());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"complete\""));
        assert!(json.contains("\"fraction\":1.0"));
        assert!(json.contains("\"report\""));
        assert!(event.is_terminal());
    }

    #[test]
    fn test_progress_event_omits_report() {
        let json = serde_json::to_string(&ProgressEvent::progress("Uploading", 0.05)).unwrap();
        assert!(json.contains("\"kind\":\"progress\""));
        assert!(!json.contains("report"));
    }
}
