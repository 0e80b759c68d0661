//! Shared data models for the vscore pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Video assets and run requests
//! - Logical indexes, indexing tasks and video identifiers
//! - Extraction signals and the per-run analysis context
//! - The validated score report
//! - Progress events streamed to callers

pub mod asset;
pub mod error;
pub mod index;
pub mod niche;
pub mod progress;
pub mod report;
pub mod run;
pub mod signal;

// Re-export common types
pub use asset::VideoAsset;
pub use error::{ModelError, ModelResult};
pub use index::{IndexId, IndexingTask, LogicalIndex, TaskId, TaskStatus, VideoIdentifier};
pub use niche::Niche;
pub use progress::{clamp_fraction, ProgressEvent, ProgressKind};
pub use report::{Feedback, ReportMetadata, ScoreReport, Scores, DEFAULT_SCORE, FALLBACK_MARKER};
pub use run::{AnalyzeRequest, RunId};
pub use signal::{AnalysisContext, AnalysisText, DefectKind, ExtractionSignal, TopicSummary};
