//! Video scoring orchestration pipeline.
//!
//! A run takes one uploaded video through indexing, concurrent signal
//! extraction, descriptive analysis and generative scoring, and yields a
//! validated [`vscore_models::ScoreReport`]. Progress is reported over a
//! per-run channel, and the local and remote copies of the video are
//! released on every exit path.

pub mod agents;
pub mod analyzer;
pub mod composer;
pub mod config;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod reaper;
pub mod retry;
pub mod staging;
pub mod validator;

pub use analyzer::Analyzer;
pub use composer::PromptComposer;
pub use config::{AnalysisMode, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use indexing::{IndexRegistry, IndexingManager, PollConfig, PollState};
pub use logging::RunLogger;
pub use pipeline::Pipeline;
pub use progress::{channel, noop_sender, ProgressReceiver, ProgressSender};
pub use prompts::PromptTemplates;
pub use reaper::ResourceReaper;
pub use retry::{with_retry, ErrorClass, RetryClassify, RetryConfig};
pub use staging::stage_upload;
pub use validator::ScoringValidator;
