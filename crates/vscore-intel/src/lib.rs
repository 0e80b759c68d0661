//! Client for the video intelligence service.
//!
//! Covers the calls the scoring pipeline makes: index lookup and creation,
//! indexing task upload and polling, semantic search, transcripts,
//! descriptive analysis, topic summaries and video deletion.

pub mod client;
pub mod error;
pub mod metrics;
pub mod service;
pub mod types;

pub use client::{IntelClient, IntelConfig};
pub use error::{IntelError, IntelResult};
pub use service::VideoIntelligence;
pub use types::{
    IndexCapabilities, ModelSpec, SearchMatch, SearchScope, TaskSnapshot, Transcript,
    TranscriptSegment,
};
