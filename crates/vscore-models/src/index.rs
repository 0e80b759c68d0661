//! Logical index, indexing task and video identifier models.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a logical index at the video intelligence service.
    IndexId
);
string_id!(
    /// Identifier of one asynchronous indexing job.
    TaskId
);
string_id!(
    /// Opaque handle of an ingested video, valid until the video is deleted.
    VideoIdentifier
);

/// A named, durable collection at the video intelligence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LogicalIndex {
    pub id: IndexId,
    pub name: String,
}

impl LogicalIndex {
    pub fn new(id: impl Into<IndexId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Indexing job status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted but not yet started
    #[default]
    Queued,
    /// Upload validated, indexing in progress
    Processing,
    /// Video is queryable
    Ready,
    /// Indexing failed on the service side
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Ready => "ready",
            TaskStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    /// Map every status spelling the service is known to use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" | "validating" => Ok(TaskStatus::Queued),
            "processing" | "indexing" | "uploading" => Ok(TaskStatus::Processing),
            "ready" => Ok(TaskStatus::Ready),
            "failed" | "error" => Ok(TaskStatus::Failed),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// One asynchronous ingestion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingTask {
    pub id: TaskId,
    pub index_id: IndexId,
    /// Video id, when the service assigns one at creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoIdentifier>,
}

impl IndexingTask {
    pub fn new(id: impl Into<TaskId>, index_id: IndexId) -> Self {
        Self {
            id: id.into(),
            index_id,
            video_id: None,
        }
    }
}
