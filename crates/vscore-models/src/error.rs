//! Model parsing errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown task status: {0}")]
    UnknownStatus(String),

    #[error("Unknown defect kind: {0}")]
    UnknownDefect(String),
}
