use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::InvocationId;

/// An accepted fetcher failure, kept on the snapshot next to the last good state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invocation {invocation} failed: {message}")]
pub struct FetchFailure {
    pub invocation: InvocationId,
    pub message: String,
}

impl FetchFailure {
    pub fn new(invocation: InvocationId, message: impl Into<String>) -> Self {
        Self {
            invocation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller `{name}` must be created inside a tokio runtime or given a runtime handle")]
    NoRuntime { name: String },
    #[error("invalid controller settings: {0}")]
    InvalidSettings(String),
}
