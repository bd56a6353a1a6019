//! Content error types.

use derive_more::{Display, Error};
use rabt_core::PuzzleError;
use tracing::instrument;

use crate::llm_client::LlmError;

/// Puzzle content error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Content error: {} at {}:{}", message, file, line)]
pub struct ContentError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ContentError {
    /// Creates a new content error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<LlmError> for ContentError {
    #[track_caller]
    fn from(err: LlmError) -> Self {
        Self::new(format!("Generation failed: {}", err.message))
    }
}

impl From<PuzzleError> for ContentError {
    #[track_caller]
    fn from(err: PuzzleError) -> Self {
        Self::new(format!("Invalid puzzle: {}", err))
    }
}

impl From<serde_json::Error> for ContentError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Malformed level JSON: {}", err))
    }
}

impl From<std::io::Error> for ContentError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}
