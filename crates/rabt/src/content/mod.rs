//! Puzzle content providers.

mod directory;
mod error;
mod generated;
mod llm;
mod prompt;

pub use directory::{DirectoryPuzzleProvider, level_path};
pub use error::ContentError;
pub use generated::{GeneratedCategory, GeneratedLevel};
pub use llm::LlmPuzzleProvider;
pub use prompt::{level_prompt, level_schema, system_prompt};

use std::fmt::Debug;

use async_trait::async_trait;
use rabt_core::{LevelId, Puzzle};

/// Source of validated puzzles.
///
/// Implementations must return a puzzle for exactly the requested level;
/// anything else is reported as an error by the state machine.
#[async_trait]
pub trait PuzzleProvider: Send + Sync + Debug {
    /// Produces a puzzle for `level`.
    async fn fetch(&self, level: LevelId) -> Result<Puzzle, ContentError>;
}
