//! Error types for puzzle construction.

use crate::types::{CategoryId, WordId};

/// A level index outside the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("Level index {} is outside {}..={}", index, crate::MIN_LEVEL_INDEX, crate::MAX_LEVEL_INDEX)]
pub struct LevelError {
    /// The rejected index.
    pub index: u8,
}

impl std::error::Error for LevelError {}

/// A puzzle payload that breaks the content contract.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PuzzleError {
    /// The level identifier itself is invalid.
    #[display("{}", _0)]
    Level(LevelError),

    /// The number of categories does not match the level.
    #[display("Expected {} categories, got {}", expected, actual)]
    CategoryCount {
        /// Categories required by the level.
        expected: usize,
        /// Categories in the payload.
        actual: usize,
    },

    /// Two categories share an id.
    #[display("Duplicate category id '{}'", _0)]
    DuplicateCategory(CategoryId),

    /// Two words share an id.
    #[display("Duplicate word id '{}'", _0)]
    DuplicateWord(WordId),

    /// A word points at a category that is not in the puzzle.
    #[display("Word '{}' references unknown category '{}'", word, category)]
    UnknownCategory {
        /// The offending word.
        word: WordId,
        /// The category it references.
        category: CategoryId,
    },

    /// A category does not have exactly four words.
    #[display("Category '{}' has {} words, expected {}", category, size, crate::GROUP_SIZE)]
    GroupSize {
        /// The offending category.
        category: CategoryId,
        /// How many words reference it.
        size: usize,
    },

    /// A freshly generated puzzle arrived with a solved word.
    #[display("Word '{}' arrived already solved", _0)]
    AlreadySolved(WordId),
}

impl std::error::Error for PuzzleError {}

impl From<LevelError> for PuzzleError {
    fn from(err: LevelError) -> Self {
        Self::Level(err)
    }
}
