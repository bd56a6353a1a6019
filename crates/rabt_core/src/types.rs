//! Core domain types for the puzzle.

use std::collections::{HashMap, HashSet};

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};
use tracing::instrument;

use crate::error::{LevelError, PuzzleError};

/// Number of words in every category.
pub const GROUP_SIZE: usize = 4;

/// Lowest level index within a tier.
pub const MIN_LEVEL_INDEX: u8 = 1;

/// Highest level index within a tier.
pub const MAX_LEVEL_INDEX: u8 = 3;

/// Difficulty tier, totally ordered from easiest to hardest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tier {
    /// Concrete everyday vocabulary.
    Beginner,
    /// Abstract nouns, verbs and synonyms.
    Intermediate,
    /// Literary roots and rare vocabulary.
    Expert,
}

impl Tier {
    /// Returns the following tier, or `None` after [`Tier::Expert`].
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Beginner => Some(Self::Intermediate),
            Self::Intermediate => Some(Self::Expert),
            Self::Expert => None,
        }
    }

    /// Whether word cards show their category icon before being solved.
    pub fn reveals_categories(self) -> bool {
        matches!(self, Self::Beginner)
    }
}

/// A single level: a tier plus an index in `1..=3`.
///
/// Ordered by tier first, then index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(try_from = "LevelIdRepr", into = "LevelIdRepr")]
#[display("{}-{}", tier, index)]
pub struct LevelId {
    tier: Tier,
    index: u8,
}

impl LevelId {
    /// Creates a level id, rejecting indices outside `1..=3`.
    #[instrument]
    pub fn new(tier: Tier, index: u8) -> Result<Self, LevelError> {
        if !(MIN_LEVEL_INDEX..=MAX_LEVEL_INDEX).contains(&index) {
            return Err(LevelError { index });
        }
        Ok(Self { tier, index })
    }

    /// The first level of the campaign.
    pub fn first() -> Self {
        Self {
            tier: Tier::Beginner,
            index: MIN_LEVEL_INDEX,
        }
    }

    /// The tier of this level.
    pub fn tier(self) -> Tier {
        self.tier
    }

    /// The index of this level within its tier.
    pub fn index(self) -> u8 {
        self.index
    }

    /// Number of categories a puzzle for this level carries.
    pub fn category_count(self) -> usize {
        usize::from(self.index) + 3
    }

    /// Number of words a puzzle for this level carries.
    pub fn word_count(self) -> usize {
        self.category_count() * GROUP_SIZE
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelIdRepr {
    tier: Tier,
    level_index: u8,
}

impl TryFrom<LevelIdRepr> for LevelId {
    type Error = LevelError;

    fn try_from(repr: LevelIdRepr) -> Result<Self, Self::Error> {
        Self::new(repr.tier, repr.level_index)
    }
}

impl From<LevelId> for LevelIdRepr {
    fn from(level: LevelId) -> Self {
        Self {
            tier: level.tier,
            level_index: level.index,
        }
    }
}

/// Identifier of a category, unique within a puzzle.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Creates a category id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a word, unique within a puzzle.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct WordId(String);

impl WordId {
    /// Creates a word id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A themed group of four words. Immutable once a level is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Category {
    /// Category id.
    id: CategoryId,
    /// Display title.
    title: String,
    /// Emoji glyph.
    icon: String,
    /// Hex color, e.g. `#FF5733`.
    color: String,
    /// What links the four words.
    description: String,
}

/// A word card on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// Word id.
    id: WordId,
    /// Display text.
    text: String,
    /// The category this word belongs to.
    category_id: CategoryId,
    #[getter(skip)]
    #[serde(default, alias = "isSolved")]
    solved: bool,
}

impl Word {
    /// Creates an unsolved word.
    pub fn new(id: WordId, text: impl Into<String>, category_id: CategoryId) -> Self {
        Self {
            id,
            text: text.into(),
            category_id,
            solved: false,
        }
    }

    /// Whether this word has been grouped correctly.
    pub fn is_solved(&self) -> bool {
        self.solved
    }
}

/// A validated puzzle: the categories of one level and their shuffled words.
///
/// Construction checks the content contract, so every value of this type
/// has `level.category_count()` categories of exactly four words each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PuzzleRepr", into = "PuzzleRepr")]
pub struct Puzzle {
    level: LevelId,
    categories: Vec<Category>,
    words: Vec<Word>,
}

impl Puzzle {
    /// Builds a fresh puzzle, validating the content contract.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError`] if the category count does not match the
    /// level, ids are duplicated, a word references an unknown category,
    /// a category does not have exactly four words, or a word is already
    /// solved.
    #[instrument(skip(level, categories, words), fields(level = %level, categories = categories.len(), words = words.len()))]
    pub fn new(
        level: LevelId,
        categories: Vec<Category>,
        words: Vec<Word>,
    ) -> Result<Self, PuzzleError> {
        if let Some(word) = words.iter().find(|w| w.solved) {
            return Err(PuzzleError::AlreadySolved(word.id.clone()));
        }
        Self::checked(level, categories, words)
    }

    fn checked(
        level: LevelId,
        categories: Vec<Category>,
        words: Vec<Word>,
    ) -> Result<Self, PuzzleError> {
        let expected = level.category_count();
        if categories.len() != expected {
            return Err(PuzzleError::CategoryCount {
                expected,
                actual: categories.len(),
            });
        }

        let mut sizes: HashMap<&CategoryId, usize> = HashMap::new();
        for category in &categories {
            if sizes.insert(&category.id, 0).is_some() {
                return Err(PuzzleError::DuplicateCategory(category.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for word in &words {
            if !seen.insert(&word.id) {
                return Err(PuzzleError::DuplicateWord(word.id.clone()));
            }
            match sizes.get_mut(&word.category_id) {
                Some(size) => *size += 1,
                None => {
                    return Err(PuzzleError::UnknownCategory {
                        word: word.id.clone(),
                        category: word.category_id.clone(),
                    });
                }
            }
        }

        for category in &categories {
            let size = sizes.get(&category.id).copied().unwrap_or_default();
            if size != GROUP_SIZE {
                return Err(PuzzleError::GroupSize {
                    category: category.id.clone(),
                    size,
                });
            }
        }

        Ok(Self {
            level,
            categories,
            words,
        })
    }

    /// The level this puzzle was generated for.
    pub fn level(&self) -> LevelId {
        self.level
    }

    /// Categories in generation order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Words in grid order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Looks up a word by id.
    pub fn word(&self, id: &WordId) -> Option<&Word> {
        self.words.iter().find(|w| &w.id == id)
    }

    /// Looks up a category by id.
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Words belonging to the given category, in grid order.
    pub fn words_in<'a>(&'a self, id: &'a CategoryId) -> impl Iterator<Item = &'a Word> + 'a {
        self.words.iter().filter(move |w| &w.category_id == id)
    }

    /// Categories with at least one unsolved word, in generation order.
    pub fn unsolved_categories(&self) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|c| self.words_in(&c.id).any(|w| !w.solved))
            .collect()
    }

    /// Number of solved words.
    pub fn solved_count(&self) -> usize {
        self.words.iter().filter(|w| w.solved).count()
    }

    /// Whether every word has been solved.
    pub fn is_complete(&self) -> bool {
        self.words.iter().all(|w| w.solved)
    }

    /// Marks the given words solved. Unknown ids are ignored.
    pub(crate) fn mark_solved(&mut self, ids: &[WordId]) {
        for word in self.words.iter_mut().filter(|w| ids.contains(&w.id)) {
            word.solved = true;
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PuzzleRepr {
    tier: Tier,
    level_index: u8,
    categories: Vec<Category>,
    words: Vec<Word>,
}

impl TryFrom<PuzzleRepr> for Puzzle {
    type Error = PuzzleError;

    fn try_from(repr: PuzzleRepr) -> Result<Self, Self::Error> {
        let level = LevelId::new(repr.tier, repr.level_index)?;
        Self::checked(level, repr.categories, repr.words)
    }
}

impl From<Puzzle> for PuzzleRepr {
    fn from(puzzle: Puzzle) -> Self {
        Self {
            tier: puzzle.level.tier,
            level_index: puzzle.level.index,
            categories: puzzle.categories,
            words: puzzle.words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_index_bounds() {
        assert!(LevelId::new(Tier::Beginner, 0).is_err());
        assert!(LevelId::new(Tier::Expert, 4).is_err());
        assert_eq!(LevelId::new(Tier::Expert, 3).map(|l| l.index()), Ok(3));
    }

    #[test]
    fn test_category_count_scales_with_index() {
        let counts: Vec<usize> = (1..=3)
            .map(|i| LevelId::new(Tier::Intermediate, i).map(|l| l.category_count()))
            .collect::<Result<_, _>>()
            .expect("valid indices");
        assert_eq!(counts, [4, 5, 6]);
    }

    #[test]
    fn test_level_ordering() {
        let b3 = LevelId::new(Tier::Beginner, 3).expect("valid");
        let i1 = LevelId::new(Tier::Intermediate, 1).expect("valid");
        assert!(b3 < i1);
    }

    #[test]
    fn test_tier_parses_case_insensitive() {
        assert_eq!("Expert".parse::<Tier>(), Ok(Tier::Expert));
        assert_eq!(Tier::Intermediate.to_string(), "intermediate");
    }

    #[test]
    fn test_level_display() {
        let level = LevelId::new(Tier::Beginner, 2).expect("valid");
        assert_eq!(level.to_string(), "beginner-2");
    }
}
