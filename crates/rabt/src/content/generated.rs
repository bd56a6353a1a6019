//! The level format produced by the generator and stored in level files.

use derive_getters::Getters;
use derive_new::new;
use rabt_core::{Category, CategoryId, LevelId, Puzzle, Word, WordId};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::ContentError;

/// Color used when a category arrives without one.
const FALLBACK_COLOR: &str = "#F59E0B";

fn fallback_color() -> String {
    FALLBACK_COLOR.to_string()
}

/// One category with its four words, as generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GeneratedCategory {
    /// Category id.
    id: String,
    /// Display title.
    title: String,
    /// Emoji glyph.
    icon: String,
    /// Hex color.
    #[serde(default = "fallback_color")]
    color: String,
    /// What links the words.
    description: String,
    /// The category's words.
    words: Vec<String>,
}

/// A generated level before ids are assigned and words are shuffled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GeneratedLevel {
    /// Categories in generation order.
    categories: Vec<GeneratedCategory>,
}

impl GeneratedLevel {
    /// Parses generator output, tolerating a surrounding markdown code fence.
    #[instrument(skip(text), fields(text_length = text.len()))]
    pub fn parse(text: &str) -> Result<Self, ContentError> {
        let json = strip_code_fence(text);
        let level: Self = serde_json::from_str(json)?;
        debug!(categories = level.categories.len(), "Parsed generated level");
        Ok(level)
    }

    /// Rebuilds the generated form of a puzzle, in category order with each
    /// category's words ordered by id.
    #[instrument(skip(puzzle), fields(level = %puzzle.level()))]
    pub fn from_puzzle(puzzle: &Puzzle) -> Self {
        let categories = puzzle
            .categories()
            .iter()
            .map(|category| {
                let mut words: Vec<_> = puzzle.words_in(category.id()).collect();
                words.sort_by(|a, b| a.id().cmp(b.id()));
                GeneratedCategory {
                    id: category.id().to_string(),
                    title: category.title().clone(),
                    icon: category.icon().clone(),
                    color: category.color().clone(),
                    description: category.description().clone(),
                    words: words.iter().map(|word| word.text().clone()).collect(),
                }
            })
            .collect();
        Self { categories }
    }

    /// Assigns word ids `{categoryId}-{n}`, shuffles the words and validates
    /// the result against `level`.
    #[instrument(skip(self, rng), fields(level = %level))]
    pub fn into_puzzle<R: Rng + ?Sized>(
        self,
        level: LevelId,
        rng: &mut R,
    ) -> Result<Puzzle, ContentError> {
        let mut categories = Vec::with_capacity(self.categories.len());
        let mut words = Vec::new();

        for generated in self.categories {
            let id = CategoryId::new(generated.id.trim());
            for (n, text) in generated.words.iter().enumerate() {
                words.push(Word::new(
                    WordId::new(format!("{}-{}", id, n)),
                    text.trim(),
                    id.clone(),
                ));
            }
            categories.push(Category::new(
                id,
                generated.title,
                generated.icon,
                generated.color,
                generated.description,
            ));
        }

        words.shuffle(rng);
        let puzzle = Puzzle::new(level, categories, words)?;
        debug!(words = puzzle.words().len(), "Built puzzle");
        Ok(puzzle)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) up to the first newline.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
