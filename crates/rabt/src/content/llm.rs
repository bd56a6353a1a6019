//! Puzzle provider backed by an LLM.

use std::sync::Mutex;

use async_trait::async_trait;
use rabt_core::{LevelId, Puzzle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument};

use super::PuzzleProvider;
use super::error::ContentError;
use super::generated::GeneratedLevel;
use super::prompt::{level_prompt, level_schema, system_prompt};
use crate::llm_client::LlmClient;

/// Generates each level on demand through an [`LlmClient`].
#[derive(Debug)]
pub struct LlmPuzzleProvider {
    client: LlmClient,
    rng: Mutex<StdRng>,
}

impl LlmPuzzleProvider {
    /// Creates a provider that shuffles with an entropy-seeded RNG.
    #[instrument(skip(client))]
    pub fn new(client: LlmClient) -> Self {
        Self::with_rng(client, StdRng::from_entropy())
    }

    /// Creates a provider with an explicit shuffle RNG.
    #[instrument(skip(client, rng))]
    pub fn with_rng(client: LlmClient, rng: StdRng) -> Self {
        Self {
            client,
            rng: Mutex::new(rng),
        }
    }

    /// Asks the model for a level and parses the reply without validating it.
    #[instrument(skip(self), fields(level = %level))]
    pub async fn generate(&self, level: LevelId) -> Result<GeneratedLevel, ContentError> {
        info!("Requesting level from LLM");
        let text = self
            .client
            .generate_json(system_prompt(), &level_prompt(level), &level_schema(level))
            .await?;
        GeneratedLevel::parse(&text)
    }
}

#[async_trait]
impl PuzzleProvider for LlmPuzzleProvider {
    #[instrument(skip(self), fields(level = %level))]
    async fn fetch(&self, level: LevelId) -> Result<Puzzle, ContentError> {
        let generated = self.generate(level).await?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ContentError::new("Shuffle RNG lock poisoned"))?;
        let puzzle = generated.into_puzzle(level, &mut *rng)?;
        info!(words = puzzle.words().len(), "Generated puzzle");
        Ok(puzzle)
    }
}
