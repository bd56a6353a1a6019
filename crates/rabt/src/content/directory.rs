//! Puzzle provider reading pre-generated level files.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rabt_core::{LevelId, Puzzle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

use super::PuzzleProvider;
use super::error::ContentError;
use super::generated::GeneratedLevel;

/// Path of the file holding `level` under `dir`: `{dir}/{tier}-{index}.json`.
pub fn level_path(dir: &Path, level: LevelId) -> PathBuf {
    dir.join(format!("{}.json", level))
}

/// Serves levels from a directory written by `rabt generate`.
#[derive(Debug)]
pub struct DirectoryPuzzleProvider {
    dir: PathBuf,
    rng: Mutex<StdRng>,
}

impl DirectoryPuzzleProvider {
    /// Creates a provider over `dir` with an entropy-seeded shuffle RNG.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_rng(dir, StdRng::from_entropy())
    }

    /// Creates a provider over `dir` with an explicit shuffle RNG.
    #[instrument(skip(dir, rng), fields(dir = %dir.as_ref().display()))]
    pub fn with_rng(dir: impl AsRef<Path>, rng: StdRng) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            rng: Mutex::new(rng),
        }
    }

    /// The directory levels are read from.
    #[instrument(skip(self))]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `generated` as the file for `level`, creating the directory.
    #[instrument(skip(self, generated), fields(level = %level))]
    pub async fn store(
        &self,
        level: LevelId,
        generated: &GeneratedLevel,
    ) -> Result<PathBuf, ContentError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = level_path(&self.dir, level);
        let json = serde_json::to_string_pretty(generated)?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "Stored level");
        Ok(path)
    }
}

#[async_trait]
impl PuzzleProvider for DirectoryPuzzleProvider {
    #[instrument(skip(self), fields(level = %level))]
    async fn fetch(&self, level: LevelId) -> Result<Puzzle, ContentError> {
        let path = level_path(&self.dir, level);
        debug!(path = %path.display(), "Reading level file");
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ContentError::new(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let generated = GeneratedLevel::parse(&text)?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ContentError::new("Shuffle RNG lock poisoned"))?;
        generated.into_puzzle(level, &mut *rng)
    }
}
