//! Rabt - the word-grouping puzzle with LLM-generated levels.
//!
//! This crate wires the pure state machine from [`rabt_core`] to the outside
//! world.
//!
//! # Architecture
//!
//! - **Content**: [`PuzzleProvider`] implementations that ask an LLM for a
//!   level or read pre-generated level files
//! - **Driver**: [`GameDriver`] performs the machine's effects on tokio
//!   (fetch tasks, one-shot timers, the elapsed-time ticker)
//! - **Storage**: a flat key-value store and the [`ProfileService`] that keeps
//!   the user identity and the mute flag in it
//! - **Sound**: cue sinks behind a muting [`Mixer`]
//! - **Console**: a line-oriented front end for the terminal
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rabt::{GameDriver, LlmClient, LlmConfig, LlmProvider, LlmPuzzleProvider, Mixer, TracingSink};
//! use rabt_core::{GameMachine, Intent, LevelId, Timings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = LlmConfig::new(LlmProvider::Gemini, "key".to_string(), "gemini-2.5-flash".to_string(), 8192);
//! let provider = Arc::new(LlmPuzzleProvider::new(LlmClient::new(config)));
//! let machine = GameMachine::from_entropy(Timings::default());
//! let mut driver = GameDriver::new(machine, provider, Mixer::new(Box::new(TracingSink)));
//! driver.dispatch(Intent::StartLevel(LevelId::first()));
//! driver.step().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod content;
mod driver;
mod llm_client;
mod sound;
mod storage;

pub mod console;

// Crate-level exports - Configuration
pub use config::{ConfigError, RabtConfig};

// Crate-level exports - Content providers
pub use content::{
    ContentError, DirectoryPuzzleProvider, GeneratedCategory, GeneratedLevel, LlmPuzzleProvider,
    PuzzleProvider, level_path, level_prompt, level_schema, system_prompt,
};

// Crate-level exports - Runtime driver
pub use driver::{GameDriver, StepKind};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Sound
pub use sound::{BellSink, Mixer, SoundSink, TracingSink};

// Crate-level exports - Persistence
pub use storage::{
    DEFAULT_USERNAME, FileStore, KeyValueStore, MUTED_KEY, MemoryStore, ProfileService,
    StorageError, USER_KEY, UserProfile,
};
