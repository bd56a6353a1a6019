//! Rabt core - pure game logic for the word-grouping puzzle.
//!
//! This crate has no I/O. The [`GameMachine`] is a reducer: presentation
//! intents and runtime events go in, [`Effect`]s come out, and the runtime
//! (see the `rabt` crate) performs them.
//!
//! # Architecture
//!
//! - **Types**: tiers, levels, categories, words and the validated [`Puzzle`]
//! - **Progression**: which level follows which ([`next_level`])
//! - **Timers**: [`TimerToken`]s for every scheduled callback, so stale ones
//!   can be recognised and dropped
//! - **Machine**: the session state machine (selection, matching, hints,
//!   elapsed time, completion and auto-advance)
//!
//! # Example
//!
//! ```
//! use rabt_core::{GameMachine, Intent, LevelId, Phase, Tier};
//!
//! let mut machine = GameMachine::seeded(7);
//! let level = LevelId::new(Tier::Beginner, 1).unwrap();
//! let effects = machine.dispatch(Intent::StartLevel(level));
//! assert_eq!(machine.phase(), Phase::Loading);
//! assert!(!effects.is_empty());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod error;
mod machine;
mod progression;
mod report;
mod timer;
mod types;

pub use action::{Cue, Effect, Event, Intent};
pub use error::{LevelError, PuzzleError};
pub use machine::{GameMachine, Hint, MAX_HINTS, Phase, Snapshot};
pub use progression::{campaign, next_level};
pub use report::{CompletionReport, format_clock};
pub use timer::{TimerBook, TimerKind, TimerToken, Timings};
pub use types::{
    Category, CategoryId, GROUP_SIZE, LevelId, MAX_LEVEL_INDEX, MIN_LEVEL_INDEX, Puzzle, Tier,
    Word, WordId,
};
