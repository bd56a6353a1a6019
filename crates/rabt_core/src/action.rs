//! Inputs and outputs of the state machine.
//!
//! Intents come from the player, events come from the runtime, and effects
//! are what the machine asks the runtime to do. None of them carry behaviour.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::report::CompletionReport;
use crate::timer::{TimerKind, TimerToken};
use crate::types::{LevelId, Puzzle, WordId};

/// A player action forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Load and start the given level.
    StartLevel(LevelId),
    /// Select or deselect a word.
    ToggleWord(WordId),
    /// Reveal one unsolved category.
    RequestHint,
    /// Empty the selection.
    ClearSelection,
    /// Abandon the current level.
    ReturnToLobby,
}

/// Something the runtime observed on behalf of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The content provider returned a puzzle for the fetch `token`.
    PuzzleLoaded {
        /// Fetch token from [`Effect::FetchPuzzle`].
        token: TimerToken,
        /// The validated puzzle.
        puzzle: Puzzle,
    },
    /// The content provider failed for the fetch `token`.
    PuzzleFailed {
        /// Fetch token from [`Effect::FetchPuzzle`].
        token: TimerToken,
        /// Human-readable reason.
        message: String,
    },
    /// A scheduled callback or ticker period elapsed.
    TimerFired(TimerToken),
}

/// Sound cue for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cue {
    /// A word was added to the selection.
    Select,
    /// A correct group resolved.
    Correct,
    /// A wrong group was submitted.
    Wrong,
    /// The level was completed.
    Win,
}

/// Work the runtime must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a puzzle asynchronously and report back with the token.
    FetchPuzzle {
        /// Token to echo in the resulting event.
        token: TimerToken,
        /// Level to fetch.
        level: LevelId,
    },
    /// Fire [`Event::TimerFired`] once after `after`.
    Schedule {
        /// Token to echo when firing.
        token: TimerToken,
        /// What the callback is for.
        kind: TimerKind,
        /// Delay before firing.
        after: Duration,
    },
    /// Fire [`Event::TimerFired`] every `period` until cancelled.
    StartTicker {
        /// Token to echo on each period.
        token: TimerToken,
        /// Tick period.
        period: Duration,
    },
    /// Stop whatever was scheduled under `token`. Unknown tokens are ignored.
    Cancel(TimerToken),
    /// Play a sound cue.
    Play(Cue),
    /// A level was completed.
    LevelCompleted(CompletionReport),
}
