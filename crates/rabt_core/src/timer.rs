//! Timer tokens and the book of live scheduled callbacks.
//!
//! Every scheduled callback (and every content fetch) is identified by a
//! [`TimerToken`]. The machine keeps the live ones in a [`TimerBook`]; a
//! firing whose token is no longer in the book belongs to a superseded
//! session and is dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Identity of one scheduled callback. Never reused within a machine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("timer#{}", _0)]
pub struct TimerToken(u64);

/// What a scheduled callback does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum TimerKind {
    /// Recurring once-per-period elapsed-time tick.
    Ticker,
    /// Outstanding puzzle fetch.
    Fetch,
    /// Resolves a correct four-word group.
    MatchResolve,
    /// Clears a wrong four-word group.
    MismatchReset,
    /// Clears the active hint.
    HintExpiry,
    /// Starts the next level after completion.
    AutoAdvance,
}

/// Live tokens, keyed by token.
#[derive(Debug, Clone, Default)]
pub struct TimerBook {
    next: u64,
    live: BTreeMap<TimerToken, TimerKind>,
}

impl TimerBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token of the given kind.
    #[instrument(skip(self))]
    pub fn issue(&mut self, kind: TimerKind) -> TimerToken {
        self.next += 1;
        let token = TimerToken(self.next);
        self.live.insert(token, kind);
        debug!(%token, "Issued timer token");
        token
    }

    /// Kind of a live token, or `None` if it was never issued or is no longer live.
    pub fn kind(&self, token: TimerToken) -> Option<TimerKind> {
        self.live.get(&token).copied()
    }

    /// Removes a live token, returning its kind. Used when a one-shot fires.
    pub fn take(&mut self, token: TimerToken) -> Option<TimerKind> {
        self.live.remove(&token)
    }

    /// Cancels a token. Cancelling an unknown or already-cancelled token is a no-op.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        self.live.remove(&token).is_some()
    }

    /// Invalidates every live token, returning them in issue order.
    pub fn drain(&mut self) -> Vec<TimerToken> {
        std::mem::take(&mut self.live).into_keys().collect()
    }

    /// Number of live tokens.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no token is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

/// Delays used by the state machine, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Elapsed-time tick period.
    pub tick_ms: u64,
    /// Delay before a correct group is marked solved.
    pub match_delay_ms: u64,
    /// Delay before a wrong group is cleared.
    pub mismatch_delay_ms: u64,
    /// How long a hint stays visible.
    pub hint_duration_ms: u64,
    /// Delay between completion and starting the next level.
    pub auto_advance_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            match_delay_ms: 300,
            mismatch_delay_ms: 1_000,
            hint_duration_ms: 8_000,
            auto_advance_ms: 4_000,
        }
    }
}

impl Timings {
    /// Delay for a one-shot of the given kind. `Fetch` has no delay.
    /// The ticker period is never zero.
    pub fn delay(&self, kind: TimerKind) -> Duration {
        let ms = match kind {
            TimerKind::Ticker => self.tick_ms.max(1),
            TimerKind::Fetch => 0,
            TimerKind::MatchResolve => self.match_delay_ms,
            TimerKind::MismatchReset => self.mismatch_delay_ms,
            TimerKind::HintExpiry => self.hint_duration_ms,
            TimerKind::AutoAdvance => self.auto_advance_ms,
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let mut book = TimerBook::new();
        let token = book.issue(TimerKind::HintExpiry);
        assert!(book.cancel(token));
        assert!(!book.cancel(token));
        assert_eq!(book.kind(token), None);
    }

    #[test]
    fn test_tokens_are_never_reused() {
        let mut book = TimerBook::new();
        let first = book.issue(TimerKind::Ticker);
        book.drain();
        let second = book.issue(TimerKind::Ticker);
        assert_ne!(first, second);
        assert_eq!(book.kind(first), None);
        assert_eq!(book.kind(second), Some(TimerKind::Ticker));
    }

    #[test]
    fn test_zero_tick_period_is_clamped() {
        let timings = Timings {
            tick_ms: 0,
            ..Timings::default()
        };
        assert_eq!(timings.delay(TimerKind::Ticker), Duration::from_millis(1));
        assert_eq!(timings.delay(TimerKind::Fetch), Duration::ZERO);
    }
}
