//! The session state machine.
//!
//! `Lobby -> Loading -> Playing -> Completed`, with `Loading -> Lobby` on a
//! failed fetch, `Completed -> Loading` when the next level starts and any
//! state `-> Lobby` on [`Intent::ReturnToLobby`].
//!
//! The machine never sleeps or performs I/O. Anything time-based is an
//! [`Effect`] carrying a [`TimerToken`]; the runtime echoes the token back in
//! an [`Event`] and the machine ignores tokens it no longer considers live.
//! Every state-resetting transition drains the [`TimerBook`], so a callback
//! from a previous level can never touch the current one.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::action::{Cue, Effect, Event, Intent};
use crate::progression::next_level;
use crate::report::CompletionReport;
use crate::timer::{TimerBook, TimerKind, TimerToken, Timings};
use crate::types::{CategoryId, GROUP_SIZE, LevelId, Puzzle, WordId};

/// Hints available per level.
pub const MAX_HINTS: u8 = 3;

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// No level loaded.
    Lobby,
    /// Waiting for the content provider.
    Loading,
    /// A puzzle is on the board.
    Playing,
    /// Every word of the puzzle is solved.
    Completed,
}

/// The active hint: one unsolved category revealed for a while.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    category: CategoryId,
    text: String,
}

impl Hint {
    /// The revealed category.
    pub fn category(&self) -> &CategoryId {
        &self.category
    }

    /// Text shown to the player.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Match,
    Mismatch,
}

/// A full selection waiting for its delayed resolution.
#[derive(Debug, Clone)]
struct Resolution {
    token: TimerToken,
    verdict: Verdict,
    words: Vec<WordId>,
}

/// Everything the presentation layer needs to draw the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Current phase.
    pub phase: Phase,
    /// Level being loaded or played.
    pub level: Option<LevelId>,
    /// The loaded puzzle.
    pub puzzle: Option<Puzzle>,
    /// Selected word ids in selection order.
    pub selection: Vec<WordId>,
    /// Wrong groups submitted this level.
    pub mistakes: u32,
    /// Seconds elapsed since the puzzle was installed.
    pub elapsed_secs: u64,
    /// Active hint text.
    pub hint: Option<String>,
    /// Hints used this level.
    pub hints_used: u8,
    /// Hints still available this level.
    pub hints_remaining: u8,
    /// Pulse set while a wrong group is on display.
    pub wrong: bool,
}

/// The puzzle session reducer.
///
/// Feed it [`Intent`]s with [`GameMachine::dispatch`] and runtime [`Event`]s
/// with [`GameMachine::handle`]; perform the returned [`Effect`]s in order.
#[derive(Debug)]
pub struct GameMachine<R = StdRng> {
    phase: Phase,
    level: Option<LevelId>,
    puzzle: Option<Puzzle>,
    selection: Vec<WordId>,
    mistakes: u32,
    elapsed_secs: u64,
    hint: Option<Hint>,
    hint_token: Option<TimerToken>,
    hints_used: u8,
    wrong: bool,
    resolution: Option<Resolution>,
    ticker: Option<TimerToken>,
    advance: Option<(TimerToken, LevelId)>,
    timers: TimerBook,
    timings: Timings,
    rng: R,
}

impl GameMachine<StdRng> {
    /// Creates a machine with default timings and a deterministic RNG.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), Timings::default())
    }

    /// Creates a machine with the given timings and an OS-seeded RNG.
    pub fn from_entropy(timings: Timings) -> Self {
        Self::new(StdRng::from_entropy(), timings)
    }
}

impl<R: Rng> GameMachine<R> {
    /// Creates a machine in the lobby.
    pub fn new(rng: R, timings: Timings) -> Self {
        Self {
            phase: Phase::Lobby,
            level: None,
            puzzle: None,
            selection: Vec::new(),
            mistakes: 0,
            elapsed_secs: 0,
            hint: None,
            hint_token: None,
            hints_used: 0,
            wrong: false,
            resolution: None,
            ticker: None,
            advance: None,
            timers: TimerBook::new(),
            timings,
            rng,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Level being loaded or played.
    pub fn level(&self) -> Option<LevelId> {
        self.level
    }

    /// The loaded puzzle.
    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    /// Selected word ids in selection order.
    pub fn selection(&self) -> &[WordId] {
        &self.selection
    }

    /// Whether `id` is currently selected.
    pub fn is_selected(&self, id: &WordId) -> bool {
        self.selection.contains(id)
    }

    /// Wrong groups submitted this level.
    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    /// Seconds elapsed on the current level.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// The active hint.
    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    /// Hints used this level.
    pub fn hints_used(&self) -> u8 {
        self.hints_used
    }

    /// Hints still available this level.
    pub fn hints_remaining(&self) -> u8 {
        MAX_HINTS.saturating_sub(self.hints_used)
    }

    /// Whether a wrong group is on display.
    pub fn is_wrong(&self) -> bool {
        self.wrong
    }

    /// Whether a full selection is waiting to resolve.
    pub fn is_resolving(&self) -> bool {
        self.resolution.is_some()
    }

    /// The configured delays.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Live timer tokens.
    pub fn timers(&self) -> &TimerBook {
        &self.timers
    }

    /// Copies the observable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            level: self.level,
            puzzle: self.puzzle.clone(),
            selection: self.selection.clone(),
            mistakes: self.mistakes,
            elapsed_secs: self.elapsed_secs,
            hint: self.hint.as_ref().map(|h| h.text.clone()),
            hints_used: self.hints_used,
            hints_remaining: self.hints_remaining(),
            wrong: self.wrong,
        }
    }

    /// Applies a player intent. Intents outside their preconditions are no-ops.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::StartLevel(level) => self.start_level(level),
            Intent::ToggleWord(id) => self.toggle_word(id),
            Intent::RequestHint => self.request_hint(),
            Intent::ClearSelection => self.clear_selection(),
            Intent::ReturnToLobby => self.return_to_lobby(),
        }
    }

    /// Applies a runtime event. Events carrying a stale token are ignored.
    #[instrument(skip(self, event), fields(phase = %self.phase))]
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::PuzzleLoaded { token, puzzle } => self.on_loaded(token, puzzle),
            Event::PuzzleFailed { token, message } => self.on_failed(token, message),
            Event::TimerFired(token) => self.on_timer(token),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Intents
    // ─────────────────────────────────────────────────────────────

    fn start_level(&mut self, level: LevelId) -> Vec<Effect> {
        let mut effects = self.reset();
        self.phase = Phase::Loading;
        self.level = Some(level);
        let token = self.timers.issue(TimerKind::Fetch);
        info!(%level, %token, "Starting level");
        effects.push(Effect::FetchPuzzle { token, level });
        effects
    }

    fn return_to_lobby(&mut self) -> Vec<Effect> {
        let effects = self.reset();
        if self.phase != Phase::Lobby {
            info!(from = %self.phase, "Returning to lobby");
        }
        self.phase = Phase::Lobby;
        self.level = None;
        effects
    }

    fn toggle_word(&mut self, id: WordId) -> Vec<Effect> {
        if self.phase != Phase::Playing {
            debug!(word = %id, "Ignoring selection outside play");
            return Vec::new();
        }
        if self.resolution.is_some() {
            debug!(word = %id, "Ignoring selection while a group resolves");
            return Vec::new();
        }
        let Some(puzzle) = &self.puzzle else {
            return Vec::new();
        };
        match puzzle.word(&id) {
            None => {
                debug!(word = %id, "Ignoring unknown word");
                return Vec::new();
            }
            Some(word) if word.is_solved() => {
                debug!(word = %id, "Ignoring solved word");
                return Vec::new();
            }
            Some(_) => {}
        }

        if let Some(pos) = self.selection.iter().position(|w| *w == id) {
            self.selection.remove(pos);
            debug!(word = %id, size = self.selection.len(), "Deselected word");
            return Vec::new();
        }
        if self.selection.len() >= GROUP_SIZE {
            debug!(word = %id, "Selection is full");
            return Vec::new();
        }

        self.selection.push(id);
        debug!(size = self.selection.len(), "Selected word");
        let mut effects = vec![Effect::Play(Cue::Select)];
        if self.selection.len() == GROUP_SIZE {
            effects.extend(self.evaluate_selection());
        }
        effects
    }

    fn evaluate_selection(&mut self) -> Vec<Effect> {
        let is_match = match &self.puzzle {
            Some(puzzle) => {
                let categories: Vec<&CategoryId> = self
                    .selection
                    .iter()
                    .filter_map(|id| puzzle.word(id))
                    .map(|w| w.category_id())
                    .collect();
                categories.len() == GROUP_SIZE && categories.windows(2).all(|p| p[0] == p[1])
            }
            None => return Vec::new(),
        };

        let words = self.selection.clone();
        if is_match {
            let token = self.timers.issue(TimerKind::MatchResolve);
            info!(%token, "Selection matches a category");
            self.resolution = Some(Resolution {
                token,
                verdict: Verdict::Match,
                words,
            });
            vec![self.schedule(token, TimerKind::MatchResolve)]
        } else {
            self.mistakes += 1;
            self.wrong = true;
            let token = self.timers.issue(TimerKind::MismatchReset);
            info!(mistakes = self.mistakes, "Selection spans several categories");
            self.resolution = Some(Resolution {
                token,
                verdict: Verdict::Mismatch,
                words,
            });
            vec![
                Effect::Play(Cue::Wrong),
                self.schedule(token, TimerKind::MismatchReset),
            ]
        }
    }

    fn request_hint(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Playing || self.hint.is_some() || self.hints_used >= MAX_HINTS {
            debug!(used = self.hints_used, active = self.hint.is_some(), "Ignoring hint request");
            return Vec::new();
        }
        let Some(puzzle) = &self.puzzle else {
            return Vec::new();
        };
        let candidates = puzzle.unsolved_categories();
        let Some(category) = candidates.choose(&mut self.rng) else {
            debug!("No unsolved category to hint");
            return Vec::new();
        };
        let hint = Hint {
            category: category.id().clone(),
            text: format!("تلميح: {} - {}", category.title(), category.description()),
        };

        self.hints_used += 1;
        info!(category = %hint.category, used = self.hints_used, "Revealing hint");
        self.hint = Some(hint);
        let token = self.timers.issue(TimerKind::HintExpiry);
        self.hint_token = Some(token);
        vec![self.schedule(token, TimerKind::HintExpiry)]
    }

    fn clear_selection(&mut self) -> Vec<Effect> {
        // A pending resolution keeps its own copy of the words.
        if self.phase != Phase::Playing {
            debug!("Ignoring clear request");
            return Vec::new();
        }
        self.selection.clear();
        Vec::new()
    }

    // ─────────────────────────────────────────────────────────────
    //  Events
    // ─────────────────────────────────────────────────────────────

    fn on_loaded(&mut self, token: TimerToken, puzzle: Puzzle) -> Vec<Effect> {
        if self.timers.kind(token) != Some(TimerKind::Fetch) {
            debug!(%token, "Dropping stale puzzle");
            return Vec::new();
        }
        self.timers.take(token);

        if self.level != Some(puzzle.level()) {
            warn!(
                requested = ?self.level,
                received = %puzzle.level(),
                "Provider returned a puzzle for the wrong level"
            );
            return self.fall_back_to_lobby();
        }

        info!(level = %puzzle.level(), words = puzzle.words().len(), "Puzzle installed");
        self.puzzle = Some(puzzle);
        self.phase = Phase::Playing;
        let ticker = self.timers.issue(TimerKind::Ticker);
        self.ticker = Some(ticker);
        vec![Effect::StartTicker {
            token: ticker,
            period: self.timings.delay(TimerKind::Ticker),
        }]
    }

    fn on_failed(&mut self, token: TimerToken, message: String) -> Vec<Effect> {
        if self.timers.kind(token) != Some(TimerKind::Fetch) {
            debug!(%token, "Dropping stale fetch failure");
            return Vec::new();
        }
        self.timers.take(token);
        error!(level = ?self.level, error = %message, "Failed to load level");
        self.fall_back_to_lobby()
    }

    fn on_timer(&mut self, token: TimerToken) -> Vec<Effect> {
        let Some(kind) = self.timers.kind(token) else {
            debug!(%token, "Dropping stale timer");
            return Vec::new();
        };
        match kind {
            TimerKind::Ticker => {
                if self.phase == Phase::Playing {
                    self.elapsed_secs += 1;
                }
                Vec::new()
            }
            TimerKind::Fetch => {
                debug!(%token, "Fetch tokens resolve through puzzle events");
                Vec::new()
            }
            TimerKind::MatchResolve => {
                self.timers.take(token);
                self.resolve_match(token)
            }
            TimerKind::MismatchReset => {
                self.timers.take(token);
                self.reset_mismatch(token)
            }
            TimerKind::HintExpiry => {
                self.timers.take(token);
                if self.hint_token == Some(token) {
                    debug!("Hint expired");
                    self.hint = None;
                    self.hint_token = None;
                }
                Vec::new()
            }
            TimerKind::AutoAdvance => {
                self.timers.take(token);
                match self.advance.take() {
                    Some((live, next)) if live == token => self.start_level(next),
                    other => {
                        self.advance = other;
                        Vec::new()
                    }
                }
            }
        }
    }

    fn resolve_match(&mut self, token: TimerToken) -> Vec<Effect> {
        let resolution = match self.resolution.take() {
            Some(r) if r.token == token && r.verdict == Verdict::Match => r,
            other => {
                self.resolution = other;
                return Vec::new();
            }
        };
        let Some(puzzle) = self.puzzle.as_mut() else {
            return Vec::new();
        };
        puzzle.mark_solved(&resolution.words);
        let complete = puzzle.is_complete();
        let solved = puzzle.solved_count();
        self.selection.clear();

        let mut effects = Vec::new();
        if let Some(hint_token) = self.hint_token.take() {
            self.timers.cancel(hint_token);
            effects.push(Effect::Cancel(hint_token));
        }
        self.hint = None;
        effects.push(Effect::Play(Cue::Correct));
        info!(solved, "Group solved");

        if complete {
            effects.extend(self.complete());
        }
        effects
    }

    fn reset_mismatch(&mut self, token: TimerToken) -> Vec<Effect> {
        match self.resolution.take() {
            Some(r) if r.token == token && r.verdict == Verdict::Mismatch => {
                self.wrong = false;
                self.selection.clear();
            }
            other => self.resolution = other,
        }
        Vec::new()
    }

    fn complete(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(ticker) = self.ticker.take() {
            self.timers.cancel(ticker);
            effects.push(Effect::Cancel(ticker));
        }
        self.phase = Phase::Completed;

        let Some(level) = self.level else {
            return effects;
        };
        let next = next_level(level);
        let report = CompletionReport::new(
            level,
            self.elapsed_secs,
            self.mistakes,
            self.hints_used,
            next,
        );
        info!(%level, elapsed = self.elapsed_secs, mistakes = self.mistakes, "Level completed");
        effects.push(Effect::Play(Cue::Win));
        effects.push(Effect::LevelCompleted(report));

        match next {
            Some(next) => {
                let token = self.timers.issue(TimerKind::AutoAdvance);
                self.advance = Some((token, next));
                effects.push(self.schedule(token, TimerKind::AutoAdvance));
            }
            None => info!("Campaign finished"),
        }
        effects
    }

    // ─────────────────────────────────────────────────────────────
    //  Helpers
    // ─────────────────────────────────────────────────────────────

    fn schedule(&self, token: TimerToken, kind: TimerKind) -> Effect {
        Effect::Schedule {
            token,
            kind,
            after: self.timings.delay(kind),
        }
    }

    fn fall_back_to_lobby(&mut self) -> Vec<Effect> {
        let effects = self.reset();
        self.phase = Phase::Lobby;
        self.level = None;
        effects
    }

    /// Invalidates every live token and clears the session, keeping the phase.
    fn reset(&mut self) -> Vec<Effect> {
        let effects: Vec<Effect> = self.timers.drain().into_iter().map(Effect::Cancel).collect();
        self.puzzle = None;
        self.selection.clear();
        self.mistakes = 0;
        self.elapsed_secs = 0;
        self.hint = None;
        self.hint_token = None;
        self.hints_used = 0;
        self.wrong = false;
        self.resolution = None;
        self.ticker = None;
        self.advance = None;
        effects
    }
}
