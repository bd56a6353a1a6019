//! Tokio runtime for the state machine.
//!
//! The driver performs [`Effect`]s as tasks that report back through an
//! unbounded channel. Each task is keyed by its [`TimerToken`] so a
//! cancellation can abort it before it fires.

use std::collections::HashMap;
use std::sync::Arc;

use rabt_core::{CompletionReport, Effect, Event, GameMachine, Intent, Snapshot, TimerToken};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, error, info, instrument, warn};

use crate::content::PuzzleProvider;
use crate::sound::Mixer;
use crate::storage::{ProfileService, UserProfile};

/// What a call to [`GameDriver::step`] processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// A ticker period; only the clock changed.
    Tick,
    /// Any other event.
    Update,
}

/// Runs a [`GameMachine`] against real time and a [`PuzzleProvider`].
///
/// Effects spawn tokio tasks, so [`GameDriver::dispatch`] must be called from
/// within a runtime.
#[derive(Debug)]
pub struct GameDriver {
    machine: GameMachine,
    provider: Arc<dyn PuzzleProvider>,
    mixer: Mixer,
    profiles: Option<ProfileService>,
    user: Option<UserProfile>,
    tx: UnboundedSender<Event>,
    rx: UnboundedReceiver<Event>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
    ticker: Option<TimerToken>,
    last_report: Option<CompletionReport>,
}

impl GameDriver {
    /// Creates a driver with no persistence.
    #[instrument(skip(machine, provider, mixer))]
    pub fn new(machine: GameMachine, provider: Arc<dyn PuzzleProvider>, mixer: Mixer) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            machine,
            provider,
            mixer,
            profiles: None,
            user: None,
            tx,
            rx,
            tasks: HashMap::new(),
            ticker: None,
            last_report: None,
        }
    }

    /// Attaches the profile service: the stored mute flag is applied and
    /// completions are recorded for the logged-in user.
    #[instrument(skip(self, profiles))]
    pub fn with_profiles(mut self, profiles: ProfileService) -> Self {
        match profiles.is_muted() {
            Ok(muted) => self.mixer.set_muted(muted),
            Err(e) => warn!(error = %e, "Could not read mute flag"),
        }
        match profiles.load_user() {
            Ok(user) => self.user = user,
            Err(e) => warn!(error = %e, "Could not read user record"),
        }
        self.profiles = Some(profiles);
        self
    }

    /// The state machine.
    #[instrument(skip(self))]
    pub fn machine(&self) -> &GameMachine {
        &self.machine
    }

    /// Snapshot of the session for rendering.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// The logged-in user, as last loaded or updated.
    #[instrument(skip(self))]
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Replaces the logged-in user after a login.
    #[instrument(skip(self, user))]
    pub fn set_user(&mut self, user: Option<UserProfile>) {
        self.user = user;
    }

    /// The report of the most recently completed level.
    #[instrument(skip(self))]
    pub fn last_report(&self) -> Option<&CompletionReport> {
        self.last_report.as_ref()
    }

    /// Whether sound cues are muted.
    #[instrument(skip(self))]
    pub fn is_muted(&self) -> bool {
        self.mixer.is_muted()
    }

    /// Flips the mute flag, persists it, and returns the new value.
    #[instrument(skip(self))]
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.mixer.toggle();
        if let Some(profiles) = &self.profiles {
            if let Err(e) = profiles.set_muted(muted) {
                warn!(error = %e, "Could not persist mute flag");
            }
        }
        info!(muted, "Toggled mute");
        muted
    }

    /// Number of tasks that may still post an event.
    #[instrument(skip(self))]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }

    /// Applies a player intent and performs its effects.
    #[instrument(skip(self))]
    pub fn dispatch(&mut self, intent: Intent) {
        let effects = self.machine.dispatch(intent);
        self.perform(effects);
    }

    /// Waits for the next runtime event, applies it and performs its effects.
    ///
    /// Returns `None` only if the event channel closed.
    #[instrument(skip(self))]
    pub async fn step(&mut self) -> Option<StepKind> {
        let event = self.rx.recv().await?;
        let kind = match &event {
            Event::TimerFired(token) if Some(*token) == self.ticker => StepKind::Tick,
            _ => StepKind::Update,
        };
        let effects = self.machine.handle(event);
        self.perform(effects);
        self.tasks.retain(|_, task| !task.is_finished());
        Some(kind)
    }

    fn perform(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchPuzzle { token, level } => {
                    let provider = Arc::clone(&self.provider);
                    let tx = self.tx.clone();
                    let handle = tokio::spawn(async move {
                        let event = match provider.fetch(level).await {
                            Ok(puzzle) => Event::PuzzleLoaded { token, puzzle },
                            Err(e) => {
                                error!(error = %e, %level, "Puzzle fetch failed");
                                Event::PuzzleFailed {
                                    token,
                                    message: e.message,
                                }
                            }
                        };
                        post(&tx, event);
                    });
                    self.tasks.insert(token, handle);
                }
                Effect::Schedule { token, kind, after } => {
                    debug!(%token, %kind, ?after, "Scheduling timer");
                    let tx = self.tx.clone();
                    let handle = tokio::spawn(async move {
                        sleep(after).await;
                        post(&tx, Event::TimerFired(token));
                    });
                    self.tasks.insert(token, handle);
                }
                Effect::StartTicker { token, period } => {
                    debug!(%token, ?period, "Starting ticker");
                    let tx = self.tx.clone();
                    let handle = tokio::spawn(async move {
                        let mut interval = interval_at(Instant::now() + period, period);
                        loop {
                            interval.tick().await;
                            if tx.send(Event::TimerFired(token)).is_err() {
                                break;
                            }
                        }
                    });
                    self.ticker = Some(token);
                    self.tasks.insert(token, handle);
                }
                Effect::Cancel(token) => {
                    if let Some(task) = self.tasks.remove(&token) {
                        debug!(%token, "Aborting task");
                        task.abort();
                    }
                    if self.ticker == Some(token) {
                        self.ticker = None;
                    }
                }
                Effect::Play(cue) => self.mixer.play(cue),
                Effect::LevelCompleted(report) => self.record(report),
            }
        }
    }

    fn record(&mut self, report: CompletionReport) {
        info!(level = %report.level(), secs = report.elapsed_secs(), "Level completed");
        if let Some(profiles) = &self.profiles {
            match profiles.record_completion(&report) {
                Ok(Some(user)) => self.user = Some(user),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Could not record completion"),
            }
        }
        self.last_report = Some(report);
    }
}

impl Drop for GameDriver {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

fn post(tx: &UnboundedSender<Event>, event: Event) {
    if tx.send(event).is_err() {
        debug!("Driver gone, dropping event");
    }
}
