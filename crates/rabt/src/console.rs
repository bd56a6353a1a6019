//! Line-oriented terminal front end.
//!
//! Renders [`Snapshot`]s as text and turns typed commands into intents.

use std::fmt::Write as _;
use std::str::FromStr;

use rabt_core::{
    CompletionReport, Intent, LevelId, Phase, Snapshot, Tier, WordId, campaign, format_clock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};

use crate::driver::{GameDriver, StepKind};
use crate::storage::{ProfileService, UserProfile};

/// A parsed console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Toggle the unsolved word with this 1-based number.
    Toggle(usize),
    /// Request a hint.
    Hint,
    /// Clear the selection.
    Clear,
    /// Leave the level.
    Lobby,
    /// Start a level; the player's current tier when unspecified.
    Start(Option<LevelId>),
    /// Toggle sound.
    Mute,
    /// Print the share text of the last completed level.
    Share,
    /// List the campaign.
    Levels,
    /// Show the command list.
    Help,
    /// Exit.
    Quit,
}

/// Parses one input line. Returns `None` for blank or unrecognized input.
#[instrument]
pub fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let args: Vec<&str> = parts.collect();

    if let Ok(n) = head.parse::<usize>() {
        return args.is_empty().then_some(Command::Toggle(n));
    }

    let command = match head.as_str() {
        "h" | "hint" => Command::Hint,
        "c" | "clear" => Command::Clear,
        "l" | "lobby" => Command::Lobby,
        "m" | "mute" => Command::Mute,
        "share" => Command::Share,
        "levels" => Command::Levels,
        "?" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "s" | "start" | "p" | "play" => match args.as_slice() {
            [] => Command::Start(None),
            args => Command::Start(Some(parse_level(args)?)),
        },
        _ => return None,
    };
    Some(command)
}

/// Parses `beginner 2` or `beginner-2`.
fn parse_level(args: &[&str]) -> Option<LevelId> {
    let (tier, index) = match args {
        [single] => single.rsplit_once('-')?,
        [tier, index] => (*tier, *index),
        _ => return None,
    };
    let tier = Tier::from_str(tier).ok()?;
    LevelId::new(tier, index.parse().ok()?).ok()
}

/// The unsolved word shown under number `n` (1-based, grid order).
#[instrument(skip(snapshot))]
pub fn word_at(snapshot: &Snapshot, n: usize) -> Option<WordId> {
    let puzzle = snapshot.puzzle.as_ref()?;
    puzzle
        .words()
        .iter()
        .filter(|word| !word.is_solved())
        .nth(n.checked_sub(1)?)
        .map(|word| word.id().clone())
}

/// Command reference.
pub fn help_text() -> &'static str {
    "Commands:\n  \
     <n>              select or deselect word n\n  \
     h                hint\n  \
     c                clear selection\n  \
     s [tier index]   start a level (e.g. `s beginner 2`)\n  \
     l                back to the lobby\n  \
     m                mute / unmute\n  \
     share            share text of the last level\n  \
     levels           list all levels\n  \
     q                quit"
}

/// Renders the campaign with the player's best times.
#[instrument(skip(user))]
pub fn render_levels(user: Option<&UserProfile>) -> String {
    let mut out = String::new();
    for level in campaign() {
        let best = user
            .and_then(|u| u.best_time(level.tier()))
            .filter(|_| level.index() == 1)
            .map(|secs| format!("  best {}", format_clock(secs)))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:<16} {} categories, {} words{}",
            level.to_string(),
            level.category_count(),
            level.word_count(),
            best
        );
    }
    out
}

/// Renders a snapshot as text.
#[instrument(skip_all)]
pub fn render(
    snapshot: &Snapshot,
    user: Option<&UserProfile>,
    muted: bool,
    report: Option<&CompletionReport>,
) -> String {
    let mut out = String::new();
    match snapshot.phase {
        Phase::Lobby => {
            let name = user.map_or("", |u| u.username().as_str());
            let _ = writeln!(out, "== رَبْط ==  أهلاً {}", name);
            if let Some(user) = user {
                let _ = writeln!(out, "Tier reached: {}", user.current_tier());
            }
            out.push_str(&render_levels(user));
            out.push_str("Type `s` to play, `?` for help.\n");
        }
        Phase::Loading => {
            if let Some(level) = snapshot.level {
                let _ = writeln!(out, "Loading {}...", level);
            }
        }
        Phase::Playing => render_board(&mut out, snapshot, muted),
        Phase::Completed => {
            if let Some(report) = report {
                render_report(&mut out, report);
            }
        }
    }
    out
}

fn render_board(out: &mut String, snapshot: &Snapshot, muted: bool) {
    let Some(puzzle) = snapshot.puzzle.as_ref() else {
        return;
    };
    let level = puzzle.level();
    let _ = writeln!(
        out,
        "== {} ==  time {}  mistakes {}  hints {}{}",
        level,
        format_clock(snapshot.elapsed_secs),
        snapshot.mistakes,
        snapshot.hints_remaining,
        if muted { "  (muted)" } else { "" }
    );
    if let Some(hint) = &snapshot.hint {
        let _ = writeln!(out, "{}", hint);
    }
    if snapshot.wrong {
        out.push_str("✗ ليست مجموعة!\n");
    }

    let mut number = 0;
    for word in puzzle.words().iter().filter(|w| !w.is_solved()) {
        number += 1;
        let selected = snapshot.selection.contains(word.id());
        let icon = if level.tier().reveals_categories() {
            puzzle
                .category(word.category_id())
                .map(|c| format!(" {}", c.icon()))
                .unwrap_or_default()
        } else {
            String::new()
        };
        let cell = if selected {
            format!("[{}{}]", word.text(), icon)
        } else {
            format!(" {}{} ", word.text(), icon)
        };
        let _ = write!(out, "{:>3}.{:<18}", number, cell);
        if number % 4 == 0 {
            out.push('\n');
        }
    }
    if number % 4 != 0 {
        out.push('\n');
    }

    for category in puzzle.categories() {
        let words: Vec<&str> = puzzle
            .words_in(category.id())
            .filter(|w| w.is_solved())
            .map(|w| w.text().as_str())
            .collect();
        if !words.is_empty() {
            let _ = writeln!(
                out,
                "  {} {} ({}): {}",
                category.icon(),
                category.title(),
                category.color(),
                words.join("، ")
            );
        }
    }
}

fn render_report(out: &mut String, report: &CompletionReport) {
    let _ = writeln!(out, "== {} complete ==", report.level());
    let _ = writeln!(
        out,
        "time {}  mistakes {}  hints {}",
        format_clock(*report.elapsed_secs()),
        report.mistakes(),
        report.hints_used()
    );
    let _ = writeln!(out, "{}", report.share_text());
    match report.next() {
        Some(next) => {
            let _ = writeln!(out, "Next: {} starts shortly.", next);
        }
        None => out.push_str("Campaign finished!\n"),
    }
}

/// Runs the interactive console until `q` or end of input.
#[instrument(skip_all)]
pub async fn run(
    mut driver: GameDriver,
    profiles: Option<ProfileService>,
    start: Option<LevelId>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(profiles) = &profiles {
        if driver.user().is_none() {
            println!("اسم المستخدم (Enter للتخطي):");
            let name = lines.next_line().await?.unwrap_or_default();
            let user = profiles.login(&name, &mut rand::thread_rng())?;
            println!("أهلاً {}", user.username());
            driver.set_user(Some(user));
        }
    }

    if let Some(level) = start {
        driver.dispatch(Intent::StartLevel(level));
    }
    redraw(&driver);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => apply(&mut driver, command),
                    None if line.trim().is_empty() => redraw(&driver),
                    None => println!("{}", help_text()),
                }
            }
            step = driver.step() => match step {
                Some(StepKind::Tick) => {}
                Some(StepKind::Update) => redraw(&driver),
                None => {
                    warn!("Event channel closed");
                    break;
                }
            },
        }
    }
    Ok(())
}

fn apply(driver: &mut GameDriver, command: Command) {
    debug!(?command, "Applying command");
    match command {
        Command::Toggle(n) => match word_at(&driver.snapshot(), n) {
            Some(id) => driver.dispatch(Intent::ToggleWord(id)),
            None => println!("No word {}", n),
        },
        Command::Hint => driver.dispatch(Intent::RequestHint),
        Command::Clear => driver.dispatch(Intent::ClearSelection),
        Command::Lobby => driver.dispatch(Intent::ReturnToLobby),
        Command::Start(level) => {
            let level = level.unwrap_or_else(|| default_level(driver.user()));
            driver.dispatch(Intent::StartLevel(level));
        }
        Command::Mute => {
            let muted = driver.toggle_mute();
            println!("{}", if muted { "Sound off" } else { "Sound on" });
            return;
        }
        Command::Share => {
            match driver.last_report() {
                Some(report) => println!("{}", report.share_text()),
                None => println!("Finish a level first."),
            }
            return;
        }
        Command::Levels => {
            print!("{}", render_levels(driver.user()));
            return;
        }
        Command::Help => {
            println!("{}", help_text());
            return;
        }
        Command::Quit => return,
    }
    redraw(driver);
}

fn default_level(user: Option<&UserProfile>) -> LevelId {
    user.and_then(|u| LevelId::new(*u.current_tier(), 1).ok())
        .unwrap_or_else(LevelId::first)
}

fn redraw(driver: &GameDriver) {
    print!(
        "{}",
        render(
            &driver.snapshot(),
            driver.user(),
            driver.is_muted(),
            driver.last_report()
        )
    );
}
