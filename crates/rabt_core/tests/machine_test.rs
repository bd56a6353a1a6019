//! Tests for the session state machine.

use rabt_core::{
    Category, CategoryId, Cue, Effect, Event, GameMachine, Intent, LevelId, MAX_HINTS, Phase,
    Puzzle, Tier, TimerKind, TimerToken, Word, WordId,
};

fn level(tier: Tier, index: u8) -> LevelId {
    LevelId::new(tier, index).expect("valid level")
}

/// Builds a valid puzzle with categories `c0..cN` and words `cK-0..cK-3`,
/// interleaved so no category sits in a contiguous block.
fn fixture(level: LevelId) -> Puzzle {
    let n = level.category_count();
    let categories = (0..n)
        .map(|c| {
            Category::new(
                CategoryId::new(format!("c{c}")),
                format!("Title {c}"),
                "⭐".to_string(),
                "#FF5733".to_string(),
                format!("Description {c}"),
            )
        })
        .collect();
    let mut words = Vec::new();
    for i in 0..4 {
        for c in 0..n {
            words.push(Word::new(
                WordId::new(format!("c{c}-{i}")),
                format!("word {c}/{i}"),
                CategoryId::new(format!("c{c}")),
            ));
        }
    }
    Puzzle::new(level, categories, words).expect("fixture is valid")
}

fn group(c: usize) -> Vec<WordId> {
    (0..4).map(|i| WordId::new(format!("c{c}-{i}"))).collect()
}

fn fetch_token(effects: &[Effect]) -> TimerToken {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::FetchPuzzle { token, .. } => Some(*token),
            _ => None,
        })
        .expect("fetch effect")
}

fn scheduled(effects: &[Effect], wanted: TimerKind) -> Option<TimerToken> {
    effects.iter().find_map(|e| match e {
        Effect::Schedule { token, kind, .. } if *kind == wanted => Some(*token),
        _ => None,
    })
}

fn ticker(effects: &[Effect]) -> Option<TimerToken> {
    effects.iter().find_map(|e| match e {
        Effect::StartTicker { token, .. } => Some(*token),
        _ => None,
    })
}

fn cancelled(effects: &[Effect], token: TimerToken) -> bool {
    effects.contains(&Effect::Cancel(token))
}

/// Starts `level` and installs its fixture, returning the machine and ticker token.
fn playing(level: LevelId) -> (GameMachine, TimerToken) {
    let mut machine = GameMachine::seeded(42);
    let effects = machine.dispatch(Intent::StartLevel(level));
    let token = fetch_token(&effects);
    let effects = machine.handle(Event::PuzzleLoaded {
        token,
        puzzle: fixture(level),
    });
    let tick = ticker(&effects).expect("ticker started");
    assert_eq!(machine.phase(), Phase::Playing);
    (machine, tick)
}

fn select(machine: &mut GameMachine, ids: &[WordId]) -> Vec<Effect> {
    ids.iter()
        .flat_map(|id| machine.dispatch(Intent::ToggleWord(id.clone())))
        .collect()
}

/// Selects category `c` and fires its match resolution.
fn solve(machine: &mut GameMachine, c: usize) -> Vec<Effect> {
    let effects = select(machine, &group(c));
    let token = scheduled(&effects, TimerKind::MatchResolve).expect("match scheduled");
    machine.handle(Event::TimerFired(token))
}

#[test]
fn test_start_level_moves_to_loading() {
    let mut machine = GameMachine::seeded(1);
    let effects = machine.dispatch(Intent::StartLevel(LevelId::first()));
    assert_eq!(machine.phase(), Phase::Loading);
    assert_eq!(machine.level(), Some(LevelId::first()));
    assert!(matches!(
        effects.as_slice(),
        [Effect::FetchPuzzle { level, .. }] if *level == LevelId::first()
    ));
}

#[test]
fn test_correct_group_in_any_order_is_solved() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    assert_eq!(machine.puzzle().map(|p| p.words().len()), Some(16));

    let mut ids = group(2);
    ids.reverse();
    let effects = select(&mut machine, &ids);
    assert_eq!(machine.mistakes(), 0);
    let token = scheduled(&effects, TimerKind::MatchResolve).expect("match scheduled");

    // Nothing is solved until the delay elapses.
    let puzzle = machine.puzzle().expect("puzzle");
    assert_eq!(puzzle.solved_count(), 0);

    let effects = machine.handle(Event::TimerFired(token));
    assert!(effects.contains(&Effect::Play(Cue::Correct)));
    let puzzle = machine.puzzle().expect("puzzle");
    for id in group(2) {
        assert!(puzzle.word(&id).expect("word").is_solved());
    }
    assert_eq!(puzzle.solved_count(), 4);
    assert!(machine.selection().is_empty());
    assert_eq!(machine.mistakes(), 0);
    assert_eq!(machine.phase(), Phase::Playing);
}

#[test]
fn test_mixed_group_is_a_mistake() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let mut ids: Vec<WordId> = group(0).into_iter().take(3).collect();
    ids.push(WordId::new("c1-0"));

    let effects = select(&mut machine, &ids);
    assert_eq!(machine.mistakes(), 1);
    assert!(machine.is_wrong());
    assert!(effects.contains(&Effect::Play(Cue::Wrong)));
    assert_eq!(machine.selection().len(), 4);

    let token = scheduled(&effects, TimerKind::MismatchReset).expect("reset scheduled");
    machine.handle(Event::TimerFired(token));
    assert!(machine.selection().is_empty());
    assert!(!machine.is_wrong());
    assert_eq!(machine.mistakes(), 1);
    assert_eq!(machine.puzzle().map(|p| p.solved_count()), Some(0));
}

#[test]
fn test_mistakes_count_each_mismatch_once() {
    let (mut machine, _) = playing(level(Tier::Intermediate, 2));
    let mixed = [
        WordId::new("c0-0"),
        WordId::new("c1-0"),
        WordId::new("c2-0"),
        WordId::new("c3-0"),
    ];
    for expected in 1..=3 {
        let effects = select(&mut machine, &mixed);
        assert_eq!(machine.mistakes(), expected);
        let token = scheduled(&effects, TimerKind::MismatchReset).expect("reset scheduled");
        machine.handle(Event::TimerFired(token));
    }
    solve(&mut machine, 4);
    assert_eq!(machine.mistakes(), 3);
}

#[test]
fn test_selection_is_capped_and_toggles() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let a = WordId::new("c0-0");
    machine.dispatch(Intent::ToggleWord(a.clone()));
    assert!(machine.is_selected(&a));
    machine.dispatch(Intent::ToggleWord(a.clone()));
    assert!(machine.selection().is_empty());

    let ids = [
        WordId::new("c0-0"),
        WordId::new("c1-0"),
        WordId::new("c2-0"),
        WordId::new("c3-0"),
        WordId::new("c0-1"),
    ];
    select(&mut machine, &ids);
    assert_eq!(machine.selection().len(), 4);
    assert!(!machine.is_selected(&WordId::new("c0-1")));
}

#[test]
fn test_solved_and_unknown_words_cannot_be_selected() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    solve(&mut machine, 0);
    assert!(machine.dispatch(Intent::ToggleWord(WordId::new("c0-0"))).is_empty());
    assert!(machine.dispatch(Intent::ToggleWord(WordId::new("nope"))).is_empty());
    assert!(machine.selection().is_empty());
}

#[test]
fn test_toggles_locked_while_group_resolves() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    select(&mut machine, &group(1));
    assert!(machine.is_resolving());
    assert!(machine.dispatch(Intent::ToggleWord(WordId::new("c1-0"))).is_empty());
    assert_eq!(machine.selection().len(), 4);
}

#[test]
fn test_clear_while_match_pending_still_solves_group() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let effects = select(&mut machine, &group(1));
    let token = scheduled(&effects, TimerKind::MatchResolve).expect("match scheduled");

    machine.dispatch(Intent::ClearSelection);
    assert!(machine.selection().is_empty());
    assert!(machine.is_resolving());

    let effects = machine.handle(Event::TimerFired(token));
    assert!(effects.contains(&Effect::Play(Cue::Correct)));
    let puzzle = machine.puzzle().expect("puzzle");
    for id in group(1) {
        assert!(puzzle.word(&id).expect("word").is_solved());
    }
    assert_eq!(puzzle.solved_count(), 4);
}

#[test]
fn test_clear_while_mismatch_pending_keeps_reset() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let mut ids: Vec<WordId> = group(0).into_iter().take(3).collect();
    ids.push(WordId::new("c1-0"));
    let effects = select(&mut machine, &ids);
    let token = scheduled(&effects, TimerKind::MismatchReset).expect("reset scheduled");

    machine.dispatch(Intent::ClearSelection);
    assert!(machine.selection().is_empty());
    assert!(machine.is_wrong());

    machine.handle(Event::TimerFired(token));
    assert!(!machine.is_wrong());
    assert!(!machine.is_resolving());
    assert_eq!(machine.mistakes(), 1);
}

#[test]
fn test_clear_selection() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    select(&mut machine, &group(0)[..2]);
    machine.dispatch(Intent::ClearSelection);
    assert!(machine.selection().is_empty());
    assert!(machine.dispatch(Intent::ClearSelection).is_empty());
}

#[test]
fn test_intents_ignored_while_loading() {
    let mut machine = GameMachine::seeded(3);
    machine.dispatch(Intent::StartLevel(LevelId::first()));
    assert!(machine.dispatch(Intent::ToggleWord(WordId::new("c0-0"))).is_empty());
    assert!(machine.dispatch(Intent::RequestHint).is_empty());
    assert!(machine.dispatch(Intent::ClearSelection).is_empty());
    assert_eq!(machine.hints_used(), 0);
    assert_eq!(machine.phase(), Phase::Loading);
}

#[test]
fn test_hint_reveals_unsolved_category_and_expires() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    solve(&mut machine, 0);
    let effects = machine.dispatch(Intent::RequestHint);
    let hint = machine.hint().expect("hint active");
    assert_ne!(hint.category().as_str(), "c0");
    assert!(hint.text().starts_with("تلميح: Title "));
    assert_eq!(machine.hints_remaining(), MAX_HINTS - 1);

    // A second request while one is active is ignored.
    assert!(machine.dispatch(Intent::RequestHint).is_empty());
    assert_eq!(machine.hints_used(), 1);

    let token = scheduled(&effects, TimerKind::HintExpiry).expect("expiry scheduled");
    machine.handle(Event::TimerFired(token));
    assert!(machine.hint().is_none());
}

#[test]
fn test_hint_count_never_exceeds_three() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    for _ in 0..MAX_HINTS {
        let effects = machine.dispatch(Intent::RequestHint);
        let token = scheduled(&effects, TimerKind::HintExpiry).expect("expiry scheduled");
        machine.handle(Event::TimerFired(token));
    }
    assert_eq!(machine.hints_used(), MAX_HINTS);
    let before = machine.snapshot();
    assert!(machine.dispatch(Intent::RequestHint).is_empty());
    assert_eq!(machine.snapshot(), before);
}

#[test]
fn test_hint_choice_is_deterministic_for_a_seed() {
    let pick = || {
        let (mut machine, _) = playing(level(Tier::Expert, 3));
        machine.dispatch(Intent::RequestHint);
        machine.hint().map(|h| h.category().clone())
    };
    assert_eq!(pick(), pick());
}

#[test]
fn test_match_clears_active_hint() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let effects = machine.dispatch(Intent::RequestHint);
    let expiry = scheduled(&effects, TimerKind::HintExpiry).expect("expiry scheduled");
    let effects = solve(&mut machine, 3);
    assert!(machine.hint().is_none());
    assert!(cancelled(&effects, expiry));
}

#[test]
fn test_ticker_counts_only_while_playing() {
    let (mut machine, tick) = playing(level(Tier::Beginner, 1));
    for _ in 0..5 {
        machine.handle(Event::TimerFired(tick));
    }
    assert_eq!(machine.elapsed_secs(), 5);

    for c in 0..3 {
        solve(&mut machine, c);
    }
    let effects = solve(&mut machine, 3);
    assert_eq!(machine.phase(), Phase::Completed);
    assert!(cancelled(&effects, tick));

    machine.handle(Event::TimerFired(tick));
    machine.handle(Event::TimerFired(tick));
    assert_eq!(machine.elapsed_secs(), 5);
}

#[test]
fn test_completion_reports_and_schedules_next_level() {
    let (mut machine, tick) = playing(level(Tier::Beginner, 3));
    machine.handle(Event::TimerFired(tick));
    let mut effects = Vec::new();
    for c in 0..6 {
        effects = solve(&mut machine, c);
    }
    assert_eq!(machine.phase(), Phase::Completed);
    assert!(effects.contains(&Effect::Play(Cue::Win)));

    let report = effects
        .iter()
        .find_map(|e| match e {
            Effect::LevelCompleted(report) => Some(*report),
            _ => None,
        })
        .expect("completion reported");
    assert_eq!(*report.elapsed_secs(), 1);
    assert_eq!(*report.next(), Some(level(Tier::Intermediate, 1)));

    let advance = scheduled(&effects, TimerKind::AutoAdvance).expect("auto-advance scheduled");
    let effects = machine.handle(Event::TimerFired(advance));
    assert_eq!(machine.phase(), Phase::Loading);
    assert_eq!(machine.level(), Some(level(Tier::Intermediate, 1)));
    assert_eq!(machine.elapsed_secs(), 0);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::FetchPuzzle { level: l, .. } if *l == level(Tier::Intermediate, 1))));
}

#[test]
fn test_final_level_does_not_auto_advance() {
    let (mut machine, _) = playing(level(Tier::Expert, 3));
    let mut effects = Vec::new();
    for c in 0..6 {
        effects = solve(&mut machine, c);
    }
    assert_eq!(machine.phase(), Phase::Completed);
    assert_eq!(scheduled(&effects, TimerKind::AutoAdvance), None);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::LevelCompleted(report) if report.is_campaign_finished()
    )));
    assert!(machine.timers().is_empty());
}

#[test]
fn test_return_to_lobby_cancels_pending_auto_advance() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let mut effects = Vec::new();
    for c in 0..4 {
        effects = solve(&mut machine, c);
    }
    let advance = scheduled(&effects, TimerKind::AutoAdvance).expect("auto-advance scheduled");

    let effects = machine.dispatch(Intent::ReturnToLobby);
    assert!(cancelled(&effects, advance));
    assert_eq!(machine.phase(), Phase::Lobby);

    assert!(machine.handle(Event::TimerFired(advance)).is_empty());
    assert_eq!(machine.phase(), Phase::Lobby);
    assert!(machine.level().is_none());
}

#[test]
fn test_return_to_lobby_twice_is_harmless() {
    let (mut machine, tick) = playing(level(Tier::Beginner, 2));
    machine.dispatch(Intent::RequestHint);
    let first = machine.dispatch(Intent::ReturnToLobby);
    assert!(cancelled(&first, tick));
    let second = machine.dispatch(Intent::ReturnToLobby);
    assert!(second.is_empty());
    assert_eq!(machine.phase(), Phase::Lobby);
    assert!(machine.puzzle().is_none());
    assert!(machine.timers().is_empty());
}

#[test]
fn test_stale_hint_expiry_does_not_touch_new_level() {
    let (mut machine, _) = playing(level(Tier::Beginner, 1));
    let effects = machine.dispatch(Intent::RequestHint);
    let old_expiry = scheduled(&effects, TimerKind::HintExpiry).expect("expiry scheduled");

    let next = level(Tier::Beginner, 2);
    let effects = machine.dispatch(Intent::StartLevel(next));
    assert!(cancelled(&effects, old_expiry));
    machine.handle(Event::PuzzleLoaded {
        token: fetch_token(&effects),
        puzzle: fixture(next),
    });
    machine.dispatch(Intent::RequestHint);
    assert!(machine.hint().is_some());

    machine.handle(Event::TimerFired(old_expiry));
    assert!(machine.hint().is_some());
    assert_eq!(machine.hints_used(), 1);
}

#[test]
fn test_fetch_failure_falls_back_to_lobby() {
    let mut machine = GameMachine::seeded(9);
    let effects = machine.dispatch(Intent::StartLevel(LevelId::first()));
    machine.handle(Event::PuzzleFailed {
        token: fetch_token(&effects),
        message: "service unavailable".to_string(),
    });
    assert_eq!(machine.phase(), Phase::Lobby);
    assert!(machine.puzzle().is_none());
    assert!(machine.level().is_none());
}

#[test]
fn test_superseded_fetch_is_ignored() {
    let mut machine = GameMachine::seeded(9);
    let first = fetch_token(&machine.dispatch(Intent::StartLevel(LevelId::first())));
    let second_level = level(Tier::Expert, 1);
    let second = fetch_token(&machine.dispatch(Intent::StartLevel(second_level)));

    machine.handle(Event::PuzzleLoaded {
        token: first,
        puzzle: fixture(LevelId::first()),
    });
    assert_eq!(machine.phase(), Phase::Loading);

    machine.handle(Event::PuzzleFailed {
        token: first,
        message: "late".to_string(),
    });
    assert_eq!(machine.phase(), Phase::Loading);

    machine.handle(Event::PuzzleLoaded {
        token: second,
        puzzle: fixture(second_level),
    });
    assert_eq!(machine.phase(), Phase::Playing);
    assert_eq!(machine.puzzle().map(|p| p.level()), Some(second_level));
}

#[test]
fn test_puzzle_for_wrong_level_is_rejected() {
    let mut machine = GameMachine::seeded(5);
    let token = fetch_token(&machine.dispatch(Intent::StartLevel(LevelId::first())));
    machine.handle(Event::PuzzleLoaded {
        token,
        puzzle: fixture(level(Tier::Expert, 1)),
    });
    assert_eq!(machine.phase(), Phase::Lobby);
    assert!(machine.puzzle().is_none());
}

#[test]
fn test_start_level_resets_counters() {
    let (mut machine, tick) = playing(level(Tier::Beginner, 1));
    machine.handle(Event::TimerFired(tick));
    select(
        &mut machine,
        &[
            WordId::new("c0-0"),
            WordId::new("c1-0"),
            WordId::new("c2-0"),
            WordId::new("c3-0"),
        ],
    );
    machine.dispatch(Intent::RequestHint);

    machine.dispatch(Intent::StartLevel(LevelId::first()));
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.phase, Phase::Loading);
    assert_eq!(snapshot.mistakes, 0);
    assert_eq!(snapshot.elapsed_secs, 0);
    assert!(snapshot.selection.is_empty());
    assert!(snapshot.hint.is_none());
    assert_eq!(snapshot.hints_used, 0);
    assert!(!snapshot.wrong);
    assert!(snapshot.puzzle.is_none());
}
