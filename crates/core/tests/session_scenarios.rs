use beatlane_core::{
    BeatTrack, Difficulty, EndReason, GameSession, GenerationRules, Grade, MatchOutcome,
    Note, NoteGenerator, NoteId, SessionConfig,
};
use rand::{rngs::StdRng, SeedableRng};

/// Two beats on lane 0, no hold notes, no supplementary notes.
fn two_beat_session() -> GameSession {
    let rules = GenerationRules {
        lane_count: 1,
        hold_probability: 0.0,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(11);
    let notes: Vec<Note> = NoteGenerator::new(rules)
        .unwrap()
        .generate(&[1.0, 2.0], Difficulty::Easy, &mut rng)
        .into_iter()
        .take(2)
        .collect();

    GameSession::with_notes(&SessionConfig::default(), notes).unwrap()
}

#[test]
fn perfect_then_great_accumulates_score_and_combo() {
    let mut game = two_beat_session();

    game.on_key_down(0, 1.0);
    let first = game.tick(1.0, 0.0).outcome.unwrap();
    assert_eq!(first.grade(), Some(Grade::Perfect));
    assert_eq!(game.score().score(), 300);
    assert_eq!(game.score().combo(), 1);

    game.on_key_down(0, 2.08);
    let second = game.tick(2.08, 1.0).outcome.unwrap();
    assert_eq!(second.grade(), Some(Grade::Great));
    assert_eq!(game.score().score(), 500);
    assert_eq!(game.score().combo(), 2);
    assert_eq!(game.score().max_combo(), 2);
}

#[test]
fn press_outside_the_bad_window_is_discarded() {
    let mut game = two_beat_session();

    game.on_key_down(0, 1.35);
    let outcome = game.tick(1.0, 0.0).outcome.unwrap();

    assert!(matches!(outcome, MatchOutcome::OutOfRange { note: NoteId(0), .. }));
    assert!(!game.notes().get(NoteId(0)).unwrap().hit);
    assert_eq!(game.score().score(), 0);
}

#[test]
fn hold_onset_then_repeated_press_is_absorbed() {
    let mut game =
        GameSession::with_notes(&SessionConfig::default(), vec![Note::new(1.0, 1, 1.0)]).unwrap();

    game.on_key_down(1, 1.02);
    game.on_key_down(1, 1.2);
    let onset = game.tick(1.02, 0.0).outcome.unwrap();
    let repeat = game.tick(1.2, 0.1).outcome.unwrap();

    assert_eq!(onset.grade(), Some(Grade::Perfect));
    assert_eq!(repeat, MatchOutcome::HoldAbsorbed { note: NoteId(0) });
    let note = game.notes().get(NoteId(0)).unwrap();
    assert!(note.hold);
    assert!(!note.hit);
    assert_eq!(game.score().score(), 0);
}

#[test]
fn scrolled_off_note_breaks_combo_without_scoring() {
    let mut game = two_beat_session();
    game.on_key_down(0, 1.0);
    game.tick(1.0, 0.0);

    let report = game.tick(2.5, 1.5);

    assert_eq!(report.expired, 1);
    assert!(game.notes().get(NoteId(1)).unwrap().hit);
    assert_eq!(game.score().combo(), 0);
    assert_eq!(game.score().score(), 300);
    assert_eq!(game.score().max_combo(), 1);
}

#[test]
fn seeded_session_plays_through_to_end_of_track() {
    let config = SessionConfig {
        difficulty: "Hard".to_string(),
        seed: Some(3),
        ..Default::default()
    };
    let beats = BeatTrack::new((1..=16).map(|i| i as f64 * 0.5).collect());
    let mut rng = StdRng::seed_from_u64(3);
    let mut game = GameSession::from_beats(&config, &beats, &mut rng).unwrap();
    assert_eq!(game.notes().len(), 64);

    let frame = config.frame_seconds();
    let mut now = 0.0;
    let mut scored = Vec::new();
    while now < game.track_end() + 1.0 {
        let due: Vec<(usize, f64)> = game
            .notes()
            .unresolved()
            .filter(|(_, note)| !note.hold && note.time > now - frame && note.time <= now)
            .map(|(_, note)| (note.track, note.time))
            .collect();
        for (track, time) in due {
            game.on_key_down(track, time);
        }

        let before = game.score().score();
        let report = game.tick(now, now);
        if let Some(MatchOutcome::Tap { grade, .. }) = report.outcome {
            scored.push((grade, game.score().score() - before));
        }
        now += frame;
    }

    let result = game.end(EndReason::EndOfTrack);
    assert!(game.all_resolved());
    assert_eq!(result.reason, EndReason::EndOfTrack);
    assert_eq!(result.score, game.score().history().iter().sum::<i64>());
    for (grade, delta) in scored {
        assert_eq!(Some(delta), grade.points());
    }
    assert!(result.max_combo >= 1);
}
