use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    BeatTrack, Difficulty, DifficultyParams, Grade, GradeTally, InputEvent, InputQueue,
    JudgmentDisplay, JudgmentTable, JudgmentView, MatchOutcome, Note, NoteArena, NoteGenerator,
    NoteMatcher, NoteView, PressState, RenderSnapshot, Result, ScoreState, SessionConfig,
    LANE_COUNT,
};

/// Why a session stopped processing ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Quit,
    EndOfTrack,
}

/// Numbers shown on the end screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub score: i64,
    pub max_combo: u32,
    pub tally: GradeTally,
    pub reason: EndReason,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Result of the input event consumed this tick, if the queue was not empty.
    pub outcome: Option<MatchOutcome>,
    /// Notes that scrolled past the hit window unpressed and counted as Miss.
    pub expired: usize,
    /// Held notes whose tail passed the judgment line.
    pub completed_holds: usize,
}

/// The game loop driver. Owns the notes, the input queue and the score for one
/// play-through and mutates them once per [`GameSession::tick`].
#[derive(Debug)]
pub struct GameSession {
    difficulty: Difficulty,
    params: DifficultyParams,
    audio_source: String,
    notes: NoteArena,
    matcher: NoteMatcher,
    queue: InputQueue,
    press: PressState,
    score: ScoreState,
    displays: Vec<JudgmentDisplay>,
    display_lifetime: f64,
    playback_time: f64,
    wall_time: f64,
    ended: Option<EndReason>,
}

impl GameSession {
    /// Validates `config` and generates the session's notes from `beats`.
    ///
    /// An empty beat track yields a session without notes.
    pub fn from_beats<R: Rng>(
        config: &SessionConfig,
        beats: &BeatTrack,
        rng: &mut R,
    ) -> Result<Self> {
        let difficulty = config.validate()?;
        if beats.is_empty() {
            tracing::warn!(source = ?beats.source, "no beats detected, starting with an empty chart");
        }
        let notes = NoteGenerator::default().generate(&beats.beats, difficulty, rng);
        Self::with_notes(config, notes)
    }

    /// Starts a session over an already generated chart.
    pub fn with_notes(config: &SessionConfig, notes: Vec<Note>) -> Result<Self> {
        let difficulty = config.validate()?;
        let notes = NoteArena::new(notes);
        tracing::info!(
            %difficulty,
            notes = notes.len(),
            audio = %config.audio_source,
            "session started"
        );

        Ok(Self {
            difficulty,
            params: difficulty.params(),
            audio_source: config.audio_source.clone(),
            notes,
            matcher: NoteMatcher::default(),
            queue: InputQueue::new(),
            press: PressState::default(),
            score: ScoreState::new(),
            displays: Vec::new(),
            display_lifetime: config.judgment_display_seconds,
            playback_time: 0.0,
            wall_time: 0.0,
            ended: None,
        })
    }

    /// Replaces the default timing windows.
    pub fn with_judgment_table(mut self, table: JudgmentTable) -> Self {
        self.matcher = NoteMatcher::new(table);
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn note_speed(&self) -> f64 {
        self.params.note_speed
    }

    pub fn audio_source(&self) -> &str {
        &self.audio_source
    }

    pub fn notes(&self) -> &NoteArena {
        &self.notes
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn pending_inputs(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.ended.is_none()
    }

    /// Playback time at which the last note ends.
    pub fn track_end(&self) -> f64 {
        self.notes.end_time()
    }

    pub fn all_resolved(&self) -> bool {
        self.notes.unresolved().next().is_none()
    }

    /// Key-down from the input collaborator, stamped with the playback
    /// position at which it happened.
    pub fn on_key_down(&mut self, lane: usize, timestamp: f64) {
        if !self.is_running() {
            return;
        }
        if lane >= LANE_COUNT {
            tracing::debug!(lane, "ignoring key-down on unknown lane");
            return;
        }
        self.press.press(lane);
        self.queue.push(InputEvent::new(timestamp, lane));
    }

    pub fn on_key_up(&mut self, lane: usize) {
        self.press.release(lane);
    }

    /// Runs one frame: consumes at most one queued input, expires notes that
    /// scrolled past the hit window and ages out judgment displays.
    pub fn tick(&mut self, playback_now: f64, wall_now: f64) -> TickReport {
        if !self.is_running() {
            return TickReport::default();
        }
        self.playback_time = playback_now;
        self.wall_time = wall_now;

        let outcome = self.queue.pop().map(|event| self.handle_input(event));
        let (expired, completed_holds) = self.expire_notes(playback_now);
        self.prune_displays();

        TickReport {
            outcome,
            expired,
            completed_holds,
        }
    }

    fn handle_input(&mut self, event: InputEvent) -> MatchOutcome {
        let outcome = self.matcher.resolve(&mut self.notes, event);
        match outcome {
            MatchOutcome::Tap {
                note,
                grade,
                offset,
            } => {
                tracing::debug!(?note, %grade, offset, track = event.track, "tap judged");
                self.show(grade, event.track);
                if grade == Grade::Miss {
                    self.score.miss();
                } else {
                    self.score.apply(grade);
                }
            }
            MatchOutcome::HoldStarted {
                note,
                grade,
                offset,
            } => {
                tracing::debug!(?note, %grade, offset, track = event.track, "hold started");
                self.show(grade, event.track);
            }
            MatchOutcome::HoldAbsorbed { note } => {
                tracing::trace!(?note, "press absorbed by held note");
            }
            MatchOutcome::OutOfRange { note, offset } => {
                tracing::trace!(?note, offset, "closest note not yet in range");
            }
            MatchOutcome::NoCandidate => {
                tracing::trace!(track = event.track, "no note on lane");
            }
        }
        outcome
    }

    fn show(&mut self, grade: Grade, track: usize) {
        self.displays.push(JudgmentDisplay {
            grade,
            shown_at: self.wall_time,
            track,
        });
    }

    /// Unpressed notes more than one hit window behind `now` become Misses.
    /// A note with a queued press inside its hit window is not pressed-late,
    /// only waiting its turn, and is left for the matcher.
    /// Held notes are resolved quietly once their tail has passed.
    fn expire_notes(&mut self, now: f64) -> (usize, usize) {
        let window = self.matcher.table().hit_window();
        let mut expired = 0;
        let mut completed = 0;

        for (id, note) in self.notes.iter_mut() {
            if note.hit {
                continue;
            }
            if note.hold {
                if now > note.end_time() {
                    note.hit = true;
                    note.hold = false;
                    completed += 1;
                    tracing::trace!(?id, "hold finished");
                }
            } else if now - note.time > window {
                let pending = self.queue.iter().any(|event| {
                    event.track == note.track && (event.timestamp - note.time).abs() <= window
                });
                if pending {
                    continue;
                }
                note.hit = true;
                expired += 1;
                self.score.miss();
                tracing::debug!(?id, track = note.track, "note missed");
            }
        }

        (expired, completed)
    }

    fn prune_displays(&mut self) {
        let now = self.wall_time;
        let lifetime = self.display_lifetime;
        self.displays
            .retain(|display| now - display.shown_at < lifetime);
    }

    /// State for the render pass of the current tick.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            playback_time: self.playback_time,
            note_speed: self.params.note_speed,
            notes: self
                .notes
                .unresolved()
                .map(|(id, note)| NoteView {
                    id,
                    time: note.time,
                    track: note.track,
                    duration: note.duration,
                    hold: note.hold,
                })
                .collect(),
            score: self.score.score(),
            combo: self.score.combo(),
            judgments: self
                .displays
                .iter()
                .map(|display| JudgmentView {
                    grade: display.grade,
                    age: self.wall_time - display.shown_at,
                    track: display.track,
                })
                .collect(),
            pressed: self.press.lanes(),
        }
    }

    /// Stops tick processing. Only the first call decides the end reason.
    pub fn end(&mut self, reason: EndReason) -> FinalResult {
        if self.ended.is_none() {
            self.ended = Some(reason);
            self.queue.clear();
            tracing::info!(
                ?reason,
                score = self.score.score(),
                max_combo = self.score.max_combo(),
                "session ended"
            );
        }
        self.result(self.ended.unwrap_or(reason))
    }

    pub fn final_result(&self) -> Option<FinalResult> {
        self.ended.map(|reason| self.result(reason))
    }

    fn result(&self, reason: EndReason) -> FinalResult {
        FinalResult {
            score: self.score.score(),
            max_combo: self.score.max_combo(),
            tally: *self.score.tally(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{BeatLaneError, NoteId};

    fn session(notes: Vec<Note>) -> GameSession {
        GameSession::with_notes(&SessionConfig::default(), notes).unwrap()
    }

    #[test]
    fn unknown_difficulty_never_starts() {
        let config = SessionConfig {
            difficulty: "Insane".to_string(),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = GameSession::from_beats(&config, &BeatTrack::new(vec![1.0]), &mut rng)
            .unwrap_err();
        assert!(matches!(err, BeatLaneError::Configuration(_)));
    }

    #[test]
    fn empty_beats_start_an_empty_session() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game =
            GameSession::from_beats(&SessionConfig::default(), &BeatTrack::default(), &mut rng)
                .unwrap();

        assert!(game.notes().is_empty());
        assert!(game.all_resolved());
        game.on_key_down(0, 0.5);
        let report = game.tick(0.5, 0.5);
        assert_eq!(report.outcome, Some(MatchOutcome::NoCandidate));
        assert_eq!(game.score().score(), 0);
    }

    #[test]
    fn consumes_one_input_per_tick_in_arrival_order() {
        let mut game = session(vec![Note::tap(1.0, 0), Note::tap(1.0, 1)]);
        game.on_key_down(1, 1.0);
        game.on_key_down(0, 1.0);

        let first = game.tick(1.0, 0.0);
        assert_eq!(first.outcome.and_then(|o| o.mutated()), Some(NoteId(1)));
        assert_eq!(game.pending_inputs(), 1);

        let second = game.tick(1.0, 0.0);
        assert_eq!(second.outcome.and_then(|o| o.mutated()), Some(NoteId(0)));
        assert_eq!(game.pending_inputs(), 0);
        assert_eq!(game.tick(1.0, 0.0).outcome, None);
        assert_eq!(game.score().combo(), 2);
    }

    #[test]
    fn unpressed_note_expires_as_miss() {
        let mut game = session(vec![Note::tap(1.0, 0), Note::tap(2.0, 0)]);
        game.on_key_down(0, 1.0);
        game.tick(1.0, 0.0);
        assert_eq!(game.score().combo(), 1);

        assert_eq!(game.tick(2.2, 0.1).expired, 0);
        let report = game.tick(2.4, 0.2);

        assert_eq!(report.expired, 1);
        assert!(game.notes().get(NoteId(1)).unwrap().hit);
        assert_eq!(game.score().combo(), 0);
        assert_eq!(game.score().score(), 300);
        assert_eq!(game.score().max_combo(), 1);
    }

    #[test]
    fn late_chord_is_judged_before_any_note_expires() {
        let mut game = session((0..4).map(|lane| Note::tap(1.0, lane)).collect());
        for lane in 0..4 {
            game.on_key_down(lane, 1.28);
        }

        let mut outcomes = Vec::new();
        let mut expired = 0;
        for frame in 0..6 {
            let now = 1.28 + frame as f64 / 60.0;
            let report = game.tick(now, now);
            outcomes.extend(report.outcome);
            expired += report.expired;
        }

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.grade() == Some(Grade::Bad)));
        assert_eq!(expired, 0);
        assert_eq!(game.score().tally().bad, 4);
        assert_eq!(game.score().tally().miss, 0);
        assert!(game.all_resolved());
    }

    #[test]
    fn queued_press_far_from_the_note_does_not_delay_expiry() {
        let mut game = session(vec![Note::tap(1.0, 0), Note::tap(1.0, 1)]);
        game.on_key_down(1, 1.35);
        game.on_key_down(0, 1.9);

        let report = game.tick(1.35, 0.0);

        assert!(matches!(report.outcome, Some(MatchOutcome::OutOfRange { .. })));
        assert_eq!(report.expired, 2);
        assert_eq!(game.pending_inputs(), 1);
    }

    #[test]
    fn held_note_finishes_without_breaking_combo() {
        let mut game = session(vec![Note::tap(0.5, 1), Note::new(1.0, 1, 1.0)]);
        game.on_key_down(1, 0.5);
        game.tick(0.5, 0.0);
        game.on_key_down(1, 1.02);
        let started = game.tick(1.02, 0.5).outcome.unwrap();
        assert!(matches!(started, MatchOutcome::HoldStarted { .. }));

        assert_eq!(game.tick(1.9, 1.4).completed_holds, 0);
        let report = game.tick(2.1, 1.6);

        assert_eq!(report.completed_holds, 1);
        assert_eq!(report.expired, 0);
        let note = game.notes().get(NoteId(1)).unwrap();
        assert!(note.hit && !note.hold);
        assert_eq!(game.score().combo(), 1);
        assert_eq!(game.score().score(), 300);
    }

    #[test]
    fn unpressed_hold_note_is_a_miss() {
        let mut game = session(vec![Note::new(1.0, 3, 1.0)]);
        let report = game.tick(1.5, 0.0);
        assert_eq!(report.expired, 1);
        assert_eq!(game.score().tally().miss, 1);
    }

    #[test]
    fn judgment_displays_age_on_the_wall_clock() {
        let mut game = session(vec![Note::tap(1.0, 2)]);
        game.on_key_down(2, 1.0);
        game.tick(1.0, 10.0);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.judgments.len(), 1);
        assert_eq!(snapshot.judgments[0].grade, Grade::Perfect);
        assert_eq!(snapshot.judgments[0].age, 0.0);
        assert_eq!(snapshot.judgments[0].track, 2);

        // playback barely moved; only wall time decides the display lifetime
        game.tick(1.01, 10.5);
        assert_eq!(game.snapshot().judgments[0].age, 0.5);
        game.tick(1.02, 11.0);
        assert!(game.snapshot().judgments.is_empty());
    }

    #[test]
    fn snapshot_lists_unresolved_notes_and_press_state() {
        let mut game = session(vec![Note::tap(1.0, 0), Note::new(3.0, 1, 0.5)]);
        game.on_key_down(0, 1.0);
        game.tick(1.0, 0.0);
        game.on_key_down(3, 1.1);
        game.on_key_up(3);
        game.on_key_down(9, 1.1);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.notes.len(), 1);
        assert_eq!(snapshot.notes[0].id, NoteId(1));
        assert_eq!(snapshot.notes[0].duration, 0.5);
        assert_eq!(snapshot.pressed, [true, false, false, false]);
        assert_eq!(snapshot.note_speed, 300.0);
        assert_eq!(snapshot.score, 300);
        assert_eq!(game.pending_inputs(), 1);
    }

    #[test]
    fn ending_stops_ticks_and_keeps_first_reason() {
        let mut game = session(vec![Note::tap(1.0, 0), Note::tap(2.0, 0)]);
        game.on_key_down(0, 1.0);
        game.tick(1.0, 0.0);

        let result = game.end(EndReason::Quit);
        assert_eq!(result.score, 300);
        assert_eq!(result.max_combo, 1);
        assert_eq!(result.reason, EndReason::Quit);
        assert!(!game.is_running());

        game.on_key_down(0, 2.0);
        assert_eq!(game.tick(5.0, 1.0), TickReport::default());
        assert!(!game.notes().get(NoteId(1)).unwrap().hit);
        assert_eq!(game.end(EndReason::EndOfTrack).reason, EndReason::Quit);
    }

    #[test]
    fn custom_judgment_table_narrows_the_hit_window() {
        let table = JudgmentTable::new([0.01, 0.02, 0.04, 0.08]).unwrap();
        let mut game = session(vec![Note::tap(1.0, 0)]).with_judgment_table(table);

        game.on_key_down(0, 1.1);
        let report = game.tick(1.1, 0.0);
        assert!(matches!(report.outcome, Some(MatchOutcome::OutOfRange { .. })));
        assert_eq!(report.expired, 1);
    }
}
