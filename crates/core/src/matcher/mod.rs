use crate::{Grade, InputEvent, JudgmentTable, NoteArena, NoteId};

/// What a single input event did to the note set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// No unresolved note on the pressed lane.
    NoCandidate,
    /// The closest note is outside the hit window and was left untouched.
    OutOfRange { note: NoteId, offset: f64 },
    /// A tap note was resolved.
    Tap {
        note: NoteId,
        grade: Grade,
        offset: f64,
    },
    /// The onset of a hold note was judged and the note is now being held.
    HoldStarted {
        note: NoteId,
        grade: Grade,
        offset: f64,
    },
    /// The closest note is a hold already being held; nothing changed.
    HoldAbsorbed { note: NoteId },
}

impl MatchOutcome {
    /// Grade to show on screen, if the event was judged.
    pub fn grade(&self) -> Option<Grade> {
        match self {
            MatchOutcome::Tap { grade, .. } | MatchOutcome::HoldStarted { grade, .. } => {
                Some(*grade)
            }
            _ => None,
        }
    }

    /// Note mutated by the event, if any.
    pub fn mutated(&self) -> Option<NoteId> {
        match self {
            MatchOutcome::Tap { note, .. } | MatchOutcome::HoldStarted { note, .. } => Some(*note),
            _ => None,
        }
    }
}

/// Resolves input events against a [`NoteArena`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteMatcher {
    table: JudgmentTable,
}

impl NoteMatcher {
    pub fn new(table: JudgmentTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &JudgmentTable {
        &self.table
    }

    /// Unresolved note on `track` closest in time to `time`, with its signed
    /// offset (`time - note.time`). Ties go to the earliest created note.
    pub fn closest(&self, notes: &NoteArena, track: usize, time: f64) -> Option<(NoteId, f64)> {
        let mut best: Option<(NoteId, f64)> = None;
        for &id in notes.lane(track) {
            let Some(note) = notes.get(id) else {
                continue;
            };
            if note.hit {
                continue;
            }
            let offset = time - note.time;
            if best.map_or(true, |(_, current)| offset.abs() < current.abs()) {
                best = Some((id, offset));
            }
        }
        best
    }

    /// Matches one event. At most one note is mutated.
    pub fn resolve(&self, notes: &mut NoteArena, event: InputEvent) -> MatchOutcome {
        let Some((id, offset)) = self.closest(notes, event.track, event.timestamp) else {
            return MatchOutcome::NoCandidate;
        };
        if offset.abs() > self.table.hit_window() {
            return MatchOutcome::OutOfRange { note: id, offset };
        }
        let Some(note) = notes.get_mut(id) else {
            return MatchOutcome::NoCandidate;
        };

        if !note.is_hold() {
            let grade = if note.hit {
                Grade::Miss
            } else {
                self.table.judge(offset)
            };
            note.hit = true;
            return MatchOutcome::Tap {
                note: id,
                grade,
                offset,
            };
        }

        if note.hold {
            return MatchOutcome::HoldAbsorbed { note: id };
        }

        let grade = self.table.judge(offset);
        if grade != Grade::Miss {
            note.hold = true;
        }
        MatchOutcome::HoldStarted {
            note: id,
            grade,
            offset,
        }
    }
}
