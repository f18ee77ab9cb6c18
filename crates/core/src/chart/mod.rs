use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{BeatLaneError, Difficulty, Result};

/// Number of input lanes.
pub const LANE_COUNT: usize = 4;

/// A single note. `time`, `track` and `duration` never change once the note
/// is generated; `hit` and `hold` are driven by the matcher and the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub time: f64,
    pub track: usize,
    /// Zero for tap notes, positive for hold notes.
    pub duration: f64,
    #[serde(default)]
    pub hit: bool,
    #[serde(default)]
    pub hold: bool,
}

impl Note {
    pub fn tap(time: f64, track: usize) -> Self {
        Self::new(time, track, 0.0)
    }

    pub fn new(time: f64, track: usize, duration: f64) -> Self {
        Self {
            time,
            track,
            duration,
            hit: false,
            hold: false,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.duration > 0.0
    }

    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }
}

/// Stable index of a note inside a [`NoteArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(pub usize);

/// Owns every note of a session. Notes are never removed, so a [`NoteId`]
/// stays valid for the whole session.
///
/// A per-lane bucket of ids (in creation order) lets the matcher scan one lane
/// without touching the others.
#[derive(Debug, Clone, Default)]
pub struct NoteArena {
    notes: Vec<Note>,
    lanes: Vec<Vec<NoteId>>,
}

impl NoteArena {
    pub fn new(notes: Vec<Note>) -> Self {
        let lane_count = notes
            .iter()
            .map(|note| note.track + 1)
            .max()
            .unwrap_or(0)
            .max(LANE_COUNT);
        let mut lanes = vec![Vec::new(); lane_count];
        for (index, note) in notes.iter().enumerate() {
            lanes[note.track].push(NoteId(index));
        }
        Self { notes, lanes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.get_mut(id.0)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Ids of every note on `track`, in creation order.
    pub fn lane(&self, track: usize) -> &[NoteId] {
        self.lanes.get(track).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &Note)> {
        self.notes
            .iter()
            .enumerate()
            .map(|(index, note)| (NoteId(index), note))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NoteId, &mut Note)> {
        self.notes
            .iter_mut()
            .enumerate()
            .map(|(index, note)| (NoteId(index), note))
    }

    pub fn unresolved(&self) -> impl Iterator<Item = (NoteId, &Note)> {
        self.iter().filter(|(_, note)| !note.hit)
    }

    /// Time at which the last note ends, or zero for an empty chart.
    pub fn end_time(&self) -> f64 {
        self.notes
            .iter()
            .map(Note::end_time)
            .fold(0.0, f64::max)
    }
}

/// Knobs for turning beats into notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRules {
    pub lane_count: usize,
    pub hold_probability: f64,
    pub hold_duration: RangeInclusive<f64>,
    pub extra_offset: RangeInclusive<f64>,
}

impl Default for GenerationRules {
    fn default() -> Self {
        Self {
            lane_count: LANE_COUNT,
            hold_probability: 0.3,
            hold_duration: 0.5..=1.5,
            extra_offset: 0.1..=0.5,
        }
    }
}

impl GenerationRules {
    pub fn validate(&self) -> Result<()> {
        if self.lane_count == 0 || self.lane_count > LANE_COUNT {
            return Err(BeatLaneError::config(format!(
                "lane count must lie in 1..={LANE_COUNT}, got {}",
                self.lane_count
            )));
        }
        if !(0.0..=1.0).contains(&self.hold_probability) {
            return Err(BeatLaneError::config(format!(
                "hold probability must lie in [0, 1], got {}",
                self.hold_probability
            )));
        }
        check_range("hold duration", &self.hold_duration, true)?;
        check_range("extra note offset", &self.extra_offset, false)
    }
}

fn check_range(name: &str, range: &RangeInclusive<f64>, positive: bool) -> Result<()> {
    let (start, end) = (*range.start(), *range.end());
    let lower_ok = if positive { start > 0.0 } else { start >= 0.0 };
    if start.is_finite() && end.is_finite() && lower_ok && start <= end {
        Ok(())
    } else {
        Err(BeatLaneError::config(format!(
            "invalid {name} range {start}..={end}"
        )))
    }
}

/// Builds a session's notes from beat timestamps.
#[derive(Debug, Clone, Default)]
pub struct NoteGenerator {
    rules: GenerationRules,
}

impl NoteGenerator {
    pub fn new(rules: GenerationRules) -> Result<Self> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &GenerationRules {
        &self.rules
    }

    /// Generates one base note per beat, then `additional_notes` passes of
    /// supplementary notes slightly after each beat.
    ///
    /// The result is neither sorted nor deduplicated. Non-finite beats are
    /// skipped.
    pub fn generate<R: Rng>(
        &self,
        beats: &[f64],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Vec<Note> {
        let beats: Vec<f64> = beats.iter().copied().filter(|b| b.is_finite()).collect();
        let passes = difficulty.params().additional_notes;
        let mut notes = Vec::with_capacity(beats.len() * (passes + 1));

        for &beat in &beats {
            notes.push(self.roll_note(beat, rng));
        }

        for _ in 0..passes {
            for &beat in &beats {
                let track = rng.gen_range(0..self.rules.lane_count);
                let time = beat + rng.gen_range(self.rules.extra_offset.clone());
                let duration = self.roll_duration(rng);
                notes.push(Note::new(time, track, duration));
            }
        }

        tracing::debug!(
            beats = beats.len(),
            notes = notes.len(),
            %difficulty,
            "generated notes"
        );
        notes
    }

    fn roll_note<R: Rng>(&self, time: f64, rng: &mut R) -> Note {
        let track = rng.gen_range(0..self.rules.lane_count);
        let duration = self.roll_duration(rng);
        Note::new(time, track, duration)
    }

    fn roll_duration<R: Rng>(&self, rng: &mut R) -> f64 {
        if rng.gen_bool(self.rules.hold_probability) {
            rng.gen_range(self.rules.hold_duration.clone())
        } else {
            0.0
        }
    }
}
