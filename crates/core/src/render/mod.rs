use serde::{Deserialize, Serialize};

use crate::{Grade, NoteId, Result, LANE_COUNT};

/// A grade shown above a lane, stamped with wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgmentDisplay {
    pub grade: Grade,
    pub shown_at: f64,
    pub track: usize,
}

/// Render-side view of an unresolved note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteView {
    pub id: NoteId,
    pub time: f64,
    pub track: usize,
    pub duration: f64,
    pub hold: bool,
}

impl NoteView {
    /// Distance above the judgment line in pixels. Negative once the note has
    /// passed the line.
    pub fn scroll_offset(&self, now: f64, note_speed: f64) -> f64 {
        (self.time - now) * note_speed
    }

    /// Pixel length of a hold note's body.
    pub fn body_length(&self, note_speed: f64) -> f64 {
        self.duration * note_speed
    }
}

/// Judgment display with its age, as handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgmentView {
    pub grade: Grade,
    pub age: f64,
    pub track: usize,
}

/// Read-only state for one rendered frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub playback_time: f64,
    pub note_speed: f64,
    pub notes: Vec<NoteView>,
    pub score: i64,
    pub combo: u32,
    pub judgments: Vec<JudgmentView>,
    pub pressed: [bool; LANE_COUNT],
}

/// The render consumer. Called once per tick after all state mutation.
pub trait Renderer {
    fn draw(&mut self, snapshot: &RenderSnapshot) -> Result<()>;
}

/// Headless renderer that keeps the most recent snapshot.
#[derive(Debug, Default)]
pub struct RenderGraph {
    last: Option<RenderSnapshot>,
    frames: u64,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_snapshot(&self) -> Option<&RenderSnapshot> {
        self.last.as_ref()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }
}

impl Renderer for RenderGraph {
    fn draw(&mut self, snapshot: &RenderSnapshot) -> Result<()> {
        tracing::trace!(
            notes = snapshot.notes.len(),
            judgments = snapshot.judgments.len(),
            score = snapshot.score,
            "frame"
        );
        self.last = Some(snapshot.clone());
        self.frames += 1;
        Ok(())
    }
}
