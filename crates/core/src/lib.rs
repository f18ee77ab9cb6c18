//! Core library for the Beatlane rhythm game.
//!
//! Turns beat timestamps into a note chart, matches timed key presses against
//! it and keeps score. Audio decoding, beat detection, windowing and device
//! polling live outside this crate; they feed it beat timestamps, playback
//! positions and `(timestamp, lane)` key events, and read back render
//! snapshots.
//!
//! Everything runs on one thread. A [`GameSession`] is advanced one frame at a
//! time with [`GameSession::tick`].

pub mod chart;
pub mod config;
pub mod error;
pub mod input;
pub mod judgment;
pub mod matcher;
pub mod render;
pub mod score;
pub mod session;
pub mod timeline;

pub use chart::{GenerationRules, Note, NoteArena, NoteGenerator, NoteId, LANE_COUNT};
pub use config::{Difficulty, DifficultyParams, SessionConfig};
pub use error::{BeatLaneError, Result};
pub use input::{InputEvent, InputQueue, PressState};
pub use judgment::{Grade, JudgmentTable};
pub use matcher::{MatchOutcome, NoteMatcher};
pub use render::{JudgmentDisplay, JudgmentView, NoteView, RenderGraph, RenderSnapshot, Renderer};
pub use score::{GradeTally, ScoreState};
pub use session::{EndReason, FinalResult, GameSession, TickReport};
pub use timeline::{BeatTrack, Clock, PlaybackClock, WallClock};
