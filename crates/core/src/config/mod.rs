use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{BeatLaneError, Result};

/// Difficulty tier selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    /// Scroll rate and number of extra note passes fixed by this tier.
    pub fn params(self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                note_speed: 200.0,
                additional_notes: 1,
            },
            Difficulty::Normal => DifficultyParams {
                note_speed: 300.0,
                additional_notes: 2,
            },
            Difficulty::Hard => DifficultyParams {
                note_speed: 400.0,
                additional_notes: 3,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = BeatLaneError;

    /// Tier names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(BeatLaneError::config(format!(
                "unknown difficulty level `{s}`"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values a difficulty tier fixes for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Scroll rate in pixels per second. Only the renderer reads it.
    pub note_speed: f64,
    /// Number of supplementary passes over the beat list.
    pub additional_notes: usize,
}

/// Top-level configuration for a play session.
///
/// The difficulty is kept as the raw tier name so that an unknown tier is
/// reported as a configuration error when the session starts rather than as a
/// parse failure of the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub difficulty: String,
    pub audio_source: String,
    pub seed: Option<u64>,
    pub frame_rate: u32,
    pub judgment_display_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal.name().to_string(),
            audio_source: String::new(),
            seed: None,
            frame_rate: 60,
            judgment_display_seconds: 1.0,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses the configured tier.
    pub fn difficulty(&self) -> Result<Difficulty> {
        self.difficulty.parse()
    }

    /// Checks every field the session depends on.
    pub fn validate(&self) -> Result<Difficulty> {
        let difficulty = self.difficulty()?;
        if self.frame_rate == 0 {
            return Err(BeatLaneError::config("frame rate must be positive"));
        }
        if !(self.judgment_display_seconds.is_finite() && self.judgment_display_seconds >= 0.0) {
            return Err(BeatLaneError::config(format!(
                "judgment display lifetime must be a non-negative number of seconds, got {}",
                self.judgment_display_seconds
            )));
        }
        Ok(difficulty)
    }

    /// Length of one tick in seconds.
    pub fn frame_seconds(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }
}
