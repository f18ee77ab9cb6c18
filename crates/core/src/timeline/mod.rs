use std::{path::Path, time::Instant};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Source of a monotonic time reading in seconds.
///
/// The session keeps two of these apart: the playback position drives note
/// scheduling and judgment, the wall clock only ages judgment displays. They
/// drift independently, e.g. when rendering stalls while audio keeps playing.
pub trait Clock {
    fn now_seconds(&self) -> f64;
}

/// Manually advanced clock. Stands in for the audio playback position in
/// headless runs and tests.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }
}

impl Clock for PlaybackClock {
    fn now_seconds(&self) -> f64 {
        self.time_seconds
    }
}

/// Real elapsed time since construction.
#[derive(Debug, Clone)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for WallClock {
    fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Beat timestamps produced by the external audio analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatTrack {
    /// Identifier of the analysed audio, informational only.
    #[serde(default)]
    pub source: Option<String>,
    pub beats: Vec<f64>,
}

impl BeatTrack {
    pub fn new(beats: Vec<f64>) -> Self {
        Self {
            source: None,
            beats,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let track: Self = serde_json::from_str(json)?;
        if track.beats.windows(2).any(|pair| pair[1] < pair[0]) {
            tracing::warn!(
                source = ?track.source,
                "beat timestamps are not in ascending order"
            );
        }
        Ok(track)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Average beats per minute over consecutive intervals, if at least two
    /// distinct beats exist.
    pub fn tempo_bpm(&self) -> Option<f64> {
        let intervals: Vec<f64> = self
            .beats
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|interval| *interval > f64::EPSILON)
            .collect();
        if intervals.is_empty() {
            return None;
        }
        let average = intervals.iter().sum::<f64>() / intervals.len() as f64;
        Some(60.0 / average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_clock_never_goes_negative() {
        let mut clock = PlaybackClock::new();
        clock.advance(0.5);
        clock.advance(-2.0);
        assert_eq!(clock.now_seconds(), 0.0);

        clock.advance(1.25);
        assert_eq!(clock.now_seconds(), 1.25);
        clock.reset();
        assert_eq!(clock.now_seconds(), 0.0);
    }

    #[test]
    fn wall_clock_moves_forward() {
        let clock = WallClock::start();
        let first = clock.now_seconds();
        assert!(clock.now_seconds() >= first);
    }

    #[test]
    fn parses_beat_track_json() {
        let track = BeatTrack::from_json_str(r#"{ "source": "song.ogg", "beats": [0.5, 1.0, 1.5] }"#)
            .expect("beat track should parse");

        assert_eq!(track.source.as_deref(), Some("song.ogg"));
        assert_eq!(track.beats, vec![0.5, 1.0, 1.5]);
        let bpm = track.tempo_bpm().unwrap();
        assert!((bpm - 120.0).abs() < 1e-9);
    }

    #[test]
    fn source_is_optional_and_empty_tracks_have_no_tempo() {
        let track = BeatTrack::from_json_str(r#"{ "beats": [] }"#).unwrap();
        assert!(track.is_empty());
        assert_eq!(track.tempo_bpm(), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(BeatTrack::from_json_str("[1.0, 2.0").is_err());
    }
}
