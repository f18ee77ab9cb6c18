use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BeatLaneError, Result};

/// Outcome of a resolved note, most favorable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    Perfect,
    Great,
    Good,
    Bad,
    Miss,
}

impl Grade {
    /// Every grade in priority order.
    pub const ALL: [Grade; 5] = [
        Grade::Perfect,
        Grade::Great,
        Grade::Good,
        Grade::Bad,
        Grade::Miss,
    ];

    /// Points added to the score, `None` for [`Grade::Miss`], which never
    /// passes through the points table.
    pub fn points(self) -> Option<i64> {
        match self {
            Grade::Perfect => Some(300),
            Grade::Great => Some(200),
            Grade::Good => Some(100),
            Grade::Bad => Some(-100),
            Grade::Miss => None,
        }
    }

    /// Bad and Miss reset the combo.
    pub fn breaks_combo(self) -> bool {
        matches!(self, Grade::Bad | Grade::Miss)
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Perfect => "Perfect",
            Grade::Great => "Great",
            Grade::Good => "Good",
            Grade::Bad => "Bad",
            Grade::Miss => "Miss",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maximum absolute timing offsets, in seconds, for each hit grade.
///
/// Anything beyond `bad` is a Miss. Thresholds are non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgmentTable {
    perfect: f64,
    great: f64,
    good: f64,
    bad: f64,
}

impl Default for JudgmentTable {
    fn default() -> Self {
        Self {
            perfect: 0.05,
            great: 0.10,
            good: 0.20,
            bad: 0.30,
        }
    }
}

impl JudgmentTable {
    /// Builds a table from `[perfect, great, good, bad]` thresholds.
    pub fn new(thresholds: [f64; 4]) -> Result<Self> {
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(BeatLaneError::config(format!(
                "judgment thresholds must be finite and non-negative, got {thresholds:?}"
            )));
        }
        if thresholds.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(BeatLaneError::config(format!(
                "judgment thresholds must be non-decreasing, got {thresholds:?}"
            )));
        }

        let [perfect, great, good, bad] = thresholds;
        Ok(Self {
            perfect,
            great,
            good,
            bad,
        })
    }

    /// Largest offset at which a note can still be hit.
    pub fn hit_window(&self) -> f64 {
        self.bad
    }

    pub fn threshold(&self, grade: Grade) -> f64 {
        match grade {
            Grade::Perfect => self.perfect,
            Grade::Great => self.great,
            Grade::Good => self.good,
            Grade::Bad => self.bad,
            Grade::Miss => f64::INFINITY,
        }
    }

    /// Grades a timing offset. The sign of `offset` is ignored.
    pub fn judge(&self, offset: f64) -> Grade {
        let offset = offset.abs();
        Grade::ALL
            .into_iter()
            .find(|grade| offset <= self.threshold(*grade))
            .unwrap_or(Grade::Miss)
    }
}
