use serde::{Deserialize, Serialize};

use crate::Grade;

/// Per-grade counters for the end-of-session summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeTally {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
}

impl GradeTally {
    pub fn record(&mut self, grade: Grade) {
        let slot = match grade {
            Grade::Perfect => &mut self.perfect,
            Grade::Great => &mut self.great,
            Grade::Good => &mut self.good,
            Grade::Bad => &mut self.bad,
            Grade::Miss => &mut self.miss,
        };
        *slot += 1;
    }

    pub fn count(&self, grade: Grade) -> u32 {
        match grade {
            Grade::Perfect => self.perfect,
            Grade::Great => self.great,
            Grade::Good => self.good,
            Grade::Bad => self.bad,
            Grade::Miss => self.miss,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.good + self.bad + self.miss
    }
}

/// Score and combo state machine.
///
/// Driven synchronously, one call per resolved note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreState {
    score: i64,
    combo: u32,
    max_combo: u32,
    history: Vec<i64>,
    tally: GradeTally,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Point values applied so far, in order. Their sum is always `score`.
    pub fn history(&self) -> &[i64] {
        &self.history
    }

    pub fn tally(&self) -> &GradeTally {
        &self.tally
    }

    /// Applies a judged hit. A [`Grade::Miss`] is routed to [`Self::miss`] and
    /// never reaches the points table.
    pub fn apply(&mut self, grade: Grade) {
        let Some(points) = grade.points() else {
            self.miss();
            return;
        };

        self.score += points;
        self.history.push(points);
        self.tally.record(grade);

        if grade.breaks_combo() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
    }

    /// Breaks the combo without touching the score.
    pub fn miss(&mut self) {
        self.tally.record(Grade::Miss);
        self.combo = 0;
    }
}
