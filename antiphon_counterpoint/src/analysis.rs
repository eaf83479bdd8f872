// Move analysis: a read-only report on a completed two-voice move.
//
// Produced after each note is chosen and logged alongside it. It never feeds
// back into selection. A move can only be analyzed once both voices have a
// previous pitch, so the first move of every phrase has no report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pitch::{
    Consonance, MotionType, Pitch, classify_interval, harmonic_interval, is_stepwise, motion_type,
};
use crate::rules::{hidden_forbidden, parallel_forbidden};

/// A broken first-species rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Violation {
    ParallelFifthsOrOctaves,
    HiddenFifthsOrOctaves,
    Dissonance,
}

impl Violation {
    pub fn label(self) -> &'static str {
        match self {
            Violation::ParallelFifthsOrOctaves => "parallel_fifths_or_octaves",
            Violation::HiddenFifthsOrOctaves => "hidden_fifths_or_octaves",
            Violation::Dissonance => "dissonance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub motion: MotionType,
    /// Harmonic interval class between the two current pitches, `0..12`.
    pub interval: Pitch,
    pub consonance: Consonance,
    pub violations: Vec<Violation>,
    /// Whether this voice moved by step.
    pub stepwise: bool,
}

impl MoveReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for MoveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} ({}) | {}",
            self.motion.label(),
            self.consonance.label(),
            self.interval,
            if self.stepwise { "step" } else { "leap" },
        )?;
        if !self.is_clean() {
            let labels: Vec<&str> = self.violations.iter().map(|v| v.label()).collect();
            write!(f, " ⚠ {}", labels.join(", "))?;
        }
        Ok(())
    }
}

/// Analyze this voice's move `own_prev -> own_curr` against the partner's
/// `partner_prev -> partner_curr`. `None` if either voice lacks history.
pub fn analyze(
    partner_prev: Option<Pitch>,
    partner_curr: Option<Pitch>,
    own_prev: Option<Pitch>,
    own_curr: Pitch,
) -> Option<MoveReport> {
    let (partner_prev, partner_curr, own_prev) = (partner_prev?, partner_curr?, own_prev?);

    let interval = harmonic_interval(partner_curr, own_curr);
    let consonance = classify_interval(interval);

    let mut violations = Vec::new();
    if parallel_forbidden(partner_prev, partner_curr, own_prev, own_curr) {
        violations.push(Violation::ParallelFifthsOrOctaves);
    }
    if hidden_forbidden(partner_prev, partner_curr, own_prev, own_curr) {
        violations.push(Violation::HiddenFifthsOrOctaves);
    }
    if !consonance.is_consonant() {
        violations.push(Violation::Dissonance);
    }

    Some(MoveReport {
        motion: motion_type(partner_prev, partner_curr, own_prev, own_curr),
        interval,
        consonance,
        violations,
        stepwise: is_stepwise(own_prev, own_curr),
    })
}
