// First-species voice-leading rules and the candidate filter built on them.
//
// Four checks, all pure:
// - parallel perfect consonances (unisons, fifths, octaves) are forbidden;
// - hidden (direct) perfect consonances are forbidden when the upper voice
//   arrives by leap;
// - the voices may not be further apart than an octave (two octaves when the
//   lower voice is a bass);
// - the upper voice may not sit below the lower voice.
//
// The parallel and hidden checks take the four pitches of a two-voice move
// in `(a_prev, a_curr, b_prev, b_curr)` order and are symmetric in A and B:
// the hidden rule always tests whichever voice sounds higher at the arrival
// point, regardless of argument order.

use crate::pitch::{
    MotionType, Pitch, classify_interval, harmonic_interval, is_stepwise, motion_type,
};
use crate::voice::{VoicePair, VoiceType};

/// Parallel unisons, fifths or octaves between the two voices.
pub fn parallel_forbidden(a_prev: Pitch, a_curr: Pitch, b_prev: Pitch, b_curr: Pitch) -> bool {
    if motion_type(a_prev, a_curr, b_prev, b_curr) != MotionType::Parallel {
        return false;
    }
    let prev = classify_interval(harmonic_interval(a_prev, b_prev));
    let curr = classify_interval(harmonic_interval(a_curr, b_curr));
    prev.is_perfect() && curr.is_perfect()
}

/// Same-direction motion into a perfect consonance with the upper voice
/// leaping.
pub fn hidden_forbidden(a_prev: Pitch, a_curr: Pitch, b_prev: Pitch, b_curr: Pitch) -> bool {
    if !motion_type(a_prev, a_curr, b_prev, b_curr).is_same_direction() {
        return false;
    }
    if !classify_interval(harmonic_interval(a_curr, b_curr)).is_perfect() {
        return false;
    }
    let (top_prev, top_curr) = if a_curr > b_curr {
        (a_prev, a_curr)
    } else {
        (b_prev, b_curr)
    };
    !is_stepwise(top_prev, top_curr)
}

/// Distance between the voices is within the allowed span.
pub fn spacing_ok(lower: Pitch, upper: Pitch, lower_voice: VoiceType) -> bool {
    let max = if lower_voice == VoiceType::Bass { 24 } else { 12 };
    upper - lower <= max
}

/// The upper voice is not below the lower voice.
pub fn crossing_ok(lower: Pitch, upper: Pitch) -> bool {
    upper >= lower
}

/// The partner's last move plus this voice's previous pitch: everything a
/// candidate is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionContext {
    pub partner_prev: Pitch,
    pub partner_curr: Pitch,
    pub own_prev: Pitch,
}

/// Rejects candidates that break any of the four voice-leading checks.
#[derive(Debug, Clone, Copy)]
pub struct VoiceLeadingFilter {
    pair: VoicePair,
}

impl VoiceLeadingFilter {
    pub fn new(pair: VoicePair) -> Self {
        VoiceLeadingFilter { pair }
    }

    /// Crossing and spacing only: the checks that don't need motion history.
    pub fn placement_ok(&self, candidate: Pitch, partner: Pitch) -> bool {
        let (lower, upper) = self.pair.lower_upper(candidate, partner);
        crossing_ok(lower, upper) && spacing_ok(lower, upper, self.pair.lower_voice())
    }

    /// True if `candidate` passes every rule.
    pub fn admits(&self, ctx: &MotionContext, candidate: Pitch) -> bool {
        let MotionContext {
            partner_prev,
            partner_curr,
            own_prev,
        } = *ctx;
        !parallel_forbidden(partner_prev, partner_curr, own_prev, candidate)
            && !hidden_forbidden(partner_prev, partner_curr, own_prev, candidate)
            && self.placement_ok(candidate, partner_curr)
    }

    /// Candidates that pass every rule, in their original order.
    pub fn filter(&self, ctx: &MotionContext, candidates: &[Pitch]) -> Vec<Pitch> {
        candidates
            .iter()
            .copied()
            .filter(|&c| self.admits(ctx, c))
            .collect()
    }
}
