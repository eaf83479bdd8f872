// Candidate generation: every pitch in a voice's range that forms a
// consonance with a reference pitch.
//
// No voice-leading rules here: crossing, spacing and the parallel/hidden
// checks are applied afterwards by `rules::VoiceLeadingFilter`, and the
// unrestricted fallback tier of the selector uses this list as is.

use crate::pitch::{Pitch, classify_interval};
use crate::voice::VoiceType;

/// All pitches in `voice`'s range consonant with `reference`, ascending.
///
/// May be empty; callers fall through to their next option.
pub fn generate_candidates(reference: Pitch, voice: VoiceType) -> Vec<Pitch> {
    let (low, high) = voice.range();
    (low..=high)
        .filter(|&p| classify_interval(p - reference).is_consonant())
        .collect()
}
