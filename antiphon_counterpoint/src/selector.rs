// Phrase-aware note selection.
//
// `PhraseNoteSelector::select` is a small state machine over what the two
// voices have sung so far and where we are in the phrase:
//
// - Opening: the partner hasn't sung yet. Pick one of the voice's preferred
//   opening pitches.
// - ResponseOpening: the partner has sung, we haven't. Answer with a perfect
//   consonance (unison, fifth or octave either side) that fits our range and
//   doesn't cross; an octave below the partner if nothing fits.
// - Cadence: the last two positions of the phrase. Deterministic. The bass
//   sings dominant then tonic; an upper voice sings the leading tone then the
//   final, an octave above the partner.
// - MiddlePhrase: everything else. The style's tiers are tried in order
//   (contrary motion, rule-filtered, unrestricted consonance) until one has
//   candidates; if none do, the previous pitch is held.
//
// The bass cadence depends on nothing but the phrase position, so it is
// checked before any history-based state.
//
// `PhraseState` tracks the position within the phrase. Clearing the voice
// histories at the phrase boundary is the caller's job (see the coordinator
// in `antiphon_peer`), since the selector only borrows them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::candidates::generate_candidates;
use crate::choice::ChoicePolicy;
use crate::pitch::{Pitch, is_stepwise};
use crate::rules::{MotionContext, VoiceLeadingFilter};
use crate::voice::{VoicePair, VoiceState, VoiceType};

/// Default phrase length in notes.
pub const DEFAULT_PHRASE_LENGTH: usize = 8;

/// Bass cadence pitches: dominant (G4) then tonic (C4), a fifth apart.
pub const BASS_DOMINANT: Pitch = 67;
pub const BASS_TONIC: Pitch = 60;

/// Perfect-consonance offsets tried when answering the partner's first note.
const RESPONSE_OFFSETS: [Pitch; 5] = [-12, -7, 0, 7, 12];

/// A middle-of-phrase selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Rule-filtered candidates moving against the partner's last motion.
    Contrary,
    /// Rule-filtered candidates, any direction.
    VoiceLeading,
    /// Any consonance in range, no rules applied.
    Consonant,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Contrary => "contrary",
            Tier::VoiceLeading => "voice-leading",
            Tier::Consonant => "consonant",
        }
    }
}

/// Performance style: which middle-phrase tiers are attempted, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Contrary motion first, then any legal motion, then any consonance.
    #[default]
    Strict,
    /// No contrary-motion preference.
    Free,
    /// Never leave the rules: holds the previous pitch rather than sing an
    /// unfiltered consonance.
    Cadential,
}

impl Style {
    pub fn tiers(self) -> &'static [Tier] {
        match self {
            Style::Strict => &[Tier::Contrary, Tier::VoiceLeading, Tier::Consonant],
            Style::Free => &[Tier::VoiceLeading, Tier::Consonant],
            Style::Cadential => &[Tier::Contrary, Tier::VoiceLeading],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Style::Strict => "strict",
            Style::Free => "free",
            Style::Cadential => "cadential",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style '{0}' (expected strict, free or cadential)")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Style::Strict),
            "free" => Ok(Style::Free),
            "cadential" => Ok(Style::Cadential),
            _ => Err(UnknownStyle(s.to_string())),
        }
    }
}

/// Position within the current phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseState {
    pub position: usize,
    pub length: usize,
}

impl Default for PhraseState {
    fn default() -> Self {
        PhraseState::new(DEFAULT_PHRASE_LENGTH)
    }
}

impl PhraseState {
    /// A phrase of `length` notes. Zero is treated as one.
    pub fn new(length: usize) -> Self {
        PhraseState {
            position: 0,
            length: length.max(1),
        }
    }

    /// In the last two positions.
    pub fn in_cadence(&self) -> bool {
        self.position + 2 >= self.length
    }

    pub fn is_penultimate(&self) -> bool {
        self.position + 2 == self.length
    }

    /// Move to the next position. Returns true (and rewinds to 0) when the
    /// phrase is complete.
    pub fn advance(&mut self) -> bool {
        self.position += 1;
        if self.position >= self.length {
            self.position = 0;
            true
        } else {
            false
        }
    }
}

/// Which branch of the state machine produced a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionState {
    Opening,
    ResponseOpening,
    Cadence,
    MiddlePhrase(Tier),
    /// Every middle-phrase tier came up empty.
    Held,
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionState::Opening => f.write_str("opening"),
            SelectionState::ResponseOpening => f.write_str("response"),
            SelectionState::Cadence => f.write_str("cadence"),
            SelectionState::MiddlePhrase(tier) => write!(f, "middle/{}", tier.label()),
            SelectionState::Held => f.write_str("held"),
        }
    }
}

/// A chosen pitch and how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub pitch: Pitch,
    pub state: SelectionState,
}

/// Picks this voice's next note against the partner.
#[derive(Debug, Clone, Copy)]
pub struct PhraseNoteSelector {
    pair: VoicePair,
    style: Style,
    filter: VoiceLeadingFilter,
}

impl PhraseNoteSelector {
    pub fn new(pair: VoicePair, style: Style) -> Self {
        PhraseNoteSelector {
            pair,
            style,
            filter: VoiceLeadingFilter::new(pair),
        }
    }

    /// Choose the next note. Always returns a pitch.
    pub fn select(
        &self,
        partner: &VoiceState,
        own: &VoiceState,
        phrase: &PhraseState,
        choice: &mut dyn ChoicePolicy,
    ) -> Selection {
        let in_cadence = phrase.in_cadence();
        if in_cadence && self.pair.own == VoiceType::Bass {
            return Selection {
                pitch: bass_cadence(phrase),
                state: SelectionState::Cadence,
            };
        }

        match (partner.current, own.current) {
            (None, _) => self.opening(choice),
            (Some(their_note), None) => self.response_opening(their_note, choice),
            (Some(their_note), Some(_)) if in_cadence => Selection {
                pitch: upper_cadence(their_note, phrase),
                state: SelectionState::Cadence,
            },
            (Some(their_note), Some(my_note)) => {
                let their_prev = partner.previous.unwrap_or(their_note);
                self.middle_phrase(their_prev, their_note, my_note, choice)
            }
        }
    }

    fn opening(&self, choice: &mut dyn ChoicePolicy) -> Selection {
        let openings = self.pair.own.opening_pitches();
        let pitch = choice
            .choose(openings)
            .unwrap_or_else(|| self.pair.own.range().0);
        Selection {
            pitch,
            state: SelectionState::Opening,
        }
    }

    fn response_opening(&self, their_note: Pitch, choice: &mut dyn ChoicePolicy) -> Selection {
        let candidates: Vec<Pitch> = RESPONSE_OFFSETS
            .iter()
            .map(|offset| their_note + offset)
            .filter(|&p| self.pair.own.contains(p) && self.not_crossed(p, their_note))
            .collect();
        let pitch = choice.choose(&candidates).unwrap_or(their_note - 12);
        Selection {
            pitch,
            state: SelectionState::ResponseOpening,
        }
    }

    fn not_crossed(&self, own: Pitch, partner: Pitch) -> bool {
        let (lower, upper) = self.pair.lower_upper(own, partner);
        upper >= lower
    }

    fn middle_phrase(
        &self,
        their_prev: Pitch,
        their_note: Pitch,
        my_note: Pitch,
        choice: &mut dyn ChoicePolicy,
    ) -> Selection {
        let candidates = generate_candidates(their_note, self.pair.own);
        let ctx = MotionContext {
            partner_prev: their_prev,
            partner_curr: their_note,
            own_prev: my_note,
        };
        let their_motion = their_note - their_prev;

        for &tier in self.style.tiers() {
            let pool = match tier {
                Tier::Contrary => {
                    let contrary: Vec<Pitch> = self
                        .filter
                        .filter(&ctx, &candidates)
                        .into_iter()
                        .filter(|&c| opposes(their_motion, c - my_note))
                        .collect();
                    prefer_stepwise(my_note, contrary)
                }
                Tier::VoiceLeading => {
                    prefer_stepwise(my_note, self.filter.filter(&ctx, &candidates))
                }
                Tier::Consonant => candidates.clone(),
            };
            if let Some(pitch) = choice.choose(&pool) {
                return Selection {
                    pitch,
                    state: SelectionState::MiddlePhrase(tier),
                };
            }
        }

        Selection {
            pitch: my_note,
            state: SelectionState::Held,
        }
    }
}

fn bass_cadence(phrase: &PhraseState) -> Pitch {
    if phrase.is_penultimate() {
        BASS_DOMINANT
    } else {
        BASS_TONIC
    }
}

/// Leading tone then final, an octave above the partner's note.
fn upper_cadence(their_note: Pitch, phrase: &PhraseState) -> Pitch {
    let final_note = their_note + 12;
    if phrase.is_penultimate() {
        final_note - 1
    } else {
        final_note
    }
}

/// True if the two movements go in opposite directions. A held note opposes
/// nothing.
fn opposes(their_motion: Pitch, my_motion: Pitch) -> bool {
    (their_motion > 0 && my_motion < 0) || (their_motion < 0 && my_motion > 0)
}

/// The stepwise subset of `pool` if it has one, otherwise all of `pool`.
fn prefer_stepwise(from: Pitch, pool: Vec<Pitch>) -> Vec<Pitch> {
    let steps: Vec<Pitch> = pool.iter().copied().filter(|&p| is_stepwise(from, p)).collect();
    if steps.is_empty() { pool } else { steps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{FirstChoice, RandomChoice, ScriptedChoice};
    use crate::pitch::classify_interval;
    use crate::rules::{hidden_forbidden, parallel_forbidden};

    fn state(previous: Option<Pitch>, current: Option<Pitch>) -> VoiceState {
        VoiceState { previous, current }
    }

    fn at(position: usize) -> PhraseState {
        PhraseState {
            position,
            length: 8,
        }
    }

    fn soprano_over_bass(style: Style) -> PhraseNoteSelector {
        PhraseNoteSelector::new(VoicePair::new(VoiceType::Soprano, VoiceType::Bass), style)
    }

    fn bass_under_soprano(style: Style) -> PhraseNoteSelector {
        PhraseNoteSelector::new(VoicePair::new(VoiceType::Bass, VoiceType::Soprano), style)
    }

    #[test]
    fn opening_uses_preferred_pitches() {
        let selector = soprano_over_bass(Style::Strict);
        let mut rng = RandomChoice::seeded(3);
        for _ in 0..50 {
            let empty = VoiceState::default();
            let sel = selector.select(&empty, &empty, &at(0), &mut rng);
            assert_eq!(sel.state, SelectionState::Opening);
            assert!([72, 74, 76].contains(&sel.pitch));
        }
    }

    #[test]
    fn response_opening_is_perfect_and_uncrossed() {
        let selector = bass_under_soprano(Style::Strict);
        let mut rng = RandomChoice::seeded(9);
        for _ in 0..50 {
            let partner = state(None, Some(60));
            let sel = selector.select(&partner, &VoiceState::default(), &at(0), &mut rng);
            assert_eq!(sel.state, SelectionState::ResponseOpening);
            // Bass range tops out at 60, and must not rise above the soprano.
            assert!([48, 53, 60].contains(&sel.pitch), "got {}", sel.pitch);
            assert!(classify_interval(sel.pitch - 60).is_perfect());
        }
    }

    #[test]
    fn response_opening_falls_back_an_octave_below() {
        // Nothing in the bass range is a perfect consonance at or below 90
        // within one octave.
        let selector = bass_under_soprano(Style::Strict);
        let partner = state(None, Some(90));
        let sel = selector.select(&partner, &VoiceState::default(), &at(0), &mut FirstChoice);
        assert_eq!(sel.pitch, 78);
        assert_eq!(sel.state, SelectionState::ResponseOpening);
    }

    #[test]
    fn bass_final_is_tonic_regardless_of_history() {
        let selector = bass_under_soprano(Style::Strict);
        let histories = [
            (VoiceState::default(), VoiceState::default()),
            (state(None, Some(72)), VoiceState::default()),
            (state(Some(74), Some(72)), state(Some(50), Some(55))),
        ];
        for (partner, own) in histories {
            let sel = selector.select(&partner, &own, &at(7), &mut RandomChoice::seeded(1));
            assert_eq!(sel.pitch, BASS_TONIC);
            assert_eq!(sel.state, SelectionState::Cadence);
        }
        let partner = state(Some(74), Some(72));
        let own = state(None, Some(55));
        let sel = selector.select(&partner, &own, &at(6), &mut FirstChoice);
        assert_eq!(sel.pitch, BASS_DOMINANT);
    }

    #[test]
    fn upper_voice_cadence_resolves_by_leading_tone() {
        let selector = soprano_over_bass(Style::Strict);
        let partner = state(Some(55), Some(60));
        let own = state(Some(74), Some(72));
        let penultimate = selector.select(&partner, &own, &at(6), &mut FirstChoice);
        assert_eq!(penultimate.pitch, 71);
        assert_eq!(penultimate.state, SelectionState::Cadence);
        let last = selector.select(&partner, &own, &at(7), &mut FirstChoice);
        assert_eq!(last.pitch, 72);
    }

    #[test]
    fn middle_phrase_prefers_contrary_stepwise_motion() {
        let selector = soprano_over_bass(Style::Strict);
        // Bass rises 48 -> 50; soprano was on 72.
        let partner = state(Some(48), Some(50));
        let own = state(None, Some(72));
        let mut rng = RandomChoice::seeded(11);
        for _ in 0..50 {
            let sel = selector.select(&partner, &own, &at(2), &mut rng);
            assert_eq!(sel.state, SelectionState::MiddlePhrase(Tier::Contrary));
            assert!(sel.pitch < 72, "expected downward motion, got {}", sel.pitch);
            assert!(is_stepwise(72, sel.pitch));
            assert!(classify_interval(sel.pitch - 50).is_consonant());
            assert!(!parallel_forbidden(48, 50, 72, sel.pitch));
            assert!(!hidden_forbidden(48, 50, 72, sel.pitch));
        }
    }

    #[test]
    fn free_style_skips_contrary_tier() {
        let selector = soprano_over_bass(Style::Free);
        let partner = state(Some(48), Some(50));
        let own = state(None, Some(72));
        let sel = selector.select(&partner, &own, &at(2), &mut FirstChoice);
        assert_eq!(sel.state, SelectionState::MiddlePhrase(Tier::VoiceLeading));
    }

    #[test]
    fn held_partner_skips_to_voice_leading() {
        // No partner motion means nothing is contrary to it.
        let selector = soprano_over_bass(Style::Strict);
        let partner = state(Some(50), Some(50));
        let own = state(None, Some(72));
        let sel = selector.select(&partner, &own, &at(3), &mut FirstChoice);
        assert_eq!(sel.state, SelectionState::MiddlePhrase(Tier::VoiceLeading));
    }

    #[test]
    fn missing_partner_previous_is_treated_as_held() {
        let selector = soprano_over_bass(Style::Strict);
        let partner = state(None, Some(50));
        let own = state(None, Some(72));
        let sel = selector.select(&partner, &own, &at(3), &mut FirstChoice);
        assert_eq!(sel.state, SelectionState::MiddlePhrase(Tier::VoiceLeading));
    }

    #[test]
    fn falls_back_to_unfiltered_consonance() {
        // Partner at 40 and soprano at 81: every soprano candidate is more
        // than two octaves above the bass, so only the consonant tier fills.
        let selector = soprano_over_bass(Style::Strict);
        let partner = state(Some(41), Some(30));
        let own = state(None, Some(81));
        let sel = selector.select(&partner, &own, &at(2), &mut FirstChoice);
        assert_eq!(sel.state, SelectionState::MiddlePhrase(Tier::Consonant));
        assert!(classify_interval(sel.pitch - 30).is_consonant());
    }

    #[test]
    fn cadential_style_holds_instead_of_breaking_rules() {
        let selector = soprano_over_bass(Style::Cadential);
        let partner = state(Some(41), Some(30));
        let own = state(None, Some(81));
        let sel = selector.select(&partner, &own, &at(2), &mut FirstChoice);
        assert_eq!(sel.state, SelectionState::Held);
        assert_eq!(sel.pitch, 81);
    }

    #[test]
    fn scripted_choice_forces_tie_break() {
        let selector = soprano_over_bass(Style::Strict);
        let partner = state(Some(48), Some(50));
        let own = state(None, Some(72));
        let mut lowest = ScriptedChoice::new([0]);
        let mut highest = ScriptedChoice::new([usize::MAX]);
        let first = selector.select(&partner, &own, &at(2), &mut lowest);
        let last = selector.select(&partner, &own, &at(2), &mut highest);
        assert!(first.pitch <= last.pitch);
    }

    #[test]
    fn phrase_advances_and_wraps() {
        let mut phrase = PhraseState::new(3);
        assert!(!phrase.in_cadence());
        assert!(!phrase.advance());
        assert!(phrase.in_cadence());
        assert!(phrase.is_penultimate());
        assert!(!phrase.advance());
        assert!(phrase.in_cadence());
        assert!(!phrase.is_penultimate());
        assert!(phrase.advance());
        assert_eq!(phrase.position, 0);
    }

    #[test]
    fn zero_length_phrase_is_one_note() {
        let mut phrase = PhraseState::new(0);
        assert_eq!(phrase.length, 1);
        assert!(phrase.advance());
    }

    #[test]
    fn parse_styles() {
        assert_eq!("strict".parse::<Style>(), Ok(Style::Strict));
        assert_eq!("Free".parse::<Style>(), Ok(Style::Free));
        assert_eq!("cadential".parse::<Style>(), Ok(Style::Cadential));
        assert!("baroque".parse::<Style>().is_err());
        assert_eq!(Style::default(), Style::Strict);
        assert_eq!(
            serde_json::to_string(&Style::Cadential).unwrap(),
            "\"cadential\""
        );
    }
}
