// Voice types, voice pairs, and per-voice note history.
//
// A peer sings exactly one `VoiceType` and answers exactly one partner. The
// `VoicePair` records both so the rule filter knows which of the two voices
// is the upper one (crossing and spacing are only meaningful with an
// orientation). `VoiceState` is the two-note history the selector and the
// analyzer look at: the most recent pitch and the one before it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pitch::Pitch;

/// The four SATB voice types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceType {
    Soprano,
    Alto,
    Tenor,
    Bass,
}

impl VoiceType {
    pub const ALL: [VoiceType; 4] = [
        VoiceType::Soprano,
        VoiceType::Alto,
        VoiceType::Tenor,
        VoiceType::Bass,
    ];

    /// Inclusive pitch range for the voice.
    pub fn range(self) -> (Pitch, Pitch) {
        match self {
            VoiceType::Soprano => (60, 81), // C4–A5
            VoiceType::Alto => (53, 74),    // F3–D5
            VoiceType::Tenor => (48, 69),   // C3–A4
            VoiceType::Bass => (40, 60),    // E2–C4
        }
    }

    pub fn contains(self, pitch: Pitch) -> bool {
        let (low, high) = self.range();
        (low..=high).contains(&pitch)
    }

    /// Pitches a voice may open a phrase with when nobody has sung yet.
    pub fn opening_pitches(self) -> &'static [Pitch] {
        match self {
            VoiceType::Soprano => &[72, 74, 76],
            VoiceType::Alto => &[65, 67, 69],
            VoiceType::Tenor => &[60, 62, 64],
            VoiceType::Bass => &[48, 50, 52, 55, 57, 60],
        }
    }

    /// Height rank: higher-sounding voices rank higher.
    fn rank(self) -> u8 {
        match self {
            VoiceType::Soprano => 3,
            VoiceType::Alto => 2,
            VoiceType::Tenor => 1,
            VoiceType::Bass => 0,
        }
    }

    /// Display label, also used as the default sender label on the wire.
    pub fn label(self) -> &'static str {
        match self {
            VoiceType::Soprano => "Soprano",
            VoiceType::Alto => "Alto",
            VoiceType::Tenor => "Tenor",
            VoiceType::Bass => "Bass",
        }
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown voice type '{0}' (expected soprano, alto, tenor or bass)")]
pub struct UnknownVoice(pub String);

impl FromStr for VoiceType {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soprano" => Ok(VoiceType::Soprano),
            "alto" => Ok(VoiceType::Alto),
            "tenor" => Ok(VoiceType::Tenor),
            "bass" => Ok(VoiceType::Bass),
            _ => Err(UnknownVoice(s.to_string())),
        }
    }
}

/// The two interacting voices, seen from one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePair {
    pub own: VoiceType,
    pub partner: VoiceType,
}

impl VoicePair {
    pub fn new(own: VoiceType, partner: VoiceType) -> Self {
        VoicePair { own, partner }
    }

    /// True if this peer's voice is the upper voice of the pair. With two
    /// identical voice types each peer treats itself as the upper voice.
    pub fn own_is_upper(&self) -> bool {
        self.own.rank() >= self.partner.rank()
    }

    pub fn lower_voice(&self) -> VoiceType {
        if self.own_is_upper() {
            self.partner
        } else {
            self.own
        }
    }

    /// Widest allowed distance between the two voices. A bass may sit up to
    /// two octaves below its partner.
    pub fn max_spacing(&self) -> Pitch {
        if self.lower_voice() == VoiceType::Bass {
            24
        } else {
            12
        }
    }

    /// Order an own pitch and a partner pitch as `(lower, upper)`.
    pub fn lower_upper(&self, own: Pitch, partner: Pitch) -> (Pitch, Pitch) {
        if self.own_is_upper() {
            (partner, own)
        } else {
            (own, partner)
        }
    }
}

/// Two-note history of one voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    pub previous: Option<Pitch>,
    pub current: Option<Pitch>,
}

impl VoiceState {
    /// Shift current into previous and make `pitch` current.
    pub fn record(&mut self, pitch: Pitch) {
        self.previous = self.current;
        self.current = Some(pitch);
    }

    pub fn clear(&mut self) {
        *self = VoiceState::default();
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_hold_their_openings() {
        for voice in VoiceType::ALL {
            for &p in voice.opening_pitches() {
                assert!(voice.contains(p), "{voice} opening {p} out of range");
            }
        }
    }

    #[test]
    fn parse_voice_types() {
        assert_eq!("bass".parse::<VoiceType>(), Ok(VoiceType::Bass));
        assert_eq!("Soprano".parse::<VoiceType>(), Ok(VoiceType::Soprano));
        assert!("baritone".parse::<VoiceType>().is_err());
    }

    #[test]
    fn voice_types_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&VoiceType::Tenor).unwrap(),
            "\"tenor\""
        );
        let bass: VoiceType = serde_json::from_str("\"bass\"").unwrap();
        assert_eq!(bass, VoiceType::Bass);
    }

    #[test]
    fn pair_orientation() {
        let soprano_vs_bass = VoicePair::new(VoiceType::Soprano, VoiceType::Bass);
        assert!(soprano_vs_bass.own_is_upper());
        assert_eq!(soprano_vs_bass.lower_voice(), VoiceType::Bass);
        assert_eq!(soprano_vs_bass.max_spacing(), 24);
        assert_eq!(soprano_vs_bass.lower_upper(72, 48), (48, 72));

        let bass_vs_soprano = VoicePair::new(VoiceType::Bass, VoiceType::Soprano);
        assert!(!bass_vs_soprano.own_is_upper());
        assert_eq!(bass_vs_soprano.lower_voice(), VoiceType::Bass);
        assert_eq!(bass_vs_soprano.lower_upper(48, 72), (48, 72));

        let alto_vs_tenor = VoicePair::new(VoiceType::Tenor, VoiceType::Alto);
        assert!(!alto_vs_tenor.own_is_upper());
        assert_eq!(alto_vs_tenor.max_spacing(), 12);
    }

    #[test]
    fn record_shifts_history() {
        let mut state = VoiceState::default();
        assert!(state.is_empty());
        state.record(60);
        assert_eq!(state, VoiceState { previous: None, current: Some(60) });
        state.record(62);
        assert_eq!(state, VoiceState { previous: Some(60), current: Some(62) });
        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.previous, None);
    }
}
