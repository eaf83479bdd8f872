// Pitch theory: interval and motion classification.
//
// Pitches are plain semitone indices (MIDI numbering, 60 = C4) held in a
// signed integer so that interval arithmetic never has to worry about
// underflow. Everything here is a pure function with no state; the rule
// filter (`rules.rs`), the selector (`selector.rs`) and the move analyzer
// (`analysis.rs`) are all built on top of these few predicates.
//
// Interval classes are always reduced to `|delta| mod 12`, so an octave (12)
// classifies exactly like a unison (0) and every interval is octave
// equivalent.

use serde::{Deserialize, Serialize};

/// Absolute semitone index. 60 = middle C (C4).
pub type Pitch = i32;

/// Largest melodic movement (in semitones) that still counts as a step.
pub const MAX_STEP: Pitch = 2;

/// Consonance class of a harmonic interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consonance {
    /// Unison, fifth, octave.
    Perfect,
    /// Thirds and sixths.
    Imperfect,
    /// Seconds, fourths, the tritone and sevenths.
    Dissonant,
}

impl Consonance {
    pub fn is_consonant(self) -> bool {
        !matches!(self, Consonance::Dissonant)
    }

    pub fn is_perfect(self) -> bool {
        matches!(self, Consonance::Perfect)
    }

    pub fn label(self) -> &'static str {
        match self {
            Consonance::Perfect => "perfect",
            Consonance::Imperfect => "imperfect",
            Consonance::Dissonant => "dissonant",
        }
    }
}

/// Relative motion of two voices between successive notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionType {
    /// At least one voice holds its pitch.
    Oblique,
    /// Both voices move by the same signed amount.
    Parallel,
    /// Both voices move the same direction by different amounts.
    Similar,
    /// The voices move in opposite directions.
    Contrary,
}

impl MotionType {
    /// Parallel and similar motion both approach the new sonority from the
    /// same side.
    pub fn is_same_direction(self) -> bool {
        matches!(self, MotionType::Parallel | MotionType::Similar)
    }

    pub fn label(self) -> &'static str {
        match self {
            MotionType::Oblique => "oblique",
            MotionType::Parallel => "parallel",
            MotionType::Similar => "similar",
            MotionType::Contrary => "contrary",
        }
    }
}

/// Interval class in `0..12`: the absolute distance reduced modulo the octave.
pub fn interval_class(semitones: Pitch) -> Pitch {
    (semitones.unsigned_abs() % 12) as Pitch
}

/// Interval class between two sounding pitches, order-independent.
pub fn harmonic_interval(a: Pitch, b: Pitch) -> Pitch {
    interval_class(b - a)
}

/// Classify a (signed, any-size) interval into its consonance class.
pub fn classify_interval(semitones: Pitch) -> Consonance {
    match interval_class(semitones) {
        0 | 7 => Consonance::Perfect,
        3 | 4 | 8 | 9 => Consonance::Imperfect,
        _ => Consonance::Dissonant,
    }
}

/// Motion type of voice A (`a_prev -> a_curr`) against voice B
/// (`b_prev -> b_curr`).
pub fn motion_type(a_prev: Pitch, a_curr: Pitch, b_prev: Pitch, b_curr: Pitch) -> MotionType {
    let a = a_curr - a_prev;
    let b = b_curr - b_prev;

    if a == 0 || b == 0 {
        MotionType::Oblique
    } else if a.signum() != b.signum() {
        MotionType::Contrary
    } else if a == b {
        MotionType::Parallel
    } else {
        MotionType::Similar
    }
}

pub fn is_stepwise(prev: Pitch, curr: Pitch) -> bool {
    (curr - prev).abs() <= MAX_STEP
}

pub fn is_leap(prev: Pitch, curr: Pitch) -> bool {
    !is_stepwise(prev, curr)
}

/// Note name with MIDI octave numbering, e.g. `C4` for 60, `F#3` for 54.
pub fn pitch_name(pitch: Pitch) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
    ];
    let name = NAMES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{name}{octave}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_equivalence() {
        for i in 0..48 {
            assert_eq!(
                classify_interval(i),
                classify_interval(i + 12),
                "interval {i} vs {}",
                i + 12
            );
        }
    }

    #[test]
    fn direction_is_ignored() {
        for i in 0..48 {
            assert_eq!(classify_interval(-i), classify_interval(i), "interval {i}");
        }
    }

    #[test]
    fn known_classifications() {
        assert_eq!(classify_interval(0), Consonance::Perfect);
        assert_eq!(classify_interval(7), Consonance::Perfect);
        assert_eq!(classify_interval(12), Consonance::Perfect);
        assert_eq!(classify_interval(4), Consonance::Imperfect);
        assert_eq!(classify_interval(9), Consonance::Imperfect);
        assert_eq!(classify_interval(1), Consonance::Dissonant);
        assert_eq!(classify_interval(5), Consonance::Dissonant);
        assert_eq!(classify_interval(6), Consonance::Dissonant);
        // Direction doesn't matter.
        assert_eq!(classify_interval(-7), Consonance::Perfect);
        assert_eq!(classify_interval(-15), Consonance::Imperfect);
    }

    #[test]
    fn motion_types() {
        assert_eq!(motion_type(60, 60, 67, 69), MotionType::Oblique);
        assert_eq!(motion_type(60, 62, 67, 67), MotionType::Oblique);
        assert_eq!(motion_type(60, 62, 67, 65), MotionType::Contrary);
        assert_eq!(motion_type(60, 62, 67, 69), MotionType::Parallel);
        assert_eq!(motion_type(60, 62, 67, 72), MotionType::Similar);
        assert_eq!(motion_type(62, 60, 72, 67), MotionType::Similar);
    }

    #[test]
    fn steps_and_leaps() {
        assert!(is_stepwise(60, 62));
        assert!(is_stepwise(60, 58));
        assert!(is_stepwise(60, 60));
        assert!(is_leap(60, 63));
        assert!(is_leap(60, 55));
    }

    #[test]
    fn pitch_names() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(54), "F#3");
        assert_eq!(pitch_name(81), "A5");
        assert_eq!(pitch_name(0), "C-1");
    }
}
