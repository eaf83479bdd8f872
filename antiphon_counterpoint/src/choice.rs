// Choice policies: how the selector breaks ties between equally good pitches.
//
// The selector never calls an RNG directly. It asks a `ChoicePolicy` for an
// index into the surviving candidate list, so the same selection logic runs
// with a seeded `StdRng` in production, with OS entropy for live
// performance, or with a scripted sequence in tests.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pitch::Pitch;

pub trait ChoicePolicy {
    /// Pick an index in `0..len`. Never called with `len == 0`.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Pick one of `pitches`, or `None` if there is nothing to pick from.
    fn choose(&mut self, pitches: &[Pitch]) -> Option<Pitch> {
        if pitches.is_empty() {
            return None;
        }
        let index = self.pick_index(pitches.len()).min(pitches.len() - 1);
        Some(pitches[index])
    }
}

/// Uniform random choice.
#[derive(Debug, Clone)]
pub struct RandomChoice {
    rng: StdRng,
}

impl RandomChoice {
    /// Reproducible choices from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        RandomChoice {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        RandomChoice {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl ChoicePolicy for RandomChoice {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Always the first (lowest) candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl ChoicePolicy for FirstChoice {
    fn pick_index(&mut self, _len: usize) -> usize {
        0
    }
}

/// Replays a fixed list of indices (taken modulo the candidate count), then
/// keeps picking the first candidate once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChoice {
    picks: VecDeque<usize>,
}

impl ScriptedChoice {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        ScriptedChoice {
            picks: picks.into_iter().collect(),
        }
    }
}

impl ChoicePolicy for ScriptedChoice {
    fn pick_index(&mut self, len: usize) -> usize {
        self.picks.pop_front().map_or(0, |i| i % len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_choice_is_none() {
        assert_eq!(FirstChoice.choose(&[]), None);
        assert_eq!(RandomChoice::seeded(1).choose(&[]), None);
    }

    #[test]
    fn seeded_choices_repeat() {
        let pitches = [60, 62, 64, 65, 67, 69, 71];
        let mut a = RandomChoice::seeded(42);
        let mut b = RandomChoice::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.choose(&pitches), b.choose(&pitches));
        }
    }

    #[test]
    fn random_choice_covers_all_candidates() {
        let pitches = [60, 64, 67];
        let mut policy = RandomChoice::seeded(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let p = policy.choose(&pitches).unwrap();
            let i = pitches.iter().position(|&x| x == p).unwrap();
            seen[i] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn scripted_choice_replays_then_falls_back() {
        let mut policy = ScriptedChoice::new([2, 5]);
        assert_eq!(policy.choose(&[10, 20, 30]), Some(30));
        // 5 % 3 == 2
        assert_eq!(policy.choose(&[10, 20, 30]), Some(30));
        assert_eq!(policy.choose(&[10, 20, 30]), Some(10));
    }
}
