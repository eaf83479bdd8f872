// Antiphon counterpoint engine
//
// The rule engine behind a two-voice call-and-response: given what the
// partner voice just sang and what this voice sang before, choose the next
// note by first-species counterpoint rules. Everything here is pure and
// synchronous; the turn-taking and networking live in `antiphon_peer`.
//
// Architecture:
// - pitch.rs: Pitch type, interval/consonance classification, motion types
// - voice.rs: SATB voice types (ranges, opening pitches), voice pairs with
//   upper/lower orientation, two-note voice history
// - candidates.rs: Consonant candidates for a voice against a reference pitch
// - rules.rs: Parallel/hidden perfect-interval rules, spacing, crossing, and
//   the candidate filter combining them
// - choice.rs: Injectable tie-breaking policies (seeded RNG, scripted)
// - selector.rs: Phrase-aware selection state machine (opening, response,
//   cadence, tiered middle-phrase search) and performance styles
// - analysis.rs: Read-only move reports for logging
// - midi.rs: MIDI transcript of a performed dialogue
//
// Selection is deterministic given a seeded choice policy.

pub mod analysis;
pub mod candidates;
pub mod choice;
pub mod midi;
pub mod pitch;
pub mod rules;
pub mod selector;
pub mod voice;

pub use analysis::{MoveReport, Violation, analyze};
pub use choice::{ChoicePolicy, FirstChoice, RandomChoice, ScriptedChoice};
pub use pitch::{Consonance, MotionType, Pitch};
pub use selector::{PhraseNoteSelector, PhraseState, Selection, SelectionState, Style, Tier};
pub use voice::{VoicePair, VoiceState, VoiceType};
