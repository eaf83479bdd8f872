// The note event exchanged between peers.
//
// Serialized as `{"channel":"note","pitch":72,"sender_label":"Soprano"}`.
// The `channel` field is written by the codec, not stored on the struct,
// since every event in this protocol lives on the same channel.

use serde::{Deserialize, Serialize};

/// The single channel name notes are published on.
pub const NOTE_CHANNEL: &str = "note";

/// One note sung by a peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Semitone number, 60 = C4.
    pub pitch: i32,
    /// Who sang it. Informational only; peers do not route on it.
    pub sender_label: String,
}

impl NoteEvent {
    pub fn new(pitch: i32, sender_label: impl Into<String>) -> Self {
        NoteEvent {
            pitch,
            sender_label: sender_label.into(),
        }
    }
}
