// Datagram encoding for `NoteEvent`.
//
// One datagram carries exactly one note as a JSON object tagged with its
// channel. `decode_note` is the transport boundary: anything oversized, not
// JSON, missing `pitch`, outside the MIDI pitch range, or addressed to
// another channel is rejected here so the coordinator only ever sees
// well-formed notes.
//
// `MAX_DATAGRAM_SIZE` (64 KiB) is the largest UDP payload we will attempt to
// read or write. Real note datagrams are a few dozen bytes.

use serde::{Deserialize, Serialize};

use crate::message::{NOTE_CHANNEL, NoteEvent};

/// Largest datagram we send or accept.
pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Highest pitch accepted off the wire. The lowest is 0.
pub const MAX_PITCH: i32 = 127;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("datagram too large: {0} bytes (max {max})", max = MAX_DATAGRAM_SIZE)]
    TooLarge(usize),
    #[error("malformed note datagram: {0}")]
    Json(#[from] serde_json::Error),
    #[error("datagram on unexpected channel '{0}'")]
    WrongChannel(String),
    #[error("pitch {0} outside 0..={max}", max = MAX_PITCH)]
    PitchOutOfRange(i32),
}

/// On-the-wire shape: the event plus its channel tag.
#[derive(Serialize)]
struct OutgoingDatagram<'a> {
    channel: &'static str,
    #[serde(flatten)]
    note: &'a NoteEvent,
}

#[derive(Deserialize)]
struct IncomingDatagram {
    channel: String,
    #[serde(flatten)]
    note: NoteEvent,
}

/// Encode a note as one datagram payload.
pub fn encode_note(note: &NoteEvent) -> Result<Vec<u8>, WireError> {
    let bytes = serde_json::to_vec(&OutgoingDatagram {
        channel: NOTE_CHANNEL,
        note,
    })?;
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(WireError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decode one received datagram payload.
pub fn decode_note(bytes: &[u8]) -> Result<NoteEvent, WireError> {
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(WireError::TooLarge(bytes.len()));
    }
    let datagram: IncomingDatagram = serde_json::from_slice(bytes)?;
    if datagram.channel != NOTE_CHANNEL {
        return Err(WireError::WrongChannel(datagram.channel));
    }
    if !(0..=MAX_PITCH).contains(&datagram.note.pitch) {
        return Err(WireError::PitchOutOfRange(datagram.note.pitch));
    }
    Ok(datagram.note)
}
