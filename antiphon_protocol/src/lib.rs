// antiphon_protocol: wire format for notes exchanged between two peers.
//
// Each sung note travels as one UDP datagram holding a small JSON object on
// the fixed `note` channel. There is no handshake, acknowledgement or
// sequence number: a note is fire-and-forget, and a lost datagram is absorbed
// by the receiving peer's turn timeout.
//
// Module overview:
// - `message.rs`: `NoteEvent`, the only message, and the channel name.
// - `codec.rs`:   Datagram encode/decode with a size cap and a typed
//                 `WireError` for everything that gets rejected.
//
// The crate has no dependency on the counterpoint engine; pitches are plain
// `i32` semitone numbers (MIDI numbering, 60 = middle C).

pub mod codec;
pub mod message;

pub use codec::{MAX_DATAGRAM_SIZE, MAX_PITCH, WireError, decode_note, encode_note};
pub use message::{NOTE_CHANNEL, NoteEvent};
