// MIDI transcript of a dialogue.
//
// Records the notes both voices sang, in the order this peer saw them, and
// writes them out as a Standard MIDI File: a tempo track plus one track per
// voice. Every note occupies one quarter-note slot; slot `i` is the `i`-th
// note of the dialogue regardless of which voice sang it, so the two tracks
// interleave the way the call and response did.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1 (multi-track).

use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

use crate::pitch::Pitch;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Which side of the dialogue sang a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Own,
    Partner,
}

/// The ordered notes of one performance.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub own_label: String,
    pub partner_label: String,
    /// One quarter note per slot.
    pub tempo_bpm: u16,
    events: Vec<(Part, Pitch)>,
}

impl Transcript {
    pub fn new(own_label: impl Into<String>, partner_label: impl Into<String>) -> Self {
        Transcript {
            own_label: own_label.into(),
            partner_label: partner_label.into(),
            tempo_bpm: 60,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, part: Part, pitch: Pitch) {
        self.events.push((part, pitch));
    }

    pub fn events(&self) -> &[(Part, Pitch)] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Write the transcript to a `.mid` file.
pub fn write_transcript(transcript: &Transcript, path: &Path) -> std::io::Result<()> {
    transcript_to_smf(transcript).save(path)
}

/// Convert a transcript to an in-memory SMF.
fn transcript_to_smf(transcript: &Transcript) -> Smf<'_> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut tempo_track: Track<'_> = Vec::new();
    let tempo_microseconds = 60_000_000 / u32::from(transcript.tempo_bpm.max(1));
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    let parts = [
        (Part::Own, transcript.own_label.as_str(), u4::new(0)),
        (Part::Partner, transcript.partner_label.as_str(), u4::new(1)),
    ];

    for (part, name, channel) in parts {
        let mut track: Track<'_> = Vec::new();
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
        });

        let slot_ticks = u32::from(TICKS_PER_QUARTER);
        let mut last_event_tick: u32 = 0;

        for (slot, &(event_part, pitch)) in transcript.events.iter().enumerate() {
            if event_part != part {
                continue;
            }
            let key = u7::new(pitch.clamp(0, 127) as u8);
            let start = slot as u32 * slot_ticks;
            track.push(TrackEvent {
                delta: u28::new(start - last_event_tick),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn { key, vel: u7::new(80) },
                },
            });
            track.push(TrackEvent {
                delta: u28::new(slot_ticks),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff { key, vel: u7::new(0) },
                },
            });
            last_event_tick = start + slot_ticks;
        }

        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
    }

    smf
}
