// Integration smoke tests for the peer runtime.
//
// Runs real peers on localhost UDP with fast timings: two peers singing a
// duet against each other, a lone peer whose partner never answers, a peer
// fed hand-written datagrams (junk first, then a valid note), and a peer
// that sings without keeping a transcript. The
// "partner" in the last two cases is a plain UDP socket using the protocol
// crate's codec, with no peer code on that side.

use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use antiphon_counterpoint::midi::{Part, Transcript};
use antiphon_counterpoint::{Style, VoiceType};
use antiphon_peer::{PeerConfig, start_peer_with_socket};
use antiphon_protocol::{NoteEvent, decode_note, encode_note};

fn local_socket() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").unwrap()
}

fn fast_config(voice: VoiceType, partner_voice: VoiceType, partner: SocketAddr) -> PeerConfig {
    PeerConfig {
        partner_addr: partner.to_string(),
        listen_port: 0,
        voice,
        partner_voice,
        label: None,
        starts_turn: false,
        phrase_length: 4,
        style: Style::Strict,
        tick_ms: 10,
        timeout_ticks: 8,
        note_ms: 20,
        phrase_rest_ms: 30,
        seed: Some(11),
        record: true,
    }
}

fn pitches(transcript: &Transcript, part: Part) -> Vec<i32> {
    transcript
        .events()
        .iter()
        .filter(|(p, _)| *p == part)
        .map(|&(_, pitch)| pitch)
        .collect()
}

/// Receive one note on a plain socket.
fn recv_note(socket: &UdpSocket) -> NoteEvent {
    let mut buf = [0u8; 2048];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    decode_note(&buf[..len]).unwrap()
}

#[test]
fn two_peers_sing_a_duet() {
    let soprano_socket = local_socket();
    let bass_socket = local_socket();
    let soprano_addr = soprano_socket.local_addr().unwrap();
    let bass_addr = bass_socket.local_addr().unwrap();

    let soprano_config = PeerConfig {
        starts_turn: true,
        ..fast_config(VoiceType::Soprano, VoiceType::Bass, bass_addr)
    };
    let bass_config = PeerConfig {
        seed: Some(12),
        ..fast_config(VoiceType::Bass, VoiceType::Soprano, soprano_addr)
    };

    let (soprano, _) = start_peer_with_socket(soprano_config, soprano_socket).unwrap();
    let (bass, _) = start_peer_with_socket(bass_config, bass_socket).unwrap();
    assert!(soprano.is_running());

    thread::sleep(Duration::from_millis(1500));

    let soprano_transcript = soprano.stop().unwrap().unwrap();
    let bass_transcript = bass.stop().unwrap().unwrap();

    let soprano_sang = pitches(&soprano_transcript, Part::Own);
    let bass_sang = pitches(&bass_transcript, Part::Own);
    assert!(soprano_sang.len() >= 4, "soprano sang {soprano_sang:?}");
    assert!(bass_sang.len() >= 4, "bass sang {bass_sang:?}");

    // The soprano opens the duet from its opening table; the bass answers
    // with a perfect consonance below it.
    assert!(VoiceType::Soprano.opening_pitches().contains(&soprano_sang[0]));
    assert!(bass_sang[0] < soprano_sang[0]);

    // Each side heard what the other sang, in order.
    let soprano_heard = pitches(&soprano_transcript, Part::Partner);
    let bass_heard = pitches(&bass_transcript, Part::Partner);
    assert!(bass_sang.starts_with(&soprano_heard));
    assert!(soprano_sang.starts_with(&bass_heard));

    assert_eq!(soprano_transcript.own_label, "Soprano");
    assert_eq!(soprano_transcript.partner_label, "Bass");
}

#[test]
fn silent_partner_does_not_stall_a_follower() {
    let partner = local_socket();
    partner
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let config = PeerConfig {
        label: Some("Lonely Alto".into()),
        ..fast_config(
            VoiceType::Alto,
            VoiceType::Tenor,
            partner.local_addr().unwrap(),
        )
    };

    let (handle, _) = start_peer_with_socket(config, local_socket()).unwrap();

    // The follower waits out the timeout, then opens the phrase itself.
    let note = recv_note(&partner);
    assert_eq!(note.sender_label, "Lonely Alto");
    assert!(VoiceType::Alto.opening_pitches().contains(&note.pitch));

    // And keeps going with nobody answering.
    let next = recv_note(&partner);
    assert!(VoiceType::Alto.contains(next.pitch) || next.pitch == note.pitch);

    let transcript = handle.stop().unwrap().unwrap();
    assert!(pitches(&transcript, Part::Partner).is_empty());
    assert!(transcript.len() >= 2);
}

#[test]
fn junk_datagrams_are_ignored_and_notes_answered() {
    let partner = local_socket();
    partner
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let config = PeerConfig {
        // Long enough that only the partner's note can hand over the turn.
        timeout_ticks: 1000,
        ..fast_config(
            VoiceType::Soprano,
            VoiceType::Bass,
            partner.local_addr().unwrap(),
        )
    };
    let (handle, addr) = start_peer_with_socket(config, local_socket()).unwrap();

    partner.send_to(b"definitely not json", addr).unwrap();
    partner
        .send_to(br#"{"channel":"note","sender_label":"Bass"}"#, addr)
        .unwrap();
    for pitch in [i32::MAX, i32::MIN] {
        partner
            .send_to(&encode_note(&NoteEvent::new(pitch, "Bass")).unwrap(), addr)
            .unwrap();
    }
    partner
        .send_to(&encode_note(&NoteEvent::new(48, "Bass")).unwrap(), addr)
        .unwrap();

    // Response opening: the only perfect consonance with C3 inside the
    // soprano range is C4.
    let answer = recv_note(&partner);
    assert_eq!(answer.sender_label, "Soprano");
    assert_eq!(answer.pitch, 60);

    let transcript = handle.stop().unwrap().unwrap();
    assert_eq!(pitches(&transcript, Part::Partner), vec![48]);
}

#[test]
fn no_transcript_unless_recording() {
    let partner = local_socket();
    partner
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let config = PeerConfig {
        starts_turn: true,
        record: false,
        ..fast_config(
            VoiceType::Tenor,
            VoiceType::Alto,
            partner.local_addr().unwrap(),
        )
    };
    let (handle, _) = start_peer_with_socket(config, local_socket()).unwrap();

    // It still sings.
    assert!(VoiceType::Tenor.opening_pitches().contains(&recv_note(&partner).pitch));

    assert!(handle.stop().unwrap().is_none());
}
