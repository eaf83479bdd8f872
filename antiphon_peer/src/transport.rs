// UDP note transport.
//
// Outbound: `NoteSender` encodes a `NoteEvent` and fires it at the partner.
// Delivery is not confirmed and send failures are only logged; a lost note
// shows up on the other side as a timeout override, never as an error here.
//
// Inbound: `listen` runs on the listener thread. It blocks on the socket
// with a short read timeout so it can notice `keep_running` going false,
// decodes each datagram, and forwards well-formed notes to the player
// thread's mailbox. Anything the codec rejects is dropped with a warning.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;

use antiphon_protocol::{MAX_DATAGRAM_SIZE, NoteEvent, decode_note, encode_note};
use tracing::{debug, warn};

use crate::runtime::PeerEvent;

/// How long the listener blocks before rechecking `keep_running`.
pub const LISTEN_POLL: Duration = Duration::from_millis(100);

pub struct NoteSender {
    socket: UdpSocket,
    partner: SocketAddr,
}

impl NoteSender {
    pub fn new(socket: UdpSocket, partner: SocketAddr) -> Self {
        Self { socket, partner }
    }

    pub fn partner(&self) -> SocketAddr {
        self.partner
    }

    /// Fire-and-forget. Returns whether the datagram left the socket.
    pub fn send(&self, note: &NoteEvent) -> bool {
        let bytes = match encode_note(note) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "could not encode note");
                return false;
            }
        };
        match self.socket.send_to(&bytes, self.partner) {
            Ok(_) => true,
            Err(e) => {
                warn!(partner = %self.partner, error = %e, "note send failed");
                false
            }
        }
    }
}

/// Listener loop. Returns when `keep_running` clears or the mailbox closes.
pub fn listen(socket: UdpSocket, tx: Sender<PeerEvent>, keep_running: Arc<AtomicBool>) {
    if let Err(e) = socket.set_read_timeout(Some(LISTEN_POLL)) {
        warn!(error = %e, "could not set listener read timeout");
    }
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    while keep_running.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => match decode_note(&buf[..len]) {
                Ok(note) => {
                    debug!(%from, pitch = note.pitch, "datagram received");
                    if tx.send(PeerEvent::Note { note, from }).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(%from, error = %e, "dropping datagram"),
            },
            Err(ref e) if is_timeout(e) => {}
            Err(e) => {
                // ICMP port-unreachable from an earlier send surfaces here on
                // some platforms. Not fatal.
                warn!(error = %e, "receive failed");
                std::thread::sleep(LISTEN_POLL);
            }
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
