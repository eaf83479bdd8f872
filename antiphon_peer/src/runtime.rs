// Peer runtime: a listener thread and a player thread around one
// `TurnCoordinator`.
//
// Architecture:
//
// - **Listener thread** (`transport::listen`): blocks on the UDP socket,
//   decodes note datagrams and sends `PeerEvent::Note` into an `mpsc`
//   mailbox.
// - **Player thread** (`run_player`): the only owner of the coordinator, so
//   turn, voice and phrase state have a single writer. It waits on the
//   mailbox with `recv_timeout` up to the next tick deadline, applying
//   partner notes as they arrive and calling `on_tick` when the deadline
//   passes. This gives us the tick timer without a separate timer thread.
//
// After singing, the player holds for one note slot (plus a phrase rest at a
// phrase boundary) before its next tick. Partner notes arriving during the
// hold are still applied immediately.
//
// Shutdown: `PeerHandle::stop` clears `keep_running`. Both threads poll the
// flag at least once per tick/listen period, then the handle joins them and
// returns the transcript the player kept, if `PeerConfig::record` asked for
// one.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use antiphon_counterpoint::midi::{Part, Transcript};
use antiphon_counterpoint::pitch::pitch_name;
use antiphon_counterpoint::{ChoicePolicy, RandomChoice};
use antiphon_protocol::NoteEvent;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PeerConfig};
use crate::coordinator::{TickOutcome, TurnCoordinator};
use crate::transport::{NoteSender, listen};

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot bind UDP port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("socket setup failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("player thread panicked")]
    PlayerPanicked,
}

/// Events delivered to the player thread's mailbox.
#[derive(Debug)]
pub enum PeerEvent {
    Note { note: NoteEvent, from: SocketAddr },
}

/// Handle returned by `start_peer` to stop a running peer.
pub struct PeerHandle {
    keep_running: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    player: Option<JoinHandle<Option<Transcript>>>,
}

impl PeerHandle {
    pub fn is_running(&self) -> bool {
        self.keep_running.load(Ordering::SeqCst)
    }

    /// Signal both threads to stop, wait for them, and return everything the
    /// peer heard and sang when recording was enabled.
    pub fn stop(mut self) -> Result<Option<Transcript>, PeerError> {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(listener) = self.listener.take() {
            join_listener(listener);
        }
        match self.player.take() {
            Some(player) => player.join().map_err(|_| PeerError::PlayerPanicked),
            None => Err(PeerError::PlayerPanicked),
        }
    }
}

/// Wait for the listener, logging a panic instead of failing the stop.
/// Returns false if it panicked.
fn join_listener(listener: JoinHandle<()>) -> bool {
    match listener.join() {
        Ok(()) => true,
        Err(_) => {
            warn!("listener thread panicked");
            false
        }
    }
}

impl Drop for PeerHandle {
    fn drop(&mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
    }
}

/// Bind the configured listen port on all interfaces and start the peer.
/// Returns the handle and the bound address (useful with port 0).
pub fn start_peer(config: PeerConfig) -> Result<(PeerHandle, SocketAddr), PeerError> {
    let port = config.listen_port;
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
        .map_err(|source| PeerError::Bind { port, source })?;
    start_peer_with_socket(config, socket)
}

/// Start a peer on an already-bound socket. `config.listen_port` is ignored.
pub fn start_peer_with_socket(
    config: PeerConfig,
    socket: UdpSocket,
) -> Result<(PeerHandle, SocketAddr), PeerError> {
    let partner = config.validate()?;
    let local_addr = socket.local_addr()?;
    let sender = NoteSender::new(socket.try_clone()?, partner);

    let choice: Box<dyn ChoicePolicy + Send> = match config.seed {
        Some(seed) => Box::new(RandomChoice::seeded(seed)),
        None => Box::new(RandomChoice::from_entropy()),
    };
    let coordinator = TurnCoordinator::from_config(&config, choice);

    info!(
        %local_addr,
        %partner,
        voice = %config.voice,
        partner_voice = %config.partner_voice,
        style = %config.style,
        leads = config.starts_turn,
        "peer starting"
    );

    let keep_running = Arc::new(AtomicBool::new(true));
    let (tx, rx) = mpsc::channel();

    let keep_running_listener = keep_running.clone();
    let listener = thread::spawn(move || listen(socket, tx, keep_running_listener));

    let keep_running_player = keep_running.clone();
    let player =
        thread::spawn(move || run_player(coordinator, sender, rx, config, keep_running_player));

    Ok((
        PeerHandle {
            keep_running,
            listener: Some(listener),
            player: Some(player),
        },
        local_addr,
    ))
}

/// Player loop. Runs until `keep_running` is cleared or the listener goes
/// away.
fn run_player(
    mut coordinator: TurnCoordinator,
    sender: NoteSender,
    rx: Receiver<PeerEvent>,
    config: PeerConfig,
    keep_running: Arc<AtomicBool>,
) -> Option<Transcript> {
    let mut transcript = config
        .record
        .then(|| Transcript::new(coordinator.label(), config.partner_voice.label()));
    let tick = config.tick();
    let mut next_tick = Instant::now() + tick;

    while keep_running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= next_tick {
            next_tick = now + handle_tick(&mut coordinator, &sender, &mut transcript, &config);
            continue;
        }
        // Never sleep past one tick so a stop request is noticed promptly.
        match rx.recv_timeout((next_tick - now).min(tick)) {
            Ok(event) => handle_event(&mut coordinator, &mut transcript, event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    transcript
}

fn handle_event(
    coordinator: &mut TurnCoordinator,
    transcript: &mut Option<Transcript>,
    event: PeerEvent,
) {
    match event {
        PeerEvent::Note { note, from } => {
            if let Some(transcript) = transcript {
                transcript.push(Part::Partner, note.pitch);
            }
            let outcome = coordinator.on_partner_note(&note);
            info!(
                %from,
                sender = %note.sender_label,
                pitch = note.pitch,
                note = %pitch_name(note.pitch),
                ?outcome,
                "heard"
            );
        }
    }
}

/// Run one tick and return how long to wait before the next.
fn handle_tick(
    coordinator: &mut TurnCoordinator,
    sender: &NoteSender,
    transcript: &mut Option<Transcript>,
    config: &PeerConfig,
) -> Duration {
    match coordinator.on_tick() {
        TickOutcome::Played(played) => {
            sender.send(&played.event);
            if let Some(transcript) = transcript {
                transcript.push(Part::Own, played.event.pitch);
            }
            let analysis = played
                .report
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            info!(
                pitch = played.event.pitch,
                note = %pitch_name(played.event.pitch),
                state = %played.state,
                position = played.position,
                %analysis,
                "played"
            );
            if played.phrase_complete {
                info!(
                    length = coordinator.phrase().length,
                    "phrase complete, resting"
                );
            }
            config.hold_after(played.phrase_complete)
        }
        TickOutcome::Waiting { wait_ticks } => {
            debug!(wait_ticks, "waiting for partner");
            config.tick()
        }
        TickOutcome::Override { waited } => {
            warn!(waited, partner = %sender.partner(), "partner silent, taking the turn");
            config.tick()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_panic_is_reported_not_propagated() {
        let listener = thread::spawn(|| panic!("socket gone"));
        assert!(!join_listener(listener));
        assert!(join_listener(thread::spawn(|| {})));
    }
}
