// antiphon_peer: one voice of a two-voice antiphon.
//
// A peer listens for its partner's notes over UDP, answers each one with a
// note chosen by the counterpoint engine (`antiphon_counterpoint`), and
// sends that note back. The two peers alternate strictly under normal
// operation; a timeout lets a peer take the turn when its partner goes
// quiet, so the dialogue keeps moving through lost datagrams or a missing
// partner.
//
// Module overview:
// - `config.rs`:      `PeerConfig`, JSON-loadable with defaults, and its
//                     validation.
// - `coordinator.rs`: `TurnCoordinator`, the turn/voice/phrase state machine.
//                     No I/O; returns outcomes for the runtime to act on.
// - `transport.rs`:   UDP send (fire-and-forget) and the listener loop.
// - `runtime.rs`:     Listener and player threads, the `mpsc` mailbox
//                     between them, and `PeerHandle` for shutdown.
//
// The peer can run as a standalone binary (`main.rs`) or be embedded via the
// library API (`start_peer`), which is how the integration tests run two
// peers against each other on localhost.

pub mod config;
pub mod coordinator;
pub mod runtime;
pub mod transport;

pub use config::{ConfigError, PeerConfig};
pub use coordinator::{NoteOutcome, Played, TickOutcome, Turn, TurnCoordinator, TurnState};
pub use runtime::{PeerError, PeerEvent, PeerHandle, start_peer, start_peer_with_socket};
