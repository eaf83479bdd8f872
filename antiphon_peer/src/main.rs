// CLI entry point for an antiphon peer.
//
// Runs one voice of the duet until Enter is pressed on stdin or the optional
// `--duration` elapses. Start two peers pointed at each other, exactly one of
// them with `--lead`. See `runtime.rs` for the threading model and
// `coordinator.rs` for the turn-taking rules.
//
// Configuration comes from an optional JSON file (`--config`), then any
// flags given on the command line override individual fields. With
// `--record`, the heard and sung notes are written to a MIDI file on exit.
//
// Log verbosity follows `RUST_LOG` (default `info`).

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use antiphon_counterpoint::midi::write_transcript;
use antiphon_counterpoint::{Style, VoiceType};
use antiphon_peer::{PeerConfig, PeerError, start_peer};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "antiphon",
    version,
    about = "Sing one voice of a two-voice counterpoint dialogue over UDP"
)]
struct Args {
    /// JSON config file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Partner address, host:port.
    #[arg(long)]
    partner: Option<String>,
    /// UDP port to listen on.
    #[arg(long)]
    port: Option<u16>,
    /// Voice to sing: soprano, alto, tenor or bass.
    #[arg(long)]
    voice: Option<VoiceType>,
    /// Voice the partner sings.
    #[arg(long)]
    partner_voice: Option<VoiceType>,
    /// Sender label on outgoing notes.
    #[arg(long)]
    label: Option<String>,
    /// Sing the first note.
    #[arg(long, conflicts_with = "follow")]
    lead: bool,
    /// Wait for the partner's first note.
    #[arg(long)]
    follow: bool,
    /// Notes per phrase.
    #[arg(long)]
    phrase_length: Option<usize>,
    /// strict, free or cadential.
    #[arg(long)]
    style: Option<Style>,
    /// Seed for reproducible note choices.
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many seconds.
    #[arg(long)]
    duration: Option<u64>,
    /// Write a MIDI transcript here on exit.
    #[arg(long)]
    record: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(PeerConfig, RunOptions), PeerError> {
        let mut config = match &self.config {
            Some(path) => PeerConfig::load(path)?,
            None => PeerConfig::default(),
        };
        if let Some(partner) = self.partner {
            config.partner_addr = partner;
        }
        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(voice) = self.voice {
            config.voice = voice;
        }
        if let Some(partner_voice) = self.partner_voice {
            config.partner_voice = partner_voice;
        }
        if self.label.is_some() {
            config.label = self.label;
        }
        if self.lead {
            config.starts_turn = true;
        }
        if self.follow {
            config.starts_turn = false;
        }
        if let Some(phrase_length) = self.phrase_length {
            config.phrase_length = phrase_length;
        }
        if let Some(style) = self.style {
            config.style = style;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.record = self.record.is_some();
        let options = RunOptions {
            duration: self.duration.map(Duration::from_secs),
            record: self.record,
        };
        Ok((config, options))
    }
}

struct RunOptions {
    duration: Option<Duration>,
    record: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("antiphon: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), PeerError> {
    let (config, options) = args.into_config()?;
    let (handle, addr) = start_peer(config)?;

    println!("Listening on {addr}");
    match options.duration {
        Some(duration) => println!(
            "Singing for {}s (or press Enter to stop).",
            duration.as_secs()
        ),
        None => println!("Press Enter to stop."),
    }
    wait_for_stop(options.duration);

    info!("shutting down");
    let transcript = handle.stop()?;
    if let (Some(path), Some(transcript)) = (options.record, transcript) {
        match write_transcript(&transcript, &path) {
            Ok(()) => info!(
                path = %path.display(),
                notes = transcript.len(),
                "transcript written"
            ),
            Err(e) => error!(
                path = %path.display(),
                error = %e,
                "could not write transcript"
            ),
        }
    }
    Ok(())
}

/// Block until a line arrives on stdin or `duration` elapses. With stdin
/// closed and no duration, runs until the process is killed.
fn wait_for_stop(duration: Option<Duration>) {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(n) if n > 0 => {
                let _ = tx.send(());
            }
            // Stdin closed: keep the sender alive so only the timer ends the run.
            _ => loop {
                thread::park();
            },
        }
    });

    match duration {
        Some(duration) => {
            let _ = rx.recv_timeout(duration);
        }
        None => {
            let _ = rx.recv();
        }
    }
}
