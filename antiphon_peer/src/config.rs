// Peer configuration.
//
// `PeerConfig` is everything one peer needs to join a duet: where its
// partner listens, which port it listens on itself, which voice it sings and
// which voice it answers, whether it sings first, and the phrase/style/timing
// knobs. It is plain serde data: the binary loads it from an optional JSON
// file (missing fields take their defaults) and then applies command-line
// overrides on top.
//
// `validate()` is the only gate between raw configuration and the runtime.
// It resolves the partner address and rejects values the turn loop cannot
// work with (an empty phrase, a zero tick).

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use antiphon_counterpoint::{PhraseState, Style, VoicePair, VoiceType};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Where the partner peer listens, `host:port`.
    pub partner_addr: String,
    /// UDP port this peer listens on. 0 lets the OS pick.
    pub listen_port: u16,
    pub voice: VoiceType,
    pub partner_voice: VoiceType,
    /// Sender label put on outgoing notes. Defaults to the voice name.
    pub label: Option<String>,
    /// Whether this peer sings the first note. Exactly one of the two peers
    /// should set this.
    pub starts_turn: bool,
    pub phrase_length: usize,
    pub style: Style,
    /// Player tick period.
    pub tick_ms: u64,
    /// Idle ticks tolerated while waiting before taking the turn anyway.
    pub timeout_ticks: u32,
    /// Hold after playing a note.
    pub note_ms: u64,
    /// Extra hold after the last note of a phrase.
    pub phrase_rest_ms: u64,
    /// Seed for note choices. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Keep a transcript of heard and sung notes for `PeerHandle::stop`.
    pub record: bool,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            partner_addr: "127.0.0.1:4560".into(),
            listen_port: 4561,
            voice: VoiceType::Soprano,
            partner_voice: VoiceType::Bass,
            label: None,
            starts_turn: true,
            phrase_length: antiphon_counterpoint::selector::DEFAULT_PHRASE_LENGTH,
            style: Style::Strict,
            tick_ms: 250,
            timeout_ticks: 8,
            note_ms: 1000,
            phrase_rest_ms: 2000,
            seed: None,
            record: false,
        }
    }
}

impl PeerConfig {
    /// Load a config from a JSON file. Fields not present keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the config and resolve the partner address.
    pub fn validate(&self) -> Result<SocketAddr, ConfigError> {
        if self.phrase_length == 0 {
            return Err(ConfigError::Invalid("phrase_length must be at least 1".into()));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be at least 1".into()));
        }
        self.partner_socket_addr()
    }

    pub fn partner_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bad = || ConfigError::Invalid(format!("bad partner address '{}'", self.partner_addr));
        self.partner_addr
            .to_socket_addrs()
            .map_err(|_| bad())?
            .next()
            .ok_or_else(bad)
    }

    pub fn sender_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.voice.label().to_string())
    }

    pub fn voice_pair(&self) -> VoicePair {
        VoicePair::new(self.voice, self.partner_voice)
    }

    pub fn phrase(&self) -> PhraseState {
        PhraseState::new(self.phrase_length)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// How long the player holds after a note, including the phrase rest when
    /// the note closed a phrase.
    pub fn hold_after(&self, phrase_complete: bool) -> Duration {
        let rest = if phrase_complete {
            self.phrase_rest_ms
        } else {
            0
        };
        Duration::from_millis(self.note_ms + rest)
    }
}
