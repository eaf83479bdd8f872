// Turn coordination for one peer.
//
// `TurnCoordinator` owns every piece of mutable state a peer has: whose turn
// it is, how long we've been waiting, both voices' recent history, and the
// phrase position. It does no I/O and keeps no clock. The runtime's player
// thread is its only owner and feeds it two kinds of input:
//
// - `on_partner_note`: a note arrived from the partner. While waiting this
//   hands us the turn; during our own turn it only updates the partner's
//   history (two peers can both hold the turn briefly after a timeout
//   override).
// - `on_tick`: the player's periodic tick. On our turn this selects, analyzes
//   and returns the note to send, then passes the turn back. While waiting it
//   counts idle ticks, and once the count exceeds the timeout threshold it
//   takes the turn anyway so a silent partner can never stall the dialogue.
//
// When a played note completes the phrase, both voices' histories are
// cleared and the phrase position rewinds, so the next phrase starts from
// the opening states again.

use antiphon_counterpoint::{
    ChoicePolicy, MoveReport, PhraseNoteSelector, PhraseState, SelectionState, VoiceState,
    analyze,
};
use antiphon_protocol::NoteEvent;

use crate::config::PeerConfig;

/// Whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    WaitingForPartner,
    MyTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    pub turn: Turn,
    /// Idle ticks spent in `WaitingForPartner` since the last transition.
    pub wait_ticks: u32,
}

impl TurnState {
    fn new(starts_turn: bool) -> Self {
        TurnState {
            turn: if starts_turn {
                Turn::MyTurn
            } else {
                Turn::WaitingForPartner
            },
            wait_ticks: 0,
        }
    }

    fn enter(&mut self, turn: Turn) {
        self.turn = turn;
        self.wait_ticks = 0;
    }
}

/// What a partner note did to the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    /// We were waiting; it is now our turn.
    TookTurn,
    /// It was already our turn; only the partner's history changed.
    HistoryOnly,
}

/// A note this peer just sang.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Played {
    pub event: NoteEvent,
    pub report: Option<MoveReport>,
    pub state: SelectionState,
    /// Phrase position the note was sung at.
    pub position: usize,
    /// The note closed its phrase and histories were reset.
    pub phrase_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Played(Played),
    Waiting { wait_ticks: u32 },
    /// Waited past the threshold; the turn was taken without a partner note.
    Override { waited: u32 },
}

pub struct TurnCoordinator {
    selector: PhraseNoteSelector,
    choice: Box<dyn ChoicePolicy + Send>,
    label: String,
    timeout_ticks: u32,
    turn: TurnState,
    own: VoiceState,
    partner: VoiceState,
    phrase: PhraseState,
}

impl TurnCoordinator {
    pub fn new(
        selector: PhraseNoteSelector,
        phrase: PhraseState,
        label: String,
        starts_turn: bool,
        timeout_ticks: u32,
        choice: Box<dyn ChoicePolicy + Send>,
    ) -> Self {
        Self {
            selector,
            choice,
            label,
            timeout_ticks,
            turn: TurnState::new(starts_turn),
            own: VoiceState::default(),
            partner: VoiceState::default(),
            phrase,
        }
    }

    pub fn from_config(config: &PeerConfig, choice: Box<dyn ChoicePolicy + Send>) -> Self {
        Self::new(
            PhraseNoteSelector::new(config.voice_pair(), config.style),
            config.phrase(),
            config.sender_label(),
            config.starts_turn,
            config.timeout_ticks,
            choice,
        )
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn is_my_turn(&self) -> bool {
        self.turn.turn == Turn::MyTurn
    }

    pub fn own(&self) -> &VoiceState {
        &self.own
    }

    pub fn partner(&self) -> &VoiceState {
        &self.partner
    }

    pub fn phrase(&self) -> &PhraseState {
        &self.phrase
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn on_partner_note(&mut self, note: &NoteEvent) -> NoteOutcome {
        self.partner.record(note.pitch);
        match self.turn.turn {
            Turn::WaitingForPartner => {
                self.turn.enter(Turn::MyTurn);
                NoteOutcome::TookTurn
            }
            Turn::MyTurn => NoteOutcome::HistoryOnly,
        }
    }

    pub fn on_tick(&mut self) -> TickOutcome {
        match self.turn.turn {
            Turn::MyTurn => TickOutcome::Played(self.play()),
            Turn::WaitingForPartner => {
                self.turn.wait_ticks += 1;
                if self.turn.wait_ticks > self.timeout_ticks {
                    let waited = self.turn.wait_ticks;
                    self.turn.enter(Turn::MyTurn);
                    TickOutcome::Override { waited }
                } else {
                    TickOutcome::Waiting {
                        wait_ticks: self.turn.wait_ticks,
                    }
                }
            }
        }
    }

    fn play(&mut self) -> Played {
        let selection =
            self.selector
                .select(&self.partner, &self.own, &self.phrase, self.choice.as_mut());
        let report = analyze(
            self.partner.previous,
            self.partner.current,
            self.own.current,
            selection.pitch,
        );
        self.own.record(selection.pitch);

        let position = self.phrase.position;
        let phrase_complete = self.phrase.advance();
        if phrase_complete {
            self.own.clear();
            self.partner.clear();
        }
        self.turn.enter(Turn::WaitingForPartner);

        Played {
            event: NoteEvent::new(selection.pitch, self.label.clone()),
            report,
            state: selection.state,
            position,
            phrase_complete,
        }
    }
}
