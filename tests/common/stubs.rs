//! Recording collaborator stubs.
//!
//! Every stub appends what it was asked to do to one shared [`Journal`], so tests
//! can assert on the relative order of calls across collaborators (e.g. that a reply
//! was sent before the point-blank shot handler was activated).

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::use_self
)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use wargame_session::prelude::*;
use wargame_session::{AuxPanelKind, InboundQueue};

/// One observable collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Sent(CfrResponse),
    Choose(ChoicePrompt),
    Confirm(ConfirmPrompt),
    Title(String),
    ShowMain(SurfaceId),
    ShowSecondary(Option<SurfaceId>),
    ClearBoardCaches,
    TeardownLobbyPreview,
    PhaseChanged(Phase, u32),
    PlayerDisconnected(PlayerId),
    GameEnded,
    Panel(AuxPanelKind, bool),
    Built(Phase),
    Handler(usize, HandlerCall),
}

/// A call on a [`RecordingHandler`], tagged with the handler's build ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerCall {
    Activate,
    Deactivate,
    Ignoring(bool),
    Board(BoardEvent),
    Command(String),
    Seed(EntityId, EntityId),
    Rebind,
}

/// Shared, ordered call log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn record(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    /// Every reply sent so far.
    pub fn sent(&self) -> Vec<CfrResponse> {
        self.0
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Sent(response) => Some(response.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of prompts (choice and confirm) shown so far.
    pub fn prompts(&self) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::Choose(_) | Call::Confirm(_)))
            .count()
    }

    /// The last choice prompt shown.
    pub fn last_choice(&self) -> Option<ChoicePrompt> {
        self.0.lock().iter().rev().find_map(|call| match call {
            Call::Choose(prompt) => Some(prompt.clone()),
            _ => None,
        })
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.lock().iter().position(pred)
    }

    /// Every call made on the handler built `ordinal`-th.
    pub fn handler_calls(&self, ordinal: usize) -> Vec<HandlerCall> {
        self.0
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Handler(n, inner) if *n == ordinal => Some(inner.clone()),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingSink {
    pub journal: Journal,
}

impl CommandSink for RecordingSink {
    fn send_cfr_response(&mut self, response: &CfrResponse) {
        self.journal.record(Call::Sent(response.clone()));
    }
}

/// Rules with fixed answers.
pub struct StubRules {
    pub forward: bool,
    pub backward: bool,
    pub point_blank: bool,
}

impl Default for StubRules {
    fn default() -> Self {
        Self {
            forward: true,
            backward: true,
            point_blank: true,
        }
    }
}

impl RulesOracle for StubRules {
    fn is_legal_step(&self, _entity: &EntitySummary, direction: StepDirection) -> bool {
        match direction {
            StepDirection::Forward => self.forward,
            StepDirection::Backward => self.backward,
        }
    }

    fn is_legal_point_blank_pair(&self, _: &EntitySummary, _: &EntitySummary) -> bool {
        self.point_blank
    }
}

/// Answers prompts from scripts; an exhausted script dismisses.
///
/// Events in `push_during_prompt` are pushed onto `queue` while the next prompt is
/// open, imitating the transport delivering events while the player decides.
pub struct ScriptedPrompter {
    pub journal: Journal,
    pub choices: VecDeque<Choice>,
    pub confirmations: VecDeque<Confirmation>,
    pub queue: Option<InboundQueue>,
    pub push_during_prompt: Vec<SessionEvent>,
    pub panic_on_prompt: bool,
}

impl ScriptedPrompter {
    fn opened(&mut self) {
        if let Some(queue) = &self.queue {
            queue.extend(self.push_during_prompt.drain(..));
        }
        if self.panic_on_prompt {
            self.panic_on_prompt = false;
            panic!("dialog toolkit crashed");
        }
    }
}

impl DecisionPrompter for ScriptedPrompter {
    fn choose(&mut self, prompt: &ChoicePrompt) -> Choice {
        self.journal.record(Call::Choose(prompt.clone()));
        self.opened();
        self.choices.pop_front().unwrap_or(Choice::Dismissed)
    }

    fn confirm(&mut self, prompt: &ConfirmPrompt) -> Confirmation {
        self.journal.record(Call::Confirm(prompt.clone()));
        self.opened();
        self.confirmations
            .pop_front()
            .unwrap_or(Confirmation::Dismissed)
    }
}

pub struct RecordingHandler {
    ordinal: usize,
    phase: Phase,
    caps: Capabilities,
    ignoring: bool,
    journal: Journal,
}

impl RecordingHandler {
    fn log(&self, call: HandlerCall) {
        self.journal.record(Call::Handler(self.ordinal, call));
    }
}

impl PhaseHandler for RecordingHandler {
    fn activate(&mut self) {
        self.log(HandlerCall::Activate);
    }

    fn deactivate(&mut self) {
        self.log(HandlerCall::Deactivate);
    }

    fn set_ignoring_input(&mut self, ignoring: bool) {
        self.ignoring = ignoring;
        self.log(HandlerCall::Ignoring(ignoring));
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn on_board_event(&mut self, event: &BoardEvent) {
        assert!(!self.ignoring, "input delivered to an ignoring handler");
        self.log(HandlerCall::Board(event.clone()));
    }

    fn on_command(&mut self, command: &str) {
        assert!(!self.ignoring, "command delivered to an ignoring handler");
        self.log(HandlerCall::Command(command.to_owned()));
    }

    fn seed_point_blank(&mut self, attacker: EntityId, target: EntityId) -> bool {
        self.log(HandlerCall::Seed(attacker, target));
        self.phase == Phase::PointBlankShot
    }

    fn rebind_status_widget(&mut self) {
        self.log(HandlerCall::Rebind);
    }
}

/// Builds [`RecordingHandler`]s; numbering starts at 0 in build order.
pub struct StubFactory {
    pub journal: Journal,
    pub fail_on: Option<Phase>,
    pub capabilities: BTreeMap<Phase, Capabilities>,
    built: usize,
}

impl HandlerFactory for StubFactory {
    fn build(&mut self, phase: Phase) -> Result<Box<dyn PhaseHandler>, HandlerBuildError> {
        if self.fail_on == Some(phase) {
            return Err(HandlerBuildError::new("board images unavailable"));
        }
        let ordinal = self.built;
        self.built += 1;
        self.journal.record(Call::Built(phase));
        Ok(Box::new(RecordingHandler {
            ordinal,
            phase,
            caps: self.capabilities.get(&phase).copied().unwrap_or_default(),
            ignoring: false,
            journal: self.journal.clone(),
        }))
    }
}

pub struct StubPanels {
    pub journal: Journal,
    pub visible: BTreeMap<AuxPanelKind, bool>,
}

impl AuxPanels for StubPanels {
    fn set_visible(&mut self, kind: AuxPanelKind, visible: bool) {
        self.journal.record(Call::Panel(kind, visible));
        self.visible.insert(kind, visible);
    }

    fn is_visible(&self, kind: AuxPanelKind) -> bool {
        self.visible.get(&kind).copied().unwrap_or(false)
    }
}

pub struct RecordingShell {
    pub journal: Journal,
}

impl ClientShell for RecordingShell {
    fn set_title(&mut self, title: &str) {
        self.journal.record(Call::Title(title.to_owned()));
    }

    fn show_main(&mut self, surface: SurfaceId) {
        self.journal.record(Call::ShowMain(surface));
    }

    fn show_secondary(&mut self, surface: Option<SurfaceId>) {
        self.journal.record(Call::ShowSecondary(surface));
    }

    fn clear_board_caches(&mut self) {
        self.journal.record(Call::ClearBoardCaches);
    }

    fn teardown_lobby_preview(&mut self) {
        self.journal.record(Call::TeardownLobbyPreview);
    }

    fn on_phase_changed(&mut self, phase: Phase, round: u32) {
        self.journal.record(Call::PhaseChanged(phase, round));
    }

    fn on_player_disconnected(&mut self, player: PlayerId) {
        self.journal.record(Call::PlayerDisconnected(player));
    }

    fn on_game_ended(&mut self) {
        self.journal.record(Call::GameEnded);
    }
}

#[derive(Debug)]
pub struct StubConfig;

impl Config for StubConfig {
    type Sink = RecordingSink;
    type Rules = StubRules;
    type Prompter = ScriptedPrompter;
    type Factory = StubFactory;
    type Panels = StubPanels;
    type Shell = RecordingShell;
}

/// A full set of stubs writing to `journal`.
pub fn collaborators(journal: &Journal) -> Collaborators<StubConfig> {
    Collaborators {
        sink: RecordingSink {
            journal: journal.clone(),
        },
        rules: StubRules::default(),
        prompter: ScriptedPrompter {
            journal: journal.clone(),
            choices: VecDeque::new(),
            confirmations: VecDeque::new(),
            queue: None,
            push_during_prompt: Vec::new(),
            panic_on_prompt: false,
        },
        factory: StubFactory {
            journal: journal.clone(),
            fail_on: None,
            capabilities: BTreeMap::new(),
            built: 0,
        },
        panels: StubPanels {
            journal: journal.clone(),
            visible: BTreeMap::new(),
        },
        shell: RecordingShell {
            journal: journal.clone(),
        },
    }
}
