//! # Scripted Session Example
//!
//! Plays a short, canned server script through a [`SessionController`] whose
//! collaborators print what they are asked to do:
//!
//! 1. The lobby, deployment and the first round's phases are announced
//! 2. Feedback requests arrive mid-phase and are answered by a console "player"
//! 3. The game ends while a late request is still in flight
//!
//! Run with: `cargo run --example scripted_session -- --accept --pick 1`
//!
//! Use `--bot` to see how an automated client skips domino effects, and
//! `--policy <file>` to load a panel policy written by `PanelPolicy::to_json`.

// Allow example-specific patterns
#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use wargame_session::prelude::*;
use wargame_session::telemetry::CollectingObserver;
use wargame_session::{AttackCandidate, CfrKind, TargetKind, TargetRef};

#[derive(Parser)]
struct Opt {
    /// Accept point-blank shots.
    #[arg(short, long)]
    accept: bool,
    /// Option index picked in every choice prompt; dismisses when out of range.
    #[arg(short, long)]
    pick: Option<usize>,
    /// Run as an automated client.
    #[arg(short, long)]
    bot: bool,
    /// Window title base.
    #[arg(short, long, default_value = "Skirmish")]
    title: String,
    /// Panel policy JSON to load.
    #[arg(long)]
    policy: Option<PathBuf>,
}

// ============================================================================
// Console Collaborators
// ============================================================================

struct ConsoleSink;

impl CommandSink for ConsoleSink {
    fn send_cfr_response(&mut self, response: &CfrResponse) {
        println!("  -> server: {response:?}");
    }
}

/// Everything is legal except stepping forward.
struct LenientRules;

impl RulesOracle for LenientRules {
    fn is_legal_step(&self, _entity: &EntitySummary, direction: StepDirection) -> bool {
        direction == StepDirection::Backward
    }

    fn is_legal_point_blank_pair(&self, _: &EntitySummary, _: &EntitySummary) -> bool {
        true
    }
}

struct ConsolePlayer {
    accept: bool,
    pick: Option<usize>,
}

impl DecisionPrompter for ConsolePlayer {
    fn choose(&mut self, prompt: &ChoicePrompt) -> Choice {
        println!("  [{}] {}", prompt.title, prompt.question);
        for (index, option) in prompt.options.iter().enumerate() {
            println!("      {index}: {option}");
        }
        match self.pick {
            Some(index) => Choice::Selected(index),
            None => Choice::Dismissed,
        }
    }

    fn confirm(&mut self, prompt: &ConfirmPrompt) -> Confirmation {
        println!("  [{}] {}", prompt.title, prompt.question);
        if self.accept {
            Confirmation::Accepted
        } else {
            Confirmation::Declined
        }
    }
}

struct ConsoleHandler {
    phase: Phase,
}

impl PhaseHandler for ConsoleHandler {
    fn activate(&mut self) {
        println!("  {} handler active", self.phase);
    }

    fn set_ignoring_input(&mut self, _ignoring: bool) {}

    fn on_board_event(&mut self, event: &BoardEvent) {
        println!("  {} handler got {event:?}", self.phase);
    }

    fn on_command(&mut self, command: &str) {
        println!("  {} handler got command {command:?}", self.phase);
    }

    fn seed_point_blank(&mut self, attacker: EntityId, target: EntityId) -> bool {
        println!("  point blank shot {attacker} -> {target} ready");
        self.phase == Phase::PointBlankShot
    }
}

struct ConsoleFactory;

impl HandlerFactory for ConsoleFactory {
    fn build(&mut self, phase: Phase) -> Result<Box<dyn PhaseHandler>, HandlerBuildError> {
        Ok(Box::new(ConsoleHandler { phase }))
    }
}

#[derive(Default)]
struct ConsolePanels {
    visible: BTreeSet<AuxPanelKind>,
}

impl AuxPanels for ConsolePanels {
    fn set_visible(&mut self, kind: AuxPanelKind, visible: bool) {
        if visible {
            self.visible.insert(kind);
        } else {
            self.visible.remove(&kind);
        }
    }

    fn is_visible(&self, kind: AuxPanelKind) -> bool {
        self.visible.contains(&kind)
    }
}

struct ConsoleShell;

impl ClientShell for ConsoleShell {
    fn set_title(&mut self, title: &str) {
        println!("  title: {title}");
    }

    fn show_main(&mut self, surface: SurfaceId) {
        println!("  main: {surface:?}");
    }

    fn show_secondary(&mut self, surface: Option<SurfaceId>) {
        println!("  secondary: {surface:?}");
    }

    fn clear_board_caches(&mut self) {
        println!("  board caches cleared");
    }

    fn teardown_lobby_preview(&mut self) {
        println!("  lobby preview discarded");
    }

    fn on_game_ended(&mut self) {
        println!("  game over");
    }
}

struct ConsoleClient;

impl Config for ConsoleClient {
    type Sink = ConsoleSink;
    type Rules = LenientRules;
    type Prompter = ConsolePlayer;
    type Factory = ConsoleFactory;
    type Panels = ConsolePanels;
    type Shell = ConsoleShell;
}

// ============================================================================
// Server Script
// ============================================================================

fn phase(phase: Phase, round: u32) -> SessionEvent {
    SessionEvent::PhaseChanged { phase, round }
}

fn cfr(request: &CfrRequest) -> SessionEvent {
    SessionEvent::Cfr(CfrPacket::from(request))
}

fn server_script() -> Vec<SessionEvent> {
    let raven = EntityId::new(3);
    let atlas = EntityId::new(7);
    let locust = EntityId::new(9);
    let catapult = EntityId::new(11);
    let me = PlayerId::new(0);
    let enemy = PlayerId::new(1);

    vec![
        phase(Phase::Lobby, 0),
        phase(Phase::Exchange, 0),
        SessionEvent::EntityNew(EntitySummary::new(raven, "Raven RVN-3L", me).at(4, 4)),
        SessionEvent::EntityNew(
            EntitySummary::new(atlas, "Atlas AS7-D", me)
                .with_weapon(1, "Anti-Missile System")
                .at(6, 8),
        ),
        SessionEvent::EntityNew(
            EntitySummary::new(locust, "Locust LCT-1V", enemy)
                .with_weapon(4, "LRM 20")
                .at(4, 5),
        ),
        SessionEvent::EntityNew(
            EntitySummary::new(catapult, "Catapult CPLT-C1", enemy)
                .with_weapon(5, "LRM 15")
                .at(10, 2),
        ),
        phase(Phase::Deployment, 0),
        phase(Phase::Initiative, 1),
        phase(Phase::InitiativeReport, 1),
        phase(Phase::Movement, 1),
        cfr(&CfrRequest::DominoEffect { entity: atlas }),
        cfr(&CfrRequest::HiddenPointBlankShot {
            attacker: raven,
            target: locust,
        }),
        phase(Phase::MovementReport, 1),
        phase(Phase::Firing, 1),
        cfr(&CfrRequest::AmsAssign {
            entity: atlas,
            attacks: vec![
                AttackCandidate {
                    attacker: locust,
                    weapon: 4,
                },
                AttackCandidate {
                    attacker: catapult,
                    weapon: 5,
                },
            ],
        }),
        cfr(&CfrRequest::TeleguidedTarget {
            candidates: vec![locust, catapult],
            to_hit: vec![7, 9],
        }),
        phase(Phase::FiringReport, 1),
        SessionEvent::PlayerDisconnected { player: enemy },
        SessionEvent::GameEnded,
        cfr(&CfrRequest::TagTarget {
            targets: vec![TargetRef {
                kind: TargetKind::Hex,
                id: 1203,
            }],
        }),
        SessionEvent::Cfr(CfrPacket::new(99, vec![1], vec![])),
        phase(Phase::Victory, 1),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // configure logging: output session logs to standard out
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .finish(),
    )
    .expect("setting up tracing subscriber failed");

    let opt = Opt::parse();

    let policy = match &opt.policy {
        Some(path) => PanelPolicy::from_json(&std::fs::read_to_string(path)?)?,
        None => PanelPolicy::default(),
    };

    let observer = Arc::new(CollectingObserver::new());
    let mut session = SessionBuilder::<ConsoleClient>::new()
        .with_title_base(opt.title.as_str())?
        .with_automated_client(opt.bot)
        .with_panel_policy(policy)
        .with_violation_observer(observer.clone())
        .start_session(Collaborators {
            sink: ConsoleSink,
            rules: LenientRules,
            prompter: ConsolePlayer {
                accept: opt.accept,
                pick: opt.pick,
            },
            factory: ConsoleFactory,
            panels: ConsolePanels::default(),
            shell: ConsoleShell,
        })?;

    let inbound = session.inbound();
    for event in server_script() {
        println!("<- {event:?}");
        inbound.push(event);
        session.pump()?;

        if session.current_phase() == Phase::Movement {
            session.dispatch_board_event(&BoardEvent::HexSelected { x: 5, y: 5 })?;
        }
    }
    session.dispatch_command("done")?;

    println!();
    println!("final phase: {}", session.current_phase());
    println!("state: {:?}", session.state());
    println!("replies sent: {}", session.responses_sent());
    println!(
        "visible panels: {:?}",
        session.collaborators().panels.visible
    );
    println!("kinds understood: {:?}", CfrKind::ALL);
    for violation in observer.violations() {
        println!("violation: {violation}");
    }
    Ok(())
}
