//! Phase transition tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use crate::common::stubs::{Call, HandlerCall, StubConfig};
use crate::common::{harness, harness_with};
use wargame_session::prelude::*;
use wargame_session::telemetry::ViolationKind;
use wargame_session::{assert_no_violations, AuxPanelKind, InputSource};

#[test]
fn starts_in_unknown_without_handler() {
    let h = harness();
    assert_eq!(h.session.current_phase(), Phase::Unknown);
    assert_eq!(h.session.current_handler(), None);
    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.session.title(), "Wargame");
    assert!(h.session.router().registered_ids().is_empty());
}

#[test]
fn transition_steps_run_in_order() {
    let mut h = harness();
    h.enter(Phase::Deployment, 1);
    h.journal.clear();
    h.enter(Phase::Movement, 1);

    let calls = h.journal.calls();
    let first = |pred: &dyn Fn(&Call) -> bool| calls.iter().position(pred).unwrap();
    let old_ignoring = first(&|c| *c == Call::Handler(0, HandlerCall::Ignoring(true)));
    let built = first(&|c| *c == Call::Built(Phase::Movement));
    let main = first(&|c| *c == Call::ShowMain(SurfaceId::BoardView));
    let secondary = first(&|c| {
        *c == Call::ShowSecondary(Some(SurfaceId::PhaseControls(Phase::Movement)))
    });
    let activate = first(&|c| *c == Call::Handler(1, HandlerCall::Activate));
    let title = first(&|c| matches!(c, Call::Title(_)));
    let notified = first(&|c| *c == Call::PhaseChanged(Phase::Movement, 1));

    assert!(old_ignoring < built);
    assert!(built < main && main < secondary);
    assert!(secondary < activate);
    assert!(activate < title && title < notified);
    assert_no_violations!(h.observer);
}

#[test]
fn exactly_one_listener_after_each_transition() {
    let mut h = harness();
    for (phase, round) in [
        (Phase::Lobby, 0),
        (Phase::Deployment, 1),
        (Phase::Initiative, 1),
        (Phase::InitiativeReport, 1),
        (Phase::Movement, 1),
        (Phase::MovementReport, 1),
        (Phase::Firing, 1),
        (Phase::FiringReport, 1),
        (Phase::End, 1),
    ] {
        h.enter(phase, round);
        let current = h.session.current_handler().unwrap();
        for source in InputSource::ALL {
            assert_eq!(h.session.router().listeners(source), &[current], "{phase:?}");
        }
    }
    assert_no_violations!(h.observer);
}

#[test]
fn input_only_reaches_current_handler() {
    let mut h = harness();
    h.enter(Phase::Movement, 1);
    h.enter(Phase::Firing, 1);
    h.journal.clear();

    let delivered = h
        .session
        .dispatch_board_event(&BoardEvent::HexSelected { x: 3, y: 4 })
        .unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(h.session.dispatch_command("fire").unwrap(), 1);

    assert!(h.journal.handler_calls(0).is_empty());
    assert_eq!(
        h.journal.handler_calls(1),
        vec![
            HandlerCall::Board(BoardEvent::HexSelected { x: 3, y: 4 }),
            HandlerCall::Command("fire".to_owned()),
        ]
    );
}

#[test]
fn input_before_first_phase_goes_nowhere() {
    let mut h = harness();
    assert_eq!(h.session.dispatch_command("done").unwrap(), 0);
}

#[test]
fn blank_commands_are_rejected() {
    let mut h = harness();
    h.enter(Phase::Movement, 1);
    assert!(matches!(
        h.session.dispatch_command("  "),
        Err(SessionError::InvalidRequest { .. })
    ));
    assert!(h.journal.handler_calls(0).iter().all(|c| !matches!(c, HandlerCall::Command(_))));
}

#[test]
fn report_handler_is_shared() {
    let mut h = harness();
    h.enter(Phase::FiringReport, 2);
    let firing = h.session.current_handler();
    h.enter(Phase::Physical, 2);
    h.enter(Phase::PhysicalReport, 2);
    assert_eq!(h.session.current_handler(), firing);
    assert_eq!(h.session.registry().len(), 2);
    assert_eq!(
        h.journal
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Built(_)))
            .count(),
        2
    );
}

#[test]
fn report_and_pre_game_layouts() {
    let mut h = harness();
    h.enter(Phase::Exchange, 0);
    assert!(h.journal.calls().contains(&Call::ShowSecondary(None)));
    h.journal.clear();
    h.enter(Phase::EndReport, 1);
    assert!(h
        .journal
        .calls()
        .contains(&Call::ShowSecondary(Some(SurfaceId::ReportControls))));
}

#[test]
fn title_suffix_only_in_started_on_map_phases() {
    let builder = SessionBuilder::<StubConfig>::new().with_title_base("Skirmish").unwrap();
    let mut h = harness_with(builder);
    h.enter(Phase::Deployment, 0);
    assert_eq!(h.session.title(), "Skirmish");
    h.enter(Phase::Firing, 4);
    assert_eq!(h.session.title(), "Skirmish - Round 4: Firing");
    h.enter(Phase::FiringReport, 4);
    assert_eq!(h.session.title(), "Skirmish");
}

#[test]
fn lobby_side_effects() {
    let mut h = harness();
    h.enter(Phase::Lobby, 0);
    h.enter(Phase::Exchange, 0);
    h.enter(Phase::Lobby, 0);

    let calls = h.journal.calls();
    assert_eq!(calls.iter().filter(|c| **c == Call::ClearBoardCaches).count(), 1);
    assert_eq!(
        calls
            .iter()
            .filter(|c| **c == Call::TeardownLobbyPreview)
            .count(),
        1
    );
    let teardown = calls
        .iter()
        .position(|c| *c == Call::TeardownLobbyPreview)
        .unwrap();
    let built_exchange = calls
        .iter()
        .position(|c| *c == Call::Built(Phase::Exchange))
        .unwrap();
    assert!(teardown < built_exchange);
    // lobby re-binds its status widget on every entry
    assert_eq!(
        h.journal
            .handler_calls(0)
            .iter()
            .filter(|c| **c == HandlerCall::Rebind)
            .count(),
        2
    );
}

#[test]
fn policy_applies_on_each_transition() {
    let mut h = harness();
    {
        let policy = h.session.policy_mut();
        *policy = PanelPolicy::manual()
            .with(AuxPanelKind::Minimap, PhaseCategory::Report, Disposition::Show)
            .with(AuxPanelKind::Minimap, PhaseCategory::OnMapAction, Disposition::Hide)
            .with(AuxPanelKind::Minimap, PhaseCategory::Lobby, Disposition::Manual);
    }
    h.session
        .collaborators_mut()
        .panels
        .set_visible(AuxPanelKind::Minimap, true);

    let mut seen = Vec::new();
    for phase in [
        Phase::Lobby,
        Phase::Deployment,
        Phase::Movement,
        Phase::MovementReport,
    ] {
        h.enter(phase, 1);
        seen.push(
            h.session
                .collaborators()
                .panels
                .is_visible(AuxPanelKind::Minimap),
        );
    }
    assert_eq!(seen, vec![true, false, false, true]);
}

#[test]
fn construction_failure_terminates() {
    let mut h = harness();
    h.enter(Phase::Deployment, 1);
    h.session.collaborators_mut().factory.fail_on = Some(Phase::Movement);

    let err = h
        .feed([
            SessionEvent::PhaseChanged {
                phase: Phase::Movement,
                round: 1,
            },
            SessionEvent::GameEnded,
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::HandlerConstruction {
            phase: Phase::Movement,
            ..
        }
    ));
    assert_eq!(h.session.state(), SessionState::Terminated);
    assert_eq!(h.session.current_handler(), None);
    assert!(h.session.router().registered_ids().is_empty());
    assert!(h.observer.has_violation(ViolationKind::HandlerLifecycle));

    assert_eq!(h.session.pump(), Err(SessionError::Terminated));
    assert_eq!(
        h.session.dispatch_command("done"),
        Err(SessionError::Terminated)
    );
    // the event after the failure stays queued
    assert_eq!(h.session.inbound().len(), 1);
}

#[test]
fn handler_without_listeners_is_reported() {
    let mut h = harness();
    h.session.collaborators_mut().factory.capabilities.insert(
        Phase::Initiative,
        Capabilities {
            board_listener: false,
            command_listener: false,
            distractable: false,
        },
    );
    h.enter(Phase::Initiative, 1);
    assert!(h.session.router().registered_ids().is_empty());
    assert!(h.observer.has_violation(ViolationKind::InputRouting));
    assert!(!h.observer.has_violation(ViolationKind::Invariant));
    // not distractable, so never told to ignore input
    assert!(!h
        .journal
        .handler_calls(0)
        .iter()
        .any(|c| matches!(c, HandlerCall::Ignoring(_))));
}
