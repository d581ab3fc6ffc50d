//! Inbound event processing tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use crate::common::stubs::{Call, StubConfig};
use crate::common::test_utils::{ATLAS, CATAPULT, LOCUST, RAVEN};
use crate::common::{harness, harness_with, roster_events};
use wargame_session::prelude::*;
use wargame_session::telemetry::ViolationKind;
use wargame_session::{assert_no_violations, assert_violation, ExemptReason};

#[test]
fn roster_follows_entity_events() {
    let mut h = harness();
    assert_eq!(h.feed(roster_events()).unwrap(), 4);
    assert_eq!(h.session.roster().len(), 4);

    h.feed([
        SessionEvent::EntityChanged(
            EntitySummary::new(LOCUST, "Locust LCT-1E", PlayerId::new(1)).at(5, 5),
        ),
        SessionEvent::EntityRemoved(CATAPULT),
        SessionEvent::EntityRemoved(EntityId::new(99)),
    ])
    .unwrap();

    let roster = h.session.roster();
    assert_eq!(roster.len(), 3);
    assert_eq!(roster.get(LOCUST).unwrap().name, "Locust LCT-1E");
    assert!(roster.get(CATAPULT).is_none());
    assert_no_violations!(h.observer);
}

#[test]
fn removed_units_make_point_blank_shot_unaddressed() {
    let mut h = harness();
    h.feed(roster_events()).unwrap();
    h.feed([SessionEvent::EntityRemoved(RAVEN)]).unwrap();
    let outcome = h
        .session
        .handle_cfr(&CfrRequest::HiddenPointBlankShot {
            attacker: RAVEN,
            target: LOCUST,
        })
        .unwrap();
    assert_eq!(
        outcome,
        CfrOutcome::Exempt {
            reason: ExemptReason::NotAddressed
        }
    );
}

#[test]
fn phase_change_during_prompt_waits_for_the_reply() {
    let mut h = harness();
    h.feed(roster_events()).unwrap();
    h.enter(Phase::Movement, 1);
    {
        let inbound = h.session.inbound();
        let prompter = &mut h.session.collaborators_mut().prompter;
        prompter.queue = Some(inbound);
        prompter.push_during_prompt = vec![SessionEvent::PhaseChanged {
            phase: Phase::Firing,
            round: 1,
        }];
    }
    h.script_choices([Choice::Selected(1)]);
    h.journal.clear();

    let processed = h
        .feed([SessionEvent::Cfr(CfrPacket::from(&CfrRequest::AmsAssign {
            entity: ATLAS,
            attacks: vec![wargame_session::AttackCandidate {
                attacker: LOCUST,
                weapon: 4,
            }],
        }))])
        .unwrap();
    assert_eq!(processed, 2);
    assert_eq!(h.session.current_phase(), Phase::Firing);

    let replied = h
        .journal
        .position(|c| *c == Call::Sent(CfrResponse::AmsAssign(Some(0))))
        .unwrap();
    let prompted = h.journal.position(|c| matches!(c, Call::Choose(_))).unwrap();
    let built = h
        .journal
        .position(|c| *c == Call::Built(Phase::Firing))
        .unwrap();
    let changed = h
        .journal
        .position(|c| *c == Call::PhaseChanged(Phase::Firing, 1))
        .unwrap();
    assert!(prompted < replied);
    assert!(replied < built && built < changed);
    assert_no_violations!(h.observer);
}

#[test]
fn disconnects_reach_the_shell() {
    let mut h = harness();
    h.feed([SessionEvent::PlayerDisconnected {
        player: PlayerId::new(2),
    }])
    .unwrap();
    assert!(h
        .journal
        .calls()
        .contains(&Call::PlayerDisconnected(PlayerId::new(2))));
    assert_eq!(h.session.state(), SessionState::Active);
}

#[test]
fn ended_game_still_answers_requests() {
    let mut h = harness();
    h.feed(roster_events()).unwrap();
    h.enter(Phase::Firing, 3);
    h.script_choices([Choice::Selected(1)]);
    h.feed([
        SessionEvent::GameEnded,
        SessionEvent::Cfr(CfrPacket::from(&CfrRequest::TeleguidedTarget {
            candidates: vec![LOCUST, CATAPULT],
            to_hit: vec![6, 11],
        })),
        SessionEvent::PhaseChanged {
            phase: Phase::Victory,
            round: 3,
        },
    ])
    .unwrap();

    assert_eq!(h.session.state(), SessionState::Ended);
    assert!(h.journal.calls().contains(&Call::GameEnded));
    assert_eq!(h.journal.sent(), vec![CfrResponse::TeleguidedTarget(1)]);
    assert_eq!(h.session.current_phase(), Phase::Victory);
}

#[test]
fn backlog_is_reported_but_nothing_is_dropped() {
    let builder = SessionBuilder::<StubConfig>::new()
        .with_inbound_queue_capacity(2)
        .unwrap();
    let mut h = harness_with(builder);
    assert_eq!(h.feed(roster_events()).unwrap(), 4);
    assert_eq!(h.session.roster().len(), 4);
    assert!(h.session.inbound().is_empty());
    assert_violation!(h.observer, ViolationKind::InboundBacklog);
}

#[test]
fn pump_on_empty_queue_is_a_no_op() {
    let mut h = harness();
    assert_eq!(h.session.pump().unwrap(), 0);
    assert_eq!(h.session.current_phase(), Phase::Unknown);
}

#[test]
fn shared_queue_handed_to_the_builder() {
    let queue = InboundQueue::new();
    queue.push(SessionEvent::PhaseChanged {
        phase: Phase::Lobby,
        round: 0,
    });
    let mut h = harness_with(SessionBuilder::<StubConfig>::new().with_inbound_queue(queue.clone()));
    assert_eq!(h.session.pump().unwrap(), 1);
    assert_eq!(h.session.current_phase(), Phase::Lobby);
    assert!(queue.is_empty());
}
