//! Property-based tests for phase routing and feedback replies.
//!
//! # Properties Tested
//!
//! ## Routing
//! - After every transition exactly the current handler listens to each input source
//! - Report phases resolve to one shared handler
//! - Each handler is built once, however often its phase recurs
//!
//! ## Feedback Requests
//! - Every packet gets at most one reply, and exactly one unless it is exempt
//! - A reply always has the kind of the request it answers
//! - Arbitrary interleavings of events never break the controller's invariants

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use std::collections::BTreeSet;

use crate::common::test_utils::{ATLAS, CATAPULT, LOCUST, RAVEN};
use crate::common::{harness, roster_events, Harness};
use proptest::prelude::*;
use wargame_session::prelude::*;
use wargame_session::telemetry::ViolationKind;
use wargame_session::{CfrKind, InputSource};

// ============================================================================
// Strategies
// ============================================================================

fn arb_phase() -> impl Strategy<Value = Phase> {
    prop::sample::select(Phase::ALL.to_vec())
}

fn arb_id() -> impl Strategy<Value = i32> {
    prop_oneof![
        3 => prop::sample::select(vec![
            RAVEN.as_i32(),
            ATLAS.as_i32(),
            LOCUST.as_i32(),
            CATAPULT.as_i32(),
        ]),
        1 => 0i32..20,
    ]
}

fn arb_packet() -> impl Strategy<Value = CfrPacket> {
    (
        0u16..8,
        prop::collection::vec(arb_id(), 0..6),
        prop::collection::vec(-1i32..12, 0..6),
    )
        .prop_map(|(kind, ints, aux)| CfrPacket::new(kind, ints, aux))
}

fn arb_choice() -> impl Strategy<Value = Choice> {
    prop_oneof![Just(Choice::Dismissed), (0usize..6).prop_map(Choice::Selected)]
}

fn arb_confirmation() -> impl Strategy<Value = Confirmation> {
    prop::sample::select(vec![
        Confirmation::Accepted,
        Confirmation::Declined,
        Confirmation::Dismissed,
    ])
}

fn arb_event() -> impl Strategy<Value = SessionEvent> {
    prop_oneof![
        2 => (arb_phase(), 0u32..6).prop_map(|(phase, round)| SessionEvent::PhaseChanged { phase, round }),
        3 => arb_packet().prop_map(SessionEvent::Cfr),
        1 => arb_id().prop_map(|id| SessionEvent::EntityRemoved(EntityId::new(id))),
        1 => Just(SessionEvent::GameEnded),
    ]
}

// ============================================================================
// Helpers
// ============================================================================

/// Whether the controller may leave `packet` unanswered, given the standard roster.
fn may_be_exempt(h: &Harness, packet: &CfrPacket) -> bool {
    match CfrRequest::decode(packet) {
        Err(_) => CfrKind::from_code(packet.kind).is_none(),
        Ok(CfrRequest::HiddenPointBlankShot { attacker, target }) => {
            h.session.roster().get(attacker).is_none() || h.session.roster().get(target).is_none()
        },
        Ok(_) => false,
    }
}

fn started() -> Harness {
    let mut h = harness();
    h.feed(roster_events()).unwrap();
    h.enter(Phase::Movement, 1);
    h
}

// ============================================================================
// Routing Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn exactly_one_listener_per_source(phases in prop::collection::vec(arb_phase(), 1..40)) {
        let mut h = harness();
        for (round, phase) in phases.iter().enumerate() {
            h.enter(*phase, round as u32);
            let current = h.session.current_handler().unwrap();
            for source in InputSource::ALL {
                prop_assert_eq!(h.session.router().listeners(source), &[current][..]);
            }
            prop_assert_eq!(h.session.current_phase(), *phase);
        }
        prop_assert!(!h.observer.has_violation(ViolationKind::Invariant));
    }

    #[test]
    fn report_phases_share_one_handler(phases in prop::collection::vec(arb_phase(), 1..40)) {
        let mut h = harness();
        let mut report_handlers = BTreeSet::new();
        for phase in &phases {
            h.enter(*phase, 1);
            if phase.is_report() {
                report_handlers.insert(h.session.current_handler().unwrap());
            }
        }
        prop_assert!(report_handlers.len() <= 1);

        let distinct: BTreeSet<_> = phases
            .iter()
            .map(|p| if p.is_report() { None } else { Some(*p) })
            .collect();
        prop_assert_eq!(h.session.registry().len(), distinct.len());
    }
}

// ============================================================================
// Feedback Request Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn at_most_one_reply_per_packet(
        packet in arb_packet(),
        choice in arb_choice(),
        confirmation in arb_confirmation(),
    ) {
        let mut h = started();
        h.script_choices([choice]);
        h.script_confirmations([confirmation]);
        let exempt_allowed = may_be_exempt(&h, &packet);
        h.journal.clear();

        let outcome = h.session.handle_cfr_packet(&packet).unwrap();
        let sent = h.journal.sent();
        prop_assert!(sent.len() <= 1);
        match outcome.response() {
            Some(response) => {
                prop_assert_eq!(sent.as_slice(), std::slice::from_ref(response));
                prop_assert_eq!(response.kind().code(), packet.kind);
            },
            None => {
                prop_assert!(exempt_allowed, "{:?} left unanswered", packet);
                prop_assert!(sent.is_empty());
            },
        }
        prop_assert!(!h.observer.has_violation(ViolationKind::Invariant));
    }

    #[test]
    fn random_event_streams_keep_invariants(
        events in prop::collection::vec(arb_event(), 1..30),
        choices in prop::collection::vec(arb_choice(), 0..10),
        confirmations in prop::collection::vec(arb_confirmation(), 0..10),
    ) {
        let mut h = started();
        h.script_choices(choices);
        h.script_confirmations(confirmations);
        let packets = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Cfr(_)))
            .count();
        h.journal.clear();

        let processed = h.feed(events.clone()).unwrap();
        prop_assert_eq!(processed, events.len());
        prop_assert!(h.journal.sent().len() <= packets);
        prop_assert_eq!(h.session.responses_sent() as usize, h.journal.sent().len());
        prop_assert!(!h.observer.has_violation(ViolationKind::Invariant));
        prop_assert!(!h.observer.has_violation(ViolationKind::HandlerLifecycle));
        prop_assert!(h.session.inbound().is_empty());
    }
}
