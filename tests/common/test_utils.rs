//! Shared test utilities for integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use wargame_session::prelude::*;
use wargame_session::telemetry::CollectingObserver;

use super::stubs::{collaborators, Journal, StubConfig};

/// Hidden Raven owned by the local player.
pub const RAVEN: EntityId = EntityId::new(3);
/// Defending Atlas carrying an AMS.
pub const ATLAS: EntityId = EntityId::new(7);
/// Enemy Locust, weapon 4 is an LRM 20.
pub const LOCUST: EntityId = EntityId::new(9);
/// Enemy Catapult, weapon 5 is an LRM 15.
pub const CATAPULT: EntityId = EntityId::new(11);

/// A started session plus everything needed to observe it.
pub struct Harness {
    pub session: SessionController<StubConfig>,
    pub journal: Journal,
    pub observer: Arc<CollectingObserver>,
}

impl Harness {
    /// Pushes `events` and pumps them.
    pub fn feed(&mut self, events: impl IntoIterator<Item = SessionEvent>) -> SessionResult<usize> {
        self.session.inbound().extend(events);
        self.session.pump()
    }

    /// Announces `phase` in `round` and pumps it.
    pub fn enter(&mut self, phase: Phase, round: u32) {
        self.feed([SessionEvent::PhaseChanged { phase, round }])
            .expect("transition failed");
    }

    /// Queues scripted prompt answers.
    pub fn script_choices(&mut self, choices: impl IntoIterator<Item = Choice>) {
        self.session
            .collaborators_mut()
            .prompter
            .choices
            .extend(choices);
    }

    /// Queues scripted confirmations.
    pub fn script_confirmations(&mut self, answers: impl IntoIterator<Item = Confirmation>) {
        self.session
            .collaborators_mut()
            .prompter
            .confirmations
            .extend(answers);
    }
}

/// A human client session with the default policy and a collecting observer.
pub fn harness() -> Harness {
    harness_with(SessionBuilder::new())
}

/// Starts `builder` with fresh stubs and a collecting observer.
pub fn harness_with(builder: SessionBuilder<StubConfig>) -> Harness {
    let journal = Journal::default();
    let observer = Arc::new(CollectingObserver::new());
    let session = builder
        .with_violation_observer(observer.clone())
        .start_session(collaborators(&journal))
        .expect("session should start");
    Harness {
        session,
        journal,
        observer,
    }
}

/// Announces the four standard units.
pub fn roster_events() -> Vec<SessionEvent> {
    vec![
        SessionEvent::EntityNew(EntitySummary::new(RAVEN, "Raven RVN-3L", PlayerId::new(0)).at(4, 4)),
        SessionEvent::EntityNew(
            EntitySummary::new(ATLAS, "Atlas AS7-D", PlayerId::new(0))
                .with_weapon(1, "Anti-Missile System")
                .at(6, 8),
        ),
        SessionEvent::EntityNew(
            EntitySummary::new(LOCUST, "Locust LCT-1V", PlayerId::new(1))
                .with_weapon(4, "LRM 20")
                .at(4, 5),
        ),
        SessionEvent::EntityNew(
            EntitySummary::new(CATAPULT, "Catapult CPLT-C1", PlayerId::new(1))
                .with_weapon(5, "LRM 15")
                .at(10, 2),
        ),
    ]
}
