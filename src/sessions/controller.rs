use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use web_time::Instant;

use crate::cfr::dispatcher::{CfrDispatcher, DispatchContext};
use crate::cfr::{CfrKind, CfrOutcome, CfrPacket, CfrRequest, CfrResponse, FollowUp};
use crate::error::{SessionError, SessionResult};
use crate::handlers::registry::{HandlerId, HandlerRegistry};
use crate::handlers::router::{InputRouter, InputSource};
use crate::panels::PanelPolicy;
use crate::phase::{Phase, PhaseCategory};
use crate::roster::EntityRoster;
use crate::sessions::builder::Collaborators;
use crate::sessions::config::SessionConfig;
use crate::sessions::inbound::InboundQueue;
use crate::telemetry::{
    InvariantChecker, InvariantViolation, ViolationKind, ViolationObserver, ViolationSeverity,
};
use crate::{
    debug_check_invariants, report_violation_to, BoardEvent, ClientShell, CommandSink, Config,
    EntityId, SessionEvent, SessionState,
};

/// Builds the window title for `phase`.
///
/// The round and phase name are only appended for on-map action phases of a started
/// game.
///
/// ```
/// use wargame_session::{sessions::controller::session_title, Phase};
///
/// assert_eq!(session_title("Skirmish", Phase::Movement, 3), "Skirmish - Round 3: Movement");
/// assert_eq!(session_title("Skirmish", Phase::MovementReport, 3), "Skirmish");
/// assert_eq!(session_title("Skirmish", Phase::Deployment, 0), "Skirmish");
/// ```
#[must_use]
pub fn session_title(base: &str, phase: Phase, round: u32) -> String {
    if round > 0 && phase.category() == PhaseCategory::OnMapAction {
        format!("{} - Round {}: {}", base, round, phase.display_name())
    } else {
        base.to_owned()
    }
}

/// The feedback request currently being resolved.
#[derive(Debug, Clone, Copy)]
struct PendingCfr {
    kind: CfrKind,
    opened: Instant,
}

/// Sends the default reply for the open request if the prompter unwinds.
struct AnswerOnUnwind<'a, S: CommandSink> {
    pending: &'a mut Option<PendingCfr>,
    sink: &'a mut S,
    responses_sent: &'a mut u64,
    observer: &'a Option<Arc<dyn ViolationObserver>>,
    round: u32,
}

impl<S: CommandSink> AnswerOnUnwind<'_, S> {
    /// Hands back the open request once it resolved normally.
    fn disarm(mut self) -> Option<PendingCfr> {
        self.pending.take()
    }
}

impl<S: CommandSink> Drop for AnswerOnUnwind<'_, S> {
    fn drop(&mut self) {
        let Some(stale) = self.pending.take() else {
            return;
        };
        report_violation_to!(
            self.observer,
            ViolationSeverity::Error,
            ViolationKind::CfrProtocol,
            @round self.round,
            @context { "kind" => stale.kind },
            "prompt for {} request unwound, sending its default",
            stale.kind
        );
        self.sink.send_cfr_response(&stale.kind.default_response());
        *self.responses_sent += 1;
    }
}

/// Drives the phase state machine and answers feedback requests.
///
/// Create one with [`SessionBuilder`](crate::SessionBuilder). Feed it server events
/// through the [`InboundQueue`] and [`pump`](Self::pump), and local input through
/// [`dispatch_board_event`](Self::dispatch_board_event) and
/// [`dispatch_command`](Self::dispatch_command).
pub struct SessionController<T: Config> {
    config: SessionConfig,
    collaborators: Collaborators<T>,
    registry: HandlerRegistry,
    router: InputRouter,
    policy: PanelPolicy,
    roster: EntityRoster,
    dispatcher: CfrDispatcher,
    inbound: InboundQueue,
    violation_observer: Option<Arc<dyn ViolationObserver>>,
    state: SessionState,
    current_phase: Phase,
    current_handler: Option<HandlerId>,
    round: u32,
    title: String,
    pending_cfr: Option<PendingCfr>,
    responses_sent: u64,
}

impl<T: Config> std::fmt::Debug for SessionController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("current_phase", &self.current_phase)
            .field("current_handler", &self.current_handler)
            .field("round", &self.round)
            .field("title", &self.title)
            .field("registry", &self.registry)
            .field("router", &self.router)
            .field("roster_len", &self.roster.len())
            .field("queued_events", &self.inbound.len())
            .field("pending_cfr", &self.pending_cfr)
            .field("responses_sent", &self.responses_sent)
            .finish_non_exhaustive()
    }
}

impl<T: Config> SessionController<T> {
    pub(crate) fn new(
        config: SessionConfig,
        policy: PanelPolicy,
        inbound: InboundQueue,
        violation_observer: Option<Arc<dyn ViolationObserver>>,
        collaborators: Collaborators<T>,
    ) -> Self {
        let title = config.title_base.clone();
        Self {
            dispatcher: CfrDispatcher::new(violation_observer.clone()),
            config,
            collaborators,
            registry: HandlerRegistry::new(),
            router: InputRouter::new(),
            policy,
            roster: EntityRoster::new(),
            inbound,
            violation_observer,
            state: SessionState::Active,
            current_phase: Phase::Unknown,
            current_handler: None,
            round: 0,
            title,
            pending_cfr: None,
            responses_sent: 0,
        }
    }

    fn ensure_running(&self) -> SessionResult<()> {
        match self.state {
            SessionState::Terminated => Err(SessionError::Terminated),
            SessionState::Active | SessionState::Ended => Ok(()),
        }
    }

    /// A handle to the inbound queue, for the transport.
    #[must_use]
    pub fn inbound(&self) -> InboundQueue {
        self.inbound.clone()
    }

    /// Processes every queued event in arrival order, including events pushed while
    /// processing. Returns how many were processed.
    ///
    /// # Errors
    /// - Returns [`SessionError::Terminated`] if the session was terminated.
    /// - Returns [`SessionError::HandlerConstruction`] if a phase handler could not be
    ///   built; the session is terminated and the remaining events stay queued.
    pub fn pump(&mut self) -> SessionResult<usize> {
        self.ensure_running()?;
        let backlog = self.inbound.len();
        if backlog > self.config.inbound_queue_capacity {
            report_violation_to!(
                self.violation_observer,
                ViolationSeverity::Warning,
                ViolationKind::InboundBacklog,
                @round self.round,
                "{} inbound events queued, capacity is {}",
                backlog,
                self.config.inbound_queue_capacity
            );
        }

        let mut processed = 0;
        while let Some(event) = self.inbound.pop() {
            self.handle_event(event)?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Processes a single event immediately, bypassing the queue.
    ///
    /// # Errors
    /// See [`pump`](Self::pump).
    pub fn handle_event(&mut self, event: SessionEvent) -> SessionResult<()> {
        self.ensure_running()?;
        match event {
            SessionEvent::PhaseChanged { phase, round } => self.transition_to(phase, round)?,
            SessionEvent::EntityNew(entity) | SessionEvent::EntityChanged(entity) => {
                let id = entity.id;
                let replaced = self.roster.upsert(entity);
                trace!(%id, replaced, "roster updated");
            },
            SessionEvent::EntityRemoved(id) => {
                if self.roster.remove(id).is_none() {
                    debug!(%id, "removal of an entity that was never announced");
                }
            },
            SessionEvent::Cfr(packet) => {
                let _ = self.handle_cfr_packet(&packet)?;
            },
            SessionEvent::PlayerDisconnected { player } => {
                info!(%player, "player disconnected");
                self.collaborators.shell.on_player_disconnected(player);
            },
            SessionEvent::GameEnded => {
                info!(round = self.round, "game ended");
                self.state = SessionState::Ended;
                self.collaborators.shell.on_game_ended();
            },
        }
        debug_check_invariants!(self.violation_observer, self, "after inbound event");
        Ok(())
    }

    /// Switches to `phase`.
    ///
    /// The outgoing handler is removed from both input sources before the incoming
    /// one is added, so no input ever reaches two handlers.
    ///
    /// # Errors
    /// - Returns [`SessionError::Terminated`] if the session was terminated.
    /// - Returns [`SessionError::HandlerConstruction`] if the handler could not be
    ///   built. The session is terminated with no handler registered.
    pub fn transition_to(&mut self, phase: Phase, round: u32) -> SessionResult<()> {
        self.ensure_running()?;
        let from = self.current_phase;

        if let Some(old) = self.current_handler.take() {
            self.router.unregister_all(old);
            if let Some(entry) = self.registry.get_mut(old) {
                if entry.handler.capabilities().distractable {
                    entry.handler.set_ignoring_input(true);
                }
                entry.handler.deactivate();
            }
        }

        let id = match self.registry.resolve(
            phase,
            &mut self.collaborators.factory,
            &mut self.collaborators.shell,
        ) {
            Ok(id) => id,
            Err(err) => {
                self.state = SessionState::Terminated;
                report_violation_to!(
                    self.violation_observer,
                    ViolationSeverity::Critical,
                    ViolationKind::HandlerLifecycle,
                    @round round,
                    "session terminated: {}",
                    err
                );
                return Err(err);
            },
        };

        let Some(entry) = self.registry.get_mut(id) else {
            self.state = SessionState::Terminated;
            return Err(SessionError::HandlerConstruction {
                phase,
                reason: format!("{id} missing from registry"),
            });
        };

        let layout = entry.layout;
        self.collaborators.shell.show_main(layout.main);
        self.collaborators.shell.show_secondary(layout.secondary);

        let caps = entry.handler.capabilities();
        if caps.board_listener {
            self.router.register(InputSource::Board, id);
        }
        if caps.command_listener {
            self.router.register(InputSource::Commands, id);
        }
        if !caps.board_listener && !caps.command_listener {
            report_violation_to!(
                self.violation_observer,
                ViolationSeverity::Warning,
                ViolationKind::InputRouting,
                @round round,
                "handler for {} listens to no input source",
                phase
            );
        }
        if caps.distractable {
            entry.handler.set_ignoring_input(false);
        }
        entry.handler.activate();
        if phase == Phase::Lobby {
            entry.handler.rebind_status_widget();
        }

        self.policy
            .recompute_all(phase, &mut self.collaborators.panels);

        self.title = session_title(&self.config.title_base, phase, round);
        self.collaborators.shell.set_title(&self.title);

        self.current_phase = phase;
        self.current_handler = Some(id);
        self.round = round;
        self.collaborators.shell.on_phase_changed(phase, round);
        debug!(%from, to = %phase, round, handler = %id, "phase transition complete");

        debug_check_invariants!(self.violation_observer, self, "after phase transition");
        Ok(())
    }

    /// Decodes and answers a feedback request.
    ///
    /// The reply, if any, has been sent to the [`CommandSink`] when this returns. An
    /// accepted point-blank shot then switches to [`Phase::PointBlankShot`].
    ///
    /// # Errors
    /// - Returns [`SessionError::Terminated`] if the session was terminated.
    /// - Returns [`SessionError::HandlerConstruction`] if the point-blank shot handler
    ///   could not be built. The reply has been sent regardless.
    pub fn handle_cfr_packet(&mut self, packet: &CfrPacket) -> SessionResult<CfrOutcome> {
        self.answer_with(CfrKind::from_code(packet.kind), |dispatcher, automated, ctx| {
            dispatcher.handle_packet(packet, automated, ctx)
        })
    }

    /// Answers an already decoded feedback request.
    ///
    /// # Errors
    /// See [`handle_cfr_packet`](Self::handle_cfr_packet).
    pub fn handle_cfr(&mut self, request: &CfrRequest) -> SessionResult<CfrOutcome> {
        self.answer_with(Some(request.kind()), |dispatcher, automated, ctx| {
            dispatcher.handle(request, automated, ctx)
        })
    }

    fn answer_with<F>(&mut self, kind: Option<CfrKind>, resolve: F) -> SessionResult<CfrOutcome>
    where
        F: FnOnce(&CfrDispatcher, bool, &mut DispatchContext<'_, T::Rules, T::Prompter>) -> CfrOutcome,
    {
        self.ensure_running()?;

        self.pending_cfr = kind.map(|kind| PendingCfr {
            kind,
            opened: Instant::now(),
        });

        let (outcome, pending) = {
            let Collaborators {
                sink,
                rules,
                prompter,
                ..
            } = &mut self.collaborators;
            let guard = AnswerOnUnwind {
                pending: &mut self.pending_cfr,
                sink,
                responses_sent: &mut self.responses_sent,
                observer: &self.violation_observer,
                round: self.round,
            };
            let mut ctx = DispatchContext {
                roster: &self.roster,
                rules: &*rules,
                prompter,
                round: self.round,
            };
            let outcome = resolve(&self.dispatcher, self.config.automated_client, &mut ctx);
            (outcome, guard.disarm())
        };

        if let Some(pending) = pending {
            let elapsed = pending.opened.elapsed();
            if elapsed > self.config.slow_prompt_threshold {
                warn!(kind = %pending.kind, elapsed_ms = elapsed.as_millis() as u64, "slow feedback decision");
            } else {
                debug!(kind = %pending.kind, elapsed_ms = elapsed.as_millis() as u64, "feedback decision took");
            }
            if let Some(response) = outcome.response() {
                if response.kind() != pending.kind {
                    report_violation_to!(
                        self.violation_observer,
                        ViolationSeverity::Critical,
                        ViolationKind::Invariant,
                        @round self.round,
                        "{} request answered with a {} reply",
                        pending.kind,
                        response.kind()
                    );
                }
            }
        }

        if let CfrOutcome::Answered {
            response,
            follow_up,
        } = &outcome
        {
            self.send(response);
            if let Some(FollowUp::EnterPointBlankShot { attacker, target }) = follow_up {
                self.enter_point_blank_shot(*attacker, *target)?;
            }
        }
        Ok(outcome)
    }

    fn send(&mut self, response: &CfrResponse) {
        self.collaborators.sink.send_cfr_response(response);
        self.responses_sent += 1;
    }

    fn enter_point_blank_shot(&mut self, attacker: EntityId, target: EntityId) -> SessionResult<()> {
        self.transition_to(Phase::PointBlankShot, self.round)?;
        let seeded = self
            .current_handler
            .and_then(|id| self.registry.get_mut(id))
            .is_some_and(|entry| entry.handler.seed_point_blank(attacker, target));
        if !seeded {
            report_violation_to!(
                self.violation_observer,
                ViolationSeverity::Error,
                ViolationKind::HandlerLifecycle,
                @round self.round,
                "point blank shot handler refused the pairing {} -> {}",
                attacker,
                target
            );
        }
        Ok(())
    }

    /// Delivers board input to the registered handler. Returns how many handlers
    /// received it.
    ///
    /// # Errors
    /// - Returns [`SessionError::Terminated`] if the session was terminated.
    pub fn dispatch_board_event(&mut self, event: &BoardEvent) -> SessionResult<usize> {
        self.ensure_running()?;
        let mut delivered = 0;
        for id in self.router.listeners(InputSource::Board) {
            if let Some(entry) = self.registry.get_mut(*id) {
                entry.handler.on_board_event(event);
                delivered += 1;
            }
        }
        if delivered == 0 {
            trace!(?event, "board event without listener");
        }
        Ok(delivered)
    }

    /// Delivers a command to the registered handler. Returns how many handlers
    /// received it.
    ///
    /// # Errors
    /// - Returns [`SessionError::Terminated`] if the session was terminated.
    /// - Returns [`SessionError::InvalidRequest`] if `command` is blank.
    pub fn dispatch_command(&mut self, command: &str) -> SessionResult<usize> {
        self.ensure_running()?;
        if command.trim().is_empty() {
            return Err(SessionError::InvalidRequest {
                info: "commands must not be blank".to_owned(),
            });
        }
        let mut delivered = 0;
        for id in self.router.listeners(InputSource::Commands) {
            if let Some(entry) = self.registry.get_mut(*id) {
                entry.handler.on_command(command);
                delivered += 1;
            }
        }
        if delivered == 0 {
            trace!(command, "command without listener");
        }
        Ok(delivered)
    }

    /// The phase announced last, [`Phase::Unknown`] before the first.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    /// The current round, zero before the first.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// The active handler.
    #[must_use]
    pub fn current_handler(&self) -> Option<HandlerId> {
        self.current_handler
    }

    /// The session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The current window title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of feedback replies sent so far.
    #[must_use]
    pub fn responses_sent(&self) -> u64 {
        self.responses_sent
    }

    /// The configuration the session was started with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Units known to this client.
    pub fn roster(&self) -> &EntityRoster {
        &self.roster
    }

    /// The handler cache.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The input registration tables.
    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    /// The panel policy.
    pub fn policy(&self) -> &PanelPolicy {
        &self.policy
    }

    /// Edits the panel policy. Takes effect on the next transition.
    pub fn policy_mut(&mut self) -> &mut PanelPolicy {
        &mut self.policy
    }

    /// The host collaborators.
    pub fn collaborators(&self) -> &Collaborators<T> {
        &self.collaborators
    }

    /// Mutable access to the host collaborators.
    pub fn collaborators_mut(&mut self) -> &mut Collaborators<T> {
        &mut self.collaborators
    }
}

impl<T: Config> InvariantChecker for SessionController<T> {
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.pending_cfr.is_some() {
            return Err(InvariantViolation::new(
                "SessionController",
                "feedback request still open between events",
            ));
        }

        let registered = self.router.registered_ids();
        match self.current_handler {
            None => {
                if !registered.is_empty() {
                    return Err(InvariantViolation::new(
                        "SessionController",
                        "input listeners registered without a current handler",
                    )
                    .with_details(format!("registered={registered:?}")));
                }
            },
            Some(id) => {
                let Some(entry) = self.registry.get(id) else {
                    return Err(InvariantViolation::new(
                        "SessionController",
                        "current handler is not in the registry",
                    )
                    .with_details(format!("{id}")));
                };
                let caps = entry.handler.capabilities();
                let expected_listener = caps.board_listener || caps.command_listener;
                if registered.iter().any(|other| *other != id)
                    || registered.is_empty() == expected_listener
                {
                    return Err(InvariantViolation::new(
                        "SessionController",
                        "exactly the current handler must be registered",
                    )
                    .with_details(format!("current={id}, registered={registered:?}")));
                }
                if self.registry.id_for(self.current_phase) != Some(id) {
                    return Err(InvariantViolation::new(
                        "SessionController",
                        "current handler does not belong to the current phase",
                    )
                    .with_details(format!("phase={}, handler={id}", self.current_phase)));
                }
            },
        }

        if self.state == SessionState::Terminated && self.current_handler.is_some() {
            return Err(InvariantViolation::new(
                "SessionController",
                "terminated session still has a handler",
            ));
        }
        Ok(())
    }
}
