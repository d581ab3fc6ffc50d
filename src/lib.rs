//! # Wargame Session
//!
//! The session protocol controller of a turn-based tactical wargame client.
//!
//! The controller sits between the transport (which deserializes server messages)
//! and the presentation layer (board view, panels, dialogs). It does two things:
//!
//! - It drives the **phase state machine**: whenever the server announces a new phase,
//!   the input handler for that phase is resolved, swapped in as the only listener for
//!   board and command input, the auxiliary panels are shown or hidden according to the
//!   user's policy, and the window title is refreshed.
//! - It answers **Client Feedback Requests** (CFRs): synchronous questions pushed by the
//!   server mid-phase. Every CFR receives exactly one reply, even when the player
//!   dismisses the dialog. The server blocks until it gets one.
//!
//! All collaborators (rules engine, dialogs, panels, window shell, handler construction,
//! outbound transport) are plugged in through the [`Config`] trait.
//!
//! ```ignore
//! let mut session = SessionBuilder::<MyClient>::new()
//!     .with_title_base("Skirmish")
//!     .start_session(collaborators)?;
//! let inbound = session.inbound();
//! inbound.push(SessionEvent::PhaseChanged { phase: Phase::Lobby, round: 0 });
//! session.pump()?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;

pub use cfr::dispatcher::{CfrDispatcher, DispatchContext};
pub use cfr::prompt::{Choice, ChoicePrompt, Confirmation, ConfirmPrompt, DecisionPrompter};
pub use cfr::{
    AttackCandidate, CfrKind, CfrOutcome, CfrPacket, CfrRequest, CfrResponse, ExemptReason,
    FollowUp, PointBlankAck, StepDirection, TargetKind, TargetRef,
};
pub use error::{CfrDecodeError, HandlerBuildError, SessionError, SessionResult};
pub use handlers::registry::{HandlerEntry, HandlerId, HandlerKey, HandlerRegistry};
pub use handlers::router::{InputRouter, InputSource};
pub use handlers::{Capabilities, HandlerFactory, PhaseHandler, SurfaceId, SurfaceLayout};
pub use panels::{AuxPanelKind, AuxPanels, Disposition, PanelPolicy};
pub use phase::{Phase, PhaseCategory};
pub use roster::{EntityRoster, EntitySummary, LookupError};
pub use sessions::builder::{Collaborators, SessionBuilder};
pub use sessions::config::SessionConfig;
pub use sessions::controller::{session_title, SessionController};
pub use sessions::inbound::InboundQueue;

pub mod cfr;
#[doc(hidden)]
pub mod error;
pub mod handlers;
pub mod panels;
pub mod phase;
pub mod prelude;
pub mod roster;
pub mod telemetry;
#[doc(hidden)]
pub mod sessions {
    #[doc(hidden)]
    pub mod builder;
    #[doc(hidden)]
    pub mod config;
    #[doc(hidden)]
    pub mod controller;
    #[doc(hidden)]
    pub mod inbound;
}

// #############
// #   TYPES   #
// #############

/// Identifier of a unit on the board, as assigned by the server.
///
/// # Examples
///
/// ```
/// use wargame_session::EntityId;
///
/// let id = EntityId::new(7);
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(id.to_string(), "#7");
/// ```
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct EntityId(i32);

impl EntityId {
    /// Creates a new `EntityId` from the server's raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: i32) -> Self {
        EntityId(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for EntityId {
    #[inline]
    fn from(value: i32) -> Self {
        EntityId(value)
    }
}

/// Identifier of a player connected to the game.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new `PlayerId`.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        PlayerId(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// A session is always in one of these states. Query it via
/// [`SessionController::state`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Events are being processed.
    Active,
    /// The server announced the end of the game. Events are still processed so that
    /// late feedback requests get answered.
    Ended,
    /// A fatal error (a handler could not be built) stopped the session.
    Terminated,
}

/// Input from the board view, routed to whichever handler is registered.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BoardEvent {
    /// The cursor moved over a hex.
    HexCursor {
        /// Board column.
        x: i32,
        /// Board row.
        y: i32,
    },
    /// A hex was clicked.
    HexSelected {
        /// Board column.
        x: i32,
        /// Board row.
        y: i32,
    },
    /// A unit was clicked.
    UnitSelected(EntityId),
}

/// Events delivered by the transport, in server order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SessionEvent {
    /// The server moved the game to a new phase.
    PhaseChanged {
        /// The new phase.
        phase: Phase,
        /// The current round number; zero before the first round.
        round: u32,
    },
    /// A unit became known to this client.
    EntityNew(EntitySummary),
    /// A known unit changed.
    EntityChanged(EntitySummary),
    /// A unit left the game.
    EntityRemoved(EntityId),
    /// A client feedback request that must be answered.
    Cfr(CfrPacket),
    /// A player dropped out of the game.
    PlayerDisconnected {
        /// Who disconnected.
        player: PlayerId,
    },
    /// The game is over.
    GameEnded,
}

// #############
// #  TRAITS   #
// #############

/// Outbound half of the transport: the only way replies leave the controller.
pub trait CommandSink {
    /// Sends the reply to the currently open feedback request.
    fn send_cfr_response(&mut self, response: &CfrResponse);
}

/// Read-only queries into the combat rules engine.
pub trait RulesOracle {
    /// Whether `entity` may take one step in `direction` when pushed by a domino effect.
    fn is_legal_step(&self, entity: &EntitySummary, direction: StepDirection) -> bool;

    /// Whether `attacker` may take a point-blank shot at `target`.
    fn is_legal_point_blank_pair(&self, attacker: &EntitySummary, target: &EntitySummary)
        -> bool;
}

/// The window around the board: layout regions, title and lifecycle hooks.
pub trait ClientShell {
    /// Replaces the window title.
    fn set_title(&mut self, title: &str);

    /// Shows `surface` in the main region.
    fn show_main(&mut self, surface: SurfaceId);

    /// Shows `surface` in the secondary region, or hides the region entirely on `None`.
    fn show_secondary(&mut self, surface: Option<SurfaceId>);

    /// Drops cached tiles and unit images of every board view.
    fn clear_board_caches(&mut self);

    /// Discards any lobby preview (map preview, unit previews).
    fn teardown_lobby_preview(&mut self);

    /// Called after a phase transition completes.
    fn on_phase_changed(&mut self, _phase: Phase, _round: u32) {}

    /// Called when a player disconnects.
    fn on_player_disconnected(&mut self, _player: PlayerId) {}

    /// Called when the game ends.
    fn on_game_ended(&mut self) {}
}

/// Compile time parameterization of a session.
///
/// Implement this on a marker struct to plug your presentation layer into the
/// controller.
///
/// # Example
///
/// ```ignore
/// struct MyClient;
///
/// impl Config for MyClient {
///     type Sink = NetworkSink;
///     type Rules = RulesEngine;
///     type Prompter = SwingDialogs;
///     type Factory = DisplayFactory;
///     type Panels = PanelManager;
///     type Shell = MainWindow;
/// }
/// ```
pub trait Config: 'static {
    /// Where feedback replies are sent.
    type Sink: CommandSink;
    /// Legality checks.
    type Rules: RulesOracle;
    /// Blocking decision dialogs.
    type Prompter: DecisionPrompter;
    /// Builds per-phase handlers.
    type Factory: HandlerFactory;
    /// Auxiliary panel visibility.
    type Panels: AuxPanels;
    /// Window shell.
    type Shell: ClientShell;
}
