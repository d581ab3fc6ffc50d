//! Per-phase input handlers and where they are shown.
//!
//! A handler owns the interaction of one phase: it listens to board input and
//! commands while it is the registered listener and draws itself on one or two
//! display surfaces. Handlers are built by the host's [`HandlerFactory`], cached
//! by the [`registry::HandlerRegistry`] and wired up by the [`router::InputRouter`].

pub mod registry;
pub mod router;

use crate::error::HandlerBuildError;
use crate::phase::Phase;
use crate::{BoardEvent, EntityId};

/// What a handler takes part in.
///
/// Queried once per transition instead of inspecting concrete handler types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Receives board input.
    pub board_listener: bool,
    /// Receives commands.
    pub command_listener: bool,
    /// Can be told to ignore input while it is swapped out.
    pub distractable: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            board_listener: true,
            command_listener: true,
            distractable: true,
        }
    }
}

/// The input handler of one phase.
pub trait PhaseHandler {
    /// Called when the handler becomes current.
    fn activate(&mut self);

    /// Called when another handler replaces this one.
    fn deactivate(&mut self) {}

    /// While `true`, the handler must drop any input that still reaches it.
    fn set_ignoring_input(&mut self, ignoring: bool);

    /// What this handler participates in.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Board input, only delivered while registered.
    fn on_board_event(&mut self, event: &BoardEvent);

    /// A command from a menu or keyboard shortcut, only delivered while registered.
    fn on_command(&mut self, command: &str);

    /// Hands over the pairing of an accepted hidden point-blank shot.
    ///
    /// Returns `false` if this handler does not declare point-blank shots.
    fn seed_point_blank(&mut self, _attacker: EntityId, _target: EntityId) -> bool {
        false
    }

    /// Re-attaches a chat or status widget that another handler detached.
    fn rebind_status_widget(&mut self) {}
}

/// Builds the handler for a phase on its first visit.
pub trait HandlerFactory {
    /// Creates the handler for `phase`.
    ///
    /// For report phases this is called once, with the first report phase visited;
    /// the result is shared by all of them.
    fn build(&mut self, phase: Phase) -> Result<Box<dyn PhaseHandler>, HandlerBuildError>;
}

/// A display region a handler can occupy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    /// Pre-game lobby.
    Lobby,
    /// Scenario loading screen.
    StartingScenario,
    /// Waiting for all players to exchange their setup.
    Exchange,
    /// The map.
    BoardView,
    /// Phase specific buttons under the map.
    PhaseControls(Phase),
    /// Buttons of the shared report display.
    ReportControls,
    /// Placeholder shown while waiting on the server.
    Waiting,
}

/// Where a handler is shown.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceLayout {
    /// Main region.
    pub main: SurfaceId,
    /// Secondary region; `None` hides it.
    pub secondary: Option<SurfaceId>,
}

impl SurfaceLayout {
    /// The layout used for `phase`.
    ///
    /// ```
    /// use wargame_session::{Phase, SurfaceId, SurfaceLayout};
    ///
    /// let layout = SurfaceLayout::for_phase(Phase::Movement);
    /// assert_eq!(layout.main, SurfaceId::BoardView);
    /// assert_eq!(layout.secondary, Some(SurfaceId::PhaseControls(Phase::Movement)));
    /// ```
    #[must_use]
    pub const fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Lobby => Self::single(SurfaceId::Lobby),
            Phase::StartingScenario => Self::single(SurfaceId::StartingScenario),
            Phase::Exchange => Self::single(SurfaceId::Exchange),
            _ if phase.is_report() => Self {
                main: SurfaceId::BoardView,
                secondary: Some(SurfaceId::ReportControls),
            },
            _ if phase.is_on_map() => Self {
                main: SurfaceId::BoardView,
                secondary: Some(SurfaceId::PhaseControls(phase)),
            },
            _ => Self::single(SurfaceId::Waiting),
        }
    }

    const fn single(main: SurfaceId) -> Self {
        Self {
            main,
            secondary: None,
        }
    }
}
