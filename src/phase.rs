//! Game phases and the fixed category each one belongs to.
//!
//! # Phase Ordering
//!
//! A typical round walks through the phases in this order:
//!
//! ```text
//! Lobby ──► StartingScenario ──► Exchange ──► Initiative ──► InitiativeReport
//!                                                                  │
//!   ┌──────────────────────────────────────────────────────────────┘
//!   ▼
//! (Deployment) ─► Targeting ─► TargetingReport ─► PreMovement ─► Movement
//!   ─► MovementReport ─► Offboard ─► OffboardReport ─► PreFiring ─► Firing
//!   ─► FiringReport ─► Physical ─► PhysicalReport ─► End ─► EndReport ─► ...
//!                                                                      │
//!                                                        game over ──► Victory
//! ```
//!
//! The server owns the sequencing; the client only reacts to the phase it is told
//! about. Nothing in this module holds state.

use std::fmt;

/// Coarse grouping of phases used to pick panel policy rows and title behavior.
///
/// Membership is fixed by [`Phase::category`] and is not configurable.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PhaseCategory {
    /// The pre-game lobby.
    Lobby,
    /// Read-only phases that present the outcome of the preceding action phase.
    Report,
    /// Phases played out on the board: declarations and actions.
    OnMapAction,
    /// Everything else (scenario setup, exchange, initiative, end of round).
    Other,
}

impl PhaseCategory {
    /// All categories, in declaration order.
    pub const ALL: [PhaseCategory; 4] = [
        PhaseCategory::Lobby,
        PhaseCategory::Report,
        PhaseCategory::OnMapAction,
        PhaseCategory::Other,
    ];

    /// Returns a string representation suitable for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Report => "report",
            Self::OnMapAction => "on_map_action",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PhaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named stage of the game turn structure.
///
/// Exactly one phase is current at any time. Before the server announces the first
/// phase the controller reports [`Phase::Unknown`].
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
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No phase has been announced yet.
    #[default]
    Unknown,
    /// Players join, pick units and configure the game.
    Lobby,
    /// The scenario is being loaded.
    StartingScenario,
    /// Final exchange of game settings before play.
    Exchange,
    /// Players pick hexes that artillery will hit automatically.
    SetArtilleryAutohitHexes,
    /// Players place minefields.
    DeployMinefields,
    /// Units are placed on the board.
    Deployment,
    /// Initiative is rolled.
    Initiative,
    /// Initiative results.
    InitiativeReport,
    /// Long-range targeting declarations.
    Targeting,
    /// Targeting results.
    TargetingReport,
    /// Declarations made before movement.
    PreMovement,
    /// Units move.
    Movement,
    /// Movement results.
    MovementReport,
    /// Offboard attacks.
    Offboard,
    /// Offboard results.
    OffboardReport,
    /// Declarations made before firing.
    PreFiring,
    /// Weapon attacks.
    Firing,
    /// Firing results.
    FiringReport,
    /// A hidden unit takes a point-blank shot at a unit that moved adjacent.
    PointBlankShot,
    /// Physical attacks.
    Physical,
    /// Physical attack results.
    PhysicalReport,
    /// End of round bookkeeping.
    End,
    /// End of round results.
    EndReport,
    /// The game is over.
    Victory,
}

impl Phase {
    /// All phases, in declaration order.
    pub const ALL: [Phase; 25] = [
        Phase::Unknown,
        Phase::Lobby,
        Phase::StartingScenario,
        Phase::Exchange,
        Phase::SetArtilleryAutohitHexes,
        Phase::DeployMinefields,
        Phase::Deployment,
        Phase::Initiative,
        Phase::InitiativeReport,
        Phase::Targeting,
        Phase::TargetingReport,
        Phase::PreMovement,
        Phase::Movement,
        Phase::MovementReport,
        Phase::Offboard,
        Phase::OffboardReport,
        Phase::PreFiring,
        Phase::Firing,
        Phase::FiringReport,
        Phase::PointBlankShot,
        Phase::Physical,
        Phase::PhysicalReport,
        Phase::End,
        Phase::EndReport,
        Phase::Victory,
    ];

    /// Returns the category this phase belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use wargame_session::{Phase, PhaseCategory};
    ///
    /// assert_eq!(Phase::Movement.category(), PhaseCategory::OnMapAction);
    /// assert_eq!(Phase::FiringReport.category(), PhaseCategory::Report);
    /// assert_eq!(Phase::Exchange.category(), PhaseCategory::Other);
    /// ```
    #[must_use]
    pub const fn category(self) -> PhaseCategory {
        if matches!(self, Phase::Lobby) {
            PhaseCategory::Lobby
        } else if self.is_report() {
            PhaseCategory::Report
        } else if self.is_on_map() {
            PhaseCategory::OnMapAction
        } else {
            PhaseCategory::Other
        }
    }

    /// Returns `true` for the read-only phases that present results, including victory.
    #[must_use]
    pub const fn is_report(self) -> bool {
        matches!(
            self,
            Phase::InitiativeReport
                | Phase::TargetingReport
                | Phase::MovementReport
                | Phase::OffboardReport
                | Phase::FiringReport
                | Phase::PhysicalReport
                | Phase::EndReport
                | Phase::Victory
        )
    }

    /// Returns `true` for every phase whose main surface is the board.
    ///
    /// That covers the declaration and action phases plus every report phase
    /// except [`Phase::Victory`]. Report phases are still categorized as
    /// [`PhaseCategory::Report`], since [`Phase::category`] checks that first.
    #[must_use]
    pub const fn is_on_map(self) -> bool {
        matches!(
            self,
            Phase::SetArtilleryAutohitHexes
                | Phase::DeployMinefields
                | Phase::Deployment
                | Phase::Targeting
                | Phase::PreMovement
                | Phase::Movement
                | Phase::Offboard
                | Phase::PreFiring
                | Phase::Firing
                | Phase::PointBlankShot
                | Phase::Physical
        ) || (self.is_report() && !self.is_terminal())
    }

    /// Returns `true` for the phases before the first round starts.
    #[must_use]
    pub const fn is_pre_game(self) -> bool {
        matches!(
            self,
            Phase::Lobby | Phase::StartingScenario | Phase::Exchange
        )
    }

    /// Returns `true` once the game has been decided.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Phase::Victory)
    }

    /// Human readable name, as shown in the window title.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Phase::Unknown => "Unknown",
            Phase::Lobby => "Lobby",
            Phase::StartingScenario => "Starting Scenario",
            Phase::Exchange => "Transmitting Game Data",
            Phase::SetArtilleryAutohitHexes => "Set Artillery Autohit Hexes",
            Phase::DeployMinefields => "Deploy Minefields",
            Phase::Deployment => "Deployment",
            Phase::Initiative => "Initiative",
            Phase::InitiativeReport => "Initiative Report",
            Phase::Targeting => "Targeting",
            Phase::TargetingReport => "Targeting Report",
            Phase::PreMovement => "Pre-Movement",
            Phase::Movement => "Movement",
            Phase::MovementReport => "Movement Report",
            Phase::Offboard => "Offboard Attacks",
            Phase::OffboardReport => "Offboard Report",
            Phase::PreFiring => "Pre-Firing",
            Phase::Firing => "Firing",
            Phase::FiringReport => "Firing Report",
            Phase::PointBlankShot => "Point Blank Shot",
            Phase::Physical => "Physical Attacks",
            Phase::PhysicalReport => "Physical Report",
            Phase::End => "End Phase",
            Phase::EndReport => "End Report",
            Phase::Victory => "Victory",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
