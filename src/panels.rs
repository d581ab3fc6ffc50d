//! Visibility policy of the auxiliary panels.
//!
//! For every panel and every [`PhaseCategory`] the user picks one of three
//! [`Disposition`]s. On each phase transition the controller applies the row of
//! the new phase's category to every panel. `Manual` entries leave whatever the
//! user last did with the panel alone.
//!
//! The policy is a plain value owned by the session and persisted through
//! [`PanelPolicy::to_json`] / [`PanelPolicy::from_json`].
//!
//! ```
//! use wargame_session::{AuxPanelKind, Disposition, PanelPolicy, PhaseCategory};
//!
//! let mut policy = PanelPolicy::default();
//! policy.set(AuxPanelKind::Minimap, PhaseCategory::Report, Disposition::Show);
//! let restored = PanelPolicy::from_json(&policy.to_json().unwrap()).unwrap();
//! assert_eq!(restored.get(AuxPanelKind::Minimap, PhaseCategory::Report), Disposition::Show);
//! ```

use std::fmt;

use tracing::trace;

use crate::error::SessionResult;
use crate::phase::{Phase, PhaseCategory};

/// The independently toggleable panels.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuxPanelKind {
    /// Overview map.
    Minimap,
    /// Details of the selected unit.
    UnitDisplay,
    /// Round report history.
    ReportLog,
    /// Connected players.
    PlayerList,
    /// Console of the bot players.
    BotCommands,
}

impl AuxPanelKind {
    /// Every panel kind.
    pub const ALL: [AuxPanelKind; 5] = [
        AuxPanelKind::Minimap,
        AuxPanelKind::UnitDisplay,
        AuxPanelKind::ReportLog,
        AuxPanelKind::PlayerList,
        AuxPanelKind::BotCommands,
    ];

    /// Returns a string representation suitable for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AuxPanelKind::Minimap => "minimap",
            AuxPanelKind::UnitDisplay => "unit_display",
            AuxPanelKind::ReportLog => "report_log",
            AuxPanelKind::PlayerList => "player_list",
            AuxPanelKind::BotCommands => "bot_commands",
        }
    }
}

impl fmt::Display for AuxPanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a panel when a phase of some category starts.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Force the panel visible.
    Show,
    /// Force the panel hidden.
    Hide,
    /// Leave it as the user set it.
    #[default]
    Manual,
}

/// Shows and hides panels. Implemented by the host's window manager.
pub trait AuxPanels {
    /// Shows or hides `kind`.
    fn set_visible(&mut self, kind: AuxPanelKind, visible: bool);

    /// Whether `kind` is currently shown.
    fn is_visible(&self, kind: AuxPanelKind) -> bool;
}

/// Dispositions of one panel per phase category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct PanelRow {
    /// In the lobby.
    lobby: Disposition,
    /// In report phases.
    report: Disposition,
    /// In on-map action phases.
    on_map_action: Disposition,
    /// Everywhere else.
    other: Disposition,
}

impl PanelRow {
    const fn new(
        lobby: Disposition,
        report: Disposition,
        on_map_action: Disposition,
        other: Disposition,
    ) -> Self {
        Self {
            lobby,
            report,
            on_map_action,
            other,
        }
    }

    fn slot(&mut self, category: PhaseCategory) -> &mut Disposition {
        match category {
            PhaseCategory::Lobby => &mut self.lobby,
            PhaseCategory::Report => &mut self.report,
            PhaseCategory::OnMapAction => &mut self.on_map_action,
            PhaseCategory::Other => &mut self.other,
        }
    }

    const fn get(&self, category: PhaseCategory) -> Disposition {
        match category {
            PhaseCategory::Lobby => self.lobby,
            PhaseCategory::Report => self.report,
            PhaseCategory::OnMapAction => self.on_map_action,
            PhaseCategory::Other => self.other,
        }
    }
}

/// The full panel × category table.
///
/// Rows missing from persisted JSON fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PanelPolicy {
    minimap: PanelRow,
    unit_display: PanelRow,
    report_log: PanelRow,
    player_list: PanelRow,
    bot_commands: PanelRow,
}

impl Default for PanelPolicy {
    fn default() -> Self {
        use Disposition::{Hide, Manual, Show};
        Self {
            minimap: PanelRow::new(Hide, Manual, Manual, Manual),
            unit_display: PanelRow::new(Hide, Manual, Show, Manual),
            report_log: PanelRow::new(Hide, Show, Manual, Manual),
            player_list: PanelRow::new(Manual, Manual, Manual, Manual),
            bot_commands: PanelRow::new(Hide, Manual, Manual, Manual),
        }
    }
}

impl PanelPolicy {
    /// A policy that never touches any panel.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            minimap: PanelRow::default(),
            unit_display: PanelRow::default(),
            report_log: PanelRow::default(),
            player_list: PanelRow::default(),
            bot_commands: PanelRow::default(),
        }
    }

    fn row(&self, kind: AuxPanelKind) -> &PanelRow {
        match kind {
            AuxPanelKind::Minimap => &self.minimap,
            AuxPanelKind::UnitDisplay => &self.unit_display,
            AuxPanelKind::ReportLog => &self.report_log,
            AuxPanelKind::PlayerList => &self.player_list,
            AuxPanelKind::BotCommands => &self.bot_commands,
        }
    }

    fn row_mut(&mut self, kind: AuxPanelKind) -> &mut PanelRow {
        match kind {
            AuxPanelKind::Minimap => &mut self.minimap,
            AuxPanelKind::UnitDisplay => &mut self.unit_display,
            AuxPanelKind::ReportLog => &mut self.report_log,
            AuxPanelKind::PlayerList => &mut self.player_list,
            AuxPanelKind::BotCommands => &mut self.bot_commands,
        }
    }

    /// The disposition of `kind` during phases of `category`.
    #[must_use]
    pub fn get(&self, kind: AuxPanelKind, category: PhaseCategory) -> Disposition {
        self.row(kind).get(category)
    }

    /// Changes one entry.
    pub fn set(&mut self, kind: AuxPanelKind, category: PhaseCategory, disposition: Disposition) {
        *self.row_mut(kind).slot(category) = disposition;
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, kind: AuxPanelKind, category: PhaseCategory, disposition: Disposition) -> Self {
        self.set(kind, category, disposition);
        self
    }

    /// Applies the row of `phase`'s category to every panel.
    pub fn recompute_all<P: AuxPanels + ?Sized>(&self, phase: Phase, panels: &mut P) {
        let category = phase.category();
        for kind in AuxPanelKind::ALL {
            match self.get(kind, category) {
                Disposition::Show => panels.set_visible(kind, true),
                Disposition::Hide => panels.set_visible(kind, false),
                Disposition::Manual => {},
            }
            trace!(panel = %kind, %category, visible = panels.is_visible(kind), "panel policy applied");
        }
    }

    /// Serializes the policy for the preference store.
    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a policy written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
