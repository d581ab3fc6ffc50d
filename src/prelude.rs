//! Convenient re-exports for common usage.
//!
//! ```rust
//! use wargame_session::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - **Session types**: [`SessionController`], [`SessionBuilder`], [`Collaborators`], [`InboundQueue`]
//! - **Collaborator traits**: [`Config`], [`CommandSink`], [`RulesOracle`], [`DecisionPrompter`],
//!   [`HandlerFactory`], [`PhaseHandler`], [`AuxPanels`], [`ClientShell`]
//! - **Events**: [`SessionEvent`], [`BoardEvent`], [`CfrPacket`]
//! - **Feedback requests**: [`CfrRequest`], [`CfrResponse`], [`CfrOutcome`]
//! - **Phases**: [`Phase`], [`PhaseCategory`], [`SessionState`]
//! - **Error handling**: [`SessionError`], [`SessionResult`], [`HandlerBuildError`]
//! - **Configuration**: [`SessionConfig`], [`PanelPolicy`]

pub use crate::cfr::prompt::{Choice, ChoicePrompt, ConfirmPrompt, Confirmation, DecisionPrompter};
pub use crate::cfr::{CfrOutcome, CfrPacket, CfrRequest, CfrResponse, StepDirection};
pub use crate::error::{HandlerBuildError, SessionError, SessionResult};
pub use crate::handlers::{Capabilities, HandlerFactory, PhaseHandler, SurfaceId};
pub use crate::panels::{AuxPanelKind, AuxPanels, Disposition, PanelPolicy};
pub use crate::phase::{Phase, PhaseCategory};
pub use crate::roster::EntitySummary;
pub use crate::sessions::builder::{Collaborators, SessionBuilder};
pub use crate::sessions::config::SessionConfig;
pub use crate::sessions::controller::SessionController;
pub use crate::sessions::inbound::InboundQueue;
pub use crate::{
    BoardEvent, ClientShell, CommandSink, Config, EntityId, PlayerId, RulesOracle, SessionEvent,
    SessionState,
};
