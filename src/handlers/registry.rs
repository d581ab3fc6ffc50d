//! Lazily built, session-long cache of phase handlers.
//!
//! Handlers live in an arena and are addressed by [`HandlerId`]. Every phase has
//! its own key, except that all report phases resolve to the single handler stored
//! under [`HandlerKey::Report`]: the report display is one screen whose content is
//! swapped, not one screen per report.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::error::{SessionError, SessionResult};
use crate::handlers::{HandlerFactory, PhaseHandler, SurfaceLayout};
use crate::phase::Phase;
use crate::ClientShell;

/// Index of a handler in the registry arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Returns the arena index.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler {}", self.0)
    }
}

/// Lookup key of a cached handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerKey {
    /// The handler of one specific phase.
    Phase(Phase),
    /// The handler shared by all report phases.
    Report,
}

/// A cached handler together with the surfaces it occupies.
pub struct HandlerEntry {
    /// The key the handler was built for.
    pub key: HandlerKey,
    /// Where it is shown.
    pub layout: SurfaceLayout,
    /// The handler itself.
    pub handler: Box<dyn PhaseHandler>,
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("key", &self.key)
            .field("layout", &self.layout)
            .field("capabilities", &self.handler.capabilities())
            .finish_non_exhaustive()
    }
}

/// The handler cache.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: Vec<HandlerEntry>,
    by_key: BTreeMap<HandlerKey, HandlerId>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handler for `phase`, building it on first use.
    ///
    /// Building the lobby handler clears every board view cache; building the
    /// exchange handler first tears down the lobby preview. A factory failure is
    /// returned as [`SessionError::HandlerConstruction`] and is never retried by the
    /// registry itself.
    pub fn resolve<F, S>(
        &mut self,
        phase: Phase,
        factory: &mut F,
        shell: &mut S,
    ) -> SessionResult<HandlerId>
    where
        F: HandlerFactory + ?Sized,
        S: ClientShell + ?Sized,
    {
        let key = HandlerKey::Phase(phase);
        if let Some(id) = self.by_key.get(&key) {
            trace!(%phase, %id, "handler cache hit");
            return Ok(*id);
        }

        if phase.is_report() {
            if let Some(id) = self.by_key.get(&HandlerKey::Report).copied() {
                debug!(%phase, %id, "aliasing report phase to the shared report handler");
                self.by_key.insert(key, id);
                return Ok(id);
            }
        }

        if phase == Phase::Exchange {
            shell.teardown_lobby_preview();
        }

        let handler = factory
            .build(phase)
            .map_err(|err| SessionError::HandlerConstruction {
                phase,
                reason: err.reason,
            })?;

        if phase == Phase::Lobby {
            shell.clear_board_caches();
        }

        let id = HandlerId(self.entries.len());
        let canonical = if phase.is_report() {
            HandlerKey::Report
        } else {
            key
        };
        self.entries.push(HandlerEntry {
            key: canonical,
            layout: SurfaceLayout::for_phase(phase),
            handler,
        });
        self.by_key.insert(key, id);
        if canonical == HandlerKey::Report {
            self.by_key.insert(HandlerKey::Report, id);
        }
        debug!(%phase, %id, "built phase handler");
        Ok(id)
    }

    /// The surfaces used for `phase`.
    #[must_use]
    pub const fn layout(&self, phase: Phase) -> SurfaceLayout {
        SurfaceLayout::for_phase(phase)
    }

    /// The cached handler for `phase`, without building anything.
    #[must_use]
    pub fn id_for(&self, phase: Phase) -> Option<HandlerId> {
        self.by_key.get(&HandlerKey::Phase(phase)).copied()
    }

    /// The entry behind `id`.
    #[must_use]
    pub fn get(&self, id: HandlerId) -> Option<&HandlerEntry> {
        self.entries.get(id.0)
    }

    /// Mutable access to the entry behind `id`.
    pub fn get_mut(&mut self, id: HandlerId) -> Option<&mut HandlerEntry> {
        self.entries.get_mut(id.0)
    }

    /// Number of distinct handlers built so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handler has been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
