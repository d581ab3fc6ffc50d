//! Registration tables of the two input sources.
//!
//! Board input and commands each have a listener list. During a transition the
//! outgoing handler is removed from both before the incoming one is added, so input
//! never reaches two handlers and never reaches a swapped-out one.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::handlers::registry::HandlerId;

/// One of the two input sources handlers listen to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Clicks and cursor movement on the board.
    Board,
    /// Menu entries and keyboard shortcuts.
    Commands,
}

impl InputSource {
    /// Both sources.
    pub const ALL: [InputSource; 2] = [InputSource::Board, InputSource::Commands];
}

/// Who listens to which source.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    board: SmallVec<[HandlerId; 2]>,
    commands: SmallVec<[HandlerId; 2]>,
}

impl InputRouter {
    /// Creates a router without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, source: InputSource) -> &SmallVec<[HandlerId; 2]> {
        match source {
            InputSource::Board => &self.board,
            InputSource::Commands => &self.commands,
        }
    }

    fn table_mut(&mut self, source: InputSource) -> &mut SmallVec<[HandlerId; 2]> {
        match source {
            InputSource::Board => &mut self.board,
            InputSource::Commands => &mut self.commands,
        }
    }

    /// Adds `id` as a listener of `source`. Returns `false` if it already was one.
    pub fn register(&mut self, source: InputSource, id: HandlerId) -> bool {
        let table = self.table_mut(source);
        if table.contains(&id) {
            return false;
        }
        table.push(id);
        true
    }

    /// Removes `id` from `source`. Returns `false` if it was not registered.
    pub fn unregister(&mut self, source: InputSource, id: HandlerId) -> bool {
        let table = self.table_mut(source);
        match table.iter().position(|registered| *registered == id) {
            Some(index) => {
                table.remove(index);
                true
            },
            None => false,
        }
    }

    /// Removes `id` from both sources.
    pub fn unregister_all(&mut self, id: HandlerId) {
        for source in InputSource::ALL {
            self.unregister(source, id);
        }
    }

    /// The listeners of `source`, in registration order.
    #[must_use]
    pub fn listeners(&self, source: InputSource) -> &[HandlerId] {
        self.table(source)
    }

    /// Whether `id` listens to `source`.
    #[must_use]
    pub fn is_registered(&self, source: InputSource, id: HandlerId) -> bool {
        self.table(source).contains(&id)
    }

    /// Every handler registered on at least one source.
    #[must_use]
    pub fn registered_ids(&self) -> BTreeSet<HandlerId> {
        self.board.iter().chain(self.commands.iter()).copied().collect()
    }
}
