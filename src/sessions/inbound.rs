//! The queue between the transport and the controller.
//!
//! The transport keeps a clone of the [`InboundQueue`] and pushes events as it
//! deserializes them; the controller drains it in [`SessionController::pump`].
//! Because the controller only pops between events, anything pushed while a decision
//! prompt is open is applied after that prompt's reply has been sent.
//!
//! [`SessionController::pump`]: crate::SessionController::pump

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::SessionEvent;

/// Shared FIFO of inbound events.
///
/// Cloning yields another handle to the same queue. The lock is only held for the
/// duration of a push or pop.
///
/// ```
/// use wargame_session::{InboundQueue, SessionEvent};
///
/// let queue = InboundQueue::new();
/// let transport = queue.clone();
/// transport.push(SessionEvent::GameEnded);
/// assert_eq!(queue.len(), 1);
/// assert_eq!(queue.pop(), Some(SessionEvent::GameEnded));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InboundQueue {
    events: Arc<Mutex<VecDeque<SessionEvent>>>,
}

impl InboundQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event. Returns the queue length after the push.
    pub fn push(&self, event: SessionEvent) -> usize {
        let mut events = self.events.lock();
        events.push_back(event);
        events.len()
    }

    /// Appends several events, keeping their order.
    pub fn extend<I: IntoIterator<Item = SessionEvent>>(&self, events: I) -> usize {
        let mut queue = self.events.lock();
        queue.extend(events);
        queue.len()
    }

    /// Removes the oldest event.
    #[must_use]
    pub fn pop(&self) -> Option<SessionEvent> {
        self.events.lock().pop_front()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
