//! In-process message bus
//!
//! A handler table keyed by message kind plus a FIFO of messages posted while
//! another message is being delivered. `Match::post` drains the queue before
//! returning, so delivery is synchronous from the poster's point of view and
//! handlers never run re-entrantly.

use crate::game::actions::{ActionMessage, MessageKind};
use crate::game::Match;
use crate::Result;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Reacts to one message. Handlers mutate the match directly.
pub type Handler = fn(&mut Match, &ActionMessage) -> Result<()>;

#[derive(Default)]
pub struct MessageBus {
    handlers: FxHashMap<MessageKind, SmallVec<[Handler; 1]>>,
    queue: VecDeque<ActionMessage>,
    dispatching: bool,
    delivered: u64,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: MessageKind, handler: Handler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Handlers for a kind, copied out so the match can be borrowed mutably
    /// while they run
    pub fn handlers_for(&self, kind: MessageKind) -> SmallVec<[Handler; 1]> {
        self.handlers.get(&kind).cloned().unwrap_or_default()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    pub(crate) fn set_dispatching(&mut self, dispatching: bool) {
        self.dispatching = dispatching;
    }

    pub(crate) fn enqueue(&mut self, message: ActionMessage) {
        self.queue.push_back(message);
    }

    pub(crate) fn dequeue(&mut self) -> Option<ActionMessage> {
        self.queue.pop_front()
    }

    pub(crate) fn record_delivery(&mut self) {
        self.delivered += 1;
    }

    /// Messages delivered so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("kinds", &self.handlers.len())
            .field("pending", &self.queue.len())
            .field("delivered", &self.delivered)
            .finish()
    }
}
