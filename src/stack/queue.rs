//! FIFO trigger queue.
//!
//! Triggered abilities wait here between the event that fired them and
//! their resolution. The engine enqueues every match of one event in
//! resolution order, then pops from the front until the queue is empty.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityId;
use crate::core::{EntityId, PlayerId};
use crate::triggers::{GameEvent, Subscription};

/// A triggered ability waiting to resolve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingTrigger {
    pub ability: AbilityId,
    /// Card the ability is on.
    pub source: EntityId,
    pub controller: PlayerId,
    /// The event that fired it.
    pub event: GameEvent,
    /// Sequence number assigned on enqueue.
    pub order: u64,
}

/// Pending triggered abilities, oldest first.
#[derive(Clone, Debug, Default)]
pub struct TriggerQueue {
    pending: VecDeque<PendingTrigger>,
    next_order: u64,
}

impl TriggerQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a matched subscription.
    pub fn push(&mut self, subscription: &Subscription, event: &GameEvent) {
        self.pending.push_back(PendingTrigger {
            ability: subscription.ability,
            source: subscription.source,
            controller: subscription.controller,
            event: event.clone(),
            order: self.next_order,
        });
        self.next_order += 1;
    }

    /// Take the oldest pending trigger.
    pub fn pop(&mut self) -> Option<PendingTrigger> {
        self.pending.pop_front()
    }

    /// Peek at the oldest pending trigger.
    #[must_use]
    pub fn peek(&self) -> Option<&PendingTrigger> {
        self.pending.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything still pending.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingTrigger> {
        self.pending.iter()
    }
}
