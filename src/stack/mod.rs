//! Trigger queue.
//!
//! Triggered abilities never resolve in the middle of another ability.
//! They are queued when their event is matched and resolved one at a time,
//! first in, first out, with a state-based check after each.
//!
//! ## Example Usage
//!
//! ```
//! use rust_lore::abilities::AbilityId;
//! use rust_lore::cards::CardId;
//! use rust_lore::core::{EntityId, PlayerId};
//! use rust_lore::stack::TriggerQueue;
//! use rust_lore::triggers::{GameEvent, Subscription};
//!
//! let mut queue = TriggerQueue::new();
//! let subscription = Subscription {
//!     ability: AbilityId::new(CardId::new(7), 0),
//!     source: EntityId(3),
//!     controller: PlayerId::new(0),
//!     order: 0,
//! };
//! queue.push(&subscription, &GameEvent::turn_started(PlayerId::new(0)));
//! assert_eq!(queue.pop().map(|t| t.source), Some(EntityId(3)));
//! ```

mod queue;

pub use queue::{PendingTrigger, TriggerQueue};
