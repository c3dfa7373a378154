//! Trigger system for event-driven abilities.
//!
//! ## Key Components
//!
//! - [`EventKind`] / [`GameEvent`]: what happened, with source/target identities
//! - [`TriggerDescriptor`]: the structured key a triggered ability listens for
//! - [`Condition`]: guard conditions ("if", "while", "during your turn")
//! - [`TriggerIndex`]: event kind -> subscribed abilities of cards in play
//!
//! ## Example Usage
//!
//! ```
//! use rust_lore::cards::{CardCatalog, CardCategory, CardId, CardRecord};
//! use rust_lore::compiler::Compiler;
//! use rust_lore::core::{GameState, PlayerId, Zone};
//! use rust_lore::effects::{GameView, LayerSet};
//! use rust_lore::triggers::{GameEvent, TriggerIndex};
//!
//! let mut catalog = CardCatalog::new();
//! catalog.register(
//!     CardRecord::new(CardId::new(1), "Scout", CardCategory::Character, 2)
//!         .with_stats(1, 2, 1)
//!         .with_text("LOOK AHEAD When you play this character, draw a card."),
//!     Compiler::standard(),
//! ).unwrap();
//!
//! let mut state = GameState::new(2, 42);
//! let scout = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);
//!
//! let layers = LayerSet::default();
//! let view = GameView::new(&state, &catalog, &layers);
//! let mut index = TriggerIndex::new();
//! index.rebuild(&view);
//!
//! let matches = index.find_matches(&GameEvent::card_played(scout, PlayerId::new(0)), &view);
//! assert_eq!(matches.len(), 1);
//! ```

mod condition;
mod event;
mod registry;

pub use condition::{
    Condition, ConditionContext, ConditionEvaluator, SubjectRole, TriggerDescriptor,
    TriggerQualifier, TriggerSubject,
};
pub use event::{EventKind, GameEvent, CHALLENGE_TAG};
pub use registry::{Subscription, TriggerIndex};
