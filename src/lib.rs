//! # rust-lore
//!
//! A rules-text compiler and resolution engine for an ink-based trading
//! card game.
//!
//! ## Design Principles
//!
//! 1. **Text In, Data Out**: The compiler is a pure function from a card's
//!    rules text to a list of `AbilityDefinition`s. Abilities are plain,
//!    serializable data; nothing in them points back at live cards.
//!
//! 2. **Pattern Tables Over Grammar**: Trigger phrases and effect idioms
//!    are ordered tables of regex rows. New templates are new rows.
//!
//! 3. **Explicit State**: `GameState`, the `CardCatalog` and `EngineConfig`
//!    are passed in. There are no process-wide games, so many simulations
//!    can run side by side.
//!
//! 4. **Recompute, Don't Patch**: Continuous effects and the trigger index
//!    are rebuilt from scratch on every state-based check.
//!
//! ## Modules
//!
//! - `core`: entity ids, players, zones, configuration, RNG, game state
//! - `zones`: per-player ordered zones
//! - `cards`: card records, instances and the catalog
//! - `abilities`: the compiled ability model
//! - `compiler`: rules text to abilities
//! - `triggers`: events, trigger descriptors, conditions, trigger index
//! - `effects`: effect nodes, targeting, effect handlers, continuous layers
//! - `stack`: FIFO trigger queue
//! - `rules`: resolution engine and turn actions

pub mod abilities;
pub mod cards;
pub mod compiler;
pub mod core;
pub mod effects;
pub mod rules;
pub mod stack;
pub mod triggers;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{EngineConfig, EntityId, GameRng, GameState, PlayerId, PlayerMap, Zone};

pub use crate::zones::{ZoneManager, ZonePosition};

pub use crate::cards::{CardCatalog, CardCategory, CardId, CardInstance, CardRecord};

pub use crate::abilities::{AbilityCategory, AbilityDefinition, AbilityId, CostToken, Keyword};

pub use crate::compiler::{Compilation, CompileError, Compiler, Diagnostic};

pub use crate::effects::{Effect, LayerSet, TargetScope, TargetSelector};

pub use crate::triggers::{Condition, EventKind, GameEvent, TriggerDescriptor, TriggerIndex};

pub use crate::stack::TriggerQueue;

pub use crate::rules::{DecisionMaker, EngineError, PlayMode, ResolutionEngine, ResolutionReport};
