//! Resolution engine and turn actions.
//!
//! The engine consumes compiled abilities, never produces them:
//! - `ResolutionEngine::notify` matches an event against the trigger index
//!   and resolves the resulting cascade to quiescence
//! - `ResolutionEngine::legal_targets` answers targeting queries for the
//!   action layer
//! - the turn actions (`play_card`, `quest`, `challenge`, `activate`, ...)
//!   are the only mutators of `GameState` besides effects
//!
//! Player choices go through the `DecisionMaker` trait.

pub mod actions;
pub mod choices;
pub mod engine;
mod state_based;

pub use actions::{ActionOutcome, PlayMode, Shortfall};
pub use choices::{DecisionMaker, FirstChoice};
pub use engine::{EngineError, ResolutionEngine, ResolutionReport};
