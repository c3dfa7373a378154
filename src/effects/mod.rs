//! Effect system for card abilities.
//!
//! - `Effect`: the closed set of structured effect nodes the compiler emits
//! - `TargetSelector` / `CardFilter`: which cards an effect may affect
//! - `TargetingResolver`: turns a selector into the legal target set
//! - `EffectResolver`: executes effects on game state, one handler per kind
//! - `LayerSet`: continuous effects of static abilities, recomputed on
//!   every state-based check
//!
//! ## Design Philosophy
//!
//! Effects never hold references to cards. Selectors are descriptions that
//! are evaluated against a `GameView` at the moment they resolve, so the
//! same compiled ability works for every copy of a card in every game.

mod effect;
pub mod layers;
mod resolver;
pub mod targeting;

pub use effect::{Amount, ChoiceMode, Destination, Duration, Effect, Grant, Restriction, Stat};
pub use layers::{ContinuousEffectLayer, EntityModifiers, LayerSet, Modifier};
pub(crate) use resolver::{banish, deal_damage};
pub use resolver::{EffectOutcome, EffectResolver, ResolutionContext};
pub use targeting::{
    CardFilter, Comparison, FilterContext, GameView, PlayerSelector, Relation, StatComparison,
    TargetContext, TargetScope, TargetSelector, TargetingResolver,
};
