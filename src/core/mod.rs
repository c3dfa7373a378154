//! Core engine types: entities, players, zones, configuration, RNG, state.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod state;

pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use config::{EngineConfig, Zone};
pub use state::{Expiry, GameState, PlayerState, TimedModifier};
