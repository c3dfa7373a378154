//! Zone system for card locations.
//!
//! Zones are fixed (`core::Zone`) and owned per player. A card always lives
//! in its owner's zones; control changes do not move it.
//!
//! ## Key Types
//!
//! - `ZoneKey`: a `(PlayerId, Zone)` pair
//! - `ZoneManager`: card location tracking and movement
//! - `ZonePosition`: position specifier for ordered zones

pub mod manager;

pub use manager::{ZoneKey, ZoneManager, ZonePosition};

pub use crate::core::config::Zone;
