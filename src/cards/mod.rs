//! Card system: records, instances, and the catalog.
//!
//! ## Key Types
//!
//! - `CardId`: identifier for printed cards
//! - `CardRecord`: static card data and raw rules text
//! - `CardInstance`: runtime card state (zone, damage, exertion)
//! - `CardCatalog`: record lookup plus compiled abilities

pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{CardCategory, CardId, CardRecord, InkColor};
pub use instance::CardInstance;
pub use registry::{CardCatalog, CatalogEntry, CatalogError};
