//! Card catalog for record and ability lookup.
//!
//! The `CardCatalog` owns every card record of a game together with the
//! abilities compiled from its text. Abilities live as long as their card
//! entry; the engine refers to them by `AbilityId` and looks them up here.

use rustc_hash::FxHashMap;

use super::definition::{CardId, CardRecord};
use crate::abilities::{AbilityDefinition, AbilityId};
use crate::compiler::Compiler;

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{0} is already registered")]
    Duplicate(CardId),
}

/// One card record and its compiled abilities.
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub record: CardRecord,
    pub abilities: Vec<AbilityDefinition>,
}

/// Catalog of card records.
///
/// ## Example
///
/// ```
/// use rust_lore::cards::{CardCatalog, CardCategory, CardId, CardRecord};
/// use rust_lore::compiler::Compiler;
///
/// let mut catalog = CardCatalog::new();
/// let record = CardRecord::new(CardId::new(1), "Stitch", CardCategory::Character, 2)
///     .with_stats(2, 2, 1)
///     .with_text("Evasive (Only characters with Evasive can challenge this character.)");
///
/// let entry = catalog.register(record, Compiler::standard()).unwrap();
/// assert_eq!(entry.abilities.len(), 1);
/// assert!(catalog.get(CardId::new(1)).is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardCatalog {
    cards: FxHashMap<CardId, CatalogEntry>,
}

impl CardCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a record's text and register it.
    pub fn register(
        &mut self,
        record: CardRecord,
        compiler: &Compiler,
    ) -> Result<&CatalogEntry, CatalogError> {
        if self.cards.contains_key(&record.id) {
            return Err(CatalogError::Duplicate(record.id));
        }
        let abilities = compiler.compile(&record);
        self.insert(record, abilities)
    }

    /// Register a record with abilities compiled elsewhere.
    pub fn insert(
        &mut self,
        record: CardRecord,
        abilities: Vec<AbilityDefinition>,
    ) -> Result<&CatalogEntry, CatalogError> {
        let id = record.id;
        match self.cards.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => Err(CatalogError::Duplicate(id)),
            std::collections::hash_map::Entry::Vacant(slot) => {
                tracing::debug!(card = %id, abilities = abilities.len(), "registered card");
                Ok(slot.insert(CatalogEntry { record, abilities }))
            }
        }
    }

    /// Get a catalog entry by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CatalogEntry> {
        self.cards.get(&id)
    }

    /// Get a card record by ID.
    #[must_use]
    pub fn record(&self, id: CardId) -> Option<&CardRecord> {
        self.cards.get(&id).map(|e| &e.record)
    }

    /// Abilities of a card; empty for unknown ids.
    #[must_use]
    pub fn abilities(&self, id: CardId) -> &[AbilityDefinition] {
        self.cards.get(&id).map_or(&[], |e| e.abilities.as_slice())
    }

    /// Look up an ability, including abilities nested inside grant effects.
    #[must_use]
    pub fn ability(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        let entry = self.cards.get(&id.card)?;
        let top = entry.abilities.iter().find(|a| a.id.ordinal == id.ordinal)?;
        if id.nested == 0 {
            Some(top)
        } else {
            top.find_nested(id)
        }
    }

    /// Check if a card ID is registered.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all entries (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.cards.values()
    }

    /// Find entries by card name, ignoring case.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.cards
            .values()
            .filter(move |e| e.record.name.eq_ignore_ascii_case(name))
    }
}
