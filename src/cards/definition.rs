//! Card records - static card data.
//!
//! `CardRecord` holds the immutable printed properties of a card: name,
//! cost, category, stats and raw rules-text blocks. Records come from an
//! external card database (usually JSON) and are never mutated by the
//! compiler.
//!
//! Instance-specific data (damage, exertion, zone) is stored separately in
//! `CardInstance`.

use serde::{Deserialize, Serialize};

/// Unique identifier for a card definition.
///
/// This identifies the printed card, not a specific copy in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Printed card category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    Character,
    Action,
    Item,
    Location,
}

impl CardCategory {
    /// Whether cards of this category stay in play after being played.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        !matches!(self, CardCategory::Action)
    }

    /// Whether cards of this category take damage and can be banished by it.
    #[must_use]
    pub const fn takes_damage(self) -> bool {
        matches!(self, CardCategory::Character | CardCategory::Location)
    }
}

impl std::fmt::Display for CardCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CardCategory::Character => "character",
            CardCategory::Action => "action",
            CardCategory::Item => "item",
            CardCategory::Location => "location",
        };
        f.write_str(name)
    }
}

/// Ink color (faction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkColor {
    Amber,
    Amethyst,
    Emerald,
    Ruby,
    Sapphire,
    Steel,
}

/// Static card record.
///
/// ## Example
///
/// ```
/// use rust_lore::cards::{CardCategory, CardId, CardRecord};
///
/// let card = CardRecord::new(CardId::new(1), "Mickey Mouse", CardCategory::Character, 3)
///     .with_version("Brave Little Tailor")
///     .with_stats(3, 4, 2)
///     .with_text("Evasive (Only characters with Evasive can challenge this character.)");
///
/// assert_eq!(card.display_name(), "Mickey Mouse - Brave Little Tailor");
/// assert_eq!(card.text.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,

    pub name: String,

    /// Subtitle printed under the name.
    #[serde(default)]
    pub version: Option<String>,

    /// Ink cost.
    pub cost: u32,

    pub category: CardCategory,

    /// Whether the card may be put into the inkwell.
    #[serde(default)]
    pub inkable: bool,

    #[serde(default)]
    pub color: Option<InkColor>,

    /// Classifications such as "Song", "Hero" or "Floodborn".
    #[serde(default)]
    pub classifications: Vec<String>,

    #[serde(default)]
    pub strength: Option<i64>,

    #[serde(default)]
    pub willpower: Option<i64>,

    #[serde(default)]
    pub lore: Option<i64>,

    /// Raw rules-text blocks, in printed order.
    #[serde(default)]
    pub text: Vec<String>,
}

impl CardRecord {
    /// Create a record with no text, stats or classifications.
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, category: CardCategory, cost: u32) -> Self {
        Self {
            id,
            name: name.into(),
            version: None,
            cost,
            category,
            inkable: false,
            color: None,
            classifications: Vec::new(),
            strength: None,
            willpower: None,
            lore: None,
            text: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_inkable(mut self, inkable: bool) -> Self {
        self.inkable = inkable;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: InkColor) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classifications.push(classification.into());
        self
    }

    /// Set strength, willpower and lore.
    #[must_use]
    pub fn with_stats(mut self, strength: i64, willpower: i64, lore: i64) -> Self {
        self.strength = Some(strength);
        self.willpower = Some(willpower);
        self.lore = Some(lore);
        self
    }

    /// Append a rules-text block.
    #[must_use]
    pub fn with_text(mut self, block: impl Into<String>) -> Self {
        self.text.push(block.into());
        self
    }

    /// `"Name - Version"`, or just the name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.version {
            Some(version) if !version.is_empty() => format!("{} - {}", self.name, version),
            _ => self.name.clone(),
        }
    }

    /// Case-insensitive classification check.
    #[must_use]
    pub fn has_classification(&self, classification: &str) -> bool {
        self.classifications
            .iter()
            .any(|c| c.eq_ignore_ascii_case(classification))
    }

    #[must_use]
    pub fn is_song(&self) -> bool {
        self.has_classification("Song")
    }
}
