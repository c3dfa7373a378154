//! Game event types.
//!
//! Events represent things that happened during a game. Turn actions and
//! effect handlers produce them; triggered abilities are matched against
//! them by `EventKind` and subject.
//!
//! ## Conventions
//!
//! | Kind                | `source`            | `target`           | `player`      |
//! |---------------------|---------------------|--------------------|---------------|
//! | `CardPlayed`        | played card         | shifted-onto card  | controller    |
//! | `CharacterQuested`  | questing character  |                    | controller    |
//! | `ChallengeDeclared` | challenger          | defender           | attacker      |
//! | `Banished`          | card responsible    | banished card      | its controller|
//! | `DamageDealt`       | damage source       | damaged card       |               |
//! | `CardDrawn`         |                     | drawn card         | drawer        |
//! | `CardInked`         | inked card          |                    | controller    |
//! | `Exerted`/`Readied` |                     | card               | controller    |
//! | `SongSung`          | song                | singer             | controller    |
//! | `TurnStarted`/`TurnEnded` |               |                    | active player |

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// Tag on `Banished`/`DamageDealt` events caused by a challenge.
pub const CHALLENGE_TAG: &str = "challenge";

/// Closed taxonomy of game events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    TurnStarted,
    TurnEnded,
    CardPlayed,
    CharacterQuested,
    ChallengeDeclared,
    Banished,
    DamageDealt,
    CardDrawn,
    CardInked,
    Exerted,
    Readied,
    SongSung,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A game event with contextual data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,

    /// The entity that caused the event.
    pub source: Option<EntityId>,

    /// The entity affected by the event.
    pub target: Option<EntityId>,

    /// The player associated with the event.
    pub player: Option<PlayerId>,

    /// Numeric payload; index 0 is the amount (damage dealt, lore gained).
    pub values: Vec<i64>,

    /// Extra markers such as [`CHALLENGE_TAG`].
    pub tags: Vec<String>,
}

impl GameEvent {
    /// Create a new event with just a kind.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            player: None,
            values: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.values.push(value);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Value at `index`, or a default.
    #[must_use]
    pub fn value(&self, index: usize, default: i64) -> i64 {
        self.values.get(index).copied().unwrap_or(default)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[must_use]
    pub fn in_challenge(&self) -> bool {
        self.has_tag(CHALLENGE_TAG)
    }
}

/// Constructors for the common event shapes.
impl GameEvent {
    pub fn turn_started(player: PlayerId) -> Self {
        Self::new(EventKind::TurnStarted).with_player(player)
    }

    pub fn turn_ended(player: PlayerId) -> Self {
        Self::new(EventKind::TurnEnded).with_player(player)
    }

    pub fn card_played(card: EntityId, controller: PlayerId) -> Self {
        Self::new(EventKind::CardPlayed)
            .with_source(card)
            .with_player(controller)
    }

    pub fn quested(character: EntityId, controller: PlayerId, lore: i64) -> Self {
        Self::new(EventKind::CharacterQuested)
            .with_source(character)
            .with_player(controller)
            .with_value(lore)
    }

    pub fn challenge(attacker: EntityId, defender: EntityId, controller: PlayerId) -> Self {
        Self::new(EventKind::ChallengeDeclared)
            .with_source(attacker)
            .with_target(defender)
            .with_player(controller)
            .with_tag(CHALLENGE_TAG)
    }

    /// `banisher` is the card responsible, if any.
    pub fn banished(card: EntityId, controller: PlayerId, banisher: Option<EntityId>) -> Self {
        let event = Self::new(EventKind::Banished)
            .with_target(card)
            .with_player(controller);
        match banisher {
            Some(source) => event.with_source(source),
            None => event,
        }
    }

    pub fn damage(source: Option<EntityId>, target: EntityId, amount: i64) -> Self {
        let event = Self::new(EventKind::DamageDealt)
            .with_target(target)
            .with_value(amount);
        match source {
            Some(source) => event.with_source(source),
            None => event,
        }
    }

    pub fn drawn(card: EntityId, player: PlayerId) -> Self {
        Self::new(EventKind::CardDrawn)
            .with_target(card)
            .with_player(player)
    }

    pub fn inked(card: EntityId, player: PlayerId) -> Self {
        Self::new(EventKind::CardInked)
            .with_source(card)
            .with_player(player)
    }

    pub fn exerted(card: EntityId, controller: PlayerId) -> Self {
        Self::new(EventKind::Exerted)
            .with_target(card)
            .with_player(controller)
    }

    pub fn readied(card: EntityId, controller: PlayerId) -> Self {
        Self::new(EventKind::Readied)
            .with_target(card)
            .with_player(controller)
    }

    pub fn song_sung(song: EntityId, singer: EntityId, controller: PlayerId) -> Self {
        Self::new(EventKind::SongSung)
            .with_source(song)
            .with_target(singer)
            .with_player(controller)
    }
}
