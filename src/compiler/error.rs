//! Compiler errors.

use crate::cards::CardId;

/// Why one ability candidate was rejected.
///
/// Compile errors never abort a card: the offending ability is dropped and
/// the rest of the card (and catalog) keeps compiling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("no effect recognized in {text:?}")]
    NoEffects { text: String },

    #[error("activated ability without a cost: {text:?}")]
    MissingCost { text: String },

    #[error("triggered ability without a trigger: {text:?}")]
    MissingTrigger { text: String },

    #[error("invalid pattern {name}: {message}")]
    InvalidPattern { name: String, message: String },

    /// Not a rejection: the ability compiled without this text.
    #[error("text not recognized, compiled without it: {text:?}")]
    Unmatched { text: String },
}

/// A rejected ability, or text an accepted ability was compiled without,
/// with enough context to find it in the card data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub card: CardId,
    pub card_name: String,
    /// Ordinal of the ability on the card.
    pub ordinal: u16,
    pub text: String,
    pub error: CompileError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}#{}): {}", self.card_name, self.card, self.ordinal, self.error)
    }
}
