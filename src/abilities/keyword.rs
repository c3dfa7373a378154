//! Keyword vocabulary.
//!
//! Keywords are named reusable abilities with fixed reminder text. Some take
//! a value: "Shift 4", "Singer 5", "Challenger +2", "Shift: Discard a song
//! card".

use serde::{Deserialize, Serialize};

/// A keyword ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Evasive,
    Ward,
    Shift,
    Singer,
    Support,
    Rush,
    Reckless,
    Challenger,
    Bodyguard,
    Resist,
    SingTogether,
    Vanish,
    /// Marker granted by a song's reminder text; the value is the minimum
    /// cost of a character that can sing it.
    Singable,
}

/// What may follow a keyword's name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordGrammar {
    /// Nothing ("Evasive").
    Bare,
    /// An integer ("Singer 5", "Sing Together 8").
    Number,
    /// A signed bonus ("Challenger +2", "Resist +1").
    Bonus,
    /// An integer or a colon followed by free text ("Shift 4", "Shift: ...").
    NumberOrText,
}

impl Keyword {
    /// Keywords that can appear printed on cards, longest names first so
    /// a prefix scan never stops early.
    pub const PRINTED: [Keyword; 12] = [
        Keyword::SingTogether,
        Keyword::Challenger,
        Keyword::Bodyguard,
        Keyword::Reckless,
        Keyword::Evasive,
        Keyword::Support,
        Keyword::Resist,
        Keyword::Singer,
        Keyword::Vanish,
        Keyword::Shift,
        Keyword::Ward,
        Keyword::Rush,
    ];

    /// Printed name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Keyword::Evasive => "Evasive",
            Keyword::Ward => "Ward",
            Keyword::Shift => "Shift",
            Keyword::Singer => "Singer",
            Keyword::Support => "Support",
            Keyword::Rush => "Rush",
            Keyword::Reckless => "Reckless",
            Keyword::Challenger => "Challenger",
            Keyword::Bodyguard => "Bodyguard",
            Keyword::Resist => "Resist",
            Keyword::SingTogether => "Sing Together",
            Keyword::Vanish => "Vanish",
            Keyword::Singable => "Singable",
        }
    }

    #[must_use]
    pub const fn grammar(self) -> KeywordGrammar {
        match self {
            Keyword::Shift => KeywordGrammar::NumberOrText,
            Keyword::Singer | Keyword::SingTogether | Keyword::Singable => KeywordGrammar::Number,
            Keyword::Challenger | Keyword::Resist => KeywordGrammar::Bonus,
            _ => KeywordGrammar::Bare,
        }
    }

    /// Look up a printed keyword by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Keyword> {
        let name = name.trim();
        Self::PRINTED
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Whether several instances of this keyword add their values together.
    #[must_use]
    pub const fn stacks(self) -> bool {
        matches!(self, Keyword::Challenger | Keyword::Resist)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value attached to a printed keyword.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeywordValue {
    Number(i64),
    Text(String),
}

impl KeywordValue {
    #[must_use]
    pub fn as_number(&self) -> Option<i64> {
        match self {
            KeywordValue::Number(n) => Some(*n),
            KeywordValue::Text(_) => None,
        }
    }
}

/// A keyword with its extracted value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeywordAbility {
    pub keyword: Keyword,
    pub value: Option<KeywordValue>,
}

impl KeywordAbility {
    #[must_use]
    pub fn bare(keyword: Keyword) -> Self {
        Self { keyword, value: None }
    }

    #[must_use]
    pub fn numeric(keyword: Keyword, value: i64) -> Self {
        Self {
            keyword,
            value: Some(KeywordValue::Number(value)),
        }
    }
}
