use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Match modifiers of a single condition.
    ///
    /// These are the `I`, `R` and `T` letters of an `IFilter.def` condition
    /// line. In Sieve they become the comparator and the match type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MatchFlags: u8 {
        const CASE_INSENSITIVE = 1 << 0;
        const REGEX = 1 << 1;
        const PREFIX = 1 << 2;
    }
}

impl MatchFlags {
    /// Parse the flag column of a condition line. Unknown letters are ignored.
    pub fn from_becky(s: &str) -> Self {
        s.chars().fold(Self::empty(), |flags, ch| {
            flags
                | match ch {
                    'I' => Self::CASE_INSENSITIVE,
                    'R' => Self::REGEX,
                    'T' => Self::PREFIX,
                    _ => Self::empty(),
                }
        })
    }

    pub fn as_becky(&self) -> String {
        let mut out = String::with_capacity(3);
        if self.contains(Self::CASE_INSENSITIVE) {
            out.push('I');
        }
        if self.contains(Self::REGEX) {
            out.push('R');
        }
        if self.contains(Self::PREFIX) {
            out.push('T');
        }
        out
    }

    /// Regex matching takes precedence over prefix matching.
    pub fn match_kind(&self) -> MatchKind {
        if self.contains(Self::REGEX) {
            MatchKind::Regex
        } else if self.contains(Self::PREFIX) {
            MatchKind::Prefix
        } else {
            MatchKind::Contains
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.contains(Self::CASE_INSENSITIVE)
    }
}

impl fmt::Display for MatchFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_becky())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Contains,
    Prefix,
    Regex,
}

impl MatchKind {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Contains => ":contains",
            Self::Prefix => ":matches",
            Self::Regex => ":regex",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}

/// How a condition combines with the other conditions of its rule.
///
/// Both formats evaluate a rule's conditions with OR semantics; the `A`
/// operator is carried through but never changes what is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    Or,
    And,
}

impl Operator {
    pub fn as_becky(&self) -> &'static str {
        match self {
            Self::Or => "O",
            Self::And => "A",
        }
    }

    pub fn from_becky(s: &str) -> Self {
        match s.trim() {
            "A" => Self::And,
            _ => Self::Or,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_becky())
    }
}
