// Flag letters, categories, and processing modes

use serde::Serialize;

/// The three single-letter flags a bracket group can carry.
///
/// `e` requests obfuscation of the resolved value, `r` marks the entry
/// required, `v` takes the bracket interior verbatim and skips resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlagSet {
    pub encrypted: bool,
    pub required: bool,
    pub literal: bool,
}

impl FlagSet {
    /// Parse a flag prefix. Order does not matter, repeats are harmless,
    /// and letters outside the flag alphabet are ignored.
    pub fn parse(s: &str) -> Self {
        let mut flags = Self::default();
        for ch in s.chars() {
            match ch {
                'e' => flags.encrypted = true,
                'r' => flags.required = true,
                'v' => flags.literal = true,
                _ => {}
            }
        }
        flags
    }

    pub fn any(&self) -> bool {
        self.encrypted || self.required || self.literal
    }
}

/// True for the letters that make up a flag prefix.
pub fn is_flag_char(ch: char) -> bool {
    matches!(ch, 'e' | 'r' | 'v')
}

/// Which lookup list a token belongs to, or why none applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CategoryA,
    CategoryB,
    /// The `v` flag was set; the token is taken as-is.
    Literal,
    /// Not in either list and not literal.
    Unknown,
    /// A whole-query or keyed nested block resolved as one unit.
    Global,
}

/// How a value was matched: a whole-form `flags{content}` pattern, or text
/// with groups embedded somewhere inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingMode {
    Parameter,
    Substitution,
}
