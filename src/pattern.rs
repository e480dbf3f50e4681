//! Case-insensitive text patterns with substring fallback.
//!
//! Rule tables and corpus queries are written as regular expressions. A
//! pattern that fails to compile is not an error: it degrades to a plain,
//! case-insensitive substring match so one malformed table entry cannot fail
//! a whole request.

use std::fmt;
use std::sync::Arc;

use log::warn;
use regex::{Regex, RegexBuilder};

/// A compiled text pattern.
#[derive(Clone)]
pub enum TextPattern {
    /// Case-insensitive regular expression.
    Regex(Arc<Regex>),
    /// Lower-cased literal matched as a substring of lower-cased text.
    Substring(String),
}

impl TextPattern {
    /// Compile `pattern` as a case-insensitive regex, falling back to a
    /// substring match when it is not a valid regex.
    pub fn compile(pattern: &str) -> Self {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => TextPattern::Regex(Arc::new(regex)),
            Err(e) => {
                warn!("Invalid pattern {pattern:?}, falling back to substring match: {e}");
                Self::substring(pattern)
            }
        }
    }

    /// A literal, case-insensitive substring pattern.
    pub fn substring(literal: &str) -> Self {
        TextPattern::Substring(literal.to_lowercase())
    }

    /// Whether the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            TextPattern::Regex(regex) => regex.is_match(text),
            TextPattern::Substring(literal) => text.to_lowercase().contains(literal.as_str()),
        }
    }

    /// Whether this pattern fell back to substring matching.
    pub fn is_substring(&self) -> bool {
        matches!(self, TextPattern::Substring(_))
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            TextPattern::Regex(regex) => regex.as_str(),
            TextPattern::Substring(literal) => literal,
        }
    }
}

impl fmt::Debug for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextPattern::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            TextPattern::Substring(literal) => f.debug_tuple("Substring").field(literal).finish(),
        }
    }
}

/// Creature types whose plural is not formed by appending to the singular.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("Dwarf", "Dwarves"),
    ("Elf", "Elves"),
    ("Fungus", "Fungi"),
    ("Mouse", "Mice"),
    ("Ox", "Oxen"),
    ("Werewolf", "Werewolves"),
    ("Wolf", "Wolves"),
];

/// Build a pattern that finds a creature type mentioned in rules text,
/// including its plural ("Zombie" also matches "Zombies", "Elf" matches
/// "Elves").
pub fn subtype_reference(subtype: &str) -> String {
    let plural = IRREGULAR_PLURALS
        .iter()
        .find(|(singular, _)| singular.eq_ignore_ascii_case(subtype))
        .map(|(_, plural)| *plural);
    match plural {
        Some(plural) => format!(
            r"\b(?:{}|{})",
            regex::escape(subtype),
            regex::escape(plural)
        ),
        None => format!(r"\b{}", regex::escape(subtype)),
    }
}

/// Build a pattern that matches a creature type as a whole word, as it
/// appears on a type line.
pub fn subtype_exact(subtype: &str) -> String {
    format!(r"\b{}\b", regex::escape(subtype))
}
