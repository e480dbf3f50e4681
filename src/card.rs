//! Card model shared by the synergy scorer, the card corpus and the combo index.
//!
//! A [`Card`] is an immutable snapshot of the attributes the engine reasons
//! about. Colors are held in a compact [`ColorIdentity`] bit-set so identity
//! filtering and overlap counting stay allocation free.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GlaiveError, Result};

/// Normalize a card name for comparison: trim surrounding whitespace and
/// lower-case.
///
/// Every name comparison in the crate goes through this function.
///
/// ```
/// use glaive::card::normalize_name;
///
/// assert_eq!(normalize_name("  Splinter Twin "), "splinter twin");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One of the five colors of mana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
}

impl Color {
    /// All colors in WUBRG order.
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    /// The single-letter symbol of this color.
    pub const fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }

    /// Parse a color from its symbol, case-insensitively.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Color::White => 1 << 0,
            Color::Blue => 1 << 1,
            Color::Black => 1 << 2,
            Color::Red => 1 << 3,
            Color::Green => 1 << 4,
        }
    }
}

/// A set of colors stored as bit flags.
///
/// Serialized in the conventional letter form, e.g. `"UR"` for blue-red and
/// `""` for colorless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorIdentity(u8);

impl ColorIdentity {
    /// The empty (colorless) identity.
    pub const COLORLESS: Self = Self(0);

    /// Create an empty identity.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Build an identity from a list of colors.
    pub fn from_colors<I: IntoIterator<Item = Color>>(colors: I) -> Self {
        colors.into_iter().fold(Self::new(), |set, color| set.with(color))
    }

    /// Return a copy of this identity with `color` added.
    pub const fn with(self, color: Color) -> Self {
        Self(self.0 | color.bit())
    }

    /// Whether the identity contains `color`.
    pub const fn contains(self, color: Color) -> bool {
        self.0 & color.bit() != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Whether every color of `self` is also in `other`.
    ///
    /// This is the deck-building rule: a card fits a deck when its identity
    /// is a subset of the deck's identity.
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & other.0 == self.0
    }

    /// Number of colors in the identity.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the colors in WUBRG order.
    pub fn iter(self) -> impl Iterator<Item = Color> {
        Color::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl fmt::Display for ColorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.iter() {
            write!(f, "{}", color.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for ColorIdentity {
    type Err = GlaiveError;

    /// Parse letter form such as `"WU"` or `"{U}{R}"`. Braces, commas and
    /// whitespace are ignored, as is the colorless marker `C`.
    fn from_str(s: &str) -> Result<Self> {
        let mut identity = ColorIdentity::new();
        for ch in s.chars() {
            if matches!(ch, '{' | '}' | ',' | 'C' | 'c') || ch.is_whitespace() {
                continue;
            }
            let color = Color::from_symbol(ch).ok_or_else(|| {
                GlaiveError::parse(format!("invalid color symbol '{ch}' in \"{s}\""))
            })?;
            identity = identity.with(color);
        }
        Ok(identity)
    }
}

impl TryFrom<String> for ColorIdentity {
    type Error = GlaiveError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ColorIdentity> for String {
    fn from(identity: ColorIdentity) -> Self {
        identity.to_string()
    }
}

impl FromIterator<Color> for ColorIdentity {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        Self::from_colors(iter)
    }
}

/// A resolved card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub name: String,
    pub colors: ColorIdentity,
    pub color_identity: ColorIdentity,
    pub type_line: String,
    /// Card types, e.g. `["Creature"]` or `["Artifact", "Creature"]`.
    pub types: Vec<String>,
    /// Subtypes, e.g. `["Elf", "Druid"]`.
    pub subtypes: Vec<String>,
    /// Keyword abilities, e.g. `["Flying", "Lifelink"]`.
    pub keywords: Vec<String>,
    pub oracle_text: String,
    pub mana_cost: String,
    /// Lower-case names of the formats the card is legal in.
    pub legal_formats: BTreeSet<String>,
}

impl Card {
    /// Create a card with only a name and type line; `types` and `subtypes`
    /// are derived from the type line.
    pub fn new<N: Into<String>, T: Into<String>>(name: N, type_line: T) -> Self {
        let type_line = type_line.into();
        let (types, subtypes) = split_type_line(&type_line);
        Card {
            name: name.into(),
            type_line,
            types,
            subtypes,
            ..Default::default()
        }
    }

    pub fn with_oracle_text<S: Into<String>>(mut self, text: S) -> Self {
        self.oracle_text = text.into();
        self
    }

    pub fn with_mana_cost<S: Into<String>>(mut self, cost: S) -> Self {
        self.mana_cost = cost.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set both `colors` and `color_identity`.
    pub fn with_colors(mut self, identity: ColorIdentity) -> Self {
        self.colors = identity;
        self.color_identity = identity;
        self
    }

    /// Override the color identity only (e.g. colorless cards with colored
    /// activation costs).
    pub fn with_color_identity(mut self, identity: ColorIdentity) -> Self {
        self.color_identity = identity;
        self
    }

    pub fn with_legal_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.legal_formats = formats
            .into_iter()
            .map(|f| f.as_ref().to_lowercase())
            .collect();
        self
    }

    /// The normalized form of the card name.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether the card has the given type, case-insensitively.
    pub fn has_type(&self, card_type: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(card_type))
    }

    /// Whether subtypes on this card are creature types.
    ///
    /// Tribal/Kindred cards carry creature types without being creatures.
    pub fn has_creature_subtypes(&self) -> bool {
        self.has_type("Creature") || self.has_type("Tribal") || self.has_type("Kindred")
    }

    /// Whether the card is legal in `format` (case-insensitive).
    pub fn is_legal_in(&self, format: &str) -> bool {
        self.legal_formats.contains(&format.to_lowercase())
    }
}

/// Split a type line such as `"Legendary Creature — Elf Druid"` into types
/// and subtypes. Supertypes (Legendary, Basic, Snow, World, Ongoing) are
/// dropped.
pub fn split_type_line(type_line: &str) -> (Vec<String>, Vec<String>) {
    const SUPERTYPES: &[&str] = &["legendary", "basic", "snow", "world", "ongoing"];

    let (left, right) = match type_line.split_once('—') {
        Some((l, r)) => (l, Some(r)),
        None => match type_line.split_once(" - ") {
            Some((l, r)) => (l, Some(r)),
            None => (type_line, None),
        },
    };

    let types = left
        .split_whitespace()
        .filter(|t| !SUPERTYPES.contains(&t.to_lowercase().as_str()))
        .map(str::to_string)
        .collect();
    let subtypes = right
        .map(|r| r.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    (types, subtypes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Deceiver Exarch"), "deceiver exarch");
        assert_eq!(normalize_name("\tSol Ring\n"), "sol ring");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_color_identity_set_operations() {
        let izzet: ColorIdentity = "UR".parse().unwrap();
        let blue = ColorIdentity::new().with(Color::Blue);

        assert_eq!(izzet.len(), 2);
        assert!(blue.is_subset_of(izzet));
        assert!(!izzet.is_subset_of(blue));
        assert!(ColorIdentity::COLORLESS.is_subset_of(blue));
        assert_eq!(izzet.intersection(blue), blue);
        assert_eq!(izzet.union(blue), izzet);
        assert_eq!(izzet.to_string(), "UR");
    }

    #[test]
    fn test_color_identity_parse() {
        let identity: ColorIdentity = "{G}{W}".parse().unwrap();
        assert_eq!(identity.to_string(), "WG");

        let colorless: ColorIdentity = "C".parse().unwrap();
        assert!(colorless.is_empty());

        assert!("X".parse::<ColorIdentity>().is_err());
    }

    #[test]
    fn test_color_identity_serde_letter_form() {
        let identity: ColorIdentity = "BG".parse().unwrap();
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, "\"BG\"");

        let back: ColorIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }

    #[test]
    fn test_split_type_line() {
        let (types, subtypes) = split_type_line("Legendary Creature — Elf Druid");
        assert_eq!(types, vec!["Creature"]);
        assert_eq!(subtypes, vec!["Elf", "Druid"]);

        let (types, subtypes) = split_type_line("Artifact");
        assert_eq!(types, vec!["Artifact"]);
        assert!(subtypes.is_empty());

        let (types, subtypes) = split_type_line("Kindred Instant - Goblin");
        assert_eq!(types, vec!["Kindred", "Instant"]);
        assert_eq!(subtypes, vec!["Goblin"]);
    }

    #[test]
    fn test_card_builder() {
        let card = Card::new("Llanowar Elves", "Creature — Elf Druid")
            .with_mana_cost("{G}")
            .with_colors("G".parse().unwrap())
            .with_legal_formats(["Commander", "Modern"]);

        assert!(card.has_type("creature"));
        assert!(card.has_creature_subtypes());
        assert!(card.is_legal_in("commander"));
        assert!(!card.is_legal_in("standard"));
        assert_eq!(card.normalized_name(), "llanowar elves");
    }
}
