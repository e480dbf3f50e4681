//! Combo records and match results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::card::{ColorIdentity, normalize_name};

/// A known combo from the static corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    /// Stable identifier.
    pub id: String,

    /// Canonical card names, in corpus order, without duplicates.
    pub cards: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub color_identity: ColorIdentity,

    /// Optional effect tags, e.g. `"infinite mana"`.
    #[serde(default)]
    pub effects: Vec<String>,
}

impl Combo {
    /// Create a combo. Card names that normalize to the same key are
    /// collapsed, keeping the first spelling.
    pub fn new<I, S>(id: impl Into<String>, cards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut combo = Combo {
            id: id.into(),
            cards: cards.into_iter().map(Into::into).collect(),
            description: String::new(),
            color_identity: ColorIdentity::COLORLESS,
            effects: Vec::new(),
        };
        combo.dedup_cards();
        combo
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color_identity(mut self, identity: ColorIdentity) -> Self {
        self.color_identity = identity;
        self
    }

    pub fn with_effects<I, S>(mut self, effects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effects = effects.into_iter().map(Into::into).collect();
        self
    }

    /// Remove blank and repeated card names (by normalized form), keeping
    /// first occurrences in order.
    pub(crate) fn dedup_cards(&mut self) {
        let mut seen = ahash::AHashSet::with_capacity(self.cards.len());
        self.cards.retain(|name| {
            let key = normalize_name(name);
            !key.is_empty() && seen.insert(key)
        });
    }

    /// Normalized names of the combo's cards.
    pub fn normalized_cards(&self) -> impl Iterator<Item = String> + '_ {
        self.cards.iter().map(|name| normalize_name(name))
    }

    /// Whether the combo lists `name` (compared in normalized form).
    pub fn contains_card(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.normalized_cards().any(|c| c == key)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// A combo evaluated against a query set of card names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboMatch {
    pub combo: Arc<Combo>,

    /// Canonical names from the combo that the query does not contain, in
    /// combo order.
    pub missing_cards: Vec<String>,

    /// Number of the combo's cards present in the query.
    pub present_count: usize,
}

impl ComboMatch {
    /// A match is complete when no card is missing.
    pub fn is_complete(&self) -> bool {
        self.missing_cards.is_empty()
    }
}

/// Result of a missing-pieces search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingPieces {
    /// Matches ranked by fewest missing cards, then most present cards, then
    /// corpus order.
    pub matches: Vec<ComboMatch>,

    /// Number of candidate combos reached through the index and evaluated.
    pub candidates_examined: usize,
}

impl MissingPieces {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_dedups_cards() {
        let combo = Combo::new(
            "c1",
            ["Splinter Twin", "Deceiver Exarch", " splinter twin ", ""],
        );
        assert_eq!(combo.cards, vec!["Splinter Twin", "Deceiver Exarch"]);
        assert_eq!(combo.len(), 2);
    }

    #[test]
    fn test_contains_card_normalizes() {
        let combo = Combo::new("c1", ["Splinter Twin", "Deceiver Exarch"]);
        assert!(combo.contains_card("DECEIVER EXARCH"));
        assert!(!combo.contains_card("Pestermite"));
    }

    #[test]
    fn test_combo_deserialize_defaults() {
        let json = r#"{"id": "c7", "cards": ["Thassa's Oracle", "Demonic Consultation"]}"#;
        let combo: Combo = serde_json::from_str(json).unwrap();
        assert_eq!(combo.id, "c7");
        assert!(combo.description.is_empty());
        assert!(combo.color_identity.is_empty());
        assert!(combo.effects.is_empty());
    }

    #[test]
    fn test_match_completeness() {
        let combo = Arc::new(Combo::new("c1", ["A", "B"]));
        let complete = ComboMatch {
            combo: Arc::clone(&combo),
            missing_cards: vec![],
            present_count: 2,
        };
        let partial = ComboMatch {
            combo,
            missing_cards: vec!["B".to_string()],
            present_count: 1,
        };
        assert!(complete.is_complete());
        assert!(!partial.is_complete());
    }
}
