//! In-memory card corpus.
//!
//! Holds the whole card pool in insertion order and answers searches with a
//! linear scan. Useful for tests, benchmarks and small card pools.

use ahash::AHashMap;
use async_trait::async_trait;

use crate::card::{Card, normalize_name};
use crate::corpus::{CardCorpus, CardQuery, SearchField};
use crate::error::Result;
use crate::pattern::TextPattern;

/// A card corpus backed by a `Vec<Card>`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCardCorpus {
    /// Cards in insertion order; search results follow this order.
    cards: Vec<Card>,
    /// Normalized name to position in `cards`.
    by_name: AHashMap<String, usize>,
}

impl MemoryCardCorpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card. A card with the same normalized name replaces the earlier
    /// entry in place.
    pub fn add_card(&mut self, card: Card) {
        let key = card.normalized_name();
        match self.by_name.get(&key) {
            Some(&pos) => self.cards[pos] = card,
            None => {
                self.by_name.insert(key, self.cards.len());
                self.cards.push(card);
            }
        }
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Look up a card synchronously.
    pub fn get(&self, name: &str) -> Option<&Card> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&pos| &self.cards[pos])
    }

    fn matches(query: &CardQuery, pattern: &TextPattern, card: &Card) -> bool {
        if let Some(identity) = query.color_identity
            && !card.color_identity.is_subset_of(identity)
        {
            return false;
        }
        if let Some(format) = &query.format
            && !card.is_legal_in(format)
        {
            return false;
        }
        match query.field {
            SearchField::OracleText => pattern.is_match(&card.oracle_text),
            SearchField::TypeLine => pattern.is_match(&card.type_line),
        }
    }
}

impl FromIterator<Card> for MemoryCardCorpus {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut corpus = MemoryCardCorpus::new();
        for card in iter {
            corpus.add_card(card);
        }
        corpus
    }
}

#[async_trait]
impl CardCorpus for MemoryCardCorpus {
    async fn resolve(&self, name: &str) -> Result<Option<Card>> {
        Ok(self.get(name).cloned())
    }

    async fn search(&self, query: &CardQuery) -> Result<Vec<Card>> {
        let pattern = TextPattern::compile(&query.pattern);
        Ok(self
            .cards
            .iter()
            .filter(|card| Self::matches(query, &pattern, card))
            .take(query.page_size)
            .cloned()
            .collect())
    }
}
