//! Inverted index from card name to combos.
//!
//! Every normalized card name of every combo maps to a posting list of combo
//! positions (corpus order, ascending, no duplicates). A query set of N names
//! only ever touches the N posting lists it names, so combos that share no
//! card with the query are excluded without being inspected.
//!
//! The index is immutable once built. Reloading builds a fresh index and
//! publishes it through [`ComboMatcher`](crate::combo::matcher::ComboMatcher).

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::card::normalize_name;
use crate::combo::corpus::ComboCorpus;
use crate::combo::types::Combo;

/// Summary of an index build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    /// Number of indexed combos.
    pub combo_count: usize,
    /// Number of distinct normalized card names.
    pub distinct_cards: usize,
    /// Sum of posting list lengths.
    pub total_postings: usize,
    /// Duplicate combo ids dropped during the build.
    pub duplicates_skipped: usize,
    pub built_at: DateTime<Utc>,
}

/// Immutable name → combo index.
#[derive(Debug)]
pub struct ComboIndex {
    /// Combos in corpus order.
    combos: Vec<Arc<Combo>>,
    /// Combo id to position in `combos`.
    by_id: AHashMap<String, usize>,
    /// Normalized card name to ascending combo positions.
    postings: AHashMap<String, Vec<usize>>,
    stats: IndexStats,
}

impl ComboIndex {
    /// Build the index from a corpus.
    ///
    /// When two combos share an id, the first one wins and the later one is
    /// skipped with a warning.
    pub fn build(corpus: &ComboCorpus) -> Self {
        Self::from_combos(corpus.iter().cloned())
    }

    /// Build the index from any sequence of combos.
    pub fn from_combos<I: IntoIterator<Item = Combo>>(combos: I) -> Self {
        let mut index = ComboIndex::empty();
        let mut duplicates_skipped = 0;

        for mut combo in combos {
            combo.dedup_cards();
            if combo.cards.is_empty() {
                continue;
            }
            if index.by_id.contains_key(&combo.id) {
                warn!("Duplicate combo id {:?}; keeping the first occurrence", combo.id);
                duplicates_skipped += 1;
                continue;
            }

            let pos = index.combos.len();
            for name in combo.normalized_cards() {
                // Positions are appended in increasing order, so each list
                // stays sorted without a search.
                index.postings.entry(name).or_default().push(pos);
            }
            index.by_id.insert(combo.id.clone(), pos);
            index.combos.push(Arc::new(combo));
        }

        index.stats = IndexStats {
            combo_count: index.combos.len(),
            distinct_cards: index.postings.len(),
            total_postings: index.postings.values().map(Vec::len).sum(),
            duplicates_skipped,
            built_at: Utc::now(),
        };
        info!(
            "Built combo index: {} combos, {} distinct cards, {} postings",
            index.stats.combo_count, index.stats.distinct_cards, index.stats.total_postings
        );
        index
    }

    /// An index with no combos.
    pub fn empty() -> Self {
        ComboIndex {
            combos: Vec::new(),
            by_id: AHashMap::new(),
            postings: AHashMap::new(),
            stats: IndexStats {
                combo_count: 0,
                distinct_cards: 0,
                total_postings: 0,
                duplicates_skipped: 0,
                built_at: Utc::now(),
            },
        }
    }

    /// Ids of the combos listing `name`, in corpus order. Empty when the card
    /// is in no combo.
    pub fn lookup(&self, name: &str) -> Vec<&str> {
        self.postings(name)
            .iter()
            .map(|&pos| self.combos[pos].id.as_str())
            .collect()
    }

    /// Combo positions listing `name`.
    pub(crate) fn postings(&self, name: &str) -> &[usize] {
        self.postings
            .get(&normalize_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union of the posting lists of `names`.
    pub fn candidates<S: AsRef<str>>(&self, names: &[S]) -> CandidateSet<'_> {
        let query: AHashSet<String> = names
            .iter()
            .map(|n| normalize_name(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();

        let mut positions: Vec<usize> = query
            .iter()
            .filter_map(|name| self.postings.get(name))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();

        CandidateSet {
            index: self,
            query,
            positions,
        }
    }

    /// Look up a combo by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Combo>> {
        self.by_id.get(id).map(|&pos| &self.combos[pos])
    }

    /// All combos in corpus order.
    pub fn combos(&self) -> &[Arc<Combo>] {
        &self.combos
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

impl Default for ComboIndex {
    fn default() -> Self {
        Self::empty()
    }
}

/// Candidate combos for a query set, in corpus order.
#[derive(Debug)]
pub struct CandidateSet<'a> {
    index: &'a ComboIndex,
    /// Normalized query names.
    query: AHashSet<String>,
    /// Ascending combo positions.
    positions: Vec<usize>,
}

impl<'a> CandidateSet<'a> {
    /// Number of candidate combos.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether the (normalized) query contains `name`.
    pub fn query_contains(&self, name: &str) -> bool {
        self.query.contains(&normalize_name(name))
    }

    /// Iterate candidates in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Arc<Combo>> + '_ {
        self.positions.iter().map(|&pos| &self.index.combos[pos])
    }

    /// Iterate candidates together with their corpus position.
    pub(crate) fn iter_positions(&self) -> impl Iterator<Item = (usize, &'a Arc<Combo>)> + '_ {
        self.positions
            .iter()
            .map(|&pos| (pos, &self.index.combos[pos]))
    }

    /// Split a combo's cards into present count and missing names with
    /// respect to the query.
    pub fn partition(&self, combo: &Combo) -> (usize, Vec<String>) {
        let mut present = 0;
        let mut missing = Vec::new();
        for name in &combo.cards {
            if self.query_contains(name) {
                present += 1;
            } else {
                missing.push(name.clone());
            }
        }
        (present, missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> ComboIndex {
        ComboIndex::from_combos(vec![
            Combo::new("twin", ["Splinter Twin", "Deceiver Exarch"]),
            Combo::new("kiki", ["Kiki-Jiki, Mirror Breaker", "Deceiver Exarch"]),
            Combo::new("oracle", ["Thassa's Oracle", "Demonic Consultation"]),
        ])
    }

    #[test]
    fn test_lookup() {
        let index = sample_index();
        assert_eq!(index.lookup("Deceiver Exarch"), vec!["twin", "kiki"]);
        assert_eq!(index.lookup("  splinter twin"), vec!["twin"]);
        assert!(index.lookup("Sol Ring").is_empty());
    }

    #[test]
    fn test_every_card_is_posted_exactly_under_its_names() {
        let index = sample_index();
        for combo in index.combos() {
            for name in &combo.cards {
                assert!(index.lookup(name).contains(&combo.id.as_str()));
            }
        }
        for (name, positions) in &index.postings {
            for &pos in positions {
                assert!(index.combos[pos].contains_card(name));
            }
        }
    }

    #[test]
    fn test_candidates_union() {
        let index = sample_index();
        let candidates = index.candidates(&["Deceiver Exarch", "Thassa's Oracle"]);
        let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["twin", "kiki", "oracle"]);

        let none = index.candidates(&["Sol Ring", "Island"]);
        assert!(none.is_empty());

        let empty = index.candidates::<&str>(&[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_partition() {
        let index = sample_index();
        let candidates = index.candidates(&["splinter twin", "Sol Ring"]);
        let combo = index.get("twin").unwrap();
        let (present, missing) = candidates.partition(combo);
        assert_eq!(present, 1);
        assert_eq!(missing, vec!["Deceiver Exarch"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let index = ComboIndex::from_combos(vec![
            Combo::new("dup", ["A", "B"]),
            Combo::new("dup", ["C", "D"]),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().duplicates_skipped, 1);
        assert!(index.lookup("C").is_empty());
        assert_eq!(index.get("dup").unwrap().cards, vec!["A", "B"]);
    }

    #[test]
    fn test_stats() {
        let index = sample_index();
        let stats = index.stats();
        assert_eq!(stats.combo_count, 3);
        assert_eq!(stats.distinct_cards, 5);
        assert_eq!(stats.total_postings, 6);
    }

    #[test]
    fn test_get_unknown_id() {
        let index = sample_index();
        assert!(index.get("nonexistent").is_none());
        assert!(ComboIndex::empty().is_empty());
    }
}
