//! Exact and partial combo matching.
//!
//! The matcher owns the current [`ComboIndex`] behind an [`ArcSwap`]. Every
//! operation loads one snapshot and answers entirely from it, so a concurrent
//! [`ComboMatcher::reload`] never exposes a half-built index: readers see
//! either the old index or the new one.
//!
//! [`ComboMatcher::find_combos`] and [`ComboMatcher::find_missing_pieces`]
//! each answer one question. Callers that merge both into "complete" and
//! "potential" buckets are responsible for removing complete ids from the
//! potential set (see [`RelationshipFinder`](crate::relationships::RelationshipFinder)).

use std::cmp::Reverse;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, info};

use crate::combo::corpus::ComboCorpus;
use crate::combo::index::{ComboIndex, IndexStats};
use crate::combo::types::{Combo, ComboMatch, MissingPieces};
use crate::config::ComboMatcherConfig;

/// Combo matcher over an atomically swappable index.
#[derive(Debug)]
pub struct ComboMatcher {
    index: ArcSwap<ComboIndex>,
    config: ComboMatcherConfig,
}

impl ComboMatcher {
    /// Create a matcher over an already built index.
    pub fn new(index: ComboIndex) -> Self {
        Self::with_config(index, ComboMatcherConfig::default())
    }

    pub fn with_config(index: ComboIndex, config: ComboMatcherConfig) -> Self {
        ComboMatcher {
            index: ArcSwap::from_pointee(index),
            config,
        }
    }

    /// Build the index from `corpus` and create a matcher over it.
    pub fn from_corpus(corpus: &ComboCorpus) -> Self {
        Self::new(ComboIndex::build(corpus))
    }

    pub fn config(&self) -> &ComboMatcherConfig {
        &self.config
    }

    /// A snapshot of the current index. The snapshot stays valid and
    /// unchanged across later reloads.
    pub fn index(&self) -> Arc<ComboIndex> {
        self.index.load_full()
    }

    /// Statistics of the current index.
    pub fn stats(&self) -> IndexStats {
        self.index.load().stats().clone()
    }

    /// Rebuild the index from `corpus` and publish it with a single atomic
    /// swap. The build happens before the swap; in-flight matches keep using
    /// the index they started with.
    pub fn reload(&self, corpus: &ComboCorpus) -> IndexStats {
        let index = ComboIndex::build(corpus);
        let stats = index.stats().clone();
        let previous = self.swap_index(index);
        info!(
            "Reloaded combo index: {} -> {} combos",
            previous.len(),
            stats.combo_count
        );
        stats
    }

    /// Publish `index`, returning the one it replaced.
    pub fn swap_index(&self, index: ComboIndex) -> Arc<ComboIndex> {
        self.index.swap(Arc::new(index))
    }

    /// Combos with at most `max_missing` cards absent from `names`.
    ///
    /// With `max_missing == 0` these are exactly the combos whose whole card
    /// set is contained in `names`. Results are in corpus order, truncated to
    /// `limit`.
    pub fn find_combos<S: AsRef<str>>(
        &self,
        names: &[S],
        max_missing: usize,
        limit: usize,
    ) -> Vec<Arc<Combo>> {
        let index = self.index.load();
        let candidates = index.candidates(names);

        candidates
            .iter()
            .filter(|combo| {
                let (_, missing) = candidates.partition(combo);
                missing.len() <= max_missing
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Combos that are close to complete.
    ///
    /// For every candidate combo reachable from `names`, a match is reported
    /// iff `0 < missing <= max_missing` and `present >= min_present`. Complete
    /// combos are never reported here, so `max_missing == 0` always yields an
    /// empty result.
    ///
    /// Matches are ranked by fewest missing cards, then most present cards,
    /// then corpus order.
    pub fn find_missing_pieces<S: AsRef<str>>(
        &self,
        names: &[S],
        max_missing: usize,
        min_present: usize,
    ) -> MissingPieces {
        let index = self.index.load();
        let candidates = index.candidates(names);

        let mut ranked: Vec<(usize, ComboMatch)> = candidates
            .iter_positions()
            .filter_map(|(pos, combo)| {
                let (present, missing) = candidates.partition(combo);
                let keep = !missing.is_empty()
                    && missing.len() <= max_missing
                    && present >= min_present;
                keep.then(|| {
                    (
                        pos,
                        ComboMatch {
                            combo: Arc::clone(combo),
                            missing_cards: missing,
                            present_count: present,
                        },
                    )
                })
            })
            .collect();

        ranked.sort_by_key(|(pos, m)| (m.missing_cards.len(), Reverse(m.present_count), *pos));

        debug!(
            "Missing pieces: {} candidates examined, {} matches",
            candidates.len(),
            ranked.len()
        );

        MissingPieces {
            matches: ranked.into_iter().map(|(_, m)| m).collect(),
            candidates_examined: candidates.len(),
        }
    }

    /// All combos listing `name`, in corpus order, truncated to `limit`.
    pub fn find_combos_for_card(&self, name: &str, limit: usize) -> Vec<Arc<Combo>> {
        let index = self.index.load();
        index
            .postings(name)
            .iter()
            .take(limit)
            .map(|&pos| Arc::clone(&index.combos()[pos]))
            .collect()
    }

    /// Look up a combo by id.
    pub fn get_combo(&self, id: &str) -> Option<Arc<Combo>> {
        self.index.load().get(id).cloned()
    }
}

impl Default for ComboMatcher {
    fn default() -> Self {
        Self::new(ComboIndex::empty())
    }
}
