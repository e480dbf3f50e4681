//! Card relationship queries.
//!
//! [`RelationshipFinder`] puts the synergy scorer and the combo matcher behind
//! one handle, the way a service endpoint would use them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::card::Card;
use crate::combo::{Combo, ComboMatch, ComboMatcher};
use crate::error::{GlaiveError, Result};
use crate::synergy::{SynergyResult, SynergyRule, SynergyScorer, ThemeMatch};

/// Complete and near-complete combos found in a list of cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComboDetection {
    /// Combos whose every card is present, in corpus order.
    pub complete: Vec<Arc<Combo>>,
    /// Combos missing at most the requested number of cards, best first.
    /// Never repeats an id from `complete`.
    pub potential: Vec<ComboMatch>,
    /// Combo id to the cards it still needs.
    pub missing_cards: BTreeMap<String, Vec<String>>,
}

impl ComboDetection {
    pub fn is_empty(&self) -> bool {
        self.complete.is_empty() && self.potential.is_empty()
    }
}

/// A resolved card annotated with what it is good at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardProfile {
    pub card: Card,
    /// Deck themes the card supports.
    pub themes: Vec<ThemeMatch>,
    /// Keyword, ability and type rules that fire for the card.
    pub rules: Vec<SynergyRule>,
    /// Number of known combos that use the card.
    pub combo_count: usize,
}

pub struct RelationshipFinder {
    scorer: SynergyScorer,
    matcher: Arc<ComboMatcher>,
}

impl RelationshipFinder {
    pub fn new(scorer: SynergyScorer, matcher: Arc<ComboMatcher>) -> Self {
        RelationshipFinder { scorer, matcher }
    }

    pub fn scorer(&self) -> &SynergyScorer {
        &self.scorer
    }

    pub fn matcher(&self) -> &Arc<ComboMatcher> {
        &self.matcher
    }

    /// Ranked synergy suggestions for a card.
    pub async fn find_synergies(
        &self,
        name: &str,
        max_results: usize,
        format: Option<&str>,
    ) -> Result<Vec<SynergyResult>> {
        self.scorer.find_synergies(name, max_results, format).await
    }

    /// Combos present in, or nearly present in, `names`.
    pub fn detect_combos<S: AsRef<str>>(&self, names: &[S], max_missing: usize) -> ComboDetection {
        let config = self.matcher.config();
        let complete = self.matcher.find_combos(names, 0, config.default_limit);
        let complete_ids: BTreeSet<&str> = complete.iter().map(|c| c.id.as_str()).collect();

        let potential: Vec<ComboMatch> = self
            .matcher
            .find_missing_pieces(names, max_missing, config.default_min_present)
            .matches
            .into_iter()
            .filter(|m| !complete_ids.contains(m.combo.id.as_str()))
            .take(config.default_limit)
            .collect();

        let missing_cards = potential
            .iter()
            .map(|m| (m.combo.id.clone(), m.missing_cards.clone()))
            .collect();

        debug!(
            "Detected {} complete and {} potential combos in {} cards",
            complete.len(),
            potential.len(),
            names.len()
        );

        ComboDetection {
            complete,
            potential,
            missing_cards,
        }
    }

    /// [`detect_combos`](Self::detect_combos) with the matcher's configured
    /// `default_max_missing`.
    pub fn detect_deck_combos<S: AsRef<str>>(&self, names: &[S]) -> ComboDetection {
        self.detect_combos(names, self.matcher.config().default_max_missing)
    }

    /// Combos that use `name`.
    pub fn find_combos_for_card(&self, name: &str, limit: usize) -> Vec<Arc<Combo>> {
        self.matcher.find_combos_for_card(name, limit)
    }

    /// Resolve a card and describe its themes, rules and combo usage.
    pub async fn card_profile(&self, name: &str) -> Result<CardProfile> {
        let card = self
            .scorer
            .corpus()
            .resolve(name)
            .await?
            .ok_or_else(|| GlaiveError::card_not_found(name))?;

        let rules = self.scorer.rules();
        let combo_count = self.matcher.index().lookup(&card.name).len();
        Ok(CardProfile {
            themes: rules.themes_for(&card),
            rules: rules.matching_rules(&card),
            combo_count,
            card,
        })
    }
}
