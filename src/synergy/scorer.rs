//! The four-pass synergy scorer.
//!
//! A request runs in two phases. [`SynergyScorer::plan`] builds the ordered
//! list of corpus searches for a source card without touching the corpus.
//! The plan is then executed with bounded fan-out; results are reassembled in
//! plan order so de-duplication and tie-breaking do not depend on which search
//! finished first.

use std::sync::Arc;

use ahash::AHashSet;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use serde::Serialize;

use crate::card::{Card, normalize_name};
use crate::config::{MAX_SYNERGY_RESULTS, MIN_SYNERGY_RESULTS, ScorerConfig};
use crate::corpus::{CardCorpus, CardQuery};
use crate::error::{GlaiveError, Result};
use crate::pattern::{subtype_exact, subtype_reference};
use crate::synergy::rules::{CompiledRules, SearchRule};
use crate::synergy::types::{SynergyPass, SynergyResult, SynergyType, synergy_score};

/// One corpus search and how its hits are scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSearch {
    pub pass: SynergyPass,
    pub synergy_type: SynergyType,
    pub reason: String,
    /// Applied after the color bonus, before clamping.
    pub multiplier: f32,
    pub query: CardQuery,
}

/// The ordered searches for one source card.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchPlan {
    pub searches: Vec<PlannedSearch>,
}

impl SearchPlan {
    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedSearch> {
        self.searches.iter()
    }

    /// Number of searches contributed by `pass`.
    pub fn count_for(&self, pass: SynergyPass) -> usize {
        self.searches.iter().filter(|s| s.pass == pass).count()
    }
}

/// Suggests cards that work well with a source card.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use glaive::card::Card;
/// use glaive::corpus::MemoryCardCorpus;
/// use glaive::synergy::SynergyScorer;
///
/// # tokio_test::block_on(async {
/// let corpus: MemoryCardCorpus = [
///     Card::new("Llanowar Elves", "Creature — Elf Druid"),
///     Card::new("Elvish Archdruid", "Creature — Elf Druid")
///         .with_oracle_text("Other Elf creatures you control get +1/+1."),
/// ]
/// .into_iter()
/// .collect();
///
/// let scorer = SynergyScorer::new(Arc::new(corpus));
/// let results = scorer.find_synergies("Llanowar Elves", 10, None).await.unwrap();
/// assert_eq!(results[0].name, "Elvish Archdruid");
/// # });
/// ```
pub struct SynergyScorer {
    corpus: Arc<dyn CardCorpus>,
    rules: Arc<CompiledRules>,
    config: ScorerConfig,
}

impl SynergyScorer {
    /// Create a scorer with the built-in rules and default configuration.
    pub fn new(corpus: Arc<dyn CardCorpus>) -> Self {
        SynergyScorer {
            corpus,
            rules: CompiledRules::default_shared(),
            config: ScorerConfig::default(),
        }
    }

    pub fn with_rules(mut self, rules: Arc<CompiledRules>) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the configuration. Fails with [`GlaiveError::Config`] when
    /// [`ScorerConfig::validate`] rejects it.
    pub fn with_config(mut self, config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn rules(&self) -> &Arc<CompiledRules> {
        &self.rules
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Arc<dyn CardCorpus> {
        &self.corpus
    }

    /// Resolve `name` through the corpus and score it.
    ///
    /// Returns [`GlaiveError::CardNotFound`] when the corpus does not know the
    /// card.
    pub async fn find_synergies(
        &self,
        name: &str,
        max_results: usize,
        format: Option<&str>,
    ) -> Result<Vec<SynergyResult>> {
        let card = self
            .corpus
            .resolve(name)
            .await?
            .ok_or_else(|| GlaiveError::card_not_found(name))?;
        self.find_synergies_for_card(&card, max_results, format).await
    }

    /// Score an already resolved card.
    pub async fn find_synergies_for_card(
        &self,
        card: &Card,
        max_results: usize,
        format: Option<&str>,
    ) -> Result<Vec<SynergyResult>> {
        let max_results = max_results.clamp(MIN_SYNERGY_RESULTS, MAX_SYNERGY_RESULTS);
        let plan = self.plan(card, format);
        debug!(
            "Synergy plan for {:?}: {} searches ({} keyword, {} tribal, {} ability, {} type)",
            card.name,
            plan.len(),
            plan.count_for(SynergyPass::Keyword),
            plan.count_for(SynergyPass::Tribal),
            plan.count_for(SynergyPass::Ability),
            plan.count_for(SynergyPass::Type),
        );
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.execute(&plan).await?;

        let mut seen = AHashSet::new();
        seen.insert(card.normalized_name());

        let mut results = Vec::new();
        for (search, cards) in plan.iter().zip(hits) {
            for candidate in cards {
                if !seen.insert(normalize_name(&candidate.name)) {
                    continue;
                }
                let score = synergy_score(
                    search.synergy_type,
                    card.color_identity,
                    candidate.color_identity,
                    search.multiplier,
                    self.config.color_bonus_weight,
                );
                results.push(SynergyResult {
                    name: candidate.name,
                    synergy_type: search.synergy_type,
                    reason: search.reason.clone(),
                    score,
                    mana_cost: candidate.mana_cost,
                    type_line: candidate.type_line,
                });
            }
        }

        // Stable: equal scores keep discovery order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(max_results);
        Ok(results)
    }

    /// Build the ordered search plan for `card`.
    pub fn plan(&self, card: &Card, format: Option<&str>) -> SearchPlan {
        let mut planner = Planner {
            card,
            format,
            page_size: self.config.page_size,
            searches: Vec::new(),
        };

        for keyword in &card.keywords {
            for rule in self.rules.keyword_rules(keyword) {
                planner.push_rule(SynergyPass::Keyword, rule);
            }
        }

        if card.has_creature_subtypes() {
            for subtype in &card.subtypes {
                if self.rules.is_denied_subtype(subtype) {
                    continue;
                }
                planner.push(
                    SynergyPass::Tribal,
                    format!("{subtype} tribal synergy"),
                    1.0,
                    CardQuery::oracle_text(subtype_reference(subtype)),
                );
                planner.push(
                    SynergyPass::Tribal,
                    format!("Fellow {subtype}"),
                    self.config.fellow_tribal_multiplier,
                    CardQuery::type_line(subtype_exact(subtype)),
                );
            }
        }

        for rule in self.rules.ability_rules(&card.oracle_text) {
            planner.push_rule(SynergyPass::Ability, rule);
        }

        for card_type in &card.types {
            for rule in self.rules.type_rules(card_type) {
                planner.push_rule(SynergyPass::Type, rule);
            }
        }

        SearchPlan {
            searches: planner.searches,
        }
    }

    /// Run every planned search, at most `max_concurrent_searches` at a time.
    /// Output is in plan order. The first corpus error fails the request.
    async fn execute(&self, plan: &SearchPlan) -> Result<Vec<Vec<Card>>> {
        let concurrency = self.config.max_concurrent_searches.max(1);
        stream::iter(plan.iter())
            .map(|search| self.corpus.search(&search.query))
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

struct Planner<'a> {
    card: &'a Card,
    format: Option<&'a str>,
    page_size: usize,
    searches: Vec<PlannedSearch>,
}

impl Planner<'_> {
    fn push_rule(&mut self, pass: SynergyPass, rule: &SearchRule) {
        self.push(
            pass,
            rule.reason.clone(),
            1.0,
            CardQuery::oracle_text(rule.pattern.as_str()),
        );
    }

    fn push(&mut self, pass: SynergyPass, reason: String, multiplier: f32, query: CardQuery) {
        let query = query
            .within_identity(self.card.color_identity)
            .in_format(self.format)
            .with_page_size(self.page_size);
        self.searches.push(PlannedSearch {
            pass,
            synergy_type: pass.synergy_type(),
            reason,
            multiplier,
            query,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::card::ColorIdentity;
    use crate::corpus::{MemoryCardCorpus, SearchField};
    use crate::synergy::rules::SynergyRules;

    /// Records every query and answers from an in-memory pool.
    struct RecordingCorpus {
        inner: MemoryCardCorpus,
        queries: Mutex<Vec<CardQuery>>,
    }

    impl RecordingCorpus {
        fn new(inner: MemoryCardCorpus) -> Self {
            RecordingCorpus {
                inner,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CardCorpus for RecordingCorpus {
        async fn resolve(&self, name: &str) -> Result<Option<Card>> {
            self.inner.resolve(name).await
        }

        async fn search(&self, query: &CardQuery) -> Result<Vec<Card>> {
            self.queries.lock().unwrap().push(query.clone());
            self.inner.search(query).await
        }
    }

    struct FailingCorpus;

    #[async_trait]
    impl CardCorpus for FailingCorpus {
        async fn resolve(&self, name: &str) -> Result<Option<Card>> {
            Ok(Some(
                Card::new(name, "Creature — Bird").with_keywords(["Flying"]),
            ))
        }

        async fn search(&self, _query: &CardQuery) -> Result<Vec<Card>> {
            Err(GlaiveError::corpus("connection reset"))
        }
    }

    fn green() -> ColorIdentity {
        "G".parse().unwrap()
    }

    fn elves() -> MemoryCardCorpus {
        [
            Card::new("Llanowar Elves", "Creature — Elf Druid")
                .with_oracle_text("{T}: Add {G}.")
                .with_mana_cost("{G}")
                .with_colors(green()),
            Card::new("Elvish Archdruid", "Creature — Elf Druid")
                .with_oracle_text("Other Elf creatures you control get +1/+1.")
                .with_mana_cost("{1}{G}{G}")
                .with_colors(green()),
            Card::new("Elvish Mystic", "Creature — Elf Druid")
                .with_oracle_text("{T}: Add {G}.")
                .with_mana_cost("{G}")
                .with_colors(green()),
            Card::new("Elemental Mystic", "Creature — Elemental")
                .with_colors(green()),
            Card::new("Lord of Atlantis", "Creature — Merfolk")
                .with_oracle_text("Other Elf and Merfolk creatures get +1/+1.")
                .with_colors("U".parse().unwrap()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_plan_pass_order() {
        let scorer = SynergyScorer::new(Arc::new(MemoryCardCorpus::new()));
        let card = Card::new("Thopter Engineer", "Artifact Creature — Human Artificer")
            .with_keywords(["Haste"])
            .with_oracle_text("When Thopter Engineer enters, create a 1/1 colorless Thopter artifact creature token with flying.");

        let plan = scorer.plan(&card, Some("modern"));
        let passes: Vec<_> = plan.iter().map(|s| s.pass).collect();
        let mut sorted = passes.clone();
        sorted.sort();
        assert_eq!(passes, sorted);

        assert!(plan.count_for(SynergyPass::Keyword) > 0);
        // Human is denied, Artificer is not.
        assert_eq!(plan.count_for(SynergyPass::Tribal), 2);
        assert!(plan.count_for(SynergyPass::Ability) > 0);
        assert!(plan.count_for(SynergyPass::Type) > 0);

        for search in plan.iter() {
            assert_eq!(search.query.format.as_deref(), Some("modern"));
            assert_eq!(search.query.color_identity, Some(ColorIdentity::COLORLESS));
            assert_eq!(search.synergy_type, search.pass.synergy_type());
        }
    }

    #[test]
    fn test_plan_tribal_searches() {
        let scorer = SynergyScorer::new(Arc::new(MemoryCardCorpus::new()));
        let card = Card::new("Llanowar Elves", "Creature — Elf Druid");
        let plan = scorer.plan(&card, None);

        let tribal: Vec<_> = plan
            .iter()
            .filter(|s| s.pass == SynergyPass::Tribal)
            .collect();
        assert_eq!(tribal.len(), 4);
        assert_eq!(tribal[0].query.field, SearchField::OracleText);
        assert_eq!(tribal[0].multiplier, 1.0);
        assert_eq!(tribal[1].query.field, SearchField::TypeLine);
        assert_eq!(tribal[1].multiplier, 0.9);
        assert_eq!(tribal[1].reason, "Fellow Elf");
    }

    #[test]
    fn test_noncreature_subtypes_are_not_tribal() {
        let scorer = SynergyScorer::new(Arc::new(MemoryCardCorpus::new()));
        let card = Card::new("Bonesplitter", "Artifact — Equipment");
        let plan = scorer.plan(&card, None);
        assert_eq!(plan.count_for(SynergyPass::Tribal), 0);
        assert!(plan.count_for(SynergyPass::Type) > 0);
    }

    #[tokio::test]
    async fn test_elf_tribal_ranking() {
        let scorer = SynergyScorer::new(Arc::new(elves()));
        let results = scorer.find_synergies("Llanowar Elves", 10, None).await.unwrap();

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Elvish Archdruid", "Elvish Mystic"]);

        // Oracle reference: (0.85 + 0.1) × 1.0; type line only: (0.85 + 0.1) × 0.9.
        assert!((results[0].score - 0.95).abs() < 1e-6);
        assert!((results[1].score - 0.855).abs() < 1e-6);
        assert!(results.iter().all(|r| r.synergy_type == SynergyType::Tribal));
    }

    #[tokio::test]
    async fn test_unknown_card() {
        let scorer = SynergyScorer::new(Arc::new(elves()));
        let err = scorer.find_synergies("Nonexistent Card", 10, None).await.unwrap_err();
        assert!(err.is_card_not_found());
    }

    #[tokio::test]
    async fn test_empty_plan_skips_corpus() {
        let corpus = Arc::new(RecordingCorpus::new(elves()));
        let scorer = SynergyScorer::new(corpus.clone());
        let card = Card::new("Grizzly Bears", "Creature — Human");

        let results = scorer.find_synergies_for_card(&card, 10, None).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(corpus.query_count(), 0);
    }

    #[tokio::test]
    async fn test_source_card_is_never_suggested() {
        let scorer = SynergyScorer::new(Arc::new(elves()));
        let results = scorer.find_synergies("Elvish Archdruid", 10, None).await.unwrap();
        assert!(results.iter().all(|r| r.name != "Elvish Archdruid"));
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn test_max_results_is_clamped() {
        let scorer = SynergyScorer::new(Arc::new(elves()));
        let results = scorer.find_synergies("Llanowar Elves", 0, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Elvish Archdruid");
    }

    #[tokio::test]
    async fn test_max_results_is_capped() {
        let mut corpus = elves();
        for i in 0..150 {
            corpus.add_card(
                Card::new(format!("Elf Scout {i}"), "Creature — Elf Scout").with_colors(green()),
            );
        }
        let scorer = SynergyScorer::new(Arc::new(corpus))
            .with_config(ScorerConfig::default().with_page_size(200))
            .unwrap();

        let results = scorer.find_synergies("Llanowar Elves", 500, None).await.unwrap();
        assert_eq!(results.len(), MAX_SYNERGY_RESULTS);
        assert_eq!(results[0].name, "Elvish Archdruid");
    }

    #[test]
    fn test_with_config_rejects_invalid_values() {
        let scorer = || SynergyScorer::new(Arc::new(MemoryCardCorpus::new()));

        let err = scorer()
            .with_config(ScorerConfig::default().with_color_bonus_weight(f32::NAN))
            .err()
            .unwrap();
        assert!(matches!(err, GlaiveError::Config(_)));

        let err = scorer()
            .with_config(ScorerConfig::default().with_color_bonus_weight(-0.5))
            .err()
            .unwrap();
        assert!(matches!(err, GlaiveError::Config(_)));

        let err = scorer()
            .with_config(ScorerConfig::default().with_max_concurrent_searches(0))
            .err()
            .unwrap();
        assert!(matches!(err, GlaiveError::Config(_)));

        let scorer = scorer()
            .with_config(ScorerConfig::default().with_color_bonus_weight(0.2))
            .unwrap();
        assert_eq!(scorer.config().color_bonus_weight, 0.2);
    }

    #[tokio::test]
    async fn test_corpus_error_propagates() {
        let scorer = SynergyScorer::new(Arc::new(FailingCorpus));
        let err = scorer.find_synergies("Birds of Paradise", 5, None).await.unwrap_err();
        assert!(matches!(err, GlaiveError::Corpus(_)));
    }

    #[tokio::test]
    async fn test_custom_rules() {
        let mut rules = SynergyRules::empty();
        rules.keywords.insert(
            "Flying".to_string(),
            vec![SearchRule::new("reach", "Blocks flyers")],
        );
        let corpus: MemoryCardCorpus = [
            Card::new("Serra Angel", "Creature — Angel").with_keywords(["Flying", "Vigilance"]),
            Card::new("Giant Spider", "Creature — Spider").with_keywords(["Reach"]).with_oracle_text("Reach"),
        ]
        .into_iter()
        .collect();

        let scorer = SynergyScorer::new(Arc::new(corpus)).with_rules(Arc::new(rules.compile()));
        let results = scorer.find_synergies("serra angel", 5, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Giant Spider");
        assert_eq!(results[0].synergy_type, SynergyType::Keyword);
        assert_eq!(results[0].reason, "Blocks flyers");
        assert!((results[0].score - 0.8).abs() < 1e-6);
    }
}
