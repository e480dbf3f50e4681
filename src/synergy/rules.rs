//! Synergy rule tables.
//!
//! [`SynergyRules`] is the plain-data form of the tables (serde friendly, with
//! built-in defaults). [`CompiledRules`] is the immutable form the scorer
//! reads: lookup keys are normalized and ability triggers are compiled once.
//! Share it through an `Arc`; nothing mutates it after construction.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::error::{GlaiveError, Result};
use crate::pattern::TextPattern;
use crate::synergy::types::{SynergyType, TriggerKind};

/// A corpus search issued when a rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRule {
    /// Oracle-text pattern sent to the corpus.
    pub pattern: String,
    /// Justification shown to the user.
    pub reason: String,
}

impl SearchRule {
    pub fn new<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        SearchRule {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// An oracle-text trigger and the searches it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRule {
    /// Pattern matched against the source card's oracle text.
    pub trigger: String,
    pub searches: Vec<SearchRule>,
}

/// Patterns that mark a card as supporting a deck theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeIndicator {
    pub theme: String,
    /// Case-insensitive regexes; invalid ones match as substrings.
    pub indicators: Vec<String>,
}

/// A fully resolved rule, as used by one planned search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynergyRule {
    pub trigger: TriggerKind,
    pub pattern: String,
    pub reason: String,
    pub synergy_type: SynergyType,
}

/// A theme detected on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeMatch {
    pub theme: String,
    /// The indicator that matched.
    pub indicator: String,
    pub synergy_type: SynergyType,
}

/// The rule tables in data form.
///
/// `Default` gives the built-in tables. When deserializing, omitted tables
/// are empty rather than defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyRules {
    /// Keyword (any case) to searches.
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<SearchRule>>,
    /// Ability-text library, evaluated in order.
    #[serde(default)]
    pub abilities: Vec<AbilityRule>,
    /// Card type (any case) to searches.
    #[serde(default)]
    pub types: BTreeMap<String, Vec<SearchRule>>,
    /// Creature types too common to be a meaningful tribal signal.
    #[serde(default)]
    pub tribal_denylist: Vec<String>,
    /// Theme indicators, evaluated in order.
    #[serde(default)]
    pub themes: Vec<ThemeIndicator>,
}

const DEFAULT_KEYWORD_RULES: &[(&str, &[(&str, &str)])] = &[
    (
        "flying",
        &[
            (r"creatures? with flying", "Cares about creatures with flying"),
            (r"flying creatures you control", "Anthem for flyers"),
        ],
    ),
    (
        "deathtouch",
        &[
            (r"\bfights?\b", "Deathtouch makes every fight lethal"),
            (r"deals \d+ damage to each creature", "Deathtouch turns pingers into sweepers"),
        ],
    ),
    (
        "lifelink",
        &[
            (r"whenever you gain life", "Payoff for lifelink triggers"),
            (r"double strike", "Double strike doubles the life gained"),
        ],
    ),
    (
        "trample",
        &[
            (r"\+1/\+1 counter", "Bigger tramplers push more damage through"),
            (r"gets \+\d+/\+\d+", "Pump effects make trample damage lethal"),
        ],
    ),
    (
        "first strike",
        &[(r"equipped creature gets", "Equipment hits first with first strike")],
    ),
    (
        "double strike",
        &[
            (r"equipped creature gets", "Equipment bonuses count twice with double strike"),
            (r"gets \+\d+/\+\d+", "Pump effects count twice with double strike"),
        ],
    ),
    (
        "haste",
        &[(r"whenever .* attacks", "Hasty attackers trigger attack payoffs at once")],
    ),
    (
        "vigilance",
        &[(r"untapped creatures you control", "Vigilant attackers stay untapped")],
    ),
    (
        "flash",
        &[(r"as though (it|they) had flash", "More instant-speed threats")],
    ),
    (
        "menace",
        &[(r"can't block", "Stacks evasion with menace")],
    ),
    (
        "hexproof",
        &[
            (r"enchant creature", "Auras are safe on hexproof creatures"),
            (r"equipped creature", "Equipment is safe on hexproof creatures"),
        ],
    ),
    (
        "indestructible",
        &[(r"destroy all", "Wraths leave indestructible creatures standing")],
    ),
    (
        "prowess",
        &[(r"noncreature spell", "Noncreature spells trigger prowess")],
    ),
    (
        "proliferate",
        &[
            (r"\+1/\+1 counter", "Proliferate grows +1/+1 counters"),
            (r"loyalty", "Proliferate adds loyalty"),
            (r"poison counter", "Proliferate adds poison counters"),
        ],
    ),
    (
        "flashback",
        &[
            (r"\bdiscard\b", "Discarding sets up flashback"),
            (r"\bmill\b", "Self-mill sets up flashback"),
        ],
    ),
    (
        "convoke",
        &[(r"create .* creature tokens?", "Tokens pay for convoke")],
    ),
    (
        "landfall",
        &[
            (r"search your library for .*lands?", "Land search doubles landfall"),
            (r"play an additional land", "Extra land drops trigger landfall"),
        ],
    ),
    (
        "infect",
        &[
            (r"proliferate", "Proliferate adds poison counters"),
            (r"gets \+\d+/\+\d+", "Pump effects add more poison"),
        ],
    ),
    (
        "ward",
        &[(r"enchant creature", "Auras on warded creatures are harder to answer")],
    ),
];

const DEFAULT_ABILITY_RULES: &[(&str, &[(&str, &str)])] = &[
    (
        r"when .* enters",
        &[
            (
                r"exile .*creature you control, then return",
                "Blink effects reuse enter triggers",
            ),
            (r"triggers? an additional time", "Doubles enter triggers"),
        ],
    ),
    (
        r"whenever .* dies",
        &[
            (r"sacrifice (a|another) creature:", "Free sacrifice outlets trigger death payoffs"),
            (r"create .* creature tokens?", "Tokens feed death triggers"),
        ],
    ),
    (
        r"draw .* cards?",
        &[
            (r"whenever you draw", "Rewards drawing extra cards"),
            (r"no maximum hand size", "Keeps the extra cards"),
        ],
    ),
    (
        r"create .* tokens?",
        &[
            (r"tokens you control get", "Anthem for tokens"),
            (r"\bpopulate\b", "Copies the tokens you make"),
            (r"would create .* tokens?", "Doubles token creation"),
        ],
    ),
    (
        r"\bsacrifice\b",
        &[
            (r"whenever .* dies", "Death triggers reward sacrificing"),
            (r"create .* tokens?", "Fodder for sacrifice"),
        ],
    ),
    (
        r"\+1/\+1 counters?",
        &[
            (r"\bproliferate\b", "Proliferate grows every counter"),
            (r"would be put on", "Doubles counters"),
        ],
    ),
    (
        r"\bgraveyard\b",
        &[
            (r"\bmill\b", "Self-mill fills the graveyard"),
            (r"return .* from your graveyard", "Recursion from the graveyard"),
        ],
    ),
    (
        r"gains? .*\blife\b",
        &[(r"whenever you gain life", "Life gain payoff")],
    ),
    (
        r"\bdiscard",
        &[
            (r"\bmadness\b", "Madness rewards discarding"),
            (r"whenever you discard", "Discard payoff"),
        ],
    ),
    (
        r"instant or sorcery",
        &[
            (r"copy target instant or sorcery", "Copies your spells"),
            (r"instant and sorcery spells you cast cost", "Cheaper spells"),
        ],
    ),
    (
        r"whenever .* attacks",
        &[(r"additional combat phase", "Extra combats repeat attack triggers")],
    ),
];

const DEFAULT_TYPE_RULES: &[(&str, &[(&str, &str)])] = &[
    (
        "artifact",
        &[
            (r"artifacts? you control", "Rewards controlling artifacts"),
            (r"whenever an artifact", "Artifact triggers"),
        ],
    ),
    (
        "enchantment",
        &[
            (r"enchantments? you control", "Rewards controlling enchantments"),
            (r"whenever an enchantment", "Enchantment triggers"),
        ],
    ),
    (
        "instant",
        &[
            (r"instant or sorcery", "Spellslinger payoff"),
            (r"noncreature spell", "Noncreature spell payoff"),
        ],
    ),
    (
        "sorcery",
        &[
            (r"instant or sorcery", "Spellslinger payoff"),
            (r"noncreature spell", "Noncreature spell payoff"),
        ],
    ),
    (
        "planeswalker",
        &[
            (r"loyalty", "Adds loyalty"),
            (r"planeswalkers? you control", "Planeswalker support"),
        ],
    ),
    (
        "land",
        &[
            (r"\blandfall\b", "Landfall payoff"),
            (r"lands? you control", "Rewards controlling lands"),
        ],
    ),
];

const DEFAULT_TRIBAL_DENYLIST: &[&str] = &[
    "Human", "Warrior", "Wizard", "Soldier", "Cleric", "Shaman", "Rogue",
];

const DEFAULT_THEMES: &[(&str, &[&str])] = &[
    ("tokens", &[r"\btokens?\b"]),
    ("counters", &[r"\+1/\+1 counters?", r"\bproliferate\b"]),
    ("graveyard", &[r"from your graveyard", r"\bmill(s|ed)?\b"]),
    ("lifegain", &[r"\bgains? life\b", r"\blifelink\b"]),
    ("sacrifice", &[r"\bsacrifice (a|another)\b"]),
    ("spellslinger", &[r"instant or sorcery", r"\bnoncreature spells?\b"]),
    ("artifacts", &[r"artifacts you control", r"\bartifact spells?\b", r"whenever an artifact"]),
    ("enchantments", &[r"enchantments you control", r"whenever an enchantment"]),
    ("landfall", &[r"\blandfall\b", r"\blands? enters\b"]),
    ("card draw", &[r"\bdraw (a|two|three) cards?\b", r"\bdraw cards\b"]),
    ("tribal", &[r"\bcreature types?\b"]),
];

fn to_search_rules(pairs: &[(&str, &str)]) -> Vec<SearchRule> {
    pairs
        .iter()
        .map(|(pattern, reason)| SearchRule::new(*pattern, *reason))
        .collect()
}

impl Default for SynergyRules {
    fn default() -> Self {
        SynergyRules {
            keywords: DEFAULT_KEYWORD_RULES
                .iter()
                .map(|(k, pairs)| (k.to_string(), to_search_rules(pairs)))
                .collect(),
            abilities: DEFAULT_ABILITY_RULES
                .iter()
                .map(|(trigger, pairs)| AbilityRule {
                    trigger: trigger.to_string(),
                    searches: to_search_rules(pairs),
                })
                .collect(),
            types: DEFAULT_TYPE_RULES
                .iter()
                .map(|(t, pairs)| (t.to_string(), to_search_rules(pairs)))
                .collect(),
            tribal_denylist: DEFAULT_TRIBAL_DENYLIST.iter().map(|s| s.to_string()).collect(),
            themes: DEFAULT_THEMES
                .iter()
                .map(|(theme, indicators)| ThemeIndicator {
                    theme: theme.to_string(),
                    indicators: indicators.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl SynergyRules {
    /// Tables with no rules at all.
    pub fn empty() -> Self {
        SynergyRules {
            keywords: BTreeMap::new(),
            abilities: Vec::new(),
            types: BTreeMap::new(),
            tribal_denylist: Vec::new(),
            themes: Vec::new(),
        }
    }

    /// Parse tables from JSON. Omitted tables are empty.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GlaiveError::config(format!("Failed to parse synergy rules: {e}")))
    }

    /// Read tables from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Themes the card supports, in table order. A theme is reported once,
    /// with the first indicator found in the card's oracle text, keywords or
    /// type line.
    ///
    /// Compiles the indicators on every call; prefer
    /// [`CompiledRules::themes_for`] on hot paths.
    pub fn themes_for(&self, card: &Card) -> Vec<ThemeMatch> {
        detect_themes(&compile_themes(&self.themes), card)
    }

    /// Compile into the read-only form used by the scorer.
    pub fn compile(self) -> CompiledRules {
        CompiledRules::new(self)
    }
}

#[derive(Debug)]
struct CompiledTheme {
    theme: String,
    indicators: Vec<TextPattern>,
}

fn compile_themes(themes: &[ThemeIndicator]) -> Vec<CompiledTheme> {
    themes
        .iter()
        .map(|theme| CompiledTheme {
            theme: theme.theme.clone(),
            indicators: theme
                .indicators
                .iter()
                .map(|indicator| TextPattern::compile(indicator))
                .collect(),
        })
        .collect()
}

fn detect_themes(themes: &[CompiledTheme], card: &Card) -> Vec<ThemeMatch> {
    let haystack = format!(
        "{}\n{}\n{}",
        card.oracle_text,
        card.keywords.join(" "),
        card.type_line
    );

    themes
        .iter()
        .filter_map(|theme| {
            theme
                .indicators
                .iter()
                .find(|indicator| indicator.is_match(&haystack))
                .map(|indicator| ThemeMatch {
                    theme: theme.theme.clone(),
                    indicator: indicator.as_str().to_string(),
                    synergy_type: SynergyType::Archetype,
                })
        })
        .collect()
}

static DEFAULT_COMPILED_RULES: LazyLock<Arc<CompiledRules>> =
    LazyLock::new(|| Arc::new(SynergyRules::default().compile()));

/// Immutable, compiled rule tables.
#[derive(Debug)]
pub struct CompiledRules {
    keywords: AHashMap<String, Vec<SearchRule>>,
    abilities: Vec<(TextPattern, Vec<SearchRule>)>,
    types: AHashMap<String, Vec<SearchRule>>,
    tribal_denylist: Vec<String>,
    themes: Vec<CompiledTheme>,
}

impl CompiledRules {
    /// Normalize keys and compile ability triggers and theme indicators.
    /// Invalid regexes become substring patterns.
    pub fn new(rules: SynergyRules) -> Self {
        let compiled = CompiledRules {
            keywords: rules
                .keywords
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
            abilities: rules
                .abilities
                .into_iter()
                .map(|rule| (TextPattern::compile(&rule.trigger), rule.searches))
                .collect(),
            types: rules
                .types
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
            tribal_denylist: rules
                .tribal_denylist
                .iter()
                .map(|s| s.trim().to_lowercase())
                .collect(),
            themes: compile_themes(&rules.themes),
        };
        debug!(
            "Compiled synergy rules: {} keywords, {} ability patterns, {} types",
            compiled.keywords.len(),
            compiled.abilities.len(),
            compiled.types.len()
        );
        compiled
    }

    /// The shared compiled form of the built-in tables.
    pub fn default_shared() -> Arc<CompiledRules> {
        Arc::clone(&DEFAULT_COMPILED_RULES)
    }

    /// Searches for a keyword, case-insensitively.
    pub fn keyword_rules(&self, keyword: &str) -> &[SearchRule] {
        self.keywords
            .get(&keyword.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Searches for a card type, case-insensitively.
    pub fn type_rules(&self, card_type: &str) -> &[SearchRule] {
        self.types
            .get(&card_type.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Searches unlocked by `oracle_text`, in library order.
    pub fn ability_rules<'a>(
        &'a self,
        oracle_text: &'a str,
    ) -> impl Iterator<Item = &'a SearchRule> + 'a {
        self.abilities
            .iter()
            .filter(move |(trigger, _)| trigger.is_match(oracle_text))
            .flat_map(|(_, searches)| searches.iter())
    }

    /// Whether a creature type is too common to score.
    pub fn is_denied_subtype(&self, subtype: &str) -> bool {
        let key = subtype.trim().to_lowercase();
        self.tribal_denylist.iter().any(|d| *d == key)
    }

    /// Every keyword, ability and type rule that fires for `card`, in pass
    /// order. Tribal searches are derived from subtypes and are not listed.
    pub fn matching_rules(&self, card: &Card) -> Vec<SynergyRule> {
        fn resolve(trigger: TriggerKind, synergy_type: SynergyType, rule: &SearchRule) -> SynergyRule {
            SynergyRule {
                trigger,
                pattern: rule.pattern.clone(),
                reason: rule.reason.clone(),
                synergy_type,
            }
        }

        let keywords = card
            .keywords
            .iter()
            .flat_map(|k| self.keyword_rules(k))
            .map(|r| resolve(TriggerKind::Keyword, SynergyType::Keyword, r));
        let abilities = self
            .ability_rules(&card.oracle_text)
            .map(|r| resolve(TriggerKind::AbilityPattern, SynergyType::Ability, r));
        let types = card
            .types
            .iter()
            .flat_map(|t| self.type_rules(t))
            .map(|r| resolve(TriggerKind::Type, SynergyType::Theme, r));

        keywords.chain(abilities).chain(types).collect()
    }

    /// Themes the card supports. See [`SynergyRules::themes_for`].
    pub fn themes_for(&self, card: &Card) -> Vec<ThemeMatch> {
        detect_themes(&self.themes, card)
    }
}

impl Default for CompiledRules {
    fn default() -> Self {
        SynergyRules::default().compile()
    }
}
