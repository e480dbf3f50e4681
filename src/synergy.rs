//! Rule-based synergy scoring.
//!
//! Given a source card, the scorer runs four passes in a fixed order
//! (keyword, tribal, ability text, card type), turns each fired rule into a
//! corpus search and merges the hits into one ranked, de-duplicated list.
//!
//! - [`rules`]: the rule tables and their compiled form.
//! - [`scorer`]: planning and executing the searches.
//! - [`types`]: synergy kinds, passes, results and the scoring formula.

pub mod rules;
pub mod scorer;
pub mod types;

pub use rules::{
    AbilityRule, CompiledRules, SearchRule, SynergyRule, SynergyRules, ThemeIndicator, ThemeMatch,
};
pub use scorer::{PlannedSearch, SearchPlan, SynergyScorer};
pub use types::{SynergyPass, SynergyResult, SynergyType, TriggerKind, synergy_score};
