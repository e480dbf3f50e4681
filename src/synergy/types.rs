//! Synergy kinds, passes and results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::ColorIdentity;

/// The kind of affinity a suggestion represents.
///
/// The set is closed; each kind carries a fixed base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyType {
    Keyword,
    Tribal,
    Ability,
    Theme,
    Archetype,
}

impl SynergyType {
    /// Base score before the color bonus and pass multipliers.
    pub const fn base_score(self) -> f32 {
        match self {
            SynergyType::Keyword => 0.80,
            SynergyType::Tribal => 0.85,
            SynergyType::Ability => 0.75,
            SynergyType::Theme => 0.70,
            SynergyType::Archetype => 0.65,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SynergyType::Keyword => "keyword",
            SynergyType::Tribal => "tribal",
            SynergyType::Ability => "ability",
            SynergyType::Theme => "theme",
            SynergyType::Archetype => "archetype",
        }
    }
}

impl fmt::Display for SynergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four scoring passes, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyPass {
    Keyword,
    Tribal,
    Ability,
    Type,
}

impl SynergyPass {
    pub const ALL: [SynergyPass; 4] = [
        SynergyPass::Keyword,
        SynergyPass::Tribal,
        SynergyPass::Ability,
        SynergyPass::Type,
    ];

    /// The synergy kind reported for results found by this pass.
    pub const fn synergy_type(self) -> SynergyType {
        match self {
            SynergyPass::Keyword => SynergyType::Keyword,
            SynergyPass::Tribal => SynergyType::Tribal,
            SynergyPass::Ability => SynergyType::Ability,
            SynergyPass::Type => SynergyType::Theme,
        }
    }
}

/// What on the source card triggers a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Keyword,
    AbilityPattern,
    Type,
}

/// One suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyResult {
    pub name: String,
    pub synergy_type: SynergyType,
    /// Human-readable justification.
    pub reason: String,
    /// Score in [0, 1].
    pub score: f32,
    pub mana_cost: String,
    pub type_line: String,
}

/// Score a candidate.
///
/// `(base + bonus) × multiplier`, clamped to [0, 1] once at the end, where
/// `bonus = color_weight × |overlap| / |source identity|` and is zero for a
/// colorless source.
pub fn synergy_score(
    synergy_type: SynergyType,
    source_identity: ColorIdentity,
    candidate_identity: ColorIdentity,
    multiplier: f32,
    color_weight: f32,
) -> f32 {
    let bonus = if source_identity.is_empty() {
        0.0
    } else {
        let overlap = source_identity.intersection(candidate_identity).len();
        color_weight * overlap as f32 / source_identity.len() as f32
    };
    ((synergy_type.base_score() + bonus) * multiplier).clamp(0.0, 1.0)
}
