//! # Glaive
//!
//! A synergy and combo engine for trading card game deck building.
//!
//! ## Features
//!
//! - Four-pass, rule-based synergy scoring (keyword, tribal, ability, type)
//! - Color identity and format aware corpus searches
//! - Bounded, order-preserving concurrent corpus access
//! - Inverted combo index with exact and missing-piece matching
//! - Lock-free combo index reloads
//! - Pluggable card corpus backends

pub mod card;
pub mod combo;
pub mod config;
pub mod corpus;
pub mod error;
pub mod pattern;
pub mod relationships;
pub mod synergy;

pub mod prelude {
    pub use crate::card::{Card, Color, ColorIdentity};
    pub use crate::combo::{Combo, ComboCorpus, ComboIndex, ComboMatch, ComboMatcher};
    pub use crate::config::{ComboMatcherConfig, GlaiveConfig, ScorerConfig};
    pub use crate::corpus::{CardCorpus, CardQuery, MemoryCardCorpus, SearchField};
    pub use crate::error::{GlaiveError, Result};
    pub use crate::relationships::{CardProfile, ComboDetection, RelationshipFinder};
    pub use crate::synergy::{SynergyResult, SynergyRules, SynergyScorer, SynergyType};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
