//! Combo detection.
//!
//! A combo is a curated, exact set of cards that together produce a
//! deterministic effect. The corpus is static and large (tens of thousands of
//! entries), so matching goes through an inverted index from card name to
//! combo ids and never scans the whole corpus.
//!
//! - [`corpus`]: loading the static combo list.
//! - [`index`]: the immutable inverted index.
//! - [`matcher`]: exact and partial matching over an atomically swappable index.

pub mod corpus;
pub mod index;
pub mod matcher;
pub mod types;

pub use corpus::ComboCorpus;
pub use index::{CandidateSet, ComboIndex, IndexStats};
pub use matcher::ComboMatcher;
pub use types::{Combo, ComboMatch, MissingPieces};
