//! Card corpus access.
//!
//! The card corpus is an external, read-only collaborator: it resolves a
//! canonical card name to a [`Card`] and runs text searches over the card
//! pool. The synergy scorer only talks to it through the [`CardCorpus`] trait,
//! so a database-backed implementation and the in-memory
//! [`MemoryCardCorpus`](memory::MemoryCardCorpus) are interchangeable.
//!
//! Corpus failures are returned unchanged to the caller; the engine performs
//! no retries.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::card::{Card, ColorIdentity};
use crate::error::Result;

pub use memory::MemoryCardCorpus;

/// Default number of cards returned by one corpus search.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Which card attribute a search pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    /// Rules (oracle) text.
    #[default]
    OracleText,
    /// The full type line, e.g. `"Creature — Elf Warrior"`.
    TypeLine,
}

/// A single corpus search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardQuery {
    /// Case-insensitive regex; implementations fall back to substring
    /// matching when it does not compile.
    pub pattern: String,

    /// Field the pattern is matched against.
    pub field: SearchField,

    /// When set, only cards whose color identity is a subset of this one.
    pub color_identity: Option<ColorIdentity>,

    /// When set, only cards legal in this format.
    pub format: Option<String>,

    /// Maximum number of cards to return.
    pub page_size: usize,
}

impl CardQuery {
    /// Create an oracle-text search with the default page size.
    pub fn oracle_text<S: Into<String>>(pattern: S) -> Self {
        CardQuery {
            pattern: pattern.into(),
            field: SearchField::OracleText,
            color_identity: None,
            format: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Create a type-line search with the default page size.
    pub fn type_line<S: Into<String>>(pattern: S) -> Self {
        CardQuery {
            field: SearchField::TypeLine,
            ..Self::oracle_text(pattern)
        }
    }

    /// Restrict results to cards playable within `identity`.
    pub fn within_identity(mut self, identity: ColorIdentity) -> Self {
        self.color_identity = Some(identity);
        self
    }

    /// Restrict results to cards legal in `format`.
    pub fn in_format<S: Into<String>>(mut self, format: Option<S>) -> Self {
        self.format = format.map(Into::into);
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Read-only access to the card pool.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use glaive::card::Card;
/// use glaive::corpus::{CardCorpus, CardQuery};
/// use glaive::error::Result;
///
/// struct EmptyCorpus;
///
/// #[async_trait]
/// impl CardCorpus for EmptyCorpus {
///     async fn resolve(&self, _name: &str) -> Result<Option<Card>> {
///         Ok(None)
///     }
///
///     async fn search(&self, _query: &CardQuery) -> Result<Vec<Card>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait CardCorpus: Send + Sync {
    /// Resolve a canonical card name. `Ok(None)` when the card does not exist.
    async fn resolve(&self, name: &str) -> Result<Option<Card>>;

    /// Run a text search. Results come back in the corpus's own stable order,
    /// truncated to `query.page_size`.
    async fn search(&self, query: &CardQuery) -> Result<Vec<Card>>;
}

#[async_trait]
impl<T: CardCorpus + ?Sized> CardCorpus for std::sync::Arc<T> {
    async fn resolve(&self, name: &str) -> Result<Option<Card>> {
        (**self).resolve(name).await
    }

    async fn search(&self, query: &CardQuery) -> Result<Vec<Card>> {
        (**self).search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let identity: ColorIdentity = "BG".parse().unwrap();
        let query = CardQuery::type_line("Elf")
            .within_identity(identity)
            .in_format(Some("commander"))
            .with_page_size(5);

        assert_eq!(query.field, SearchField::TypeLine);
        assert_eq!(query.color_identity, Some(identity));
        assert_eq!(query.format.as_deref(), Some("commander"));
        assert_eq!(query.page_size, 5);
    }

    #[test]
    fn test_query_defaults() {
        let query = CardQuery::oracle_text("draw a card").in_format(None::<String>);
        assert_eq!(query.field, SearchField::OracleText);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert!(query.color_identity.is_none());
        assert!(query.format.is_none());
    }
}
