//! Static combo corpus loading.
//!
//! Combos can be loaded from a JSON array or from JSON Lines, one combo
//! object per line:
//! ```jsonl
//! {"id": "1", "cards": ["Splinter Twin", "Deceiver Exarch"], "description": "Infinite hasty tokens", "color_identity": "UR"}
//! {"id": "2", "cards": ["Thassa's Oracle", "Demonic Consultation"], "color_identity": "UB"}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::{info, warn};

use crate::combo::types::Combo;
use crate::error::{GlaiveError, Result};

/// An immutable, ordered list of combos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComboCorpus {
    combos: Vec<Combo>,
}

impl ComboCorpus {
    /// Build a corpus from combos, normalizing each combo's card list.
    /// Combos without an id or without cards are skipped.
    pub fn new(combos: Vec<Combo>) -> Self {
        let mut accepted = Vec::with_capacity(combos.len());
        for mut combo in combos {
            combo.dedup_cards();
            if combo.id.trim().is_empty() || combo.cards.is_empty() {
                warn!("Skipping combo without id or cards: {:?}", combo.id);
                continue;
            }
            accepted.push(combo);
        }
        ComboCorpus { combos: accepted }
    }

    /// Parse a JSON array of combos.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let combos: Vec<Combo> = serde_json::from_str(json)
            .map_err(|e| GlaiveError::parse(format!("Failed to parse combo corpus: {e}")))?;
        Ok(Self::new(combos))
    }

    /// Parse JSON Lines. Blank lines are ignored.
    pub fn from_jsonl_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut combos = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let combo: Combo = serde_json::from_str(trimmed).map_err(|e| {
                GlaiveError::parse(format!("Failed to parse combo on line {}: {e}", line_no + 1))
            })?;
            combos.push(combo);
        }

        Ok(Self::new(combos))
    }

    /// Load a corpus file. Files ending in `.jsonl` are read as JSON Lines,
    /// anything else as a JSON array.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_jsonl = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

        let corpus = if is_jsonl {
            Self::from_jsonl_reader(File::open(path)?)?
        } else {
            let mut json = String::new();
            File::open(path)?.read_to_string(&mut json)?;
            Self::from_json_str(&json)?
        };

        info!("Loaded {} combos from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn combos(&self) -> &[Combo] {
        &self.combos
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Combo> {
        self.combos.iter()
    }
}

impl From<Vec<Combo>> for ComboCorpus {
    fn from(combos: Vec<Combo>) -> Self {
        Self::new(combos)
    }
}

impl FromIterator<Combo> for ComboCorpus {
    fn from_iter<I: IntoIterator<Item = Combo>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ComboCorpus {
    type Item = Combo;
    type IntoIter = std::vec::IntoIter<Combo>;

    fn into_iter(self) -> Self::IntoIter {
        self.combos.into_iter()
    }
}
