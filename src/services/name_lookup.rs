//! Trait and types for a first-name knowledge base.

use std::collections::BTreeMap;

use crate::error::LookupError;

/// What the knowledge base knows about a single name token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameStats {
    /// Probability the name belongs to a man, in `0.0..=1.0`.
    pub male: f64,
    /// Probability the name belongs to a woman, in `0.0..=1.0`.
    pub female: f64,
    /// Popularity rank of the name per country table; 1 is most popular.
    pub ranks: BTreeMap<String, u32>,
}

impl NameStats {
    /// Best (lowest) rank across every country table.
    pub fn best_rank(&self) -> Option<u32> {
        self.ranks.values().copied().min()
    }
}

/// Abstraction over a first-name knowledge base (e.g., a names dataset).
pub trait NameLookup {
    /// Returns statistics for `token` as a first name, or `None` if unknown.
    fn lookup(&self, token: &str) -> Result<Option<NameStats>, LookupError>;
}
