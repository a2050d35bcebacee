mod dataset;

pub use dataset::NameDataset;

use crate::error::LookupError;
use crate::services::name_lookup::{NameLookup, NameStats};

/// Stands in for a knowledge base that could not be loaded; every lookup fails.
pub struct UnavailableNames {
    reason: String,
}

impl UnavailableNames {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl NameLookup for UnavailableNames {
    fn lookup(&self, _token: &str) -> Result<Option<NameStats>, LookupError> {
        Err(LookupError::Unavailable(self.reason.clone()))
    }
}
