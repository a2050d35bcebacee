use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

use crate::error::LookupError;
use crate::services::name_lookup::{NameLookup, NameStats};

#[derive(Deserialize)]
struct NameRow {
    name: String,
    country: String,
    rank: Option<u32>,
    male: Option<f64>,
    female: Option<f64>,
}

/// First-name knowledge base loaded from a CSV file.
///
/// One row per (name, country):
/// ```csv
/// name,country,rank,male,female
/// Marie,FR,2,0.01,0.99
/// Marie,BE,5,0.02,0.98
/// ```
/// Gender probabilities are averaged across a name's rows; ranks are kept
/// per country.
pub struct NameDataset {
    entries: HashMap<String, NameStats>,
}

impl NameDataset {
    /// Loads the dataset from a CSV file at `path`.
    pub fn load(path: &str) -> Result<Self, LookupError> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LookupError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut sums: HashMap<String, (NameStats, usize)> = HashMap::new();
        for result in rdr.deserialize() {
            let row: NameRow = result?;
            let key = normalize(&row.name);
            if key.is_empty() {
                continue;
            }
            let (stats, n) = sums.entry(key).or_default();
            stats.male += row.male.unwrap_or(0.0);
            stats.female += row.female.unwrap_or(0.0);
            *n += 1;
            if let Some(rank) = row.rank {
                stats
                    .ranks
                    .entry(row.country)
                    .and_modify(|r| *r = (*r).min(rank))
                    .or_insert(rank);
            }
        }

        let entries = sums
            .into_iter()
            .map(|(name, (mut stats, n))| {
                stats.male /= n as f64;
                stats.female /= n as f64;
                (name, stats)
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameLookup for NameDataset {
    fn lookup(&self, token: &str) -> Result<Option<NameStats>, LookupError> {
        Ok(self.entries.get(&normalize(token)).cloned())
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,country,rank,male,female\n\
                          Marie,FR,2,0.0,1.0\n\
                          Marie,BE,5,0.1,0.9\n\
                          Andrea,IT,4,0.9,0.1\n\
                          Andrea,DE,30,0.1,0.9\n";

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dataset = NameDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let marie = dataset.lookup("MARIE").unwrap().unwrap();
        assert!((marie.female - 0.95).abs() < 1e-9);
        assert_eq!(marie.best_rank(), Some(2));
    }

    #[test]
    fn test_lookup_unknown_name() {
        let dataset = NameDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(dataset.lookup("Zebulon").unwrap().is_none());
    }

    #[test]
    fn test_probabilities_are_averaged_across_countries() {
        let dataset = NameDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let andrea = dataset.lookup("andrea").unwrap().unwrap();
        assert!((andrea.male - 0.5).abs() < 1e-9);
        assert!((andrea.female - 0.5).abs() < 1e-9);
        assert_eq!(andrea.ranks.get("IT"), Some(&4));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(NameDataset::load("/nonexistent/names.csv").is_err());
    }
}
