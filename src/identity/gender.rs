use crate::error::LookupError;
use crate::model::Gender;
use crate::services::name_lookup::{NameLookup, NameStats};

/// Alphabetic name tokens; tokens containing digits are skipped.
fn tokens(full_name: &str) -> impl Iterator<Item = &str> {
    full_name
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphabetic()))
        .filter(|t| !t.is_empty() && !t.chars().any(|c| c.is_ascii_digit()))
}

/// `true` when rank `a` beats rank `b`; ranked tokens beat unranked ones.
fn better_rank(a: Option<u32>, b: Option<u32>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        _ => false,
    }
}

fn gender_from(stats: &NameStats) -> Gender {
    if stats.female > stats.male {
        Gender::Female
    } else if stats.male > stats.female {
        Gender::Male
    } else {
        Gender::Unknown
    }
}

/// Infers gender from the most popular first-name token of `full_name`.
///
/// Every token is looked up; the one with the best rank across the
/// knowledge base's country tables decides. Equal probabilities give
/// [`Gender::Unknown`].
pub fn infer_gender(full_name: &str, lookup: &dyn NameLookup) -> Result<Gender, LookupError> {
    let mut best: Option<(Option<u32>, NameStats)> = None;

    for token in tokens(full_name) {
        let Some(stats) = lookup.lookup(token)? else {
            continue;
        };
        let rank = stats.best_rank();
        let replace = match &best {
            None => true,
            Some((best_rank, _)) => better_rank(rank, *best_rank),
        };
        if replace {
            best = Some((rank, stats));
        }
    }

    Ok(best
        .map(|(_, stats)| gender_from(&stats))
        .unwrap_or(Gender::Unknown))
}

/// Splits a full name into `(first_name, last_name)`.
///
/// The first token wins if it is a known first name, then the last token.
/// Failing both, every known first-name token goes to the first name; with
/// none known the first token is assumed to be the first name.
pub fn split_full_name(
    full_name: &str,
    lookup: &dyn NameLookup,
) -> Result<(String, String), LookupError> {
    let words: Vec<&str> = full_name.split_whitespace().collect();
    let Some((first, rest)) = words.split_first() else {
        return Ok((String::new(), String::new()));
    };

    if lookup.lookup(first)?.is_some() {
        return Ok((first.to_string(), rest.join(" ")));
    }

    if let Some((last, init)) = words.split_last() {
        if !init.is_empty() && lookup.lookup(last)?.is_some() {
            return Ok((last.to_string(), init.join(" ")));
        }
    }

    let mut given = Vec::new();
    let mut family = Vec::new();
    for word in &words {
        if lookup.lookup(word)?.is_some() {
            given.push(*word);
        } else {
            family.push(*word);
        }
    }

    if given.is_empty() {
        return Ok(split_naive(full_name));
    }
    Ok((given.join(" "), family.join(" ")))
}

/// First token as first name, the rest as last name.
pub fn split_naive(full_name: &str) -> (String, String) {
    let mut words = full_name.split_whitespace();
    let first = words.next().unwrap_or_default().to_string();
    let rest = words.collect::<Vec<_>>().join(" ");
    (first, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    struct FakeLookup(HashMap<&'static str, NameStats>);

    impl FakeLookup {
        fn new() -> Self {
            let mut entries = HashMap::new();
            entries.insert("marie", stats(0.02, 0.98, 1));
            entries.insert("jean", stats(0.97, 0.03, 4));
            entries.insert("claude", stats(0.6, 0.4, 50));
            entries.insert("sasha", stats(0.5, 0.5, 20));
            Self(entries)
        }
    }

    fn stats(male: f64, female: f64, rank: u32) -> NameStats {
        NameStats {
            male,
            female,
            ranks: BTreeMap::from([("FR".to_string(), rank)]),
        }
    }

    impl NameLookup for FakeLookup {
        fn lookup(&self, token: &str) -> Result<Option<NameStats>, LookupError> {
            Ok(self.0.get(token.to_lowercase().as_str()).cloned())
        }
    }

    struct BrokenLookup;

    impl NameLookup for BrokenLookup {
        fn lookup(&self, _token: &str) -> Result<Option<NameStats>, LookupError> {
            Err(LookupError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_infer_gender_simple() {
        let lookup = FakeLookup::new();
        assert_eq!(infer_gender("Marie DUPONT", &lookup).unwrap(), Gender::Female);
        assert_eq!(infer_gender("DUPONT Jean", &lookup).unwrap(), Gender::Male);
    }

    #[test]
    fn test_infer_gender_best_ranked_token_wins() {
        let lookup = FakeLookup::new();
        // claude ranks 50, marie ranks 1
        assert_eq!(infer_gender("Claude Marie Roux", &lookup).unwrap(), Gender::Female);
    }

    #[test]
    fn test_infer_gender_equal_probabilities_unknown() {
        let lookup = FakeLookup::new();
        assert_eq!(infer_gender("Sasha Petit", &lookup).unwrap(), Gender::Unknown);
    }

    #[test]
    fn test_infer_gender_unknown_and_numeric_tokens() {
        let lookup = FakeLookup::new();
        assert_eq!(infer_gender("FRA 123", &lookup).unwrap(), Gender::Unknown);
        assert_eq!(infer_gender("", &lookup).unwrap(), Gender::Unknown);
    }

    #[test]
    fn test_infer_gender_propagates_lookup_failure() {
        assert!(infer_gender("Marie Dupont", &BrokenLookup).is_err());
    }

    #[test]
    fn test_split_first_token_known() {
        let lookup = FakeLookup::new();
        let (first, last) = split_full_name("Marie de la Tour", &lookup).unwrap();
        assert_eq!(first, "Marie");
        assert_eq!(last, "de la Tour");
    }

    #[test]
    fn test_split_last_token_known() {
        let lookup = FakeLookup::new();
        let (first, last) = split_full_name("DUPONT Jean", &lookup).unwrap();
        assert_eq!(first, "Jean");
        assert_eq!(last, "DUPONT");
    }

    #[test]
    fn test_split_middle_token_known() {
        let lookup = FakeLookup::new();
        let (first, last) = split_full_name("VAN Marie DAM", &lookup).unwrap();
        assert_eq!(first, "Marie");
        assert_eq!(last, "VAN DAM");
    }

    #[test]
    fn test_split_falls_back_to_first_token() {
        let lookup = FakeLookup::new();
        let (first, last) = split_full_name("Xyz Abc Def", &lookup).unwrap();
        assert_eq!(first, "Xyz");
        assert_eq!(last, "Abc Def");
        assert_eq!(split_full_name("", &lookup).unwrap(), (String::new(), String::new()));
    }
}
