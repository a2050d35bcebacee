use std::collections::BTreeMap;

/// Lower-cases and collapses whitespace so spacing/case never count as edits.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Edit-distance similarity of two names on a 0-100 scale.
pub fn similarity_ratio(a: &str, b: &str) -> u8 {
    ratio(&normalize_name(a), &normalize_name(b))
}

fn ratio(a: &str, b: &str) -> u8 {
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Maps every raw name to a canonical representative.
///
/// Names are visited in iteration order. A name whose ratio against an
/// existing representative exceeds `threshold` joins the first such
/// representative; otherwise it becomes a representative itself
/// (first-seen wins). Representatives never exceed `threshold` against each
/// other, so unifying the canonical names again maps each to itself.
pub fn unify_names<'a, I>(names: I, threshold: u8) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut representatives: Vec<(String, String)> = Vec::new();
    let mut mapping = BTreeMap::new();

    for name in names {
        if mapping.contains_key(name) {
            continue;
        }
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            mapping.insert(name.to_string(), name.to_string());
            continue;
        }

        let canonical = representatives
            .iter()
            .find(|(_, rep)| ratio(&normalized, rep) > threshold)
            .map(|(raw, _)| raw.clone());

        let canonical = match canonical {
            Some(existing) => existing,
            None => {
                representatives.push((name.to_string(), normalized));
                name.to_string()
            }
        };
        mapping.insert(name.to_string(), canonical);
    }

    mapping
}
