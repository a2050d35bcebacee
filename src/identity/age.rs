use std::collections::HashMap;

use crate::model::AgeCategory;

/// Identifies one athlete across rows: `(serial_number, canonical_name)`.
pub type AthleteKey = (Option<String>, String);

/// Returns the category already known for `key`, otherwise the fallback.
///
/// This is a closed-world default, not an inference: with
/// `default_to_senior` an athlete never seen in a youth race is assumed
/// Senior, without it the category stays Unknown.
pub fn infer_age_category(
    key: &AthleteKey,
    age_by_key: &HashMap<AthleteKey, AgeCategory>,
    default_to_senior: bool,
) -> AgeCategory {
    match age_by_key.get(key) {
        Some(category) if *category != AgeCategory::Unknown => *category,
        _ if key.1.trim().is_empty() => AgeCategory::Unknown,
        _ if default_to_senior => AgeCategory::Senior,
        _ => AgeCategory::Unknown,
    }
}
