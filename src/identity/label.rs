use regex::Regex;
use std::sync::LazyLock;

use crate::model::{AgeCategory, Gender};

static U17_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bU\s*17\b|\bUnder\s*17\b|\bJUNIOR\b").expect("valid U17 pattern")
});
static U19_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bU\s*19\b|\bUnder\s*19\b|\bYOUTH\b").expect("valid U19 pattern")
});
static GENDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(Men|Women)\b").expect("valid gender pattern"));
static STRIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bU\s*17\b|\bUnder\s*17\b|\bJUNIOR\b|\bU\s*19\b|\bUnder\s*19\b|\bYOUTH\b|\bMen\b|\bWomen\b|\bIQfoil\b",
    )
    .expect("valid strip pattern")
});

/// Category information carried by a race label such as `"IQfoil U19 Women"`.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceLabel {
    pub gender: Option<Gender>,
    pub age_category: Option<AgeCategory>,
    /// The label with category and class tokens removed.
    pub cleaned: String,
}

impl RaceLabel {
    /// Extracts gender and age category; U19 wins when both age markers appear.
    pub fn parse(label: &str) -> Self {
        let gender = GENDER_PATTERN.captures(label).map(|caps| {
            if caps[1].eq_ignore_ascii_case("women") {
                Gender::Female
            } else {
                Gender::Male
            }
        });

        let age_category = if U19_PATTERN.is_match(label) {
            Some(AgeCategory::U19)
        } else if U17_PATTERN.is_match(label) {
            Some(AgeCategory::U17)
        } else {
            None
        };

        let stripped = STRIP_PATTERN.replace_all(label, "");
        let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        Self {
            gender,
            age_category,
            cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_youth_women() {
        let label = RaceLabel::parse("IQfoil U19 Women - Race 3");
        assert_eq!(label.gender, Some(Gender::Female));
        assert_eq!(label.age_category, Some(AgeCategory::U19));
        assert_eq!(label.cleaned, "- Race 3");
    }

    #[test]
    fn test_parse_spaced_and_spelled_markers() {
        assert_eq!(
            RaceLabel::parse("Under 17 men final").age_category,
            Some(AgeCategory::U17)
        );
        assert_eq!(
            RaceLabel::parse("iqfoil junior MEN").gender,
            Some(Gender::Male)
        );
        assert_eq!(
            RaceLabel::parse("Youth U 17 Medal").age_category,
            Some(AgeCategory::U19)
        );
    }

    #[test]
    fn test_parse_label_without_markers() {
        let label = RaceLabel::parse("Open Fleet Race 1");
        assert_eq!(label.gender, None);
        assert_eq!(label.age_category, None);
        assert_eq!(label.cleaned, "Open Fleet Race 1");
    }

    #[test]
    fn test_women_is_not_read_as_men() {
        assert_eq!(RaceLabel::parse("WOMEN").gender, Some(Gender::Female));
    }
}
