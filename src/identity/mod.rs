//! Athlete identity resolution.
//!
//! Near-duplicate spellings are unified into one canonical name, then gender
//! and age category are filled from the race label when it states them, or
//! inferred otherwise. A failing name knowledge base never stops the run:
//! inferred values fall back to Unknown.

pub mod age;
pub mod gender;
pub mod label;
pub mod unify;

pub use age::{AthleteKey, infer_age_category};
pub use gender::{infer_gender, split_full_name, split_naive};
pub use label::RaceLabel;
pub use unify::{normalize_name, similarity_ratio, unify_names};

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::config::IdentityConfig;
use crate::model::{AgeCategory, Gender, ProcessedRow};
use crate::schema::{Column, ColumnSet};
use crate::services::name_lookup::NameLookup;

#[derive(Debug, Default, Clone, Serialize)]
pub struct IdentityReport {
    pub skipped: bool,
    pub distinct_names: usize,
    pub canonical_names: usize,
    pub lookup_failed: bool,
    pub unknown_gender: usize,
    pub unknown_age: usize,
}

/// Resolves names, gender and age category for every row in place.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn resolve_identities(
    rows: &mut [ProcessedRow],
    lookup: Option<&dyn NameLookup>,
    config: &IdentityConfig,
    columns: &ColumnSet,
) -> IdentityReport {
    let mut report = IdentityReport::default();
    if !columns.ensure("identity", &[Column::AthleteName]) {
        report.skipped = true;
        return report;
    }

    let mapping = unify_names(
        rows.iter().map(|r| r.segment.athlete_name.as_str()),
        config.name_similarity_threshold,
    );
    report.distinct_names = mapping.len();
    report.canonical_names = mapping.values().collect::<BTreeSet<_>>().len();

    // Explicit categories from the race label come first.
    let mut labels = Vec::with_capacity(rows.len());
    for row in rows.iter_mut() {
        let raw = row.segment.athlete_name.as_str();
        let canonical = mapping
            .get(raw)
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| raw.trim().to_string());
        row.identity.raw_name = raw.to_string();
        row.identity.canonical_name = canonical;

        let label = row.segment.race_label.as_deref().map(RaceLabel::parse);
        if let Some(label) = &label {
            row.segment.race_label = Some(label.cleaned.clone()).filter(|s| !s.is_empty());
        }
        labels.push(label);
    }

    // Lookups happen once per canonical name.
    let mut inferred: HashMap<String, (Gender, (String, String))> = HashMap::new();
    if let Some(lookup) = lookup {
        for row in rows.iter() {
            let name = &row.identity.canonical_name;
            if inferred.contains_key(name) {
                continue;
            }
            let result = infer_gender(name, lookup)
                .and_then(|g| split_full_name(name, lookup).map(|split| (g, split)));
            match result {
                Ok(value) => {
                    inferred.insert(name.clone(), value);
                }
                Err(e) => {
                    warn!(error = %e, "Name lookup failed, inferred gender and age set to Unknown");
                    report.lookup_failed = true;
                    inferred.clear();
                    break;
                }
            }
        }
    }

    let mut age_by_key: HashMap<AthleteKey, AgeCategory> = HashMap::new();
    for (row, label) in rows.iter().zip(&labels) {
        if let Some(category) = label.as_ref().and_then(|l| l.age_category) {
            age_by_key
                .entry(athlete_key(row))
                .or_insert(category);
        }
    }

    for (row, label) in rows.iter_mut().zip(labels) {
        let explicit_gender = label.as_ref().and_then(|l| l.gender);
        let explicit_age = label.as_ref().and_then(|l| l.age_category);
        let name = row.identity.canonical_name.clone();

        let (gender, (first, last)) = match inferred.get(&name) {
            Some((g, split)) => (*g, split.clone()),
            None => (Gender::Unknown, split_naive(&name)),
        };
        row.identity.gender = explicit_gender.unwrap_or(gender);
        row.identity.first_name = first;
        row.identity.last_name = last;

        row.identity.age_category = match explicit_age {
            Some(category) => category,
            None if report.lookup_failed => AgeCategory::Unknown,
            None => infer_age_category(
                &athlete_key(row),
                &age_by_key,
                config.default_age_to_senior,
            ),
        };

        if row.identity.gender == Gender::Unknown {
            report.unknown_gender += 1;
        }
        if row.identity.age_category == AgeCategory::Unknown {
            report.unknown_age += 1;
        }
    }

    info!(
        distinct_names = report.distinct_names,
        canonical_names = report.canonical_names,
        unknown_gender = report.unknown_gender,
        unknown_age = report.unknown_age,
        "Identities resolved"
    );
    report
}

fn athlete_key(row: &ProcessedRow) -> AthleteKey {
    (
        row.segment.serial_number.clone(),
        row.identity.canonical_name.clone(),
    )
}
