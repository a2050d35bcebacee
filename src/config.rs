use serde::Deserialize;

use crate::error::ConfigError;
use crate::outliers::ZScoreColumn;

/// Version of the configuration layout understood by this build.
pub const CONFIG_VERSION: u32 = 1;

/// Parameters for every pipeline stage.
///
/// Stored as JSON on disk; every field is optional and falls back to the
/// defaults below:
/// ```json
/// {
///   "version": 1,
///   "identity": { "name_similarity_threshold": 90 },
///   "outliers": { "zscore_columns": ["speed", "vmg"], "min_segment_efficiency_pct": 60.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: u32,
    pub identity: IdentityConfig,
    pub join: JoinConfig,
    pub outliers: OutlierConfig,
    pub features: FeatureConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            identity: IdentityConfig::default(),
            join: JoinConfig::default(),
            outliers: OutlierConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Names whose similarity ratio (0-100) exceeds this are merged.
    pub name_similarity_threshold: u8,
    /// Athletes with no known age category become Senior instead of Unknown.
    pub default_age_to_senior: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name_similarity_threshold: 85,
            default_age_to_senior: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Decimal places kept when a location is a coordinate pair.
    pub coordinate_precision: u32,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub zscore_columns: Vec<ZScoreColumn>,
    pub zscore_threshold: f64,
    pub distance_tolerance_m: f64,
    pub total_distance_tolerance_m: f64,
    pub min_course_efficiency_pct: Option<f64>,
    pub min_segment_efficiency_pct: Option<f64>,
    pub wind_direction_tolerance_deg: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            zscore_columns: vec![
                ZScoreColumn::Speed,
                ZScoreColumn::Vmg,
                ZScoreColumn::SegmentEfficiency,
            ],
            zscore_threshold: 3.0,
            distance_tolerance_m: 30.0,
            total_distance_tolerance_m: 30.0,
            min_course_efficiency_pct: None,
            min_segment_efficiency_pct: None,
            wind_direction_tolerance_deg: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Age categories kept in the feature export; empty keeps all.
    pub age_categories: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            age_categories: vec!["U17".to_string(), "U19".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(path, &content)
    }

    fn from_json(path: &str, content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig =
            serde_json::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::Version {
                found: config.version,
                expected: CONFIG_VERSION,
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = PipelineConfig::default();

        assert_eq!(config.identity.name_similarity_threshold, 85);
        assert!(config.identity.default_age_to_senior);
        assert_eq!(config.join.coordinate_precision, 4);
        assert_eq!(config.outliers.zscore_threshold, 3.0);
        assert_eq!(config.outliers.distance_tolerance_m, 30.0);
        assert_eq!(config.outliers.wind_direction_tolerance_deg, 30.0);
        assert!(config.outliers.min_segment_efficiency_pct.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "identity": { "name_similarity_threshold": 90 },
            "outliers": { "zscore_columns": ["speed"], "min_segment_efficiency_pct": 60.0 }
        }"#;
        let config = PipelineConfig::from_json("inline", json).unwrap();

        assert_eq!(config.identity.name_similarity_threshold, 90);
        assert!(config.identity.default_age_to_senior);
        assert_eq!(config.outliers.zscore_columns, vec![ZScoreColumn::Speed]);
        assert_eq!(config.outliers.min_segment_efficiency_pct, Some(60.0));
        assert_eq!(config.outliers.distance_tolerance_m, 30.0);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = PipelineConfig::from_json("inline", r#"{ "version": 7 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Version { found: 7, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load("/nonexistent/regatta_rater.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
