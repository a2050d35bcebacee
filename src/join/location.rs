use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*\()?\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*\)?\s*$")
        .expect("valid coordinate pattern")
});

/// Normalized form of a location used to match segments with observations.
///
/// Coordinate pairs, bare (`"43.1234, 5.6789"`) or wrapped in a label
/// (`"Marseille (43.1234, 5.6789)"`), are rounded to a fixed number of
/// decimals so that the same venue written twice compares equal. Anything
/// else is treated as a place name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationKey {
    Coordinates(String),
    Name(String),
}

impl LocationKey {
    /// Returns `None` for blank input.
    pub fn normalize(raw: &str, precision: u32) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some((lat, lon)) = parse_coordinates(trimmed) {
            let p = precision as usize;
            return Some(Self::Coordinates(format!(
                "{},{}",
                format_coord(lat, p),
                format_coord(lon, p)
            )));
        }
        let name = trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Some(Self::Name(name))
    }

    /// The `(lat, lon)` pair for coordinate keys.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match self {
            Self::Coordinates(key) => {
                let (lat, lon) = key.split_once(',')?;
                Some((lat.parse().ok()?, lon.parse().ok()?))
            }
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates(key) | Self::Name(key) => f.write_str(key),
        }
    }
}

/// Latitude/longitude pair within valid ranges.
pub fn parse_coordinates(raw: &str) -> Option<(f64, f64)> {
    let caps = COORDINATES.captures(raw.trim())?;
    let lat: f64 = caps[1].parse().ok()?;
    let lon: f64 = caps[2].parse().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some((lat, lon))
}

fn format_coord(value: f64, precision: usize) -> String {
    let formatted = format!("{value:.precision$}");
    // "-0.0000" and "0.0000" must collide
    if formatted.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        formatted.trim_start_matches('-').to_string()
    } else {
        formatted
    }
}
