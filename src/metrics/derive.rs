use crate::model::{DerivedMetrics, PointOfSail, ProcessedRow};

use super::MS_TO_KNOTS;
use super::angles::{Vector, angle_diff};

/// Keeps only finite results so NaN/inf never reach the output.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Recomputes every metric of a row from its segment and matched weather.
///
/// Nothing is computed when the duration is zero or unknown.
pub fn derive_metrics(row: &ProcessedRow) -> DerivedMetrics {
    let segment = &row.segment;
    let Some(duration) = segment
        .window()
        .map(|w| w.duration_seconds())
        .filter(|d| *d > 0.0)
    else {
        return DerivedMetrics::default();
    };

    let speed = segment
        .distance_traveled_m
        .and_then(|d| finite(d / duration * MS_TO_KNOTS));
    let vmc = segment
        .ideal_length_m
        .and_then(|d| finite(d / duration * MS_TO_KNOTS));
    let heading = segment.heading_deg.filter(|h| h.is_finite());

    let wind_speed = row
        .weather
        .as_ref()
        .and_then(|w| w.wind_speed_kts)
        .filter(|v| v.is_finite());
    let wind_dir = row
        .weather
        .as_ref()
        .and_then(|w| w.wind_direction_deg)
        .filter(|v| v.is_finite());

    let mut metrics = DerivedMetrics {
        duration_s: Some(duration),
        speed_kts: speed,
        vmc_kts: vmc,
        ..Default::default()
    };

    if let (Some(speed), Some(heading), Some(ws), Some(wd)) = (speed, heading, wind_speed, wind_dir)
    {
        let apparent = Vector::from_bearing(ws, wd) - Vector::from_bearing(speed, heading);
        metrics.apparent_wind_speed_kts = finite(apparent.magnitude());
        metrics.apparent_wind_direction_deg = finite(apparent.bearing());
    }

    if let (Some(speed), Some(vmc), Some(heading)) = (speed, vmc, heading) {
        let current = Vector::from_bearing(speed, heading) - Vector::from_bearing(vmc, heading);
        let magnitude = current.magnitude();
        metrics.current_speed_kts = finite(magnitude);
        if magnitude > f64::EPSILON {
            metrics.current_direction_deg = finite(current.bearing());
        }
    }

    if let (Some(heading), Some(wd)) = (heading, wind_dir) {
        let angle = angle_diff(heading, wd);
        metrics.wind_heading_angle_deg = Some(angle);
        metrics.vmg_kts = speed.and_then(|s| finite(s * angle.to_radians().cos()));

        let point = if angle < 90.0 {
            PointOfSail::Upwind
        } else {
            PointOfSail::Downwind
        };
        metrics.point_of_sail = Some(point);
        match point {
            PointOfSail::Upwind => metrics.upwind_efficiency_pct = segment.segment_efficiency_pct,
            PointOfSail::Downwind => {
                metrics.downwind_efficiency_pct = segment.segment_efficiency_pct
            }
        }
    }

    metrics.efficiency_per_wind_knot = match (segment.segment_efficiency_pct, wind_speed) {
        (Some(eff), Some(ws)) if ws > 0.0 => finite(eff / ws),
        _ => None,
    };

    metrics
}
