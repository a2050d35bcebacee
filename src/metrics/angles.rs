//! Compass geometry.
//!
//! Bearings are degrees clockwise from north; vectors use the math
//! convention (x east, y north). Conversions between the two live here and
//! nowhere else.

/// Smallest angle between two bearings, in `[0, 180]`.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Compass bearing in degrees to a math angle in radians.
pub fn bearing_to_math(bearing_deg: f64) -> f64 {
    (90.0 - bearing_deg).to_radians()
}

/// Math angle in radians to a compass bearing in `[0, 360)`.
pub fn math_to_bearing(angle_rad: f64) -> f64 {
    let bearing = (90.0 - angle_rad.to_degrees()).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0
    if bearing >= 360.0 { 0.0 } else { bearing }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub fn from_bearing(magnitude: f64, bearing_deg: f64) -> Self {
        let angle = bearing_to_math(bearing_deg);
        Self {
            x: magnitude * angle.cos(),
            y: magnitude * angle.sin(),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn bearing(&self) -> f64 {
        math_to_bearing(self.y.atan2(self.x))
    }
}

impl std::ops::Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_angle_diff_wraps() {
        assert_eq!(angle_diff(350.0, 10.0), 20.0);
        assert_eq!(angle_diff(10.0, 350.0), 20.0);
        assert_eq!(angle_diff(0.0, 180.0), 180.0);
        assert_eq!(angle_diff(-90.0, 270.0), 0.0);
    }

    #[test]
    fn test_bearing_round_trip() {
        for bearing in [0.0, 45.0, 90.0, 180.0, 270.0, 359.5] {
            let back = math_to_bearing(bearing_to_math(bearing));
            assert!(angle_diff(back, bearing) < EPS, "{bearing} -> {back}");
        }
    }

    #[test]
    fn test_vector_components() {
        let east = Vector::from_bearing(2.0, 90.0);
        assert!((east.x - 2.0).abs() < EPS);
        assert!(east.y.abs() < EPS);

        let north = Vector::from_bearing(1.0, 0.0);
        assert!(north.x.abs() < EPS);
        assert!((north.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_vector_difference() {
        let v = Vector::from_bearing(10.0, 0.0) - Vector::from_bearing(10.0, 90.0);
        assert!((v.magnitude() - 200f64.sqrt()).abs() < EPS);
        assert!((v.bearing() - 315.0).abs() < EPS);
    }
}
