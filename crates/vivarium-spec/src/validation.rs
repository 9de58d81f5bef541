//! Numeric sanitizing helpers shared by request and config types.
//!
//! Nothing here returns an error. Surface parameters arrive every frame from
//! a scene layer and are clamped into range rather than rejected.

/// Clamp a value into `[min, max]`, replacing non-finite input with `fallback`.
///
/// # Example
/// ```
/// use vivarium_spec::validation::clamp_finite;
///
/// assert_eq!(clamp_finite(2.5, 0.0, 1.0, 0.5), 1.0);
/// assert_eq!(clamp_finite(f64::NAN, 0.0, 1.0, 0.5), 0.5);
/// ```
#[inline]
pub fn clamp_finite(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Clamp a value into `[0, 1]`, replacing non-finite input with `fallback`.
#[inline]
pub fn clamp_unit(value: f64, fallback: f64) -> f64 {
    clamp_finite(value, 0.0, 1.0, fallback)
}

/// Replace non-finite values with `fallback`, leaving finite ones untouched.
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Whether both coordinates of a point are finite.
#[inline]
pub fn is_finite_point(point: [f64; 2]) -> bool {
    point[0].is_finite() && point[1].is_finite()
}

/// Clamp a dimension to `[1, max]`.
#[inline]
pub fn clamp_dimension(value: u32, max: u32) -> u32 {
    value.clamp(1, max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_finite() {
        assert_eq!(clamp_finite(-3.0, -1.0, 1.0, 0.0), -1.0);
        assert_eq!(clamp_finite(0.25, -1.0, 1.0, 0.0), 0.25);
        assert_eq!(clamp_finite(f64::INFINITY, -1.0, 1.0, 0.0), 0.0);
        assert_eq!(clamp_finite(f64::NEG_INFINITY, -1.0, 1.0, 0.3), 0.3);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.5, 0.0), 1.0);
        assert_eq!(clamp_unit(f64::NAN, 0.2), 0.2);
    }

    #[test]
    fn test_finite_point() {
        assert!(is_finite_point([1.0, -4.0]));
        assert!(!is_finite_point([f64::NAN, 0.0]));
    }

    #[test]
    fn test_clamp_dimension() {
        assert_eq!(clamp_dimension(0, 1920), 1);
        assert_eq!(clamp_dimension(8000, 1920), 1920);
        assert_eq!(clamp_dimension(640, 1920), 640);
        assert_eq!(clamp_dimension(5, 0), 1);
    }
}
