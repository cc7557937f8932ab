/// Ease-in-out cubic: accelerates through the first half and decelerates
/// through the second. `t` is clamped to `[0, 1]`.
#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 { 4.0 * t * t * t } else { 1.0 - (-2.0f64).mul_add(t, 2.0).powi(3) / 2.0 }
}

/// Signed turn from `source` to `target` along the shorter arc, in
/// `(-180, 180]` degrees.
#[must_use]
pub fn shortest_turn(source: f64, target: f64) -> f64 {
    let diff = (target - source + 360.0).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Heading `fraction` of the way from `source` to `target` along the shorter
/// arc, normalized into `[0, 360)`.
#[must_use]
pub fn interpolate_heading(source: f64, target: f64, fraction: f64) -> f64 {
    shortest_turn(source, target).mul_add(fraction, source).rem_euclid(360.0)
}

#[must_use]
pub fn lerp(from: f64, to: f64, fraction: f64) -> f64 {
    (to - from).mul_add(fraction, from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_fixed_points() {
        assert!(ease_in_out_cubic(0.0).abs() < f64::EPSILON);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut previous = ease_in_out_cubic(0.0);
        for i in 1..=1000 {
            let value = ease_in_out_cubic(f64::from(i) / 1000.0);
            assert!(value >= previous, "ease dipped at {i}");
            previous = value;
        }
    }

    #[test]
    fn ease_is_clamped() {
        assert!(ease_in_out_cubic(-1.0).abs() < f64::EPSILON);
        assert!((ease_in_out_cubic(2.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn turns() {
        assert!((shortest_turn(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((shortest_turn(10.0, 350.0) + 20.0).abs() < 1e-9);
        assert!((shortest_turn(0.0, 180.0) - 180.0).abs() < 1e-9);
        assert!((shortest_turn(90.0, 90.0)).abs() < 1e-9);
    }

    #[test]
    fn wraps_through_north() {
        for i in 0..=100 {
            let heading = interpolate_heading(350.0, 10.0, f64::from(i) / 100.0);
            assert!(heading >= 350.0 || heading <= 10.0, "heading {heading} swept the long way");
        }
    }

    #[test]
    fn lerps() {
        assert!((lerp(32.0, 33.0, 0.25) - 32.25).abs() < 1e-12);
    }
}
