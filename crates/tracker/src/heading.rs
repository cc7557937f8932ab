use telemetry::Coordinate;

/// Compass bearing in degrees, `[0, 360)`, of the move from `prev` to `curr`.
///
/// This is a planar approximation: the bearing is the angle of the raw
/// `(Δlng, Δlat)` degree vector measured clockwise from north, not a
/// great-circle bearing. Longitude degrees are not scaled by latitude, so the
/// result drifts from the true bearing away from the equator; at the scale of
/// a yard or campus the difference is negligible.
///
/// A vehicle that has not moved reports `0`. Callers that want to keep the
/// previous heading for a stationary vehicle must do so themselves.
#[must_use]
pub fn estimate_heading(prev: Coordinate, curr: Coordinate) -> f64 {
    if prev == curr {
        return 0.0;
    }

    let d_lat = curr.lat - prev.lat;
    let d_lng = curr.lng - prev.lng;
    let degrees = d_lng.atan2(d_lat).to_degrees();

    (degrees + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Coordinate = Coordinate::new(32.219143, -7.936173);

    fn offset(d_lat: f64, d_lng: f64) -> Coordinate {
        Coordinate::new(ORIGIN.lat + d_lat, ORIGIN.lng + d_lng)
    }

    #[test]
    fn stationary() {
        assert_eq!(estimate_heading(ORIGIN, ORIGIN), 0.0);
    }

    #[test]
    fn cardinal_points() {
        assert!((estimate_heading(ORIGIN, offset(0.001, 0.0)) - 0.0).abs() < 1e-9);
        assert!((estimate_heading(ORIGIN, offset(0.0, 0.001)) - 90.0).abs() < 1e-9);
        assert!((estimate_heading(ORIGIN, offset(-0.001, 0.0)) - 180.0).abs() < 1e-9);
        assert!((estimate_heading(ORIGIN, offset(0.0, -0.001)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn north_east() {
        let heading = estimate_heading(ORIGIN, Coordinate::new(32.219243, -7.935573));
        assert!(heading > 0.0 && heading < 90.0, "heading {heading}");
    }

    #[test]
    fn always_in_range() {
        for (d_lat, d_lng) in [(1e-12, -1e-9), (-0.5, -0.5), (0.5, -1e-15), (-1e-15, 0.0)] {
            let heading = estimate_heading(ORIGIN, offset(d_lat, d_lng));
            assert!((0.0..360.0).contains(&heading), "heading {heading}");
        }
    }
}
