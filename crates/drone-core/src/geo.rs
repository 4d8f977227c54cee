//! Geodesic math on a spherical earth.
//!
//! Bearing, great-circle distance, and destination projection for the
//! leg locator. Standard haversine / forward-azimuth formulas; angles are
//! degrees at the API boundary, radians internally.

use crate::models::LatLng;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Initial bearing from `from` to `to` in degrees, normalized by `atan2`
/// into (-180, 180]. Identical points yield 0.
pub fn bearing(from: LatLng, to: LatLng) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let dlambda = (to.lng - from.lng).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    y.atan2(x).to_degrees()
}

/// Great-circle distance between two points in meters (haversine).
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Project a point `distance_m` meters along `bearing_deg` from `start`.
///
/// The resulting longitude is wrapped into [-180, 180).
pub fn destination(start: LatLng, distance_m: f64, bearing_deg: f64) -> LatLng {
    if distance_m.abs() <= f64::EPSILON {
        return start;
    }

    let lat1 = start.lat.to_radians();
    let lng1 = start.lng.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M; // angular distance

    let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = theta.sin() * delta.sin() * lat1.cos();
    let x = delta.cos() - lat1.sin() * sin_lat2;
    let mut lng2 = lng1 + y.atan2(x);
    lng2 = (lng2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI)
        - std::f64::consts::PI;

    LatLng {
        lat: lat2.to_degrees(),
        lng: lng2.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // San Francisco -> New York City reference leg.
    const SF: LatLng = LatLng {
        lat: 37.7833,
        lng: -122.4167,
    };
    const NYC: LatLng = LatLng {
        lat: 40.7127,
        lng: -74.0059,
    };

    #[test]
    fn bearing_between_known_points() {
        let b = bearing(SF, NYC);
        assert!((b - 69.919445).abs() < 1e-6, "got {b}");
    }

    #[test]
    fn bearing_of_identical_points_is_zero() {
        assert_eq!(bearing(SF, SF), 0.0);
    }

    #[test]
    fn distance_between_known_points() {
        let km = (distance(SF, NYC) / 1000.0).round();
        assert_eq!(km, 4129.0);
    }

    #[test]
    fn distance_of_identical_points_is_zero() {
        assert_eq!(distance(SF, SF), 0.0);
        assert_eq!(distance(NYC, NYC), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(distance(SF, NYC), distance(NYC, SF));

        let a = LatLng::new(-33.8688, 151.2093);
        let b = LatLng::new(51.5074, -0.1278);
        assert_eq!(distance(a, b), distance(b, a));
    }

    #[test]
    fn destination_of_known_leg() {
        let dest = destination(SF, 4_128_553.030413071, 69.919445);
        assert!((dest.lat - NYC.lat).abs() < 1e-4, "lat {}", dest.lat);
        assert!((dest.lng - NYC.lng).abs() < 1e-4, "lng {}", dest.lng);
    }

    #[test]
    fn bearing_and_destination_round_trip() {
        let pairs = [
            (SF, NYC),
            (LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0)),
            (LatLng::new(-45.0, 170.0), LatLng::new(-40.0, -175.0)),
            (LatLng::new(60.0, 5.0), LatLng::new(59.9, 5.1)),
        ];

        for (a, b) in pairs {
            let landed = destination(a, distance(a, b), bearing(a, b));
            let miss_m = distance(landed, b);
            assert!(miss_m < 1.0, "missed {b:?} by {miss_m} m");
        }
    }

    #[test]
    fn destination_of_zero_distance_is_start() {
        assert_eq!(destination(SF, 0.0, 42.0), SF);
    }

    #[test]
    fn degree_radian_conversions_are_exact() {
        assert_eq!(180.0_f64.to_radians(), std::f64::consts::PI);
        assert_eq!(std::f64::consts::PI.to_degrees(), 180.0);
        assert_eq!(45.0_f64.to_radians(), std::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn destination_wraps_longitude_at_antimeridian() {
        // Eastward across the date line: longitude must come back in range.
        let start = LatLng::new(0.0, 179.9);
        let dest = destination(start, 50_000.0, 90.0);
        assert!(dest.lng >= -180.0 && dest.lng < 180.0, "lng {}", dest.lng);
        assert!(dest.lng < 0.0, "expected wrap to the western hemisphere");
    }
}
