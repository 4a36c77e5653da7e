//! Distance functions used by graph construction.

/// Earth radius in kilometers, as used throughout the simulator.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lon) points, in kilometers.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Plain Euclidean distance between two 2-D points.
pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_is_pythagorean() {
        let d = euclidean((0.0, 0.0), (3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let d = haversine(48.0, 16.0, 48.0, 16.0);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = haversine(48.2, 16.3, 50.1, 14.4);
        let b = haversine(50.1, 14.4, 48.2, 16.3);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Vienna to Berlin, roughly 525 km great-circle.
        let d = haversine(48.2082, 16.3738, 52.5200, 13.4050);
        assert!((d - 525.0).abs() < 20.0, "got {d}");
    }
}
