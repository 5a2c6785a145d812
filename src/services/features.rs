//! Geospatial-temporal feature engine
//!
//! Derives the feature vector the anomaly classifier scores from the current
//! scan and the product's most recent authentic scan. Pure computation,
//! no I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Mean earth radius in kilometers (IUGG)
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A scan reduced to what feature derivation needs.
#[derive(Debug, Clone, Copy)]
pub struct ScanPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureVector {
    pub latitude: f64,
    pub longitude: f64,
    pub time_diff_seconds: f64,
    pub distance_km: f64,
    pub speed_kmh: f64,
}

/// Compute the feature vector for a scan against the previous authentic scan.
///
/// With no previous scan the temporal/spatial deltas are zero, so a
/// product's first scan can never look anomalous on movement alone.
pub fn compute(current: &ScanPoint, previous: Option<&ScanPoint>) -> FeatureVector {
    let mut features = FeatureVector {
        latitude: current.latitude,
        longitude: current.longitude,
        time_diff_seconds: 0.0,
        distance_km: 0.0,
        speed_kmh: 0.0,
    };

    if let Some(prev) = previous {
        // Non-negative by construction: `prev` is the most recent authentic
        // scan at the time of this request.
        let time_diff = (current.timestamp - prev.timestamp)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;

        let distance = haversine_km(
            prev.latitude,
            prev.longitude,
            current.latitude,
            current.longitude,
        );

        let speed = if time_diff > 0.0 {
            distance / (time_diff / 3600.0)
        } else {
            0.0
        };

        features.time_diff_seconds = time_diff;
        features.distance_km = distance;
        features.speed_kmh = speed;
    }

    features
}

/// Great-circle distance between two coordinate pairs, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn point(lat: f64, lon: f64, ts: DateTime<Utc>) -> ScanPoint {
        ScanPoint {
            latitude: lat,
            longitude: lon,
            timestamp: ts,
        }
    }

    #[test]
    fn test_first_scan_baseline_is_zero() {
        let now = Utc::now();
        let features = compute(&point(10.0, 10.0, now), None);

        assert_eq!(features.time_diff_seconds, 0.0);
        assert_eq!(features.distance_km, 0.0);
        assert_eq!(features.speed_kmh, 0.0);
        assert_eq!(features.latitude, 10.0);
        assert_eq!(features.longitude, 10.0);
    }

    #[test]
    fn test_haversine_one_degree_longitude_at_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.2).abs() < 0.5, "distance was {}", d);
    }

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine_km(45.0, 45.0, 45.0, 45.0), 0.0);
    }

    #[test]
    fn test_speed_zero_when_no_time_elapsed() {
        let now = Utc::now();
        let prev = point(0.0, 0.0, now);
        let features = compute(&point(0.0, 10.0, now), Some(&prev));

        assert!(features.distance_km > 0.0);
        assert_eq!(features.time_diff_seconds, 0.0);
        assert_eq!(features.speed_kmh, 0.0);
    }

    #[test]
    fn test_implied_speed_for_large_jump() {
        // ~2000 km apart (roughly 18 degrees of longitude at the equator),
        // ten minutes apart: the implied speed is far past anything real.
        let now = Utc::now();
        let prev = point(0.0, 0.0, now - Duration::minutes(10));
        let features = compute(&point(0.0, 18.0, now), Some(&prev));

        assert!(features.distance_km > 1900.0);
        assert!((features.time_diff_seconds - 600.0).abs() < 1.0);
        assert!(features.speed_kmh > 900.0, "speed was {}", features.speed_kmh);
    }

    #[test]
    fn test_speed_matches_distance_over_hours() {
        let now = Utc::now();
        let prev = point(0.0, 0.0, now - Duration::hours(2));
        let features = compute(&point(0.0, 1.0, now), Some(&prev));

        let expected = features.distance_km / 2.0;
        assert!((features.speed_kmh - expected).abs() < 1e-9);
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        // Previous scan recorded "after" the current one (clock skew) must
        // not produce a negative delta or a negative speed.
        let now = Utc::now();
        let prev = point(0.0, 0.0, now + Duration::seconds(30));
        let features = compute(&point(0.0, 1.0, now), Some(&prev));

        assert_eq!(features.time_diff_seconds, 0.0);
        assert_eq!(features.speed_kmh, 0.0);
    }
}
