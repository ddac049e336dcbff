//! Geodesic distance between two points on the WGS84 ellipsoid.
//!
//! The default metric is Vincenty's inverse formula. Vincenty does not
//! converge for nearly antipodal points; those pairs fall back to the
//! haversine great-circle distance and the fallback is logged.

use geo::{Distance, Geodesic, Haversine};
use parkfinder_core::models::GeoPoint;

pub use parkfinder_core::config::DistanceMetric;

/// WGS84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (m)
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

pub const DEFAULT_MAX_ITERATIONS: usize = 200;
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Distance calculator carrying the selected metric and Vincenty limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEngine {
    metric: DistanceMetric,
    max_iterations: usize,
    tolerance: f64,
}

impl Default for DistanceEngine {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}

impl DistanceEngine {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, max_iterations: DEFAULT_MAX_ITERATIONS, tolerance: DEFAULT_TOLERANCE }
    }

    /// Override the Vincenty iteration cap (at least one iteration is run)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Distance in meters. Zero for identical points, never negative.
    pub fn distance_meters(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        if a == b {
            return 0.0;
        }

        let meters = match self.metric {
            DistanceMetric::Vincenty => {
                match vincenty_inverse(a, b, self.max_iterations, self.tolerance) {
                    Some(meters) => meters,
                    None => {
                        tracing::warn!(
                            from = %a,
                            to = %b,
                            "Vincenty did not converge, falling back to haversine"
                        );
                        haversine(a, b)
                    }
                }
            }
            DistanceMetric::Karney => Geodesic.distance(a.to_geo_point(), b.to_geo_point()),
            DistanceMetric::Haversine => haversine(a, b),
        };

        meters.max(0.0)
    }
}

/// Distance in meters with the default engine (Vincenty, haversine fallback)
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    DistanceEngine::default().distance_meters(a, b)
}

fn haversine(a: &GeoPoint, b: &GeoPoint) -> f64 {
    Haversine.distance(a.to_geo_point(), b.to_geo_point())
}

/// Vincenty inverse formula. `None` when lambda fails to converge within
/// `max_iterations` or runs away past pi (nearly antipodal points).
fn vincenty_inverse(
    a: &GeoPoint,
    b: &GeoPoint,
    max_iterations: usize,
    tolerance: f64,
) -> Option<f64> {
    let l = (b.longitude - a.longitude).to_radians();
    let u1 = ((1.0 - WGS84_F) * a.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * b.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;

    let mut sin_sigma = 0.0;
    let mut cos_sigma = 0.0;
    let mut sigma = 0.0;
    let mut cos_sq_alpha = 0.0;
    let mut cos_2sigma_m = 0.0;

    for _ in 0..max_iterations {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        sin_sigma = (t1 * t1 + t2 * t2).sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos_sq_alpha = 0
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };

        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if !lambda.is_finite() || lambda.abs() > std::f64::consts::PI {
            return None;
        }
        if (lambda - previous).abs() <= tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        return None;
    }

    let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    let meters = WGS84_B * big_a * (sigma - delta_sigma);
    meters.is_finite().then_some(meters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_flinders_peak_to_buninyong() {
        // Reference pair from Vincenty's 1975 paper
        let flinders = point(-(37.0 + 57.0 / 60.0 + 3.72030 / 3600.0), 144.0 + 25.0 / 60.0 + 29.52440 / 3600.0);
        let buninyong = point(-(37.0 + 39.0 / 60.0 + 10.15610 / 3600.0), 143.0 + 55.0 / 60.0 + 35.38390 / 3600.0);

        let d = distance_meters(&flinders, &buninyong);
        assert!((d - 54_972.271).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = point(48.4284, -123.3656);
        assert_eq!(distance_meters(&p, &p), 0.0);
        for metric in [DistanceMetric::Vincenty, DistanceMetric::Karney, DistanceMetric::Haversine] {
            assert_eq!(DistanceEngine::new(metric).distance_meters(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_antipodal_falls_back_to_haversine() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 180.0);

        let d = distance_meters(&a, &b);
        assert!(d.is_finite());
        assert!((19_900_000.0..20_100_000.0).contains(&d), "got {d}");
        assert_eq!(d, haversine(&a, &b));
    }

    #[test]
    fn test_iteration_cap_forces_fallback() {
        let a = point(48.4284, -123.3656);
        let b = point(49.2827, -123.1207);
        let capped = DistanceEngine::default().with_max_iterations(1).distance_meters(&a, &b);
        assert_eq!(capped, haversine(&a, &b));
    }

    #[test]
    fn test_metrics_agree_at_city_scale() {
        let victoria = point(48.4284, -123.3656);
        let vancouver = point(49.2827, -123.1207);

        let vincenty = DistanceEngine::new(DistanceMetric::Vincenty).distance_meters(&victoria, &vancouver);
        let karney = DistanceEngine::new(DistanceMetric::Karney).distance_meters(&victoria, &vancouver);
        let haversine = DistanceEngine::new(DistanceMetric::Haversine).distance_meters(&victoria, &vancouver);

        assert!((vincenty - karney).abs() < 0.001, "vincenty {vincenty} karney {karney}");
        // spherical model is within half a percent
        assert!((vincenty - haversine).abs() / vincenty < 0.005);
    }

    #[test]
    fn test_short_distance_across_a_park() {
        let a = point(48.4284, -123.3656);
        let b = point(48.4300, -123.3656);
        let d = distance_meters(&a, &b);
        // 0.0016 degrees of latitude at 48N is about 178 m
        assert!((d - 177.9).abs() < 1.0, "got {d}");
    }

    fn any_point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| point(lat, lon))
    }

    proptest! {
        #[test]
        fn prop_identity(p in any_point()) {
            prop_assert_eq!(distance_meters(&p, &p), 0.0);
        }

        #[test]
        fn prop_symmetric_and_non_negative(a in any_point(), b in any_point()) {
            let ab = distance_meters(&a, &b);
            let ba = distance_meters(&b, &a);
            prop_assert!(ab >= 0.0 && ab.is_finite());
            prop_assert!(ba >= 0.0 && ba.is_finite());
            let scale = ab.max(ba).max(1.0);
            prop_assert!((ab - ba).abs() / scale <= 1e-6, "ab {} ba {}", ab, ba);
        }

        #[test]
        fn prop_bounded_by_half_circumference(a in any_point(), b in any_point()) {
            prop_assert!(distance_meters(&a, &b) <= 20_040_000.0);
        }
    }
}
