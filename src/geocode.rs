//! Place string → jittered coordinate, via the location registry.

use rand::Rng;
use serde::Serialize;

use crate::locations::LocationRegistry;

/// Max absolute offset applied on each axis, in degrees.
pub const DEFAULT_JITTER_DEG: f64 = 0.003;
/// Upper bound accepted by [`Geocoder::with_jitter`].
pub const MAX_JITTER_DEG: f64 = 1.0;

/// Resolved marker position plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    /// Registry key that matched; `None` means the capital fallback was used.
    pub matched: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct Geocoder {
    registry: LocationRegistry,
    jitter: f64,
}

impl Geocoder {
    pub fn new(registry: LocationRegistry) -> Self {
        Self {
            registry,
            jitter: DEFAULT_JITTER_DEG,
        }
    }

    /// Non-finite values disable jitter; the rest is clamped to `0..=MAX_JITTER_DEG`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() {
            jitter.abs().min(MAX_JITTER_DEG)
        } else {
            0.0
        };
        self
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// First-match-wins lookup, then independent uniform jitter on both axes.
    pub fn locate<R: Rng>(&self, place: &str, rng: &mut R) -> GeoPoint {
        let (base, matched) = match self.registry.find_first(place) {
            Some(e) => (*e, Some(e.name)),
            None => (self.registry.fallback(), None),
        };

        let (dlat, dlon) = if self.jitter > 0.0 {
            (
                rng.random_range(-self.jitter..=self.jitter),
                rng.random_range(-self.jitter..=self.jitter),
            )
        } else {
            (0.0, 0.0)
        };

        GeoPoint {
            lat: base.lat + dlat,
            lon: base.lon + dlon,
            matched,
        }
    }
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new(LocationRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::CAPITAL;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn dakar_plateau_resolves_to_first_entry() {
        let g = Geocoder::default().with_jitter(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let p = g.locate("Dakar Plateau", &mut rng);
        assert_eq!(p.matched, Some("Dakar"));
        assert_eq!((p.lat, p.lon), (14.7167, -17.4677));
    }

    #[test]
    fn unknown_place_falls_back_to_capital() {
        let g = Geocoder::default().with_jitter(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let p = g.locate("Quelque part", &mut rng);
        assert_eq!(p.matched, None);
        assert_eq!((p.lat, p.lon), (CAPITAL.lat, CAPITAL.lon));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let g = Geocoder::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let p = g.locate("ucad", &mut rng);
            assert_eq!(p.matched, Some("UCAD"));
            assert!((p.lat - 14.6928).abs() <= DEFAULT_JITTER_DEG + 1e-12);
            assert!((p.lon - -17.4616).abs() <= DEFAULT_JITTER_DEG + 1e-12);
        }
    }

    #[test]
    fn out_of_range_jitter_is_clamped_and_never_panics() {
        let mut rng = StdRng::seed_from_u64(9);
        for (input, expected) in [
            (f64::INFINITY, 0.0),
            (f64::NEG_INFINITY, 0.0),
            (f64::NAN, 0.0),
            (1e300, MAX_JITTER_DEG),
            (-0.002, 0.002),
        ] {
            let g = Geocoder::default().with_jitter(input);
            assert_eq!(g.jitter(), expected, "input {input}");
            let p = g.locate("Touba", &mut rng);
            assert!(p.lat.is_finite() && p.lon.is_finite());
        }
    }

    #[test]
    fn same_place_gets_distinct_points() {
        let g = Geocoder::default();
        let mut rng = StdRng::seed_from_u64(7);
        let a = g.locate("Touba", &mut rng);
        let b = g.locate("Touba", &mut rng);
        assert_ne!((a.lat, a.lon), (b.lat, b.lon));
    }
}
