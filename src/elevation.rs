//! Per-pixel land elevation from two noise layers and a catalog of Gaussian
//! mountain zones.
//!
//! Land pixels get
//!
//! ```text
//! e = base + amplitude * (w_a * fbm_a + w_b * fbm_b) + sum(zone boosts)
//! ```
//!
//! clamped to [0, 1]. Zones stack additively before the clamp, so peaks
//! where zones overlap flatten at 1.0. Ocean pixels carry the sentinel
//! [`OCEAN_SENTINEL`] and are skipped by everything downstream.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::grid::Grid;
use crate::land_mask::{LandMask, MaskCell};
use crate::projection::{GeoBounds, GeoPoint};
use crate::simplex::SeededNoise;

/// Elevation assigned to every ocean pixel.
pub const OCEAN_SENTINEL: f64 = -1.0;

pub type ElevationField = Grid<f64>;

// =============================================================================
// ELEVATION ZONES
// =============================================================================

/// A named Gaussian bump anchoring terrain to a real mountain range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElevationZone {
    name: String,
    center: GeoPoint,
    boost: f64,
    sigma_lat: f64,
    sigma_lng: f64,
}

impl ElevationZone {
    pub fn new(name: impl Into<String>, center: GeoPoint, boost: f64, sigma_lat: f64, sigma_lng: f64) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| RenderError::InvalidZone { name: name.clone(), reason: reason.to_string() };

        if !(center.lat.is_finite() && center.lng.is_finite()) {
            return Err(invalid("center must be finite"));
        }
        if !boost.is_finite() || boost < 0.0 {
            return Err(invalid("boost must be finite and non-negative"));
        }
        if !(sigma_lat.is_finite() && sigma_lat > 0.0 && sigma_lng.is_finite() && sigma_lng > 0.0) {
            return Err(invalid("standard deviations must be positive"));
        }

        Ok(Self { name, center, boost, sigma_lat, sigma_lng })
    }

    /// Built-in catalog entries, whose values are known to be valid.
    pub(crate) fn fixed(name: &str, lat: f64, lng: f64, boost: f64, sigma_lat: f64, sigma_lng: f64) -> Self {
        debug_assert!(boost >= 0.0 && sigma_lat > 0.0 && sigma_lng > 0.0);
        Self { name: name.to_string(), center: GeoPoint::new(lat, lng), boost, sigma_lat, sigma_lng }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn center(&self) -> GeoPoint { self.center }
    pub fn boost(&self) -> f64 { self.boost }
    pub fn sigma_lat(&self) -> f64 { self.sigma_lat }
    pub fn sigma_lng(&self) -> f64 { self.sigma_lng }

    /// Contribution of this zone at `point`.
    pub fn contribution(&self, point: GeoPoint) -> f64 {
        let dlat = (point.lat - self.center.lat) / self.sigma_lat;
        let dlng = (point.lng - self.center.lng) / self.sigma_lng;
        self.boost * (-0.5 * (dlat * dlat + dlng * dlng)).exp()
    }
}

impl<'de> Deserialize<'de> for ElevationZone {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            center: GeoPoint,
            boost: f64,
            sigma_lat: f64,
            sigma_lng: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        ElevationZone::new(raw.name, raw.center, raw.boost, raw.sigma_lat, raw.sigma_lng)
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// SYNTHESIS PARAMETERS
// =============================================================================

/// Shape of the noise contribution. Noise is sampled in geographic space
/// (degrees times frequency), so terrain does not change with viewport size.
///
/// The defaults read `0.5 + 0.35 * (0.7 * fbm_a + 0.3 * fbm_b)`. The
/// unscaled form `0.85 + 0.7 * fbm_a + 0.3 * fbm_b` is `base: 0.85,
/// noise_amplitude: 1.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationParams {
    /// Elevation of land before noise and zones
    pub base: f64,
    /// Scale applied to the weighted noise sum
    pub noise_amplitude: f64,
    /// Weight of the primary (broad) noise layer
    pub primary_weight: f64,
    /// Weight of the secondary (detail) noise layer
    pub secondary_weight: f64,
    /// Primary layer frequency, cycles per degree
    pub primary_frequency: f64,
    /// Secondary layer frequency, cycles per degree
    pub secondary_frequency: f64,
    pub octaves: u32,
    pub lacunarity: f64,
    pub persistence: f64,
}

impl Default for ElevationParams {
    fn default() -> Self {
        Self {
            base: 0.5,
            noise_amplitude: 0.35,
            primary_weight: 0.7,
            secondary_weight: 0.3,
            primary_frequency: 0.45,
            secondary_frequency: 1.6,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

impl ElevationParams {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.base, self.noise_amplitude, self.primary_weight, self.secondary_weight,
            self.primary_frequency, self.secondary_frequency, self.lacunarity, self.persistence,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::InvalidConfig("elevation parameters must be finite".into()));
        }
        if self.octaves == 0 {
            return Err(RenderError::InvalidConfig("octaves must be at least 1".into()));
        }
        if self.primary_frequency <= 0.0 || self.secondary_frequency <= 0.0 || self.lacunarity <= 0.0 {
            return Err(RenderError::InvalidConfig("noise frequencies and lacunarity must be positive".into()));
        }
        Ok(())
    }
}

// =============================================================================
// SYNTHESIS
// =============================================================================

/// Build the elevation field for `mask`. The mask's size is the raster size.
///
/// Noise is sampled at each pixel centre's longitude and latitude times the
/// layer frequency rather than at pixel coordinates, so a resized raster
/// shows the same terrain at a different resolution.
pub fn synthesize(
    mask: &LandMask,
    noise_a: &SeededNoise,
    noise_b: &SeededNoise,
    zones: &[ElevationZone],
    bounds: &GeoBounds,
    params: &ElevationParams,
) -> ElevationField {
    let width = mask.width;
    let height = mask.height;
    let mut field = ElevationField::new_with(width, height, OCEAN_SENTINEL);

    for (x, y, cell) in mask.iter() {
        if !cell.is_land() {
            continue;
        }
        let point = bounds.pixel_center(x, y, width, height);
        field.set(x, y, land_elevation(point, noise_a, noise_b, zones, params));
    }

    field
}

/// Elevation of a land point, in [0, 1].
pub fn land_elevation(
    point: GeoPoint,
    noise_a: &SeededNoise,
    noise_b: &SeededNoise,
    zones: &[ElevationZone],
    params: &ElevationParams,
) -> f64 {
    let fa = noise_a.fbm(
        point.lng * params.primary_frequency,
        point.lat * params.primary_frequency,
        params.octaves,
        params.lacunarity,
        params.persistence,
    );
    let fb = noise_b.fbm(
        point.lng * params.secondary_frequency,
        point.lat * params.secondary_frequency,
        params.octaves,
        params.lacunarity,
        params.persistence,
    );

    let noise = params.noise_amplitude * (params.primary_weight * fa + params.secondary_weight * fb);
    let relief: f64 = zones.iter().map(|z| z.contribution(point)).sum();

    let e = params.base + noise + relief;
    if e.is_nan() {
        return 0.0;
    }
    e.clamp(0.0, 1.0)
}

/// Min, max and mean of the land elevations, if there is any land.
pub fn land_stats(field: &ElevationField) -> Option<(f64, f64, f64)> {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut sum = 0.0;
    let mut count = 0usize;

    for &e in field.values() {
        if e == OCEAN_SENTINEL {
            continue;
        }
        min = min.min(e);
        max = max.max(e);
        sum += e;
        count += 1;
    }

    (count > 0).then(|| (min, max, sum / count as f64))
}

/// True when the field's ocean pixels are exactly the mask's ocean pixels.
pub fn matches_mask(field: &ElevationField, mask: &LandMask) -> bool {
    field.width == mask.width
        && field.height == mask.height
        && field.values().iter().zip(mask.values()).all(|(&e, cell)| match cell {
            MaskCell::Ocean => e == OCEAN_SENTINEL,
            MaskCell::Land(_) => (0.0..=1.0).contains(&e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::land_mask::{rasterize, LandMassId};

    fn unit_bounds() -> GeoBounds {
        GeoBounds::new(0.0, 1.0, 0.0, 1.0).unwrap()
    }

    fn left_half_mask() -> LandMask {
        let square = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 0.5),
            GeoPoint::new(0.0, 0.5),
        ];
        rasterize(&[(square.as_slice(), LandMassId(1))], &unit_bounds(), 100, 100)
    }

    fn center_zone() -> ElevationZone {
        ElevationZone::new("centre", GeoPoint::new(0.5, 0.25), 0.3, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_zone_validation() {
        assert!(ElevationZone::new("neg", GeoPoint::new(0.0, 0.0), -0.1, 1.0, 1.0).is_err());
        assert!(ElevationZone::new("flat", GeoPoint::new(0.0, 0.0), 0.1, 0.0, 1.0).is_err());
        assert!(ElevationZone::new("ok", GeoPoint::new(0.0, 0.0), 0.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_zone_peak_at_center() {
        let zone = center_zone();
        assert!((zone.contribution(GeoPoint::new(0.5, 0.25)) - 0.3).abs() < 1e-12);
        assert!(zone.contribution(GeoPoint::new(0.9, 0.0)) < 0.3);
    }

    #[test]
    fn test_seed_42_left_half_square_scenario() {
        let mask = left_half_mask();
        let field = synthesize(
            &mask,
            &SeededNoise::new(42),
            &SeededNoise::new(43),
            &[center_zone()],
            &unit_bounds(),
            &ElevationParams::default(),
        );
        assert!(matches_mask(&field, &mask));
        for (x, _, &e) in field.iter() {
            if x >= 50 {
                assert_eq!(e, OCEAN_SENTINEL);
            } else {
                assert!((0.0..=1.0).contains(&e));
            }
        }
        assert!(field.values().iter().all(|e| e.is_finite()));

        let (min, max, _) = land_stats(&field).unwrap();
        assert!(min < max, "noise should vary the land elevation");
    }

    #[test]
    fn test_elevation_decreases_away_from_zone_center() {
        let mask = left_half_mask();
        let bounds = unit_bounds();
        let zone = center_zone();
        let params = ElevationParams { noise_amplitude: 0.0, ..ElevationParams::default() };
        let field = synthesize(&mask, &SeededNoise::new(42), &SeededNoise::new(43), &[zone.clone()], &bounds, &params);

        let mut samples: Vec<(f64, f64)> = field
            .iter()
            .filter(|(_, _, e)| **e != OCEAN_SENTINEL)
            .map(|(x, y, &e)| {
                let p = bounds.pixel_center(x, y, 100, 100);
                let d = ((p.lat - zone.center().lat) / zone.sigma_lat()).hypot((p.lng - zone.center().lng) / zone.sigma_lng());
                (d, e)
            })
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        assert_eq!(samples.len(), 50 * 100);
        for pair in samples.windows(2) {
            assert!(pair[0].1 >= pair[1].1 - 1e-12, "{:?} then {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_overlapping_zones_stack_then_clamp() {
        let a = ElevationZone::new("a", GeoPoint::new(0.0, 0.0), 0.4, 1.0, 1.0).unwrap();
        let b = ElevationZone::new("b", GeoPoint::new(0.0, 0.0), 0.4, 1.0, 1.0).unwrap();
        let params = ElevationParams { noise_amplitude: 0.0, ..ElevationParams::default() };
        let noise = SeededNoise::new(1);
        let single = land_elevation(GeoPoint::new(0.0, 0.0), &noise, &noise, &[a.clone()], &params);
        let stacked = land_elevation(GeoPoint::new(0.0, 0.0), &noise, &noise, &[a, b], &params);
        assert!((single - 0.9).abs() < 1e-12);
        assert_eq!(stacked, 1.0);
    }

    #[test]
    fn test_land_stats() {
        let mut field = ElevationField::new_with(2, 2, OCEAN_SENTINEL);
        assert!(land_stats(&field).is_none());
        field.set(0, 0, 0.2);
        field.set(1, 1, 0.6);
        let (min, max, mean) = land_stats(&field).unwrap();
        assert_eq!((min, max), (0.2, 0.6));
        assert!((mean - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_params_validation() {
        assert!(ElevationParams::default().validate().is_ok());
        assert!(ElevationParams { octaves: 0, ..ElevationParams::default() }.validate().is_err());
        assert!(ElevationParams { primary_frequency: -1.0, ..ElevationParams::default() }.validate().is_err());
    }
}
