//! Equirectangular mapping between geographic coordinates and raster pixels.
//!
//! Latitude grows upward while pixel rows grow downward, so `max_lat` maps to
//! row 0. Both axes are independent linear interpolations, which makes
//! `to_geo` the exact inverse of `to_pixel` up to floating point rounding.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// A geographic coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar distance in degrees, treating (lng, lat) as (x, y).
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }

    pub fn approx_eq(&self, other: &GeoPoint, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance && (self.lng - other.lng).abs() <= tolerance
    }
}

/// The geographic rectangle mapped onto the raster. Fixed for the lifetime
/// of a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoBounds {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Result<Self> {
        let all_finite = [min_lat, max_lat, min_lng, max_lng].iter().all(|v| v.is_finite());
        if !all_finite {
            return Err(RenderError::InvalidBounds("coordinates must be finite".into()));
        }
        if max_lat <= min_lat {
            return Err(RenderError::InvalidBounds(format!(
                "max_lat {max_lat} must exceed min_lat {min_lat}"
            )));
        }
        if max_lng <= min_lng {
            return Err(RenderError::InvalidBounds(format!(
                "max_lng {max_lng} must exceed min_lng {min_lng}"
            )));
        }
        Ok(Self { min_lat, max_lat, min_lng, max_lng })
    }

    /// Built-in extents, known to be well ordered.
    pub(crate) const fn fixed(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self { min_lat, max_lat, min_lng, max_lng }
    }

    pub fn min_lat(&self) -> f64 { self.min_lat }
    pub fn max_lat(&self) -> f64 { self.max_lat }
    pub fn min_lng(&self) -> f64 { self.min_lng }
    pub fn max_lng(&self) -> f64 { self.max_lng }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    /// Geographic coordinate to continuous pixel coordinate.
    pub fn to_pixel(&self, point: GeoPoint, width: f64, height: f64) -> (f64, f64) {
        let x = (point.lng - self.min_lng) / self.lng_span() * width;
        let y = (self.max_lat - point.lat) / self.lat_span() * height;
        (x, y)
    }

    /// Continuous pixel coordinate back to geography.
    pub fn to_geo(&self, x: f64, y: f64, width: f64, height: f64) -> GeoPoint {
        let lng = self.min_lng + x / width * self.lng_span();
        let lat = self.max_lat - y / height * self.lat_span();
        GeoPoint::new(lat, lng)
    }

    /// Geography at the centre of pixel (x, y).
    pub fn pixel_center(&self, x: usize, y: usize, width: usize, height: usize) -> GeoPoint {
        self.to_geo(x as f64 + 0.5, y as f64 + 0.5, width as f64, height as f64)
    }
}

impl<'de> Deserialize<'de> for GeoBounds {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            min_lat: f64,
            max_lat: f64,
            min_lng: f64,
            max_lng: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoBounds::new(raw.min_lat, raw.max_lat, raw.min_lng, raw.max_lng)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn isles() -> GeoBounds {
        GeoBounds::new(49.8, 59.0, -10.8, 2.0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(GeoBounds::new(10.0, 5.0, 0.0, 1.0).is_err());
        assert!(GeoBounds::new(0.0, 1.0, 3.0, 3.0).is_err());
        assert!(GeoBounds::new(0.0, f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_corners_map_to_raster_corners() {
        let bounds = isles();
        let (x, y) = bounds.to_pixel(GeoPoint::new(59.0, -10.8), 400.0, 300.0);
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
        let (x, y) = bounds.to_pixel(GeoPoint::new(49.8, 2.0), 400.0, 300.0);
        assert!((x - 400.0).abs() < 1e-9 && (y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_random_points() {
        let bounds = isles();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let point = GeoPoint::new(
                rng.gen_range(bounds.min_lat()..bounds.max_lat()),
                rng.gen_range(bounds.min_lng()..bounds.max_lng()),
            );
            let w = rng.gen_range(1.0..4000.0);
            let h = rng.gen_range(1.0..4000.0);
            let (x, y) = bounds.to_pixel(point, w, h);
            let back = bounds.to_geo(x, y, w, h);
            assert!((back.lat - point.lat).abs() < 1e-9, "lat {} vs {}", back.lat, point.lat);
            assert!((back.lng - point.lng).abs() < 1e-9, "lng {} vs {}", back.lng, point.lng);
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoBounds = serde_json::from_str(
            r#"{"min_lat": 1.0, "max_lat": 2.0, "min_lng": 3.0, "max_lng": 4.0}"#,
        ).unwrap();
        assert_eq!(ok.lat_span(), 1.0);

        let bad = serde_json::from_str::<GeoBounds>(
            r#"{"min_lat": 2.0, "max_lat": 1.0, "min_lng": 3.0, "max_lng": 4.0}"#,
        );
        assert!(bad.is_err());
    }
}
