//! City markers drawn over the composited map.
//!
//! Metric summaries come from the external analysis pipeline as JSON; only
//! the per-city accuracy is used here, to tint each marker.

use std::path::Path;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geography::City;
use crate::palette::lerp_color;
use crate::projection::{GeoBounds, GeoPoint};

/// Marker radius in logical pixels.
const MARKER_RADIUS: f64 = 4.0;
/// Outline width in logical pixels.
const OUTLINE_WIDTH: f64 = 1.0;

const OUTLINE_COLOR: [u8; 3] = [32, 32, 36];
const NO_DATA_COLOR: [u8; 3] = [128, 128, 128];
const LOW_COLOR: [u8; 3] = [196, 58, 48];
const MID_COLOR: [u8; 3] = [230, 178, 60];
const HIGH_COLOR: [u8; 3] = [58, 158, 84];

/// Per-city figures produced by the analysis pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityMetrics {
    pub city: String,
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub consistency: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub cities: Vec<CityMetrics>,
}

impl MetricSummary {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn accuracy_for(&self, city: &str) -> Option<f64> {
        self.cities
            .iter()
            .find(|m| m.city.eq_ignore_ascii_case(city))
            .and_then(|m| m.accuracy)
            .filter(|a| a.is_finite())
    }
}

/// A marker ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct CityMarker {
    pub name: String,
    pub location: GeoPoint,
    /// Accuracy in [0, 1], if the summary has one for this city
    pub accuracy: Option<f64>,
}

impl CityMarker {
    pub fn fill_color(&self) -> [u8; 3] {
        match self.accuracy {
            None => NO_DATA_COLOR,
            Some(a) => {
                let a = a.clamp(0.0, 1.0);
                if a < 0.5 {
                    lerp_color(LOW_COLOR, MID_COLOR, a * 2.0)
                } else {
                    lerp_color(MID_COLOR, HIGH_COLOR, (a - 0.5) * 2.0)
                }
            }
        }
    }
}

/// Join catalog cities with a summary by name. Cities without metrics still
/// get a neutral marker.
pub fn build_markers(cities: &[City], summary: Option<&MetricSummary>) -> Vec<CityMarker> {
    cities
        .iter()
        .map(|city| CityMarker {
            name: city.name.clone(),
            location: city.location,
            accuracy: summary.and_then(|s| s.accuracy_for(&city.name)),
        })
        .collect()
}

/// Draw markers onto a raster of `logical_width * device_scale` by
/// `logical_height * device_scale` pixels.
pub fn draw_markers(
    img: &mut RgbaImage,
    markers: &[CityMarker],
    bounds: &GeoBounds,
    logical_width: u32,
    logical_height: u32,
    device_scale: u32,
) {
    let scale = device_scale.max(1) as f64;
    let radius = MARKER_RADIUS * scale;
    let inner = (MARKER_RADIUS - OUTLINE_WIDTH) * scale;

    for marker in markers {
        if !bounds.contains(&marker.location) {
            continue;
        }
        let (lx, ly) = bounds.to_pixel(marker.location, logical_width as f64, logical_height as f64);
        let (cx, cy) = (lx * scale, ly * scale);
        let fill = marker.fill_color();

        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as u32).min(img.width());
        let y1 = ((cy + radius).ceil() as u32).min(img.height());

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d > radius {
                    continue;
                }
                let c = if d > inner { OUTLINE_COLOR } else { fill };
                img.put_pixel(px, py, Rgba([c[0], c[1], c[2], 255]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london() -> City {
        City { name: "London".into(), location: GeoPoint::new(0.5, 0.5) }
    }

    #[test]
    fn test_summary_lookup_is_case_insensitive() {
        let summary: MetricSummary = serde_json::from_str(
            r#"{"cities": [{"city": "london", "accuracy": 0.8, "consistency": 0.9}, {"city": "Dublin", "accuracy": null}]}"#,
        ).unwrap();
        assert_eq!(summary.accuracy_for("London"), Some(0.8));
        assert_eq!(summary.accuracy_for("Dublin"), None);
        assert_eq!(summary.accuracy_for("Paris"), None);
    }

    #[test]
    fn test_marker_colors() {
        let none = CityMarker { name: "a".into(), location: GeoPoint::new(0.0, 0.0), accuracy: None };
        let low = CityMarker { accuracy: Some(0.0), ..none.clone() };
        let high = CityMarker { accuracy: Some(1.0), ..none.clone() };
        assert_eq!(none.fill_color(), NO_DATA_COLOR);
        assert_eq!(low.fill_color(), LOW_COLOR);
        assert_eq!(high.fill_color(), HIGH_COLOR);
    }

    #[test]
    fn test_build_markers_without_summary() {
        let markers = build_markers(&[london()], None);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].accuracy, None);
    }

    #[test]
    fn test_draw_marker_at_projected_location() {
        let bounds = GeoBounds::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let summary = MetricSummary {
            cities: vec![CityMetrics { city: "London".into(), accuracy: Some(1.0), consistency: None }],
        };
        let markers = build_markers(&[london()], Some(&summary));
        let mut img = RgbaImage::new(40, 40);
        draw_markers(&mut img, &markers, &bounds, 20, 20, 2);

        let center = img.get_pixel(20, 20).0;
        assert_eq!(&center[..3], &HIGH_COLOR);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
