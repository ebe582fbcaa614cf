//! Elevation color ramp.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// One stop of a ramp: the color reached at `threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub threshold: f64,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(threshold: f64, color: [u8; 3]) -> Self {
        Self { threshold, color }
    }
}

/// Piecewise-linear ramp over elevation. Thresholds are strictly increasing
/// and lie in [0, 1]; values outside the first/last stop clamp to that stop.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl ColorRamp {
    pub fn new(stops: Vec<ColorStop>) -> Result<Self> {
        if stops.len() < 2 {
            return Err(RenderError::InvalidRamp(format!("need at least 2 stops, got {}", stops.len())));
        }
        for stop in &stops {
            if !stop.threshold.is_finite() || !(0.0..=1.0).contains(&stop.threshold) {
                return Err(RenderError::InvalidRamp(format!("threshold {} outside [0, 1]", stop.threshold)));
            }
        }
        for pair in stops.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(RenderError::InvalidRamp(format!(
                    "thresholds must increase: {} then {}",
                    pair[0].threshold, pair[1].threshold
                )));
            }
        }
        Ok(Self { stops })
    }

    /// Lowland green through heath and rock to snow.
    pub fn relief() -> Self {
        Self {
            stops: vec![
                ColorStop::new(0.00, [92, 134, 78]),
                ColorStop::new(0.20, [121, 155, 88]),
                ColorStop::new(0.40, [168, 170, 112]),
                ColorStop::new(0.60, [158, 132, 96]),
                ColorStop::new(0.80, [132, 118, 108]),
                ColorStop::new(0.93, [196, 192, 188]),
                ColorStop::new(1.00, [244, 244, 242]),
            ],
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at elevation `e`.
    pub fn color_at(&self, e: f64) -> [u8; 3] {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if !(e > first.threshold) {
            return first.color;
        }
        if e >= last.threshold {
            return last.color;
        }

        // First stop strictly above e; its predecessor is at or below e
        let upper = self.stops.partition_point(|s| s.threshold <= e);
        let lo = self.stops[upper - 1];
        let hi = self.stops[upper];
        let t = (e - lo.threshold) / (hi.threshold - lo.threshold);
        lerp_color(lo.color, hi.color, t)
    }
}

impl<'de> Deserialize<'de> for ColorRamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let stops = Vec::<ColorStop>::deserialize(deserializer)?;
        ColorRamp::new(stops).map_err(serde::de::Error::custom)
    }
}

pub fn lerp_color(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let channel = |ca: u8, cb: u8| (ca as f64 + (cb as f64 - ca as f64) * t).round().clamp(0.0, 255.0) as u8;
    [channel(a[0], b[0]), channel(a[1], b[1]), channel(a[2], b[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop() -> ColorRamp {
        ColorRamp::new(vec![
            ColorStop::new(0.2, [0, 0, 0]),
            ColorStop::new(0.8, [200, 100, 50]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_ramps() {
        assert!(ColorRamp::new(vec![ColorStop::new(0.0, [0, 0, 0])]).is_err());
        assert!(ColorRamp::new(vec![
            ColorStop::new(0.5, [0, 0, 0]),
            ColorStop::new(0.5, [1, 1, 1]),
        ]).is_err());
        assert!(ColorRamp::new(vec![
            ColorStop::new(0.0, [0, 0, 0]),
            ColorStop::new(1.5, [1, 1, 1]),
        ]).is_err());
    }

    #[test]
    fn test_clamps_outside_stops() {
        let ramp = two_stop();
        assert_eq!(ramp.color_at(0.0), [0, 0, 0]);
        assert_eq!(ramp.color_at(-1.0), [0, 0, 0]);
        assert_eq!(ramp.color_at(1.0), [200, 100, 50]);
    }

    #[test]
    fn test_interpolates_between_stops() {
        let ramp = two_stop();
        assert_eq!(ramp.color_at(0.5), [100, 50, 25]);
        assert_eq!(ramp.color_at(0.2), [0, 0, 0]);
    }

    #[test]
    fn test_builtin_ramp_is_valid() {
        let ramp = ColorRamp::relief();
        assert!(ColorRamp::new(ramp.stops().to_vec()).is_ok());
        assert_eq!(ramp.color_at(1.0), [244, 244, 242]);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ColorRamp = serde_json::from_str(
            r#"[{"threshold": 0.0, "color": [0, 0, 0]}, {"threshold": 1.0, "color": [255, 255, 255]}]"#,
        ).unwrap();
        assert_eq!(ok.color_at(0.5), [128, 128, 128]);
        assert!(serde_json::from_str::<ColorRamp>(r#"[{"threshold": 0.0, "color": [0, 0, 0]}]"#).is_err());
    }
}
