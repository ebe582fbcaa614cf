//! Render configuration and seed management.
//!
//! Every tunable the pipeline reads lives in [`RenderConfig`]. It is fixed
//! when a renderer is created and can be loaded from JSON, with any missing
//! field taking its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elevation::ElevationParams;
use crate::error::{RenderError, Result};
use crate::shading::ShadingParams;

/// Largest accepted device pixel scale.
pub const MAX_DEVICE_SCALE: u32 = 8;

/// Seeds for the two noise layers.
///
/// Both are derived from a master seed by default so a single number
/// reproduces a map. Either can be overridden in a config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseSeeds {
    /// Master seed (used for display/reference)
    pub master: u32,
    /// Broad landform layer
    pub primary: u32,
    /// Fine detail layer
    pub secondary: u32,
}

impl NoiseSeeds {
    /// Derive both layer seeds deterministically from `master`.
    pub fn from_master(master: u32) -> Self {
        Self {
            master,
            primary: derive_seed(master, 1),
            secondary: derive_seed(master, 2),
        }
    }
}

impl Default for NoiseSeeds {
    fn default() -> Self {
        Self::from_master(42)
    }
}

/// SplitMix64 finaliser over (master, stream). Stable across platforms and
/// compiler versions, unlike std's hashers.
fn derive_seed(master: u32, stream: u64) -> u32 {
    let mut z = ((master as u64) << 32 | stream).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 32) as u32
}

/// All fixed parameters of a renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub seeds: NoiseSeeds,
    pub elevation: ElevationParams,
    pub shading: ShadingParams,
    /// Physical pixels per logical pixel along each axis
    pub device_scale: u32,
    /// Spline samples per coastline control point
    pub smoothing_subdivisions: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            seeds: NoiseSeeds::default(),
            elevation: ElevationParams::default(),
            shading: ShadingParams::default(),
            device_scale: 1,
            smoothing_subdivisions: 8,
        }
    }
}

impl RenderConfig {
    pub fn with_master_seed(mut self, master: u32) -> Self {
        self.seeds = NoiseSeeds::from_master(master);
        self
    }

    pub fn with_device_scale(mut self, scale: u32) -> Self {
        self.device_scale = scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.elevation.validate()?;
        self.shading.validate()?;
        if !(1..=MAX_DEVICE_SCALE).contains(&self.device_scale) {
            return Err(RenderError::InvalidConfig(format!(
                "device scale {} outside 1..={MAX_DEVICE_SCALE}",
                self.device_scale
            )));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: RenderConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_derivation_is_deterministic() {
        let a = NoiseSeeds::from_master(12345);
        let b = NoiseSeeds::from_master(12345);
        assert_eq!(a, b);
        assert_ne!(a.primary, a.secondary);
        assert_ne!(NoiseSeeds::from_master(1).primary, NoiseSeeds::from_master(2).primary);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = RenderConfig::from_json(r#"{"device_scale": 2, "elevation": {"octaves": 3}}"#).unwrap();
        assert_eq!(config.device_scale, 2);
        assert_eq!(config.elevation.octaves, 3);
        assert_eq!(config.elevation.lacunarity, 2.0);
        assert_eq!(config.smoothing_subdivisions, 8);
    }

    #[test]
    fn test_rejects_bad_device_scale() {
        let config = RenderConfig::default().with_device_scale(0);
        assert!(matches!(config.validate(), Err(RenderError::InvalidConfig(_))));
        assert!(RenderConfig::from_json(r#"{"device_scale": 99}"#).is_err());
    }
}
