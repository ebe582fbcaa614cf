//! Compositing: color ramp, hillshade, and device-scale upsampling.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::elevation::{ElevationField, OCEAN_SENTINEL};
use crate::error::{RenderError, Result};
use crate::grid::Grid;
use crate::palette::ColorRamp;

/// Light from the northwest (up-left on screen), raised above the horizon.
/// Screen coordinates: +x east, +y south, +z up.
const LIGHT_DIR: [f64; 3] = [-1.0, -1.0, 1.5];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingParams {
    /// Vertical exaggeration applied to elevation differences per pixel
    pub exaggeration: f64,
    /// Largest brightening or darkening, as a fraction (0.15 = +/-15%)
    pub band: f64,
    /// Flat color for ocean pixels, never shaded
    pub ocean_color: [u8; 3],
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            exaggeration: 24.0,
            band: 0.15,
            ocean_color: [164, 196, 222],
        }
    }
}

impl ShadingParams {
    pub fn validate(&self) -> Result<()> {
        if !self.exaggeration.is_finite() || self.exaggeration < 0.0 {
            return Err(RenderError::InvalidConfig("hillshade exaggeration must be non-negative".into()));
        }
        if !self.band.is_finite() || !(0.0..1.0).contains(&self.band) {
            return Err(RenderError::InvalidConfig("hillshade band must be in [0, 1)".into()));
        }
        Ok(())
    }
}

/// Shading multiplier per pixel. Ocean and border pixels stay at 1.0.
///
/// Central differences use the centre elevation in place of any ocean
/// neighbour so coastlines do not read as cliffs.
pub fn compute_hillshade(field: &ElevationField, params: &ShadingParams) -> Grid<f64> {
    let mut shade = Grid::new_with(field.width, field.height, 1.0);

    let light_len = (LIGHT_DIR[0] * LIGHT_DIR[0] + LIGHT_DIR[1] * LIGHT_DIR[1] + LIGHT_DIR[2] * LIGHT_DIR[2]).sqrt();
    let light = [LIGHT_DIR[0] / light_len, LIGHT_DIR[1] / light_len, LIGHT_DIR[2] / light_len];
    // A flat surface has n = (0, 0, 1); normalise so flat ground reads 1.0
    let flat = light[2];

    for y in 0..field.height {
        for x in 0..field.width {
            let h = *field.get(x, y);
            if h == OCEAN_SENTINEL || !field.is_interior(x, y) {
                continue;
            }

            let land_or_center = |v: f64| if v == OCEAN_SENTINEL { h } else { v };
            let h_left = land_or_center(*field.get(x - 1, y));
            let h_right = land_or_center(*field.get(x + 1, y));
            let h_up = land_or_center(*field.get(x, y - 1));
            let h_down = land_or_center(*field.get(x, y + 1));

            let dzdx = (h_right - h_left) * params.exaggeration / 2.0;
            let dzdy = (h_down - h_up) * params.exaggeration / 2.0;

            let nx = -dzdx;
            let ny = -dzdy;
            let nz = 1.0;
            let n_len = (nx * nx + ny * ny + nz * nz).sqrt();

            let n_dot_l = (nx * light[0] + ny * light[1] + nz * light[2]) / n_len;
            let multiplier = 1.0 + (n_dot_l - flat);
            shade.set(x, y, multiplier.clamp(1.0 - params.band, 1.0 + params.band));
        }
    }

    shade
}

/// Color, shade and upsample `field` into an opaque RGBA raster of
/// `field.width * device_scale` by `field.height * device_scale` pixels.
pub fn composite(
    field: &ElevationField,
    ramp: &ColorRamp,
    params: &ShadingParams,
    device_scale: u32,
) -> RgbaImage {
    let scale = device_scale.max(1);
    let width = field.width as u32;
    let height = field.height as u32;
    let mut img = RgbaImage::new(width * scale, height * scale);
    let shade = compute_hillshade(field, params);
    let ocean = Rgba([params.ocean_color[0], params.ocean_color[1], params.ocean_color[2], 255]);

    for (x, y, &e) in field.iter() {
        let pixel = if e == OCEAN_SENTINEL {
            ocean
        } else {
            let base = ramp.color_at(e);
            let s = *shade.get(x, y);
            let channel = |c: u8| (c as f64 * s).round().clamp(0.0, 255.0) as u8;
            Rgba([channel(base[0]), channel(base[1]), channel(base[2]), 255])
        };

        // Replicate into a scale x scale block
        let px = x as u32 * scale;
        let py = y as u32 * scale;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(px + dx, py + dy, pixel);
            }
        }
    }

    img
}
