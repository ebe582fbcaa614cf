//! Renderer lifecycle: owns the output surface and the last composited
//! frame, and runs the full pipeline on every render.
//!
//! Lifecycle: `Uninitialized -> Rendered -> Destroyed`. Rendering is
//! synchronous and always recomputes mask, elevation and shading from
//! scratch; callers that resize frequently should debounce before calling
//! [`Renderer::resize`].

use std::io::Cursor;
use std::time::Instant;

use base64::Engine;
use image::{ImageFormat, RgbaImage};
use log::{debug, info, warn};

use crate::config::RenderConfig;
use crate::elevation::{land_stats, synthesize};
use crate::error::{RenderError, Result};
use crate::geography::GeographyCatalog;
use crate::land_mask::{cell_counts, rasterize, LandMassId};
use crate::overlay::{draw_markers, CityMarker};
use crate::projection::GeoPoint;
use crate::shading::composite;
use crate::simplex::SeededNoise;
use crate::sink::{PixelRect, PixelSink};
use crate::smoothing::smooth;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Rendered,
    Destroyed,
}

pub struct Renderer<S: PixelSink> {
    surface: Option<S>,
    state: RendererState,
    config: RenderConfig,
    geography: GeographyCatalog,
    /// Smoothed outlines in catalog order, computed once at creation
    coastlines: Vec<(Vec<GeoPoint>, LandMassId)>,
    noise_primary: SeededNoise,
    noise_secondary: SeededNoise,
    markers: Vec<CityMarker>,
    width: u32,
    height: u32,
    frame: Option<RgbaImage>,
}

impl<S: PixelSink> Renderer<S> {
    /// Create a renderer drawing into `surface` at `width` x `height`
    /// logical pixels. Fails if the surface is unusable or the
    /// configuration is invalid; nothing is rendered yet.
    pub fn create(
        surface: S,
        width: u32,
        height: u32,
        geography: GeographyCatalog,
        config: RenderConfig,
    ) -> Result<Self> {
        surface.ensure_ready()?;
        config.validate()?;
        geography.validate()?;
        physical_dimensions(width, height, config.device_scale)?;

        let coastlines = geography
            .land_masses
            .iter()
            .map(|mass| (smooth(&mass.outline, config.smoothing_subdivisions), mass.id))
            .collect();

        debug!(
            "renderer created: {} land masses, {} zones, seeds {}/{}",
            geography.land_masses.len(),
            geography.zones.len(),
            config.seeds.primary,
            config.seeds.secondary
        );

        Ok(Self {
            surface: Some(surface),
            state: RendererState::Uninitialized,
            noise_primary: SeededNoise::new(config.seeds.primary),
            noise_secondary: SeededNoise::new(config.seeds.secondary),
            config,
            geography,
            coastlines,
            markers: Vec::new(),
            width,
            height,
            frame: None,
        })
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Logical size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the output raster in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = self.config.device_scale;
        (self.width.saturating_mul(scale), self.height.saturating_mul(scale))
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn geography(&self) -> &GeographyCatalog {
        &self.geography
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// The most recent frame, if one has been rendered.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Markers drawn on top of subsequent renders.
    pub fn set_markers(&mut self, markers: Vec<CityMarker>) {
        self.markers = markers;
    }

    /// Recompute the full composite and draw it into the surface.
    ///
    /// A zero-area viewport is a no-op.
    pub fn render(&mut self) -> Result<()> {
        if self.state == RendererState::Destroyed {
            return Err(RenderError::Destroyed);
        }
        if self.width == 0 || self.height == 0 {
            warn!("render skipped: zero-area viewport {}x{}", self.width, self.height);
            return Ok(());
        }

        let start = Instant::now();
        let img = self.compose_frame();

        let surface = self.surface.as_mut().ok_or(RenderError::Destroyed)?;
        let (pw, ph) = img.dimensions();
        surface.begin_frame(pw, ph)?;
        surface.write_buffer(PixelRect::full(pw, ph), img.as_raw());
        surface.present()?;

        self.frame = Some(img);
        self.state = RendererState::Rendered;
        info!("rendered {}x{} ({}x{} physical) in {:.1?}", self.width, self.height, pw, ph, start.elapsed());
        Ok(())
    }

    /// Change the logical size and render again.
    ///
    /// Resizing to a zero-area viewport drops the previous frame, so exports
    /// return [`RenderError::NotRendered`] until a non-empty render. A size
    /// whose raster would not fit is rejected and the old size kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.state == RendererState::Destroyed {
            return Err(RenderError::Destroyed);
        }
        physical_dimensions(width, height, self.config.device_scale)?;
        debug!("resize {}x{} -> {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        if width == 0 || height == 0 {
            self.frame = None;
            self.state = RendererState::Uninitialized;
        }
        self.render()
    }

    /// Release the surface and the last frame. The surface is handed back
    /// to the caller.
    pub fn destroy(&mut self) -> Result<S> {
        let surface = self.surface.take().ok_or(RenderError::Destroyed)?;
        self.frame = None;
        self.state = RendererState::Destroyed;
        debug!("renderer destroyed");
        Ok(surface)
    }

    /// The current frame encoded as PNG.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        let frame = self.current_frame()?;
        let mut bytes = Vec::new();
        frame.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// The current frame as a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> Result<String> {
        let bytes = self.to_blob()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:image/png;base64,{encoded}"))
    }

    fn current_frame(&self) -> Result<&RgbaImage> {
        match self.state {
            RendererState::Destroyed => Err(RenderError::Destroyed),
            _ => self.frame.as_ref().ok_or(RenderError::NotRendered),
        }
    }

    /// Mask, elevation, shading and markers for the current size. The mask
    /// and elevation field are dropped before this returns.
    fn compose_frame(&self) -> RgbaImage {
        let width = self.width as usize;
        let height = self.height as usize;
        let bounds = &self.geography.bounds;

        let t = Instant::now();
        let outlines: Vec<(&[GeoPoint], LandMassId)> = self
            .coastlines
            .iter()
            .map(|(outline, id)| (outline.as_slice(), *id))
            .collect();
        let mask = rasterize(&outlines, bounds, width, height);
        let (ocean, land) = cell_counts(&mask);
        debug!("land mask: {} ocean cells, {} land masses present ({:.1?})", ocean, land.len(), t.elapsed());

        let t = Instant::now();
        let field = synthesize(
            &mask,
            &self.noise_primary,
            &self.noise_secondary,
            &self.geography.zones,
            bounds,
            &self.config.elevation,
        );
        if let Some((min, max, mean)) = land_stats(&field) {
            debug!("elevation: min {:.3} max {:.3} mean {:.3} ({:.1?})", min, max, mean, t.elapsed());
        }

        let t = Instant::now();
        let mut img = composite(&field, &self.geography.ramp, &self.config.shading, self.config.device_scale);
        if !self.markers.is_empty() {
            draw_markers(&mut img, &self.markers, bounds, self.width, self.height, self.config.device_scale);
        }
        debug!("composite ({:.1?})", t.elapsed());

        img
    }
}

/// Physical raster size for a logical size, or an error if the RGBA buffer
/// would not be addressable.
fn physical_dimensions(width: u32, height: u32, scale: u32) -> Result<(u32, u32)> {
    let too_large = || RenderError::InvalidConfig(format!("{width}x{height} at scale {scale} is too large"));
    let pw = width.checked_mul(scale).ok_or_else(too_large)?;
    let ph = height.checked_mul(scale).ok_or_else(too_large)?;
    (pw as usize)
        .checked_mul(ph as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(too_large)?;
    Ok((pw, ph))
}
