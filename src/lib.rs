//! Relief map rendering library
//!
//! Procedural shaded-relief maps of a fixed region: coastline smoothing,
//! land mask rasterization, noise-driven elevation, hillshaded compositing
//! and a renderer that pushes frames into a pixel sink.

pub mod config;
pub mod elevation;
pub mod error;
pub mod geography;
pub mod grid;
pub mod land_mask;
pub mod overlay;
pub mod palette;
pub mod projection;
pub mod renderer;
pub mod shading;
pub mod simplex;
pub mod sink;
pub mod smoothing;

pub use config::{NoiseSeeds, RenderConfig};
pub use error::{RenderError, Result};
pub use geography::GeographyCatalog;
pub use renderer::{Renderer, RendererState};
pub use sink::{PixelRect, PixelSink, PngFileSink};
