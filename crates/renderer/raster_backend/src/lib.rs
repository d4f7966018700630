//! CPU raster backend for the scene engine, built on tiny-skia.

mod clip;
mod frame;
mod shader;
mod surface;
mod text;

pub use clip::ClipMasks;
pub use frame::RasterFrame;
pub use shader::RasterShader;
pub use surface::{DEFAULT_HEIGHT, DEFAULT_WIDTH, RasterSurface};
pub use text::{GlyphCoverage, TextRasterizer};
