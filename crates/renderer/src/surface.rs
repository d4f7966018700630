//! Drawing surface abstraction.
//!
//! The replayer talks only to [`DrawSurface`]; a concrete backend decides how
//! paths, text and image rectangles become pixels.

use scene_script::{Color, Sprite};
pub use tiny_skia_path::{Path, Transform};
use thiserror::Error;

use crate::assets::{FontAsset, ImageAsset};
use crate::paint::{ResolvedPaint, ShaderFactory};
use crate::state::{ClipNode, StrokeStyle, TextStyle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },
    #[error("surface lost: {0}")]
    Lost(String),
    #[error("failed to present frame: {0}")]
    Present(String),
}

/// Placement of one draw call.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'ctx> {
    /// Local-to-surface transform at the moment the draw was issued.
    pub transform: Transform,
    /// Innermost clip node; walk [`ClipNode::chain`] for the full region.
    pub clip: Option<&'ctx ClipNode>,
}

/// A text draw anchored at the local origin.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'run> {
    pub text: &'run str,
    pub style: &'run TextStyle,
    /// Font registered under `style.font`, if any. Backends fall back to a
    /// system font when absent.
    pub font: Option<&'run FontAsset>,
}

/// Backend-agnostic drawing interface.
///
/// Draw calls never fail; a backend that cannot represent a call skips it.
/// Only frame boundaries report [`SurfaceError`].
pub trait DrawSurface: ShaderFactory {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Starts a frame and clears every pixel to `clear`.
    ///
    /// # Errors
    /// Returns an error if the surface cannot accept a frame.
    fn begin_frame(&mut self, clear: Color) -> Result<(), SurfaceError>;

    /// Fills `path` with the non-zero winding rule.
    fn fill_path(
        &mut self,
        path: &Path,
        paint: &ResolvedPaint<Self::Shader>,
        ctx: &DrawContext<'_>,
    );

    fn stroke_path(
        &mut self,
        path: &Path,
        paint: &ResolvedPaint<Self::Shader>,
        style: &StrokeStyle,
        ctx: &DrawContext<'_>,
    );

    fn draw_text(
        &mut self,
        run: &TextRun<'_>,
        paint: &ResolvedPaint<Self::Shader>,
        ctx: &DrawContext<'_>,
    );

    /// Copies `sprite.src` of `image` into `sprite.dst`, scaled, with
    /// `sprite.alpha` opacity.
    fn draw_image_rect(&mut self, image: &ImageAsset, sprite: &Sprite, ctx: &DrawContext<'_>);

    /// Finishes the frame and presents it.
    ///
    /// # Errors
    /// Returns an error if presentation fails.
    fn end_frame(&mut self) -> Result<(), SurfaceError>;
}
