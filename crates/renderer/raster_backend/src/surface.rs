use log::{debug, trace};
use renderer::{
    DrawContext, DrawSurface, ImageAsset, Path, ResolvedPaint, ShaderFactory, ShaderSource,
    StrokeStyle, SurfaceError, TextRun, Transform,
};
use scene_script::{Color, LineCap, LineJoin, Sprite};
use tiny_skia::{
    FillRule, FilterQuality, Mask, Paint, Pattern, Pixmap, PixmapPaint, Rect, SpreadMode, Stroke,
};
use tracing::info_span;

use crate::clip::ClipMasks;
use crate::frame::RasterFrame;
use crate::shader::{self, RasterShader};
use crate::text::TextRasterizer;

/// Default surface size when none is configured.
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// CPU drawing surface over a premultiplied RGBA pixmap.
pub struct RasterSurface {
    pixmap: Pixmap,
    clips: ClipMasks,
    text: Option<TextRasterizer>,
    frames: u64,
}

impl RasterSurface {
    /// # Errors
    /// Returns [`SurfaceError::InvalidSize`] for a zero or oversized surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        debug!(target: "raster_backend", "raster surface {width}x{height} created");
        Ok(Self {
            pixmap,
            clips: ClipMasks::default(),
            text: None,
            frames: 0,
        })
    }

    /// Replaces the pixmap. Contents are lost until the next frame.
    ///
    /// # Errors
    /// Returns [`SurfaceError::InvalidSize`]; the old pixmap is kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if (width, height) == (self.pixmap.width(), self.pixmap.height()) {
            return Ok(());
        }
        self.pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        self.clips.clear();
        Ok(())
    }

    /// Frames completed so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Demultiplied RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Demultiplied RGBA of the whole surface.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let color = px.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect()
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let color = px.demultiply();
                [color.red(), color.green(), color.blue()]
            })
            .collect()
    }

    pub fn frame(&self) -> RasterFrame {
        RasterFrame::new(self.pixmap.width(), self.pixmap.height(), self.to_rgba())
    }

    fn clip_id(&mut self, ctx: &DrawContext<'_>) -> Option<u64> {
        let clip = ctx.clip?;
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        self.clips.prepare(clip, width, height)
    }
}

fn skia_stroke(style: &StrokeStyle) -> Stroke {
    let mut stroke = Stroke {
        width: style.width,
        miter_limit: style.miter_limit,
        ..Stroke::default()
    };
    stroke.line_cap = match style.cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    };
    stroke.line_join = match style.join {
        LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        LineJoin::Round => tiny_skia::LineJoin::Round,
        LineJoin::Miter => tiny_skia::LineJoin::Miter,
    };
    stroke
}

impl ShaderFactory for RasterSurface {
    type Shader = RasterShader;

    fn create_shader(&mut self, source: ShaderSource<'_>) -> Option<RasterShader> {
        let created = shader::create(source);
        if created.is_none() {
            trace!(target: "raster_backend", "shader declined for {source:?}");
        }
        created
    }
}

impl DrawSurface for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn begin_frame(&mut self, clear: Color) -> Result<(), SurfaceError> {
        self.clips.clear();
        self.pixmap.fill(shader::skia_color(clear));
        Ok(())
    }

    fn fill_path(&mut self, path: &Path, paint: &ResolvedPaint<RasterShader>, ctx: &DrawContext<'_>) {
        let clip = self.clip_id(ctx);
        let mask = clip.and_then(|id| self.clips.get(id));
        let paint = shader::skia_paint(paint);
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, ctx.transform, mask);
    }

    fn stroke_path(
        &mut self,
        path: &Path,
        paint: &ResolvedPaint<RasterShader>,
        style: &StrokeStyle,
        ctx: &DrawContext<'_>,
    ) {
        if !style.width.is_finite() || style.width <= 0.0 {
            return;
        }
        let clip = self.clip_id(ctx);
        let mask = clip.and_then(|id| self.clips.get(id));
        let paint = shader::skia_paint(paint);
        self.pixmap
            .stroke_path(path, &paint, &skia_stroke(style), ctx.transform, mask);
    }

    fn draw_text(&mut self, run: &TextRun<'_>, paint: &ResolvedPaint<RasterShader>, ctx: &DrawContext<'_>) {
        let _span = info_span!("raster_backend.text").entered();
        let text = self.text.get_or_insert_with(TextRasterizer::new);
        let Some(glyphs) = text.rasterize(run) else {
            return;
        };
        let (width, height) = (glyphs.mask.width(), glyphs.mask.height());
        let Some(mut layer) = Pixmap::new(width, height) else {
            return;
        };
        // Paint the layer in local coordinates so shaders line up with the
        // rest of the scene, then composite it with the draw transform.
        let Some(area) = Rect::from_xywh(glyphs.origin_x, glyphs.origin_y, width as f32, height as f32)
        else {
            return;
        };
        let skia_paint = shader::skia_paint(paint);
        layer.fill_rect(
            area,
            &skia_paint,
            Transform::from_translate(-glyphs.origin_x, -glyphs.origin_y),
            Some(&glyphs.mask),
        );

        let clip = self.clip_id(ctx);
        let mask: Option<&Mask> = clip.and_then(|id| self.clips.get(id));
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            },
            ctx.transform.pre_translate(glyphs.origin_x, glyphs.origin_y),
            mask,
        );
    }

    fn draw_image_rect(&mut self, image: &ImageAsset, sprite: &Sprite, ctx: &DrawContext<'_>) {
        let (src, dst) = (sprite.src, sprite.dst);
        if src.width <= 0.0 || src.height <= 0.0 || sprite.alpha.is_nan() || sprite.alpha <= 0.0 {
            return;
        }
        let Some(area) = Rect::from_xywh(dst.x, dst.y, dst.width, dst.height) else {
            return;
        };
        let Some(pixels) = shader::image_pixmap(image) else {
            return;
        };
        let placement = Transform::from_translate(dst.x, dst.y)
            .pre_scale(dst.width / src.width, dst.height / src.height)
            .pre_translate(-src.x, -src.y);
        if !placement.is_finite() {
            return;
        }
        let paint = Paint {
            shader: Pattern::new(
                pixels,
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                sprite.alpha.min(1.0),
                placement,
            ),
            anti_alias: true,
            ..Paint::default()
        };
        let clip = self.clip_id(ctx);
        let mask = clip.and_then(|id| self.clips.get(id));
        self.pixmap.fill_rect(area, &paint, ctx.transform, mask);
    }

    fn end_frame(&mut self) -> Result<(), SurfaceError> {
        self.frames += 1;
        trace!(
            target: "raster_backend",
            "frame {} finished with {} clip masks",
            self.frames,
            self.clips.len()
        );
        Ok(())
    }
}
