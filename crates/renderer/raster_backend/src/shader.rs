//! Shader construction for the raster surface.

use std::sync::Arc;

use renderer::{ImageAsset, ResolvedPaint, ShaderSource};
use scene_script::{Color, LinearGradient, RadialGradient};
use tiny_skia::{
    FilterQuality, GradientStop, Paint, Pattern, PixmapRef, Point, Shader, SpreadMode, Transform,
};

/// Cached shader handle. Image patterns borrow their pixels, so the handle
/// shares the registry's payload and the pattern is built per draw.
#[derive(Debug, Clone)]
pub enum RasterShader {
    Gradient(Shader<'static>),
    Image(Arc<ImageAsset>),
}

pub(crate) fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.red, color.green, color.blue, color.alpha)
}

/// Borrows premultiplied RGBA8 pixels without copying.
pub(crate) fn image_pixmap(image: &ImageAsset) -> Option<PixmapRef<'_>> {
    PixmapRef::from_bytes(image.pixels(), image.width(), image.height())
}

pub(crate) fn create(source: ShaderSource<'_>) -> Option<RasterShader> {
    match source {
        ShaderSource::Linear(gradient) => linear(gradient).map(RasterShader::Gradient),
        ShaderSource::Radial(gradient) => radial(gradient).map(RasterShader::Gradient),
        ShaderSource::Image(image) => image_pixmap(image)
            .is_some()
            .then(|| RasterShader::Image(Arc::clone(image))),
    }
}

fn linear(gradient: &LinearGradient) -> Option<Shader<'static>> {
    let (start, end) = (gradient.start, gradient.end);
    if ![start.x, start.y, end.x, end.y].iter().all(|coord| coord.is_finite()) {
        return None;
    }
    tiny_skia::LinearGradient::new(
        Point::from_xy(gradient.start.x, gradient.start.y),
        Point::from_xy(gradient.end.x, gradient.end.y),
        vec![
            GradientStop::new(0.0, skia_color(gradient.start_color)),
            GradientStop::new(1.0, skia_color(gradient.end_color)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
}

/// Concentric gradient; the inner radius becomes the position of the first stop.
fn radial(gradient: &RadialGradient) -> Option<Shader<'static>> {
    let origin = gradient.center;
    if ![origin.x, origin.y, gradient.outer_radius].iter().all(|coord| coord.is_finite())
        || gradient.outer_radius <= 0.0
    {
        return None;
    }
    let ratio = gradient.inner_radius / gradient.outer_radius;
    let inner = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    let center = Point::from_xy(gradient.center.x, gradient.center.y);
    tiny_skia::RadialGradient::new(
        center,
        center,
        gradient.outer_radius,
        vec![
            GradientStop::new(inner, skia_color(gradient.inner_color)),
            GradientStop::new(1.0, skia_color(gradient.outer_color)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
}

/// Paint for a resolved scene paint. Shaders are in local coordinates; the
/// draw transform carries them to the surface.
pub(crate) fn skia_paint(paint: &ResolvedPaint<RasterShader>) -> Paint<'_> {
    let mut out = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    match paint {
        ResolvedPaint::Solid(color) => out.set_color(skia_color(*color)),
        ResolvedPaint::Shader(RasterShader::Gradient(shader)) => out.shader = shader.clone(),
        ResolvedPaint::Shader(RasterShader::Image(image)) => match image_pixmap(image) {
            Some(pixels) => {
                out.shader = Pattern::new(
                    pixels,
                    SpreadMode::Repeat,
                    FilterQuality::Bilinear,
                    1.0,
                    Transform::identity(),
                );
            }
            None => out.set_color(tiny_skia::Color::TRANSPARENT),
        },
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_script::Point as ScenePoint;

    #[test]
    fn radial_with_zero_outer_radius_is_declined() {
        let gradient = RadialGradient {
            center: ScenePoint::new(0.0, 0.0),
            inner_radius: 0.0,
            outer_radius: 0.0,
            inner_color: Color::BLACK,
            outer_color: Color::WHITE,
        };
        assert!(create(ShaderSource::Radial(&gradient)).is_none());
    }

    #[test]
    fn image_shader_shares_the_payload() {
        let image = Arc::new(
            ImageAsset::from_texture(renderer::TextureFormat::Rgb, 2, 1, &[255, 0, 0, 0, 0, 255])
                .unwrap(),
        );
        let shader = create(ShaderSource::Image(&image));
        assert!(matches!(
            &shader,
            Some(RasterShader::Image(shared)) if Arc::ptr_eq(shared, &image)
        ));
        assert_eq!(Arc::strong_count(&image), 2);

        let pixels = image_pixmap(&image).unwrap();
        assert_eq!(pixels.data().as_ptr(), image.pixels().as_ptr());
        assert_eq!(pixels.data(), [255, 0, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn non_finite_gradients_never_panic() {
        let radial = RadialGradient {
            center: ScenePoint::new(f32::NAN, 0.0),
            inner_radius: f32::INFINITY,
            outer_radius: f32::NAN,
            inner_color: Color::BLACK,
            outer_color: Color::WHITE,
        };
        assert!(create(ShaderSource::Radial(&radial)).is_none());
        let linear = LinearGradient {
            start: ScenePoint::new(f32::NAN, f32::NAN),
            end: ScenePoint::new(f32::INFINITY, 0.0),
            start_color: Color::BLACK,
            end_color: Color::WHITE,
        };
        assert!(create(ShaderSource::Linear(&linear)).is_none());
    }
}
