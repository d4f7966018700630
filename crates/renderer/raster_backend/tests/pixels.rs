use std::f32::consts::TAU;
use std::io::Cursor;

use raster_backend::{RasterShader, RasterSurface};
use renderer::{ReplayWarning, SceneEngine, TextureFormat};
use scene_script::testing::ScriptBuilder;
use scene_script::{ClipMode, Color, Sprite, SpriteRect};

const FILL: u16 = 0x01;
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn engine() -> SceneEngine<RasterShader> {
    SceneEngine::default()
}

fn draw(engine: &mut SceneEngine<RasterShader>, width: u32, height: u32) -> RasterSurface {
    let mut surface = RasterSurface::new(width, height).unwrap();
    engine.replay_frame(&mut surface).unwrap();
    surface
}

#[test]
fn translated_rect_covers_only_its_pixels() {
    let mut scene = engine();
    let root = ScriptBuilder::new()
        .translate(5.0, 6.0)
        .fill_color(Color::rgba(255, 0, 0, 255))
        .draw_rect(FILL, 10.0, 12.0)
        .finish();
    scene.submit_root(&root).unwrap();
    let surface = draw(&mut scene, 32, 32);

    assert_eq!(surface.pixel(5, 6), Some(RED));
    assert_eq!(surface.pixel(14, 17), Some(RED));
    assert_eq!(surface.pixel(4, 6), Some(BLACK));
    assert_eq!(surface.pixel(15, 18), Some(BLACK));
    assert_eq!(surface.pixel(0, 0), Some(BLACK));
}

#[test]
fn difference_clip_punches_a_hole() {
    let mut scene = engine();
    let root = ScriptBuilder::new()
        .begin_path()
        .path_arc([20.0, 20.0], 8.0, [0.0, TAU], 0)
        .clip_path(ClipMode::Difference)
        .fill_color(Color::rgba(0, 255, 0, 255))
        .draw_rect(FILL, 40.0, 40.0)
        .finish();
    scene.submit_root(&root).unwrap();
    let surface = draw(&mut scene, 40, 40);

    assert_eq!(surface.pixel(20, 20), Some(BLACK));
    assert_eq!(surface.pixel(17, 22), Some(BLACK));
    assert_eq!(surface.pixel(2, 2), Some(GREEN));
    assert_eq!(surface.pixel(35, 20), Some(GREEN));
}

#[test]
fn scissor_limits_later_draws() {
    let mut scene = engine();
    let root = ScriptBuilder::new()
        .scissor(10.0, 10.0)
        .fill_color(Color::rgba(255, 0, 0, 255))
        .draw_rect(FILL, 20.0, 20.0)
        .finish();
    scene.submit_root(&root).unwrap();
    let surface = draw(&mut scene, 20, 20);

    assert_eq!(surface.pixel(5, 5), Some(RED));
    assert_eq!(surface.pixel(15, 5), Some(BLACK));
    assert_eq!(surface.pixel(5, 15), Some(BLACK));
}

#[test]
fn sub_script_state_does_not_leak() {
    let mut scene = engine();
    let child = ScriptBuilder::new()
        .translate(10.0, 0.0)
        .fill_color(Color::rgba(0, 0, 255, 255))
        .draw_rect(FILL, 4.0, 4.0)
        .finish();
    let root = ScriptBuilder::new()
        .fill_color(Color::rgba(255, 0, 0, 255))
        .draw_script("child")
        .draw_rect(FILL, 4.0, 4.0)
        .finish();
    scene
        .submit_batch(&[("child", child), ("_root_", root)])
        .unwrap();
    let surface = draw(&mut scene, 16, 8);

    assert_eq!(surface.pixel(1, 1), Some(RED));
    assert_eq!(surface.pixel(11, 1), Some(BLUE));
    assert_eq!(surface.pixel(6, 1), Some(BLACK));
}

#[test]
fn cycles_still_draw_the_rest_of_the_frame() {
    let mut scene = engine();
    let ping = ScriptBuilder::new().draw_script("pong").finish();
    let pong = ScriptBuilder::new()
        .draw_script("ping")
        .fill_color(Color::rgba(0, 255, 0, 255))
        .draw_rect(FILL, 4.0, 4.0)
        .finish();
    let root = ScriptBuilder::new()
        .draw_script("_root_")
        .draw_script("ping")
        .finish();
    scene
        .submit_batch(&[("ping", ping), ("pong", pong), ("_root_", root)])
        .unwrap();
    let mut surface = RasterSurface::new(8, 8).unwrap();
    let report = scene.replay_frame(&mut surface).unwrap();

    let cycles = report
        .warnings
        .iter()
        .filter(|warning| matches!(warning, ReplayWarning::CycleDetected { .. }))
        .count();
    assert_eq!(cycles, 2);
    assert_eq!(surface.pixel(1, 1), Some(GREEN));
}

#[test]
fn linear_gradient_runs_between_its_colors() {
    let mut scene = engine();
    let root = ScriptBuilder::new()
        .fill_linear(
            [0.0, 0.0, 100.0, 0.0],
            Color::rgba(0, 0, 0, 255),
            Color::rgba(255, 255, 255, 255),
        )
        .draw_rect(FILL, 100.0, 4.0)
        .finish();
    scene.submit_root(&root).unwrap();
    let surface = draw(&mut scene, 100, 4);

    let left = surface.pixel(2, 2).unwrap();
    let middle = surface.pixel(50, 2).unwrap();
    let right = surface.pixel(97, 2).unwrap();
    assert!(left[0] < 20);
    assert!((100..156).contains(&middle[0]));
    assert!(right[0] > 235);
}

#[test]
fn stream_texture_fills_and_updates() {
    let mut scene = engine();
    scene
        .on_stream_put("cam", TextureFormat::Rgba, 1, 1, &[0, 0, 255, 255])
        .unwrap();
    let root = ScriptBuilder::new()
        .fill_stream("cam")
        .draw_rect(FILL, 8.0, 8.0)
        .finish();
    scene.submit_root(&root).unwrap();
    let mut surface = RasterSurface::new(8, 8).unwrap();
    scene.redraw_if_dirty(&mut surface).unwrap();
    assert_eq!(surface.pixel(4, 4), Some(BLUE));

    scene
        .on_stream_put("cam", TextureFormat::Rgb, 1, 1, &[255, 0, 0])
        .unwrap();
    assert!(scene.is_dirty());
    scene.redraw_if_dirty(&mut surface).unwrap();
    assert_eq!(surface.pixel(4, 4), Some(RED));
}

#[test]
fn encoded_image_draws_as_sprite() {
    let mut png = Vec::new();
    image::RgbaImage::from_pixel(2, 2, image::Rgba(GREEN))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let mut scene = engine();
    scene.on_image_put("tile", &png).unwrap();
    let sprite = Sprite {
        src: SpriteRect { x: 0.0, y: 0.0, width: 2.0, height: 2.0 },
        dst: SpriteRect { x: 4.0, y: 4.0, width: 8.0, height: 8.0 },
        alpha: 1.0,
    };
    let root = ScriptBuilder::new().draw_sprites("tile", &[sprite]).finish();
    scene.submit_root(&root).unwrap();
    let surface = draw(&mut scene, 16, 16);

    assert_eq!(surface.pixel(8, 8), Some(GREEN));
    assert_eq!(surface.pixel(2, 2), Some(BLACK));
    assert_eq!(surface.pixel(13, 13), Some(BLACK));
}

#[test]
fn text_without_registered_font_does_not_fail_the_frame() {
    let mut scene = engine();
    let root = ScriptBuilder::new()
        .font_size(16.0)
        .fill_color(Color::rgba(255, 255, 255, 255))
        .translate(4.0, 20.0)
        .draw_text("hello")
        .finish();
    scene.submit_root(&root).unwrap();
    let mut surface = RasterSurface::new(64, 32).unwrap();
    let report = scene.replay_frame(&mut surface).unwrap();
    assert_eq!(report.draw_calls, 1);
    assert_eq!(surface.frame_count(), 1);
}

#[test]
fn clear_color_fills_untouched_pixels() {
    let mut scene = engine();
    scene.set_clear_color(Color::rgba(0, 0, 255, 255));
    scene.submit_root(&ScriptBuilder::new().finish()).unwrap();
    let surface = draw(&mut scene, 4, 4);
    let frame = surface.frame();

    assert_eq!(frame.pixel(3, 3), Some(BLUE));
    assert_eq!(frame.to_rgb().len(), 4 * 4 * 3);
}

#[test]
fn zero_sized_surface_is_rejected() {
    assert!(RasterSurface::new(0, 10).is_err());
}

#[test]
fn non_finite_operands_still_draw_later_ops() {
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let mut scene = engine();
        scene
            .on_stream_put("atlas", TextureFormat::Gray, 2, 2, &[255; 4])
            .unwrap();
        let sprite = Sprite {
            src: SpriteRect { x: 0.0, y: 0.0, width: bad, height: 2.0 },
            dst: SpriteRect { x: bad, y: 0.0, width: 4.0, height: 4.0 },
            alpha: 1.0,
        };
        let root = ScriptBuilder::new()
            .push_state()
            .stroke_width(bad)
            .font_size(bad)
            .fill_radial([bad, 0.0, 2.0, bad], Color::rgba(0, 0, 255, 255), Color::WHITE)
            .draw_line(0x03, [bad, 0.0], [4.0, bad])
            .draw_triangle(0x03, [bad, 0.0, 4.0, bad, 2.0, 2.0])
            .draw_quad(0x03, [0.0, 0.0, bad, 0.0, 4.0, bad, 0.0, 4.0])
            .draw_rect(0x03, bad, 4.0)
            .draw_rrect(0x03, 4.0, bad, bad)
            .draw_arc(0x03, 4.0, bad)
            .draw_sector(0x03, bad, 1.0)
            .draw_circle(0x03, bad)
            .draw_ellipse(0x03, 2.0, bad)
            .draw_text("x")
            .draw_sprites("atlas", &[sprite, Sprite { alpha: bad, ..sprite }])
            .pop_state()
            .push_state()
            .transform([bad, 0.0, 0.0, bad, bad, 0.0])
            .rotate(bad)
            .scissor(bad, 4.0)
            .draw_circle(0x03, 4.0)
            .draw_sprites("atlas", &[Sprite { src: SpriteRect { width: 2.0, ..sprite.src }, ..sprite }])
            .pop_state()
            .fill_color(Color::rgba(255, 0, 0, 255))
            .draw_rect(FILL, 8.0, 8.0)
            .finish();
        scene.submit_root(&root).unwrap();
        let surface = draw(&mut scene, 8, 8);
        assert_eq!(surface.pixel(4, 4), Some(RED), "{bad}");
    }
}
