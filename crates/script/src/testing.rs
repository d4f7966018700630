//! Wire-format writer used by tests and benches.
//!
//! Production code never encodes scripts; upstream encoders own that. This
//! writer mirrors their byte layout so fixtures stay readable.

use crate::op::{ClipMode, Color, CornerRadii, LineCap, LineJoin, Sprite, TextAlign, TextBaseline};
use crate::opcode;
use crate::reader::padding;

#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

macro_rules! reserved_only {
    ($($name:ident => $tag:path),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> &mut Self {
                self.tag($tag).reserved()
            }
        )*
    };
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Appends bytes verbatim, for malformed fixtures.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn tag(&mut self, opcode: u16) -> &mut Self {
        self.u16(opcode)
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        for value in values {
            self.bytes.extend_from_slice(&value.to_bits().to_be_bytes());
        }
        self
    }

    fn reserved(&mut self) -> &mut Self {
        self.u16(0)
    }

    fn color(&mut self, color: Color) -> &mut Self {
        self.bytes.extend_from_slice(&color.to_array());
        self
    }

    fn padded(&mut self, text: &str) -> &mut Self {
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes
            .extend(core::iter::repeat_n(0, padding(text.len())));
        self
    }

    fn string(&mut self, opcode: u16, text: &str) -> &mut Self {
        let len = u16::try_from(text.len()).unwrap_or(u16::MAX);
        self.tag(opcode).u16(len).padded(text)
    }

    fn quarter_units(value: f32) -> u16 {
        (value * 4.0).round().clamp(0.0, f32::from(u16::MAX)) as u16
    }

    reserved_only! {
        push_state => opcode::PUSH_STATE,
        pop_state => opcode::POP_STATE,
        pop_push_state => opcode::POP_PUSH_STATE,
        begin_path => opcode::BEGIN_PATH,
        close_path => opcode::CLOSE_PATH,
        fill_path => opcode::FILL_PATH,
        stroke_path => opcode::STROKE_PATH,
    }

    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        self.tag(opcode::TRANSLATE).reserved().f32s(&[x, y])
    }

    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        self.tag(opcode::SCALE).reserved().f32s(&[x, y])
    }

    pub fn rotate(&mut self, radians: f32) -> &mut Self {
        self.tag(opcode::ROTATE).reserved().f32s(&[radians])
    }

    pub fn transform(&mut self, matrix: [f32; 6]) -> &mut Self {
        self.tag(opcode::TRANSFORM).reserved().f32s(&matrix)
    }

    pub fn fill_color(&mut self, color: Color) -> &mut Self {
        self.tag(opcode::FILL_COLOR).reserved().color(color)
    }

    pub fn stroke_color(&mut self, color: Color) -> &mut Self {
        self.tag(opcode::STROKE_COLOR).reserved().color(color)
    }

    fn linear(&mut self, opcode: u16, line: [f32; 4], from: Color, to: Color) -> &mut Self {
        self.tag(opcode).reserved().f32s(&line).color(from).color(to)
    }

    fn radial(&mut self, opcode: u16, circle: [f32; 4], inner: Color, outer: Color) -> &mut Self {
        self.tag(opcode)
            .reserved()
            .f32s(&circle)
            .color(inner)
            .color(outer)
    }

    /// `line` is `[start_x, start_y, end_x, end_y]`.
    pub fn fill_linear(&mut self, line: [f32; 4], from: Color, to: Color) -> &mut Self {
        self.linear(opcode::FILL_LINEAR, line, from, to)
    }

    pub fn stroke_linear(&mut self, line: [f32; 4], from: Color, to: Color) -> &mut Self {
        self.linear(opcode::STROKE_LINEAR, line, from, to)
    }

    /// `circle` is `[center_x, center_y, inner_radius, outer_radius]`.
    pub fn fill_radial(&mut self, circle: [f32; 4], inner: Color, outer: Color) -> &mut Self {
        self.radial(opcode::FILL_RADIAL, circle, inner, outer)
    }

    pub fn stroke_radial(&mut self, circle: [f32; 4], inner: Color, outer: Color) -> &mut Self {
        self.radial(opcode::STROKE_RADIAL, circle, inner, outer)
    }

    pub fn fill_image(&mut self, id: &str) -> &mut Self {
        self.string(opcode::FILL_IMAGE, id)
    }

    pub fn fill_stream(&mut self, id: &str) -> &mut Self {
        self.string(opcode::FILL_STREAM, id)
    }

    pub fn stroke_image(&mut self, id: &str) -> &mut Self {
        self.string(opcode::STROKE_IMAGE, id)
    }

    pub fn stroke_stream(&mut self, id: &str) -> &mut Self {
        self.string(opcode::STROKE_STREAM, id)
    }

    pub fn stroke_width(&mut self, width: f32) -> &mut Self {
        self.tag(opcode::STROKE_WIDTH).u16(Self::quarter_units(width))
    }

    pub fn cap(&mut self, cap: LineCap) -> &mut Self {
        let raw = match cap {
            LineCap::Butt => 0,
            LineCap::Round => 1,
            LineCap::Square => 2,
        };
        self.tag(opcode::CAP).u16(raw)
    }

    pub fn join(&mut self, join: LineJoin) -> &mut Self {
        let raw = match join {
            LineJoin::Bevel => 0,
            LineJoin::Round => 1,
            LineJoin::Miter => 2,
        };
        self.tag(opcode::JOIN).u16(raw)
    }

    pub fn miter_limit(&mut self, limit: u16) -> &mut Self {
        self.tag(opcode::MITER_LIMIT).u16(limit)
    }

    pub fn font(&mut self, id: &str) -> &mut Self {
        self.string(opcode::FONT, id)
    }

    pub fn font_size(&mut self, size: f32) -> &mut Self {
        self.tag(opcode::FONT_SIZE).u16(Self::quarter_units(size))
    }

    pub fn text_align(&mut self, align: TextAlign) -> &mut Self {
        let raw = match align {
            TextAlign::Left => 0,
            TextAlign::Center => 1,
            TextAlign::Right => 2,
        };
        self.tag(opcode::TEXT_ALIGN).u16(raw)
    }

    pub fn text_base(&mut self, base: TextBaseline) -> &mut Self {
        let raw = match base {
            TextBaseline::Top => 0,
            TextBaseline::Middle => 1,
            TextBaseline::Alphabetic => 2,
            TextBaseline::Bottom => 3,
        };
        self.tag(opcode::TEXT_BASE).u16(raw)
    }

    pub fn draw_line(&mut self, flags: u16, from: [f32; 2], to: [f32; 2]) -> &mut Self {
        self.tag(opcode::DRAW_LINE)
            .u16(flags)
            .f32s(&from)
            .f32s(&to)
    }

    pub fn draw_triangle(&mut self, flags: u16, points: [f32; 6]) -> &mut Self {
        self.tag(opcode::DRAW_TRIANGLE).u16(flags).f32s(&points)
    }

    pub fn draw_quad(&mut self, flags: u16, points: [f32; 8]) -> &mut Self {
        self.tag(opcode::DRAW_QUAD).u16(flags).f32s(&points)
    }

    pub fn draw_rect(&mut self, flags: u16, width: f32, height: f32) -> &mut Self {
        self.tag(opcode::DRAW_RECT).u16(flags).f32s(&[width, height])
    }

    pub fn draw_rrect(&mut self, flags: u16, width: f32, height: f32, radius: f32) -> &mut Self {
        self.tag(opcode::DRAW_RRECT)
            .u16(flags)
            .f32s(&[width, height, radius])
    }

    pub fn draw_rrectv(
        &mut self,
        flags: u16,
        width: f32,
        height: f32,
        radii: CornerRadii,
    ) -> &mut Self {
        self.tag(opcode::DRAW_RRECTV).u16(flags).f32s(&[
            width,
            height,
            radii.upper_left,
            radii.upper_right,
            radii.lower_right,
            radii.lower_left,
        ])
    }

    pub fn draw_arc(&mut self, flags: u16, radius: f32, radians: f32) -> &mut Self {
        self.tag(opcode::DRAW_ARC).u16(flags).f32s(&[radius, radians])
    }

    pub fn draw_sector(&mut self, flags: u16, radius: f32, radians: f32) -> &mut Self {
        self.tag(opcode::DRAW_SECTOR)
            .u16(flags)
            .f32s(&[radius, radians])
    }

    pub fn draw_circle(&mut self, flags: u16, radius: f32) -> &mut Self {
        self.tag(opcode::DRAW_CIRCLE).u16(flags).f32s(&[radius])
    }

    pub fn draw_ellipse(&mut self, flags: u16, radius_x: f32, radius_y: f32) -> &mut Self {
        self.tag(opcode::DRAW_ELLIPSE)
            .u16(flags)
            .f32s(&[radius_x, radius_y])
    }

    pub fn draw_text(&mut self, text: &str) -> &mut Self {
        self.string(opcode::DRAW_TEXT, text)
    }

    pub fn draw_script(&mut self, id: &str) -> &mut Self {
        self.string(opcode::DRAW_SCRIPT, id)
    }

    pub fn draw_sprites(&mut self, image: &str, sprites: &[Sprite]) -> &mut Self {
        let len = u16::try_from(image.len()).unwrap_or(u16::MAX);
        let count = u32::try_from(sprites.len()).unwrap_or(u32::MAX);
        self.tag(opcode::DRAW_SPRITES).u16(len).u32(count).padded(image);
        for sprite in sprites {
            self.f32s(&[
                sprite.src.x,
                sprite.src.y,
                sprite.src.width,
                sprite.src.height,
                sprite.dst.x,
                sprite.dst.y,
                sprite.dst.width,
                sprite.dst.height,
                sprite.alpha,
            ]);
        }
        self
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.tag(opcode::MOVE_TO).reserved().f32s(&[x, y])
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.tag(opcode::LINE_TO).reserved().f32s(&[x, y])
    }

    pub fn arc_to(&mut self, tangent: [f32; 2], end: [f32; 2], radius: f32) -> &mut Self {
        self.tag(opcode::ARC_TO)
            .reserved()
            .f32s(&tangent)
            .f32s(&end)
            .f32s(&[radius])
    }

    pub fn bezier_to(&mut self, points: [f32; 6]) -> &mut Self {
        self.tag(opcode::BEZIER_TO).reserved().f32s(&points)
    }

    pub fn quadratic_to(&mut self, points: [f32; 4]) -> &mut Self {
        self.tag(opcode::QUADRATIC_TO).reserved().f32s(&points)
    }

    pub fn path_triangle(&mut self, points: [f32; 6]) -> &mut Self {
        self.tag(opcode::PATH_TRIANGLE).reserved().f32s(&points)
    }

    pub fn path_quad(&mut self, points: [f32; 8]) -> &mut Self {
        self.tag(opcode::PATH_QUAD).reserved().f32s(&points)
    }

    pub fn path_rect(&mut self, width: f32, height: f32) -> &mut Self {
        self.tag(opcode::PATH_RECT).reserved().f32s(&[width, height])
    }

    pub fn path_rrect(&mut self, width: f32, height: f32, radius: f32) -> &mut Self {
        self.tag(opcode::PATH_RRECT)
            .reserved()
            .f32s(&[width, height, radius])
    }

    pub fn path_sector(&mut self, radius: f32, radians: f32) -> &mut Self {
        self.tag(opcode::PATH_SECTOR)
            .reserved()
            .f32s(&[radius, radians])
    }

    pub fn path_circle(&mut self, radius: f32) -> &mut Self {
        self.tag(opcode::PATH_CIRCLE).reserved().f32s(&[radius])
    }

    pub fn path_ellipse(&mut self, radius_x: f32, radius_y: f32) -> &mut Self {
        self.tag(opcode::PATH_ELLIPSE)
            .reserved()
            .f32s(&[radius_x, radius_y])
    }

    /// `dir` is the raw wire value: 1 counter-clockwise, anything else clockwise.
    pub fn path_arc(&mut self, center: [f32; 2], radius: f32, angles: [f32; 2], dir: u32) -> &mut Self {
        self.tag(opcode::PATH_ARC)
            .reserved()
            .f32s(&center)
            .f32s(&[radius])
            .f32s(&angles)
            .u32(dir)
    }

    pub fn scissor(&mut self, width: f32, height: f32) -> &mut Self {
        self.tag(opcode::SCISSOR).reserved().f32s(&[width, height])
    }

    pub fn clip_path(&mut self, mode: ClipMode) -> &mut Self {
        let raw = match mode {
            ClipMode::Intersect => 0,
            ClipMode::Difference => 1,
        };
        self.tag(opcode::CLIP_PATH).u16(raw)
    }
}
