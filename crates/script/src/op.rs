//! Decoded operation types.
//!
//! These are plain values: no backend handles, no references into the source
//! buffer. A decoded `Vec<Op>` can be cached and replayed any number of times.

/// A point in script-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Straight (non-premultiplied) RGBA with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    #[inline]
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

/// General 2D affine matrix, laid out as `[sx kx tx; ky sy ty]`.
///
/// Field order matches the wire order of the `transform` op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub sx: f32,
    pub ky: f32,
    pub kx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        sx: 1.0,
        ky: 0.0,
        kx: 0.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Fill/stroke selector carried by every shape draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawFlags(u16);

impl DrawFlags {
    pub const FILL: Self = Self(0x01);
    pub const STROKE: Self = Self(0x02);
    pub const FILL_STROKE: Self = Self(0x03);

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn fills(self) -> bool {
        self.0 & Self::FILL.0 != 0
    }

    #[inline]
    pub const fn strokes(self) -> bool {
        self.0 & Self::STROKE.0 != 0
    }
}

/// How a clip path combines with the clip already in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipMode {
    /// Keep only the area inside both.
    Intersect,
    /// Remove the path's area from the current clip.
    Difference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    Bevel,
    Round,
    #[default]
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Alphabetic,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

/// Two-stop linear gradient between `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub start_color: Color,
    pub end_color: Color,
}

/// Two-stop radial gradient; `inner_color` holds inside `inner_radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
    pub center: Point,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub inner_color: Color,
    pub outer_color: Color,
}

/// A paint source for fills and strokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(Color),
    Linear(LinearGradient),
    Radial(RadialGradient),
    /// Static image asset id.
    Image(String),
    /// Streaming texture asset id.
    Stream(String),
}

impl Default for Paint {
    fn default() -> Self {
        Self::Color(Color::WHITE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerRadii {
    pub upper_left: f32,
    pub upper_right: f32,
    pub lower_right: f32,
    pub lower_left: f32,
}

impl CornerRadii {
    #[inline]
    pub const fn uniform(radius: f32) -> Self {
        Self {
            upper_left: radius,
            upper_right: radius,
            lower_right: radius,
            lower_left: radius,
        }
    }
}

/// Geometry shared by shape draws and the matching path-building ops.
///
/// Everything except `Line`, `Triangle` and `Quad` is anchored at the local
/// origin: rects span `(0, 0, width, height)`, round shapes are centred on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Line { from: Point, to: Point },
    Triangle([Point; 3]),
    Quad([Point; 4]),
    Rect { width: f32, height: f32 },
    RoundedRect { width: f32, height: f32, radius: f32 },
    VarRoundedRect { width: f32, height: f32, radii: CornerRadii },
    Arc { radius: f32, radians: f32 },
    Sector { radius: f32, radians: f32 },
    Circle { radius: f32 },
    Ellipse { radius_x: f32, radius_y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpriteRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One source-rect to destination-rect blit of a `draw_sprites` op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub src: SpriteRect,
    pub dst: SpriteRect,
    pub alpha: f32,
}

/// One decoded script operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // State stack
    PushState,
    PopState,
    PopPushState,

    // Transform
    Translate { x: f32, y: f32 },
    Scale { x: f32, y: f32 },
    Rotate { radians: f32 },
    Transform(Matrix),

    // Paint and stroke style
    FillPaint(Paint),
    StrokePaint(Paint),
    StrokeWidth(f32),
    LineCap(LineCap),
    LineJoin(LineJoin),
    MiterLimit(f32),

    // Text style
    Font(String),
    FontSize(f32),
    TextAlign(TextAlign),
    TextBaseline(TextBaseline),

    // Immediate draws
    Draw { shape: Shape, flags: DrawFlags },
    DrawText(String),
    DrawSprites { image: String, sprites: Vec<Sprite> },
    DrawScript(String),

    // Path construction
    BeginPath,
    ClosePath,
    FillPath,
    StrokePath,
    MoveTo(Point),
    LineTo(Point),
    ArcTo { tangent: Point, end: Point, radius: f32 },
    BezierTo { control1: Point, control2: Point, end: Point },
    QuadraticTo { control: Point, end: Point },
    AddShape(Shape),
    PathArc {
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        direction: ArcDirection,
    },

    // Clipping
    Scissor { width: f32, height: f32 },
    ClipPath(ClipMode),
}

impl Op {
    /// Script id referenced by a `DrawScript` op.
    #[inline]
    pub fn script_ref(&self) -> Option<&str> {
        match self {
            Self::DrawScript(id) => Some(id),
            _ => None,
        }
    }
}
