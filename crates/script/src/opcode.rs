//! Opcode tags of the wire format.

pub const DRAW_LINE: u16 = 0x0001;
pub const DRAW_TRIANGLE: u16 = 0x0002;
pub const DRAW_QUAD: u16 = 0x0003;
pub const DRAW_RECT: u16 = 0x0004;
pub const DRAW_RRECT: u16 = 0x0005;
pub const DRAW_ARC: u16 = 0x0006;
pub const DRAW_SECTOR: u16 = 0x0007;
pub const DRAW_CIRCLE: u16 = 0x0008;
pub const DRAW_ELLIPSE: u16 = 0x0009;
pub const DRAW_TEXT: u16 = 0x000A;
pub const DRAW_SPRITES: u16 = 0x000B;
pub const DRAW_RRECTV: u16 = 0x000C;
pub const DRAW_SCRIPT: u16 = 0x000F;

pub const BEGIN_PATH: u16 = 0x0020;
pub const CLOSE_PATH: u16 = 0x0021;
pub const FILL_PATH: u16 = 0x0022;
pub const STROKE_PATH: u16 = 0x0023;
pub const MOVE_TO: u16 = 0x0026;
pub const LINE_TO: u16 = 0x0027;
pub const ARC_TO: u16 = 0x0028;
pub const BEZIER_TO: u16 = 0x0029;
pub const QUADRATIC_TO: u16 = 0x002A;
pub const PATH_TRIANGLE: u16 = 0x002B;
pub const PATH_QUAD: u16 = 0x002C;
pub const PATH_RECT: u16 = 0x002D;
pub const PATH_RRECT: u16 = 0x002E;
pub const PATH_SECTOR: u16 = 0x002F;
pub const PATH_CIRCLE: u16 = 0x0030;
pub const PATH_ELLIPSE: u16 = 0x0031;
pub const PATH_ARC: u16 = 0x0032;

pub const PUSH_STATE: u16 = 0x0040;
pub const POP_STATE: u16 = 0x0041;
pub const POP_PUSH_STATE: u16 = 0x0042;
pub const SCISSOR: u16 = 0x0044;
pub const CLIP_PATH: u16 = 0x0045;

pub const TRANSFORM: u16 = 0x0050;
pub const SCALE: u16 = 0x0051;
pub const ROTATE: u16 = 0x0052;
pub const TRANSLATE: u16 = 0x0053;

pub const FILL_COLOR: u16 = 0x0060;
pub const FILL_LINEAR: u16 = 0x0061;
pub const FILL_RADIAL: u16 = 0x0062;
pub const FILL_IMAGE: u16 = 0x0063;
pub const FILL_STREAM: u16 = 0x0064;

pub const STROKE_WIDTH: u16 = 0x0070;
pub const STROKE_COLOR: u16 = 0x0071;
pub const STROKE_LINEAR: u16 = 0x0072;
pub const STROKE_RADIAL: u16 = 0x0073;
pub const STROKE_IMAGE: u16 = 0x0074;
pub const STROKE_STREAM: u16 = 0x0075;

pub const CAP: u16 = 0x0080;
pub const JOIN: u16 = 0x0081;
pub const MITER_LIMIT: u16 = 0x0082;

pub const FONT: u16 = 0x0090;
pub const FONT_SIZE: u16 = 0x0091;
pub const TEXT_ALIGN: u16 = 0x0092;
pub const TEXT_BASE: u16 = 0x0093;

/// Size in bytes of one `draw_sprites` command (nine f32 fields).
pub const SPRITE_RECORD_LEN: usize = 36;

/// Human-readable name of an opcode, used in decode errors and logs.
pub const fn name(opcode: u16) -> Option<&'static str> {
    let name = match opcode {
        DRAW_LINE => "draw_line",
        DRAW_TRIANGLE => "draw_triangle",
        DRAW_QUAD => "draw_quad",
        DRAW_RECT => "draw_rect",
        DRAW_RRECT => "draw_rrect",
        DRAW_ARC => "draw_arc",
        DRAW_SECTOR => "draw_sector",
        DRAW_CIRCLE => "draw_circle",
        DRAW_ELLIPSE => "draw_ellipse",
        DRAW_TEXT => "draw_text",
        DRAW_SPRITES => "draw_sprites",
        DRAW_RRECTV => "draw_rrectv",
        DRAW_SCRIPT => "draw_script",
        BEGIN_PATH => "begin_path",
        CLOSE_PATH => "close_path",
        FILL_PATH => "fill_path",
        STROKE_PATH => "stroke_path",
        MOVE_TO => "move_to",
        LINE_TO => "line_to",
        ARC_TO => "arc_to",
        BEZIER_TO => "bezier_to",
        QUADRATIC_TO => "quadratic_to",
        PATH_TRIANGLE => "triangle",
        PATH_QUAD => "quad",
        PATH_RECT => "rect",
        PATH_RRECT => "rrect",
        PATH_SECTOR => "sector",
        PATH_CIRCLE => "circle",
        PATH_ELLIPSE => "ellipse",
        PATH_ARC => "arc",
        PUSH_STATE => "push_state",
        POP_STATE => "pop_state",
        POP_PUSH_STATE => "pop_push_state",
        SCISSOR => "scissor",
        CLIP_PATH => "clip_path",
        TRANSFORM => "transform",
        SCALE => "scale",
        ROTATE => "rotate",
        TRANSLATE => "translate",
        FILL_COLOR => "fill_color",
        FILL_LINEAR => "fill_linear",
        FILL_RADIAL => "fill_radial",
        FILL_IMAGE => "fill_image",
        FILL_STREAM => "fill_stream",
        STROKE_WIDTH => "stroke_width",
        STROKE_COLOR => "stroke_color",
        STROKE_LINEAR => "stroke_linear",
        STROKE_RADIAL => "stroke_radial",
        STROKE_IMAGE => "stroke_image",
        STROKE_STREAM => "stroke_stream",
        CAP => "cap",
        JOIN => "join",
        MITER_LIMIT => "miter_limit",
        FONT => "font",
        FONT_SIZE => "font_size",
        TEXT_ALIGN => "text_align",
        TEXT_BASE => "text_base",
        _ => return None,
    };
    Some(name)
}
