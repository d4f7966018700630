use log::trace;

use crate::error::DecodeError;
use crate::op::{
    ArcDirection, ClipMode, CornerRadii, DrawFlags, LineCap, LineJoin, LinearGradient, Matrix, Op,
    Paint, RadialGradient, Shape, Sprite, SpriteRect, TextAlign, TextBaseline,
};
use crate::opcode::{self, SPRITE_RECORD_LEN};
use crate::reader::{Record, ScriptReader};

/// Operand layouts shared by the `draw_*` ops and their path-building twins.
#[derive(Clone, Copy)]
enum ShapeLayout {
    Line,
    Triangle,
    Quad,
    Rect,
    RoundedRect,
    VarRoundedRect,
    Arc,
    Sector,
    Circle,
    Ellipse,
}

impl ShapeLayout {
    /// Bytes of geometry following the 16-bit flags or reserved field.
    const fn len(self) -> usize {
        match self {
            Self::Line => 16,
            Self::Triangle | Self::VarRoundedRect => 24,
            Self::Quad => 32,
            Self::Rect | Self::Arc | Self::Sector | Self::Ellipse => 8,
            Self::RoundedRect => 12,
            Self::Circle => 4,
        }
    }

    fn read(self, rec: &mut Record<'_, '_>) -> Result<Shape, DecodeError> {
        let shape = match self {
            Self::Line => Shape::Line {
                from: rec.point()?,
                to: rec.point()?,
            },
            Self::Triangle => Shape::Triangle([rec.point()?, rec.point()?, rec.point()?]),
            Self::Quad => Shape::Quad([rec.point()?, rec.point()?, rec.point()?, rec.point()?]),
            Self::Rect => Shape::Rect {
                width: rec.f32()?,
                height: rec.f32()?,
            },
            Self::RoundedRect => Shape::RoundedRect {
                width: rec.f32()?,
                height: rec.f32()?,
                radius: rec.f32()?,
            },
            Self::VarRoundedRect => Shape::VarRoundedRect {
                width: rec.f32()?,
                height: rec.f32()?,
                radii: CornerRadii {
                    upper_left: rec.f32()?,
                    upper_right: rec.f32()?,
                    lower_right: rec.f32()?,
                    lower_left: rec.f32()?,
                },
            },
            Self::Arc => Shape::Arc {
                radius: rec.f32()?,
                radians: rec.f32()?,
            },
            Self::Sector => Shape::Sector {
                radius: rec.f32()?,
                radians: rec.f32()?,
            },
            Self::Circle => Shape::Circle {
                radius: rec.f32()?,
            },
            Self::Ellipse => Shape::Ellipse {
                radius_x: rec.f32()?,
                radius_y: rec.f32()?,
            },
        };
        Ok(shape)
    }
}

/// Decodes a complete script buffer.
///
/// Decoding is all-or-nothing: the first malformed record fails the whole
/// buffer and no ops are returned.
///
/// # Errors
/// Returns [`DecodeError`] on an unknown opcode, a truncated record, an
/// out-of-range enum operand or a stray trailing byte.
pub fn decode(bytes: &[u8]) -> Result<Vec<Op>, DecodeError> {
    let mut reader = ScriptReader::new(bytes);
    let mut ops = Vec::new();
    while reader.remaining() > 0 {
        let offset = reader.offset();
        if reader.remaining() < 2 {
            return Err(DecodeError::TrailingByte { offset });
        }
        let Some(tag) = reader.opcode() else {
            return Err(DecodeError::TrailingByte { offset });
        };
        ops.push(decode_op(&mut reader, tag, offset)?);
    }
    trace!(target: "scene_script", "decoded {} ops from {} bytes", ops.len(), bytes.len());
    Ok(ops)
}

fn decode_op(reader: &mut ScriptReader<'_>, tag: u16, offset: usize) -> Result<Op, DecodeError> {
    let Some(name) = opcode::name(tag) else {
        return Err(DecodeError::UnknownOpcode {
            opcode: tag,
            offset,
        });
    };
    let rec = &mut reader.record(name, offset);

    let op = match tag {
        opcode::DRAW_LINE => draw(rec, ShapeLayout::Line)?,
        opcode::DRAW_TRIANGLE => draw(rec, ShapeLayout::Triangle)?,
        opcode::DRAW_QUAD => draw(rec, ShapeLayout::Quad)?,
        opcode::DRAW_RECT => draw(rec, ShapeLayout::Rect)?,
        opcode::DRAW_RRECT => draw(rec, ShapeLayout::RoundedRect)?,
        opcode::DRAW_RRECTV => draw(rec, ShapeLayout::VarRoundedRect)?,
        opcode::DRAW_ARC => draw(rec, ShapeLayout::Arc)?,
        opcode::DRAW_SECTOR => draw(rec, ShapeLayout::Sector)?,
        opcode::DRAW_CIRCLE => draw(rec, ShapeLayout::Circle)?,
        opcode::DRAW_ELLIPSE => draw(rec, ShapeLayout::Ellipse)?,
        opcode::DRAW_TEXT => Op::DrawText(rec.prefixed_string()?),
        opcode::DRAW_SCRIPT => Op::DrawScript(rec.prefixed_string()?),
        opcode::DRAW_SPRITES => sprites(rec)?,

        opcode::BEGIN_PATH => bare(rec, Op::BeginPath)?,
        opcode::CLOSE_PATH => bare(rec, Op::ClosePath)?,
        opcode::FILL_PATH => bare(rec, Op::FillPath)?,
        opcode::STROKE_PATH => bare(rec, Op::StrokePath)?,
        opcode::MOVE_TO => {
            reserved(rec, 8)?;
            Op::MoveTo(rec.point()?)
        }
        opcode::LINE_TO => {
            reserved(rec, 8)?;
            Op::LineTo(rec.point()?)
        }
        opcode::ARC_TO => {
            reserved(rec, 20)?;
            Op::ArcTo {
                tangent: rec.point()?,
                end: rec.point()?,
                radius: rec.f32()?,
            }
        }
        opcode::BEZIER_TO => {
            reserved(rec, 24)?;
            Op::BezierTo {
                control1: rec.point()?,
                control2: rec.point()?,
                end: rec.point()?,
            }
        }
        opcode::QUADRATIC_TO => {
            reserved(rec, 16)?;
            Op::QuadraticTo {
                control: rec.point()?,
                end: rec.point()?,
            }
        }
        opcode::PATH_TRIANGLE => path_shape(rec, ShapeLayout::Triangle)?,
        opcode::PATH_QUAD => path_shape(rec, ShapeLayout::Quad)?,
        opcode::PATH_RECT => path_shape(rec, ShapeLayout::Rect)?,
        opcode::PATH_RRECT => path_shape(rec, ShapeLayout::RoundedRect)?,
        opcode::PATH_SECTOR => path_shape(rec, ShapeLayout::Sector)?,
        opcode::PATH_CIRCLE => path_shape(rec, ShapeLayout::Circle)?,
        opcode::PATH_ELLIPSE => path_shape(rec, ShapeLayout::Ellipse)?,
        opcode::PATH_ARC => {
            reserved(rec, 24)?;
            let center = rec.point()?;
            let radius = rec.f32()?;
            let start = rec.f32()?;
            let end = rec.f32()?;
            let direction = if rec.u32()? == 1 {
                ArcDirection::CounterClockwise
            } else {
                ArcDirection::Clockwise
            };
            Op::PathArc {
                center,
                radius,
                start,
                end,
                direction,
            }
        }

        opcode::PUSH_STATE => bare(rec, Op::PushState)?,
        opcode::POP_STATE => bare(rec, Op::PopState)?,
        opcode::POP_PUSH_STATE => bare(rec, Op::PopPushState)?,
        opcode::SCISSOR => {
            reserved(rec, 8)?;
            Op::Scissor {
                width: rec.f32()?,
                height: rec.f32()?,
            }
        }
        opcode::CLIP_PATH => {
            let mode = match enum_operand(rec)? {
                0 => ClipMode::Intersect,
                1 => ClipMode::Difference,
                other => return Err(rec.invalid(other)),
            };
            Op::ClipPath(mode)
        }

        opcode::TRANSFORM => {
            reserved(rec, 24)?;
            Op::Transform(Matrix {
                sx: rec.f32()?,
                ky: rec.f32()?,
                kx: rec.f32()?,
                sy: rec.f32()?,
                tx: rec.f32()?,
                ty: rec.f32()?,
            })
        }
        opcode::SCALE => {
            reserved(rec, 8)?;
            Op::Scale {
                x: rec.f32()?,
                y: rec.f32()?,
            }
        }
        opcode::ROTATE => {
            reserved(rec, 4)?;
            Op::Rotate {
                radians: rec.f32()?,
            }
        }
        opcode::TRANSLATE => {
            reserved(rec, 8)?;
            Op::Translate {
                x: rec.f32()?,
                y: rec.f32()?,
            }
        }

        opcode::FILL_COLOR => Op::FillPaint(solid(rec)?),
        opcode::FILL_LINEAR => Op::FillPaint(linear(rec)?),
        opcode::FILL_RADIAL => Op::FillPaint(radial(rec)?),
        opcode::FILL_IMAGE => Op::FillPaint(Paint::Image(rec.prefixed_string()?)),
        opcode::FILL_STREAM => Op::FillPaint(Paint::Stream(rec.prefixed_string()?)),
        opcode::STROKE_COLOR => Op::StrokePaint(solid(rec)?),
        opcode::STROKE_LINEAR => Op::StrokePaint(linear(rec)?),
        opcode::STROKE_RADIAL => Op::StrokePaint(radial(rec)?),
        opcode::STROKE_IMAGE => Op::StrokePaint(Paint::Image(rec.prefixed_string()?)),
        opcode::STROKE_STREAM => Op::StrokePaint(Paint::Stream(rec.prefixed_string()?)),
        opcode::STROKE_WIDTH => Op::StrokeWidth(quarter_units(rec)?),
        opcode::CAP => {
            let cap = match enum_operand(rec)? {
                0 => LineCap::Butt,
                1 => LineCap::Round,
                2 => LineCap::Square,
                other => return Err(rec.invalid(other)),
            };
            Op::LineCap(cap)
        }
        opcode::JOIN => {
            let join = match enum_operand(rec)? {
                0 => LineJoin::Bevel,
                1 => LineJoin::Round,
                2 => LineJoin::Miter,
                other => return Err(rec.invalid(other)),
            };
            Op::LineJoin(join)
        }
        opcode::MITER_LIMIT => {
            rec.require(2)?;
            Op::MiterLimit(f32::from(rec.u16()?))
        }

        opcode::FONT => Op::Font(rec.prefixed_string()?),
        opcode::FONT_SIZE => Op::FontSize(quarter_units(rec)?),
        opcode::TEXT_ALIGN => {
            let align = match enum_operand(rec)? {
                0 => TextAlign::Left,
                1 => TextAlign::Center,
                2 => TextAlign::Right,
                other => return Err(rec.invalid(other)),
            };
            Op::TextAlign(align)
        }
        opcode::TEXT_BASE => {
            let base = match enum_operand(rec)? {
                0 => TextBaseline::Top,
                1 => TextBaseline::Middle,
                2 => TextBaseline::Alphabetic,
                3 => TextBaseline::Bottom,
                other => return Err(rec.invalid(other)),
            };
            Op::TextBaseline(base)
        }

        _ => {
            return Err(DecodeError::UnknownOpcode {
                opcode: tag,
                offset,
            });
        }
    };
    Ok(op)
}

/// Checks the whole record is present and consumes the reserved field.
fn reserved(rec: &mut Record<'_, '_>, body: usize) -> Result<(), DecodeError> {
    rec.require(2 + body)?;
    rec.skip(2)
}

fn bare(rec: &mut Record<'_, '_>, op: Op) -> Result<Op, DecodeError> {
    reserved(rec, 0)?;
    Ok(op)
}

fn enum_operand(rec: &mut Record<'_, '_>) -> Result<u32, DecodeError> {
    rec.require(2)?;
    rec.u16().map(u32::from)
}

/// Sizes travel as 16-bit fixed point with two fractional bits.
fn quarter_units(rec: &mut Record<'_, '_>) -> Result<f32, DecodeError> {
    rec.require(2)?;
    Ok(f32::from(rec.u16()?) / 4.0)
}

fn draw(rec: &mut Record<'_, '_>, layout: ShapeLayout) -> Result<Op, DecodeError> {
    rec.require(2 + layout.len())?;
    let flags = DrawFlags::from_bits(rec.u16()?);
    let shape = layout.read(rec)?;
    Ok(Op::Draw { shape, flags })
}

fn path_shape(rec: &mut Record<'_, '_>, layout: ShapeLayout) -> Result<Op, DecodeError> {
    reserved(rec, layout.len())?;
    layout.read(rec).map(Op::AddShape)
}

fn solid(rec: &mut Record<'_, '_>) -> Result<Paint, DecodeError> {
    reserved(rec, 4)?;
    rec.color().map(Paint::Color)
}

fn linear(rec: &mut Record<'_, '_>) -> Result<Paint, DecodeError> {
    reserved(rec, 24)?;
    Ok(Paint::Linear(LinearGradient {
        start: rec.point()?,
        end: rec.point()?,
        start_color: rec.color()?,
        end_color: rec.color()?,
    }))
}

fn radial(rec: &mut Record<'_, '_>) -> Result<Paint, DecodeError> {
    reserved(rec, 24)?;
    Ok(Paint::Radial(RadialGradient {
        center: rec.point()?,
        inner_radius: rec.f32()?,
        outer_radius: rec.f32()?,
        inner_color: rec.color()?,
        outer_color: rec.color()?,
    }))
}

fn sprite_rect(rec: &mut Record<'_, '_>) -> Result<SpriteRect, DecodeError> {
    Ok(SpriteRect {
        x: rec.f32()?,
        y: rec.f32()?,
        width: rec.f32()?,
        height: rec.f32()?,
    })
}

fn sprites(rec: &mut Record<'_, '_>) -> Result<Op, DecodeError> {
    rec.require(6)?;
    let id_len = usize::from(rec.u16()?);
    let count = rec.u32()?;
    let image = rec.padded_string(id_len)?;
    let body = usize::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(SPRITE_RECORD_LEN))
        .ok_or_else(|| rec.sprite_overflow(count))?;
    rec.require(body)?;

    let mut sprites = Vec::with_capacity(body / SPRITE_RECORD_LEN);
    for _ in 0..count {
        sprites.push(Sprite {
            src: sprite_rect(rec)?,
            dst: sprite_rect(rec)?,
            alpha: rec.f32()?,
        });
    }
    Ok(Op::DrawSprites { image, sprites })
}
