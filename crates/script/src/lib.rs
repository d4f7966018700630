//! Binary scene-script wire format.
//!
//! A script is a flat sequence of big-endian records, each a 16-bit opcode
//! followed by a fixed or length-prefixed operand layout. [`decode`] turns a
//! buffer into a `Vec<Op>` in one pass and rejects the whole buffer on the
//! first malformed record.

mod decode;
mod error;
pub mod op;
pub mod opcode;
mod reader;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use decode::decode;
pub use error::DecodeError;
pub use op::{
    ArcDirection, ClipMode, Color, CornerRadii, DrawFlags, LineCap, LineJoin, LinearGradient,
    Matrix, Op, Paint, Point, RadialGradient, Shape, Sprite, SpriteRect, TextAlign, TextBaseline,
};
