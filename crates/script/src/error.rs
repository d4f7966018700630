use thiserror::Error;

/// Reasons a script buffer is rejected. Offsets point at the start of the
/// failing record (its opcode), not at the failing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported opcode 0x{opcode:04x} at byte {offset}")]
    UnknownOpcode { opcode: u16, offset: usize },

    #[error("{op} truncated at byte {offset}: needs {needed} bytes, {available} left")]
    Truncated {
        op: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{op} at byte {offset} has invalid operand {value}")]
    InvalidOperand {
        op: &'static str,
        offset: usize,
        value: u32,
    },

    #[error("draw_sprites at byte {offset}: sprite count {count} overflows")]
    SpriteOverflow { offset: usize, count: u32 },

    #[error("stray byte at offset {offset} after the last record")]
    TrailingByte { offset: usize },
}

impl DecodeError {
    /// Byte offset of the record that failed.
    pub const fn offset(&self) -> usize {
        match self {
            Self::UnknownOpcode { offset, .. }
            | Self::Truncated { offset, .. }
            | Self::InvalidOperand { offset, .. }
            | Self::SpriteOverflow { offset, .. }
            | Self::TrailingByte { offset } => *offset,
        }
    }
}
