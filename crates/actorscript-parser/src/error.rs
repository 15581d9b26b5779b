use actorscript_decoder::DecodeError;
use actorscript_types::ErrorCode;
use thiserror::Error;

/// Why parsing of one script stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unknown opcode 0x{code:02X} at offset {offset}")]
    UnknownOpcode { code: u8, offset: u32 },

    #[error("unknown condition 0x{code:02X} at offset {offset}")]
    UnknownPredicate { code: u8, offset: u32 },

    #[error("unknown operator 0x{code:02X} at offset {offset}")]
    UnknownComparator { code: u8, offset: u32 },

    #[error("case label at offset {offset} has no enclosing SWITCH")]
    CaseOutsideSwitch { offset: u32 },
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Decode(_) => ErrorCode::DECODE_OVERRUN,
            Self::UnknownOpcode { .. } => ErrorCode::UNKNOWN_OPCODE,
            Self::UnknownPredicate { .. } => ErrorCode::UNKNOWN_PREDICATE,
            Self::UnknownComparator { .. } => ErrorCode::UNKNOWN_COMPARATOR,
            Self::CaseOutsideSwitch { .. } => ErrorCode::CASE_OUTSIDE_SWITCH,
        }
    }
}
