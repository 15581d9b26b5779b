//! Runtime fault types.

use actorscript_types::{ActorId, ErrorCode};
use thiserror::Error;

/// Failure reported by a host handler or predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host has no handler for this opcode or predicate.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// An operand did not have the shape the handler expects.
    #[error("bad operand {index}: {reason}")]
    BadOperand { index: usize, reason: String },
    #[error("{0}")]
    Failed(String),
}

/// Fault that stops one script. Never escalates past the scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeFault {
    /// Unresolved target, missing operand, or inconsistent state.
    #[error("broken script at {label}: {reason}")]
    BrokenScript { label: String, reason: String },
    /// Offset past the last instruction.
    #[error("invalid offset {offset}, script has {len} instructions")]
    Overrun { offset: usize, len: usize },
    /// Step budget used up within one call.
    #[error("step budget of {limit} exhausted")]
    GasExhausted { limit: u64 },
    #[error("host failed at {label}: {source}")]
    Host {
        label: String,
        #[source]
        source: HostError,
    },
    #[error("no actor {0} in scene")]
    UnknownActor(ActorId),
    #[error("snapshot does not match the scene's scripts")]
    SnapshotMismatch,
}

impl RuntimeFault {
    pub(crate) fn broken(label: &str, reason: impl Into<String>) -> Self {
        Self::BrokenScript {
            label: label.to_string(),
            reason: reason.into(),
        }
    }

    /// Diagnostic code this fault is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BrokenScript { .. } => ErrorCode::BROKEN_SCRIPT,
            Self::Overrun { .. } => ErrorCode::OFFSET_OVERRUN,
            Self::GasExhausted { .. } => ErrorCode::GAS_EXHAUSTED,
            Self::Host { .. } => ErrorCode::HOST_FAILURE,
            Self::UnknownActor(_) => ErrorCode::UNKNOWN_ACTOR,
            Self::SnapshotMismatch => ErrorCode::SNAPSHOT_MISMATCH,
        }
    }
}

/// Result alias for scheduler operations.
pub type RuntimeResult<T> = Result<T, RuntimeFault>;
