//! Shared types for the actor scripting engine.
//!
//! This crate defines the opcode catalog types and the stock tables, parsed
//! commands, script identities and locations, per-script runtime state, and
//! the diagnostics used across every pipeline stage.

mod error;
mod location;
pub mod catalog;
pub mod command;
pub mod standard;
mod state;

pub use catalog::{
    ArgRole, ArgSpec, ArgType, Comparator, ComparatorDescriptor, OpKind, OpcodeCatalog,
    OpcodeDescriptor, PredicateDescriptor, PredicateKind,
};
pub use command::{ArgValue, Command, Condition, DecodedArgument, Operator};
pub use error::{Diagnostics, ErrorCategory, ErrorCode, ScriptError, Severity, MAX_DIAGNOSTICS};
pub use location::{ActorId, PointId, ScriptId, ScriptKind, ScriptLocation};
pub use state::{ActorState, CallState, RuntimeState};

/// Result type used for single-diagnostic failures.
pub type Result<T> = std::result::Result<T, ScriptError>;
