//! The seam between the scheduler and the embedding game.
//!
//! The scheduler runs control flow and script bookkeeping itself. Every
//! other opcode, and every predicate except the track queries, goes to a
//! [`ScriptHost`].

use actorscript_compiler::Operand;
use actorscript_types::{ActorState, CallState, OpcodeDescriptor, PredicateDescriptor, ScriptId};
use serde::{Deserialize, Serialize};

use crate::HostError;

/// What the scheduler does after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    /// Continue with the next instruction.
    Advance,
    /// Continue at this instruction index within the same call.
    Jump(usize),
    /// Stop; the next call resumes at the same instruction.
    Suspend,
    /// Stop; the next call resumes at this instruction index.
    YieldTo(usize),
    /// Stop for good.
    Terminate,
}

/// Time injected by the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameTime {
    /// Seconds since the scene started.
    pub elapsed: f64,
    /// Seconds since the previous frame.
    pub delta: f64,
}

impl FrameTime {
    pub fn new(elapsed: f64, delta: f64) -> Self {
        Self { elapsed, delta }
    }

    /// The frame `delta` seconds later.
    pub fn next(self, delta: f64) -> Self {
        Self {
            elapsed: self.elapsed + delta,
            delta,
        }
    }
}

/// One host opcode invocation.
pub struct HostCall<'a> {
    pub script: ScriptId,
    pub opcode: &'static OpcodeDescriptor,
    /// Instruction index being executed.
    pub offset: usize,
    /// Present when the opcode asked for persistent scratch.
    pub call_state: Option<&'a mut CallState>,
    /// Predicate value, when the opcode carries a condition.
    pub condition: Option<i64>,
    /// Comparator result, when the opcode carries an operator.
    pub passed: Option<bool>,
    pub operands: &'a [Operand],
    pub time: FrameTime,
    /// Both scripts' state of the calling actor. Terminating `moves` from a
    /// life handler takes effect before the move script runs this frame.
    pub actor: &'a mut ActorState,
}

impl HostCall<'_> {
    /// Numeric operand, or a [`HostError::BadOperand`].
    pub fn number(&self, index: usize) -> Result<i64, HostError> {
        self.operands
            .get(index)
            .and_then(Operand::as_number)
            .ok_or_else(|| HostError::BadOperand {
                index,
                reason: format!("{} expects a number", self.opcode.name),
            })
    }
}

/// One host predicate evaluation.
pub struct PredicateQuery<'a> {
    pub script: ScriptId,
    pub predicate: &'static PredicateDescriptor,
    pub param: Option<&'a Operand>,
    pub time: FrameTime,
    pub actor: &'a ActorState,
}

/// Game-side implementation of host opcodes and predicates.
pub trait ScriptHost {
    fn execute(&mut self, call: HostCall<'_>) -> Result<Flow, HostError>;

    fn evaluate(&mut self, query: PredicateQuery<'_>) -> Result<i64, HostError>;
}

impl<H: ScriptHost + ?Sized> ScriptHost for &mut H {
    fn execute(&mut self, call: HostCall<'_>) -> Result<Flow, HostError> {
        (**self).execute(call)
    }

    fn evaluate(&mut self, query: PredicateQuery<'_>) -> Result<i64, HostError> {
        (**self).evaluate(query)
    }
}
