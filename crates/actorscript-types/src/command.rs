//! Parsed commands: opcode + decoded arguments + optional condition/operator.

use crate::catalog::{ArgRole, ArgSpec, ComparatorDescriptor, OpcodeDescriptor, PredicateDescriptor};
use serde::Serialize;
use std::fmt;

/// Decoded value of one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Number(i64),
    Text(String),
    /// Command index a jump lands on, after linking.
    Target(usize),
    /// Jump whose byte offset had no command; executing it is a fault.
    Unresolved(i64),
}

impl ArgValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<usize> {
        match self {
            Self::Target(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Target(t) => write!(f, "@{t}"),
            Self::Unresolved(o) => write!(f, "@?{o}"),
        }
    }
}

/// One argument as read from the bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedArgument {
    pub spec: ArgSpec,
    pub value: ArgValue,
}

impl DecodedArgument {
    pub fn new(spec: ArgSpec, value: ArgValue) -> Self {
        Self { spec, value }
    }

    pub fn number(spec: ArgSpec, n: i64) -> Self {
        Self::new(spec, ArgValue::Number(n))
    }

    pub fn hidden(&self) -> bool {
        self.spec.hidden
    }

    pub fn role(&self) -> ArgRole {
        self.spec.role
    }
}

/// Predicate and its optional parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub predicate: &'static PredicateDescriptor,
    pub param: Option<DecodedArgument>,
}

/// Comparator and the literal it compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub comparator: &'static ComparatorDescriptor,
    pub operand: DecodedArgument,
}

/// One parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub opcode: &'static OpcodeDescriptor,
    pub args: Vec<DecodedArgument>,
    pub condition: Option<Condition>,
    pub operator: Option<Operator>,
    /// Byte offset of the opcode byte; `None` for commands the parser
    /// synthesized (ENDIF, END_SWITCH, behavior markers).
    pub offset: Option<u32>,
}

impl Command {
    /// A command read from the buffer at `offset`.
    pub fn new(opcode: &'static OpcodeDescriptor, offset: u32) -> Self {
        Self {
            opcode,
            args: Vec::new(),
            condition: None,
            operator: None,
            offset: Some(offset),
        }
    }

    /// A command with no bytes of its own.
    pub fn synthetic(opcode: &'static OpcodeDescriptor, args: Vec<DecodedArgument>) -> Self {
        Self {
            opcode,
            args,
            condition: None,
            operator: None,
            offset: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.offset.is_none()
    }

    pub fn name(&self) -> &'static str {
        self.opcode.name
    }

    pub fn arg(&self, index: usize) -> Option<&DecodedArgument> {
        self.args.get(index)
    }

    /// First argument's value, the jump target for every branching opcode.
    pub fn jump(&self) -> Option<&ArgValue> {
        self.args.first().map(|a| &a.value)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.name)?;
        if let Some(cond) = &self.condition {
            write!(f, " {}", cond.predicate.name)?;
            if let Some(param) = &cond.param {
                write!(f, "({})", param.value)?;
            }
        }
        if let Some(op) = &self.operator {
            write!(f, " {} {}", op.comparator.comparator.symbol(), op.operand.value)?;
        }
        for arg in &self.args {
            if arg.hidden() {
                write!(f, " -> {}", arg.value)?;
            } else {
                write!(f, " {}", arg.value)?;
            }
        }
        Ok(())
    }
}
