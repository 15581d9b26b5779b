//! Binds linked commands into executable instructions.
//!
//! Error codes emitted:
//! - E300: actor operand outside the scene
//! - E301: point operand outside the scene

use std::collections::BTreeMap;
use std::fmt;

use actorscript_types::{
    ActorId, ActorState, ArgRole, ArgValue, CallState, Command, ComparatorDescriptor,
    DecodedArgument, Diagnostics, ErrorCode, OpKind, OpcodeDescriptor, PointId,
    PredicateDescriptor, RuntimeState, ScriptError, ScriptId, ScriptKind, ScriptLocation,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::linker::{LinkedActor, LinkedScript};

// ══════════════════════════════════════════════════════════════════════════════
// Compiled forms
// ══════════════════════════════════════════════════════════════════════════════

/// Sizes the compiler checks actor and point operands against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SceneLayout {
    pub actor_count: usize,
    pub point_count: usize,
}

/// A resolved argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    Number(i64),
    Text(String),
    Actor(ActorId),
    Point(PointId),
    /// Instruction index.
    Target(usize),
    /// Reference that failed to link or bind; executing it is a fault.
    Unresolved(i64),
}

impl Operand {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_actor(&self) -> Option<ActorId> {
        match self {
            Self::Actor(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<usize> {
        match self {
            Self::Target(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Actor(a) => write!(f, "{a}"),
            Self::Point(p) => write!(f, "{p}"),
            Self::Target(t) => write!(f, "@{t}"),
            Self::Unresolved(o) => write!(f, "@?{o}"),
        }
    }
}

/// Predicate with its parameter resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundCondition {
    pub predicate: &'static PredicateDescriptor,
    pub param: Option<Operand>,
}

/// Comparator with its literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundOperator {
    pub comparator: &'static ComparatorDescriptor,
    pub operand: i64,
}

impl BoundOperator {
    /// Whether `value` passes the comparison.
    pub fn test(&self, value: i64) -> bool {
        self.comparator.comparator.test(value, self.operand)
    }
}

/// One executable unit.
#[derive(Debug)]
pub struct CompiledInstruction {
    pub opcode: &'static OpcodeDescriptor,
    /// `"<index> <NAME>"`, used in logs.
    pub label: String,
    /// Behavior (life) or track (move) the instruction belongs to.
    pub section: Option<i64>,
    /// Persistent scratch for multi-frame opcodes.
    pub call_state: Option<CallState>,
    pub condition: Option<BoundCondition>,
    pub operator: Option<BoundOperator>,
    pub operands: Vec<Operand>,
    /// Byte offset the command was read from.
    pub offset: Option<u32>,
}

impl CompiledInstruction {
    pub fn kind(&self) -> OpKind {
        self.opcode.kind
    }

    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }

    /// First operand as an instruction index.
    pub fn target(&self) -> Option<usize> {
        self.operands.first().and_then(Operand::as_target)
    }
}

impl fmt::Display for CompiledInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        if let Some(cond) = &self.condition {
            write!(f, " {}", cond.predicate.name)?;
            if let Some(param) = &cond.param {
                write!(f, "({param})")?;
            }
        }
        if let Some(op) = &self.operator {
            write!(f, " {} {}", op.comparator.comparator.symbol(), op.operand)?;
        }
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

/// Executable form of one script.
#[derive(Debug)]
pub struct CompiledScript {
    pub id: ScriptId,
    pub instructions: Vec<CompiledInstruction>,
    pub behavior_map: BTreeMap<usize, i64>,
    pub track_map: BTreeMap<usize, i64>,
}

impl CompiledScript {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction index of the TRACK declaring `track`.
    pub fn track_start(&self, track: i64) -> Option<usize> {
        self.track_map
            .iter()
            .find(|(_, id)| **id == track)
            .map(|(idx, _)| *idx)
    }

    /// Instruction index of behavior `behavior`'s entry marker.
    pub fn behavior_start(&self, behavior: i64) -> Option<usize> {
        self.behavior_map
            .iter()
            .find(|(_, id)| **id == behavior)
            .map(|(idx, _)| *idx)
    }
}

/// Both scripts of an actor and their shared state.
#[derive(Debug)]
pub struct CompiledActor {
    pub life: CompiledScript,
    pub moves: CompiledScript,
    pub state: ActorState,
}

impl CompiledActor {
    pub fn script(&self, kind: ScriptKind) -> &CompiledScript {
        match kind {
            ScriptKind::Life => &self.life,
            ScriptKind::Move => &self.moves,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Compiler
// ══════════════════════════════════════════════════════════════════════════════

/// Binds linked scripts against a scene layout.
pub struct Compiler<'a> {
    scene: usize,
    layout: SceneLayout,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Compiler<'a> {
    pub fn new(scene: usize, layout: SceneLayout, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            scene,
            layout,
            diagnostics,
        }
    }

    /// Compile both scripts and create the actor's state record. Empty
    /// scripts start terminated.
    pub fn compile_actor(&mut self, actor: LinkedActor) -> CompiledActor {
        let life = self.compile_script(actor.life);
        let moves = self.compile_script(actor.moves);
        let initial = |script: &CompiledScript| {
            if script.is_empty() {
                RuntimeState::terminated()
            } else {
                RuntimeState::new()
            }
        };
        let state = ActorState {
            life: initial(&life),
            moves: initial(&moves),
        };
        CompiledActor { life, moves, state }
    }

    pub fn compile_script(&mut self, script: LinkedScript) -> CompiledScript {
        let id = script.id;
        let sections = match id.kind {
            ScriptKind::Life => &script.behavior_map,
            ScriptKind::Move => &script.track_map,
        };

        let mut section = None;
        let mut instructions = Vec::with_capacity(script.commands.len());
        for (index, cmd) in script.commands.iter().enumerate() {
            if let Some(&s) = sections.get(&index) {
                section = Some(s);
            }
            instructions.push(self.compile_command(id, index, cmd, section));
        }
        debug!(
            scene = self.scene,
            actor = id.actor.0,
            script = %id.kind,
            instructions = instructions.len(),
            "compiled script"
        );

        CompiledScript {
            id,
            instructions,
            behavior_map: script.behavior_map,
            track_map: script.track_map,
        }
    }

    fn compile_command(
        &mut self,
        id: ScriptId,
        index: usize,
        cmd: &Command,
        section: Option<i64>,
    ) -> CompiledInstruction {
        let condition = cmd.condition.as_ref().map(|c| BoundCondition {
            predicate: c.predicate,
            param: c.param.as_ref().map(|p| self.operand(id, index, p)),
        });
        let operator = cmd.operator.as_ref().map(|op| BoundOperator {
            comparator: op.comparator,
            operand: op.operand.value.as_number().unwrap_or_default(),
        });
        let operands = cmd
            .args
            .iter()
            .map(|arg| self.operand(id, index, arg))
            .collect();

        CompiledInstruction {
            opcode: cmd.opcode,
            label: format!("{index} {}", cmd.opcode.name),
            section,
            call_state: cmd.opcode.needs_call_state.then(CallState::new),
            condition,
            operator,
            operands,
            offset: cmd.offset,
        }
    }

    fn operand(&mut self, id: ScriptId, index: usize, arg: &DecodedArgument) -> Operand {
        let n = match &arg.value {
            ArgValue::Number(n) => *n,
            ArgValue::Text(s) => return Operand::Text(s.clone()),
            ArgValue::Target(t) => return Operand::Target(*t),
            ArgValue::Unresolved(o) => return Operand::Unresolved(*o),
        };
        match arg.role() {
            ArgRole::Actor => match usize::try_from(n) {
                Ok(a) if a < self.layout.actor_count => Operand::Actor(ActorId(a)),
                _ => {
                    let message = format!("unknown actor {n}");
                    self.report(id, index, ErrorCode::UNKNOWN_ACTOR, message);
                    Operand::Unresolved(n)
                }
            },
            ArgRole::Point => match usize::try_from(n) {
                Ok(p) if p < self.layout.point_count => Operand::Point(PointId(p)),
                _ => {
                    let message = format!("unknown point {n}");
                    self.report(id, index, ErrorCode::UNKNOWN_POINT, message);
                    Operand::Unresolved(n)
                }
            },
            // A raw offset here means the linker never saw this argument.
            ArgRole::Offset => Operand::Unresolved(n),
            ArgRole::Value | ArgRole::Label => Operand::Number(n),
        }
    }

    fn report(&mut self, id: ScriptId, index: usize, code: ErrorCode, message: String) {
        let location = ScriptLocation::new(self.scene, id).at_command(index);
        warn!(location = %location, code = %code, "{message}");
        self.diagnostics
            .push_error(ScriptError::new(code, message, location));
    }
}
