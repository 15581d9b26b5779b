//! Opcode catalog types.
//!
//! A catalog is four read-only tables indexed by byte code: life opcodes,
//! move opcodes, condition predicates and comparison operators. Tables are
//! `&'static` slices built from `const` descriptors and resolved once at
//! startup; see [`crate::standard`] for the stock tables.

use crate::ScriptKind;
use serde::Serialize;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Argument signatures
// ══════════════════════════════════════════════════════════════════════════════

/// Wire type of one encoded argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArgType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    /// Zero-terminated byte string.
    String,
}

impl ArgType {
    /// Fixed encoded size in bytes, `None` for strings.
    pub const fn size(self) -> Option<usize> {
        match self {
            Self::Int8 | Self::Uint8 => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::Int32 | Self::Uint32 => Some(4),
            Self::String => None,
        }
    }
}

/// What an argument refers to once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgRole {
    /// Plain number or text.
    Value,
    /// Byte offset into the same script; rewritten to a command index at link time.
    Offset,
    /// Index into the scene's actor list.
    Actor,
    /// Index into the scene's point list.
    Point,
    /// Behavior or track label.
    Label,
}

/// Type signature entry for one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArgSpec {
    pub ty: ArgType,
    pub role: ArgRole,
    /// Hidden arguments are bookkeeping (jump targets) rather than user-facing values.
    pub hidden: bool,
}

impl ArgSpec {
    pub const fn new(ty: ArgType, role: ArgRole) -> Self {
        Self {
            ty,
            role,
            hidden: false,
        }
    }

    pub const fn hidden(self) -> Self {
        Self {
            hidden: true,
            ..self
        }
    }
}

/// Shorthands for the common argument specs.
pub mod arg {
    use super::{ArgRole, ArgSpec, ArgType};

    pub const I8: ArgSpec = ArgSpec::new(ArgType::Int8, ArgRole::Value);
    pub const U8: ArgSpec = ArgSpec::new(ArgType::Uint8, ArgRole::Value);
    pub const I16: ArgSpec = ArgSpec::new(ArgType::Int16, ArgRole::Value);
    pub const U16: ArgSpec = ArgSpec::new(ArgType::Uint16, ArgRole::Value);
    pub const I32: ArgSpec = ArgSpec::new(ArgType::Int32, ArgRole::Value);
    pub const U32: ArgSpec = ArgSpec::new(ArgType::Uint32, ArgRole::Value);
    pub const STRING: ArgSpec = ArgSpec::new(ArgType::String, ArgRole::Value);
    pub const ACTOR: ArgSpec = ArgSpec::new(ArgType::Uint8, ArgRole::Actor);
    pub const POINT: ArgSpec = ArgSpec::new(ArgType::Uint8, ArgRole::Point);
    pub const LABEL: ArgSpec = ArgSpec::new(ArgType::Uint8, ArgRole::Label);
    /// Jump target shown to nobody.
    pub const JUMP: ArgSpec = ArgSpec::new(ArgType::Uint16, ArgRole::Offset).hidden();
    /// Visible jump target (SET_BEHAVIOUR, GOTO).
    pub const OFFSET: ArgSpec = ArgSpec::new(ArgType::Uint16, ArgRole::Offset);
}

// ══════════════════════════════════════════════════════════════════════════════
// Opcodes
// ══════════════════════════════════════════════════════════════════════════════

/// Closed set of operations the engine knows how to execute.
///
/// Everything that is not control flow or script bookkeeping is `Host`:
/// the scheduler hands it to the embedding game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpKind {
    End,
    EndLife,
    Nop,
    Return,
    Offset,
    Goto,
    Stop,

    If,
    AndIf,
    OrIf,
    Swif,
    OneIf,
    Snif,
    NeverIf,
    NoIf,
    Else,
    EndIf,

    Switch,
    Case,
    OrCase,
    Default,
    Break,
    EndSwitch,

    Behaviour,
    SetBehaviour,
    SetBehaviourObj,
    EndBehaviour,
    SaveBehaviour,
    RestoreBehaviour,
    SaveBehaviourObj,
    RestoreBehaviourObj,

    Track,
    SetTrack,
    SetTrackObj,
    StopCurrentTrack,
    RestoreLastTrack,
    StopCurrentTrackObj,
    RestoreLastTrackObj,

    /// Direction mode; executed by the host, but its encoding has a
    /// mode-dependent trailing byte the parser must know about.
    SetDirMode,
    SetDirModeObj,

    WaitSeconds,
    WaitDeciseconds,

    Host,
}

/// Immutable catalog entry for one life or move opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpcodeDescriptor {
    pub code: u8,
    pub name: &'static str,
    pub kind: OpKind,
    /// Ordered argument type signature.
    pub args: &'static [ArgSpec],
    /// A condition predicate follows (before or after the arguments).
    pub has_condition: bool,
    /// A comparator and its operand follow the condition.
    pub has_operator: bool,
    /// Arguments are encoded before the condition/operator pair.
    pub args_first: bool,
    /// Each compiled instance owns a persistent scratch state.
    pub needs_call_state: bool,
    /// Chained conditional (OR_IF / AND_IF) that does not open a block.
    pub precondition: bool,
    /// Skipped when the scene runs headless (side scenes: audio, music).
    pub suppressed_in_headless_mode: bool,
    /// Byte layout unconfirmed; decoded as declared.
    pub layout_uncertain: bool,
}

impl OpcodeDescriptor {
    pub const fn new(code: u8, name: &'static str, kind: OpKind) -> Self {
        Self {
            code,
            name,
            kind,
            args: &[],
            has_condition: false,
            has_operator: false,
            args_first: false,
            needs_call_state: false,
            precondition: false,
            suppressed_in_headless_mode: false,
            layout_uncertain: false,
        }
    }

    /// Shorthand for a host-executed opcode.
    pub const fn host(code: u8, name: &'static str) -> Self {
        Self::new(code, name, OpKind::Host)
    }

    pub const fn args(self, args: &'static [ArgSpec]) -> Self {
        Self { args, ..self }
    }

    /// Condition predicate plus comparator.
    pub const fn conditional(self) -> Self {
        Self {
            has_condition: true,
            has_operator: true,
            ..self
        }
    }

    pub const fn condition_only(self) -> Self {
        Self {
            has_condition: true,
            ..self
        }
    }

    pub const fn operator_only(self) -> Self {
        Self {
            has_operator: true,
            ..self
        }
    }

    pub const fn args_first(self) -> Self {
        Self {
            args_first: true,
            ..self
        }
    }

    pub const fn call_state(self) -> Self {
        Self {
            needs_call_state: true,
            ..self
        }
    }

    pub const fn precondition(self) -> Self {
        Self {
            precondition: true,
            ..self
        }
    }

    pub const fn headless_skip(self) -> Self {
        Self {
            suppressed_in_headless_mode: true,
            ..self
        }
    }

    pub const fn uncertain(self) -> Self {
        Self {
            layout_uncertain: true,
            ..self
        }
    }

    /// Whether parsing this opcode opens an `if` block that must later be
    /// closed by a synthesized ENDIF.
    pub fn opens_block(&self) -> bool {
        self.has_condition && !self.precondition && !self.args.is_empty()
    }
}

impl fmt::Display for OpcodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Conditions and operators
// ══════════════════════════════════════════════════════════════════════════════

/// Predicates the engine evaluates itself; the rest go to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PredicateKind {
    /// Active track of the actor's own move script.
    CurrentTrack,
    /// Active track of another actor's move script.
    CurrentTrackObj,
    Host,
}

/// Condition catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredicateDescriptor {
    pub code: u8,
    pub name: &'static str,
    pub kind: PredicateKind,
    /// Optional parameter encoded right after the predicate code.
    pub param: Option<ArgSpec>,
    /// Type of the literal the comparator tests against.
    pub operand: ArgSpec,
}

impl PredicateDescriptor {
    pub const fn new(code: u8, name: &'static str, operand: ArgSpec) -> Self {
        Self {
            code,
            name,
            kind: PredicateKind::Host,
            param: None,
            operand,
        }
    }

    pub const fn param(self, param: ArgSpec) -> Self {
        Self {
            param: Some(param),
            ..self
        }
    }

    pub const fn kind(self, kind: PredicateKind) -> Self {
        Self { kind, ..self }
    }
}

/// Comparison applied to a condition value and a literal operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Comparator {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl Comparator {
    pub fn test(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Ne => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Ne => "!=",
        }
    }
}

/// Operator catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparatorDescriptor {
    pub code: u8,
    pub name: &'static str,
    pub comparator: Comparator,
}

impl ComparatorDescriptor {
    pub const fn new(code: u8, name: &'static str, comparator: Comparator) -> Self {
        Self {
            code,
            name,
            comparator,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════════════════════

/// The four dispatch tables used to parse and run scripts.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeCatalog {
    pub life: &'static [OpcodeDescriptor],
    pub moves: &'static [OpcodeDescriptor],
    pub conditions: &'static [PredicateDescriptor],
    pub operators: &'static [ComparatorDescriptor],
}

impl OpcodeCatalog {
    /// Table for one script kind.
    pub fn opcodes(&self, kind: ScriptKind) -> &'static [OpcodeDescriptor] {
        match kind {
            ScriptKind::Life => self.life,
            ScriptKind::Move => self.moves,
        }
    }

    /// Look up an opcode by byte code.
    ///
    /// Tables are indexed by code; an entry whose own code disagrees with its
    /// slot is treated as missing.
    pub fn opcode(&self, kind: ScriptKind, code: u8) -> Option<&'static OpcodeDescriptor> {
        self.opcodes(kind)
            .get(code as usize)
            .filter(|d| d.code == code)
    }

    pub fn predicate(&self, code: u8) -> Option<&'static PredicateDescriptor> {
        self.conditions
            .get(code as usize)
            .filter(|d| d.code == code)
    }

    pub fn comparator(&self, code: u8) -> Option<&'static ComparatorDescriptor> {
        self.operators
            .get(code as usize)
            .filter(|d| d.code == code)
    }

    /// First life opcode of the given kind, used to synthesize implicit
    /// commands (ENDIF, END_SWITCH, BEHAVIOUR). Falls back to a built-in
    /// descriptor when the catalog has none.
    pub fn marker(&self, kind: OpKind) -> &'static OpcodeDescriptor {
        if let Some(found) = self.life.iter().find(|d| d.kind == kind) {
            return found;
        }
        match kind {
            OpKind::EndIf => &FALLBACK_ENDIF,
            OpKind::EndSwitch => &FALLBACK_END_SWITCH,
            OpKind::Behaviour => &FALLBACK_BEHAVIOUR,
            _ => &FALLBACK_NOP,
        }
    }
}

static FALLBACK_ENDIF: OpcodeDescriptor = OpcodeDescriptor::new(0x10, "ENDIF", OpKind::EndIf);
static FALLBACK_END_SWITCH: OpcodeDescriptor =
    OpcodeDescriptor::new(0x76, "END_SWITCH", OpKind::EndSwitch);
static FALLBACK_BEHAVIOUR: OpcodeDescriptor =
    OpcodeDescriptor::new(0x20, "BEHAVIOUR", OpKind::Behaviour).args(&[arg::LABEL]);
static FALLBACK_NOP: OpcodeDescriptor = OpcodeDescriptor::new(0x01, "NOP", OpKind::Nop);

#[cfg(test)]
mod tests {
    use super::*;

    static LIFE: [OpcodeDescriptor; 3] = [
        OpcodeDescriptor::new(0x00, "END", OpKind::End),
        OpcodeDescriptor::new(0x01, "IF", OpKind::If)
            .args(&[arg::JUMP])
            .conditional(),
        OpcodeDescriptor::new(0x05, "MISPLACED", OpKind::Nop),
    ];

    fn catalog() -> OpcodeCatalog {
        OpcodeCatalog {
            life: &LIFE,
            moves: &[],
            conditions: &[],
            operators: &[],
        }
    }

    #[test]
    fn test_arg_type_sizes() {
        assert_eq!(ArgType::Int8.size(), Some(1));
        assert_eq!(ArgType::Uint16.size(), Some(2));
        assert_eq!(ArgType::Uint32.size(), Some(4));
        assert_eq!(ArgType::String.size(), None);
    }

    #[test]
    fn test_lookup_rejects_misplaced_entry() {
        let cat = catalog();
        assert_eq!(cat.opcode(ScriptKind::Life, 1).map(|d| d.name), Some("IF"));
        assert!(cat.opcode(ScriptKind::Life, 2).is_none());
        assert!(cat.opcode(ScriptKind::Move, 0).is_none());
    }

    #[test]
    fn test_opens_block() {
        assert!(LIFE[1].opens_block());
        let or_if = OpcodeDescriptor::new(0x37, "OR_IF", OpKind::OrIf)
            .args(&[arg::JUMP])
            .conditional()
            .precondition();
        assert!(!or_if.opens_block());
        let switch = OpcodeDescriptor::new(0x71, "SWITCH", OpKind::Switch).condition_only();
        assert!(!switch.opens_block());
    }

    #[test]
    fn test_marker_falls_back() {
        let cat = catalog();
        assert_eq!(cat.marker(OpKind::EndIf).name, "ENDIF");
        assert_eq!(cat.marker(OpKind::End).name, "END");
    }

    #[test]
    fn test_comparators() {
        assert!(Comparator::Eq.test(3, 3));
        assert!(Comparator::Gt.test(4, 3));
        assert!(Comparator::Lt.test(2, 3));
        assert!(Comparator::Ge.test(3, 3));
        assert!(Comparator::Le.test(3, 3));
        assert!(Comparator::Ne.test(1, 3));
        assert!(!Comparator::Ne.test(3, 3));
    }
}
