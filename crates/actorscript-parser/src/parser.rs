//! Script parser: one pass over the buffer, producing commands, an offset
//! map, and the behavior and track maps.
//!
//! Conditional blocks have no explicit terminator in the bytecode, only a
//! forward jump. The parser keeps the jump targets on a stack and emits an
//! `ENDIF` when the cursor reaches one. Switches work the same way with the
//! furthest `CASE`/`OR_CASE`/`BREAK` target. Life scripts get a `BEHAVIOUR`
//! marker at the start of every behavior block.

use std::collections::BTreeMap;

use actorscript_decoder::Decoder;
use actorscript_types::catalog::arg;
use actorscript_types::{
    ArgSpec, ArgValue, Command, Condition, DecodedArgument, Diagnostics, OpKind, OpcodeCatalog,
    OpcodeDescriptor, Operator, PredicateDescriptor, ScriptError, ScriptId, ScriptKind,
    ScriptLocation,
};
use tracing::{trace, warn};

use crate::{ParseError, ParsedScript};

/// `SET_DIRMODE` modes followed by an extra actor byte.
const DIRMODE_ACTOR_MODES: [i64; 5] = [2, 4, 6, 10, 11];
/// `SET_DIRMODE` mode followed by an extra plain byte.
const DIRMODE_VALUE_MODE: i64 = 9;

/// An open SWITCH.
#[derive(Debug, Clone, Copy)]
struct SwitchFrame {
    /// Furthest jump target seen among its case labels and breaks.
    end: Option<u32>,
    /// Predicate whose operand type the case labels decode with.
    predicate: &'static PredicateDescriptor,
}

/// Result of parsing one script.
pub struct ParseResult {
    /// Everything parsed before the first failure, if any.
    pub script: ParsedScript,
    pub diagnostics: Diagnostics,
}

/// Parser for one script buffer.
pub struct Parser<'a> {
    catalog: OpcodeCatalog,
    decoder: Decoder<'a>,
    scene: usize,
    script: ParsedScript,
    if_stack: Vec<u32>,
    switch_stack: Vec<SwitchFrame>,
    next_behavior: i64,
    new_behavior: bool,
    behavior_offsets: BTreeMap<u32, i64>,
    track_offsets: BTreeMap<u32, i64>,
}

impl<'a> Parser<'a> {
    pub fn new(catalog: OpcodeCatalog, id: ScriptId, bytes: &'a [u8]) -> Self {
        Self {
            catalog,
            decoder: Decoder::new(bytes),
            scene: 0,
            script: ParsedScript::empty(id),
            if_stack: Vec::new(),
            switch_stack: Vec::new(),
            next_behavior: 0,
            new_behavior: id.kind == ScriptKind::Life,
            behavior_offsets: BTreeMap::new(),
            track_offsets: BTreeMap::new(),
        }
    }

    /// Scene index reported in diagnostics.
    pub fn with_scene(mut self, scene: usize) -> Self {
        self.scene = scene;
        self
    }

    /// Parse the whole buffer.
    ///
    /// A decode failure stops this script only: the commands parsed so far
    /// are kept and the failure becomes a diagnostic.
    pub fn parse(mut self) -> ParseResult {
        let mut diagnostics = Diagnostics::empty();

        while !self.decoder.is_at_end() {
            let cursor = self.cursor();
            self.close_blocks(cursor);
            self.script
                .offset_map
                .insert(cursor, self.script.commands.len());

            if let Err(err) = self.step(cursor) {
                let id = self.script.id;
                warn!(
                    scene = self.scene,
                    actor = id.actor.0,
                    script = %id.kind,
                    offset = cursor,
                    error = %err,
                    "interrupted parsing script"
                );
                let location = ScriptLocation::new(self.scene, id)
                    .at_command(self.script.commands.len())
                    .at_offset(cursor);
                diagnostics.push_error(ScriptError::new(err.code(), err.to_string(), location));
                self.script.truncated_at = Some(cursor);
                break;
            }
        }

        self.finish(diagnostics)
    }

    fn finish(mut self, diagnostics: Diagnostics) -> ParseResult {
        let len = self.script.commands.len();
        self.script.offset_map.retain(|_, idx| *idx < len);

        let offsets = &self.script.offset_map;
        let rekey = |m: BTreeMap<u32, i64>| -> BTreeMap<usize, i64> {
            m.into_iter()
                .filter_map(|(offset, id)| offsets.get(&offset).map(|&idx| (idx, id)))
                .collect()
        };
        let behavior_map = rekey(std::mem::take(&mut self.behavior_offsets));
        let track_map = rekey(std::mem::take(&mut self.track_offsets));
        self.script.behavior_map = behavior_map;
        self.script.track_map = track_map;

        ParseResult {
            script: self.script,
            diagnostics,
        }
    }

    fn cursor(&self) -> u32 {
        self.decoder.position() as u32
    }

    // ── Implicit block ends ──────────────────────────────────────────────────

    fn close_blocks(&mut self, cursor: u32) {
        while self.if_stack.last() == Some(&cursor) {
            self.if_stack.pop();
            self.push_marker(OpKind::EndIf);
        }
        while self
            .switch_stack
            .last()
            .is_some_and(|frame| frame.end == Some(cursor))
            && !self.at_case_label()
        {
            self.switch_stack.pop();
            self.push_marker(OpKind::EndSwitch);
        }
    }

    /// Whether the opcode under the cursor is a case label or END_SWITCH.
    ///
    /// Labels are not attributed to a particular frame: one that belongs to
    /// an enclosing switch also keeps the innermost frame open.
    fn at_case_label(&self) -> bool {
        self.decoder
            .peek_u8()
            .and_then(|code| self.catalog.opcode(self.script.kind(), code))
            .is_some_and(|d| {
                matches!(
                    d.kind,
                    OpKind::Case | OpKind::OrCase | OpKind::Default | OpKind::EndSwitch
                )
            })
    }

    fn push_marker(&mut self, kind: OpKind) {
        let marker = self.catalog.marker(kind);
        self.script.commands.push(Command::synthetic(marker, Vec::new()));
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    fn step(&mut self, cursor: u32) -> Result<(), ParseError> {
        let code = self.decoder.peek_u8().unwrap_or(0);
        if self.new_behavior && code != 0 {
            self.start_behavior(cursor);
        }
        let command = self.command(cursor)?;
        trace!(offset = cursor, command = %command, "parsed");
        self.script.commands.push(command);
        Ok(())
    }

    fn start_behavior(&mut self, cursor: u32) {
        let id = self.next_behavior;
        self.next_behavior += 1;
        self.new_behavior = false;
        self.behavior_offsets.insert(cursor, id);
        let marker = self.catalog.marker(OpKind::Behaviour);
        self.script.commands.push(Command::synthetic(
            marker,
            vec![DecodedArgument::number(arg::LABEL, id)],
        ));
    }

    fn command(&mut self, cursor: u32) -> Result<Command, ParseError> {
        let code = self.decoder.read_u8()?;
        let opcode = self
            .catalog
            .opcode(self.script.kind(), code)
            .ok_or(ParseError::UnknownOpcode {
                code,
                offset: cursor,
            })?;

        let mut cmd = Command::new(opcode, cursor);
        if opcode.args_first {
            cmd.args = self.arguments(opcode)?;
        }
        self.condition_and_operator(opcode, &mut cmd)?;
        if !opcode.args_first {
            cmd.args = self.arguments(opcode)?;
        }

        self.track_blocks(opcode, &cmd, cursor);
        Ok(cmd)
    }

    fn condition_and_operator(
        &mut self,
        opcode: &'static OpcodeDescriptor,
        cmd: &mut Command,
    ) -> Result<(), ParseError> {
        let predicate = if opcode.has_condition {
            let at = self.cursor();
            let code = self.decoder.read_u8()?;
            let predicate = self
                .catalog
                .predicate(code)
                .ok_or(ParseError::UnknownPredicate { code, offset: at })?;
            let param = match predicate.param {
                Some(spec) => Some(self.argument(spec)?),
                None => None,
            };
            cmd.condition = Some(Condition { predicate, param });
            Some(predicate)
        } else {
            // Case labels compare against the enclosing switch's value.
            self.switch_stack.last().map(|frame| frame.predicate)
        };

        if !opcode.has_operator {
            return Ok(());
        }
        let Some(predicate) = predicate else {
            return Err(ParseError::CaseOutsideSwitch {
                offset: cmd.offset.unwrap_or_default(),
            });
        };
        let at = self.cursor();
        let code = self.decoder.read_u8()?;
        let comparator = self
            .catalog
            .comparator(code)
            .ok_or(ParseError::UnknownComparator { code, offset: at })?;
        let operand = self.argument(predicate.operand)?;
        cmd.operator = Some(Operator {
            comparator,
            operand,
        });
        Ok(())
    }

    fn arguments(
        &mut self,
        opcode: &'static OpcodeDescriptor,
    ) -> Result<Vec<DecodedArgument>, ParseError> {
        let mut args = opcode
            .args
            .iter()
            .map(|&spec| self.argument(spec))
            .collect::<Result<Vec<_>, _>>()?;

        if matches!(opcode.kind, OpKind::SetDirMode | OpKind::SetDirModeObj) {
            let extra = match args.last().and_then(|a| a.value.as_number()) {
                Some(mode) if DIRMODE_ACTOR_MODES.contains(&mode) => Some(arg::ACTOR),
                Some(DIRMODE_VALUE_MODE) => Some(arg::U8),
                _ => None,
            };
            if let Some(spec) = extra {
                args.push(self.argument(spec)?);
            }
        }
        Ok(args)
    }

    fn argument(&mut self, spec: ArgSpec) -> Result<DecodedArgument, ParseError> {
        Ok(DecodedArgument::new(spec, self.decoder.read(spec.ty)?))
    }

    // ── Block bookkeeping ────────────────────────────────────────────────────

    fn track_blocks(&mut self, opcode: &'static OpcodeDescriptor, cmd: &Command, cursor: u32) {
        let target = cmd
            .jump()
            .and_then(ArgValue::as_number)
            .map(|n| n as u32);

        if opcode.opens_block() {
            if let Some(t) = target {
                self.if_stack.push(t);
            }
            return;
        }

        match opcode.kind {
            OpKind::Else => {
                if let (Some(top), Some(t)) = (self.if_stack.last_mut(), target) {
                    *top = t;
                }
            }
            OpKind::Switch => {
                if let Some(cond) = &cmd.condition {
                    self.switch_stack.push(SwitchFrame {
                        end: None,
                        predicate: cond.predicate,
                    });
                }
            }
            OpKind::Case | OpKind::OrCase | OpKind::Break => {
                if let (Some(frame), Some(t)) = (self.switch_stack.last_mut(), target) {
                    frame.end = Some(frame.end.map_or(t, |end| end.max(t)));
                }
            }
            OpKind::EndSwitch => {
                self.switch_stack.pop();
            }
            OpKind::EndBehaviour => {
                self.new_behavior = true;
            }
            OpKind::Track => {
                if let Some(id) = cmd.arg(0).and_then(|a| a.value.as_number()) {
                    self.track_offsets.insert(cursor, id);
                }
            }
            _ => {}
        }
    }
}
