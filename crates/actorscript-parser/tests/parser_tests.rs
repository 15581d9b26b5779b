//! Parser tests: behavior markers, implicit block ends, switch frames,
//! argument quirks, truncation on bad input, and map invariants.

use actorscript_decoder::Encoder;
use actorscript_parser::{ParseResult, ParsedScript, Parser};
use actorscript_types::standard::catalog;
use actorscript_types::{ArgType, ArgValue, ErrorCode, OpKind, ScriptId};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

const END: u8 = 0x00;
const NOP: u8 = 0x01;
const IF: u8 = 0x0C;
const ELSE: u8 = 0x0F;
const BODY: u8 = 0x11;
const SET_DIRMODE: u8 = 0x1B;
const SET_DIRMODE_OBJ: u8 = 0x1C;
const END_BEHAVIOUR: u8 = 0x23;
const SET_VAR_GAME: u8 = 0x24;
const PLAY_VIDEO: u8 = 0x40;
const SWITCH: u8 = 0x71;
const CASE: u8 = 0x73;
const DEFAULT: u8 = 0x74;
const BREAK: u8 = 0x75;
const END_SWITCH: u8 = 0x76;

const MOVE_BODY: u8 = 0x02;
const MOVE_TRACK: u8 = 0x09;
const MOVE_STOP: u8 = 0x0B;

const COND_ZONE: u8 = 0x03;
const COND_VAR_GAME: u8 = 0x0F;
const COND_CHOICE: u8 = 0x1A;
const OP_EQ: u8 = 0x00;

fn parse_life(bytes: &[u8]) -> ParseResult {
    Parser::new(catalog(), ScriptId::life(1), bytes).parse()
}

fn parse_move(bytes: &[u8]) -> ParseResult {
    Parser::new(catalog(), ScriptId::moves(1), bytes).parse()
}

fn names(script: &ParsedScript) -> Vec<&'static str> {
    script.commands.iter().map(|c| c.name()).collect()
}

/// `IF VAR_GAME(var) == value`, returning the position of the jump slot.
fn if_var_game(e: &mut Encoder, var: u8, value: u16) -> usize {
    e.u8(IF).u8(COND_VAR_GAME).u8(var).u8(OP_EQ).u16(value);
    let slot = e.position();
    e.u16(0);
    slot
}

/// Opcode followed by a jump slot to patch later.
fn jump(e: &mut Encoder, opcode: u8) -> usize {
    e.u8(opcode);
    let slot = e.position();
    e.u16(0);
    slot
}

/// `CASE == value` with a u16 operand.
fn case_u16(e: &mut Encoder, value: u16) -> usize {
    let slot = jump(e, CASE);
    e.u8(OP_EQ).u16(value);
    slot
}

/// `CASE == value` with a u8 operand.
fn case_u8(e: &mut Encoder, value: u8) -> usize {
    let slot = jump(e, CASE);
    e.u8(OP_EQ).u8(value);
    slot
}

fn patch_here(e: &mut Encoder, slot: usize) {
    let here = e.position() as u16;
    e.patch_u16(slot, here);
}

fn number(script: &ParsedScript, cmd: usize, arg: usize) -> Option<i64> {
    script.commands[cmd].arg(arg).and_then(|a| a.value.as_number())
}

// ─────────────────────────────────────────────────────────────────────
// Behavior markers and tracks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_buffer() {
    let result = parse_life(&[]);
    assert!(result.script.is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_life_script_opens_behaviors() {
    let result = parse_life(&[NOP, END_BEHAVIOUR, NOP, END]);
    let s = &result.script;
    assert_eq!(
        names(s),
        vec!["BEHAVIOUR", "NOP", "END_BEHAVIOUR", "BEHAVIOUR", "NOP", "END"]
    );
    assert_eq!(s.behavior_map.get(&0), Some(&0));
    assert_eq!(s.behavior_map.get(&3), Some(&1));
    assert_eq!(number(s, 3, 0), Some(1));
    // Offsets that opened a behavior point at its marker.
    assert_eq!(s.index_of(0), Some(0));
    assert_eq!(s.index_of(2), Some(3));
    assert_eq!(s.index_of(3), Some(5));
    assert!(s.commands[0].is_synthetic());
}

#[test]
fn test_end_padding_does_not_open_behavior() {
    let result = parse_life(&[END, NOP]);
    assert_eq!(names(&result.script), vec!["END", "BEHAVIOUR", "NOP"]);
    assert_eq!(result.script.behavior_start(0), Some(1));
}

#[test]
fn test_move_script_has_no_markers_and_maps_tracks() {
    let bytes = Encoder::new()
        .u8(MOVE_TRACK)
        .u8(0)
        .u8(MOVE_BODY)
        .u8(1)
        .u8(MOVE_TRACK)
        .u8(7)
        .u8(MOVE_STOP)
        .finish();
    let s = parse_move(&bytes).script;
    assert_eq!(names(&s), vec!["TRACK", "BODY", "TRACK", "STOP"]);
    assert_eq!(s.track_map.get(&0), Some(&0));
    assert_eq!(s.track_map.get(&2), Some(&7));
    assert_eq!(s.track_start(7), Some(2));
    assert!(s.behavior_map.is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Conditionals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_implicit_endif_at_jump_target() {
    let mut e = Encoder::new();
    let slot = if_var_game(&mut e, 5, 1);
    e.u8(SET_VAR_GAME).u8(5).u16(3);
    patch_here(&mut e, slot);
    e.u8(END);
    let s = parse_life(&e.finish()).script;

    assert_eq!(
        names(&s),
        vec!["BEHAVIOUR", "IF", "SET_VAR_GAME", "ENDIF", "END"]
    );
    let cond = s.commands[1].condition.as_ref().unwrap();
    assert_eq!(cond.predicate.name, "VAR_GAME");
    assert_eq!(cond.param.as_ref().map(|p| &p.value), Some(&ArgValue::Number(5)));
    let op = s.commands[1].operator.as_ref().unwrap();
    assert_eq!(op.operand.spec.ty, ArgType::Uint16);
    assert_eq!(number(&s, 1, 0), Some(12));
    assert!(s.commands[1].arg(0).unwrap().hidden());
    // The jump target maps past the synthesized ENDIF.
    assert_eq!(s.index_of(12), Some(4));
}

#[test]
fn test_else_moves_block_end() {
    let mut e = Encoder::new();
    let if_slot = if_var_game(&mut e, 0, 1);
    e.u8(BODY).u8(1);
    let else_slot = jump(&mut e, ELSE);
    patch_here(&mut e, if_slot);
    e.u8(BODY).u8(2);
    patch_here(&mut e, else_slot);
    e.u8(END);
    let s = parse_life(&e.finish()).script;

    assert_eq!(
        names(&s),
        vec!["BEHAVIOUR", "IF", "BODY", "ELSE", "BODY", "ENDIF", "END"]
    );
}

#[test]
fn test_nested_ifs_sharing_a_target_close_twice() {
    let mut e = Encoder::new();
    let outer = if_var_game(&mut e, 0, 1);
    let inner = if_var_game(&mut e, 1, 1);
    e.u8(BODY).u8(1);
    patch_here(&mut e, outer);
    patch_here(&mut e, inner);
    e.u8(END);
    let s = parse_life(&e.finish()).script;

    assert_eq!(
        names(&s),
        vec!["BEHAVIOUR", "IF", "IF", "BODY", "ENDIF", "ENDIF", "END"]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Switches
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_switch_with_explicit_end() {
    let mut e = Encoder::new();
    e.u8(SWITCH).u8(COND_CHOICE);
    let case1 = case_u16(&mut e, 300);
    e.u8(BODY).u8(1);
    let break1 = jump(&mut e, BREAK);
    patch_here(&mut e, case1);
    e.u8(DEFAULT);
    e.u8(BODY).u8(2);
    e.u8(END_SWITCH);
    patch_here(&mut e, break1);
    e.u8(END);
    let s = parse_life(&e.finish()).script;

    assert_eq!(
        names(&s),
        vec![
            "BEHAVIOUR",
            "SWITCH",
            "CASE",
            "BODY",
            "BREAK",
            "DEFAULT",
            "BODY",
            "END_SWITCH",
            "END"
        ]
    );
    let op = s.commands[2].operator.as_ref().unwrap();
    assert_eq!(op.operand.value, ArgValue::Number(300));
    assert_eq!(op.operand.spec.ty, ArgType::Uint16);
    assert!(s.commands[2].condition.is_none());
}

#[test]
fn test_switch_without_end_gets_one() {
    let mut e = Encoder::new();
    e.u8(SWITCH).u8(COND_ZONE);
    let case1 = case_u8(&mut e, 3);
    e.u8(BODY).u8(1);
    let break1 = jump(&mut e, BREAK);
    patch_here(&mut e, case1);
    patch_here(&mut e, break1);
    e.u8(END);
    let s = parse_life(&e.finish()).script;

    assert_eq!(
        names(&s),
        vec!["BEHAVIOUR", "SWITCH", "CASE", "BODY", "BREAK", "END_SWITCH", "END"]
    );
    assert!(s.commands[5].is_synthetic());
}

#[test]
fn test_case_at_frame_end_keeps_switch_open() {
    let mut e = Encoder::new();
    e.u8(SWITCH).u8(COND_ZONE);
    let case1 = case_u8(&mut e, 1);
    e.u8(BODY).u8(1);
    patch_here(&mut e, case1);
    let case2 = case_u8(&mut e, 2);
    e.u8(BODY).u8(2);
    patch_here(&mut e, case2);
    e.u8(END_SWITCH);
    e.u8(END);
    let s = parse_life(&e.finish()).script;

    assert_eq!(
        names(&s),
        vec!["BEHAVIOUR", "SWITCH", "CASE", "BODY", "CASE", "BODY", "END_SWITCH", "END"]
    );
    assert!(s.commands.iter().all(|c| c.name() != "END_SWITCH" || !c.is_synthetic()));
}

#[test]
fn test_nested_switch_restores_outer_operand_type() {
    let mut e = Encoder::new();
    e.u8(SWITCH).u8(COND_CHOICE);
    let outer1 = case_u16(&mut e, 1000);
    e.u8(SWITCH).u8(COND_ZONE);
    let inner = case_u8(&mut e, 4);
    e.u8(BODY).u8(1);
    patch_here(&mut e, inner);
    e.u8(END_SWITCH);
    patch_here(&mut e, outer1);
    let outer2 = case_u16(&mut e, 2000);
    e.u8(BODY).u8(2);
    patch_here(&mut e, outer2);
    e.u8(END_SWITCH);
    e.u8(END);
    let result = parse_life(&e.finish());
    assert!(result.diagnostics.is_empty());
    let s = result.script;

    let cases: Vec<_> = s
        .commands
        .iter()
        .filter(|c| c.opcode.kind == OpKind::Case)
        .map(|c| c.operator.as_ref().unwrap().operand.clone())
        .collect();
    assert_eq!(cases.len(), 3);
    assert_eq!(cases[0].spec.ty, ArgType::Uint16);
    assert_eq!(cases[1].spec.ty, ArgType::Uint8);
    assert_eq!(cases[2].spec.ty, ArgType::Uint16);
    assert_eq!(cases[2].value, ArgValue::Number(2000));
}

#[test]
fn test_outer_case_at_inner_end_keeps_inner_switch_open() {
    let mut e = Encoder::new();
    e.u8(SWITCH).u8(COND_CHOICE);
    let outer1 = case_u16(&mut e, 1000);
    e.u8(SWITCH).u8(COND_ZONE);
    let inner = case_u8(&mut e, 4);
    e.u8(BODY).u8(1);
    patch_here(&mut e, outer1);
    patch_here(&mut e, inner);
    // Still inside the inner switch, so the operand is the ZONE byte.
    let outer2 = case_u8(&mut e, 7);
    e.u8(BODY).u8(2);
    patch_here(&mut e, outer2);
    e.u8(END_SWITCH).u8(END_SWITCH).u8(END);
    let result = parse_life(&e.finish());
    assert!(result.diagnostics.is_empty());
    let s = result.script;

    assert_eq!(
        names(&s),
        vec![
            "BEHAVIOUR", "SWITCH", "CASE", "SWITCH", "CASE", "BODY", "CASE", "BODY",
            "END_SWITCH", "END_SWITCH", "END",
        ]
    );
    assert!(s.commands.iter().all(|c| !c.is_synthetic() || c.name() == "BEHAVIOUR"));
    let late = s.commands[6].operator.as_ref().unwrap();
    assert_eq!(late.operand.spec.ty, ArgType::Uint8);
    assert_eq!(late.operand.value, ArgValue::Number(7));
}

// ─────────────────────────────────────────────────────────────────────
// Argument quirks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_dirmode_extra_argument() {
    let bytes = Encoder::new()
        .u8(SET_DIRMODE)
        .u8(2)
        .u8(5)
        .u8(SET_DIRMODE)
        .u8(9)
        .u8(40)
        .u8(SET_DIRMODE)
        .u8(1)
        .u8(SET_DIRMODE_OBJ)
        .u8(3)
        .u8(11)
        .u8(6)
        .u8(END)
        .finish();
    let s = parse_life(&bytes).script;

    assert_eq!(s.commands[1].args.len(), 2);
    assert_eq!(
        s.commands[1].arg(1).map(|a| a.role()),
        Some(actorscript_types::ArgRole::Actor)
    );
    assert_eq!(s.commands[2].args.len(), 2);
    assert_eq!(
        s.commands[2].arg(1).map(|a| a.role()),
        Some(actorscript_types::ArgRole::Value)
    );
    assert_eq!(s.commands[3].args.len(), 1);
    assert_eq!(s.commands[4].args.len(), 3);
    assert_eq!(number(&s, 4, 2), Some(6));
    assert_eq!(s.commands[5].name(), "END");
}

#[test]
fn test_string_argument() {
    let bytes = Encoder::new().u8(PLAY_VIDEO).string("INTRO").u8(END).finish();
    let s = parse_life(&bytes).script;
    assert_eq!(s.commands[1].arg(0).map(|a| &a.value), Some(&ArgValue::Text("INTRO".into())));
    assert_eq!(s.index_of(7), Some(2));
}

// ─────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_overrun_truncates_and_keeps_prefix() {
    let result = parse_life(&[NOP, SET_VAR_GAME, 5]);
    assert_eq!(names(&result.script), vec!["BEHAVIOUR", "NOP"]);
    assert_eq!(result.script.truncated_at, Some(1));
    assert!(result.diagnostics.contains(ErrorCode::DECODE_OVERRUN));
    let diag = &result.diagnostics.errors[0];
    assert_eq!(diag.location.to_string(), "0:1:life:2 offset=1");
    // Only offsets of surviving commands remain mapped.
    assert_eq!(result.script.index_of(0), Some(0));
    assert_eq!(result.script.index_of(1), None);
}

#[test]
fn test_unknown_opcode() {
    let result = parse_move(&[MOVE_STOP, 0xFF, MOVE_STOP]);
    assert_eq!(names(&result.script), vec!["STOP"]);
    assert!(result.diagnostics.contains(ErrorCode::UNKNOWN_OPCODE));
    assert!(result.diagnostics.errors[0].message.contains("0xFF"));
}

#[test]
fn test_unknown_condition() {
    let bytes = Encoder::new().u8(IF).u8(0xEE).u8(OP_EQ).u8(0).u16(0).finish();
    let result = parse_life(&bytes);
    assert!(result.diagnostics.contains(ErrorCode::UNKNOWN_PREDICATE));
    assert_eq!(names(&result.script), vec!["BEHAVIOUR"]);
}

#[test]
fn test_unknown_operator() {
    let bytes = Encoder::new().u8(IF).u8(COND_ZONE).u8(9).u8(0).u16(0).finish();
    let result = parse_life(&bytes);
    assert!(result.diagnostics.contains(ErrorCode::UNKNOWN_COMPARATOR));
}

#[test]
fn test_case_outside_switch() {
    let mut e = Encoder::new();
    case_u8(&mut e, 1);
    let result = parse_life(&e.finish());
    assert!(result.diagnostics.contains(ErrorCode::CASE_OUTSIDE_SWITCH));
}

#[test]
fn test_scene_index_in_diagnostics() {
    let result = Parser::new(catalog(), ScriptId::moves(4), &[0xFE])
        .with_scene(12)
        .parse();
    assert_eq!(result.diagnostics.errors[0].location.scene, 12);
    assert_eq!(result.diagnostics.errors[0].location.actor, 4);
}

// ─────────────────────────────────────────────────────────────────────
// Invariants and output
// ─────────────────────────────────────────────────────────────────────

fn mixed_script() -> Vec<u8> {
    let mut e = Encoder::new();
    let slot = if_var_game(&mut e, 2, 7);
    e.u8(BODY).u8(1);
    patch_here(&mut e, slot);
    e.u8(SWITCH).u8(COND_ZONE);
    let case1 = case_u8(&mut e, 1);
    e.u8(PLAY_VIDEO).string("A");
    let brk = jump(&mut e, BREAK);
    patch_here(&mut e, case1);
    patch_here(&mut e, brk);
    e.u8(END_BEHAVIOUR);
    e.u8(NOP);
    e.u8(END_BEHAVIOUR);
    e.u8(END);
    e.finish()
}

#[test]
fn test_offset_map_points_at_commands() {
    let s = parse_life(&mixed_script()).script;
    assert!(!s.offset_map.is_empty());
    for (&offset, &idx) in &s.offset_map {
        let cmd = &s.commands[idx];
        let direct = cmd.offset == Some(offset);
        let marker = cmd.opcode.kind == OpKind::Behaviour
            && cmd.is_synthetic()
            && s.commands.get(idx + 1).and_then(|c| c.offset) == Some(offset);
        assert!(direct || marker, "offset {offset} maps to {idx} ({cmd})");
    }
}

#[test]
fn test_listing() {
    let s = parse_life(&[NOP, END]).script;
    assert_eq!(s.to_string(), "   0 BEHAVIOUR 0\n   1 NOP\n   2 END\n");
}

#[test]
fn test_parsed_script_json() {
    let s = parse_life(&mixed_script()).script;
    let json = serde_json::to_string(&s).unwrap();
    assert!(json.contains("\"offset_map\""));
    assert!(json.contains("\"behavior_map\""));
    assert!(!json.contains("truncated_at"));
}

#[test]
fn test_parser_determinism_100_iterations() {
    let bytes = mixed_script();
    let first = serde_json::to_string(&parse_life(&bytes).script).unwrap();
    for i in 0..100 {
        let json = serde_json::to_string(&parse_life(&bytes).script).unwrap();
        assert_eq!(first, json, "Determinism failure at iteration {i}");
    }
}
