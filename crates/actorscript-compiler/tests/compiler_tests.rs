//! Linker and compiler tests: own and cross-actor jump resolution,
//! unresolved references, operand binding, sections, initial state, and the
//! scene pipeline as a whole.

use actorscript_compiler::{
    compile_scene, link_scene, parse_actor, ActorSource, CompiledScene, Operand, SceneSource,
    ScriptFingerprint,
};
use actorscript_decoder::Encoder;
use actorscript_types::standard::catalog;
use actorscript_types::{ActorId, ArgValue, Diagnostics, ErrorCode, OpKind, PointId, Severity};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

const END: u8 = 0x00;
const NOP: u8 = 0x01;
const IF: u8 = 0x0C;
const SWIF: u8 = 0x0D;
const SET_TRACK: u8 = 0x17;
const SET_TRACK_OBJ: u8 = 0x18;
const SET_BEHAVIOUR_OBJ: u8 = 0x22;
const END_BEHAVIOUR: u8 = 0x23;

const MOVE_GOTO_POINT: u8 = 0x04;
const MOVE_TRACK: u8 = 0x09;
const MOVE_STOP: u8 = 0x0B;

const COND_ZONE: u8 = 0x03;
const COND_DISTANCE: u8 = 0x02;
const OP_EQ: u8 = 0x00;

fn compile(scene: SceneSource<'_>) -> CompiledScene {
    compile_scene(catalog(), &scene)
}

/// Move script `TRACK 0, STOP, TRACK 5, STOP`; track 5 starts at byte 3.
fn two_tracks() -> Vec<u8> {
    Encoder::new()
        .u8(MOVE_TRACK)
        .u8(0)
        .u8(MOVE_STOP)
        .u8(MOVE_TRACK)
        .u8(5)
        .u8(MOVE_STOP)
        .finish()
}

/// Life script with two behaviors; the second starts at byte 2.
fn two_behaviors() -> Vec<u8> {
    vec![NOP, END_BEHAVIOUR, NOP, END]
}

// ─────────────────────────────────────────────────────────────────────
// Own-script jumps
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_if_jump_resolves_to_command_index() {
    let life = Encoder::new()
        .u8(IF)
        .u8(COND_ZONE)
        .u8(OP_EQ)
        .u8(1)
        .u16(6)
        .u8(NOP)
        .u8(END)
        .finish();
    let scene = compile(SceneSource::new(0).actor(&life, &[]));
    assert!(scene.diagnostics.is_empty());
    let script = &scene.actors[0].life;
    // marker, IF, ENDIF, NOP, END
    assert_eq!(script.instructions[1].target(), Some(3));
    assert_eq!(script.instructions[2].kind(), OpKind::EndIf);
}

#[test]
fn test_unresolved_jump_is_marked_and_reported() {
    let life = Encoder::new()
        .u8(IF)
        .u8(COND_ZONE)
        .u8(OP_EQ)
        .u8(1)
        .u16(99)
        .u8(END)
        .finish();
    let scene = compile(SceneSource::new(4).actor(&life, &[]));

    let operand = scene.actors[0].life.instructions[1].operand(0);
    assert_eq!(operand, Some(&Operand::Unresolved(99)));
    assert!(scene.diagnostics.contains(ErrorCode::UNRESOLVED_JUMP));
    let w = &scene.diagnostics.warnings[0];
    assert_eq!(w.severity, Severity::Warning);
    assert_eq!(w.location.to_string(), "4:0:life:1 offset=99");
}

// ─────────────────────────────────────────────────────────────────────
// Cross-script and cross-actor references
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_set_track_resolves_through_own_move_script() {
    let life = Encoder::new().u8(SET_TRACK).u16(3).u8(END).finish();
    let moves = two_tracks();
    let scene = compile(SceneSource::new(0).actor(&life, &moves));
    assert!(scene.diagnostics.is_empty());
    assert_eq!(
        scene.actors[0].life.instructions[1].operand(0),
        Some(&Operand::Target(2))
    );
    assert_eq!(scene.actors[0].moves.track_start(5), Some(2));
}

#[test]
fn test_set_track_obj_resolves_through_target_move_script() {
    let life = Encoder::new().u8(SET_TRACK_OBJ).u8(1).u16(3).u8(END).finish();
    let moves = two_tracks();
    let scene = compile(SceneSource::new(0).actor(&life, &[]).actor(&[], &moves));
    assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
    assert_eq!(
        scene.actors[0].life.instructions[1].operands,
        vec![Operand::Actor(ActorId(1)), Operand::Target(2)]
    );
}

#[test]
fn test_set_behaviour_obj_lands_on_behavior_marker() {
    let life0 = Encoder::new().u8(SET_BEHAVIOUR_OBJ).u8(1).u16(2).u8(END).finish();
    let life1 = two_behaviors();
    let scene = compile(SceneSource::new(0).actor(&life0, &[]).actor(&life1, &[]));
    let target = scene.actors[0].life.instructions[1].operand(1).cloned();
    assert_eq!(target, Some(Operand::Target(3)));
    assert_eq!(scene.actors[1].life.instructions[3].kind(), OpKind::Behaviour);
    assert_eq!(scene.actors[1].life.behavior_start(1), Some(3));
}

#[test]
fn test_cross_actor_reference_outside_scene() {
    let life = Encoder::new().u8(SET_TRACK_OBJ).u8(9).u16(0).u8(END).finish();
    let scene = compile(SceneSource::new(0).actor(&life, &[]));
    assert!(scene.diagnostics.contains(ErrorCode::UNKNOWN_TARGET_ACTOR));
    assert!(scene.diagnostics.contains(ErrorCode::UNKNOWN_ACTOR));
    assert_eq!(
        scene.actors[0].life.instructions[1].operands,
        vec![Operand::Unresolved(9), Operand::Unresolved(0)]
    );
}

#[test]
fn test_link_scene_directly() {
    let mut diagnostics = Diagnostics::empty();
    let life = Encoder::new().u8(SET_TRACK).u16(7).finish();
    let parsed = parse_actor(
        catalog(),
        2,
        0,
        &ActorSource {
            life: &life,
            moves: &two_tracks(),
        },
        &mut diagnostics,
    );
    let linked = link_scene(2, vec![parsed], &mut diagnostics);
    assert_eq!(
        linked[0].life.commands[1].jump(),
        Some(&ArgValue::Unresolved(7))
    );
    assert_eq!(diagnostics.total_warnings, 1);
    assert!(diagnostics.warnings[0].message.contains("SET_TRACK"));
}

// ─────────────────────────────────────────────────────────────────────
// Binding
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_point_operands_checked_against_layout() {
    let moves = Encoder::new()
        .u8(MOVE_GOTO_POINT)
        .u8(1)
        .u8(MOVE_GOTO_POINT)
        .u8(7)
        .u8(MOVE_STOP)
        .finish();
    let scene = compile(SceneSource::new(0).actor(&[], &moves).points(2));
    let ins = &scene.actors[0].moves.instructions;
    assert_eq!(ins[0].operand(0), Some(&Operand::Point(PointId(1))));
    assert_eq!(ins[1].operand(0), Some(&Operand::Unresolved(7)));
    assert!(scene.diagnostics.contains(ErrorCode::UNKNOWN_POINT));
    assert!(scene.diagnostics.has_errors());
}

#[test]
fn test_condition_param_and_operator_bound() {
    let life = Encoder::new()
        .u8(IF)
        .u8(COND_DISTANCE)
        .u8(0)
        .u8(0x02)
        .u16(500)
        .u16(8)
        .u8(END)
        .finish();
    let scene = compile(SceneSource::new(0).actor(&life, &[]));
    let ins = &scene.actors[0].life.instructions[1];
    let cond = ins.condition.as_ref().unwrap();
    assert_eq!(cond.predicate.name, "DISTANCE");
    assert_eq!(cond.param, Some(Operand::Actor(ActorId(0))));
    let op = ins.operator.unwrap();
    assert!(op.test(499));
    assert!(!op.test(500));
    assert_eq!(ins.to_string(), "1 IF DISTANCE(actor(0)) < 500 @3");
}

#[test]
fn test_call_state_only_where_needed() {
    let life = Encoder::new()
        .u8(SWIF)
        .u8(COND_ZONE)
        .u8(OP_EQ)
        .u8(1)
        .u16(6)
        .u8(END)
        .finish();
    let scene = compile(SceneSource::new(0).actor(&life, &[]));
    let ins = &scene.actors[0].life.instructions;
    assert!(ins[0].call_state.is_none());
    assert!(ins[1].call_state.is_some());
}

#[test]
fn test_labels_and_sections() {
    let life = two_behaviors();
    let moves = two_tracks();
    let scene = compile(SceneSource::new(0).actor(&life, &moves));
    let life = &scene.actors[0].life.instructions;
    assert_eq!(life[0].label, "0 BEHAVIOUR");
    assert_eq!(life[2].label, "2 END_BEHAVIOUR");
    let sections: Vec<_> = life.iter().map(|i| i.section).collect();
    assert_eq!(sections, vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]);
    let moves = &scene.actors[0].moves.instructions;
    let sections: Vec<_> = moves.iter().map(|i| i.section).collect();
    assert_eq!(sections, vec![Some(0), Some(0), Some(5), Some(5)]);
}

// ─────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_initial_state() {
    let life = two_behaviors();
    let scene = compile(SceneSource::new(0).actor(&life, &[]));
    let state = &scene.actors[0].state;
    assert_eq!(state.life.reentry, Some(0));
    assert!(state.moves.is_terminated(), "empty move script never runs");
}

#[test]
fn test_parse_failure_is_local_to_one_script() {
    let bad = [NOP, 0xFF];
    let good = two_behaviors();
    let scene = compile(SceneSource::new(0).actor(&bad, &[]).actor(&good, &two_tracks()));
    assert!(scene.diagnostics.contains(ErrorCode::UNKNOWN_OPCODE));
    assert_eq!(scene.actors[0].life.len(), 2);
    assert_eq!(scene.actors[1].life.len(), 6);
    assert_eq!(scene.actors[1].moves.len(), 4);
}

#[test]
fn test_fingerprint_tracks_bytes() {
    let a = compile(SceneSource::new(0).actor(&two_behaviors(), &[]));
    let b = compile(SceneSource::new(0).actor(&[NOP, END], &[]));
    assert_ne!(a.fingerprint, b.fingerprint);
    let again = ScriptFingerprint::of_actors(&[ActorSource {
        life: &two_behaviors(),
        moves: &[],
    }]);
    assert_eq!(a.fingerprint, again);
}

#[test]
fn test_operand_json() {
    let json = serde_json::to_string(&Operand::Actor(ActorId(3))).unwrap();
    assert_eq!(json, r#"{"kind":"actor","value":3}"#);
}

#[test]
fn test_diagnostics_determinism_100_iterations() {
    let life = Encoder::new()
        .u8(SET_TRACK_OBJ)
        .u8(4)
        .u16(1)
        .u8(IF)
        .u8(COND_ZONE)
        .u8(OP_EQ)
        .u8(1)
        .u16(77)
        .finish();
    let first = serde_json::to_string(&compile(SceneSource::new(1).actor(&life, &[])).diagnostics)
        .unwrap();
    for i in 0..100 {
        let json =
            serde_json::to_string(&compile(SceneSource::new(1).actor(&life, &[])).diagnostics)
                .unwrap();
        assert_eq!(first, json, "Determinism failure at iteration {i}");
    }
}
