//! Stock opcode catalog.
//!
//! Slot `n` of every table holds the descriptor for byte code `n`.

use crate::catalog::arg::{ACTOR, I16, JUMP, LABEL, OFFSET, POINT, STRING, U16, U32, U8};
use crate::catalog::{
    Comparator, ComparatorDescriptor as Cmp, OpKind, OpcodeCatalog, OpcodeDescriptor,
    PredicateDescriptor as Pred, PredicateKind,
};

const fn op(code: u8, name: &'static str, kind: OpKind) -> OpcodeDescriptor {
    OpcodeDescriptor::new(code, name, kind)
}

const fn h(code: u8, name: &'static str) -> OpcodeDescriptor {
    OpcodeDescriptor::host(code, name)
}

/// The stock catalog.
pub fn catalog() -> OpcodeCatalog {
    OpcodeCatalog {
        life: LIFE_OPCODES,
        moves: MOVE_OPCODES,
        conditions: CONDITIONS,
        operators: OPERATORS,
    }
}

pub static LIFE_OPCODES: &[OpcodeDescriptor] = &[
    op(0x00, "END", OpKind::End),
    op(0x01, "NOP", OpKind::Nop),
    op(0x02, "SNIF", OpKind::Snif).args(&[JUMP]).conditional(),
    // The old interpreter reads a u16 target after OFFSET.
    op(0x03, "OFFSET", OpKind::Offset).args(&[JUMP]),
    op(0x04, "NEVERIF", OpKind::NeverIf).args(&[JUMP]).conditional(),
    op(0x05, "UNKNOWN(0x05)", OpKind::Nop),
    op(0x06, "UNKNOWN(0x06)", OpKind::Nop),
    op(0x07, "UNKNOWN(0x07)", OpKind::Nop),
    op(0x08, "UNKNOWN(0x08)", OpKind::Nop),
    op(0x09, "UNKNOWN(0x09)", OpKind::Nop),
    h(0x0A, "PALETTE").args(&[U8]),
    op(0x0B, "RETURN", OpKind::Return),
    op(0x0C, "IF", OpKind::If).args(&[JUMP]).conditional(),
    op(0x0D, "SWIF", OpKind::Swif).args(&[JUMP]).conditional().call_state(),
    op(0x0E, "ONEIF", OpKind::OneIf).args(&[JUMP]).conditional().call_state(),
    op(0x0F, "ELSE", OpKind::Else).args(&[JUMP]),
    op(0x10, "ENDIF", OpKind::EndIf),
    h(0x11, "BODY").args(&[U8]),
    h(0x12, "BODY_OBJ").args(&[ACTOR, U8]),
    h(0x13, "ANIM").args(&[U16]),
    h(0x14, "ANIM_OBJ").args(&[ACTOR, U16]),
    h(0x15, "SET_CAMERA").args(&[U8, U8]),
    h(0x16, "CAMERA_CENTER").args(&[U8]),
    // Raw offset into the actor's own move script, resolved by the linker.
    op(0x17, "SET_TRACK", OpKind::SetTrack).args(&[U16]),
    op(0x18, "SET_TRACK_OBJ", OpKind::SetTrackObj).args(&[ACTOR, U16]),
    h(0x19, "MESSAGE").args(&[U16]).call_state(),
    h(0x1A, "CAN_FALL").args(&[U8]),
    op(0x1B, "SET_DIRMODE", OpKind::SetDirMode).args(&[U8]),
    op(0x1C, "SET_DIRMODE_OBJ", OpKind::SetDirModeObj).args(&[ACTOR, U8]),
    h(0x1D, "CAM_FOLLOW").args(&[ACTOR]),
    h(0x1E, "SET_HERO_BEHAVIOUR").args(&[U8]),
    h(0x1F, "SET_VAR_CUBE").args(&[U8, U8]),
    op(0x20, "BEHAVIOUR", OpKind::Behaviour).args(&[LABEL]),
    op(0x21, "SET_BEHAVIOUR", OpKind::SetBehaviour).args(&[OFFSET]),
    op(0x22, "SET_BEHAVIOUR_OBJ", OpKind::SetBehaviourObj).args(&[ACTOR, U16]),
    op(0x23, "END_BEHAVIOUR", OpKind::EndBehaviour),
    h(0x24, "SET_VAR_GAME").args(&[U8, U16]),
    h(0x25, "KILL_OBJ").args(&[ACTOR]),
    h(0x26, "SUICIDE"),
    h(0x27, "USE_ONE_LITTLE_KEY"),
    h(0x28, "SUB_MONEY").args(&[I16]),
    op(0x29, "END_LIFE", OpKind::EndLife),
    op(0x2A, "STOP_CURRENT_TRACK", OpKind::StopCurrentTrack),
    op(0x2B, "RESTORE_LAST_TRACK", OpKind::RestoreLastTrack),
    h(0x2C, "MESSAGE_OBJ").args(&[ACTOR, U16]).call_state(),
    h(0x2D, "INC_CHAPTER"),
    h(0x2E, "FOUND_OBJECT").args(&[U8]).call_state(),
    h(0x2F, "SET_DOOR_LEFT").args(&[I16]),
    h(0x30, "SET_DOOR_RIGHT").args(&[I16]),
    h(0x31, "SET_DOOR_UP").args(&[I16]),
    h(0x32, "SET_DOOR_DOWN").args(&[I16]),
    h(0x33, "GIVE_BONUS").args(&[U8]),
    h(0x34, "CHANGE_CUBE").args(&[U8]),
    h(0x35, "OBJ_COL").args(&[U8]),
    h(0x36, "BRICK_COL").args(&[U8]),
    op(0x37, "OR_IF", OpKind::OrIf).args(&[JUMP]).conditional().precondition(),
    h(0x38, "INVISIBLE").args(&[U8]),
    h(0x39, "SHADOW_OBJ").args(&[ACTOR, U8]),
    h(0x3A, "POS_POINT").args(&[POINT]),
    h(0x3B, "SET_MAGIC_LEVEL").args(&[U8]),
    h(0x3C, "SUB_MAGIC_POINT").args(&[U8]),
    h(0x3D, "SET_LIFE_POINT_OBJ").args(&[ACTOR, U8]),
    h(0x3E, "SUB_LIFE_POINT_OBJ").args(&[ACTOR, U8]),
    h(0x3F, "HIT").args(&[ACTOR, U8]),
    h(0x40, "PLAY_VIDEO").args(&[STRING]).call_state(),
    h(0x41, "ECLAIR").args(&[U8]),
    h(0x42, "INC_CLOVER_BOX"),
    h(0x43, "SET_USED_INVENTORY").args(&[U8]),
    h(0x44, "ADD_CHOICE").args(&[U16]),
    h(0x45, "ASK_CHOICE").args(&[U16]).call_state(),
    h(0x46, "INIT_BUGGY").args(&[U8]),
    h(0x47, "MEMO_SLATE").args(&[U8]),
    h(0x48, "SET_HOLO_POS").args(&[U8]),
    h(0x49, "CLR_HOLO_POS").args(&[U8]),
    h(0x4A, "ADD_FUEL").args(&[U8]),
    h(0x4B, "SUB_FUEL").args(&[U8]),
    h(0x4C, "SET_FRAGMENT").args(&[U8, U8]),
    h(0x4D, "SET_TELEPORT_ZONE").args(&[U8, U8]),
    h(0x4E, "MESSAGE_ZOE").args(&[U16]).call_state(),
    h(0x4F, "FULL_POINT"),
    h(0x50, "BETA").args(&[I16]),
    h(0x51, "FADE_TO_PAL").args(&[U8]),
    h(0x52, "ACTION"),
    h(0x53, "SET_FRAME").args(&[U8]),
    h(0x54, "SET_SPRITE").args(&[U16]),
    h(0x55, "SET_FRAME_3DS").args(&[U8]),
    h(0x56, "IMPACT_OBJ").args(&[ACTOR, U16, U16]),
    h(0x57, "IMPACT_POINT").args(&[U8, U16]),
    h(0x58, "ADD_MESSAGE").args(&[U16]).call_state(),
    h(0x59, "BALLOON").args(&[U8]),
    h(0x5A, "NO_SHOCK").args(&[U8]),
    h(0x5B, "ASK_CHOICE_OBJ").args(&[ACTOR, U16]).call_state(),
    h(0x5C, "CINEMA_MODE").args(&[U8]),
    h(0x5D, "SAVE_HERO"),
    h(0x5E, "RESTORE_HERO"),
    h(0x5F, "ANIM_SET").args(&[U16]),
    h(0x60, "RAIN").args(&[U8]),
    h(0x61, "GAME_OVER"),
    h(0x62, "THE_END"),
    h(0x63, "CONVEYOR").args(&[U8, U8]),
    h(0x64, "PLAY_MUSIC").args(&[U8]).headless_skip(),
    h(0x65, "TRACK_TO_VAR_GAME").args(&[U8]),
    h(0x66, "VAR_GAME_TO_TRACK").args(&[U8]),
    h(0x67, "ANIM_TEXTURE").args(&[U8]),
    h(0x68, "ADD_MESSAGE_OBJ").args(&[ACTOR, U16]),
    h(0x69, "BRUTAL_EXIT"),
    h(0x6A, "REPLACE"),
    h(0x6B, "LADDER").args(&[U8, U8]),
    h(0x6C, "SET_ARMOR").args(&[U8]),
    h(0x6D, "SET_ARMOR_OBJ").args(&[ACTOR, U8]),
    h(0x6E, "ADD_LIFE_POINT_OBJ").args(&[ACTOR, U8]),
    h(0x6F, "STATE_INVENTORY").args(&[U8, U8]),
    op(0x70, "AND_IF", OpKind::AndIf).args(&[JUMP]).conditional().precondition(),
    op(0x71, "SWITCH", OpKind::Switch).condition_only(),
    op(0x72, "OR_CASE", OpKind::OrCase).args(&[JUMP]).args_first().operator_only(),
    op(0x73, "CASE", OpKind::Case).args(&[JUMP]).args_first().operator_only(),
    op(0x74, "DEFAULT", OpKind::Default),
    op(0x75, "BREAK", OpKind::Break).args(&[JUMP]),
    op(0x76, "END_SWITCH", OpKind::EndSwitch),
    h(0x77, "SET_SPIKE_ZONE").args(&[U8, U8]),
    op(0x78, "SAVE_BEHAVIOUR", OpKind::SaveBehaviour),
    op(0x79, "RESTORE_BEHAVIOUR", OpKind::RestoreBehaviour),
    h(0x7A, "SAMPLE").args(&[U16]).headless_skip(),
    h(0x7B, "SAMPLE_RND").args(&[U16]).headless_skip(),
    h(0x7C, "SAMPLE_ALWAYS").args(&[U16]).headless_skip(),
    h(0x7D, "SAMPLE_STOP").args(&[U16]).headless_skip(),
    h(0x7E, "REPEAT_SAMPLE").args(&[U16, U8]).headless_skip(),
    h(0x7F, "BACKGROUND").args(&[U8]),
    h(0x80, "ADD_VAR_GAME").args(&[U8, U16]),
    h(0x81, "SUB_VAR_GAME").args(&[U8, U16]),
    h(0x82, "ADD_VAR_CUBE").args(&[U8, U8]),
    h(0x83, "SUB_VAR_CUBE").args(&[U8, U8]),
    op(0x84, "UNKNOWN(0x84)", OpKind::Nop),
    h(0x85, "SET_RAIL").args(&[U8, U8]),
    h(0x86, "INVERSE_BETA"),
    h(0x87, "NO_BODY"),
    h(0x88, "ADD_MONEY").args(&[U16]),
    op(0x89, "STOP_CURRENT_TRACK_OBJ", OpKind::StopCurrentTrackObj).args(&[ACTOR]),
    op(0x8A, "RESTORE_LAST_TRACK_OBJ", OpKind::RestoreLastTrackObj).args(&[ACTOR]),
    op(0x8B, "SAVE_BEHAVIOUR_OBJ", OpKind::SaveBehaviourObj).args(&[ACTOR]),
    op(0x8C, "RESTORE_BEHAVIOUR_OBJ", OpKind::RestoreBehaviourObj).args(&[ACTOR]),
    h(0x8D, "SPY").args(&[U8]),
    h(0x8E, "DEBUG"),
    h(0x8F, "DEBUG_OBJ").args(&[ACTOR]),
    h(0x90, "POPCORN"),
    h(0x91, "FLOW_POINT").args(&[U8, U8]),
    h(0x92, "FLOW_OBJ").args(&[ACTOR, U8]),
    h(0x93, "SET_ANIM_DIAL").args(&[U16]),
    h(0x94, "PCX").args(&[U16]),
    h(0x95, "END_MESSAGE"),
    h(0x96, "END_MESSAGE_OBJ").args(&[ACTOR]),
    h(0x97, "PARM_SAMPLE")
        .args(&[U16, U8, U16])
        .headless_skip()
        .uncertain(),
    h(0x98, "NEW_SAMPLE").args(&[U16, U16, U8, U16]).headless_skip(),
    h(0x99, "POS_OBJ_AROUND").args(&[ACTOR, U8]),
    h(0x9A, "PCX_MESS_OBJ").args(&[ACTOR, U16, U16]),
];

pub static MOVE_OPCODES: &[OpcodeDescriptor] = &[
    op(0x00, "END", OpKind::End),
    op(0x01, "NOP", OpKind::Nop),
    h(0x02, "BODY").args(&[U8]),
    h(0x03, "ANIM").args(&[U16]),
    h(0x04, "GOTO_POINT").args(&[POINT]),
    h(0x05, "WAIT_ANIM"),
    h(0x06, "LOOP"),
    h(0x07, "ANGLE").args(&[I16]),
    h(0x08, "POS_POINT").args(&[POINT]),
    op(0x09, "TRACK", OpKind::Track).args(&[LABEL]),
    op(0x0A, "GOTO", OpKind::Goto).args(&[OFFSET]),
    op(0x0B, "STOP", OpKind::Stop),
    h(0x0C, "GOTO_SYM_POINT").args(&[POINT]),
    h(0x0D, "WAIT_NUM_ANIM").args(&[U8, U8]),
    h(0x0E, "SAMPLE").args(&[U16]).headless_skip(),
    h(0x0F, "GOTO_POINT_3D").args(&[POINT]),
    h(0x10, "SPEED").args(&[U16]),
    h(0x11, "BACKGROUND").args(&[U8]),
    op(0x12, "WAIT_NUM_SECOND", OpKind::WaitSeconds)
        .args(&[U8, U32])
        .call_state(),
    h(0x13, "NO_BODY"),
    h(0x14, "BETA").args(&[I16]),
    h(0x15, "OPEN_LEFT").args(&[I16]),
    h(0x16, "OPEN_RIGHT").args(&[I16]),
    h(0x17, "OPEN_UP").args(&[I16]),
    h(0x18, "OPEN_DOWN").args(&[I16]),
    h(0x19, "CLOSE"),
    h(0x1A, "WAIT_DOOR"),
    h(0x1B, "SAMPLE_RND").args(&[I16]).headless_skip(),
    h(0x1C, "SAMPLE_ALWAYS").args(&[I16]).headless_skip(),
    h(0x1D, "SAMPLE_STOP").args(&[I16]).headless_skip(),
    h(0x1E, "PLAY_VIDEO"),
    h(0x1F, "REPEAT_SAMPLE").args(&[I16]).headless_skip(),
    h(0x20, "SIMPLE_SAMPLE").args(&[I16]).headless_skip(),
    h(0x21, "FACE_HERO").args(&[U16]),
    h(0x22, "ANGLE_RND").args(&[I16, U16]),
    h(0x23, "REPLACE"),
    op(0x24, "WAIT_NUM_DSEC", OpKind::WaitDeciseconds)
        .args(&[U8, U32])
        .call_state(),
    h(0x25, "DO"),
    h(0x26, "SPRITE").args(&[I16]),
    h(0x27, "WAIT_NUM_SECOND_RND").args(&[U8, U32]).call_state(),
    h(0x28, "AFF_TIMER"),
    h(0x29, "SET_FRAME").args(&[U8]),
    h(0x2A, "SET_FRAME_3DS").args(&[U8]),
    h(0x2B, "SET_START_3DS").args(&[U8]),
    h(0x2C, "SET_END_3DS").args(&[U8]),
    h(0x2D, "START_ANIM_3DS").args(&[U8]),
    h(0x2E, "STOP_ANIM_3DS"),
    h(0x2F, "WAIT_ANIM_3DS"),
    h(0x30, "WAIT_FRAME_3DS"),
    h(0x31, "WAIT_NUM_DECIMAL_RND").args(&[U8, U32]).call_state(),
    h(0x32, "INTERVAL").args(&[U16]),
    h(0x33, "FREQUENCY").args(&[U16]).headless_skip(),
    h(0x34, "VOLUME").args(&[U8]).headless_skip(),
];

pub static CONDITIONS: &[Pred] = &[
    Pred::new(0x00, "COL", ACTOR),
    Pred::new(0x01, "COL_OBJ", ACTOR).param(ACTOR),
    Pred::new(0x02, "DISTANCE", U16).param(ACTOR),
    Pred::new(0x03, "ZONE", U8),
    Pred::new(0x04, "ZONE_OBJ", U8).param(ACTOR),
    Pred::new(0x05, "BODY", U8),
    Pred::new(0x06, "BODY_OBJ", U8).param(ACTOR),
    Pred::new(0x07, "ANIM", U16),
    Pred::new(0x08, "ANIM_OBJ", U16).param(ACTOR),
    Pred::new(0x09, "CURRENT_TRACK", U8).kind(PredicateKind::CurrentTrack),
    Pred::new(0x0A, "CURRENT_TRACK_OBJ", U8)
        .param(ACTOR)
        .kind(PredicateKind::CurrentTrackObj),
    Pred::new(0x0B, "VAR_CUBE", U8).param(U8),
    Pred::new(0x0C, "CONE_VIEW", U16).param(ACTOR),
    Pred::new(0x0D, "HIT_BY", ACTOR),
    Pred::new(0x0E, "ACTION", U8),
    Pred::new(0x0F, "VAR_GAME", U16).param(U8),
    Pred::new(0x10, "LIFE_POINT", U16),
    Pred::new(0x11, "LIFE_POINT_OBJ", U16).param(ACTOR),
    Pred::new(0x12, "KEYS", U8),
    Pred::new(0x13, "MONEY", U16),
    Pred::new(0x14, "HERO_BEHAVIOUR", U8),
    Pred::new(0x15, "CHAPTER", U8),
    Pred::new(0x16, "DISTANCE_3D", U16).param(ACTOR),
    Pred::new(0x17, "MAGIC_LEVEL", U8),
    Pred::new(0x18, "MAGIC_POINTS", U8),
    Pred::new(0x19, "USING_INVENTORY", U8).param(U8),
    Pred::new(0x1A, "CHOICE", U16),
    Pred::new(0x1B, "FUEL", U8),
    Pred::new(0x1C, "CARRIED_BY", ACTOR),
    Pred::new(0x1D, "CDROM", U8),
    Pred::new(0x1E, "LADDER", U8),
    Pred::new(0x1F, "RND", U8).param(U8),
    Pred::new(0x20, "RAIL", U8).param(U8),
    Pred::new(0x21, "BETA", U16),
    Pred::new(0x22, "BETA_OBJ", U16).param(ACTOR),
    Pred::new(0x23, "CARRIED_BY_OBJ", ACTOR).param(ACTOR),
    Pred::new(0x24, "ANGLE", U16).param(ACTOR),
    Pred::new(0x25, "DISTANCE_MESSAGE", U16).param(ACTOR),
    Pred::new(0x26, "HIT_OBJ_BY", ACTOR).param(ACTOR),
    Pred::new(0x27, "REAL_ANGLE", U16).param(ACTOR),
    Pred::new(0x28, "DEMO", U8),
    Pred::new(0x29, "COL_DECORS", U8),
    Pred::new(0x2A, "COL_DECORS_OBJ", U8).param(ACTOR),
    Pred::new(0x2B, "PROCESSOR", U8),
    Pred::new(0x2C, "OBJECT_DISPLAYED", U8).param(U8),
    Pred::new(0x2D, "ANGLE_OBJ", U16).param(ACTOR),
];

pub static OPERATORS: &[Cmp] = &[
    Cmp::new(0x00, "==", Comparator::Eq),
    Cmp::new(0x01, ">", Comparator::Gt),
    Cmp::new(0x02, "<", Comparator::Lt),
    Cmp::new(0x03, ">=", Comparator::Ge),
    Cmp::new(0x04, "<=", Comparator::Le),
    Cmp::new(0x05, "!=", Comparator::Ne),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptKind;

    #[test]
    fn test_every_slot_matches_its_code() {
        for (i, d) in LIFE_OPCODES.iter().enumerate() {
            assert_eq!(d.code as usize, i, "life slot {i} holds {}", d.name);
        }
        for (i, d) in MOVE_OPCODES.iter().enumerate() {
            assert_eq!(d.code as usize, i, "move slot {i} holds {}", d.name);
        }
        for (i, d) in CONDITIONS.iter().enumerate() {
            assert_eq!(d.code as usize, i, "condition slot {i} holds {}", d.name);
        }
        for (i, d) in OPERATORS.iter().enumerate() {
            assert_eq!(d.code as usize, i, "operator slot {i} holds {}", d.name);
        }
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(LIFE_OPCODES.len(), 0x9B);
        assert_eq!(MOVE_OPCODES.len(), 0x35);
        assert_eq!(CONDITIONS.len(), 0x2E);
        assert_eq!(OPERATORS.len(), 6);
    }

    #[test]
    fn test_structural_lookups() {
        let cat = catalog();
        assert_eq!(cat.opcode(ScriptKind::Life, 0x0C).map(|d| d.kind), Some(OpKind::If));
        assert_eq!(cat.opcode(ScriptKind::Move, 0x09).map(|d| d.kind), Some(OpKind::Track));
        assert_eq!(cat.marker(OpKind::EndIf).code, 0x10);
        assert_eq!(cat.marker(OpKind::Behaviour).code, 0x20);
        assert!(cat.opcode(ScriptKind::Life, 0x9B).is_none());
    }

    #[test]
    fn test_case_opcodes_decode_args_first() {
        let case = &LIFE_OPCODES[0x73];
        assert!(case.args_first && case.has_operator && !case.has_condition);
    }

    #[test]
    fn test_parm_sample_flagged_uncertain() {
        assert!(LIFE_OPCODES[0x97].layout_uncertain);
        assert!(LIFE_OPCODES[0x97].suppressed_in_headless_mode);
    }
}
