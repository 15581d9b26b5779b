//! Scene linker: rewrites byte-offset arguments into command indices.
//!
//! Runs once every actor of the scene is parsed, since `SET_TRACK_OBJ` and
//! `SET_BEHAVIOUR_OBJ` point into other actors' scripts. Offset maps are
//! consumed here; linked scripts no longer carry them.
//!
//! Diagnostics emitted:
//! - E200: jump offset with no command (warning, argument marked unresolved)
//! - E201: cross-actor reference to an actor outside the scene
//! - E202: opcode missing the argument its kind requires

use std::collections::BTreeMap;

use actorscript_parser::ParsedScript;
use actorscript_types::{
    ArgRole, ArgValue, Command, DecodedArgument, Diagnostics, ErrorCode, OpKind, ScriptError,
    ScriptId, ScriptKind, ScriptLocation,
};
use serde::Serialize;
use tracing::warn;

/// Both parsed scripts of one actor.
#[derive(Debug, Clone)]
pub struct ParsedActor {
    pub life: ParsedScript,
    pub moves: ParsedScript,
}

/// A script whose jumps are command indices.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedScript {
    pub id: ScriptId,
    pub commands: Vec<Command>,
    pub behavior_map: BTreeMap<usize, i64>,
    pub track_map: BTreeMap<usize, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkedActor {
    pub life: LinkedScript,
    pub moves: LinkedScript,
}

type OffsetMap = BTreeMap<u32, usize>;

/// Offset maps of every actor, indexed by actor then script kind.
struct SceneMaps {
    actors: Vec<[OffsetMap; 2]>,
}

impl SceneMaps {
    fn get(&self, actor: usize, kind: ScriptKind) -> Option<&OffsetMap> {
        let maps = self.actors.get(actor)?;
        Some(match kind {
            ScriptKind::Life => &maps[0],
            ScriptKind::Move => &maps[1],
        })
    }
}

/// Link every actor of a scene.
pub fn link_scene(
    scene: usize,
    actors: Vec<ParsedActor>,
    diagnostics: &mut Diagnostics,
) -> Vec<LinkedActor> {
    let mut actors = actors;
    let maps = SceneMaps {
        actors: actors
            .iter_mut()
            .map(|a| {
                [
                    std::mem::take(&mut a.life.offset_map),
                    std::mem::take(&mut a.moves.offset_map),
                ]
            })
            .collect(),
    };

    let mut linker = Linker {
        scene,
        maps: &maps,
        diagnostics,
    };
    actors
        .into_iter()
        .map(|a| LinkedActor {
            life: linker.link(a.life),
            moves: linker.link(a.moves),
        })
        .collect()
}

struct Linker<'a> {
    scene: usize,
    maps: &'a SceneMaps,
    diagnostics: &'a mut Diagnostics,
}

impl Linker<'_> {
    fn link(&mut self, script: ParsedScript) -> LinkedScript {
        let id = script.id;
        let mut commands = script.commands;
        for (index, cmd) in commands.iter_mut().enumerate() {
            self.link_command(id, index, cmd);
        }
        LinkedScript {
            id,
            commands,
            behavior_map: script.behavior_map,
            track_map: script.track_map,
        }
    }

    fn link_command(&mut self, id: ScriptId, index: usize, cmd: &mut Command) {
        let name = cmd.opcode.name;
        let maps = self.maps;
        let own = maps.get(id.actor.0, id.kind);
        for arg in cmd.args.iter_mut().filter(|a| a.role() == ArgRole::Offset) {
            self.resolve(arg, own, id, index, name);
        }

        let (slot, kind, actor) = match cmd.opcode.kind {
            OpKind::SetTrack => (0, ScriptKind::Move, Some(id.actor.0)),
            OpKind::SetTrackObj => (1, ScriptKind::Move, self.target_actor(cmd, id, index)),
            OpKind::SetBehaviourObj => (1, ScriptKind::Life, self.target_actor(cmd, id, index)),
            _ => return,
        };
        let map = actor.and_then(|a| maps.get(a, kind));
        match cmd.args.get_mut(slot) {
            Some(arg) if actor.is_some() => self.resolve(arg, map, id, index, name),
            Some(arg) => {
                if let Some(n) = arg.value.as_number() {
                    arg.value = ArgValue::Unresolved(n);
                }
            }
            None => self.report(
                ScriptError::new(
                    ErrorCode::MISSING_ARGUMENT,
                    format!("{name} has no argument {slot}"),
                    self.location(id, index),
                ),
                name,
            ),
        }
    }

    /// Actor index in the first argument of an `_OBJ` opcode, if it names an
    /// actor of this scene.
    fn target_actor(&mut self, cmd: &Command, id: ScriptId, index: usize) -> Option<usize> {
        let name = cmd.opcode.name;
        let Some(n) = cmd.arg(0).and_then(|a| a.value.as_number()) else {
            self.report(
                ScriptError::new(
                    ErrorCode::MISSING_ARGUMENT,
                    format!("{name} has no target actor"),
                    self.location(id, index),
                ),
                name,
            );
            return None;
        };
        match usize::try_from(n) {
            Ok(a) if a < self.maps.actors.len() => Some(a),
            _ => {
                self.report(
                    ScriptError::warning(
                        ErrorCode::UNKNOWN_TARGET_ACTOR,
                        format!("{name} targets actor {n}, scene has {}", self.maps.actors.len()),
                        self.location(id, index),
                    ),
                    name,
                );
                None
            }
        }
    }

    fn resolve(
        &mut self,
        arg: &mut DecodedArgument,
        map: Option<&OffsetMap>,
        id: ScriptId,
        index: usize,
        name: &str,
    ) {
        let ArgValue::Number(n) = arg.value else {
            return;
        };
        let found = u32::try_from(n)
            .ok()
            .and_then(|off| map.and_then(|m| m.get(&off)).copied());
        match found {
            Some(target) => arg.value = ArgValue::Target(target),
            None => {
                arg.value = ArgValue::Unresolved(n);
                let mut location = self.location(id, index);
                location.offset = u32::try_from(n).ok();
                self.report(
                    ScriptError::warning(
                        ErrorCode::UNRESOLVED_JUMP,
                        format!("{name}: no command at offset {n}"),
                        location,
                    ),
                    name,
                );
            }
        }
    }

    fn location(&self, id: ScriptId, index: usize) -> ScriptLocation {
        ScriptLocation::new(self.scene, id).at_command(index)
    }

    fn report(&mut self, diagnostic: ScriptError, name: &str) {
        warn!(
            location = %diagnostic.location,
            opcode = name,
            code = %diagnostic.code,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }
}
