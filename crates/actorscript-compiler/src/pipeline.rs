use actorscript_parser::Parser;
use actorscript_types::{Diagnostics, OpcodeCatalog, ScriptId};
use tracing::debug;

use crate::compiler::{CompiledActor, Compiler, SceneLayout};
use crate::fingerprint::ScriptFingerprint;
use crate::linker::{link_scene, ParsedActor};

/// Script bytes of one actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorSource<'a> {
    pub life: &'a [u8],
    pub moves: &'a [u8],
}

/// Everything needed to compile a scene.
#[derive(Debug, Clone, Default)]
pub struct SceneSource<'a> {
    pub index: usize,
    /// In scene order; position is the actor id.
    pub actors: Vec<ActorSource<'a>>,
    pub point_count: usize,
}

impl<'a> SceneSource<'a> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn actor(mut self, life: &'a [u8], moves: &'a [u8]) -> Self {
        self.actors.push(ActorSource { life, moves });
        self
    }

    pub fn points(mut self, count: usize) -> Self {
        self.point_count = count;
        self
    }

    pub fn layout(&self) -> SceneLayout {
        SceneLayout {
            actor_count: self.actors.len(),
            point_count: self.point_count,
        }
    }
}

/// Output of [`compile_scene`].
#[derive(Debug)]
pub struct CompiledScene {
    pub index: usize,
    pub layout: SceneLayout,
    pub actors: Vec<CompiledActor>,
    pub fingerprint: ScriptFingerprint,
    /// Parse, link and compile diagnostics together.
    pub diagnostics: Diagnostics,
}

/// Parse both scripts of one actor.
pub fn parse_actor(
    catalog: OpcodeCatalog,
    scene: usize,
    actor: usize,
    source: &ActorSource<'_>,
    diagnostics: &mut Diagnostics,
) -> ParsedActor {
    let life = Parser::new(catalog, ScriptId::life(actor), source.life)
        .with_scene(scene)
        .parse();
    let moves = Parser::new(catalog, ScriptId::moves(actor), source.moves)
        .with_scene(scene)
        .parse();
    diagnostics.merge(life.diagnostics);
    diagnostics.merge(moves.diagnostics);
    ParsedActor {
        life: life.script,
        moves: moves.script,
    }
}

/// Parse every actor, link the scene, then bind every script.
///
/// Never fails as a whole: a broken script is truncated or left with
/// unresolved operands, and the reason lands in `diagnostics`.
pub fn compile_scene(catalog: OpcodeCatalog, source: &SceneSource<'_>) -> CompiledScene {
    let mut diagnostics = Diagnostics::empty();

    let parsed: Vec<ParsedActor> = source
        .actors
        .iter()
        .enumerate()
        .map(|(i, actor)| parse_actor(catalog, source.index, i, actor, &mut diagnostics))
        .collect();

    let linked = link_scene(source.index, parsed, &mut diagnostics);

    let layout = source.layout();
    let mut compiler = Compiler::new(source.index, layout, &mut diagnostics);
    let actors: Vec<CompiledActor> = linked
        .into_iter()
        .map(|actor| compiler.compile_actor(actor))
        .collect();

    debug!(
        scene = source.index,
        actors = actors.len(),
        errors = diagnostics.total_errors,
        warnings = diagnostics.total_warnings,
        "compiled scene"
    );

    CompiledScene {
        index: source.index,
        layout,
        actors,
        fingerprint: ScriptFingerprint::of_actors(&source.actors),
        diagnostics,
    }
}
