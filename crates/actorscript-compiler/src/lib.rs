//! Actor script compiler: orchestrates the scene pipeline.
//!
//! ```text
//! bytes → Parser (per script) → Linker (whole scene) → Compiler → CompiledScene
//! ```

pub mod compiler;
pub mod fingerprint;
pub mod linker;
mod pipeline;

pub use compiler::{
    BoundCondition, BoundOperator, CompiledActor, CompiledInstruction, CompiledScript, Compiler,
    Operand, SceneLayout,
};
pub use fingerprint::ScriptFingerprint;
pub use linker::{link_scene, LinkedActor, LinkedScript, ParsedActor};
pub use pipeline::{compile_scene, parse_actor, ActorSource, CompiledScene, SceneSource};
