//! Per-frame cooperative scheduler for actor scripts.
//!
//! A [`Scene`] owns the compiled life and move scripts of every actor and
//! runs each of them once per frame until it suspends, yields or stops.
//! Control flow and script bookkeeping are executed here; every other
//! opcode goes to the embedding game through [`ScriptHost`].

mod config;
mod error;
mod executor;
pub mod host;
mod scene;

pub use config::SchedulerConfig;
pub use error::{HostError, RuntimeFault, RuntimeResult};
pub use executor::NO_TRACK;
pub use host::{Flow, FrameTime, HostCall, PredicateQuery, ScriptHost};
pub use scene::{FrameReport, Scene, SceneSnapshot, ScriptTable, ScriptTrace, ScriptVisit};
