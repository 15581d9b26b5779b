//! Runtime form of a compiled scene.
//!
//! Owns every actor's compiled scripts and state, drives them once per
//! frame, and isolates faults to the script that raised them.

use actorscript_compiler::{CompiledActor, CompiledScene, CompiledScript, ScriptFingerprint};
use actorscript_types::{
    ActorId, ActorState, Diagnostics, ScriptError, ScriptId, ScriptKind, ScriptLocation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::executor::{execute, Step};
use crate::host::{Flow, FrameTime, ScriptHost};
use crate::{RuntimeFault, RuntimeResult, SchedulerConfig};

// ══════════════════════════════════════════════════════════════════════════════
// Script table
// ══════════════════════════════════════════════════════════════════════════════

/// Compiled scripts of one actor.
#[derive(Debug)]
struct Programs {
    life: CompiledScript,
    moves: CompiledScript,
}

impl Programs {
    fn get(&self, kind: ScriptKind) -> &CompiledScript {
        match kind {
            ScriptKind::Life => &self.life,
            ScriptKind::Move => &self.moves,
        }
    }

    fn get_mut(&mut self, kind: ScriptKind) -> &mut CompiledScript {
        match kind {
            ScriptKind::Life => &mut self.life,
            ScriptKind::Move => &mut self.moves,
        }
    }
}

/// Every script and state record of a scene, indexed by [`ActorId`].
///
/// Programs and states live in separate vectors so an instruction can hold
/// its own call state while writing any actor's state.
#[derive(Debug, Default)]
pub struct ScriptTable {
    programs: Vec<Programs>,
    states: Vec<ActorState>,
}

impl ScriptTable {
    pub fn new(actors: Vec<CompiledActor>) -> Self {
        let mut table = Self::default();
        for actor in actors {
            table.programs.push(Programs {
                life: actor.life,
                moves: actor.moves,
            });
            table.states.push(actor.state);
        }
        table
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, actor: ActorId) -> Option<&ActorState> {
        self.states.get(actor.0)
    }

    pub fn state_mut(&mut self, actor: ActorId) -> Option<&mut ActorState> {
        self.states.get_mut(actor.0)
    }

    pub fn states(&self) -> &[ActorState] {
        &self.states
    }

    pub fn script(&self, id: ScriptId) -> Option<&CompiledScript> {
        self.programs.get(id.actor.0).map(|p| p.get(id.kind))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Reports, traces, snapshots
// ══════════════════════════════════════════════════════════════════════════════

/// Outcome of one [`Scene::run_frame`].
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub frame: u64,
    /// Instructions executed across all scripts.
    pub steps: u64,
    /// Scripts stopped by a fault this frame.
    pub faults: Vec<(ScriptId, RuntimeFault)>,
}

/// Instructions one script visited during a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptVisit {
    pub script: ScriptId,
    /// Behavior or track of the first visited instruction.
    pub section: Option<i64>,
    pub offsets: Vec<usize>,
}

/// Per-frame execution trace, recorded when [`SchedulerConfig::trace`] is on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptTrace {
    pub frame: u64,
    /// Only scripts that executed at least one instruction.
    pub scripts: Vec<ScriptVisit>,
}

impl ScriptTrace {
    /// Offsets visited by `script`, if it ran.
    pub fn visited(&self, script: ScriptId) -> Option<&[usize]> {
        self.scripts
            .iter()
            .find(|v| v.script == script)
            .map(|v| v.offsets.as_slice())
    }
}

/// Plain-data copy of every actor's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub scene: usize,
    pub frame: u64,
    /// Scripts the snapshot belongs to.
    pub fingerprint: ScriptFingerprint,
    pub actors: Vec<ActorState>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Scene
// ══════════════════════════════════════════════════════════════════════════════

/// Runtime instance of a compiled scene.
pub struct Scene {
    index: usize,
    fingerprint: ScriptFingerprint,
    table: ScriptTable,
    config: SchedulerConfig,
    /// Compile diagnostics followed by runtime faults.
    diagnostics: Diagnostics,
    frame: u64,
    trace: Option<ScriptTrace>,
}

impl Scene {
    pub fn new(compiled: CompiledScene, config: SchedulerConfig) -> Self {
        Self {
            index: compiled.index,
            fingerprint: compiled.fingerprint,
            table: ScriptTable::new(compiled.actors),
            config,
            diagnostics: compiled.diagnostics,
            frame: 0,
            trace: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn table(&self) -> &ScriptTable {
        &self.table
    }

    pub fn state(&self, actor: ActorId) -> Option<&ActorState> {
        self.table.state(actor)
    }

    /// Frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Trace of the last frame, when tracing is enabled.
    pub fn trace(&self) -> Option<&ScriptTrace> {
        self.trace.as_ref()
    }

    // ── Scheduling ───────────────────────────────────────────────────────────

    /// Run every actor once: life script then move script, in scene order.
    pub fn run_frame<H: ScriptHost + ?Sized>(
        &mut self,
        host: &mut H,
        time: FrameTime,
    ) -> FrameReport {
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };
        let mut trace = self.config.trace.then(|| ScriptTrace {
            frame: self.frame,
            scripts: Vec::new(),
        });

        for actor in 0..self.table.len() {
            for kind in ScriptKind::ALL {
                let id = ScriptId::new(actor, kind);
                let mut visited = Vec::new();
                let record = trace.is_some().then_some(&mut visited);
                match self.run(host, id, time, record) {
                    Ok(steps) => report.steps += steps,
                    Err(fault) => report.faults.push((id, fault)),
                }
                let first = visited.first().copied();
                if let (Some(trace), Some(first)) = (trace.as_mut(), first) {
                    let section = self
                        .table
                        .script(id)
                        .and_then(|s| s.instructions.get(first))
                        .and_then(|ins| ins.section);
                    trace.scripts.push(ScriptVisit {
                        script: id,
                        section,
                        offsets: visited,
                    });
                }
            }
        }

        debug!(
            scene = self.index,
            frame = self.frame,
            steps = report.steps,
            faults = report.faults.len(),
            "frame complete"
        );
        self.trace = trace;
        report
    }

    /// Run one script until it suspends, yields or stops.
    ///
    /// Returns the number of instructions executed. A fault terminates the
    /// script, is logged and recorded in [`Scene::diagnostics`], and is
    /// returned; other scripts are not affected.
    pub fn run_script<H: ScriptHost + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        kind: ScriptKind,
        time: FrameTime,
    ) -> RuntimeResult<u64> {
        self.run(host, ScriptId { actor, kind }, time, None)
    }

    fn run<H: ScriptHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: ScriptId,
        time: FrameTime,
        visited: Option<&mut Vec<usize>>,
    ) -> RuntimeResult<u64> {
        if id.actor.0 >= self.table.len() {
            return Err(RuntimeFault::UnknownActor(id.actor));
        }
        self.drive(host, id, time, visited).map_err(|fault| {
            self.fail(id, &fault);
            fault
        })
    }

    fn drive<H: ScriptHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: ScriptId,
        time: FrameTime,
        mut visited: Option<&mut Vec<usize>>,
    ) -> RuntimeResult<u64> {
        let config = self.config;
        let actor = id.actor.0;
        let script = self.table.programs[actor].get_mut(id.kind);
        let states = &mut self.table.states;

        let state = states[actor].get_mut(id.kind);
        let Some(start) = state.reentry else {
            return Ok(0);
        };
        state.offset = start;
        state.running = true;

        let mut gas = 0u64;
        while states[actor].get(id.kind).running {
            let offset = states[actor].get(id.kind).offset;
            let len = script.instructions.len();
            let Some(ins) = script.instructions.get_mut(offset) else {
                return Err(RuntimeFault::Overrun { offset, len });
            };
            gas += 1;
            if gas > config.gas_limit {
                return Err(RuntimeFault::GasExhausted {
                    limit: config.gas_limit,
                });
            }
            states[actor].get_mut(id.kind).reentry = None;
            if let Some(visited) = visited.as_deref_mut() {
                visited.push(offset);
            }

            let flow = if config.headless && ins.opcode.suppressed_in_headless_mode {
                trace!(actor, script = %id.kind, offset, "skipped {}", ins.label);
                Flow::Advance
            } else {
                trace!(actor, script = %id.kind, offset, "{ins}");
                let mut step = Step {
                    id,
                    offset,
                    time,
                    states: states.as_mut_slice(),
                    host: &mut *host,
                };
                execute(ins, &mut step)?
            };

            let state = states[actor].get_mut(id.kind);
            match flow {
                Flow::Advance => state.offset = offset + 1,
                Flow::Jump(to) => state.offset = to,
                Flow::Suspend => {
                    state.reentry = Some(offset);
                    state.running = false;
                }
                Flow::YieldTo(to) => {
                    state.reentry = Some(to);
                    state.running = false;
                }
                Flow::Terminate => state.terminate(),
            }
        }
        Ok(gas)
    }

    /// Terminate a faulted script, log it and record a diagnostic.
    fn fail(&mut self, id: ScriptId, fault: &RuntimeFault) {
        let Some(actor) = self.table.state_mut(id.actor) else {
            return;
        };
        let state = actor.get_mut(id.kind);
        state.terminate();
        let location = ScriptLocation::new(self.index, id).at_command(state.offset);

        let diagnostic = match fault {
            RuntimeFault::Overrun { .. } => {
                warn!(location = %location, "{fault}");
                ScriptError::warning(fault.code(), fault.to_string(), location)
            }
            _ => {
                error!(location = %location, "{fault}");
                ScriptError::new(fault.code(), fault.to_string(), location)
            }
        };
        self.diagnostics.push(diagnostic);
    }

    // ── Actor lifecycle ──────────────────────────────────────────────────────

    /// Stop both scripts of an actor.
    pub fn kill_actor(&mut self, actor: ActorId) -> RuntimeResult<()> {
        let state = self
            .table
            .state_mut(actor)
            .ok_or(RuntimeFault::UnknownActor(actor))?;
        state.life.terminate();
        state.moves.terminate();
        debug!(scene = self.index, actor = actor.0, "killed actor");
        Ok(())
    }

    /// Restart both scripts at their first instruction and clear the active
    /// track. Empty scripts stay terminated.
    pub fn revive_actor(&mut self, actor: ActorId) -> RuntimeResult<()> {
        let programs = self
            .table
            .programs
            .get(actor.0)
            .ok_or(RuntimeFault::UnknownActor(actor))?;
        let state = &mut self.table.states[actor.0];
        for kind in ScriptKind::ALL {
            let runtime = state.get_mut(kind);
            runtime.running = false;
            runtime.offset = 0;
            runtime.reentry = (!programs.get(kind).is_empty()).then_some(0);
        }
        state.moves.track = None;
        debug!(scene = self.index, actor = actor.0, "revived actor");
        Ok(())
    }

    // ── Snapshots ────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            scene: self.index,
            frame: self.frame,
            fingerprint: self.fingerprint.clone(),
            actors: self.table.states.clone(),
        }
    }

    /// Replace every actor's state with the snapshot's. Call states (waits,
    /// latches) are reset.
    pub fn restore(&mut self, snapshot: &SceneSnapshot) -> RuntimeResult<()> {
        if snapshot.fingerprint != self.fingerprint || snapshot.actors.len() != self.table.len() {
            warn!(
                scene = self.index,
                expected = %self.fingerprint,
                found = %snapshot.fingerprint,
                "rejected snapshot"
            );
            return Err(RuntimeFault::SnapshotMismatch);
        }
        self.table.states.clone_from(&snapshot.actors);
        for programs in &mut self.table.programs {
            for ins in programs
                .life
                .instructions
                .iter_mut()
                .chain(programs.moves.instructions.iter_mut())
            {
                if let Some(cs) = ins.call_state.as_mut() {
                    cs.clear();
                }
            }
        }
        self.frame = snapshot.frame;
        debug!(scene = self.index, frame = self.frame, "restored snapshot");
        Ok(())
    }
}
