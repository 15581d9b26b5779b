//! Semantics of the structural opcodes.
//!
//! One call executes one instruction and returns the [`Flow`] the scheduler
//! applies. Control flow, behavior and track bookkeeping, waits and the
//! track predicates are handled here; everything else is forwarded to the
//! host.

use actorscript_compiler::{BoundCondition, BoundOperator, CompiledInstruction, Operand};
use actorscript_types::{
    ActorState, CallState, OpKind, PredicateKind, RuntimeState, ScriptId, ScriptKind,
};

use crate::host::{Flow, FrameTime, HostCall, PredicateQuery, ScriptHost};
use crate::{RuntimeFault, RuntimeResult};

/// Value the track predicates report for an actor with no active track.
pub const NO_TRACK: i64 = -1;

/// Everything an instruction may touch besides itself.
pub(crate) struct Step<'a, H: ?Sized> {
    pub id: ScriptId,
    /// Index of the instruction being executed.
    pub offset: usize,
    pub time: FrameTime,
    pub states: &'a mut [ActorState],
    pub host: &'a mut H,
}

impl<H: ScriptHost + ?Sized> Step<'_, H> {
    fn own(&mut self) -> &mut RuntimeState {
        self.states[self.id.actor.0].get_mut(self.id.kind)
    }

    fn sibling_moves(&mut self) -> &mut RuntimeState {
        &mut self.states[self.id.actor.0].moves
    }

    /// Actor index named by an operand, checked against the scene.
    fn actor(&self, label: &str, operand: Option<&Operand>) -> RuntimeResult<usize> {
        match operand {
            Some(Operand::Actor(a)) if a.0 < self.states.len() => Ok(a.0),
            Some(Operand::Actor(a)) => Err(RuntimeFault::broken(label, format!("no {a}"))),
            Some(Operand::Unresolved(n)) => {
                Err(RuntimeFault::broken(label, format!("unresolved actor {n}")))
            }
            _ => Err(RuntimeFault::broken(label, "missing actor operand")),
        }
    }

    fn condition(&mut self, label: &str, cond: &BoundCondition) -> RuntimeResult<i64> {
        match cond.predicate.kind {
            PredicateKind::CurrentTrack => Ok(current_track(&self.states[self.id.actor.0])),
            PredicateKind::CurrentTrackObj => {
                let actor = self.actor(label, cond.param.as_ref())?;
                Ok(current_track(&self.states[actor]))
            }
            PredicateKind::Host => {
                let query = PredicateQuery {
                    script: self.id,
                    predicate: cond.predicate,
                    param: cond.param.as_ref(),
                    time: self.time,
                    actor: &self.states[self.id.actor.0],
                };
                self.host.evaluate(query).map_err(|source| RuntimeFault::Host {
                    label: label.to_string(),
                    source,
                })
            }
        }
    }

    /// Evaluate the instruction's condition and run it through its operator.
    fn test(&mut self, ins: &CompiledInstruction) -> RuntimeResult<bool> {
        let cond = ins
            .condition
            .as_ref()
            .ok_or_else(|| RuntimeFault::broken(&ins.label, "missing condition"))?;
        let value = self.condition(&ins.label, cond)?;
        Ok(operator(ins)?.test(value))
    }
}

fn current_track(state: &ActorState) -> i64 {
    state.moves.track.unwrap_or(NO_TRACK)
}

fn operator(ins: &CompiledInstruction) -> RuntimeResult<BoundOperator> {
    ins.operator
        .ok_or_else(|| RuntimeFault::broken(&ins.label, "missing operator"))
}

fn target(ins: &CompiledInstruction, slot: usize) -> RuntimeResult<usize> {
    match ins.operand(slot) {
        Some(Operand::Target(t)) => Ok(*t),
        Some(Operand::Unresolved(offset)) => Err(RuntimeFault::broken(
            &ins.label,
            format!("unresolved jump to offset {offset}"),
        )),
        _ => Err(RuntimeFault::broken(&ins.label, "missing jump target")),
    }
}

fn number(ins: &CompiledInstruction, slot: usize) -> RuntimeResult<i64> {
    ins.operand(slot)
        .and_then(Operand::as_number)
        .ok_or_else(|| {
            RuntimeFault::broken(&ins.label, format!("operand {slot} is not a number"))
        })
}

fn call_state<'i>(
    label: &str,
    slot: &'i mut Option<CallState>,
) -> RuntimeResult<&'i mut CallState> {
    slot.as_mut()
        .ok_or_else(|| RuntimeFault::broken(label, "no call state"))
}

fn branch(jump: bool, to: usize) -> Flow {
    if jump {
        Flow::Jump(to)
    } else {
        Flow::Advance
    }
}

fn stop_track(moves: &mut RuntimeState) {
    moves.saved_offset = moves.track_offset;
    moves.reentry = None;
}

fn restore_track(moves: &mut RuntimeState) {
    if let Some(saved) = moves.saved_offset {
        moves.reentry = Some(saved);
    }
}

/// Execute one instruction.
pub(crate) fn execute<H: ScriptHost + ?Sized>(
    ins: &mut CompiledInstruction,
    cx: &mut Step<'_, H>,
) -> RuntimeResult<Flow> {
    let flow = match ins.kind() {
        OpKind::Nop
        | OpKind::Snif
        | OpKind::NeverIf
        | OpKind::NoIf
        | OpKind::EndIf
        | OpKind::Default => Flow::Advance,
        OpKind::End | OpKind::EndLife | OpKind::Stop => Flow::Terminate,
        OpKind::Offset | OpKind::Else | OpKind::Break => Flow::Jump(target(ins, 0)?),
        OpKind::Goto => Flow::YieldTo(target(ins, 0)?),

        // ── Conditionals ──
        OpKind::If | OpKind::AndIf => {
            let to = target(ins, 0)?;
            branch(!cx.test(ins)?, to)
        }
        OpKind::OrIf => {
            let to = target(ins, 0)?;
            branch(cx.test(ins)?, to)
        }
        OpKind::Swif => {
            let to = target(ins, 0)?;
            let passed = cx.test(ins)?;
            let cs = call_state(&ins.label, &mut ins.call_state)?;
            let rising = passed && !cs.latch;
            cs.latch = passed;
            branch(!rising, to)
        }
        OpKind::OneIf => {
            let to = target(ins, 0)?;
            let passed = cx.test(ins)?;
            let cs = call_state(&ins.label, &mut ins.call_state)?;
            let first = passed && !cs.used;
            cs.used |= passed;
            branch(!first, to)
        }

        // ── Switch ──
        OpKind::Switch => {
            let cond = ins
                .condition
                .as_ref()
                .ok_or_else(|| RuntimeFault::broken(&ins.label, "missing condition"))?;
            let value = cx.condition(&ins.label, cond)?;
            cx.own().switch_value = Some(value);
            Flow::Advance
        }
        OpKind::Case | OpKind::OrCase => {
            let to = target(ins, 0)?;
            let value = cx
                .own()
                .switch_value
                .ok_or_else(|| RuntimeFault::broken(&ins.label, "no SWITCH value"))?;
            let passed = operator(ins)?.test(value);
            branch(passed == (ins.kind() == OpKind::OrCase), to)
        }
        OpKind::EndSwitch => {
            cx.own().switch_value = None;
            Flow::Advance
        }

        // ── Behaviors ──
        OpKind::Behaviour => {
            let offset = cx.offset;
            cx.own().behavior_offset = Some(offset);
            Flow::Advance
        }
        OpKind::SetBehaviour => {
            let to = target(ins, 0)?;
            cx.own().next_behavior = Some(to);
            Flow::Advance
        }
        OpKind::EndBehaviour | OpKind::Return => {
            let state = cx.own();
            let next = state.next_behavior.take().or(state.behavior_offset);
            Flow::YieldTo(next.unwrap_or(0))
        }
        OpKind::SetBehaviourObj => {
            let actor = cx.actor(&ins.label, ins.operand(0))?;
            let to = target(ins, 1)?;
            cx.states[actor].life.reentry = Some(to);
            Flow::Advance
        }
        OpKind::SaveBehaviour => {
            let state = cx.own();
            state.saved_offset = state.behavior_offset;
            Flow::Advance
        }
        OpKind::RestoreBehaviour => match cx.own().saved_offset {
            Some(saved) => Flow::YieldTo(saved),
            None => Flow::Advance,
        },
        OpKind::SaveBehaviourObj => {
            let actor = cx.actor(&ins.label, ins.operand(0))?;
            let life = &mut cx.states[actor].life;
            life.saved_offset = life.behavior_offset;
            Flow::Advance
        }
        OpKind::RestoreBehaviourObj => {
            let actor = cx.actor(&ins.label, ins.operand(0))?;
            let is_self = actor == cx.id.actor.0 && cx.id.kind == ScriptKind::Life;
            let life = &mut cx.states[actor].life;
            match life.saved_offset {
                Some(saved) if is_self => Flow::YieldTo(saved),
                Some(saved) => {
                    life.reentry = Some(saved);
                    Flow::Advance
                }
                None => Flow::Advance,
            }
        }

        // ── Tracks ──
        OpKind::Track => {
            let track = number(ins, 0)?;
            let offset = cx.offset;
            let state = cx.own();
            state.track = Some(track);
            state.track_offset = Some(offset);
            Flow::Advance
        }
        OpKind::SetTrack => {
            let to = target(ins, 0)?;
            cx.sibling_moves().reentry = Some(to);
            Flow::Advance
        }
        OpKind::SetTrackObj => {
            let actor = cx.actor(&ins.label, ins.operand(0))?;
            let to = target(ins, 1)?;
            cx.states[actor].moves.reentry = Some(to);
            Flow::Advance
        }
        OpKind::StopCurrentTrack => {
            stop_track(cx.sibling_moves());
            Flow::Advance
        }
        OpKind::RestoreLastTrack => {
            restore_track(cx.sibling_moves());
            Flow::Advance
        }
        OpKind::StopCurrentTrackObj => {
            let actor = cx.actor(&ins.label, ins.operand(0))?;
            stop_track(&mut cx.states[actor].moves);
            Flow::Advance
        }
        OpKind::RestoreLastTrackObj => {
            let actor = cx.actor(&ins.label, ins.operand(0))?;
            restore_track(&mut cx.states[actor].moves);
            Flow::Advance
        }

        // ── Waits ──
        OpKind::WaitSeconds | OpKind::WaitDeciseconds => {
            let count = number(ins, 0)? as f64;
            let seconds = if ins.kind() == OpKind::WaitDeciseconds {
                count * 0.1
            } else {
                count
            };
            let elapsed = cx.time.elapsed;
            let cs = call_state(&ins.label, &mut ins.call_state)?;
            let deadline = *cs.deadline.get_or_insert(elapsed + seconds);
            if elapsed < deadline {
                Flow::Suspend
            } else {
                cs.deadline = None;
                Flow::Advance
            }
        }

        OpKind::SetDirMode | OpKind::SetDirModeObj | OpKind::Host => host_call(ins, cx)?,
    };
    Ok(flow)
}

fn host_call<H: ScriptHost + ?Sized>(
    ins: &mut CompiledInstruction,
    cx: &mut Step<'_, H>,
) -> RuntimeResult<Flow> {
    let condition = match &ins.condition {
        Some(cond) => Some(cx.condition(&ins.label, cond)?),
        None => None,
    };
    let passed = match (ins.operator, condition) {
        (Some(op), Some(value)) => Some(op.test(value)),
        _ => None,
    };
    let actor = cx.id.actor.0;
    let call = HostCall {
        script: cx.id,
        opcode: ins.opcode,
        offset: cx.offset,
        call_state: ins.call_state.as_mut(),
        condition,
        passed,
        operands: &ins.operands,
        time: cx.time,
        actor: &mut cx.states[actor],
    };
    cx.host.execute(call).map_err(|source| RuntimeFault::Host {
        label: ins.label.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_then_restore_track_returns_to_track_start() {
        let mut moves = RuntimeState::new();
        moves.track_offset = Some(4);
        moves.reentry = Some(6);

        stop_track(&mut moves);
        assert_eq!(moves.reentry, None);
        assert_eq!(moves.saved_offset, Some(4));

        restore_track(&mut moves);
        assert_eq!(moves.reentry, Some(4));
    }

    #[test]
    fn test_restore_without_saved_track_is_noop() {
        let mut moves = RuntimeState::terminated();
        restore_track(&mut moves);
        assert!(moves.is_terminated());
    }

    #[test]
    fn test_current_track_default() {
        let mut state = ActorState::default();
        assert_eq!(current_track(&state), NO_TRACK);
        state.moves.track = Some(7);
        assert_eq!(current_track(&state), 7);
    }
}
