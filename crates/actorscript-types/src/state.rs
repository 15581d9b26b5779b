//! Mutable execution state shared by the compiler (which creates it) and the
//! scheduler (which drives it).

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

use crate::ScriptKind;

/// Execution state of one script instance.
///
/// Plain data: offsets and flags only, so a snapshot is a field copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    /// Instruction currently executing.
    pub offset: usize,
    /// Whether the current call keeps stepping.
    #[serde(rename = "continue")]
    pub running: bool,
    /// Where the next call resumes. `None` is terminal.
    pub reentry: Option<usize>,
    /// Id of the last TRACK executed (move scripts).
    pub track: Option<i64>,
    /// Instruction index of that TRACK.
    pub track_offset: Option<usize>,
    /// Entry marker of the behavior currently running (life scripts).
    pub behavior_offset: Option<usize>,
    /// Behavior to switch to at the next END_BEHAVIOUR.
    pub next_behavior: Option<usize>,
    /// Position stored by SAVE_BEHAVIOUR or STOP_CURRENT_TRACK.
    pub saved_offset: Option<usize>,
    /// Value of the innermost SWITCH being matched.
    pub switch_value: Option<i64>,
}

impl RuntimeState {
    /// Fresh state resuming at the first instruction.
    pub fn new() -> Self {
        Self {
            offset: 0,
            running: false,
            reentry: Some(0),
            track: None,
            track_offset: None,
            behavior_offset: None,
            next_behavior: None,
            saved_offset: None,
            switch_value: None,
        }
    }

    /// State that never runs.
    pub fn terminated() -> Self {
        Self {
            reentry: None,
            ..Self::new()
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.reentry.is_none()
    }

    /// Stop at the next scheduling point.
    pub fn terminate(&mut self) {
        self.reentry = None;
        self.running = false;
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Both scripts of one actor, so each can reach its sibling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorState {
    pub life: RuntimeState,
    pub moves: RuntimeState,
}

impl ActorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ScriptKind) -> &RuntimeState {
        match kind {
            ScriptKind::Life => &self.life,
            ScriptKind::Move => &self.moves,
        }
    }

    pub fn get_mut(&mut self, kind: ScriptKind) -> &mut RuntimeState {
        match kind {
            ScriptKind::Life => &mut self.life,
            ScriptKind::Move => &mut self.moves,
        }
    }
}

/// Scratch state owned by one compiled instruction, kept across frames.
#[derive(Default)]
pub struct CallState {
    /// Result of the previous SWIF test.
    pub latch: bool,
    /// ONEIF already passed.
    pub used: bool,
    /// Elapsed time at which a wait ends.
    pub deadline: Option<f64>,
    ext: Option<Box<dyn Any>>,
}

impl CallState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-defined scratch value, created with `T::default()` on first use
    /// or when a different type was stored before.
    pub fn ext<T: Any + Default>(&mut self) -> Option<&mut T> {
        if !self.ext.as_ref().is_some_and(|b| b.is::<T>()) {
            self.ext = Some(Box::new(T::default()));
        }
        self.ext.as_mut().and_then(|b| b.downcast_mut::<T>())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallState")
            .field("latch", &self.latch)
            .field("used", &self.used)
            .field("deadline", &self.deadline)
            .field("ext", &self.ext.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_resumes_at_start() {
        let s = RuntimeState::new();
        assert_eq!(s.reentry, Some(0));
        assert!(!s.is_terminated());
        assert!(RuntimeState::terminated().is_terminated());
    }

    #[test]
    fn test_terminate() {
        let mut s = RuntimeState::new();
        s.running = true;
        s.terminate();
        assert!(s.is_terminated());
        assert!(!s.running);
    }

    #[test]
    fn test_actor_state_by_kind() {
        let mut a = ActorState::new();
        a.get_mut(ScriptKind::Move).track = Some(3);
        assert_eq!(a.moves.track, Some(3));
        assert_eq!(a.get(ScriptKind::Life).track, None);
    }

    #[test]
    fn test_call_state_ext_persists() {
        #[derive(Default)]
        struct Dialog {
            shown: u32,
        }
        let mut cs = CallState::new();
        if let Some(d) = cs.ext::<Dialog>() {
            d.shown += 1;
        }
        if let Some(d) = cs.ext::<Dialog>() {
            d.shown += 1;
        }
        assert_eq!(cs.ext::<Dialog>().map(|d| d.shown), Some(2));
        // A different type replaces the slot.
        assert_eq!(cs.ext::<u8>().map(|v| *v), Some(0));
        cs.clear();
        assert!(!cs.latch);
    }

    #[test]
    fn test_runtime_state_json() {
        let json = serde_json::to_string(&RuntimeState::terminated()).unwrap();
        assert!(json.contains("\"reentry\":null"));
        assert!(json.contains("\"continue\":false"));
        let back: RuntimeState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RuntimeState::terminated());
    }
}
