use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of an actor's two scripts a program belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// Behavior, state, dialogue and world mutation.
    Life,
    /// Named motion tracks.
    Move,
}

impl ScriptKind {
    /// Both kinds, in the order the scheduler drives them each frame.
    pub const ALL: [ScriptKind; 2] = [ScriptKind::Life, ScriptKind::Move];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Life => "life",
            Self::Move => "move",
        }
    }

    /// The other script of the same actor.
    pub fn sibling(self) -> Self {
        match self {
            Self::Life => Self::Move,
            Self::Move => Self::Life,
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of an actor in its scene's actor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub usize);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor({})", self.0)
    }
}

/// Index of a point in its scene's point list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub usize);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point({})", self.0)
    }
}

/// Identity of one script: an actor plus a script kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScriptId {
    pub actor: ActorId,
    pub kind: ScriptKind,
}

impl ScriptId {
    pub fn new(actor: usize, kind: ScriptKind) -> Self {
        Self {
            actor: ActorId(actor),
            kind,
        }
    }

    pub fn life(actor: usize) -> Self {
        Self::new(actor, ScriptKind::Life)
    }

    pub fn moves(actor: usize) -> Self {
        Self::new(actor, ScriptKind::Move)
    }

    /// The other script of the same actor.
    pub fn sibling(self) -> Self {
        Self {
            actor: self.actor,
            kind: self.kind.sibling(),
        }
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor.0, self.kind)
    }
}

/// Where a diagnostic happened.
///
/// Plays the role a source span plays for text languages: scene index,
/// actor index, script kind, and when known the command index and the byte
/// offset inside the script buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptLocation {
    pub scene: usize,
    pub actor: usize,
    pub script: ScriptKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ScriptLocation {
    pub fn new(scene: usize, id: ScriptId) -> Self {
        Self {
            scene,
            actor: id.actor.0,
            script: id.kind,
            command: None,
            offset: None,
        }
    }

    /// Attach a command index.
    pub fn at_command(mut self, index: usize) -> Self {
        self.command = Some(index);
        self
    }

    /// Attach a byte offset inside the script buffer.
    pub fn at_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn script_id(&self) -> ScriptId {
        ScriptId::new(self.actor, self.script)
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.scene, self.actor, self.script)?;
        if let Some(command) = self.command {
            write!(f, ":{command}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " offset={offset}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_kind_sibling() {
        assert_eq!(ScriptKind::Life.sibling(), ScriptKind::Move);
        assert_eq!(ScriptKind::Move.sibling(), ScriptKind::Life);
        assert_eq!(ScriptId::life(4).sibling(), ScriptId::moves(4));
    }

    #[test]
    fn test_location_display() {
        let loc = ScriptLocation::new(2, ScriptId::moves(7));
        assert_eq!(loc.to_string(), "2:7:move");
        assert_eq!(loc.at_command(12).to_string(), "2:7:move:12");
        assert_eq!(
            loc.at_command(12).at_offset(40).to_string(),
            "2:7:move:12 offset=40"
        );
    }

    #[test]
    fn test_location_json_skips_missing_fields() {
        let loc = ScriptLocation::new(0, ScriptId::life(1));
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, r#"{"scene":0,"actor":1,"script":"life"}"#);
    }

    #[test]
    fn test_actor_id_serializes_transparently() {
        let json = serde_json::to_string(&ActorId(9)).unwrap();
        assert_eq!(json, "9");
    }
}
