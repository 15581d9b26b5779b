use actorscript_types::{Command, ScriptId, ScriptKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One script after parsing, before linking.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedScript {
    pub id: ScriptId,
    pub commands: Vec<Command>,
    /// Byte offset of a command's first byte → command index. Only needed
    /// while linking.
    pub offset_map: BTreeMap<u32, usize>,
    /// Command index of each behavior entry marker → sequential behavior id.
    pub behavior_map: BTreeMap<usize, i64>,
    /// Command index of each TRACK command → declared track id.
    pub track_map: BTreeMap<usize, i64>,
    /// Offset where parsing stopped on a decode failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_at: Option<u32>,
}

impl ParsedScript {
    pub fn empty(id: ScriptId) -> Self {
        Self {
            id,
            commands: Vec::new(),
            offset_map: BTreeMap::new(),
            behavior_map: BTreeMap::new(),
            track_map: BTreeMap::new(),
            truncated_at: None,
        }
    }

    pub fn kind(&self) -> ScriptKind {
        self.id.kind
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command index for a byte offset, if a command starts there.
    pub fn index_of(&self, offset: u32) -> Option<usize> {
        self.offset_map.get(&offset).copied()
    }

    /// Command index of the TRACK declaring `track`.
    pub fn track_start(&self, track: i64) -> Option<usize> {
        self.track_map
            .iter()
            .find(|(_, id)| **id == track)
            .map(|(idx, _)| *idx)
    }

    /// Command index of the entry marker of behavior `behavior`.
    pub fn behavior_start(&self, behavior: i64) -> Option<usize> {
        self.behavior_map
            .iter()
            .find(|(_, id)| **id == behavior)
            .map(|(idx, _)| *idx)
    }
}

/// Numbered listing, one command per line.
impl fmt::Display for ParsedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            writeln!(f, "{i:>4} {cmd}")?;
        }
        Ok(())
    }
}
