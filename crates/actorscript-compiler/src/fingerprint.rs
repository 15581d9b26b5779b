//! SHA-256 identity of a scene's script bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::ActorSource;

/// Hex digest over every actor's life and move bytes, in scene order.
///
/// Runtime snapshots carry it so they are only restored onto the scripts
/// they were taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptFingerprint(String);

impl ScriptFingerprint {
    pub fn of_actors(actors: &[ActorSource<'_>]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((actors.len() as u32).to_le_bytes());
        for actor in actors {
            for bytes in [actor.life, actor.moves] {
                hasher.update((bytes.len() as u32).to_le_bytes());
                hasher.update(bytes);
            }
        }
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor<'a>(life: &'a [u8], moves: &'a [u8]) -> ActorSource<'a> {
        ActorSource { life, moves }
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = ScriptFingerprint::of_actors(&[actor(&[1, 2], &[3])]);
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_separates_script_boundaries() {
        let a = ScriptFingerprint::of_actors(&[actor(&[1, 2], &[3])]);
        let b = ScriptFingerprint::of_actors(&[actor(&[1], &[2, 3])]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_determinism_100_iterations() {
        let first = ScriptFingerprint::of_actors(&[actor(&[9; 40], &[0x0B])]);
        for i in 0..100 {
            let fp = ScriptFingerprint::of_actors(&[actor(&[9; 40], &[0x0B])]);
            assert_eq!(first, fp, "Determinism failure at iteration {i}");
        }
    }
}
