use serde::{Deserialize, Serialize};

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Instructions one script may execute in a single call.
    pub gas_limit: u64,
    /// Skip opcodes flagged for side scenes (audio, music).
    pub headless: bool,
    /// Record the offsets each script visits per frame.
    pub trace: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            gas_limit: 10_000,
            headless: false,
            trace: false,
        }
    }
}

impl SchedulerConfig {
    pub fn headless(mut self) -> Self {
        self.headless = true;
        self
    }

    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    pub fn with_gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"headless":true}"#).unwrap();
        assert!(config.headless);
        assert_eq!(config.gas_limit, 10_000);
        assert!(!config.trace);
    }
}
