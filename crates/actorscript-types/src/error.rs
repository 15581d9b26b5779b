use crate::ScriptLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of errors (and, separately, warnings) stored before the
/// collector only counts.
pub const MAX_DIAGNOSTICS: usize = 64;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Pipeline stage a diagnostic belongs to, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Decode,
    Link,
    Compile,
    Runtime,
}

/// Numeric diagnostic code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Decode errors (E100–E199) ──
    pub const DECODE_OVERRUN: Self = Self(100);
    pub const UNKNOWN_OPCODE: Self = Self(101);
    pub const UNKNOWN_PREDICATE: Self = Self(102);
    pub const UNKNOWN_COMPARATOR: Self = Self(103);
    pub const CASE_OUTSIDE_SWITCH: Self = Self(104);

    // ── Link errors (E200–E299) ──
    pub const UNRESOLVED_JUMP: Self = Self(200);
    pub const UNKNOWN_TARGET_ACTOR: Self = Self(201);
    pub const MISSING_ARGUMENT: Self = Self(202);

    // ── Compile errors (E300–E399) ──
    pub const UNKNOWN_ACTOR: Self = Self(300);
    pub const UNKNOWN_POINT: Self = Self(301);

    // ── Runtime errors (E400–E499) ──
    pub const BROKEN_SCRIPT: Self = Self(400);
    pub const OFFSET_OVERRUN: Self = Self(401);
    pub const GAS_EXHAUSTED: Self = Self(402);
    pub const HOST_FAILURE: Self = Self(403);
    pub const SNAPSHOT_MISMATCH: Self = Self(404);

    /// Get the category for this code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Decode,
            200..=299 => ErrorCategory::Link,
            300..=399 => ErrorCategory::Compile,
            _ => ErrorCategory::Runtime,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::Link => write!(f, "link"),
            Self::Compile => write!(f, "compile"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// A structured diagnostic tied to one script.
///
/// Tools render these; they must not parse free-form log lines.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{location}: {code} [{category}] {message}")]
pub struct ScriptError {
    /// Diagnostic code (e.g., E200).
    pub code: ErrorCode,
    pub severity: Severity,
    /// Derived from the code.
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Scene, actor, script, and when known the command and byte offset.
    pub location: ScriptLocation,
}

impl ScriptError {
    /// Create an error-severity diagnostic.
    pub fn new(code: ErrorCode, message: impl Into<String>, location: ScriptLocation) -> Self {
        Self {
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            location,
        }
    }

    /// Create a warning-severity diagnostic.
    pub fn warning(code: ErrorCode, message: impl Into<String>, location: ScriptLocation) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(code, message, location)
        }
    }
}

/// Collected diagnostics for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<ScriptError>,
    pub warnings: Vec<ScriptError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.total_warnings > 0
    }

    pub fn is_empty(&self) -> bool {
        self.total_errors == 0 && self.total_warnings == 0
    }

    /// Add an error, respecting the MAX_DIAGNOSTICS limit.
    pub fn push_error(&mut self, error: ScriptError) {
        if self.errors.len() < MAX_DIAGNOSTICS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Add a warning, respecting the MAX_DIAGNOSTICS limit.
    pub fn push_warning(&mut self, warning: ScriptError) {
        if self.warnings.len() < MAX_DIAGNOSTICS {
            self.warnings.push(warning);
        }
        self.total_warnings += 1;
    }

    /// Route a diagnostic by its severity.
    pub fn push(&mut self, diagnostic: ScriptError) {
        match diagnostic.severity {
            Severity::Error => self.push_error(diagnostic),
            Severity::Warning => self.push_warning(diagnostic),
        }
    }

    /// Append another collector, keeping its totals.
    pub fn merge(&mut self, other: Diagnostics) {
        let dropped_errors = other.total_errors - other.errors.len();
        let dropped_warnings = other.total_warnings - other.warnings.len();
        for e in other.errors {
            self.push_error(e);
        }
        for w in other.warnings {
            self.push_warning(w);
        }
        self.total_errors += dropped_errors;
        self.total_warnings += dropped_warnings;
    }

    /// Iterate errors then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &ScriptError> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Whether any stored diagnostic carries the given code.
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.iter().any(|d| d.code == code)
    }
}
