//! Non-fatal consistency diagnostics
//!
//! Warnings recorded while building or finalizing a score. Unlike
//! `BuildError`, a diagnostic never aborts translation: the finalization
//! pass proceeds with a best-effort classification and downstream backends
//! receive a correctly-flagged-but-imperfect measure. Each record is also
//! mirrored to `log::warn!`.

use serde::{Deserialize, Serialize};

/// What kind of inconsistency was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Measure accumulated more than its time signature allows
    OverfullMeasure,
    /// Measure accumulated less than its time signature requires
    UnderfullMeasure,
    /// Clef, key or time re-declared identically
    RedundantAttribute,
    /// Forward repeat barline never matched by a backward one
    UnmatchedRepeatStart,
    /// Anything else worth surfacing without aborting
    Other,
}

/// One warning, positioned at an input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: u32,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Accumulates warnings for one translation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log facade
    pub fn warn(&mut self, line: u32, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("line {}: {}", line, message);
        self.items.push(Diagnostic {
            line,
            kind,
            message,
        });
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_accumulate() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.warn(3, DiagnosticKind::UnderfullMeasure, "measure 2 is underfull");
        diags.warn(9, DiagnosticKind::OverfullMeasure, "measure 5 is overfull");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.items()[0].line, 3);
        assert_eq!(diags.items()[1].kind, DiagnosticKind::OverfullMeasure);
    }
}
