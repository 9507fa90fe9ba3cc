//! Error types for score construction
//!
//! Defines the error hierarchy for translation failures. All variants are
//! fatal: the builder performs no recovery beyond the look-ahead rewrites
//! that are part of normal construction, so any `BuildError` aborts the
//! translation of the current score. Every variant carries the input line
//! number of the offending construct.

use thiserror::Error;

/// Result alias used throughout the builder and finalization passes
pub type BuildResult<T> = Result<T, BuildError>;

/// Fatal score-construction error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    // ------------------------------------------------------------------
    // Structural / nesting errors
    // ------------------------------------------------------------------
    /// Tuplet stop arrived with no open tuplet on the voice
    #[error("line {line}: tuplet stop without a matching tuplet start")]
    UnmatchedTupletStop { line: u32 },

    /// Repeat ending declared outside of any repeat context
    #[error("line {line}: repeat ending '{number}' outside of any repeat")]
    EndingOutsideRepeat { line: u32, number: String },

    /// Backward repeat barline while a repeat ending is still open
    /// and no matching ending stop was seen
    #[error("line {line}: repeat ending left open at end of voice")]
    UnclosedRepeatEnding { line: u32 },

    /// Chord flag on a note with no preceding note in the voice
    #[error("line {line}: chord flag on the first note of a voice")]
    ChordWithoutPreviousNote { line: u32 },

    /// A tuplet was still open when its voice ended
    #[error("line {line}: tuplet left open at end of voice")]
    UnclosedTuplet { line: u32 },

    /// A multiple-rest declaration was not satisfied by enough measures
    #[error("line {line}: multiple rest expects {expected} measures, got {seen}")]
    UnfinishedMultipleRest { line: u32, expected: u32, seen: u32 },

    /// A measures-repeat pattern was declared wider than the material available
    #[error("line {line}: measures-repeat pattern of {wanted} measures, only {available} available")]
    MeasuresRepeatPatternTooWide { line: u32, wanted: u32, available: u32 },

    /// Note, attribute or direction arrived outside of any measure
    #[error("line {line}: {what} outside of any measure")]
    OutsideMeasure { line: u32, what: &'static str },

    /// Backup moved the position cursor before the start of the measure
    #[error("line {line}: backup of {backup} whole notes past the start of the measure")]
    BackupBeforeMeasureStart { line: u32, backup: String },

    // ------------------------------------------------------------------
    // Data-validity errors
    // ------------------------------------------------------------------
    /// Divisions-per-quarter-note must be strictly positive
    #[error("line {line}: non-positive divisions per quarter note: {value}")]
    NonPositiveDivisions { line: u32, value: i64 },

    /// Staff numbers are 1-based
    #[error("line {line}: non-positive staff number: {value}")]
    NonPositiveStaffNumber { line: u32, value: i64 },

    /// Voice numbers are 1-based
    #[error("line {line}: non-positive voice number: {value}")]
    NonPositiveVoiceNumber { line: u32, value: i64 },

    /// Part-group stop with no matching start
    #[error("line {line}: part-group {number} stop without a matching start")]
    UnmatchedPartGroupStop { line: u32, number: i32 },

    /// Events referring to a part that was never started
    #[error("line {line}: no current part")]
    NoCurrentPart { line: u32 },

    /// The same part id listed twice in an omit/keep filter
    #[error("duplicate part id '{id}' in {filter} filter")]
    DuplicatePartFilter { id: String, filter: &'static str },

    /// Omit and keep filters are mutually exclusive
    #[error("both omit-part and keep-part filters are set")]
    ConflictingPartFilters,

    /// A value-type constructor rejected its inputs
    #[error("line {line}: invalid {what}: {message}")]
    InvalidValue {
        line: u32,
        what: &'static str,
        message: String,
    },
}

impl BuildError {
    /// Wrap a value-constructor rejection into a positioned error
    pub fn invalid(line: u32, what: &'static str, message: impl Into<String>) -> Self {
        BuildError::InvalidValue {
            line,
            what,
            message: message.into(),
        }
    }
}
