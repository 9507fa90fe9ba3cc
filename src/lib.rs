//! Music score representation core
//!
//! The middle stage of a notation translation pipeline: an input-format
//! parser feeds a strictly ordered event stream into the incremental
//! [`builder`], which assembles an [`msr::Score`], runs the finalization
//! pass, and hands the result to output backends that walk it with the
//! [`visitor`] protocol.
//!
//! ```no_run
//! use msr::builder::{EventKind, InputEvent, NoteEvent, ScoreBuilder};
//! use msr::config::Settings;
//! use msr::msr::{Pitch, Step};
//!
//! # fn main() -> Result<(), msr::errors::BuildError> {
//! let events = vec![
//!     InputEvent::new(1, EventKind::PartStart {
//!         id: "P1".to_string(),
//!         name: "Flute".to_string(),
//!         abbreviation: None,
//!     }),
//!     InputEvent::new(2, EventKind::Divisions { value: 4 }),
//!     InputEvent::new(3, EventKind::MeasureStart { number: "1".to_string() }),
//!     InputEvent::new(4, EventKind::Note(NoteEvent::pitched(
//!         Pitch::natural(Step::C, 4).unwrap(),
//!         16,
//!     ))),
//!     InputEvent::new(5, EventKind::MeasureEnd),
//!     InputEvent::new(6, EventKind::PartEnd),
//!     InputEvent::new(7, EventKind::ScoreEnd),
//! ];
//! let (score, diagnostics) = ScoreBuilder::translate(Settings::default(), events)?;
//! assert_eq!(score.note_count(), 1);
//! assert!(diagnostics.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod msr;
pub mod visitor;

pub use builder::ScoreBuilder;
pub use config::Settings;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use errors::{BuildError, BuildResult};
pub use msr::Score;
pub use visitor::{browse_score, Visitor};
