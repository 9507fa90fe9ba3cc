//! The music score representation
//!
//! A `Score` is the root of one translation run. It owns typed arenas for
//! every structural entity (part groups, parts, staves, voices, segments,
//! measures, notes, chords, tuplets, grace groups, repeats, rests, lyric
//! stanzas and syllables) and wires them together through ordered child
//! lists and non-owning uplinks. Durations are exact rationals in
//! fractions of a whole note.

pub mod attributes;
pub mod chord;
mod clone;
pub mod duration;
pub mod ids;
pub mod lyrics;
pub mod measure;
pub mod note;
pub mod part;
pub mod part_group;
pub mod pitch;
pub mod repeats;
pub mod score;
pub mod segment;
pub mod staff;
pub mod tuplet;
pub mod voice;

pub use attributes::{
    AccidentalKind, Articulation, ArticulationKind, Barline, BarlineLocation, BarlineStyle, Beam,
    BeamKind, Clef, ClefKind, Dynamics, DynamicsKind, Figure, FigureModifier, FiguredBass,
    Harmony, HarmonyQuality, Key, Mode, NoteHeadKind, OctaveShift, OctaveShiftKind, Placement,
    Slur, SlurKind, StemKind, Tempo, Tie, TieKind, Time, Transpose, Wedge, WedgeKind, Words,
};
pub use chord::Chord;
pub use duration::{Rational, WholeNotes};
pub use ids::{
    Arena, ChordId, EntityId, GraceNotesGroupId, MeasureId, MeasuresRepeatId, MultipleRestId,
    NoteId, PartGroupId, PartId, RepeatEndingId, RepeatId, SegmentId, StaffId, StanzaId,
    SyllableId, TupletId, VoiceId,
};
pub use lyrics::{Stanza, Syllable, SyllableKind};
pub use measure::{Measure, MeasureElement, MeasureKind};
pub use note::{GraceNotesGroup, GraceNotesGroupKind, Note, NoteKind};
pub use part::Part;
pub use part_group::{PartGroup, PartGroupElement, PartGroupSymbolKind};
pub use pitch::{Alteration, Pitch, Step};
pub use repeats::{
    MeasuresRepeat, MultipleRest, Repeat, RepeatCommonPart, RepeatEnding, RepeatEndingKind,
};
pub use score::{Credit, Identification, PageGeometry, Score};
pub use segment::Segment;
pub use staff::{Staff, StaffKind};
pub use tuplet::{Tuplet, TupletElement};
pub use voice::{Voice, VoiceElement, VoiceInitialElement, VoiceKind};
