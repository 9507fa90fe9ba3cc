//! Typed input events
//!
//! The input-format parser is an external collaborator: it hands the
//! builder a strictly ordered sequence of these events, each positioned
//! at an input line for diagnostics. Order is semantically meaningful and
//! must never be changed across this boundary, because chord recognition
//! and repeat construction depend on look-ahead over adjacent events.
//!
//! Durations arrive as integer `divisions`; the divisions-per-quarter
//! resolution in force comes from the most recent `Divisions` event of
//! the part.

use serde::{Deserialize, Serialize};

use crate::msr::attributes::{
    AccidentalKind, Articulation, BarlineLocation, BarlineStyle, Beam, Clef, Dynamics,
    FiguredBass, Harmony, Key, NoteHeadKind, OctaveShift, Slur, StemKind, Tempo, Tie, Time,
    Transpose, Wedge, Words,
};
use crate::msr::lyrics::SyllableKind;
use crate::msr::part_group::PartGroupSymbolKind;
use crate::msr::pitch::Pitch;
use crate::msr::score::{Identification, PageGeometry};

/// One event from the input stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Input line the event originates from
    pub line: u32,
    pub kind: EventKind,
}

impl InputEvent {
    pub fn new(line: u32, kind: EventKind) -> Self {
        Self { line, kind }
    }
}

/// Grace-note marker on a note event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraceSpec {
    /// Slashed (acciaccatura) rendering
    pub slash: bool,
}

/// One lyric syllable carried by a note event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricEvent {
    /// 1-based stanza number
    pub stanza_number: u32,
    pub kind: SyllableKind,
    /// Text chunks; more than one when elided
    pub texts: Vec<String>,
    pub elision: bool,
}

/// A note, rest or grace note event
///
/// `duration` is the sounding duration in divisions. Grace notes have no
/// sounding time of their own; for them `duration` carries the written
/// duration instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// 1-based staff number within the part
    pub staff: u32,
    /// 1-based voice number within the staff
    pub voice: u32,
    pub pitch: Option<Pitch>,
    pub is_rest: bool,
    pub is_unpitched: bool,
    /// This note sounds together with the previous one
    pub chord: bool,
    pub grace: Option<GraceSpec>,
    /// Duration in divisions
    pub duration: i64,
    pub dots: u8,
    pub accidental: Option<AccidentalKind>,
    pub head: NoteHeadKind,
    pub stem: Option<StemKind>,
    pub print_object: bool,
    pub beams: Vec<Beam>,
    pub ties: Vec<Tie>,
    pub slurs: Vec<Slur>,
    pub articulations: Vec<Articulation>,
    pub dynamics: Vec<Dynamics>,
    pub lyrics: Vec<LyricEvent>,
}

impl NoteEvent {
    /// A pitched note in staff 1, voice 1
    pub fn pitched(pitch: Pitch, duration: i64) -> Self {
        Self {
            pitch: Some(pitch),
            ..Self::blank()
        }
        .with_duration(duration)
    }

    /// A rest in staff 1, voice 1
    pub fn rest(duration: i64) -> Self {
        Self {
            is_rest: true,
            ..Self::blank()
        }
        .with_duration(duration)
    }

    fn blank() -> Self {
        Self {
            staff: 1,
            voice: 1,
            pitch: None,
            is_rest: false,
            is_unpitched: false,
            chord: false,
            grace: None,
            duration: 0,
            dots: 0,
            accidental: None,
            head: NoteHeadKind::Normal,
            stem: None,
            print_object: true,
            beams: Vec::new(),
            ties: Vec::new(),
            slurs: Vec::new(),
            articulations: Vec::new(),
            dynamics: Vec::new(),
            lyrics: Vec::new(),
        }
    }

    fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }
}

/// Repeat semantics of a barline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMark {
    /// Opens repeated material
    Forward,
    /// Closes repeated material, played `times` times in total
    Backward { times: u32 },
}

/// Ending-bracket semantics of a barline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingMark {
    /// Opens an ending labeled with the given numbers ("1", "1,2")
    Start { number: String },
    /// Closes a hooked ending
    Stop,
    /// Closes a hookless (open) ending, usually the last one
    Discontinue,
}

/// A barline with optional repeat and ending marks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarlineEvent {
    pub staff: u32,
    pub voice: u32,
    pub location: BarlineLocation,
    /// Printed style; `None` leaves the style to the backend
    pub style: Option<BarlineStyle>,
    pub repeat: Option<RepeatMark>,
    pub ending: Option<EndingMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    // Score-level
    Identification(Identification),
    PageGeometry(PageGeometry),
    Credit { text: String, page: u32 },

    // Part structure
    PartGroupStart {
        number: i32,
        name: Option<String>,
        symbol: PartGroupSymbolKind,
    },
    PartGroupStop { number: i32 },
    PartStart {
        id: String,
        name: String,
        abbreviation: Option<String>,
    },
    PartEnd,

    // Attributes
    Divisions { value: i64 },
    Clef(Clef),
    Key(Key),
    Time(Time),
    Transpose(Transpose),

    // Measures and their content
    MeasureStart { number: String },
    MeasureEnd,
    Note(NoteEvent),
    TupletStart {
        staff: u32,
        voice: u32,
        number: u32,
        actual_notes: u32,
        normal_notes: u32,
    },
    TupletStop { staff: u32, voice: u32 },
    Backup { duration: i64 },
    Forward { staff: u32, voice: u32, duration: i64 },
    Barline(BarlineEvent),
    MultipleRestStart { staff: u32, voice: u32, measure_count: u32 },
    MeasuresRepeatStart {
        staff: u32,
        voice: u32,
        measures_per_pattern: u32,
    },
    MeasuresRepeatStop { staff: u32, voice: u32 },

    // Directions
    Words { staff: u32, voice: u32, words: Words },
    Dynamics { staff: u32, voice: u32, dynamics: Dynamics },
    Wedge { staff: u32, voice: u32, wedge: Wedge },
    OctaveShift { staff: u32, voice: u32, shift: OctaveShift },
    Tempo { staff: u32, voice: u32, tempo: Tempo },
    Harmony { staff: u32, voice: u32, harmony: Harmony },
    FiguredBass {
        staff: u32,
        voice: u32,
        figured_bass: FiguredBass,
    },

    /// End of the input stream; triggers finalization
    ScoreEnd,
}
