//! Ancillary attribute value types
//!
//! Clefs, keys, times, barlines, directions, decorations. These are plain
//! values owned inline by the element that carries them; only structural
//! entities (notes, measures, voices, ...) live in arenas. Constructors
//! validate their own inputs; cross-entity invariants belong to the
//! builder and the finalization pass.

use serde::{Deserialize, Serialize};

use super::duration::WholeNotes;
use super::pitch::{Alteration, Step};

// ============================================================================
// CLEF / KEY / TIME
// ============================================================================

/// Clef kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClefKind {
    Treble,
    TrebleMinus8,
    TreblePlus8,
    Bass,
    BassMinus8,
    BassPlus8,
    Alto,
    Tenor,
    Soprano,
    MezzoSoprano,
    Baritone,
    Percussion,
    Tablature,
}

/// A clef, positioned on a staff of its part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    pub kind: ClefKind,
    /// 1-based staff number within the part
    pub staff_number: u32,
}

impl Clef {
    pub fn new(kind: ClefKind, staff_number: u32) -> Result<Self, String> {
        if staff_number == 0 {
            return Err("staff number must be positive".to_string());
        }
        Ok(Self { kind, staff_number })
    }
}

/// Musical mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

/// Key signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Position on the circle of fifths (-7 flats to +7 sharps)
    pub fifths: i8,
    pub mode: Mode,
}

impl Key {
    pub fn new(fifths: i8, mode: Mode) -> Result<Self, String> {
        if !(-7..=7).contains(&fifths) {
            return Err(format!("invalid fifths: {} (must be -7 to +7)", fifths));
        }
        Ok(Self { fifths, mode })
    }
}

/// Time signature, numeric or unmeasured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Time {
    Numeric {
        /// Beats per measure
        beats: u32,
        /// Beat unit (2, 4, 8, 16, ...)
        beat_type: u32,
    },
    SenzaMisura,
}

impl Time {
    pub fn numeric(beats: u32, beat_type: u32) -> Result<Self, String> {
        if beats == 0 {
            return Err("beats must be greater than 0".to_string());
        }
        if !beat_type.is_power_of_two() {
            return Err(format!("beat type must be a power of 2, got {}", beat_type));
        }
        Ok(Time::Numeric { beats, beat_type })
    }

    pub fn is_senza_misura(&self) -> bool {
        matches!(self, Time::SenzaMisura)
    }

    /// The full measure length this time signature implies, if any
    pub fn full_measure_length(&self) -> Option<WholeNotes> {
        match self {
            Time::Numeric { beats, beat_type } => {
                Some(WholeNotes::new(*beats as i64, *beat_type as i64))
            }
            Time::SenzaMisura => None,
        }
    }
}

/// Chromatic transposition of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transpose {
    pub diatonic: i8,
    pub chromatic: i8,
    pub octave_change: i8,
}

// ============================================================================
// BARLINES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineLocation {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineStyle {
    Regular,
    Dotted,
    Dashed,
    Heavy,
    LightLight,
    LightHeavy,
    HeavyLight,
    HeavyHeavy,
    Tick,
    Short,
    None,
}

/// A barline as stored in a measure. Repeat and ending semantics are
/// consumed by the builder; what remains here is the printed bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barline {
    pub location: BarlineLocation,
    pub style: BarlineStyle,
}

impl Barline {
    pub fn new(location: BarlineLocation, style: BarlineStyle) -> Self {
        Self { location, style }
    }
}

// ============================================================================
// DIRECTIONS
// ============================================================================

/// Text placement relative to the staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Above,
    Below,
}

/// Text annotation attached to a measure position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Words {
    pub text: String,
    pub placement: Placement,
}

/// Dynamic levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicsKind {
    PPP,
    PP,
    P,
    MP,
    MF,
    F,
    FF,
    FFF,
    FP,
    SF,
    SFZ,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dynamics {
    pub kind: DynamicsKind,
    pub placement: Placement,
}

/// Hairpin wedges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WedgeKind {
    Crescendo,
    Decrescendo,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wedge {
    pub kind: WedgeKind,
}

/// Octave shift brackets (8va/8vb/15ma ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OctaveShiftKind {
    Up,
    Down,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctaveShift {
    pub kind: OctaveShiftKind,
    /// Interval size: 8 or 15
    pub size: u32,
}

impl OctaveShift {
    pub fn new(kind: OctaveShiftKind, size: u32) -> Result<Self, String> {
        if size != 8 && size != 15 {
            return Err(format!("invalid octave shift size: {} (must be 8 or 15)", size));
        }
        Ok(Self { kind, size })
    }
}

/// Tempo marking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tempo {
    pub text: Option<String>,
    pub beats_per_minute: Option<u16>,
    /// The note value one beat refers to
    pub beat_unit: Option<WholeNotes>,
}

impl Tempo {
    pub fn new(
        text: Option<String>,
        beats_per_minute: Option<u16>,
        beat_unit: Option<WholeNotes>,
    ) -> Result<Self, String> {
        if text.is_none() && beats_per_minute.is_none() {
            return Err("tempo must have either text or a metronome value".to_string());
        }
        Ok(Self {
            text,
            beats_per_minute,
            beat_unit,
        })
    }
}

// ============================================================================
// NOTE DECORATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamKind {
    Begin,
    Continue,
    End,
    ForwardHook,
    BackwardHook,
}

/// One beam level attached to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beam {
    /// Beam level, 1 (eighth) to 8
    pub number: u32,
    pub kind: BeamKind,
}

impl Beam {
    pub fn new(number: u32, kind: BeamKind) -> Result<Self, String> {
        if number == 0 || number > 8 {
            return Err(format!("invalid beam number: {} (must be 1 to 8)", number));
        }
        Ok(Self { number, kind })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieKind {
    Start,
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tie {
    pub kind: TieKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlurKind {
    Start,
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slur {
    /// Slur number, distinguishing overlapping slurs
    pub number: u32,
    pub kind: SlurKind,
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticulationKind {
    Staccato,
    Staccatissimo,
    Accent,
    StrongAccent,
    Marcato,
    Tenuto,
    Portato,
    BreathMark,
    Caesura,
    Scoop,
    Plop,
    Doit,
    Falloff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Articulation {
    pub kind: ArticulationKind,
    pub placement: Option<Placement>,
}

/// Accidental marks as printed (as opposed to the pitch's alteration,
/// which is always sounding truth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccidentalKind {
    Sharp,
    Flat,
    Natural,
    DoubleSharp,
    DoubleFlat,
    QuarterSharp,
    QuarterFlat,
    ThreeQuartersSharp,
    ThreeQuartersFlat,
}

/// Note head shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteHeadKind {
    Normal,
    Diamond,
    Cross,
    Triangle,
    Slash,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemKind {
    Up,
    Down,
    None,
    Double,
}

// ============================================================================
// HARMONY / FIGURED BASS
// ============================================================================

/// Chord qualities for harmony symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonyQuality {
    Major,
    Minor,
    Augmented,
    Diminished,
    Dominant,
    MajorSeventh,
    MinorSeventh,
    DiminishedSeventh,
    HalfDiminished,
    SuspendedSecond,
    SuspendedFourth,
    Power,
    Other,
}

/// A harmony (chord symbol) attached to a measure position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harmony {
    pub root_step: Step,
    pub root_alteration: Alteration,
    pub quality: HarmonyQuality,
    pub bass: Option<(Step, Alteration)>,
    /// Free-text qualifier, e.g. "add9"
    pub text: Option<String>,
}

/// One figure of a figured bass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    pub number: u8,
    pub prefix: Option<FigureModifier>,
    pub suffix: Option<FigureModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureModifier {
    Sharp,
    Flat,
    Natural,
    Slash,
}

/// A figured-bass group attached to a measure position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiguredBass {
    pub figures: Vec<Figure>,
    pub duration: Option<WholeNotes>,
}
