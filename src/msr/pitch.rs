//! Musical pitch representation

use serde::{Deserialize, Serialize};

/// Diatonic step within the octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Scale degree (0=C .. 6=B)
    pub fn degree(self) -> u8 {
        match self {
            Step::C => 0,
            Step::D => 1,
            Step::E => 2,
            Step::F => 3,
            Step::G => 4,
            Step::A => 5,
            Step::B => 6,
        }
    }
}

/// Chromatic alteration in quarter-tone resolution
///
/// Stored as quarter tones so half-flat/half-sharp pitches are exact:
/// -4 is a double flat, -1 a half flat, +2 a sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alteration(i8);

impl Alteration {
    pub const NATURAL: Alteration = Alteration(0);

    /// Create from quarter tones, -4 (double flat) to +4 (double sharp)
    pub fn from_quarter_tones(quarter_tones: i8) -> Result<Self, String> {
        if !(-4..=4).contains(&quarter_tones) {
            return Err(format!(
                "invalid alteration: {} quarter tones (must be -4 to +4)",
                quarter_tones
            ));
        }
        Ok(Alteration(quarter_tones))
    }

    /// Create from semitones, -2 (double flat) to +2 (double sharp)
    pub fn from_semitones(semitones: i8) -> Result<Self, String> {
        if !(-2..=2).contains(&semitones) {
            return Err(format!(
                "invalid alteration: {} semitones (must be -2 to +2)",
                semitones
            ));
        }
        Ok(Alteration(semitones * 2))
    }

    pub fn quarter_tones(self) -> i8 {
        self.0
    }

    pub fn is_natural(self) -> bool {
        self.0 == 0
    }
}

/// A concrete pitch: step, alteration, octave
///
/// Octave 4 is the middle-C octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    pub alteration: Alteration,
    pub octave: i8,
}

impl Pitch {
    /// Create a new pitch with validation
    pub fn new(step: Step, alteration: Alteration, octave: i8) -> Result<Self, String> {
        if !(-1..=9).contains(&octave) {
            return Err(format!("invalid octave: {} (must be -1 to 9)", octave));
        }
        Ok(Self {
            step,
            alteration,
            octave,
        })
    }

    /// Natural pitch shorthand
    pub fn natural(step: Step, octave: i8) -> Result<Self, String> {
        Self::new(step, Alteration::NATURAL, octave)
    }

    /// Absolute diatonic position, for interval and range comparisons
    pub fn diatonic_index(&self) -> i32 {
        self.octave as i32 * 7 + self.step.degree() as i32
    }
}
