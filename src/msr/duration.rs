//! Exact rational durations
//!
//! All durations in the score are fractions of a whole note, stored as
//! exact rationals. Equality and ordering are exact rational comparisons;
//! floats never enter duration arithmetic, so unlimited tuplet nesting
//! accumulates no rounding error.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

/// Re-export Rational for duration calculations
pub type Rational = Rational64;

/// A duration measured in whole notes
///
/// A quarter note is `WholeNotes::new(1, 4)`; a triplet eighth is
/// `WholeNotes::new(1, 12)`. The inner rational is always kept reduced
/// (num-rational normalizes on construction).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WholeNotes(Rational);

impl WholeNotes {
    /// Create a duration from a numerator/denominator pair
    pub fn new(numerator: i64, denominator: i64) -> Self {
        assert!(denominator > 0, "duration denominator must be positive");
        WholeNotes(Rational::new(numerator, denominator))
    }

    pub fn zero() -> Self {
        WholeNotes(Rational::from_integer(0))
    }

    pub fn from_rational(value: Rational) -> Self {
        WholeNotes(value)
    }

    /// Convert a raw input duration into whole notes.
    ///
    /// The input format measures durations in integer `divisions`, where
    /// `divisions_per_quarter` of them make up one quarter note.
    pub fn from_divisions(
        duration: i64,
        divisions_per_quarter: i64,
    ) -> Result<Self, String> {
        if divisions_per_quarter <= 0 {
            return Err(format!(
                "divisions per quarter note must be positive, got {}",
                divisions_per_quarter
            ));
        }
        if duration < 0 {
            return Err(format!("duration must not be negative, got {}", duration));
        }
        Ok(WholeNotes(Rational::new(duration, divisions_per_quarter * 4)))
    }

    pub fn rational(self) -> Rational {
        self.0
    }

    pub fn numerator(self) -> i64 {
        *self.0.numer()
    }

    pub fn denominator(self) -> i64 {
        *self.0.denom()
    }

    pub fn is_zero(self) -> bool {
        self.0 == Rational::from_integer(0)
    }

    /// Lengthen by augmentation dots: one dot multiplies by 3/2, two by
    /// 7/4, n dots by (2^(n+1) - 1) / 2^n
    pub fn dotted(self, dots: u8) -> Self {
        if dots == 0 {
            return self;
        }
        let multiplier = Rational::new((1i64 << (dots + 1)) - 1, 1i64 << dots);
        WholeNotes(self.0 * multiplier)
    }

    /// Scale by a tuplet factor (or any exact ratio)
    pub fn scaled(self, factor: Rational) -> Self {
        WholeNotes(self.0 * factor)
    }
}

impl Add for WholeNotes {
    type Output = WholeNotes;

    fn add(self, other: WholeNotes) -> WholeNotes {
        WholeNotes(self.0 + other.0)
    }
}

impl AddAssign for WholeNotes {
    fn add_assign(&mut self, other: WholeNotes) {
        self.0 += other.0;
    }
}

impl Sub for WholeNotes {
    type Output = WholeNotes;

    fn sub(self, other: WholeNotes) -> WholeNotes {
        WholeNotes(self.0 - other.0)
    }
}

impl SubAssign for WholeNotes {
    fn sub_assign(&mut self, other: WholeNotes) {
        self.0 -= other.0;
    }
}

impl Sum for WholeNotes {
    fn sum<I: Iterator<Item = WholeNotes>>(iter: I) -> WholeNotes {
        iter.fold(WholeNotes::zero(), |acc, d| acc + d)
    }
}

impl fmt::Display for WholeNotes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.numer(), self.0.denom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_triplet_arithmetic() {
        // Three triplet eighths make exactly one quarter, no epsilon
        let triplet_eighth = WholeNotes::new(1, 12);
        let quarter = WholeNotes::new(1, 4);
        let sum = triplet_eighth + triplet_eighth + triplet_eighth;
        assert_eq!(sum, quarter);
    }

    #[test]
    fn test_from_divisions() {
        // 480 divisions at 480 per quarter is one quarter note
        let d = WholeNotes::from_divisions(480, 480).unwrap();
        assert_eq!(d, WholeNotes::new(1, 4));
        // 720 divisions at 480 per quarter is a dotted quarter
        let d = WholeNotes::from_divisions(720, 480).unwrap();
        assert_eq!(d, WholeNotes::new(3, 8));
    }

    #[test]
    fn test_from_divisions_rejects_non_positive_resolution() {
        assert!(WholeNotes::from_divisions(480, 0).is_err());
        assert!(WholeNotes::from_divisions(480, -4).is_err());
    }

    #[test]
    fn test_dotted() {
        let quarter = WholeNotes::new(1, 4);
        assert_eq!(quarter.dotted(0), quarter);
        assert_eq!(quarter.dotted(1), WholeNotes::new(3, 8));
        assert_eq!(quarter.dotted(2), WholeNotes::new(7, 16));
    }

    #[test]
    fn test_scaled_by_tuplet_factor() {
        // A sounding triplet eighth displays as a regular eighth:
        // 1/12 * 3/2 = 1/8
        let sounding = WholeNotes::new(1, 12);
        let display = sounding.scaled(Rational::new(3, 2));
        assert_eq!(display, WholeNotes::new(1, 8));
    }

    #[test]
    fn test_ordering_is_exact() {
        assert!(WholeNotes::new(1, 3) > WholeNotes::new(333_333, 1_000_000));
    }

    #[test]
    fn test_display() {
        assert_eq!(WholeNotes::new(2, 8).to_string(), "1/4");
    }
}
