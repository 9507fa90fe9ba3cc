//! Tuplets
//!
//! A tuplet owns an ordered run of elements that may themselves be notes,
//! chords or nested tuplets. Its actual/normal note-count factor combines
//! multiplicatively with any enclosing tuplet's factor; the combined
//! product is cached as the display factor so a member's notated duration
//! can always be recovered exactly from its sounding one.

use serde::{Deserialize, Serialize};

use super::duration::{Rational, WholeNotes};
use super::ids::{ChordId, MeasureId, NoteId, TupletId};

/// What a tuplet may contain, in performance order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TupletElement {
    Note(NoteId),
    Chord(ChordId),
    Tuplet(TupletId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuplet {
    pub input_line_number: u32,
    /// Bracket number distinguishing overlapping tuplets
    pub number: u32,
    actual_notes: u32,
    normal_notes: u32,
    elements: Vec<TupletElement>,
    /// Product of this tuplet's factor and all enclosing ones
    display_factor: Rational,
    /// Total sounding length of the members appended so far
    sounding_duration: WholeNotes,

    measure_uplink: Option<MeasureId>,
    tuplet_uplink: Option<TupletId>,
}

impl Tuplet {
    /// Create a tuplet, validating the note-count factor
    pub fn new(
        input_line_number: u32,
        number: u32,
        actual_notes: u32,
        normal_notes: u32,
    ) -> Result<Self, String> {
        if actual_notes == 0 || normal_notes == 0 {
            return Err(format!(
                "tuplet factor must be positive, got {}/{}",
                actual_notes, normal_notes
            ));
        }
        Ok(Self {
            input_line_number,
            number,
            actual_notes,
            normal_notes,
            elements: Vec::new(),
            display_factor: Rational::new(actual_notes as i64, normal_notes as i64),
            sounding_duration: WholeNotes::zero(),
            measure_uplink: None,
            tuplet_uplink: None,
        })
    }

    pub fn actual_notes(&self) -> u32 {
        self.actual_notes
    }

    pub fn normal_notes(&self) -> u32 {
        self.normal_notes
    }

    /// This tuplet's own actual/normal ratio
    pub fn factor(&self) -> Rational {
        Rational::new(self.actual_notes as i64, self.normal_notes as i64)
    }

    /// The combined display-to-sounding ratio for members, including
    /// enclosing tuplets
    pub fn display_factor(&self) -> Rational {
        self.display_factor
    }

    pub fn elements(&self) -> &[TupletElement] {
        &self.elements
    }

    pub fn sounding_duration(&self) -> WholeNotes {
        self.sounding_duration
    }

    pub fn measure_uplink(&self) -> Option<MeasureId> {
        self.measure_uplink
    }

    pub fn tuplet_uplink(&self) -> Option<TupletId> {
        self.tuplet_uplink
    }

    /// Combine an enclosing tuplet's display factor into this one. Called
    /// once when the tuplet is opened inside another.
    pub fn apply_enclosing_factor(&mut self, enclosing: Rational) {
        self.display_factor = self.factor() * enclosing;
    }

    /// Append a member and account for its sounding length
    pub fn append_element(&mut self, element: TupletElement, sounding: WholeNotes) {
        self.elements.push(element);
        self.sounding_duration += sounding;
    }

    /// Drop the most recently appended member. The single backtracking
    /// rewrite: chord recognition replaces a just-appended note.
    pub fn replace_last_element(
        &mut self,
        element: TupletElement,
    ) -> Option<TupletElement> {
        let last = self.elements.pop();
        self.elements.push(element);
        last
    }

    pub fn set_measure_uplink(&mut self, measure: MeasureId) {
        debug_assert!(self.measure_uplink.is_none() || self.measure_uplink == Some(measure));
        self.measure_uplink = Some(measure);
    }

    pub fn set_tuplet_uplink(&mut self, tuplet: TupletId) {
        debug_assert!(self.tuplet_uplink.is_none());
        self.tuplet_uplink = Some(tuplet);
    }

    pub(crate) fn reset_uplinks(&mut self) {
        self.measure_uplink = None;
        self.tuplet_uplink = None;
    }

    pub(crate) fn clear_elements(&mut self) {
        self.elements.clear();
        self.sounding_duration = WholeNotes::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::ids::EntityId;

    #[test]
    fn test_factor_validation() {
        assert!(Tuplet::new(1, 1, 3, 2).is_ok());
        assert!(Tuplet::new(1, 1, 0, 2).is_err());
        assert!(Tuplet::new(1, 1, 3, 0).is_err());
    }

    #[test]
    fn test_nested_display_factor() {
        // 3:2 inside 3:2 gives a combined display factor of 9/4
        let outer = Tuplet::new(1, 1, 3, 2).unwrap();
        let mut inner = Tuplet::new(2, 2, 3, 2).unwrap();
        inner.apply_enclosing_factor(outer.display_factor());
        assert_eq!(inner.display_factor(), Rational::new(9, 4));
    }

    #[test]
    fn test_sounding_duration_accumulates() {
        let mut tuplet = Tuplet::new(1, 1, 3, 2).unwrap();
        for i in 0..3 {
            tuplet.append_element(
                TupletElement::Note(NoteId::from_index(i)),
                WholeNotes::new(1, 12),
            );
        }
        assert_eq!(tuplet.sounding_duration(), WholeNotes::new(1, 4));
        assert_eq!(tuplet.elements().len(), 3);
    }
}
