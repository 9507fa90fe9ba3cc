//! Measures
//!
//! A measure owns an ordered element list and tracks the length
//! accumulated so far against the full length its time signature implies.
//! Element lists are append-only; `replace_last_element` and
//! `remove_last_element` exist solely for the builder's look-ahead
//! backtracking and must not grow into general in-place mutation.

use serde::{Deserialize, Serialize};

use super::attributes::{
    Barline, Clef, FiguredBass, Harmony, Key, OctaveShift, Tempo, Time, Wedge, Words,
};
use super::duration::WholeNotes;
use super::ids::{ChordId, NoteId, SegmentId, TupletId};

/// Classification computed at finalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureKind {
    /// Not yet finalized
    Unknown,
    /// Accumulated length equals the time signature's full length
    Full,
    /// Shorter than full and first in its segment (anacrusis)
    Upbeat,
    /// Shorter than full elsewhere
    Underfull,
    /// Longer than full
    Overfull,
    /// No time signature applies
    SenzaMisura,
    /// No elements at all
    Empty,
}

/// What a measure owns, in performance/reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeasureElement {
    Note(NoteId),
    Chord(ChordId),
    Tuplet(TupletId),
    Clef(Clef),
    Key(Key),
    Time(Time),
    Barline(Barline),
    Words(Words),
    Tempo(Tempo),
    Wedge(Wedge),
    OctaveShift(OctaveShift),
    Harmony(Harmony),
    FiguredBass(FiguredBass),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    pub input_line_number: u32,
    /// The measure number label as given by the input ("1", "4a", "X1")
    number: String,
    /// Canonical position within the voice, assigned at creation
    ordinal: usize,
    /// Ordinal of the following measure, resolved when that measure is
    /// created
    next_measure_ordinal: Option<usize>,
    elements: Vec<MeasureElement>,
    /// Length reached so far by appended events
    accumulated_length: WholeNotes,
    /// Length implied by the time signature in force, if measured
    full_length: Option<WholeNotes>,
    /// The time signature in force at this measure
    time: Option<Time>,
    kind: MeasureKind,
    /// First measure of its segment (upbeat candidate)
    first_in_segment: bool,
    finalized: bool,
    segment_uplink: SegmentId,
}

impl Measure {
    pub fn new(
        input_line_number: u32,
        number: impl Into<String>,
        ordinal: usize,
        time: Option<Time>,
        first_in_segment: bool,
        segment_uplink: SegmentId,
    ) -> Self {
        let full_length = time.as_ref().and_then(Time::full_measure_length);
        Self {
            input_line_number,
            number: number.into(),
            ordinal,
            next_measure_ordinal: None,
            elements: Vec::new(),
            accumulated_length: WholeNotes::zero(),
            full_length,
            time,
            kind: MeasureKind::Unknown,
            first_in_segment,
            finalized: false,
            segment_uplink,
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn next_measure_ordinal(&self) -> Option<usize> {
        self.next_measure_ordinal
    }

    pub fn elements(&self) -> &[MeasureElement] {
        &self.elements
    }

    pub fn accumulated_length(&self) -> WholeNotes {
        self.accumulated_length
    }

    pub fn full_length(&self) -> Option<WholeNotes> {
        self.full_length
    }

    pub fn time(&self) -> Option<Time> {
        self.time
    }

    pub fn kind(&self) -> MeasureKind {
        self.kind
    }

    pub fn is_first_in_segment(&self) -> bool {
        self.first_in_segment
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn segment_uplink(&self) -> SegmentId {
        self.segment_uplink
    }

    /// Append an element, advancing the accumulated length by the time it
    /// occupies (zero for attributes and tuplet shells, whose members
    /// account for themselves)
    pub fn append_element(&mut self, element: MeasureElement, advance: WholeNotes) {
        debug_assert!(!self.finalized, "appending to a finalized measure");
        self.elements.push(element);
        self.accumulated_length += advance;
    }

    /// Advance the accumulated length without appending, used for events
    /// owned by a nested container (tuplet members)
    pub fn advance_accumulated_length(&mut self, advance: WholeNotes) {
        self.accumulated_length += advance;
    }

    /// Replace the most recently appended element.
    ///
    /// The single controlled exception to append-only measures: chord
    /// recognition swaps the just-appended standalone note for the chord
    /// that absorbs it. The occupied time is unchanged by construction
    /// (the chord shares the note's sounding duration), so no length
    /// bookkeeping happens here.
    pub fn replace_last_element(&mut self, element: MeasureElement) -> Option<MeasureElement> {
        let last = self.elements.pop();
        self.elements.push(element);
        last
    }

    /// Remove and return the most recently appended element, rolling back
    /// the length it occupied. Look-ahead backtracking only.
    pub fn remove_last_element(&mut self, occupied: WholeNotes) -> Option<MeasureElement> {
        let last = self.elements.pop();
        if last.is_some() {
            self.accumulated_length -= occupied;
        }
        last
    }

    /// Swap the whole element list. Rest merging only: the replacement
    /// must occupy exactly the same time, so no length bookkeeping.
    pub(crate) fn set_elements(&mut self, elements: Vec<MeasureElement>) {
        self.elements = elements;
    }

    /// A new time signature mid-stream re-derives the full length
    pub fn set_time(&mut self, time: Time) {
        self.full_length = time.full_measure_length();
        self.time = Some(time);
    }

    pub fn set_next_measure_ordinal(&mut self, ordinal: usize) {
        debug_assert!(self.next_measure_ordinal.is_none());
        self.next_measure_ordinal = Some(ordinal);
    }

    pub(crate) fn set_segment_uplink(&mut self, segment: SegmentId) {
        self.segment_uplink = segment;
    }

    /// Classify the measure. Called once by the finalization pass;
    /// classification replaces kind/length fields, never committed
    /// elements.
    pub fn finalize(&mut self) -> MeasureKind {
        let kind = if self.elements.is_empty() {
            MeasureKind::Empty
        } else {
            match self.full_length {
                None => MeasureKind::SenzaMisura,
                Some(full) => {
                    if self.accumulated_length == full {
                        MeasureKind::Full
                    } else if self.accumulated_length < full {
                        if self.first_in_segment {
                            MeasureKind::Upbeat
                        } else {
                            MeasureKind::Underfull
                        }
                    } else {
                        MeasureKind::Overfull
                    }
                }
            }
        };
        self.kind = kind;
        self.finalized = true;
        kind
    }

    /// Whether the measure consists solely of the given rest-note test,
    /// used by full-measure-rest compression
    pub fn has_only_elements_matching(
        &self,
        mut is_matching: impl FnMut(&MeasureElement) -> bool,
    ) -> bool {
        !self.elements.is_empty() && self.elements.iter().all(|e| is_matching(e))
    }
}
