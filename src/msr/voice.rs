//! Voices
//!
//! A voice owns the ordered sequence of its segments, repeats, multiple
//! rests and measures repeats, plus the initial elements (clefs, keys,
//! times, barlines) seen before its first segment, plus its lyric
//! stanzas. While building, exactly one "last segment" is under active
//! construction; new measures append to it until a repeat or multiple
//! rest boundary forces a fresh one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attributes::{Barline, Clef, Key, Time};
use super::duration::WholeNotes;
use super::ids::{
    MeasureId, MeasuresRepeatId, MultipleRestId, NoteId, RepeatId, SegmentId, StaffId, StanzaId,
};

/// What kind of material a voice carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceKind {
    Regular,
    Harmony,
    FiguredBass,
}

/// Attributes appearing before the voice's first segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VoiceInitialElement {
    Clef(Clef),
    Key(Key),
    Time(Time),
    Barline(Barline),
}

/// Top-level structure of a voice, in performance order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceElement {
    Segment(SegmentId),
    Repeat(RepeatId),
    MultipleRest(MultipleRestId),
    MeasuresRepeat(MeasuresRepeatId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub input_line_number: u32,
    /// 1-based voice number within the staff
    pub number: u32,
    pub kind: VoiceKind,
    pub name: String,
    initial_elements: Vec<VoiceInitialElement>,
    elements: Vec<VoiceElement>,
    /// The segment under active construction, always the last element
    /// while building
    last_segment: Option<SegmentId>,
    stanzas: BTreeMap<u32, StanzaId>,
    /// Shortest note seen, for divisions-per-quarter inference
    shortest_note_duration: Option<WholeNotes>,
    /// The most recently appended note, for chord continuation
    last_appended_note: Option<NoteId>,
    /// Flat measure list cache, filled at finalization
    flat_measures: Vec<MeasureId>,
    finalized: bool,
    staff_uplink: StaffId,
}

impl Voice {
    pub fn new(
        input_line_number: u32,
        number: u32,
        kind: VoiceKind,
        staff_uplink: StaffId,
    ) -> Result<Self, String> {
        if number == 0 {
            return Err("voice number must be positive".to_string());
        }
        Ok(Self {
            input_line_number,
            number,
            kind,
            name: format!("Voice {}", number),
            initial_elements: Vec::new(),
            elements: Vec::new(),
            last_segment: None,
            stanzas: BTreeMap::new(),
            shortest_note_duration: None,
            last_appended_note: None,
            flat_measures: Vec::new(),
            finalized: false,
            staff_uplink,
        })
    }

    pub fn initial_elements(&self) -> &[VoiceInitialElement] {
        &self.initial_elements
    }

    pub fn elements(&self) -> &[VoiceElement] {
        &self.elements
    }

    pub fn last_segment(&self) -> Option<SegmentId> {
        self.last_segment
    }

    pub fn stanzas(&self) -> &BTreeMap<u32, StanzaId> {
        &self.stanzas
    }

    pub fn shortest_note_duration(&self) -> Option<WholeNotes> {
        self.shortest_note_duration
    }

    pub fn last_appended_note(&self) -> Option<NoteId> {
        self.last_appended_note
    }

    /// The flattened measure list: segments, repeats and multiple rests
    /// unrolled into one linear sequence. Available after finalization.
    pub fn flat_measures(&self) -> &[MeasureId] {
        &self.flat_measures
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn staff_uplink(&self) -> StaffId {
        self.staff_uplink
    }

    pub fn append_initial_element(&mut self, element: VoiceInitialElement) {
        self.initial_elements.push(element);
    }

    /// Open a fresh segment; it becomes the active tail of the voice
    pub fn append_segment(&mut self, segment: SegmentId) {
        self.elements.push(VoiceElement::Segment(segment));
        self.last_segment = Some(segment);
    }

    /// Replace trailing elements with a repeat that wrapped them.
    /// `wrapped_tail` says how many trailing elements the repeat absorbed.
    pub fn wrap_tail_into_repeat(&mut self, wrapped_tail: usize, repeat: RepeatId) {
        let keep = self.elements.len().saturating_sub(wrapped_tail);
        self.elements.truncate(keep);
        self.elements.push(VoiceElement::Repeat(repeat));
        self.last_segment = None;
    }

    pub fn append_multiple_rest(&mut self, multiple_rest: MultipleRestId) {
        self.elements.push(VoiceElement::MultipleRest(multiple_rest));
        self.last_segment = None;
    }

    pub fn append_measures_repeat(&mut self, measures_repeat: MeasuresRepeatId) {
        self.elements
            .push(VoiceElement::MeasuresRepeat(measures_repeat));
        self.last_segment = None;
    }

    pub fn register_stanza(&mut self, number: u32, stanza: StanzaId) {
        self.stanzas.insert(number, stanza);
    }

    /// Track the shortest sounding duration seen in this voice
    pub fn account_note_duration(&mut self, duration: WholeNotes) {
        if duration.is_zero() {
            return;
        }
        match self.shortest_note_duration {
            Some(shortest) if shortest <= duration => {}
            _ => self.shortest_note_duration = Some(duration),
        }
    }

    pub fn set_last_appended_note(&mut self, note: NoteId) {
        self.last_appended_note = Some(note);
    }

    /// Drop trailing elements after they moved into a wrapping entity
    /// (repeat ending, rest pattern). Builder backtracking only.
    pub(crate) fn truncate_elements(&mut self, len: usize) {
        self.elements.truncate(len);
        self.last_segment = None;
    }

    /// Swap out the whole element list, used when finalization rebuilds
    /// it (full-measure-rest compression)
    pub(crate) fn replace_elements(&mut self, elements: Vec<VoiceElement>) {
        self.elements = elements;
        self.last_segment = None;
    }

    pub(crate) fn set_flat_measures(&mut self, measures: Vec<MeasureId>) {
        self.flat_measures = measures;
        self.finalized = true;
    }

    pub(crate) fn set_staff_uplink(&mut self, staff: StaffId) {
        self.staff_uplink = staff;
    }

    pub(crate) fn reset_for_clone(&mut self) {
        self.initial_elements.clear();
        self.elements.clear();
        self.last_segment = None;
        self.stanzas.clear();
        self.shortest_note_duration = None;
        self.last_appended_note = None;
        self.flat_measures.clear();
        self.finalized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::ids::EntityId;

    fn test_voice() -> Voice {
        Voice::new(1, 1, VoiceKind::Regular, StaffId::from_index(0)).unwrap()
    }

    #[test]
    fn test_voice_number_validation() {
        assert!(Voice::new(1, 0, VoiceKind::Regular, StaffId::from_index(0)).is_err());
    }

    #[test]
    fn test_segment_becomes_active_tail() {
        let mut voice = test_voice();
        voice.append_segment(SegmentId::from_index(0));
        assert_eq!(voice.last_segment(), Some(SegmentId::from_index(0)));
        voice.append_segment(SegmentId::from_index(1));
        assert_eq!(voice.last_segment(), Some(SegmentId::from_index(1)));
        assert_eq!(voice.elements().len(), 2);
    }

    #[test]
    fn test_wrap_tail_into_repeat() {
        let mut voice = test_voice();
        voice.append_segment(SegmentId::from_index(0));
        voice.append_segment(SegmentId::from_index(1));
        voice.wrap_tail_into_repeat(1, RepeatId::from_index(0));
        assert_eq!(
            voice.elements(),
            &[
                VoiceElement::Segment(SegmentId::from_index(0)),
                VoiceElement::Repeat(RepeatId::from_index(0)),
            ]
        );
        assert_eq!(voice.last_segment(), None);
    }

    #[test]
    fn test_shortest_note_tracking() {
        let mut voice = test_voice();
        voice.account_note_duration(WholeNotes::new(1, 4));
        voice.account_note_duration(WholeNotes::new(1, 16));
        voice.account_note_duration(WholeNotes::new(1, 8));
        assert_eq!(voice.shortest_note_duration(), Some(WholeNotes::new(1, 16)));
        // Zero-length grace notes never count
        voice.account_note_duration(WholeNotes::zero());
        assert_eq!(voice.shortest_note_duration(), Some(WholeNotes::new(1, 16)));
    }
}
