//! The score root
//!
//! A `Score` owns every entity of one translation run: the typed arenas,
//! the ordered top-level part groups, and the score-wide ancillaries
//! (identification, page geometry, credits). All wiring that establishes
//! ownership or sets uplinks goes through methods here, so the set-once
//! discipline for non-owning references lives in one place.
//!
//! A score is single-threaded and non-reentrant; translating several
//! scores in parallel is safe because nothing here is process-global.

use serde::{Deserialize, Serialize};

use super::chord::Chord;
use super::duration::WholeNotes;
use super::ids::{
    Arena, ChordId, GraceNotesGroupId, MeasureId, MeasuresRepeatId, MultipleRestId, NoteId,
    PartGroupId, PartId, RepeatEndingId, RepeatId, SegmentId, StaffId, StanzaId, SyllableId,
    TupletId, VoiceId,
};
use super::lyrics::{Stanza, Syllable};
use super::measure::{Measure, MeasureElement};
use super::note::{GraceNotesGroup, Note};
use super::part::Part;
use super::part_group::PartGroup;
use super::repeats::{MeasuresRepeat, MultipleRest, Repeat, RepeatEnding};
use super::segment::Segment;
use super::staff::Staff;
use super::tuplet::{Tuplet, TupletElement};
use super::voice::{Voice, VoiceInitialElement};

/// Who wrote what; straight out of the input's identification block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub work_title: Option<String>,
    pub movement_title: Option<String>,
    pub composer: Option<String>,
    pub lyricist: Option<String>,
    pub arranger: Option<String>,
    pub rights: Option<String>,
    pub software: Vec<String>,
}

/// Page layout defaults, in tenths of staff space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_height: Option<f32>,
    pub page_width: Option<f32>,
    pub left_margin: Option<f32>,
    pub right_margin: Option<f32>,
    pub top_margin: Option<f32>,
    pub bottom_margin: Option<f32>,
}

/// A credit line printed on some page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub text: String,
    pub page: u32,
}

/// The root of one translated score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub input_line_number: u32,
    pub identification: Identification,
    pub page_geometry: PageGeometry,
    pub credits: Vec<Credit>,

    /// Top-level part groups, in declaration order
    top_part_groups: Vec<PartGroupId>,

    part_groups: Arena<PartGroupId, PartGroup>,
    parts: Arena<PartId, Part>,
    staves: Arena<StaffId, Staff>,
    voices: Arena<VoiceId, Voice>,
    segments: Arena<SegmentId, Segment>,
    measures: Arena<MeasureId, Measure>,
    notes: Arena<NoteId, Note>,
    chords: Arena<ChordId, Chord>,
    tuplets: Arena<TupletId, Tuplet>,
    grace_groups: Arena<GraceNotesGroupId, GraceNotesGroup>,
    repeats: Arena<RepeatId, Repeat>,
    repeat_endings: Arena<RepeatEndingId, RepeatEnding>,
    multiple_rests: Arena<MultipleRestId, MultipleRest>,
    measures_repeats: Arena<MeasuresRepeatId, MeasuresRepeat>,
    stanzas: Arena<StanzaId, Stanza>,
    syllables: Arena<SyllableId, Syllable>,
}

impl Score {
    pub fn new(input_line_number: u32) -> Self {
        Self {
            input_line_number,
            identification: Identification::default(),
            page_geometry: PageGeometry::default(),
            credits: Vec::new(),
            top_part_groups: Vec::new(),
            part_groups: Arena::new(),
            parts: Arena::new(),
            staves: Arena::new(),
            voices: Arena::new(),
            segments: Arena::new(),
            measures: Arena::new(),
            notes: Arena::new(),
            chords: Arena::new(),
            tuplets: Arena::new(),
            grace_groups: Arena::new(),
            repeats: Arena::new(),
            repeat_endings: Arena::new(),
            multiple_rests: Arena::new(),
            measures_repeats: Arena::new(),
            stanzas: Arena::new(),
            syllables: Arena::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn top_part_groups(&self) -> &[PartGroupId] {
        &self.top_part_groups
    }

    pub fn part_group(&self, id: PartGroupId) -> &PartGroup {
        &self.part_groups[id]
    }

    pub fn part(&self, id: PartId) -> &Part {
        &self.parts[id]
    }

    pub fn staff(&self, id: StaffId) -> &Staff {
        &self.staves[id]
    }

    pub fn voice(&self, id: VoiceId) -> &Voice {
        &self.voices[id]
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id]
    }

    pub fn measure(&self, id: MeasureId) -> &Measure {
        &self.measures[id]
    }

    pub fn note(&self, id: NoteId) -> &Note {
        &self.notes[id]
    }

    pub fn chord(&self, id: ChordId) -> &Chord {
        &self.chords[id]
    }

    pub fn tuplet(&self, id: TupletId) -> &Tuplet {
        &self.tuplets[id]
    }

    pub fn grace_group(&self, id: GraceNotesGroupId) -> &GraceNotesGroup {
        &self.grace_groups[id]
    }

    pub fn repeat(&self, id: RepeatId) -> &Repeat {
        &self.repeats[id]
    }

    pub fn repeat_ending(&self, id: RepeatEndingId) -> &RepeatEnding {
        &self.repeat_endings[id]
    }

    pub fn multiple_rest(&self, id: MultipleRestId) -> &MultipleRest {
        &self.multiple_rests[id]
    }

    pub fn measures_repeat(&self, id: MeasuresRepeatId) -> &MeasuresRepeat {
        &self.measures_repeats[id]
    }

    pub fn stanza(&self, id: StanzaId) -> &Stanza {
        &self.stanzas[id]
    }

    pub fn syllable(&self, id: SyllableId) -> &Syllable {
        &self.syllables[id]
    }

    /// All parts in declaration order, flattening nested groups
    pub fn all_parts(&self) -> Vec<PartId> {
        let mut out = Vec::new();
        for &group in &self.top_part_groups {
            self.collect_parts(group, &mut out);
        }
        out
    }

    fn collect_parts(&self, group: PartGroupId, out: &mut Vec<PartId>) {
        use super::part_group::PartGroupElement;
        for element in self.part_groups[group].elements() {
            match element {
                PartGroupElement::Part(part) => out.push(*part),
                PartGroupElement::PartGroup(nested) => self.collect_parts(*nested, out),
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutable accessors, crate-internal (builder, finalization, cloning)
    // ------------------------------------------------------------------

    pub(crate) fn part_mut(&mut self, id: PartId) -> &mut Part {
        &mut self.parts[id]
    }

    pub(crate) fn staff_mut(&mut self, id: StaffId) -> &mut Staff {
        &mut self.staves[id]
    }

    pub(crate) fn voice_mut(&mut self, id: VoiceId) -> &mut Voice {
        &mut self.voices[id]
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id]
    }

    pub(crate) fn measure_mut(&mut self, id: MeasureId) -> &mut Measure {
        &mut self.measures[id]
    }

    pub(crate) fn note_mut(&mut self, id: NoteId) -> &mut Note {
        &mut self.notes[id]
    }

    pub(crate) fn chord_mut(&mut self, id: ChordId) -> &mut Chord {
        &mut self.chords[id]
    }

    pub(crate) fn tuplet_mut(&mut self, id: TupletId) -> &mut Tuplet {
        &mut self.tuplets[id]
    }

    pub(crate) fn grace_group_mut(&mut self, id: GraceNotesGroupId) -> &mut GraceNotesGroup {
        &mut self.grace_groups[id]
    }

    pub(crate) fn repeat_mut(&mut self, id: RepeatId) -> &mut Repeat {
        &mut self.repeats[id]
    }

    pub(crate) fn measures_repeat_mut(&mut self, id: MeasuresRepeatId) -> &mut MeasuresRepeat {
        &mut self.measures_repeats[id]
    }

    // ------------------------------------------------------------------
    // Construction / wiring
    // ------------------------------------------------------------------

    /// Add a part group at the top level of the score
    pub fn add_top_part_group(&mut self, group: PartGroup) -> PartGroupId {
        let id = self.part_groups.alloc(group);
        self.top_part_groups.push(id);
        id
    }

    /// Add a part group nested inside another
    pub fn add_nested_part_group(
        &mut self,
        parent: PartGroupId,
        group: PartGroup,
    ) -> PartGroupId {
        let id = self.part_groups.alloc(group);
        self.part_groups[id].set_parent_uplink(parent);
        self.part_groups[parent].append_part_group(id);
        id
    }

    /// Add a part to a group
    pub fn add_part(&mut self, group: PartGroupId, part: Part) -> PartId {
        let id = self.parts.alloc(part);
        self.part_groups[group].append_part(id);
        id
    }

    /// Add a staff to a part, registered under its number
    pub fn add_staff(&mut self, part: PartId, staff: Staff) -> StaffId {
        let number = staff.number;
        let id = self.staves.alloc(staff);
        self.parts[part].register_staff(number, id);
        id
    }

    /// Add a voice to a staff, registered under its number
    pub fn add_voice(&mut self, staff: StaffId, voice: Voice) -> VoiceId {
        let number = voice.number;
        let id = self.voices.alloc(voice);
        self.staves[staff].register_voice(number, id);
        id
    }

    /// Open a fresh segment at the tail of a voice
    pub fn open_segment(&mut self, voice: VoiceId, input_line_number: u32) -> SegmentId {
        let ordinal = self.segments.len();
        let id = self
            .segments
            .alloc(Segment::new(input_line_number, ordinal, voice));
        self.voices[voice].append_segment(id);
        id
    }

    /// Allocate a segment without attaching it to a voice's element list.
    /// Used for repeat common parts, endings and rest patterns, whose
    /// segment is owned by the wrapping entity instead.
    pub fn alloc_detached_segment(
        &mut self,
        voice: VoiceId,
        input_line_number: u32,
    ) -> SegmentId {
        let ordinal = self.segments.len();
        self.segments
            .alloc(Segment::new(input_line_number, ordinal, voice))
    }

    /// Append a measure to a segment
    pub fn append_measure_to_segment(&mut self, segment: SegmentId, measure: Measure) -> MeasureId {
        let id = self.measures.alloc(measure);
        self.segments[segment].append_measure(id);
        id
    }

    /// Allocate a note; attaching it is a separate step
    pub fn alloc_note(&mut self, note: Note) -> NoteId {
        self.notes.alloc(note)
    }

    pub fn alloc_chord(&mut self, chord: Chord) -> ChordId {
        self.chords.alloc(chord)
    }

    pub fn alloc_tuplet(&mut self, tuplet: Tuplet) -> TupletId {
        self.tuplets.alloc(tuplet)
    }

    pub fn alloc_grace_group(&mut self, group: GraceNotesGroup) -> GraceNotesGroupId {
        self.grace_groups.alloc(group)
    }

    pub fn alloc_repeat(&mut self, repeat: Repeat) -> RepeatId {
        self.repeats.alloc(repeat)
    }

    pub fn alloc_repeat_ending(&mut self, ending: RepeatEnding) -> RepeatEndingId {
        self.repeat_endings.alloc(ending)
    }

    pub fn alloc_multiple_rest(&mut self, rest: MultipleRest) -> MultipleRestId {
        self.multiple_rests.alloc(rest)
    }

    pub fn alloc_measures_repeat(&mut self, measures_repeat: MeasuresRepeat) -> MeasuresRepeatId {
        self.measures_repeats.alloc(measures_repeat)
    }

    pub fn alloc_stanza(&mut self, stanza: Stanza) -> StanzaId {
        self.stanzas.alloc(stanza)
    }

    pub fn alloc_syllable(&mut self, syllable: Syllable) -> SyllableId {
        self.syllables.alloc(syllable)
    }

    /// Append a note directly to a measure, wiring its uplink and
    /// advancing the accumulated length by its sounding duration
    pub fn append_note_to_measure(&mut self, measure: MeasureId, note: NoteId) {
        let sounding = self.notes[note].sounding_duration();
        let position = self.measures[measure].accumulated_length();
        self.notes[note].set_measure_uplink(measure);
        self.notes[note].set_position_in_measure(position);
        self.measures[measure].append_element(MeasureElement::Note(note), sounding);
    }

    /// Append a chord shell to a measure; used by chord recognition,
    /// which replaces the first member rather than appending
    pub fn append_chord_to_measure(&mut self, measure: MeasureId, chord: ChordId) {
        let sounding = self.chords[chord].sounding_duration();
        let position = self.measures[measure].accumulated_length();
        self.chords[chord].set_measure_uplink(measure);
        self.chords[chord].set_position_in_measure(position);
        self.measures[measure].append_element(MeasureElement::Chord(chord), sounding);
    }

    /// Append a member note to a chord, wiring uplinks. The chord's
    /// shared sounding duration is not changed by new members.
    pub fn append_note_to_chord(&mut self, chord: ChordId, note: NoteId) {
        self.notes[note].set_chord_uplink(chord);
        if let Some(measure) = self.chords[chord].measure_uplink() {
            self.notes[note].set_measure_uplink(measure);
            let position = self.chords[chord].position_in_measure();
            self.notes[note].set_position_in_measure(position);
        }
        self.chords[chord].append_member_note(note);
    }

    /// Append a note as a tuplet member: the tuplet accounts its length,
    /// and so does the enclosing measure
    pub fn append_note_to_tuplet(&mut self, tuplet: TupletId, note: NoteId) {
        let sounding = self.notes[note].sounding_duration();
        self.notes[note].set_tuplet_uplink(tuplet);
        self.tuplets[tuplet].append_element(TupletElement::Note(note), sounding);
        if let Some(measure) = self.tuplets[tuplet].measure_uplink() {
            let position = self.measures[measure].accumulated_length();
            self.notes[note].set_measure_uplink(measure);
            self.notes[note].set_position_in_measure(position);
            self.measures[measure].advance_accumulated_length(sounding);
        }
    }

    /// Append a nested tuplet to its enclosing tuplet. The nested tuplet
    /// inherits the enclosing measure uplink so its members keep
    /// advancing the measure length.
    pub fn append_tuplet_to_tuplet(&mut self, enclosing: TupletId, nested: TupletId) {
        self.tuplets[nested].set_tuplet_uplink(enclosing);
        if let Some(measure) = self.tuplets[enclosing].measure_uplink() {
            self.tuplets[nested].set_measure_uplink(measure);
        }
        self.tuplets[enclosing].append_element(TupletElement::Tuplet(nested), WholeNotes::zero());
    }

    /// Append a tuplet shell to a measure; its members advance the
    /// measure length themselves
    pub fn append_tuplet_to_measure(&mut self, measure: MeasureId, tuplet: TupletId) {
        self.tuplets[tuplet].set_measure_uplink(measure);
        self.measures[measure].append_element(MeasureElement::Tuplet(tuplet), WholeNotes::zero());
    }

    /// Append a grace note to an open grace group
    pub fn append_note_to_grace_group(&mut self, group: GraceNotesGroupId, note: NoteId) {
        self.notes[note].set_grace_group_uplink(group);
        self.grace_groups[group].append_note(note);
    }

    /// Append an attribute or direction element to a measure
    pub fn append_element_to_measure(&mut self, measure: MeasureId, element: MeasureElement) {
        debug_assert!(!matches!(
            element,
            MeasureElement::Note(_) | MeasureElement::Chord(_) | MeasureElement::Tuplet(_)
        ));
        self.measures[measure].append_element(element, WholeNotes::zero());
    }

    /// Append an initial element to a voice (before its first segment)
    pub fn append_initial_element_to_voice(
        &mut self,
        voice: VoiceId,
        element: VoiceInitialElement,
    ) {
        self.voices[voice].append_initial_element(element);
    }

    /// Attach a syllable to both its stanza and the note it is sung on
    pub fn attach_syllable(&mut self, stanza: StanzaId, syllable: SyllableId, note: NoteId) {
        self.stanzas[stanza].append_syllable(syllable);
        self.syllables[syllable].set_note_uplink(note);
        self.notes[note].append_syllable(syllable);
    }

    // ------------------------------------------------------------------
    // Context queries along uplinks
    // ------------------------------------------------------------------

    /// The voice a measure belongs to
    pub fn measure_voice(&self, measure: MeasureId) -> VoiceId {
        let segment = self.measures[measure].segment_uplink();
        self.segments[segment].voice_uplink()
    }

    /// The voice a note belongs to, if attached
    pub fn note_voice(&self, note: NoteId) -> Option<VoiceId> {
        self.notes[note].measure_uplink().map(|m| self.measure_voice(m))
    }

    /// The part a voice belongs to
    pub fn voice_part(&self, voice: VoiceId) -> PartId {
        let staff = self.voices[voice].staff_uplink();
        self.staves[staff].part_uplink()
    }

    /// The part a note lives in, if attached
    pub fn note_part(&self, note: NoteId) -> Option<PartId> {
        self.note_voice(note).map(|v| self.voice_part(v))
    }

    // Entity counts, used by diagnostics and the acyclicity check
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::attributes::Time;
    use crate::msr::note::NoteKind;
    use crate::msr::part_group::PartGroupSymbolKind;
    use crate::msr::staff::StaffKind;
    use crate::msr::voice::VoiceKind;

    fn small_score() -> (Score, VoiceId, MeasureId) {
        let mut score = Score::new(1);
        let group = score.add_top_part_group(PartGroup::new(
            1,
            1,
            None,
            PartGroupSymbolKind::Bracket,
        ));
        let part = score.add_part(group, Part::new(1, "P1", "Flute", group));
        let staff = score.add_staff(part, Staff::new(1, 1, StaffKind::Regular, part).unwrap());
        let voice = score.add_voice(
            staff,
            Voice::new(1, 1, VoiceKind::Regular, staff).unwrap(),
        );
        let segment = score.open_segment(voice, 1);
        let measure = score.append_measure_to_segment(
            segment,
            Measure::new(1, "1", 0, Some(Time::numeric(4, 4).unwrap()), true, segment),
        );
        (score, voice, measure)
    }

    #[test]
    fn test_uplink_navigation() {
        let (mut score, voice, measure) = small_score();
        let note = score
            .alloc_note(
                Note::new(
                    2,
                    NoteKind::Rest,
                    None,
                    WholeNotes::new(1, 4),
                    WholeNotes::new(1, 4),
                    0,
                )
                .unwrap(),
            );
        score.append_note_to_measure(measure, note);

        assert_eq!(score.measure_voice(measure), voice);
        assert_eq!(score.note_voice(note), Some(voice));
        let part = score.note_part(note).unwrap();
        assert_eq!(score.part(part).id, "P1");
    }

    #[test]
    fn test_note_position_tracking() {
        let (mut score, _voice, measure) = small_score();
        for _ in 0..2 {
            let note = score
                .alloc_note(
                    Note::new(
                        2,
                        NoteKind::Rest,
                        None,
                        WholeNotes::new(1, 4),
                        WholeNotes::new(1, 4),
                        0,
                    )
                    .unwrap(),
                );
            score.append_note_to_measure(measure, note);
        }
        let elements = score.measure(measure).elements();
        assert_eq!(elements.len(), 2);
        if let MeasureElement::Note(second) = elements[1] {
            assert_eq!(
                score.note(second).position_in_measure(),
                WholeNotes::new(1, 4)
            );
        } else {
            panic!("expected a note element");
        }
        assert_eq!(
            score.measure(measure).accumulated_length(),
            WholeNotes::new(1, 2)
        );
    }

    #[test]
    fn test_all_parts_flattens_nested_groups() {
        let mut score = Score::new(1);
        let outer = score.add_top_part_group(PartGroup::new(
            1,
            1,
            Some("Winds".to_string()),
            PartGroupSymbolKind::Bracket,
        ));
        let p1 = score.add_part(outer, Part::new(1, "P1", "Flute", outer));
        let inner = score.add_nested_part_group(
            outer,
            PartGroup::new(2, 2, None, PartGroupSymbolKind::Brace),
        );
        let p2 = score.add_part(inner, Part::new(2, "P2", "Oboe", inner));
        assert_eq!(score.all_parts(), vec![p1, p2]);
    }
}
