//! Cloning: newborn clones and deep copies
//!
//! Two clone flavors. A newborn clone copies identity and configuration
//! into a fresh entity with empty children, for re-parenting before the
//! material is repopulated by re-traversal. A deep copy recursively
//! clones the whole owned subtree, re-targeting every non-owning uplink
//! to the clone's own entities; it never mutates the original and the
//! clone's uplinks never point back into the original graph.
//!
//! A whole-score deep copy is `Score::clone()`: ids are arena indices, so
//! the cloned arenas are internally consistent by construction. The
//! methods here cover cloning a subtree *within* one score, where ids
//! must be remapped.

use std::collections::HashMap;

use super::ids::{
    GraceNotesGroupId, MeasureId, NoteId, PartGroupId, PartId, SegmentId, StaffId, StanzaId,
    SyllableId, TupletId, VoiceId,
};
use super::measure::{Measure, MeasureElement};
use super::note::{GraceNotesGroup, Note};
use super::repeats::RepeatEnding;
use super::score::Score;
use super::tuplet::TupletElement;
use super::voice::VoiceElement;

/// Stanza id remapping carried through one voice deep copy
type StanzaMap = HashMap<StanzaId, StanzaId>;

impl Score {
    // ------------------------------------------------------------------
    // Newborn clones
    // ------------------------------------------------------------------

    /// Newborn clone of a part group, attached at the score's top level
    pub fn newborn_clone_part_group(&mut self, source: PartGroupId) -> PartGroupId {
        let mut group = self.part_group(source).clone();
        group.reset_for_clone();
        self.add_top_part_group(group)
    }

    /// Newborn clone of a part under a (possibly different) group
    pub fn newborn_clone_part(&mut self, source: PartId, into_group: PartGroupId) -> PartId {
        let mut part = self.part(source).clone();
        part.reset_for_clone();
        part.set_part_group_uplink(into_group);
        self.add_part(into_group, part)
    }

    /// Newborn clone of a staff under a part
    pub fn newborn_clone_staff(&mut self, source: StaffId, into_part: PartId) -> StaffId {
        let mut staff = self.staff(source).clone();
        staff.reset_for_clone();
        staff.set_part_uplink(into_part);
        self.add_staff(into_part, staff)
    }

    /// Newborn clone of a voice under a staff
    pub fn newborn_clone_voice(&mut self, source: VoiceId, into_staff: StaffId) -> VoiceId {
        let mut voice = self.voice(source).clone();
        voice.reset_for_clone();
        voice.set_staff_uplink(into_staff);
        self.add_voice(into_staff, voice)
    }

    // ------------------------------------------------------------------
    // Deep copies
    // ------------------------------------------------------------------

    /// Deep copy a part, placing the copy under `into_group`
    pub fn deep_copy_part(&mut self, source: PartId, into_group: PartGroupId) -> PartId {
        let copy = self.newborn_clone_part(source, into_group);
        let staff_numbers: Vec<(u32, StaffId)> = self
            .part(source)
            .staves()
            .iter()
            .map(|(&n, &s)| (n, s))
            .collect();
        for (_, staff) in staff_numbers {
            self.deep_copy_staff(staff, copy);
        }
        // High tide is derived from the copied measures, same value
        let high_tide = self.part(source).measure_length_high_tide();
        self.part_mut(copy).account_measure_length(high_tide);
        copy
    }

    /// Deep copy a staff, placing the copy under `into_part`
    pub fn deep_copy_staff(&mut self, source: StaffId, into_part: PartId) -> StaffId {
        let copy = self.newborn_clone_staff(source, into_part);
        let voices: Vec<VoiceId> = self.staff(source).voices().values().copied().collect();
        for voice in voices {
            self.deep_copy_voice(voice, copy);
        }
        copy
    }

    /// Deep copy a voice, placing the copy under `into_staff`
    pub fn deep_copy_voice(&mut self, source: VoiceId, into_staff: StaffId) -> VoiceId {
        let copy = self.newborn_clone_voice(source, into_staff);

        for element in self.voice(source).initial_elements().to_vec() {
            self.voice_mut(copy).append_initial_element(element);
        }

        // Stanza shells first so syllable copies can remap their uplinks
        let mut stanza_map: StanzaMap = HashMap::new();
        let stanzas: Vec<(u32, StanzaId)> = self
            .voice(source)
            .stanzas()
            .iter()
            .map(|(&n, &s)| (n, s))
            .collect();
        for (number, stanza) in stanzas {
            let mut shell = self.stanza(stanza).clone();
            shell.clear_syllables();
            shell.set_voice_uplink(copy);
            let new_stanza = self.alloc_stanza(shell);
            self.voice_mut(copy).register_stanza(number, new_stanza);
            stanza_map.insert(stanza, new_stanza);
        }

        let elements = self.voice(source).elements().to_vec();
        for element in elements {
            match element {
                VoiceElement::Segment(segment) => {
                    let line = self.segment(segment).input_line_number;
                    let new_segment = self.open_segment(copy, line);
                    self.deep_copy_segment_measures(segment, new_segment, &stanza_map);
                }
                VoiceElement::Repeat(repeat) => {
                    let new_repeat = {
                        let mut shell = self.repeat(repeat).clone();
                        shell.reset_for_clone();
                        shell.set_voice_uplink(copy);
                        self.alloc_repeat(shell)
                    };
                    if let Some(common) = self.repeat(repeat).common_part().cloned() {
                        let new_segment = self.deep_copy_detached_segment(
                            common.segment,
                            copy,
                            &stanza_map,
                        );
                        self.repeat_mut(new_repeat)
                            .set_common_part(common.input_line_number, new_segment);
                    }
                    for ending in self.repeat(repeat).endings().to_vec() {
                        let source_ending = self.repeat_ending(ending).clone();
                        let new_segment = self.deep_copy_detached_segment(
                            source_ending.segment,
                            copy,
                            &stanza_map,
                        );
                        let new_ending = self.alloc_repeat_ending(RepeatEnding::new(
                            source_ending.input_line_number,
                            source_ending.number.clone(),
                            source_ending.kind,
                            new_segment,
                            new_repeat,
                        ));
                        self.repeat_mut(new_repeat).append_ending(new_ending);
                    }
                    self.voice_mut(copy).wrap_tail_into_repeat(0, new_repeat);
                }
                VoiceElement::MultipleRest(rest) => {
                    let source_rest = self.multiple_rest(rest).clone();
                    let new_segment = self.deep_copy_detached_segment(
                        source_rest.segment,
                        copy,
                        &stanza_map,
                    );
                    let mut shell = source_rest;
                    shell.segment = new_segment;
                    shell.set_voice_uplink(copy);
                    let new_rest = self.alloc_multiple_rest(shell);
                    self.voice_mut(copy).append_multiple_rest(new_rest);
                }
                VoiceElement::MeasuresRepeat(measures_repeat) => {
                    let source_repeat = self.measures_repeat(measures_repeat).clone();
                    let new_segment = self.deep_copy_detached_segment(
                        source_repeat.pattern_segment,
                        copy,
                        &stanza_map,
                    );
                    let mut shell = source_repeat;
                    shell.pattern_segment = new_segment;
                    shell.set_voice_uplink(copy);
                    let new_measures_repeat = self.alloc_measures_repeat(shell);
                    self.voice_mut(copy).append_measures_repeat(new_measures_repeat);
                }
            }
        }
        copy
    }

    /// Deep copy a segment into a detached segment owned by a wrapping
    /// entity (repeat common part, ending, rest pattern)
    fn deep_copy_detached_segment(
        &mut self,
        source: SegmentId,
        into_voice: VoiceId,
        stanza_map: &StanzaMap,
    ) -> SegmentId {
        let line = self.segment(source).input_line_number;
        let copy = self.alloc_detached_segment(into_voice, line);
        self.deep_copy_segment_measures(source, copy, stanza_map);
        copy
    }

    fn deep_copy_segment_measures(
        &mut self,
        source: SegmentId,
        target: SegmentId,
        stanza_map: &StanzaMap,
    ) {
        for measure in self.segment(source).measures().to_vec() {
            self.deep_copy_measure(measure, target, stanza_map);
        }
    }

    /// Deep copy one measure into a target segment
    pub(crate) fn deep_copy_measure(
        &mut self,
        source: MeasureId,
        into_segment: SegmentId,
        stanza_map: &StanzaMap,
    ) -> MeasureId {
        let was_finalized = self.measure(source).is_finalized();
        let elements: Vec<MeasureElement> = self.measure(source).elements().to_vec();
        // Start from an empty shell so appends redo the length and
        // position bookkeeping against the copy
        let shell = {
            let src = self.measure(source);
            let mut fresh = Measure::new(
                src.input_line_number,
                src.number().to_string(),
                src.ordinal(),
                src.time(),
                src.is_first_in_segment(),
                into_segment,
            );
            if let Some(next) = src.next_measure_ordinal() {
                fresh.set_next_measure_ordinal(next);
            }
            fresh
        };
        let copy = self.append_measure_to_segment(into_segment, shell);

        for element in elements {
            match element {
                MeasureElement::Note(note) => {
                    let new_note = self.deep_copy_note(note, stanza_map);
                    self.append_note_to_measure(copy, new_note);
                }
                MeasureElement::Chord(chord) => {
                    self.deep_copy_chord_into_measure(chord, copy, stanza_map);
                }
                MeasureElement::Tuplet(tuplet) => {
                    self.deep_copy_tuplet_into_measure(tuplet, copy, stanza_map);
                }
                other => self.append_element_to_measure(copy, other),
            }
        }
        if was_finalized {
            self.measure_mut(copy).finalize();
        }
        copy
    }

    /// Deep copy a note; decorations travel with the value clone, grace
    /// groups and syllables are remapped
    fn deep_copy_note(&mut self, source: NoteId, stanza_map: &StanzaMap) -> NoteId {
        let syllables: Vec<SyllableId> = self.note(source).syllables().to_vec();
        let grace_before = self.note(source).grace_group_before();
        let grace_after = self.note(source).grace_group_after();

        let value = self.note(source).clone();
        let copy = self.clear_copied_note_attachments(value);

        for syllable in syllables {
            let stanza = self.syllable(syllable).stanza_uplink();
            if let Some(&new_stanza) = stanza_map.get(&stanza) {
                let mut syllable_value = self.syllable(syllable).clone();
                syllable_value.reset_uplinks();
                syllable_value.set_stanza_uplink(new_stanza);
                let new_syllable = self.alloc_syllable(syllable_value);
                self.attach_syllable(new_stanza, new_syllable, copy);
            }
        }
        if let Some(group) = grace_before {
            let new_group = self.deep_copy_grace_group(group, stanza_map);
            self.grace_group_mut(new_group).set_note_uplink(copy);
            self.note_mut(copy).set_grace_group_before(new_group);
        }
        if let Some(group) = grace_after {
            let new_group = self.deep_copy_grace_group(group, stanza_map);
            self.grace_group_mut(new_group).set_note_uplink(copy);
            self.note_mut(copy).set_grace_group_after(new_group);
        }
        copy
    }

    /// Allocate the cloned note value with child attachments cleared;
    /// they are re-created by the caller with remapped ids
    fn clear_copied_note_attachments(&mut self, mut value: Note) -> NoteId {
        value = {
            let line = value.input_line_number;
            let kind = value.kind();
            let mut fresh = Note::new(
                line,
                kind,
                value.pitch(),
                value.sounding_duration(),
                value.display_duration(),
                value.dots,
            )
            .expect("cloned note was already validated");
            fresh.accidental = value.accidental;
            fresh.head = value.head;
            fresh.stem = value.stem;
            fresh.print_object = value.print_object;
            for &beam in value.beams() {
                fresh.append_beam(beam);
            }
            for &tie in value.ties() {
                fresh.append_tie(tie);
            }
            for &slur in value.slurs() {
                fresh.append_slur(slur);
            }
            for &articulation in value.articulations() {
                fresh.append_articulation(articulation);
            }
            for &dynamics in value.dynamics() {
                fresh.append_dynamics(dynamics);
            }
            fresh
        };
        self.alloc_note(value)
    }

    fn deep_copy_chord_into_measure(
        &mut self,
        source: super::ids::ChordId,
        into_measure: MeasureId,
        stanza_map: &StanzaMap,
    ) {
        let members = self.chord(source).member_notes().to_vec();
        let mut shell = self.chord(source).clone();
        shell.reset_uplinks();
        shell.clear_member_notes();
        let copy = self.alloc_chord(shell);
        self.append_chord_to_measure(into_measure, copy);
        for member in members {
            let new_note = self.deep_copy_note(member, stanza_map);
            self.append_note_to_chord(copy, new_note);
        }
    }

    fn deep_copy_tuplet_into_measure(
        &mut self,
        source: TupletId,
        into_measure: MeasureId,
        stanza_map: &StanzaMap,
    ) -> TupletId {
        let mut shell = self.tuplet(source).clone();
        shell.reset_uplinks();
        shell.clear_elements();
        let copy = self.alloc_tuplet(shell);
        self.append_tuplet_to_measure(into_measure, copy);
        self.deep_copy_tuplet_members(source, copy, stanza_map);
        copy
    }

    fn deep_copy_tuplet_members(
        &mut self,
        source: TupletId,
        target: TupletId,
        stanza_map: &StanzaMap,
    ) {
        for element in self.tuplet(source).elements().to_vec() {
            match element {
                TupletElement::Note(note) => {
                    let new_note = self.deep_copy_note(note, stanza_map);
                    self.append_note_to_tuplet(target, new_note);
                }
                TupletElement::Chord(chord) => {
                    let members = self.chord(chord).member_notes().to_vec();
                    let mut shell = self.chord(chord).clone();
                    shell.reset_uplinks();
                    shell.clear_member_notes();
                    let new_chord = self.alloc_chord(shell);
                    self.append_chord_to_tuplet(target, new_chord);
                    for member in members {
                        let new_note = self.deep_copy_note(member, stanza_map);
                        self.append_note_to_chord(new_chord, new_note);
                    }
                }
                TupletElement::Tuplet(nested) => {
                    let mut shell = self.tuplet(nested).clone();
                    shell.reset_uplinks();
                    shell.clear_elements();
                    let new_nested = self.alloc_tuplet(shell);
                    self.append_tuplet_to_tuplet(target, new_nested);
                    self.deep_copy_tuplet_members(nested, new_nested, stanza_map);
                }
            }
        }
    }

    /// Clone a grace group with its member notes
    pub(crate) fn deep_copy_grace_group(
        &mut self,
        source: GraceNotesGroupId,
        stanza_map: &StanzaMap,
    ) -> GraceNotesGroupId {
        let members = self.grace_group(source).notes().to_vec();
        let mut shell = self.grace_group(source).clone();
        shell.reset_uplinks();
        shell.clear_notes();
        let copy = self.alloc_grace_group(shell);
        for member in members {
            let new_note = self.deep_copy_note(member, stanza_map);
            self.append_note_to_grace_group(copy, new_note);
        }
        copy
    }

    /// Clone a grace group into an equivalent group of invisible skips,
    /// preserving display durations. Used when a backend needs sibling
    /// voices to advance together through grace time.
    pub fn clone_grace_group_as_skips(
        &mut self,
        source: GraceNotesGroupId,
    ) -> GraceNotesGroupId {
        let members = self.grace_group(source).notes().to_vec();
        let line = self.grace_group(source).input_line_number;
        let kind = self.grace_group(source).kind;
        let copy = self.alloc_grace_group(GraceNotesGroup::new(line, kind, false));
        for member in members {
            let display = self.note(member).display_duration();
            let member_line = self.note(member).input_line_number;
            let skip = Note::padding_skip(member_line, display);
            let new_note = self.alloc_note(skip);
            self.append_note_to_grace_group(copy, new_note);
        }
        copy
    }

    /// Append a chord as a tuplet member, wiring uplinks and accounting
    /// its length in both the tuplet and the enclosing measure
    pub fn append_chord_to_tuplet(&mut self, tuplet: TupletId, chord: super::ids::ChordId) {
        let sounding = self.chord(chord).sounding_duration();
        self.chord_mut(chord).set_tuplet_uplink(tuplet);
        self.tuplet_mut(tuplet)
            .append_element(TupletElement::Chord(chord), sounding);
        if let Some(measure) = self.tuplet(tuplet).measure_uplink() {
            let position = self.measure(measure).accumulated_length();
            self.chord_mut(chord).set_measure_uplink(measure);
            self.chord_mut(chord).set_position_in_measure(position);
            self.measure_mut(measure).advance_accumulated_length(sounding);
        }
    }
}
