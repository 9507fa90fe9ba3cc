//! Score traversal
//!
//! A depth-first walk over everything a score owns, in insertion order.
//! `Visitor` offers one start/end pair per structural entity kind and a
//! single callback per leaf value element; every method defaults to a
//! no-op, so a visitor implements only the callbacks it cares about.
//! Which callbacks a visitor overrides never changes what the walk
//! reaches: the browse functions recurse unconditionally.
//!
//! Grace groups are walked around their principal note: the before group
//! first, then the note itself, then the after group.

use crate::msr::attributes::{
    Barline, Clef, FiguredBass, Harmony, Key, OctaveShift, Tempo, Time, Wedge, Words,
};
use crate::msr::ids::{
    ChordId, GraceNotesGroupId, MeasureId, MeasuresRepeatId, MultipleRestId, NoteId, PartGroupId,
    PartId, RepeatEndingId, RepeatId, SegmentId, StaffId, StanzaId, SyllableId, TupletId, VoiceId,
};
use crate::msr::measure::MeasureElement;
use crate::msr::part_group::PartGroupElement;
use crate::msr::score::Score;
use crate::msr::tuplet::TupletElement;
use crate::msr::voice::{VoiceElement, VoiceInitialElement};

/// Callbacks fired by the browse functions. All default to no-ops.
#[allow(unused_variables)]
pub trait Visitor {
    fn start_score(&mut self, score: &Score) {}
    fn end_score(&mut self, score: &Score) {}

    fn start_part_group(&mut self, score: &Score, id: PartGroupId) {}
    fn end_part_group(&mut self, score: &Score, id: PartGroupId) {}

    fn start_part(&mut self, score: &Score, id: PartId) {}
    fn end_part(&mut self, score: &Score, id: PartId) {}

    fn start_staff(&mut self, score: &Score, id: StaffId) {}
    fn end_staff(&mut self, score: &Score, id: StaffId) {}

    fn start_voice(&mut self, score: &Score, id: VoiceId) {}
    fn end_voice(&mut self, score: &Score, id: VoiceId) {}

    fn start_segment(&mut self, score: &Score, id: SegmentId) {}
    fn end_segment(&mut self, score: &Score, id: SegmentId) {}

    fn start_measure(&mut self, score: &Score, id: MeasureId) {}
    fn end_measure(&mut self, score: &Score, id: MeasureId) {}

    fn visit_note(&mut self, score: &Score, id: NoteId) {}

    fn start_chord(&mut self, score: &Score, id: ChordId) {}
    fn end_chord(&mut self, score: &Score, id: ChordId) {}

    fn start_tuplet(&mut self, score: &Score, id: TupletId) {}
    fn end_tuplet(&mut self, score: &Score, id: TupletId) {}

    fn start_grace_notes_group(&mut self, score: &Score, id: GraceNotesGroupId) {}
    fn end_grace_notes_group(&mut self, score: &Score, id: GraceNotesGroupId) {}

    fn start_repeat(&mut self, score: &Score, id: RepeatId) {}
    fn end_repeat(&mut self, score: &Score, id: RepeatId) {}

    fn start_repeat_common_part(&mut self, score: &Score, repeat: RepeatId) {}
    fn end_repeat_common_part(&mut self, score: &Score, repeat: RepeatId) {}

    fn start_repeat_ending(&mut self, score: &Score, id: RepeatEndingId) {}
    fn end_repeat_ending(&mut self, score: &Score, id: RepeatEndingId) {}

    fn start_multiple_rest(&mut self, score: &Score, id: MultipleRestId) {}
    fn end_multiple_rest(&mut self, score: &Score, id: MultipleRestId) {}

    fn start_measures_repeat(&mut self, score: &Score, id: MeasuresRepeatId) {}
    fn end_measures_repeat(&mut self, score: &Score, id: MeasuresRepeatId) {}

    fn start_stanza(&mut self, score: &Score, id: StanzaId) {}
    fn end_stanza(&mut self, score: &Score, id: StanzaId) {}

    fn visit_syllable(&mut self, score: &Score, id: SyllableId) {}

    // Leaf value elements carried inline by measures and voices
    fn visit_clef(&mut self, score: &Score, clef: &Clef) {}
    fn visit_key(&mut self, score: &Score, key: &Key) {}
    fn visit_time(&mut self, score: &Score, time: &Time) {}
    fn visit_barline(&mut self, score: &Score, barline: &Barline) {}
    fn visit_words(&mut self, score: &Score, words: &Words) {}
    fn visit_tempo(&mut self, score: &Score, tempo: &Tempo) {}
    fn visit_wedge(&mut self, score: &Score, wedge: &Wedge) {}
    fn visit_octave_shift(&mut self, score: &Score, shift: &OctaveShift) {}
    fn visit_harmony(&mut self, score: &Score, harmony: &Harmony) {}
    fn visit_figured_bass(&mut self, score: &Score, figured_bass: &FiguredBass) {}
}

/// Walk a whole score
pub fn browse_score<V: Visitor>(visitor: &mut V, score: &Score) {
    visitor.start_score(score);
    for &group in score.top_part_groups() {
        browse_part_group(visitor, score, group);
    }
    visitor.end_score(score);
}

/// Walk a part group and everything below it
pub fn browse_part_group<V: Visitor>(visitor: &mut V, score: &Score, id: PartGroupId) {
    visitor.start_part_group(score, id);
    for element in score.part_group(id).elements() {
        match *element {
            PartGroupElement::Part(part) => browse_part(visitor, score, part),
            PartGroupElement::PartGroup(nested) => browse_part_group(visitor, score, nested),
        }
    }
    visitor.end_part_group(score, id);
}

/// Walk a part: its staves in staff-number order
pub fn browse_part<V: Visitor>(visitor: &mut V, score: &Score, id: PartId) {
    visitor.start_part(score, id);
    for &staff in score.part(id).staves().values() {
        browse_staff(visitor, score, staff);
    }
    visitor.end_part(score, id);
}

/// Walk a staff: its voices in voice-number order
pub fn browse_staff<V: Visitor>(visitor: &mut V, score: &Score, id: StaffId) {
    visitor.start_staff(score, id);
    for &voice in score.staff(id).voices().values() {
        browse_voice(visitor, score, voice);
    }
    visitor.end_staff(score, id);
}

/// Walk a voice: initial elements, then segments/repeats/rests in
/// performance order, then lyric stanzas
pub fn browse_voice<V: Visitor>(visitor: &mut V, score: &Score, id: VoiceId) {
    visitor.start_voice(score, id);
    for element in score.voice(id).initial_elements() {
        match element {
            VoiceInitialElement::Clef(clef) => visitor.visit_clef(score, clef),
            VoiceInitialElement::Key(key) => visitor.visit_key(score, key),
            VoiceInitialElement::Time(time) => visitor.visit_time(score, time),
            VoiceInitialElement::Barline(barline) => visitor.visit_barline(score, barline),
        }
    }
    for element in score.voice(id).elements() {
        match *element {
            VoiceElement::Segment(segment) => browse_segment(visitor, score, segment),
            VoiceElement::Repeat(repeat) => browse_repeat(visitor, score, repeat),
            VoiceElement::MultipleRest(rest) => browse_multiple_rest(visitor, score, rest),
            VoiceElement::MeasuresRepeat(measures_repeat) => {
                browse_measures_repeat(visitor, score, measures_repeat)
            }
        }
    }
    for &stanza in score.voice(id).stanzas().values() {
        browse_stanza(visitor, score, stanza);
    }
    visitor.end_voice(score, id);
}

pub fn browse_segment<V: Visitor>(visitor: &mut V, score: &Score, id: SegmentId) {
    visitor.start_segment(score, id);
    for &measure in score.segment(id).measures() {
        browse_measure(visitor, score, measure);
    }
    visitor.end_segment(score, id);
}

pub fn browse_measure<V: Visitor>(visitor: &mut V, score: &Score, id: MeasureId) {
    visitor.start_measure(score, id);
    for element in score.measure(id).elements() {
        match element {
            MeasureElement::Note(note) => browse_note(visitor, score, *note),
            MeasureElement::Chord(chord) => browse_chord(visitor, score, *chord),
            MeasureElement::Tuplet(tuplet) => browse_tuplet(visitor, score, *tuplet),
            MeasureElement::Clef(clef) => visitor.visit_clef(score, clef),
            MeasureElement::Key(key) => visitor.visit_key(score, key),
            MeasureElement::Time(time) => visitor.visit_time(score, time),
            MeasureElement::Barline(barline) => visitor.visit_barline(score, barline),
            MeasureElement::Words(words) => visitor.visit_words(score, words),
            MeasureElement::Tempo(tempo) => visitor.visit_tempo(score, tempo),
            MeasureElement::Wedge(wedge) => visitor.visit_wedge(score, wedge),
            MeasureElement::OctaveShift(shift) => visitor.visit_octave_shift(score, shift),
            MeasureElement::Harmony(harmony) => visitor.visit_harmony(score, harmony),
            MeasureElement::FiguredBass(figured_bass) => {
                visitor.visit_figured_bass(score, figured_bass)
            }
        }
    }
    visitor.end_measure(score, id);
}

/// Walk a note with its grace groups on either side
pub fn browse_note<V: Visitor>(visitor: &mut V, score: &Score, id: NoteId) {
    if let Some(group) = score.note(id).grace_group_before() {
        browse_grace_notes_group(visitor, score, group);
    }
    visitor.visit_note(score, id);
    if let Some(group) = score.note(id).grace_group_after() {
        browse_grace_notes_group(visitor, score, group);
    }
}

pub fn browse_chord<V: Visitor>(visitor: &mut V, score: &Score, id: ChordId) {
    visitor.start_chord(score, id);
    for &note in score.chord(id).member_notes() {
        browse_note(visitor, score, note);
    }
    visitor.end_chord(score, id);
}

pub fn browse_tuplet<V: Visitor>(visitor: &mut V, score: &Score, id: TupletId) {
    visitor.start_tuplet(score, id);
    for element in score.tuplet(id).elements() {
        match *element {
            TupletElement::Note(note) => browse_note(visitor, score, note),
            TupletElement::Chord(chord) => browse_chord(visitor, score, chord),
            TupletElement::Tuplet(nested) => browse_tuplet(visitor, score, nested),
        }
    }
    visitor.end_tuplet(score, id);
}

pub fn browse_grace_notes_group<V: Visitor>(
    visitor: &mut V,
    score: &Score,
    id: GraceNotesGroupId,
) {
    visitor.start_grace_notes_group(score, id);
    for &note in score.grace_group(id).notes() {
        visitor.visit_note(score, note);
    }
    visitor.end_grace_notes_group(score, id);
}

/// Walk a repeat: common part first, then endings in order
pub fn browse_repeat<V: Visitor>(visitor: &mut V, score: &Score, id: RepeatId) {
    visitor.start_repeat(score, id);
    if let Some(common) = score.repeat(id).common_part() {
        visitor.start_repeat_common_part(score, id);
        browse_segment(visitor, score, common.segment);
        visitor.end_repeat_common_part(score, id);
    }
    for &ending in score.repeat(id).endings() {
        browse_repeat_ending(visitor, score, ending);
    }
    visitor.end_repeat(score, id);
}

pub fn browse_repeat_ending<V: Visitor>(visitor: &mut V, score: &Score, id: RepeatEndingId) {
    visitor.start_repeat_ending(score, id);
    browse_segment(visitor, score, score.repeat_ending(id).segment);
    visitor.end_repeat_ending(score, id);
}

pub fn browse_multiple_rest<V: Visitor>(visitor: &mut V, score: &Score, id: MultipleRestId) {
    visitor.start_multiple_rest(score, id);
    browse_segment(visitor, score, score.multiple_rest(id).segment);
    visitor.end_multiple_rest(score, id);
}

pub fn browse_measures_repeat<V: Visitor>(
    visitor: &mut V,
    score: &Score,
    id: MeasuresRepeatId,
) {
    visitor.start_measures_repeat(score, id);
    browse_segment(visitor, score, score.measures_repeat(id).pattern_segment);
    visitor.end_measures_repeat(score, id);
}

pub fn browse_stanza<V: Visitor>(visitor: &mut V, score: &Score, id: StanzaId) {
    visitor.start_stanza(score, id);
    for &syllable in score.stanza(id).syllables() {
        visitor.visit_syllable(score, syllable);
    }
    visitor.end_stanza(score, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::duration::WholeNotes;
    use crate::msr::measure::Measure;
    use crate::msr::note::{Note, NoteKind};
    use crate::msr::part::Part;
    use crate::msr::part_group::{PartGroup, PartGroupSymbolKind};
    use crate::msr::staff::{Staff, StaffKind};
    use crate::msr::voice::{Voice, VoiceKind};

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl Visitor for EventLog {
        fn start_part(&mut self, score: &Score, id: PartId) {
            self.events.push(format!("start part {}", score.part(id).id));
        }

        fn start_measure(&mut self, score: &Score, id: MeasureId) {
            self.events
                .push(format!("start measure {}", score.measure(id).number()));
        }

        fn visit_note(&mut self, _score: &Score, id: NoteId) {
            self.events.push(format!("note {}", id));
        }
    }

    /// Counts every note reached, overriding nothing else
    #[derive(Default)]
    struct NoteCounter {
        count: usize,
    }

    impl Visitor for NoteCounter {
        fn visit_note(&mut self, _score: &Score, _id: NoteId) {
            self.count += 1;
        }
    }

    fn one_voice_score() -> Score {
        let mut score = Score::new(1);
        let group =
            score.add_top_part_group(PartGroup::new(1, 1, None, PartGroupSymbolKind::None));
        let part = score.add_part(group, Part::new(1, "P1", "Flute", group));
        let staff = score.add_staff(part, Staff::new(1, 1, StaffKind::Regular, part).unwrap());
        let voice =
            score.add_voice(staff, Voice::new(1, 1, VoiceKind::Regular, staff).unwrap());
        let segment = score.open_segment(voice, 1);
        let measure = score.append_measure_to_segment(
            segment,
            Measure::new(1, "1", 0, None, true, segment),
        );
        for _ in 0..3 {
            let note = score.alloc_note(
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
        score
    }

    #[test]
    fn test_events_fire_in_document_order() {
        let score = one_voice_score();
        let mut log = EventLog::default();
        browse_score(&mut log, &score);
        assert_eq!(log.events[0], "start part P1");
        assert_eq!(log.events[1], "start measure 1");
        assert_eq!(log.events.len(), 5);
    }

    #[test]
    fn test_narrow_visitor_reaches_everything() {
        // Overriding only one callback must not change what is walked
        let score = one_voice_score();
        let mut counter = NoteCounter::default();
        browse_score(&mut counter, &score);
        assert_eq!(counter.count, 3);
    }
}
