// Scenario: whole-score cloning and deep subtree copies.
//
// `Score` owns all entity arenas, so a plain clone yields a fully
// independent score whose ids remain valid against the clone. Deep
// copies duplicate a part (or staff, or voice) inside one score,
// re-homing every uplink into the copied subtree.

use pretty_assertions::assert_eq;

use msr::builder::{EventKind, GraceSpec, InputEvent, LyricEvent, NoteEvent, ScoreBuilder};
use msr::config::Settings;
use msr::msr::{Pitch, Score, Step, SyllableKind, Time, VoiceId};
use msr::visitor::{browse_part, browse_score, browse_voice, Visitor};

fn ev(line: u32, kind: EventKind) -> InputEvent {
    InputEvent::new(line, kind)
}

/// One part, two measures: a chord, a graced note, a lyric syllable
fn sample_score() -> Score {
    let mut events = vec![
        ev(
            1,
            EventKind::PartStart {
                id: "P1".to_string(),
                name: "Violin".to_string(),
                abbreviation: None,
            },
        ),
        ev(2, EventKind::Divisions { value: 4 }),
        ev(
            3,
            EventKind::MeasureStart {
                number: "1".to_string(),
            },
        ),
        ev(4, EventKind::Time(Time::numeric(4, 4).unwrap())),
    ];
    events.push({
        let mut note = NoteEvent::pitched(Pitch::natural(Step::C, 4).unwrap(), 4);
        note.lyrics = vec![LyricEvent {
            stanza_number: 1,
            kind: SyllableKind::Single,
            texts: vec!["la".to_string()],
            elision: false,
        }];
        ev(5, EventKind::Note(note))
    });
    events.push({
        let mut note = NoteEvent::pitched(Pitch::natural(Step::E, 4).unwrap(), 4);
        note.chord = true;
        ev(6, EventKind::Note(note))
    });
    events.push(ev(
        7,
        EventKind::Note(NoteEvent::pitched(Pitch::natural(Step::G, 4).unwrap(), 8)),
    ));
    events.push(ev(
        8,
        EventKind::Note(NoteEvent::pitched(Pitch::natural(Step::A, 4).unwrap(), 4)),
    ));
    events.push(ev(9, EventKind::MeasureEnd));
    events.push(ev(
        10,
        EventKind::MeasureStart {
            number: "2".to_string(),
        },
    ));
    events.push({
        let mut note = NoteEvent::pitched(Pitch::natural(Step::B, 4).unwrap(), 2);
        note.grace = Some(GraceSpec { slash: true });
        ev(11, EventKind::Note(note))
    });
    events.push(ev(
        12,
        EventKind::Note(NoteEvent::pitched(Pitch::natural(Step::C, 5).unwrap(), 16)),
    ));
    events.push(ev(13, EventKind::MeasureEnd));
    events.push(ev(98, EventKind::PartEnd));
    events.push(ev(99, EventKind::ScoreEnd));

    let (score, diagnostics) =
        ScoreBuilder::translate(Settings::default(), events).expect("translation succeeds");
    assert!(diagnostics.is_empty());
    score
}

fn only_voice(score: &Score) -> VoiceId {
    let part = score.all_parts()[0];
    let staff = *score.part(part).staves().values().next().unwrap();
    *score.staff(staff).voices().values().next().unwrap()
}

/// Collects every pitch reached, in walk order
#[derive(Default)]
struct PitchLog {
    pitches: Vec<Option<Pitch>>,
}

impl Visitor for PitchLog {
    fn visit_note(&mut self, score: &Score, id: msr::msr::NoteId) {
        self.pitches.push(score.note(id).pitch());
    }
}

/// Counts notes reached, nothing else
#[derive(Default)]
struct NoteCounter {
    count: usize,
}

impl Visitor for NoteCounter {
    fn visit_note(&mut self, _score: &Score, _id: msr::msr::NoteId) {
        self.count += 1;
    }
}

#[test]
fn test_clone_matches_the_original() {
    let original = sample_score();
    let clone = original.clone();

    assert_eq!(clone.part_count(), original.part_count());
    assert_eq!(clone.voice_count(), original.voice_count());
    assert_eq!(clone.measure_count(), original.measure_count());
    assert_eq!(clone.note_count(), original.note_count());

    let mut walked_original = PitchLog::default();
    browse_score(&mut walked_original, &original);
    let mut walked_clone = PitchLog::default();
    browse_score(&mut walked_clone, &clone);
    assert_eq!(walked_clone.pitches, walked_original.pitches);

    // Serialized forms agree entity for entity
    assert_eq!(
        serde_json::to_value(&clone).unwrap(),
        serde_json::to_value(&original).unwrap()
    );
}

#[test]
fn test_clone_is_independent_of_the_original() {
    let original = sample_score();
    let mut clone = original.clone();

    let part = clone.all_parts()[0];
    let group = clone.part(part).part_group_uplink();
    clone.deep_copy_part(part, group);

    assert_eq!(clone.part_count(), 2);
    assert_eq!(original.part_count(), 1);
    assert_eq!(clone.note_count(), original.note_count() * 2);
}

#[test]
fn test_deep_copy_part_duplicates_the_whole_subtree() {
    let mut score = sample_score();
    let notes_before = score.note_count();

    let source = score.all_parts()[0];
    let group = score.part(source).part_group_uplink();
    let copy = score.deep_copy_part(source, group);

    assert_ne!(copy, source);
    assert_eq!(score.part_count(), 2);
    // Every note was duplicated, grace and chord members included
    assert_eq!(score.note_count(), notes_before * 2);

    let mut walked_source = PitchLog::default();
    browse_part(&mut walked_source, &score, source);
    let mut walked_copy = PitchLog::default();
    browse_part(&mut walked_copy, &score, copy);
    assert_eq!(walked_copy.pitches, walked_source.pitches);

    // The copy owns distinct measures
    let source_staff = *score.part(source).staves().values().next().unwrap();
    let copy_staff = *score.part(copy).staves().values().next().unwrap();
    assert_ne!(copy_staff, source_staff);
    let source_voice = *score.staff(source_staff).voices().values().next().unwrap();
    let copy_voice = *score.staff(copy_staff).voices().values().next().unwrap();
    let source_first = score
        .segment(match score.voice(source_voice).elements()[0] {
            msr::msr::VoiceElement::Segment(segment) => segment,
            ref other => panic!("expected a segment, got {:?}", other),
        })
        .measures()[0];
    let copy_first = score
        .segment(match score.voice(copy_voice).elements()[0] {
            msr::msr::VoiceElement::Segment(segment) => segment,
            ref other => panic!("expected a segment, got {:?}", other),
        })
        .measures()[0];
    assert_ne!(copy_first, source_first);
    assert_eq!(
        score.measure(copy_first).number(),
        score.measure(source_first).number()
    );
    assert_eq!(score.measure(copy_first).segment_uplink(), {
        match score.voice(copy_voice).elements()[0] {
            msr::msr::VoiceElement::Segment(segment) => segment,
            ref other => panic!("expected a segment, got {:?}", other),
        }
    });
}

#[test]
fn test_deep_copy_voice_remaps_lyrics() {
    let mut score = sample_score();
    let source_voice = only_voice(&score);

    // Home for the copy: a cloned part shell with one cloned staff shell
    let source_part = score.all_parts()[0];
    let group = score.part(source_part).part_group_uplink();
    let new_part = score.newborn_clone_part(source_part, group);
    let source_staff = *score.part(source_part).staves().values().next().unwrap();
    let new_staff = score.newborn_clone_staff(source_staff, new_part);

    let copy = score.deep_copy_voice(source_voice, new_staff);
    assert_ne!(copy, source_voice);

    let mut walked_source = NoteCounter::default();
    browse_voice(&mut walked_source, &score, source_voice);
    let mut walked_copy = NoteCounter::default();
    browse_voice(&mut walked_copy, &score, copy);
    assert_eq!(walked_copy.count, walked_source.count);

    // The copied stanza belongs to the copied voice and its syllables
    // point at copied notes
    assert_eq!(score.voice(copy).stanzas().len(), 1);
    let stanza = *score.voice(copy).stanzas().get(&1).unwrap();
    assert_ne!(stanza, *score.voice(source_voice).stanzas().get(&1).unwrap());
    assert_eq!(score.stanza(stanza).voice_uplink(), copy);
    for &syllable in score.stanza(stanza).syllables() {
        let note = score.syllable(syllable).note_uplink().expect("sung");
        assert_eq!(score.note_voice(note), Some(copy));
    }
}
