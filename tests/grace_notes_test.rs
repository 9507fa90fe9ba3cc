// Scenario: grace-note grouping.
//
// Grace notes have no sounding time; they buffer in a pending group
// until the next principal note claims them as its "before" group. A
// group still pending when the measure closes trails the last principal
// note as an "after" group instead. With the sibling-skip setting on,
// other voices of the same staff receive a cloned group of skips.

use pretty_assertions::assert_eq;

use msr::builder::{EventKind, GraceSpec, InputEvent, NoteEvent, ScoreBuilder};
use msr::config::Settings;
use msr::diagnostics::{DiagnosticKind, Diagnostics};
use msr::errors::BuildError;
use msr::msr::{
    GraceNotesGroupKind, MeasureKind, NoteKind, Pitch, Score, Step, Time, VoiceId, WholeNotes,
};

fn ev(line: u32, kind: EventKind) -> InputEvent {
    InputEvent::new(line, kind)
}

fn prologue() -> Vec<InputEvent> {
    vec![
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
    ]
}

fn epilogue() -> Vec<InputEvent> {
    vec![
        ev(20, EventKind::MeasureEnd),
        ev(98, EventKind::PartEnd),
        ev(99, EventKind::ScoreEnd),
    ]
}

fn quarter(step: Step) -> InputEvent {
    ev(
        10,
        EventKind::Note(NoteEvent::pitched(Pitch::natural(step, 4).unwrap(), 4)),
    )
}

fn grace(step: Step, slash: bool) -> InputEvent {
    let mut note = NoteEvent::pitched(Pitch::natural(step, 4).unwrap(), 2);
    note.grace = Some(GraceSpec { slash });
    ev(11, EventKind::Note(note))
}

fn translate(settings: Settings, events: Vec<InputEvent>) -> (Score, Diagnostics) {
    ScoreBuilder::translate(settings, events).expect("translation succeeds")
}

fn only_voice(score: &Score) -> VoiceId {
    let part = score.all_parts()[0];
    let staff = *score.part(part).staves().values().next().unwrap();
    *score.staff(staff).voices().values().next().unwrap()
}

#[test]
fn test_grace_notes_attach_before_next_principal() {
    let mut events = prologue();
    events.push(quarter(Step::C));
    events.push(grace(Step::D, true));
    events.push(grace(Step::E, true));
    events.push(quarter(Step::F));
    events.push(quarter(Step::G));
    events.push(quarter(Step::A));
    events.extend(epilogue());

    let (score, diagnostics) = translate(Settings::default(), events);
    assert!(diagnostics.is_empty());
    // 4 principal notes plus 2 grace notes
    assert_eq!(score.note_count(), 6);

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    // Grace notes never advance the measure
    assert_eq!(score.measure(measure).kind(), MeasureKind::Full);
    assert_eq!(
        score.measure(measure).accumulated_length(),
        WholeNotes::new(1, 1)
    );

    let notes: Vec<_> = score
        .measure(measure)
        .elements()
        .iter()
        .filter_map(|e| match e {
            msr::msr::MeasureElement::Note(note) => Some(*note),
            _ => None,
        })
        .collect();
    assert_eq!(notes.len(), 4);
    assert!(score.note(notes[0]).grace_group_before().is_none());

    let group = score
        .note(notes[1])
        .grace_group_before()
        .expect("second principal carries the grace group");
    let entry = score.grace_group(group);
    assert_eq!(entry.kind, GraceNotesGroupKind::Before);
    assert!(entry.slash);
    assert_eq!(entry.notes().len(), 2);
    assert_eq!(entry.note_uplink(), Some(notes[1]));
    for &grace_note in entry.notes() {
        assert_eq!(score.note(grace_note).kind(), NoteKind::Grace);
        assert_eq!(score.note(grace_note).sounding_duration(), WholeNotes::zero());
        // Written as an eighth
        assert_eq!(score.note(grace_note).display_duration(), WholeNotes::new(1, 8));
        assert_eq!(score.note(grace_note).grace_group_uplink(), Some(group));
    }
}

#[test]
fn test_chord_flag_stacks_grace_notes_into_a_grace_chord() {
    let mut events = prologue();
    events.push(grace(Step::D, true));
    events.push({
        // Chord-flagged grace written as a quarter over the eighth D
        let mut note = NoteEvent::pitched(Pitch::natural(Step::F, 4).unwrap(), 4);
        note.grace = Some(GraceSpec { slash: true });
        note.chord = true;
        ev(12, EventKind::Note(note))
    });
    for step in [Step::C, Step::E, Step::G, Step::A] {
        events.push(quarter(step));
    }
    events.extend(epilogue());

    let (score, diagnostics) = translate(Settings::default(), events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    assert_eq!(score.measure(measure).kind(), MeasureKind::Full);

    let first = score
        .measure(measure)
        .elements()
        .iter()
        .find_map(|e| match e {
            msr::msr::MeasureElement::Note(note) => Some(*note),
            _ => None,
        })
        .expect("principal note present");
    let group = score
        .note(first)
        .grace_group_before()
        .expect("first principal carries the grace chord");
    let entry = score.grace_group(group);
    assert_eq!(entry.notes().len(), 2);
    for &member in entry.notes() {
        assert_eq!(score.note(member).kind(), NoteKind::GraceChordMember);
        assert_eq!(
            score.note(member).sounding_duration(),
            WholeNotes::zero()
        );
        assert_eq!(score.note(member).grace_group_uplink(), Some(group));
    }
    // Each member keeps the duration it was written with
    assert_eq!(
        score.note(entry.notes()[0]).display_duration(),
        WholeNotes::new(1, 8)
    );
    assert_eq!(
        score.note(entry.notes()[1]).display_duration(),
        WholeNotes::new(1, 4)
    );
}

#[test]
fn test_chord_flagged_grace_without_pending_group_is_fatal() {
    let mut events = prologue();
    events.push(quarter(Step::C));
    events.push({
        let mut note = NoteEvent::pitched(Pitch::natural(Step::E, 4).unwrap(), 2);
        note.grace = Some(GraceSpec { slash: false });
        note.chord = true;
        ev(12, EventKind::Note(note))
    });
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert_eq!(err, BuildError::ChordWithoutPreviousNote { line: 12 });
}

#[test]
fn test_trailing_grace_notes_become_after_group() {
    let mut events = prologue();
    for step in [Step::C, Step::D, Step::E, Step::F] {
        events.push(quarter(step));
    }
    events.push(grace(Step::G, false));
    events.extend(epilogue());

    let (score, diagnostics) = translate(Settings::default(), events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let last = score.voice(voice).last_appended_note().unwrap();
    let group = score
        .note(last)
        .grace_group_after()
        .expect("trailing graces attach after the last note");
    assert_eq!(score.grace_group(group).kind, GraceNotesGroupKind::After);
    assert_eq!(score.grace_group(group).notes().len(), 1);
    assert!(score.note(last).grace_group_before().is_none());
}

#[test]
fn test_grace_notes_with_no_principal_are_warned() {
    let mut events = prologue();
    events.push(grace(Step::G, false));
    events.extend(epilogue());

    let (score, diagnostics) = translate(Settings::default(), events);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::Other);
    // The orphaned grace note exists but hangs off no principal
    assert_eq!(score.note_count(), 1);
    assert_eq!(score.measure_count(), 0);
}

#[test]
fn test_sibling_voices_receive_skip_groups() {
    let mut events = prologue();
    events.push(quarter(Step::C));
    events.push(ev(12, EventKind::Backup { duration: 4 }));
    let low = |step: Step| {
        let mut note = NoteEvent::pitched(Pitch::natural(step, 3).unwrap(), 4);
        note.voice = 2;
        ev(13, EventKind::Note(note))
    };
    events.push(low(Step::C));
    events.push(grace(Step::D, true));
    events.push(quarter(Step::E));
    events.push(quarter(Step::F));
    events.push(quarter(Step::G));
    events.push(ev(14, EventKind::Backup { duration: 12 }));
    events.push(low(Step::E));
    events.push(low(Step::G));
    events.push(low(Step::B));
    events.extend(epilogue());

    let settings = Settings {
        add_skip_grace_notes_to_sibling_voices: true,
        ..Settings::default()
    };
    let (score, diagnostics) = translate(settings, events);
    assert!(diagnostics.is_empty());

    let part = score.all_parts()[0];
    let staff = *score.part(part).staves().values().next().unwrap();
    let voice1 = score.staff(staff).voice_by_number(1).unwrap();
    let voice2 = score.staff(staff).voice_by_number(2).unwrap();

    // The graced voice carries the real group on its second note
    let graced = score
        .measure(score.voice(voice1).flat_measures()[0])
        .elements()
        .iter()
        .filter_map(|e| match e {
            msr::msr::MeasureElement::Note(note) => Some(*note),
            _ => None,
        })
        .find(|&n| score.note(n).grace_group_before().is_some())
        .expect("graced principal in voice 1");
    let real = score.note(graced).grace_group_before().unwrap();
    assert_eq!(score.grace_group(real).notes().len(), 1);

    // The sibling voice got a parallel group of skips on the note it had
    // last appended when the graces were claimed
    let shadowed = score
        .measure(score.voice(voice2).flat_measures()[0])
        .elements()
        .iter()
        .filter_map(|e| match e {
            msr::msr::MeasureElement::Note(note) => Some(*note),
            _ => None,
        })
        .find(|&n| score.note(n).grace_group_before().is_some())
        .expect("shadow group in voice 2");
    let skips = score.note(shadowed).grace_group_before().unwrap();
    assert_ne!(skips, real);
    assert_eq!(score.grace_group(skips).notes().len(), 1);
    for &skip in score.grace_group(skips).notes() {
        assert_eq!(score.note(skip).kind(), NoteKind::Skip);
        assert_eq!(score.note(skip).display_duration(), WholeNotes::new(1, 8));
    }
}
