// Scenario: tuplet construction with exact rational durations.
//
// At 9 divisions per quarter a whole note is 36 divisions, so an outer
// 3:2 triplet of eighths can nest another 3:2 triplet in its middle
// slot with every duration exact: the sounding durations of the three
// inner notes sum to exactly one outer slot, with no rounding anywhere.

use pretty_assertions::assert_eq;

use msr::builder::{EventKind, InputEvent, NoteEvent, ScoreBuilder};
use msr::config::Settings;
use msr::diagnostics::Diagnostics;
use msr::errors::BuildError;
use msr::msr::{
    MeasureElement, MeasureKind, NoteKind, Pitch, Rational, Score, Step, Time, TupletElement,
    VoiceId, WholeNotes,
};

fn ev(line: u32, kind: EventKind) -> InputEvent {
    InputEvent::new(line, kind)
}

fn prologue(divisions: i64) -> Vec<InputEvent> {
    vec![
        ev(
            1,
            EventKind::PartStart {
                id: "P1".to_string(),
                name: "Flute".to_string(),
                abbreviation: None,
            },
        ),
        ev(2, EventKind::Divisions { value: divisions }),
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

fn note(step: Step, duration: i64) -> InputEvent {
    ev(
        10,
        EventKind::Note(NoteEvent::pitched(Pitch::natural(step, 4).unwrap(), duration)),
    )
}

fn tuplet_start(actual: u32, normal: u32) -> InputEvent {
    ev(
        5,
        EventKind::TupletStart {
            staff: 1,
            voice: 1,
            number: 1,
            actual_notes: actual,
            normal_notes: normal,
        },
    )
}

fn tuplet_stop() -> InputEvent {
    ev(6, EventKind::TupletStop { staff: 1, voice: 1 })
}

fn translate(events: Vec<InputEvent>) -> (Score, Diagnostics) {
    ScoreBuilder::translate(Settings::default(), events).expect("translation succeeds")
}

fn only_voice(score: &Score) -> VoiceId {
    let part = score.all_parts()[0];
    let staff = *score.part(part).staves().values().next().unwrap();
    *score.staff(staff).voices().values().next().unwrap()
}

#[test]
fn test_triplet_of_eighths_sums_to_a_quarter_exactly() {
    // 6 divisions per quarter: a triplet eighth is 2 divisions
    let mut events = prologue(6);
    events.push(tuplet_start(3, 2));
    for step in [Step::C, Step::D, Step::E] {
        events.push(note(step, 2));
    }
    events.push(tuplet_stop());
    events.push(ev(11, EventKind::Note(NoteEvent::rest(18))));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    assert_eq!(score.measure(measure).kind(), MeasureKind::Full);

    let tuplet = score
        .measure(measure)
        .elements()
        .iter()
        .find_map(|e| match e {
            MeasureElement::Tuplet(tuplet) => Some(*tuplet),
            _ => None,
        })
        .expect("tuplet present");
    assert_eq!(score.tuplet(tuplet).elements().len(), 3);
    assert_eq!(
        score.tuplet(tuplet).sounding_duration(),
        WholeNotes::new(1, 4)
    );
    assert_eq!(score.tuplet(tuplet).display_factor(), Rational::new(3, 2));

    for element in score.tuplet(tuplet).elements() {
        let note = match *element {
            TupletElement::Note(note) => note,
            ref other => panic!("expected a note, got {:?}", other),
        };
        assert_eq!(score.note(note).kind(), NoteKind::TupletMember);
        assert_eq!(score.note(note).sounding_duration(), WholeNotes::new(1, 12));
        assert_eq!(score.note(note).display_duration(), WholeNotes::new(1, 8));
        assert_eq!(score.note(note).tuplet_uplink(), Some(tuplet));
    }
}

#[test]
fn test_nested_triplet_composes_display_factors() {
    // 9 divisions per quarter: outer triplet eighths are 3 divisions,
    // inner triplet notes 1 division
    let mut events = prologue(9);
    events.push(tuplet_start(3, 2));
    events.push(note(Step::C, 3));
    events.push(tuplet_start(3, 2));
    for step in [Step::D, Step::E, Step::F] {
        events.push(note(step, 1));
    }
    events.push(tuplet_stop());
    events.push(note(Step::G, 3));
    events.push(tuplet_stop());
    events.push(ev(11, EventKind::Note(NoteEvent::rest(27))));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    let outer = score
        .measure(measure)
        .elements()
        .iter()
        .find_map(|e| match e {
            MeasureElement::Tuplet(tuplet) => Some(*tuplet),
            _ => None,
        })
        .expect("outer tuplet present");

    assert_eq!(score.tuplet(outer).elements().len(), 3);
    let inner = match score.tuplet(outer).elements()[1] {
        TupletElement::Tuplet(inner) => inner,
        ref other => panic!("expected a nested tuplet, got {:?}", other),
    };
    assert_eq!(score.tuplet(inner).tuplet_uplink(), Some(outer));
    assert_eq!(score.tuplet(inner).display_factor(), Rational::new(9, 4));

    // Outer members: sounding 1/12, notated as eighths
    let first = match score.tuplet(outer).elements()[0] {
        TupletElement::Note(note) => note,
        ref other => panic!("expected a note, got {:?}", other),
    };
    assert_eq!(score.note(first).sounding_duration(), WholeNotes::new(1, 12));
    assert_eq!(score.note(first).display_duration(), WholeNotes::new(1, 8));

    // Inner members: sounding 1/36, notated as sixteenths through the
    // combined 9/4 factor
    for element in score.tuplet(inner).elements() {
        let note = match *element {
            TupletElement::Note(note) => note,
            ref other => panic!("expected a note, got {:?}", other),
        };
        assert_eq!(score.note(note).sounding_duration(), WholeNotes::new(1, 36));
        assert_eq!(score.note(note).display_duration(), WholeNotes::new(1, 16));
    }

    // The inner triplet occupies exactly one outer slot
    assert_eq!(
        score.tuplet(inner).sounding_duration(),
        WholeNotes::new(1, 12)
    );
    assert_eq!(
        score.tuplet(outer).sounding_duration(),
        WholeNotes::new(1, 4)
    );
    assert_eq!(
        score.measure(measure).accumulated_length(),
        WholeNotes::new(1, 1)
    );
    assert_eq!(score.measure(measure).kind(), MeasureKind::Full);
}

#[test]
fn test_rest_inside_tuplet_keeps_rest_kind() {
    let mut events = prologue(6);
    events.push(tuplet_start(3, 2));
    events.push(note(Step::C, 2));
    events.push(ev(10, EventKind::Note(NoteEvent::rest(2))));
    events.push(note(Step::E, 2));
    events.push(tuplet_stop());
    events.push(ev(11, EventKind::Note(NoteEvent::rest(18))));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    let tuplet = score
        .measure(measure)
        .elements()
        .iter()
        .find_map(|e| match e {
            MeasureElement::Tuplet(tuplet) => Some(*tuplet),
            _ => None,
        })
        .unwrap();
    let middle = match score.tuplet(tuplet).elements()[1] {
        TupletElement::Note(note) => note,
        ref other => panic!("expected a note, got {:?}", other),
    };
    assert_eq!(score.note(middle).kind(), NoteKind::Rest);
    assert_eq!(score.note(middle).sounding_duration(), WholeNotes::new(1, 12));
}

#[test]
fn test_unmatched_tuplet_stop_is_fatal() {
    let mut events = prologue(6);
    events.push(note(Step::C, 6));
    events.push(tuplet_stop());
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert_eq!(err, BuildError::UnmatchedTupletStop { line: 6 });
}

#[test]
fn test_tuplet_left_open_at_part_end_is_fatal() {
    let mut events = prologue(6);
    events.push(tuplet_start(3, 2));
    events.push(note(Step::C, 2));
    events.push(ev(20, EventKind::MeasureEnd));
    events.push(ev(98, EventKind::PartEnd));
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert_eq!(err, BuildError::UnclosedTuplet { line: 98 });
}
