// Scenario: core builder behavior over plain event streams.
//
// One part, divisions 4 (a quarter note is 4 divisions), 4/4 time. The
// tests cover measure opening and classification, ordinal assignment,
// attribute spreading into already-open and later-opening measures,
// multiple voices aligned through backup, directions, score metadata,
// part filtering and the fatal error cases.

use pretty_assertions::assert_eq;

use msr::builder::{EventKind, InputEvent, NoteEvent, ScoreBuilder};
use msr::config::Settings;
use msr::diagnostics::{DiagnosticKind, Diagnostics};
use msr::errors::BuildError;
use msr::msr::{
    Clef, ClefKind, Identification, Key, MeasureElement, MeasureKind, Mode, Pitch, Placement,
    Score, Step, Time, VoiceId, WholeNotes, Words,
};

fn ev(line: u32, kind: EventKind) -> InputEvent {
    InputEvent::new(line, kind)
}

fn part_start(id: &str, name: &str) -> InputEvent {
    ev(
        1,
        EventKind::PartStart {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: None,
        },
    )
}

fn prologue() -> Vec<InputEvent> {
    vec![part_start("P1", "Flute"), ev(2, EventKind::Divisions { value: 4 })]
}

fn measure_start(number: &str) -> InputEvent {
    ev(
        10,
        EventKind::MeasureStart {
            number: number.to_string(),
        },
    )
}

fn four_four() -> InputEvent {
    ev(11, EventKind::Time(Time::numeric(4, 4).unwrap()))
}

fn quarter(step: Step) -> InputEvent {
    ev(
        12,
        EventKind::Note(NoteEvent::pitched(Pitch::natural(step, 4).unwrap(), 4)),
    )
}

fn epilogue() -> Vec<InputEvent> {
    vec![ev(98, EventKind::PartEnd), ev(99, EventKind::ScoreEnd)]
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
fn test_single_full_measure() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    for step in [Step::C, Step::D, Step::E, Step::F] {
        events.push(quarter(step));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());
    assert_eq!(score.part_count(), 1);
    assert_eq!(score.voice_count(), 1);
    assert_eq!(score.measure_count(), 1);
    assert_eq!(score.note_count(), 4);

    let voice = only_voice(&score);
    let flat = score.voice(voice).flat_measures();
    assert_eq!(flat.len(), 1);
    let measure = score.measure(flat[0]);
    assert_eq!(measure.number(), "1");
    assert_eq!(measure.ordinal(), 0);
    assert_eq!(measure.kind(), MeasureKind::Full);
    assert_eq!(measure.accumulated_length(), WholeNotes::new(1, 1));
    // The time signature declared inside the measure lands in its element
    // list ahead of the notes
    assert!(matches!(measure.elements()[0], MeasureElement::Time(_)));
    assert_eq!(measure.elements().len(), 5);
}

#[test]
fn test_ordinals_follow_creation_order_labels_stay_verbatim() {
    let mut events = prologue();
    for (number, fill) in [("1", 4), ("2", 4), ("2a", 4)] {
        events.push(measure_start(number));
        if number == "1" {
            events.push(four_four());
        }
        for _ in 0..fill {
            events.push(quarter(Step::G));
        }
        events.push(ev(20, EventKind::MeasureEnd));
    }
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let flat = score.voice(voice).flat_measures().to_vec();
    let numbers: Vec<&str> = flat.iter().map(|&m| score.measure(m).number()).collect();
    assert_eq!(numbers, vec!["1", "2", "2a"]);
    let ordinals: Vec<usize> = flat.iter().map(|&m| score.measure(m).ordinal()).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);
    assert_eq!(score.measure(flat[0]).next_measure_ordinal(), Some(1));
    assert_eq!(score.measure(flat[1]).next_measure_ordinal(), Some(2));
    assert_eq!(score.measure(flat[2]).next_measure_ordinal(), None);
}

#[test]
fn test_upbeat_is_not_a_warning_underfull_is() {
    let mut events = prologue();
    // A short first measure is an anacrusis
    events.push(measure_start("0"));
    events.push(four_four());
    events.push(quarter(Step::G));
    events.push(ev(20, EventKind::MeasureEnd));
    // A short later measure is a defect
    events.push(measure_start("1"));
    for _ in 0..3 {
        events.push(quarter(Step::A));
    }
    events.push(ev(30, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    let voice = only_voice(&score);
    let flat = score.voice(voice).flat_measures().to_vec();
    assert_eq!(score.measure(flat[0]).kind(), MeasureKind::Upbeat);
    assert_eq!(score.measure(flat[1]).kind(), MeasureKind::Underfull);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::UnderfullMeasure);
    assert_eq!(diagnostics.items()[0].message, "measure 1 is underfull");
}

#[test]
fn test_overfull_measure_is_a_warning() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    for _ in 0..5 {
        events.push(quarter(Step::B));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    assert_eq!(score.measure(measure).kind(), MeasureKind::Overfull);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::OverfullMeasure);
}

#[test]
fn test_two_voices_share_a_measure_through_backup() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    for step in [Step::C, Step::D, Step::E, Step::F] {
        events.push(quarter(step));
    }
    events.push(ev(15, EventKind::Backup { duration: 16 }));
    for step in [Step::C, Step::C, Step::C, Step::C] {
        let mut note = NoteEvent::pitched(Pitch::natural(step, 3).unwrap(), 4);
        note.voice = 2;
        events.push(ev(16, EventKind::Note(note)));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());
    assert_eq!(score.voice_count(), 2);
    assert_eq!(score.measure_count(), 2);

    let part = score.all_parts()[0];
    let staff = *score.part(part).staves().values().next().unwrap();
    for &voice in score.staff(staff).voices().values() {
        let measure = score.voice(voice).flat_measures()[0];
        assert_eq!(score.measure(measure).kind(), MeasureKind::Full);
        // The time signature was replayed into the voice that opened its
        // measure after the attribute arrived
        assert!(matches!(
            score.measure(measure).elements()[0],
            MeasureElement::Time(_)
        ));
    }
    assert_eq!(
        score.part(part).measure_length_high_tide(),
        WholeNotes::new(1, 1)
    );
}

#[test]
fn test_attributes_spread_into_open_and_later_measures() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    // Voice 1 opens its measure, then the key arrives
    events.push(quarter(Step::C));
    events.push(ev(
        13,
        EventKind::Key(Key::new(2, Mode::Major).unwrap()),
    ));
    for _ in 0..3 {
        events.push(quarter(Step::D));
    }
    events.push(ev(15, EventKind::Backup { duration: 16 }));
    // Voice 2 opens its measure only now; the pending key is replayed
    let mut low = NoteEvent::pitched(Pitch::natural(Step::C, 3).unwrap(), 16);
    low.voice = 2;
    events.push(ev(16, EventKind::Note(low)));
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());

    let part = score.all_parts()[0];
    let staff = *score.part(part).staves().values().next().unwrap();
    for &voice in score.staff(staff).voices().values() {
        let measure = score.voice(voice).flat_measures()[0];
        let keys = score
            .measure(measure)
            .elements()
            .iter()
            .filter(|e| matches!(e, MeasureElement::Key(_)))
            .count();
        assert_eq!(keys, 1);
    }
    assert_eq!(score.part(part).current_key(), Some(Key::new(2, Mode::Major).unwrap()));
}

#[test]
fn test_redundant_attribute_is_warned_and_dropped() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    events.push(quarter(Step::C));
    events.push(ev(14, EventKind::Time(Time::numeric(4, 4).unwrap())));
    for _ in 0..3 {
        events.push(quarter(Step::D));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::RedundantAttribute);
    assert_eq!(diagnostics.items()[0].line, 14);

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    let times = score
        .measure(measure)
        .elements()
        .iter()
        .filter(|e| matches!(e, MeasureElement::Time(_)))
        .count();
    assert_eq!(times, 1);
}

#[test]
fn test_clef_updates_part_and_staff_currents() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    events.push(quarter(Step::C));
    let clef = Clef::new(ClefKind::Bass, 1).unwrap();
    events.push(ev(14, EventKind::Clef(clef)));
    for _ in 0..3 {
        events.push(quarter(Step::D));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());
    let part = score.all_parts()[0];
    assert_eq!(score.part(part).current_clef(), Some(clef));
    let staff = *score.part(part).staves().values().next().unwrap();
    assert_eq!(score.staff(staff).current_clef(), Some(clef));
}

#[test]
fn test_directions_and_dynamics() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    events.push(ev(
        12,
        EventKind::Words {
            staff: 1,
            voice: 1,
            words: Words {
                text: "dolce".to_string(),
                placement: Placement::Above,
            },
        },
    ));
    events.push(quarter(Step::C));
    events.push(ev(
        14,
        EventKind::Dynamics {
            staff: 1,
            voice: 1,
            dynamics: msr::msr::Dynamics {
                kind: msr::msr::DynamicsKind::MF,
                placement: Placement::Below,
            },
        },
    ));
    for _ in 0..3 {
        events.push(quarter(Step::D));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());

    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    assert!(score
        .measure(measure)
        .elements()
        .iter()
        .any(|e| matches!(e, MeasureElement::Words(_))));

    // Dynamics attach to the most recent note, not to the measure
    let first_note = score
        .measure(measure)
        .elements()
        .iter()
        .find_map(|e| match e {
            MeasureElement::Note(note) => Some(*note),
            _ => None,
        })
        .unwrap();
    assert_eq!(score.note(first_note).dynamics().len(), 1);
}

#[test]
fn test_identification_and_credits() {
    let mut events = vec![ev(
        1,
        EventKind::Identification(Identification {
            work_title: Some("Suite in D".to_string()),
            composer: Some("Anon.".to_string()),
            ..Identification::default()
        }),
    )];
    events.push(ev(
        2,
        EventKind::Credit {
            text: "Suite in D".to_string(),
            page: 1,
        },
    ));
    events.extend(prologue());
    events.push(measure_start("1"));
    events.push(four_four());
    for _ in 0..4 {
        events.push(quarter(Step::D));
    }
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());
    assert_eq!(score.identification.work_title.as_deref(), Some("Suite in D"));
    assert_eq!(score.identification.composer.as_deref(), Some("Anon."));
    assert_eq!(score.credits.len(), 1);
    assert_eq!(score.credits[0].page, 1);
}

#[test]
fn test_part_filtering_and_renaming() {
    let one_part = |id: &str, name: &str| {
        let mut events = vec![part_start(id, name), ev(2, EventKind::Divisions { value: 4 })];
        events.push(measure_start("1"));
        events.push(four_four());
        for _ in 0..4 {
            events.push(quarter(Step::E));
        }
        events.push(ev(20, EventKind::MeasureEnd));
        events.push(ev(98, EventKind::PartEnd));
        events
    };
    let mut events = one_part("P1", "Part 1");
    events.extend(one_part("P2", "Part 2"));
    events.push(ev(99, EventKind::ScoreEnd));

    let mut rename_parts = std::collections::BTreeMap::new();
    rename_parts.insert("P1".to_string(), "Violin I".to_string());
    let settings = Settings {
        omit_part_ids: vec!["P2".to_string()],
        rename_parts,
        ..Settings::default()
    };
    let (score, diagnostics) = ScoreBuilder::translate(settings, events).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(score.part_count(), 1);
    assert_eq!(score.note_count(), 4);
    let part = score.all_parts()[0];
    assert_eq!(score.part(part).id, "P1");
    assert_eq!(score.part(part).name, "Violin I");
}

#[test]
fn test_non_positive_divisions_is_fatal() {
    let mut events = vec![part_start("P1", "Flute")];
    events.push(ev(2, EventKind::Divisions { value: 0 }));
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert_eq!(err, BuildError::NonPositiveDivisions { line: 2, value: 0 });
}

#[test]
fn test_event_outside_any_part_is_fatal() {
    let events = vec![ev(1, EventKind::Divisions { value: 4 })];
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert_eq!(err, BuildError::NoCurrentPart { line: 1 });
}

#[test]
fn test_note_outside_any_measure_is_fatal() {
    let mut events = prologue();
    events.push(quarter(Step::C));
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert!(matches!(err, BuildError::OutsideMeasure { .. }));
}

#[test]
fn test_backup_before_measure_start_is_fatal() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    events.push(quarter(Step::C));
    events.push(ev(14, EventKind::Backup { duration: 8 }));
    let err = ScoreBuilder::translate(Settings::default(), events).unwrap_err();
    assert!(matches!(err, BuildError::BackupBeforeMeasureStart { line: 14, .. }));
}

#[test]
fn test_forward_appends_invisible_padding() {
    let mut events = prologue();
    events.push(measure_start("1"));
    events.push(four_four());
    events.push(quarter(Step::C));
    events.push(ev(
        13,
        EventKind::Forward {
            staff: 1,
            voice: 1,
            duration: 8,
        },
    ));
    events.push(quarter(Step::D));
    events.push(ev(20, EventKind::MeasureEnd));
    events.extend(epilogue());

    let (score, diagnostics) = translate(events);
    assert!(diagnostics.is_empty());
    let voice = only_voice(&score);
    let measure = score.voice(voice).flat_measures()[0];
    assert_eq!(score.measure(measure).kind(), MeasureKind::Full);

    let kinds: Vec<_> = score
        .measure(measure)
        .elements()
        .iter()
        .filter_map(|e| match e {
            MeasureElement::Note(note) => Some(score.note(*note).kind()),
            _ => None,
        })
        .collect();
    use msr::msr::NoteKind;
    assert_eq!(
        kinds,
        vec![NoteKind::Standalone, NoteKind::Skip, NoteKind::Standalone]
    );
    // The note after the forward sits at the skipped position
    let last = score
        .measure(measure)
        .elements()
        .iter()
        .rev()
        .find_map(|e| match e {
            MeasureElement::Note(note) => Some(*note),
            _ => None,
        })
        .unwrap();
    assert_eq!(score.note(last).position_in_measure(), WholeNotes::new(3, 4));
}
