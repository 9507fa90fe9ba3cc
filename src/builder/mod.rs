//! The incremental streaming builder
//!
//! Consumes a strictly ordered sequence of `InputEvent`s and assembles a
//! `Score`, maintaining per-voice state machines for the constructs whose
//! meaning only becomes clear with look-ahead: chord recognition, tuplet
//! nesting, repeat and ending wrapping, multiple-rest collection and
//! grace-note grouping. Malformed nesting is fatal; consistency problems
//! that do not corrupt the structure become diagnostics.
//!
//! Measures open lazily per voice: a `MeasureStart` event marks the input
//! measure, and each voice materializes its own measure the first time an
//! event addresses it within that input measure.

mod events;
mod finalize;
mod notes;
mod repeats;

pub use events::{
    BarlineEvent, EndingMark, EventKind, GraceSpec, InputEvent, LyricEvent, NoteEvent,
    RepeatMark,
};

use std::collections::HashMap;

use crate::config::Settings;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::errors::{BuildError, BuildResult};
use crate::msr::attributes::{Clef, Key, Time, Transpose};
use crate::msr::duration::WholeNotes;
use crate::msr::ids::{
    GraceNotesGroupId, MeasureId, MeasuresRepeatId, PartGroupId, PartId, RepeatId, TupletId,
    VoiceId,
};
use crate::msr::measure::{Measure, MeasureElement};
use crate::msr::note::Note;
use crate::msr::part::Part;
use crate::msr::part_group::{PartGroup, PartGroupSymbolKind};
use crate::msr::score::Score;
use crate::msr::staff::{Staff, StaffKind};
use crate::msr::voice::{Voice, VoiceInitialElement, VoiceKind};

/// A forward repeat barline waiting for its backward counterpart
#[derive(Debug, Clone, Copy)]
struct PendingRepeatStart {
    line: u32,
    /// Voice element count when the repeat opened; the repeated material
    /// is everything appended after this point
    elements_len: usize,
}

/// An ending bracket currently collecting measures
#[derive(Debug, Clone)]
struct OpenEnding {
    line: u32,
    number: String,
    elements_len: usize,
}

/// A declared multiple rest still consuming measures
#[derive(Debug, Clone, Copy)]
struct PendingMultipleRest {
    line: u32,
    expected: u32,
    seen: u32,
}

/// Per-voice construction state
#[derive(Debug, Default)]
struct VoiceState {
    /// Ordinal to assign to the next measure of this voice
    next_ordinal: usize,
    last_measure: Option<MeasureId>,
    /// Input measure index the current measure was opened for
    opened_for: Option<usize>,
    /// Innermost open tuplet last
    tuplet_stack: Vec<TupletId>,
    /// Grace notes buffered until a principal note or the measure end
    /// claims them
    pending_grace: Option<GraceNotesGroupId>,
    pending_repeat_start: Option<PendingRepeatStart>,
    /// Repeat whose endings are still being collected
    building_repeat: Option<RepeatId>,
    open_ending: Option<OpenEnding>,
    pending_multiple_rest: Option<PendingMultipleRest>,
    /// While set, measure content is replica shorthand and is discarded
    active_measures_repeat: Option<MeasuresRepeatId>,
    /// The next measure must open a fresh segment (repeat or rest
    /// boundary was crossed)
    force_new_segment: bool,
}

/// Builds one score from an event stream
pub struct ScoreBuilder {
    settings: Settings,
    score: Score,
    diagnostics: Diagnostics,

    /// Open part groups, innermost last, keyed by their input number
    open_part_groups: Vec<(i32, PartGroupId)>,
    /// Lazily created top-level group for parts declared outside any
    implicit_group: Option<PartGroupId>,
    current_part: Option<PartId>,
    /// The current part is filtered out; its events are discarded
    skipping_part: bool,

    in_measure: bool,
    /// 1-based index of the current input measure, 0 before the first
    input_measure_index: usize,
    measure_number: String,
    /// Position cursor within the current input measure, moved by notes,
    /// backup and forward; aligns voices encoded in one interleaved stream
    cursor: WholeNotes,
    /// Attribute elements of the current input measure, replayed into
    /// measures that open later in the same input measure. The first
    /// component restricts the element to one staff number.
    pending_attributes: Vec<(Option<u32>, MeasureElement)>,

    /// (part, staff number, voice number) -> voice
    voice_ids: HashMap<(PartId, u32, u32), VoiceId>,
    voice_states: HashMap<VoiceId, VoiceState>,

    finished: bool,
}

impl ScoreBuilder {
    pub fn new(settings: Settings) -> BuildResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            score: Score::new(1),
            diagnostics: Diagnostics::new(),
            open_part_groups: Vec::new(),
            implicit_group: None,
            current_part: None,
            skipping_part: false,
            in_measure: false,
            input_measure_index: 0,
            measure_number: String::new(),
            cursor: WholeNotes::zero(),
            pending_attributes: Vec::new(),
            voice_ids: HashMap::new(),
            voice_states: HashMap::new(),
            finished: false,
        })
    }

    /// Run a whole event stream through a fresh builder
    pub fn translate(
        settings: Settings,
        events: impl IntoIterator<Item = InputEvent>,
    ) -> BuildResult<(Score, Diagnostics)> {
        let mut builder = ScoreBuilder::new(settings)?;
        for event in events {
            builder.handle(event)?;
        }
        builder.finish()
    }

    /// Consume one event. Errors abort the translation of this score.
    pub fn handle(&mut self, event: InputEvent) -> BuildResult<()> {
        let InputEvent { line, kind } = event;
        log::debug!("line {}: {:?}", line, kind_name(&kind));
        match kind {
            EventKind::Identification(identification) => {
                self.score.identification = identification;
                Ok(())
            }
            EventKind::PageGeometry(geometry) => {
                self.score.page_geometry = geometry;
                Ok(())
            }
            EventKind::Credit { text, page } => {
                self.score
                    .credits
                    .push(crate::msr::score::Credit { text, page });
                Ok(())
            }
            EventKind::PartGroupStart {
                number,
                name,
                symbol,
            } => self.handle_part_group_start(line, number, name, symbol),
            EventKind::PartGroupStop { number } => self.handle_part_group_stop(line, number),
            EventKind::PartStart {
                id,
                name,
                abbreviation,
            } => self.handle_part_start(line, id, name, abbreviation),
            EventKind::PartEnd => self.handle_part_end(line),
            EventKind::Divisions { value } => self.handle_divisions(line, value),
            EventKind::Clef(clef) => self.handle_clef(line, clef),
            EventKind::Key(key) => self.handle_key(line, key),
            EventKind::Time(time) => self.handle_time(line, time),
            EventKind::Transpose(transpose) => self.handle_transpose(line, transpose),
            EventKind::MeasureStart { number } => self.handle_measure_start(line, number),
            EventKind::MeasureEnd => self.handle_measure_end(line),
            EventKind::Note(note) => self.handle_note(line, note),
            EventKind::TupletStart {
                staff,
                voice,
                number,
                actual_notes,
                normal_notes,
            } => self.handle_tuplet_start(line, staff, voice, number, actual_notes, normal_notes),
            EventKind::TupletStop { staff, voice } => self.handle_tuplet_stop(line, staff, voice),
            EventKind::Backup { duration } => self.handle_backup(line, duration),
            EventKind::Forward {
                staff,
                voice,
                duration,
            } => self.handle_forward(line, staff, voice, duration),
            EventKind::Barline(barline) => self.handle_barline(line, barline),
            EventKind::MultipleRestStart {
                staff,
                voice,
                measure_count,
            } => self.handle_multiple_rest_start(line, staff, voice, measure_count),
            EventKind::MeasuresRepeatStart {
                staff,
                voice,
                measures_per_pattern,
            } => self.handle_measures_repeat_start(line, staff, voice, measures_per_pattern),
            EventKind::MeasuresRepeatStop { staff, voice } => {
                self.handle_measures_repeat_stop(line, staff, voice)
            }
            EventKind::Words {
                staff,
                voice,
                words,
            } => self.append_direction(line, staff, voice, MeasureElement::Words(words)),
            EventKind::Dynamics {
                staff,
                voice,
                dynamics,
            } => self.handle_dynamics(line, staff, voice, dynamics),
            EventKind::Wedge {
                staff,
                voice,
                wedge,
            } => self.append_direction(line, staff, voice, MeasureElement::Wedge(wedge)),
            EventKind::OctaveShift {
                staff,
                voice,
                shift,
            } => self.append_direction(line, staff, voice, MeasureElement::OctaveShift(shift)),
            EventKind::Tempo {
                staff,
                voice,
                tempo,
            } => self.append_direction(line, staff, voice, MeasureElement::Tempo(tempo)),
            EventKind::Harmony {
                staff,
                voice,
                harmony,
            } => self.append_direction(line, staff, voice, MeasureElement::Harmony(harmony)),
            EventKind::FiguredBass {
                staff,
                voice,
                figured_bass,
            } => {
                self.append_direction(line, staff, voice, MeasureElement::FiguredBass(figured_bass))
            }
            EventKind::ScoreEnd => {
                self.finalize_score(line)?;
                self.finished = true;
                Ok(())
            }
        }
    }

    /// Finish the translation, running finalization if the stream ended
    /// without an explicit `ScoreEnd`
    pub fn finish(mut self) -> BuildResult<(Score, Diagnostics)> {
        if !self.finished {
            self.finalize_score(0)?;
        }
        Ok((self.score, self.diagnostics))
    }

    // ------------------------------------------------------------------
    // Part structure
    // ------------------------------------------------------------------

    fn handle_part_group_start(
        &mut self,
        line: u32,
        number: i32,
        name: Option<String>,
        symbol: PartGroupSymbolKind,
    ) -> BuildResult<()> {
        let group = PartGroup::new(line, number, name, symbol);
        let id = match self.open_part_groups.last() {
            Some(&(_, parent)) => self.score.add_nested_part_group(parent, group),
            None => self.score.add_top_part_group(group),
        };
        self.open_part_groups.push((number, id));
        Ok(())
    }

    fn handle_part_group_stop(&mut self, line: u32, number: i32) -> BuildResult<()> {
        match self
            .open_part_groups
            .iter()
            .rposition(|&(n, _)| n == number)
        {
            Some(index) => {
                self.open_part_groups.remove(index);
                Ok(())
            }
            None => Err(BuildError::UnmatchedPartGroupStop { line, number }),
        }
    }

    fn handle_part_start(
        &mut self,
        line: u32,
        id: String,
        name: String,
        abbreviation: Option<String>,
    ) -> BuildResult<()> {
        if !self.settings.keeps_part(&id) {
            log::debug!("part {} filtered out", id);
            self.current_part = None;
            self.skipping_part = true;
            return Ok(());
        }
        self.skipping_part = false;
        let name = self.settings.part_name(&id, &name).to_string();
        let group = match self.open_part_groups.last() {
            Some(&(_, group)) => group,
            None => self.ungrouped_parts_group(line),
        };
        let mut part = Part::new(line, id, name, group);
        part.abbreviation = abbreviation;
        self.current_part = Some(self.score.add_part(group, part));
        Ok(())
    }

    /// Parts declared outside any group share one synthetic top-level
    /// group with no bracket
    fn ungrouped_parts_group(&mut self, line: u32) -> PartGroupId {
        match self.implicit_group {
            Some(group) => group,
            None => {
                let group = self.score.add_top_part_group(PartGroup::new(
                    line,
                    0,
                    None,
                    PartGroupSymbolKind::None,
                ));
                self.implicit_group = Some(group);
                group
            }
        }
    }

    fn handle_part_end(&mut self, line: u32) -> BuildResult<()> {
        if let Some(part) = self.current_part {
            let voices: Vec<VoiceId> = self
                .voice_ids
                .iter()
                .filter(|((p, _, _), _)| *p == part)
                .map(|(_, &v)| v)
                .collect();
            for voice in voices {
                self.check_voice_closed(line, voice)?;
            }
        }
        self.current_part = None;
        self.skipping_part = false;
        Ok(())
    }

    /// Structural state that must not outlive its voice
    fn check_voice_closed(&mut self, line: u32, voice: VoiceId) -> BuildResult<()> {
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        if !state.tuplet_stack.is_empty() {
            return Err(BuildError::UnclosedTuplet { line });
        }
        if state.open_ending.is_some() {
            return Err(BuildError::UnclosedRepeatEnding { line });
        }
        if let Some(pending) = state.pending_multiple_rest {
            return Err(BuildError::UnfinishedMultipleRest {
                line: pending.line,
                expected: pending.expected,
                seen: pending.seen,
            });
        }
        if let Some(start) = state.pending_repeat_start.take() {
            self.diagnostics.warn(
                start.line,
                DiagnosticKind::UnmatchedRepeatStart,
                "forward repeat barline never closed",
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn handle_divisions(&mut self, line: u32, value: i64) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        if value <= 0 {
            return Err(BuildError::NonPositiveDivisions { line, value });
        }
        let part = self.require_part(line)?;
        self.score.part_mut(part).set_current_divisions(value);
        Ok(())
    }

    fn handle_clef(&mut self, line: u32, clef: Clef) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let part = self.require_part(line)?;
        if self.score.part(part).current_clef() == Some(clef) {
            self.diagnostics.warn(
                line,
                DiagnosticKind::RedundantAttribute,
                "clef re-declared identically",
            );
            return Ok(());
        }
        self.score.part_mut(part).set_current_clef(clef);
        if let Some(staff) = self.score.part(part).staff_by_number(clef.staff_number) {
            self.score.staff_mut(staff).set_current_clef(clef);
        }
        self.spread_attribute(part, Some(clef.staff_number), MeasureElement::Clef(clef));
        Ok(())
    }

    fn handle_key(&mut self, line: u32, key: Key) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let part = self.require_part(line)?;
        if self.score.part(part).current_key() == Some(key) {
            self.diagnostics.warn(
                line,
                DiagnosticKind::RedundantAttribute,
                "key re-declared identically",
            );
            return Ok(());
        }
        self.score.part_mut(part).set_current_key(key);
        self.spread_attribute(part, None, MeasureElement::Key(key));
        Ok(())
    }

    fn handle_time(&mut self, line: u32, time: Time) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let part = self.require_part(line)?;
        if self.score.part(part).current_time() == Some(time) {
            self.diagnostics.warn(
                line,
                DiagnosticKind::RedundantAttribute,
                "time re-declared identically",
            );
            return Ok(());
        }
        self.score.part_mut(part).set_current_time(time);
        // Measures already open in this input measure re-derive their
        // full length
        for measure in self.open_measures_of_part(part, None) {
            self.score.measure_mut(measure).set_time(time);
        }
        self.spread_attribute(part, None, MeasureElement::Time(time));
        Ok(())
    }

    fn handle_transpose(&mut self, line: u32, transpose: Transpose) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let part = self.require_part(line)?;
        self.score.part_mut(part).set_current_transpose(transpose);
        Ok(())
    }

    /// Record an attribute element into every measure already open for
    /// this input measure, and remember it for measures that open later
    fn spread_attribute(
        &mut self,
        part: PartId,
        staff_number: Option<u32>,
        element: MeasureElement,
    ) {
        if self.in_measure {
            for measure in self.open_measures_of_part(part, staff_number) {
                self.score.append_element_to_measure(measure, element.clone());
            }
            self.pending_attributes.push((staff_number, element));
        } else {
            // Outside any measure the attribute belongs before the first
            // segment of the affected voices
            let initial = match &element {
                MeasureElement::Clef(clef) => VoiceInitialElement::Clef(*clef),
                MeasureElement::Key(key) => VoiceInitialElement::Key(*key),
                MeasureElement::Time(time) => VoiceInitialElement::Time(*time),
                _ => return,
            };
            let voices: Vec<VoiceId> = self
                .voice_ids
                .iter()
                .filter(|((p, staff, _), _)| {
                    *p == part && staff_number.map_or(true, |wanted| *staff == wanted)
                })
                .map(|(_, &v)| v)
                .collect();
            for voice in voices {
                self.score
                    .append_initial_element_to_voice(voice, initial.clone());
            }
        }
    }

    /// Measures of this part open for the current input measure,
    /// optionally restricted to one staff number
    fn open_measures_of_part(
        &self,
        part: PartId,
        staff_number: Option<u32>,
    ) -> Vec<MeasureId> {
        let mut out = Vec::new();
        for (&(p, staff, _), &voice) in &self.voice_ids {
            if p != part {
                continue;
            }
            if let Some(wanted) = staff_number {
                if staff != wanted {
                    continue;
                }
            }
            if let Some(state) = self.voice_states.get(&voice) {
                if state.opened_for == Some(self.input_measure_index) {
                    if let Some(measure) = state.last_measure {
                        out.push(measure);
                    }
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Measures
    // ------------------------------------------------------------------

    fn handle_measure_start(&mut self, _line: u32, number: String) -> BuildResult<()> {
        self.in_measure = true;
        self.input_measure_index += 1;
        self.measure_number = number;
        self.cursor = WholeNotes::zero();
        self.pending_attributes.clear();
        Ok(())
    }

    fn handle_measure_end(&mut self, line: u32) -> BuildResult<()> {
        if self.skipping_part {
            self.in_measure = false;
            return Ok(());
        }
        let part = match self.current_part {
            Some(part) => part,
            None => {
                self.in_measure = false;
                return Ok(());
            }
        };
        let voices: Vec<VoiceId> = self
            .voice_ids
            .iter()
            .filter(|((p, _, _), _)| *p == part)
            .map(|(_, &v)| v)
            .collect();
        for voice in voices {
            self.close_voice_measure(line, part, voice)?;
        }
        self.in_measure = false;
        Ok(())
    }

    /// Per-voice bookkeeping when an input measure closes
    fn close_voice_measure(
        &mut self,
        line: u32,
        part: PartId,
        voice: VoiceId,
    ) -> BuildResult<()> {
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");

        // Replica measures only bump the replica count
        if let Some(measures_repeat) = state.active_measures_repeat {
            self.score.measures_repeat_mut(measures_repeat).add_replica();
            return Ok(());
        }
        if state.opened_for != Some(self.input_measure_index) {
            return Ok(());
        }
        let measure = state
            .last_measure
            .expect("an opened voice has a current measure");

        // A grace group still open at measure end trails its principal
        // note ("after" grace notes)
        if let Some(group) = state.pending_grace.take() {
            self.attach_after_grace_group(line, voice, group);
        }

        let length = self.score.measure(measure).accumulated_length();
        self.score.part_mut(part).account_measure_length(length);

        // Multiple rests consume measures until their count is satisfied
        let collapse = match self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice")
            .pending_multiple_rest
            .as_mut()
        {
            Some(pending) => {
                pending.seen += 1;
                (pending.seen == pending.expected).then_some(*pending)
            }
            None => None,
        };
        if let Some(pending) = collapse {
            self.collapse_multiple_rest(voice, pending)?;
        }
        Ok(())
    }

    /// Open (or return) this voice's measure for the current input
    /// measure
    fn ensure_measure(&mut self, line: u32, voice: VoiceId) -> BuildResult<MeasureId> {
        if !self.in_measure {
            return Err(BuildError::OutsideMeasure {
                line,
                what: "musical event",
            });
        }
        let part = self.score.voice_part(voice);
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        if state.opened_for == Some(self.input_measure_index) {
            return Ok(state
                .last_measure
                .expect("an opened voice has a current measure"));
        }

        let force_new = std::mem::take(&mut state.force_new_segment);
        let previous = state.last_measure;
        let ordinal = state.next_ordinal;
        state.next_ordinal += 1;

        let segment = match self.score.voice(voice).last_segment() {
            Some(segment) if !force_new => segment,
            _ => self.score.open_segment(voice, line),
        };
        let first_in_segment = self.score.segment(segment).is_empty();
        let time = self.score.part(part).current_time();
        let measure = self.score.append_measure_to_segment(
            segment,
            Measure::new(
                line,
                self.measure_number.clone(),
                ordinal,
                time,
                first_in_segment,
                segment,
            ),
        );
        if let Some(previous) = previous {
            self.score.measure_mut(previous).set_next_measure_ordinal(ordinal);
        }

        let staff_number = self.score.staff(self.score.voice(voice).staff_uplink()).number;
        for (staff_filter, element) in self.pending_attributes.clone() {
            if staff_filter.is_none() || staff_filter == Some(staff_number) {
                self.score.append_element_to_measure(measure, element);
            }
        }

        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        state.last_measure = Some(measure);
        state.opened_for = Some(self.input_measure_index);
        Ok(measure)
    }

    // ------------------------------------------------------------------
    // Voices
    // ------------------------------------------------------------------

    fn require_part(&self, line: u32) -> BuildResult<PartId> {
        self.current_part.ok_or(BuildError::NoCurrentPart { line })
    }

    /// Look up or create the voice addressed by (staff, voice) numbers
    /// within the current part
    fn ensure_voice(
        &mut self,
        line: u32,
        staff_number: u32,
        voice_number: u32,
    ) -> BuildResult<VoiceId> {
        if staff_number == 0 {
            return Err(BuildError::NonPositiveStaffNumber {
                line,
                value: staff_number as i64,
            });
        }
        if voice_number == 0 {
            return Err(BuildError::NonPositiveVoiceNumber {
                line,
                value: voice_number as i64,
            });
        }
        let part = self.require_part(line)?;
        if let Some(&voice) = self.voice_ids.get(&(part, staff_number, voice_number)) {
            return Ok(voice);
        }

        let staff = match self.score.part(part).staff_by_number(staff_number) {
            Some(staff) => staff,
            None => {
                let staff = Staff::new(line, staff_number, StaffKind::Regular, part)
                    .map_err(|message| BuildError::invalid(line, "staff", message))?;
                self.score.add_staff(part, staff)
            }
        };
        let voice = Voice::new(line, voice_number, VoiceKind::Regular, staff)
            .map_err(|message| BuildError::invalid(line, "voice", message))?;
        let voice = self.score.add_voice(staff, voice);
        self.voice_ids.insert((part, staff_number, voice_number), voice);
        self.voice_states.insert(voice, VoiceState::default());
        Ok(voice)
    }

    // ------------------------------------------------------------------
    // Time cursor
    // ------------------------------------------------------------------

    fn handle_backup(&mut self, line: u32, duration: i64) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let part = self.require_part(line)?;
        let divisions = self.score.part(part).current_divisions().unwrap_or(1);
        let backup = WholeNotes::from_divisions(duration, divisions)
            .map_err(|message| BuildError::invalid(line, "backup duration", message))?;
        let target = self.cursor - backup;
        if target < WholeNotes::zero() {
            return Err(BuildError::BackupBeforeMeasureStart {
                line,
                backup: backup.to_string(),
            });
        }
        self.cursor = target;
        Ok(())
    }

    fn handle_forward(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
        duration: i64,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let part = self.require_part(line)?;
        let divisions = self.score.part(part).current_divisions().unwrap_or(1);
        let skipped = WholeNotes::from_divisions(duration, divisions)
            .map_err(|message| BuildError::invalid(line, "forward duration", message))?;
        let voice = self.ensure_voice(line, staff, voice)?;
        let measure = self.ensure_measure(line, voice)?;
        let skip = self.score.alloc_note(Note::padding_skip(line, skipped));
        self.score.append_note_to_measure(measure, skip);
        self.cursor += skipped;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Directions
    // ------------------------------------------------------------------

    fn append_direction(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
        element: MeasureElement,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, staff, voice)?;
        if !self.in_measure {
            self.diagnostics.warn(
                line,
                DiagnosticKind::Other,
                "direction before the first measure dropped",
            );
            return Ok(());
        }
        let measure = self.ensure_measure(line, voice)?;
        self.score.append_element_to_measure(measure, element);
        Ok(())
    }

    /// A dynamics direction attaches to the most recent note of the
    /// voice, matching how note-carried dynamics are stored
    fn handle_dynamics(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
        dynamics: crate::msr::attributes::Dynamics,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, staff, voice)?;
        match self.score.voice(voice).last_appended_note() {
            Some(note) => {
                self.score.note_mut(note).append_dynamics(dynamics);
            }
            None => {
                self.diagnostics.warn(
                    line,
                    DiagnosticKind::Other,
                    "dynamics with no note to attach to",
                );
            }
        }
        Ok(())
    }

    /// Record a synthetic barline before the first segment of a voice
    fn record_initial_barline(&mut self, voice: VoiceId, barline: crate::msr::attributes::Barline) {
        self.score
            .append_initial_element_to_voice(voice, VoiceInitialElement::Barline(barline));
    }
}

/// Event name for debug traces, without the payload
fn kind_name(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Identification(_) => "identification",
        EventKind::PageGeometry(_) => "page geometry",
        EventKind::Credit { .. } => "credit",
        EventKind::PartGroupStart { .. } => "part group start",
        EventKind::PartGroupStop { .. } => "part group stop",
        EventKind::PartStart { .. } => "part start",
        EventKind::PartEnd => "part end",
        EventKind::Divisions { .. } => "divisions",
        EventKind::Clef(_) => "clef",
        EventKind::Key(_) => "key",
        EventKind::Time(_) => "time",
        EventKind::Transpose(_) => "transpose",
        EventKind::MeasureStart { .. } => "measure start",
        EventKind::MeasureEnd => "measure end",
        EventKind::Note(_) => "note",
        EventKind::TupletStart { .. } => "tuplet start",
        EventKind::TupletStop { .. } => "tuplet stop",
        EventKind::Backup { .. } => "backup",
        EventKind::Forward { .. } => "forward",
        EventKind::Barline(_) => "barline",
        EventKind::MultipleRestStart { .. } => "multiple rest start",
        EventKind::MeasuresRepeatStart { .. } => "measures repeat start",
        EventKind::MeasuresRepeatStop { .. } => "measures repeat stop",
        EventKind::Words { .. } => "words",
        EventKind::Dynamics { .. } => "dynamics",
        EventKind::Wedge { .. } => "wedge",
        EventKind::OctaveShift { .. } => "octave shift",
        EventKind::Tempo { .. } => "tempo",
        EventKind::Harmony { .. } => "harmony",
        EventKind::FiguredBass { .. } => "figured bass",
        EventKind::ScoreEnd => "score end",
    }
}
