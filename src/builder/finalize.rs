//! The finalization pass
//!
//! Runs once after the last event. Per voice: leftover construction
//! state is resolved (a still-pending grace group trails the last note),
//! optional rest compression rewrites the element list, every measure is
//! classified against its time signature, and the flat measure list is
//! cached. Classification never mutates committed elements; a measure
//! that does not add up becomes a diagnostic, not an error.

use super::ScoreBuilder;
use crate::diagnostics::DiagnosticKind;
use crate::errors::BuildResult;
use crate::msr::duration::WholeNotes;
use crate::msr::ids::{MeasureId, SegmentId, VoiceId};
use crate::msr::measure::{MeasureElement, MeasureKind};
use crate::msr::note::{Note, NoteKind};
use crate::msr::repeats::MultipleRest;
use crate::msr::voice::VoiceElement;

impl ScoreBuilder {
    pub(super) fn finalize_score(&mut self, line: u32) -> BuildResult<()> {
        let voices: Vec<VoiceId> = self.voice_ids.values().copied().collect();
        for voice in voices {
            self.check_voice_closed(line, voice)?;
            self.finalize_voice(line, voice)?;
        }
        Ok(())
    }

    fn finalize_voice(&mut self, line: u32, voice: VoiceId) -> BuildResult<()> {
        if let Some(group) = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice")
            .pending_grace
            .take()
        {
            self.attach_after_grace_group(line, voice, group);
        }

        if self.settings.compress_full_measure_rests {
            self.compress_full_measure_rests(voice)?;
        }

        let flat = self.flatten_voice(voice);
        for &measure in &flat {
            if self.settings.merge_rests {
                self.merge_rests_in_measure(measure)?;
            }
            self.classify_measure(measure);
        }
        self.score.voice_mut(voice).set_flat_measures(flat);
        Ok(())
    }

    /// Unroll the voice's top-level structure into one linear measure
    /// sequence: segments in order, repeats as common part then endings,
    /// rest and repeat patterns once
    fn flatten_voice(&self, voice: VoiceId) -> Vec<MeasureId> {
        let mut flat = Vec::new();
        for element in self.score.voice(voice).elements() {
            match *element {
                VoiceElement::Segment(segment) => {
                    flat.extend_from_slice(self.score.segment(segment).measures());
                }
                VoiceElement::Repeat(repeat) => {
                    if let Some(common) = self.score.repeat(repeat).common_part() {
                        flat.extend_from_slice(self.score.segment(common.segment).measures());
                    }
                    for &ending in self.score.repeat(repeat).endings() {
                        let segment = self.score.repeat_ending(ending).segment;
                        flat.extend_from_slice(self.score.segment(segment).measures());
                    }
                }
                VoiceElement::MultipleRest(rest) => {
                    let segment = self.score.multiple_rest(rest).segment;
                    flat.extend_from_slice(self.score.segment(segment).measures());
                }
                VoiceElement::MeasuresRepeat(measures_repeat) => {
                    let segment = self.score.measures_repeat(measures_repeat).pattern_segment;
                    flat.extend_from_slice(self.score.segment(segment).measures());
                }
            }
        }
        flat
    }

    fn classify_measure(&mut self, measure: MeasureId) {
        if self.score.measure(measure).is_finalized() {
            return;
        }
        let kind = self.score.measure_mut(measure).finalize();
        let entry = self.score.measure(measure);
        match kind {
            MeasureKind::Overfull => {
                self.diagnostics.warn(
                    entry.input_line_number,
                    DiagnosticKind::OverfullMeasure,
                    format!("measure {} is overfull", entry.number()),
                );
            }
            MeasureKind::Underfull => {
                self.diagnostics.warn(
                    entry.input_line_number,
                    DiagnosticKind::UnderfullMeasure,
                    format!("measure {} is underfull", entry.number()),
                );
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Full-measure-rest compression
    // ------------------------------------------------------------------

    /// Runs of two or more consecutive rest-only full measures collapse
    /// into multiple-rest entities, even without an input declaration
    fn compress_full_measure_rests(&mut self, voice: VoiceId) -> BuildResult<()> {
        let elements = self.score.voice(voice).elements().to_vec();
        let mut rebuilt: Vec<VoiceElement> = Vec::new();
        let mut changed = false;

        for element in elements {
            match element {
                VoiceElement::Segment(segment) => {
                    changed |= self.compress_segment(voice, segment, &mut rebuilt)?;
                }
                other => rebuilt.push(other),
            }
        }
        if changed {
            self.score.voice_mut(voice).replace_elements(rebuilt);
        }
        Ok(())
    }

    /// Split one segment around its compressible runs. Returns whether
    /// anything was rewritten; if not, the original segment is kept.
    fn compress_segment(
        &mut self,
        voice: VoiceId,
        segment: SegmentId,
        rebuilt: &mut Vec<VoiceElement>,
    ) -> BuildResult<bool> {
        let measures = self.score.segment(segment).measures().to_vec();
        let compressible: Vec<bool> = measures
            .iter()
            .map(|&m| self.is_full_measure_rest(m))
            .collect();
        let has_run = compressible
            .windows(2)
            .any(|pair| pair[0] && pair[1]);
        if !has_run {
            rebuilt.push(VoiceElement::Segment(segment));
            return Ok(false);
        }

        let line = self.score.segment(segment).input_line_number;
        let mut index = 0;
        while index < measures.len() {
            if compressible[index] {
                let mut end = index;
                while end < measures.len() && compressible[end] {
                    end += 1;
                }
                if end - index >= 2 {
                    let rest = self.build_multiple_rest(voice, &measures[index..end])?;
                    rebuilt.push(VoiceElement::MultipleRest(rest));
                    index = end;
                    continue;
                }
            }
            // A run of uncompressed measures becomes its own segment,
            // ending where the next compressible pair begins
            let mut end = index;
            while end < measures.len() {
                if compressible[end] && end + 1 < measures.len() && compressible[end + 1] {
                    break;
                }
                end += 1;
            }
            let chunk = self.score.alloc_detached_segment(voice, line);
            for &measure in &measures[index..end] {
                self.score.measure_mut(measure).set_segment_uplink(chunk);
                self.score.segment_mut(chunk).append_measure(measure);
            }
            rebuilt.push(VoiceElement::Segment(chunk));
            index = end;
        }
        self.score.segment_mut(segment).clear_measures();
        Ok(true)
    }

    fn build_multiple_rest(
        &mut self,
        voice: VoiceId,
        measures: &[MeasureId],
    ) -> BuildResult<crate::msr::ids::MultipleRestId> {
        let line = self.score.measure(measures[0]).input_line_number;
        let pattern = self.score.alloc_detached_segment(voice, line);
        for &measure in measures {
            self.score.measure_mut(measure).set_segment_uplink(pattern);
            self.score.segment_mut(pattern).append_measure(measure);
        }
        let rest = MultipleRest::new(line, measures.len() as u32, pattern, voice)
            .map_err(|message| crate::errors::BuildError::invalid(line, "multiple rest", message))?;
        Ok(self.score.alloc_multiple_rest(rest))
    }

    /// A measure eligible for compression: a known full length, exactly
    /// reached, and nothing in it but rests and skips
    fn is_full_measure_rest(&self, measure: MeasureId) -> bool {
        let entry = self.score.measure(measure);
        let full = match entry.full_length() {
            Some(full) => full,
            None => return false,
        };
        if entry.accumulated_length() != full {
            return false;
        }
        entry.has_only_elements_matching(|element| match element {
            MeasureElement::Note(note) => self.score.note(*note).kind().is_rest_or_skip(),
            _ => false,
        })
    }

    // ------------------------------------------------------------------
    // Rest merging
    // ------------------------------------------------------------------

    /// Merge runs of adjacent rests of equal visibility into one rest
    /// spanning their combined time
    fn merge_rests_in_measure(&mut self, measure: MeasureId) -> BuildResult<()> {
        let elements = self.score.measure(measure).elements().to_vec();
        let mut rebuilt: Vec<MeasureElement> = Vec::new();
        let mut changed = false;

        let mut run: Vec<crate::msr::ids::NoteId> = Vec::new();
        for element in elements {
            match element {
                MeasureElement::Note(note)
                    if self.score.note(note).kind() == NoteKind::Rest =>
                {
                    let compatible = run.last().map_or(true, |&prev| {
                        self.score.note(prev).print_object == self.score.note(note).print_object
                    });
                    if compatible {
                        run.push(note);
                        continue;
                    }
                    changed |= self.flush_rest_run(measure, &mut run, &mut rebuilt)?;
                    run.push(note);
                }
                other => {
                    changed |= self.flush_rest_run(measure, &mut run, &mut rebuilt)?;
                    rebuilt.push(other);
                }
            }
        }
        changed |= self.flush_rest_run(measure, &mut run, &mut rebuilt)?;

        if changed {
            self.score.measure_mut(measure).set_elements(rebuilt);
        }
        Ok(())
    }

    /// Emit a pending rest run: untouched if it is a single rest, merged
    /// into a fresh rest note otherwise
    fn flush_rest_run(
        &mut self,
        measure: MeasureId,
        run: &mut Vec<crate::msr::ids::NoteId>,
        rebuilt: &mut Vec<MeasureElement>,
    ) -> BuildResult<bool> {
        match run.len() {
            0 => Ok(false),
            1 => {
                rebuilt.push(MeasureElement::Note(run.pop().expect("run has one note")));
                Ok(false)
            }
            _ => {
                let first = run[0];
                let line = self.score.note(first).input_line_number;
                let position = self.score.note(first).position_in_measure();
                let print_object = self.score.note(first).print_object;
                let total: WholeNotes = run
                    .iter()
                    .map(|&note| self.score.note(note).sounding_duration())
                    .sum();
                let mut merged = Note::new(line, NoteKind::Rest, None, total, total, 0)
                    .map_err(|message| {
                        crate::errors::BuildError::invalid(line, "merged rest", message)
                    })?;
                merged.print_object = print_object;
                let merged = self.score.alloc_note(merged);
                self.score.note_mut(merged).set_measure_uplink(measure);
                self.score.note_mut(merged).set_position_in_measure(position);
                rebuilt.push(MeasureElement::Note(merged));
                run.clear();
                Ok(true)
            }
        }
    }
}
