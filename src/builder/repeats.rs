//! Repeat, ending, multiple-rest and measures-repeat construction
//!
//! Repeats are recognized from barline events. The material between a
//! forward and a backward repeat barline is the trailing run of voice
//! elements; closing the repeat collapses that run into one segment and
//! wraps it as the repeat's common part. Alternate endings collect
//! measures the same way, between ending start and stop marks.

use super::{OpenEnding, PendingMultipleRest, PendingRepeatStart, ScoreBuilder};
use crate::diagnostics::DiagnosticKind;
use crate::errors::{BuildError, BuildResult};
use crate::msr::attributes::{Barline, BarlineLocation, BarlineStyle};
use crate::msr::ids::{SegmentId, VoiceId};
use crate::msr::measure::MeasureElement;
use crate::msr::repeats::{MeasuresRepeat, MultipleRest, Repeat, RepeatEnding, RepeatEndingKind};
use crate::msr::voice::VoiceElement;

use super::events::{BarlineEvent, EndingMark, RepeatMark};

impl ScoreBuilder {
    /// One barline event can carry several meanings at once; they apply
    /// in reading order: open a repeat, open an ending, print the bar,
    /// close the repeat, close the ending.
    pub(super) fn handle_barline(&mut self, line: u32, event: BarlineEvent) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, event.staff, event.voice)?;

        if matches!(event.repeat, Some(RepeatMark::Forward)) {
            let elements_len = self.score.voice(voice).elements().len();
            let state = self
                .voice_states
                .get_mut(&voice)
                .expect("voice state exists for every known voice");
            if let Some(stale) = state.pending_repeat_start.replace(PendingRepeatStart {
                line,
                elements_len,
            }) {
                self.diagnostics.warn(
                    stale.line,
                    DiagnosticKind::UnmatchedRepeatStart,
                    "forward repeat barline never closed",
                );
            }
            let state = self
                .voice_states
                .get_mut(&voice)
                .expect("voice state exists for every known voice");
            state.building_repeat = None;
            state.force_new_segment = true;
        }

        if let Some(EndingMark::Start { number }) = &event.ending {
            self.begin_ending(line, voice, number.clone())?;
        }

        if let Some(style) = event.style {
            let barline = Barline::new(event.location, style);
            if self.in_measure {
                let measure = self.ensure_measure(line, voice)?;
                self.score
                    .append_element_to_measure(measure, MeasureElement::Barline(barline));
            } else {
                self.record_initial_barline(voice, barline);
            }
        }

        if let Some(RepeatMark::Backward { times }) = event.repeat {
            self.close_repeat(line, voice, times)?;
        }

        match &event.ending {
            Some(EndingMark::Stop) => self.close_ending(line, voice, RepeatEndingKind::Hooked)?,
            Some(EndingMark::Discontinue) => {
                self.close_ending(line, voice, RepeatEndingKind::Hookless)?
            }
            _ => {}
        }
        Ok(())
    }

    /// A backward repeat barline wraps the trailing material into a
    /// repeat. With an ending open, the repeat already exists and only
    /// the play count is recorded; the ending stop does the wrapping.
    fn close_repeat(&mut self, line: u32, voice: VoiceId, times: u32) -> BuildResult<()> {
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        if state.open_ending.is_some() {
            if let Some(repeat) = state.building_repeat {
                self.score.repeat_mut(repeat).set_times(times);
            }
            return Ok(());
        }

        let start_len = match state.pending_repeat_start.take() {
            Some(start) => start.elements_len,
            // No forward mark: the repeat implicitly starts at the top of
            // the voice
            None => {
                if self.settings.create_implicit_initial_repeat_barline {
                    self.record_initial_barline(
                        voice,
                        Barline::new(BarlineLocation::Left, BarlineStyle::HeavyLight),
                    );
                }
                0
            }
        };

        let current_len = self.score.voice(voice).elements().len();
        let common = self.collapse_tail_into_segment(line, voice, start_len)?;
        let repeat = self.score.alloc_repeat(Repeat::new(line, voice));
        self.score.repeat_mut(repeat).set_times(times);
        self.score.repeat_mut(repeat).set_common_part(line, common);
        self.score
            .voice_mut(voice)
            .wrap_tail_into_repeat(current_len - start_len, repeat);

        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        state.building_repeat = Some(repeat);
        state.force_new_segment = true;
        Ok(())
    }

    /// An ending start first closes the common part of its repeat (if
    /// still open), then begins collecting the ending's measures
    fn begin_ending(&mut self, line: u32, voice: VoiceId, number: String) -> BuildResult<()> {
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        if state.open_ending.is_some() {
            return Err(BuildError::UnclosedRepeatEnding { line });
        }
        if state.building_repeat.is_none() {
            let start_len = state
                .pending_repeat_start
                .take()
                .map(|start| start.elements_len)
                .unwrap_or(0);
            let current_len = self.score.voice(voice).elements().len();
            let common = self.collapse_tail_into_segment(line, voice, start_len)?;
            let repeat = self.score.alloc_repeat(Repeat::new(line, voice));
            self.score.repeat_mut(repeat).set_common_part(line, common);
            self.score
                .voice_mut(voice)
                .wrap_tail_into_repeat(current_len - start_len, repeat);
            self.voice_states
                .get_mut(&voice)
                .expect("voice state exists for every known voice")
                .building_repeat = Some(repeat);
        }

        let elements_len = self.score.voice(voice).elements().len();
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        state.open_ending = Some(OpenEnding {
            line,
            number,
            elements_len,
        });
        state.force_new_segment = true;
        Ok(())
    }

    fn close_ending(
        &mut self,
        line: u32,
        voice: VoiceId,
        kind: RepeatEndingKind,
    ) -> BuildResult<()> {
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        let open = state.open_ending.take().ok_or(BuildError::EndingOutsideRepeat {
            line,
            number: String::new(),
        })?;
        let repeat = state
            .building_repeat
            .ok_or(BuildError::EndingOutsideRepeat {
                line,
                number: open.number.clone(),
            })?;

        let segment = self.collapse_tail_into_segment(line, voice, open.elements_len)?;
        self.score.voice_mut(voice).truncate_elements(open.elements_len);
        let ending = self.score.alloc_repeat_ending(RepeatEnding::new(
            open.line,
            open.number,
            kind,
            segment,
            repeat,
        ));
        self.score.repeat_mut(repeat).append_ending(ending);

        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        state.force_new_segment = true;
        // A hookless ending is the final one; the repeat is complete
        if kind == RepeatEndingKind::Hookless {
            state.building_repeat = None;
        }
        Ok(())
    }

    /// Collapse the voice elements from `from_len` onward into a single
    /// segment. A tail of exactly one segment is reused as is; anything
    /// else has its measures moved into a fresh detached segment.
    fn collapse_tail_into_segment(
        &mut self,
        line: u32,
        voice: VoiceId,
        from_len: usize,
    ) -> BuildResult<SegmentId> {
        let tail: Vec<VoiceElement> = self.score.voice(voice).elements()[from_len..].to_vec();
        if let [VoiceElement::Segment(segment)] = tail[..] {
            return Ok(segment);
        }

        let target = self.score.alloc_detached_segment(voice, line);
        for element in tail {
            let sources: Vec<SegmentId> = match element {
                VoiceElement::Segment(segment) => vec![segment],
                VoiceElement::Repeat(repeat) => {
                    self.diagnostics.warn(
                        line,
                        DiagnosticKind::Other,
                        "nested repeat flattened into enclosing repeat",
                    );
                    let mut segments: Vec<SegmentId> = self
                        .score
                        .repeat(repeat)
                        .common_part()
                        .map(|common| common.segment)
                        .into_iter()
                        .collect();
                    for &ending in self.score.repeat(repeat).endings() {
                        segments.push(self.score.repeat_ending(ending).segment);
                    }
                    segments
                }
                VoiceElement::MultipleRest(rest) => {
                    self.diagnostics.warn(
                        line,
                        DiagnosticKind::Other,
                        "multiple rest flattened into enclosing repeat",
                    );
                    vec![self.score.multiple_rest(rest).segment]
                }
                VoiceElement::MeasuresRepeat(measures_repeat) => {
                    self.diagnostics.warn(
                        line,
                        DiagnosticKind::Other,
                        "measures repeat flattened into enclosing repeat",
                    );
                    vec![self.score.measures_repeat(measures_repeat).pattern_segment]
                }
            };
            for source in sources {
                self.move_measures_into(source, target);
            }
        }
        Ok(target)
    }

    /// Move every measure of `source` to the end of `target`
    fn move_measures_into(&mut self, source: SegmentId, target: SegmentId) {
        let measures = self.score.segment(source).measures().to_vec();
        self.score.segment_mut(source).clear_measures();
        for measure in measures {
            self.score.measure_mut(measure).set_segment_uplink(target);
            self.score.segment_mut(target).append_measure(measure);
        }
    }

    // ------------------------------------------------------------------
    // Multiple rests
    // ------------------------------------------------------------------

    pub(super) fn handle_multiple_rest_start(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
        measure_count: u32,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        if measure_count == 0 {
            return Err(BuildError::invalid(
                line,
                "multiple rest",
                "must span at least one measure",
            ));
        }
        let voice = self.ensure_voice(line, staff, voice)?;
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        if let Some(pending) = state.pending_multiple_rest {
            return Err(BuildError::UnfinishedMultipleRest {
                line: pending.line,
                expected: pending.expected,
                seen: pending.seen,
            });
        }
        state.pending_multiple_rest = Some(PendingMultipleRest {
            line,
            expected: measure_count,
            seen: 0,
        });
        Ok(())
    }

    /// All declared rest measures have been consumed; replace them with
    /// one multiple-rest entity holding them as its pattern
    pub(super) fn collapse_multiple_rest(
        &mut self,
        voice: VoiceId,
        pending: PendingMultipleRest,
    ) -> BuildResult<()> {
        self.voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice")
            .pending_multiple_rest = None;

        let segment = match self.score.voice(voice).last_segment() {
            Some(segment) => segment,
            None => {
                self.diagnostics.warn(
                    pending.line,
                    DiagnosticKind::Other,
                    "multiple rest with no measures to consume",
                );
                return Ok(());
            }
        };
        let available = self.score.segment(segment).len();
        if available < pending.expected as usize {
            return Err(BuildError::UnfinishedMultipleRest {
                line: pending.line,
                expected: pending.expected,
                seen: available as u32,
            });
        }

        let pattern = self.score.alloc_detached_segment(voice, pending.line);
        let moved = self
            .score
            .segment_mut(segment)
            .remove_trailing_measures(pending.expected as usize);
        for measure in moved {
            self.score.measure_mut(measure).set_segment_uplink(pattern);
            self.score.segment_mut(pattern).append_measure(measure);
        }
        self.drop_segment_if_emptied(voice, segment);

        let rest = MultipleRest::new(pending.line, pending.expected, pattern, voice)
            .map_err(|message| BuildError::invalid(pending.line, "multiple rest", message))?;
        let rest = self.score.alloc_multiple_rest(rest);
        self.score.voice_mut(voice).append_multiple_rest(rest);

        self.voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice")
            .force_new_segment = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Measures repeats
    // ------------------------------------------------------------------

    pub(super) fn handle_measures_repeat_start(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
        measures_per_pattern: u32,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, staff, voice)?;
        let segment = self.score.voice(voice).last_segment();
        let available = segment.map(|s| self.score.segment(s).len()).unwrap_or(0);
        if available < measures_per_pattern as usize {
            return Err(BuildError::MeasuresRepeatPatternTooWide {
                line,
                wanted: measures_per_pattern,
                available: available as u32,
            });
        }
        let segment = segment.expect("a non-zero measure count implies a segment");

        let pattern = self.score.alloc_detached_segment(voice, line);
        let moved = self
            .score
            .segment_mut(segment)
            .remove_trailing_measures(measures_per_pattern as usize);
        for measure in moved {
            self.score.measure_mut(measure).set_segment_uplink(pattern);
            self.score.segment_mut(pattern).append_measure(measure);
        }
        self.drop_segment_if_emptied(voice, segment);

        let measures_repeat = MeasuresRepeat::new(line, measures_per_pattern, pattern, voice)
            .map_err(|message| BuildError::invalid(line, "measures repeat", message))?;
        let measures_repeat = self.score.alloc_measures_repeat(measures_repeat);
        self.score
            .voice_mut(voice)
            .append_measures_repeat(measures_repeat);

        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        state.active_measures_repeat = Some(measures_repeat);
        state.force_new_segment = true;
        Ok(())
    }

    pub(super) fn handle_measures_repeat_stop(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, staff, voice)?;
        let state = self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice");
        if state.active_measures_repeat.take().is_none() {
            self.diagnostics.warn(
                line,
                DiagnosticKind::Other,
                "measures repeat stop without a matching start",
            );
        }
        Ok(())
    }

    /// A wrapping entity consumed every measure of the trailing segment;
    /// the empty shell leaves the voice's element list
    fn drop_segment_if_emptied(&mut self, voice: VoiceId, segment: SegmentId) {
        if !self.score.segment(segment).is_empty() {
            return;
        }
        let mut elements = self.score.voice(voice).elements().to_vec();
        if elements.last() == Some(&VoiceElement::Segment(segment)) {
            elements.pop();
            self.score.voice_mut(voice).replace_elements(elements);
        }
    }
}
