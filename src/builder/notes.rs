//! Note-stream handling: notes, rests, chords, grace notes, tuplets
//! and lyrics
//!
//! This is where the builder's look-ahead corrections live. A note event
//! carrying the chord flag retroactively converts the previously appended
//! note into the first member of a chord; a grace note is buffered in a
//! pending group until a principal note (or the measure end) claims it;
//! tuplet starts and stops maintain a per-voice nesting stack.

use super::ScoreBuilder;
use crate::diagnostics::DiagnosticKind;
use crate::errors::{BuildError, BuildResult};
use crate::msr::chord::Chord;
use crate::msr::duration::WholeNotes;
use crate::msr::ids::{GraceNotesGroupId, NoteId, VoiceId};
use crate::msr::lyrics::{Stanza, Syllable};
use crate::msr::measure::MeasureElement;
use crate::msr::note::{GraceNotesGroup, GraceNotesGroupKind, Note, NoteKind};
use crate::msr::tuplet::{Tuplet, TupletElement};

use super::events::{LyricEvent, NoteEvent};

impl ScoreBuilder {
    pub(super) fn handle_note(&mut self, line: u32, event: NoteEvent) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, event.staff, event.voice)?;
        let state = self
            .voice_states
            .get(&voice)
            .expect("voice state exists for every known voice");
        // Inside a measures repeat the content is replica shorthand
        if state.active_measures_repeat.is_some() {
            return Ok(());
        }
        if event.grace.is_some() {
            return self.handle_grace_note(line, voice, event);
        }
        if event.chord {
            return self.handle_chord_member(line, voice, event);
        }
        self.handle_plain_note(line, voice, event)
    }

    // ------------------------------------------------------------------
    // Plain notes and rests
    // ------------------------------------------------------------------

    fn handle_plain_note(
        &mut self,
        line: u32,
        voice: VoiceId,
        event: NoteEvent,
    ) -> BuildResult<()> {
        let part = self.score.voice_part(voice);
        let divisions = self.score.part(part).current_divisions().unwrap_or(1);
        let sounding = WholeNotes::from_divisions(event.duration, divisions)
            .map_err(|message| BuildError::invalid(line, "note duration", message))?;

        let enclosing_tuplet = self
            .voice_states
            .get(&voice)
            .expect("voice state exists for every known voice")
            .tuplet_stack
            .last()
            .copied();

        let kind = match (event.is_rest, event.is_unpitched, enclosing_tuplet.is_some()) {
            (true, _, _) => NoteKind::Rest,
            (false, true, false) => NoteKind::Unpitched,
            (false, true, true) => NoteKind::TupletMemberUnpitched,
            (false, false, false) => NoteKind::Standalone,
            (false, false, true) => NoteKind::TupletMember,
        };
        // Inside a tuplet the notated duration differs from the sounding
        // one by the combined tuplet factor
        let display = match enclosing_tuplet {
            Some(tuplet) => sounding.scaled(self.score.tuplet(tuplet).display_factor()),
            None => sounding,
        };

        let mut note = Note::new(line, kind, event.pitch, sounding, display, event.dots)
            .map_err(|message| BuildError::invalid(line, "note", message))?;
        decorate_note(&mut note, &event);
        let note = self.score.alloc_note(note);

        match enclosing_tuplet {
            Some(tuplet) => {
                self.score.append_note_to_tuplet(tuplet, note);
            }
            None => {
                let measure = self.ensure_measure(line, voice)?;
                self.pad_measure_to_cursor(line, measure);
                self.score.append_note_to_measure(measure, note);
            }
        }

        self.close_pending_grace_before(voice, note);
        self.attach_lyrics(line, voice, note, &event.lyrics)?;

        let voice_entry = self.score.voice_mut(voice);
        voice_entry.account_note_duration(sounding);
        voice_entry.set_last_appended_note(note);
        self.cursor += sounding;
        Ok(())
    }

    /// Invisible padding that realigns a measure whose accumulated length
    /// fell behind the position cursor (after a backup targeting another
    /// voice)
    fn pad_measure_to_cursor(&mut self, line: u32, measure: crate::msr::ids::MeasureId) {
        let accumulated = self.score.measure(measure).accumulated_length();
        if accumulated < self.cursor {
            let skip = self
                .score
                .alloc_note(Note::padding_skip(line, self.cursor - accumulated));
            self.score.append_note_to_measure(measure, skip);
        }
    }

    // ------------------------------------------------------------------
    // Chords
    // ------------------------------------------------------------------

    /// The chord flag means: this note sounds together with the previous
    /// one. The previous note was already appended standalone; convert it.
    fn handle_chord_member(
        &mut self,
        line: u32,
        voice: VoiceId,
        event: NoteEvent,
    ) -> BuildResult<()> {
        let previous = self
            .score
            .voice(voice)
            .last_appended_note()
            .ok_or(BuildError::ChordWithoutPreviousNote { line })?;

        let chord = match self.score.note(previous).chord_uplink() {
            // Third and later members extend the existing chord
            Some(chord) => chord,
            None => self.convert_note_to_chord(line, previous)?,
        };

        // All members share the chord's time slot, but each keeps its own
        // written duration
        let sounding = self.score.chord(chord).sounding_duration();
        let part = self.score.voice_part(voice);
        let divisions = self.score.part(part).current_divisions().unwrap_or(1);
        let written = WholeNotes::from_divisions(event.duration, divisions)
            .map_err(|message| BuildError::invalid(line, "chord member duration", message))?;
        let display = match self.score.chord(chord).tuplet_uplink() {
            Some(tuplet) => written.scaled(self.score.tuplet(tuplet).display_factor()),
            None => written,
        };
        let kind = member_kind(self.score.note(previous).kind());
        let mut note = Note::new(line, kind, event.pitch, sounding, display, event.dots)
            .map_err(|message| BuildError::invalid(line, "chord member", message))?;
        decorate_note(&mut note, &event);
        let note = self.score.alloc_note(note);
        self.score.append_note_to_chord(chord, note);
        self.attach_lyrics(line, voice, note, &event.lyrics)?;
        // The chord occupies the previous note's time slot; the cursor
        // does not move
        self.score.voice_mut(voice).set_last_appended_note(note);
        Ok(())
    }

    /// Swap a just-appended standalone note for a chord that absorbs it.
    /// The element list's length and the occupied time are unchanged by
    /// construction.
    fn convert_note_to_chord(
        &mut self,
        line: u32,
        previous: NoteId,
    ) -> BuildResult<crate::msr::ids::ChordId> {
        let measure = self
            .score
            .note(previous)
            .measure_uplink()
            .ok_or(BuildError::ChordWithoutPreviousNote { line })?;
        let sounding = self.score.note(previous).sounding_duration();
        let position = self.score.note(previous).position_in_measure();

        let mut chord = Chord::new(self.score.note(previous).input_line_number, sounding);
        chord.set_position_in_measure(position);
        let chord = self.score.alloc_chord(chord);

        match self.score.note(previous).tuplet_uplink() {
            Some(tuplet) => {
                let replaced = self
                    .score
                    .tuplet_mut(tuplet)
                    .replace_last_element(TupletElement::Chord(chord));
                debug_assert_eq!(replaced, Some(TupletElement::Note(previous)));
                self.score.chord_mut(chord).set_tuplet_uplink(tuplet);
                self.score.chord_mut(chord).set_measure_uplink(measure);
            }
            None => {
                let replaced = self
                    .score
                    .measure_mut(measure)
                    .replace_last_element(MeasureElement::Chord(chord));
                debug_assert_eq!(replaced, Some(MeasureElement::Note(previous)));
                self.score.chord_mut(chord).set_measure_uplink(measure);
            }
        }

        let new_kind = member_kind(self.score.note(previous).kind());
        self.score.note_mut(previous).set_kind(new_kind);
        self.score.append_note_to_chord(chord, previous);
        Ok(chord)
    }

    // ------------------------------------------------------------------
    // Grace notes
    // ------------------------------------------------------------------

    /// Grace notes accumulate in a pending group; the next principal note
    /// claims them as its "before" group
    fn handle_grace_note(
        &mut self,
        line: u32,
        voice: VoiceId,
        event: NoteEvent,
    ) -> BuildResult<()> {
        let part = self.score.voice_part(voice);
        let divisions = self.score.part(part).current_divisions().unwrap_or(1);
        // A grace note has no sounding time; its duration field carries
        // the written duration
        let display = WholeNotes::from_divisions(event.duration, divisions)
            .map_err(|message| BuildError::invalid(line, "grace note duration", message))?;
        let slash = event.grace.map(|g| g.slash).unwrap_or(false);

        let pending = self
            .voice_states
            .get(&voice)
            .expect("voice state exists for every known voice")
            .pending_grace;

        // A chord flag on a grace note sounds it together with the
        // previous grace note of the pending group
        let (group, kind) = if event.chord {
            let group = pending.ok_or(BuildError::ChordWithoutPreviousNote { line })?;
            let previous = self
                .score
                .grace_group(group)
                .notes()
                .last()
                .copied()
                .expect("a pending grace group is never empty");
            let promoted = member_kind(self.score.note(previous).kind());
            self.score.note_mut(previous).set_kind(promoted);
            (group, NoteKind::GraceChordMember)
        } else {
            let group = match pending {
                Some(group) => group,
                None => {
                    let group = self.score.alloc_grace_group(GraceNotesGroup::new(
                        line,
                        GraceNotesGroupKind::Before,
                        slash,
                    ));
                    self.voice_states
                        .get_mut(&voice)
                        .expect("voice state exists for every known voice")
                        .pending_grace = Some(group);
                    group
                }
            };
            (group, NoteKind::Grace)
        };

        let mut note = Note::new(
            line,
            kind,
            event.pitch,
            WholeNotes::zero(),
            display,
            event.dots,
        )
        .map_err(|message| BuildError::invalid(line, "grace note", message))?;
        decorate_note(&mut note, &event);
        let note = self.score.alloc_note(note);
        self.score.append_note_to_grace_group(group, note);
        Ok(())
    }

    /// Attach the pending grace group (if any) before a just-appended
    /// principal note
    fn close_pending_grace_before(&mut self, voice: VoiceId, principal: NoteId) {
        let group = match self
            .voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice")
            .pending_grace
            .take()
        {
            Some(group) => group,
            None => return,
        };
        self.score.grace_group_mut(group).set_note_uplink(principal);
        self.score.grace_group_mut(group).set_voice_uplink(voice);
        self.score.note_mut(principal).set_grace_group_before(group);

        if self.settings.add_skip_grace_notes_to_sibling_voices {
            self.add_skip_grace_groups_to_siblings(voice, group);
        }
    }

    /// Backend workaround: sibling voices of the same staff receive a
    /// cloned group of skips so their spacing matches the graced voice
    fn add_skip_grace_groups_to_siblings(&mut self, voice: VoiceId, group: GraceNotesGroupId) {
        let staff = self.score.voice(voice).staff_uplink();
        let siblings: Vec<VoiceId> = self
            .score
            .staff(staff)
            .voices()
            .values()
            .copied()
            .filter(|&v| v != voice)
            .collect();
        for sibling in siblings {
            let target = match self.score.voice(sibling).last_appended_note() {
                Some(note) if self.score.note(note).grace_group_before().is_none() => note,
                _ => continue,
            };
            let skips = self.score.clone_grace_group_as_skips(group);
            self.score.grace_group_mut(skips).set_note_uplink(target);
            self.score.grace_group_mut(skips).set_voice_uplink(sibling);
            self.score.note_mut(target).set_grace_group_before(skips);
        }
    }

    /// A grace group still pending when its measure closes trails the
    /// last principal note instead
    pub(super) fn attach_after_grace_group(
        &mut self,
        line: u32,
        voice: VoiceId,
        group: GraceNotesGroupId,
    ) {
        let target = match self.score.voice(voice).last_appended_note() {
            Some(note) if self.score.note(note).grace_group_after().is_none() => note,
            _ => {
                self.diagnostics.warn(
                    line,
                    DiagnosticKind::Other,
                    "grace notes with no principal note to attach to",
                );
                return;
            }
        };
        self.score
            .grace_group_mut(group)
            .set_kind(GraceNotesGroupKind::After);
        self.score.grace_group_mut(group).set_note_uplink(target);
        self.score.grace_group_mut(group).set_voice_uplink(voice);
        self.score.note_mut(target).set_grace_group_after(group);
    }

    // ------------------------------------------------------------------
    // Tuplets
    // ------------------------------------------------------------------

    pub(super) fn handle_tuplet_start(
        &mut self,
        line: u32,
        staff: u32,
        voice: u32,
        number: u32,
        actual_notes: u32,
        normal_notes: u32,
    ) -> BuildResult<()> {
        if self.skipping_part {
            return Ok(());
        }
        let voice = self.ensure_voice(line, staff, voice)?;
        if self
            .voice_states
            .get(&voice)
            .expect("voice state exists for every known voice")
            .active_measures_repeat
            .is_some()
        {
            return Ok(());
        }
        let mut tuplet = Tuplet::new(line, number, actual_notes, normal_notes)
            .map_err(|message| BuildError::invalid(line, "tuplet", message))?;

        let enclosing = self
            .voice_states
            .get(&voice)
            .expect("voice state exists for every known voice")
            .tuplet_stack
            .last()
            .copied();
        let tuplet = match enclosing {
            Some(enclosing) => {
                tuplet.apply_enclosing_factor(self.score.tuplet(enclosing).display_factor());
                let tuplet = self.score.alloc_tuplet(tuplet);
                self.score.append_tuplet_to_tuplet(enclosing, tuplet);
                tuplet
            }
            None => {
                let measure = self.ensure_measure(line, voice)?;
                self.pad_measure_to_cursor(line, measure);
                let tuplet = self.score.alloc_tuplet(tuplet);
                self.score.append_tuplet_to_measure(measure, tuplet);
                tuplet
            }
        };
        self.voice_states
            .get_mut(&voice)
            .expect("voice state exists for every known voice")
            .tuplet_stack
            .push(tuplet);
        Ok(())
    }

    pub(super) fn handle_tuplet_stop(
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
        if state.active_measures_repeat.is_some() {
            return Ok(());
        }
        match state.tuplet_stack.pop() {
            Some(_) => Ok(()),
            None => Err(BuildError::UnmatchedTupletStop { line }),
        }
    }

    // ------------------------------------------------------------------
    // Lyrics
    // ------------------------------------------------------------------

    fn attach_lyrics(
        &mut self,
        line: u32,
        voice: VoiceId,
        note: NoteId,
        lyrics: &[LyricEvent],
    ) -> BuildResult<()> {
        for lyric in lyrics {
            let stanza = match self.score.voice(voice).stanzas().get(&lyric.stanza_number) {
                Some(&stanza) => stanza,
                None => {
                    let stanza = self.score.alloc_stanza(
                        Stanza::new(
                            line,
                            lyric.stanza_number,
                            format!("Stanza {}", lyric.stanza_number),
                            voice,
                        )
                        .map_err(|message| BuildError::invalid(line, "stanza", message))?,
                    );
                    self.score
                        .voice_mut(voice)
                        .register_stanza(lyric.stanza_number, stanza);
                    stanza
                }
            };
            let syllable = self.score.alloc_syllable(Syllable::new(
                line,
                lyric.kind,
                lyric.texts.clone(),
                lyric.elision,
                stanza,
            ));
            self.score.attach_syllable(stanza, syllable, note);
        }
        Ok(())
    }
}

/// Copy the event's decorations onto a freshly built note
fn decorate_note(note: &mut Note, event: &NoteEvent) {
    note.accidental = event.accidental;
    note.head = event.head;
    note.stem = event.stem;
    note.print_object = event.print_object;
    for beam in &event.beams {
        note.append_beam(*beam);
    }
    for tie in &event.ties {
        note.append_tie(*tie);
    }
    for slur in &event.slurs {
        note.append_slur(*slur);
    }
    for articulation in &event.articulations {
        note.append_articulation(*articulation);
    }
    for dynamics in &event.dynamics {
        note.append_dynamics(*dynamics);
    }
}

/// The chord-member role corresponding to a note's current role
fn member_kind(kind: NoteKind) -> NoteKind {
    match kind {
        NoteKind::Grace | NoteKind::GraceChordMember => NoteKind::GraceChordMember,
        _ => NoteKind::ChordMember,
    }
}
