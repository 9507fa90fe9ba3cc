//! Notes and grace-note groups
//!
//! The note is the atomic musical event. Its mutually exclusive roles are
//! captured by `NoteKind`; the builder rewrites the kind when look-ahead
//! reveals that an already-appended note is actually a chord or tuplet
//! member. Uplinks to the enclosing measure/chord/tuplet/grace group are
//! non-owning and set exactly once at attach time.

use serde::{Deserialize, Serialize};

use super::attributes::{
    AccidentalKind, Articulation, Beam, Dynamics, NoteHeadKind, Slur, StemKind, Tie,
};
use super::duration::WholeNotes;
use super::ids::{ChordId, GraceNotesGroupId, MeasureId, NoteId, SyllableId, TupletId, VoiceId};
use super::pitch::Pitch;

/// The role a note plays, exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    /// Audible silence, printed
    Rest,
    /// Invisible padding used to align voices
    Skip,
    /// Percussion-style note without a definite pitch
    Unpitched,
    /// Ordinary pitched note on its own
    Standalone,
    /// Member of a double tremolo
    DoubleTremoloMember,
    /// Grace note (no sounding duration of its own)
    Grace,
    /// Member of a chord
    ChordMember,
    /// Grace note inside a chord
    GraceChordMember,
    /// Member of a tuplet
    TupletMember,
    /// Grace note inside a tuplet
    GraceTupletMember,
    /// Unpitched member of a tuplet
    TupletMemberUnpitched,
}

impl NoteKind {
    pub fn is_rest_or_skip(self) -> bool {
        matches!(self, NoteKind::Rest | NoteKind::Skip)
    }

    pub fn is_grace(self) -> bool {
        matches!(
            self,
            NoteKind::Grace | NoteKind::GraceChordMember | NoteKind::GraceTupletMember
        )
    }

    fn wants_pitch(self) -> bool {
        !matches!(
            self,
            NoteKind::Rest | NoteKind::Skip | NoteKind::Unpitched | NoteKind::TupletMemberUnpitched
        )
    }
}

/// The atomic musical event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub input_line_number: u32,
    kind: NoteKind,
    pitch: Option<Pitch>,
    /// How long the note sounds, in whole notes
    sounding_duration: WholeNotes,
    /// How long the note is written (differs inside tuplets)
    display_duration: WholeNotes,
    pub dots: u8,
    pub accidental: Option<AccidentalKind>,
    pub head: NoteHeadKind,
    pub stem: Option<StemKind>,
    /// Invisible notes still occupy time
    pub print_object: bool,
    is_stemless: bool,
    /// Offset from the start of the owning measure
    position_in_measure: WholeNotes,

    beams: Vec<Beam>,
    ties: Vec<Tie>,
    slurs: Vec<Slur>,
    articulations: Vec<Articulation>,
    dynamics: Vec<Dynamics>,
    syllables: Vec<SyllableId>,
    grace_group_before: Option<GraceNotesGroupId>,
    grace_group_after: Option<GraceNotesGroupId>,

    // Non-owning uplinks, each set once at attach time
    measure_uplink: Option<MeasureId>,
    chord_uplink: Option<ChordId>,
    tuplet_uplink: Option<TupletId>,
    grace_group_uplink: Option<GraceNotesGroupId>,
}

impl Note {
    /// Create a note, validating that the kind and pitch agree
    pub fn new(
        input_line_number: u32,
        kind: NoteKind,
        pitch: Option<Pitch>,
        sounding_duration: WholeNotes,
        display_duration: WholeNotes,
        dots: u8,
    ) -> Result<Self, String> {
        if kind.wants_pitch() && pitch.is_none() {
            return Err(format!("{:?} note requires a pitch", kind));
        }
        if kind.is_rest_or_skip() && pitch.is_some() {
            return Err(format!("{:?} note must not carry a pitch", kind));
        }
        Ok(Self {
            input_line_number,
            kind,
            pitch,
            sounding_duration,
            display_duration,
            dots,
            accidental: None,
            head: NoteHeadKind::Normal,
            stem: None,
            print_object: true,
            is_stemless: false,
            position_in_measure: WholeNotes::zero(),
            beams: Vec::new(),
            ties: Vec::new(),
            slurs: Vec::new(),
            articulations: Vec::new(),
            dynamics: Vec::new(),
            syllables: Vec::new(),
            grace_group_before: None,
            grace_group_after: None,
            measure_uplink: None,
            chord_uplink: None,
            tuplet_uplink: None,
            grace_group_uplink: None,
        })
    }

    /// Invisible padding note of the given length
    pub fn padding_skip(input_line_number: u32, duration: WholeNotes) -> Self {
        let mut note = Self::new(
            input_line_number,
            NoteKind::Skip,
            None,
            duration,
            duration,
            0,
        )
        .expect("skip notes carry no pitch");
        note.print_object = false;
        note
    }

    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    pub fn pitch(&self) -> Option<Pitch> {
        self.pitch
    }

    pub fn sounding_duration(&self) -> WholeNotes {
        self.sounding_duration
    }

    pub fn display_duration(&self) -> WholeNotes {
        self.display_duration
    }

    pub fn position_in_measure(&self) -> WholeNotes {
        self.position_in_measure
    }

    pub fn is_stemless(&self) -> bool {
        self.is_stemless
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn ties(&self) -> &[Tie] {
        &self.ties
    }

    pub fn slurs(&self) -> &[Slur] {
        &self.slurs
    }

    pub fn articulations(&self) -> &[Articulation] {
        &self.articulations
    }

    pub fn dynamics(&self) -> &[Dynamics] {
        &self.dynamics
    }

    pub fn syllables(&self) -> &[SyllableId] {
        &self.syllables
    }

    pub fn grace_group_before(&self) -> Option<GraceNotesGroupId> {
        self.grace_group_before
    }

    pub fn grace_group_after(&self) -> Option<GraceNotesGroupId> {
        self.grace_group_after
    }

    pub fn measure_uplink(&self) -> Option<MeasureId> {
        self.measure_uplink
    }

    pub fn chord_uplink(&self) -> Option<ChordId> {
        self.chord_uplink
    }

    pub fn tuplet_uplink(&self) -> Option<TupletId> {
        self.tuplet_uplink
    }

    pub fn grace_group_uplink(&self) -> Option<GraceNotesGroupId> {
        self.grace_group_uplink
    }

    // ------------------------------------------------------------------
    // Narrow mutators with bookkeeping side effects
    // ------------------------------------------------------------------

    /// Rewrite the role of this note. Used by the builder's look-ahead
    /// corrections (standalone -> chord member, standalone -> tuplet
    /// member), never by consumers.
    pub fn set_kind(&mut self, kind: NoteKind) {
        self.kind = kind;
    }

    pub fn set_position_in_measure(&mut self, position: WholeNotes) {
        self.position_in_measure = position;
    }

    pub fn set_display_duration(&mut self, duration: WholeNotes) {
        self.display_duration = duration;
    }

    /// Appending a beam also decides stem handling: a beamed note with a
    /// slash head prints stemless
    pub fn append_beam(&mut self, beam: Beam) {
        self.beams.push(beam);
        if self.head == NoteHeadKind::Slash || self.head == NoteHeadKind::None {
            self.is_stemless = true;
            self.stem = Some(StemKind::None);
        }
    }

    pub fn append_tie(&mut self, tie: Tie) {
        self.ties.push(tie);
    }

    pub fn append_slur(&mut self, slur: Slur) {
        self.slurs.push(slur);
    }

    pub fn append_articulation(&mut self, articulation: Articulation) {
        self.articulations.push(articulation);
    }

    pub fn append_dynamics(&mut self, dynamics: Dynamics) {
        self.dynamics.push(dynamics);
    }

    pub fn append_syllable(&mut self, syllable: SyllableId) {
        self.syllables.push(syllable);
    }

    pub fn set_grace_group_before(&mut self, group: GraceNotesGroupId) {
        debug_assert!(self.grace_group_before.is_none());
        self.grace_group_before = Some(group);
    }

    pub fn set_grace_group_after(&mut self, group: GraceNotesGroupId) {
        debug_assert!(self.grace_group_after.is_none());
        self.grace_group_after = Some(group);
    }

    pub fn set_measure_uplink(&mut self, measure: MeasureId) {
        debug_assert!(self.measure_uplink.is_none() || self.measure_uplink == Some(measure));
        self.measure_uplink = Some(measure);
    }

    pub fn set_chord_uplink(&mut self, chord: ChordId) {
        debug_assert!(self.chord_uplink.is_none());
        self.chord_uplink = Some(chord);
    }

    pub fn set_tuplet_uplink(&mut self, tuplet: TupletId) {
        debug_assert!(self.tuplet_uplink.is_none());
        self.tuplet_uplink = Some(tuplet);
    }

    pub fn set_grace_group_uplink(&mut self, group: GraceNotesGroupId) {
        debug_assert!(self.grace_group_uplink.is_none());
        self.grace_group_uplink = Some(group);
    }

}

/// Where a grace group stands relative to its principal note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraceNotesGroupKind {
    Before,
    After,
}

/// A run of grace notes attached to one principal note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraceNotesGroup {
    pub input_line_number: u32,
    pub kind: GraceNotesGroupKind,
    /// Slashed (acciaccatura) rendering
    pub slash: bool,
    notes: Vec<NoteId>,
    /// The principal note, set when the group closes
    note_uplink: Option<NoteId>,
    voice_uplink: Option<VoiceId>,
}

impl GraceNotesGroup {
    pub fn new(input_line_number: u32, kind: GraceNotesGroupKind, slash: bool) -> Self {
        Self {
            input_line_number,
            kind,
            slash,
            notes: Vec::new(),
            note_uplink: None,
            voice_uplink: None,
        }
    }

    pub fn notes(&self) -> &[NoteId] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note_uplink(&self) -> Option<NoteId> {
        self.note_uplink
    }

    pub fn voice_uplink(&self) -> Option<VoiceId> {
        self.voice_uplink
    }

    pub fn append_note(&mut self, note: NoteId) {
        self.notes.push(note);
    }

    pub fn set_kind(&mut self, kind: GraceNotesGroupKind) {
        self.kind = kind;
    }

    pub fn set_note_uplink(&mut self, note: NoteId) {
        debug_assert!(self.note_uplink.is_none());
        self.note_uplink = Some(note);
    }

    pub fn set_voice_uplink(&mut self, voice: VoiceId) {
        debug_assert!(self.voice_uplink.is_none() || self.voice_uplink == Some(voice));
        self.voice_uplink = Some(voice);
    }

    pub(crate) fn reset_uplinks(&mut self) {
        self.note_uplink = None;
        self.voice_uplink = None;
    }

    pub(crate) fn clear_notes(&mut self) {
        self.notes.clear();
    }
}
