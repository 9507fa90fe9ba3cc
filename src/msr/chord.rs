//! Chords
//!
//! A chord owns the vector of its member notes. It comes into existence
//! retroactively: the builder appends notes standalone and converts the
//! previous one into the first chord member when the next input note
//! declares itself chordal. Member notes keep their own display durations
//! but share the chord's single sounding duration.

use serde::{Deserialize, Serialize};

use super::attributes::{Articulation, Dynamics, Slur, Tie};
use super::duration::WholeNotes;
use super::ids::{MeasureId, NoteId, TupletId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chord {
    pub input_line_number: u32,
    member_notes: Vec<NoteId>,
    /// One sounding duration shared by all members
    sounding_duration: WholeNotes,
    position_in_measure: WholeNotes,

    // Decorations shared by the whole chord
    articulations: Vec<Articulation>,
    dynamics: Vec<Dynamics>,
    ties: Vec<Tie>,
    slurs: Vec<Slur>,

    measure_uplink: Option<MeasureId>,
    tuplet_uplink: Option<TupletId>,
}

impl Chord {
    pub fn new(input_line_number: u32, sounding_duration: WholeNotes) -> Self {
        Self {
            input_line_number,
            member_notes: Vec::new(),
            sounding_duration,
            position_in_measure: WholeNotes::zero(),
            articulations: Vec::new(),
            dynamics: Vec::new(),
            ties: Vec::new(),
            slurs: Vec::new(),
            measure_uplink: None,
            tuplet_uplink: None,
        }
    }

    pub fn member_notes(&self) -> &[NoteId] {
        &self.member_notes
    }

    pub fn sounding_duration(&self) -> WholeNotes {
        self.sounding_duration
    }

    pub fn position_in_measure(&self) -> WholeNotes {
        self.position_in_measure
    }

    pub fn articulations(&self) -> &[Articulation] {
        &self.articulations
    }

    pub fn dynamics(&self) -> &[Dynamics] {
        &self.dynamics
    }

    pub fn ties(&self) -> &[Tie] {
        &self.ties
    }

    pub fn slurs(&self) -> &[Slur] {
        &self.slurs
    }

    pub fn measure_uplink(&self) -> Option<MeasureId> {
        self.measure_uplink
    }

    pub fn tuplet_uplink(&self) -> Option<TupletId> {
        self.tuplet_uplink
    }

    pub fn append_member_note(&mut self, note: NoteId) {
        self.member_notes.push(note);
    }

    pub fn append_articulation(&mut self, articulation: Articulation) {
        self.articulations.push(articulation);
    }

    pub fn append_dynamics(&mut self, dynamics: Dynamics) {
        self.dynamics.push(dynamics);
    }

    pub fn append_tie(&mut self, tie: Tie) {
        self.ties.push(tie);
    }

    pub fn append_slur(&mut self, slur: Slur) {
        self.slurs.push(slur);
    }

    pub fn set_position_in_measure(&mut self, position: WholeNotes) {
        self.position_in_measure = position;
    }

    pub fn set_measure_uplink(&mut self, measure: MeasureId) {
        debug_assert!(self.measure_uplink.is_none() || self.measure_uplink == Some(measure));
        self.measure_uplink = Some(measure);
    }

    pub fn set_tuplet_uplink(&mut self, tuplet: TupletId) {
        debug_assert!(self.tuplet_uplink.is_none());
        self.tuplet_uplink = Some(tuplet);
    }

    pub(crate) fn reset_uplinks(&mut self) {
        self.measure_uplink = None;
        self.tuplet_uplink = None;
    }

    pub(crate) fn clear_member_notes(&mut self) {
        self.member_notes.clear();
    }
}
