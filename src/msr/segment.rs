//! Segments
//!
//! A segment is a contiguous run of measures within a voice, and the unit
//! wrapped or duplicated at repeat boundaries: when a repeat closes, the
//! material straddling the boundary is the trailing segment, which moves
//! whole into the repeat's common part or ending.

use serde::{Deserialize, Serialize};

use super::ids::{MeasureId, VoiceId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub input_line_number: u32,
    /// Creation order within the voice, for diagnostics
    pub ordinal: usize,
    measures: Vec<MeasureId>,
    voice_uplink: VoiceId,
}

impl Segment {
    pub fn new(input_line_number: u32, ordinal: usize, voice_uplink: VoiceId) -> Self {
        Self {
            input_line_number,
            ordinal,
            measures: Vec::new(),
            voice_uplink,
        }
    }

    pub fn measures(&self) -> &[MeasureId] {
        &self.measures
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn last_measure(&self) -> Option<MeasureId> {
        self.measures.last().copied()
    }

    pub fn voice_uplink(&self) -> VoiceId {
        self.voice_uplink
    }

    pub fn append_measure(&mut self, measure: MeasureId) {
        self.measures.push(measure);
    }

    /// Remove the trailing `count` measures, in original order. Used when
    /// consumed measures collapse into a multiple rest or a measures
    /// repeat pattern.
    pub fn remove_trailing_measures(&mut self, count: usize) -> Vec<MeasureId> {
        let keep = self.measures.len().saturating_sub(count);
        self.measures.split_off(keep)
    }

    pub(crate) fn clear_measures(&mut self) {
        self.measures.clear();
    }
}
