//! Parts
//!
//! A part owns its staves, keyed by staff number, and carries the
//! clef/key/time/transpose "as last seen" so new staves and measures
//! inherit sensible defaults. It also tracks the measure-length high
//! tide: the longest measure seen across all its voices, used by later
//! padding logic to equalize voices encoded at different resolutions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attributes::{Clef, Key, Time, Transpose};
use super::duration::WholeNotes;
use super::ids::{PartGroupId, StaffId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub input_line_number: u32,
    /// Stable part id from the input ("P1", "P2", ...)
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    staves: BTreeMap<u32, StaffId>,
    current_clef: Option<Clef>,
    current_key: Option<Key>,
    current_time: Option<Time>,
    current_transpose: Option<Transpose>,
    /// Divisions per quarter note currently in force for this part
    current_divisions: Option<i64>,
    /// Longest measure length seen across the whole part
    measure_length_high_tide: WholeNotes,
    part_group_uplink: PartGroupId,
}

impl Part {
    pub fn new(
        input_line_number: u32,
        id: impl Into<String>,
        name: impl Into<String>,
        part_group_uplink: PartGroupId,
    ) -> Self {
        Self {
            input_line_number,
            id: id.into(),
            name: name.into(),
            abbreviation: None,
            staves: BTreeMap::new(),
            current_clef: None,
            current_key: None,
            current_time: None,
            current_transpose: None,
            current_divisions: None,
            measure_length_high_tide: WholeNotes::zero(),
            part_group_uplink,
        }
    }

    pub fn staves(&self) -> &BTreeMap<u32, StaffId> {
        &self.staves
    }

    pub fn staff_by_number(&self, number: u32) -> Option<StaffId> {
        self.staves.get(&number).copied()
    }

    pub fn current_clef(&self) -> Option<Clef> {
        self.current_clef
    }

    pub fn current_key(&self) -> Option<Key> {
        self.current_key
    }

    pub fn current_time(&self) -> Option<Time> {
        self.current_time
    }

    pub fn current_transpose(&self) -> Option<Transpose> {
        self.current_transpose
    }

    pub fn current_divisions(&self) -> Option<i64> {
        self.current_divisions
    }

    pub fn measure_length_high_tide(&self) -> WholeNotes {
        self.measure_length_high_tide
    }

    pub fn part_group_uplink(&self) -> PartGroupId {
        self.part_group_uplink
    }

    pub fn register_staff(&mut self, number: u32, staff: StaffId) {
        debug_assert!(!self.staves.contains_key(&number));
        self.staves.insert(number, staff);
    }

    pub fn set_current_clef(&mut self, clef: Clef) {
        self.current_clef = Some(clef);
    }

    pub fn set_current_key(&mut self, key: Key) {
        self.current_key = Some(key);
    }

    pub fn set_current_time(&mut self, time: Time) {
        self.current_time = Some(time);
    }

    pub fn set_current_transpose(&mut self, transpose: Transpose) {
        self.current_transpose = Some(transpose);
    }

    pub fn set_current_divisions(&mut self, divisions: i64) {
        debug_assert!(divisions > 0);
        self.current_divisions = Some(divisions);
    }

    /// Raise the high tide if this measure length exceeds it
    pub fn account_measure_length(&mut self, length: WholeNotes) {
        if length > self.measure_length_high_tide {
            self.measure_length_high_tide = length;
        }
    }

    pub(crate) fn set_part_group_uplink(&mut self, part_group: PartGroupId) {
        self.part_group_uplink = part_group;
    }

    pub(crate) fn reset_for_clone(&mut self) {
        self.staves.clear();
        self.measure_length_high_tide = WholeNotes::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::ids::EntityId;

    #[test]
    fn test_high_tide_only_rises() {
        let mut part = Part::new(1, "P1", "Flute", PartGroupId::from_index(0));
        part.account_measure_length(WholeNotes::new(1, 1));
        part.account_measure_length(WholeNotes::new(3, 4));
        assert_eq!(part.measure_length_high_tide(), WholeNotes::new(1, 1));
        part.account_measure_length(WholeNotes::new(5, 4));
        assert_eq!(part.measure_length_high_tide(), WholeNotes::new(5, 4));
    }

    #[test]
    fn test_staff_registry() {
        let mut part = Part::new(1, "P1", "Piano", PartGroupId::from_index(0));
        part.register_staff(1, StaffId::from_index(0));
        part.register_staff(2, StaffId::from_index(1));
        assert_eq!(part.staff_by_number(2), Some(StaffId::from_index(1)));
        assert_eq!(part.staff_by_number(3), None);
    }
}
