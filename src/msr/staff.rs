//! Staves
//!
//! A staff owns its voices, keyed by voice number, and tracks the clef,
//! key and time most recently seen so defaults propagate to voices and
//! measures created later.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attributes::{Clef, Key, Time};
use super::ids::{PartId, VoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaffKind {
    Regular,
    Tablature,
    Harmony,
    FiguredBass,
    Drum,
    Rhythmic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub input_line_number: u32,
    /// 1-based staff number within the part
    pub number: u32,
    pub kind: StaffKind,
    voices: BTreeMap<u32, VoiceId>,
    current_clef: Option<Clef>,
    current_key: Option<Key>,
    current_time: Option<Time>,
    part_uplink: PartId,
}

impl Staff {
    pub fn new(
        input_line_number: u32,
        number: u32,
        kind: StaffKind,
        part_uplink: PartId,
    ) -> Result<Self, String> {
        if number == 0 {
            return Err("staff number must be positive".to_string());
        }
        Ok(Self {
            input_line_number,
            number,
            kind,
            voices: BTreeMap::new(),
            current_clef: None,
            current_key: None,
            current_time: None,
            part_uplink,
        })
    }

    pub fn voices(&self) -> &BTreeMap<u32, VoiceId> {
        &self.voices
    }

    pub fn voice_by_number(&self, number: u32) -> Option<VoiceId> {
        self.voices.get(&number).copied()
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

    pub fn part_uplink(&self) -> PartId {
        self.part_uplink
    }

    pub fn register_voice(&mut self, number: u32, voice: VoiceId) {
        debug_assert!(!self.voices.contains_key(&number));
        self.voices.insert(number, voice);
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

    pub(crate) fn set_part_uplink(&mut self, part: PartId) {
        self.part_uplink = part;
    }

    pub(crate) fn reset_for_clone(&mut self) {
        self.voices.clear();
    }
}
