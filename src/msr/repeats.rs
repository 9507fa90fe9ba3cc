//! Repeats, multiple rests and measures repeats
//!
//! Compact structural representations of repeated material. A repeat owns
//! one common part and an ordered run of endings, each wrapping a segment;
//! multiple rests and measures repeats own a segment holding the pattern
//! plus a replica count.

use serde::{Deserialize, Serialize};

use super::ids::{RepeatEndingId, RepeatId, SegmentId, VoiceId};

/// The repeated material between the repeat barlines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatCommonPart {
    pub input_line_number: u32,
    pub segment: SegmentId,
}

/// Whether an ending needs a closing bracket hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatEndingKind {
    /// Closed bracket: volta with a downward hook at its end
    Hooked,
    /// Open-ended bracket, usually the final ending
    Hookless,
}

/// One alternate ending of a repeat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatEnding {
    pub input_line_number: u32,
    /// The ending numbers as labeled in the input ("1", "1,2", "3")
    pub number: String,
    pub kind: RepeatEndingKind,
    pub segment: SegmentId,
    repeat_uplink: RepeatId,
}

impl RepeatEnding {
    pub fn new(
        input_line_number: u32,
        number: impl Into<String>,
        kind: RepeatEndingKind,
        segment: SegmentId,
        repeat_uplink: RepeatId,
    ) -> Self {
        Self {
            input_line_number,
            number: number.into(),
            kind,
            segment,
            repeat_uplink,
        }
    }

    pub fn repeat_uplink(&self) -> RepeatId {
        self.repeat_uplink
    }
}

/// A repeated passage with optional alternate endings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repeat {
    pub input_line_number: u32,
    /// How many times the common part plays (2 for a plain repeat)
    times: u32,
    common_part: Option<RepeatCommonPart>,
    endings: Vec<RepeatEndingId>,
    voice_uplink: VoiceId,
}

impl Repeat {
    pub fn new(input_line_number: u32, voice_uplink: VoiceId) -> Self {
        Self {
            input_line_number,
            times: 2,
            common_part: None,
            endings: Vec::new(),
            voice_uplink,
        }
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    pub fn common_part(&self) -> Option<&RepeatCommonPart> {
        self.common_part.as_ref()
    }

    pub fn endings(&self) -> &[RepeatEndingId] {
        &self.endings
    }

    pub fn voice_uplink(&self) -> VoiceId {
        self.voice_uplink
    }

    pub fn set_times(&mut self, times: u32) {
        self.times = times.max(1);
    }

    /// Install the common part; set exactly once when the repeat closes
    /// or the first ending begins
    pub fn set_common_part(&mut self, input_line_number: u32, segment: SegmentId) {
        debug_assert!(self.common_part.is_none());
        self.common_part = Some(RepeatCommonPart {
            input_line_number,
            segment,
        });
    }

    pub fn append_ending(&mut self, ending: RepeatEndingId) {
        self.endings.push(ending);
    }

    pub(crate) fn set_voice_uplink(&mut self, voice: VoiceId) {
        self.voice_uplink = voice;
    }

    pub(crate) fn reset_for_clone(&mut self) {
        self.common_part = None;
        self.endings.clear();
    }
}

/// N measures of rest drawn as one compressed block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleRest {
    pub input_line_number: u32,
    /// How many measures the block spans
    pub measure_count: u32,
    /// The consumed rest measures, kept for consumers that unroll
    pub segment: SegmentId,
    voice_uplink: VoiceId,
}

impl MultipleRest {
    pub fn new(
        input_line_number: u32,
        measure_count: u32,
        segment: SegmentId,
        voice_uplink: VoiceId,
    ) -> Result<Self, String> {
        if measure_count == 0 {
            return Err("multiple rest must span at least one measure".to_string());
        }
        Ok(Self {
            input_line_number,
            measure_count,
            segment,
            voice_uplink,
        })
    }

    pub fn voice_uplink(&self) -> VoiceId {
        self.voice_uplink
    }

    pub(crate) fn set_voice_uplink(&mut self, voice: VoiceId) {
        self.voice_uplink = voice;
    }
}

/// "Play these measures again" shorthand: a pattern segment plus how many
/// times the pattern is replicated after its first statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasuresRepeat {
    pub input_line_number: u32,
    /// Measures per pattern statement (1 for the common single-measure
    /// repeat sign)
    pub measures_per_pattern: u32,
    pub pattern_segment: SegmentId,
    replica_count: u32,
    voice_uplink: VoiceId,
}

impl MeasuresRepeat {
    pub fn new(
        input_line_number: u32,
        measures_per_pattern: u32,
        pattern_segment: SegmentId,
        voice_uplink: VoiceId,
    ) -> Result<Self, String> {
        if measures_per_pattern == 0 {
            return Err("measures repeat pattern must span at least one measure".to_string());
        }
        Ok(Self {
            input_line_number,
            measures_per_pattern,
            pattern_segment,
            replica_count: 0,
            voice_uplink,
        })
    }

    pub fn replica_count(&self) -> u32 {
        self.replica_count
    }

    pub fn voice_uplink(&self) -> VoiceId {
        self.voice_uplink
    }

    pub fn add_replica(&mut self) {
        self.replica_count += 1;
    }

    pub(crate) fn set_voice_uplink(&mut self, voice: VoiceId) {
        self.voice_uplink = voice;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::ids::EntityId;

    #[test]
    fn test_repeat_defaults_to_two_times() {
        let repeat = Repeat::new(1, VoiceId::from_index(0));
        assert_eq!(repeat.times(), 2);
        assert!(repeat.common_part().is_none());
        assert!(repeat.endings().is_empty());
    }

    #[test]
    fn test_times_clamped_to_one() {
        let mut repeat = Repeat::new(1, VoiceId::from_index(0));
        repeat.set_times(0);
        assert_eq!(repeat.times(), 1);
    }

    #[test]
    fn test_multiple_rest_validation() {
        assert!(
            MultipleRest::new(1, 0, SegmentId::from_index(0), VoiceId::from_index(0)).is_err()
        );
        assert!(
            MultipleRest::new(1, 4, SegmentId::from_index(0), VoiceId::from_index(0)).is_ok()
        );
    }
}
