//! Lyrics: stanzas and syllables
//!
//! Syllable kinds drive hyphenation and alignment in the target format;
//! the syllable itself uplinks to the note it is sung on.

use serde::{Deserialize, Serialize};

use super::ids::{NoteId, StanzaId, SyllableId, VoiceId};

/// How a syllable relates to its word and its measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyllableKind {
    /// A complete word on one note
    Single,
    /// First syllable of a word (hyphen follows)
    Begin,
    /// Interior syllable (hyphens both sides)
    Middle,
    /// Last syllable of a word
    End,
    /// No syllable on this note
    Skip,
    /// Marks the end of a measure in the stanza flow
    MeasureEnd,
    /// Forces a line break in the rendered lyrics
    LineBreak,
    /// Forces a page break in the rendered lyrics
    PageBreak,
}

/// One sung syllable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Syllable {
    pub input_line_number: u32,
    pub kind: SyllableKind,
    /// Text chunks; more than one when elided ("se~al")
    texts: Vec<String>,
    pub elision: bool,
    stanza_uplink: StanzaId,
    note_uplink: Option<NoteId>,
}

impl Syllable {
    pub fn new(
        input_line_number: u32,
        kind: SyllableKind,
        texts: Vec<String>,
        elision: bool,
        stanza_uplink: StanzaId,
    ) -> Self {
        Self {
            input_line_number,
            kind,
            texts,
            elision,
            stanza_uplink,
            note_uplink: None,
        }
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn stanza_uplink(&self) -> StanzaId {
        self.stanza_uplink
    }

    pub fn note_uplink(&self) -> Option<NoteId> {
        self.note_uplink
    }

    pub fn set_note_uplink(&mut self, note: NoteId) {
        debug_assert!(self.note_uplink.is_none());
        self.note_uplink = Some(note);
    }

    pub(crate) fn reset_uplinks(&mut self) {
        self.note_uplink = None;
    }

    pub(crate) fn set_stanza_uplink(&mut self, stanza: StanzaId) {
        self.stanza_uplink = stanza;
    }
}

/// One verse of lyrics within a voice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stanza {
    pub input_line_number: u32,
    /// Stanza number as declared by the input, 1-based
    pub number: u32,
    pub name: String,
    syllables: Vec<SyllableId>,
    voice_uplink: VoiceId,
}

impl Stanza {
    pub fn new(
        input_line_number: u32,
        number: u32,
        name: impl Into<String>,
        voice_uplink: VoiceId,
    ) -> Result<Self, String> {
        if number == 0 {
            return Err("stanza number must be positive".to_string());
        }
        Ok(Self {
            input_line_number,
            number,
            name: name.into(),
            syllables: Vec::new(),
            voice_uplink,
        })
    }

    pub fn syllables(&self) -> &[SyllableId] {
        &self.syllables
    }

    pub fn voice_uplink(&self) -> VoiceId {
        self.voice_uplink
    }

    pub fn append_syllable(&mut self, syllable: SyllableId) {
        self.syllables.push(syllable);
    }

    pub(crate) fn set_voice_uplink(&mut self, voice: VoiceId) {
        self.voice_uplink = voice;
    }

    pub(crate) fn clear_syllables(&mut self) {
        self.syllables.clear();
    }
}
