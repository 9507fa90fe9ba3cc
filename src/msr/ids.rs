//! Typed entity ids and per-type arenas
//!
//! Every structural entity of the score lives in a typed arena owned by
//! its `Score`. Children are referenced by ordered lists of ids; uplinks
//! are plain ids too, which makes them non-owning by construction:
//! dropping a `Score` frees everything it owns and there are no reference
//! cycles to break.
//!
//! Ids are `usize` newtypes so that a `NoteId` can never be used to index
//! the measure arena by accident.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Implemented by every entity id newtype
pub trait EntityId: Copy + Eq {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(usize);

        impl EntityId for $name {
            fn from_index(index: usize) -> Self {
                Self(index)
            }

            fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

define_entity_id!(
    /// Id of a part group
    PartGroupId, "partGroup");
define_entity_id!(
    /// Id of a part
    PartId, "part");
define_entity_id!(
    /// Id of a staff
    StaffId, "staff");
define_entity_id!(
    /// Id of a voice
    VoiceId, "voice");
define_entity_id!(
    /// Id of a segment
    SegmentId, "segment");
define_entity_id!(
    /// Id of a measure
    MeasureId, "measure");
define_entity_id!(
    /// Id of a note
    NoteId, "note");
define_entity_id!(
    /// Id of a chord
    ChordId, "chord");
define_entity_id!(
    /// Id of a tuplet
    TupletId, "tuplet");
define_entity_id!(
    /// Id of a grace-notes group
    GraceNotesGroupId, "graceNotesGroup");
define_entity_id!(
    /// Id of a repeat
    RepeatId, "repeat");
define_entity_id!(
    /// Id of a repeat ending
    RepeatEndingId, "repeatEnding");
define_entity_id!(
    /// Id of a multiple rest
    MultipleRestId, "multipleRest");
define_entity_id!(
    /// Id of a measures repeat
    MeasuresRepeatId, "measuresRepeat");
define_entity_id!(
    /// Id of a lyric stanza
    StanzaId, "stanza");
define_entity_id!(
    /// Id of a lyric syllable
    SyllableId, "syllable");

/// Append-only typed storage for one entity kind
///
/// Entities are never deallocated individually; structural removal happens
/// by dropping an id from its owner's child list (backtracking rewrites),
/// and everything is freed together with the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I, T> {
    items: Vec<T>,
    _ids: PhantomData<I>,
}

impl<I: EntityId, T> Arena<I, T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _ids: PhantomData,
        }
    }

    /// Store a new entity and return its id
    pub fn alloc(&mut self, value: T) -> I {
        let id = I::from_index(self.items.len());
        self.items.push(value);
        id
    }

    pub fn get(&self, id: I) -> &T {
        &self.items[id.index()]
    }

    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.index()]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All ids ever allocated, in allocation order
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        (0..self.items.len()).map(I::from_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (I::from_index(index), item))
    }
}

impl<I: EntityId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EntityId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: EntityId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_index() {
        let mut arena: Arena<NoteId, &str> = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_ne!(a, b);
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_ids_iterate_in_allocation_order() {
        let mut arena: Arena<MeasureId, u32> = Arena::new();
        arena.alloc(10);
        arena.alloc(20);
        let ids: Vec<MeasureId> = arena.ids().collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(arena[ids[0]], 10);
        assert_eq!(arena[ids[1]], 20);
    }

    #[test]
    fn test_display_includes_kind_tag() {
        let id = NoteId::from_index(7);
        assert_eq!(id.to_string(), "note#7");
    }
}
