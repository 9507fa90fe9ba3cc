//! Part groups
//!
//! A part group owns an ordered run of parts or nested part groups and
//! carries the bracket symbol that spans them. Groups open when the input
//! declares a start marker and close on the matching stop.

use serde::{Deserialize, Serialize};

use super::ids::{PartGroupId, PartId};

/// The bracket drawn across the group's staves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartGroupSymbolKind {
    None,
    Brace,
    Bracket,
    Line,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartGroupElement {
    Part(PartId),
    PartGroup(PartGroupId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartGroup {
    pub input_line_number: u32,
    /// Group number from the input; distinguishes interleaved groups
    pub number: i32,
    pub name: Option<String>,
    pub symbol: PartGroupSymbolKind,
    /// Whether barlines draw through the whole group
    pub barlines_span_group: bool,
    elements: Vec<PartGroupElement>,
    parent_uplink: Option<PartGroupId>,
}

impl PartGroup {
    pub fn new(
        input_line_number: u32,
        number: i32,
        name: Option<String>,
        symbol: PartGroupSymbolKind,
    ) -> Self {
        Self {
            input_line_number,
            number,
            name,
            symbol,
            barlines_span_group: false,
            elements: Vec::new(),
            parent_uplink: None,
        }
    }

    pub fn elements(&self) -> &[PartGroupElement] {
        &self.elements
    }

    pub fn parent_uplink(&self) -> Option<PartGroupId> {
        self.parent_uplink
    }

    pub fn append_part(&mut self, part: PartId) {
        self.elements.push(PartGroupElement::Part(part));
    }

    pub fn append_part_group(&mut self, group: PartGroupId) {
        self.elements.push(PartGroupElement::PartGroup(group));
    }

    pub fn set_parent_uplink(&mut self, parent: PartGroupId) {
        debug_assert!(self.parent_uplink.is_none());
        self.parent_uplink = Some(parent);
    }

    pub(crate) fn reset_for_clone(&mut self) {
        self.elements.clear();
        self.parent_uplink = None;
    }
}
