//! Resolved translation settings
//!
//! The option/help framework is an external collaborator: it hands the core
//! a fully resolved, immutable bundle of settings before translation
//! starts. The builder and finalization passes read these flags; nothing in
//! this crate parses command lines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::BuildError;

/// Configuration options consumed by the incremental builder and the
/// finalization pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Collapse runs of two or more consecutive full-measure rests into a
    /// multiple-rest entity at voice finalization, even when the input did
    /// not declare one
    pub compress_full_measure_rests: bool,

    /// Merge adjacent rests of equal visibility within a measure
    pub merge_rests: bool,

    /// Record a synthetic forward repeat barline before the voice's first
    /// segment when a backward repeat has no matching forward mark
    pub create_implicit_initial_repeat_barline: bool,

    /// Part ids to drop entirely; events for these parts are discarded
    pub omit_part_ids: Vec<String>,

    /// If non-empty, only these part ids are kept
    pub keep_part_ids: Vec<String>,

    /// Part id -> replacement part name
    pub rename_parts: BTreeMap<String, String>,

    /// Insert a cloned skip grace-notes-group into sibling voices when a
    /// grace group is attached. Works around a layout limitation of one
    /// output backend; not universal score semantics.
    pub add_skip_grace_notes_to_sibling_voices: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compress_full_measure_rests: false,
            merge_rests: false,
            create_implicit_initial_repeat_barline: false,
            omit_part_ids: Vec::new(),
            keep_part_ids: Vec::new(),
            rename_parts: BTreeMap::new(),
            add_skip_grace_notes_to_sibling_voices: false,
        }
    }
}

impl Settings {
    /// Check the settings for internal contradictions.
    ///
    /// Omit and keep filters are mutually exclusive, and a part id listed
    /// twice in either filter is a data-validity error.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.omit_part_ids.is_empty() && !self.keep_part_ids.is_empty() {
            return Err(BuildError::ConflictingPartFilters);
        }
        for (ids, filter) in [
            (&self.omit_part_ids, "omit-part"),
            (&self.keep_part_ids, "keep-part"),
        ] {
            let mut seen = std::collections::BTreeSet::new();
            for id in ids {
                if !seen.insert(id.as_str()) {
                    return Err(BuildError::DuplicatePartFilter {
                        id: id.clone(),
                        filter,
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether a part with this id should be materialized at all
    pub fn keeps_part(&self, part_id: &str) -> bool {
        if self.omit_part_ids.iter().any(|id| id == part_id) {
            return false;
        }
        if !self.keep_part_ids.is_empty() {
            return self.keep_part_ids.iter().any(|id| id == part_id);
        }
        true
    }

    /// The display name to use for a part, honoring renames
    pub fn part_name<'a>(&'a self, part_id: &str, given: &'a str) -> &'a str {
        match self.rename_parts.get(part_id) {
            Some(renamed) => renamed.as_str(),
            None => given,
        }
    }
}
