//! Document-wide compiler state.

use std::collections::{BTreeMap, HashMap};

use md2docx_docx::TextCell;

/// Counters and cross-reference cells shared by every handler of one compile.
///
/// Counters only ever grow. Registry cells are created on first touch, by a
/// reference or by the caption defining them, and are never removed.
#[derive(Debug, Default)]
pub struct State {
    heading: u32,
    list: u32,
    registry: HashMap<String, TextCell>,
    sequences: BTreeMap<String, u32>,
}

impl State {
    /// Current heading numbering instance.
    #[must_use]
    pub fn heading(&self) -> u32 {
        self.heading
    }

    /// Current list numbering instance.
    #[must_use]
    pub fn list(&self) -> u32 {
        self.list
    }

    pub(crate) fn next_heading(&mut self) -> u32 {
        self.heading += 1;
        self.heading
    }

    pub(crate) fn next_list(&mut self) -> u32 {
        self.list += 1;
        self.list
    }

    /// The display cell of cross-reference `id`, created empty if new.
    pub fn reference(&mut self, id: &str) -> TextCell {
        self.registry.entry(id.to_owned()).or_default().clone()
    }

    /// Advance the caption sequence of `kind` and return its new value.
    pub(crate) fn next_sequence(&mut self, kind: &str) -> u32 {
        let counter = self.sequences.entry(kind.to_owned()).or_default();
        *counter += 1;
        *counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_cells_are_shared() {
        let mut state = State::default();

        let early = state.reference("fig-1");
        state.reference("fig-1").set("图 1");

        assert_eq!(early.get(), "图 1");
        assert!(state.reference("fig-1").same(&early));
        assert_eq!(state.reference("missing").get(), "");
    }

    #[test]
    fn test_sequences_are_per_kind() {
        let mut state = State::default();

        assert_eq!(state.next_sequence("Figure"), 1);
        assert_eq!(state.next_sequence("Table"), 1);
        assert_eq!(state.next_sequence("Figure"), 2);
    }
}
