// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column tracking for aligned output.
//!
//! Each log line walks through the same sequence of tab stops and fields (meta-information
//! tokens such as `%D`, `%A3`, escape tabs in the message). [`AutoSizes`] remembers, per
//! position in that sequence, the widest value seen so far, so that consecutive lines line up.
//! Widths only grow until [`AutoSizes::reset`] is called.

/// Kind of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSizeKind {
    /// An absolute column to tab to.
    Tabstop,
    /// The width of a field.
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AutoSizes {
    entries: Vec<(AutoSizeKind, usize)>,
    index: usize,
}

impl AutoSizes {
    /// Starts a new line. Widths are kept.
    pub fn restart(&mut self) {
        self.index = 0;
    }

    /// Forgets all widths.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.index = 0;
    }

    /// Position in the current line's sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Rewinds to a position previously obtained from [`AutoSizes::index`].
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Returns the size of the next entry, growing it to `requested + extra` when `requested`
    /// does not fit. An entry that was stored with another kind starts over.
    pub fn next(&mut self, kind: AutoSizeKind, requested: usize, extra: usize) -> usize {
        let grown = requested + extra;
        let size = match self.entries.get_mut(self.index) {
            None => {
                self.entries.push((kind, grown));
                grown
            }
            Some(entry) if entry.0 != kind => {
                *entry = (kind, grown);
                grown
            }
            Some(entry) => {
                if entry.1 < requested {
                    entry.1 = grown;
                }
                entry.1
            }
        };
        self.index += 1;
        size
    }
}
