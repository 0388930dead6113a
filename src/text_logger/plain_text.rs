// SPDX-License-Identifier: MIT OR Apache-2.0

//! The line writer interface and the escape scan feeding it.
//!
//! A [`TextLogger`](super::TextLogger) produces finished lines that may still contain escape
//! sequences (see [`esc`](super::esc)). [`write_line`] walks such a line, resolves tab
//! sequences into spaces using the logger's [`AutoSizes`], and hands the remaining pieces to a
//! [`TextWriter`].

use super::auto_sizes::{AutoSizeKind, AutoSizes};
use super::esc::{self, ESC};
use crate::verbosity::Verbosity;

/// Whether a line is the first or last of a multi-line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    End,
}

/// A text backend.
///
/// Methods returning `bool` return `false` to abandon the rest of the current line.
pub trait TextWriter: Send {
    /// Called before the lines of a statement are written, under the same lock.
    fn begin_record(&mut self, _verbosity: Verbosity) {}

    /// Writes plain text.
    fn write_text(&mut self, text: &str) -> bool;

    /// Receives a colour or style sequence. Only called if [`TextWriter::prune_escapes`]
    /// returns `false`.
    fn write_escape(&mut self, sequence: &str) -> bool {
        self.write_text(sequence)
    }

    /// Whether colour and style sequences are dropped before reaching the writer.
    fn prune_escapes(&self) -> bool {
        true
    }

    /// Completes a line.
    fn end_line(&mut self);

    /// Brackets the lines of a multi-line message.
    fn notify_multi_line(&mut self, _phase: Phase) {}

    fn flush(&mut self) {}
}

const SPACES: &str = "                                ";

fn write_spaces<W: TextWriter + ?Sized>(writer: &mut W, mut count: usize) -> bool {
    while count > 0 {
        let chunk = count.min(SPACES.len());
        if !writer.write_text(&SPACES[..chunk]) {
            return false;
        }
        count -= chunk;
    }
    true
}

/// Writes one line through the escape scan and ends it.
///
/// Returns `false` if the writer stopped early, in which case the line is not ended.
pub fn write_line<W: TextWriter + ?Sized>(
    line: &str,
    auto_sizes: &mut AutoSizes,
    writer: &mut W,
) -> bool {
    let prune = writer.prune_escapes();
    let mut column = 0usize;
    let mut rest = line;
    while !rest.is_empty() {
        let Some(idx) = rest.find(ESC) else {
            if !writer.write_text(rest) {
                return false;
            }
            break;
        };
        if idx > 0 {
            let span = &rest[..idx];
            if !writer.write_text(span) {
                return false;
            }
            column += span.chars().count();
        }
        let mut chars = rest[idx..].char_indices().skip(1);
        let (Some((_, kind)), Some((last, code))) = (chars.next(), chars.next()) else {
            // truncated sequence at the end of the line
            #[cfg(any(debug_assertions, feature = "loxlog_internal"))]
            eprintln!("loxlog: truncated escape sequence in {:?}", line);
            break;
        };
        let end = idx + last + code.len_utf8();
        match kind {
            't' | 'A' => {
                let extra = esc::extra_space(code);
                let tab = auto_sizes.next(AutoSizeKind::Tabstop, column, extra);
                if tab > column {
                    if !write_spaces(writer, tab - column) {
                        return false;
                    }
                    column = tab;
                }
            }
            _ => {
                if !prune && !writer.write_escape(&rest[idx..end]) {
                    return false;
                }
            }
        }
        rest = &rest[end..];
    }
    writer.end_line();
    true
}
