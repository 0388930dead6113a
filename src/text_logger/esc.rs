// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portable escape sequences.
//!
//! Log text may carry three-character sequences starting with `\x1B` to request colours,
//! styles and tab stops. Backends decide what to do with them: plain text backends drop them,
//! the console backend can translate them to ANSI codes with [`to_ansi`].
//!
//! ```
//! use loxlog::text_logger::esc;
//! let colored = format!("{}alert{}", esc::RED, esc::FG_RESET);
//! assert_eq!(esc::to_ansi(esc::RED), Some("\x1B[31m"));
//! assert_eq!(colored.len(), 11);
//! ```

pub const RED: &str = "\x1Bc0";
pub const GREEN: &str = "\x1Bc1";
pub const YELLOW: &str = "\x1Bc2";
pub const BLUE: &str = "\x1Bc3";
pub const MAGENTA: &str = "\x1Bc4";
pub const CYAN: &str = "\x1Bc5";
pub const BLACK: &str = "\x1Bc6";
pub const WHITE: &str = "\x1Bc7";
pub const GRAY: &str = "\x1Bc8";
pub const FG_RESET: &str = "\x1Bc9";

pub const BG_RED: &str = "\x1BC0";
pub const BG_GREEN: &str = "\x1BC1";
pub const BG_YELLOW: &str = "\x1BC2";
pub const BG_BLUE: &str = "\x1BC3";
pub const BG_MAGENTA: &str = "\x1BC4";
pub const BG_CYAN: &str = "\x1BC5";
pub const BG_BLACK: &str = "\x1BC6";
pub const BG_WHITE: &str = "\x1BC7";
pub const BG_GRAY: &str = "\x1BC8";
pub const BG_RESET: &str = "\x1BC9";

pub const BOLD: &str = "\x1BsB";
pub const ITALICS: &str = "\x1BsI";
pub const STYLE_RESET: &str = "\x1Bsr";
/// Resets colours and styles.
pub const RESET: &str = "\x1Bsa";

pub const URL_START: &str = "\x1BlS";
pub const URL_END: &str = "\x1BlE";

/// Tab to the next auto-sized tab stop. The third character encodes extra space
/// (`0`-`9`, then `A` for 10 and so on).
pub const TAB: &str = "\x1Bt0";
/// End of meta-information. Behaves like [`TAB`].
pub const EOMETA: &str = "\x1BA0";

/// The escape character itself.
pub const ESC: char = '\x1B';

/// ANSI code for one of the colour and style sequences above.
///
/// Tab sequences are not handled here and URL markers have no ANSI form; both give `None`.
pub fn to_ansi(sequence: &str) -> Option<&'static str> {
    let mut chars = sequence.chars();
    if chars.next() != Some(ESC) {
        return None;
    }
    let kind = chars.next()?;
    let code = chars.next()?;
    let ansi = match (kind, code) {
        ('c', '0') => "\x1B[31m",
        ('c', '1') => "\x1B[32m",
        ('c', '2') => "\x1B[33m",
        ('c', '3') => "\x1B[34m",
        ('c', '4') => "\x1B[35m",
        ('c', '5') => "\x1B[36m",
        ('c', '6') => "\x1B[30m",
        ('c', '7') => "\x1B[38;5;15m",
        ('c', '8') => "\x1B[38;5;240m",
        ('c', '9') => "\x1B[39m",
        ('C', '0') => "\x1B[41m",
        ('C', '1') => "\x1B[42m",
        ('C', '2') => "\x1B[43m",
        ('C', '3') => "\x1B[44m",
        ('C', '4') => "\x1B[45m",
        ('C', '5') => "\x1B[46m",
        ('C', '6') => "\x1B[40m",
        ('C', '7') => "\x1B[48;5;15m",
        ('C', '8') => "\x1B[48;5;240m",
        ('C', '9') => "\x1B[49m",
        ('s', 'B') => "\x1B[1m",
        ('s', 'I') => "\x1B[3m",
        ('s', 'r') | ('s', 'a') => "\x1B[0m",
        _ => return None,
    };
    Some(ansi)
}

/// Decodes the extra-space character of a tab sequence.
pub(crate) fn extra_space(c: char) -> usize {
    match c {
        '0'..='9' => c as usize - '0' as usize,
        'A'.. => c as usize - 'A' as usize + 10,
        _ => 0,
    }
}
