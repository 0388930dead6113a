// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a list of logables into message text.
//!
//! String logables are format patterns. A pattern consumes one following logable per
//! placeholder; logables that no pattern consumes are appended unchanged. Placeholders have
//! the form `{[!CONV][:[ALIGN][WIDTH]]}`:
//!
//! - `CONV` is `UP` (upper case) or `LO` (lower case),
//! - `ALIGN` is `<`, `>` or `^`, defaulting to `<`,
//! - `WIDTH` is a minimum width in characters.
//!
//! `{{` and `}}` produce literal braces. Problems never abort a log statement; they are
//! rendered inline as `{ERR: ...}`.
//!
//! ```
//! use loxlog::format::format_logables;
//! let mut out = String::new();
//! format_logables(&[&"123{:^8}456--abc{!UP}efg", &"Test", &"lower"], &mut out);
//! assert_eq!(out, "123  Test  456--abcLOWERefg");
//! ```

use crate::logable::Logable;

/// Appends the rendering of `logables` to `target`.
pub fn format_logables(logables: &[&dyn Logable], target: &mut String) {
    let mut next = 0;
    while next < logables.len() {
        let logable = logables[next];
        next += 1;
        match logable.format_pattern() {
            Some(pattern) if pattern.contains(['{', '}']) => {
                next += apply_pattern(pattern, &logables[next..], target);
            }
            _ => logable.log_to(target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    None,
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    conversion: Conversion,
    align: Align,
    width: usize,
}

fn parse_placeholder(spec: &str) -> Result<Placeholder, String> {
    let (conversion_part, format_part) = match spec.find(':') {
        Some(idx) => (&spec[..idx], Some(&spec[idx + 1..])),
        None => (spec, None),
    };
    let conversion = match conversion_part.strip_prefix('!') {
        None if conversion_part.is_empty() => Conversion::None,
        None => return Err(format!("unsupported placeholder '{{{}}}'", spec)),
        Some(c) if c.eq_ignore_ascii_case("UP") => Conversion::Upper,
        Some(c) if c.eq_ignore_ascii_case("LO") => Conversion::Lower,
        Some(c) => return Err(format!("unknown conversion '!{}'", c)),
    };
    let mut placeholder = Placeholder {
        conversion,
        align: Align::Left,
        width: 0,
    };
    if let Some(mut format) = format_part {
        if let Some(rest) = format.strip_prefix('<') {
            format = rest;
        } else if let Some(rest) = format.strip_prefix('>') {
            placeholder.align = Align::Right;
            format = rest;
        } else if let Some(rest) = format.strip_prefix('^') {
            placeholder.align = Align::Center;
            format = rest;
        }
        if !format.is_empty() {
            placeholder.width = format
                .parse()
                .map_err(|_| format!("illegal width '{}'", format))?;
        }
    }
    Ok(placeholder)
}

fn write_field(target: &mut String, value: &str, placeholder: Placeholder) {
    let converted;
    let value = match placeholder.conversion {
        Conversion::None => value,
        Conversion::Upper => {
            converted = value.to_uppercase();
            &converted
        }
        Conversion::Lower => {
            converted = value.to_lowercase();
            &converted
        }
    };
    let len = value.chars().count();
    let pad = placeholder.width.saturating_sub(len);
    let (left, right) = match placeholder.align {
        Align::Left => (0, pad),
        Align::Right => (pad, 0),
        Align::Center => (pad / 2, pad - pad / 2),
    };
    target.extend(std::iter::repeat_n(' ', left));
    target.push_str(value);
    target.extend(std::iter::repeat_n(' ', right));
}

/// Applies one pattern, returning how many of `args` it consumed.
fn apply_pattern(pattern: &str, args: &[&dyn Logable], target: &mut String) -> usize {
    let mut consumed = 0;
    let mut rest = pattern;
    while let Some(idx) = rest.find(['{', '}']) {
        target.push_str(&rest[..idx]);
        let brace = rest.as_bytes()[idx];
        let after = &rest[idx + 1..];
        if brace == b'}' {
            target.push('}');
            rest = after.strip_prefix('}').unwrap_or(after);
            continue;
        }
        if let Some(escaped) = after.strip_prefix('{') {
            target.push('{');
            rest = escaped;
            continue;
        }
        let Some(close) = after.find('}') else {
            target.push_str("{ERR: unclosed placeholder}");
            return consumed;
        };
        let spec = &after[..close];
        rest = &after[close + 1..];
        match parse_placeholder(spec) {
            Ok(placeholder) => match args.get(consumed) {
                Some(arg) => {
                    consumed += 1;
                    let mut value = String::new();
                    arg.log_to(&mut value);
                    write_field(target, &value, placeholder);
                }
                None => target.push_str("{ERR: missing argument}"),
            },
            Err(reason) => {
                target.push_str("{ERR: ");
                target.push_str(&reason);
                target.push('}');
            }
        }
    }
    target.push_str(rest);
    consumed
}
