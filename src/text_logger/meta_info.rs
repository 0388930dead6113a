// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meta-information: the decoration a text logger writes in front of each message.
//!
//! See the [token table](super#meta-information).

use super::TextLoggerConfig;
use super::auto_sizes::{AutoSizeKind, AutoSizes};
use crate::log_record::LogRecord;
use crate::sys::{Duration, Instant};
use crate::verbosity::Verbosity;
use std::fmt::Write;
use std::sync::OnceLock;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Format of the date written by `%TD` when [`TextLoggerConfig::date_format`] is the default.
pub const DEFAULT_DATE_FORMAT: &str = "[year]-[month]-[day]";
/// Format of the time written by `%TT` when [`TextLoggerConfig::time_of_day_format`] is the default.
pub const DEFAULT_TIME_OF_DAY_FORMAT: &str = "[hour]:[minute]:[second]";

const DATE_ITEMS: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_ITEMS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// Units and thresholds of `%TL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDiffFormat {
    /// Differences below this many nanoseconds are written as [`TimeDiffFormat::none`].
    pub minimum: u64,
    pub none: String,
    pub nanos: String,
    pub micros: String,
    pub millis: String,
    pub secs: String,
    pub mins: String,
    pub hours: String,
    pub days: String,
}

impl Default for TimeDiffFormat {
    fn default() -> Self {
        TimeDiffFormat {
            minimum: 1000,
            none: "---   ".to_string(),
            nanos: " ns".to_string(),
            micros: " \u{00B5}s".to_string(),
            millis: " ms".to_string(),
            secs: " s".to_string(),
            mins: " m".to_string(),
            hours: " h".to_string(),
            days: " days".to_string(),
        }
    }
}

/// Writes a duration in a fixed-width, human readable form.
///
/// The magnitude always fits four characters (`999`, `9.99`, `99.9`) until days are reached,
/// escalating to the next unit when rounding would overflow the field.
///
/// ```
/// use loxlog::text_logger::{write_time_diff, TimeDiffFormat};
/// let format = TimeDiffFormat { minimum: 0, ..TimeDiffFormat::default() };
/// let mut out = String::new();
/// write_time_diff(&mut out, 9_995_000_000, &format);
/// assert_eq!(out, "10.0 s");
/// ```
pub fn write_time_diff(dest: &mut String, diff_nanos: u64, format: &TimeDiffFormat) {
    if diff_nanos < format.minimum {
        dest.push_str(&format.none);
        return;
    }
    if diff_nanos < 1000 {
        let _ = write!(dest, "{:03}{}", diff_nanos, format.nanos);
        return;
    }

    let micros = diff_nanos / 1000;
    if micros < 1000 {
        let _ = write!(dest, "{:03}{}", micros, format.micros);
        return;
    }
    if micros < 1_000_000 {
        let _ = write!(dest, "{:03}{}", micros / 1000, format.millis);
        return;
    }

    // below 10 seconds after rounding: x.xx
    if micros < 9_995_000 {
        let hundredth_secs = ((micros / 1000) + 5) / 10;
        write_two_decimals(dest, hundredth_secs, &format.secs);
        return;
    }

    let tenth_secs = ((micros / 10_000) + 5) / 10;
    if tenth_secs < 1000 {
        write_one_decimal(dest, tenth_secs, &format.secs);
        return;
    }
    if tenth_secs < 6000 {
        write_two_decimals(dest, tenth_secs / 6, &format.mins);
        return;
    }

    let tenth_mins = tenth_secs / 60;
    if tenth_mins < 1000 {
        write_one_decimal(dest, tenth_mins, &format.mins);
        return;
    }
    if tenth_mins < 6000 {
        write_two_decimals(dest, tenth_mins / 6, &format.hours);
        return;
    }

    let tenth_hours = tenth_mins / 60;
    if tenth_hours < 1000 {
        write_one_decimal(dest, tenth_hours, &format.hours);
        return;
    }

    let hundredth_days = tenth_hours * 10 / 24;
    if hundredth_days < 1000 {
        write_two_decimals(dest, hundredth_days, &format.days);
        return;
    }
    let _ = write!(
        dest,
        "{:02}.{}{}",
        hundredth_days / 100,
        (hundredth_days / 10) % 10,
        format.days
    );
}

fn write_two_decimals(dest: &mut String, hundredths: u64, unit: &str) {
    let _ = write!(dest, "{}.{:02}{}", hundredths / 100, hundredths % 100, unit);
}

fn write_one_decimal(dest: &mut String, tenths: u64, unit: &str) {
    let _ = write!(dest, "{:02}.{}{}", tenths / 10, tenths % 10, unit);
}

fn process_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_default()
    })
}

/// Everything the meta-information of one line depends on.
pub(crate) struct MetaInfo<'a, 'r> {
    pub(crate) record: &'a LogRecord<'r>,
    pub(crate) logger_name: &'a str,
    pub(crate) log_number: usize,
    pub(crate) time_of_creation: Instant,
    pub(crate) time_of_last_log: Instant,
    pub(crate) config: &'a TextLoggerConfig,
}

impl MetaInfo<'_, '_> {
    /// Appends the meta-information to `dest`.
    pub(crate) fn write(&self, dest: &mut String, auto_sizes: &mut AutoSizes) {
        let mut date_time: Option<OffsetDateTime> = None;
        let mut rest = self.config.format.as_str();
        while let Some(idx) = rest.find('%') {
            dest.push_str(&rest[..idx]);
            rest = &rest[idx + 1..];
            rest = self.write_token(rest, dest, auto_sizes, &mut date_time);
        }
        dest.push_str(rest);
    }

    fn local_time(&self, cache: &mut Option<OffsetDateTime>) -> OffsetDateTime {
        *cache.get_or_insert_with(|| {
            let since_epoch = self
                .record
                .scope()
                .system_time()
                .duration_since(crate::sys::SystemTime::UNIX_EPOCH)
                .unwrap_or_default();
            let utc = OffsetDateTime::from_unix_timestamp_nanos(since_epoch.as_nanos() as i128)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH);
            match UtcOffset::current_local_offset() {
                Ok(offset) => utc.to_offset(offset),
                Err(_) => utc,
            }
        })
    }

    /// Handles the token at the start of `rest`, returning what follows it.
    fn write_token<'f>(
        &self,
        rest: &'f str,
        dest: &mut String,
        auto_sizes: &mut AutoSizes,
        date_time: &mut Option<OffsetDateTime>,
    ) -> &'f str {
        let mut chars = rest.chars();
        let Some(c1) = chars.next() else {
            dest.push('%');
            return rest;
        };
        let after_one = chars.as_str();
        let c2 = chars.next();
        let after_two = chars.as_str();
        let record = self.record;
        let scope = record.scope();
        let caller = scope.caller();
        let other = &self.config;

        match (c1, c2) {
            ('S', Some(sub)) => {
                let value: String = match sub {
                    'P' => caller.directory().to_string(),
                    'p' => scope.trimmed_dir().to_string(),
                    'F' => caller.file_name().to_string(),
                    'f' => caller.file_stem().to_string(),
                    'M' => {
                        let method = caller.method();
                        if method.is_empty() {
                            other.no_method_info.clone()
                        } else {
                            method.to_string()
                        }
                    }
                    'L' => caller.line.to_string(),
                    _ => "%ERROR".to_string(),
                };
                if value.is_empty() {
                    dest.push_str(&other.no_source_file_info);
                } else {
                    dest.push_str(&value);
                }
                after_two
            }
            ('T', Some('D')) => {
                let now = self.local_time(date_time);
                write_date_time(dest, now, &other.date_format, DATE_ITEMS);
                after_two
            }
            ('T', Some('T')) => {
                let now = self.local_time(date_time);
                write_date_time(dest, now, &other.time_of_day_format, TIME_ITEMS);
                after_two
            }
            ('T', Some('C')) => {
                let elapsed = scope
                    .timestamp()
                    .saturating_duration_since(self.time_of_creation);
                self.write_elapsed(dest, elapsed, auto_sizes);
                after_two
            }
            ('T', Some('L')) => {
                let diff = scope
                    .timestamp()
                    .saturating_duration_since(self.time_of_last_log);
                let nanos = u64::try_from(diff.as_nanos()).unwrap_or(u64::MAX);
                write_time_diff(dest, nanos, &other.time_diff);
                after_two
            }
            ('t', Some('N')) => {
                write_field(dest, scope.thread_name(), auto_sizes, Align::Center);
                after_two
            }
            ('t', Some('I')) => {
                write_field(dest, &scope.thread_id().to_string(), auto_sizes, Align::Center);
                after_two
            }
            ('L', Some('G')) => {
                dest.push_str(self.logger_name);
                after_two
            }
            ('L', Some('X')) => {
                dest.push_str(scope.lox_name());
                after_two
            }
            ('P', _) => {
                dest.push_str(process_name());
                after_one
            }
            ('N', _) => {
                dest.push_str(self.logger_name);
                after_one
            }
            ('V', _) => {
                dest.push_str(match record.verbosity() {
                    Verbosity::Error => &other.verbosity_error,
                    Verbosity::Warning => &other.verbosity_warning,
                    Verbosity::Info => &other.verbosity_info,
                    _ => &other.verbosity_verbose,
                });
                after_one
            }
            ('D', _) => {
                write_field(dest, record.domain(), auto_sizes, Align::Left);
                after_one
            }
            ('#', _) => {
                let _ = write!(
                    dest,
                    "{:0width$}",
                    self.log_number,
                    width = other.log_number_min_digits
                );
                after_one
            }
            ('A', _) => {
                let digits = after_one
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_one.len());
                let extra = after_one[..digits].parse().unwrap_or(1);
                let current = dest.chars().count();
                let tab = auto_sizes.next(AutoSizeKind::Tabstop, current, extra);
                dest.extend(std::iter::repeat_n(' ', tab.saturating_sub(current)));
                &after_one[digits..]
            }
            ('S' | 'T' | 't' | 'L', _) => {
                dest.push_str("%ERROR");
                if c2.is_some() { after_two } else { after_one }
            }
            _ => {
                dest.push_str("%ERROR");
                after_one
            }
        }
    }

    fn write_elapsed(&self, dest: &mut String, elapsed: Duration, auto_sizes: &mut AutoSizes) {
        let secs = elapsed.as_secs();
        let size = if secs >= 24 * 3600 {
            6
        } else if secs >= 10 * 3600 {
            5
        } else if secs >= 3600 {
            4
        } else if secs >= 10 * 60 {
            3
        } else if secs >= 60 {
            2
        } else if secs >= 9 {
            1
        } else {
            0
        };
        let size = auto_sizes.next(AutoSizeKind::Field, size, 0);

        let days = secs / 86_400;
        let hours = (secs / 3600) % 24;
        let minutes = (secs / 60) % 60;
        let seconds = secs % 60;
        if size >= 4 {
            let _ = write!(dest, "{}{}", days, self.config.elapsed_days);
        }
        if size >= 3 {
            let _ = write!(dest, "{:0w$}:", hours, w = if size >= 5 { 2 } else { 1 });
        }
        if size >= 2 {
            let _ = write!(dest, "{:0w$}:", minutes, w = if size >= 3 { 2 } else { 1 });
        }
        let _ = write!(
            dest,
            "{:0w$}.{:03}",
            seconds,
            elapsed.subsec_millis(),
            w = if size >= 1 { 2 } else { 1 }
        );
    }
}

fn write_date_time(
    dest: &mut String,
    value: OffsetDateTime,
    format: &str,
    default_items: &[BorrowedFormatItem<'_>],
) {
    let rendered = if format == DEFAULT_DATE_FORMAT || format == DEFAULT_TIME_OF_DAY_FORMAT {
        value.format(default_items)
    } else {
        match time::format_description::parse(format) {
            Ok(items) => value.format(items.as_slice()),
            Err(_) => {
                dest.push_str("%ERROR");
                return;
            }
        }
    };
    match rendered {
        Ok(text) => dest.push_str(&text),
        Err(_) => dest.push_str("%ERROR"),
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
}

fn write_field(dest: &mut String, value: &str, auto_sizes: &mut AutoSizes, align: Align) {
    let len = value.chars().count();
    let width = auto_sizes.next(AutoSizeKind::Field, len, 0);
    let pad = width.saturating_sub(len);
    let (left, right) = match align {
        Align::Left => (0, pad),
        Align::Center => (pad / 2, pad - pad / 2),
    };
    dest.extend(std::iter::repeat_n(' ', left));
    dest.push_str(value);
    dest.extend(std::iter::repeat_n(' ', right));
}
