// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
The text pipeline shared by all text-producing loggers.

A [`TextLogger`] turns an accepted [`LogRecord`] into lines of text:

1. the logables are rendered into the message (outside of any lock, since rendering may log),
2. configured string replacements are applied,
3. meta-information is written according to [`TextLoggerConfig::format`],
4. the message is split according to the [`MultiLineConfig`],
5. every line goes through the escape scan ([`write_line`]) into the backend's [`TextWriter`].

Concrete loggers such as [`MemoryLogger`](crate::MemoryLogger) and
[`ConsoleLogger`](crate::ConsoleLogger) are thin wrappers choosing a writer.

# Meta-information

The layout is a format string with `%` tokens:

| token | output |
|---|---|
| `%SP` / `%Sp` | source directory, full / trimmed |
| `%SF` / `%Sf` | source file name, with / without extension |
| `%SM` / `%SL` | function name / line number |
| `%TD` / `%TT` | calendar date / time of day of the statement |
| `%TC` | time elapsed since the logger was created |
| `%TL` | time elapsed since the logger's previous statement |
| `%tN` / `%tI` | thread name / thread id |
| `%LG` / `%N` | logger name |
| `%LX` | name of the `Lox` |
| `%P` | process name |
| `%V` | verbosity marker |
| `%D` | domain path |
| `%#` | number of statements the logger has processed |
| `%A<n>` | tab to an auto-sized column with `n` extra spaces (default 1) |
*/

mod auto_sizes;
pub mod esc;
mod meta_info;
mod plain_text;

pub use auto_sizes::{AutoSizeKind, AutoSizes};
pub use meta_info::{
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_OF_DAY_FORMAT, TimeDiffFormat, write_time_diff,
};
pub use plain_text::{Phase, TextWriter, write_line};

use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::sys::Instant;
use meta_info::MetaInfo;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How messages containing line breaks are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MultiLineMode {
    /// One line; line breaks are replaced by [`MultiLineConfig::delimiter_replacement`].
    SingleLine,
    /// Every line carries the full meta-information.
    AllMeta,
    /// Meta-information on the first line only, later lines are indented to match.
    #[default]
    BlankedMeta,
    /// A headline with meta-information, then the lines without it.
    Headline,
    /// The lines only.
    Pure,
}

impl MultiLineMode {
    /// Mode from its number `0..=4`. Larger numbers give [`MultiLineMode::Pure`].
    pub fn from_ordinal(ordinal: u32) -> Self {
        match ordinal {
            0 => MultiLineMode::SingleLine,
            1 => MultiLineMode::AllMeta,
            2 => MultiLineMode::BlankedMeta,
            3 => MultiLineMode::Headline,
            _ => MultiLineMode::Pure,
        }
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiLineConfig {
    pub mode: MultiLineMode,
    /// Written (after the meta-information) in front of the lines in
    /// [`MultiLineMode::Headline`].
    pub headline: String,
    /// Written in front of every line of a multi-line message.
    pub prefix: String,
    /// Written after every line of a multi-line message.
    pub suffix: String,
    /// Line separator. `None` detects `\n` and `\r\n`, an empty string disables splitting.
    pub delimiter: Option<String>,
    /// Replaces line separators in [`MultiLineMode::SingleLine`].
    pub delimiter_replacement: String,
}

impl Default for MultiLineConfig {
    fn default() -> Self {
        MultiLineConfig {
            mode: MultiLineMode::BlankedMeta,
            headline: "Multi line message follows: ".to_string(),
            prefix: "> ".to_string(),
            suffix: String::new(),
            delimiter: None,
            delimiter_replacement: "\\r".to_string(),
        }
    }
}

/// Output settings of a [`TextLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLoggerConfig {
    /// Meta-information layout, see the [token table](crate::text_logger#meta-information).
    pub format: String,
    pub verbosity_error: String,
    pub verbosity_warning: String,
    pub verbosity_info: String,
    pub verbosity_verbose: String,
    /// Appended to every message.
    pub msg_suffix: String,
    /// `time` crate format description used by `%TD`.
    pub date_format: String,
    /// `time` crate format description used by `%TT`.
    pub time_of_day_format: String,
    /// Written after the number of days by `%TC`.
    pub elapsed_days: String,
    pub time_diff: TimeDiffFormat,
    pub multi_line: MultiLineConfig,
    /// Written by `%SP`, `%Sp`, `%SF` and `%Sf` when the caller is unknown.
    pub no_source_file_info: String,
    /// Written by `%SM` when the function is unknown.
    pub no_method_info: String,
    /// Minimum number of digits of `%#`.
    pub log_number_min_digits: usize,
    /// Search and replacement pairs applied to every message, in order.
    pub replacements: Vec<(String, String)>,
}

impl Default for TextLoggerConfig {
    fn default() -> Self {
        TextLoggerConfig {
            format: "%SF:%SL:%A3%SM %A3[%TC +%TL][%tN][%D]%A1#%# %V: ".to_string(),
            verbosity_error: "[ERR]".to_string(),
            verbosity_warning: "[WRN]".to_string(),
            verbosity_info: "     ".to_string(),
            verbosity_verbose: "[***]".to_string(),
            msg_suffix: String::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_of_day_format: DEFAULT_TIME_OF_DAY_FORMAT.to_string(),
            elapsed_days: " Days ".to_string(),
            time_diff: TimeDiffFormat::default(),
            multi_line: MultiLineConfig::default(),
            no_source_file_info: "---".to_string(),
            no_method_info: "---".to_string(),
            log_number_min_digits: 3,
            replacements: Vec::new(),
        }
    }
}

impl TextLoggerConfig {
    /// Settings for a colour-capable terminal: the verbosity is shown as a colour.
    pub fn colorful() -> Self {
        TextLoggerConfig {
            format: "%SF:%SL:%A3%SM %A3[%TC +%TL][%tN][%D]%A1#%#: %V".to_string(),
            verbosity_error: esc::RED.to_string(),
            verbosity_warning: esc::BLUE.to_string(),
            verbosity_info: String::new(),
            verbosity_verbose: esc::GRAY.to_string(),
            msg_suffix: esc::RESET.to_string(),
            ..TextLoggerConfig::default()
        }
    }

    /// Only the message, nothing else.
    pub fn message_only() -> Self {
        TextLoggerConfig {
            format: String::new(),
            ..TextLoggerConfig::default()
        }
    }
}

struct TextLoggerState<W> {
    writer: W,
    config: TextLoggerConfig,
    auto_sizes: AutoSizes,
    time_of_creation: Instant,
    time_of_last_log: Instant,
}

/**
A logger producing text through a [`TextWriter`].

The logger has its own lock, so one instance can be attached to several `Lox` instances.
*/
pub struct TextLogger<W> {
    name: String,
    type_name: String,
    cnt_logs: AtomicUsize,
    state: Mutex<TextLoggerState<W>>,
}

impl<W: TextWriter> TextLogger<W> {
    pub fn new(name: &str, type_name: &str, writer: W) -> Self {
        Self::with_config(name, type_name, writer, TextLoggerConfig::default())
    }

    pub fn with_config(name: &str, type_name: &str, writer: W, config: TextLoggerConfig) -> Self {
        let now = Instant::now();
        TextLogger {
            name: name.to_string(),
            type_name: type_name.to_string(),
            cnt_logs: AtomicUsize::new(0),
            state: Mutex::new(TextLoggerState {
                writer,
                config,
                auto_sizes: AutoSizes::default(),
                time_of_creation: now,
                time_of_last_log: now,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TextLoggerState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> TextLoggerConfig {
        self.lock().config.clone()
    }

    pub fn set_config(&self, config: TextLoggerConfig) {
        self.lock().config = config;
    }

    /// Changes the configuration in place.
    pub fn update_config(&self, f: impl FnOnce(&mut TextLoggerConfig)) {
        f(&mut self.lock().config);
    }

    /// Adds or changes a replacement. `None` removes the replacement for `searched`.
    pub fn set_replacement(&self, searched: &str, replacement: Option<&str>) {
        let mut state = self.lock();
        let replacements = &mut state.config.replacements;
        let existing = replacements.iter().position(|(s, _)| s == searched);
        match (existing, replacement) {
            (Some(pos), Some(replacement)) => replacements[pos].1 = replacement.to_string(),
            (Some(pos), None) => {
                replacements.remove(pos);
            }
            (None, Some(replacement)) => {
                replacements.push((searched.to_string(), replacement.to_string()))
            }
            (None, None) => {}
        }
    }

    pub fn clear_replacements(&self) {
        self.lock().config.replacements.clear();
    }

    /// Forgets the learned column widths.
    pub fn reset_auto_sizes(&self) {
        self.lock().auto_sizes.reset();
    }

    /// Runs `f` with exclusive access to the writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.lock().writer)
    }
}

impl<W: TextWriter> TextLoggerState<W> {
    fn log(&mut self, name: &str, record: &LogRecord<'_>, log_number: usize, mut msg: String) {
        self.writer.begin_record(record.verbosity());
        for (searched, replacement) in &self.config.replacements {
            if !searched.is_empty() && msg.contains(searched.as_str()) {
                msg = msg.replace(searched.as_str(), replacement);
            }
        }

        let TextLoggerState {
            writer,
            config,
            auto_sizes,
            time_of_creation,
            time_of_last_log,
        } = self;

        let mut line = String::new();
        auto_sizes.restart();
        MetaInfo {
            record,
            logger_name: name,
            log_number,
            time_of_creation: *time_of_creation,
            time_of_last_log: *time_of_last_log,
            config,
        }
        .write(&mut line, auto_sizes);
        line.push_str(esc::EOMETA);
        *time_of_last_log = record.scope().timestamp();

        let multi_line = &config.multi_line;
        let splitting = multi_line.delimiter.as_deref() != Some("");
        if msg.is_empty() || !splitting {
            line.push_str(&msg);
            line.push_str(&config.msg_suffix);
            write_line(&line, auto_sizes, writer);
            return;
        }

        if multi_line.mode == MultiLineMode::SingleLine {
            let replacement = multi_line.delimiter_replacement.as_str();
            let collapsed = match multi_line.delimiter.as_deref() {
                Some(delimiter) => msg.replace(delimiter, replacement),
                None => msg
                    .replace("\r\n", replacement)
                    .replace('\r', replacement)
                    .replace('\n', replacement),
            };
            if collapsed == msg {
                line.push_str(&msg);
            } else {
                line.push_str(&multi_line.prefix);
                line.push_str(&collapsed);
                line.push_str(&multi_line.suffix);
            }
            line.push_str(&config.msg_suffix);
            write_line(&line, auto_sizes, writer);
            return;
        }

        let meta_index = auto_sizes.index();
        let mut keep_len = line.len();
        let mut start = 0;
        let mut line_no = 0;
        while start < msg.len() {
            let (end, delimiter_len) = match find_delimiter(&msg, start, &multi_line.delimiter) {
                Some(found) => found,
                None if line_no == 0 => {
                    line.push_str(&msg);
                    line.push_str(&config.msg_suffix);
                    write_line(&line, auto_sizes, writer);
                    return;
                }
                None => (msg.len(), 0),
            };

            if line_no == 0 {
                writer.notify_multi_line(Phase::Begin);
                if matches!(multi_line.mode, MultiLineMode::Headline | MultiLineMode::Pure) {
                    if multi_line.mode == MultiLineMode::Headline {
                        line.push_str(&multi_line.headline);
                        auto_sizes.set_index(meta_index);
                        write_line(&line, auto_sizes, writer);
                    }
                    keep_len = 0;
                }
            }

            if multi_line.mode == MultiLineMode::BlankedMeta {
                if line_no != 0 {
                    line.clear();
                    line.push_str(esc::EOMETA);
                    auto_sizes.set_index(meta_index);
                }
            } else {
                line.truncate(keep_len);
                auto_sizes.set_index(meta_index);
            }

            line.push_str(&multi_line.prefix);
            line.push_str(&msg[start..end]);
            line.push_str(&multi_line.suffix);
            start = end + delimiter_len;
            if start >= msg.len() {
                line.push_str(&config.msg_suffix);
            }
            write_line(&line, auto_sizes, writer);
            line_no += 1;
        }
        if line_no > 0 {
            writer.notify_multi_line(Phase::End);
        }
    }
}

/// Next line break at or after `start`: its byte position and length.
fn find_delimiter(msg: &str, start: usize, delimiter: &Option<String>) -> Option<(usize, usize)> {
    match delimiter {
        Some(delimiter) => msg[start..]
            .find(delimiter.as_str())
            .map(|idx| (start + idx, delimiter.len())),
        None => {
            let idx = start + msg[start..].find('\n')?;
            if idx > start && msg.as_bytes()[idx - 1] == b'\r' {
                Some((idx - 1, 2))
            } else {
                Some((idx, 1))
            }
        }
    }
}

impl<W: TextWriter> Logger for TextLogger<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn log(&self, record: &LogRecord<'_>) {
        let log_number = self.cnt_logs.fetch_add(1, Ordering::Relaxed) + 1;
        // rendering may log again, so it happens before taking our lock
        let mut msg = String::new();
        record.format_message(&mut msg);
        self.lock().log(&self.name, record, log_number, msg);
    }

    fn cnt_logs(&self) -> usize {
        self.cnt_logs.load(Ordering::Relaxed)
    }

    fn set_start_time(&self, start: Instant) {
        let mut state = self.lock();
        state.time_of_creation = start;
        state.time_of_last_log = start;
    }

    fn prepare_to_die(&self) {
        self.lock().writer.flush();
    }
}

impl<W> Debug for TextLogger<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLogger")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("cnt_logs", &self.cnt_logs.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/*
Boilerplate notes.

Clone: the logger owns a writer and counters, cloning would fork them.  Not implemented.
PartialEq/Hash: loggers are compared by identity through `Arc`, see `logger::same_logger`.
Default: there is no default writer.
*/
