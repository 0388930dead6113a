// SPDX-License-Identifier: MIT OR Apache-2.0

//! A logger writing to the console.
//!
//! Natively the output goes to `stderr`, one locked write per line, so lines of concurrent
//! loggers do not interleave. On wasm32 each line goes to the browser console, using the
//! console method matching the statement's verbosity.

use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::sys::Instant;
use crate::text_logger::{TextLogger, TextLoggerConfig, TextWriter, esc};
use crate::verbosity::Verbosity;

/// The writer behind a [`ConsoleLogger`].
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    line: String,
    ansi: bool,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    verbosity: Option<Verbosity>,
}

impl TextWriter for ConsoleWriter {
    fn write_text(&mut self, text: &str) -> bool {
        self.line.push_str(text);
        true
    }

    fn write_escape(&mut self, sequence: &str) -> bool {
        if let Some(code) = esc::to_ansi(sequence) {
            self.line.push_str(code);
        }
        true
    }

    fn prune_escapes(&self) -> bool {
        !self.ansi
    }

    fn begin_record(&mut self, verbosity: Verbosity) {
        self.verbosity = Some(verbosity);
    }

    fn end_line(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;
            self.line.push('\n');
            let mut lock = std::io::stderr().lock();
            // a console that cannot be written to has nowhere to report it
            let _ = lock.write_all(self.line.as_bytes());
        }
        #[cfg(target_arch = "wasm32")]
        {
            let msg = wasm_bindgen::JsValue::from(self.line.as_str());
            match self.verbosity {
                Some(Verbosity::Error) => web_sys::console::error_1(&msg),
                Some(Verbosity::Warning) => web_sys::console::warn_1(&msg),
                Some(Verbosity::Verbose) => web_sys::console::debug_1(&msg),
                _ => web_sys::console::info_1(&msg),
            }
        }
        self.line.clear();
    }

    fn flush(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;
            let _ = std::io::stderr().flush();
        }
    }
}

/**
A logger writing to stderr (or the browser console on wasm32).

With [`ConsoleLogger::ansi`], colour and style sequences are translated to ANSI escape codes
and [`TextLoggerConfig::colorful`] is used, otherwise they are dropped.
*/
#[derive(Debug)]
pub struct ConsoleLogger {
    inner: TextLogger<ConsoleWriter>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: Derived, required by the Logger trait
// - Default: Implemented, a plain console logger named "CONSOLE"
// - Clone/PartialEq/Hash: NOT implemented - loggers are shared through Arc and compared by identity

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new("CONSOLE")
    }
}

impl ConsoleLogger {
    /// A plain text console logger.
    pub fn new(name: &str) -> Self {
        ConsoleLogger {
            inner: TextLogger::new(name, "CONSOLE", ConsoleWriter::default()),
        }
    }

    /// A console logger emitting ANSI colours.
    pub fn ansi(name: &str) -> Self {
        let writer = ConsoleWriter {
            ansi: true,
            ..ConsoleWriter::default()
        };
        ConsoleLogger {
            inner: TextLogger::with_config(
                name,
                "ANSI_CONSOLE",
                writer,
                TextLoggerConfig::colorful(),
            ),
        }
    }

    /// The text pipeline, for configuration.
    pub fn text_logger(&self) -> &TextLogger<ConsoleWriter> {
        &self.inner
    }
}

impl Logger for ConsoleLogger {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn log(&self, record: &LogRecord<'_>) {
        self.inner.log(record)
    }

    fn cnt_logs(&self) -> usize {
        self.inner.cnt_logs()
    }

    fn set_start_time(&self, start: Instant) {
        self.inner.set_start_time(start)
    }

    fn prepare_to_die(&self) {
        self.inner.prepare_to_die()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_writer_translates() {
        let mut writer = ConsoleWriter {
            ansi: true,
            ..ConsoleWriter::default()
        };
        assert!(!writer.prune_escapes());
        writer.write_escape(esc::RED);
        writer.write_text("x");
        writer.write_escape(esc::URL_START);
        assert_eq!(writer.line, "\x1B[31mx");
        assert!(ConsoleWriter::default().prune_escapes());

        writer.begin_record(Verbosity::Warning);
        assert_eq!(writer.verbosity, Some(Verbosity::Warning));
    }

    #[test]
    fn names() {
        let plain = ConsoleLogger::default();
        assert_eq!(plain.name(), "CONSOLE");
        assert_eq!(ConsoleLogger::ansi("TTY").type_name(), "ANSI_CONSOLE");
        assert_eq!(plain.cnt_logs(), 0);
    }
}
