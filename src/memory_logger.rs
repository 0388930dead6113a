// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Memory Logger
//!
//! A text logger that keeps its output in a `String`. This is the capture device for tests:
//! attach it to a `Lox`, run the code under test, then inspect [`MemoryLogger::memory_log`].
//!
//! Lines are terminated with `\n`. Escape sequences are dropped unless the logger was created
//! with [`MemoryLogger::keeping_escapes`].

use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::sys::Instant;
use crate::text_logger::{TextLogger, TextLoggerConfig, TextWriter};

/// The buffer behind a [`MemoryLogger`].
#[derive(Debug, Default)]
pub struct MemoryWriter {
    buffer: String,
    keep_escapes: bool,
}

impl TextWriter for MemoryWriter {
    fn write_text(&mut self, text: &str) -> bool {
        self.buffer.push_str(text);
        true
    }

    fn prune_escapes(&self) -> bool {
        !self.keep_escapes
    }

    fn end_line(&mut self) {
        self.buffer.push('\n');
    }
}

/// A logger that stores everything it logs in memory.
///
/// # Example
///
/// ```rust
/// use loxlog::{Lox, MemoryLogger, Verbosity, caller};
/// use std::sync::Arc;
///
/// let lox = Lox::new("TEST");
/// let logger = Arc::new(MemoryLogger::new("MEMORY"));
/// lox.set_verbosity(caller!(), logger.clone(), Verbosity::Info, "/");
///
/// lox.info(caller!(), "/APP", &[&"Test message ", &42]);
///
/// let logs = logger.drain_logs();
/// assert!(logs.contains("Test message 42"));
/// assert_eq!(logger.drain_logs(), "");
/// ```
#[derive(Debug)]
pub struct MemoryLogger {
    inner: TextLogger<MemoryWriter>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: Derived, required by the Logger trait
// - Default: Implemented, named "MEMORY" like the usual test setup
// - Clone: NOT implemented - the buffer and counters belong to one logger
// - PartialEq/Eq/Hash: NOT implemented - loggers are compared by identity
// - Send/Sync: Automatic through the internal Mutex

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new("MEMORY")
    }
}

impl MemoryLogger {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, TextLoggerConfig::default())
    }

    pub fn with_config(name: &str, config: TextLoggerConfig) -> Self {
        MemoryLogger {
            inner: TextLogger::with_config(name, "MEMORY", MemoryWriter::default(), config),
        }
    }

    /// A memory logger that keeps colour and style escape sequences in its output.
    pub fn keeping_escapes(name: &str, config: TextLoggerConfig) -> Self {
        let writer = MemoryWriter {
            buffer: String::new(),
            keep_escapes: true,
        };
        MemoryLogger {
            inner: TextLogger::with_config(name, "MEMORY", writer, config),
        }
    }

    /// The text pipeline, for configuration.
    pub fn text_logger(&self) -> &TextLogger<MemoryWriter> {
        &self.inner
    }

    /// A copy of everything logged so far.
    pub fn memory_log(&self) -> String {
        self.inner.with_writer(|w| w.buffer.clone())
    }

    /// Returns everything logged so far and clears the buffer.
    pub fn drain_logs(&self) -> String {
        self.inner.with_writer(|w| std::mem::take(&mut w.buffer))
    }

    pub fn clear(&self) {
        self.inner.with_writer(|w| w.buffer.clear());
    }

    /// Writes the buffer to the console and clears it.
    pub fn drain_to_console(&self) {
        let logs = self.drain_logs();
        #[cfg(target_arch = "wasm32")]
        web_sys::console::log_1(&wasm_bindgen::JsValue::from(logs));
        #[cfg(not(target_arch = "wasm32"))]
        eprint!("{}", logs);
    }
}

impl Logger for MemoryLogger {
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

    /// No-op, nothing is buffered outside of memory.
    fn prepare_to_die(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logable::Logable;
    use crate::scope::{Caller, ScopeInfo};
    use crate::text_logger::esc;
    use crate::thread::ThreadIdent;
    use crate::verbosity::Verbosity;

    fn record_into(logger: &MemoryLogger, message: &str) {
        let scope = ScopeInfo::new(
            Caller::unknown(),
            String::new(),
            ThreadIdent::current(),
            "main".to_string(),
            "LOX",
        );
        let logables: [&dyn Logable; 1] = [&message];
        logger.log(&LogRecord::new("/", Verbosity::Info, &logables, &scope));
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn stores_and_drains() {
        let logger = MemoryLogger::with_config("MEM", TextLoggerConfig::message_only());
        record_into(&logger, "one");
        record_into(&logger, "two");
        assert_eq!(logger.memory_log(), "one\ntwo\n");
        assert_eq!(logger.drain_logs(), "one\ntwo\n");
        assert_eq!(logger.memory_log(), "");
        assert_eq!(logger.cnt_logs(), 2);
        assert_eq!(logger.type_name(), "MEMORY");
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn escapes_pruned_or_kept() {
        let message = format!("{}red{}", esc::RED, esc::FG_RESET);
        let pruned = MemoryLogger::with_config("A", TextLoggerConfig::message_only());
        record_into(&pruned, &message);
        assert_eq!(pruned.memory_log(), "red\n");

        let kept = MemoryLogger::keeping_escapes("B", TextLoggerConfig::message_only());
        record_into(&kept, &message);
        assert_eq!(kept.memory_log(), format!("{}\n", message));
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn default_meta_information() {
        let logger = MemoryLogger::default();
        record_into(&logger, "hello");
        let log = logger.memory_log();
        assert!(log.starts_with("---:0:"), "{log}");
        assert!(log.contains("[main]"), "{log}");
        assert!(log.contains("[/]"), "{log}");
        assert!(log.contains("#001"), "{log}");
        assert!(log.ends_with("hello\n"), "{log}");
    }
}
