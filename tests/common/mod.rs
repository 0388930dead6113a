// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use loxlog::{LogRecord, Logger, LoggingEnvironment, Lox, Verbosity};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One record as seen by a [`RecordingLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub domain: String,
    pub verbosity: Verbosity,
    pub message: String,
}

/// Keeps every record it receives, rendered.
#[derive(Debug)]
pub struct RecordingLogger {
    name: String,
    cnt_logs: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
}

impl RecordingLogger {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(RecordingLogger {
            name: name.to_string(),
            cnt_logs: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn all(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Records of the application tree only.
    pub fn user(&self) -> Vec<Seen> {
        self.all()
            .into_iter()
            .filter(|s| !s.domain.starts_with('$'))
            .collect()
    }

    /// Messages of the application tree, in order.
    pub fn messages(&self) -> Vec<String> {
        self.user().into_iter().map(|s| s.message).collect()
    }

    /// Domains of the application tree, in order.
    pub fn domains(&self) -> Vec<String> {
        self.user().into_iter().map(|s| s.domain).collect()
    }

    /// Records of the internal tree.
    pub fn internal(&self) -> Vec<Seen> {
        self.all()
            .into_iter()
            .filter(|s| s.domain.starts_with('$'))
            .collect()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl Logger for RecordingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        "RECORDING"
    }

    fn log(&self, record: &LogRecord<'_>) {
        self.cnt_logs.fetch_add(1, Ordering::Relaxed);
        let mut message = String::new();
        record.format_message(&mut message);
        self.seen.lock().unwrap().push(Seen {
            domain: record.domain().to_string(),
            verbosity: record.verbosity(),
            message,
        });
    }

    fn cnt_logs(&self) -> usize {
        self.cnt_logs.load(Ordering::Relaxed)
    }
}

/// A `Lox` in an environment of its own, with a recording logger at `Verbose` on `/`.
pub fn recording_lox(name: &str) -> (Lox, Arc<RecordingLogger>) {
    let env = LoggingEnvironment::new();
    let lox = Lox::with_environment(name, &env);
    let logger = RecordingLogger::new("REC");
    lox.set_verbosity(loxlog::caller!(), logger.clone(), Verbosity::Verbose, "/");
    (lox, logger)
}
