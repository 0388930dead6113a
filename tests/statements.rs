// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log statements: recursion, conditional and limited logging, stored data, multi-line text.

mod common;

use common::recording_lox;
use loxlog::text_logger::{MultiLineMode, TextLoggerConfig};
use loxlog::{
    caller, lox_once, Inclusion, Logable, Logger, LoggingEnvironment, Lox, MemoryLogger, Scope,
    SharedLogable, StateInfo, StoredData, Verbosity,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

fn memory_lox(name: &str) -> (Lox, Arc<MemoryLogger>) {
    let lox = Lox::with_environment(name, &LoggingEnvironment::new());
    let logger = Arc::new(MemoryLogger::with_config(
        "MEM",
        TextLoggerConfig::message_only(),
    ));
    lox.set_verbosity(caller!(), logger.clone(), Verbosity::Verbose, "/");
    (lox, logger)
}

/// Logs through its `Lox` while being rendered.
struct Nested<'a> {
    lox: &'a Lox,
}

impl Logable for Nested<'_> {
    fn log_to(&self, target: &mut String) {
        self.lox.info(caller!(), "/INNER", &[&"inner"]);
        target.push_str("Test");
    }
}

#[test]
fn logging_while_rendering() {
    let (lox, mem) = memory_lox("RECURSION");
    let before = lox.cnt_logs();
    let nested = Nested { lox: &lox };
    lox.info(caller!(), "/OUTER", &[&"123{:^8}456", &nested]);

    assert_eq!(lox.cnt_logs(), before + 2);
    assert_eq!(mem.cnt_logs(), 2);
    assert_eq!(mem.memory_log(), "inner\n123  Test  456\n");

    // and again, now the first statement's rendering runs a nested statement on a
    // domain that already exists
    mem.clear();
    lox.info(caller!(), "/OUTER", &[&nested, &"!"]);
    assert_eq!(mem.memory_log(), "inner\nTest!\n");
    assert_eq!(lox.internal_diagnostics(), 0);
}

#[test]
fn two_arguments_logging_while_rendering() {
    let (lox, mem) = memory_lox("RECURSION2");
    let first = Nested { lox: &lox };
    let second = Nested { lox: &lox };
    let before = mem.cnt_logs();
    lox.info(
        caller!(),
        "/OUTER",
        &[&"123{:^8}456--abc{!UP}efg", &first, &second],
    );

    assert_eq!(mem.cnt_logs() - before, 3);
    assert_eq!(lox.cnt_logs(), 3);
    assert_eq!(
        mem.memory_log(),
        "inner\ninner\n123  Test  456--abcTESTefg\n"
    );
}

/// A prefix that logs through its `Lox` whenever it is rendered, except while doing so.
struct LoggingPrefix {
    lox: Weak<Lox>,
    busy: AtomicBool,
}

impl Logable for LoggingPrefix {
    fn log_to(&self, target: &mut String) {
        if !self.busy.swap(true, Ordering::SeqCst) {
            if let Some(lox) = self.lox.upgrade() {
                lox.info(caller!(), "/NESTED", &[&"nested"]);
            }
            self.busy.store(false, Ordering::SeqCst);
        }
        target.push_str("P:");
    }
}

#[test]
fn prefixes_logging_while_rendered() {
    let lox = Arc::new(Lox::with_environment("PFXLOG", &LoggingEnvironment::new()));
    let mem = Arc::new(MemoryLogger::with_config(
        "MEM",
        TextLoggerConfig::message_only(),
    ));
    lox.set_verbosity(caller!(), mem.clone(), Verbosity::Verbose, "/");
    let prefix: SharedLogable = Arc::new(LoggingPrefix {
        lox: Arc::downgrade(&lox),
        busy: AtomicBool::new(false),
    });

    // rendered for the diagnostic before it is stored
    lox.set_prefix(caller!(), Some(prefix.clone()), Scope::Global);
    assert_eq!(mem.drain_logs(), "nested\n");

    lox.info(caller!(), "/", &[&"msg"]);
    assert_eq!(mem.drain_logs(), "P:nested\nP:msg\n");

    lox.set_domain_prefix(caller!(), Some(prefix.clone()), "/D", Inclusion::Include);
    assert_eq!(mem.drain_logs(), "P:nested\n");

    let state = lox.get_state(StateInfo::PREFIXES);
    assert!(state.contains("\"P:\"  Scope::Global"));
    assert!(state.contains("\"P:\"  Domain '/D' (Include)"));
    assert_eq!(mem.drain_logs(), "P:nested\nP:nested\n");

    lox.state(caller!(), "/", Verbosity::Info, "", StateInfo::PREFIXES);
    assert!(mem.drain_logs().contains("Prefix logables:"));
    assert_eq!(lox.internal_diagnostics(), 0);
}

#[test]
fn assert_and_if() {
    let (lox, rec) = recording_lox("COND");
    lox.log_assert(caller!(), true, "/A", &[&"not logged"]);
    lox.log_assert(caller!(), 1 + 1 == 3, "/A", &[&"assertion failed"]);
    lox.log_if(caller!(), false, "/A", Verbosity::Info, &[&"not logged"]);
    lox.log_if(caller!(), true, "/A", Verbosity::Verbose, &[&"condition met"]);

    let seen = rec.user();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].verbosity, Verbosity::Error);
    assert_eq!(seen[0].message, "assertion failed");
    assert_eq!(seen[1].verbosity, Verbosity::Verbose);
    assert_eq!(lox.cnt_logs(), 2);
}

#[test]
fn log_once() {
    let (lox, rec) = recording_lox("ONCE");
    for i in 0..5 {
        lox.once(caller!(), "/", Verbosity::Info, &[&"first two {}", &i], "", Scope::Global, 2);
    }
    assert_eq!(rec.messages(), vec!["first two 0", "first two 1"]);

    rec.clear();
    for i in 0..5 {
        lox.once(caller!(), "/", Verbosity::Info, &[&"every 2nd {}", &i], "G", Scope::Method, -2);
    }
    assert_eq!(rec.messages(), vec!["every 2nd 0", "every 2nd 2", "every 2nd 4"]);

    // the counter of a group is shared by all statements of its scope
    rec.clear();
    lox.once(caller!(), "/", Verbosity::Info, &[&"shared"], "G", Scope::Method, -2);
    lox.once(caller!(), "/", Verbosity::Info, &[&"shared"], "G", Scope::Method, -2);
    assert_eq!(rec.messages(), vec!["shared"]);

    rec.clear();
    for _ in 0..3 {
        lox_once!(lox, "/", Verbosity::Warning, "macro");
    }
    assert_eq!(rec.messages(), vec!["macro"]);

    let state = lox.get_state(StateInfo::ONCE);
    assert!(state.contains("group \"G\": 7"));
}

#[test]
fn stored_data() {
    let (lox, _rec) = recording_lox("DATA");
    let data: StoredData = Arc::new(42u32);
    lox.store(caller!(), Some(data), "answer", Scope::Global);
    let text: StoredData = Arc::new("local");
    lox.store(caller!(), Some(text), "text", Scope::Method);

    let answer = lox.retrieve(caller!(), "answer", Scope::Global).unwrap();
    assert_eq!(answer.downcast_ref::<u32>(), Some(&42));
    let text = lox.retrieve(caller!(), "text", Scope::Method).unwrap();
    assert_eq!(text.downcast_ref::<&str>(), Some(&"local"));
    assert!(lox.retrieve(caller!(), "text", Scope::Global).is_none());
    assert!(retrieve_elsewhere(&lox, "text").is_none());

    let mine: StoredData = Arc::new(1u8);
    lox.store(caller!(), Some(mine), "mine", Scope::ThreadOuter);
    std::thread::scope(|s| {
        s.spawn(|| assert!(lox.retrieve(caller!(), "mine", Scope::ThreadOuter).is_none()));
    });
    assert!(lox.retrieve(caller!(), "mine", Scope::ThreadOuter).is_some());

    lox.store(caller!(), None, "answer", Scope::Global);
    assert!(lox.retrieve(caller!(), "answer", Scope::Global).is_none());
    assert!(lox.get_state(StateInfo::LOG_DATA).contains("key \"mine\""));
    assert_eq!(lox.internal_diagnostics(), 0);
}

fn retrieve_elsewhere(lox: &Lox, key: &str) -> Option<StoredData> {
    lox.retrieve(caller!(), key, Scope::Method)
}

#[test]
fn multi_line_messages() {
    let (lox, mem) = memory_lox("LINES");

    mem.text_logger()
        .update_config(|c| c.multi_line.mode = MultiLineMode::Pure);
    lox.info(caller!(), "/", &[&"a\nb"]);
    assert_eq!(mem.drain_logs(), "> a\n> b\n");

    mem.text_logger()
        .update_config(|c| c.multi_line.mode = MultiLineMode::SingleLine);
    lox.info(caller!(), "/", &[&"a\r\nb"]);
    assert_eq!(mem.drain_logs(), "> a\\rb\n");

    lox.info(caller!(), "/", &[&"single"]);
    assert_eq!(mem.drain_logs(), "single\n");
}

#[test]
fn detected_domains() {
    let (lox, rec) = recording_lox("DETECT");
    lox.entry_detect_domain(caller!(), Verbosity::Info, &[&"NET", &"up"]);
    lox.entry_detect_domain(caller!(), Verbosity::Info, &[&"NET"]);
    lox.entry_detect_domain(caller!(), Verbosity::Info, &[&"Hello {}", &"NET"]);
    assert_eq!(rec.domains(), vec!["/NET", "/", "/"]);
    assert_eq!(rec.messages(), vec!["up", "NET", "Hello NET"]);
}

#[test]
fn state_dump() {
    let (lox, rec) = recording_lox("DUMP");
    lox.info(caller!(), "/APP/UI", &[&"x"]);
    rec.clear();

    lox.state(caller!(), "/", Verbosity::Info, "Current state:", StateInfo::BASIC);
    let seen = rec.user();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].message.starts_with("Current state:\nName:"));
    assert!(seen[0].message.contains("\"DUMP\""));

    let all = lox.get_state(StateInfo::ALL);
    for section in ["Loggers:", "Domains:", "Internal domains:", "Scope domains:"] {
        assert!(all.contains(section), "missing {}", section);
    }
    assert!(all.contains("/APP/UI"));
    assert!(all.contains("REC (RECORDING)"));
}
