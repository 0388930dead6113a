// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source path trimming, prefixes, domain substitution and thread scopes.

mod common;

use common::recording_lox;
use loxlog::text_logger::TextLoggerConfig;
use loxlog::{
    caller, Caller, Inclusion, LoggingEnvironment, Lox, MemoryLogger, Priority, Reach, Scope,
    Sensitivity, SharedLogable, Verbosity,
};
use std::sync::Arc;

const SAMPLE: Caller = Caller::new(
    "/home/dev/src.samples/unittests/alox/ut_alox.rs",
    10,
    "ut_alox::trimming",
);

fn trimmed_dir_logger(lox: &Lox) -> Arc<MemoryLogger> {
    let config = TextLoggerConfig {
        format: "%Sp@".to_string(),
        ..TextLoggerConfig::message_only()
    };
    let logger = Arc::new(MemoryLogger::with_config("MEM", config));
    lox.set_verbosity(caller!(), logger.clone(), Verbosity::Verbose, "/");
    logger
}

#[test]
fn source_path_trim_rules() {
    let env = LoggingEnvironment::new();
    let lox = Lox::with_environment("TRIM", &env);
    let other = Lox::with_environment("OTHER", &env);
    let mem = trimmed_dir_logger(&lox);
    let other_mem = trimmed_dir_logger(&other);
    let trimmed = |lox: &Lox, mem: &MemoryLogger| {
        lox.info(SAMPLE, "/", &[]);
        mem.drain_logs()
    };

    assert_eq!(trimmed(&lox, &mem), "/home/dev/src.samples/unittests/alox@\n");

    let rule = |lox: &Lox, pattern: &str, inclusion, offset, reach, priority| {
        lox.set_source_path_trim_rule(
            caller!(),
            pattern,
            inclusion,
            offset,
            Sensitivity::Sensitive,
            "",
            reach,
            priority,
        )
    };

    rule(&lox, "*/unittests/", Inclusion::Include, 0, Reach::Local, Priority::STANDARD);
    assert_eq!(trimmed(&lox, &mem), "alox@\n");
    assert_eq!(
        trimmed(&other, &other_mem),
        "/home/dev/src.samples/unittests/alox@\n"
    );

    lox.clear_source_path_trim_rules(caller!(), Reach::Local);
    rule(&lox, "*/src.samples/", Inclusion::Include, -3, Reach::Global, Priority::STANDARD);
    assert_eq!(trimmed(&lox, &mem), "es/unittests/alox@\n");
    assert_eq!(trimmed(&other, &other_mem), "es/unittests/alox@\n");

    // same pattern, same priority: replaced
    rule(&other, "*/src.samples/", Inclusion::Include, 2, Reach::Global, Priority::STANDARD);
    assert_eq!(trimmed(&lox, &mem), "ittests/alox@\n");
    assert_eq!(env.trim_rules().rules().len(), 1);

    // higher priority wins over the global rule, whatever the reach
    lox.set_source_path_trim_rule(
        caller!(),
        "*/UNITTESTS/",
        Inclusion::Exclude,
        0,
        Sensitivity::Ignore,
        "ut:",
        Reach::Local,
        Priority::SESSION,
    );
    assert_eq!(trimmed(&lox, &mem), "ut:/unittests/alox@\n");
    assert_eq!(trimmed(&other, &other_mem), "ittests/alox@\n");

    // prefix patterns must match at the start
    lox.clear_source_path_trim_rules(caller!(), Reach::Local);
    rule(&lox, "/home/dev/", Inclusion::Include, 0, Reach::Local, Priority::SESSION);
    assert_eq!(trimmed(&lox, &mem), "src.samples/unittests/alox@\n");
    rule(&lox, "/dev/", Inclusion::Include, 0, Reach::Local, Priority::PROTECTED);
    assert_eq!(trimmed(&lox, &mem), "src.samples/unittests/alox@\n");
    assert_eq!(lox.internal_diagnostics(), 0);

    rule(&lox, "*", Inclusion::Include, 0, Reach::Local, Priority::STANDARD);
    assert_eq!(lox.internal_diagnostics(), 1);

    env.reset();
    assert_eq!(trimmed(&other, &other_mem), "/home/dev/src.samples/unittests/alox@\n");
}

fn prefix(text: &str) -> Option<SharedLogable> {
    let logable: SharedLogable = Arc::new(text.to_string());
    Some(logable)
}

#[test]
fn prefixes() {
    let (lox, rec) = recording_lox("PREFIX");

    lox.set_prefix(caller!(), prefix("G:"), Scope::Global);
    lox.set_prefix(caller!(), prefix("TO:"), Scope::ThreadOuter);
    lox.set_prefix(caller!(), prefix("F:"), Scope::Filename);
    lox.set_prefix(caller!(), prefix("M:"), Scope::Method);
    lox.set_prefix(caller!(), prefix(":TI"), Scope::ThreadInner);
    lox.set_domain_prefix(caller!(), prefix("P:"), "/P", Inclusion::Include);
    lox.set_domain_prefix(caller!(), prefix("PQ:"), "/P/Q", Inclusion::Include);

    lox.info(caller!(), "/P/Q", &[&"msg"]);
    lox.info(caller!(), "/", &[&"msg"]);
    prefixed_elsewhere(&lox);
    assert_eq!(
        rec.messages(),
        vec!["G:TO:F:M:P:PQ:msg:TI", "G:TO:F:M:msg:TI", "G:TO:F:msg:TI"]
    );

    // an excluding domain prefix drops everything in front of it
    rec.clear();
    lox.set_domain_prefix(caller!(), prefix("X:"), "/P/Q/X", Inclusion::Exclude);
    lox.info(caller!(), "/P/Q/X/Y", &[&"msg"]);
    assert_eq!(rec.messages(), vec!["X:msg"]);

    rec.clear();
    lox.set_prefix(caller!(), None, Scope::Method);
    lox.set_prefix(caller!(), None, Scope::ThreadInner);
    lox.set_domain_prefix(caller!(), None, "/P/Q", Inclusion::Include);
    lox.info(caller!(), "/P/Q", &[&"msg"]);
    assert_eq!(rec.messages(), vec!["G:TO:F:P:msg"]);
    assert_eq!(lox.internal_diagnostics(), 0);

    lox.set_prefix(caller!(), None, Scope::Method);
    lox.set_domain_prefix(caller!(), prefix("I:"), "$/LGR", Inclusion::Include);
    assert_eq!(lox.internal_diagnostics(), 2);
}

fn prefixed_elsewhere(lox: &Lox) {
    lox.info(caller!(), "", &[&"msg"]);
}

#[test]
fn domain_substitution() {
    let (lox, rec) = recording_lox("SUBST");

    lox.set_domain_substitution_rule(caller!(), "/A", "/X");
    lox.set_domain_substitution_rule(caller!(), "*B*", "Z");
    lox.set_domain_substitution_rule(caller!(), "/START*", "/S");
    lox.set_domain_substitution_rule(caller!(), "*/END", "/E");
    for domain in ["/A", "/A/B", "/Q/B/C", "/START/X", "/Q/END"] {
        lox.info(caller!(), domain, &[&""]);
    }
    assert_eq!(rec.domains(), vec!["/X", "/A/Z", "/Q/Z/C", "/S/X", "/Q/E"]);

    // relative domains are substituted after scope domains are applied
    rec.clear();
    lox.set_domain(caller!(), "/A", Scope::Method);
    lox.info(caller!(), "", &[&""]);
    lox.set_domain(caller!(), "", Scope::Method);

    lox.set_domain_substitution_rule(caller!(), "/A", "");
    lox.info(caller!(), "/A", &[&""]);
    assert_eq!(rec.domains(), vec!["/X", "/A"]);
    assert_eq!(lox.internal_diagnostics(), 0);

    rec.clear();
    lox.set_domain_substitution_rule(caller!(), "", "");
    lox.set_domain_substitution_rule(caller!(), "/C1", "/C2");
    lox.set_domain_substitution_rule(caller!(), "/C2", "/C1");
    lox.info(caller!(), "/C1", &[&""]);
    lox.info(caller!(), "/C1", &[&""]);
    assert_eq!(rec.user().len(), 2);
    assert_eq!(lox.internal_diagnostics(), 1);

    lox.set_domain_substitution_rule(caller!(), "**", "/X");
    lox.set_domain_substitution_rule(caller!(), "/NONE", "");
    assert_eq!(lox.internal_diagnostics(), 3);
}

#[test]
fn thread_scopes() {
    let (lox, rec) = recording_lox("THREADS");
    lox.set_domain(caller!(), "MAIN", Scope::ThreadOuter);
    lox.map_thread_name(caller!(), "main-thread", None);

    std::thread::scope(|s| {
        s.spawn(|| {
            lox.set_domain(caller!(), "WORKER", Scope::ThreadOuter);
            lox.info(caller!(), "JOB", &[&"working"]);
            lox.info(caller!(), "/ABS", &[&"absolute"]);
        });
    });
    lox.info(caller!(), "JOB", &[&"main"]);
    assert_eq!(rec.domains(), vec!["/WORKER/JOB", "/ABS", "/MAIN/JOB"]);

    let config = TextLoggerConfig {
        format: "%tN|".to_string(),
        ..TextLoggerConfig::message_only()
    };
    let mem = Arc::new(MemoryLogger::with_config("NAMES", config));
    lox.set_verbosity(caller!(), mem.clone(), Verbosity::Info, "/");
    lox.info(caller!(), "/", &[&"x"]);
    assert_eq!(mem.drain_logs(), "main-thread|x\n");

    let state = lox.get_state(loxlog::StateInfo::THREAD_MAPPINGS);
    assert!(state.contains("\"main-thread\""));
}
