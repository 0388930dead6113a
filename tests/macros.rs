// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logging macros, including those going through the default `Lox`.

mod common;

use common::{recording_lox, RecordingLogger};
use loxlog::{
    log_error, log_info, log_verbose, log_warning, lox_assert, lox_error, lox_if, lox_info,
    lox_verbose, lox_warning, LoggingEnvironment, Verbosity,
};

#[test]
fn lox_macros() {
    let (lox, rec) = recording_lox("MACROS");
    let items = 3;
    lox_error!(lox, "/M", "error");
    lox_warning!(lox, "/M", "{} warnings", items);
    lox_info!(lox, "/M", "info ", items, '!');
    lox_verbose!(lox, "/M");
    lox_assert!(lox, items == 3, "/M", "not logged");
    lox_assert!(lox, items == 4, "/M", "items: {}", items);
    lox_if!(lox, items > 0, "/M", Verbosity::Info, "positive");

    let seen = rec.user();
    let verbosities: Vec<_> = seen.iter().map(|s| s.verbosity).collect();
    assert_eq!(
        verbosities,
        vec![
            Verbosity::Error,
            Verbosity::Warning,
            Verbosity::Info,
            Verbosity::Verbose,
            Verbosity::Error,
            Verbosity::Info,
        ]
    );
    assert_eq!(
        rec.messages(),
        vec!["error", "3 warnings", "info 3!", "", "items: 3", "positive"]
    );
}

#[test]
fn default_lox_macros() {
    let lox = LoggingEnvironment::global().default_lox();
    assert_eq!(lox.name(), loxlog::DEFAULT_LOX_NAME);
    let rec = RecordingLogger::new("GLOBAL_REC");
    lox.set_verbosity(loxlog::caller!(), rec.clone(), Verbosity::Info, "/MACRO");

    log_error!("/MACRO", "e");
    log_warning!("/MACRO", "w");
    log_info!("/MACRO", "i");
    log_verbose!("/MACRO", "v");
    log_info!("/ELSEWHERE", "not configured, default is warning");

    assert_eq!(rec.messages(), vec!["e", "w", "i"]);
}
