// SPDX-License-Identifier: MIT OR Apache-2.0

//! The record a [`Logger`](crate::Logger) receives for one accepted statement.
//!
//! A [`LogRecord`] borrows everything from the `Lox` call that produced it: the resolved
//! domain, the statement's verbosity, the argument list (prefixes already merged in), and the
//! scope information of the call. Nothing is rendered yet; each logger decides how to turn the
//! logables into output, typically with [`LogRecord::format_message`].

use crate::format::format_logables;
use crate::logable::Logable;
use crate::scope::ScopeInfo;
use crate::verbosity::Verbosity;
use std::fmt::{Debug, Display};

/**
A log record.

Records are built by the `Lox` for each statement and handed to every accepting logger by
reference, so nothing is copied per logger.
*/
pub struct LogRecord<'a> {
    pub(crate) domain: &'a str,
    pub(crate) verbosity: Verbosity,
    pub(crate) logables: &'a [&'a dyn Logable],
    pub(crate) scope: &'a ScopeInfo,
}

impl<'a> LogRecord<'a> {
    pub fn new(
        domain: &'a str,
        verbosity: Verbosity,
        logables: &'a [&'a dyn Logable],
        scope: &'a ScopeInfo,
    ) -> Self {
        LogRecord {
            domain,
            verbosity,
            logables,
            scope,
        }
    }

    /// Full path of the resolved domain, e.g. `/UI/MOUSE` or `$/LGR`.
    pub fn domain(&self) -> &str {
        self.domain
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn logables(&self) -> &[&'a dyn Logable] {
        self.logables
    }

    pub fn scope(&self) -> &ScopeInfo {
        self.scope
    }

    /// Renders the logables into `target`.
    ///
    /// Logables may log while being rendered, so this must not run under a logger's lock.
    pub fn format_message(&self, target: &mut String) {
        format_logables(self.logables, target);
    }
}

impl Debug for LogRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRecord")
            .field("domain", &self.domain)
            .field("verbosity", &self.verbosity)
            .field("logables", &self.logables.len())
            .finish()
    }
}

impl Display for LogRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut message = String::new();
        self.format_message(&mut message);
        write!(f, "[{}] {}: {}", self.domain, self.verbosity, message)
    }
}

/*
Boilerplate notes.

Clone/Copy: the record only borrows, but Clone offers nothing a reference does not.
PartialEq/Hash: logables are trait objects without equality.
Display renders the message, which runs user code; loggers should prefer format_message.
*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Caller;
    use crate::thread::ThreadIdent;

    #[test]
    fn record_renders_message() {
        let scope = ScopeInfo::new(
            Caller::unknown(),
            String::new(),
            ThreadIdent::current(),
            "main".to_string(),
            "LOX",
        );
        let logables: [&dyn Logable; 2] = [&"value={}", &7];
        let record = LogRecord::new("/APP", Verbosity::Info, &logables, &scope);
        let mut out = String::new();
        record.format_message(&mut out);
        assert_eq!(out, "value=7");
        assert_eq!(record.to_string(), "[/APP] Info: value=7");
        assert_eq!(record.scope().lox_name(), "LOX");
    }
}
