// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verbosity, priority and the small enums shared by the configuration API.
//!
//! [`Verbosity`] is used two ways. A log statement carries the verbosity it was issued with,
//! and every (logger, domain) pair carries the verbosity threshold it accepts. The ordering
//! `Off < Error < Warning < Info < Verbose` makes the acceptance check a single comparison,
//! see [`Verbosity::accepts`].

use std::fmt::Display;
use std::str::FromStr;

/// Severity of a log statement, or acceptance threshold of a logger on a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// As a threshold, rejects everything. As a statement verbosity, never logged.
    Off,
    Error,
    Warning,
    Info,
    Verbose,
}

impl Verbosity {
    /// Whether a threshold of `self` lets a statement of verbosity `statement` pass.
    ///
    /// ```
    /// use loxlog::Verbosity;
    /// assert!(Verbosity::Warning.accepts(Verbosity::Error));
    /// assert!(!Verbosity::Warning.accepts(Verbosity::Info));
    /// assert!(!Verbosity::Verbose.accepts(Verbosity::Off));
    /// ```
    #[inline]
    pub fn accepts(self, statement: Verbosity) -> bool {
        statement != Verbosity::Off && statement <= self
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Verbosity::Off => "Off",
            Verbosity::Error => "Error",
            Verbosity::Warning => "Warning",
            Verbosity::Info => "Info",
            Verbosity::Verbose => "Verbose",
        }
    }
}

/*
Boilerplate notes.

Copy/Clone/Eq/Ord/Hash are all derived; the ordering is load-bearing.
Default is intentionally not implemented: the default threshold (Warning) and a sensible default
statement verbosity (Info) differ, so neither is obviously "the" default.
Display prints the variant name, FromStr is its inverse (case-insensitive, prefixes allowed).
*/

impl Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`Verbosity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verbosity '{0}'")]
pub struct ParseVerbosityError(pub String);

impl FromStr for Verbosity {
    type Err = ParseVerbosityError;

    /// Parses any non-empty, case-insensitive prefix of a variant name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseVerbosityError(s.to_string()));
        }
        let lower = trimmed.to_ascii_lowercase();
        [
            Verbosity::Off,
            Verbosity::Error,
            Verbosity::Warning,
            Verbosity::Info,
            Verbosity::Verbose,
        ]
        .into_iter()
        .find(|v| v.as_str().to_ascii_lowercase().starts_with(&lower))
        .ok_or_else(|| ParseVerbosityError(s.to_string()))
    }
}

/// Ordering value deciding whether a new setting may overwrite a stored one.
///
/// A setting with priority `p` overwrites a stored setting of priority `q` when `p >= q`.
/// Numbers between the named levels are allowed for finer control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Defaults, for example values shipped in a configuration file.
    pub const DEFAULT_VALUES: Priority = Priority(1000);
    /// Programmatic settings. This is what the API uses when no priority is given.
    pub const STANDARD: Priority = Priority(4000);
    /// Settings read from environment variables.
    pub const ENVIRONMENT: Priority = Priority(6000);
    /// Settings of a session (command line, debugger) that code should not undo.
    pub const SESSION: Priority = Priority(8000);
    /// Cannot be overwritten by anything but another protected setting.
    pub const PROTECTED: Priority = Priority(i32::MAX);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::STANDARD
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Priority::DEFAULT_VALUES => f.write_str("DefaultValues"),
            Priority::STANDARD => f.write_str("Standard"),
            Priority::ENVIRONMENT => f.write_str("Environment"),
            Priority::SESSION => f.write_str("Session"),
            Priority::PROTECTED => f.write_str("Protected"),
            Priority(other) => write!(f, "{}", other),
        }
    }
}

/// Include or exclude something, used by prefixes and trim rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inclusion {
    #[default]
    Include,
    Exclude,
}

/// Where a source-path trim rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reach {
    /// Every `Lox` sharing the same [`LoggingEnvironment`](crate::LoggingEnvironment).
    Global,
    /// One `Lox` only.
    #[default]
    Local,
}

/// Case handling for pattern comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sensitivity {
    #[default]
    Sensitive,
    Ignore,
}

impl Sensitivity {
    /// Finds `needle` in `haystack`, returning a byte index into `haystack`.
    pub(crate) fn find(self, haystack: &str, needle: &str) -> Option<usize> {
        match self {
            Sensitivity::Sensitive => haystack.find(needle),
            // ASCII lowering keeps byte offsets intact.
            Sensitivity::Ignore => haystack
                .to_ascii_lowercase()
                .find(&needle.to_ascii_lowercase()),
        }
    }

    pub(crate) fn starts_with(self, haystack: &str, needle: &str) -> bool {
        match self {
            Sensitivity::Sensitive => haystack.starts_with(needle),
            Sensitivity::Ignore => {
                haystack.len() >= needle.len()
                    && haystack.is_char_boundary(needle.len())
                    && haystack[..needle.len()].eq_ignore_ascii_case(needle)
            }
        }
    }
}
