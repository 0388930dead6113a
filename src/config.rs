// SPDX-License-Identifier: MIT OR Apache-2.0

//! External configuration.
//!
//! A [`ConfigSource`] is a read-only key/value store, for example the process environment.
//! The `Lox` reads one variable per (lox, logger) pair from it:
//!
//! ```text
//! LOXLOG_<LOX>_<LOGGER>_VERBOSITY = /UI = Info ; *NET* = Verbose ; INTERNAL_DOMAINS/LGR = Off
//! ```
//!
//! Each `;`-separated entry names a domain and a verbosity. The domain may be wrapped in `*` to
//! match prefixes, suffixes or substrings of domain paths (case-insensitively), and a domain
//! starting with `INTERNAL_DOMAINS` addresses the `$/` tree of internal diagnostics. The
//! settings are applied with the source's priority, so programmatic settings with a lower
//! priority do not undo them.

use crate::verbosity::{ParseVerbosityError, Priority, Verbosity};
use std::collections::HashMap;

/// Names the internal domain tree in configuration values.
pub const INTERNAL_DOMAINS: &str = "INTERNAL_DOMAINS";

/// A read-only key/value source of configuration variables.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// The value of `name`, if set.
    fn get(&self, name: &str) -> Option<String>;

    /// Priority of everything read from this source.
    fn priority(&self) -> Priority;
}

/// Reads variables from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn priority(&self) -> Priority {
        Priority::ENVIRONMENT
    }
}

/// An in-memory set of variables, handy for tests and for values loaded by the application
/// from its own configuration files.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
    priority: Priority,
}

impl MapSource {
    pub fn new(priority: Priority) -> Self {
        MapSource {
            values: HashMap::new(),
            priority,
        }
    }

    /// Sets a variable. Names are matched case-insensitively.
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        self.values
            .insert(name.to_ascii_uppercase(), value.to_string());
        self
    }
}

impl ConfigSource for MapSource {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(&name.to_ascii_uppercase()).cloned()
    }

    fn priority(&self) -> Priority {
        self.priority
    }
}

/// A malformed configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing '=' in verbosity entry '{0}'")]
    MissingEquals(String),
    #[error("empty domain in verbosity entry '{0}'")]
    EmptyDomain(String),
    #[error(transparent)]
    UnknownVerbosity(#[from] ParseVerbosityError),
}

/// Name of the verbosity variable of logger `logger` in lox `lox`.
pub fn verbosity_variable_name(lox: &str, logger: &str) -> String {
    format!(
        "LOXLOG_{}_{}_VERBOSITY",
        lox.to_ascii_uppercase(),
        logger.to_ascii_uppercase()
    )
}

/// How a [`VerbosityRule`] compares its domain with a domain path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainMatch {
    Exact(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
}

/// One `domain = verbosity` entry of a verbosity variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbosityRule {
    /// `true` if the rule addresses the internal domain tree.
    pub internal: bool,
    pub domain: DomainMatch,
    pub verbosity: Verbosity,
}

impl VerbosityRule {
    /// Parses a single entry such as `*UI* = info`.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let (domain, verbosity) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::MissingEquals(entry.trim().to_string()))?;
        let verbosity: Verbosity = verbosity.parse()?;

        let mut domain = domain.trim();
        let mut internal = false;
        if domain.len() >= INTERNAL_DOMAINS.len()
            && domain[..INTERNAL_DOMAINS.len()].eq_ignore_ascii_case(INTERNAL_DOMAINS)
        {
            internal = true;
            domain = &domain[INTERNAL_DOMAINS.len()..];
        }

        let leading = domain.starts_with('*');
        let trailing = domain.len() > 1 && domain.ends_with('*');
        let inner = domain.trim_matches('*').to_ascii_uppercase();
        if inner.is_empty() && !internal {
            return Err(ConfigError::EmptyDomain(entry.trim().to_string()));
        }
        let domain = match (leading, trailing) {
            (true, true) => DomainMatch::Contains(inner),
            (true, false) => DomainMatch::EndsWith(inner),
            (false, true) => DomainMatch::StartsWith(normalize(&inner)),
            (false, false) => DomainMatch::Exact(normalize(&inner)),
        };
        Ok(VerbosityRule {
            internal,
            domain,
            verbosity,
        })
    }

    /// Whether the rule applies to `path`, a full path relative to its tree's root
    /// (`/UI/MOUSE`, or `/LGR` for `$/LGR`).
    pub fn matches(&self, internal: bool, path: &str) -> bool {
        if internal != self.internal {
            return false;
        }
        let path = path.to_ascii_uppercase();
        match &self.domain {
            DomainMatch::Exact(domain) => path == *domain,
            DomainMatch::StartsWith(domain) => path.starts_with(domain.as_str()),
            DomainMatch::EndsWith(domain) => path.ends_with(domain.as_str()),
            DomainMatch::Contains(domain) => path.contains(domain.as_str()),
        }
    }
}

fn normalize(domain: &str) -> String {
    let trimmed = domain.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Parses a verbosity variable. Empty entries are skipped; each malformed entry yields its
/// own error without affecting the others.
pub fn parse_verbosities(value: &str) -> Vec<Result<VerbosityRule, ConfigError>> {
    value
        .split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(VerbosityRule::parse)
        .collect()
}
