// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logging environment.
//!
//! A [`LoggingEnvironment`] owns what several [`Lox`] instances share: the global source-path
//! trim rules, the configuration source verbosity variables are read from, and a default `Lox`
//! used by the convenience macros ([`log_info!`](crate::log_info) and friends).
//!
//! Most applications use the process-wide instance returned by [`LoggingEnvironment::global`].
//! It reads configuration from the process environment. Applications that need isolation,
//! tests in particular, create their own environment and attach their `Lox` instances to it
//! with [`Lox::with_environment`].
//!
//! ```
//! use loxlog::{LoggingEnvironment, Lox};
//!
//! let env = LoggingEnvironment::new();
//! let lox = Lox::with_environment("APP", &env);
//! assert_eq!(lox.name(), "APP");
//! assert_eq!(env.default_lox().name(), "LOG");
//! ```

use crate::config::{ConfigSource, EnvSource};
use crate::lox::Lox;
use crate::trim::TrimRules;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Name of the default `Lox` of an environment.
pub const DEFAULT_LOX_NAME: &str = "LOG";

/// The part of an environment every attached `Lox` holds on to.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    trim_rules: RwLock<TrimRules>,
    config: RwLock<Option<Arc<dyn ConfigSource>>>,
}

impl Shared {
    pub(crate) fn with_trim_rules<R>(&self, f: impl FnOnce(&TrimRules) -> R) -> R {
        f(&self.trim_rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn with_trim_rules_mut<R>(&self, f: impl FnOnce(&mut TrimRules) -> R) -> R {
        f(&mut self.trim_rules.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn config(&self) -> Option<Arc<dyn ConfigSource>> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Shared state of a group of [`Lox`] instances. See the [module docs](self).
#[derive(Debug)]
pub struct LoggingEnvironment {
    shared: Arc<Shared>,
    default_lox: OnceLock<Lox>,
}

static GLOBAL: OnceLock<LoggingEnvironment> = OnceLock::new();

impl Default for LoggingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingEnvironment {
    /// An environment without trim rules and without a configuration source.
    pub fn new() -> Self {
        LoggingEnvironment {
            shared: Arc::new(Shared::default()),
            default_lox: OnceLock::new(),
        }
    }

    /// The process-wide environment, reading configuration from the process environment.
    pub fn global() -> &'static LoggingEnvironment {
        GLOBAL.get_or_init(|| {
            let env = LoggingEnvironment::new();
            env.set_config_source(Some(Arc::new(EnvSource)));
            env
        })
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// The default `Lox`, named `"LOG"`, created on first use.
    pub fn default_lox(&self) -> &Lox {
        self.default_lox
            .get_or_init(|| Lox::with_environment(DEFAULT_LOX_NAME, self))
    }

    /// Replaces the configuration source. Only loggers and domains registered afterwards
    /// read from the new source.
    pub fn set_config_source(&self, source: Option<Arc<dyn ConfigSource>>) {
        *self
            .shared
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = source;
    }

    pub fn config_source(&self) -> Option<Arc<dyn ConfigSource>> {
        self.shared.config()
    }

    /// A copy of the global source-path trim rules.
    pub fn trim_rules(&self) -> TrimRules {
        self.shared.with_trim_rules(TrimRules::clone)
    }

    /**
    Returns the environment to its initial state.

    Global trim rules are cleared and the default `Lox` is reset. The configuration source of
    the global environment is set back to the process environment, that of other environments
    is removed.
    */
    pub fn reset(&self) {
        self.shared.with_trim_rules_mut(TrimRules::clear);
        let source: Option<Arc<dyn ConfigSource>> = if std::ptr::eq(self, Self::global()) {
            Some(Arc::new(EnvSource))
        } else {
            None
        };
        self.set_config_source(source);
        if let Some(lox) = self.default_lox.get() {
            lox.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSource;
    use crate::verbosity::{Inclusion, Priority, Sensitivity};

    #[test]
    fn isolated_environment() {
        let env = LoggingEnvironment::new();
        assert!(env.config_source().is_none());
        env.set_config_source(Some(Arc::new(MapSource::new(Priority::DEFAULT_VALUES))));
        assert!(env.config_source().is_some());

        env.shared().with_trim_rules_mut(|rules| {
            rules
                .add(
                    "*/src/",
                    Inclusion::Include,
                    0,
                    Sensitivity::Sensitive,
                    "",
                    Priority::STANDARD,
                )
                .unwrap();
        });
        assert_eq!(env.trim_rules().rules().len(), 1);
        assert_eq!(env.default_lox().name(), DEFAULT_LOX_NAME);

        env.reset();
        assert!(env.trim_rules().is_empty());
        assert!(env.config_source().is_none());
    }
}
