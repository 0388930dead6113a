// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-site capture and logging macros.
//!
//! Every `Lox` method takes a [`Caller`](crate::Caller). [`caller!`] builds one from `file!()`,
//! `line!()` and the path of the enclosing function, which is what the scope-bound settings
//! (default domains, prefixes, log-once counters, stored data) are keyed by.
//!
//! The `lox_*` macros log through a given `Lox`, the `log_*` macros through the default `Lox`
//! of the [global environment](crate::LoggingEnvironment::global). Arguments after the domain
//! are [`Logable`](crate::Logable)s.
//!
//! ```rust
//! use loxlog::{caller, lox_info, lox_warning, Logger, Lox, MemoryLogger, Verbosity};
//! use std::sync::Arc;
//!
//! let lox = Lox::new("MACROS");
//! let logger = Arc::new(MemoryLogger::new("MEM"));
//! lox.set_verbosity(caller!(), logger.clone(), Verbosity::Info, "/");
//!
//! lox_info!(lox, "/APP", "{} items", 3);
//! lox_warning!(lox, "/APP", "low on items");
//! assert_eq!(logger.cnt_logs(), 2);
//! ```

/// Strips what `std::any::type_name` adds around the path of the enclosing function.
#[doc(hidden)]
pub fn function_path(name: &'static str) -> &'static str {
    let mut name = name.strip_suffix("::f").unwrap_or(name);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name
}

/// The [`Caller`](crate::Caller) of the current source location.
///
/// ```
/// let caller = loxlog::caller!();
/// assert!(caller.file.ends_with(".rs"));
/// assert!(caller.line > 0);
/// ```
#[macro_export]
macro_rules! caller {
    () => {
        $crate::Caller::new(::std::file!(), ::std::line!(), {
            fn f() {}
            fn type_name_of<T>(_: T) -> &'static str {
                ::std::any::type_name::<T>()
            }
            $crate::hidden::function_path(type_name_of(f))
        })
    };
}

/// Logs through a `Lox` with an explicit verbosity.
#[macro_export]
macro_rules! lox_entry {
    ($lox:expr, $verbosity:expr, $domain:expr $(, $arg:expr)* $(,)?) => {
        $lox.entry(
            $crate::caller!(),
            $domain,
            $verbosity,
            &[$(&$arg as &dyn $crate::Logable),*],
        )
    };
}

#[macro_export]
macro_rules! lox_error {
    ($lox:expr, $domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_entry!($lox, $crate::Verbosity::Error, $domain $(, $arg)*)
    };
}

#[macro_export]
macro_rules! lox_warning {
    ($lox:expr, $domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_entry!($lox, $crate::Verbosity::Warning, $domain $(, $arg)*)
    };
}

#[macro_export]
macro_rules! lox_info {
    ($lox:expr, $domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_entry!($lox, $crate::Verbosity::Info, $domain $(, $arg)*)
    };
}

#[macro_export]
macro_rules! lox_verbose {
    ($lox:expr, $domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_entry!($lox, $crate::Verbosity::Verbose, $domain $(, $arg)*)
    };
}

/// Logs an error if the condition does not hold.
#[macro_export]
macro_rules! lox_assert {
    ($lox:expr, $cond:expr, $domain:expr $(, $arg:expr)* $(,)?) => {
        $lox.log_assert(
            $crate::caller!(),
            $cond,
            $domain,
            &[$(&$arg as &dyn $crate::Logable),*],
        )
    };
}

/// Logs if the condition holds.
#[macro_export]
macro_rules! lox_if {
    ($lox:expr, $cond:expr, $domain:expr, $verbosity:expr $(, $arg:expr)* $(,)?) => {
        $lox.log_if(
            $crate::caller!(),
            $cond,
            $domain,
            $verbosity,
            &[$(&$arg as &dyn $crate::Logable),*],
        )
    };
}

/// Logs only the first time this line is reached.
#[macro_export]
macro_rules! lox_once {
    ($lox:expr, $domain:expr, $verbosity:expr $(, $arg:expr)* $(,)?) => {
        $lox.once(
            $crate::caller!(),
            $domain,
            $verbosity,
            &[$(&$arg as &dyn $crate::Logable),*],
            "",
            $crate::Scope::Global,
            1,
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_error!($crate::LoggingEnvironment::global().default_lox(), $domain $(, $arg)*)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_warning!($crate::LoggingEnvironment::global().default_lox(), $domain $(, $arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_info!($crate::LoggingEnvironment::global().default_lox(), $domain $(, $arg)*)
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($domain:expr $(, $arg:expr)* $(,)?) => {
        $crate::lox_verbose!($crate::LoggingEnvironment::global().default_lox(), $domain $(, $arg)*)
    };
}
