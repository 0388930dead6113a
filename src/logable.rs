// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values that can be passed to a log statement.
//!
//! A log statement takes a list of [`Logable`]s. Text loggers render them with the
//! [`format`](crate::format) module: a string argument containing `{}` placeholders consumes
//! the arguments that follow it, everything else is appended as is.
//!
//! Implement [`Logable`] for your own types to log them directly. Rendering happens while the
//! `Lox` lock is held, and it is fine for an implementation to log through the same `Lox`.

use std::fmt::Debug;
use std::sync::Arc;

pub trait Logable {
    /**
    Appends the text representation to `target`.

    When implementing this, use of `#[inline]` is recommended.
    */
    fn log_to(&self, target: &mut String);

    /**
    If this value is a format string, returns it.

    Only strings return `Some`. Custom types should keep the default.
    */
    fn format_pattern(&self) -> Option<&str> {
        None
    }
}

/// A logable that can be stored inside a `Lox`, for example as a prefix.
pub type SharedLogable = Arc<dyn Logable + Send + Sync>;

// Rendering may log, so debug output stays opaque.
impl Debug for dyn Logable + Send + Sync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logable").finish_non_exhaustive()
    }
}

macro_rules! logable_via_display {
    ($($t:ty),*) => {
        $(
            impl Logable for $t {
                #[inline]
                fn log_to(&self, target: &mut String) {
                    use std::fmt::Write;
                    // writing into a String cannot fail
                    let _ = write!(target, "{}", self);
                }
            }
        )*
    };
}

logable_via_display!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char
);

impl Logable for str {
    #[inline]
    fn log_to(&self, target: &mut String) {
        target.push_str(self);
    }
    #[inline]
    fn format_pattern(&self) -> Option<&str> {
        Some(self)
    }
}

impl Logable for String {
    #[inline]
    fn log_to(&self, target: &mut String) {
        target.push_str(self);
    }
    #[inline]
    fn format_pattern(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: Logable + ?Sized> Logable for &T {
    #[inline]
    fn log_to(&self, target: &mut String) {
        (**self).log_to(target)
    }
    #[inline]
    fn format_pattern(&self) -> Option<&str> {
        (**self).format_pattern()
    }
}

impl<T: Logable + ?Sized> Logable for Box<T> {
    #[inline]
    fn log_to(&self, target: &mut String) {
        (**self).log_to(target)
    }
    #[inline]
    fn format_pattern(&self) -> Option<&str> {
        (**self).format_pattern()
    }
}

impl<T: Logable + ?Sized> Logable for Arc<T> {
    #[inline]
    fn log_to(&self, target: &mut String) {
        (**self).log_to(target)
    }
    #[inline]
    fn format_pattern(&self) -> Option<&str> {
        (**self).format_pattern()
    }
}

/**
Option logs its content, or nothing.
*/
impl<T: Logable> Logable for Option<T> {
    #[inline]
    fn log_to(&self, target: &mut String) {
        if let Some(t) = self {
            t.log_to(target);
        }
    }
}

/**
Slices log their elements separated by `", "`.
*/
impl<T: Logable> Logable for [T] {
    fn log_to(&self, target: &mut String) {
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                target.push_str(", ");
            }
            item.log_to(target);
        }
    }
}

/**
Escape hatch for types that only implement `Debug`.
*/
pub struct LogIt<T>(pub T);

impl<T: Debug> Logable for LogIt<T> {
    #[inline]
    fn log_to(&self, target: &mut String) {
        use std::fmt::Write;
        let _ = write!(target, "{:?}", self.0);
    }
}

/// Renders a list of logables without interpreting format strings.
pub(crate) fn concat(logables: &[&dyn Logable]) -> String {
    let mut out = String::new();
    for logable in logables {
        logable.log_to(&mut out);
    }
    out
}
