//SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use crate::sys::Instant;
use std::fmt::Debug;
use std::sync::Arc;

/**
A log destination attached to one or more [`Lox`](crate::Lox) instances.

A `Lox` calls [`Logger::log`] for every statement the logger accepts. The call happens while
the `Lox` lock is held, but a logger shared between several `Lox` instances may be called from
several threads at once, so implementations protect their own state.

Rendering the record's logables may log again through the same `Lox`. Implementations must not
hold their own internal lock while doing so.
*/
pub trait Logger: Debug + Send + Sync {
    /// Name used for lookups (compared case-insensitively) and for `%LG`/`%N`.
    fn name(&self) -> &str;

    /// Name of the implementation, shown in state dumps.
    fn type_name(&self) -> &str;

    /**
        Submits an accepted statement for logging.
    */
    fn log(&self, record: &LogRecord<'_>);

    /// Number of statements this logger has processed.
    fn cnt_logs(&self) -> usize;

    /// Sets the origin of elapsed-time output. Loggers that print no times ignore this.
    fn set_start_time(&self, _start: Instant) {}

    /**
    The application may imminently exit.  Ensure all buffers are flushed and up to date.
    */
    fn prepare_to_die(&self) {}
}

/// Identity comparison of a registered logger with any logger reference.
pub(crate) fn same_logger(a: &Arc<dyn Logger>, b: &dyn Logger) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), b as *const dyn Logger)
}

/*
Boilerplate notes.

# Logger

I don't think Clone on Logger makes sense, so copy's out.
PartialEq and Eq would be ambiguous between data equality and identity.  A `Lox` needs identity,
which is what `same_logger` provides on the `Arc`.
Ord makes no sense
Hash is left out for the same reason as Eq.
Default is not necessarily sensible since who knows how the logger is constructed.
Display is not very sensible.
From/Into, no
AsRef,AsMut,Deref,DerefMut, no
Send/Sync are required, a logger may be shared between several Lox instances.
*/
