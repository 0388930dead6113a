//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# loxlog

loxlog is a scope-aware logging engine for Rust.

# The problem

Typical logging crates offer one global switch per log level, or per module path at best.
That is rarely the question one asks while debugging. One wants to see *everything about the
network layer*, but only *warnings from the UI*, on the console; and *everything*, always, in
the file that goes into a bug report.

# Domains

Every log statement names a *log domain*, a path such as `/NET/IO`. Domains form a tree that
grows as statements use new paths. Each logger holds one verbosity per domain, and a new
domain inherits the verbosity of its parent. So

```rust
use loxlog::{caller, Logger, Lox, MemoryLogger, Verbosity};
use std::sync::Arc;

let lox = Lox::new("DOMAINS");
let logger = Arc::new(MemoryLogger::new("MEM"));
lox.set_verbosity(caller!(), logger.clone(), Verbosity::Warning, "/");
lox.set_verbosity(caller!(), logger.clone(), Verbosity::Verbose, "/NET");

lox.info(caller!(), "/NET/IO", &[&"shown"]);
lox.info(caller!(), "/UI", &[&"hidden"]);
assert_eq!(logger.cnt_logs(), 1);
```

Each setting carries a [`Priority`]. Settings from the environment outrank settings made in
code, so a user can turn up logging without recompiling.

# Scopes

Statements rarely spell out absolute paths. A source file, a function or a thread can be
given a *scope domain*, and the relative domain of a statement is appended to the scope
domains in effect at its call site. Prefixes, log-once counters and stored data attach to
scopes the same way. The call site is captured with [`caller!`].

# Loggers

A [`Logger`] receives every statement its verbosity admits. The text loggers shipped here,
[`ConsoleLogger`] and [`MemoryLogger`], share a configurable pipeline: meta-information such
as time, thread and source location, multi-line layout, and column auto-sizing (see
[`text_logger`]).

# Multithreading

A [`Lox`] is `Sync`. Its lock is recursive, so objects that log while they are being
rendered into another statement do not deadlock.

# Diagnostics

A `Lox` reports on itself: configuration calls and anomalies are logged to the internal
domain tree (`$/`), which is visible at verbosity `Warning` on every attached logger by
default. [`Lox::get_state`] dumps the complete configuration.
*/

pub mod config;
mod console_logger;
pub mod domain;
mod environment;
pub mod format;
pub mod logable;
mod log_record;
mod logger;
mod lox;
mod macros;
mod memory_logger;
mod reentrant;
pub mod scope;
mod sys;
pub mod text_logger;
mod thread;
pub mod trim;
pub mod verbosity;

pub use console_logger::{ConsoleLogger, ConsoleWriter};
pub use environment::{DEFAULT_LOX_NAME, LoggingEnvironment};
pub use log_record::LogRecord;
pub use logable::{LogIt, Logable, SharedLogable};
pub use logger::Logger;
pub use lox::{Lox, StateInfo, StoredData};
pub use memory_logger::{MemoryLogger, MemoryWriter};
pub use scope::{Caller, Scope, ScopeInfo};
pub use sys::{Duration, Instant, SystemTime};
pub use thread::ThreadIdent;
pub use verbosity::{Inclusion, ParseVerbosityError, Priority, Reach, Sensitivity, Verbosity};

#[doc(hidden)]
pub mod hidden {
    pub use crate::macros::function_path;
}
extern crate self as loxlog;
