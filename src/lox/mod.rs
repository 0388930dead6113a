// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
The `Lox`: the object log statements and configuration calls go through.

A `Lox` owns two domain trees, one for the application (`/`) and one for its own diagnostics
(`$/`), the attached loggers, and everything attached to scopes: default domains, prefixes,
log-once counters and stored data.

Every method takes the [`Caller`] of the call as its first argument, usually written as
[`caller!()`](crate::caller). The caller decides which scope-bound settings apply.

# Locking

Each call holds the `Lox` lock for its full duration, so statements of different threads never
interleave. The lock is recursive: a [`Logable`] may log through the same `Lox` while it is
being rendered, and that nested statement runs to completion inside the outer one.

# Diagnostics

Configuration calls report what they did as records in the internal tree, below
[`Lox::INTERNAL_DOMAINS`]. Anomalies (unknown loggers, illegal arguments) are logged with
verbosity `Warning` or `Error`. Loggers are attached to the internal tree as well, where the
default verbosity `Warning` makes these visible without any configuration.

```
use loxlog::{caller, Lox, MemoryLogger, Verbosity};
use std::sync::Arc;

let lox = Lox::new("DOC");
let diagnostics = Arc::new(MemoryLogger::new("DIAG"));
lox.set_verbosity(caller!(), diagnostics.clone(), Verbosity::Warning, Lox::INTERNAL_DOMAINS);

lox.remove_logger_by_name(caller!(), "NO_SUCH_LOGGER");
assert_eq!(lox.internal_diagnostics(), 1);
assert!(diagnostics.memory_log().contains("NO_SUCH_LOGGER"));
```
*/

mod engine;
mod state;

pub use self::engine::StoredData;
pub use self::state::StateInfo;

use self::engine::{LoxState, Note, Notes, Prepared, Substitution, Verbatim};
use crate::environment::{LoggingEnvironment, Shared};
use crate::log_record::LogRecord;
use crate::logable::{concat, Logable, SharedLogable};
use crate::logger::Logger;
use crate::reentrant::{ReentrantGuard, ReentrantLock};
use crate::scope::{Caller, Scope, ScopeInfo};
use crate::sys::Instant;
use crate::trim::{SourcePathTrimRule, TrimRuleError};
use crate::verbosity::{Inclusion, Priority, Reach, Sensitivity, Verbosity};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicBool, Ordering};

type Guard<'a> = ReentrantGuard<'a, RefCell<LoxState>>;

/// Logging depth at which a recursion warning is printed.
#[cfg(debug_assertions)]
const RECURSION_WARNING_DEPTH: usize = 5;

/// A logging facade. See the [module docs](self).
pub struct Lox {
    name: String,
    env: Arc<Shared>,
    lock: ReentrantLock<RefCell<LoxState>>,
    #[cfg(debug_assertions)]
    recursion_reported: AtomicBool,
}

impl std::fmt::Debug for Lox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lox")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/*
Boilerplate notes.

Clone: a Lox owns its trees and scope stores; sharing goes through Arc<Lox>.
PartialEq/Hash: no meaningful equality beyond identity.
Default: every Lox needs a name, and the default one lives in the LoggingEnvironment.
Send/Sync: automatic, the state sits behind the recursive lock.
*/

impl Lox {
    /// Domain path prefix addressing the internal tree, e.g. `"$/LGR"`.
    pub const INTERNAL_DOMAINS: &'static str = "$/";

    /// A `Lox` attached to the [global environment](LoggingEnvironment::global).
    pub fn new(name: &str) -> Self {
        Self::with_environment(name, LoggingEnvironment::global())
    }

    /// A `Lox` sharing trim rules and configuration with `env`.
    pub fn with_environment(name: &str, env: &LoggingEnvironment) -> Self {
        Lox {
            name: name.to_string(),
            env: env.shared().clone(),
            lock: ReentrantLock::new(RefCell::new(LoxState::new(name))),
            #[cfg(debug_assertions)]
            recursion_reported: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of statements issued on this `Lox`, accepted or not.
    pub fn cnt_logs(&self) -> usize {
        self.lock.lock().borrow().cnt_logs
    }

    /// Number of internal `Warning` and `Error` diagnostics emitted so far.
    pub fn internal_diagnostics(&self) -> usize {
        self.lock.lock().borrow().internal_diagnostics
    }

    /// Detaches all loggers and forgets every setting, as if newly created.
    pub fn reset(&self) {
        let guard = self.lock.lock();
        *guard.borrow_mut() = LoxState::new(&self.name);
    }

    // ----- plumbing -----

    fn acquire(&self) -> Guard<'_> {
        let guard = self.lock.lock();
        #[cfg(debug_assertions)]
        if guard.depth() == RECURSION_WARNING_DEPTH
            && !self.recursion_reported.swap(true, Ordering::Relaxed)
        {
            eprintln!(
                "loxlog: logging recursion depth {} reached on lox '{}'; \
                 a logable probably logs while being rendered",
                RECURSION_WARNING_DEPTH, self.name
            );
        }
        guard
    }

    /// Runs a configuration step on the state, then logs the notes it produced.
    fn configure<R>(
        &self,
        caller: Caller,
        f: impl FnOnce(&mut LoxState, &Shared, &ScopeInfo, &mut Notes) -> R,
    ) -> R {
        let guard = self.acquire();
        let mut notes = Notes::default();
        let (result, scope) = {
            let mut state = guard.borrow_mut();
            let scope = state.scope_info(&self.env, caller);
            (f(&mut state, &self.env, &scope, &mut notes), scope)
        };
        self.emit(&guard, &scope, notes);
        result
    }

    fn emit(&self, guard: &Guard<'_>, scope: &ScopeInfo, notes: Notes) {
        for Note {
            verbosity,
            subdomain,
            message,
        } in notes.0
        {
            let prepared = guard
                .borrow_mut()
                .prepare_internal(&self.env, subdomain, verbosity);
            let message = Verbatim(message);
            Self::dispatch(scope, verbosity, prepared, &[&message]);
        }
    }

    fn dispatch(
        scope: &ScopeInfo,
        verbosity: Verbosity,
        prepared: Prepared,
        logables: &[&dyn Logable],
    ) {
        if prepared.loggers.is_empty() {
            return;
        }
        let mut all: Vec<&dyn Logable> =
            Vec::with_capacity(prepared.front.len() + logables.len() + prepared.back.len());
        all.extend(prepared.front.iter().map(|p| &**p as &dyn Logable));
        all.extend_from_slice(logables);
        all.extend(prepared.back.iter().map(|p| &**p as &dyn Logable));
        let record = LogRecord::new(&prepared.domain, verbosity, &all, scope);
        for logger in &prepared.loggers {
            logger.log(&record);
        }
    }

    fn statement(
        &self,
        guard: &Guard<'_>,
        caller: Caller,
        domain: &str,
        verbosity: Verbosity,
        logables: &[&dyn Logable],
    ) {
        let mut notes = Notes::default();
        let (scope, prepared) = {
            let mut state = guard.borrow_mut();
            let scope = state.scope_info(&self.env, caller);
            let prepared = state.prepare(&self.env, &scope, domain, verbosity, &mut notes);
            (scope, prepared)
        };
        self.emit(guard, &scope, notes);
        Self::dispatch(&scope, verbosity, prepared, logables);
    }

    // ----- loggers and verbosity -----

    /// Attaches `logger` if needed and sets its verbosity on `domain` with
    /// [`Priority::STANDARD`].
    ///
    /// A relative `domain` (also the empty one) is resolved against the default domains of
    /// the caller's scopes, exactly like the domain of a log statement. Domains starting with
    /// [`Lox::INTERNAL_DOMAINS`] address the internal tree.
    pub fn set_verbosity(
        &self,
        caller: Caller,
        logger: Arc<dyn Logger>,
        verbosity: Verbosity,
        domain: &str,
    ) {
        self.set_verbosity_with_priority(caller, logger, verbosity, domain, Priority::STANDARD)
    }

    /// Like [`set_verbosity`](Self::set_verbosity). The setting is rejected if one with a
    /// higher priority is stored on the domain.
    pub fn set_verbosity_with_priority(
        &self,
        caller: Caller,
        logger: Arc<dyn Logger>,
        verbosity: Verbosity,
        domain: &str,
        priority: Priority,
    ) {
        self.configure(caller, |state, env, scope, notes| {
            let slot = state.register_logger(env, &logger, notes);
            apply_verbosity(state, env, scope, slot, verbosity, domain, priority, notes);
        })
    }

    /// Sets the verbosity of an attached logger found by name (case-insensitive).
    pub fn set_verbosity_by_name(
        &self,
        caller: Caller,
        logger: &str,
        verbosity: Verbosity,
        domain: &str,
        priority: Priority,
    ) {
        self.configure(caller, |state, env, scope, notes| {
            match state.domains.logger_slot_by_name(logger) {
                Some(slot) => {
                    apply_verbosity(state, env, scope, slot, verbosity, domain, priority, notes)
                }
                None => notes.warning(
                    "LGR",
                    format!(
                        "Logger not found. Request was: set_verbosity('{}', '{}', \
                         Verbosity::{}, {}).",
                        logger, domain, verbosity, priority
                    ),
                ),
            }
        })
    }

    /// Detaches `logger` from both trees. Returns it, or `None` if it was not attached.
    pub fn remove_logger(&self, caller: Caller, logger: &dyn Logger) -> Option<Arc<dyn Logger>> {
        self.configure(caller, |state, _, _, notes| {
            match state.domains.logger_slot(logger) {
                Some(slot) => Some(state.unregister_logger(slot, notes)),
                None => {
                    notes.warning(
                        "LGR",
                        format!("Logger '{}' not found. Nothing removed.", logger.name()),
                    );
                    None
                }
            }
        })
    }

    /// Detaches the most recently attached logger called `name`.
    pub fn remove_logger_by_name(&self, caller: Caller, name: &str) -> Option<Arc<dyn Logger>> {
        self.configure(caller, |state, _, _, notes| {
            match state.domains.logger_slot_by_name(name) {
                Some(slot) => Some(state.unregister_logger(slot, notes)),
                None => {
                    notes.warning(
                        "LGR",
                        format!("Logger '{}' not found. Nothing removed.", name),
                    );
                    None
                }
            }
        })
    }

    /// The most recently attached logger called `name`.
    pub fn get_logger(&self, caller: Caller, name: &str) -> Option<Arc<dyn Logger>> {
        self.configure(caller, |state, _, _, notes| {
            let found = state
                .domains
                .logger_slot_by_name(name)
                .map(|slot| state.domains.logger(slot).clone());
            if found.is_none() {
                notes.warning("LGR", format!("No logger named '{}' found.", name));
            }
            found
        })
    }

    /// Resets the elapsed-time origin (`%TC`, `%TL`) of the logger called `logger`, or of
    /// every attached logger. `None` means now.
    pub fn set_start_time(&self, caller: Caller, start: Option<Instant>, logger: Option<&str>) {
        let start = start.unwrap_or_else(Instant::now);
        let targets = self.configure(caller, |state, _, _, notes| {
            let targets: Vec<Arc<dyn Logger>> = state
                .domains
                .loggers()
                .iter()
                .filter(|l| logger.is_none_or(|name| l.name().eq_ignore_ascii_case(name)))
                .cloned()
                .collect();
            match (logger, targets.is_empty()) {
                (Some(name), true) => notes.warning(
                    "LGR",
                    format!("Logger '{}' not found. Start time not set.", name),
                ),
                _ => {
                    for target in &targets {
                        notes.info(
                            "LGR",
                            format!("Logging start time of logger '{}' set.", target.name()),
                        );
                    }
                }
            }
            targets
        });
        for target in targets {
            target.set_start_time(start);
        }
    }

    // ----- scope domains -----

    /**
    Sets the default domain of `scope`, or removes it when `domain` is empty.

    Statement domains that are relative are prefixed with the default domains of all scopes
    of the call, outermost first: Global, ThreadOuter, Path, Filename, Method. The ThreadInner
    domain is appended to the statement domain. Combining stops at the first absolute path.
    */
    pub fn set_domain(&self, caller: Caller, domain: &str, scope: Scope) {
        self.configure(caller, |state, _, info, notes| {
            let Some(key) = info.key_for(scope) else {
                missing_scope_info(notes, "DMN", scope);
                return;
            };
            let domain = domain.trim();
            if domain.is_empty() {
                match state.scope_domains.remove(&key) {
                    Some(old) => notes.info(
                        "DMN",
                        format!("'{}' removed from {}.", old, scope),
                    ),
                    None => notes.warning(
                        "DMN",
                        format!("No default domain set for {}. Nothing removed.", scope),
                    ),
                }
                return;
            }
            let mut message = format!("'{}' set as default for {}.", domain, scope);
            if let Some(old) = state.scope_domains.insert(key, domain.to_string()) {
                message.push_str(&format!(" Replacing '{}'.", old));
            }
            notes.info("DMN", message);
        })
    }

    /// Removes the default domain of a thread scope if it equals `domain`.
    /// Only [`Scope::ThreadOuter`] and [`Scope::ThreadInner`] are allowed.
    pub fn remove_thread_domain(&self, caller: Caller, domain: &str, scope: Scope) {
        self.configure(caller, |state, _, info, notes| {
            if !scope.is_thread_related() {
                notes.error(
                    "DMN",
                    format!(
                        "Illegal parameter. Only Scope::ThreadOuter and Scope::ThreadInner \
                         allowed. Given: {}.",
                        scope
                    ),
                );
                return;
            }
            let Some(key) = info.key_for(scope) else {
                return;
            };
            let domain = domain.trim();
            if state.scope_domains.get(&key).map(String::as_str) == Some(domain) {
                state.scope_domains.remove(&key);
                notes.info("DMN", format!("'{}' removed from {}.", domain, scope));
            } else {
                notes.warning(
                    "DMN",
                    format!("Domain '{}' not found in {}. Nothing removed.", domain, scope),
                );
            }
        })
    }

    /**
    Adds a rule replacing parts of resolved domain paths.

    `pattern` is matched against absolute paths: `/A` exactly, `/A*` as a prefix, `*A` as a
    suffix and `*A*` anywhere. An empty `pattern` removes all rules, an empty `replacement`
    removes the rule with that pattern. Rules are applied repeatedly until nothing changes.
    */
    pub fn set_domain_substitution_rule(&self, caller: Caller, pattern: &str, replacement: &str) {
        self.configure(caller, |state, _, _, notes| {
            if pattern.trim().is_empty() {
                state.substitutions.clear();
                state.circular_reported = false;
                notes.info("DMN", "Domain substitution rules removed.".to_string());
                return;
            }
            let Some((kind, search)) = Substitution::parse(pattern) else {
                notes.warning(
                    "DMN",
                    format!("Illegal domain substitution rule '{}'. Nothing stored.", pattern),
                );
                return;
            };
            let existing = state
                .substitutions
                .iter()
                .position(|r| r.kind == kind && r.pattern == search);
            let replacement = replacement.trim();
            match (existing, replacement.is_empty()) {
                (Some(pos), true) => {
                    let removed = state.substitutions.remove(pos);
                    notes.info(
                        "DMN",
                        format!(
                            "Domain substitution rule '{}' removed.",
                            removed.display_pattern()
                        ),
                    );
                }
                (None, true) => notes.warning(
                    "DMN",
                    format!(
                        "Domain substitution rule '{}' not found. Nothing to remove.",
                        pattern
                    ),
                ),
                (existing, false) => {
                    let rule = Substitution {
                        kind,
                        pattern: search,
                        replacement: replacement.to_string(),
                    };
                    let message = format!(
                        "Domain substitution rule '{}' -> '{}' set.",
                        rule.display_pattern(),
                        rule.replacement
                    );
                    match existing {
                        Some(pos) => state.substitutions[pos] = rule,
                        None => state.substitutions.push(rule),
                    }
                    notes.info("DMN", message);
                }
            }
        })
    }

    // ----- prefixes -----

    /// Sets the prefix logable of `scope`, or removes it with `None`.
    pub fn set_prefix(&self, caller: Caller, prefix: Option<SharedLogable>, scope: Scope) {
        let prefix = prefix.map(with_rendering);
        self.configure(caller, |state, _, info, notes| {
            let Some(key) = info.key_for(scope) else {
                missing_scope_info(notes, "PFX", scope);
                return;
            };
            match prefix {
                Some((prefix, rendered)) => {
                    state.prefixes.insert(key, prefix);
                    notes.info(
                        "PFX",
                        format!("Prefix \"{}\" set for {}.", rendered, scope),
                    );
                }
                None => match state.prefixes.remove(&key) {
                    Some(_) => notes.info("PFX", format!("Prefix removed from {}.", scope)),
                    None => notes.warning(
                        "PFX",
                        format!("No prefix set for {}. Nothing removed.", scope),
                    ),
                },
            }
        })
    }

    /// Adds a prefix to `domain`, or removes the one added last with `None`.
    ///
    /// With [`Inclusion::Exclude`], statements on the domain and its sub-domains get neither
    /// the prefixes of parent domains nor scope prefixes.
    pub fn set_domain_prefix(
        &self,
        caller: Caller,
        prefix: Option<SharedLogable>,
        domain: &str,
        inclusion: Inclusion,
    ) {
        let prefix = prefix.map(with_rendering);
        self.configure(caller, |state, env, info, notes| {
            let (internal, id) = state.config_domain(env, info, domain, notes);
            if internal {
                notes.error(
                    "PFX",
                    "Prefixes cannot be set on internal domains.".to_string(),
                );
                return;
            }
            let path = state.domains.full_path(id).to_string();
            let prefixes = &mut state.domains.node_mut(id).prefixes;
            match prefix {
                Some((prefix, rendered)) => {
                    prefixes.push((prefix, inclusion));
                    notes.info(
                        "PFX",
                        format!("Prefix \"{}\" added to domain '{}'.", rendered, path),
                    );
                }
                None => match prefixes.pop() {
                    Some(_) => notes.info(
                        "PFX",
                        format!("Last prefix of domain '{}' removed.", path),
                    ),
                    None => notes.warning(
                        "PFX",
                        format!("No prefix set for domain '{}'. Nothing removed.", path),
                    ),
                },
            }
        })
    }

    // ----- threads and source paths -----

    /// Renders thread `id` (the calling thread with `None`) as `name` in `%tN`.
    pub fn map_thread_name(&self, caller: Caller, name: &str, id: Option<u64>) {
        self.configure(caller, |state, _, info, notes| {
            let id = id.unwrap_or(info.thread_id());
            let mut message = format!("Mapped thread ID {} to '{}'.", id, name);
            if let Some(old) = state.thread_names.insert(id, name.to_string()) {
                message.push_str(&format!(" Replacing '{}'.", old));
            }
            notes.info("THR", message);
        })
    }

    /**
    Adds a source path trim rule, see [`trim`](crate::trim).

    [`Reach::Global`] rules are stored in the environment and apply to every `Lox` sharing it,
    [`Reach::Local`] rules to this `Lox` only. Local rules are tried first on equal priority.
    */
    #[allow(clippy::too_many_arguments)]
    pub fn set_source_path_trim_rule(
        &self,
        caller: Caller,
        pattern: &str,
        inclusion: Inclusion,
        offset: i32,
        sensitivity: Sensitivity,
        replacement: &str,
        reach: Reach,
        priority: Priority,
    ) {
        self.configure(caller, |state, env, _, notes| {
            let result = SourcePathTrimRule::new(
                pattern,
                inclusion,
                offset,
                sensitivity,
                replacement,
                priority,
            )
            .and_then(|rule| {
                let description = rule.to_string();
                let inserted = match reach {
                    Reach::Local => state.trim_rules.insert(rule),
                    Reach::Global => env.with_trim_rules_mut(|rules| rules.insert(rule)),
                };
                inserted.map(|()| description)
            });
            match result {
                Ok(description) => notes.info(
                    "DMN",
                    format!("Source path trim rule set ({:?}): {}", reach, description),
                ),
                Err(err @ TrimRuleError::Malformed(_)) => {
                    notes.error("DMN", format!("{}. Rule ignored.", err))
                }
                Err(err @ TrimRuleError::LowerPriority { .. }) => {
                    notes.info("DMN", format!("{}. Rule ignored.", err))
                }
            }
        })
    }

    /// Removes the local or the global source path trim rules.
    pub fn clear_source_path_trim_rules(&self, caller: Caller, reach: Reach) {
        self.configure(caller, |state, env, _, notes| {
            match reach {
                Reach::Local => state.trim_rules.clear(),
                Reach::Global => env.with_trim_rules_mut(|rules| rules.clear()),
            }
            notes.info(
                "DMN",
                format!("Source path trim rules cleared ({:?}).", reach),
            );
        })
    }

    // ----- statements -----

    /// Logs `logables` on `domain` with `verbosity`.
    pub fn entry(
        &self,
        caller: Caller,
        domain: &str,
        verbosity: Verbosity,
        logables: &[&dyn Logable],
    ) {
        let guard = self.acquire();
        self.statement(&guard, caller, domain, verbosity, logables);
    }

    pub fn error(&self, caller: Caller, domain: &str, logables: &[&dyn Logable]) {
        self.entry(caller, domain, Verbosity::Error, logables)
    }

    pub fn warning(&self, caller: Caller, domain: &str, logables: &[&dyn Logable]) {
        self.entry(caller, domain, Verbosity::Warning, logables)
    }

    pub fn info(&self, caller: Caller, domain: &str, logables: &[&dyn Logable]) {
        self.entry(caller, domain, Verbosity::Info, logables)
    }

    pub fn verbose(&self, caller: Caller, domain: &str, logables: &[&dyn Logable]) {
        self.entry(caller, domain, Verbosity::Verbose, logables)
    }

    /**
    Logs `logables`, taking the first one as the domain if it looks like one.

    A first logable is a domain if it is a string made of upper-case letters, digits and
    `/ _ - .` only, and more logables follow it.

    ```
    use loxlog::{caller, Lox, MemoryLogger, Verbosity};
    use std::sync::Arc;

    let lox = Lox::new("DETECT");
    let logger = Arc::new(MemoryLogger::new("MEM"));
    lox.set_verbosity(caller!(), logger.clone(), Verbosity::Verbose, "/");
    logger.text_logger().update_config(|c| c.format = "[%D] ".to_string());

    lox.entry_detect_domain(caller!(), Verbosity::Info, &[&"not a domain"]);
    lox.entry_detect_domain(caller!(), Verbosity::Info, &[&"NET/IO", &"connected"]);
    assert_eq!(logger.memory_log(), "[/] not a domain\n[/NET/IO] connected\n");
    ```
    */
    pub fn entry_detect_domain(
        &self,
        caller: Caller,
        verbosity: Verbosity,
        logables: &[&dyn Logable],
    ) {
        if let [first, rest @ ..] = logables {
            if !rest.is_empty() {
                if let Some(domain) = first.format_pattern().filter(|s| is_domain_name(s)) {
                    return self.entry(caller, domain, verbosity, rest);
                }
            }
        }
        self.entry(caller, "", verbosity, logables)
    }

    /// Logs with [`Verbosity::Error`] if `condition` is false.
    pub fn log_assert(
        &self,
        caller: Caller,
        condition: bool,
        domain: &str,
        logables: &[&dyn Logable],
    ) {
        if !condition {
            self.entry(caller, domain, Verbosity::Error, logables)
        }
    }

    /// Logs if `condition` is true.
    pub fn log_if(
        &self,
        caller: Caller,
        condition: bool,
        domain: &str,
        verbosity: Verbosity,
        logables: &[&dyn Logable],
    ) {
        if condition {
            self.entry(caller, domain, verbosity, logables)
        }
    }

    /**
    Logs only a limited number of times.

    Occurrences are counted per `group` within `scope`. An empty group in [`Scope::Global`]
    counts the call site itself. With a positive `quantity` the first `quantity` occurrences
    are logged; with a negative one, every `-quantity`-th occurrence starting with the first.
    */
    #[allow(clippy::too_many_arguments)]
    pub fn once(
        &self,
        caller: Caller,
        domain: &str,
        verbosity: Verbosity,
        logables: &[&dyn Logable],
        group: &str,
        scope: Scope,
        quantity: i64,
    ) {
        let guard = self.acquire();
        let mut notes = Notes::default();
        let (info, log, limit_reached) = {
            let mut state = guard.borrow_mut();
            let info = state.scope_info(&self.env, caller);
            match info.key_for(scope) {
                None => {
                    missing_scope_info(&mut notes, "LGD", scope);
                    (info, false, None)
                }
                Some(key) => {
                    let group = if group.is_empty() && scope == Scope::Global {
                        format!("{}:{}", caller.file, caller.line)
                    } else {
                        group.to_string()
                    };
                    let counter = state
                        .once
                        .get_or_insert_with(key, HashMap::new)
                        .entry(group.clone())
                        .or_insert(0);
                    let (log, reached) = count_once(counter, quantity);
                    (info, log, reached.then_some(group))
                }
            }
        };
        self.emit(&guard, &info, notes);
        if log {
            self.statement(&guard, caller, domain, verbosity, logables);
        }
        if let Some(group) = limit_reached {
            let mut notes = Notes::default();
            notes.info(
                "LGD",
                format!(
                    "Once() reached limit of {} logs. No further logs for group '{}' in {}.",
                    quantity, group, scope
                ),
            );
            self.emit(&guard, &info, notes);
        }
    }

    // ----- stored data -----

    /// Stores `data` under `key` in `scope`. `None` deletes the entry.
    pub fn store(&self, caller: Caller, data: Option<StoredData>, key: &str, scope: Scope) {
        self.configure(caller, |state, _, info, notes| {
            let Some(scope_key) = info.key_for(scope) else {
                missing_scope_info(notes, "LGD", scope);
                return;
            };
            match data {
                Some(data) => {
                    let replaced = state
                        .log_data
                        .get_or_insert_with(scope_key, HashMap::new)
                        .insert(key.to_string(), data);
                    notes.info(
                        "LGD",
                        format!(
                            "Stored data in {} with key '{}'{}.",
                            scope,
                            key,
                            if replaced.is_some() { ", replacing" } else { "" }
                        ),
                    );
                }
                None => {
                    let removed = state
                        .log_data
                        .get_mut(&scope_key)
                        .and_then(|map| map.remove(key));
                    if state.log_data.get(&scope_key).is_some_and(HashMap::is_empty) {
                        state.log_data.remove(&scope_key);
                    }
                    match removed {
                        Some(_) => notes.info(
                            "LGD",
                            format!("Deleted data in {} with key '{}'.", scope, key),
                        ),
                        None => notes.info(
                            "LGD",
                            format!("No data to delete in {} with key '{}'.", scope, key),
                        ),
                    }
                }
            }
        })
    }

    /// The data stored under `key` in `scope`.
    pub fn retrieve(&self, caller: Caller, key: &str, scope: Scope) -> Option<StoredData> {
        self.configure(caller, |state, _, info, notes| {
            let Some(scope_key) = info.key_for(scope) else {
                missing_scope_info(notes, "LGD", scope);
                return None;
            };
            let found = state
                .log_data
                .get(&scope_key)
                .and_then(|map| map.get(key))
                .cloned();
            notes.info(
                "LGD",
                format!(
                    "Data {} in {} with key '{}'.",
                    if found.is_some() { "retrieved" } else { "not found" },
                    scope,
                    key
                ),
            );
            found
        })
    }

    // ----- queries -----

    /// Number of loggers that would accept a statement of `verbosity` on `domain`.
    pub fn is_active(&self, caller: Caller, domain: &str, verbosity: Verbosity) -> usize {
        self.configure(caller, |state, env, info, notes| {
            let (internal, id) = state.config_domain(env, info, domain, notes);
            let tree = state.tree(internal);
            (0..tree.loggers().len())
                .filter(|&slot| tree.accepts(id, slot, verbosity))
                .count()
        })
    }

    /// Renders the sections of the configuration selected by `flags`.
    pub fn get_state(&self, flags: StateInfo) -> String {
        let guard = self.acquire();
        let prefixes = Self::rendered_prefixes(&guard, flags);
        let current = guard.borrow();
        state::render(&current, &self.env, flags, &prefixes)
    }

    /// Prefix texts for a state dump, rendered without the state borrowed.
    fn rendered_prefixes(guard: &Guard<'_>, flags: StateInfo) -> Vec<(String, String)> {
        if !flags.contains(StateInfo::PREFIXES) {
            return Vec::new();
        }
        let entries = state::prefix_entries(&guard.borrow());
        entries
            .into_iter()
            .map(|(prefix, location)| (with_rendering(prefix).1, location))
            .collect()
    }

    /// Logs `headline` followed by [`get_state`](Self::get_state) as one multi-line statement.
    pub fn state(
        &self,
        caller: Caller,
        domain: &str,
        verbosity: Verbosity,
        headline: &str,
        flags: StateInfo,
    ) {
        let guard = self.acquire();
        let prefixes = Self::rendered_prefixes(&guard, flags);
        let text = state::render(&guard.borrow(), &self.env, flags, &prefixes);
        let mut message = String::new();
        if !headline.is_empty() {
            message.push_str(headline);
            message.push('\n');
        }
        message.push_str(text.trim_end());
        let message = Verbatim(message);
        self.statement(&guard, caller, domain, verbosity, &[&message]);
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_verbosity(
    state: &mut LoxState,
    env: &Shared,
    scope: &ScopeInfo,
    slot: usize,
    verbosity: Verbosity,
    domain: &str,
    priority: Priority,
    notes: &mut Notes,
) {
    let (internal, id) = state.config_domain(env, scope, domain, notes);
    let tree = state.tree(internal);
    let name = tree.logger(slot).name().to_string();
    let path = tree.full_path(id).to_string();
    let tree = if internal {
        &mut state.internal
    } else {
        &mut state.domains
    };
    let message = match tree.set_verbosity(id, slot, verbosity, priority) {
        Ok(_) => format!(
            "Logger '{}': '{}' = Verbosity::{} ({}).",
            name, path, verbosity, priority
        ),
        Err(stored) => format!(
            "Logger '{}': '{}' = Verbosity::{} ({}). Lower priority ({} < {}). Remains {}.",
            name, path, verbosity, priority, priority, stored.priority, stored.verbosity
        ),
    };
    notes.info("LGR", message);
}

/// Pairs a prefix with its text. Must run without the state borrowed, rendering may log.
fn with_rendering(prefix: SharedLogable) -> (SharedLogable, String) {
    let rendered = concat(&[&*prefix as &dyn Logable]);
    (prefix, rendered)
}

fn missing_scope_info(notes: &mut Notes, subdomain: &'static str, scope: Scope) {
    notes.error(
        subdomain,
        format!("Missing scope information. Cannot use {}.", scope),
    );
}

/// Advances a log-once counter. Returns whether to log, and whether the limit was just reached.
fn count_once(counter: &mut i64, quantity: i64) -> (bool, bool) {
    if quantity >= 0 {
        if *counter < quantity {
            *counter += 1;
            (true, *counter == quantity)
        } else {
            (false, false)
        }
    } else {
        let log = counter.unsigned_abs() % quantity.unsigned_abs() == 0;
        *counter += 1;
        (log, false)
    }
}

fn is_domain_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || "/_-.".contains(c))
}
