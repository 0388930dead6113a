// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scopes, call sites and scope-keyed storage.
//!
//! A *scope* is an extent a setting can be attached to: the whole `Lox`, a thread, a source
//! directory, a source file, a function. Settings attached to scopes are default domains,
//! prefixes, log-once counters and stored data. All of them live in a [`ScopeStore`], a single
//! map keyed by [`ScopeKey`].
//!
//! Which keys apply to a given log statement depends on its [`ScopeInfo`], which is assembled
//! from the [`Caller`] (captured by the macros at the call site) and the calling thread.

use crate::sys::{Instant, SystemTime};
use crate::thread::ThreadIdent;
use std::collections::HashMap;
use std::fmt::Display;

/// Source location of a log statement or configuration call.
///
/// Usually built by [`caller!`](crate::caller). `function` holds the path of the enclosing
/// function as reported by the compiler, e.g. `my_crate::net::connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl Caller {
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Caller {
            file,
            line,
            function,
        }
    }

    /// A caller without any source information.
    pub const fn unknown() -> Self {
        Caller {
            file: "",
            line: 0,
            function: "",
        }
    }

    /// File and line of whoever called the `#[track_caller]` function this is evaluated in.
    /// The function name is not available this way.
    #[track_caller]
    pub fn here() -> Self {
        let location = std::panic::Location::caller();
        Caller {
            file: location.file(),
            line: location.line(),
            function: "",
        }
    }

    /// Directory part of `file`, without a trailing separator.
    pub fn directory(&self) -> &'static str {
        match self.file.rfind(['/', '\\']) {
            Some(idx) => &self.file[..idx],
            None => "",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self.file.rfind(['/', '\\']) {
            Some(idx) => &self.file[idx + 1..],
            None => self.file,
        }
    }

    /// File name without its extension.
    pub fn file_stem(&self) -> &'static str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    /// Last segment of `function`, e.g. `connect` for `my_crate::net::connect`.
    pub fn method(&self) -> &'static str {
        match self.function.rfind("::") {
            Some(idx) => &self.function[idx + 2..],
            None => self.function,
        }
    }
}

impl Default for Caller {
    fn default() -> Self {
        Caller::unknown()
    }
}

/// Everything known about one log statement or configuration call while it is processed.
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    pub(crate) caller: Caller,
    pub(crate) trimmed_dir: String,
    pub(crate) thread: ThreadIdent,
    pub(crate) thread_name: String,
    pub(crate) timestamp: Instant,
    pub(crate) system_time: SystemTime,
    pub(crate) lox_name: String,
}

impl ScopeInfo {
    /// Snapshot for the calling thread. `trimmed_dir` is the caller's directory after the
    /// source-path trim rules; `thread_name` already reflects any name mapping.
    pub(crate) fn new(
        caller: Caller,
        trimmed_dir: String,
        thread: ThreadIdent,
        thread_name: String,
        lox_name: &str,
    ) -> Self {
        ScopeInfo {
            caller,
            trimmed_dir,
            thread,
            thread_name,
            timestamp: Instant::now(),
            system_time: SystemTime::now(),
            lox_name: lox_name.to_string(),
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
    pub fn trimmed_dir(&self) -> &str {
        &self.trimmed_dir
    }
    pub fn thread_id(&self) -> u64 {
        self.thread.id
    }
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
    pub fn system_time(&self) -> SystemTime {
        self.system_time
    }
    pub fn lox_name(&self) -> &str {
        &self.lox_name
    }

    fn file_key(&self) -> Option<String> {
        if self.caller.file.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.trimmed_dir, self.caller.file_stem()))
    }

    /// Keys of the source-related scopes, innermost first: method, file, then every directory
    /// from the file's own up to the root.
    pub(crate) fn language_keys(&self) -> Vec<ScopeKey> {
        let mut keys = Vec::new();
        let Some(file_key) = self.file_key() else {
            return keys;
        };
        if !self.caller.function.is_empty() {
            keys.push(ScopeKey::Method(file_key.clone(), self.caller.function.to_string()));
        }
        keys.push(ScopeKey::Filename(file_key));
        let mut dir = self.trimmed_dir.as_str();
        keys.push(ScopeKey::Path(dir.to_string()));
        while let Some(idx) = dir.rfind('/') {
            dir = &dir[..idx];
            keys.push(ScopeKey::Path(dir.to_string()));
        }
        if !dir.is_empty() {
            keys.push(ScopeKey::Path(String::new()));
        }
        keys
    }

    /// Keys of every scope but ThreadInner, innermost first.
    pub(crate) fn outer_keys(&self) -> Vec<ScopeKey> {
        let mut keys = self.language_keys();
        keys.push(ScopeKey::ThreadOuter(self.thread.id));
        keys.push(ScopeKey::Global);
        keys
    }

    /// The key `scope` denotes for this call, or `None` when the caller lacks the source
    /// information the scope needs.
    pub(crate) fn key_for(&self, scope: Scope) -> Option<ScopeKey> {
        match scope {
            Scope::Global => Some(ScopeKey::Global),
            Scope::ThreadOuter => Some(ScopeKey::ThreadOuter(self.thread.id)),
            Scope::ThreadInner => Some(ScopeKey::ThreadInner(self.thread.id)),
            Scope::Filename => self.file_key().map(ScopeKey::Filename),
            Scope::Method => {
                if self.caller.function.is_empty() {
                    return None;
                }
                self.file_key()
                    .map(|file| ScopeKey::Method(file, self.caller.function.to_string()))
            }
            Scope::Path(level) => {
                self.file_key()?;
                let mut dir = self.trimmed_dir.as_str();
                for _ in 0..level {
                    dir = match dir.rfind('/') {
                        Some(idx) => &dir[..idx],
                        None => "",
                    };
                }
                Some(ScopeKey::Path(dir.to_string()))
            }
        }
    }
}

/// The extents settings can be attached to, from outermost to innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    ThreadOuter,
    /// The source directory of the caller, or one of its parents (`Path(1)` is the parent).
    Path(u8),
    Filename,
    Method,
    /// Its default domain is appended to the statement's domain rather than prepended, so
    /// it applies to absolute statement domains too: `"/ABS"` becomes `"/ABS/<inner>"`.
    ThreadInner,
}

impl Scope {
    pub(crate) fn is_thread_related(self) -> bool {
        matches!(self, Scope::ThreadOuter | Scope::ThreadInner)
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => f.write_str("Scope::Global"),
            Scope::ThreadOuter => f.write_str("Scope::ThreadOuter"),
            Scope::Path(0) => f.write_str("Scope::Path"),
            Scope::Path(level) => write!(f, "Scope::Path(L{})", level),
            Scope::Filename => f.write_str("Scope::Filename"),
            Scope::Method => f.write_str("Scope::Method"),
            Scope::ThreadInner => f.write_str("Scope::ThreadInner"),
        }
    }
}

/// Concrete storage slot of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Global,
    ThreadOuter(u64),
    /// Trimmed source directory.
    Path(String),
    /// Trimmed source directory joined with the file stem.
    Filename(String),
    /// File key and function path.
    Method(String, String),
    ThreadInner(u64),
}

impl Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeKey::Global => f.write_str("Scope::Global"),
            ScopeKey::ThreadOuter(id) => write!(f, "Scope::ThreadOuter [Thread {}]", id),
            ScopeKey::Path(dir) => write!(f, "Scope::Path        [{}]", dir),
            ScopeKey::Filename(file) => write!(f, "Scope::Filename    [{}]", file),
            ScopeKey::Method(file, function) => {
                write!(f, "Scope::Method      [{} @ {}]", function, file)
            }
            ScopeKey::ThreadInner(id) => write!(f, "Scope::ThreadInner [Thread {}]", id),
        }
    }
}

/// A map from scope slots to values.
#[derive(Debug)]
pub(crate) struct ScopeStore<T> {
    map: HashMap<ScopeKey, T>,
}

impl<T> Default for ScopeStore<T> {
    fn default() -> Self {
        ScopeStore {
            map: HashMap::new(),
        }
    }
}

impl<T> ScopeStore<T> {
    pub(crate) fn get(&self, key: &ScopeKey) -> Option<&T> {
        self.map.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ScopeKey) -> Option<&mut T> {
        self.map.get_mut(key)
    }

    /// Stores `value`, returning the value it replaced.
    pub(crate) fn insert(&mut self, key: ScopeKey, value: T) -> Option<T> {
        self.map.insert(key, value)
    }

    pub(crate) fn remove(&mut self, key: &ScopeKey) -> Option<T> {
        self.map.remove(key)
    }

    pub(crate) fn get_or_insert_with(&mut self, key: ScopeKey, f: impl FnOnce() -> T) -> &mut T {
        self.map.entry(key).or_insert_with(f)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in a stable order (by their rendered key), for state dumps.
    pub(crate) fn sorted(&self) -> Vec<(&ScopeKey, &T)> {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by_key(|(key, _)| key.to_string());
        entries
    }
}
