// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable dumps of a `Lox` configuration.

use super::engine::LoxState;
use crate::environment::Shared;
use crate::logable::SharedLogable;
use std::fmt::Write;
use std::ops::{BitOr, BitOrAssign};

/**
Selects the sections of [`Lox::get_state`](super::Lox::get_state).

Flags combine with `|`:

```
use loxlog::StateInfo;
let flags = StateInfo::BASIC | StateInfo::DOMAINS;
assert!(flags.contains(StateInfo::DOMAINS));
assert!(!flags.contains(StateInfo::LOGGERS));
assert!(StateInfo::ALL.contains(flags));
```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateInfo(u32);

impl StateInfo {
    pub const NONE: StateInfo = StateInfo(0);
    /// Name, version, statement counts.
    pub const BASIC: StateInfo = StateInfo(1);
    /// Source path trim rules.
    pub const SPTR: StateInfo = StateInfo(1 << 1);
    pub const LOGGERS: StateInfo = StateInfo(1 << 2);
    pub const DOMAINS: StateInfo = StateInfo(1 << 3);
    pub const INTERNAL_DOMAINS: StateInfo = StateInfo(1 << 4);
    pub const SCOPE_DOMAINS: StateInfo = StateInfo(1 << 5);
    /// Domain substitution rules.
    pub const DSR: StateInfo = StateInfo(1 << 6);
    pub const PREFIXES: StateInfo = StateInfo(1 << 7);
    pub const ONCE: StateInfo = StateInfo(1 << 8);
    pub const LOG_DATA: StateInfo = StateInfo(1 << 9);
    pub const THREAD_MAPPINGS: StateInfo = StateInfo(1 << 10);
    pub const ALL: StateInfo = StateInfo((1 << 11) - 1);

    pub fn contains(self, other: StateInfo) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for StateInfo {
    type Output = StateInfo;

    fn bitor(self, rhs: StateInfo) -> StateInfo {
        StateInfo(self.0 | rhs.0)
    }
}

impl BitOrAssign for StateInfo {
    fn bitor_assign(&mut self, rhs: StateInfo) {
        self.0 |= rhs.0;
    }
}

/// Every stored prefix with a description of where it is set.
pub(crate) fn prefix_entries(state: &LoxState) -> Vec<(SharedLogable, String)> {
    let mut entries: Vec<_> = state
        .prefixes
        .sorted()
        .into_iter()
        .map(|(key, prefix)| (prefix.clone(), key.to_string()))
        .collect();
    for id in state.domains.all() {
        for (prefix, inclusion) in &state.domains.node(id).prefixes {
            entries.push((
                prefix.clone(),
                format!(
                    "Domain '{}' ({:?})",
                    state.domains.full_path(id),
                    inclusion
                ),
            ));
        }
    }
    entries
}

/// Renders the sections selected by `flags`. Prefixes come pre-rendered as (text, location)
/// pairs, see [`prefix_entries`].
pub(crate) fn render(
    state: &LoxState,
    env: &Shared,
    flags: StateInfo,
    prefixes: &[(String, String)],
) -> String {
    let mut out = String::new();

    if flags.contains(StateInfo::BASIC) {
        let _ = writeln!(out, "Name:            \"{}\"", state.name);
        let _ = writeln!(out, "Version:         {}", env!("CARGO_PKG_VERSION"));
        let _ = writeln!(out, "Thread safeness: Safe (recursive lock)");
        let _ = writeln!(out, "#Log calls:      {}", state.cnt_logs);
        let _ = writeln!(out, "#Diagnostics:    {}", state.internal_diagnostics);
        out.push('\n');
    }

    if flags.contains(StateInfo::SPTR) {
        out.push_str("Source path trim rules:\n");
        let global = env.with_trim_rules(|rules| rules.rules().to_vec());
        if state.trim_rules.is_empty() && global.is_empty() {
            out.push_str("  <no rules set>\n");
        }
        for rule in state.trim_rules.rules() {
            let _ = writeln!(out, "  Local:  {}", rule);
        }
        for rule in &global {
            let _ = writeln!(out, "  Global: {}", rule);
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::DSR) {
        out.push_str("Domain substitution rules:\n");
        if state.substitutions.is_empty() {
            out.push_str("  <no rules set>\n");
        }
        for rule in &state.substitutions {
            let _ = writeln!(
                out,
                "  '{}' -> '{}'",
                rule.display_pattern(),
                rule.replacement
            );
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::ONCE) {
        out.push_str("Once() counters:\n");
        if state.once.is_empty() {
            out.push_str("  <no Once() counters set>\n");
        }
        for (key, groups) in state.once.sorted() {
            let mut groups: Vec<_> = groups.iter().collect();
            groups.sort();
            for (group, count) in groups {
                let _ = writeln!(out, "  {}  group \"{}\": {}", key, group, count);
            }
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::LOG_DATA) {
        out.push_str("Log data:\n");
        if state.log_data.is_empty() {
            out.push_str("  <no data objects stored>\n");
        }
        for (key, data) in state.log_data.sorted() {
            let mut names: Vec<_> = data.keys().collect();
            names.sort();
            for name in names {
                let _ = writeln!(out, "  {}  key \"{}\"", key, name);
            }
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::PREFIXES) {
        out.push_str("Prefix logables:\n");
        if prefixes.is_empty() {
            out.push_str("  <no prefix logables set>\n");
        }
        for (text, location) in prefixes {
            let _ = writeln!(out, "  \"{}\"  {}", text, location);
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::THREAD_MAPPINGS) {
        out.push_str("Named threads:\n");
        if state.thread_names.is_empty() {
            out.push_str("  <no thread name mappings set>\n");
        }
        let mut mappings: Vec<_> = state.thread_names.iter().collect();
        mappings.sort();
        for (id, name) in mappings {
            let _ = writeln!(out, "  ({}): \"{}\"", id, name);
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::SCOPE_DOMAINS) {
        out.push_str("Scope domains:\n");
        if state.scope_domains.is_empty() {
            out.push_str("  <no scope domains set>\n");
        }
        for (key, domain) in state.scope_domains.sorted() {
            let _ = writeln!(out, "  {:<40} '{}'", key.to_string(), domain);
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::LOGGERS) {
        out.push_str("Loggers:\n");
        if state.domains.loggers().is_empty() {
            out.push_str("  <no loggers attached>\n");
        }
        for logger in state.domains.loggers() {
            let _ = writeln!(
                out,
                "  {} ({})  #logs: {}",
                logger.name(),
                logger.type_name(),
                logger.cnt_logs()
            );
        }
        out.push('\n');
    }

    if flags.contains(StateInfo::INTERNAL_DOMAINS) {
        out.push_str("Internal domains:\n");
        out.push_str(&state.internal.dump(None, None));
        out.push('\n');
    }

    if flags.contains(StateInfo::DOMAINS) {
        out.push_str("Domains:\n");
        out.push_str(&state.domains.dump(None, None));
        out.push('\n');
    }

    out
}
