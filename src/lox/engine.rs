// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mutable state behind a `Lox` and the resolution steps run on it.
//!
//! Everything here runs with the `Lox` lock held and the state borrowed. Nothing in this module
//! calls into loggers or logables: diagnostics are collected as [`Notes`] and statements are
//! reduced to a [`Prepared`] dispatch list, both of which the facade processes after releasing
//! the borrow.

use crate::config::{parse_verbosities, verbosity_variable_name, VerbosityRule};
use crate::domain::{DomainId, DomainTree, SEPARATOR};
use crate::environment::Shared;
use crate::logable::{Logable, SharedLogable};
use crate::logger::Logger;
use crate::scope::{Caller, ScopeInfo, ScopeKey, ScopeStore};
use crate::thread::ThreadIdent;
use crate::trim::{trim_path, TrimRules};
use crate::verbosity::{Inclusion, Priority, Verbosity};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Data kept with [`Lox::store`](super::Lox::store).
pub type StoredData = Arc<dyn Any + Send + Sync>;

/// Sub-domains of the internal tree that exist from the start.
const INTERNAL_SUBDOMAINS: [&str; 6] = ["LGR", "DMN", "PFX", "THR", "LGD", "VAR"];

/// More successive substitutions than this are taken as a cycle.
const MAX_SUBSTITUTIONS: usize = 10;

/// One internal diagnostic waiting to be logged.
#[derive(Debug)]
pub(crate) struct Note {
    pub(crate) verbosity: Verbosity,
    pub(crate) subdomain: &'static str,
    pub(crate) message: String,
}

#[derive(Debug, Default)]
pub(crate) struct Notes(pub(crate) Vec<Note>);

impl Notes {
    fn push(&mut self, verbosity: Verbosity, subdomain: &'static str, message: String) {
        self.0.push(Note {
            verbosity,
            subdomain,
            message,
        });
    }

    pub(crate) fn error(&mut self, subdomain: &'static str, message: String) {
        self.push(Verbosity::Error, subdomain, message)
    }

    pub(crate) fn warning(&mut self, subdomain: &'static str, message: String) {
        self.push(Verbosity::Warning, subdomain, message)
    }

    pub(crate) fn info(&mut self, subdomain: &'static str, message: String) {
        self.push(Verbosity::Info, subdomain, message)
    }
}

/// Message text logged as is, even if it contains braces.
#[derive(Debug)]
pub(crate) struct Verbatim(pub(crate) String);

impl Logable for Verbatim {
    fn log_to(&self, target: &mut String) {
        target.push_str(&self.0);
    }
}

/// A statement reduced to what its dispatch needs.
#[derive(Debug, Default)]
pub(crate) struct Prepared {
    pub(crate) domain: String,
    pub(crate) loggers: Vec<Arc<dyn Logger>>,
    /// Prefixes placed in front of the statement's logables.
    pub(crate) front: Vec<SharedLogable>,
    /// Prefixes placed behind them.
    pub(crate) back: Vec<SharedLogable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubstitutionKind {
    Exact,
    StartsWith,
    EndsWith,
    Substring,
}

/// A domain substitution rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Substitution {
    pub(crate) kind: SubstitutionKind,
    pub(crate) pattern: String,
    pub(crate) replacement: String,
}

impl Substitution {
    /// Splits a pattern such as `*/NET*` into kind and search string.
    pub(crate) fn parse(pattern: &str) -> Option<(SubstitutionKind, String)> {
        let pattern = pattern.trim();
        let leading = pattern.starts_with('*');
        let trailing = pattern.len() > 1 && pattern.ends_with('*');
        let inner = pattern.trim_matches('*');
        if inner.is_empty() {
            return None;
        }
        let kind = match (leading, trailing) {
            (true, true) => SubstitutionKind::Substring,
            (true, false) => SubstitutionKind::EndsWith,
            (false, true) => SubstitutionKind::StartsWith,
            (false, false) => SubstitutionKind::Exact,
        };
        let inner = match kind {
            SubstitutionKind::Exact | SubstitutionKind::StartsWith
                if !inner.starts_with(SEPARATOR) =>
            {
                format!("{}{}", SEPARATOR, inner)
            }
            _ => inner.to_string(),
        };
        Some((kind, inner))
    }

    fn apply(&self, path: &str) -> Option<String> {
        match self.kind {
            SubstitutionKind::Exact => (path == self.pattern).then(|| self.replacement.clone()),
            SubstitutionKind::StartsWith => path
                .strip_prefix(self.pattern.as_str())
                .map(|rest| format!("{}{}", self.replacement, rest)),
            SubstitutionKind::EndsWith => path
                .strip_suffix(self.pattern.as_str())
                .map(|start| format!("{}{}", start, self.replacement)),
            SubstitutionKind::Substring => path
                .contains(self.pattern.as_str())
                .then(|| path.replacen(self.pattern.as_str(), &self.replacement, 1)),
        }
    }

    /// The pattern as the user would write it.
    pub(crate) fn display_pattern(&self) -> String {
        match self.kind {
            SubstitutionKind::Exact => self.pattern.clone(),
            SubstitutionKind::StartsWith => format!("{}*", self.pattern),
            SubstitutionKind::EndsWith => format!("*{}", self.pattern),
            SubstitutionKind::Substring => format!("*{}*", self.pattern),
        }
    }
}

/// If `domain` addresses the internal tree, its path relative to that tree.
pub(crate) fn internal_path(domain: &str) -> Option<&str> {
    let rest = domain.trim().strip_prefix('$')?;
    if rest.is_empty() || rest.starts_with(SEPARATOR) {
        Some(rest)
    } else {
        None
    }
}

fn join(outer: &str, inner: &str) -> String {
    if inner.starts_with(SEPARATOR) || outer.is_empty() {
        return inner.to_string();
    }
    if inner.is_empty() {
        return outer.to_string();
    }
    format!("{}{}{}", outer.trim_end_matches(SEPARATOR), SEPARATOR, inner)
}

#[derive(Debug)]
pub(crate) struct LoxState {
    pub(crate) name: String,
    pub(crate) domains: DomainTree,
    pub(crate) internal: DomainTree,
    pub(crate) scope_domains: ScopeStore<String>,
    pub(crate) prefixes: ScopeStore<SharedLogable>,
    /// Log-once counters per scope, by group.
    pub(crate) once: ScopeStore<HashMap<String, i64>>,
    pub(crate) log_data: ScopeStore<HashMap<String, StoredData>>,
    pub(crate) substitutions: Vec<Substitution>,
    pub(crate) circular_reported: bool,
    pub(crate) thread_names: HashMap<u64, String>,
    pub(crate) trim_rules: TrimRules,
    pub(crate) cnt_logs: usize,
    pub(crate) internal_diagnostics: usize,
}

impl LoxState {
    pub(crate) fn new(name: &str) -> Self {
        let mut internal = DomainTree::new("$");
        let root = internal.root();
        for sub in INTERNAL_SUBDOMAINS {
            internal.find(sub, root);
        }
        LoxState {
            name: name.to_string(),
            domains: DomainTree::new(""),
            internal,
            scope_domains: ScopeStore::default(),
            prefixes: ScopeStore::default(),
            once: ScopeStore::default(),
            log_data: ScopeStore::default(),
            substitutions: Vec::new(),
            circular_reported: false,
            thread_names: HashMap::new(),
            trim_rules: TrimRules::default(),
            cnt_logs: 0,
            internal_diagnostics: 0,
        }
    }

    pub(crate) fn scope_info(&self, env: &Shared, caller: Caller) -> ScopeInfo {
        let thread = ThreadIdent::current();
        let thread_name = self
            .thread_names
            .get(&thread.id)
            .cloned()
            .unwrap_or_else(|| thread.name.clone());
        let dir = caller.directory().replace('\\', "/");
        let trimmed = env.with_trim_rules(|global| trim_path(&self.trim_rules, global, &dir));
        ScopeInfo::new(caller, trimmed, thread, thread_name, &self.name)
    }

    pub(crate) fn tree(&self, internal: bool) -> &DomainTree {
        if internal {
            &self.internal
        } else {
            &self.domains
        }
    }

    fn tree_mut(&mut self, internal: bool) -> &mut DomainTree {
        if internal {
            &mut self.internal
        } else {
            &mut self.domains
        }
    }

    // ----- domain resolution -----

    /// Combines `domain` with the default domains of the scopes of the call into an absolute
    /// path, outermost scope first, stopping at the first absolute part.
    pub(crate) fn resolve_user_path(
        &mut self,
        scope: &ScopeInfo,
        domain: &str,
        notes: &mut Notes,
    ) -> String {
        let mut path = domain.trim().to_string();
        if let Some(inner) = self
            .scope_domains
            .get(&ScopeKey::ThreadInner(scope.thread_id()))
        {
            path = join(&path, inner);
        }
        if !path.starts_with(SEPARATOR) {
            for key in scope.outer_keys() {
                if let Some(default) = self.scope_domains.get(&key) {
                    path = join(default, &path);
                    if path.starts_with(SEPARATOR) {
                        break;
                    }
                }
            }
        }
        if !path.starts_with(SEPARATOR) {
            path.insert(0, SEPARATOR);
        }
        self.substitute(path, notes)
    }

    fn substitute(&mut self, mut path: String, notes: &mut Notes) -> String {
        if self.substitutions.is_empty() {
            return path;
        }
        let mut rounds = 0;
        loop {
            let mut changed = false;
            for rule in &self.substitutions {
                if let Some(replaced) = rule.apply(&path) {
                    if replaced != path {
                        path = replaced;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
            rounds += 1;
            if rounds >= MAX_SUBSTITUTIONS {
                if !self.circular_reported {
                    self.circular_reported = true;
                    notes.error(
                        "DMN",
                        format!(
                            "The limit of {} domain substitutions was reached. Circular \
                             substitution assumed! (This error is only reported once.)",
                            MAX_SUBSTITUTIONS
                        ),
                    );
                }
                break;
            }
        }
        if !path.starts_with(SEPARATOR) {
            path.insert(0, SEPARATOR);
        }
        path
    }

    /// Finds or creates a domain. New domains pick up configured verbosities.
    pub(crate) fn find_domain(
        &mut self,
        env: &Shared,
        internal: bool,
        path: &str,
        notes: &mut Notes,
    ) -> DomainId {
        let tree = self.tree_mut(internal);
        let root = tree.root();
        let found = tree.find(path, root);
        if !found.created.is_empty() {
            self.apply_config(env, internal, &found.created, None, notes);
        }
        found.id
    }

    /// Resolves the domain argument of a configuration call: `$/...` addresses the internal
    /// tree, anything else is resolved like a statement domain.
    pub(crate) fn config_domain(
        &mut self,
        env: &Shared,
        scope: &ScopeInfo,
        domain: &str,
        notes: &mut Notes,
    ) -> (bool, DomainId) {
        match internal_path(domain) {
            Some(rest) => (true, self.find_domain(env, true, rest, notes)),
            None => {
                let path = self.resolve_user_path(scope, domain, notes);
                (false, self.find_domain(env, false, &path, notes))
            }
        }
    }

    // ----- configuration variables -----

    fn configured_rules(
        &self,
        env: &Shared,
        logger: &str,
        notes: Option<&mut Notes>,
    ) -> Option<(Priority, Vec<VerbosityRule>)> {
        let source = env.config()?;
        let variable = verbosity_variable_name(&self.name, logger);
        let value = source.get(&variable)?;
        let mut rules = Vec::new();
        let mut notes = notes;
        for parsed in parse_verbosities(&value) {
            match parsed {
                Ok(rule) => rules.push(rule),
                Err(err) => {
                    if let Some(notes) = notes.as_deref_mut() {
                        notes.error("VAR", format!("Variable {}: {}", variable, err));
                    }
                }
            }
        }
        Some((source.priority(), rules))
    }

    /// Applies configured verbosities to `domains` of one tree, for one logger slot or all.
    fn apply_config(
        &mut self,
        env: &Shared,
        internal: bool,
        domains: &[DomainId],
        slot: Option<usize>,
        notes: &mut Notes,
    ) {
        let slots: Vec<usize> = match slot {
            Some(slot) => vec![slot],
            None => (0..self.tree(internal).loggers().len()).collect(),
        };
        for slot in slots {
            let name = self.tree(internal).logger(slot).name().to_string();
            let Some((priority, rules)) = self.configured_rules(env, &name, None) else {
                continue;
            };
            let tree = self.tree_mut(internal);
            for &id in domains {
                let full_path = tree.full_path(id).to_string();
                let relative = if internal {
                    &full_path[1..]
                } else {
                    full_path.as_str()
                };
                for rule in rules.iter().filter(|r| r.matches(internal, relative)) {
                    if tree.set_verbosity(id, slot, rule.verbosity, priority).is_ok() {
                        notes.info(
                            "LGR",
                            format!(
                                "Logger '{}': '{}' = Verbosity::{} ({}), from configuration.",
                                name, full_path, rule.verbosity, priority
                            ),
                        );
                    }
                }
            }
        }
    }

    // ----- loggers -----

    /// Attaches `logger` to both trees unless it is attached already. Returns its slot.
    pub(crate) fn register_logger(
        &mut self,
        env: &Shared,
        logger: &Arc<dyn Logger>,
        notes: &mut Notes,
    ) -> usize {
        if let Some(slot) = self.domains.logger_slot(logger.as_ref()) {
            return slot;
        }
        if let Some(existing) = self.domains.logger_slot_by_name(logger.name()) {
            notes.warning(
                "LGR",
                format!(
                    "Logger '{}' shares its name with logger #{}. Both are kept, name lookups \
                     resolve to the new one.",
                    logger.name(),
                    existing
                ),
            );
        }
        let slot = self.domains.add_logger(logger.clone());
        let internal_slot = self.internal.add_logger(logger.clone());
        debug_assert_eq!(slot, internal_slot);
        notes.info("LGR", format!("Logger '{}' added.", logger.name()));

        // report malformed entries once, at registration
        self.configured_rules(env, logger.name(), Some(&mut *notes));
        for internal in [false, true] {
            let all = self.tree(internal).all();
            self.apply_config(env, internal, &all, Some(slot), notes);
        }
        slot
    }

    /// Detaches the logger in `slot` from both trees.
    pub(crate) fn unregister_logger(&mut self, slot: usize, notes: &mut Notes) -> Arc<dyn Logger> {
        let logger = self.domains.remove_logger(slot);
        self.internal.remove_logger(slot);
        notes.info("LGR", format!("Logger '{}' removed.", logger.name()));
        logger
    }

    // ----- statements -----

    /// Resolves a user statement and counts it.
    pub(crate) fn prepare(
        &mut self,
        env: &Shared,
        scope: &ScopeInfo,
        domain: &str,
        verbosity: Verbosity,
        notes: &mut Notes,
    ) -> Prepared {
        self.cnt_logs += 1;
        let (internal, id) = self.config_domain(env, scope, domain, notes);
        let mut prepared = self.collect_loggers(internal, id, verbosity);
        if !internal && !prepared.loggers.is_empty() {
            self.collect_prefixes(scope, id, &mut prepared);
        }
        prepared
    }

    /// Resolves an internal diagnostic.
    pub(crate) fn prepare_internal(
        &mut self,
        env: &Shared,
        subdomain: &str,
        verbosity: Verbosity,
    ) -> Prepared {
        if verbosity <= Verbosity::Warning {
            self.internal_diagnostics += 1;
        }
        // configuration notes about internal domains would recurse
        let mut ignored = Notes::default();
        let id = self.find_domain(env, true, subdomain, &mut ignored);
        self.collect_loggers(true, id, verbosity)
    }

    fn collect_loggers(&mut self, internal: bool, id: DomainId, verbosity: Verbosity) -> Prepared {
        let tree = self.tree_mut(internal);
        tree.count_call(id);
        let mut loggers = Vec::new();
        for slot in 0..tree.loggers().len() {
            if tree.accepts(id, slot, verbosity) {
                tree.count_accepted(id, slot);
                loggers.push(tree.logger(slot).clone());
            }
        }
        Prepared {
            domain: tree.full_path(id).to_string(),
            loggers,
            front: Vec::new(),
            back: Vec::new(),
        }
    }

    /// Scope prefixes outermost first, then domain prefixes from the root down, and the
    /// ThreadInner prefix at the end. A domain prefix set with [`Inclusion::Exclude`] drops
    /// everything that would come before it, and the ThreadInner prefix.
    fn collect_prefixes(&self, scope: &ScopeInfo, id: DomainId, prepared: &mut Prepared) {
        let mut domain_prefixes = Vec::new();
        let mut excluded = false;
        let mut current = Some(id);
        'nodes: while let Some(node) = current {
            for (prefix, inclusion) in self.domains.node(node).prefixes.iter().rev() {
                domain_prefixes.push(prefix.clone());
                if *inclusion == Inclusion::Exclude {
                    excluded = true;
                    break 'nodes;
                }
            }
            current = self.domains.parent(node);
        }
        domain_prefixes.reverse();

        if !excluded {
            for key in scope.outer_keys().iter().rev() {
                if let Some(prefix) = self.prefixes.get(key) {
                    prepared.front.push(prefix.clone());
                }
            }
            if let Some(prefix) = self
                .prefixes
                .get(&ScopeKey::ThreadInner(scope.thread_id()))
            {
                prepared.back.push(prefix.clone());
            }
        }
        prepared.front.extend(domain_prefixes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_patterns() {
        let (kind, pattern) = Substitution::parse("NET").unwrap();
        assert_eq!((kind, pattern.as_str()), (SubstitutionKind::Exact, "/NET"));
        let (kind, pattern) = Substitution::parse("*NET*").unwrap();
        assert_eq!((kind, pattern.as_str()), (SubstitutionKind::Substring, "NET"));
        assert!(Substitution::parse("**").is_none());

        let rule = Substitution {
            kind: SubstitutionKind::StartsWith,
            pattern: "/A".to_string(),
            replacement: "/X/Y".to_string(),
        };
        assert_eq!(rule.apply("/A/B").as_deref(), Some("/X/Y/B"));
        assert_eq!(rule.apply("/B"), None);
        assert_eq!(rule.display_pattern(), "/A*");
    }

    #[test]
    fn internal_paths() {
        assert_eq!(internal_path("$/LGR"), Some("/LGR"));
        assert_eq!(internal_path("$"), Some(""));
        assert_eq!(internal_path("$X"), None);
        assert_eq!(internal_path("/X"), None);
    }

    #[test]
    fn joining() {
        assert_eq!(join("/A", "B"), "/A/B");
        assert_eq!(join("/A/", "B"), "/A/B");
        assert_eq!(join("/A", "/B"), "/B");
        assert_eq!(join("/A", ""), "/A");
        assert_eq!(join("", "B"), "B");
    }

    #[test]
    fn internal_tree_is_prepared() {
        let state = LoxState::new("LOX");
        assert!(state.internal.lookup("/LGR").is_some());
        assert_eq!(state.internal.full_path(state.internal.root()), "$/");
    }
}
