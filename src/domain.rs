// SPDX-License-Identifier: MIT OR Apache-2.0

//! The domain tree.
//!
//! Domains form a path-addressed hierarchy (`/`, `/UI`, `/UI/MOUSE`). Each node stores, per
//! attached logger, an optional explicit [`VerbositySetting`]. A logger's effective verbosity
//! on a node is the one set on the nearest node on the way to the root that has an explicit
//! setting for it, or [`DEFAULT_VERBOSITY`] when there is none.
//!
//! Nodes are created on first reference and never removed. Loggers occupy a slot index that
//! is the same in every node of a tree, so adding or removing a logger touches every node.

use crate::logable::SharedLogable;
use crate::logger::{same_logger, Logger};
use crate::verbosity::{Inclusion, Priority, Verbosity};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// Separates domain path segments.
pub const SEPARATOR: char = '/';

/// Verbosity of a (logger, domain) pair that has no explicit setting on its path.
pub const DEFAULT_VERBOSITY: Verbosity = Verbosity::Warning;

/// An explicit setting stored on a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbositySetting {
    pub verbosity: Verbosity,
    pub priority: Priority,
}

/// Index of a domain inside its [`DomainTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct Domain {
    name: String,
    full_path: String,
    parent: Option<DomainId>,
    children: BTreeMap<String, DomainId>,
    settings: Vec<Option<VerbositySetting>>,
    /// Accepted statements, per logger slot.
    logger_calls: Vec<usize>,
    cnt_log_calls: usize,
    pub(crate) prefixes: Vec<(SharedLogable, Inclusion)>,
}

impl Domain {
    fn new(name: String, full_path: String, parent: Option<DomainId>, loggers: usize) -> Self {
        Domain {
            name,
            full_path,
            parent,
            children: BTreeMap::new(),
            settings: vec![None; loggers],
            logger_calls: vec![0; loggers],
            cnt_log_calls: 0,
            prefixes: Vec::new(),
        }
    }
}

/// Result of [`DomainTree::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub id: DomainId,
    /// Nodes created on the way, outermost first.
    pub created: Vec<DomainId>,
}

/// A tree of domains plus the loggers attached to it.
#[derive(Debug)]
pub struct DomainTree {
    nodes: Vec<Domain>,
    loggers: Vec<Arc<dyn Logger>>,
}

impl DomainTree {
    /// A tree whose root renders as `root_prefix/`, e.g. `""` for `/` or `"$"` for `$/`.
    pub fn new(root_prefix: &str) -> Self {
        DomainTree {
            nodes: vec![Domain::new(
                String::new(),
                format!("{}{}", root_prefix, SEPARATOR),
                None,
                0,
            )],
            loggers: Vec::new(),
        }
    }

    pub fn root(&self) -> DomainId {
        DomainId(0)
    }

    pub(crate) fn node(&self, id: DomainId) -> &Domain {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: DomainId) -> &mut Domain {
        &mut self.nodes[id.0]
    }

    pub fn name(&self, id: DomainId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn full_path(&self, id: DomainId) -> &str {
        &self.nodes[id.0].full_path
    }

    pub fn parent(&self, id: DomainId) -> Option<DomainId> {
        self.nodes[id.0].parent
    }

    /// Children in name order.
    pub fn children(&self, id: DomainId) -> impl Iterator<Item = DomainId> + '_ {
        self.nodes[id.0].children.values().copied()
    }

    /// Every domain, depth first, children in name order.
    pub fn all(&self) -> Vec<DomainId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children: Vec<_> = self.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Resolves `path` starting at `current`, creating missing nodes.
    ///
    /// A leading `/` starts at the root. Empty segments are skipped, so repeated and trailing
    /// separators are harmless. `.` stays, `..` goes to the parent and does nothing at the root.
    pub fn find(&mut self, path: &str, current: DomainId) -> Found {
        let mut id = if path.starts_with(SEPARATOR) {
            self.root()
        } else {
            current
        };
        let mut created = Vec::new();
        for segment in path.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    if let Some(parent) = self.nodes[id.0].parent {
                        id = parent;
                    }
                }
                name => {
                    id = match self.nodes[id.0].children.get(name) {
                        Some(child) => *child,
                        None => {
                            let child = self.create_child(id, name);
                            created.push(child);
                            child
                        }
                    };
                }
            }
        }
        Found { id, created }
    }

    fn create_child(&mut self, parent: DomainId, name: &str) -> DomainId {
        let parent_path = &self.nodes[parent.0].full_path;
        let full_path = if parent_path.ends_with(SEPARATOR) {
            format!("{}{}", parent_path, name)
        } else {
            format!("{}{}{}", parent_path, SEPARATOR, name)
        };
        let id = DomainId(self.nodes.len());
        self.nodes.push(Domain::new(
            name.to_string(),
            full_path,
            Some(parent),
            self.loggers.len(),
        ));
        self.nodes[parent.0].children.insert(name.to_string(), id);
        id
    }

    /// Resolves a path without creating anything.
    pub fn lookup(&self, path: &str) -> Option<DomainId> {
        let mut id = self.root();
        for segment in path.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => id = self.nodes[id.0].parent.unwrap_or(id),
                name => id = *self.nodes[id.0].children.get(name)?,
            }
        }
        Some(id)
    }

    // ----- loggers -----

    pub fn loggers(&self) -> &[Arc<dyn Logger>] {
        &self.loggers
    }

    pub fn logger(&self, slot: usize) -> &Arc<dyn Logger> {
        &self.loggers[slot]
    }

    /// Slot of `logger`, by identity.
    pub fn logger_slot(&self, logger: &dyn Logger) -> Option<usize> {
        self.loggers.iter().position(|l| same_logger(l, logger))
    }

    /// Slot of the most recently added logger called `name` (case-insensitive).
    pub fn logger_slot_by_name(&self, name: &str) -> Option<usize> {
        self.loggers
            .iter()
            .rposition(|l| l.name().eq_ignore_ascii_case(name))
    }

    /// Attaches a logger, returning its slot.
    pub fn add_logger(&mut self, logger: Arc<dyn Logger>) -> usize {
        self.loggers.push(logger);
        for node in &mut self.nodes {
            node.settings.push(None);
            node.logger_calls.push(0);
        }
        self.loggers.len() - 1
    }

    /// Detaches the logger in `slot` and purges its settings from every node.
    pub fn remove_logger(&mut self, slot: usize) -> Arc<dyn Logger> {
        for node in &mut self.nodes {
            node.settings.remove(slot);
            node.logger_calls.remove(slot);
        }
        self.loggers.remove(slot)
    }

    // ----- verbosity -----

    /// Stores an explicit setting unless a setting of strictly higher priority is stored.
    ///
    /// Returns the setting now in effect on this node, `Err` with the stored one if rejected.
    pub fn set_verbosity(
        &mut self,
        id: DomainId,
        slot: usize,
        verbosity: Verbosity,
        priority: Priority,
    ) -> Result<VerbositySetting, VerbositySetting> {
        let entry = &mut self.nodes[id.0].settings[slot];
        if let Some(stored) = entry {
            if stored.priority > priority {
                return Err(*stored);
            }
        }
        let setting = VerbositySetting {
            verbosity,
            priority,
        };
        *entry = Some(setting);
        Ok(setting)
    }

    /// The setting stored on exactly this node.
    pub fn explicit_setting(&self, id: DomainId, slot: usize) -> Option<VerbositySetting> {
        self.nodes[id.0].settings[slot]
    }

    /// The setting in effect: from this node or the nearest ancestor that has one.
    pub fn effective_setting(&self, id: DomainId, slot: usize) -> Option<VerbositySetting> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            if let Some(setting) = node.settings[slot] {
                return Some(setting);
            }
            current = node.parent;
        }
        None
    }

    pub fn effective_verbosity(&self, id: DomainId, slot: usize) -> Verbosity {
        self.effective_setting(id, slot)
            .map(|s| s.verbosity)
            .unwrap_or(DEFAULT_VERBOSITY)
    }

    /// Whether the logger in `slot` accepts a statement of `verbosity` on `id`.
    pub fn accepts(&self, id: DomainId, slot: usize, verbosity: Verbosity) -> bool {
        self.effective_verbosity(id, slot).accepts(verbosity)
    }

    // ----- counters -----

    pub(crate) fn count_call(&mut self, id: DomainId) {
        self.nodes[id.0].cnt_log_calls += 1;
    }

    pub(crate) fn count_accepted(&mut self, id: DomainId, slot: usize) {
        self.nodes[id.0].logger_calls[slot] += 1;
    }

    /// Statements issued on exactly this domain.
    pub fn cnt_log_calls(&self, id: DomainId) -> usize {
        self.nodes[id.0].cnt_log_calls
    }

    /// Statements on exactly this domain accepted by the logger in `slot`.
    pub fn cnt_accepted(&self, id: DomainId, slot: usize) -> usize {
        self.nodes[id.0].logger_calls[slot]
    }

    // ----- dump -----

    /// Renders the tree below `from` (the whole tree when `None`), one domain per line.
    /// With `slot`, only that logger's settings are listed.
    pub fn dump(&self, from: Option<DomainId>, slot: Option<usize>) -> String {
        let start = from.unwrap_or(self.root());
        let path_width = self
            .all()
            .iter()
            .map(|id| self.nodes[id.0].full_path.len())
            .max()
            .unwrap_or(1);
        let mut out = String::new();
        let mut stack = vec![(start, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            self.dump_node(&mut out, id, depth, path_width, slot);
            let children: Vec<_> = self.children(id).collect();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }

    fn dump_node(
        &self,
        out: &mut String,
        id: DomainId,
        depth: usize,
        path_width: usize,
        slot: Option<usize>,
    ) {
        let node = &self.nodes[id.0];
        let _ = write!(
            out,
            "  {:indent$}{:<width$}  [{:03}] ",
            "",
            node.full_path,
            node.cnt_log_calls,
            indent = depth * 2,
            width = path_width,
        );
        let slots: Vec<usize> = match slot {
            Some(slot) => vec![slot],
            None => (0..self.loggers.len()).collect(),
        };
        for (i, slot) in slots.into_iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let effective = self.effective_verbosity(id, slot);
            let _ = write!(
                out,
                "<{}: {}",
                self.loggers[slot].name(),
                effective
            );
            if let Some(explicit) = node.settings[slot] {
                let _ = write!(out, " ({})", explicit.priority);
            }
            let _ = write!(out, " [{:03}]>", node.logger_calls[slot]);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::LogRecord;

    #[derive(Debug)]
    struct Named(&'static str);
    impl Logger for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn type_name(&self) -> &str {
            "Named"
        }
        fn log(&self, _record: &LogRecord<'_>) {}
        fn cnt_logs(&self) -> usize {
            0
        }
    }

    fn tree_with_logger() -> (DomainTree, usize) {
        let mut tree = DomainTree::new("");
        let slot = tree.add_logger(Arc::new(Named("MEM")));
        (tree, slot)
    }

    #[test]
    fn find_creates_and_navigates() {
        let (mut tree, _) = tree_with_logger();
        let root = tree.root();
        let found = tree.find("UI/MOUSE", root);
        assert_eq!(found.created.len(), 2);
        assert_eq!(tree.full_path(found.id), "/UI/MOUSE");

        let again = tree.find("//UI///MOUSE/", root);
        assert_eq!(again.id, found.id);
        assert!(again.created.is_empty());

        let ui = tree.lookup("/UI").unwrap();
        assert_eq!(tree.find("MOUSE", ui).id, found.id);
        assert_eq!(tree.find("./MOUSE/.", ui).id, found.id);
        assert_eq!(tree.find("..", found.id).id, ui);
        assert_eq!(tree.find("/", found.id).id, root);
        assert_eq!(tree.find("", found.id).id, found.id);
        // climbing above the root stays at the root
        assert_eq!(tree.find("../../../..", found.id).id, root);
        assert_eq!(tree.full_path(root), "/");
    }

    #[test]
    fn names_are_case_sensitive() {
        let (mut tree, _) = tree_with_logger();
        let root = tree.root();
        let upper = tree.find("/UI", root).id;
        let lower = tree.find("/ui", root).id;
        assert_ne!(upper, lower);
        let names: Vec<_> = tree.children(root).map(|c| tree.name(c).to_string()).collect();
        assert_eq!(names, vec!["UI", "ui"]);
    }

    #[test]
    fn internal_tree_paths() {
        let mut tree = DomainTree::new("$");
        let root = tree.root();
        let lgr = tree.find("LGR", root).id;
        assert_eq!(tree.full_path(root), "$/");
        assert_eq!(tree.full_path(lgr), "$/LGR");
    }

    #[test]
    fn default_and_inheritance() {
        let (mut tree, slot) = tree_with_logger();
        let root = tree.root();
        let leaf = tree.find("/A/B/C", root).id;
        assert_eq!(tree.effective_verbosity(leaf, slot), DEFAULT_VERBOSITY);

        let a = tree.lookup("/A").unwrap();
        tree.set_verbosity(a, slot, Verbosity::Info, Priority::STANDARD)
            .unwrap();
        assert_eq!(tree.effective_verbosity(leaf, slot), Verbosity::Info);
        assert_eq!(tree.effective_verbosity(root, slot), DEFAULT_VERBOSITY);
        assert_eq!(tree.explicit_setting(leaf, slot), None);
    }

    #[test]
    fn explicit_children_win_regardless_of_order() {
        let (mut tree, slot) = tree_with_logger();
        let root = tree.root();
        let child = tree.find("/DFLT/WARN", root).id;
        let parent = tree.lookup("/DFLT").unwrap();
        tree.set_verbosity(child, slot, Verbosity::Warning, Priority::STANDARD)
            .unwrap();
        tree.set_verbosity(parent, slot, Verbosity::Verbose, Priority::PROTECTED)
            .unwrap();
        assert_eq!(tree.effective_verbosity(child, slot), Verbosity::Warning);
        assert!(!tree.accepts(child, slot, Verbosity::Info));
        assert!(tree.accepts(parent, slot, Verbosity::Verbose));
    }

    #[test]
    fn priority_rule() {
        let (mut tree, slot) = tree_with_logger();
        let id = tree.find("/P", tree.root()).id;
        tree.set_verbosity(id, slot, Verbosity::Info, Priority::SESSION)
            .unwrap();
        let rejected = tree.set_verbosity(id, slot, Verbosity::Off, Priority::STANDARD);
        assert_eq!(
            rejected,
            Err(VerbositySetting {
                verbosity: Verbosity::Info,
                priority: Priority::SESSION
            })
        );
        // equal priority overwrites
        tree.set_verbosity(id, slot, Verbosity::Error, Priority::SESSION)
            .unwrap();
        assert_eq!(tree.effective_verbosity(id, slot), Verbosity::Error);
    }

    #[test]
    fn logger_slots_follow_add_and_remove() {
        let mut tree = DomainTree::new("");
        let first: Arc<dyn Logger> = Arc::new(Named("MEM"));
        let second: Arc<dyn Logger> = Arc::new(Named("mem"));
        let s1 = tree.add_logger(first.clone());
        let id = tree.find("/X", tree.root()).id;
        let s2 = tree.add_logger(second.clone());
        tree.set_verbosity(id, s2, Verbosity::Verbose, Priority::STANDARD)
            .unwrap();
        assert_eq!(tree.logger_slot_by_name("MEM"), Some(s2));
        assert_eq!(tree.logger_slot(first.as_ref()), Some(s1));

        tree.remove_logger(s1);
        let s2 = tree.logger_slot(second.as_ref()).unwrap();
        assert_eq!(s2, 0);
        assert_eq!(tree.effective_verbosity(id, s2), Verbosity::Verbose);
        assert_eq!(tree.logger_slot(first.as_ref()), None);
        assert_eq!(tree.logger_slot_by_name("nope"), None);
    }

    #[test]
    fn dump_lists_every_domain() {
        let (mut tree, slot) = tree_with_logger();
        let id = tree.find("/UI/MOUSE", tree.root()).id;
        tree.set_verbosity(id, slot, Verbosity::Info, Priority::STANDARD)
            .unwrap();
        tree.count_call(id);
        tree.count_accepted(id, slot);
        let dump = tree.dump(None, None);
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("/ "));
        assert!(lines[0].contains("<MEM: Warning [000]>"));
        assert!(lines[2].contains("/UI/MOUSE"));
        assert!(lines[2].contains("[001] <MEM: Info (Standard) [001]>"));
        assert_eq!(tree.cnt_log_calls(id), 1);
        assert_eq!(tree.cnt_accepted(id, slot), 1);
    }
}
