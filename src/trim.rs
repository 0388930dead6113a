// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source-path trim rules.
//!
//! Compilers report source files with whatever path the build used, often a long absolute
//! one. A trim rule shortens such paths to a project-relative form for `%Sp` and for the
//! source-related scope keys.
//!
//! A rule pattern starting with `*` may match anywhere in the path, otherwise only at its
//! start. Trailing `*` characters are ignored. With [`Inclusion::Include`] the path is cut
//! behind the match, with [`Inclusion::Exclude`] in front of it. The cut is then moved by
//! `offset` characters (positive values cut more) and the replacement is prepended.
//!
//! ```
//! use loxlog::trim::TrimRules;
//! use loxlog::{Inclusion, Priority, Sensitivity};
//!
//! let mut rules = TrimRules::default();
//! rules
//!     .add("*/src.samples/", Inclusion::Include, -3, Sensitivity::Sensitive, "", Priority::STANDARD)
//!     .unwrap();
//! assert_eq!(
//!     rules.apply("/home/dev/src.samples/unittests/alox").as_deref(),
//!     Some("es/unittests/alox")
//! );
//! ```

use crate::verbosity::{Inclusion, Priority, Sensitivity};
use std::fmt::Display;

/// One trim rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePathTrimRule {
    /// The pattern without its leading and trailing wildcards.
    pub pattern: String,
    /// `true` if the pattern must match at the start of the path.
    pub is_prefix: bool,
    pub inclusion: Inclusion,
    pub offset: i32,
    pub sensitivity: Sensitivity,
    pub replacement: String,
    pub priority: Priority,
}

impl SourcePathTrimRule {
    /// Parses a pattern such as `*/src/`. `*` and `**` alone are rejected.
    pub fn new(
        pattern: &str,
        inclusion: Inclusion,
        offset: i32,
        sensitivity: Sensitivity,
        replacement: &str,
        priority: Priority,
    ) -> Result<Self, TrimRuleError> {
        let (is_prefix, rest) = match pattern.strip_prefix('*') {
            Some(rest) => (false, rest),
            None => (true, pattern),
        };
        let rest = rest.trim_end_matches('*');
        if rest.is_empty() {
            return Err(TrimRuleError::Malformed(pattern.to_string()));
        }
        Ok(SourcePathTrimRule {
            pattern: rest.replace('\\', "/"),
            is_prefix,
            inclusion,
            offset,
            sensitivity,
            replacement: replacement.to_string(),
            priority,
        })
    }

    /// Trims `path`, or returns `None` if the rule does not match it.
    pub fn apply(&self, path: &str) -> Option<String> {
        let idx = if self.is_prefix {
            if !self.sensitivity.starts_with(path, &self.pattern) {
                return None;
            }
            0
        } else {
            self.sensitivity.find(path, &self.pattern)?
        };
        let cut = match self.inclusion {
            Inclusion::Include => idx + self.pattern.len(),
            Inclusion::Exclude => idx,
        };

        // the offset counts characters, not bytes
        let cut_chars = path[..cut].chars().count() as i64;
        let total_chars = path.chars().count() as i64;
        let target = (cut_chars + self.offset as i64).clamp(0, total_chars) as usize;
        let byte = path
            .char_indices()
            .nth(target)
            .map(|(byte, _)| byte)
            .unwrap_or(path.len());

        let mut trimmed = String::with_capacity(self.replacement.len() + path.len() - byte);
        trimmed.push_str(&self.replacement);
        trimmed.push_str(&path[byte..]);
        Some(trimmed)
    }
}

impl Display for SourcePathTrimRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}*, {:?}, offset {}, {:?}, priority {}",
            if self.is_prefix { "" } else { "*" },
            self.pattern,
            self.inclusion,
            self.offset,
            self.sensitivity,
            self.priority
        )?;
        if !self.replacement.is_empty() {
            write!(f, ", replacement \"{}\"", self.replacement)?;
        }
        Ok(())
    }
}

/// Why a rule was not stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrimRuleError {
    #[error("illegal source path trim rule pattern '{0}'")]
    Malformed(String),
    #[error("source path trim rule '{pattern}' already set with higher priority {stored}")]
    LowerPriority { pattern: String, stored: Priority },
}

/// An ordered list of trim rules.
///
/// Rules are kept sorted by descending priority, and the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct TrimRules {
    rules: Vec<SourcePathTrimRule>,
}

impl TrimRules {
    /// Adds a rule. A rule with the same pattern is replaced if its priority is not higher.
    pub fn add(
        &mut self,
        pattern: &str,
        inclusion: Inclusion,
        offset: i32,
        sensitivity: Sensitivity,
        replacement: &str,
        priority: Priority,
    ) -> Result<(), TrimRuleError> {
        let rule = SourcePathTrimRule::new(
            pattern,
            inclusion,
            offset,
            sensitivity,
            replacement,
            priority,
        )?;
        self.insert(rule)
    }

    pub fn insert(&mut self, rule: SourcePathTrimRule) -> Result<(), TrimRuleError> {
        if let Some(pos) = self
            .rules
            .iter()
            .position(|r| r.pattern == rule.pattern && r.is_prefix == rule.is_prefix)
        {
            if self.rules[pos].priority > rule.priority {
                return Err(TrimRuleError::LowerPriority {
                    pattern: rule.pattern,
                    stored: self.rules[pos].priority,
                });
            }
            self.rules.remove(pos);
        }
        let pos = self
            .rules
            .iter()
            .position(|r| r.priority < rule.priority)
            .unwrap_or(self.rules.len());
        self.rules.insert(pos, rule);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[SourcePathTrimRule] {
        &self.rules
    }

    /// Applies the first matching rule.
    pub fn apply(&self, path: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(path))
    }
}

/// Trims `path` with the local rules of a `Lox` and the global rules of its environment.
/// On equal priority, local rules are tried first. Unmatched paths are returned unchanged.
pub(crate) fn trim_path(local: &TrimRules, global: &TrimRules, path: &str) -> String {
    let mut candidates: Vec<&SourcePathTrimRule> =
        local.rules.iter().chain(global.rules.iter()).collect();
    // stable sort keeps local ahead of global on ties
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
    candidates
        .into_iter()
        .find_map(|rule| rule.apply(path))
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIR: &str = "/home/dev/project/src.samples/unittests/alox";

    fn rule(pattern: &str, inclusion: Inclusion, offset: i32) -> SourcePathTrimRule {
        SourcePathTrimRule::new(
            pattern,
            inclusion,
            offset,
            Sensitivity::Sensitive,
            "",
            Priority::STANDARD,
        )
        .unwrap()
    }

    #[test]
    fn include_rules() {
        let r = rule("*/src.samples/unittests/", Inclusion::Include, 0);
        assert_eq!(r.apply(DIR).as_deref(), Some("alox"));
        let r = rule("*/src.samples/", Inclusion::Include, -3);
        assert_eq!(r.apply(DIR).as_deref(), Some("es/unittests/alox"));
        let r = rule("*/src.samples/", Inclusion::Include, 2);
        assert_eq!(r.apply(DIR).as_deref(), Some("ittests/alox"));
        let r = rule("*unit*", Inclusion::Include, 0);
        assert_eq!(r.apply(DIR).as_deref(), Some("tests/alox"));
    }

    #[test]
    fn exclude_rules() {
        let r = rule("*/src.samples/", Inclusion::Exclude, 0);
        assert_eq!(r.apply(DIR).as_deref(), Some("/src.samples/unittests/alox"));
        let r = rule("*/unittests/*", Inclusion::Exclude, -2);
        assert_eq!(r.apply(DIR).as_deref(), Some("es/unittests/alox"));
        let r = rule("*unit", Inclusion::Exclude, 2);
        assert_eq!(r.apply(DIR).as_deref(), Some("ittests/alox"));
        let r = SourcePathTrimRule::new(
            "*unit",
            Inclusion::Exclude,
            0,
            Sensitivity::Sensitive,
            "REPLACE/",
            Priority::STANDARD,
        )
        .unwrap();
        assert_eq!(r.apply(DIR).as_deref(), Some("REPLACE/unittests/alox"));
    }

    #[test]
    fn prefix_rules_anchor_at_start() {
        let r = rule("/home/dev/", Inclusion::Include, 0);
        assert_eq!(r.apply(DIR).as_deref(), Some("project/src.samples/unittests/alox"));
        let r = rule("dev/", Inclusion::Include, 0);
        assert_eq!(r.apply(DIR), None);
    }

    #[test]
    fn case_handling() {
        let sensitive = rule("*/UNITTESTS/", Inclusion::Include, 0);
        assert_eq!(sensitive.apply(DIR), None);
        let ignoring = SourcePathTrimRule::new(
            "*/UNITTESTS/",
            Inclusion::Include,
            0,
            Sensitivity::Ignore,
            "",
            Priority::STANDARD,
        )
        .unwrap();
        assert_eq!(ignoring.apply(DIR).as_deref(), Some("alox"));
    }

    #[test]
    fn offsets_clamp() {
        let r = rule("*/alox", Inclusion::Include, 50);
        assert_eq!(r.apply(DIR).as_deref(), Some(""));
        let r = rule("/home", Inclusion::Exclude, -50);
        assert_eq!(r.apply(DIR).as_deref(), Some(DIR));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        let mut rules = TrimRules::default();
        for pattern in ["*", "**", ""] {
            assert_eq!(
                rules.add(pattern, Inclusion::Include, 0, Sensitivity::Sensitive, "", Priority::STANDARD),
                Err(TrimRuleError::Malformed(pattern.to_string()))
            );
        }
        assert!(rules.is_empty());
    }

    #[test]
    fn priorities_order_and_protect_rules() {
        let mut rules = TrimRules::default();
        rules
            .add("*/src.samples/", Inclusion::Include, 0, Sensitivity::Sensitive, "", Priority::STANDARD)
            .unwrap();
        rules
            .add("*/project/", Inclusion::Include, 0, Sensitivity::Sensitive, "", Priority::SESSION)
            .unwrap();
        assert_eq!(rules.apply(DIR).as_deref(), Some("src.samples/unittests/alox"));

        let err = rules
            .add("*/project/", Inclusion::Exclude, 0, Sensitivity::Sensitive, "", Priority::STANDARD)
            .unwrap_err();
        assert!(matches!(err, TrimRuleError::LowerPriority { .. }));
        assert_eq!(rules.rules().len(), 2);
    }

    #[test]
    fn local_rules_win_ties() {
        let mut local = TrimRules::default();
        let mut global = TrimRules::default();
        global
            .add("*/project/", Inclusion::Include, 0, Sensitivity::Sensitive, "", Priority::STANDARD)
            .unwrap();
        assert_eq!(trim_path(&local, &global, DIR), "src.samples/unittests/alox");
        local
            .add("*/unittests/", Inclusion::Include, 0, Sensitivity::Sensitive, "", Priority::STANDARD)
            .unwrap();
        assert_eq!(trim_path(&local, &global, DIR), "alox");
        local.clear();
        assert_eq!(trim_path(&local, &global, DIR), "src.samples/unittests/alox");
        global.clear();
        assert_eq!(trim_path(&local, &global, DIR), DIR);
    }
}
