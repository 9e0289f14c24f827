//! Hostname rule matching
//!
//! Rules are ordered by `match_priority` descending, then by
//! `hostname_pattern` ascending (byte order). The first rule in that order
//! whose pattern matches anywhere in the hostname wins. This is a
//! first-match policy: a later rule with a more specific pattern is never
//! preferred over an earlier one.

use std::cmp::Ordering;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;

/// Maps hosts of one package to a recommended revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRule {
    /// Package the rule applies to
    pub package_name: String,
    /// Regular expression tested against the full hostname (unanchored)
    pub hostname_pattern: String,
    /// Revision recommended to matching hosts
    pub target_revision: String,
    /// Higher values are considered first
    pub match_priority: i64,
}

impl RevisionRule {
    pub fn new(
        package_name: impl Into<String>,
        hostname_pattern: impl Into<String>,
        target_revision: impl Into<String>,
        match_priority: i64,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            hostname_pattern: hostname_pattern.into(),
            target_revision: target_revision.into(),
            match_priority,
        }
    }

    /// Check that the hostname pattern compiles
    ///
    /// Patterns use the syntax the resolver evaluates, including lookaround
    /// and backreferences.
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` describing the syntax error
    pub fn check_pattern(&self) -> Result<(), CoreError> {
        Regex::new(&self.hostname_pattern).map(|_| ()).map_err(|e| {
            CoreError::ConfigError(format!(
                "invalid hostname pattern {:?}: {e}",
                self.hostname_pattern
            ))
        })
    }
}

/// Scan order: priority descending, then pattern ascending
#[must_use]
pub fn rule_order(a: &RevisionRule, b: &RevisionRule) -> Ordering {
    b.match_priority
        .cmp(&a.match_priority)
        .then_with(|| a.hostname_pattern.cmp(&b.hostname_pattern))
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: RevisionRule,
    /// `None` when the pattern failed to compile
    regex: Option<Regex>,
}

impl CompiledRule {
    fn matches(&self, hostname: &str) -> bool {
        let Some(regex) = &self.regex else {
            return false;
        };
        match regex.is_match(hostname) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(
                    pattern = %self.rule.hostname_pattern,
                    hostname = %hostname,
                    error = %e,
                    "hostname pattern failed to evaluate"
                );
                false
            }
        }
    }
}

/// Rules of one package, sorted and compiled once
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Sort and compile `rules`
    ///
    /// Patterns that fail to compile are kept in place but never match.
    #[must_use]
    pub fn new(mut rules: Vec<RevisionRule>) -> Self {
        rules.sort_by(rule_order);

        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = match Regex::new(&rule.hostname_pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        warn!(
                            package = %rule.package_name,
                            pattern = %rule.hostname_pattern,
                            error = %e,
                            "skipping rule with invalid hostname pattern"
                        );
                        None
                    }
                };
                CompiledRule { rule, regex }
            })
            .collect();

        Self { rules }
    }

    /// First rule in scan order whose pattern matches `hostname`
    #[must_use]
    pub fn resolve(&self, hostname: &str) -> Option<&RevisionRule> {
        self.rules
            .iter()
            .find(|compiled| compiled.matches(hostname))
            .map(|compiled| &compiled.rule)
    }

    /// Rules in scan order
    pub fn iter(&self) -> impl Iterator<Item = &RevisionRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Resolve the target revision for `hostname`, if any rule matches
#[must_use]
pub fn resolve_revision(rules: Vec<RevisionRule>, hostname: &str) -> Option<String> {
    RuleSet::new(rules)
        .resolve(hostname)
        .map(|rule| rule.target_revision.clone())
}
