//! The ordered set of exclusion rules consulted for every folder.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{trace, warn};

use crate::config::ExcludeConfig;
use crate::error::Error;
use crate::locator::normalize_path;
use crate::rules::{Exclusion, ExclusionRule, RuleError};

/// What a failing rule contributes to the combined decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum RuleFaultPolicy {
    /// Fold this decision in place of the failed rule's answer.
    Fallback(Exclusion),
    /// Skip the folder entirely.
    Propagate,
}

impl Default for RuleFaultPolicy {
    fn default() -> Self {
        Self::Fallback(Exclusion::SELF)
    }
}

impl FromStr for RuleFaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("propagate") {
            return Ok(Self::Propagate);
        }
        s.parse::<Exclusion>()
            .map(Self::Fallback)
            .map_err(|_| {
                format!(
                    "Invalid rule error policy '{}'. \
                     Expected one of: none, self, children, both, propagate",
                    s.trim()
                )
            })
    }
}

impl TryFrom<String> for RuleFaultPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RuleFaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback(exclusion) => write!(f, "{}", exclusion),
            Self::Propagate => f.write_str("propagate"),
        }
    }
}

/// Outcome of enforcing the rule set on one folder.
#[derive(Debug)]
pub struct Enforced {
    pub exclusion: Exclusion,
    /// Rules that failed and were replaced by the fallback decision
    pub faults: Vec<RuleError>,
}

/// Faults raised while enforcing under [`RuleFaultPolicy::Propagate`].
#[derive(Debug)]
pub struct EnforceError {
    pub faults: Vec<RuleError>,
}

/// Immutable, ordered list of rules combined with bitwise OR.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    rules: Vec<ExclusionRule>,
    on_fault: RuleFaultPolicy,
}

impl ExclusionRules {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self {
            rules,
            on_fault: RuleFaultPolicy::default(),
        }
    }

    pub fn with_fault_policy(mut self, on_fault: RuleFaultPolicy) -> Self {
        self.on_fault = on_fault;
        self
    }

    /// Assemble the rule list from the `[exclude]` configuration section.
    ///
    /// `protected` is the folder whose ancestors must never be selected,
    /// normally the directory holding the running executable.
    pub fn from_config(config: &ExcludeConfig, protected: Option<PathBuf>) -> Result<Self, Error> {
        let mut rules = Vec::new();

        if config.ancestor_path {
            match protected {
                Some(protected) => {
                    let protected = dunce::canonicalize(&protected)
                        .or_else(|_| normalize_path(&protected))
                        .unwrap_or(protected);
                    trace!("Adding ancestor path exclusion rule for {}", protected.display());
                    rules.push(ExclusionRule::ancestor_path(protected));
                }
                None => warn!("Ancestor path exclusion enabled but no protected folder is known"),
            }
        }

        if config.symbolic_links {
            trace!("Adding symbolic link exclusion rule");
            rules.push(ExclusionRule::SymbolicLinks);
        }

        if config.dot_folders {
            trace!("Adding dot folder exclusion rule");
            rules.push(ExclusionRule::DotFolders);
        }

        if config.hidden_folders {
            trace!("Adding hidden folder exclusion rule");
            rules.push(ExclusionRule::HiddenFolders);
        }

        for subtree in &config.subtrees {
            trace!("Adding subtree exclusion rule: {}", subtree);
            rules.push(ExclusionRule::subtree(subtree.clone()));
        }

        for pattern in &config.globs {
            trace!("Adding glob exclusion rule: {}", pattern);
            rules.push(ExclusionRule::glob(pattern)?);
        }

        Ok(Self::new(rules).with_fault_policy(config.on_rule_error))
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn fault_policy(&self) -> RuleFaultPolicy {
        self.on_fault
    }

    /// Combine every rule's decision for `folder`.
    ///
    /// A failing rule never stops the remaining rules from being evaluated.
    pub fn enforce(&self, folder: &Path) -> Result<Enforced, EnforceError> {
        let mut exclusion = Exclusion::NONE;
        let mut faults = Vec::new();

        for rule in &self.rules {
            match rule.evaluate(folder) {
                Ok(decision) => exclusion |= decision,
                Err(err) => {
                    warn!("Error processing rule {}: {}", rule.name(), err);
                    if let RuleFaultPolicy::Fallback(fallback) = self.on_fault {
                        exclusion |= fallback;
                    }
                    faults.push(err);
                }
            }
        }

        match self.on_fault {
            RuleFaultPolicy::Propagate if !faults.is_empty() => Err(EnforceError { faults }),
            _ => Ok(Enforced { exclusion, faults }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_set_excludes_nothing() {
        let rules = ExclusionRules::default();
        let enforced = rules.enforce(Path::new("/any/where")).unwrap();
        assert_eq!(enforced.exclusion, Exclusion::NONE);
        assert!(enforced.faults.is_empty());
    }

    #[test]
    fn test_decisions_are_or_combined() {
        let rules = ExclusionRules::new(vec![
            ExclusionRule::ancestor_path("/work/tools/bin"),
            ExclusionRule::subtree("tools"),
        ]);

        // Ancestor votes SELF, subtree votes SELF_AND_CHILDREN
        let enforced = rules.enforce(Path::new("/work/tools")).unwrap();
        assert_eq!(enforced.exclusion, Exclusion::SELF_AND_CHILDREN);

        // Only the ancestor rule applies
        let enforced = rules.enforce(Path::new("/work")).unwrap();
        assert_eq!(enforced.exclusion, Exclusion::SELF);
    }

    #[test]
    fn test_failing_rule_uses_fallback_and_continues() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("vanished");

        let rules = ExclusionRules::new(vec![
            ExclusionRule::HiddenFolders,
            ExclusionRule::subtree("vanished"),
        ])
        .with_fault_policy(RuleFaultPolicy::Fallback(Exclusion::SELF));

        let enforced = rules.enforce(&missing).unwrap();
        // Subtree rule still ran after the hidden rule failed
        assert_eq!(enforced.exclusion, Exclusion::SELF_AND_CHILDREN);
        assert_eq!(enforced.faults.len(), 1);
        assert_eq!(enforced.faults[0].rule, "hidden-folders");
    }

    #[test]
    fn test_fallback_none_only_records_fault() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("vanished");

        let rules = ExclusionRules::new(vec![ExclusionRule::HiddenFolders])
            .with_fault_policy(RuleFaultPolicy::Fallback(Exclusion::NONE));

        let enforced = rules.enforce(&missing).unwrap();
        assert_eq!(enforced.exclusion, Exclusion::NONE);
        assert_eq!(enforced.faults.len(), 1);
    }

    #[test]
    fn test_propagate_policy_returns_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("vanished");

        let rules = ExclusionRules::new(vec![
            ExclusionRule::HiddenFolders,
            ExclusionRule::HiddenFolders,
        ])
        .with_fault_policy(RuleFaultPolicy::Propagate);

        let err = rules.enforce(&missing).unwrap_err();
        assert_eq!(err.faults.len(), 2);
    }

    #[test]
    fn test_fault_policy_parse() {
        assert_eq!(
            "propagate".parse::<RuleFaultPolicy>().unwrap(),
            RuleFaultPolicy::Propagate
        );
        assert_eq!(
            "children".parse::<RuleFaultPolicy>().unwrap(),
            RuleFaultPolicy::Fallback(Exclusion::CHILDREN)
        );
        let err = "sometimes".parse::<RuleFaultPolicy>().unwrap_err();
        assert!(err.contains("Invalid rule error policy"));
        assert_eq!(RuleFaultPolicy::default().to_string(), "self");
    }

    #[test]
    fn test_from_config_builds_rules_in_order() {
        let config = ExcludeConfig {
            ancestor_path: true,
            symbolic_links: true,
            dot_folders: true,
            hidden_folders: true,
            subtrees: vec![".git".into(), "node_modules".into()],
            globs: vec!["**/packages/*".into()],
            on_rule_error: RuleFaultPolicy::Propagate,
        };

        let rules = ExclusionRules::from_config(&config, Some(PathBuf::from("/opt/app"))).unwrap();
        let names: Vec<_> = rules.rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "ancestor-path",
                "symbolic-links",
                "dot-folders",
                "hidden-folders",
                "subtree",
                "subtree",
                "glob"
            ]
        );
        assert_eq!(rules.fault_policy(), RuleFaultPolicy::Propagate);
    }

    #[test]
    fn test_from_config_normalizes_protected_folder() {
        let dir = tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        std::fs::create_dir_all(base.join("tools/bin")).unwrap();
        std::fs::create_dir_all(base.join("x")).unwrap();

        let config = ExcludeConfig {
            ancestor_path: true,
            symbolic_links: false,
            dot_folders: false,
            hidden_folders: false,
            subtrees: Vec::new(),
            globs: Vec::new(),
            on_rule_error: RuleFaultPolicy::default(),
        };
        let protected = base.join("x/../tools/./bin");
        let rules = ExclusionRules::from_config(&config, Some(protected)).unwrap();

        let enforced = rules.enforce(&base.join("tools")).unwrap();
        assert_eq!(enforced.exclusion, Exclusion::SELF);
    }

    #[test]
    fn test_from_config_skips_ancestor_without_protected_folder() {
        let config = ExcludeConfig {
            ancestor_path: true,
            symbolic_links: false,
            dot_folders: false,
            hidden_folders: false,
            subtrees: Vec::new(),
            globs: Vec::new(),
            on_rule_error: RuleFaultPolicy::default(),
        };

        let rules = ExclusionRules::from_config(&config, None).unwrap();
        assert!(rules.rules().is_empty());
    }

    #[test]
    fn test_from_config_rejects_bad_glob() {
        let config = ExcludeConfig {
            globs: vec!["[oops".into()],
            ..ExcludeConfig::default()
        };

        let err = ExclusionRules::from_config(&config, None).unwrap_err();
        assert!(matches!(err, Error::InvalidGlob { .. }));
    }
}
