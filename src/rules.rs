//! Rule table mapping package identifiers to git remotes.
//!
//! A rule file holds one `pattern=replacement` pair per line:
//!
//! ```text
//! # comments start with '#'
//! a/hats=http://server/special_repos/hats.git
//! a/([^/]+)=http://server/repos/$1.git
//! b/([^/]+)=http://other/repos/$1.git
//! ```
//!
//! Patterns are anchored at the start of the identifier. The matched text is the owning
//! repository identifier; the replacement, expanded over that text, is its remote.

use crate::ident::PackageId;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("could not find a rule matching {0}")]
    NoRuleMatched(PackageId),

    #[error("invalid rule pattern '{pattern}' (line {line}): {source}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read rule file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    re: Regex,
    replace: String,
}

/// Repository owning a package, as derived by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub repository: PackageId,
    pub remote: String,
}

impl Rule {
    pub fn new(pattern: &str, replace: &str) -> Result<Self, regex::Error> {
        let pattern = pattern.trim();
        let re = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            re,
            replace: replace.trim().to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replace
    }

    /// Apply the rule to `pkg`. A match must be non-empty, start at the beginning of the
    /// identifier and end on a segment boundary.
    pub fn apply(&self, pkg: &str) -> Option<Resolved> {
        let m = self.re.find(pkg)?;
        if m.start() != 0 || m.is_empty() {
            return None;
        }
        let rest = &pkg[m.end()..];
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let matched = m.as_str();
        let remote = self.re.replace_all(matched, self.replace.as_str()).into_owned();
        Some(Resolved {
            repository: PackageId::new(matched),
            remote,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse rule-file text. Blank lines, `#` comments and lines without `=` are skipped.
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        let mut rules = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((pattern, replace)) = line.split_once('=') else {
                continue;
            };
            let rule = Rule::new(pattern, replace).map_err(|source| RuleError::InvalidPattern {
                line: idx + 1,
                pattern: pattern.trim().to_string(),
                source,
            })?;
            rules.push(rule);
        }
        Ok(Self { rules })
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let text = fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Append the rules of `other`; they are tried after the existing ones.
    pub fn extend(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }

    /// First matching rule wins.
    pub fn resolve(&self, pkg: &PackageId) -> Result<Resolved, RuleError> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(pkg.as_str()))
            .ok_or_else(|| RuleError::NoRuleMatched(pkg.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
