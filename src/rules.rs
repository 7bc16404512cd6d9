//! Typed, validated classification rules.
//!
//! Rules arrive from the JSON configuration as loosely typed data and are
//! validated once by [`crate::config`] into the structures below. Nothing
//! downstream looks at raw JSON again.

use regex::{Regex, RegexBuilder};

/// A named directive that sends files matching its criteria to a destination.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Descriptive name, used in logs and reports.
    pub name: String,
    /// The criteria a file name must satisfy.
    pub criteria: MatchCriteria,
    /// Destination specifier, relative to the scanned directory or absolute.
    pub destination: String,
}

/// The match criteria of a rule.
///
/// Every present criterion must hold (AND). A criteria value with no
/// criterion at all never matches anything.
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    /// Lowercased substrings; at least one must occur in the lowercased name.
    pub contains: Option<Vec<String>>,
    /// Normalized extensions such as `.png`.
    pub extensions: Option<Vec<String>>,
    /// Case-insensitive regular expression searched in the raw name.
    pub pattern: Option<NamePattern>,
}

/// A rule's `pattern` criterion.
///
/// A pattern that fails to compile is kept rather than rejected at load
/// time, so the rule can report it when it is evaluated.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Compiled(Regex),
    Invalid { source: String, reason: String },
}

impl NamePattern {
    /// Compiles `source` case-insensitively.
    pub fn new(source: &str) -> Self {
        match RegexBuilder::new(source).case_insensitive(true).build() {
            Ok(regex) => NamePattern::Compiled(regex),
            Err(e) => NamePattern::Invalid {
                source: source.to_string(),
                reason: e.to_string(),
            },
        }
    }

    /// The pattern text as written in the configuration.
    pub fn as_str(&self) -> &str {
        match self {
            NamePattern::Compiled(regex) => regex.as_str(),
            NamePattern::Invalid { source, .. } => source,
        }
    }
}

impl MatchCriteria {
    /// Builds criteria from raw terms, normalizing them for matching.
    pub fn new(
        contains: Option<Vec<String>>,
        extensions: Option<Vec<String>>,
        pattern: Option<&str>,
    ) -> Self {
        Self {
            contains: contains.map(|terms| terms.iter().map(|t| t.to_lowercase()).collect()),
            extensions: extensions.map(|exts| exts.iter().map(|e| normalize_extension(e)).collect()),
            pattern: pattern.map(NamePattern::new),
        }
    }

    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.contains.is_none() && self.extensions.is_none() && self.pattern.is_none()
    }
}

/// Lowercases an extension and makes sure it starts with a dot.
///
/// ```
/// use cleanify::rules::normalize_extension;
///
/// assert_eq!(normalize_extension("PNG"), ".png");
/// assert_eq!(normalize_extension(".Jpg"), ".jpg");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// An ordered, read-only collection of rules. Earlier rules take priority.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates the rules in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
